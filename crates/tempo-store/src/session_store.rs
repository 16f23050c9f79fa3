//! Session tokens and avatar conversation ownership.
//!
//! Both are simple `key -> user id` lookups: `session:{token}` maps a
//! browser session to its user, `conversation:{id}` maps a live avatar
//! conversation to the user whose calendar it edits.

use tempo_types::{ConversationId, SessionToken, UserId};

use crate::error::StoreError;
use crate::kv::KvBackend;

fn session_key(token: &SessionToken) -> String {
    format!("session:{token}")
}

fn conversation_key(id: &ConversationId) -> String {
    format!("conversation:{id}")
}

/// Resolves opaque tokens to users.
#[derive(Clone, Debug)]
pub struct SessionStore {
    kv: KvBackend,
}

impl SessionStore {
    /// Create a session store over `kv`.
    pub const fn new(kv: KvBackend) -> Self {
        Self { kv }
    }

    /// Mint a session token for `user`.
    pub async fn create_session(&self, user: &UserId) -> Result<SessionToken, StoreError> {
        let token = SessionToken::generate();
        self.kv.set(&session_key(&token), user.as_str()).await?;
        Ok(token)
    }

    /// The user a session token belongs to, if any.
    pub async fn resolve_session(&self, token: &SessionToken) -> Result<Option<UserId>, StoreError> {
        Ok(self.kv.get(&session_key(token)).await?.map(UserId::from))
    }

    /// Record that `conversation` edits `user`'s calendar.
    pub async fn bind_conversation(
        &self,
        conversation: &ConversationId,
        user: &UserId,
    ) -> Result<(), StoreError> {
        self.kv
            .set(&conversation_key(conversation), user.as_str())
            .await
    }

    /// The user a conversation belongs to, if known.
    pub async fn resolve_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<Option<UserId>, StoreError> {
        Ok(self
            .kv
            .get(&conversation_key(conversation))
            .await?
            .map(UserId::from))
    }
}
