//! Opaque string identifiers.
//!
//! Identifiers arrive from outside the service (auth provider user ids,
//! avatar conversation ids, LLM-generated event ids), so they are plain
//! strings wrapped in newtypes to prevent accidental mixing. Ids minted by
//! the service itself use UUID v7 (time-ordered).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identifier of the default user that owns unattributed notifications
/// and unauthenticated stream connections.
pub const DEMO_USER: &str = "demo-user";

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Mint a new identifier from a UUID v7 (time-ordered).
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of a user (stable across sessions).
    UserId
}

define_id! {
    /// Identifier of a calendar event, unique within a user's day.
    EventId
}

define_id! {
    /// Bearer token identifying a browser session.
    SessionToken
}

define_id! {
    /// Identifier of a live voice-avatar conversation.
    ConversationId
}

impl UserId {
    /// The default/demo user.
    pub fn demo() -> Self {
        Self(DEMO_USER.to_owned())
    }

    /// Whether this is the default/demo user.
    pub fn is_demo(&self) -> bool {
        self.0 == DEMO_USER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = EventId::generate();
        let b = EventId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = UserId::from("alice");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn demo_user_is_recognised() {
        assert!(UserId::demo().is_demo());
        assert!(!UserId::from("bob").is_demo());
    }
}
