//! Change notifications carried on the live update stream.
//!
//! A [`ChangeNotification`] is published after every Event Store mutation
//! and never persisted. On the wire it is a JSON object tagged by `type`:
//!
//! ```json
//! {"type": "add", "user_id": "u1", "event": { ... }}
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::event::Event;
use crate::ids::UserId;

/// What happened to the affected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ChangeKind {
    /// The event was inserted into its day.
    Add,
    /// The event was deleted from its day.
    Remove,
}

impl ChangeKind {
    /// Lowercase name used in logs and SSE event names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// An ephemeral description of one Event Store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChangeNotification {
    /// Mutation kind.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Owning user. Absent means the default/demo user.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// The event that was added or removed.
    pub event: Event,
}

impl ChangeNotification {
    /// Notification for an inserted event.
    pub const fn added(user_id: Option<UserId>, event: Event) -> Self {
        Self {
            kind: ChangeKind::Add,
            user_id,
            event,
        }
    }

    /// Notification for a deleted event.
    pub const fn removed(user_id: Option<UserId>, event: Event) -> Self {
        Self {
            kind: ChangeKind::Remove,
            user_id,
            event,
        }
    }

    /// Whether a connection authenticated as `user` should receive this
    /// notification. Unattributed notifications belong to the demo user.
    pub fn is_for(&self, user: &UserId) -> bool {
        self.user_id
            .as_ref()
            .map_or_else(|| user.is_demo(), |owner| owner == user)
    }
}
