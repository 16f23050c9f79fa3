//! User profiles captured by the onboarding survey.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock::ClockTime;
use crate::ids::UserId;

/// When the user prefers their day to start and end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WakeRhythm {
    /// Up early, winds down early.
    EarlyBird,
    /// A conventional office-hours day.
    #[default]
    Balanced,
    /// Late start, late finish.
    NightOwl,
}

impl WakeRhythm {
    /// First schedulable minute of the day.
    pub const fn day_start(self) -> ClockTime {
        let (h, m) = match self {
            Self::EarlyBird => (6, 0),
            Self::Balanced => (8, 0),
            Self::NightOwl => (10, 0),
        };
        match ClockTime::from_hm(h, m) {
            Some(t) => t,
            None => ClockTime::MIDNIGHT,
        }
    }

    /// Last schedulable minute of the day.
    pub const fn day_end(self) -> ClockTime {
        let (h, m) = match self {
            Self::EarlyBird => (21, 0),
            Self::Balanced => (22, 0),
            Self::NightOwl => (23, 59),
        };
        match ClockTime::from_hm(h, m) {
            Some(t) => t,
            None => ClockTime::END_OF_DAY,
        }
    }
}

/// A named recurring time slot, e.g. "deep work 09:00-11:00".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SlotTemplate {
    /// Slot label.
    pub name: String,
    /// Slot start.
    #[ts(type = "string")]
    pub start: ClockTime,
    /// Slot end.
    #[ts(type = "string")]
    pub end: ClockTime,
}

/// A user's scheduling preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// Stable user identifier.
    pub id: UserId,
    /// Name shown in the UI and used by the avatar.
    pub display_name: String,
    /// Preferred day rhythm.
    #[serde(default)]
    pub wake_rhythm: WakeRhythm,
    /// Activity categories that must always be scheduled (e.g. "exercise").
    #[serde(default)]
    pub non_negotiables: Vec<String>,
    /// Named slot templates.
    #[serde(default)]
    pub slot_templates: Vec<SlotTemplate>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile used when a user has not onboarded (e.g. the demo user).
    pub fn placeholder(id: UserId) -> Self {
        Self {
            display_name: id.to_string(),
            id,
            wake_rhythm: WakeRhythm::default(),
            non_negotiables: Vec::new(),
            slot_templates: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// A partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// New wake rhythm.
    #[serde(default)]
    pub wake_rhythm: Option<WakeRhythm>,
    /// Replacement non-negotiable list.
    #[serde(default)]
    pub non_negotiables: Option<Vec<String>>,
    /// Replacement slot template list.
    #[serde(default)]
    pub slot_templates: Option<Vec<SlotTemplate>>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.wake_rhythm.is_none()
            && self.non_negotiables.is_none()
            && self.slot_templates.is_none()
    }

    /// Apply the present fields to `profile`.
    pub fn apply(self, profile: &mut UserProfile) {
        if let Some(name) = self.display_name {
            profile.display_name = name;
        }
        if let Some(rhythm) = self.wake_rhythm {
            profile.wake_rhythm = rhythm;
        }
        if let Some(items) = self.non_negotiables {
            profile.non_negotiables = items;
        }
        if let Some(slots) = self.slot_templates {
            profile.slot_templates = slots;
        }
    }
}
