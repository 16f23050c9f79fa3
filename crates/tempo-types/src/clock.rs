//! Wall-clock times of day.
//!
//! Events carry their start and end as `HH:MM` strings on the wire.
//! Internally a [`ClockTime`] is minutes since midnight so ordering and
//! arithmetic are integer operations.

use core::fmt;
use core::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypesError;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day with minute precision, `00:00` through `23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Midnight, `00:00`.
    pub const MIDNIGHT: Self = Self(0);

    /// The last representable minute, `23:59`.
    pub const END_OF_DAY: Self = Self(MINUTES_PER_DAY - 1);

    /// Build a time from hours and minutes. Returns `None` when out of range.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    /// Build a time from minutes since midnight. Returns `None` past `23:59`.
    pub const fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes >= MINUTES_PER_DAY {
            None
        } else {
            Some(Self(minutes))
        }
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// The hour component (0-23).
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    /// The minute component (0-59).
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Shift by `delta` minutes, clamping to the same day.
    pub fn saturating_add_minutes(self, delta: i32) -> Self {
        let shifted = i32::from(self.0).saturating_add(delta);
        let clamped = shifted.clamp(0, i32::from(MINUTES_PER_DAY - 1));
        Self(u16::try_from(clamped).unwrap_or(0))
    }

    /// Parse `HH:MM` (or `H:MM`). Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let invalid = || TypesError::InvalidTime(raw.to_owned());
        let trimmed = raw.trim();
        let (h, m) = trimmed.split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = h.parse().map_err(|_parse| invalid())?;
        let minute: u16 = m.parse().map_err(|_parse| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}
