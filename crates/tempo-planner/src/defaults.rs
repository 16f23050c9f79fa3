//! Deterministic schedule used when the LLM is unavailable.
//!
//! The result depends only on the profile and date, so a retried
//! generation produces the same calendar with the same event ids.

use chrono::NaiveDate;
use tempo_types::{free_windows, ClockTime, ColorCycle, Event, EventId, UserProfile};

/// Minutes reserved for each non-negotiable activity.
const ACTIVITY_MINUTES: u16 = 60;

/// Build a reasonable day from the profile alone.
///
/// Slot templates come first, then a morning routine, lunch and a
/// wind-down block. Each non-negotiable gets the first free hour left
/// over; one that does not fit is skipped.
pub fn default_schedule(profile: &UserProfile, date: NaiveDate) -> Vec<Event> {
    let day_start = profile.wake_rhythm.day_start();
    let day_end = profile.wake_rhythm.day_end();
    let mut builder = DayBuilder::new(date);

    for slot in &profile.slot_templates {
        builder.push(&slot.name, slot.start, Some(slot.end));
    }

    builder.push_if_free("Morning routine", day_start, day_start.saturating_add_minutes(30));
    if let (Some(start), Some(end)) = (ClockTime::from_hm(12, 30), ClockTime::from_hm(13, 30))
        && start >= day_start
        && end <= day_end
    {
        builder.push_if_free("Lunch", start, end);
    }
    builder.push_if_free("Wind down", day_end.saturating_add_minutes(-60), day_end);

    for activity in &profile.non_negotiables {
        let title = capitalize(activity.trim());
        if title.is_empty() {
            continue;
        }
        let window = free_windows(&builder.events, day_start, day_end)
            .into_iter()
            .find(|w| w.minutes() >= ACTIVITY_MINUTES);
        if let Some(window) = window {
            let end = window.start.saturating_add_minutes(i32::from(ACTIVITY_MINUTES));
            builder.push(&title, window.start, Some(end));
        }
    }

    builder.finish()
}

struct DayBuilder {
    date: NaiveDate,
    events: Vec<Event>,
    colors: ColorCycle,
}

impl DayBuilder {
    const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
            colors: ColorCycle::new(),
        }
    }

    fn push(&mut self, title: &str, start: ClockTime, end: Option<ClockTime>) {
        let n = self.events.len().saturating_add(1);
        self.events.push(Event {
            id: EventId::from(format!("{}-default-{n}", self.date)),
            title: title.to_owned(),
            start,
            end,
            date: self.date,
            color: Some(self.colors.next_color().to_owned()),
        });
    }

    fn push_if_free(&mut self, title: &str, start: ClockTime, end: ClockTime) {
        let overlaps = self
            .events
            .iter()
            .any(|e| e.start < end && e.effective_end() > start);
        if end > start && !overlaps {
            self.push(title, start, Some(end));
        }
    }

    fn finish(mut self) -> Vec<Event> {
        self.events.sort_by_key(|e| e.start);
        self.events
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use tempo_types::{SlotTemplate, UserId, WakeRhythm};

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or_default()
    }

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap_or(ClockTime::MIDNIGHT)
    }

    fn titles(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn balanced_profile_gets_core_blocks() {
        let profile = UserProfile::placeholder(UserId::from("alice"));
        let events = default_schedule(&profile, date());
        assert_eq!(titles(&events), vec!["Morning routine", "Lunch", "Wind down"]);
        assert_eq!(events.first().map(|e| e.start), Some(t("08:00")));
        assert_eq!(events.last().map(|e| e.start), Some(t("21:00")));
        assert!(events.iter().all(|e| e.date == date() && e.color.is_some()));
    }

    #[test]
    fn non_negotiables_fill_first_free_hour() {
        let mut profile = UserProfile::placeholder(UserId::from("alice"));
        profile.non_negotiables = vec!["exercise".to_owned(), "reading".to_owned()];
        let events = default_schedule(&profile, date());
        let exercise = events.iter().find(|e| e.title == "Exercise");
        assert_eq!(exercise.map(|e| e.start), Some(t("08:30")));
        let reading = events.iter().find(|e| e.title == "Reading");
        assert_eq!(reading.map(|e| e.start), Some(t("09:30")));
    }

    #[test]
    fn slot_templates_take_precedence() {
        let mut profile = UserProfile::placeholder(UserId::from("owl"));
        profile.wake_rhythm = WakeRhythm::NightOwl;
        profile.slot_templates = vec![SlotTemplate {
            name: "Deep work".to_owned(),
            start: t("10:00"),
            end: t("12:00"),
        }];
        let events = default_schedule(&profile, date());
        assert_eq!(events.first().map(|e| e.title.as_str()), Some("Deep work"));
        assert!(!events.iter().any(|e| e.title == "Morning routine"));
    }

    #[test]
    fn output_is_deterministic() {
        let mut profile = UserProfile::placeholder(UserId::from("alice"));
        profile.non_negotiables = vec!["exercise".to_owned()];
        assert_eq!(default_schedule(&profile, date()), default_schedule(&profile, date()));
    }
}
