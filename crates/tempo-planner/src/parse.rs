//! Extraction of JSON payloads from free-form LLM text.
//!
//! The LLM is asked for bare JSON but frequently wraps it in prose or a
//! markdown fence, or leaves trailing commas. [`extract_json`] tries, in
//! order:
//!
//! 1. The trimmed text as-is
//! 2. The body of a markdown code block
//! 3. The first balanced `{...}` or `[...]` span
//!
//! each also with trailing commas stripped. Parsing is a plain `Result`;
//! choosing a fallback is the caller's job.

use chrono::NaiveDate;
use serde::Deserialize;
use tempo_types::{ClockTime, Event, EventId};

use crate::action::ActionDescriptor;
use crate::error::PlannerError;

/// One event as the LLM wrote it, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    /// Display text.
    #[serde(default)]
    pub title: String,
    /// Start time, expected `HH:MM`.
    #[serde(default)]
    pub start: String,
    /// End time, expected `HH:MM`.
    #[serde(default)]
    pub end: Option<String>,
    /// Date, expected `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Display color.
    #[serde(default)]
    pub color: Option<String>,
}

impl RawEvent {
    /// Validate into an [`Event`] on `fallback_date` unless the raw event
    /// names its own parseable date. Returns `None` for an empty title or
    /// an unparseable start.
    pub fn into_event(self, fallback_date: NaiveDate) -> Option<Event> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return None;
        }
        let start = ClockTime::parse(&self.start).ok()?;
        let end = self
            .end
            .as_deref()
            .and_then(|raw| ClockTime::parse(raw).ok())
            .filter(|end| *end > start);
        let date = self
            .date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
            .unwrap_or(fallback_date);
        Some(Event {
            id: EventId::generate(),
            title,
            start,
            end,
            date,
            color: self.color.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Find the first JSON value embedded in `raw`.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, PlannerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::Parse("empty response".to_owned()));
    }

    let candidates = [
        Some(trimmed),
        extract_from_codeblock(trimmed),
        first_balanced_span(trimmed),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
        if let Ok(value) = serde_json::from_str(&strip_trailing_commas(candidate)) {
            return Ok(value);
        }
    }
    Err(PlannerError::Parse("no JSON value found in response".to_owned()))
}

/// Parse a list of events. Accepts a bare array or an object with an
/// `events` (or `schedule`) array.
pub fn parse_events(raw: &str) -> Result<Vec<RawEvent>, PlannerError> {
    let value = extract_json(raw)?;
    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove("events")
            .or_else(|| map.remove("schedule"))
            .ok_or_else(|| PlannerError::Parse("object has no `events` array".to_owned()))?,
        other => {
            return Err(PlannerError::Parse(format!(
                "expected array or object, got {other}"
            )));
        }
    };
    Ok(serde_json::from_value(list)?)
}

/// Parse a single action descriptor. The `action` tag is matched
/// case-insensitively.
pub fn parse_action(raw: &str) -> Result<ActionDescriptor, PlannerError> {
    let mut value = extract_json(raw)?;
    if let Some(tag) = value.get_mut("action")
        && let Some(name) = tag.as_str()
    {
        let lowered = name.trim().to_lowercase();
        *tag = serde_json::Value::String(lowered);
    }
    Ok(serde_json::from_value(value)?)
}

fn extract_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    // Skip the info string (`json`, `JSON`, ...) up to the newline.
    let body_start = after_fence.find('\n')?.checked_add(1)?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The first `{...}` or `[...]` span with balanced brackets, ignoring
/// brackets inside string literals.
fn first_balanced_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text.get(start..)?.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth = depth.saturating_add(1),
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start.checked_add(offset)?.checked_add(c.len_utf8())?;
                    return text.get(start..end);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip commas directly preceding `}` or `]` (a common LLM mistake).
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest: String = chars.clone().skip_while(|n| n.is_whitespace()).take(1).collect();
            if rest == "}" || rest == "]" {
                continue;
            }
        }
        result.push(c);
    }
    result
}
