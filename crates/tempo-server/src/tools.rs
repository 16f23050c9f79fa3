//! Calendar operations callable by the voice avatar and by instructions.
//!
//! The avatar invokes tools by name with JSON arguments. Tool calls and
//! [`ActionDescriptor`]s from the planner both land in
//! [`ToolExecutor::apply`], so an edit made by voice and one typed as an
//! instruction behave identically. Every outcome, including bad input
//! and missing events, is a short sentence for the avatar to speak.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tempo_planner::ActionDescriptor;
use tempo_store::{EventStore, StoreError};
use tempo_types::{ClockTime, Event, EventId, UserId};
use tracing::debug;

/// JSON-schema definitions of the avatar tools.
pub fn tool_definitions() -> Value {
    let date = serde_json::json!({
        "type": "string",
        "description": "Day in YYYY-MM-DD format. Defaults to today."
    });
    let time = |what: &str| {
        serde_json::json!({
            "type": "string",
            "description": format!("{what} in 24-hour HH:MM format")
        })
    };
    let target = serde_json::json!({
        "type": "string",
        "description": "The event's id or its exact title"
    });
    serde_json::json!([
        function(
            "get_schedule",
            "Read the user's events for a day",
            serde_json::json!({ "date": date }),
            &[],
        ),
        function(
            "add_event",
            "Add an event to the user's calendar",
            serde_json::json!({
                "title": { "type": "string", "description": "Short event title" },
                "start": time("Start time"),
                "end": time("End time"),
                "date": date,
            }),
            &["title", "start"],
        ),
        function(
            "move_event",
            "Move an existing event to a new time on the same day",
            serde_json::json!({
                "target": target,
                "new_start": time("New start time"),
                "new_end": time("New end time"),
                "date": date,
            }),
            &["target", "new_start"],
        ),
        function(
            "remove_event",
            "Remove an event from the user's calendar",
            serde_json::json!({ "target": target, "date": date }),
            &["target"],
        ),
    ])
}

fn function(name: &str, description: &str, properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct GetScheduleArgs {
    #[serde(default)]
    date: Option<NaiveDate>,
}

/// Applies tool calls and actions to one user's calendar.
#[derive(Debug, Clone, Copy)]
pub struct ToolExecutor<'a> {
    store: &'a EventStore,
    today: NaiveDate,
}

impl<'a> ToolExecutor<'a> {
    /// Create an executor; `today` is the day used when a call names none.
    pub const fn new(store: &'a EventStore, today: NaiveDate) -> Self {
        Self { store, today }
    }

    /// Dispatch a tool call by name.
    ///
    /// `arguments` may be a JSON object or a string containing one.
    /// Unknown tools and malformed arguments produce an explanatory
    /// message rather than an error.
    pub async fn call(
        &self,
        user: &UserId,
        tool_name: &str,
        arguments: &Value,
    ) -> Result<String, StoreError> {
        let mut arguments = match arguments {
            Value::String(raw) => serde_json::from_str(raw).unwrap_or(Value::Null),
            other => other.clone(),
        };
        if arguments.is_null() {
            arguments = Value::Object(serde_json::Map::new());
        }
        debug!(user_id = %user, tool = tool_name, "tool call");

        let action = match tool_name {
            "get_schedule" => {
                let args: GetScheduleArgs = serde_json::from_value(arguments).unwrap_or_default();
                let date = args.date.unwrap_or(self.today);
                return Ok(describe_day(date, &self.store.read(user, date).await?));
            }
            "add_event" => "add",
            "move_event" => "move",
            "remove_event" => "remove",
            other => return Ok(format!("I don't know how to {other}.")),
        };
        if let Value::Object(map) = &mut arguments {
            map.insert("action".to_owned(), Value::String(action.to_owned()));
        }
        match serde_json::from_value::<ActionDescriptor>(arguments) {
            Ok(action) => self.apply(user, action).await,
            Err(e) => Ok(format!("I couldn't understand the details for {tool_name}: {e}.")),
        }
    }

    /// Apply an action and describe the outcome.
    pub async fn apply(&self, user: &UserId, action: ActionDescriptor) -> Result<String, StoreError> {
        match action {
            ActionDescriptor::Add {
                title,
                start,
                end,
                date,
            } => self.add(user, title, start, end, date.unwrap_or(self.today)).await,
            ActionDescriptor::Move {
                target,
                new_start,
                new_end,
                date,
            } => {
                self.move_event(user, date.unwrap_or(self.today), &target, new_start, new_end)
                    .await
            }
            ActionDescriptor::Remove { target, date } => {
                self.remove(user, date.unwrap_or(self.today), &target).await
            }
            ActionDescriptor::NoOp { reason } => Ok(reason.map_or_else(
                || "No changes made.".to_owned(),
                |r| format!("No changes made: {r}."),
            )),
        }
    }

    async fn add(
        &self,
        user: &UserId,
        title: String,
        start: ClockTime,
        end: Option<ClockTime>,
        date: NaiveDate,
    ) -> Result<String, StoreError> {
        let title = title.trim().to_owned();
        if title.is_empty() {
            return Ok("An event needs a title.".to_owned());
        }
        let event = Event {
            id: EventId::generate(),
            title,
            start,
            end: end.filter(|e| *e > start),
            date,
            color: None,
        };
        let event = self.store.add(user, event).await?;
        Ok(format!("Added {} at {} on {date}.", event.title, event.start))
    }

    async fn move_event(
        &self,
        user: &UserId,
        date: NaiveDate,
        target: &str,
        new_start: ClockTime,
        new_end: Option<ClockTime>,
    ) -> Result<String, StoreError> {
        let events = self.store.read(user, date).await?;
        let Some(existing) = find_target(&events, target) else {
            return Ok(not_found(target, date));
        };
        match self
            .store
            .move_event(user, date, &existing.id, new_start, new_end)
            .await?
        {
            Some(moved) => Ok(format!("Moved {} to {}.", moved.title, moved.start)),
            None => Ok(not_found(target, date)),
        }
    }

    async fn remove(&self, user: &UserId, date: NaiveDate, target: &str) -> Result<String, StoreError> {
        let events = self.store.read(user, date).await?;
        let Some(existing) = find_target(&events, target) else {
            return Ok(not_found(target, date));
        };
        match self.store.remove(user, date, &existing.id).await? {
            Some(removed) => Ok(format!("Removed {}.", removed.title)),
            None => Ok(not_found(target, date)),
        }
    }
}

/// Find an event by id, else by case-insensitive title.
pub fn find_target<'e>(events: &'e [Event], target: &str) -> Option<&'e Event> {
    let target = target.trim();
    events
        .iter()
        .find(|e| e.id.as_str() == target)
        .or_else(|| events.iter().find(|e| e.title.eq_ignore_ascii_case(target)))
}

/// Spoken summary of a day.
pub fn describe_day(date: NaiveDate, events: &[Event]) -> String {
    if events.is_empty() {
        return format!("You have nothing scheduled on {date}.");
    }
    let items: Vec<String> = events
        .iter()
        .map(|e| format!("{}-{} {}", e.start, e.effective_end(), e.title))
        .collect();
    format!("On {date} you have: {}.", items.join("; "))
}

fn not_found(target: &str, date: NaiveDate) -> String {
    format!("I couldn't find an event called {target} on {date}.")
}
