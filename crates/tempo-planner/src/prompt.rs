//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are compiled into the binary. When `llm.templates_dir` is
//! set, files in that directory take precedence so prompts can be tuned
//! without recompiling; any template missing there falls back to the
//! built-in copy.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;
use minijinja::{context, Environment};
use tempo_types::{free_windows, Event, UserProfile};

use crate::error::PlannerError;

const SYSTEM_TEMPLATE: &str = "system.j2";
const SCHEDULE_TEMPLATE: &str = "schedule.j2";
const COMMAND_TEMPLATE: &str = "command.j2";

fn embedded(name: &str) -> Option<&'static str> {
    match name {
        SYSTEM_TEMPLATE => Some(include_str!("../templates/system.j2")),
        SCHEDULE_TEMPLATE => Some(include_str!("../templates/schedule.j2")),
        COMMAND_TEMPLATE => Some(include_str!("../templates/command.j2")),
        _ => None,
    }
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message.
    pub system: String,
    /// User message carrying profile, schedule and instruction.
    pub user: String,
}

/// Renders planner prompts.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Engine using only the built-in templates.
    pub fn embedded() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| Ok(embedded(name).map(str::to_owned)));
        Self { env }
    }

    /// Engine preferring templates found in `dir`.
    pub fn with_overrides(dir: &str) -> Self {
        let dir = PathBuf::from(dir);
        let mut env = Environment::new();
        env.set_loader(move |name| match std::fs::read_to_string(dir.join(name)) {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(embedded(name).map(str::to_owned)),
            Err(e) => Err(minijinja::Error::new(
                minijinja::ErrorKind::InvalidOperation,
                format!("failed to read template {name}"),
            )
            .with_source(e)),
        });
        Self { env }
    }

    /// Prompt asking for a schedule covering `dates`.
    pub fn render_schedule(
        &self,
        profile: &UserProfile,
        dates: &[NaiveDate],
        existing: &[Event],
    ) -> Result<RenderedPrompt, PlannerError> {
        let user = self.render(
            SCHEDULE_TEMPLATE,
            context! {
                profile => profile,
                dates => dates,
                events => existing,
                free => free_slots(profile, existing),
                day_start => profile.wake_rhythm.day_start().to_string(),
                day_end => profile.wake_rhythm.day_end().to_string(),
            },
        )?;
        Ok(RenderedPrompt {
            system: self.system()?,
            user,
        })
    }

    /// Prompt asking to translate `instruction` into one action.
    pub fn render_command(
        &self,
        profile: &UserProfile,
        date: NaiveDate,
        events: &[Event],
        instruction: &str,
    ) -> Result<RenderedPrompt, PlannerError> {
        let user = self.render(
            COMMAND_TEMPLATE,
            context! {
                profile => profile,
                date => date,
                events => events,
                free => free_slots(profile, events),
                instruction => instruction,
            },
        )?;
        Ok(RenderedPrompt {
            system: self.system()?,
            user,
        })
    }

    fn system(&self) -> Result<String, PlannerError> {
        self.render(SYSTEM_TEMPLATE, context! {})
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, PlannerError> {
        self.env
            .get_template(name)
            .and_then(|tpl| tpl.render(ctx))
            .map_err(|e| PlannerError::Template(format!("{name}: {e}")))
    }
}

/// Gaps in `events` within the profile's waking hours, as template values.
fn free_slots(profile: &UserProfile, events: &[Event]) -> Vec<minijinja::Value> {
    let rhythm = profile.wake_rhythm;
    free_windows(events, rhythm.day_start(), rhythm.day_end())
        .into_iter()
        .map(|slot| context! { start => slot.start.to_string(), end => slot.end.to_string() })
        .collect()
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}
