//! The planner facade: LLM call, parse, normalize, or fall back.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tempo_types::{ColorCycle, Event, UserProfile};

use crate::action::ActionDescriptor;
use crate::config::LlmConfig;
use crate::defaults::default_schedule;
use crate::error::PlannerError;
use crate::llm::{create_backend, LlmBackend};
use crate::parse::{parse_action, parse_events};
use crate::prompt::{PromptEngine, RenderedPrompt};

/// How many days a generation covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    /// Just the requested date.
    #[default]
    Day,
    /// Seven days starting at the requested date.
    Week,
}

impl Horizon {
    /// Number of days covered.
    pub const fn days(self) -> u64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
        }
    }
}

/// Where a planned day's events came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    /// Generated by the LLM.
    Llm,
    /// The deterministic default schedule.
    Fallback,
}

/// One generated day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDay {
    /// The day.
    pub date: NaiveDate,
    /// Events for the day, sorted by start.
    pub events: Vec<Event>,
    /// Whether the LLM produced them.
    pub source: PlanSource,
}

/// Generates schedules and interprets instructions.
///
/// Neither operation fails: errors are logged and replaced by
/// [`default_schedule`] or [`ActionDescriptor::NoOp`].
#[derive(Debug)]
pub struct Planner {
    backend: Option<LlmBackend>,
    prompts: PromptEngine,
    timeout: Duration,
}

impl Planner {
    /// Build a planner from configuration. A config without an API key
    /// yields an offline planner.
    pub fn from_config(config: &LlmConfig) -> Self {
        let backend = config.is_enabled().then(|| create_backend(config));
        match &backend {
            Some(b) => tracing::info!(backend = b.name(), model = %config.model, "LLM planner enabled"),
            None => tracing::info!("no LLM API key configured, planner uses default schedules"),
        }
        let prompts = config
            .templates_dir
            .as_deref()
            .map_or_else(PromptEngine::embedded, PromptEngine::with_overrides);
        Self {
            backend,
            prompts,
            timeout: config.timeout(),
        }
    }

    /// A planner that never calls out.
    pub fn offline() -> Self {
        Self {
            backend: None,
            prompts: PromptEngine::embedded(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Whether an LLM backend is configured.
    pub const fn is_online(&self) -> bool {
        self.backend.is_some()
    }

    /// Plan every day of `horizon` starting at `start`.
    ///
    /// `existing` is the current schedule of `start`, given to the LLM as
    /// context. Days the LLM leaves empty get the default schedule.
    pub async fn generate(
        &self,
        profile: &UserProfile,
        start: NaiveDate,
        horizon: Horizon,
        existing: &[Event],
    ) -> Vec<PlannedDay> {
        let dates: Vec<NaiveDate> = (0..horizon.days())
            .filter_map(|offset| start.checked_add_days(Days::new(offset)))
            .collect();

        let generated = match self.generate_llm(profile, &dates, existing).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(user = %profile.id, error = %e, "schedule generation fell back to defaults");
                Vec::new()
            }
        };

        let mut colors = ColorCycle::new();
        dates
            .iter()
            .map(|&date| {
                let mut events: Vec<Event> = generated
                    .iter()
                    .filter(|e| e.date == date)
                    .cloned()
                    .collect();
                if events.is_empty() {
                    return PlannedDay {
                        date,
                        events: default_schedule(profile, date),
                        source: PlanSource::Fallback,
                    };
                }
                for event in &mut events {
                    if event.color.is_none() {
                        event.color = Some(colors.next_color().to_owned());
                    }
                }
                events.sort_by_key(|e| e.start);
                PlannedDay {
                    date,
                    events,
                    source: PlanSource::Llm,
                }
            })
            .collect()
    }

    /// Translate a natural-language instruction into one action against
    /// the schedule of `date`.
    pub async fn interpret(
        &self,
        profile: &UserProfile,
        date: NaiveDate,
        events: &[Event],
        instruction: &str,
    ) -> ActionDescriptor {
        if instruction.trim().is_empty() {
            return ActionDescriptor::fallback("empty instruction");
        }
        let result = async {
            let prompt = self.prompts.render_command(profile, date, events, instruction)?;
            let reply = self.call(&prompt).await?;
            parse_action(&reply)
        }
        .await;
        match result {
            Ok(action) => {
                tracing::debug!(user = %profile.id, action = action.name(), "instruction interpreted");
                action
            }
            Err(e) => {
                tracing::warn!(user = %profile.id, error = %e, "instruction interpretation failed");
                ActionDescriptor::fallback("could not understand the instruction")
            }
        }
    }

    async fn generate_llm(
        &self,
        profile: &UserProfile,
        dates: &[NaiveDate],
        existing: &[Event],
    ) -> Result<Vec<Event>, PlannerError> {
        let Some(&first) = dates.first() else {
            return Ok(Vec::new());
        };
        let prompt = self.prompts.render_schedule(profile, dates, existing)?;
        let reply = self.call(&prompt).await?;
        let raw = parse_events(&reply)?;

        let single_day = dates.len() == 1;
        Ok(raw
            .into_iter()
            .filter_map(|r| r.into_event(first))
            .map(|mut event| {
                if single_day {
                    event.date = first;
                }
                event
            })
            .filter(|event| dates.contains(&event.date))
            .collect())
    }

    async fn call(&self, prompt: &RenderedPrompt) -> Result<String, PlannerError> {
        let backend = self.backend.as_ref().ok_or(PlannerError::Disabled)?;
        tokio::time::timeout(self.timeout, backend.complete(prompt))
            .await
            .map_err(|_elapsed| PlannerError::Timeout(self.timeout.as_millis()))?
    }
}
