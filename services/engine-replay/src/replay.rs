use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sf_api_types::{EntityId, MutationOutcome, SignalSource};
use sf_config::EngineConfig;
use sf_scroll::{HeaderSnapshot, HeaderVisibility, SignalDiagnostics, VisibilityTransition};
use sf_toggle::{InMemoryMembershipStore, MembershipMutation, ToggleMutator};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<EngineConfig>,
    #[serde(default)]
    pub scroll: Vec<ScrollStep>,
    #[serde(default)]
    pub toggles: Vec<ToggleStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollStep {
    pub source: SignalSource,
    /// Offset for native samples, delta for wheel samples.
    pub value: f64,
    #[serde(default)]
    pub timestamp_ms: f64,
}

/// One scripted click. All toggles in a scenario are issued together, so
/// repeated ids exercise the in-flight guard.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleStep {
    pub entity_id: EntityId,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub respond: Option<MutationOutcome>,
    #[serde(default)]
    pub fail: Option<String>,
}

#[async_trait(?Send)]
impl MembershipMutation for ToggleStep {
    async fn mutate(&self, entity_id: &EntityId) -> Result<MutationOutcome> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        if let Some(message) = &self.fail {
            return Err(anyhow!("{message}"));
        }
        Ok(self
            .respond
            .clone()
            .unwrap_or_else(|| MutationOutcome::ok(format!("{entity_id} updated"))))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEvent {
    Scroll {
        index: usize,
        source: SignalSource,
        value: f64,
        transition: Option<VisibilityTransition>,
        header: HeaderSnapshot,
    },
    Toggle {
        entity_id: EntityId,
        outcome: MutationOutcome,
        is_member: Option<bool>,
    },
    Diagnostics(SignalDiagnostics),
}

impl Scenario {
    pub fn resolve_config(&self) -> Result<EngineConfig> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => EngineConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(scenario: &Scenario) -> Result<Vec<ReplayEvent>> {
    let config = scenario.resolve_config()?;
    info!(
        "replaying {} scroll samples and {} toggles (threshold={}, fallback={})",
        scenario.scroll.len(),
        scenario.toggles.len(),
        config.threshold,
        config.use_wheel_fallback
    );

    let mut events = replay_scroll(&config, &scenario.scroll);
    events.extend(replay_toggles(&config, &scenario.toggles).await);
    Ok(events)
}

fn replay_scroll(config: &EngineConfig, steps: &[ScrollStep]) -> Vec<ReplayEvent> {
    let mut header = HeaderVisibility::new(config);
    let mut events = Vec::with_capacity(steps.len() + 1);

    for (index, step) in steps.iter().enumerate() {
        let transition = match step.source {
            SignalSource::Native => header.on_native_scroll(step.value, step.timestamp_ms),
            SignalSource::Wheel => header.on_wheel(step.value, step.timestamp_ms),
        };
        events.push(ReplayEvent::Scroll {
            index,
            source: step.source,
            value: step.value,
            transition,
            header: header.snapshot(),
        });
    }

    if let Some(diagnostics) = header.diagnostics() {
        events.push(ReplayEvent::Diagnostics(diagnostics.clone()));
    }
    events
}

async fn replay_toggles(config: &EngineConfig, steps: &[ToggleStep]) -> Vec<ReplayEvent> {
    let mutator = ToggleMutator::new(InMemoryMembershipStore::default());
    let timeout = config.mutation_timeout();

    let outcomes = join_all(steps.iter().map(|step| {
        let mutator = &mutator;
        async move {
            match timeout {
                Some(limit) => {
                    mutator
                        .toggle_with_deadline(&step.entity_id, step.current, step, tokio::time::sleep(limit))
                        .await
                }
                None => mutator.toggle(&step.entity_id, step.current, step).await,
            }
        }
    }))
    .await;

    steps
        .iter()
        .zip(outcomes)
        .map(|(step, outcome)| ReplayEvent::Toggle {
            entity_id: step.entity_id.clone(),
            outcome,
            is_member: mutator.is_member(&step.entity_id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_api_types::Visibility;

    fn scenario(raw: &str) -> Scenario {
        serde_json::from_str(raw).expect("scenario json")
    }

    #[tokio::test]
    async fn bundled_scenario_replays() -> anyhow::Result<()> {
        let scenario = scenario(include_str!("../scenarios/sticky-header.json"));
        let events = run(&scenario).await?;

        let hides = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    ReplayEvent::Scroll {
                        transition: Some(VisibilityTransition {
                            to: Visibility::Hidden,
                            ..
                        }),
                        ..
                    }
                )
            })
            .count();
        assert_eq!(hides, 1);
        assert!(events.iter().any(|event| matches!(event, ReplayEvent::Diagnostics(_))));

        let toggles: Vec<(&str, &MutationOutcome, Option<bool>)> = events
            .iter()
            .filter_map(|event| match event {
                ReplayEvent::Toggle {
                    entity_id,
                    outcome,
                    is_member,
                } => Some((entity_id.as_str(), outcome, *is_member)),
                _ => None,
            })
            .collect();

        assert_eq!(toggles.len(), 5);
        // The first p1 is still awaiting its response when the second arrives.
        assert!(toggles[0].1.success);
        assert!(toggles[1].1.is_already_in_progress());
        assert_eq!(toggles[1].2, Some(true));
        assert_eq!(toggles[2].2, Some(true));
        assert_eq!(toggles[3].1.message, "connection reset");
        assert_eq!(toggles[3].2, Some(false));
        assert_eq!(*toggles[4].1, MutationOutcome::timed_out());
        assert_eq!(toggles[4].2, Some(false));
        Ok(())
    }

    #[tokio::test]
    async fn empty_config_section_uses_defaults() -> anyhow::Result<()> {
        let scenario = scenario(r#"{"config": {}, "scroll": [{"source": "native", "value": 50}]}"#);
        let events = run(&scenario).await?;

        assert_eq!(events.len(), 1);
        let ReplayEvent::Scroll { header, transition, .. } = &events[0] else {
            panic!("expected a scroll event");
        };
        assert!(transition.is_none());
        assert_eq!(header.visibility, Visibility::Visible);
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected() {
        let scenario = scenario(r#"{"config": {"wheelSensitivity": -1}}"#);
        assert!(scenario.resolve_config().is_err());
    }
}
