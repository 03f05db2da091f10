//! Validated configuration for the runner and the orchestration strategy.

use axon_orch::{
    CollaborativeOrchestrator, FailurePolicy, LoopOrchestrator, MixedOrchestrator, Orchestrator,
    RouteOrchestrator, SequentialOrchestrator,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the event queue capacity.
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_STOP_GRACE_SECS: u64 = 5;

/// Configuration rejections. Produced before the core starts — a config
/// that validates is one the runner and orchestrators accept as-is.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field required by the selected mode is missing or empty.
    #[error("missing required field `{0}` for {1:?} mode")]
    Missing(&'static str, OrchestrationMode),

    /// A field value is outside its accepted range.
    #[error("field `{field}` out of range: {reason}")]
    OutOfRange {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field is set that the selected mode does not use.
    #[error("field `{field}` conflicts with {mode:?} mode")]
    Conflict {
        /// The offending field.
        field: &'static str,
        /// The mode it conflicts with.
        mode: OrchestrationMode,
    },
}

/// Runner pool and queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Event queue capacity. `1..=MAX_QUEUE_CAPACITY`.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Worker pool size. Defaults to the number of available CPUs.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds to wait for in-flight handlers on stop before aborting them.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

fn default_stop_grace_secs() -> u64 {
    DEFAULT_STOP_GRACE_SECS
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            stop_grace_secs: default_stop_grace_secs(),
        }
    }
}

impl RunnerConfig {
    /// Reject out-of-range pool and queue settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::OutOfRange {
                field: "queue_capacity",
                reason: format!(
                    "{} not in 1..={MAX_QUEUE_CAPACITY}",
                    self.queue_capacity
                ),
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::OutOfRange {
                field: "workers",
                reason: "worker pool must have at least one slot".into(),
            });
        }
        Ok(())
    }

    /// The stop grace period as a duration.
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }
}

/// Which orchestration strategy handles dispatched events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    /// One handler per event, selected by the `route` header.
    Route,
    /// Parallel broadcast to every registered handler.
    Collaborative,
    /// An ordered pipeline of named handlers.
    Sequential,
    /// One handler invoked iteratively.
    Loop,
    /// A parallel phase followed by a pipeline phase.
    Mixed,
}

/// Orchestration strategy settings. Semantic names, not a file format —
/// parse and resolve first, then hand the result here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// The strategy to build.
    pub mode: OrchestrationMode,

    /// Dispatch deadline in seconds. Zero or absent means no deadline.
    #[serde(default)]
    pub timeout_seconds: u64,

    /// Worker pool size hint; overrides `RunnerConfig::workers` when set.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Tolerated failed fraction in `[0, 1]` for collaborative mode.
    /// Absent means best-effort (any success carries the dispatch).
    #[serde(default)]
    pub failure_threshold: Option<f64>,

    /// Ordered pipeline for sequential and mixed modes.
    #[serde(default)]
    pub sequential_agents: Vec<String>,

    /// Parallel-phase agents for mixed mode (order carries no meaning).
    #[serde(default)]
    pub collaborative_agents: Vec<String>,

    /// The iterated agent for loop mode.
    #[serde(default)]
    pub loop_agent: Option<String>,

    /// Iteration cap for loop mode. Defaults to 5; zero is rejected.
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl OrchestrationConfig {
    /// A minimal config for the given mode. Callers fill in the
    /// mode-specific fields before validating.
    pub fn new(mode: OrchestrationMode) -> Self {
        Self {
            mode,
            timeout_seconds: 0,
            max_concurrency: None,
            failure_threshold: None,
            sequential_agents: Vec::new(),
            collaborative_agents: Vec::new(),
            loop_agent: None,
            max_iterations: None,
        }
    }

    /// Reject missing and contradictory values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(limit) = self.max_concurrency {
            if limit == 0 {
                return Err(ConfigError::OutOfRange {
                    field: "max_concurrency",
                    reason: "must be at least 1".into(),
                });
            }
        }
        if let Some(threshold) = self.failure_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::OutOfRange {
                    field: "failure_threshold",
                    reason: format!("{threshold} not in [0, 1]"),
                });
            }
            if self.mode != OrchestrationMode::Collaborative {
                return Err(ConfigError::Conflict {
                    field: "failure_threshold",
                    mode: self.mode,
                });
            }
        }
        if self.sequential_agents.iter().any(String::is_empty) {
            return Err(ConfigError::OutOfRange {
                field: "sequential_agents",
                reason: "agent names must not be empty".into(),
            });
        }
        if self.collaborative_agents.iter().any(String::is_empty) {
            return Err(ConfigError::OutOfRange {
                field: "collaborative_agents",
                reason: "agent names must not be empty".into(),
            });
        }

        let loop_fields_set = self.loop_agent.is_some() || self.max_iterations.is_some();

        match self.mode {
            OrchestrationMode::Route | OrchestrationMode::Collaborative => {
                if !self.sequential_agents.is_empty() {
                    return Err(ConfigError::Conflict {
                        field: "sequential_agents",
                        mode: self.mode,
                    });
                }
                if loop_fields_set {
                    return Err(ConfigError::Conflict {
                        field: "loop_agent",
                        mode: self.mode,
                    });
                }
            }
            OrchestrationMode::Sequential => {
                if self.sequential_agents.is_empty() {
                    return Err(ConfigError::Missing("sequential_agents", self.mode));
                }
                if !self.collaborative_agents.is_empty() {
                    return Err(ConfigError::Conflict {
                        field: "collaborative_agents",
                        mode: self.mode,
                    });
                }
                if loop_fields_set {
                    return Err(ConfigError::Conflict {
                        field: "loop_agent",
                        mode: self.mode,
                    });
                }
            }
            OrchestrationMode::Loop => {
                match &self.loop_agent {
                    Some(agent) if !agent.is_empty() => {}
                    _ => return Err(ConfigError::Missing("loop_agent", self.mode)),
                }
                if self.max_iterations == Some(0) {
                    return Err(ConfigError::OutOfRange {
                        field: "max_iterations",
                        reason: "must be at least 1".into(),
                    });
                }
                if !self.sequential_agents.is_empty() || !self.collaborative_agents.is_empty() {
                    return Err(ConfigError::Conflict {
                        field: "sequential_agents",
                        mode: self.mode,
                    });
                }
            }
            OrchestrationMode::Mixed => {
                if self.sequential_agents.is_empty() && self.collaborative_agents.is_empty() {
                    return Err(ConfigError::Missing("collaborative_agents", self.mode));
                }
                if loop_fields_set {
                    return Err(ConfigError::Conflict {
                        field: "loop_agent",
                        mode: self.mode,
                    });
                }
            }
        }
        Ok(())
    }

    /// The dispatch deadline, when configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    /// The collaborative failure policy this config selects.
    pub fn failure_policy(&self) -> FailurePolicy {
        match self.failure_threshold {
            Some(threshold) => FailurePolicy::Threshold(threshold),
            None => FailurePolicy::BestEffort,
        }
    }
}

/// Build the orchestrator a validated config describes.
pub fn build_orchestrator(
    config: &OrchestrationConfig,
) -> Result<Arc<dyn Orchestrator>, ConfigError> {
    config.validate()?;
    let orchestrator: Arc<dyn Orchestrator> = match config.mode {
        OrchestrationMode::Route => Arc::new(RouteOrchestrator::new()),
        OrchestrationMode::Collaborative => {
            Arc::new(CollaborativeOrchestrator::new().with_policy(config.failure_policy()))
        }
        OrchestrationMode::Sequential => {
            Arc::new(SequentialOrchestrator::new(config.sequential_agents.clone()))
        }
        OrchestrationMode::Loop => {
            // validate() guarantees the agent is present.
            let agent = config.loop_agent.clone().unwrap_or_default();
            let mut orch = LoopOrchestrator::new(agent);
            if let Some(cap) = config.max_iterations {
                orch = orch.with_max_iterations(cap);
            }
            Arc::new(orch)
        }
        OrchestrationMode::Mixed => Arc::new(MixedOrchestrator::new(
            config.collaborative_agents.clone(),
            config.sequential_agents.clone(),
        )),
    };
    Ok(orchestrator)
}
