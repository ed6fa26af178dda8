//! Simulation and engine configuration, validation, and error types.

use alembic_core::Time;
use thiserror::Error;

// ── SimulationConfig ───────────────────────────────────────────────

/// Parameters of a single simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Seed for the engine's random generator (actions and defaults).
    pub seed: u64,
    /// Stop once the next event would occur after this time.
    /// Default: [`Time::INFINITY`].
    pub end_time: Time,
    /// Stop after this many steps. `None` = unbounded.
    pub max_steps: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            end_time: Time::INFINITY,
            max_steps: None,
        }
    }
}

impl SimulationConfig {
    /// Default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_time == Time::ZERO {
            return Err(ConfigError::InvalidEndTime {
                value: self.end_time,
            });
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::ZeroMaxSteps);
        }
        Ok(())
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Parameters of the threaded [`Engine`](crate::Engine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Name of the loop thread. Default: `"alembic-loop"`.
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: "alembic-loop".into(),
        }
    }
}

impl EngineConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The end time leaves nothing to simulate.
    #[error("end time must be after zero, got {value}")]
    InvalidEndTime {
        /// The rejected end time.
        value: Time,
    },
    /// `max_steps` is `Some(0)`.
    #[error("max_steps must be at least 1")]
    ZeroMaxSteps,
    /// The loop thread name is empty.
    #[error("thread name must not be empty")]
    EmptyThreadName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_bounds() {
        let cfg = SimulationConfig {
            end_time: Time::ZERO,
            ..SimulationConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidEndTime { value: Time::ZERO })
        );
        let cfg = SimulationConfig {
            max_steps: Some(0),
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxSteps));
    }

    #[test]
    fn rejects_blank_thread_name() {
        let cfg = EngineConfig {
            thread_name: "  ".into(),
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyThreadName));
    }
}
