use alembic_core::Time;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{check_delay, check_propensity, check_rate, derive_rng, Schedule, TimeDistribution};
use crate::environment::Environment;
use crate::error::DistributionError;

/// Memoryless firing times with parameter equal to the propensity.
///
/// Transitions of the propensity from one update to the next:
///
/// | before   | after    | effect                                      |
/// |----------|----------|---------------------------------------------|
/// | none / 0 | > 0      | fresh sample                                |
/// | > 0      | > 0      | fresh sample if executed, else rescale wait |
/// | > 0      | 0        | blocked (`tau = INFINITY`)                  |
/// | none     | 0        | blocked                                     |
///
/// Rescaling keeps the memoryless property: the remaining wait
/// `tau - now` is multiplied by `old / new`.
#[derive(Clone, Debug)]
pub struct ExponentialTime {
    schedule: Schedule,
    rate: f64,
    last_propensity: Option<f64>,
    rng: ChaCha8Rng,
}

impl ExponentialTime {
    /// Exponential times with base `rate`, starting at time zero.
    pub fn new(rate: f64, rng: ChaCha8Rng) -> Result<Self, DistributionError> {
        Self::starting_at(Time::ZERO, rate, rng)
    }

    /// Exponential times with base `rate`, starting at `start`.
    pub fn starting_at(start: Time, rate: f64, rng: ChaCha8Rng) -> Result<Self, DistributionError> {
        Ok(Self {
            schedule: Schedule::new(start),
            rate: check_rate(rate)?,
            last_propensity: None,
            rng,
        })
    }

    fn sample(&mut self, now: Time, propensity: f64) -> Result<Time, DistributionError> {
        // Inverse CDF of Exp(1); `1 - u` lies in (0, 1] so the log is finite.
        let u: f64 = self.rng.gen();
        let unit = -(1.0 - u).ln();
        let delay = check_delay(unit / propensity)?;
        Ok(now.delay(delay)?)
    }

    fn rescale(&self, now: Time, old: f64, new: f64) -> Result<Time, DistributionError> {
        if new == 0.0 {
            return Err(DistributionError::ZeroPropensityRescale);
        }
        let remaining = self.schedule.tau() - now;
        Ok(now + remaining * (old / new))
    }
}

impl TimeDistribution for ExponentialTime {
    fn name(&self) -> &str {
        "exponential"
    }

    fn update(
        &mut self,
        now: Time,
        executed: bool,
        propensity: f64,
        _env: &Environment,
    ) -> Result<(), DistributionError> {
        let propensity = check_propensity(propensity)?;
        if !self.schedule.open(now) {
            return Ok(());
        }
        let tau = match self.last_propensity {
            _ if propensity == 0.0 => Time::INFINITY,
            None => self.sample(now, propensity)?,
            Some(old) if old == 0.0 || executed => self.sample(now, propensity)?,
            Some(old) if old == propensity => self.schedule.tau(),
            Some(old) => self.rescale(now, old, propensity)?,
        };
        self.schedule.set_tau(tau);
        self.last_propensity = Some(propensity);
        Ok(())
    }

    fn next_occurrence(&self) -> Time {
        self.schedule.tau()
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn clone_on_new_node(&mut self, start: Time) -> Box<dyn TimeDistribution> {
        Box::new(Self {
            schedule: Schedule::new(start),
            rate: self.rate,
            last_propensity: None,
            rng: derive_rng(&mut self.rng),
        })
    }
}
