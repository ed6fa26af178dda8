use alembic_core::Time;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{check_delay, check_propensity, derive_rng, Schedule, TimeDistribution};
use crate::environment::Environment;
use crate::error::DistributionError;

/// Firing delays drawn from an arbitrary non-negative real distribution.
///
/// A new delay is sampled when the reaction executes or when its
/// propensity becomes positive again after being zero. A zero
/// propensity blocks the reaction. Unlike [`ExponentialTime`](super::ExponentialTime)
/// the remaining wait is never rescaled.
#[derive(Clone, Debug)]
pub struct AnyRealDistribution<D> {
    schedule: Schedule,
    distribution: D,
    mean: f64,
    last_propensity: Option<f64>,
    rng: ChaCha8Rng,
}

impl<D> AnyRealDistribution<D>
where
    D: Distribution<f64> + Clone + Send + 'static,
{
    /// Wrap `distribution`, whose expected value is `mean`.
    ///
    /// The reported [`rate`](TimeDistribution::rate) is `1 / mean`.
    pub fn new(distribution: D, mean: f64, rng: ChaCha8Rng) -> Result<Self, DistributionError> {
        Self::starting_at(Time::ZERO, distribution, mean, rng)
    }

    /// Like [`new`](Self::new), gated until `start`.
    pub fn starting_at(
        start: Time,
        distribution: D,
        mean: f64,
        rng: ChaCha8Rng,
    ) -> Result<Self, DistributionError> {
        if !(mean.is_finite() && mean > 0.0) {
            return Err(DistributionError::InvalidParameters {
                reason: format!("mean must be finite and positive, got {mean}"),
            });
        }
        Ok(Self {
            schedule: Schedule::new(start),
            distribution,
            mean,
            last_propensity: None,
            rng,
        })
    }

    /// The wrapped distribution.
    pub fn distribution(&self) -> &D {
        &self.distribution
    }

    fn sample(&mut self, now: Time) -> Result<Time, DistributionError> {
        let delay = check_delay(self.rng.sample(&self.distribution))?;
        Ok(now.delay(delay)?)
    }
}

impl AnyRealDistribution<Uniform<f64>> {
    /// Delays uniform in `[low, high)`.
    pub fn uniform(low: f64, high: f64, rng: ChaCha8Rng) -> Result<Self, DistributionError> {
        if !(low.is_finite() && high.is_finite() && low >= 0.0 && low < high) {
            return Err(DistributionError::InvalidParameters {
                reason: format!("uniform bounds must satisfy 0 <= low < high, got [{low}, {high})"),
            });
        }
        Self::new(Uniform::new(low, high), (low + high) / 2.0, rng)
    }
}

impl AnyRealDistribution<LogNormal> {
    /// Log-normal delays with log-mean `mu` and log-deviation `sigma`.
    pub fn log_normal(mu: f64, sigma: f64, rng: ChaCha8Rng) -> Result<Self, DistributionError> {
        let log_normal = LogNormal::new(mu, sigma)?;
        Self::new(log_normal, log_normal.mean(), rng)
    }
}

/// `exp(N(mu, sigma²))`, sampled with the Box-Muller transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogNormal {
    mu: f64,
    sigma: f64,
}

impl LogNormal {
    /// Requires finite `mu` and finite, non-negative `sigma`.
    pub fn new(mu: f64, sigma: f64) -> Result<Self, DistributionError> {
        if !(mu.is_finite() && sigma.is_finite() && sigma >= 0.0) {
            return Err(DistributionError::InvalidParameters {
                reason: format!("log-normal needs finite mu and sigma >= 0, got ({mu}, {sigma})"),
            });
        }
        Ok(Self { mu, sigma })
    }

    /// Expected value, `exp(mu + sigma² / 2)`.
    pub fn mean(&self) -> f64 {
        (self.mu + self.sigma * self.sigma / 2.0).exp()
    }
}

impl Distribution<f64> for LogNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u1: f64 = rng.gen::<f64>().max(1e-300);
        let u2: f64 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        (self.mu + self.sigma * z).exp()
    }
}

impl<D> TimeDistribution for AnyRealDistribution<D>
where
    D: Distribution<f64> + Clone + Send + 'static,
{
    fn name(&self) -> &str {
        "any-real"
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
            None => self.sample(now)?,
            Some(old) if old == 0.0 || executed => self.sample(now)?,
            Some(_) => self.schedule.tau(),
        };
        self.schedule.set_tau(tau);
        self.last_propensity = Some(propensity);
        Ok(())
    }

    fn next_occurrence(&self) -> Time {
        self.schedule.tau()
    }

    fn rate(&self) -> f64 {
        1.0 / self.mean
    }

    fn clone_on_new_node(&mut self, start: Time) -> Box<dyn TimeDistribution> {
        Box::new(Self {
            schedule: Schedule::new(start),
            distribution: self.distribution.clone(),
            mean: self.mean,
            last_propensity: None,
            rng: derive_rng(&mut self.rng),
        })
    }
}
