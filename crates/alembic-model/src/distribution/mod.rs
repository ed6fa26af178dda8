//! Time distributions: when does a reaction fire next?
//!
//! A distribution holds the reaction's putative next occurrence (`tau`)
//! and revises it in [`TimeDistribution::update`] whenever the engine
//! reports that the reaction executed or that something it reads
//! changed. Every variant shares the same start gate: before `start` the
//! distribution ignores updates and reports `start` as its next
//! occurrence.
//!
//! The engine schedules each reaction the first time with
//! `executed = true`, so periodic variants place their first firing one
//! period after the start.

mod any_real;
mod dirac;
mod exponential;
mod trigger;

pub use any_real::{AnyRealDistribution, LogNormal};
pub use dirac::{DiracComb, RandomDiracComb};
pub use exponential::ExponentialTime;
pub use trigger::Trigger;

use alembic_core::Time;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::environment::Environment;
use crate::error::DistributionError;

/// Decides the next occurrence of a reaction.
pub trait TimeDistribution: Send + 'static {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Revise the next occurrence.
    ///
    /// `executed` is true when the owning reaction has just fired (or is
    /// being scheduled for the first time). `propensity` is the
    /// reaction's current aggregated propensity.
    fn update(
        &mut self,
        now: Time,
        executed: bool,
        propensity: f64,
        env: &Environment,
    ) -> Result<(), DistributionError>;

    /// The putative next occurrence.
    fn next_occurrence(&self) -> Time;

    /// Base rate, used by kinetics to compute the propensity.
    fn rate(&self) -> f64;

    /// A fresh copy for a reaction cloned onto a new node, starting at
    /// `start`. Stochastic variants derive the copy's generator from
    /// their own, so the copy is deterministic but independent.
    fn clone_on_new_node(&mut self, start: Time) -> Box<dyn TimeDistribution>;
}

/// Start gate and current `tau` shared by every variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Schedule {
    start: Time,
    tau: Time,
    started: bool,
}

impl Schedule {
    pub(crate) fn new(start: Time) -> Self {
        Self {
            start,
            tau: start,
            started: false,
        }
    }

    /// Open the gate once `now` reaches `start`. Returns whether updates apply.
    pub(crate) fn open(&mut self, now: Time) -> bool {
        if !self.started && now >= self.start {
            self.started = true;
        }
        self.started
    }

    pub(crate) fn start(&self) -> Time {
        self.start
    }

    pub(crate) fn tau(&self) -> Time {
        self.tau
    }

    pub(crate) fn set_tau(&mut self, tau: Time) {
        self.tau = tau;
    }
}

pub(crate) fn check_rate(rate: f64) -> Result<f64, DistributionError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(DistributionError::InvalidRate { value: rate })
    }
}

pub(crate) fn check_propensity(propensity: f64) -> Result<f64, DistributionError> {
    if propensity.is_finite() && propensity >= 0.0 {
        Ok(propensity)
    } else {
        Err(DistributionError::InvalidPropensity { value: propensity })
    }
}

pub(crate) fn check_delay(delay: f64) -> Result<f64, DistributionError> {
    if delay.is_nan() || delay < 0.0 {
        Err(DistributionError::NegativeDelay { value: delay })
    } else {
        Ok(delay)
    }
}

/// Seed a child generator from a parent one.
pub(crate) fn derive_rng(parent: &mut ChaCha8Rng) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(parent.gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_opens_at_start() {
        let mut s = Schedule::new(Time::from_secs(2.0).unwrap());
        assert!(!s.open(Time::ZERO));
        assert!(s.open(Time::from_secs(2.0).unwrap()));
        assert_eq!(s.tau(), s.start());
    }

    #[test]
    fn propensity_validation() {
        assert!(check_propensity(0.0).is_ok());
        assert!(check_propensity(f64::NAN).is_err());
        assert!(check_propensity(-1.0).is_err());
        assert!(check_rate(0.0).is_err());
        assert!(check_delay(-0.1).is_err());
    }

    #[test]
    fn derived_generators_are_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(1);
        let mut b = ChaCha8Rng::seed_from_u64(1);
        let x: u64 = derive_rng(&mut a).gen();
        let y: u64 = derive_rng(&mut b).gen();
        assert_eq!(x, y);
    }
}
