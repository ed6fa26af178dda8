use alembic_core::Time;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{check_propensity, check_rate, derive_rng, Schedule, TimeDistribution};
use crate::environment::Environment;
use crate::error::DistributionError;

/// Fires with a fixed period `1 / rate`, ignoring the propensity.
///
/// ```
/// use alembic_core::Time;
/// use alembic_model::{DiracComb, Environment, TimeDistribution};
///
/// let env = Environment::new(1);
/// let mut comb = DiracComb::new(2.0).unwrap();
/// comb.update(Time::ZERO, true, 1.0, &env).unwrap();
/// assert_eq!(comb.next_occurrence(), Time::from_secs(0.5).unwrap());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DiracComb {
    schedule: Schedule,
    rate: f64,
    period: f64,
}

impl DiracComb {
    /// A comb starting at time zero.
    pub fn new(rate: f64) -> Result<Self, DistributionError> {
        Self::starting_at(Time::ZERO, rate)
    }

    /// A comb that starts at `start`.
    pub fn starting_at(start: Time, rate: f64) -> Result<Self, DistributionError> {
        let rate = check_rate(rate)?;
        Ok(Self {
            schedule: Schedule::new(start),
            rate,
            period: 1.0 / rate,
        })
    }

    /// The time between firings.
    pub fn period(&self) -> f64 {
        self.period
    }
}

impl TimeDistribution for DiracComb {
    fn name(&self) -> &str {
        "dirac-comb"
    }

    fn update(
        &mut self,
        now: Time,
        executed: bool,
        propensity: f64,
        _env: &Environment,
    ) -> Result<(), DistributionError> {
        check_propensity(propensity)?;
        if !self.schedule.open(now) {
            return Ok(());
        }
        if executed {
            self.schedule.set_tau(now.delay(self.period)?);
        }
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
            period: self.period,
        })
    }
}

/// A Dirac comb whose rate is drawn once, uniformly in `[min_rate, max_rate]`.
#[derive(Clone, Debug)]
pub struct RandomDiracComb {
    comb: DiracComb,
    min_rate: f64,
    max_rate: f64,
    rng: ChaCha8Rng,
}

impl RandomDiracComb {
    /// Draw the rate from `rng` and build the comb.
    pub fn new(
        start: Time,
        min_rate: f64,
        max_rate: f64,
        mut rng: ChaCha8Rng,
    ) -> Result<Self, DistributionError> {
        check_rate(min_rate)?;
        check_rate(max_rate)?;
        if min_rate > max_rate {
            return Err(DistributionError::InvalidParameters {
                reason: format!("min rate {min_rate} exceeds max rate {max_rate}"),
            });
        }
        let rate = rng.gen_range(min_rate..=max_rate);
        Ok(Self {
            comb: DiracComb::starting_at(start, rate)?,
            min_rate,
            max_rate,
            rng,
        })
    }

    /// The drawn rate bounds.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min_rate, self.max_rate)
    }
}

impl TimeDistribution for RandomDiracComb {
    fn name(&self) -> &str {
        "random-dirac-comb"
    }

    fn update(
        &mut self,
        now: Time,
        executed: bool,
        propensity: f64,
        env: &Environment,
    ) -> Result<(), DistributionError> {
        self.comb.update(now, executed, propensity, env)
    }

    fn next_occurrence(&self) -> Time {
        self.comb.next_occurrence()
    }

    fn rate(&self) -> f64 {
        self.comb.rate()
    }

    fn clone_on_new_node(&mut self, start: Time) -> Box<dyn TimeDistribution> {
        let rng = derive_rng(&mut self.rng);
        match Self::new(start, self.min_rate, self.max_rate, rng) {
            Ok(copy) => Box::new(copy),
            // Bounds were validated at construction; keep the parent's rate.
            Err(_) => self.comb.clone_on_new_node(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn t(secs: f64) -> Time {
        Time::from_secs(secs).unwrap()
    }

    #[test]
    fn ten_firings_at_half_second_spacing() {
        let env = Environment::new(1);
        let mut comb = DiracComb::new(2.0).unwrap();
        comb.update(Time::ZERO, true, 2.0, &env).unwrap();
        let mut seen = Vec::new();
        for _ in 0..10 {
            let now = comb.next_occurrence();
            seen.push(now.as_secs());
            comb.update(now, true, 2.0, &env).unwrap();
        }
        let expected: Vec<f64> = (1..=10).map(|i| i as f64 * 0.5).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn not_executed_keeps_tau() {
        let env = Environment::new(1);
        let mut comb = DiracComb::new(1.0).unwrap();
        comb.update(Time::ZERO, true, 1.0, &env).unwrap();
        comb.update(t(0.3), false, 1.0, &env).unwrap();
        assert_eq!(comb.next_occurrence(), t(1.0));
    }

    #[test]
    fn waits_for_start() {
        let env = Environment::new(1);
        let mut comb = DiracComb::starting_at(t(3.0), 1.0).unwrap();
        comb.update(Time::ZERO, true, 1.0, &env).unwrap();
        assert_eq!(comb.next_occurrence(), t(3.0));
        comb.update(t(3.0), true, 1.0, &env).unwrap();
        assert_eq!(comb.next_occurrence(), t(4.0));
    }

    #[test]
    fn rejects_nan_propensity_and_bad_rate() {
        let env = Environment::new(1);
        let mut comb = DiracComb::new(1.0).unwrap();
        assert!(comb.update(Time::ZERO, true, f64::NAN, &env).is_err());
        assert_eq!(DiracComb::new(0.0), Err(DistributionError::InvalidRate { value: 0.0 }));
    }

    #[test]
    fn random_comb_draws_within_bounds() {
        let mut comb =
            RandomDiracComb::new(Time::ZERO, 1.0, 4.0, ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert!((1.0..=4.0).contains(&comb.rate()));
        let copy = comb.clone_on_new_node(t(2.0));
        assert!((1.0..=4.0).contains(&copy.rate()));
        assert_eq!(copy.next_occurrence(), t(2.0));
    }

    #[test]
    fn random_comb_with_equal_bounds_is_fixed() {
        let comb =
            RandomDiracComb::new(Time::ZERO, 2.0, 2.0, ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert_eq!(comb.rate(), 2.0);
    }
}
