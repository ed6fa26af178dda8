//! Simulated time.
//!
//! [`Time`] is a non-negative, never-NaN instant on the simulation
//! clock. [`Time::INFINITY`] is a first-class value meaning "never": it
//! absorbs under addition and positive scaling, so a blocked reaction
//! can be kept in the scheduler without special casing.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::error::TimeError;

/// An instant (or a span) on the simulation clock.
///
/// The wrapped value is always `>= 0.0` and never NaN, which is what
/// makes the [`Ord`] implementation total.
///
/// # Examples
///
/// ```
/// use alembic_core::Time;
///
/// let t = Time::from_secs(0.5).unwrap();
/// assert_eq!(t + t, Time::from_secs(1.0).unwrap());
/// assert_eq!(Time::INFINITY + t, Time::INFINITY);
/// assert!(Time::from_secs(f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Time(f64);

impl Time {
    /// The origin of the simulation clock.
    pub const ZERO: Time = Time(0.0);

    /// "Never". Scheduling a reaction at `INFINITY` blocks it.
    pub const INFINITY: Time = Time(f64::INFINITY);

    /// Build a time from seconds, rejecting NaN and negative values.
    pub fn from_secs(secs: f64) -> Result<Self, TimeError> {
        if secs.is_nan() {
            return Err(TimeError::NotANumber);
        }
        if secs < 0.0 {
            return Err(TimeError::Negative { value: secs });
        }
        // Normalise -0.0 so that equality and hashing of the bits agree.
        Ok(Self(secs + 0.0))
    }

    /// The raw value in seconds.
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Whether this is [`Time::INFINITY`].
    pub fn is_infinite(self) -> bool {
        self.0.is_infinite()
    }

    /// Whether this is a finite instant.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Advance by a delta expressed in seconds.
    ///
    /// Negative or NaN deltas are rejected: time distributions must never
    /// schedule into the past.
    pub fn delay(self, delta: f64) -> Result<Self, TimeError> {
        Ok(self + Time::from_secs(delta)?)
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

/// Saturating subtraction: the result never drops below [`Time::ZERO`].
///
/// `INFINITY - t` is `INFINITY` for finite `t`; `INFINITY - INFINITY`
/// is defined as `ZERO` rather than NaN.
impl Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        if self.is_infinite() && rhs.is_infinite() {
            return Time::ZERO;
        }
        Time((self.0 - rhs.0).max(0.0))
    }
}

/// Scalar scaling by a finite, non-negative factor.
///
/// `INFINITY * 0.0` is `ZERO`. Negative or NaN factors are a caller bug;
/// they are clamped to zero in release builds.
impl Mul<f64> for Time {
    type Output = Time;

    fn mul(self, factor: f64) -> Time {
        debug_assert!(
            factor >= 0.0 && !factor.is_nan(),
            "time scaled by invalid factor {factor}"
        );
        if factor.is_nan() || factor <= 0.0 {
            return Time::ZERO;
        }
        Time(self.0 * factor)
    }
}

impl TryFrom<f64> for Time {
    type Error = TimeError;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        Time::from_secs(secs)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "∞")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(secs: f64) -> Time {
        Time::from_secs(secs).unwrap()
    }

    #[test]
    fn rejects_nan_and_negative() {
        assert_eq!(Time::from_secs(f64::NAN), Err(TimeError::NotANumber));
        assert_eq!(
            Time::from_secs(-1.0),
            Err(TimeError::Negative { value: -1.0 })
        );
    }

    #[test]
    fn infinity_absorbs() {
        assert_eq!(Time::INFINITY + t(3.0), Time::INFINITY);
        assert_eq!(Time::INFINITY * 2.0, Time::INFINITY);
        assert_eq!(Time::INFINITY - t(3.0), Time::INFINITY);
    }

    #[test]
    fn infinity_edge_cases_never_produce_nan() {
        assert_eq!(Time::INFINITY - Time::INFINITY, Time::ZERO);
        assert_eq!(Time::INFINITY * 0.0, Time::ZERO);
        assert!(!(Time::INFINITY - Time::INFINITY).as_secs().is_nan());
    }

    #[test]
    fn subtraction_saturates_at_zero() {
        assert_eq!(t(1.0) - t(3.0), Time::ZERO);
        assert_eq!(t(3.0) - t(1.0), t(2.0));
    }

    #[test]
    fn delay_rejects_negative_delta() {
        assert!(t(1.0).delay(-0.5).is_err());
        assert!(t(1.0).delay(f64::NAN).is_err());
        assert_eq!(t(1.0).delay(0.5).unwrap(), t(1.5));
    }

    #[test]
    fn negative_zero_is_normalised() {
        assert_eq!(Time::from_secs(-0.0).unwrap(), Time::ZERO);
        assert_eq!(Time::from_secs(-0.0).unwrap().cmp(&Time::ZERO), Ordering::Equal);
    }

    #[test]
    fn infinity_is_greatest() {
        assert!(Time::INFINITY > t(f64::MAX));
        assert_eq!(Time::INFINITY.to_string(), "∞");
    }

    proptest! {
        #[test]
        fn ordering_matches_f64(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            prop_assert_eq!(t(a).cmp(&t(b)), a.partial_cmp(&b).unwrap());
        }

        #[test]
        fn add_then_sub_round_trips(a in 0.0f64..1e6, b in 0.0f64..1e6) {
            let back = (t(a) + t(b)) - t(b);
            prop_assert!((back.as_secs() - a).abs() <= 1e-6 * (1.0 + a));
        }
    }
}
