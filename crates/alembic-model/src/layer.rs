//! Layers: spatial fields sampled by position and time.

use std::fmt;

use alembic_core::{Position, Time};

/// A continuous field over the environment, keyed by molecule.
pub trait Layer: Send + Sync + 'static {
    /// Value of the field at `position` and `time`.
    fn value(&self, time: Time, position: &Position) -> f64;
}

/// Same value everywhere, at any time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformLayer {
    value: f64,
}

impl UniformLayer {
    /// A layer with constant `value`.
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Layer for UniformLayer {
    fn value(&self, _time: Time, _position: &Position) -> f64 {
        self.value
    }
}

/// A layer backed by a closure.
pub struct FunctionLayer<F> {
    f: F,
}

impl<F> FunctionLayer<F>
where
    F: Fn(Time, &Position) -> f64 + Send + Sync + 'static,
{
    /// Wrap `f` as a layer.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Layer for FunctionLayer<F>
where
    F: Fn(Time, &Position) -> f64 + Send + Sync + 'static,
{
    fn value(&self, time: Time, position: &Position) -> f64 {
        (self.f)(time, position)
    }
}

impl<F> fmt::Debug for FunctionLayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionLayer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_ignores_inputs() {
        let layer = UniformLayer::new(4.0);
        assert_eq!(layer.value(Time::ZERO, &Position::from([1.0, 2.0])), 4.0);
    }

    #[test]
    fn function_layer_sees_position() {
        let layer = FunctionLayer::new(|_, p: &Position| p.coordinates()[0] * 2.0);
        assert_eq!(layer.value(Time::ZERO, &Position::from([3.0])), 6.0);
    }
}
