//! Continuous n-dimensional positions.

use std::fmt;

use smallvec::SmallVec;

/// A point in a continuous Euclidean space.
///
/// Uses `SmallVec<[f64; 3]>` so positions of up to three dimensions
/// never touch the heap.
///
/// # Examples
///
/// ```
/// use alembic_core::Position;
///
/// let a = Position::new([0.0, 0.0]);
/// let b = Position::new([3.0, 4.0]);
/// assert_eq!(a.distance(&b), 5.0);
/// assert_eq!(a.translated(&[3.0, 4.0]), b);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Position(SmallVec<[f64; 3]>);

impl Position {
    /// Build a position from its coordinates.
    pub fn new(coords: impl IntoIterator<Item = f64>) -> Self {
        Self(coords.into_iter().collect())
    }

    /// The origin of a space with `dimensions` axes.
    pub fn origin(dimensions: usize) -> Self {
        Self(SmallVec::from_elem(0.0, dimensions))
    }

    /// Number of coordinates.
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Coordinates as a slice.
    pub fn coordinates(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance. Missing axes count as zero.
    pub fn distance(&self, other: &Position) -> f64 {
        let n = self.0.len().max(other.0.len());
        (0..n)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0.0);
                let b = other.0.get(i).copied().unwrap_or(0.0);
                (a - b) * (a - b)
            })
            .sum::<f64>()
            .sqrt()
    }

    /// A copy of this position shifted by `offset`.
    pub fn translated(&self, offset: &[f64]) -> Position {
        let mut out = self.0.clone();
        for (c, d) in out.iter_mut().zip(offset) {
            *c += d;
        }
        Position(out)
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl From<Vec<f64>> for Position {
    fn from(v: Vec<f64>) -> Self {
        Self(SmallVec::from_vec(v))
    }
}

impl<const N: usize> From<[f64; N]> for Position {
    fn from(v: [f64; N]) -> Self {
        Self::new(v)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}
