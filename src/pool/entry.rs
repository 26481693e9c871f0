//! Paired samples stored by the history buffer.

use ndarray::{Array, Dimension};

use crate::error::{Error, Result};

/// An ordered pair of samples, such as a generated image and its counterpart.
///
/// The halves are addressed as `a` and `b`. The history buffer may swap each
/// half independently, so an entry handed back from it can combine halves
/// that were submitted in different calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    pub(crate) a: T,
    pub(crate) b: T,
}

impl<T> Entry<T> {
    /// Build a pair without any validation.
    ///
    /// For array halves prefer [`Entry::paired`], which checks that both
    /// halves share a shape.
    #[must_use]
    pub const fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// The A half.
    #[must_use]
    pub const fn a(&self) -> &T {
        &self.a
    }

    /// The B half.
    #[must_use]
    pub const fn b(&self) -> &T {
        &self.b
    }

    /// Split the pair into its halves.
    #[must_use]
    pub fn into_parts(self) -> (T, T) {
        (self.a, self.b)
    }
}

impl<T> From<(T, T)> for Entry<T> {
    fn from((a, b): (T, T)) -> Self {
        Self::new(a, b)
    }
}

impl<A, D: Dimension> Entry<Array<A, D>> {
    /// Build a pair of arrays, checking that both halves have the same shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ.
    pub fn paired(a: Array<A, D>, b: Array<A, D>) -> Result<Self> {
        if a.shape() != b.shape() {
            return Err(Error::shape(a.shape(), b.shape()));
        }
        Ok(Self::new(a, b))
    }

    /// Shape of the A half.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.a.shape()
    }
}
