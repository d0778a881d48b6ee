// THEORY:
// A `Descriptor` is the comparable signature of one image: a fixed-length vector of
// non-negative numbers. It is created once, never mutated, and only ever compared
// against descriptors produced by the same configuration. The type enforces the
// value domain (finite, non-negative) at construction; length agreement is checked
// by whoever compares two of them.

use crate::error::{InvalidInput, RetrievalResult};

pub type BinValue = f64;

/// The basis used to rescale a raw histogram so that image size drops out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Normalization {
    /// Divide by the Euclidean norm; every non-empty descriptor has unit length.
    #[default]
    L2,
    /// Divide by the sum; every non-empty descriptor is a probability distribution.
    L1,
}

impl Normalization {
    /// Rescales `values` in place. An all-zero vector is left untouched.
    pub(crate) fn apply(self, values: &mut [BinValue]) {
        let norm = match self {
            Normalization::L2 => values.iter().map(|v| v * v).sum::<BinValue>().sqrt(),
            Normalization::L1 => values.iter().sum::<BinValue>(),
        };
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
    }
}

/// An immutable, fixed-length color signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    values: Box<[BinValue]>,
}

impl Descriptor {
    /// Wraps externally supplied values, rejecting anything outside `[0, +inf)`.
    pub fn new(values: Vec<BinValue>) -> RetrievalResult<Self> {
        if let Some((position, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(InvalidInput::InvalidDescriptorValue { position, value }.into());
        }
        Ok(Self { values: values.into_boxed_slice() })
    }

    /// Used by the extractor, whose values are non-negative by construction.
    pub(crate) fn from_histogram(values: Vec<BinValue>) -> Self {
        Self { values: values.into_boxed_slice() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[BinValue] {
        &self.values
    }

    /// Sum of all values. Equals 1.0 for L1-normalized descriptors of non-empty images.
    pub fn total(&self) -> BinValue {
        self.values.iter().sum()
    }
}

impl AsRef<[BinValue]> for Descriptor {
    fn as_ref(&self) -> &[BinValue] {
        &self.values
    }
}

impl TryFrom<Vec<BinValue>> for Descriptor {
    type Error = crate::error::RetrievalError;

    fn try_from(values: Vec<BinValue>) -> RetrievalResult<Self> {
        Descriptor::new(values)
    }
}
