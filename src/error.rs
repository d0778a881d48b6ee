// THEORY:
// Every failure the retrieval engine can produce is a caller misconfiguration:
// an empty or malformed image, an impossible bin layout, or an index whose
// descriptors were produced under a different configuration than the query.
// None of them are transient, so nothing here is retried. Each variant carries
// enough detail for the caller to find the precondition that failed.

use thiserror::Error;

/// Preconditions rejected before any histogram or distance work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// The image has zero pixels.
    #[error("image has no pixels")]
    EmptyImage,

    /// A channel was configured with zero histogram bins.
    #[error("channel {channel} has a non-positive bin count ({bins})")]
    NonPositiveBinCount { channel: usize, bins: u32 },

    /// The product of the bin counts does not fit in memory addressing.
    #[error("bin layout {bins:?} produces a descriptor too large to address")]
    DescriptorTooLarge { bins: [u32; 3] },

    /// The declared dimensions describe more data than can be addressed.
    #[error("frame dimensions {width}x{height} are too large to address")]
    DimensionsTooLarge { width: u32, height: u32 },

    /// A raw pixel buffer does not match the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A descriptor value lies outside the non-negative finite domain.
    #[error("descriptor value {value} at position {position} is negative or not finite")]
    InvalidDescriptorValue { position: usize, value: f64 },
}

/// All errors that can occur in the retrieval engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// Two descriptors that must be compared differ in length.
    #[error(
        "mismatched descriptor{}: expected length {expected}, found {found}",
        identifier_suffix(.identifier)
    )]
    MismatchedDescriptor {
        /// The index entry whose descriptor disagreed with the query, if any.
        identifier: Option<String>,
        expected: usize,
        found: usize,
    },

    /// A ranking shard did not complete.
    #[error("search worker failed: {0}")]
    WorkerFailed(String),
}

fn identifier_suffix(identifier: &Option<String>) -> String {
    match identifier {
        Some(id) => format!(" for {id}"),
        None => String::new(),
    }
}

/// Convenience result type for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_identifier() {
        let err = RetrievalError::MismatchedDescriptor {
            identifier: Some("\"beach.png\"".to_string()),
            expected: 512,
            found: 64,
        };
        assert_eq!(
            err.to_string(),
            "mismatched descriptor for \"beach.png\": expected length 512, found 64"
        );
    }

    #[test]
    fn mismatch_message_without_identifier() {
        let err = RetrievalError::MismatchedDescriptor { identifier: None, expected: 3, found: 2 };
        assert_eq!(err.to_string(), "mismatched descriptor: expected length 3, found 2");
    }

    #[test]
    fn invalid_input_converts_and_reports_channel() {
        let err: RetrievalError = InvalidInput::NonPositiveBinCount { channel: 2, bins: 0 }.into();
        assert_eq!(
            err.to_string(),
            "invalid input: channel 2 has a non-positive bin count (0)"
        );
    }
}
