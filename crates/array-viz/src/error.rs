//! Error types shared by every layer of the crate.

use thiserror::Error;

/// Result alias used throughout `array-viz`.
pub type ArrayResult<T> = Result<T, ArrayError>;

#[derive(Debug, Error)]
/// Errors produced by the array kernel.
pub enum ArrayError {
    #[error("index {index} out of range for array of size {len}")]
    /// A read, swap or decoration targeted an index outside `0..len`.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Array size at the time of the call.
        len: usize,
    },

    #[error("unknown layout policy '{0}'")]
    /// A layout policy name was not present in the registry.
    UnknownLayout(String),

    #[error("timeline step {target} out of range (timeline has {len} steps)")]
    /// `jump_to` was asked for a cursor position past the end of the timeline.
    StepOutOfRange {
        /// Requested cursor position.
        target: usize,
        /// Number of recorded steps.
        len: usize,
    },

    #[error("cannot parse '{raw}' as {hint}")]
    /// A value from a pre-built structure did not match its value-type hint.
    InvalidValue {
        /// The raw text that failed to parse.
        raw: String,
        /// The value-type hint name.
        hint: &'static str,
    },

    #[error("checkpoint error: {0}")]
    /// Checkpoint or option JSON could not be (de)serialized.
    Checkpoint(#[from] serde_json::Error),
}

impl ArrayError {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
