//! Error types for the `ewm-log` crate.

use thiserror::Error;

/// An error raised while decoding a log, topic or log status from its RLP encoding.
///
/// A decode error is fatal to the single decode call only. Callers consuming network data
/// should drop the malformed unit and continue with the rest of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogDecodeError {
    /// The log envelope does not carry the field count of the requested encoding.
    #[error("Malformed log: expected {expected} fields, got {actual}")]
    MalformedLog {
        /// The field count required by the encoding mode.
        expected: usize,
        /// The field count found in the envelope.
        actual: usize,
    },
    /// A topic is not exactly 32 bytes long.
    #[error("Malformed log topic: expected 32 bytes, got {length}")]
    MalformedTopic {
        /// The length of the offending topic.
        length: usize,
    },
    /// The status envelope is structurally invalid.
    #[error("Malformed log status: {0}")]
    MalformedStatus(&'static str),
    /// The underlying RLP framing is invalid.
    #[error("RLP: {0}")]
    Rlp(#[from] alloy_rlp::Error),
}

/// A [Result] alias for the [LogDecodeError] type.
pub type LogDecodeResult<T> = Result<T, LogDecodeError>;
