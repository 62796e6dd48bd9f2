//! Types needed in multiple modules

/// Enumeration of binary symbol values
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

/// Fixed-point log-likelihood ratio.
///
/// A positive value favors [`Bit::One`], a negative value favors
/// [`Bit::Zero`]. All decoder arithmetic on this type saturates.
pub type Llr = i16;

/// Magnitude used for a bit whose value is known in advance (trellis
/// boundary states, filler positions). Large enough to dominate any
/// channel observation, small enough to leave saturation headroom.
pub const LLR_INF: Llr = 10_000;

/// Saturates a 32-bit metric sum to the fixed-point log-likelihood domain.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn clamp_llr(value: i32) -> Llr {
    value.clamp(i32::from(Llr::MIN), i32::from(Llr::MAX)) as Llr
}

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// Transport block cannot be segmented into legal codeblocks
    #[error("{0}")]
    InvalidSegmentation(String),
    /// Codeblock length outside the standard size table
    #[error("{0}")]
    UnsupportedLength(String),
    /// Soft buffer too small for the requested transport block
    #[error("{0}")]
    InsufficientBuffer(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
    /// Unknown error
    #[error("Unknown error")]
    Unknown,
}
