use thiserror::Error;

use crate::fft_api::FftError;

/// Errors surfaced by transform construction and execution.
///
/// Caller contract breaches (overlapping views, inconsistent shapes) are not
/// represented here: they panic at construction.
#[derive(Debug, Error)]
pub enum Error {
    /// The FFT execution layer reported a non-success status.
    #[error(transparent)]
    Fft(#[from] FftError),

    /// Host data handed to a convenience function does not fit the requested shape.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
