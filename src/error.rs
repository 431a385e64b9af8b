//! The dispatcher's error taxonomy.
//!
//! `PipelineOverflow` is deliberately not part of this enum: it is a non-fatal condition
//! (rendering continues with possibly clipped output) and is reported through
//! [`crate::dispatcher::Diagnostics`] instead of aborting the frame.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// A precondition the caller controls was violated (e.g. a device provider that failed a
    /// capability check).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Buffer allocation failed; the frame is aborted and the caller may fall back to CPU.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The post-submit fence wait exceeded the configured timeout; per-frame buffers are freed.
    #[error("GPU fence wait timed out after {0:?}")]
    Timeout(Duration),

    /// The GPU path is unavailable or inappropriate for this input; the caller should render on
    /// CPU instead.
    #[error("fallback requested: {0}")]
    FallbackRequested(String),
}
