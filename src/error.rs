use thiserror::Error;

use crate::transform::TransformError;

/// Conditions surfaced by [`crate::engine::ConvolutionEngine::process`].
///
/// Resource faults are not in here: the engine resolves them locally by
/// falling back to passthrough and queues them for [`take_fault`].
///
/// [`take_fault`]: crate::engine::ConvolutionEngine::take_fault
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Configured block length is below the supported minimum.
    #[error("block length too small: {block_length} (minimum {minimum})")]
    BlockLengthTooSmall { block_length: usize, minimum: usize },

    /// Caller buffers do not match the configured block length.
    #[error("block length mismatch: expected {expected} bins, got {got}")]
    BlockLengthMismatch { expected: usize, got: usize },

    /// The spectral transform failed while rebuilding partitions.
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}

impl EngineError {
    /// Configuration errors refuse processing for the whole configuration.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::BlockLengthTooSmall { .. } | Self::BlockLengthMismatch { .. }
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
