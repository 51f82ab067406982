// Enable pedantic lints globally, then allow the noisy ones we're not fixing.
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]
// Audio code performs intentional casts
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::float_cmp,
    clippy::needless_range_loop,
    clippy::similar_names
)]

pub mod engine;
pub mod error;
pub mod ir;
pub mod resource;
pub mod settings;
pub mod transform;

pub use engine::{ConvolutionEngine, EngineHandle, EngineMessage, MIN_BLOCK_LENGTH};
pub use error::EngineError;
pub use resource::{BufferTable, ImpulseSource, ResourceError};
pub use transform::{RealFftTransform, SpectralTransform};
