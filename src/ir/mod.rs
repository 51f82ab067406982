pub mod loader;

pub use loader::{IrLoader, read_mono};
