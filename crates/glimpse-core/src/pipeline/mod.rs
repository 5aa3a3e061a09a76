//! Image captioning pipeline components.
//!
//! - **validate**: Pre-processing checks (existence, size, magic bytes)
//! - **decode**: Load and decode images with limits and a timeout
//! - **hash**: BLAKE3 content hashes
//! - **discovery**: Find image files in directories
//! - **processor**: Orchestrates the full pipeline

pub mod decode;
pub mod discovery;
pub mod hash;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use processor::ImageProcessor;
pub use validate::Validator;
