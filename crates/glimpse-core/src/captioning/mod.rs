//! Caption generation around the beam search.
//!
//! - **vocabulary**: word/id mapping with reserved start, end and unknown tokens
//! - **renderer**: token ids back to text
//! - **attention**: ONNX attention decoder implementing the scorer contract
//! - **table**: deterministic lookup-table scorer
//! - **generator**: encoder + scorer + search + renderer for one image

pub mod attention;
pub mod generator;
pub mod renderer;
pub mod table;
pub mod vocabulary;

pub use attention::AttentionDecoder;
pub use generator::{CaptionGenerator, FeatureScorer, GeneratedCaption};
pub use renderer::{Caption, CaptionRenderer};
pub use table::TableScorer;
pub use vocabulary::Vocabulary;
