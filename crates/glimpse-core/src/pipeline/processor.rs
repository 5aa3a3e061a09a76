//! Pipeline orchestration: validate, read, hash, decode, caption.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::captioning::{AttentionDecoder, CaptionGenerator, CaptionRenderer, Vocabulary};
use crate::config::{Config, SpecialTokenNames};
use crate::decoding::BeamSearchDecoder;
use crate::encoder::ImageEncoder;
use crate::error::{PipelineError, PipelineResult};
use crate::types::CaptionRecord;

use super::decode::{format_to_string, ImageDecoder};
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::hash::content_hash;
use super::validate::Validator;

/// The main image processor that orchestrates the full pipeline.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    generator: Option<Arc<CaptionGenerator>>,
}

impl ImageProcessor {
    /// Create a processor without a caption generator. Call
    /// [`load_captioner`](Self::load_captioner) or
    /// [`with_generator`](Self::with_generator) before processing.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(&config.processing),
            generator: None,
        }
    }

    /// Load vocabulary, encoder and decoder models from disk.
    pub fn load_captioner(&mut self, config: &Config) -> PipelineResult<()> {
        let names = SpecialTokenNames::from(&config.vocabulary);
        let vocabulary = Arc::new(Vocabulary::load(&config.vocabulary_path(), &names)?);

        let model_dir = config.model_dir();
        let encoder = ImageEncoder::load(&config.encoder, &model_dir)?;
        let scorer = AttentionDecoder::load(&config.decoder, &model_dir, vocabulary.len())?;

        let search = BeamSearchDecoder::new(config.decoding.clone(), vocabulary.special());
        let generator = CaptionGenerator::new(
            Arc::new(encoder),
            Arc::new(scorer),
            search,
            CaptionRenderer::new(vocabulary),
        );

        tracing::info!(
            "Captioner ready (beam width {}, max {} steps)",
            config.decoding.beam_width,
            config.decoding.max_steps
        );
        self.generator = Some(Arc::new(generator));
        Ok(())
    }

    /// Use an already-built generator.
    pub fn with_generator(mut self, generator: CaptionGenerator) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    pub fn has_captioner(&self) -> bool {
        self.generator.is_some()
    }

    /// Caption one image.
    pub async fn process(&self, path: &Path) -> PipelineResult<CaptionRecord> {
        let generator = self.generator.clone().ok_or_else(|| PipelineError::Model {
            message: "caption generator not loaded".to_string(),
        })?;

        let start = Instant::now();
        tracing::debug!("Processing: {:?}", path);

        self.validator.validate(path)?;

        // Read once, then hash and decode from the same buffer.
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;
        let content_hash = content_hash(&bytes);
        let decoded = self.decoder.decode_from_bytes(bytes, path).await?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let caption_start = Instant::now();
        let image = decoded.image;
        let path_owned = path.to_path_buf();
        let vocabulary_hash = generator.vocabulary_hash().to_string();
        let generated =
            tokio::task::spawn_blocking(move || generator.generate(&image, &path_owned))
                .await
                .map_err(|e| PipelineError::Model {
                    message: format!("Caption task join error: {}", e),
                })??;
        tracing::trace!("  Caption: {:?}", caption_start.elapsed());

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        tracing::debug!(
            "Captioned {:?} in {:?} ({}x{}): {:?}",
            file_name,
            start.elapsed(),
            decoded.width,
            decoded.height,
            generated.caption.text
        );

        Ok(CaptionRecord {
            file_path: path.to_path_buf(),
            file_name,
            content_hash,
            width: decoded.width,
            height: decoded.height,
            format: format_to_string(decoded.format),
            file_size: decoded.file_size,
            caption: generated.caption.text,
            words: generated.caption.words,
            search: generated.outcome,
            vocabulary_hash,
        })
    }

    /// Discover all image files at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodingConfig;
    use crate::decoding::{SequenceScorer, TokenId};
    use crate::encoder::FeatureExtractor;
    use crate::error::ScorerError;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    struct Width;

    impl FeatureExtractor for Width {
        fn extract(&self, image: &DynamicImage, _path: &Path) -> PipelineResult<Vec<f32>> {
            Ok(vec![image.width() as f32])
        }
    }

    /// "a wide photo" above 10 pixels wide, "a photo" otherwise.
    struct Widths;

    impl SequenceScorer for Widths {
        type Context = [f32];

        fn vocab_size(&self) -> usize {
            6
        }

        fn score(&self, features: &[f32], prefix: &[TokenId]) -> Result<Vec<f32>, ScorerError> {
            let mut probs = vec![0.0; 6];
            let next = match (prefix, features[0] > 10.0) {
                ([0], _) => 3,
                ([0, 3], true) => 4,
                ([0, 3], false) | ([0, 3, 4], _) => 5,
                _ => 1,
            };
            probs[next] = 1.0;
            Ok(probs)
        }
    }

    fn processor() -> ImageProcessor {
        let vocab = Arc::new(
            Vocabulary::from_tokens(
                ["<start>", "<end>", "<unk>", "a", "wide", "photo"],
                &SpecialTokenNames::default(),
            )
            .unwrap(),
        );
        let search = BeamSearchDecoder::new(DecodingConfig::default(), vocab.special());
        let generator = CaptionGenerator::new(
            Arc::new(Width),
            Arc::new(Widths),
            search,
            CaptionRenderer::new(vocab),
        );
        ImageProcessor::new(&Config::default()).with_generator(generator)
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])));
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[tokio::test]
    async fn test_process_produces_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_png(&path, 16, 4);

        let record = processor().process(&path).await.unwrap();
        assert_eq!(record.caption, "a wide photo");
        assert_eq!(record.words, vec!["a", "wide", "photo"]);
        assert_eq!((record.width, record.height), (16, 4));
        assert_eq!(record.format, "png");
        assert_eq!(record.file_name, "wide.png");
        assert_eq!(record.content_hash, crate::pipeline::hash::file_hash(&path).unwrap());
        assert!(record.search.finished);
    }

    #[tokio::test]
    async fn test_process_conditions_on_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.png");
        write_png(&path, 4, 4);

        let record = processor().process(&path).await.unwrap();
        assert_eq!(record.caption, "a photo");
    }

    #[tokio::test]
    async fn test_process_without_captioner_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        write_png(&path, 2, 2);

        let processor = ImageProcessor::new(&Config::default());
        assert!(!processor.has_captioner());
        let err = processor.process(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model { .. }));
    }

    #[tokio::test]
    async fn test_process_missing_file() {
        let err = processor()
            .process(Path::new("/definitely/missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }
}
