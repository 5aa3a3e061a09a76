//! End-to-end caption generation for one decoded image.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;

use crate::decoding::{BeamSearchDecoder, DecodeOutcome, SequenceScorer};
use crate::encoder::FeatureExtractor;
use crate::error::{DecodeError, PipelineError};

use super::renderer::{Caption, CaptionRenderer};

/// The scorer shape the generator drives: conditioned on image features.
pub type FeatureScorer = dyn SequenceScorer<Context = [f32]> + Send;

/// A caption with the search statistics behind it.
#[derive(Debug, Clone)]
pub struct GeneratedCaption {
    pub caption: Caption,
    pub outcome: DecodeOutcome,
}

/// Encoder, scorer, search and renderer wired together.
#[derive(Clone)]
pub struct CaptionGenerator {
    extractor: Arc<dyn FeatureExtractor>,
    scorer: Arc<FeatureScorer>,
    decoder: BeamSearchDecoder,
    renderer: CaptionRenderer,
    vocabulary_hash: String,
}

impl CaptionGenerator {
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        scorer: Arc<FeatureScorer>,
        decoder: BeamSearchDecoder,
        renderer: CaptionRenderer,
    ) -> Self {
        let vocabulary_hash = renderer.vocabulary().content_hash();
        Self {
            extractor,
            scorer,
            decoder,
            renderer,
            vocabulary_hash,
        }
    }

    pub fn decoder(&self) -> &BeamSearchDecoder {
        &self.decoder
    }

    pub fn renderer(&self) -> &CaptionRenderer {
        &self.renderer
    }

    /// Content hash of the vocabulary captions are rendered with.
    pub fn vocabulary_hash(&self) -> &str {
        &self.vocabulary_hash
    }

    /// Caption one image.
    ///
    /// A search that times out under the `fail` policy is reported as
    /// [`PipelineError::CaptionTimeout`] with the partial outcome; other
    /// search errors keep their
    /// [`DecodeError`] as the source.
    pub fn generate(
        &self,
        image: &DynamicImage,
        path: &Path,
    ) -> Result<GeneratedCaption, PipelineError> {
        let features = self.extractor.extract(image, path)?;
        tracing::trace!("Extracted {} features for {:?}", features.len(), path);

        let outcome = self
            .decoder
            .decode(self.scorer.as_ref(), features.as_slice())
            .map_err(|source| match source {
                DecodeError::Timeout { partial, .. } => PipelineError::CaptionTimeout {
                    path: path.to_path_buf(),
                    timeout_ms: self.decoder.config().timeout_ms.unwrap_or_default(),
                    partial,
                },
                source => PipelineError::Caption {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        if outcome.truncated {
            tracing::warn!(
                "Caption for {:?} truncated after {} steps",
                path,
                outcome.steps
            );
        }

        let caption = self.renderer.render(&outcome.tokens);
        Ok(GeneratedCaption { caption, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captioning::Vocabulary;
    use crate::config::{DecodingConfig, SpecialTokenNames};
    use crate::decoding::TokenId;
    use crate::error::ScorerError;

    /// Mean pixel brightness as the only feature.
    struct Brightness;

    impl FeatureExtractor for Brightness {
        fn extract(&self, image: &DynamicImage, _path: &Path) -> Result<Vec<f32>, PipelineError> {
            let rgb = image.to_rgb8();
            let total: f32 = rgb.as_raw().iter().map(|&v| v as f32).sum();
            Ok(vec![total / rgb.as_raw().len().max(1) as f32 / 255.0])
        }
    }

    /// "a bright room" for bright images, "a dark room" otherwise.
    struct Describer;

    impl SequenceScorer for Describer {
        type Context = [f32];

        fn vocab_size(&self) -> usize {
            7
        }

        fn score(&self, features: &[f32], prefix: &[TokenId]) -> Result<Vec<f32>, ScorerError> {
            let mut probs = vec![0.0; 7];
            let next = match prefix.last() {
                Some(0) => 3,
                Some(3) if features[0] > 0.5 => 4,
                Some(3) => 5,
                Some(4) | Some(5) => 6,
                _ => 1,
            };
            probs[next] = 1.0;
            Ok(probs)
        }
    }

    fn generator() -> CaptionGenerator {
        let vocab = Vocabulary::from_tokens(
            ["<start>", "<end>", "<unk>", "a", "bright", "dark", "room"],
            &SpecialTokenNames::default(),
        )
        .unwrap();
        let decoder = BeamSearchDecoder::new(DecodingConfig::default(), vocab.special());
        CaptionGenerator::new(
            Arc::new(Brightness),
            Arc::new(Describer),
            decoder,
            CaptionRenderer::new(Arc::new(vocab)),
        )
    }

    #[test]
    fn test_generate_conditions_on_features() {
        let generator = generator();
        let white = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([250, 250, 250]),
        ));
        let black = DynamicImage::new_rgb8(4, 4);

        let bright = generator.generate(&white, Path::new("white.png")).unwrap();
        assert_eq!(bright.caption.text, "a bright room");
        assert!(bright.outcome.finished);

        let dark = generator.generate(&black, Path::new("black.png")).unwrap();
        assert_eq!(dark.caption.text, "a dark room");
    }

    /// Like `Describer`, but slow enough to miss a 1ms limit.
    struct SlowDescriber;

    impl SequenceScorer for SlowDescriber {
        type Context = [f32];

        fn vocab_size(&self) -> usize {
            7
        }

        fn score(&self, features: &[f32], prefix: &[TokenId]) -> Result<Vec<f32>, ScorerError> {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Describer.score(features, prefix)
        }
    }

    #[test]
    fn test_generate_timeout_keeps_partial_caption() {
        let vocab = Vocabulary::from_tokens(
            ["<start>", "<end>", "<unk>", "a", "bright", "dark", "room"],
            &SpecialTokenNames::default(),
        )
        .unwrap();
        let config = DecodingConfig {
            timeout_ms: Some(1),
            timeout_policy: crate::config::TimeoutPolicy::Fail,
            ..DecodingConfig::default()
        };
        let generator = CaptionGenerator::new(
            Arc::new(Brightness),
            Arc::new(SlowDescriber),
            BeamSearchDecoder::new(config, vocab.special()),
            CaptionRenderer::new(Arc::new(vocab)),
        );
        let err = generator
            .generate(&DynamicImage::new_rgb8(2, 2), Path::new("slow.png"))
            .unwrap_err();
        match err {
            PipelineError::CaptionTimeout {
                timeout_ms,
                partial,
                ..
            } => {
                assert_eq!(timeout_ms, 1);
                assert!(partial.truncated);
                assert_eq!(partial.tokens, vec![3]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_generate_wraps_search_errors() {
        let vocab = Vocabulary::from_tokens(
            ["<start>", "<end>", "<unk>", "a", "bright", "dark", "room"],
            &SpecialTokenNames::default(),
        )
        .unwrap();
        let config = DecodingConfig {
            beam_width: 0,
            ..DecodingConfig::default()
        };
        let generator = CaptionGenerator::new(
            Arc::new(Brightness),
            Arc::new(Describer),
            BeamSearchDecoder::new(config, vocab.special()),
            CaptionRenderer::new(Arc::new(vocab)),
        );
        let err = generator
            .generate(&DynamicImage::new_rgb8(2, 2), Path::new("x.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Caption { .. }));
    }
}
