//! Image preprocessing for the CNN encoder.
//!
//! Inception-style encoders expect:
//! - Input size: 299×299 pixels
//! - Normalization: pixel/255, minus the per-channel mean, divided by std
//! - Channel order: RGB
//! - Tensor layout: NHWC for TensorFlow exports, NCHW for PyTorch exports

use image::DynamicImage;
use ndarray::Array4;

use crate::config::{EncoderConfig, TensorLayout};

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// Resize, normalize and lay out one image as a batch of one.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    image_size: u32,
    mean: [f32; CHANNELS],
    std: [f32; CHANNELS],
    layout: TensorLayout,
}

impl Preprocessor {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            image_size: config.image_size,
            mean: config.mean,
            std: config.std,
            layout: config.layout,
        }
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Tensor shape produced by [`Preprocessor::apply`].
    pub fn shape(&self) -> [usize; 4] {
        let size = self.image_size as usize;
        match self.layout {
            TensorLayout::Nhwc => [1, size, size, CHANNELS],
            TensorLayout::Nchw => [1, CHANNELS, size, size],
        }
    }

    pub fn apply(&self, image: &DynamicImage) -> Array4<f32> {
        let resized = image.resize_exact(
            self.image_size,
            self.image_size,
            image::imageops::FilterType::Triangle,
        );
        let rgb = resized.to_rgb8();

        let normalize = |x: usize, y: usize, c: usize| -> f32 {
            let value = rgb.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0;
            (value - self.mean[c]) / self.std[c]
        };

        let [n, d1, d2, d3] = self.shape();
        match self.layout {
            TensorLayout::Nhwc => {
                Array4::from_shape_fn((n, d1, d2, d3), |(_, y, x, c)| normalize(x, y, c))
            }
            TensorLayout::Nchw => {
                Array4::from_shape_fn((n, d1, d2, d3), |(_, c, y, x)| normalize(x, y, c))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn config(layout: TensorLayout) -> EncoderConfig {
        EncoderConfig {
            image_size: 8,
            layout,
            ..EncoderConfig::default()
        }
    }

    #[test]
    fn test_nhwc_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
        let tensor = Preprocessor::new(&config(TensorLayout::Nhwc)).apply(&img);
        assert_eq!(tensor.shape(), &[1, 8, 8, 3]);
    }

    #[test]
    fn test_nchw_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
        let tensor = Preprocessor::new(&config(TensorLayout::Nchw)).apply(&img);
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
    }

    #[test]
    fn test_default_shape_is_299_nhwc() {
        let pre = Preprocessor::new(&EncoderConfig::default());
        assert_eq!(pre.shape(), [1, 299, 299, 3]);
    }

    #[test]
    fn test_mean_subtraction() {
        // White: 1.0 - mean. Black: -mean.
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])));
        let tensor = Preprocessor::new(&config(TensorLayout::Nhwc)).apply(&white);
        assert!((tensor[[0, 0, 0, 0]] - 0.515).abs() < 1e-4);
        assert!((tensor[[0, 3, 5, 2]] - 0.594).abs() < 1e-4);

        let black = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
        let tensor = Preprocessor::new(&config(TensorLayout::Nchw)).apply(&black);
        assert!((tensor[[0, 1, 2, 2]] + 0.456).abs() < 1e-4);
    }

    #[test]
    fn test_std_division() {
        let mut cfg = config(TensorLayout::Nchw);
        cfg.mean = [0.5; 3];
        cfg.std = [0.5; 3];
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])));
        let tensor = Preprocessor::new(&cfg).apply(&white);
        let max = tensor.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!((max - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_channel_placement() {
        // Pure red keeps channel 0 high and the others at -mean.
        let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
        let tensor = Preprocessor::new(&config(TensorLayout::Nhwc)).apply(&red);
        assert!(tensor[[0, 1, 1, 0]] > 0.5);
        assert!(tensor[[0, 1, 1, 1]] < 0.0);
    }
}
