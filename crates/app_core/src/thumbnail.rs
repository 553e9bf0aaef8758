//! Still image encoding for captured video frames

use crate::config::ViewerConfig;
use crate::error::AppError;
use crate::model::AssetPayload;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Downscales frames into a bounded box and encodes them as JPEG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StillEncoder {
    max_edge: u32,
    quality: u8,
}

impl Default for StillEncoder {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl StillEncoder {
    pub fn new(max_edge: u32, quality: u8) -> Self {
        Self {
            max_edge: max_edge.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.thumbnail_max_edge, config.jpeg_quality)
    }

    /// Size of the still for a `width` x `height` frame; never upscales
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let max = self.max_edge as f64;
        let scale = (max / width as f64).min(max / height as f64).min(1.0);
        let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
        (scaled(width), scaled(height))
    }

    pub fn encode(&self, frame: &RgbaImage) -> Result<AssetPayload, AppError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(AppError::Decode("empty video frame".to_string()));
        }

        let (target_w, target_h) = self.target_size(width, height);
        let resized = if (target_w, target_h) == (width, height) {
            frame.clone()
        } else {
            imageops::resize(frame, target_w, target_h, FilterType::Triangle)
        };
        let rgb = DynamicImage::ImageRgba8(resized).to_rgb8();

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, self.quality)
            .encode_image(&rgb)
            .map_err(|e| AppError::Decode(e.to_string()))?;

        tracing::debug!("Encoded {}x{} still ({} bytes)", target_w, target_h, data.len());
        Ok(AssetPayload::new("image/jpeg", data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn frame(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]))
    }

    #[test]
    fn test_target_size() {
        let encoder = StillEncoder::default();
        assert_eq!(encoder.target_size(1920, 960), (200, 100));
        assert_eq!(encoder.target_size(1000, 2000), (100, 200));
        assert_eq!(encoder.target_size(120, 80), (120, 80));
        assert_eq!(encoder.target_size(10000, 1), (200, 1));
    }

    #[test]
    fn test_encode_downscales_to_jpeg() {
        let still = StillEncoder::default().encode(&frame(400, 100)).unwrap();
        assert_eq!(still.mime, "image/jpeg");
        assert_eq!(&still.data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&still.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 50));
    }

    #[test]
    fn test_small_frame_keeps_size() {
        let still = StillEncoder::new(200, 80).encode(&frame(64, 48)).unwrap();
        let decoded = image::load_from_memory(&still.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_empty_frame_fails() {
        let err = StillEncoder::default().encode(&RgbaImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }
}
