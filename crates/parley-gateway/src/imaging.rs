//! Image preparation for the upstream provider.
//!
//! Uploaded images are decoded, converted to RGB, downscaled to fit the
//! 500x500 bounding box (aspect preserved, never upscaled), re-encoded as
//! JPEG, and shipped as base64 `data:` URLs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use parley_shared::constants::{
    THUMBNAIL_JPEG_QUALITY, THUMBNAIL_MAX_HEIGHT, THUMBNAIL_MAX_WIDTH,
};

use crate::error::GatewayError;

/// Decode arbitrary image bytes and produce a downscaled JPEG.
pub fn thumbnail_jpeg(data: &[u8]) -> Result<Vec<u8>, GatewayError> {
    let decoded = image::load_from_memory(data)?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        "Decoded uploaded image"
    );

    let scaled = decoded.thumbnail(THUMBNAIL_MAX_WIDTH, THUMBNAIL_MAX_HEIGHT);
    let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(
        &mut buf,
        THUMBNAIL_JPEG_QUALITY,
    ))?;

    debug!(
        width = rgb.width(),
        height = rgb.height(),
        jpeg_bytes = buf.len(),
        "Re-encoded image for upload"
    );
    Ok(buf)
}

/// Wrap JPEG bytes in the `data:` URL form the chat-completions API expects.
pub fn to_data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        let mut buf = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut buf)).unwrap();
        buf
    }

    #[test]
    fn test_large_image_downscaled_preserving_aspect() {
        let jpeg = thumbnail_jpeg(&png_bytes(1000, 500)).unwrap();
        let out = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((out.width(), out.height()), (500, 250));
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let jpeg = thumbnail_jpeg(&png_bytes(64, 48)).unwrap();
        let out = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((out.width(), out.height()), (64, 48));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(thumbnail_jpeg(b"definitely not an image").is_err());
    }

    #[test]
    fn test_data_url_prefix() {
        let url = to_data_url(&[0xff, 0xd8]);
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }
}
