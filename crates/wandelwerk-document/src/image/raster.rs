// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster re-encoding. Decode an image into an in-memory pixel surface at its
// native size and write the whole surface back out in another format. Uses
// the `image` crate codecs; no resizing, no colour management.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};
use wandelwerk_core::ConversionTarget;
use wandelwerk_core::error::{Result, WandelwerkError};

/// A decoded image ready to be written in a different raster format.
pub struct RasterImage {
    image: DynamicImage,
    /// Format detected from the payload's magic bytes, if recognised.
    detected: Option<ImageFormat>,
}

impl RasterImage {
    /// Decode raw encoded bytes (JPEG, PNG, WEBP, GIF).
    ///
    /// The format is sniffed from the payload, so a wrong declared media
    /// type does not prevent decoding.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8]) -> Result<Self> {
        let detected = image::guess_format(data).ok();
        let image = image::load_from_memory(data)
            .map_err(|err| WandelwerkError::Decode(format!("failed to decode image: {err}")))?;
        debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            format = ?detected,
            "image decoded"
        );
        Ok(Self { image, detected })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image,
            detected: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn detected_format(&self) -> Option<ImageFormat> {
        self.detected
    }

    /// Encode the full surface into `target`.
    ///
    /// Lossless where the target allows it: PNG, GIF and WEBP (lossless VP8L)
    /// keep every pixel; JPEG drops the alpha channel and uses `jpeg_quality`.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn encode(&self, target: ConversionTarget, jpeg_quality: u8) -> Result<Vec<u8>> {
        let bytes = match target {
            ConversionTarget::Jpeg => self.to_jpeg_bytes(jpeg_quality)?,
            ConversionTarget::Png => encode_to_format(&self.png_surface(), ImageFormat::Png)?,
            ConversionTarget::Webp => encode_to_format(&self.rgb_or_rgba(), ImageFormat::WebP)?,
            ConversionTarget::Gif => encode_to_format(
                &DynamicImage::ImageRgba8(self.image.to_rgba8()),
                ImageFormat::Gif,
            )?,
            other => {
                return Err(WandelwerkError::Encode(format!(
                    "{other} is not a raster format"
                )));
            }
        };
        debug!(%target, bytes = bytes.len(), "image encoded");
        Ok(bytes)
    }

    /// Encode as JPEG with the given quality (clamped to 1–100).
    fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| WandelwerkError::Encode(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// PNG handles every 8/16-bit layout natively; only float surfaces are narrowed.
    fn png_surface(&self) -> DynamicImage {
        match &self.image {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                DynamicImage::ImageRgba8(self.image.to_rgba8())
            }
            other => other.clone(),
        }
    }

    /// WEBP accepts 8-bit RGB or RGBA only.
    fn rgb_or_rgba(&self) -> DynamicImage {
        if self.image.color().has_alpha() {
            DynamicImage::ImageRgba8(self.image.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(self.image.to_rgb8())
        }
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| WandelwerkError::Encode(format!("{format:?} encoding failed: {err}")))?;
    Ok(buffer)
}
