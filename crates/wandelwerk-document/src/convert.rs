// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion adapters for the image and document families.
//
// Both run their CPU-bound work on the blocking pool so the event loop stays
// responsive while a large image or package is processed.

use async_trait::async_trait;
use tracing::{info, instrument};

use wandelwerk_core::config::DocumentLayout;
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{
    ConversionAdapter, ConversionTarget, ConvertedOutput, FormatFamily, ProgressSink, SourceFile,
};

use crate::docx::extract_raw_text;
use crate::image::RasterImage;
use crate::pdf::PdfWriter;

fn ensure_family(target: ConversionTarget, family: FormatFamily) -> Result<()> {
    if target.family() == family {
        Ok(())
    } else {
        Err(WandelwerkError::IllegalTargetSelected { target, family })
    }
}

fn join_error(err: tokio::task::JoinError) -> WandelwerkError {
    WandelwerkError::Internal(format!("conversion task failed: {err}"))
}

// -- Raster -------------------------------------------------------------------

/// Re-encodes images between JPEG, PNG, WEBP and GIF at native size.
pub struct RasterAdapter {
    jpeg_quality: u8,
}

impl RasterAdapter {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }
}

#[async_trait]
impl ConversionAdapter for RasterAdapter {
    fn name(&self) -> &str {
        "raster"
    }

    fn family(&self) -> FormatFamily {
        FormatFamily::Raster
    }

    #[instrument(skip(self, source, _progress), fields(source = source.name(), %target))]
    async fn convert(
        &self,
        source: &SourceFile,
        target: ConversionTarget,
        _progress: &dyn ProgressSink,
    ) -> Result<ConvertedOutput> {
        ensure_family(target, FormatFamily::Raster)?;

        let bytes = source.shared_bytes();
        let quality = self.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || {
            RasterImage::decode(&bytes)?.encode(target, quality)
        })
        .await
        .map_err(join_error)??;

        info!(bytes = encoded.len(), "image converted");
        Ok(ConvertedOutput::for_target(encoded, target))
    }
}

// -- Document -----------------------------------------------------------------

/// Turns a .docx package into a text-only PDF.
pub struct DocumentAdapter {
    layout: DocumentLayout,
}

impl DocumentAdapter {
    pub fn new(layout: DocumentLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl ConversionAdapter for DocumentAdapter {
    fn name(&self) -> &str {
        "document"
    }

    fn family(&self) -> FormatFamily {
        FormatFamily::Document
    }

    #[instrument(skip(self, source, _progress), fields(source = source.name(), %target))]
    async fn convert(
        &self,
        source: &SourceFile,
        target: ConversionTarget,
        _progress: &dyn ProgressSink,
    ) -> Result<ConvertedOutput> {
        ensure_family(target, FormatFamily::Document)?;

        let bytes = source.shared_bytes();
        let writer = PdfWriter::new(self.layout.clone());
        let (pdf, report) = tokio::task::spawn_blocking(move || {
            let text = extract_raw_text(&bytes)?;
            Ok::<_, WandelwerkError>(writer.create_from_text(&text))
        })
        .await
        .map_err(join_error)??;

        info!(
            bytes = pdf.len(),
            pages = report.pages,
            clipped = report.is_clipped(),
            "document converted"
        );
        Ok(ConvertedOutput::for_target(pdf, target))
    }
}
