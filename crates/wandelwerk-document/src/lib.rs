// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandelwerk-document: engines for the image and document families.
//
// Provides raster re-encoding between JPEG, PNG, WEBP and GIF, raw text
// extraction from .docx packages, and fixed-layout text-to-PDF rendering.

pub mod convert;
pub mod docx;
pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `wandelwerk_document::RasterAdapter` etc.
pub use convert::{DocumentAdapter, RasterAdapter};
pub use docx::extract_raw_text;
pub use crate::image::RasterImage;
pub use pdf::{LayoutReport, PdfWriter};
