// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The set of family adapters the orchestrator dispatches to.

use std::sync::Arc;

use wandelwerk_audio::{EngineHandle, TranscodingAdapter, shared_ffmpeg_handle};
use wandelwerk_core::{ConversionAdapter, ConverterConfig, FormatFamily};
use wandelwerk_document::{DocumentAdapter, RasterAdapter};

/// One adapter per supported family.
#[derive(Clone)]
pub struct AdapterSet {
    raster: Arc<dyn ConversionAdapter>,
    document: Arc<dyn ConversionAdapter>,
    audio: Arc<dyn ConversionAdapter>,
}

impl AdapterSet {
    pub fn new(
        raster: Arc<dyn ConversionAdapter>,
        document: Arc<dyn ConversionAdapter>,
        audio: Arc<dyn ConversionAdapter>,
    ) -> Self {
        Self {
            raster,
            document,
            audio,
        }
    }

    /// Production adapters, sharing the process-wide ffmpeg engine.
    pub fn standard(config: &ConverterConfig) -> Self {
        Self::with_engine(config, shared_ffmpeg_handle(&config.transcoder))
    }

    /// Production raster and document adapters with a caller-supplied engine.
    pub fn with_engine(config: &ConverterConfig, engine: Arc<EngineHandle>) -> Self {
        Self::new(
            Arc::new(RasterAdapter::new(config.jpeg_quality)),
            Arc::new(DocumentAdapter::new(config.document.clone())),
            Arc::new(TranscodingAdapter::new(engine)),
        )
    }

    /// Adapter serving `family`; `None` for unsupported input.
    pub fn for_family(&self, family: FormatFamily) -> Option<&Arc<dyn ConversionAdapter>> {
        match family {
            FormatFamily::Raster => Some(&self.raster),
            FormatFamily::Document => Some(&self.document),
            FormatFamily::Audio => Some(&self.audio),
            FormatFamily::Unsupported => None,
        }
    }
}
