// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Converter configuration, persisted as JSON in the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::PaperSize;

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent converter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    /// Stem of every suggested artifact name (`<stem>.<ext>`).
    pub output_stem: String,
    /// JPEG quality (1–100) for raster output.
    pub jpeg_quality: u8,
    /// Text-to-PDF layout.
    pub document: DocumentLayout,
    /// Audio transcoding engine.
    pub transcoder: TranscoderConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            output_stem: "converted".into(),
            jpeg_quality: 92,
            document: DocumentLayout::default(),
            transcoder: TranscoderConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Load a configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Load `config.json` from the data directory, or fall back to defaults
    /// when it is absent or unreadable.
    pub fn load_or_default(data_dir: &Path) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Suggested download name for an artifact with this extension.
    pub fn artifact_name(&self, extension: &str) -> String {
        format!("{}.{}", self.output_stem, extension)
    }
}

/// How extracted text that does not fit on one page is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// Everything goes on one page; lines past the bottom margin are clipped.
    SinglePage,
    /// Overflowing lines continue on new pages.
    MultiPage,
}

/// Fixed page layout for text-to-PDF output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentLayout {
    pub paper_size: PaperSize,
    pub font_size_pt: f32,
    pub margin_pt: f32,
    /// Line advance as a multiple of the font size.
    pub line_height_factor: f32,
    /// Distance of the first baseline from the top edge, in lines.
    pub top_offset_lines: f32,
    pub pagination: Pagination,
    /// Title embedded in the PDF metadata.
    pub title: String,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            font_size_pt: 12.0,
            margin_pt: 50.0,
            line_height_factor: 1.2,
            top_offset_lines: 4.0,
            pagination: Pagination::SinglePage,
            title: "Converted Document".into(),
        }
    }
}

/// Settings for the ffmpeg-backed transcoding engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscoderConfig {
    /// Path to (or name of) the ffmpeg binary.
    pub ffmpeg_path: PathBuf,
    /// Directory under which the engine creates its private workspace.
    pub workspace_root: PathBuf,
    /// ffmpeg `-loglevel` value.
    pub log_level: String,
    /// Extra arguments inserted before the output file name.
    pub extra_args: Vec<String>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            workspace_root: std::env::temp_dir(),
            log_level: "error".into(),
            extra_args: Vec::new(),
        }
    }
}
