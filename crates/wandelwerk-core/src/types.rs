// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Wandelwerk converter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad category of an input file. Decides which adapter runs and which
/// targets are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatFamily {
    Raster,
    Document,
    Audio,
    Unsupported,
}

impl FormatFamily {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Raster => "image",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output formats the converter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionTarget {
    Png,
    Jpeg,
    Webp,
    Gif,
    Pdf,
    Mp3,
    Wav,
    Ogg,
}

impl ConversionTarget {
    pub const ALL: [ConversionTarget; 8] = [
        Self::Png,
        Self::Jpeg,
        Self::Webp,
        Self::Gif,
        Self::Pdf,
        Self::Mp3,
        Self::Wav,
        Self::Ogg,
    ];

    /// Upper-case label shown on the target selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Webp => "WEBP",
            Self::Gif => "GIF",
            Self::Pdf => "PDF",
            Self::Mp3 => "MP3",
            Self::Wav => "WAV",
            Self::Ogg => "OGG",
        }
    }

    /// File extension of the produced artifact (no leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Pdf => "pdf",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }

    /// MIME tag attached to the produced artifact. Audio targets are tagged
    /// `audio/<extension>`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Pdf => "application/pdf",
            Self::Mp3 => "audio/mp3",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
        }
    }

    /// The family whose adapter produces this target.
    pub fn family(&self) -> FormatFamily {
        match self {
            Self::Png | Self::Jpeg | Self::Webp | Self::Gif => FormatFamily::Raster,
            Self::Pdf => FormatFamily::Document,
            Self::Mp3 | Self::Wav | Self::Ogg => FormatFamily::Audio,
        }
    }

    /// Parse a target from a file extension or label (`"jpg"`, `"JPEG"`, `".gif"`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "pdf" => Some(Self::Pdf),
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConversionTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| format!("unknown target format '{s}'"))
    }
}

/// An input file handed to the converter. Immutable once built.
///
/// The byte payload is reference-counted so adapters can move it onto a
/// blocking thread without copying.
#[derive(Debug, Clone)]
pub struct SourceFile {
    bytes: Arc<[u8]>,
    declared_type: Option<String>,
    name: String,
}

impl SourceFile {
    /// Wrap a payload with no declared media type.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            declared_type: None,
            name: name.into(),
        }
    }

    /// Attach the media type the environment reported for this file.
    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap clone of the payload for use on another task.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// The media type the environment declared, blank values treated as absent.
    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased extension of the file name, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the payload, used to correlate log lines.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.bytes()))
    }
}

/// Standard paper sizes for document output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}
