// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format classifier. Maps a file's declared media type (or, failing that,
// its extension) to a format family and the targets that family can produce.
//
// The registry is the single source of truth for what is offered. A target
// equal to the source's own format is never listed; that holds because of
// how the table is written, not because of a runtime filter.

use serde::Serialize;
use tracing::debug;

use crate::types::{ConversionTarget, FormatFamily, SourceFile};

use ConversionTarget::{Gif, Jpeg, Mp3, Ogg, Pdf, Png, Wav, Webp};

/// Media type of a Word (OOXML) document.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// One row of the conversion registry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegistryEntry {
    /// Declared media type this row matches.
    pub media_type: &'static str,
    pub family: FormatFamily,
    /// The source's own format when it is also a producible target.
    pub own_format: Option<ConversionTarget>,
    /// Legal targets, in display order.
    pub targets: &'static [ConversionTarget],
}

/// Declared media type → family → legal targets.
pub const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        media_type: "image/jpeg",
        family: FormatFamily::Raster,
        own_format: Some(Jpeg),
        targets: &[Png, Webp, Gif],
    },
    RegistryEntry {
        media_type: "image/png",
        family: FormatFamily::Raster,
        own_format: Some(Png),
        targets: &[Jpeg, Webp, Gif],
    },
    RegistryEntry {
        media_type: "image/webp",
        family: FormatFamily::Raster,
        own_format: Some(Webp),
        targets: &[Jpeg, Png, Gif],
    },
    RegistryEntry {
        media_type: "image/gif",
        family: FormatFamily::Raster,
        own_format: Some(Gif),
        targets: &[Jpeg, Png, Webp],
    },
    RegistryEntry {
        media_type: DOCX_MEDIA_TYPE,
        family: FormatFamily::Document,
        own_format: None,
        targets: &[Pdf],
    },
    RegistryEntry {
        media_type: "audio/mpeg",
        family: FormatFamily::Audio,
        own_format: Some(Mp3),
        targets: &[Wav, Ogg],
    },
    // Tag carried by MP3 artifacts; accepted so they classify back as audio.
    RegistryEntry {
        media_type: "audio/mp3",
        family: FormatFamily::Audio,
        own_format: Some(Mp3),
        targets: &[Wav, Ogg],
    },
    RegistryEntry {
        media_type: "audio/wav",
        family: FormatFamily::Audio,
        own_format: Some(Wav),
        targets: &[Mp3, Ogg],
    },
    RegistryEntry {
        media_type: "audio/ogg",
        family: FormatFamily::Audio,
        own_format: Some(Ogg),
        targets: &[Mp3, Wav],
    },
];

/// Extension fallback, consulted only when the declared type is absent or
/// not in [`REGISTRY`].
const EXTENSION_FALLBACK: &[(&str, &str)] = &[("docx", DOCX_MEDIA_TYPE)];

/// Outcome of classifying a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub family: FormatFamily,
    /// Empty exactly when `family` is `Unsupported`.
    pub targets: Vec<ConversionTarget>,
}

impl Classification {
    fn unsupported() -> Self {
        Self {
            family: FormatFamily::Unsupported,
            targets: Vec::new(),
        }
    }

    fn from_entry(entry: &RegistryEntry) -> Self {
        Self {
            family: entry.family,
            targets: entry.targets.to_vec(),
        }
    }

    pub fn is_supported(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn allows(&self, target: ConversionTarget) -> bool {
        self.targets.contains(&target)
    }
}

/// Classify a source file into a family and its legal targets.
pub fn classify(source: &SourceFile) -> Classification {
    if let Some(entry) = source.declared_type().and_then(lookup_media_type) {
        debug!(
            media_type = entry.media_type,
            family = %entry.family,
            "classified by declared type"
        );
        return Classification::from_entry(entry);
    }

    let by_extension = source.extension().and_then(|ext| {
        EXTENSION_FALLBACK
            .iter()
            .find(|(known, _)| *known == ext)
            .and_then(|(_, media_type)| lookup_media_type(media_type))
    });

    match by_extension {
        Some(entry) => {
            debug!(
                name = source.name(),
                family = %entry.family,
                "classified by extension fallback"
            );
            Classification::from_entry(entry)
        }
        None => {
            debug!(
                name = source.name(),
                declared = source.declared_type().unwrap_or("<none>"),
                "no registry match"
            );
            Classification::unsupported()
        }
    }
}

/// Find the registry row for a declared media type.
///
/// Matching ignores ASCII case, surrounding whitespace, and parameters such
/// as `; charset=binary`.
pub fn lookup_media_type(declared: &str) -> Option<&'static RegistryEntry> {
    let essence = declared.split(';').next().unwrap_or_default().trim();
    REGISTRY
        .iter()
        .find(|entry| entry.media_type.eq_ignore_ascii_case(essence))
}

/// Best-effort media type for a file extension, used when the environment
/// did not declare one (e.g. files opened from a shell).
pub fn guess_media_type(ext: &str) -> Option<&'static str> {
    match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "docx" => Some(DOCX_MEDIA_TYPE),
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" => Some("audio/ogg"),
        _ => None,
    }
}
