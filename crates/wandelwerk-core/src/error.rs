// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Wandelwerk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ConversionTarget, FormatFamily};

/// Top-level error type for all Wandelwerk operations.
#[derive(Debug, Error)]
pub enum WandelwerkError {
    // -- Classification / contract --
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("target {target} is not offered for {family} input")]
    IllegalTargetSelected {
        target: ConversionTarget,
        family: FormatFamily,
    },

    #[error("no file loaded")]
    NoFileLoaded,

    #[error("a conversion is already running")]
    ConversionInProgress,

    // -- Engine errors --
    #[error("transcoding engine failed to load: {0}")]
    EngineInitialization(String),

    #[error("transcoding failed: {0}")]
    EngineExecution(String),

    // -- Codec / layout errors --
    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    // -- Artifacts --
    #[error("artifact {0} was already released")]
    AlreadyReleased(String),

    #[error("no converted file is ready")]
    NoArtifact,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WandelwerkError>;

/// Failure taxonomy surfaced to the environment with every `failure` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// No legal targets for the file. The user must pick another file.
    UnsupportedFormat,
    /// Caller offered a target outside the legal set. Never user-facing.
    IllegalTargetSelected,
    /// Caller drove the state machine while a conversion was running.
    ConversionInProgress,
    /// Transcoding engine failed to load; the next attempt retries the load.
    EngineInitializationFailed,
    /// Engine ran but rejected the input.
    EngineExecutionFailed,
    DecodeFailed,
    EncodeFailed,
    Unknown,
}

impl WandelwerkError {
    /// Classify this error into the externally visible taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            Self::IllegalTargetSelected { .. } | Self::NoFileLoaded => {
                FailureKind::IllegalTargetSelected
            }
            Self::ConversionInProgress => FailureKind::ConversionInProgress,
            Self::EngineInitialization(_) => FailureKind::EngineInitializationFailed,
            Self::EngineExecution(_) => FailureKind::EngineExecutionFailed,
            Self::Decode(_) => FailureKind::DecodeFailed,
            Self::Encode(_) => FailureKind::EncodeFailed,
            Self::AlreadyReleased(_)
            | Self::NoArtifact
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal(_) => FailureKind::Unknown,
        }
    }

    /// Whether repeating the same request can succeed without a new input.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Whether this error reports a misuse by the caller rather than a
    /// problem with the file.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::IllegalTargetSelected | FailureKind::ConversionInProgress
        )
    }
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineInitializationFailed | Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_load_failure_is_retryable() {
        let err = WandelwerkError::EngineInitialization("ffmpeg missing".into());
        assert_eq!(err.kind(), FailureKind::EngineInitializationFailed);
        assert!(err.is_retryable());
    }

    #[test]
    fn execution_failure_needs_new_input() {
        let err = WandelwerkError::EngineExecution("Invalid data found".into());
        assert_eq!(err.kind(), FailureKind::EngineExecutionFailed);
        assert!(!err.is_retryable());
    }

    #[test]
    fn contract_violations_are_flagged() {
        let illegal = WandelwerkError::IllegalTargetSelected {
            target: ConversionTarget::Pdf,
            family: FormatFamily::Raster,
        };
        assert!(illegal.is_contract_violation());
        assert!(WandelwerkError::NoFileLoaded.is_contract_violation());
        assert!(WandelwerkError::ConversionInProgress.is_contract_violation());
        assert!(!WandelwerkError::Decode("bad".into()).is_contract_violation());
    }

    #[test]
    fn illegal_target_display_names_both_sides() {
        let err = WandelwerkError::IllegalTargetSelected {
            target: ConversionTarget::Pdf,
            family: FormatFamily::Raster,
        };
        assert_eq!(err.to_string(), "target PDF is not offered for image input");
    }
}
