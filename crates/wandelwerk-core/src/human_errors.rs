// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Engine diagnostics (ffmpeg stderr, codec messages) never reach the user;
// they stay in the logs.

use crate::error::{FailureKind, WandelwerkError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying the same thing again may work.
    Transient,
    /// User must do something (pick a different file, install a tool).
    ActionRequired,
    /// Retrying cannot fix it (wrong format, damaged file).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `WandelwerkError` into a `HumanError`.
pub fn humanize_error(err: &WandelwerkError) -> HumanError {
    match err.kind() {
        FailureKind::UnsupportedFormat => HumanError {
            message: "This type of file isn't supported for conversion.".into(),
            suggestion: "Choose an image (JPEG, PNG, WEBP, GIF), a Word document (.docx), or an audio file (MP3, WAV, OGG).".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FailureKind::IllegalTargetSelected => HumanError {
            message: "That output format isn't available for this file.".into(),
            suggestion: "Pick one of the formats offered for this file.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FailureKind::ConversionInProgress => HumanError {
            message: "A conversion is still running.".into(),
            suggestion: "Wait for it to finish before choosing another file.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureKind::EngineInitializationFailed => HumanError {
            message: "The audio converter couldn't be started.".into(),
            suggestion: "Make sure ffmpeg is installed, then try the conversion again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FailureKind::EngineExecutionFailed => HumanError {
            message: "The conversion failed.".into(),
            suggestion: "The audio file may be damaged or in an unusual encoding. Try a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureKind::DecodeFailed => HumanError {
            message: "The conversion failed because the file couldn't be read.".into(),
            suggestion: "The file may be damaged or not what its name says. Try opening it in another program first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureKind::EncodeFailed => HumanError {
            message: "The conversion failed while writing the new file.".into(),
            suggestion: "Try a different output format.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FailureKind::Unknown => humanize_unknown(err),
    }
}

fn humanize_unknown(err: &WandelwerkError) -> HumanError {
    match err {
        WandelwerkError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            }
        }
        WandelwerkError::Io(io_err) if io_err.kind() == std::io::ErrorKind::PermissionDenied => {
            HumanError {
                message: "The app doesn't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            }
        }
        WandelwerkError::NoArtifact => HumanError {
            message: "There's no converted file to save yet.".into(),
            suggestion: "Choose an output format first, then save the result.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        _ => HumanError {
            message: "The conversion failed.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_distinct_from_conversion_failure() {
        let unsupported = humanize_error(&WandelwerkError::UnsupportedFormat("text/plain".into()));
        let failed = humanize_error(&WandelwerkError::Decode("bad header".into()));
        assert!(unsupported.message.contains("isn't supported"));
        assert!(failed.message.contains("conversion failed"));
        assert_ne!(unsupported.message, failed.message);
    }

    #[test]
    fn engine_diagnostics_are_not_leaked() {
        let err = WandelwerkError::EngineExecution(
            "[mp3 @ 0x55d] Header missing\ninput.mp3: Invalid data found when processing input"
                .into(),
        );
        let human = humanize_error(&err);
        assert!(!human.message.contains("Invalid data"));
        assert!(!human.suggestion.contains("0x55d"));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn engine_load_failure_is_transient() {
        let human = humanize_error(&WandelwerkError::EngineInitialization("spawn".into()));
        assert!(human.retriable);
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn missing_file_asks_for_action() {
        let err = WandelwerkError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }
}
