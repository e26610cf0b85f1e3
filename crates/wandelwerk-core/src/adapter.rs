// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine capability contract. Every family-specific engine (raster, document,
// audio) is driven through `ConversionAdapter`, so the orchestrator never
// needs to know how a format is produced.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ConversionTarget, FormatFamily, SourceFile};

/// Phases reported while a conversion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// A conversion has started. Reported by the orchestrator for every job.
    Converting,
    /// The transcoding engine is being loaded (first audio job only).
    LoadingEngine,
    /// The transcoding engine is processing the file.
    ConvertingAudio,
}

impl ProgressPhase {
    /// Human-readable label shown next to the busy indicator.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Converting => "Converting, please wait...",
            Self::LoadingEngine => "Loading audio converter...",
            Self::ConvertingAudio => "Converting audio...",
        }
    }
}

/// Receives progress phases from an adapter.
pub trait ProgressSink: Send + Sync {
    fn report(&self, phase: ProgressPhase);
}

/// Sink that discards every phase.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _phase: ProgressPhase) {}
}

/// Raw output of a successful conversion, before publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedOutput {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// Extension for the suggested file name (no leading dot).
    pub extension: &'static str,
}

impl ConvertedOutput {
    /// Wrap bytes produced for `target`.
    pub fn for_target(bytes: Vec<u8>, target: ConversionTarget) -> Self {
        Self {
            bytes,
            mime_type: target.mime_type(),
            extension: target.extension(),
        }
    }
}

/// A family-specific conversion engine.
///
/// Implementations must leave `source` untouched and must not publish
/// anything themselves: on error nothing is produced.
#[async_trait]
pub trait ConversionAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// The family this adapter serves.
    fn family(&self) -> FormatFamily;

    /// Convert `source` into `target`.
    async fn convert(
        &self,
        source: &SourceFile,
        target: ConversionTarget,
        progress: &dyn ProgressSink,
    ) -> Result<ConvertedOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<ProgressPhase>>);

    impl ProgressSink for Recorder {
        fn report(&self, phase: ProgressPhase) {
            self.0.lock().expect("recorder lock").push(phase);
        }
    }

    struct EchoAdapter;

    #[async_trait]
    impl ConversionAdapter for EchoAdapter {
        fn name(&self) -> &str {
            "echo"
        }

        fn family(&self) -> FormatFamily {
            FormatFamily::Raster
        }

        async fn convert(
            &self,
            source: &SourceFile,
            target: ConversionTarget,
            progress: &dyn ProgressSink,
        ) -> Result<ConvertedOutput> {
            progress.report(ProgressPhase::Converting);
            Ok(ConvertedOutput::for_target(source.bytes().to_vec(), target))
        }
    }

    #[tokio::test]
    async fn adapters_are_usable_as_trait_objects() {
        let adapter: Box<dyn ConversionAdapter> = Box::new(EchoAdapter);
        let recorder = Recorder(Mutex::new(Vec::new()));
        let source = SourceFile::new("a.png", vec![7u8; 4]);

        let out = adapter
            .convert(&source, ConversionTarget::Gif, &recorder)
            .await
            .expect("convert");

        assert_eq!(out.mime_type, "image/gif");
        assert_eq!(out.extension, "gif");
        assert_eq!(out.bytes, vec![7u8; 4]);
        assert_eq!(
            *recorder.0.lock().expect("recorder lock"),
            vec![ProgressPhase::Converting]
        );
    }

    #[test]
    fn phase_messages_are_distinct() {
        assert_ne!(
            ProgressPhase::LoadingEngine.message(),
            ProgressPhase::ConvertingAudio.message()
        );
    }
}
