// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcoding adapter: the audio family's `ConversionAdapter`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{
    ConversionAdapter, ConversionTarget, ConvertedOutput, FormatFamily, JobId, ProgressPhase,
    ProgressSink, SourceFile,
};

use crate::engine::TranscodeEngine;
use crate::handle::EngineHandle;

pub struct TranscodingAdapter {
    handle: Arc<EngineHandle>,
}

impl TranscodingAdapter {
    pub fn new(handle: Arc<EngineHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Arc<EngineHandle> {
        &self.handle
    }
}

/// Workspace names for one call, `<run>-in.<ext>` and `<run>-out.<target>`.
///
/// The engine workspace is shared by every session in the process, so each
/// call gets its own prefix. The output extension selects the format.
fn workspace_names(run: JobId, source: &SourceFile, target: ConversionTarget) -> (String, String) {
    let input_ext = source
        .extension()
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    (
        format!("{run}-in.{input_ext}"),
        format!("{run}-out.{}", target.extension()),
    )
}

async fn transcode(
    engine: &dyn TranscodeEngine,
    source: &SourceFile,
    input: &str,
    output: &str,
) -> Result<Vec<u8>> {
    engine.write_file(input, source.bytes()).await?;
    engine.run(input, output).await?;
    engine.read_file(output).await
}

#[async_trait]
impl ConversionAdapter for TranscodingAdapter {
    fn name(&self) -> &str {
        "transcoding"
    }

    fn family(&self) -> FormatFamily {
        FormatFamily::Audio
    }

    #[instrument(skip(self, source, progress), fields(source = source.name(), %target))]
    async fn convert(
        &self,
        source: &SourceFile,
        target: ConversionTarget,
        progress: &dyn ProgressSink,
    ) -> Result<ConvertedOutput> {
        if target.family() != FormatFamily::Audio {
            return Err(WandelwerkError::IllegalTargetSelected {
                target,
                family: FormatFamily::Audio,
            });
        }

        let engine = self.handle.acquire(progress).await?;
        progress.report(ProgressPhase::ConvertingAudio);

        let (input, output) = workspace_names(JobId::new(), source, target);
        debug!(engine = engine.name(), %input, %output, "staging audio");
        let result = transcode(engine.as_ref(), source, &input, &output).await;

        // Both files go regardless of outcome.
        for name in [&input, &output] {
            if let Err(e) = engine.remove_file(name).await {
                warn!(file = %name, error = %e, "workspace cleanup failed");
            }
        }

        let bytes = result?;
        info!(bytes = bytes.len(), "audio converted");
        Ok(ConvertedOutput::for_target(bytes, target))
    }
}
