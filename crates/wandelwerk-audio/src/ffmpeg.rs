// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// FFmpeg-backed transcoding engine.
//
// Loading checks that the binary runs and creates a private temporary
// workspace; the workspace is deleted when the engine is dropped.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use wandelwerk_core::config::TranscoderConfig;
use wandelwerk_core::error::{Result, WandelwerkError};

use crate::engine::{EngineLoader, TranscodeEngine};

/// Lines of ffmpeg stderr kept in an execution error.
const STDERR_TAIL_LINES: usize = 5;

/// Loads an [`FfmpegEngine`] from a [`TranscoderConfig`].
pub struct FfmpegLoader {
    config: TranscoderConfig,
}

impl FfmpegLoader {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Run `ffmpeg -version` and return the first line of its banner.
    async fn probe_binary(&self) -> Result<String> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WandelwerkError::EngineInitialization(format!(
                        "ffmpeg not found at {}",
                        self.config.ffmpeg_path.display()
                    ))
                } else {
                    WandelwerkError::EngineInitialization(format!("cannot start ffmpeg: {e}"))
                }
            })?;

        if !output.status.success() {
            return Err(WandelwerkError::EngineInitialization(format!(
                "ffmpeg -version exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl EngineLoader for FfmpegLoader {
    #[instrument(skip(self), fields(ffmpeg = %self.config.ffmpeg_path.display()))]
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>> {
        let banner = self.probe_binary().await?;

        let workspace = tempfile::Builder::new()
            .prefix("wandelwerk-")
            .tempdir_in(&self.config.workspace_root)
            .map_err(|e| {
                WandelwerkError::EngineInitialization(format!("cannot create workspace: {e}"))
            })?;

        info!(%banner, workspace = %workspace.path().display(), "ffmpeg engine loaded");
        Ok(Arc::new(FfmpegEngine::new(&self.config, workspace)))
    }
}

/// Transcodes files inside a private temporary directory with ffmpeg.
pub struct FfmpegEngine {
    ffmpeg_path: PathBuf,
    log_level: String,
    extra_args: Vec<String>,
    workspace: TempDir,
}

impl FfmpegEngine {
    fn new(config: &TranscoderConfig, workspace: TempDir) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            log_level: config.log_level.clone(),
            extra_args: config.extra_args.clone(),
            workspace,
        }
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Resolve a workspace file name. Only the final path component is
    /// used, so a name can never escape the workspace.
    fn path_for(&self, name: &str) -> Result<PathBuf> {
        Path::new(name)
            .file_name()
            .map(|file| self.workspace.path().join(file))
            .ok_or_else(|| {
                WandelwerkError::EngineExecution(format!("invalid workspace file name {name:?}"))
            })
    }

    /// Builds ffmpeg arguments for a single-input, single-output transcode.
    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(output.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| WandelwerkError::EngineExecution(format!("cannot stage {name}: {e}")))
    }

    #[instrument(skip(self))]
    async fn run(&self, input: &str, output: &str) -> Result<()> {
        let args = self.build_args(&self.path_for(input)?, &self.path_for(output)?);
        debug!(?args, "running ffmpeg");

        let result = Command::new(&self.ffmpeg_path)
            .args(&args)
            .current_dir(self.workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| WandelwerkError::EngineExecution(format!("cannot start ffmpeg: {e}")))?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        warn!(status = %result.status, stderr = %tail, "ffmpeg failed");
        Err(WandelwerkError::EngineExecution(format!(
            "ffmpeg exited with {}: {tail}",
            result.status
        )))
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| WandelwerkError::EngineExecution(format!("cannot read {name}: {e}")))
    }

    async fn remove_file(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WandelwerkError::EngineExecution(format!(
                "cannot remove {name}: {e}"
            ))),
        }
    }
}
