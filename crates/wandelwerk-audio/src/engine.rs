// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcoding engine contract.
//
// An engine owns a private file workspace. Callers stage the input under a
// file name, run a transcode whose output format is implied by the output
// file's extension, read the result back and remove both files.

use std::sync::Arc;

use async_trait::async_trait;
use wandelwerk_core::error::Result;

/// A loaded transcoding engine with its own virtual file workspace.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Store `data` in the workspace under `name`, replacing any existing file.
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Transcode workspace file `input` into workspace file `output`.
    async fn run(&self, input: &str, output: &str) -> Result<()>;

    /// Read a workspace file back.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove a workspace file. Removing a missing file is not an error.
    async fn remove_file(&self, name: &str) -> Result<()>;
}

/// Brings up a [`TranscodeEngine`].
///
/// Loading is the expensive step; `EngineHandle` makes sure it happens at
/// most once per session, however many conversions ask for it.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>>;
}
