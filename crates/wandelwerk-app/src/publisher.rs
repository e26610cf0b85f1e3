// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact publisher: binds converted bytes to a revocable resource handle.
//
// An `Artifact` is the only proof that a handle is live. It cannot be cloned
// and `release` consumes it, so each published artifact is released at most
// once. Stale ids passed to `revoke` are reported as `AlreadyReleased`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wandelwerk_core::error::{Result, WandelwerkError};

/// Identifier of a published artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactId(Uuid);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live, published conversion result.
#[derive(Debug)]
pub struct Artifact {
    id: ArtifactId,
    mime_type: String,
    suggested_name: String,
    size: usize,
}

impl Artifact {
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn suggested_name(&self) -> &str {
        &self.suggested_name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Opaque locator handed to the host environment.
    pub fn resource_url(&self) -> String {
        format!("blob:wandelwerk/{}", self.id)
    }

    /// Cloneable description for observers.
    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            id: self.id,
            mime_type: self.mime_type.clone(),
            suggested_name: self.suggested_name.clone(),
            size: self.size,
            url: self.resource_url(),
        }
    }
}

/// Snapshot of an artifact's metadata. Holding one does not keep the
/// handle alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub id: ArtifactId,
    pub mime_type: String,
    pub suggested_name: String,
    pub size: usize,
    pub url: String,
}

struct Entry {
    bytes: Arc<[u8]>,
    suggested_name: String,
}

/// Registry of live resource handles.
#[derive(Default)]
pub struct ArtifactPublisher {
    live: Mutex<HashMap<ArtifactId, Entry>>,
    published: AtomicUsize,
    released: AtomicUsize,
}

impl ArtifactPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> MutexGuard<'_, HashMap<ArtifactId, Entry>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a handle bound to `bytes`.
    pub fn publish(
        &self,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        suggested_name: impl Into<String>,
    ) -> Artifact {
        let artifact = Artifact {
            id: ArtifactId(Uuid::new_v4()),
            mime_type: mime_type.into(),
            suggested_name: suggested_name.into(),
            size: bytes.len(),
        };
        self.live().insert(
            artifact.id,
            Entry {
                bytes: bytes.into(),
                suggested_name: artifact.suggested_name.clone(),
            },
        );
        self.published.fetch_add(1, Ordering::SeqCst);
        info!(
            artifact = %artifact.id,
            mime = %artifact.mime_type,
            name = %artifact.suggested_name,
            size = artifact.size,
            "artifact published"
        );
        artifact
    }

    /// Revoke the artifact's handle.
    pub fn release(&self, artifact: Artifact) {
        if let Err(e) = self.revoke(artifact.id) {
            warn!(artifact = %artifact.id, error = %e, "artifact handle was revoked out of band");
        }
    }

    /// Revoke a handle by id.
    pub fn revoke(&self, id: ArtifactId) -> Result<()> {
        let removed = self.live().remove(&id);
        match removed {
            Some(entry) => {
                self.released.fetch_add(1, Ordering::SeqCst);
                debug!(artifact = %id, name = %entry.suggested_name, "artifact released");
                Ok(())
            }
            None => Err(WandelwerkError::AlreadyReleased(id.to_string())),
        }
    }

    /// Payload of a live handle.
    pub fn open(&self, id: ArtifactId) -> Result<Arc<[u8]>> {
        self.live()
            .get(&id)
            .map(|entry| Arc::clone(&entry.bytes))
            .ok_or_else(|| WandelwerkError::AlreadyReleased(id.to_string()))
    }

    /// Save a live artifact into `dir` under its suggested name.
    pub fn download(&self, artifact: &Artifact, dir: &Path) -> Result<PathBuf> {
        let bytes = self.open(artifact.id)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&artifact.suggested_name);
        std::fs::write(&path, &bytes)?;
        info!(artifact = %artifact.id, path = %path.display(), "artifact saved");
        Ok(path)
    }

    pub fn is_live(&self, id: ArtifactId) -> bool {
        self.live().contains_key(&id)
    }

    /// Number of handles currently live.
    pub fn live_count(&self) -> usize {
        self.live().len()
    }

    pub fn published_total(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    pub fn released_total(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}
