// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outbound events from the orchestrator to its host.

use std::sync::{Mutex, MutexGuard, PoisonError};

use wandelwerk_core::{ConversionTarget, FailureKind};

use crate::publisher::ArtifactInfo;

/// Receives orchestrator events. Every method defaults to a no-op, so a
/// host only implements what it displays.
pub trait ConversionObserver: Send + Sync {
    /// Legal targets for the file just loaded, in display order.
    fn on_legal_targets(&self, _targets: &[ConversionTarget]) {}

    /// A busy-indicator label.
    fn on_progress(&self, _message: &str) {}

    /// A conversion finished and its artifact is live.
    fn on_artifact_ready(&self, _artifact: &ArtifactInfo) {}

    /// A job failed. `message` is safe to show to the user.
    fn on_failure(&self, _kind: FailureKind, _message: &str) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// One recorded observer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    LegalTargets(Vec<ConversionTarget>),
    Progress(String),
    ArtifactReady(ArtifactInfo),
    Failure(FailureKind, String),
}

/// Observer that keeps every event in order, for hosts that poll.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<ObserverEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.log().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<ObserverEvent> {
        std::mem::take(&mut *self.log())
    }

    /// Progress labels only.
    pub fn progress_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObserverEvent::Progress(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObserverEvent) {
        self.log().push(event);
    }

    fn log(&self) -> MutexGuard<'_, Vec<ObserverEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConversionObserver for EventLog {
    fn on_legal_targets(&self, targets: &[ConversionTarget]) {
        self.push(ObserverEvent::LegalTargets(targets.to_vec()));
    }

    fn on_progress(&self, message: &str) {
        self.push(ObserverEvent::Progress(message.to_string()));
    }

    fn on_artifact_ready(&self, artifact: &ArtifactInfo) {
        self.push(ObserverEvent::ArtifactReady(artifact.clone()));
    }

    fn on_failure(&self, kind: FailureKind, message: &str) {
        self.push(ObserverEvent::Failure(kind, message.to_string()));
    }
}
