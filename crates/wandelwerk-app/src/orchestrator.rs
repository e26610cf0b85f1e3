// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion orchestrator: the per-session state machine.
//
//   Idle -> FileLoaded -> TargetChosen -> Converting -> Ready | Failed
//
// At most one job converts at a time. File selection, target selection and
// reset are all rejected while a conversion runs. Leaving `Ready` (reset,
// new file, new target, download, or drop) releases the artifact exactly
// once. The state lock is never held across an await.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::human_errors::humanize_error;
use wandelwerk_core::{
    ConversionAdapter, ConversionTarget, ConverterConfig, FailureKind, ProgressPhase,
    ProgressSink, SourceFile,
};

use crate::adapters::AdapterSet;
use crate::job::ConversionJob;
use crate::observer::ConversionObserver;
use crate::publisher::{Artifact, ArtifactInfo, ArtifactPublisher};

/// Where the session currently is.
#[derive(Debug)]
pub enum JobState {
    Idle,
    FileLoaded {
        job: ConversionJob,
    },
    TargetChosen {
        job: ConversionJob,
        target: ConversionTarget,
    },
    Converting {
        job: ConversionJob,
        target: ConversionTarget,
    },
    Ready {
        job: ConversionJob,
        target: ConversionTarget,
        artifact: Artifact,
    },
    /// `job` is kept when the failure happened during conversion, so the
    /// user can pick a target again.
    Failed {
        job: Option<ConversionJob>,
        kind: FailureKind,
        message: String,
    },
}

/// Payload-free view of [`JobState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Idle,
    FileLoaded,
    TargetChosen,
    Converting,
    Ready,
    Failed,
}

impl JobState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::FileLoaded { .. } => StateKind::FileLoaded,
            Self::TargetChosen { .. } => StateKind::TargetChosen,
            Self::Converting { .. } => StateKind::Converting,
            Self::Ready { .. } => StateKind::Ready,
            Self::Failed { .. } => StateKind::Failed,
        }
    }

    fn job(&self) -> Option<&ConversionJob> {
        match self {
            Self::Idle => None,
            Self::FileLoaded { job }
            | Self::TargetChosen { job, .. }
            | Self::Converting { job, .. }
            | Self::Ready { job, .. } => Some(job),
            Self::Failed { job, .. } => job.as_ref(),
        }
    }

    /// A target has been committed and the adapter owns the job.
    fn is_busy(&self) -> bool {
        matches!(self, Self::TargetChosen { .. } | Self::Converting { .. })
    }
}

/// Forwards progress phases to the observer.
struct ObserverProgress<'a>(&'a dyn ConversionObserver);

impl ProgressSink for ObserverProgress<'_> {
    fn report(&self, phase: ProgressPhase) {
        debug!(?phase, "progress");
        self.0.on_progress(phase.message());
    }
}

/// Marks the job failed if the conversion future is dropped before it settles.
struct InFlight<'a> {
    orchestrator: &'a Orchestrator,
    job: Option<ConversionJob>,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.job = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            warn!(job = %job.id, "conversion abandoned before completion");
            *self.orchestrator.lock() = JobState::Failed {
                job: Some(job),
                kind: FailureKind::Unknown,
                message: "The conversion was interrupted.".into(),
            };
        }
    }
}

/// Drives one session: file selection, target selection, conversion and
/// artifact lifetime.
pub struct Orchestrator {
    adapters: AdapterSet,
    publisher: Arc<ArtifactPublisher>,
    observer: Arc<dyn ConversionObserver>,
    output_stem: String,
    state: Mutex<JobState>,
}

impl Orchestrator {
    pub fn new(
        adapters: AdapterSet,
        publisher: Arc<ArtifactPublisher>,
        observer: Arc<dyn ConversionObserver>,
    ) -> Self {
        Self {
            adapters,
            publisher,
            observer,
            output_stem: ConverterConfig::default().output_stem,
            state: Mutex::new(JobState::Idle),
        }
    }

    /// Stem of suggested artifact names (`<stem>.<ext>`).
    pub fn with_output_stem(mut self, stem: impl Into<String>) -> Self {
        self.output_stem = stem.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state_kind(&self) -> StateKind {
        self.lock().kind()
    }

    /// Legal targets of the current file, empty when none is loaded.
    pub fn legal_targets(&self) -> Vec<ConversionTarget> {
        self.lock()
            .job()
            .map(|job| job.targets().to_vec())
            .unwrap_or_default()
    }

    /// The live artifact, if the session is `Ready`.
    pub fn current_artifact(&self) -> Option<ArtifactInfo> {
        match &*self.lock() {
            JobState::Ready { artifact, .. } => Some(artifact.info()),
            _ => None,
        }
    }

    /// The most recent failure, if the session is `Failed`.
    pub fn last_failure(&self) -> Option<(FailureKind, String)> {
        match &*self.lock() {
            JobState::Failed { kind, message, .. } => Some((*kind, message.clone())),
            _ => None,
        }
    }

    pub fn publisher(&self) -> &Arc<ArtifactPublisher> {
        &self.publisher
    }

    /// Release any held artifact and return to `Idle`.
    fn clear(&self, state: &mut JobState) {
        if let JobState::Ready { job, artifact, .. } = std::mem::replace(state, JobState::Idle) {
            debug!(job = %job.id, artifact = %artifact.id(), "releasing artifact");
            self.publisher.release(artifact);
        }
    }

    fn report_failure(&self, err: &WandelwerkError) -> (FailureKind, String) {
        let kind = err.kind();
        let human = humanize_error(err);
        // Diagnostics stay in the log; the observer gets the plain message.
        warn!(?kind, error = %err, "job failed");
        self.observer.on_failure(kind, &human.message);
        (kind, human.message)
    }

    // -- Inputs ---------------------------------------------------------------

    /// A new file was chosen. Returns its legal targets.
    ///
    /// Unsupported files pass through `Failed(UnsupportedFormat)`, are
    /// reported, and leave the session `Idle`.
    #[instrument(skip(self, source), fields(file = source.name(), size = source.len()))]
    pub fn on_file_selected(&self, source: SourceFile) -> Result<Vec<ConversionTarget>> {
        let job = {
            let mut state = self.lock();
            if state.is_busy() {
                warn!("file selected while a conversion is running");
                return Err(WandelwerkError::ConversionInProgress);
            }
            self.clear(&mut state);

            let job = ConversionJob::open(source);
            if job.classification.is_supported() {
                *state = JobState::FileLoaded { job: job.clone() };
                Ok(job)
            } else {
                let err = WandelwerkError::UnsupportedFormat(format!(
                    "{} ({})",
                    job.source.declared_type().unwrap_or("no declared type"),
                    job.source.name()
                ));
                *state = JobState::Failed {
                    job: None,
                    kind: err.kind(),
                    message: humanize_error(&err).message,
                };
                Err(err)
            }
        };

        match job {
            Ok(job) => {
                info!(
                    job = %job.id,
                    family = %job.family(),
                    digest = %job.digest,
                    targets = ?job.targets(),
                    "file loaded"
                );
                self.observer.on_legal_targets(job.targets());
                Ok(job.targets().to_vec())
            }
            Err(err) => {
                self.report_failure(&err);
                let mut state = self.lock();
                if matches!(*state, JobState::Failed { job: None, .. }) {
                    *state = JobState::Idle;
                }
                Err(err)
            }
        }
    }

    /// Commit to `target` for the current file.
    fn choose_target(
        &self,
        target: ConversionTarget,
    ) -> Result<(ConversionJob, Arc<dyn ConversionAdapter>)> {
        let mut state = self.lock();
        if state.is_busy() {
            warn!(%target, "target selected while a conversion is running");
            return Err(WandelwerkError::ConversionInProgress);
        }
        let Some(job) = state.job().cloned() else {
            warn!(%target, "target selected with no file loaded");
            return Err(WandelwerkError::NoFileLoaded);
        };
        if !job.allows(target) {
            warn!(%target, family = %job.family(), "target outside the legal set rejected");
            return Err(WandelwerkError::IllegalTargetSelected {
                target,
                family: job.family(),
            });
        }
        let adapter = self
            .adapters
            .for_family(job.family())
            .cloned()
            .ok_or_else(|| {
                WandelwerkError::Internal(format!("no adapter for {} input", job.family()))
            })?;

        self.clear(&mut state);
        debug!(job = %job.id, %target, "target chosen");
        *state = JobState::TargetChosen {
            job: job.clone(),
            target,
        };
        Ok((job, adapter))
    }

    /// The user picked an output format. Runs the conversion to completion.
    ///
    /// Accepted from `FileLoaded`, from `Ready` (the previous artifact is
    /// released first) and from a conversion failure (user-initiated retry).
    #[instrument(skip(self), fields(%target))]
    pub async fn on_target_selected(&self, target: ConversionTarget) -> Result<ArtifactInfo> {
        let (job, adapter) = self.choose_target(target)?;
        {
            let mut state = self.lock();
            *state = JobState::Converting {
                job: job.clone(),
                target,
            };
        }
        info!(job = %job.id, adapter = adapter.name(), "conversion started");

        let in_flight = InFlight {
            orchestrator: self,
            job: Some(job.clone()),
        };
        let progress = ObserverProgress(self.observer.as_ref());
        progress.report(ProgressPhase::Converting);
        let result = adapter.convert(&job.source, target, &progress).await;
        in_flight.settle();

        match result {
            Ok(output) => {
                let name = format!("{}.{}", self.output_stem, output.extension);
                let artifact = self.publisher.publish(output.bytes, output.mime_type, name);
                let info = artifact.info();
                info!(job = %job.id, artifact = %info.id, "conversion finished");
                {
                    let mut state = self.lock();
                    *state = JobState::Ready {
                        job,
                        target,
                        artifact,
                    };
                }
                self.observer.on_artifact_ready(&info);
                Ok(info)
            }
            Err(err) => {
                let (kind, message) = self.report_failure(&err);
                {
                    let mut state = self.lock();
                    *state = JobState::Failed {
                        job: Some(job),
                        kind,
                        message,
                    };
                }
                Err(err)
            }
        }
    }

    /// Return to `Idle`, releasing any live artifact.
    #[instrument(skip(self))]
    pub fn on_reset(&self) -> Result<()> {
        let mut state = self.lock();
        if state.is_busy() {
            warn!("reset requested while a conversion is running");
            return Err(WandelwerkError::ConversionInProgress);
        }
        self.clear(&mut state);
        info!("session reset");
        Ok(())
    }

    /// Save the ready artifact into `dir`, then release it. The file stays
    /// loaded so another target can be chosen.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn download(&self, dir: &Path) -> Result<PathBuf> {
        let mut state = self.lock();
        let path = match &*state {
            JobState::Ready { artifact, .. } => self.publisher.download(artifact, dir)?,
            _ => return Err(WandelwerkError::NoArtifact),
        };
        if let JobState::Ready { job, artifact, .. } = std::mem::replace(&mut *state, JobState::Idle)
        {
            self.publisher.release(artifact);
            *state = JobState::FileLoaded { job };
        }
        Ok(path)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let JobState::Ready { artifact, .. } = std::mem::replace(state, JobState::Idle) {
            debug!(artifact = %artifact.id(), "releasing artifact at teardown");
            self.publisher.release(artifact);
        }
    }
}
