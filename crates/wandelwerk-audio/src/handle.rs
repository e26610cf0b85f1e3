// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-flight engine handle.
//
// The first caller starts loading and caches the in-flight load as a shared
// future; every caller that arrives before it finishes awaits that same
// future, so the engine is loaded at most once. A failed load clears the
// slot and the next call starts a fresh attempt.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};
use wandelwerk_core::config::TranscoderConfig;
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{ProgressPhase, ProgressSink};

use crate::engine::{EngineLoader, TranscodeEngine};
use crate::ffmpeg::FfmpegLoader;

/// Shared outcome of one load attempt. The error is a message because the
/// outcome is cloned to every waiter.
type LoadFuture = Shared<BoxFuture<'static, std::result::Result<Arc<dyn TranscodeEngine>, String>>>;

enum Slot {
    Empty,
    Loading(LoadFuture),
    Ready(Arc<dyn TranscodeEngine>),
}

/// Lazily loaded, session-wide transcoding engine.
pub struct EngineHandle {
    loader: Arc<dyn EngineLoader>,
    slot: Mutex<Slot>,
    load_attempts: AtomicUsize,
}

impl EngineHandle {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(Slot::Empty),
            load_attempts: AtomicUsize::new(0),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a loaded engine is cached.
    pub fn is_ready(&self) -> bool {
        matches!(*self.slot(), Slot::Ready(_))
    }

    /// How many times the loader has been invoked.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Return the loaded engine, loading it first if needed.
    ///
    /// Reports [`ProgressPhase::LoadingEngine`] whenever the caller has to
    /// wait for a load, whether it started that load or joined one already
    /// in flight.
    pub async fn acquire(&self, progress: &dyn ProgressSink) -> Result<Arc<dyn TranscodeEngine>> {
        let pending = {
            let mut slot = self.slot();
            match &*slot {
                Slot::Ready(engine) => return Ok(Arc::clone(engine)),
                Slot::Loading(pending) => {
                    debug!("joining in-flight engine load");
                    pending.clone()
                }
                Slot::Empty => {
                    let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(attempt, "loading transcoding engine");
                    let loader = Arc::clone(&self.loader);
                    let pending = async move {
                        loader.load().await.map_err(|e| match e {
                            WandelwerkError::EngineInitialization(message) => message,
                            other => other.to_string(),
                        })
                    }
                    .boxed()
                    .shared();
                    *slot = Slot::Loading(pending.clone());
                    pending
                }
            }
        };

        progress.report(ProgressPhase::LoadingEngine);
        let outcome = pending.clone().await;

        let mut slot = self.slot();
        let still_current = matches!(&*slot, Slot::Loading(current) if current.ptr_eq(&pending));
        match outcome {
            Ok(engine) => {
                if still_current {
                    info!(engine = engine.name(), "transcoding engine ready");
                    *slot = Slot::Ready(Arc::clone(&engine));
                }
                Ok(engine)
            }
            Err(message) => {
                if still_current {
                    warn!(error = %message, "transcoding engine failed to load");
                    *slot = Slot::Empty;
                }
                Err(WandelwerkError::EngineInitialization(message))
            }
        }
    }
}

/// Process-wide ffmpeg engine handle.
///
/// The first call fixes the transcoder configuration for the rest of the
/// process; later calls get the same handle regardless of `config`.
pub fn shared_ffmpeg_handle(config: &TranscoderConfig) -> Arc<EngineHandle> {
    static HANDLE: OnceLock<Arc<EngineHandle>> = OnceLock::new();
    Arc::clone(HANDLE.get_or_init(|| {
        Arc::new(EngineHandle::new(Arc::new(FfmpegLoader::new(config.clone()))))
    }))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// In-memory engine: "transcodes" by prefixing the payload with the
    /// output extension. Inputs starting with `BAD` are rejected. Every
    /// workspace step yields, so concurrent jobs interleave.
    #[derive(Default)]
    pub struct MemoryEngine {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryEngine {
        pub fn file_names(&self) -> Vec<String> {
            self.files.lock().expect("files lock").keys().cloned().collect()
        }
    }

    #[async_trait]
    impl TranscodeEngine for MemoryEngine {
        fn name(&self) -> &str {
            "memory"
        }

        async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
            tokio::task::yield_now().await;
            self.files
                .lock()
                .expect("files lock")
                .insert(name.to_string(), data.to_vec());
            Ok(())
        }

        async fn run(&self, input: &str, output: &str) -> Result<()> {
            tokio::task::yield_now().await;
            let mut files = self.files.lock().expect("files lock");
            let data = files
                .get(input)
                .cloned()
                .ok_or_else(|| WandelwerkError::EngineExecution(format!("{input}: No such file")))?;
            if data.starts_with(b"BAD") {
                return Err(WandelwerkError::EngineExecution(
                    "Invalid data found when processing input".into(),
                ));
            }
            let ext = output.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
            let mut converted = format!("{ext}:").into_bytes();
            converted.extend_from_slice(&data);
            files.insert(output.to_string(), converted);
            Ok(())
        }

        async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
            tokio::task::yield_now().await;
            self.files
                .lock()
                .expect("files lock")
                .get(name)
                .cloned()
                .ok_or_else(|| WandelwerkError::EngineExecution(format!("{name}: No such file")))
        }

        async fn remove_file(&self, name: &str) -> Result<()> {
            self.files.lock().expect("files lock").remove(name);
            Ok(())
        }
    }

    /// Loader that counts calls, can fail a number of times first, and
    /// takes a little while so concurrent callers overlap.
    pub struct CountingLoader {
        pub engine: Arc<MemoryEngine>,
        pub loads: AtomicUsize,
        failures_left: AtomicUsize,
    }

    impl CountingLoader {
        pub fn new() -> Self {
            Self::failing(0)
        }

        pub fn failing(times: usize) -> Self {
            Self {
                engine: Arc::new(MemoryEngine::default()),
                loads: AtomicUsize::new(0),
                failures_left: AtomicUsize::new(times),
            }
        }
    }

    #[async_trait]
    impl EngineLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn TranscodeEngine>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(WandelwerkError::EngineInitialization("engine download failed".into()));
            }
            Ok(self.engine.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CountingLoader;
    use super::*;
    use wandelwerk_core::{FailureKind, NoopProgress};

    struct Phases(Mutex<Vec<ProgressPhase>>);

    impl ProgressSink for Phases {
        fn report(&self, phase: ProgressPhase) {
            self.0.lock().expect("phases lock").push(phase);
        }
    }

    #[tokio::test]
    async fn concurrent_first_use_loads_once() {
        let loader = Arc::new(CountingLoader::new());
        let handle = EngineHandle::new(loader.clone());

        let (a, b) = tokio::join!(handle.acquire(&NoopProgress), handle.acquire(&NoopProgress));
        let (a, b) = (a.expect("first"), b.expect("second"));

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(handle.load_attempts(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(handle.is_ready());
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_failure() {
        let loader = Arc::new(CountingLoader::failing(1));
        let handle = EngineHandle::new(loader.clone());

        let (a, b) = tokio::join!(handle.acquire(&NoopProgress), handle.acquire(&NoopProgress));
        assert_eq!(a.err().expect("a fails").kind(), FailureKind::EngineInitializationFailed);
        assert_eq!(b.err().expect("b fails").kind(), FailureKind::EngineInitializationFailed);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(!handle.is_ready());
    }

    #[tokio::test]
    async fn failed_load_is_retried_on_next_call() {
        let loader = Arc::new(CountingLoader::failing(1));
        let handle = EngineHandle::new(loader.clone());

        let err = handle.acquire(&NoopProgress).await.err().expect("first load fails");
        assert_eq!(err.to_string(), "transcoding engine failed to load: engine download failed");
        assert!(err.is_retryable());

        handle.acquire(&NoopProgress).await.expect("second load succeeds");
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
        assert!(handle.is_ready());
    }

    #[tokio::test]
    async fn loading_phase_is_reported_only_until_ready() {
        let handle = EngineHandle::new(Arc::new(CountingLoader::new()));
        let phases = Phases(Mutex::new(Vec::new()));

        handle.acquire(&phases).await.expect("load");
        handle.acquire(&phases).await.expect("cached");

        assert_eq!(
            *phases.0.lock().expect("phases lock"),
            vec![ProgressPhase::LoadingEngine]
        );
    }

    #[tokio::test]
    async fn poisoned_slot_still_loads_and_caches() {
        let loader = Arc::new(CountingLoader::new());
        let handle = EngineHandle::new(loader.clone());
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = handle.slot.lock().expect("first lock");
                    panic!("caller died holding the slot");
                })
                .join();
        });
        assert!(handle.slot.is_poisoned());

        handle.acquire(&NoopProgress).await.expect("load");
        handle.acquire(&NoopProgress).await.expect("cached");
        assert!(handle.is_ready());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_handle_is_process_wide() {
        let a = shared_ffmpeg_handle(&TranscoderConfig::default());
        let b = shared_ffmpeg_handle(&TranscoderConfig {
            log_level: "debug".into(),
            ..TranscoderConfig::default()
        });
        assert!(Arc::ptr_eq(&a, &b));
    }
}
