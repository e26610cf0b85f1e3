// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: loads configuration and builds the shared pieces a
// front end needs to open conversion sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use wandelwerk_audio::EngineHandle;
use wandelwerk_core::ConverterConfig;
use wandelwerk_core::error::Result;

use super::data_dir;
use crate::adapters::AdapterSet;
use crate::observer::ConversionObserver;
use crate::orchestrator::Orchestrator;
use crate::publisher::ArtifactPublisher;

/// Shared application services. Cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<ConverterConfig>,
    adapters: AdapterSet,
    publisher: Arc<ArtifactPublisher>,
    data_dir: PathBuf,
}

impl AppServices {
    /// Initialise from the data directory's `config.json`, or from
    /// `config_path` when given.
    pub fn init(config_path: Option<&Path>) -> Result<Self> {
        let dir = data_dir::data_dir();
        let config = match config_path {
            Some(path) => ConverterConfig::load(path)?,
            None => ConverterConfig::load_or_default(&dir),
        };
        info!(path = %dir.display(), "app services initialised");
        Ok(Self::with_config(config, dir))
    }

    /// Build services from an explicit configuration.
    pub fn with_config(config: ConverterConfig, data_dir: PathBuf) -> Self {
        let adapters = AdapterSet::standard(&config);
        Self::assemble(config, adapters, data_dir)
    }

    /// Build services with a caller-supplied transcoding engine.
    pub fn with_engine(config: ConverterConfig, engine: Arc<EngineHandle>, data_dir: PathBuf) -> Self {
        let adapters = AdapterSet::with_engine(&config, engine);
        Self::assemble(config, adapters, data_dir)
    }

    fn assemble(config: ConverterConfig, adapters: AdapterSet, data_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            adapters,
            publisher: Arc::new(ArtifactPublisher::new()),
            data_dir,
        }
    }

    /// Open a conversion session reporting to `observer`.
    pub fn session(&self, observer: Arc<dyn ConversionObserver>) -> Orchestrator {
        Orchestrator::new(self.adapters.clone(), Arc::clone(&self.publisher), observer)
            .with_output_stem(self.config.output_stem.clone())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Arc<ArtifactPublisher> {
        &self.publisher
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
