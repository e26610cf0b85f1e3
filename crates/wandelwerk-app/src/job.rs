// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A loaded file together with its classification.

use chrono::{DateTime, Utc};
use wandelwerk_core::{Classification, ConversionTarget, FormatFamily, JobId, SourceFile, classify};

/// One file selection, alive from `FileLoaded` until the next file or reset.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub id: JobId,
    pub source: SourceFile,
    pub classification: Classification,
    /// SHA-256 of the source bytes, hex encoded.
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

impl ConversionJob {
    /// Classify `source` and open a job for it.
    pub fn open(source: SourceFile) -> Self {
        let classification = classify(&source);
        Self {
            id: JobId::new(),
            digest: source.digest(),
            classification,
            source,
            created_at: Utc::now(),
        }
    }

    pub fn family(&self) -> FormatFamily {
        self.classification.family
    }

    pub fn targets(&self) -> &[ConversionTarget] {
        &self.classification.targets
    }

    pub fn allows(&self, target: ConversionTarget) -> bool {
        self.classification.allows(target)
    }
}
