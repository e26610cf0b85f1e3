// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wandelwerk core types, the format registry, error definitions, and the
// engine capability contract shared across all crates.

pub mod adapter;
pub mod classify;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use adapter::{ConversionAdapter, ConvertedOutput, NoopProgress, ProgressPhase, ProgressSink};
pub use classify::{Classification, classify};
pub use config::ConverterConfig;
pub use error::{FailureKind, WandelwerkError};
pub use types::*;
