// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandelwerk-app: conversion orchestrator, artifact publisher and the
// service layer behind the `wandelwerk` command.

pub mod adapters;
pub mod job;
pub mod observer;
pub mod orchestrator;
pub mod publisher;
pub mod services;

pub use adapters::AdapterSet;
pub use job::ConversionJob;
pub use observer::{ConversionObserver, EventLog, NoopObserver, ObserverEvent};
pub use orchestrator::{JobState, Orchestrator, StateKind};
pub use publisher::{Artifact, ArtifactId, ArtifactInfo, ArtifactPublisher};
pub use services::AppServices;
