// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandelwerk-audio: audio transcoding for Wandelwerk.
//
// The transcoding engine is expensive to bring up, so it is loaded on first
// use behind a single-flight guard and then shared for the whole session.

pub mod adapter;
pub mod engine;
pub mod ffmpeg;
pub mod handle;

pub use adapter::TranscodingAdapter;
pub use engine::{EngineLoader, TranscodeEngine};
pub use ffmpeg::{FfmpegEngine, FfmpegLoader};
pub use handle::{EngineHandle, shared_ffmpeg_handle};
