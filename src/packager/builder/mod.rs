//! Build orchestration.
//!
//! This module provides the [`BuildOrchestrator`] that turns a synced
//! Capacitor project into a validated APK.
//!
//! # Overview
//!
//! The orchestrator:
//! 1. Validates [`BuildOptions`](crate::packager::BuildOptions) before spawning anything
//! 2. Computes the toolchain invocation for the selected backend
//! 3. Streams and classifies the toolchain output
//! 4. Discovers, validates and relocates the produced APK
//! 5. Records every stage as a [`BuildStep`]
//!
//! # Module Organization
//!
//! - [`arguments`] - Toolchain argument and working directory computation
//! - [`artifacts`] - APK discovery, validation and relocation
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`BuildOrchestrator`] struct
//! - [`output`] - Classification of build output lines
//! - [`steps`] - Per-stage build telemetry

pub mod arguments;
pub mod artifacts;
pub mod checksum;
mod orchestrator;
pub mod output;
pub mod steps;

pub use artifacts::BuildArtifact;
pub use orchestrator::{BuildOrchestrator, BuildOutcome, ProgressFn};
pub use steps::{BuildStep, StepStatus};
