//! # Downtown Parallel
//!
//! Batch orchestration for downtown delineation.
//!
//! This crate provides:
//! - Processing modes: sequential, or a Rayon worker pool
//! - The batch runner: per-town isolation, success map and failure log
//! - Cooperative cancellation between towns

pub mod batch;
pub mod strategy;

pub use batch::{run_batch, BatchReport, BatchRunner, CancelFlag, FailureRecord, TownOutcome};
pub use strategy::{num_cpus, ParallelStrategy, ProcessingMode};
