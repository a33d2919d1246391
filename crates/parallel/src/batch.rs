//! Batch delineation with per-town failure isolation
//!
//! Every town is delineated as one unit. A town that fails is recorded in
//! the failure log and the batch moves on; a failure never aborts the run
//! and never affects another town's result.

use crate::strategy::{ParallelStrategy, ProcessingMode};
use downtown_algorithms::pipeline::{delineate_town, Downtown, DowntownParams};
use downtown_core::town::{Poi, Town, TownId};
use downtown_core::vector::FeatureCollection;
use downtown_core::{Error, ErrorKind, Result, CRS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of delineating one town
pub type TownOutcome = Result<Downtown>;

/// One entry of the failure log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub town_id: TownId,
    pub kind: ErrorKind,
    pub reason: String,
}

impl FailureRecord {
    pub fn new(town_id: TownId, error: &Error) -> Self {
        Self {
            town_id,
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// Cooperative cancellation, checked before each town starts.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; towns already running finish normally
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Delineated towns, ordered by id
    pub successes: BTreeMap<TownId, Downtown>,
    /// Failed towns, ordered by id
    pub failures: Vec<FailureRecord>,
    /// Towns never started because the batch was cancelled, ordered by id
    pub skipped: Vec<TownId>,
}

impl BatchReport {
    /// Number of towns accounted for
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len() + self.skipped.len()
    }

    /// Combined artifact: one feature per delineated town, in id order
    pub fn to_feature_collection(&self, crs: Option<CRS>) -> FeatureCollection {
        let mut collection = FeatureCollection::with_crs(crs);
        for downtown in self.successes.values() {
            collection.push(downtown.to_feature());
        }
        collection
    }
}

type ProgressFn<'a> = dyn Fn(&TownId, &TownOutcome) + Send + Sync + 'a;

enum Slot {
    Done(TownOutcome),
    Skipped,
}

/// Runs the delineation over many towns.
///
/// # Example
///
/// ```ignore
/// use downtown_parallel::{BatchRunner, ProcessingMode};
///
/// let report = BatchRunner::new(params)?
///     .with_mode(ProcessingMode::Parallel)
///     .run(&towns, &pois);
/// println!("{} delineated, {} failed", report.successes.len(), report.failures.len());
/// ```
pub struct BatchRunner<'a> {
    params: DowntownParams,
    mode: ProcessingMode,
    cancel: CancelFlag,
    progress: Option<Box<ProgressFn<'a>>>,
}

impl<'a> BatchRunner<'a> {
    /// Create a runner, validating `params` up front.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] when a parameter is out of range.
    pub fn new(params: DowntownParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            mode: ProcessingMode::default(),
            cancel: CancelFlag::new(),
            progress: None,
        })
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Callback invoked once per finished town, from the worker that ran it
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&TownId, &TownOutcome) + Send + Sync + 'a,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn params(&self) -> &DowntownParams {
        &self.params
    }

    /// Delineate every town against the shared POI collection.
    pub fn run(&self, towns: &[Town], pois: &[Poi]) -> BatchReport {
        let start = Instant::now();
        info!("Delineating {} towns ({:?})", towns.len(), self.mode);

        let slots = self.mode.par_map(0..towns.len(), |i| {
            let town = &towns[i];
            if self.cancel.is_cancelled() {
                return Slot::Skipped;
            }
            let outcome = delineate_town(town, pois, &self.params);
            if let Some(progress) = &self.progress {
                progress(&town.id, &outcome);
            }
            Slot::Done(outcome)
        });

        let mut report = BatchReport::default();
        for (town, slot) in towns.iter().zip(slots) {
            match slot {
                Slot::Done(Ok(downtown)) => {
                    debug!("Town {} delineated ({} cells)", town.id, downtown.n_hexes);
                    report.successes.insert(town.id.clone(), downtown);
                }
                Slot::Done(Err(e)) => {
                    warn!("Town {} failed: {}", town.id, e);
                    report.failures.push(FailureRecord::new(town.id.clone(), &e));
                }
                Slot::Skipped => report.skipped.push(town.id.clone()),
            }
        }
        report.failures.sort_by(|a, b| a.town_id.cmp(&b.town_id));
        report.skipped.sort();

        info!(
            "Batch finished in {:.2?}: {} delineated, {} failed, {} skipped",
            start.elapsed(),
            report.successes.len(),
            report.failures.len(),
            report.skipped.len()
        );
        report
    }
}

/// Delineate every town with the given parameters and mode.
///
/// # Errors
/// [`Error::InvalidParameter`] when a parameter is out of range. Per-town
/// errors are never returned; they are recorded in the report.
pub fn run_batch(towns: &[Town], pois: &[Poi], params: DowntownParams, mode: ProcessingMode) -> Result<BatchReport> {
    Ok(BatchRunner::new(params)?.with_mode(mode).run(towns, pois))
}
