//! Strictly sequential plan execution.
//!
//! Every [`GridPoint`] stands for a physical stage move followed by a
//! spectroscopy sweep, so points are handed to the [`PointAction`] one at a
//! time, in plan order, each finishing before the next starts. The runner
//! never retries. An action error ends the run and is returned as-is.
//! Cancellation is cooperative: the [`CancelToken`] is checked before every
//! point, and a cancelled run reports how far it got.
//!
//! # Example
//!
//! ```rust
//! use sxm_cits::runner::{run, PointAction, Progress, RunContext};
//! use sxm_cits::{compose, AreaParams, CitsResult, GridPoint, ScanFrame};
//!
//! struct Recorder(Vec<(f64, f64)>);
//!
//! impl PointAction for Recorder {
//!     fn visit(&mut self, point: &GridPoint, _progress: Progress) -> CitsResult<()> {
//!         self.0.push((point.x, point.y));
//!         Ok(())
//!     }
//! }
//!
//! let frame = ScanFrame::default();
//! let plan = compose(&frame, &[AreaParams::new(0.0, 0.0, 1.0, 1.0, 2, 2)]).unwrap();
//! let mut recorder = Recorder(Vec::new());
//! let report = run(&plan, &RunContext::new(), &mut recorder).unwrap();
//! assert_eq!(report.completed, 4);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::CitsResult;
use crate::plan::{GridPoint, MeasurementPlan};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The run stops before its next point.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-run context passed explicitly instead of living in mutable state.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Cancellation for this run.
    pub cancel: CancelToken,
}

impl RunContext {
    /// Context with a fresh token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context sharing an existing token.
    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

/// Where a point sits in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Zero-based position of the point in the plan.
    pub index: usize,
    /// Total points in the plan.
    pub total: usize,
}

impl Progress {
    /// Completion after this point, in percent.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.index + 1) as f64 * 100.0 / self.total as f64
    }
}

/// The hardware side of a run: move to the point and measure there.
pub trait PointAction {
    /// Handle one point. Returning an error aborts the run.
    fn visit(&mut self, point: &GridPoint, progress: Progress) -> CitsResult<()>;
}

impl<F> PointAction for F
where
    F: FnMut(&GridPoint, Progress) -> CitsResult<()>,
{
    fn visit(&mut self, point: &GridPoint, progress: Progress) -> CitsResult<()> {
        self(point, progress)
    }
}

/// Outcome of a run that was not aborted by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Points whose action returned `Ok`.
    pub completed: usize,
    /// Points in the plan.
    pub total: usize,
    /// True when the run stopped on the cancel token.
    pub cancelled: bool,
}

/// Walk `plan` in order, one point at a time.
pub fn run<A>(plan: &MeasurementPlan, ctx: &RunContext, action: &mut A) -> CitsResult<RunReport>
where
    A: PointAction + ?Sized,
{
    let total = plan.total_points();
    tracing::info!(total, "Starting CITS run");

    for (index, point) in plan.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            tracing::warn!(completed = index, total, "CITS run cancelled");
            return Ok(RunReport {
                completed: index,
                total,
                cancelled: true,
            });
        }

        let progress = Progress { index, total };
        tracing::debug!(
            point = index + 1,
            total,
            percent = progress.percent(),
            area_index = point.area_index,
            x = point.x,
            y = point.y,
            "STS point"
        );

        if let Err(e) = action.visit(point, progress) {
            tracing::error!(point = index + 1, total, error = %e, "CITS run aborted");
            return Err(e);
        }
    }

    tracing::info!(total, "CITS run completed");
    Ok(RunReport {
        completed: total,
        total,
        cancelled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaParams;
    use crate::error::CitsError;
    use crate::frame::ScanFrame;
    use crate::plan::compose;

    fn plan() -> MeasurementPlan {
        compose(
            &ScanFrame::default(),
            &[
                AreaParams::new(0.0, 0.0, 1.0, 1.0, 2, 2),
                AreaParams::new(10.0, 10.0, 1.0, 1.0, 3, 1),
            ],
        )
        .unwrap()
    }

    fn action<F: FnMut(&GridPoint, Progress) -> CitsResult<()>>(f: F) -> F {
        f
    }

    #[test]
    fn test_visits_in_plan_order() {
        let plan = plan();
        let mut seen = Vec::new();
        let report = run(
            &plan,
            &RunContext::new(),
            &mut action(|p, progress| {
                seen.push((progress.index, *p));
                Ok(())
            }),
        )
        .unwrap();

        assert_eq!(report, RunReport { completed: 7, total: 7, cancelled: false });
        let expected: Vec<(usize, GridPoint)> = plan.iter().copied().enumerate().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_cancel_stops_before_next_point() {
        let plan = plan();
        let ctx = RunContext::new();
        let token = ctx.cancel.clone();
        let mut visited = 0;
        let report = run(
            &plan,
            &ctx,
            &mut action(|_, progress| {
                visited += 1;
                if progress.index == 2 {
                    token.cancel();
                }
                Ok(())
            }),
        )
        .unwrap();

        assert_eq!(visited, 3);
        assert_eq!(report, RunReport { completed: 3, total: 7, cancelled: true });
    }

    #[test]
    fn test_action_error_aborts_without_retry() {
        let plan = plan();
        let mut calls = 0;
        let err = run(
            &plan,
            &RunContext::new(),
            &mut action(|_, progress| {
                calls += 1;
                if progress.index == 4 {
                    return Err(CitsError::Action("stage did not settle".to_string()));
                }
                Ok(())
            }),
        )
        .unwrap_err();

        assert_eq!(calls, 5);
        assert_eq!(err, CitsError::Action("stage did not settle".to_string()));
    }

    #[test]
    fn test_pre_cancelled_run_does_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let report = run(
            &plan(),
            &RunContext::with_cancel(token),
            &mut action(|_, _| Ok(())),
        )
        .unwrap();
        assert_eq!(report.completed, 0);
        assert!(report.cancelled);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress { index: 0, total: 4 }.percent(), 25.0);
        assert_eq!(Progress { index: 3, total: 4 }.percent(), 100.0);
    }
}
