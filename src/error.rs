//! Error types for model validation and analysis.
//!
//! Split the way the teacher's `SchedError`/`DesignError` split analysis
//! failures from design failures: [`ModelError`] covers the fatal,
//! before-any-computation validation failures of spec §7 policy;
//! [`AnalysisError`] covers conditions that arise *during* synthesis or
//! feasibility testing, some of which (`Infeasible`, `HorizonExceeded`) are
//! surfaced as negative results rather than propagated as hard errors.

use crate::model::{ComponentId, CoreId, TaskId};

/// A fatal error raised while ingesting or validating a [`crate::model::SystemModel`].
///
/// Per spec §7 policy, these are returned before any computation is
/// attempted — never partway through synthesis or simulation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid model: {reason}")]
    InvalidModel { reason: String },

    #[error("root component {component} is not bound to any declared core")]
    UnboundComponent { component: ComponentId },

    #[error("duplicate id: {kind} id {id:?} is used more than once")]
    DuplicateId { kind: &'static str, id: String },

    #[error("core {0} is referenced by a component but is not declared")]
    UnknownCore(CoreId),
}

/// A non-fatal condition encountered while synthesizing an interface or
/// running the feasibility tester for a single component.
///
/// `Infeasible` and `HorizonExceeded` are not propagated with `?` out of
/// the synthesizer: they are captured per-component in
/// [`crate::output::ComponentInterfaceReport`] so the whole tree still
/// produces a result. Call sites that want an early abort can convert with
/// `From`/`?` as usual.
#[derive(Debug, thiserror::Error, Clone)]
pub enum AnalysisError {
    #[error("component {component} is infeasible: no (alpha <= 1, delta >= 0) found; last trial alpha = {last_alpha}")]
    Infeasible { component: ComponentId, last_alpha: f64 },

    #[error("feasibility test for component {component} would require a horizon of {needed} exceeding the cap of {cap}")]
    HorizonExceeded { component: ComponentId, needed: f64, cap: f64 },

    #[error("binary search for component {component} did not converge within {iterations} iterations")]
    Inconclusive { component: ComponentId, iterations: u32 },

    #[error("task {task} references a missing component")]
    DanglingTask { task: TaskId },
}

/// Raised by a caller that requests cooperative cancellation of a running
/// simulation. Never returned from [`crate::sim::simulate`] itself — the
/// simulator instead sets `truncated = true` on its result, per spec §5.
#[derive(Debug, thiserror::Error)]
#[error("simulation was cancelled at t = {last_time}")]
pub struct SimulationCancelled {
    pub last_time: f64,
}
