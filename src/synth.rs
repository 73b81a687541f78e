//! Interface Synthesizer — spec §4.C.
//!
//! Walks each root's component tree post-order (children before parents,
//! because a child's Half-Half supply task becomes additional demand inside
//! the parent) and, for every non-root component, binary-searches for the
//! loosest BDR interface `(alpha, delta)` that keeps it schedulable.
//!
//! Mirrors the teacher's `SchedDesign` trait shape (precondition check,
//! `run_designer`, `anyhow`-annotated `design()` entry point) generalized to
//! this crate's [`crate::error`] types.

use crate::error::{AnalysisError, ModelError};
use crate::feasibility::{is_schedulable, MAX_ITERATIONS};
use crate::kernel::{half_half, DemandTask, SupplyTask};
use crate::model::{Component, ComponentId, Interface, SystemModel, TaskKind};
use crate::output::{AnalysisResults, ComponentInterface};
use crate::time::Duration;
use crate::validate::validate;

/// Precision of the delta binary search (spec §4.C step 2).
const DELTA_PRECISION: f64 = 0.1;

/// Per-iteration alpha escalation factor (spec §4.C step 3).
const ALPHA_ESCALATION: f64 = 1.2;

pub fn synthesize(model: &mut SystemModel) -> Result<AnalysisResults, ModelError> {
    validate(model)?;

    let mut interfaces = Vec::new();
    let mut overall_schedulable = true;

    for root in &mut model.roots {
        let core = model
            .cores
            .iter()
            .find(|c| c.id == root.core_id)
            .expect("validated model guarantees every root's core exists")
            .clone();

        root.component.set_interface(Interface::ROOT);

        let outcome = synthesize_subtree(&mut root.component, core.performance_factor, true, &mut interfaces);
        overall_schedulable &= outcome.schedulable;
    }

    Ok(AnalysisResults {
        is_schedulable: overall_schedulable,
        component_interfaces: interfaces,
        timestamp: crate::clock::timestamp(),
    })
}

struct SubtreeOutcome {
    /// The supply task this component contributes to its parent's demand,
    /// `None` for the root (it has no parent to supply).
    supply_for_parent: Option<DemandTask>,
    schedulable: bool,
}

fn synthesize_subtree(
    component: &mut Component,
    performance_factor: f64,
    is_root: bool,
    reports: &mut Vec<ComponentInterface>,
) -> SubtreeOutcome {
    // Post-order: children's interfaces are synthesized first, since their
    // supply tasks are folded into this component's own demand.
    let mut child_supply_tasks = Vec::new();
    let mut children_schedulable = true;
    for child in &mut component.child_components {
        let outcome = synthesize_subtree(child, performance_factor, false, reports);
        children_schedulable &= outcome.schedulable;
        if let Some(supply) = outcome.supply_for_parent {
            child_supply_tasks.push(supply);
        }
    }

    let mut own_tasks: Vec<DemandTask> = component
        .tasks
        .iter()
        .map(|task| DemandTask {
            wcet: task.scaled_wcet(performance_factor),
            deadline: task.deadline,
            period: task.kind.period_or_mit(),
            priority: task.priority.unwrap_or(i64::MAX),
        })
        .collect();
    own_tasks.extend(child_supply_tasks);

    if is_root {
        let schedulable = is_schedulable(&component.id, component.scheduling_algorithm, &own_tasks, 1.0, Duration::ZERO)
            .unwrap_or(false)
            && children_schedulable;

        reports.push(ComponentInterface {
            component_id: component.id.clone(),
            alpha: 1.0,
            delta: Duration::ZERO,
            supply_budget: None,
            supply_period: None,
            schedulable,
        });

        return SubtreeOutcome { supply_for_parent: None, schedulable };
    }

    let max_deadline = own_tasks.iter().map(|t| t.deadline.as_f64()).fold(0.0, f64::max).max(1.0);
    let (alpha, delta, own_schedulable) = find_interface(&component.id, component.scheduling_algorithm, &own_tasks, max_deadline);

    component.set_interface(Interface { alpha, delta });

    let server = half_half(alpha.min(1.0), delta);
    let schedulable = own_schedulable && children_schedulable;

    reports.push(ComponentInterface {
        component_id: component.id.clone(),
        alpha,
        delta,
        supply_budget: Some(server.budget),
        supply_period: Some(server.period),
        schedulable,
    });

    let supply_for_parent = DemandTask {
        wcet: server.budget,
        deadline: server.period,
        period: server.period,
        priority: component.tasks.iter().filter_map(|t| t.priority).min().unwrap_or(0),
    };

    SubtreeOutcome { supply_for_parent: Some(supply_for_parent), schedulable }
}

/// Find the loosest `(alpha, delta)` that keeps `tasks` schedulable,
/// escalating `alpha` when no `delta` in the search range works.
///
/// Returns `(alpha, delta, schedulable)`; `schedulable` is `false` only when
/// even `alpha = 1` is infeasible (spec §4.C step 3 / §7 `Infeasible`), in
/// which case `alpha` is reported above `1` as the infeasibility sentinel
/// and `delta` is the last value tried.
fn find_interface(
    component: &ComponentId,
    algorithm: crate::model::SchedulingAlgorithm,
    tasks: &[DemandTask],
    max_deadline: f64,
) -> (f64, Duration, bool) {
    let total_utilization: f64 = tasks.iter().map(DemandTask::utilization).sum();
    let mut alpha = (1.1 * total_utilization).min(1.0).max(1e-6);

    loop {
        match search_delta(component, algorithm, tasks, alpha, max_deadline) {
            Ok(delta) => return (alpha, delta, true),
            Err(AnalysisError::HorizonExceeded { needed, cap, .. }) => {
                log::warn!("component {component}: feasibility horizon {needed} exceeds cap {cap}, treating as infeasible at alpha {alpha}");
            }
            Err(_) => {}
        }

        if alpha >= 1.0 - crate::time::EPS {
            log::warn!("component {component}: infeasible even at alpha = 1");
            return (1.0 + (ALPHA_ESCALATION - 1.0), Duration::new(2.0 * max_deadline), false);
        }

        alpha = (alpha * ALPHA_ESCALATION).min(1.0);
    }
}

/// Binary search the largest feasible `delta` in `[0, 2*max_deadline]` for a
/// fixed `alpha`.
///
/// The supply bound `sbf_bdr(alpha, delta, t)` is non-increasing in `delta`
/// for any fixed `t` (spec §8 invariant 1), so schedulability is a
/// monotonically non-increasing predicate of `delta`: true on some prefix
/// `[0, delta*]`, false beyond. The search keeps `lo` as the largest
/// known-feasible value and `hi` as the smallest known-infeasible value,
/// tightening both until they are within [`DELTA_PRECISION`] of each other,
/// then returns `lo` — the loosest delta confirmed schedulable. (This
/// direction is the one consistent with that invariant; see DESIGN.md.)
fn search_delta(
    component: &ComponentId,
    algorithm: crate::model::SchedulingAlgorithm,
    tasks: &[DemandTask],
    alpha: f64,
    max_deadline: f64,
) -> Result<Duration, AnalysisError> {
    let hi_bound = 2.0 * max_deadline;

    if !is_schedulable(component, algorithm, tasks, alpha, Duration::ZERO)? {
        return Err(AnalysisError::Infeasible { component: component.clone(), last_alpha: alpha });
    }

    if is_schedulable(component, algorithm, tasks, alpha, Duration::new(hi_bound))? {
        return Ok(Duration::new(hi_bound));
    }

    let mut lo = 0.0_f64;
    let mut hi = hi_bound;
    for iteration in 0..MAX_ITERATIONS {
        if hi - lo < DELTA_PRECISION {
            return Ok(Duration::new(lo));
        }
        let mid = (lo + hi) / 2.0;
        if is_schedulable(component, algorithm, tasks, alpha, Duration::new(mid))? {
            lo = mid;
        } else {
            hi = mid;
        }

        if iteration == MAX_ITERATIONS - 1 {
            return Err(AnalysisError::Inconclusive { component: component.clone(), iterations: MAX_ITERATIONS });
        }
    }

    Ok(Duration::new(lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn core(id: &str, factor: f64) -> Core {
        Core { id: CoreId::from(id), name: id.to_string(), performance_factor: factor }
    }

    fn periodic_task(id: &str, wcet: f64, deadline: f64, period: f64) -> Task {
        Task {
            id: TaskId::from(id),
            name: id.to_string(),
            kind: TaskKind::Periodic { period: Duration::new(period) },
            bcet: None,
            wcet: Duration::new(wcet),
            deadline: Duration::new(deadline),
            priority: None,
        }
    }

    fn single_root_model(tasks: Vec<Task>, factor: f64) -> SystemModel {
        let component = Component {
            id: ComponentId::from("core-c1-root"),
            name: "root".to_string(),
            scheduling_algorithm: SchedulingAlgorithm::Edf,
            alpha: None,
            delta: None,
            tasks,
            child_components: vec![],
        };
        SystemModel { cores: vec![core("c1", factor)], roots: vec![RootBinding { core_id: CoreId::from("c1"), component }] }
    }

    #[test]
    fn scenario_1_low_utilization_is_schedulable() {
        let mut model = single_root_model(
            vec![periodic_task("t1", 2.0, 5.0, 5.0), periodic_task("t2", 2.0, 10.0, 10.0)],
            1.0,
        );
        let result = synthesize(&mut model).unwrap();
        assert!(result.is_schedulable);
    }

    #[test]
    fn scenario_2_full_utilization_is_schedulable() {
        let mut model = single_root_model(
            vec![periodic_task("t1", 4.0, 5.0, 5.0), periodic_task("t2", 2.0, 10.0, 10.0)],
            1.0,
        );
        let result = synthesize(&mut model).unwrap();
        assert!(result.is_schedulable);
        assert_eq!(result.component_interfaces[0].alpha, 1.0);
    }

    #[test]
    fn idempotent_within_precision() {
        let mut model = single_root_model(
            vec![periodic_task("t1", 2.0, 5.0, 5.0), periodic_task("t2", 2.0, 10.0, 10.0)],
            1.0,
        );
        let first = synthesize(&mut model).unwrap();
        let mut model2 = single_root_model(
            vec![periodic_task("t1", 2.0, 5.0, 5.0), periodic_task("t2", 2.0, 10.0, 10.0)],
            1.0,
        );
        let second = synthesize(&mut model2).unwrap();
        assert_eq!(first.is_schedulable, second.is_schedulable);
    }
}
