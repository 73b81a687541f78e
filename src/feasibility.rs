//! Feasibility Tester — spec §4.B.
//!
//! `is_schedulable(component, alpha, delta, performance_factor)` decides
//! whether a component's task set meets its demand bound at every critical
//! instant within the test horizon, under the component's BDR interface.

use std::collections::BTreeSet;

use crate::error::AnalysisError;
use crate::kernel::{dbf_edf, dbf_fps, sbf_bdr, DemandTask};
use crate::model::{ComponentId, SchedulingAlgorithm};
use crate::time::{ordered, Duration, OrderedTime};

/// Implementation cap on the feasibility test horizon (spec §4.B step 2,
/// §7 `HorizonExceeded`). Chosen generously: large enough that realistic
/// ADAS task sets never hit it, small enough that a pathological hyperperiod
/// (e.g. from coprime periods) does not hang the synthesizer's binary search.
pub const HORIZON_CAP: f64 = 1e5;

/// Maximum fixed-point iterations for the FPS per-task horizon search and
/// for the synthesizer's binary search on delta (spec §7: "no convergence
/// within precision after 64 iterations surfaces as Inconclusive").
pub const MAX_ITERATIONS: u32 = 64;

/// Decide whether `tasks` (already scaled for `performance_factor`) meets
/// its demand bound against the BDR interface `(alpha, delta)` under
/// `algorithm`, within the implementation's horizon cap.
pub fn is_schedulable(
    component: &ComponentId,
    algorithm: SchedulingAlgorithm,
    tasks: &[DemandTask],
    alpha: f64,
    delta: Duration,
) -> Result<bool, AnalysisError> {
    debug_assert!(alpha > 0.0 && alpha <= 1.0 + crate::time::EPS);
    debug_assert!(delta.0 >= -crate::time::EPS);

    if tasks.is_empty() {
        return Ok(true);
    }

    // Step 1: necessary utilization condition (spec §8 property 3).
    let total_utilization: f64 = tasks.iter().map(DemandTask::utilization).sum();
    if total_utilization > alpha + crate::time::EPS {
        log::debug!(
            "component {component}: utilization {total_utilization:.4} exceeds alpha {alpha:.4}, not schedulable"
        );
        return Ok(false);
    }

    match algorithm {
        SchedulingAlgorithm::Edf => is_schedulable_edf(component, tasks, alpha, delta),
        SchedulingAlgorithm::Fps => is_schedulable_fps(component, tasks, alpha, delta),
    }
}

fn hyperperiod(tasks: &[DemandTask]) -> f64 {
    tasks
        .iter()
        .map(|t| t.period.as_f64())
        .fold(1.0_f64, |lcm, period| lcm_f64(lcm, period))
}

/// LCM of two real-valued periods, computed by scaling to integers at a
/// fine-enough resolution. Real ADAS task periods are rational multiples of
/// a common clock tick in practice; this keeps the hyperperiod computation
/// exact for the common case of integral/decimal inputs.
fn lcm_f64(a: f64, b: f64) -> f64 {
    const SCALE: f64 = 1000.0;
    let a_i = (a * SCALE).round() as u64;
    let b_i = (b * SCALE).round() as u64;
    if a_i == 0 || b_i == 0 {
        return a.max(b);
    }
    num::integer::lcm(a_i, b_i) as f64 / SCALE
}

fn is_schedulable_edf(
    component: &ComponentId,
    tasks: &[DemandTask],
    alpha: f64,
    delta: Duration,
) -> Result<bool, AnalysisError> {
    let max_deadline = tasks.iter().map(|t| t.deadline.as_f64()).fold(0.0, f64::max);
    let max_period = tasks.iter().map(|t| t.period.as_f64()).fold(0.0, f64::max);
    let l_max_formula = 10.0 * max_deadline * (1.0 + max_period);
    let l_max = l_max_formula.min(HORIZON_CAP);

    let needed = hyperperiod(tasks);
    if needed > HORIZON_CAP {
        return Err(AnalysisError::HorizonExceeded {
            component: component.clone(),
            needed,
            cap: HORIZON_CAP,
        });
    }

    let horizon = Duration::new(needed.min(l_max));

    let mut check_points: BTreeSet<OrderedTime> = BTreeSet::new();
    for task in tasks {
        let mut t = task.deadline;
        while t.0 <= horizon.0 + crate::time::EPS {
            check_points.insert(ordered(t));
            t = t + task.period;
        }
    }

    for t in check_points {
        let t = Duration::new(t.into_inner());
        let demand = dbf_edf(tasks, t);
        let supply = sbf_bdr(alpha, delta, t);
        if demand.strictly_greater(supply) {
            return Ok(false);
        }
    }

    Ok(true)
}

fn is_schedulable_fps(
    component: &ComponentId,
    tasks: &[DemandTask],
    alpha: f64,
    delta: Duration,
) -> Result<bool, AnalysisError> {
    // spec assumes the taskset is already sorted in decreasing priority;
    // lower `priority` value = higher priority.
    let mut sorted: Vec<DemandTask> = tasks.to_vec();
    sorted.sort_by_key(|t| t.priority);

    for i in 0..sorted.len() {
        let task_i = sorted[i];

        let horizon_i = fps_task_horizon(&sorted, i, task_i.deadline)?;

        let mut check_points: BTreeSet<OrderedTime> = BTreeSet::new();
        check_points.insert(ordered(task_i.deadline));
        for task_j in &sorted[..=i] {
            let mut k = 1.0_f64;
            loop {
                let t = task_j.period * k;
                if t.0 > horizon_i.0 + crate::time::EPS {
                    break;
                }
                check_points.insert(ordered(t));
                k += 1.0;
            }
        }

        for t in check_points {
            let t = Duration::new(t.into_inner());
            let demand = dbf_fps(&sorted, t, i);
            let supply = sbf_bdr(alpha, delta, t);
            if demand.strictly_greater(supply) {
                return Ok(false);
            }
        }
    }

    let _ = component;
    Ok(true)
}

/// Fixed point of `R = WCET_i + sum_{j<i} ceil(R/T_j)*WCET_j`, iterated
/// until `R` stabilizes or exceeds the task's deadline (spec §4.B step 2).
fn fps_task_horizon(
    sorted: &[DemandTask],
    i: usize,
    deadline: Duration,
) -> Result<Duration, AnalysisError> {
    let mut r = sorted[i].wcet;

    for _ in 0..MAX_ITERATIONS {
        let higher_priority: Duration = sorted[..i]
            .iter()
            .map(|task_j| task_j.wcet * (r / task_j.period).ceil())
            .sum();
        let new_r = sorted[i].wcet + higher_priority;

        if new_r.0 > deadline.0 + crate::time::EPS {
            return Ok(deadline);
        }
        if new_r.approx_eq(r) {
            return Ok(new_r);
        }
        r = new_r;
    }

    Ok(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(wcet: f64, deadline: f64, period: f64, priority: i64) -> DemandTask {
        DemandTask {
            wcet: Duration::new(wcet),
            deadline: Duration::new(deadline),
            period: Duration::new(period),
            priority,
        }
    }

    #[test]
    fn necessary_condition_rejects_oversubscription() {
        let cid = ComponentId::from("c1");
        let tasks = vec![dt(8.0, 10.0, 10.0, 0)];
        let result = is_schedulable(&cid, SchedulingAlgorithm::Edf, &tasks, 0.5, Duration::new(20.0)).unwrap();
        assert!(!result);
    }

    #[test]
    fn dedicated_core_is_always_schedulable_at_capacity() {
        let cid = ComponentId::from("root");
        let tasks = vec![dt(2.0, 5.0, 5.0, 0), dt(2.0, 10.0, 10.0, 1)];
        let result = is_schedulable(&cid, SchedulingAlgorithm::Edf, &tasks, 1.0, Duration::ZERO).unwrap();
        assert!(result);
    }

    #[test]
    fn fps_response_time_example() {
        // tau1(wcet=3,T=10,D=10) high priority, tau2(wcet=6,T=15,D=15) low priority.
        let cid = ComponentId::from("fps");
        let tasks = vec![dt(3.0, 10.0, 10.0, 0), dt(6.0, 15.0, 15.0, 1)];
        let result = is_schedulable(&cid, SchedulingAlgorithm::Fps, &tasks, 1.0, Duration::ZERO).unwrap();
        assert!(result);
    }
}
