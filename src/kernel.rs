//! Demand/Supply Kernel — pure functions over real-valued `t >= 0`.
//!
//! Ported from the classical EDF processor-demand criterion (Baruah),
//! fixed-priority response-time demand, the Bounded-Delay Resource supply
//! bound, and the Half-Half transform (Shin & Lee 2003). These are the only
//! functions in the crate that touch the raw demand/supply formulas; every
//! other module calls through here.

use crate::time::Duration;

/// A task's contribution to demand/supply analysis, decoupled from the full
/// [`crate::model::Task`] so that synthesized child supply-tasks (which are
/// not real tasks) can be folded into a parent's demand using the same
/// machinery (spec §9's explicit note that child-supply-task demand must be
/// added to the parent during synthesis).
#[derive(Debug, Clone, Copy)]
pub struct DemandTask {
    pub wcet: Duration,
    pub deadline: Duration,
    pub period: Duration,
    pub priority: i64,
}

impl DemandTask {
    pub fn utilization(&self) -> f64 {
        self.wcet.as_f64() / self.period.as_f64()
    }
}

/// `sbf_bdr(alpha, delta, t)`: the Bounded-Delay Resource supply bound.
///
/// `0` for `t <= delta`, else `alpha * (t - delta)`.
#[must_use]
pub fn sbf_bdr(alpha: f64, delta: Duration, t: Duration) -> Duration {
    if t.0 <= delta.0 {
        Duration::ZERO
    } else {
        Duration::new(alpha * (t - delta).as_f64())
    }
}

/// `dbf_edf(tasks, t)`: aggregate processor demand under EDF (Baruah).
///
/// For each task `i`, contribution = `max(0, floor((t - D_i)/T_i) + 1) * WCET_i`.
#[must_use]
pub fn dbf_edf(tasks: &[DemandTask], t: Duration) -> Duration {
    tasks
        .iter()
        .map(|task| {
            let k = ((t - task.deadline).as_f64() / task.period.as_f64()).floor() + 1.0;
            let jobs = k.max(0.0);
            task.wcet * jobs
        })
        .sum()
}

/// `dbf_fps(tasks, t, i)`: response-time demand for task `i`, assuming
/// `tasks` is sorted in decreasing priority (index 0 = highest priority).
///
/// `WCET_i + sum_{j<i} ceil(t/T_j) * WCET_j`.
#[must_use]
pub fn dbf_fps(tasks_sorted_by_priority: &[DemandTask], t: Duration, i: usize) -> Duration {
    let task_i = &tasks_sorted_by_priority[i];

    let higher_priority_demand: Duration = tasks_sorted_by_priority[..i]
        .iter()
        .map(|task_j| {
            let jobs = (t / task_j.period).ceil();
            task_j.wcet * jobs
        })
        .sum();

    task_i.wcet + higher_priority_demand
}

/// A periodic server realizing a BDR interface: budget `Q` replenished
/// every period `P`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyTask {
    pub budget: Duration,
    pub period: Duration,
}

/// Half-Half (Shin & Lee 2003): transform a BDR interface `(alpha, delta)`
/// into a periodic server `(Q, P)` that realizes it.
///
/// `P = 2*delta`, `Q = alpha*P`. When `delta = 0` the interface has no
/// replenishment period to speak of — the component is dedicated, supplied
/// continuously — modeled here as a degenerate server whose budget equals
/// its (arbitrary, non-zero) period, per spec §4.A.
#[must_use]
pub fn half_half(alpha: f64, delta: Duration) -> SupplyTask {
    if delta.is_zero() {
        let period = Duration::new(1.0);
        SupplyTask { budget: period, period }
    } else {
        let period = delta * 2.0;
        let budget = period * alpha;
        SupplyTask { budget, period }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn dt(wcet: f64, deadline: f64, period: f64) -> DemandTask {
        DemandTask { wcet: Duration::new(wcet), deadline: Duration::new(deadline), period: Duration::new(period), priority: 0 }
    }

    #[test]
    fn sbf_is_zero_before_delta() {
        assert_eq!(sbf_bdr(0.5, Duration::new(10.0), Duration::new(5.0)), Duration::ZERO);
        assert_eq!(sbf_bdr(0.5, Duration::new(10.0), Duration::new(10.0)), Duration::ZERO);
    }

    #[test]
    fn sbf_is_linear_after_delta() {
        let s = sbf_bdr(0.5, Duration::new(10.0), Duration::new(30.0));
        assert_approx_eq!(s.as_f64(), 10.0);
    }

    #[test]
    fn sbf_monotone_in_t_and_alpha() {
        let delta = Duration::new(4.0);
        let earlier = sbf_bdr(0.4, delta, Duration::new(10.0));
        let later = sbf_bdr(0.4, delta, Duration::new(20.0));
        assert!(later.0 >= earlier.0);

        let low_alpha = sbf_bdr(0.2, delta, Duration::new(20.0));
        let high_alpha = sbf_bdr(0.6, delta, Duration::new(20.0));
        assert!(high_alpha.0 >= low_alpha.0);
    }

    #[test]
    fn dbf_edf_zero_at_origin() {
        let tasks = vec![dt(2.0, 5.0, 5.0), dt(2.0, 10.0, 10.0)];
        assert_eq!(dbf_edf(&tasks, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn dbf_edf_matches_hand_worked_example() {
        // tau1(wcet=2, D=5, T=5), tau2(wcet=2, D=10, T=10); at t=10 both tasks
        // have contributed two and one jobs respectively: 2*2 + 1*2 = 6.
        let tasks = vec![dt(2.0, 5.0, 5.0), dt(2.0, 10.0, 10.0)];
        assert_eq!(dbf_edf(&tasks, Duration::new(10.0)), Duration::new(6.0));
    }

    #[test]
    fn dbf_edf_nondecreasing() {
        let tasks = vec![dt(2.0, 5.0, 5.0), dt(3.0, 7.0, 10.0)];
        let mut prev = Duration::ZERO;
        let mut t = 0.0;
        while t <= 100.0 {
            let d = dbf_edf(&tasks, Duration::new(t));
            assert!(d.0 + crate::time::EPS >= prev.0);
            prev = d;
            t += 0.5;
        }
    }

    #[test]
    fn dbf_fps_includes_only_higher_priority_interference() {
        // tau1(wcet=3,T=10) highest priority, tau2(wcet=6,T=15) lower.
        let tasks = vec![dt(3.0, 10.0, 10.0), dt(6.0, 15.0, 15.0)];
        // response demand for the highest-priority task never includes tau2.
        assert_eq!(dbf_fps(&tasks, Duration::new(3.0), 0), Duration::new(3.0));
        // demand for tau2 at t=3 includes one release of tau1.
        assert_eq!(dbf_fps(&tasks, Duration::new(3.0), 1), Duration::new(9.0));
    }

    #[test]
    fn half_half_round_trip_recovers_alpha() {
        let server = half_half(0.4, Duration::new(50.0));
        assert_eq!(server.period, Duration::new(100.0));
        assert_approx_eq!(server.budget.as_f64(), 40.0);
        assert_approx_eq!(server.budget / server.period, 0.4);
    }

    #[test]
    fn half_half_degenerate_delta_zero_is_always_supplied() {
        let server = half_half(1.0, Duration::ZERO);
        assert_eq!(server.budget, server.period);
    }
}
