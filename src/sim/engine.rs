//! Event-Driven Simulator — spec §4.D.
//!
//! One call to [`simulate`] runs every root subtree of a [`SystemModel`]
//! independently (each root owns its core — "a multi-core system runs one
//! simulator instance per root", spec §4.D) and merges the per-root results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use crate::kernel::half_half;
use crate::model::{Component, ComponentId, Core, SchedulingAlgorithm, SystemModel, TaskId, TaskKind};
use crate::output::{ComponentUtilization, ExecutionLogRecord, SimulationResults, TaskResponseTime};
use crate::sim::event::{Event, EventQueue};
use crate::time::Duration;

/// A single task instance's runtime state.
struct Job {
    task: TaskId,
    component: ComponentId,
    instance: u64,
    arrival: Duration,
    deadline: Duration,
    remaining: Duration,
    priority: i64,
    run_token: u64,
    completed: bool,
    missed: bool,
    slices: Vec<(Duration, Duration)>,
}

/// Static per-task info copied out of the model for quick lookup during simulation.
#[derive(Clone)]
struct TaskInfo {
    component: ComponentId,
    kind: TaskKind,
    wcet_scaled: Duration,
    deadline: Duration,
    priority: i64,
}

/// A node of the component tree, flattened enough for recursive dispatch.
struct SimNode {
    id: ComponentId,
    algorithm: SchedulingAlgorithm,
    is_root: bool,
    children: Vec<SimNode>,
}

fn build_tree(component: &Component, is_root: bool) -> SimNode {
    SimNode {
        id: component.id.clone(),
        algorithm: component.scheduling_algorithm,
        is_root,
        children: component.child_components.iter().map(|c| build_tree(c, false)).collect(),
    }
}

fn collect_task_info(component: &Component, performance_factor: f64, out: &mut HashMap<TaskId, TaskInfo>) {
    for task in &component.tasks {
        out.insert(
            task.id.clone(),
            TaskInfo {
                component: component.id.clone(),
                kind: task.kind,
                wcet_scaled: task.scaled_wcet(performance_factor),
                deadline: task.deadline,
                priority: task.priority.unwrap_or(i64::MAX),
            },
        );
    }
    for child in &component.child_components {
        collect_task_info(child, performance_factor, out);
    }
}

fn collect_component_ids(node: &SimNode, out: &mut Vec<ComponentId>) {
    if !node.is_root {
        out.push(node.id.clone());
    }
    for child in &node.children {
        collect_component_ids(child, out);
    }
}

struct RunState {
    jobs: Vec<Job>,
    ready: HashMap<ComponentId, Vec<usize>>,
    available: HashMap<ComponentId, bool>,
    active: Option<usize>,
    active_since: Duration,
    executed_time: HashMap<ComponentId, Duration>,
    response_times: HashMap<TaskId, Vec<Duration>>,
    missed_deadlines: HashMap<TaskId, u64>,
    execution_log: Vec<ExecutionLogRecord>,
}

struct Candidate {
    job: usize,
    deadline: Duration,
    priority: i64,
    task: TaskId,
}

fn select_job(node: &SimNode, state: &RunState) -> Option<Candidate> {
    if !node.is_root && !*state.available.get(&node.id).unwrap_or(&false) {
        return None;
    }

    let mut candidates: Vec<Candidate> = Vec::new();

    if let Some(ready) = state.ready.get(&node.id) {
        for &jh in ready {
            let job = &state.jobs[jh];
            if job.completed {
                continue;
            }
            candidates.push(Candidate { job: jh, deadline: job.deadline, priority: job.priority, task: job.task.clone() });
        }
    }

    // the currently active job is not in `ready` (it was removed on
    // dispatch); it must still compete here, or a later-arriving lower-
    // priority job would always "win" by default and preempt it.
    if let Some(jh) = state.active {
        let job = &state.jobs[jh];
        if job.component == node.id && !job.completed {
            candidates.push(Candidate { job: jh, deadline: job.deadline, priority: job.priority, task: job.task.clone() });
        }
    }

    for child in &node.children {
        if let Some(c) = select_job(child, state) {
            candidates.push(c);
        }
    }

    match node.algorithm {
        SchedulingAlgorithm::Edf => candidates.into_iter().min_by(|a, b| {
            a.deadline.0.partial_cmp(&b.deadline.0).unwrap().then_with(|| a.task.as_str().cmp(b.task.as_str()))
        }),
        SchedulingAlgorithm::Fps => candidates
            .into_iter()
            .min_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.task.as_str().cmp(b.task.as_str()))),
    }
}

impl RunState {
    fn charge_active(&mut self, t: Duration) {
        if let Some(jh) = self.active {
            let elapsed = t - self.active_since;
            let job = &mut self.jobs[jh];
            job.remaining = (job.remaining - elapsed).max(Duration::ZERO);
            job.slices.push((self.active_since, t));
            *self.executed_time.entry(job.component.clone()).or_insert(Duration::ZERO) += elapsed;
        }
    }

    fn preempt_active(&mut self, t: Duration) {
        self.charge_active(t);
        if let Some(jh) = self.active.take() {
            // invalidate the `Completion` event dispatch scheduled for this
            // run: the job is going back to `ready` with time left, so that
            // event must not fire.
            self.jobs[jh].run_token += 1;
            self.ready.entry(self.jobs[jh].component.clone()).or_default().push(jh);
        }
    }

    fn dispatch(&mut self, jh: usize, t: Duration, queue: &mut EventQueue) {
        self.jobs[jh].run_token += 1;
        self.active = Some(jh);
        self.active_since = t;
        let remaining = self.jobs[jh].remaining;
        queue.push(t + remaining, Event::Completion { job: jh, run_token: self.jobs[jh].run_token });
    }

    fn reschedule(&mut self, tree: &SimNode, t: Duration, queue: &mut EventQueue) {
        let best = select_job(tree, self);

        if let (Some(cur), Some(ref candidate)) = (self.active, &best) {
            if cur == candidate.job {
                return;
            }
        }

        self.preempt_active(t);

        if let Some(candidate) = best {
            // the winning job is either already in `ready` (own-task
            // candidate) or was never inserted (can't happen: every job is
            // pushed to `ready` on arrival and only removed here).
            if let Some(bucket) = self.ready.get_mut(&self.jobs[candidate.job].component) {
                bucket.retain(|&j| j != candidate.job);
            }
            self.dispatch(candidate.job, t, queue);
        }
    }
}

/// Run the simulator over `[0, horizon]` for every root subtree of `model`,
/// merging their results. `cancel`, if set, is checked between events for
/// cooperative cancellation (spec §5) — on cancellation, `truncated = true`
/// and `last_time` records the last processed event time.
pub fn simulate(model: &SystemModel, horizon: Duration, cancel: Option<&AtomicBool>) -> SimulationResults {
    simulate_with_logs(model, horizon, cancel, true)
}

/// Like [`simulate`], but lets callers skip building the (potentially
/// large) execution log when only the aggregate statistics are needed.
pub fn simulate_with_logs(
    model: &SystemModel,
    horizon: Duration,
    cancel: Option<&AtomicBool>,
    record_log: bool,
) -> SimulationResults {
    let mut task_response_times: HashMap<TaskId, Vec<Duration>> = HashMap::new();
    let mut missed_deadlines: HashMap<TaskId, u64> = HashMap::new();
    let mut component_utilizations: Vec<ComponentUtilization> = Vec::new();
    let mut execution_log: Vec<ExecutionLogRecord> = Vec::new();
    let mut truncated = false;
    let mut last_time = Duration::ZERO;

    for root in &model.roots {
        let core = model
            .core(&root.core_id)
            .expect("validated model guarantees every root's core exists")
            .clone();

        let root_result = simulate_root(&root.component, &core, horizon, cancel, record_log);

        for (task, times) in root_result.response_times {
            task_response_times.entry(task).or_default().extend(times);
        }
        for (task, count) in root_result.missed_deadlines {
            *missed_deadlines.entry(task).or_insert(0) += count;
        }
        for (component, executed) in root_result.executed_time {
            let allocated = root_result.allocated_utilization.get(&component).copied().unwrap_or(1.0);
            component_utilizations.push(ComponentUtilization {
                component_id: component,
                utilization: executed / horizon,
                allocated_utilization: allocated,
            });
        }
        execution_log.extend(root_result.execution_log);
        truncated |= root_result.truncated;
        last_time = last_time.max(root_result.last_time);
    }

    SimulationResults {
        task_response_times: task_response_times
            .into_iter()
            .map(|(task_id, times)| {
                let sum: Duration = times.iter().copied().sum();
                let avg = if times.is_empty() { Duration::ZERO } else { sum / times.len() as f64 };
                let max = times.iter().copied().fold(Duration::ZERO, Duration::max);
                let missed = *missed_deadlines.get(&task_id).unwrap_or(&0);
                TaskResponseTime { task_id, avg, max, missed_deadlines: missed }
            })
            .collect(),
        component_utilizations,
        simulation_time: horizon,
        timestamp: crate::clock::timestamp(),
        execution_logs: if record_log { Some(execution_log) } else { None },
        truncated,
        last_time,
    }
}

struct RootResult {
    response_times: HashMap<TaskId, Vec<Duration>>,
    missed_deadlines: HashMap<TaskId, u64>,
    executed_time: HashMap<ComponentId, Duration>,
    allocated_utilization: HashMap<ComponentId, f64>,
    execution_log: Vec<ExecutionLogRecord>,
    truncated: bool,
    last_time: Duration,
}

fn simulate_root(
    root: &Component,
    core: &Core,
    horizon: Duration,
    cancel: Option<&AtomicBool>,
    record_log: bool,
) -> RootResult {
    let tree = build_tree(root, true);
    let mut task_info = HashMap::new();
    collect_task_info(root, core.performance_factor, &mut task_info);

    let mut non_root_components = Vec::new();
    collect_component_ids(&tree, &mut non_root_components);

    let mut allocated_utilization = HashMap::new();
    let mut queue = EventQueue::new();

    let mut available = HashMap::new();
    for id in &non_root_components {
        available.insert(id.clone(), false);
    }

    root.walk(&mut |component| {
        if let Some(interface) = component.interface() {
            allocated_utilization.insert(component.id.clone(), interface.alpha);
            if component.id != root.id {
                let server = half_half(interface.alpha.min(1.0), interface.delta);
                let mut k = 0.0_f64;
                loop {
                    let start = server.period * k;
                    if start.0 > horizon.0 {
                        break;
                    }
                    let end = start + server.budget;
                    queue.push(start, Event::SupplyStart { component: component.id.clone() });
                    queue.push(end, Event::SupplyEnd { component: component.id.clone() });
                    k += 1.0;
                }
            }
        }
    });

    let mut state = RunState {
        jobs: Vec::new(),
        ready: HashMap::new(),
        available,
        active: None,
        active_since: Duration::ZERO,
        executed_time: HashMap::new(),
        response_times: HashMap::new(),
        missed_deadlines: HashMap::new(),
        execution_log: Vec::new(),
    };

    let mut instance_seq: HashMap<TaskId, u64> = HashMap::new();

    // `task_info` is a HashMap; push the t=0 arrivals in a stable order so
    // the insertion-order tiebreak in `EventQueue` doesn't vary between
    // runs of the same model (spec §8 property 8: byte-identical logs).
    let mut initial_task_ids: Vec<&TaskId> = task_info.keys().collect();
    initial_task_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    for task_id in initial_task_ids {
        let info = &task_info[task_id];
        queue.push(Duration::ZERO, Event::Arrival { task: task_id.clone(), component: info.component.clone() });
    }

    let mut last_time = Duration::ZERO;
    let mut truncated = false;

    while let Some(t) = queue.peek_time() {
        if t.0 > horizon.0 {
            break;
        }
        if let Some(flag) = cancel {
            if flag.load(AtomicOrdering::Relaxed) {
                truncated = true;
                break;
            }
        }

        let (t, event) = queue.pop().unwrap();
        last_time = t;

        match event {
            Event::Arrival { task, component } => {
                let info = &task_info[&task];
                let instance = *instance_seq.entry(task.clone()).or_insert(0);
                instance_seq.insert(task.clone(), instance + 1);

                let job = Job {
                    task: task.clone(),
                    component: component.clone(),
                    instance,
                    arrival: t,
                    deadline: t + info.deadline,
                    remaining: info.wcet_scaled,
                    priority: info.priority,
                    run_token: 0,
                    completed: false,
                    missed: false,
                    slices: Vec::new(),
                };
                let jh = state.jobs.len();
                state.jobs.push(job);
                state.ready.entry(component.clone()).or_default().push(jh);

                queue.push(t + info.deadline, Event::Deadline { task: task.clone(), instance });

                let next_arrival = info.kind.next_arrival(t);
                if next_arrival.0 <= horizon.0 {
                    queue.push(next_arrival, Event::Arrival { task, component });
                }

                state.reschedule(&tree, t, &mut queue);
            }
            Event::Deadline { task, instance } => {
                let still_pending = state.active.map(|jh| state.jobs[jh].task == task && state.jobs[jh].instance == instance).unwrap_or(false)
                    || state.jobs.iter().any(|j| j.task == task && j.instance == instance && !j.completed);

                if still_pending {
                    if let Some(job) = state.jobs.iter_mut().find(|j| j.task == task && j.instance == instance) {
                        if !job.completed && !job.missed {
                            job.missed = true;
                            *state.missed_deadlines.entry(task.clone()).or_insert(0) += 1;
                        }
                    }
                }
            }
            Event::Completion { job, run_token } => {
                if state.jobs[job].run_token != run_token || state.jobs[job].completed {
                    continue;
                }
                state.charge_active(t);
                state.jobs[job].completed = true;
                let response = t - state.jobs[job].arrival;
                state.response_times.entry(state.jobs[job].task.clone()).or_default().push(response);
                if record_log {
                    for &(start, end) in &state.jobs[job].slices {
                        state.execution_log.push(ExecutionLogRecord {
                            task_id: state.jobs[job].task.clone(),
                            component_id: state.jobs[job].component.clone(),
                            instance_id: state.jobs[job].instance,
                            arrival_time: state.jobs[job].arrival,
                            start_time: start,
                            end_time: end,
                            deadline: state.jobs[job].deadline,
                            missed_deadline: state.jobs[job].missed,
                        });
                    }
                }
                state.active = None;
                state.reschedule(&tree, t, &mut queue);
            }
            Event::SupplyStart { component } => {
                state.available.insert(component, true);
                state.reschedule(&tree, t, &mut queue);
            }
            Event::SupplyEnd { component } => {
                state.available.insert(component.clone(), false);
                let active_belongs = state.active.map(|jh| state.jobs[jh].component == component).unwrap_or(false);
                if active_belongs {
                    state.preempt_active(t);
                }
                state.reschedule(&tree, t, &mut queue);
            }
        }
    }

    RootResult {
        response_times: state.response_times,
        missed_deadlines: state.missed_deadlines,
        executed_time: state.executed_time,
        allocated_utilization,
        execution_log: state.execution_log,
        truncated,
        last_time,
    }
}
