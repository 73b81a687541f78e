//! End-to-end scenarios from spec §8's literal table, plus the
//! determinism/utilization-bound/deadline-accounting invariants that need a
//! full model (rather than a single kernel function) to exercise.

use adas_bdr_sched::prelude::*;

fn core(id: &str, factor: f64) -> Core {
    Core { id: CoreId::from(id), name: id.to_string(), performance_factor: factor }
}

fn periodic(id: &str, wcet: f64, deadline: f64, period: f64, priority: Option<i64>) -> Task {
    Task {
        id: TaskId::from(id),
        name: id.to_string(),
        kind: TaskKind::Periodic { period: Duration::new(period) },
        bcet: None,
        wcet: Duration::new(wcet),
        deadline: Duration::new(deadline),
        priority,
    }
}

fn sporadic(id: &str, wcet: f64, deadline: f64, mit: f64) -> Task {
    Task {
        id: TaskId::from(id),
        name: id.to_string(),
        kind: TaskKind::Sporadic { minimum_inter_arrival_time: Duration::new(mit) },
        bcet: None,
        wcet: Duration::new(wcet),
        deadline: Duration::new(deadline),
        priority: None,
    }
}

fn edf_root(core_id: &str, tasks: Vec<Task>) -> SystemModel {
    component_root(core_id, SchedulingAlgorithm::Edf, tasks, vec![])
}

fn component_root(core_id: &str, algorithm: SchedulingAlgorithm, tasks: Vec<Task>, children: Vec<Component>) -> SystemModel {
    let comp = Component {
        id: ComponentId::from(format!("core-{core_id}-root")),
        name: "root".to_string(),
        scheduling_algorithm: algorithm,
        alpha: None,
        delta: None,
        tasks,
        child_components: children,
    };
    SystemModel {
        cores: vec![core(core_id, 1.0)],
        roots: vec![RootBinding { core_id: CoreId::from(core_id), component: comp }],
    }
}

/// Scenario 1: one core p=1, EDF root, light utilization.
#[test]
fn scenario_1_light_utilization_is_schedulable_no_misses() {
    let mut model = edf_root("c1", vec![periodic("t1", 2.0, 5.0, 5.0, None), periodic("t2", 2.0, 10.0, 10.0, None)]);

    let analysis = synthesize(&mut model).unwrap();
    assert!(analysis.is_schedulable);

    let sim = simulate(&model, Duration::new(100.0), None);
    for rt in &sim.task_response_times {
        assert_eq!(rt.missed_deadlines, 0, "task {} missed a deadline", rt.task_id);
    }
    let util = sim.component_utilizations.iter().find(|u| u.component_id.as_str().contains("root")).unwrap();
    assert!((util.utilization - 0.6).abs() < 0.05, "utilization {} not near 0.6", util.utilization);
}

/// Scenario 2: full utilization (U=1.0) is still schedulable at the root
/// (alpha fixed at 1, dedicated core).
#[test]
fn scenario_2_full_utilization_root_is_schedulable() {
    let mut model = edf_root("c1", vec![periodic("t1", 4.0, 5.0, 5.0, None), periodic("t2", 2.0, 10.0, 10.0, None)]);

    let analysis = synthesize(&mut model).unwrap();
    assert!(analysis.is_schedulable);
    assert_eq!(analysis.component_interfaces[0].alpha, 1.0);

    let sim = simulate(&model, Duration::new(100.0), None);
    for rt in &sim.task_response_times {
        assert_eq!(rt.missed_deadlines, 0);
    }
    let util = sim.component_utilizations.iter().find(|u| u.component_id.as_str().contains("root")).unwrap();
    assert!((util.utilization - 1.0).abs() < 0.02);
}

/// Scenario 3: a slower core (p=0.8) scales WCET up; utilization should
/// reflect the scaled WCET, not the reference WCET.
#[test]
fn scenario_3_performance_factor_scales_execution() {
    let mut model = edf_root("c1", vec![periodic("t1", 4.0, 10.0, 10.0, None)]);
    model.cores[0].performance_factor = 0.8;

    let analysis = synthesize(&mut model).unwrap();
    assert!(analysis.is_schedulable);

    let sim = simulate(&model, Duration::new(100.0), None);
    let rt = &sim.task_response_times[0];
    assert_eq!(rt.missed_deadlines, 0);
    let util = sim.component_utilizations.iter().find(|u| u.component_id.as_str().contains("root")).unwrap();
    // scaled wcet = 4 / 0.8 = 5, utilization = 5/10 = 0.5
    assert!((util.utilization - 0.5).abs() < 0.02);
}

/// Scenario 4: FPS root, two tasks at different priorities and
/// performance factors expressed via scaled WCET directly (the scenario's
/// "p=1"/"p=2" read as reference WCET already expressed per-task, since
/// the model scales WCET by the *core's* factor, not a per-task one).
#[test]
fn scenario_4_fps_root_meets_deadlines() {
    let t1 = periodic("tau1", 3.0, 10.0, 10.0, Some(0));
    let t2 = periodic("tau2", 6.0, 15.0, 15.0, Some(1));
    let mut model = component_root("c1", SchedulingAlgorithm::Fps, vec![t1, t2], vec![]);

    let analysis = synthesize(&mut model).unwrap();
    assert!(analysis.is_schedulable);

    let sim = simulate(&model, Duration::new(60.0), None);
    for rt in &sim.task_response_times {
        assert_eq!(rt.missed_deadlines, 0, "task {} missed a deadline", rt.task_id);
        if rt.task_id.as_str() == "tau2" {
            assert!(rt.max.as_f64() <= 15.0 + 1e-6);
        }
    }
}

/// Scenario 5: an EDF parent hosting an EDF child component whose BDR
/// interface (α=0.4, Δ=50) is taken as given (as the spec's literal table
/// states it) rather than re-derived, so the test isolates Half-Half supply
/// generation and the simulator's hierarchical dispatch from the
/// synthesizer's own (much tighter, since Σu=0.08 here) search result.
#[test]
fn scenario_5_hierarchical_child_supply_task() {
    let child_task = sporadic("tau_child", 8.0, 80.0, 100.0);
    let mut child = Component {
        id: ComponentId::from("child"),
        name: "child".to_string(),
        scheduling_algorithm: SchedulingAlgorithm::Edf,
        alpha: None,
        delta: None,
        tasks: vec![child_task],
        child_components: vec![],
    };
    child.set_interface(Interface { alpha: 0.4, delta: Duration::new(50.0) });

    let mut model = component_root("c1", SchedulingAlgorithm::Edf, vec![], vec![child]);
    model.roots[0].component.set_interface(Interface::ROOT);

    let server = adas_bdr_sched::kernel::half_half(0.4, Duration::new(50.0));
    assert_eq!(server.budget, Duration::new(40.0));
    assert_eq!(server.period, Duration::new(100.0));

    let sim = simulate(&model, Duration::new(1000.0), None);
    let rt = sim.task_response_times.iter().find(|r| r.task_id.as_str() == "tau_child").unwrap();
    assert_eq!(rt.missed_deadlines, 0);

    let child_util = sim.component_utilizations.iter().find(|u| u.component_id.as_str() == "child").unwrap();
    assert!(child_util.utilization <= 0.4 + 1e-3);
}

/// Scenario 6: an oversubscribed single EDF task under a restricted
/// (child-component) interface that the synthesizer would reject; without
/// re-synthesis (the interface is set by hand to the under-provisioned
/// value the scenario names) the raw system still produces deadline
/// misses roughly matching the oversubscription ratio.
#[test]
fn scenario_6_oversubscription_is_infeasible_at_restricted_alpha() {
    let task = periodic("t1", 8.0, 10.0, 10.0, None);
    let cid = ComponentId::from("restricted");

    let tasks: Vec<adas_bdr_sched::kernel::DemandTask> = vec![adas_bdr_sched::kernel::DemandTask {
        wcet: task.wcet,
        deadline: task.deadline,
        period: task.kind.period_or_mit(),
        priority: 0,
    }];
    let restricted_schedulable =
        adas_bdr_sched::feasibility::is_schedulable(&cid, SchedulingAlgorithm::Edf, &tasks, 0.5, Duration::new(5.0)).unwrap();
    assert!(!restricted_schedulable, "WCET=8,T=10 against alpha=0.5 must not be schedulable");

    let mut restricted = Component {
        id: cid,
        name: "restricted".to_string(),
        scheduling_algorithm: SchedulingAlgorithm::Edf,
        alpha: None,
        delta: None,
        tasks: vec![task],
        child_components: vec![],
    };
    restricted.set_interface(Interface { alpha: 0.5, delta: Duration::new(5.0) });

    // a restricted interface only throttles supply below the root, so the
    // oversubscribed task sits in a child component rather than at the root
    // (which is always permanently supplied, per spec §4.D).
    let model = component_root("c1", SchedulingAlgorithm::Edf, vec![], vec![restricted]);

    let sim = simulate(&model, Duration::new(100.0), None);
    let rt = sim.task_response_times.iter().find(|r| r.task_id.as_str() == "t1").unwrap();
    // the supply window can only ever deliver half the needed bandwidth;
    // expect misses on a significant fraction of the ~10 jobs in [0,100).
    assert!(rt.missed_deadlines >= 3, "expected multiple missed deadlines under oversubscription, got {}", rt.missed_deadlines);
}

/// Property 8: two runs over the same model/horizon produce byte-identical
/// execution logs.
#[test]
fn determinism_identical_runs_produce_identical_logs() {
    let model =
        edf_root("c1", vec![periodic("t1", 2.0, 5.0, 5.0, None), periodic("t2", 3.0, 10.0, 10.0, None)]);
    let mut m1 = model.clone();
    let mut m2 = model.clone();
    synthesize(&mut m1).unwrap();
    synthesize(&mut m2).unwrap();

    let sim1 = simulate(&m1, Duration::new(200.0), None);
    let sim2 = simulate(&m2, Duration::new(200.0), None);

    let log1 = sim1.execution_logs.unwrap();
    let log2 = sim2.execution_logs.unwrap();
    assert_eq!(log1.len(), log2.len());
    for (a, b) in log1.iter().zip(log2.iter()) {
        assert_eq!(a.task_id, b.task_id);
        assert_eq!(a.instance_id, b.instance_id);
        assert_eq!(a.start_time, b.start_time);
        assert_eq!(a.end_time, b.end_time);
    }
}

/// Property 6: missed deadlines never exceed the theoretical max number of
/// jobs released within the horizon, even for a badly under-provisioned
/// component.
#[test]
fn deadline_miss_count_never_exceeds_job_count() {
    let task = periodic("t1", 8.0, 10.0, 10.0, None);
    let mut restricted = Component {
        id: ComponentId::from("restricted"),
        name: "restricted".to_string(),
        scheduling_algorithm: SchedulingAlgorithm::Edf,
        alpha: None,
        delta: None,
        tasks: vec![task],
        child_components: vec![],
    };
    restricted.set_interface(Interface { alpha: 0.5, delta: Duration::new(5.0) });
    let model = component_root("c1", SchedulingAlgorithm::Edf, vec![], vec![restricted]);

    let horizon = Duration::new(97.0);
    let sim = simulate(&model, horizon, None);
    let rt = sim.task_response_times.iter().find(|r| r.task_id.as_str() == "t1").unwrap();
    let max_jobs = (97.0_f64 / 10.0).ceil() as u64;
    assert!(rt.missed_deadlines <= max_jobs);
}

/// Property 7: utilization never exceeds the component's allocated alpha
/// by more than a small horizon-dependent tolerance.
#[test]
fn utilization_stays_within_allocated_alpha() {
    let mut model = edf_root("c1", vec![periodic("t1", 2.0, 5.0, 5.0, None), periodic("t2", 2.0, 10.0, 10.0, None)]);
    synthesize(&mut model).unwrap();
    let horizon = Duration::new(500.0);
    let sim = simulate(&model, horizon, None);
    for u in &sim.component_utilizations {
        assert!(u.utilization <= u.allocated_utilization + 1.0 / horizon.as_f64() + 1e-6);
    }
}
