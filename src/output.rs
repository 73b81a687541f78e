//! Output record types — spec §6.
//!
//! `AnalysisResults` is produced by the synthesizer, `SimulationResults` by
//! the simulator. Both derive `Serialize` so a host CLI or service can emit
//! them as JSON, the way `eva-engine-cli` prints a schedulability verdict
//! per analysis but generalized here to a structured report rather than a
//! bare pass/fail line.

use crate::model::{ComponentId, TaskId};
use crate::time::Duration;

/// One non-root component's synthesized BDR interface, plus the periodic
/// server budget/period it realizes (absent only if synthesis never ran,
/// e.g. a component excluded by an earlier fatal validation error).
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct ComponentInterface {
    #[serde(rename = "componentId")]
    pub component_id: ComponentId,
    pub alpha: f64,
    pub delta: Duration,
    #[serde(rename = "supplyBudget", skip_serializing_if = "Option::is_none")]
    pub supply_budget: Option<Duration>,
    #[serde(rename = "supplyPeriod", skip_serializing_if = "Option::is_none")]
    pub supply_period: Option<Duration>,
    /// Not part of the wire schema in spec §6, but useful to the CLI and
    /// tests: whether this specific component's synthesis succeeded.
    #[serde(skip)]
    pub schedulable: bool,
}

/// Result of running the Interface Synthesizer over a [`crate::model::SystemModel`].
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct AnalysisResults {
    #[serde(rename = "isSchedulable")]
    pub is_schedulable: bool,
    #[serde(rename = "componentInterfaces")]
    pub component_interfaces: Vec<ComponentInterface>,
    pub timestamp: String,
}

/// Average/maximum observed response time and missed-deadline count for one task.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct TaskResponseTime {
    #[serde(rename = "taskId")]
    pub task_id: TaskId,
    pub avg: Duration,
    pub max: Duration,
    #[serde(rename = "missedDeadlines")]
    pub missed_deadlines: u64,
}

/// Observed vs. allocated utilization for one component over the simulated horizon.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct ComponentUtilization {
    #[serde(rename = "componentId")]
    pub component_id: ComponentId,
    pub utilization: f64,
    #[serde(rename = "allocatedUtilization")]
    pub allocated_utilization: f64,
}

/// One contiguous execution slice of a job. A preempted job emits multiple
/// records; `start_time`/`end_time` bound the slice, not the job's full
/// lifetime.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct ExecutionLogRecord {
    #[serde(rename = "taskId")]
    pub task_id: TaskId,
    #[serde(rename = "componentId")]
    pub component_id: ComponentId,
    #[serde(rename = "instanceId")]
    pub instance_id: u64,
    #[serde(rename = "arrivalTime")]
    pub arrival_time: Duration,
    #[serde(rename = "startTime")]
    pub start_time: Duration,
    #[serde(rename = "endTime")]
    pub end_time: Duration,
    pub deadline: Duration,
    #[serde(rename = "missedDeadline")]
    pub missed_deadline: bool,
}

/// Result of running the Event-Driven Simulator over `[0, T]`.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct SimulationResults {
    #[serde(rename = "taskResponseTimes")]
    pub task_response_times: Vec<TaskResponseTime>,
    #[serde(rename = "componentUtilizations")]
    pub component_utilizations: Vec<ComponentUtilization>,
    #[serde(rename = "simulationTime")]
    pub simulation_time: Duration,
    pub timestamp: String,
    #[serde(rename = "executionLogs", skip_serializing_if = "Option::is_none")]
    pub execution_logs: Option<Vec<ExecutionLogRecord>>,
    /// `true` if a cooperative cancellation request cut the run short
    /// (spec §5/§7 `SimulationCancelled`); `last_time` is the last
    /// processed event time in that case.
    pub truncated: bool,
    #[serde(rename = "lastTime")]
    pub last_time: Duration,
}
