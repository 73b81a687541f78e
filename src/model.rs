//! The data model: cores, tasks, components and the system tree.
//!
//! Mirrors the JSON schema in spec §6. Every entity carries a stable id
//! (newtype-wrapped, so an id can never be accidentally compared against a
//! display name) and the synthesizer writes `alpha`/`delta` back onto
//! non-root components as the one mutation the model ever undergoes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::time::Duration;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Arc<str>);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(Arc::from(value))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(Arc::from(value.as_str()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CoreId);
id_newtype!(ComponentId);
id_newtype!(TaskId);

/// A processing unit. Execution times are scaled by `1 / performance_factor`
/// before any demand computation (spec §4.B) — it is the only place
/// performance enters analysis.
#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Core {
    pub id: CoreId,
    pub name: String,
    pub performance_factor: f64,
}

impl Core {
    /// Reference WCET `c` executes in wall-clock time `c / performance_factor`.
    pub fn scale(&self, reference: Duration) -> Duration {
        reference / self.performance_factor
    }
}

/// The arrival pattern of a task: periodic tasks arrive at fixed multiples
/// of their period; sporadic tasks are separated by at least their minimum
/// inter-arrival time. For analysis both are treated identically (a
/// sporadic task's MIT is its worst-case period); only simulation arrival
/// generation differs, per spec §3/§9's explicit redesign note asking for a
/// shared `next_arrival`/`period_or_mit` accessor on a tagged variant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaskKind {
    Periodic { period: Duration },
    Sporadic {
        #[serde(rename = "minimumInterArrivalTime")]
        minimum_inter_arrival_time: Duration,
    },
}

impl TaskKind {
    /// The value used in demand/supply analysis in place of a period: the
    /// task's period, or its MIT treated as a worst-case period.
    pub fn period_or_mit(&self) -> Duration {
        match self {
            TaskKind::Periodic { period } => *period,
            TaskKind::Sporadic { minimum_inter_arrival_time } => *minimum_inter_arrival_time,
        }
    }

    /// The next arrival strictly after `prev_arrival`, for simulation.
    pub fn next_arrival(&self, prev_arrival: Duration) -> Duration {
        prev_arrival + self.period_or_mit()
    }
}

/// A periodic or sporadic real-time task.
#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(flatten)]
    pub kind: TaskKind,
    #[serde(default)]
    pub bcet: Option<Duration>,
    pub wcet: Duration,
    pub deadline: Duration,
    pub priority: Option<i64>,
}

impl Task {
    /// Scaled utilization `wcet / (period_or_mit * performance_factor)`.
    pub fn utilization(&self, performance_factor: f64) -> f64 {
        let scaled_wcet = self.wcet.as_f64() / performance_factor;
        scaled_wcet / self.kind.period_or_mit().as_f64()
    }

    pub fn scaled_wcet(&self, performance_factor: f64) -> Duration {
        Duration::new(self.wcet.as_f64() / performance_factor)
    }

    /// `true` for well-formed, constrained-deadline tasks: `wcet <= deadline
    /// <= period_or_mit`, per spec §3's invariants. The synthesizer must not
    /// silently assume this holds; callers should check it explicitly
    /// (see [`crate::error::ModelError::InvalidModel`]).
    pub fn has_constrained_deadline(&self) -> bool {
        self.wcet.0 <= self.deadline.0 + crate::time::EPS
            && self.deadline.0 <= self.kind.period_or_mit().0 + crate::time::EPS
    }
}

/// Scheduling discipline of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum SchedulingAlgorithm {
    #[serde(rename = "EDF")]
    Edf,
    #[serde(rename = "FPS")]
    Fps,
}

/// A BDR interface `(alpha, delta)`. The root of every subtree is fixed at
/// `(1, 0)` — its core is dedicated to it — non-root interfaces are written
/// by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Interface {
    pub alpha: f64,
    pub delta: Duration,
}

impl Interface {
    pub const ROOT: Interface = Interface { alpha: 1.0, delta: Duration::ZERO };
}

/// A scheduling component: a scheduler instance owning a set of tasks and,
/// optionally, child components scheduled beneath it. A task belongs to
/// exactly one component; a component has exactly one parent except for
/// root components, which are bound to a core.
#[derive(Debug, Clone)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    #[serde(rename = "schedulingAlgorithm")]
    pub scheduling_algorithm: SchedulingAlgorithm,
    pub alpha: Option<f64>,
    pub delta: Option<Duration>,
    pub tasks: Vec<Task>,
    #[serde(rename = "childComponents", default)]
    pub child_components: Vec<Component>,
}

impl Component {
    /// The component's BDR interface, if it has already been synthesized
    /// (or was supplied pre-annotated in the input). `None` for a non-root
    /// component awaiting synthesis.
    pub fn interface(&self) -> Option<Interface> {
        match (self.alpha, self.delta) {
            (Some(alpha), Some(delta)) => Some(Interface { alpha, delta }),
            _ => None,
        }
    }

    pub fn set_interface(&mut self, interface: Interface) {
        self.alpha = Some(interface.alpha);
        self.delta = Some(interface.delta);
    }

    /// Visits every component in this subtree, including `self`.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Component)) {
        visit(self);
        for child in &self.child_components {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Component)) {
        for child in &mut self.child_components {
            child.walk_mut(visit);
        }
        visit(self);
    }
}

/// A binding of a root component to the core it is dedicated to.
#[derive(Debug, Clone)]
pub struct RootBinding {
    pub core_id: CoreId,
    pub component: Component,
}

/// The validated, ingested system: a set of cores and a set of root
/// components, each bound to exactly one core.
#[derive(Debug, Clone)]
pub struct SystemModel {
    pub cores: Vec<Core>,
    pub roots: Vec<RootBinding>,
}

impl SystemModel {
    pub fn core(&self, id: &CoreId) -> Option<&Core> {
        self.cores.iter().find(|c| &c.id == id)
    }

    pub fn core_by_id_str(&self, id: &str) -> Option<&Core> {
        self.cores.iter().find(|c| c.id.as_str() == id)
    }

    pub fn cores_by_id(&self) -> HashMap<&str, &Core> {
        self.cores.iter().map(|c| (c.id.as_str(), c)).collect()
    }
}
