//! Hierarchical BDR schedulability analysis and discrete-event simulation
//! for ADAS task sets on a heterogeneous multicore platform.
//!
//! Four cooperating pieces (spec §2): the Demand/Supply Kernel
//! ([`kernel`]), the Feasibility Tester ([`feasibility`]), the Interface
//! Synthesizer ([`synth`]), and the Event-Driven Simulator ([`sim`]).
//! [`ingest`] and [`output`] carry the JSON/CSV model formats and the
//! serializable result records in and out of the core.

pub mod clock;
pub mod error;
pub mod feasibility;
pub mod ingest;
pub mod kernel;
pub mod model;
pub mod output;
pub mod sim;
pub mod synth;
pub mod time;
pub mod validate;

/// Common imports for callers driving the core end-to-end.
pub mod prelude {
    pub use crate::error::{AnalysisError, ModelError, SimulationCancelled};
    pub use crate::model::{
        Component, ComponentId, Core, CoreId, Interface, RootBinding, SchedulingAlgorithm, SystemModel, Task, TaskId, TaskKind,
    };
    pub use crate::output::{AnalysisResults, SimulationResults};
    pub use crate::sim::simulate;
    pub use crate::synth::synthesize;
    pub use crate::time::Duration;
}
