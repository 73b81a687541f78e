//! Model validation — spec §7 policy: `InvalidModel`, `UnboundComponent`
//! and `DuplicateId` are fatal and must be returned before any computation
//! is attempted. Ingestion only checks for the presence of `cores[]` and
//! `rootComponents[]`; everything else is the synthesizer's responsibility,
//! so this runs as the first step of [`crate::synth::synthesize`].

use std::collections::HashSet;

use crate::error::ModelError;
use crate::model::{Component, SystemModel, TaskKind};

pub fn validate(model: &SystemModel) -> Result<(), ModelError> {
    let mut core_ids = HashSet::new();
    for core in &model.cores {
        if !core_ids.insert(core.id.clone()) {
            return Err(ModelError::DuplicateId { kind: "core", id: core.id.to_string() });
        }
        if core.performance_factor <= 0.0 {
            return Err(ModelError::InvalidModel {
                reason: format!("core {} has non-positive performance factor {}", core.id, core.performance_factor),
            });
        }
    }

    let mut used_cores = HashSet::new();
    let mut component_ids = HashSet::new();
    let mut task_ids = HashSet::new();

    for root in &model.roots {
        if !core_ids.contains(&root.core_id) {
            return Err(ModelError::UnknownCore(root.core_id.clone()));
        }
        if !used_cores.insert(root.core_id.clone()) {
            return Err(ModelError::InvalidModel {
                reason: format!("core {} hosts more than one root component", root.core_id),
            });
        }
        validate_component(&root.component, &mut component_ids, &mut task_ids)?;
    }

    // every declared core may host zero or one root component; that's
    // already guaranteed by `used_cores` above. Every root must be bound —
    // by construction of `RootBinding` a root always carries a `core_id`,
    // so `UnboundComponent` can only arise during ingestion (§6), where a
    // component's id fails to match the `core-<id>` binding convention.

    Ok(())
}

fn validate_component(
    component: &Component,
    component_ids: &mut HashSet<crate::model::ComponentId>,
    task_ids: &mut HashSet<crate::model::TaskId>,
) -> Result<(), ModelError> {
    if !component_ids.insert(component.id.clone()) {
        return Err(ModelError::DuplicateId { kind: "component", id: component.id.to_string() });
    }

    if let Some(alpha) = component.alpha {
        if !(alpha > 0.0 && alpha <= 1.0 + crate::time::EPS) {
            return Err(ModelError::InvalidModel {
                reason: format!("component {} has alpha {} outside (0, 1]", component.id, alpha),
            });
        }
    }
    if let Some(delta) = component.delta {
        if delta.0 < -crate::time::EPS {
            return Err(ModelError::InvalidModel {
                reason: format!("component {} has negative delta {}", component.id, delta),
            });
        }
    }

    for task in &component.tasks {
        if !task_ids.insert(task.id.clone()) {
            return Err(ModelError::DuplicateId { kind: "task", id: task.id.to_string() });
        }
        validate_task(task)?;
    }

    for child in &component.child_components {
        validate_component(child, component_ids, task_ids)?;
    }

    Ok(())
}

fn validate_task(task: &crate::model::Task) -> Result<(), ModelError> {
    if task.wcet.0 <= 0.0 {
        return Err(ModelError::InvalidModel {
            reason: format!("task {} has non-positive wcet {}", task.id, task.wcet),
        });
    }
    if task.deadline.0 <= 0.0 {
        return Err(ModelError::InvalidModel {
            reason: format!("task {} has non-positive deadline {}", task.id, task.deadline),
        });
    }
    if let Some(bcet) = task.bcet {
        if bcet.0 < 0.0 {
            return Err(ModelError::InvalidModel {
                reason: format!("task {} has negative bcet {}", task.id, bcet),
            });
        }
        if bcet.0 > task.wcet.0 + crate::time::EPS {
            return Err(ModelError::InvalidModel {
                reason: format!("task {} has bcet greater than wcet", task.id),
            });
        }
    }
    match task.kind {
        TaskKind::Periodic { period } if period.0 <= 0.0 => {
            return Err(ModelError::InvalidModel {
                reason: format!("task {} has non-positive period {}", task.id, period),
            });
        }
        TaskKind::Sporadic { minimum_inter_arrival_time } if minimum_inter_arrival_time.0 <= 0.0 => {
            return Err(ModelError::InvalidModel {
                reason: format!("task {} has non-positive minimum inter-arrival time", task.id),
            });
        }
        _ => {}
    }

    if !task.has_constrained_deadline() {
        log::warn!(
            "task {} does not have a constrained deadline (wcet <= deadline <= period); the synthesizer does not assume this silently",
            task.id
        );
    }

    Ok(())
}
