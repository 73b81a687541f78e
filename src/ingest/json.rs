//! JSON model ingestion — spec §6's authoritative schema.
//!
//! `Core`/`Component`/`Task` already derive `Deserialize` with the right
//! `serde` renames (see `crate::model`); the only thing this module adds is
//! the flat `{cores, rootComponents}` envelope and the `core-<coreId>` id
//! prefix convention that binds a root component to its core.

use serde::Deserialize;

use crate::error::ModelError;
use crate::model::{Component, Core, CoreId, RootBinding, SystemModel};

#[derive(Deserialize)]
struct RawModel {
    cores: Vec<Core>,
    #[serde(rename = "rootComponents")]
    root_components: Vec<Component>,
}

/// Parse a JSON model per spec §6. Only checks presence of `cores[]` and
/// `rootComponents[]` and resolves root-core bindings; every other
/// constraint (alpha range, positive wcet, ...) is left to
/// [`crate::validate::validate`], which the synthesizer runs first.
pub fn parse(text: &str) -> Result<SystemModel, ModelError> {
    let raw: RawModel =
        serde_json::from_str(text).map_err(|e| ModelError::InvalidModel { reason: format!("malformed JSON model: {e}") })?;

    let mut roots = Vec::with_capacity(raw.root_components.len());
    for component in raw.root_components {
        let core_id = bind_core(&component)?;
        roots.push(RootBinding { core_id, component });
    }

    Ok(SystemModel { cores: raw.cores, roots })
}

/// Extracts the core id from a root component's `core-<coreId>...` id.
fn bind_core(component: &Component) -> Result<CoreId, ModelError> {
    component
        .id
        .as_str()
        .strip_prefix("core-")
        .map(|rest| CoreId::from(rest.split('-').next().unwrap_or(rest)))
        .ok_or_else(|| ModelError::UnboundComponent { component: component.id.clone() })
}
