//! Discrete-event simulation of a synthesized [`crate::model::SystemModel`] — spec §4.D/§5.

mod engine;
mod event;

pub use engine::{simulate, simulate_with_logs};
