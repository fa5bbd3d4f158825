//! Life Restart: a configuration-driven life simulation engine.
//!
//! Simulates one artificial life year by year from a declarative rule set:
//! talents shape the starting state, weighted event pools drive each year,
//! achievements unlock on conditions, and a judged summary scores the result.

pub mod core;
pub mod schema;

pub use crate::core::engine::{SimulationRequest, Simulator};
pub use crate::core::error::{EngineError, EntityKind};
pub use crate::core::session::GameSession;
#[cfg(feature = "async")]
pub use crate::core::store::simulate_async;
pub use crate::core::store::{init_config, init_config_json, is_config_initialized, simulate};
pub use crate::schema::config::{GameConfig, Settings};
