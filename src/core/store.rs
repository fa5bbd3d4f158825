//! The process-wide configuration: installed once, then read lock-free by
//! every simulation.

use std::sync::OnceLock;

use crate::core::engine::{SimulationRequest, Simulator};
use crate::core::error::EngineError;
use crate::core::session::GameSession;
use crate::schema::config::GameConfig;

static SIMULATOR: OnceLock<Simulator> = OnceLock::new();

/// Install the configuration. Exactly one call per process succeeds; every
/// later call fails with `AlreadyInitialized` and changes nothing.
pub fn init_config(config: GameConfig) -> Result<(), EngineError> {
    let talents = config.talents.len();
    let events = config.events.len();
    let ages = config.ages.len();
    let achievements = config.achievements.len();
    SIMULATOR
        .set(Simulator::new(config))
        .map_err(|_| EngineError::AlreadyInitialized)?;
    tracing::info!(talents, events, ages, achievements, "configuration initialized");
    Ok(())
}

/// Parse a JSON document and install it.
pub fn init_config_json(input: &str) -> Result<(), EngineError> {
    init_config(GameConfig::from_json(input)?)
}

pub fn is_config_initialized() -> bool {
    SIMULATOR.get().is_some()
}

/// The simulator over the installed configuration.
pub fn simulator() -> Result<&'static Simulator, EngineError> {
    SIMULATOR.get().ok_or(EngineError::NotInitialized)
}

pub fn simulate(request: &SimulationRequest) -> Result<GameSession, EngineError> {
    simulator()?.simulate(request)
}

#[cfg(feature = "async")]
pub async fn simulate_async(request: SimulationRequest) -> Result<GameSession, EngineError> {
    simulator()?.simulate_async(request).await
}
