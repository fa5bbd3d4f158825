//! WASM bindings for life-restart. Everything crossing the boundary is JSON.

use wasm_bindgen::prelude::*;

use life_restart::core::lint::lint_config;
use life_restart::{GameConfig, GameSession, SimulationRequest};

fn js_err(context: &str, e: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {e}"))
}

fn parse_request(request_json: &str) -> Result<SimulationRequest, JsError> {
    serde_json::from_str(request_json).map_err(|e| js_err("Invalid request JSON", e))
}

/// Install the process-wide configuration from a JSON document. Fails if a
/// configuration is already installed.
#[wasm_bindgen]
pub fn init_config(config_json: &str) -> Result<(), JsError> {
    life_restart::init_config_json(config_json).map_err(|e| js_err("Config error", e))
}

#[wasm_bindgen]
pub fn is_config_initialized() -> bool {
    life_restart::is_config_initialized()
}

/// Run one life and return the full result as JSON.
///
/// Expected JSON shape:
/// ```json
/// {
///   "talents": [1001, 1003],
///   "properties": {"CHR": 5, "INT": 5, "STR": 5, "MNY": 5},
///   "achieved": [[1], [2, 3]],
///   "seed": 42
/// }
/// ```
#[wasm_bindgen]
pub fn simulate(request_json: &str) -> Result<String, JsError> {
    let request = parse_request(request_json)?;
    let session =
        life_restart::simulate(&request).map_err(|e| js_err("Simulation error", e))?;
    serde_json::to_string(&session).map_err(|e| js_err("Serialization error", e))
}

/// Lint a configuration document. Returns a JSON array of report lines.
#[wasm_bindgen]
pub fn lint(config_json: &str) -> Result<String, JsError> {
    let config = GameConfig::from_json(config_json).map_err(|e| js_err("Config error", e))?;
    let lines: Vec<String> = lint_config(&config).iter().map(ToString::to_string).collect();
    serde_json::to_string(&lines).map_err(|e| js_err("Serialization error", e))
}

/// A finished life, kept on the Rust side so the page can read it lazily.
#[wasm_bindgen]
pub struct LifeSession {
    session: GameSession,
}

#[wasm_bindgen]
impl LifeSession {
    /// Simulate against the installed configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(request_json: &str) -> Result<LifeSession, JsError> {
        let request = parse_request(request_json)?;
        let session =
            life_restart::simulate(&request).map_err(|e| js_err("Simulation error", e))?;
        Ok(LifeSession { session })
    }

    pub fn total_years(&self) -> usize {
        self.session.total_years()
    }

    pub fn total_pages(&self, per_page: usize) -> usize {
        self.session.total_pages(per_page)
    }

    pub fn page_size(&self) -> usize {
        self.session.page_size()
    }

    pub fn page_count(&self) -> usize {
        self.session.page_count()
    }

    pub fn total_score(&self) -> f64 {
        self.session.total_score() as f64
    }

    pub fn is_ended(&self) -> bool {
        self.session.is_ended()
    }

    /// Page `page` (1-indexed) of the trajectory as a JSON array.
    pub fn page(&self, page: usize, per_page: usize) -> Result<String, JsError> {
        serde_json::to_string(self.session.page(page, per_page))
            .map_err(|e| js_err("Serialization error", e))
    }

    /// Page `page` at the page size the configuration declares.
    pub fn page_at(&self, page: usize) -> Result<String, JsError> {
        serde_json::to_string(self.session.page_at(page))
            .map_err(|e| js_err("Serialization error", e))
    }

    pub fn year_formatted(&self, index: usize) -> Option<String> {
        self.session.year_formatted(index)
    }

    pub fn summary(&self) -> Result<String, JsError> {
        serde_json::to_string(self.session.summary())
            .map_err(|e| js_err("Serialization error", e))
    }

    pub fn new_achievements(&self) -> Result<String, JsError> {
        serde_json::to_string(self.session.new_achievements())
            .map_err(|e| js_err("Serialization error", e))
    }

    pub fn to_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.session).map_err(|e| js_err("Serialization error", e))
    }
}
