//! The simulation loop: talents, then one step per year until the life
//! ends, then achievements and judging.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::core::achievement::AchievementLedger;
use crate::core::error::EngineError;
use crate::core::event;
use crate::core::judge;
use crate::core::property::PropertyState;
use crate::core::session::{GameSession, TrajectoryEntry};
use crate::core::talent::{self, Resolution};
use crate::schema::achievement::Opportunity;
use crate::schema::config::GameConfig;
use crate::schema::stat::Stat;

/// Inputs for one simulated life. Built via `SimulationRequest::new()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default)]
    talents: Vec<i32>,
    /// Initial allocation keyed by stat code.
    #[serde(default)]
    properties: BTreeMap<String, i32>,
    /// Achievement ids unlocked in prior lives, one group per life.
    #[serde(default)]
    achieved: Vec<Vec<i32>>,
    #[serde(default)]
    seed: Option<u64>,
}

impl SimulationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn talents(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.talents = ids.into_iter().collect();
        self
    }

    pub fn property(mut self, code: &str, value: i32) -> Self {
        self.properties.insert(code.to_string(), value);
        self
    }

    pub fn properties<K: Into<String>>(mut self, values: impl IntoIterator<Item = (K, i32)>) -> Self {
        self.properties
            .extend(values.into_iter().map(|(code, value)| (code.into(), value)));
        self
    }

    pub fn achieved(mut self, groups: Vec<Vec<i32>>) -> Self {
        self.achieved = groups;
        self
    }

    /// Fix the random source for deterministic replay.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn selected_talents(&self) -> &[i32] {
        &self.talents
    }

    pub fn achieved_groups(&self) -> &[Vec<i32>] {
        &self.achieved
    }
}

/// Runs lives against a shared, immutable configuration.
///
/// Cloning is cheap and every call owns its own state, so one simulator can
/// serve any number of threads.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: Arc<GameConfig>,
}

impl Simulator {
    pub fn new(config: GameConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<GameConfig>) -> Self {
        Simulator { config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Simulate one life, seeded from the request or from entropy.
    pub fn simulate(&self, request: &SimulationRequest) -> Result<GameSession, EngineError> {
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.simulate_with_rng(request, &mut rng)
    }

    /// Simulate on a blocking worker thread and await the result.
    #[cfg(feature = "async")]
    pub async fn simulate_async(
        &self,
        request: SimulationRequest,
    ) -> Result<GameSession, EngineError> {
        let simulator = self.clone();
        match tokio::task::spawn_blocking(move || simulator.simulate(&request)).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(EngineError::Interrupted(err.to_string())),
        }
    }

    pub fn simulate_with_rng(
        &self,
        request: &SimulationRequest,
        rng: &mut StdRng,
    ) -> Result<GameSession, EngineError> {
        let config = self.config.as_ref();
        let settings = &config.settings;

        let mut state = PropertyState::new(settings);
        for (code, value) in &request.properties {
            match Stat::from_code(code) {
                Some(Stat::Age) | None => {
                    tracing::debug!(property = %code, "ignoring unknown initial property");
                }
                Some(stat) => state.allocate(stat, *value),
            }
        }
        state.set_history(&request.achieved);

        tracing::debug!(talents = request.talents.len(), seeded = request.seed.is_some(), "simulation start");

        let Resolution {
            talents,
            replacements,
            mut tracker,
        } = talent::resolve(config, &request.talents, &mut state, rng)?;

        let mut ledger = AchievementLedger::new(&request.achieved);
        ledger.check(config, Opportunity::Start, &mut state);

        // Age effects can move the clock backwards; this bounds the loop anyway.
        let max_years = (settings.terminal_age as usize + 1).saturating_mul(2);
        let mut trajectory = Vec::new();
        let mut triggered = Vec::new();

        loop {
            let age = state.next_year();
            let slot = config.age(age);

            if let Some(slot) = slot {
                tracker.unlock(config, &slot.talents, &mut state);
            }
            let mut lines = tracker.activate(config, &mut state, rng);

            let mut terminal = false;
            if let Some(slot) = slot {
                if let Some(first) = event::select(config, slot, &state, rng) {
                    let chain = event::fire(config, first, &mut state, rng);
                    lines.extend(chain.lines);
                    triggered.extend(chain.fired);
                    terminal = chain.terminal;
                }
            }

            let is_end = terminal
                || state.is_dead()
                || state.at_terminal_age()
                || trajectory.len() + 1 >= max_years;
            trajectory.push(TrajectoryEntry::new(age, lines, state.snapshot(), is_end));

            ledger.check(config, Opportunity::Trajectory, &mut state);
            if is_end {
                break;
            }
        }

        ledger.check(config, Opportunity::Summary, &mut state);
        let summary = judge::summarize(config, &state, &talents);

        tracing::debug!(
            years = trajectory.len(),
            score = summary.total_score,
            achievements = ledger.unlocked().len(),
            "simulation end"
        );

        Ok(GameSession::new(
            trajectory,
            summary,
            ledger.into_unlocked(),
            triggered,
            replacements,
        )
        .with_page_size(config.settings.page_size))
    }
}
