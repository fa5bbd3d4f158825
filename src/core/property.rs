//! The mutable per-life property vector with its historical shadows.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::core::condition::{Value, Variables};
use crate::schema::config::Settings;
use crate::schema::stat::{Effect, Stat};

const STATS: usize = 7;

/// Live stats, their historical maxima and minima, and the id lists
/// conditions can test membership against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyState {
    current: [i32; STATS],
    highest: [i32; STATS],
    lowest: [i32; STATS],
    talents: Vec<i32>,
    events: Vec<i32>,
    achievements: Vec<i32>,
    lives: i32,
    terminal_age: i32,
}

impl PropertyState {
    /// A fresh life, one year before birth.
    pub fn new(settings: &Settings) -> Self {
        let mut current = [0; STATS];
        current[Stat::Spirit.index()] = settings.initial_spirit;
        current[Stat::Life.index()] = settings.initial_life;
        current[Stat::Age.index()] = -1;
        PropertyState {
            current,
            highest: current,
            lowest: current,
            talents: Vec::new(),
            events: Vec::new(),
            achievements: Vec::new(),
            lives: 0,
            terminal_age: settings.terminal_age,
        }
    }

    pub fn get(&self, stat: Stat) -> i32 {
        self.current[stat.index()]
    }

    pub fn highest(&self, stat: Stat) -> i32 {
        self.highest[stat.index()]
    }

    pub fn lowest(&self, stat: Stat) -> i32 {
        self.lowest[stat.index()]
    }

    /// Set a stat before the life starts. Its shadows restart at the value.
    pub fn allocate(&mut self, stat: Stat, value: i32) {
        let i = stat.index();
        self.current[i] = value;
        self.highest[i] = value;
        self.lowest[i] = value;
    }

    /// Overwrite a stat.
    pub fn set(&mut self, stat: Stat, value: i32) {
        self.current[stat.index()] = value;
        self.record(stat);
    }

    /// Add `delta` to a stat. Age stays within `[0, terminal_age]`.
    pub fn change(&mut self, stat: Stat, delta: i32) {
        if delta == 0 {
            return;
        }
        let i = stat.index();
        let mut value = self.current[i].saturating_add(delta);
        if stat == Stat::Age {
            value = value.clamp(0, self.terminal_age);
        }
        self.current[i] = value;
        self.record(stat);
    }

    /// Apply an effect. The `RDM` delta lands on one core stat picked by `rng`.
    pub fn apply(&mut self, effect: &Effect, rng: &mut StdRng) {
        for stat in Stat::ALL {
            self.change(stat, effect.delta(stat));
        }
        if effect.random != 0 {
            let stat = Stat::CORE[rng.gen_range(0..Stat::CORE.len())];
            self.change(stat, effect.random);
        }
    }

    /// Advance the clock by one year. Never moves past the terminal age.
    pub fn next_year(&mut self) -> i32 {
        let i = Stat::Age.index();
        self.current[i] = self.current[i].saturating_add(1).min(self.terminal_age).max(0);
        self.record(Stat::Age);
        self.current[i]
    }

    fn record(&mut self, stat: Stat) {
        let i = stat.index();
        self.highest[i] = self.highest[i].max(self.current[i]);
        self.lowest[i] = self.lowest[i].min(self.current[i]);
    }

    pub fn talents(&self) -> &[i32] {
        &self.talents
    }

    pub fn has_talent(&self, id: i32) -> bool {
        self.talents.contains(&id)
    }

    pub fn add_talent(&mut self, id: i32) {
        if !self.talents.contains(&id) {
            self.talents.push(id);
        }
    }

    pub fn events(&self) -> &[i32] {
        &self.events
    }

    pub fn record_event(&mut self, id: i32) {
        if !self.events.contains(&id) {
            self.events.push(id);
        }
    }

    pub fn achievements(&self) -> &[i32] {
        &self.achievements
    }

    pub fn add_achievement(&mut self, id: i32) {
        if !self.achievements.contains(&id) {
            self.achievements.push(id);
        }
    }

    /// Seed the achievement history from prior lives, one group per life.
    pub fn set_history(&mut self, achieved: &[Vec<i32>]) {
        self.lives = achieved.len().min(i32::MAX as usize) as i32;
        for id in achieved.iter().flatten() {
            self.add_achievement(*id);
        }
    }

    pub fn is_dead(&self) -> bool {
        self.get(Stat::Life) <= 0
    }

    pub fn at_terminal_age(&self) -> bool {
        self.get(Stat::Age) >= self.terminal_age
    }

    /// `(HCHR + HINT + HSTR + HMNY + HSPR) * 2 + HAGE / 2`, truncated toward zero.
    pub fn summary_score(&self) -> i64 {
        let core: i64 = Stat::CORE.iter().map(|s| self.highest(*s) as i64).sum();
        core * 2 + self.highest(Stat::Age) as i64 / 2
    }

    pub fn snapshot(&self) -> PropertySnapshot {
        PropertySnapshot {
            age: self.get(Stat::Age),
            charm: self.get(Stat::Charm),
            intelligence: self.get(Stat::Intelligence),
            strength: self.get(Stat::Strength),
            money: self.get(Stat::Money),
            spirit: self.get(Stat::Spirit),
            life: self.get(Stat::Life),
        }
    }
}

impl Variables for PropertyState {
    fn lookup(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "TLT" => return Some(Value::List(&self.talents)),
            "EVT" => return Some(Value::List(&self.events)),
            "ACH" => return Some(Value::List(&self.achievements)),
            "TMS" => return Some(Value::Int(self.lives)),
            "SUM" => {
                let score = self.summary_score().clamp(i32::MIN as i64, i32::MAX as i64);
                return Some(Value::Int(score as i32));
            }
            _ => {}
        }
        if let Some(stat) = Stat::from_code(name) {
            return Some(Value::Int(self.get(stat)));
        }
        if let Some(code) = name.strip_prefix('H') {
            return Stat::from_code(code).map(|s| Value::Int(self.highest(s)));
        }
        if let Some(code) = name.strip_prefix('L') {
            return Stat::from_code(code).map(|s| Value::Int(self.lowest(s)));
        }
        None
    }
}

/// The live stats at one point of the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertySnapshot {
    #[serde(rename = "AGE")]
    pub age: i32,
    #[serde(rename = "CHR")]
    pub charm: i32,
    #[serde(rename = "INT")]
    pub intelligence: i32,
    #[serde(rename = "STR")]
    pub strength: i32,
    #[serde(rename = "MNY")]
    pub money: i32,
    #[serde(rename = "SPR")]
    pub spirit: i32,
    #[serde(rename = "LIF")]
    pub life: i32,
}
