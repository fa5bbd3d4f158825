//! The canonical in-memory configuration and its parsing from JSON or RON.
//!
//! External documents deserialize into `Raw*` structs that accept every
//! spelling the content authors use; `build` validates them into the typed
//! entities the engine reads.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::condition::Condition;
use crate::core::error::EngineError;
use crate::schema::achievement::{Achievement, Opportunity};
use crate::schema::age::{AgeSlot, PoolEntry};
use crate::schema::event::{Branch, Event, PostEvent};
use crate::schema::judge::{sort_levels, JudgeLevel};
use crate::schema::stat::Effect;
use crate::schema::talent::{Replacement, Talent};

/// Tunables that are not part of any entity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub terminal_age: i32,
    pub initial_spirit: i32,
    pub initial_life: i32,
    /// Upper bound on branch/post-event hops and replacement hops.
    pub max_chain_depth: usize,
    /// Historical maximum that maps to a progress of 1.0.
    pub progress_scale: i32,
    /// Per-stat overrides of `progress_scale`, keyed by stat code or "SUM".
    pub progress_scales: BTreeMap<String, i32>,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            terminal_age: 100,
            initial_spirit: 5,
            initial_life: 1,
            max_chain_depth: 8,
            progress_scale: 10,
            progress_scales: BTreeMap::new(),
            page_size: 50,
        }
    }
}

impl Settings {
    pub fn progress_scale_for(&self, key: &str) -> i32 {
        self.progress_scales
            .get(key)
            .copied()
            .filter(|scale| *scale > 0)
            .unwrap_or(self.progress_scale)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.terminal_age < 0 {
            return Err(EngineError::MalformedConfig(format!(
                "terminal_age must be non-negative, got {}",
                self.terminal_age
            )));
        }
        if self.progress_scale <= 0 {
            return Err(EngineError::MalformedConfig(format!(
                "progress_scale must be positive, got {}",
                self.progress_scale
            )));
        }
        if self.page_size == 0 {
            return Err(EngineError::MalformedConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.max_chain_depth == 0 {
            return Err(EngineError::MalformedConfig(
                "max_chain_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// All rule tables a simulation reads. Immutable once installed.
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    pub talents: FxHashMap<i32, Talent>,
    pub events: FxHashMap<i32, Event>,
    pub ages: FxHashMap<i32, AgeSlot>,
    pub achievements: FxHashMap<i32, Achievement>,
    /// Rubrics keyed by stat code ("CHR", "HCHR", ...) or "SUM", each sorted
    /// ascending by `(min, grade)`.
    pub judge: FxHashMap<String, Vec<JudgeLevel>>,
    pub settings: Settings,
    achievement_order: Vec<i32>,
}

impl GameConfig {
    pub fn from_json(input: &str) -> Result<GameConfig, EngineError> {
        let raw: RawConfig = serde_json::from_str(input)?;
        raw.build()
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<GameConfig, EngineError> {
        let raw: RawConfig = serde_json::from_value(value)?;
        raw.build()
    }

    /// Parse a configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<GameConfig, EngineError> {
        let raw: RawConfig = ron::from_str(input)?;
        raw.build()
    }

    /// Load a configuration file; `.ron` files are RON, anything else JSON.
    pub fn load_from_file(path: &Path) -> Result<GameConfig, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Self::parse_ron(&contents),
            _ => Self::from_json(&contents),
        }
    }

    /// Merge another configuration into this one. Entities from `other`
    /// replace entities in `self` with the same id; judge rubrics replace
    /// per key. Settings stay those of `self`.
    pub fn merge(&mut self, other: GameConfig) {
        self.talents.extend(other.talents);
        self.events.extend(other.events);
        self.ages.extend(other.ages);
        self.achievements.extend(other.achievements);
        self.judge.extend(other.judge);
        self.refresh_achievement_order();
    }

    /// Achievement ids in ascending order, the order checks run in.
    pub fn achievement_ids(&self) -> &[i32] {
        &self.achievement_order
    }

    pub fn talent(&self, id: i32) -> Option<&Talent> {
        self.talents.get(&id)
    }

    pub fn event(&self, id: i32) -> Option<&Event> {
        self.events.get(&id)
    }

    pub fn age(&self, age: i32) -> Option<&AgeSlot> {
        self.ages.get(&age)
    }

    /// Rubric for a stat, looked up as "H{code}" first and then "{code}".
    pub fn rubric(&self, code: &str) -> Option<&[JudgeLevel]> {
        self.judge
            .get(&format!("H{code}"))
            .or_else(|| self.judge.get(code))
            .map(Vec::as_slice)
    }

    fn refresh_achievement_order(&mut self) {
        let mut ids: Vec<i32> = self.achievements.keys().copied().collect();
        ids.sort_unstable();
        self.achievement_order = ids;
    }
}

// --- external shapes ---

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    talents: HashMap<String, RawTalent>,
    #[serde(default)]
    events: HashMap<String, RawEvent>,
    #[serde(default)]
    ages: HashMap<String, RawAge>,
    #[serde(default)]
    achievements: HashMap<String, RawAchievement>,
    #[serde(default)]
    judge: HashMap<String, Vec<RawJudgeLevel>>,
    #[serde(default)]
    settings: Option<Settings>,
}

#[derive(Debug, Deserialize)]
struct RawTalent {
    id: Option<i32>,
    name: Option<String>,
    description: Option<String>,
    grade: Option<i32>,
    #[serde(alias = "maxTriggers")]
    max_triggers: Option<i64>,
    condition: Option<String>,
    effect: Option<Effect>,
    exclusive: Option<bool>,
    exclude: Option<Vec<i32>>,
    replacement: Option<RawReplacement>,
    status: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawReplacement {
    #[serde(default)]
    grade: HashMap<String, f64>,
    #[serde(default)]
    talent: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: Option<i32>,
    #[serde(alias = "text")]
    event: Option<String>,
    grade: Option<i32>,
    #[serde(alias = "NoRandom", alias = "noRandom")]
    no_random: Option<bool>,
    include: Option<RawFilter>,
    exclude: Option<RawFilter>,
    effect: Option<Effect>,
    branch: Option<Vec<RawBranch>>,
    #[serde(alias = "postEvent")]
    post_event: Option<RawPostEvent>,
    #[serde(alias = "isEnd")]
    terminal: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFilter {
    Ids(Vec<i32>),
    Condition(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBranch {
    Entry {
        condition: String,
        #[serde(alias = "eventId")]
        event_id: i32,
    },
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPostEvent {
    Id(i32),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawAge {
    age: Option<i32>,
    talents: Option<Vec<i32>>,
    events: Option<Vec<RawPoolEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPoolEntry {
    Pair(i32, f64),
    Text(String),
    Partial(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct RawAchievement {
    id: Option<i32>,
    name: Option<String>,
    description: Option<String>,
    grade: Option<i32>,
    opportunity: Option<String>,
    condition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawJudgeLevel {
    min: i32,
    grade: i32,
    text: Option<String>,
}

fn malformed(msg: String) -> EngineError {
    EngineError::MalformedConfig(msg)
}

fn parse_key(table: &str, key: &str) -> Result<i32, EngineError> {
    key.trim()
        .parse()
        .map_err(|_| malformed(format!("{table} key {key:?} is not an integer id")))
}

/// The entity id, which must agree with its table key when both are given.
fn entity_id(table: &str, key: &str, inner: Option<i32>) -> Result<i32, EngineError> {
    let id = parse_key(table, key)?;
    match inner {
        Some(inner) if inner != id => Err(malformed(format!(
            "{table} key {id} holds an entity with id {inner}"
        ))),
        _ => Ok(id),
    }
}

/// Compile a condition, warning once if it will never match.
fn compile(owner: &str, id: i32, source: &str) -> Condition {
    let condition = Condition::parse(source);
    if let Some(err) = condition.error() {
        tracing::warn!(owner, id, condition = source, error = %err, "malformed condition treated as never matching");
    }
    condition
}

fn weight_map(owner: i32, field: &str, raw: HashMap<String, f64>) -> Result<Vec<(i32, f64)>, EngineError> {
    let mut out = Vec::with_capacity(raw.len());
    for (key, weight) in raw {
        let key = key.trim().parse().map_err(|_| {
            malformed(format!("talent {owner} replacement {field} key {key:?} is not an integer"))
        })?;
        out.push((key, weight));
    }
    out.sort_by_key(|(key, _)| *key);
    Ok(out)
}

impl RawConfig {
    fn build(self) -> Result<GameConfig, EngineError> {
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;

        let mut talents = FxHashMap::default();
        for (key, raw) in self.talents {
            let talent = raw.build(&key)?;
            talents.insert(talent.id, talent);
        }

        let mut events = FxHashMap::default();
        for (key, raw) in self.events {
            let event = raw.build(&key)?;
            events.insert(event.id, event);
        }

        let mut ages = FxHashMap::default();
        for (key, raw) in self.ages {
            let slot = raw.build(&key)?;
            ages.insert(slot.age, slot);
        }

        let mut achievements = FxHashMap::default();
        for (key, raw) in self.achievements {
            let achievement = raw.build(&key)?;
            achievements.insert(achievement.id, achievement);
        }

        let mut judge = FxHashMap::default();
        for (key, levels) in self.judge {
            let mut levels: Vec<JudgeLevel> = levels
                .into_iter()
                .map(|level| JudgeLevel {
                    min: level.min,
                    grade: level.grade,
                    text: level.text.unwrap_or_default(),
                })
                .collect();
            sort_levels(&mut levels);
            judge.insert(key, levels);
        }

        let mut config = GameConfig {
            talents,
            events,
            ages,
            achievements,
            judge,
            settings,
            achievement_order: Vec::new(),
        };
        config.refresh_achievement_order();
        Ok(config)
    }
}

impl RawTalent {
    fn build(self, key: &str) -> Result<Talent, EngineError> {
        let id = entity_id("talent", key, self.id)?;
        let replacement = match self.replacement {
            Some(raw) => Some(Replacement {
                grades: weight_map(id, "grade", raw.grade)?,
                talents: weight_map(id, "talent", raw.talent)?,
            }),
            None => None,
        };
        Ok(Talent {
            id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            grade: self.grade.unwrap_or(0),
            max_triggers: self
                .max_triggers
                .map(|n| n.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(1),
            condition: self.condition.map(|src| compile("talent", id, &src)),
            effect: self.effect,
            exclusive: self.exclusive.unwrap_or(false),
            exclude: self.exclude.unwrap_or_default(),
            replacement,
            status: self.status.unwrap_or(0),
        })
    }
}

impl RawFilter {
    /// An id list `[a, b]` reads as `EVT?[a,b]`; an empty list is no filter.
    fn into_condition(self, id: i32) -> Option<Condition> {
        match self {
            RawFilter::Condition(src) => Some(compile("event", id, &src)),
            RawFilter::Ids(ids) if ids.is_empty() => None,
            RawFilter::Ids(ids) => {
                let list: Vec<String> = ids.iter().map(i32::to_string).collect();
                Some(Condition::parse(&format!("EVT?[{}]", list.join(","))))
            }
        }
    }
}

impl RawBranch {
    fn build(self, owner: i32) -> Result<Branch, EngineError> {
        match self {
            RawBranch::Entry {
                condition,
                event_id,
            } => Ok(Branch {
                condition: compile("event", owner, &condition),
                event_id,
            }),
            RawBranch::Text(text) => {
                let (condition, target) = text.rsplit_once(':').ok_or_else(|| {
                    malformed(format!("event {owner} branch {text:?} has no target id"))
                })?;
                let event_id = target.trim().parse().map_err(|_| {
                    malformed(format!("event {owner} branch {text:?} has no target id"))
                })?;
                Ok(Branch {
                    condition: compile("event", owner, condition),
                    event_id,
                })
            }
        }
    }
}

impl RawEvent {
    fn build(self, key: &str) -> Result<Event, EngineError> {
        let id = entity_id("event", key, self.id)?;
        let branches = self
            .branch
            .unwrap_or_default()
            .into_iter()
            .map(|branch| branch.build(id))
            .collect::<Result<Vec<_>, _>>()?;
        let post_event = match self.post_event {
            Some(RawPostEvent::Id(target)) => Some(PostEvent::Event(target)),
            Some(RawPostEvent::Text(text)) => match text.trim().parse() {
                Ok(target) => Some(PostEvent::Event(target)),
                Err(_) if text.trim().is_empty() => None,
                Err(_) => Some(PostEvent::Text(text)),
            },
            None => None,
        };
        Ok(Event {
            id,
            text: self.event.unwrap_or_default(),
            grade: self.grade.unwrap_or(0),
            no_random: self.no_random.unwrap_or(false),
            include: self.include.and_then(|filter| filter.into_condition(id)),
            exclude: self.exclude.and_then(|filter| filter.into_condition(id)),
            effect: self.effect,
            branches,
            post_event,
            terminal: self.terminal.unwrap_or(false),
        })
    }
}

impl RawPoolEntry {
    fn build(self, age: i32) -> Result<PoolEntry, EngineError> {
        match self {
            RawPoolEntry::Pair(event_id, weight) => Ok(PoolEntry { event_id, weight }),
            RawPoolEntry::Text(text) => {
                let (id, weight) = text.split_once('*').ok_or_else(|| {
                    malformed(format!("age {age} pool entry {text:?} has no weight"))
                })?;
                let event_id = id.trim().parse().map_err(|_| {
                    malformed(format!("age {age} pool entry {text:?} has no event id"))
                })?;
                let weight = weight.trim().parse().map_err(|_| {
                    malformed(format!("age {age} pool entry {text:?} has an invalid weight"))
                })?;
                Ok(PoolEntry { event_id, weight })
            }
            RawPoolEntry::Partial(values) => Err(malformed(format!(
                "age {age} pool entry {values:?} must be [event id, weight]"
            ))),
        }
    }
}

impl RawAge {
    fn build(self, key: &str) -> Result<AgeSlot, EngineError> {
        let age = entity_id("age", key, self.age)?;
        let pool = self
            .events
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.build(age))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AgeSlot {
            age,
            talents: self.talents.unwrap_or_default(),
            pool,
        })
    }
}

impl RawAchievement {
    fn build(self, key: &str) -> Result<Achievement, EngineError> {
        let id = entity_id("achievement", key, self.id)?;
        let condition = self
            .condition
            .ok_or_else(|| malformed(format!("achievement {id} has no condition")))?;
        let opportunity = match self.opportunity {
            Some(tag) => {
                let parsed = Opportunity::parse(&tag);
                if parsed.is_none() {
                    tracing::debug!(id, opportunity = %tag, "unknown opportunity tag; achievement is never checked");
                }
                parsed
            }
            None => Some(Opportunity::Summary),
        };
        Ok(Achievement {
            id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            grade: self.grade.unwrap_or(0),
            opportunity,
            condition: compile("achievement", id, &condition),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "talents": {
                "1": {"id": 1, "name": "Handsome", "grade": 1, "effect": {"CHR": 2}},
                "2": {"id": 2, "name": "Ugly", "exclude": [1], "condition": "AGE>=3"}
            },
            "events": {
                "10": {"id": 10, "event": "Born.", "NoRandom": true,
                       "branch": ["CHR>5:11", {"condition": "INT>5", "eventId": 12}],
                       "postEvent": "And cried."},
                "11": {"id": 11, "event": "A pretty baby.", "include": [10]},
                "12": {"id": 12, "event": "A clever baby.", "postEvent": "11"}
            },
            "ages": {
                "0": {"age": 0, "talents": [1], "events": [[10, 1.0], "11*2.5"]}
            },
            "achievements": {
                "100": {"id": 100, "name": "Pretty", "opportunity": "START", "condition": "CHR>=10"}
            },
            "judge": {
                "HCHR": [{"min": 7, "grade": 2, "text": "charming"}, {"min": 0, "grade": 0, "text": "plain"}]
            }
        })
    }

    #[test]
    fn builds_typed_entities_from_json() {
        let config = GameConfig::from_json_value(minimal()).unwrap();
        assert_eq!(config.talents.len(), 2);
        let handsome = config.talent(1).unwrap();
        assert_eq!(handsome.effect.unwrap().charm, 2);
        assert_eq!(handsome.max_triggers, 1);
        assert!(config.talent(2).unwrap().excludes(1));

        let born = config.event(10).unwrap();
        assert!(born.no_random);
        assert_eq!(born.branches.len(), 2);
        assert_eq!(born.branches[0].event_id, 11);
        assert_eq!(born.branches[1].event_id, 12);
        assert_eq!(born.post_event, Some(PostEvent::Text("And cried.".to_string())));
        assert_eq!(config.event(12).unwrap().post_event, Some(PostEvent::Event(11)));

        let slot = config.age(0).unwrap();
        assert_eq!(slot.talents, vec![1]);
        assert_eq!(slot.pool[1], PoolEntry { event_id: 11, weight: 2.5 });

        assert_eq!(config.achievement_ids(), &[100]);
        assert_eq!(config.rubric("CHR").unwrap()[0].text, "plain");
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn pool_entry_without_weight_is_malformed() {
        let mut value = minimal();
        value["ages"]["0"]["events"] = json!([[10]]);
        assert!(matches!(
            GameConfig::from_json_value(value),
            Err(EngineError::MalformedConfig(_))
        ));

        let mut value = minimal();
        value["ages"]["0"]["events"] = json!(["10"]);
        assert!(matches!(
            GameConfig::from_json_value(value),
            Err(EngineError::MalformedConfig(_))
        ));
    }

    #[test]
    fn mismatched_key_and_id_is_malformed() {
        let mut value = minimal();
        value["talents"]["1"]["id"] = json!(3);
        assert!(matches!(
            GameConfig::from_json_value(value),
            Err(EngineError::MalformedConfig(_))
        ));
    }

    #[test]
    fn malformed_conditions_are_kept_as_never_matching() {
        let mut value = minimal();
        value["talents"]["2"]["condition"] = json!("AGE>=>3");
        let config = GameConfig::from_json_value(value).unwrap();
        let condition = config.talent(2).unwrap().condition.as_ref().unwrap();
        assert!(!condition.is_valid());
    }

    #[test]
    fn include_id_list_means_prerequisite_fired() {
        let config = GameConfig::from_json_value(minimal()).unwrap();
        let include = config.event(11).unwrap().include.as_ref().unwrap();
        assert_eq!(include.source(), "EVT?[10]");
    }

    #[test]
    fn missing_tables_default_to_empty() {
        let config = GameConfig::from_json("{}").unwrap();
        assert!(config.talents.is_empty());
        assert!(config.achievement_ids().is_empty());
    }

    #[test]
    fn settings_override_defaults() {
        let config =
            GameConfig::from_json(r#"{"settings": {"terminal_age": 80, "progress_scales": {"SUM": 200}}}"#)
                .unwrap();
        assert_eq!(config.settings.terminal_age, 80);
        assert_eq!(config.settings.page_size, 50);
        assert_eq!(config.settings.progress_scale_for("SUM"), 200);
        assert_eq!(config.settings.progress_scale_for("CHR"), 10);
    }

    #[test]
    fn invalid_settings_are_malformed() {
        let err = GameConfig::from_json(r#"{"settings": {"progress_scale": 0}}"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedConfig(_)));
        let err = GameConfig::from_json(r#"{"settings": {"page_size": 0}}"#).unwrap_err();
        assert!(matches!(err, EngineError::MalformedConfig(_)));
    }

    #[test]
    fn merge_precedence() {
        let mut base = GameConfig::from_json_value(minimal()).unwrap();
        let overlay = GameConfig::from_json(
            r#"{"talents": {"1": {"name": "Gorgeous"}},
                "achievements": {"5": {"condition": "AGE>=1"}}}"#,
        )
        .unwrap();
        base.merge(overlay);
        assert_eq!(base.talent(1).unwrap().name, "Gorgeous");
        assert_eq!(base.talents.len(), 2);
        assert_eq!(base.achievement_ids(), &[5, 100]);
    }

    #[test]
    fn parses_ron() {
        let input = r#"#![enable(implicit_some)]
        (
            talents: {
                "1": (name: "Handsome", grade: 1, effect: (CHR: 2)),
            },
            events: {
                "10": (event: "Born.", branch: [(condition: "CHR>5", event_id: 10)]),
            },
            ages: {
                "0": (events: [(10, 1.0)]),
            },
        )"#;
        let config = GameConfig::parse_ron(input).unwrap();
        assert_eq!(config.talent(1).unwrap().grade, 1);
        assert_eq!(config.event(10).unwrap().branches[0].event_id, 10);
        assert_eq!(config.age(0).unwrap().pool[0].weight, 1.0);
    }
}
