//! Talent resolution at the start of a life, and per-year activation after.

use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use crate::core::draw::weighted_pick;
use crate::core::error::{EngineError, EntityKind};
use crate::core::property::PropertyState;
use crate::core::session::{ContentLine, ReplacementRecord};
use crate::schema::config::GameConfig;
use crate::schema::talent::Talent;

/// Active talents of one life and how often each has fired.
#[derive(Debug, Clone, Default)]
pub struct TalentTracker {
    active: Vec<i32>,
    triggers: FxHashMap<i32, u32>,
}

/// Outcome of resolving the caller's selection.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Resolved talent ids in selection order, after replacement.
    pub talents: Vec<i32>,
    pub replacements: Vec<ReplacementRecord>,
    pub tracker: TalentTracker,
}

fn conflicts(a: &Talent, b: &Talent) -> bool {
    a.excludes(b.id) || b.excludes(a.id)
}

fn lookup(config: &GameConfig, id: i32) -> Result<&Talent, EngineError> {
    config.talent(id).ok_or(EngineError::UnknownEntity {
        kind: EntityKind::Talent,
        id,
    })
}

/// Resolve `selected` against `state`, applying the effects that fire.
///
/// Duplicates collapse to their first occurrence. Of two mutually exclusive
/// talents the later one in `selected` is dropped. Talents whose condition
/// does not hold yet stay in the resolution unapplied and may fire in a
/// later year.
pub fn resolve(
    config: &GameConfig,
    selected: &[i32],
    state: &mut PropertyState,
    rng: &mut StdRng,
) -> Result<Resolution, EngineError> {
    for id in selected {
        lookup(config, *id)?;
    }

    let mut kept: Vec<&Talent> = Vec::with_capacity(selected.len());
    for id in selected {
        if kept.iter().any(|t| t.id == *id) {
            continue;
        }
        let talent = lookup(config, *id)?;
        if let Some(winner) = kept.iter().find(|t| conflicts(**t, talent)) {
            tracing::debug!(dropped = talent.id, kept = winner.id, "exclusive talents selected together");
            continue;
        }
        kept.push(talent);
    }

    let mut resolution = Resolution::default();
    let mut taken: Vec<i32> = kept.iter().map(|t| t.id).collect();
    let max_depth = config.settings.max_chain_depth;

    for talent in kept {
        let condition_holds = talent
            .condition
            .as_ref()
            .map_or(true, |condition| condition.check(&*state));
        if !condition_holds {
            resolution.talents.push(talent.id);
            resolution.tracker.active.push(talent.id);
            state.add_talent(talent.id);
            continue;
        }

        let target = follow_replacements(config, talent, &mut taken, max_depth, rng);
        if target.id != talent.id {
            resolution.replacements.push(ReplacementRecord {
                source: talent.info(),
                target: target.info(),
            });
        }

        resolution.talents.push(target.id);
        resolution.tracker.active.push(target.id);
        state.add_talent(target.id);
        let target_holds = target.id == talent.id
            || target
                .condition
                .as_ref()
                .map_or(true, |condition| condition.check(&*state));
        if target_holds {
            resolution.tracker.fire(target, state, rng);
        }
    }

    Ok(resolution)
}

/// Walk a replacement chain from `source`, at most `max_depth` hops.
fn follow_replacements<'a>(
    config: &'a GameConfig,
    source: &'a Talent,
    taken: &mut Vec<i32>,
    max_depth: usize,
    rng: &mut StdRng,
) -> &'a Talent {
    let mut current = source;
    for _ in 0..max_depth {
        let Some(next) = draw_replacement(config, current, taken.as_slice(), rng) else {
            break;
        };
        taken.retain(|id| *id != current.id);
        taken.push(next.id);
        current = next;
    }
    current
}

/// Draw a target from `talent`'s replacement pools, if it has any.
pub fn draw_replacement<'a>(
    config: &'a GameConfig,
    talent: &Talent,
    taken: &[i32],
    rng: &mut StdRng,
) -> Option<&'a Talent> {
    let rule = talent.replacement.as_ref()?;
    let eligible = |candidate: &Talent| {
        candidate.id != talent.id
            && !candidate.exclusive
            && !taken.contains(&candidate.id)
            && !taken
                .iter()
                .filter_map(|id| config.talent(*id))
                .any(|held| conflicts(held, candidate))
    };

    let mut options: Vec<(i32, f64)> = Vec::new();
    for (grade, weight) in &rule.grades {
        let mut of_grade: Vec<i32> = config
            .talents
            .values()
            .filter(|t| t.grade == *grade && eligible(*t))
            .map(|t| t.id)
            .collect();
        of_grade.sort_unstable();
        options.extend(of_grade.into_iter().map(|id| (id, *weight)));
    }
    for (id, weight) in &rule.talents {
        match config.talent(*id) {
            Some(candidate) if eligible(candidate) => options.push((*id, *weight)),
            Some(_) => {}
            None => tracing::debug!(talent = talent.id, target = id, "replacement names unknown talent"),
        }
    }

    let id = weighted_pick(&options, rng)?;
    config.talent(id)
}

impl TalentTracker {
    pub fn active(&self) -> &[i32] {
        &self.active
    }

    pub fn trigger_count(&self, id: i32) -> u32 {
        self.triggers.get(&id).copied().unwrap_or(0)
    }

    fn fire(&mut self, talent: &Talent, state: &mut PropertyState, rng: &mut StdRng) {
        if self.trigger_count(talent.id) >= talent.max_triggers {
            return;
        }
        if let Some(ref effect) = talent.effect {
            state.apply(effect, rng);
        }
        *self.triggers.entry(talent.id).or_insert(0) += 1;
    }

    /// Activate the talents an age slot unlocks. Unknown ids and talents that
    /// conflict with an active one are skipped.
    pub fn unlock(&mut self, config: &GameConfig, ids: &[i32], state: &mut PropertyState) {
        for id in ids {
            if self.active.contains(id) {
                continue;
            }
            let Some(talent) = config.talent(*id) else {
                tracing::debug!(talent = id, "age slot names unknown talent");
                continue;
            };
            let clash = self
                .active
                .iter()
                .filter_map(|active| config.talent(*active))
                .any(|active| conflicts(active, talent));
            if clash {
                continue;
            }
            self.active.push(*id);
            state.add_talent(*id);
        }
    }

    /// One yearly pass: every active talent under its trigger limit whose
    /// condition holds fires once.
    pub fn activate(
        &mut self,
        config: &GameConfig,
        state: &mut PropertyState,
        rng: &mut StdRng,
    ) -> Vec<ContentLine> {
        let mut lines = Vec::new();
        for index in 0..self.active.len() {
            let id = self.active[index];
            let Some(talent) = config.talent(id) else {
                continue;
            };
            if self.trigger_count(id) >= talent.max_triggers {
                continue;
            }
            let holds = talent
                .condition
                .as_ref()
                .map_or(true, |condition| condition.check(&*state));
            if !holds {
                continue;
            }
            self.fire(talent, state, rng);
            lines.push(ContentLine::talent(&talent.info()));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stat::Stat;
    use rand::SeedableRng;
    use serde_json::json;

    fn config() -> GameConfig {
        GameConfig::from_json_value(json!({
            "talents": {
                "1": {"name": "Strong", "grade": 0, "effect": {"STR": 2}},
                "2": {"name": "Weak", "grade": 0, "effect": {"STR": -2}, "exclude": [1]},
                "3": {"name": "Late Bloomer", "grade": 0, "condition": "AGE>=10", "effect": {"INT": 3}},
                "4": {"name": "Wildcard", "grade": 0, "replacement": {"grade": {"1": 1.0}}},
                "5": {"name": "Lucky", "grade": 1, "effect": {"MNY": 1}},
                "6": {"name": "Blessed", "grade": 1, "exclusive": true},
                "7": {"name": "Persistent", "grade": 0, "maxTriggers": 3, "effect": {"SPR": 1}},
                "8": {"name": "Shapeshifter", "grade": 0, "replacement": {"talent": {"8": 1.0, "9": 1.0}}},
                "9": {"name": "Chained", "grade": 2, "replacement": {"talent": {"5": 1.0}}}
            }
        }))
        .unwrap()
    }

    fn run(selected: &[i32]) -> (Resolution, PropertyState) {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        let mut rng = StdRng::seed_from_u64(7);
        let resolution = resolve(&config, selected, &mut state, &mut rng).unwrap();
        (resolution, state)
    }

    #[test]
    fn applies_effects_and_dedupes() {
        let (resolution, state) = run(&[1, 1]);
        assert_eq!(resolution.talents, vec![1]);
        assert_eq!(state.get(Stat::Strength), 2);
        assert_eq!(state.talents(), &[1]);
    }

    #[test]
    fn later_exclusive_talent_is_dropped() {
        let (resolution, state) = run(&[1, 2]);
        assert_eq!(resolution.talents, vec![1]);
        assert_eq!(state.get(Stat::Strength), 2);

        let (resolution, state) = run(&[2, 1]);
        assert_eq!(resolution.talents, vec![2]);
        assert_eq!(state.get(Stat::Strength), -2);
    }

    #[test]
    fn unknown_talent_is_fatal() {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        let mut rng = StdRng::seed_from_u64(7);
        let err = resolve(&config, &[1, 99], &mut state, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownEntity {
                kind: EntityKind::Talent,
                id: 99
            }
        ));
    }

    #[test]
    fn unmet_condition_defers_the_talent() {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        let mut rng = StdRng::seed_from_u64(7);
        let mut resolution = resolve(&config, &[3], &mut state, &mut rng).unwrap();
        assert_eq!(resolution.talents, vec![3]);
        assert_eq!(state.get(Stat::Intelligence), 0);
        assert_eq!(resolution.tracker.trigger_count(3), 0);

        for _ in 0..=10 {
            state.next_year();
        }
        let lines = resolution.tracker.activate(&config, &mut state, &mut rng);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name.as_deref(), Some("Late Bloomer"));
        assert_eq!(state.get(Stat::Intelligence), 3);
        assert!(resolution.tracker.activate(&config, &mut state, &mut rng).is_empty());
    }

    #[test]
    fn grade_replacement_never_picks_exclusive_talents() {
        for seed in 0..32 {
            let config = config();
            let mut state = PropertyState::new(&config.settings);
            let mut rng = StdRng::seed_from_u64(seed);
            let resolution = resolve(&config, &[4], &mut state, &mut rng).unwrap();
            assert_eq!(resolution.replacements.len(), 1);
            assert_eq!(resolution.replacements[0].source.id, 4);
            assert_eq!(resolution.replacements[0].target.id, 5);
            assert_eq!(resolution.talents, vec![5]);
            assert_eq!(state.get(Stat::Money), 1);
        }
    }

    #[test]
    fn replacement_chain_logs_one_record() {
        let (resolution, _) = run(&[8]);
        assert_eq!(resolution.replacements.len(), 1);
        assert_eq!(resolution.replacements[0].source.id, 8);
        assert_eq!(resolution.replacements[0].target.id, 5);
    }

    #[test]
    fn trigger_limit_caps_yearly_activation() {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        let mut rng = StdRng::seed_from_u64(1);
        let mut resolution = resolve(&config, &[7], &mut state, &mut rng).unwrap();
        for _ in 0..5 {
            resolution.tracker.activate(&config, &mut state, &mut rng);
        }
        assert_eq!(resolution.tracker.trigger_count(7), 3);
        assert_eq!(state.get(Stat::Spirit), 5 + 3);
    }

    #[test]
    fn age_slot_unlock_skips_unknown_and_conflicting() {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        let mut rng = StdRng::seed_from_u64(1);
        let mut resolution = resolve(&config, &[1], &mut state, &mut rng).unwrap();
        resolution.tracker.unlock(&config, &[2, 42, 5], &mut state);
        assert_eq!(resolution.tracker.active(), &[1, 5]);
        assert_eq!(state.talents(), &[1, 5]);
    }
}
