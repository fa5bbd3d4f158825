use rustc_hash::FxHashSet;

use crate::core::property::PropertyState;
use crate::schema::achievement::{AchievementInfo, Opportunity};
use crate::schema::config::GameConfig;

/// Achievements unlocked so far in one life, measured against the ids
/// unlocked in prior lives.
#[derive(Debug, Clone, Default)]
pub struct AchievementLedger {
    known: FxHashSet<i32>,
    unlocked: Vec<AchievementInfo>,
}

impl AchievementLedger {
    /// `achieved` holds one group of ids per prior life.
    pub fn new(achieved: &[Vec<i32>]) -> Self {
        AchievementLedger {
            known: achieved.iter().flatten().copied().collect(),
            unlocked: Vec::new(),
        }
    }

    /// Check every achievement tagged `opportunity`, in ascending id order.
    /// Newly unlocked ids become visible to later conditions through `ACH`.
    /// Returns how many unlocked.
    pub fn check(
        &mut self,
        config: &GameConfig,
        opportunity: Opportunity,
        state: &mut PropertyState,
    ) -> usize {
        let before = self.unlocked.len();
        for id in config.achievement_ids() {
            if self.known.contains(id) {
                continue;
            }
            let Some(achievement) = config.achievements.get(id) else {
                continue;
            };
            if achievement.opportunity != Some(opportunity) {
                continue;
            }
            if achievement.condition.check(&*state) {
                self.known.insert(*id);
                state.add_achievement(*id);
                self.unlocked.push(achievement.info());
            }
        }
        self.unlocked.len() - before
    }

    pub fn unlocked(&self) -> &[AchievementInfo] {
        &self.unlocked
    }

    pub fn into_unlocked(self) -> Vec<AchievementInfo> {
        self.unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stat::Stat;
    use serde_json::json;

    fn config() -> GameConfig {
        GameConfig::from_json_value(json!({
            "achievements": {
                "1": {"name": "Pretty", "opportunity": "START", "condition": "CHR>=10"},
                "2": {"name": "Famous", "opportunity": "SUMMARY", "condition": "ACH?[1]"},
                "3": {"name": "Grown", "opportunity": "TRAJECTORY", "condition": "AGE>=18"},
                "4": {"name": "Odd", "opportunity": "SOMETIMES", "condition": ""}
            }
        }))
        .unwrap()
    }

    fn pretty_state(config: &GameConfig) -> PropertyState {
        let mut state = PropertyState::new(&config.settings);
        state.set(Stat::Charm, 10);
        state
    }

    #[test]
    fn unlocks_only_at_matching_checkpoint() {
        let config = config();
        let mut state = pretty_state(&config);
        let mut ledger = AchievementLedger::new(&[]);
        assert_eq!(ledger.check(&config, Opportunity::Start, &mut state), 1);
        assert_eq!(ledger.check(&config, Opportunity::Trajectory, &mut state), 0);
        assert_eq!(ledger.check(&config, Opportunity::Summary, &mut state), 1);
        let ids: Vec<i32> = ledger.unlocked().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn prior_lives_suppress_unlocks() {
        let config = config();
        let mut state = pretty_state(&config);
        state.set_history(&[vec![5], vec![1]]);
        let mut ledger = AchievementLedger::new(&[vec![5], vec![1]]);
        assert_eq!(ledger.check(&config, Opportunity::Start, &mut state), 0);
        // ACH still sees the prior unlock.
        assert_eq!(ledger.check(&config, Opportunity::Summary, &mut state), 1);
        assert_eq!(ledger.unlocked()[0].id, 2);
    }

    #[test]
    fn never_reports_twice_in_one_life() {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        for _ in 0..20 {
            state.next_year();
        }
        let mut ledger = AchievementLedger::new(&[]);
        assert_eq!(ledger.check(&config, Opportunity::Trajectory, &mut state), 1);
        assert_eq!(ledger.check(&config, Opportunity::Trajectory, &mut state), 0);
        assert_eq!(ledger.into_unlocked().len(), 1);
    }
}
