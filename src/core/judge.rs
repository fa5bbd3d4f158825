//! Grading of historical maxima against the configured rubrics.

use crate::core::property::PropertyState;
use crate::core::session::{progress_bar, Judgement, Summary};
use crate::schema::config::GameConfig;
use crate::schema::judge::classify;
use crate::schema::stat::Stat;

pub const SUM_KEY: &str = "SUM";

/// Grade `value` under `key`'s rubric. `None` when no rubric is configured
/// or no threshold is met.
pub fn judge(config: &GameConfig, key: &str, value: i64) -> Option<Judgement> {
    let levels = config.rubric(key)?;
    let clamped = value.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    let level = classify(levels, clamped)?;
    let scale = config.settings.progress_scale_for(key) as f64;
    let progress = (value as f64 / scale).clamp(0.0, 1.0);
    Some(Judgement {
        stat: key.to_string(),
        value,
        grade: level.grade,
        text: level.text.clone(),
        progress,
        progress_bar: progress_bar(progress),
    })
}

/// Judge the five core stats and age by their historical maxima, then the
/// aggregate score.
pub fn judge_all(config: &GameConfig, state: &PropertyState) -> Vec<Judgement> {
    let mut judges: Vec<Judgement> = Stat::JUDGED
        .iter()
        .filter_map(|stat| judge(config, stat.code(), state.highest(*stat) as i64))
        .collect();
    judges.extend(judge(config, SUM_KEY, state.summary_score()));
    judges
}

pub fn summarize(config: &GameConfig, state: &PropertyState, talents: &[i32]) -> Summary {
    Summary {
        total_score: state.summary_score(),
        judges: judge_all(config, state),
        talents: talents
            .iter()
            .filter_map(|id| config.talent(*id))
            .map(|talent| talent.info())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GameConfig {
        GameConfig::from_json_value(json!({
            "talents": {"1": {"name": "Lucky", "grade": 2}},
            "judge": {
                "HCHR": [
                    {"min": 0, "grade": 0, "text": "plain"},
                    {"min": 7, "grade": 2, "text": "charming"},
                    {"min": 7, "grade": 1, "text": "cute"}
                ],
                "AGE": [{"min": 60, "grade": 1, "text": "long life"}],
                "SUM": [{"min": 0, "grade": 0, "text": "a life"}]
            },
            "settings": {"progress_scales": {"SUM": 100}}
        }))
        .unwrap()
    }

    #[test]
    fn judges_historical_maximum() {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        state.set(Stat::Charm, 8);
        state.change(Stat::Charm, -8);
        let judgement = judge_all(&config, &state)
            .into_iter()
            .find(|j| j.stat == "CHR")
            .unwrap();
        assert_eq!(judgement.value, 8);
        assert_eq!(judgement.grade, 2);
        assert_eq!(judgement.text, "charming");
        assert!((judgement.progress - 0.8).abs() < 1e-9);
        assert_eq!(judgement.progress_bar, "████████░░");
    }

    #[test]
    fn unmet_or_missing_rubrics_are_omitted() {
        let config = config();
        let state = PropertyState::new(&config.settings);
        let stats: Vec<String> = judge_all(&config, &state)
            .into_iter()
            .map(|j| j.stat)
            .collect();
        // AGE -1 is below the only threshold; INT has no rubric.
        assert_eq!(stats, vec!["CHR".to_string(), "SUM".to_string()]);
    }

    #[test]
    fn progress_is_clamped() {
        let config = config();
        let high = judge(&config, "CHR", 50).unwrap();
        assert_eq!(high.progress, 1.0);
        assert_eq!(high.progress_bar, "██████████");
        let sum = judge(&config, SUM_KEY, 25).unwrap();
        assert!((sum.progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn summary_lists_resolved_talents() {
        let config = config();
        let state = PropertyState::new(&config.settings);
        let summary = summarize(&config, &state, &[1]);
        assert_eq!(summary.total_score, state.summary_score());
        assert_eq!(summary.talents[0].name, "Lucky");
    }
}
