//! Static checks over a configuration: the anomalies the engine tolerates at
//! run time, reported up front for content authors.

use std::fmt;

use crate::core::condition::Condition;
use crate::schema::config::GameConfig;
use crate::schema::event::PostEvent;
use crate::schema::stat::Stat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{label}: {}", self.message)
    }
}

struct Report {
    issues: Vec<LintIssue>,
}

impl Report {
    fn warn(&mut self, message: String) {
        self.issues.push(LintIssue {
            severity: Severity::Warning,
            message,
        });
    }

    fn condition(&mut self, owner: &str, condition: &Condition) {
        if let Some(err) = condition.error() {
            self.issues.push(LintIssue {
                severity: Severity::Error,
                message: format!("{owner} has malformed condition '{condition}': {err}"),
            });
        }
    }
}

fn sorted<V>(map: &rustc_hash::FxHashMap<i32, V>) -> Vec<(&i32, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(id, _)| **id);
    entries
}

fn is_judge_key(key: &str) -> bool {
    key == crate::core::judge::SUM_KEY
        || Stat::from_code(key).is_some()
        || key.strip_prefix('H').and_then(Stat::from_code).is_some()
}

/// Check every table. Malformed conditions are errors; dangling references
/// and unusable entries are warnings.
pub fn lint_config(config: &GameConfig) -> Vec<LintIssue> {
    let mut report = Report { issues: Vec::new() };

    for (id, talent) in sorted(&config.talents) {
        let owner = format!("Talent {id}");
        if let Some(ref condition) = talent.condition {
            report.condition(&owner, condition);
        }
        for other in &talent.exclude {
            if config.talent(*other).is_none() {
                report.warn(format!("{owner} excludes unknown talent {other}"));
            }
        }
        if let Some(ref rule) = talent.replacement {
            for (grade, _) in &rule.grades {
                let any = config
                    .talents
                    .values()
                    .any(|t| t.grade == *grade && !t.exclusive && t.id != *id);
                if !any {
                    report.warn(format!(
                        "{owner} replacement draws from grade {grade}, which has no candidates"
                    ));
                }
            }
            for (target, _) in &rule.talents {
                if config.talent(*target).is_none() {
                    report.warn(format!("{owner} replacement names unknown talent {target}"));
                }
            }
        }
    }

    for (id, event) in sorted(&config.events) {
        let owner = format!("Event {id}");
        for filter in [&event.include, &event.exclude].into_iter().flatten() {
            report.condition(&owner, filter);
        }
        for branch in &event.branches {
            report.condition(&owner, &branch.condition);
            if config.event(branch.event_id).is_none() {
                report.warn(format!("{owner} branches to unknown event {}", branch.event_id));
            }
        }
        if let Some(PostEvent::Event(target)) = event.post_event {
            if config.event(target).is_none() {
                report.warn(format!("{owner} post-event names unknown event {target}"));
            }
        }
    }

    for (age, slot) in sorted(&config.ages) {
        for entry in &slot.pool {
            if config.event(entry.event_id).is_none() {
                report.warn(format!("Age {age} pool names unknown event {}", entry.event_id));
            }
            if !(entry.weight.is_finite() && entry.weight > 0.0) {
                report.warn(format!(
                    "Age {age} pool entry {} has weight {} and is never drawn",
                    entry.event_id, entry.weight
                ));
            }
        }
        for talent in &slot.talents {
            if config.talent(*talent).is_none() {
                report.warn(format!("Age {age} unlocks unknown talent {talent}"));
            }
        }
    }

    for (id, achievement) in sorted(&config.achievements) {
        let owner = format!("Achievement {id}");
        report.condition(&owner, &achievement.condition);
        if achievement.opportunity.is_none() {
            report.warn(format!("{owner} has an unknown opportunity and is never checked"));
        }
    }

    let mut keys: Vec<&String> = config.judge.keys().collect();
    keys.sort();
    for key in keys {
        if !is_judge_key(key) {
            report.warn(format!("Judge rubric '{key}' is not a stat code and is never used"));
        }
    }

    report.issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lint(value: serde_json::Value) -> Vec<LintIssue> {
        lint_config(&GameConfig::from_json_value(value).unwrap())
    }

    #[test]
    fn clean_config_has_no_issues() {
        let issues = lint(json!({
            "talents": {"1": {"condition": "AGE>3"}},
            "events": {"1": {"event": "x", "branch": ["CHR>1:1"]}},
            "ages": {"0": {"talents": [1], "events": [[1, 1.0]]}},
            "achievements": {"1": {"opportunity": "END", "condition": "SUM>10"}},
            "judge": {"HCHR": [], "SUM": [], "AGE": []}
        }));
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn reports_dangling_references_as_warnings() {
        let issues = lint(json!({
            "talents": {"1": {"exclude": [2], "replacement": {"grade": {"3": 1.0}, "talent": {"9": 1.0}}}},
            "events": {"1": {"branch": ["CHR>1:5"], "postEvent": 6}},
            "ages": {"0": {"talents": [7], "events": [[8, 1.0], [1, 0.0]]}},
            "judge": {"LUCK": []}
        }));
        assert_eq!(issues.len(), 9, "{issues:?}");
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn reports_malformed_conditions_as_errors() {
        let issues = lint(json!({
            "talents": {"1": {"condition": "AGE>>3"}},
            "achievements": {"1": {"opportunity": "START", "condition": "(CHR>1"}}
        }));
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().starts_with("ERROR: Talent 1"));
    }
}
