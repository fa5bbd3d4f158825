/// One threshold of a judge rubric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeLevel {
    pub min: i32,
    pub grade: i32,
    pub text: String,
}

/// Pick the level for `value` from levels sorted ascending by `(min, grade)`.
///
/// The highest threshold met wins; equal thresholds resolve to the higher grade.
pub fn classify(levels: &[JudgeLevel], value: i32) -> Option<&JudgeLevel> {
    levels.iter().rev().find(|level| value >= level.min)
}

/// Sort levels into the order `classify` expects.
pub fn sort_levels(levels: &mut [JudgeLevel]) {
    levels.sort_by(|a, b| a.min.cmp(&b.min).then(a.grade.cmp(&b.grade)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(min: i32, grade: i32, text: &str) -> JudgeLevel {
        JudgeLevel {
            min,
            grade,
            text: text.to_string(),
        }
    }

    fn rubric() -> Vec<JudgeLevel> {
        let mut levels = vec![
            level(10, 3, "legendary"),
            level(0, 0, "plain"),
            level(5, 1, "decent"),
            level(5, 2, "good"),
        ];
        sort_levels(&mut levels);
        levels
    }

    #[test]
    fn picks_highest_threshold_met() {
        let levels = rubric();
        assert_eq!(classify(&levels, 0).unwrap().text, "plain");
        assert_eq!(classify(&levels, 4).unwrap().text, "plain");
        assert_eq!(classify(&levels, 12).unwrap().text, "legendary");
    }

    #[test]
    fn equal_thresholds_resolve_to_higher_grade() {
        let levels = rubric();
        assert_eq!(classify(&levels, 5).unwrap().grade, 2);
    }

    #[test]
    fn below_every_threshold_is_none() {
        let levels = rubric();
        assert!(classify(&levels, -1).is_none());
        assert!(classify(&[], 100).is_none());
    }
}
