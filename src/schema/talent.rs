use serde::Serialize;

use crate::core::condition::Condition;
use crate::schema::stat::Effect;

/// A selectable starting trait. Optional capabilities are optional fields;
/// the engine dispatches on their presence.
#[derive(Debug, Clone, PartialEq)]
pub struct Talent {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub grade: i32,
    pub max_triggers: u32,
    pub condition: Option<Condition>,
    pub effect: Option<Effect>,
    /// Exclusive talents are never drawn as a replacement target.
    pub exclusive: bool,
    pub exclude: Vec<i32>,
    pub replacement: Option<Replacement>,
    pub status: i32,
}

/// Weighted candidate pools a talent may swap itself for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacement {
    /// (grade, weight): every non-exclusive talent of that grade.
    pub grades: Vec<(i32, f64)>,
    /// (talent id, weight): specific talents.
    pub talents: Vec<(i32, f64)>,
}

impl Talent {
    pub fn new(id: i32, name: &str) -> Self {
        Talent {
            id,
            name: name.to_string(),
            description: String::new(),
            grade: 0,
            max_triggers: 1,
            condition: None,
            effect: None,
            exclusive: false,
            exclude: Vec::new(),
            replacement: None,
            status: 0,
        }
    }

    /// True if this talent declares `other` mutually exclusive.
    pub fn excludes(&self, other: i32) -> bool {
        self.exclude.contains(&other)
    }

    pub fn info(&self) -> TalentInfo {
        TalentInfo {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            grade: self.grade,
        }
    }
}

/// Display-facing view of a talent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TalentInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub grade: i32,
}
