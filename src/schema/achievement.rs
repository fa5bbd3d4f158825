use serde::Serialize;

use crate::core::condition::Condition;

/// The checkpoint at which an achievement's condition is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opportunity {
    /// Once, after talents are resolved and before the first year.
    Start,
    /// After every simulated year.
    Trajectory,
    /// Once, after the life has ended.
    Summary,
}

impl Opportunity {
    pub fn parse(tag: &str) -> Option<Opportunity> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "START" => Some(Self::Start),
            "TRAJECTORY" => Some(Self::Trajectory),
            "SUMMARY" | "END" => Some(Self::Summary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub grade: i32,
    /// `None` for unrecognised tags; such achievements are never checked.
    pub opportunity: Option<Opportunity>,
    pub condition: Condition,
}

impl Achievement {
    pub fn info(&self) -> AchievementInfo {
        AchievementInfo {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            grade: self.grade,
        }
    }
}

/// Display-facing view of an unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub grade: i32,
}
