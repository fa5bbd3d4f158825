use crate::core::condition::Condition;
use crate::schema::stat::Effect;

/// A narrative event that may fire during a year.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i32,
    pub text: String,
    pub grade: i32,
    /// Fires outside the weighted draw whenever it is eligible.
    pub no_random: bool,
    /// Must hold for the event to be eligible.
    pub include: Option<Condition>,
    /// Must not hold for the event to be eligible.
    pub exclude: Option<Condition>,
    pub effect: Option<Effect>,
    pub branches: Vec<Branch>,
    pub post_event: Option<PostEvent>,
    /// Ends the life when fired.
    pub terminal: bool,
}

/// A conditional follow-up, checked against the post-effect state.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Condition,
    pub event_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostEvent {
    /// Another event fired in the same step.
    Event(i32),
    /// Narrative text appended to the parent's text.
    Text(String),
}

impl Event {
    pub fn new(id: i32, text: &str) -> Self {
        Event {
            id,
            text: text.to_string(),
            grade: 0,
            no_random: false,
            include: None,
            exclude: None,
            effect: None,
            branches: Vec::new(),
            post_event: None,
            terminal: false,
        }
    }

    /// Whether the include/exclude filters admit this event right now.
    pub fn is_eligible(&self, vars: &dyn crate::core::condition::Variables) -> bool {
        if let Some(ref exclude) = self.exclude {
            if exclude.check(vars) {
                return false;
            }
        }
        match self.include {
            Some(ref include) => include.check(vars),
            None => true,
        }
    }
}
