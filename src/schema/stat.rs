use serde::{Deserialize, Serialize};

/// A tracked numeric property of a simulated life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    Charm,
    Intelligence,
    Strength,
    Money,
    Spirit,
    Life,
    Age,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Charm,
        Stat::Intelligence,
        Stat::Strength,
        Stat::Money,
        Stat::Spirit,
        Stat::Life,
        Stat::Age,
    ];

    /// The five stats that feed the aggregate score and the `RDM` effect.
    pub const CORE: [Stat; 5] = [
        Stat::Charm,
        Stat::Intelligence,
        Stat::Strength,
        Stat::Money,
        Stat::Spirit,
    ];

    /// Stats judged in the summary, in display order.
    pub const JUDGED: [Stat; 6] = [
        Stat::Charm,
        Stat::Intelligence,
        Stat::Strength,
        Stat::Money,
        Stat::Spirit,
        Stat::Age,
    ];

    /// Three-letter code used by configuration and conditions (e.g. "CHR").
    pub fn code(&self) -> &'static str {
        match self {
            Self::Charm => "CHR",
            Self::Intelligence => "INT",
            Self::Strength => "STR",
            Self::Money => "MNY",
            Self::Spirit => "SPR",
            Self::Life => "LIF",
            Self::Age => "AGE",
        }
    }

    pub fn from_code(code: &str) -> Option<Stat> {
        match code {
            "CHR" => Some(Self::Charm),
            "INT" => Some(Self::Intelligence),
            "STR" => Some(Self::Strength),
            "MNY" => Some(Self::Money),
            "SPR" => Some(Self::Spirit),
            "LIF" => Some(Self::Life),
            "AGE" => Some(Self::Age),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A delta applied to a property state by a talent or an event.
///
/// `random` is applied to one core stat chosen at application time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(default, rename = "CHR")]
    pub charm: i32,
    #[serde(default, rename = "INT")]
    pub intelligence: i32,
    #[serde(default, rename = "STR")]
    pub strength: i32,
    #[serde(default, rename = "MNY")]
    pub money: i32,
    #[serde(default, rename = "SPR")]
    pub spirit: i32,
    #[serde(default, rename = "LIF")]
    pub life: i32,
    #[serde(default, rename = "AGE")]
    pub age: i32,
    #[serde(default, rename = "RDM")]
    pub random: i32,
}

impl Effect {
    pub fn delta(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Charm => self.charm,
            Stat::Intelligence => self.intelligence,
            Stat::Strength => self.strength,
            Stat::Money => self.money,
            Stat::Spirit => self.spirit,
            Stat::Life => self.life,
            Stat::Age => self.age,
        }
    }

    pub fn is_empty(&self) -> bool {
        Stat::ALL.iter().all(|s| self.delta(*s) == 0) && self.random == 0
    }
}
