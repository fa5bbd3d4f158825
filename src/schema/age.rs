/// One weighted entry in an age's event pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEntry {
    pub event_id: i32,
    pub weight: f64,
}

/// Configuration for a single year of life.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgeSlot {
    pub age: i32,
    /// Talents that join the active set at this age.
    pub talents: Vec<i32>,
    pub pool: Vec<PoolEntry>,
}
