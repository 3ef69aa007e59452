// Core ID types, skills, and tick arithmetic

use serde::{Deserialize, Serialize};

// === TYPE ALIASES ===

pub type Ticks = u64;
pub type Gp = u64;
pub type Xp = f64;
pub type Level = u32;

/// Sentinel: no progress toward a condition is possible at current rates.
pub const INF_TICKS: Ticks = Ticks::MAX;

/// One simulated tick is 100 ms of wall-clock time.
pub const TICK_DURATION_MS: u64 = 100;

/// Convert a wall-clock duration in milliseconds into whole ticks.
pub fn ticks_from_duration_ms(duration_ms: u64) -> Ticks {
    duration_ms / TICK_DURATION_MS
}

/// Convert whole ticks to seconds of simulated time.
pub fn ticks_to_seconds(ticks: Ticks) -> f64 {
    ticks as f64 * TICK_DURATION_MS as f64 / 1000.0
}

// === NEWTYPE IDS ===
//
// Catalog ids are dense u32 indices interned at catalog build time. The JSON
// boundary speaks display names; everything inside the engine speaks ids.

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl ItemId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl ActionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PurchaseId(pub u32);

impl PurchaseId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// === SKILLS ===

/// Enumerated skill identity. Consuming skills require item inputs to train;
/// trainable skills can be the subject of a level goal.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Skill {
    Woodcutting,
    Fishing,
    Mining,
    Firemaking,
    Cooking,
    Smithing,
    Thieving,
    Attack,
}

impl Skill {
    /// Returns an iterator over all skills.
    pub fn all() -> impl Iterator<Item = Skill> {
        [
            Skill::Woodcutting,
            Skill::Fishing,
            Skill::Mining,
            Skill::Firemaking,
            Skill::Cooking,
            Skill::Smithing,
            Skill::Thieving,
            Skill::Attack,
        ]
        .into_iter()
    }

    /// Does training this skill consume item inputs?
    pub fn is_consuming(self) -> bool {
        matches!(self, Skill::Firemaking | Skill::Cooking | Skill::Smithing)
    }

    /// Can a goal target this skill directly?
    pub fn is_trainable(self) -> bool {
        true
    }

    pub fn name(self) -> &'static str {
        match self {
            Skill::Woodcutting => "Woodcutting",
            Skill::Fishing => "Fishing",
            Skill::Mining => "Mining",
            Skill::Firemaking => "Firemaking",
            Skill::Cooking => "Cooking",
            Skill::Smithing => "Smithing",
            Skill::Thieving => "Thieving",
            Skill::Attack => "Attack",
        }
    }

    pub fn from_name(name: &str) -> Option<Skill> {
        Skill::all().find(|s| s.name() == name)
    }
}

// === TICK ARITHMETIC ===

/// Add two tick counts, treating `INF_TICKS` as absorbing.
pub fn ticks_add(a: Ticks, b: Ticks) -> Ticks {
    if a == INF_TICKS || b == INF_TICKS {
        INF_TICKS
    } else {
        a.saturating_add(b)
    }
}

/// Ticks needed to accumulate `needed` units at `rate` units/tick.
///
/// Returns 0 when `needed <= 0` (already satisfied) and `INF_TICKS` when the
/// rate is non-positive.
pub fn ticks_for_rate(needed: f64, rate: f64) -> Ticks {
    if needed <= 0.0 {
        return 0;
    }
    if rate <= 0.0 {
        return INF_TICKS;
    }
    let ticks = (needed / rate).ceil();
    if ticks >= INF_TICKS as f64 {
        INF_TICKS
    } else {
        ticks as Ticks
    }
}
