//! The change log emitted by the tick engine, and the time-away envelope
//! wrapped around it when the host resumes after an absence.

use std::collections::HashMap;

use crate::types::{ActionId, ItemId, Level, Skill, Ticks, Xp};

/// Why a scheduled consume returned before its tick budget was spent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopCause {
    /// The active action could not consume its inputs.
    InputsMissing { action: ActionId, item: ItemId },
    /// A deterministic output could not be placed.
    InventoryFull { item: ItemId },
    /// The mining node is depleted and its respawn outlasts the budget.
    NodeDepleted { action: ActionId },
    /// No active action to advance.
    Idle,
}

/// A level-up window for one skill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelChange {
    pub start_level: Level,
    pub end_level: Level,
}

/// Everything a run of the tick engine did to the state.
///
/// Counts merge additively; level-up windows coalesce to the earliest start
/// and latest end per skill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    pub inventory_delta: HashMap<ItemId, i64>,
    pub skill_xp_delta: HashMap<Skill, Xp>,
    pub dropped_items: HashMap<ItemId, u64>,
    pub level_ups: HashMap<Skill, LevelChange>,
    pub gp_delta: i64,
    pub deaths: u32,
    pub ticks_advanced: Ticks,
    pub stop: Option<StopCause>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.inventory_delta.is_empty()
            && self.skill_xp_delta.is_empty()
            && self.dropped_items.is_empty()
            && self.level_ups.is_empty()
            && self.gp_delta == 0
            && self.deaths == 0
    }

    pub fn record_item(&mut self, item: ItemId, delta: i64) {
        if delta == 0 {
            return;
        }
        *self.inventory_delta.entry(item).or_insert(0) += delta;
        if delta > 0 {
            *self.dropped_items.entry(item).or_insert(0) += delta as u64;
        }
    }

    pub fn record_xp(&mut self, skill: Skill, xp: Xp) {
        if xp != 0.0 {
            *self.skill_xp_delta.entry(skill).or_insert(0.0) += xp;
        }
    }

    pub fn record_level_up(&mut self, skill: Skill, start_level: Level, end_level: Level) {
        self.level_ups
            .entry(skill)
            .and_modify(|w| {
                w.start_level = w.start_level.min(start_level);
                w.end_level = w.end_level.max(end_level);
            })
            .or_insert(LevelChange {
                start_level,
                end_level,
            });
    }

    /// Fold `other` into `self`. Counts are commutative; level windows keep
    /// the widest span; the later stop cause wins.
    pub fn merge(&mut self, other: &Changes) {
        for (item, delta) in &other.inventory_delta {
            *self.inventory_delta.entry(*item).or_insert(0) += delta;
        }
        for (skill, xp) in &other.skill_xp_delta {
            *self.skill_xp_delta.entry(*skill).or_insert(0.0) += xp;
        }
        for (item, count) in &other.dropped_items {
            *self.dropped_items.entry(*item).or_insert(0) += count;
        }
        for (skill, window) in &other.level_ups {
            self.record_level_up(*skill, window.start_level, window.end_level);
        }
        self.gp_delta += other.gp_delta;
        self.deaths += other.deaths;
        self.ticks_advanced += other.ticks_advanced;
        if other.stop.is_some() {
            self.stop = other.stop;
        }
    }
}

/// The envelope reported to the player after an absence: the wall-clock
/// window, the skill that was active, and the merged changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAway {
    /// Epoch milliseconds.
    pub start_time: u64,
    pub end_time: u64,
    pub active_skill: Option<Skill>,
    pub changes: Changes,
}

impl TimeAway {
    /// Merge a later envelope into this one: the window is the min/max of
    /// both, changes fold additively.
    pub fn merge(&mut self, other: &TimeAway) {
        self.start_time = self.start_time.min(other.start_time);
        self.end_time = self.end_time.max(other.end_time);
        if other.active_skill.is_some() {
            self.active_skill = other.active_skill;
        }
        self.changes.merge(&other.changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGS: ItemId = ItemId(0);

    #[test]
    fn test_record_item_tracks_drops_separately() {
        let mut c = Changes::default();
        c.record_item(LOGS, 5);
        c.record_item(LOGS, -2);
        assert_eq!(c.inventory_delta[&LOGS], 3);
        assert_eq!(c.dropped_items[&LOGS], 5);
    }

    #[test]
    fn test_level_window_coalesces() {
        let mut c = Changes::default();
        c.record_level_up(Skill::Woodcutting, 3, 4);
        c.record_level_up(Skill::Woodcutting, 1, 2);
        c.record_level_up(Skill::Woodcutting, 5, 7);
        let w = c.level_ups[&Skill::Woodcutting];
        assert_eq!((w.start_level, w.end_level), (1, 7));
    }

    #[test]
    fn test_merge_widens_time_window() {
        let early = TimeAway {
            start_time: 1_000,
            end_time: 2_000,
            active_skill: Some(Skill::Fishing),
            changes: Changes::default(),
        };
        let mut late = TimeAway {
            start_time: 1_500,
            end_time: 9_000,
            active_skill: None,
            changes: Changes::default(),
        };
        late.merge(&early);
        assert_eq!(late.start_time, 1_000);
        assert_eq!(late.end_time, 9_000);
        assert_eq!(late.active_skill, Some(Skill::Fishing));
    }

    #[test]
    fn test_changes_merge_is_additive() {
        let mut a = Changes::default();
        a.record_item(LOGS, 2);
        a.record_xp(Skill::Woodcutting, 20.0);
        a.gp_delta = 10;

        let mut b = Changes::default();
        b.record_item(LOGS, 3);
        b.record_xp(Skill::Woodcutting, 30.0);
        b.gp_delta = -4;
        b.ticks_advanced = 50;

        a.merge(&b);
        assert_eq!(a.inventory_delta[&LOGS], 5);
        assert_eq!(a.skill_xp_delta[&Skill::Woodcutting], 50.0);
        assert_eq!(a.gp_delta, 6);
        assert_eq!(a.ticks_advanced, 50);
    }
}
