//! The skill experience curve.
//!
//! Levels follow the classic idle-RPG table: the cost of level `l` grows as
//! `floor(l + 300 * 2^(l/7))`, summed and quartered. Mastery curves share the
//! same shape, so both are instances of [`XpTable`].

use crate::types::{Level, Xp};

/// Cumulative xp thresholds. `cumulative[l - 1]` is the xp at which level `l`
/// begins; `cumulative[0]` is always 0.
#[derive(Debug, Clone)]
pub struct XpTable {
    cumulative: Vec<Xp>,
}

/// Position within the current level, for progress bars and rate math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpProgress {
    pub level: Level,
    /// Fraction of the current level completed, in [0, 1].
    pub progress: f64,
    pub xp_into_level: Xp,
    /// Xp span of the current level; 0 at the table cap.
    pub xp_for_level: Xp,
}

impl XpTable {
    /// Build the standard curve up to `max_level`.
    pub fn standard(max_level: Level) -> Self {
        let mut cumulative = Vec::with_capacity(max_level as usize);
        let mut acc: f64 = 0.0;
        cumulative.push(0.0);
        for level in 1..max_level as u64 {
            acc += (level as f64 + 300.0 * 2f64.powf(level as f64 / 7.0)).floor();
            cumulative.push((acc / 4.0).floor());
        }
        Self { cumulative }
    }

    /// Maximum level is the table length.
    pub fn max_level(&self) -> Level {
        self.cumulative.len() as Level
    }

    /// Greatest level `L` with `cumulative[L - 1] <= xp`.
    pub fn level_for_xp(&self, xp: Xp) -> Level {
        match self
            .cumulative
            .partition_point(|threshold| *threshold <= xp)
        {
            0 => 1, // negative xp clamps to level 1
            n => n as Level,
        }
    }

    /// Xp at which `level` begins. Levels outside the table clamp.
    pub fn start_xp_for_level(&self, level: Level) -> Xp {
        let idx = (level.clamp(1, self.max_level()) - 1) as usize;
        self.cumulative[idx]
    }

    /// Remaining xp from `xp` until `level` begins; 0 if already there.
    pub fn xp_until_level(&self, xp: Xp, level: Level) -> Xp {
        (self.start_xp_for_level(level) - xp).max(0.0)
    }

    /// Progress through the current level.
    pub fn xp_progress_for_xp(&self, xp: Xp) -> XpProgress {
        let xp = xp.max(0.0);
        let level = self.level_for_xp(xp);
        if level >= self.max_level() {
            return XpProgress {
                level,
                progress: 1.0,
                xp_into_level: xp - self.start_xp_for_level(level),
                xp_for_level: 0.0,
            };
        }
        let start = self.start_xp_for_level(level);
        let end = self.start_xp_for_level(level + 1);
        let span = end - start;
        XpProgress {
            level,
            progress: ((xp - start) / span).clamp(0.0, 1.0),
            xp_into_level: xp - start,
            xp_for_level: span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_thresholds() {
        let table = XpTable::standard(99);
        assert_eq!(table.start_xp_for_level(1), 0.0);
        assert_eq!(table.start_xp_for_level(2), 83.0);
        assert_eq!(table.start_xp_for_level(3), 174.0);
        assert_eq!(table.start_xp_for_level(4), 276.0);
        assert_eq!(table.start_xp_for_level(10), 1154.0);
    }

    #[test]
    fn test_level_for_xp_round_trip() {
        let table = XpTable::standard(99);
        for level in 1..=99 {
            let xp = table.start_xp_for_level(level);
            assert_eq!(
                table.level_for_xp(xp),
                level,
                "level_for_xp(start_xp_for_level({level}))"
            );
            // One xp short of the threshold is still the previous level.
            if level > 1 {
                assert_eq!(table.level_for_xp(xp - 1.0), level - 1);
            }
        }
    }

    #[test]
    fn test_progress_in_unit_interval() {
        let table = XpTable::standard(99);
        let mut xp = 0.0;
        while xp <= 100_000.0 {
            let p = table.xp_progress_for_xp(xp);
            assert!(
                (0.0..=1.0).contains(&p.progress),
                "progress {} out of range at xp {}",
                p.progress,
                xp
            );
            xp += 100.0;
        }
    }

    #[test]
    fn test_negative_xp_clamps() {
        let table = XpTable::standard(99);
        assert_eq!(table.level_for_xp(-10.0), 1);
    }
}
