//! Segment boundary taxonomy and materiality.

use crate::error::SimError;
use crate::types::{ActionId, Level, PurchaseId, Skill, Ticks};

use super::candidates::Candidates;

/// Why a segment (planned or executing) ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentBoundary {
    GoalReached,
    InventoryFull,
    /// Bank occupancy crossed the configured pressure threshold.
    InventoryPressure,
    /// The horizon cap was reached as planned.
    PlannedSegmentStop,
    /// A watched upgrade became affordable (possibly earlier than planned).
    UpgradeAffordable { purchase: PurchaseId },
    /// A watched skill crossed a watched unlock level.
    UnlockObserved { skill: Skill, level: Level },
    InputsDepleted { action: ActionId },
    /// The wait's own condition fired; the normal, non-material case.
    WaitConditionSatisfied,
    /// A wait (plus overtime) expired without its condition firing: the
    /// expected rates diverged badly from reality.
    WaitExpired,
    /// The player died and restarted; absorbed by the death cycle.
    Death,
    DeadEnd,
    BudgetExceeded,
    /// An interaction failed during execution.
    Error { error: SimError },
}

impl SegmentBoundary {
    /// Material boundaries interrupt execution and go back to the solver;
    /// the rest are absorbed.
    pub fn is_material(&self, candidates: &Candidates) -> bool {
        match self {
            SegmentBoundary::GoalReached
            | SegmentBoundary::InventoryFull
            | SegmentBoundary::InventoryPressure
            | SegmentBoundary::PlannedSegmentStop
            | SegmentBoundary::InputsDepleted { .. }
            | SegmentBoundary::DeadEnd
            | SegmentBoundary::BudgetExceeded
            | SegmentBoundary::WaitExpired
            | SegmentBoundary::Error { .. } => true,
            // Only competitive upgrades may force a replan; merely watched
            // ones inform wait times.
            SegmentBoundary::UpgradeAffordable { purchase } => {
                candidates.buy_upgrades.contains(purchase)
            }
            SegmentBoundary::UnlockObserved { skill, .. } => {
                candidates.watch.watches_skill(*skill)
            }
            SegmentBoundary::WaitConditionSatisfied | SegmentBoundary::Death => false,
        }
    }
}

/// A structured divergence report from plan execution: where the plan broke
/// and why, so the solver can replan incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplanBoundary {
    pub boundary: SegmentBoundary,
    /// Index of the plan step that was executing.
    pub at_step: usize,
    /// Simulated ticks spent inside the plan before the boundary.
    pub ticks_into_plan: Ticks,
}
