//! Stop conditions for wait edges.
//!
//! Every variant answers four questions: is it satisfied in a snapshot,
//! which child triggered (for disjunctions), how far along it is (a monotone
//! scalar for stuck detection), and how many ticks it expects to take at
//! given rates.
//!
//! Estimate contract: 0 with `is_satisfied` means done; 0 without means an
//! immediate boundary (inventory full, or the rated action cannot start);
//! `INF_TICKS` means unreachable at the current rates. Inventory-tracking
//! variants cap their estimates at the time to a full bank, since arrivals
//! stop once slots run out.

use crate::catalog::Catalog;
use crate::error::SimError;
use crate::goal::Goal;
use crate::interact::{SellPolicy, effective_credits};
use crate::rates::{Rates, ticks_until_inputs_depleted, ticks_until_inventory_full};
use crate::state::GlobalState;
use crate::types::{ActionId, Gp, INF_TICKS, ItemId, Skill, Ticks, Xp, ticks_for_rate};

/// Flows slower than one item per this many ticks are ignored when
/// estimating income; rarities this thin never materialise in a horizon.
const RARE_FLOW_CUTOFF_TICKS: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum WaitFor {
    /// The terminal condition.
    Goal { goal: Goal },
    SkillXp {
        skill: Skill,
        target_xp: Xp,
        reason: Option<String>,
    },
    MasteryXp { action: ActionId, target_xp: Xp },
    /// Gp-plus-liquidation reaches a target under a sell policy.
    EffectiveCredits {
        target: Gp,
        policy: SellPolicy,
        reason: String,
    },
    /// Bank occupancy reaches a fraction of capacity.
    InventoryThreshold { fraction: f64 },
    InventoryFull,
    InventoryAtLeast { item: ItemId, count: u32 },
    /// Count of `item` moves by `delta` from `start_count`.
    InventoryDelta {
        item: ItemId,
        delta: i64,
        start_count: u32,
    },
    InputsDepleted { action: ActionId },
    InputsAvailable { action: ActionId },
    /// Enough inputs banked for `target_count` completions.
    SufficientInputs {
        action: ActionId,
        target_count: u32,
    },
    AnyOf { children: Vec<WaitFor> },
}

impl WaitFor {
    pub fn any_of(children: Vec<WaitFor>) -> WaitFor {
        WaitFor::AnyOf { children }
    }

    // === TRUTH ===

    pub fn is_satisfied(&self, catalog: &Catalog, state: &GlobalState) -> bool {
        match self {
            WaitFor::Goal { goal } => goal.is_satisfied(catalog, state),
            WaitFor::SkillXp {
                skill, target_xp, ..
            } => state.skill_xp(*skill) >= *target_xp,
            WaitFor::MasteryXp { action, target_xp } => state.mastery_xp(*action) >= *target_xp,
            WaitFor::EffectiveCredits { target, policy, .. } => {
                effective_credits(catalog, state, policy) >= *target
            }
            WaitFor::InventoryThreshold { fraction } => {
                let capacity = state.bank_capacity(catalog);
                state.inventory.slots_used() as f64 >= fraction * capacity as f64
            }
            WaitFor::InventoryFull => {
                state.inventory.slots_used() >= state.bank_capacity(catalog)
            }
            WaitFor::InventoryAtLeast { item, count } => state.inventory.count_of(*item) >= *count,
            WaitFor::InventoryDelta {
                item,
                delta,
                start_count,
            } => {
                let moved = i64::from(state.inventory.count_of(*item)) - i64::from(*start_count);
                if *delta >= 0 {
                    moved >= *delta
                } else {
                    moved <= *delta
                }
            }
            WaitFor::InputsDepleted { action } => {
                completions_in_bank(catalog, state, *action) == 0
            }
            WaitFor::InputsAvailable { action } => completions_in_bank(catalog, state, *action) >= 1,
            WaitFor::SufficientInputs {
                action,
                target_count,
            } => completions_in_bank(catalog, state, *action) >= *target_count,
            WaitFor::AnyOf { children } => {
                children.iter().any(|c| c.is_satisfied(catalog, state))
            }
        }
    }

    /// The specific condition that triggered: `self` for leaves, the first
    /// satisfied child in list order for disjunctions.
    pub fn find_satisfied(&self, catalog: &Catalog, state: &GlobalState) -> Option<&WaitFor> {
        match self {
            WaitFor::AnyOf { children } => children
                .iter()
                .find_map(|c| c.find_satisfied(catalog, state)),
            _ => self.is_satisfied(catalog, state).then_some(self),
        }
    }

    // === STUCK DETECTION ===

    /// A scalar that is monotone non-decreasing while the condition is
    /// genuinely approaching satisfaction.
    pub fn progress(&self, catalog: &Catalog, state: &GlobalState) -> f64 {
        match self {
            WaitFor::Goal { goal } => -goal.remaining(catalog, state),
            WaitFor::SkillXp { skill, .. } => state.skill_xp(*skill),
            WaitFor::MasteryXp { action, .. } => state.mastery_xp(*action),
            WaitFor::EffectiveCredits { policy, .. } => {
                effective_credits(catalog, state, policy) as f64
            }
            WaitFor::InventoryThreshold { .. } | WaitFor::InventoryFull => {
                state.inventory.slots_used() as f64
            }
            WaitFor::InventoryAtLeast { item, .. } => f64::from(state.inventory.count_of(*item)),
            WaitFor::InventoryDelta { item, delta, .. } => {
                let count = f64::from(state.inventory.count_of(*item));
                if *delta >= 0 { count } else { -count }
            }
            WaitFor::InputsDepleted { action } => {
                -f64::from(completions_in_bank(catalog, state, *action))
            }
            WaitFor::InputsAvailable { action } | WaitFor::SufficientInputs { action, .. } => {
                f64::from(completions_in_bank(catalog, state, *action))
            }
            WaitFor::AnyOf { children } => children
                .iter()
                .map(|c| c.progress(catalog, state))
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }

    // === ESTIMATION ===

    pub fn estimate_ticks(&self, catalog: &Catalog, state: &GlobalState, rates: &Rates) -> Ticks {
        if self.is_satisfied(catalog, state) {
            return 0;
        }
        match self {
            WaitFor::Goal { goal } => {
                if rated_action_blocked(catalog, state, rates) {
                    return 0;
                }
                ticks_for_rate(
                    goal.remaining(catalog, state),
                    goal.progress_per_tick(catalog, rates),
                )
            }
            WaitFor::SkillXp {
                skill, target_xp, ..
            } => {
                if rated_action_blocked(catalog, state, rates) {
                    return 0;
                }
                ticks_for_rate(target_xp - state.skill_xp(*skill), rates.xp_rate(*skill))
            }
            WaitFor::MasteryXp { action, target_xp } => {
                if rated_action_blocked(catalog, state, rates) {
                    return 0;
                }
                ticks_for_rate(
                    target_xp - state.mastery_xp(*action),
                    rates.mastery_xp_per_tick,
                )
            }
            WaitFor::EffectiveCredits { target, policy, .. } => {
                if rated_action_blocked(catalog, state, rates) {
                    return 0;
                }
                let have = effective_credits(catalog, state, policy) as f64;
                ticks_for_rate(*target as f64 - have, credit_rate(catalog, rates, policy))
            }
            WaitFor::InventoryThreshold { fraction } => {
                let capacity = state.bank_capacity(catalog) as f64;
                let needed = (fraction * capacity).ceil() - state.inventory.slots_used() as f64;
                capped_by_full(
                    catalog,
                    state,
                    rates,
                    ticks_for_rate(needed, rates.item_types_per_tick),
                )
            }
            WaitFor::InventoryFull => ticks_until_inventory_full(catalog, state, rates),
            WaitFor::InventoryAtLeast { item, count } => {
                let needed = f64::from(*count) - f64::from(state.inventory.count_of(*item));
                capped_by_full(
                    catalog,
                    state,
                    rates,
                    ticks_for_rate(needed, rates.net_item_rate(*item)),
                )
            }
            WaitFor::InventoryDelta {
                item,
                delta,
                start_count,
            } => {
                let moved = i64::from(state.inventory.count_of(*item)) - i64::from(*start_count);
                let (needed, rate) = if *delta >= 0 {
                    ((*delta - moved) as f64, rates.net_item_rate(*item))
                } else {
                    ((moved - *delta) as f64, -rates.net_item_rate(*item))
                };
                capped_by_full(catalog, state, rates, ticks_for_rate(needed, rate))
            }
            WaitFor::InputsDepleted { action } => {
                ticks_until_inputs_depleted(catalog, state, rates, *action)
            }
            WaitFor::InputsAvailable { action } => {
                self.estimate_input_fill(catalog, state, rates, *action, 1)
            }
            WaitFor::SufficientInputs {
                action,
                target_count,
            } => self.estimate_input_fill(catalog, state, rates, *action, *target_count),
            WaitFor::AnyOf { children } => children
                .iter()
                .map(|c| c.estimate_ticks(catalog, state, rates))
                .min()
                .unwrap_or(INF_TICKS),
        }
    }

    /// Ticks until the bank holds inputs for `target` completions of
    /// `action`, at the given production rates.
    fn estimate_input_fill(
        &self,
        catalog: &Catalog,
        state: &GlobalState,
        rates: &Rates,
        action: ActionId,
        target: u32,
    ) -> Ticks {
        let def = catalog.action(action);
        let selection = state.recipe_selection(action);
        let mut worst: Ticks = 0;
        for (item, count) in def.inputs_for(selection) {
            let needed =
                f64::from(count * target) - f64::from(state.inventory.count_of(*item));
            let ticks = ticks_for_rate(needed, rates.net_item_rate(*item));
            worst = worst.max(ticks);
        }
        capped_by_full(catalog, state, rates, worst)
    }
}

/// Whole completions the bank can currently fund for `action`.
fn completions_in_bank(catalog: &Catalog, state: &GlobalState, action: ActionId) -> u32 {
    let def = catalog.action(action);
    let selection = state.recipe_selection(action);
    let inputs = def.inputs_for(selection);
    if inputs.is_empty() {
        return u32::MAX;
    }
    inputs
        .iter()
        .map(|(item, count)| state.inventory.count_of(*item) / count.max(&1))
        .min()
        .unwrap_or(0)
}

/// Immediate boundary: the action the rates describe can no longer run.
fn rated_action_blocked(catalog: &Catalog, state: &GlobalState, rates: &Rates) -> bool {
    let Some(action) = rates.action else {
        return false;
    };
    matches!(
        state.can_start(catalog, catalog.action(action)),
        Err(SimError::InputsMissing { .. }) | Err(SimError::NodeDepleted { .. })
    )
}

/// Arrivals stop once the bank is full; estimates never exceed that point.
fn capped_by_full(
    catalog: &Catalog,
    state: &GlobalState,
    rates: &Rates,
    estimate: Ticks,
) -> Ticks {
    estimate.min(ticks_until_inventory_full(catalog, state, rates))
}

/// Income per tick toward effective credits: direct gp plus sellable flows,
/// with rarities filtered out.
fn credit_rate(catalog: &Catalog, rates: &Rates, policy: &SellPolicy) -> f64 {
    let mut rate = rates.gp_per_tick;
    for (item, flow) in &rates.items_per_tick {
        if *flow <= 0.0 || 1.0 / *flow > RARE_FLOW_CUTOFF_TICKS {
            continue;
        }
        if policy.keeps(*item) {
            continue;
        }
        rate += flow * catalog.item(*item).sells_for as f64;
    }
    rate
}
