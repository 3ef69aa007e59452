//! Zero-tick interactions: switching activity, buying from the shop, and
//! liquidating inventory.
//!
//! Interactions are transactional: the whole mutation applies or the input
//! state is returned untouched via the error. Simulated time does not move,
//! so `updated_at` is preserved.

use std::collections::BTreeSet;

use crate::catalog::{Catalog, PurchaseEffect};
use crate::engine::{SimRng, start_action};
use crate::error::SimError;
use crate::state::GlobalState;
use crate::types::{ActionId, ItemId, PurchaseId};

// === SELL POLICIES ===

/// A concrete liquidation rule: which stacks survive a sell-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellPolicy {
    SellAll,
    SellExcept { keep: BTreeSet<ItemId> },
}

impl SellPolicy {
    pub fn keeps(&self, item: ItemId) -> bool {
        match self {
            SellPolicy::SellAll => false,
            SellPolicy::SellExcept { keep } => keep.contains(&item),
        }
    }
}

/// A stable, state-independent descriptor that instantiates to a concrete
/// [`SellPolicy`] against a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SellPolicySpec {
    SellAll,
    /// Keep every input of the currently-unlocked consuming actions.
    #[default]
    ReserveConsumingInputs,
}

impl SellPolicySpec {
    pub fn instantiate(self, catalog: &Catalog, state: &GlobalState) -> SellPolicy {
        match self {
            SellPolicySpec::SellAll => SellPolicy::SellAll,
            SellPolicySpec::ReserveConsumingInputs => {
                let mut keep = BTreeSet::new();
                for action in catalog.actions() {
                    if !action.skill.is_consuming() || !state.is_unlocked(catalog, action) {
                        continue;
                    }
                    for selection in 0..action.recipe_count() {
                        for (item, _) in action.inputs_for(selection) {
                            keep.insert(*item);
                        }
                    }
                }
                SellPolicy::SellExcept { keep }
            }
        }
    }
}

// === INTERACTIONS ===

/// A 0-tick state mutation the planner can schedule between wait edges.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    SwitchActivity { action: ActionId },
    BuyShopItem { purchase: PurchaseId },
    SellItems { policy: SellPolicy },
}

/// Apply an interaction, returning the mutated snapshot.
pub fn apply_interaction(
    catalog: &Catalog,
    state: &GlobalState,
    interaction: &Interaction,
    rng: &mut SimRng,
) -> Result<GlobalState, SimError> {
    let next = match interaction {
        Interaction::SwitchActivity { action } => switch_activity(catalog, state, *action, rng)?,
        Interaction::BuyShopItem { purchase } => buy_shop_item(catalog, state, *purchase)?,
        Interaction::SellItems { policy } => sell_items(catalog, state, policy),
    };
    debug_assert!(next.check_invariants(catalog));
    Ok(next)
}

/// Stop the current action (stun permitting) and begin another.
fn switch_activity(
    catalog: &Catalog,
    state: &GlobalState,
    action: ActionId,
    rng: &mut SimRng,
) -> Result<GlobalState, SimError> {
    if state.is_stunned() {
        return Err(SimError::Stunned);
    }
    let mut next = state.clone();
    next.active_action = None;
    start_action(catalog, &mut next, action, rng)?;
    Ok(next)
}

/// Purchase a shop entry after checking unlock, limit, and funds.
fn buy_shop_item(
    catalog: &Catalog,
    state: &GlobalState,
    purchase: PurchaseId,
) -> Result<GlobalState, SimError> {
    let def = catalog.purchase(purchase);

    if let Some((skill, level)) = def.unlock {
        if state.skill_level(catalog, skill) < level {
            return Err(SimError::RequirementsUnmet {
                what: format!("{} requires {} level {}", def.name, skill.name(), level),
            });
        }
    }
    if let Some(limit) = def.buy_limit {
        if state.shop.owned(purchase) >= limit {
            return Err(SimError::BuyLimitExceeded { purchase });
        }
    }

    let cost = def.next_cost(state.shop.bank_slots);
    if state.gp < cost {
        return Err(SimError::InsufficientGp {
            have: state.gp,
            need: cost,
        });
    }

    let mut next = state.clone();
    next.gp -= cost;
    match def.effect {
        PurchaseEffect::BankSlot => next.shop.bank_slots += 1,
        _ => *next.shop.purchased.entry(purchase).or_insert(0) += 1,
    }
    Ok(next)
}

/// Liquidate every stack the policy does not keep, in bank order.
fn sell_items(catalog: &Catalog, state: &GlobalState, policy: &SellPolicy) -> GlobalState {
    let mut next = state.clone();
    let stacks: Vec<_> = next.inventory.stacks().collect();
    for stack in stacks {
        if policy.keeps(stack.item) {
            continue;
        }
        let count = next.inventory.remove_stack(stack.item);
        next.gp += u64::from(count) * catalog.item(stack.item).sells_for;
    }
    next
}

/// Gp plus the liquidation value of every stack the policy would sell: the
/// planner's "can afford" metric.
pub fn effective_credits(catalog: &Catalog, state: &GlobalState, policy: &SellPolicy) -> u64 {
    let sellable: u64 = state
        .inventory
        .stacks()
        .filter(|stack| !policy.keeps(stack.item))
        .map(|stack| u64::from(stack.count) * catalog.item(stack.item).sells_for)
        .sum();
    state.gp + sellable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::state::GlobalState;

    #[test]
    fn test_switch_activity_requires_inputs() {
        let catalog = default_catalog();
        let mut rng = SimRng::from_seed(1);
        let state = GlobalState::empty(&catalog);
        let burn = catalog.action_by_name("Burn Normal Logs").unwrap();

        let err = apply_interaction(
            &catalog,
            &state,
            &Interaction::SwitchActivity { action: burn },
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InputsMissing { .. }));
    }

    #[test]
    fn test_switch_activity_blocked_while_stunned() {
        let catalog = default_catalog();
        let mut rng = SimRng::from_seed(1);
        let mut state = GlobalState::empty(&catalog);
        state.stun_remaining = 10;
        let tree = catalog.action_by_name("Normal Tree").unwrap();

        let err = apply_interaction(
            &catalog,
            &state,
            &Interaction::SwitchActivity { action: tree },
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, SimError::Stunned);
    }

    #[test]
    fn test_buy_bank_slot_walks_the_curve() {
        let catalog = default_catalog();
        let mut rng = SimRng::from_seed(1);
        let slot = catalog.purchase_by_name("Extra Bank Slot").unwrap();

        let mut state = GlobalState::empty(&catalog);
        state.gp = 34 + 59;
        let buy = Interaction::BuyShopItem { purchase: slot };

        state = apply_interaction(&catalog, &state, &buy, &mut rng).unwrap();
        assert_eq!(state.shop.bank_slots, 1);
        assert_eq!(state.gp, 59);
        state = apply_interaction(&catalog, &state, &buy, &mut rng).unwrap();
        assert_eq!(state.shop.bank_slots, 2);
        assert_eq!(state.gp, 0);

        let err = apply_interaction(&catalog, &state, &buy, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::InsufficientGp { need: 89, .. }));
    }

    #[test]
    fn test_buy_limit_and_unlock() {
        let catalog = default_catalog();
        let mut rng = SimRng::from_seed(1);
        let axe = catalog.purchase_by_name("Iron Axe").unwrap();
        let steel = catalog.purchase_by_name("Steel Axe").unwrap();

        let mut state = GlobalState::empty(&catalog);
        state.gp = 10_000;

        let buy_axe = Interaction::BuyShopItem { purchase: axe };
        state = apply_interaction(&catalog, &state, &buy_axe, &mut rng).unwrap();
        let err = apply_interaction(&catalog, &state, &buy_axe, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::BuyLimitExceeded { .. }));

        let err = apply_interaction(
            &catalog,
            &state,
            &Interaction::BuyShopItem { purchase: steel },
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::RequirementsUnmet { .. }));
    }

    #[test]
    fn test_sell_all_empties_bank() {
        let catalog = default_catalog();
        let mut rng = SimRng::from_seed(1);
        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let nest = catalog.item_by_name("Bird Nest").unwrap();

        let mut state = GlobalState::empty(&catalog);
        state.inventory.add(logs, 10, 12).unwrap();
        state.inventory.add(nest, 2, 12).unwrap();

        let next = apply_interaction(
            &catalog,
            &state,
            &Interaction::SellItems {
                policy: SellPolicy::SellAll,
            },
            &mut rng,
        )
        .unwrap();
        assert!(next.inventory.is_empty());
        assert_eq!(next.gp, 10 + 2 * 350);
    }

    #[test]
    fn test_reserve_consuming_inputs_spec() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let policy = SellPolicySpec::ReserveConsumingInputs.instantiate(&catalog, &state);

        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let shrimp = catalog.item_by_name("Raw Shrimp").unwrap();
        let nest = catalog.item_by_name("Bird Nest").unwrap();
        let oak = catalog.item_by_name("Oak Logs").unwrap();

        // Level-1 consuming actions: Burn Normal Logs, Basic Fire (shrimp
        // and trout recipes), Bronze Bar. Oak burning is locked at level 1.
        assert!(policy.keeps(logs));
        assert!(policy.keeps(shrimp));
        assert!(!policy.keeps(nest));
        assert!(!policy.keeps(oak));
    }

    #[test]
    fn test_effective_credits_counts_sellable_stacks() {
        let catalog = default_catalog();
        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let nest = catalog.item_by_name("Bird Nest").unwrap();

        let mut state = GlobalState::empty(&catalog);
        state.gp = 25;
        state.inventory.add(logs, 5, 12).unwrap();
        state.inventory.add(nest, 1, 12).unwrap();

        let reserve = SellPolicySpec::ReserveConsumingInputs.instantiate(&catalog, &state);
        assert_eq!(effective_credits(&catalog, &state, &reserve), 25 + 350);
        assert_eq!(
            effective_credits(&catalog, &state, &SellPolicy::SellAll),
            25 + 5 + 350
        );
    }
}
