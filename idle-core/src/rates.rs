//! Expected per-tick flows for a candidate or active action, and the derived
//! time predicates the planner steers by.
//!
//! Everything here is expectation arithmetic over the catalog tables; the
//! tick engine is the ground truth these estimates approximate.

use std::collections::HashMap;

use crate::catalog::{ActionDef, ActionKind, Catalog, DEATH_RESTART_TICKS};
use crate::state::GlobalState;
use crate::types::{ActionId, INF_TICKS, ItemId, Level, Skill, Ticks, ticks_for_rate};

/// Expected flows per tick for one action.
#[derive(Debug, Clone, Default)]
pub struct Rates {
    pub action: Option<ActionId>,
    /// Gp granted directly by the action (thieving gold, combat drops).
    pub gp_per_tick: f64,
    pub items_per_tick: HashMap<ItemId, f64>,
    pub items_consumed_per_tick: HashMap<ItemId, f64>,
    pub xp_per_tick: HashMap<Skill, f64>,
    /// Expected new inventory slots claimed per tick.
    pub item_types_per_tick: f64,
    pub hp_loss_per_tick: f64,
    pub mastery_xp_per_tick: f64,
}

impl Rates {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn xp_rate(&self, skill: Skill) -> f64 {
        self.xp_per_tick.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn item_rate(&self, item: ItemId) -> f64 {
        self.items_per_tick.get(&item).copied().unwrap_or(0.0)
    }

    pub fn consumption_rate(&self, item: ItemId) -> f64 {
        self.items_consumed_per_tick
            .get(&item)
            .copied()
            .unwrap_or(0.0)
    }

    /// Net flow for an item: production minus consumption.
    pub fn net_item_rate(&self, item: ItemId) -> f64 {
        self.item_rate(item) - self.consumption_rate(item)
    }

    /// Expected gp per tick when every produced stack is eventually sold.
    pub fn sellable_gp_per_tick(&self, catalog: &Catalog) -> f64 {
        self.gp_per_tick
            + self
                .items_per_tick
                .iter()
                .map(|(item, rate)| rate * catalog.item(*item).sells_for as f64)
                .sum::<f64>()
    }
}

/// Expected flows for `action` as performed from `state`.
pub fn estimate_rates(catalog: &Catalog, state: &GlobalState, action: ActionId) -> Rates {
    let def = catalog.action(action);
    match &def.kind {
        ActionKind::Combat(_) => combat_rates(catalog, state, def),
        ActionKind::Thieving(_) => thieving_rates(catalog, state, def),
        ActionKind::Skill => skill_rates(catalog, state, def),
    }
}

/// Rates for the active action, or idle rates when nothing runs.
pub fn active_rates(catalog: &Catalog, state: &GlobalState) -> Rates {
    match state.active_action {
        Some(active) => estimate_rates(catalog, state, active.action),
        None => Rates::idle(),
    }
}

fn skill_rates(catalog: &Catalog, state: &GlobalState, def: &ActionDef) -> Rates {
    let eff_ticks = state.effective_mean_ticks(catalog, def);
    let mut rates = base_completion_rates(catalog, state, def, eff_ticks, 1.0);
    rates.mastery_xp_per_tick = mastery_per_completion(catalog, state, def) / eff_ticks;
    rates
}

fn thieving_rates(catalog: &Catalog, state: &GlobalState, def: &ActionDef) -> Rates {
    let ActionKind::Thieving(spec) = &def.kind else {
        unreachable!("thieving_rates called for a non-thieving action");
    };
    let p = state.thieving_success_chance(catalog, spec.perception);
    let failure = 1.0 - p;
    // A failed attempt stuns; the average attempt is longer than its roll.
    let attempt_ticks = state.effective_mean_ticks(catalog, def);
    let eff_ticks = attempt_ticks + failure * spec.stun_ticks as f64;

    let mut rates = base_completion_rates(catalog, state, def, eff_ticks, p);
    rates.gp_per_tick = p * (1.0 + spec.max_gold as f64) / 2.0 / eff_ticks;
    rates.hp_loss_per_tick = failure * (1.0 + spec.max_hit as f64) / 2.0 / eff_ticks;
    rates.mastery_xp_per_tick = p * mastery_per_completion(catalog, state, def) / eff_ticks;
    rates
}

fn combat_rates(catalog: &Catalog, state: &GlobalState, def: &ActionDef) -> Rates {
    let ActionKind::Combat(spec) = &def.kind else {
        unreachable!("combat_rates called for a non-combat action");
    };
    let avg_hit = (1.0 + spec.max_hit as f64) / 2.0;
    let swings_per_kill = (spec.monster_hp as f64 / avg_hit).ceil();
    let kill_ticks = swings_per_kill * spec.attack_speed as f64;
    let cycle_ticks = kill_ticks + spec.respawn_ticks as f64;

    let mut rates = Rates {
        action: Some(def.id),
        ..Rates::default()
    };
    rates.gp_per_tick = (spec.gp_min + spec.gp_max) as f64 / 2.0 / cycle_ticks;
    for drop in &spec.drops {
        *rates.items_per_tick.entry(drop.item).or_insert(0.0) +=
            drop.expected_items() / cycle_ticks;
        if state.inventory.needs_slot(drop.item) {
            rates.item_types_per_tick += drop.rate.min(1.0) / cycle_ticks;
        }
    }
    rates.xp_per_tick.insert(def.skill, def.xp / cycle_ticks);
    rates.mastery_xp_per_tick = mastery_per_completion(catalog, state, def) / cycle_ticks;

    // Incoming damage only flows while the monster is up.
    let uptime = kill_ticks / cycle_ticks;
    let avg_incoming = (1.0 + spec.monster_max_hit as f64) / 2.0 * (1.0 - spec.damage_reduction);
    rates.hp_loss_per_tick = avg_incoming / spec.monster_attack_speed as f64 * uptime;
    rates
}

/// Shared completion arithmetic: drops, consumption, xp, and slot pressure,
/// scaled by a per-completion success probability.
fn base_completion_rates(
    catalog: &Catalog,
    state: &GlobalState,
    def: &ActionDef,
    eff_ticks: f64,
    success: f64,
) -> Rates {
    let selection = state.recipe_selection(def.id);
    let level = state.skill_level(catalog, def.skill);
    let doubling = 1.0 + state.doubling_chance(catalog, def.skill);

    let mut rates = Rates {
        action: Some(def.id),
        ..Rates::default()
    };

    let mut type_chance: HashMap<ItemId, f64> = HashMap::new();
    for drop in catalog.all_drops_for_action(def, selection, level) {
        let per_tick = drop.expected_items() * doubling * success / eff_ticks;
        *rates.items_per_tick.entry(drop.item).or_insert(0.0) += per_tick;
        if state.inventory.needs_slot(drop.item) {
            let miss = type_chance.entry(drop.item).or_insert(1.0);
            *miss *= 1.0 - drop.rate.min(1.0);
        }
    }
    rates.item_types_per_tick = type_chance
        .values()
        .map(|miss| (1.0 - miss) * success / eff_ticks)
        .sum();

    for (item, count) in def.inputs_for(selection) {
        *rates
            .items_consumed_per_tick
            .entry(*item)
            .or_insert(0.0) += f64::from(*count) * success / eff_ticks;
    }

    rates
        .xp_per_tick
        .insert(def.skill, def.xp * success / eff_ticks);
    rates
}

fn mastery_per_completion(catalog: &Catalog, state: &GlobalState, def: &ActionDef) -> f64 {
    let mastery_level = state.mastery_level(catalog, def.id) as f64;
    let total_in_skill = catalog.actions_in_skill(def.skill) as f64;
    let bonus = state.mastery_bonus(catalog, def.skill);
    (mastery_level * (total_in_skill / 10.0) * def.duration.mean_seconds() * 0.5 * (1.0 + bonus))
        .floor()
        .max(1.0)
}

/// Long-run average for hazardous activities: flows are scaled by the share
/// of time spent alive, hp loss stays raw so death prediction still works.
pub fn death_cycle_adjusted_rates(state: &GlobalState, rates: &Rates) -> Rates {
    if rates.hp_loss_per_tick <= 0.0 {
        return rates.clone();
    }
    let ticks_to_death = state.hp as f64 / rates.hp_loss_per_tick;
    let factor = ticks_to_death / (ticks_to_death + DEATH_RESTART_TICKS as f64);

    let mut adjusted = rates.clone();
    adjusted.gp_per_tick *= factor;
    adjusted.mastery_xp_per_tick *= factor;
    adjusted.item_types_per_tick *= factor;
    for rate in adjusted.items_per_tick.values_mut() {
        *rate *= factor;
    }
    for rate in adjusted.items_consumed_per_tick.values_mut() {
        *rate *= factor;
    }
    for rate in adjusted.xp_per_tick.values_mut() {
        *rate *= factor;
    }
    adjusted
}

// === DERIVED PREDICATES ===
//
// All return 0 when already satisfied and `INF_TICKS` when unreachable at
// the given rates.

pub fn ticks_until_death(state: &GlobalState, rates: &Rates) -> Ticks {
    if state.hp == 0 {
        return 0;
    }
    ticks_for_rate(state.hp as f64, rates.hp_loss_per_tick)
}

pub fn ticks_until_skill_xp(
    state: &GlobalState,
    rates: &Rates,
    skill: Skill,
    target_xp: f64,
) -> Ticks {
    ticks_for_rate(target_xp - state.skill_xp(skill), rates.xp_rate(skill))
}

pub fn ticks_until_next_skill_level(
    catalog: &Catalog,
    state: &GlobalState,
    rates: &Rates,
    skill: Skill,
) -> Ticks {
    let level = state.skill_level(catalog, skill);
    if level >= catalog.xp_table().max_level() {
        return INF_TICKS;
    }
    let target = catalog.xp_table().start_xp_for_level(level + 1);
    ticks_until_skill_xp(state, rates, skill, target)
}

/// Mastery boundaries only steer thieving decisions (success chance moves
/// with mastery); for every other skill the next mastery level is noise.
pub fn ticks_until_next_mastery_level(
    catalog: &Catalog,
    state: &GlobalState,
    rates: &Rates,
    action: ActionId,
) -> Ticks {
    let def = catalog.action(action);
    if !def.is_thieving() {
        return INF_TICKS;
    }
    let level = state.mastery_level(catalog, action);
    if level >= catalog.mastery_table().max_level() {
        return INF_TICKS;
    }
    let target = catalog.mastery_table().start_xp_for_level(level + 1);
    ticks_for_rate(target - state.mastery_xp(action), rates.mastery_xp_per_tick)
}

pub fn ticks_until_inventory_full(catalog: &Catalog, state: &GlobalState, rates: &Rates) -> Ticks {
    let capacity = state.bank_capacity(catalog);
    let free = capacity.saturating_sub(state.inventory.slots_used());
    if free == 0 {
        return 0;
    }
    if rates.item_types_per_tick <= 0.0 {
        return INF_TICKS;
    }
    (free as f64 / rates.item_types_per_tick).floor() as Ticks
}

/// Ticks until the action can no longer consume its inputs. Counts whole
/// completions; 0 means the next completion already cannot run.
pub fn ticks_until_inputs_depleted(
    catalog: &Catalog,
    state: &GlobalState,
    rates: &Rates,
    action: ActionId,
) -> Ticks {
    let def = catalog.action(action);
    let selection = state.recipe_selection(action);
    let inputs = def.inputs_for(selection);
    if inputs.is_empty() {
        return INF_TICKS;
    }

    let mut completions = u32::MAX;
    for (item, count) in inputs {
        completions = completions.min(state.inventory.count_of(*item) / count.max(&1));
    }
    if completions == 0 {
        return 0;
    }
    let eff_ticks = state.effective_mean_ticks(catalog, def);
    (completions as f64 * eff_ticks).ceil() as Ticks
}

/// Next level (if any) at which a new action in `skill` unlocks.
pub fn next_unlock_level(catalog: &Catalog, current: Level, skill: Skill) -> Option<Level> {
    catalog
        .unlock_levels(skill)
        .iter()
        .copied()
        .find(|l| *l > current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::state::GlobalState;

    #[test]
    fn test_woodcutting_rates() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let logs = catalog.item_by_name("Normal Logs").unwrap();

        let rates = estimate_rates(&catalog, &state, tree);
        assert!((rates.xp_rate(Skill::Woodcutting) - 10.0 / 30.0).abs() < 1e-9);
        // Log output plus the rare nest chance.
        assert!((rates.item_rate(logs) - 1.0 / 30.0).abs() < 1e-9);
        assert_eq!(rates.hp_loss_per_tick, 0.0);
        assert!(rates.item_types_per_tick > 1.0 / 30.0);
    }

    #[test]
    fn test_thieving_rates_account_for_stun() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let man = catalog.action_by_name("Man").unwrap();

        let rates = estimate_rates(&catalog, &state, man);
        // Level 1: stealth 42, perception 100 -> p = 0.42.
        let p = 0.42;
        let eff = 30.0 + (1.0 - p) * 30.0;
        assert!((rates.xp_rate(Skill::Thieving) - 8.0 * p / eff).abs() < 1e-9);
        assert!((rates.hp_loss_per_tick - (1.0 - p) * 4.5 / eff).abs() < 1e-9);
        assert!(rates.gp_per_tick > 0.0);
    }

    #[test]
    fn test_death_cycle_preserves_raw_hp_loss() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let man = catalog.action_by_name("Man").unwrap();

        let rates = estimate_rates(&catalog, &state, man);
        let adjusted = death_cycle_adjusted_rates(&state, &rates);
        assert_eq!(adjusted.hp_loss_per_tick, rates.hp_loss_per_tick);
        assert!(adjusted.xp_rate(Skill::Thieving) < rates.xp_rate(Skill::Thieving));
        assert!(adjusted.gp_per_tick < rates.gp_per_tick);
    }

    #[test]
    fn test_inputs_depleted_counts_completions() {
        let catalog = default_catalog();
        let mut state = GlobalState::empty(&catalog);
        let burn = catalog.action_by_name("Burn Normal Logs").unwrap();
        let logs = catalog.item_by_name("Normal Logs").unwrap();

        let rates = estimate_rates(&catalog, &state, burn);
        assert_eq!(ticks_until_inputs_depleted(&catalog, &state, &rates, burn), 0);

        state.inventory.add(logs, 3, 12).unwrap();
        assert_eq!(
            ticks_until_inputs_depleted(&catalog, &state, &rates, burn),
            60
        );

        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let tree_rates = estimate_rates(&catalog, &state, tree);
        assert_eq!(
            ticks_until_inputs_depleted(&catalog, &state, &tree_rates, tree),
            INF_TICKS
        );
    }

    #[test]
    fn test_inventory_full_prediction() {
        let catalog = default_catalog();
        let mut state = GlobalState::empty(&catalog);
        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let rates = estimate_rates(&catalog, &state, tree);

        let ticks = ticks_until_inventory_full(&catalog, &state, &rates);
        assert!(ticks > 0 && ticks < INF_TICKS);

        // A full bank is an immediate boundary.
        for i in 0..12 {
            let item = crate::types::ItemId(i);
            state.inventory.add(item, 1, 12).unwrap();
        }
        assert_eq!(ticks_until_inventory_full(&catalog, &state, &rates), 0);
    }

    #[test]
    fn test_next_unlock_level() {
        let catalog = default_catalog();
        assert_eq!(next_unlock_level(&catalog, 1, Skill::Woodcutting), Some(10));
        assert_eq!(next_unlock_level(&catalog, 10, Skill::Woodcutting), Some(25));
        assert_eq!(next_unlock_level(&catalog, 25, Skill::Woodcutting), None);
    }
}
