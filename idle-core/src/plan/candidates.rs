//! Candidate enumeration: the watch set that defines segment boundaries and
//! the competitive 0-tick options the planner may emit.

use std::collections::HashMap;

use crate::catalog::{Catalog, PurchaseEffect};
use crate::goal::Goal;
use crate::rates::estimate_rates;
use crate::state::GlobalState;
use crate::types::{ActionId, Level, PurchaseId, Skill};

/// Events worth stopping a segment for.
#[derive(Debug, Clone, Default)]
pub struct WatchSet {
    /// Unowned shop purchases affecting any goal-relevant skill.
    pub upgrade_purchase_ids: Vec<PurchaseId>,
    /// Per watched skill, the catalog's unlock ladder.
    pub unlock_levels: HashMap<Skill, Vec<Level>>,
    pub watched_skills: Vec<Skill>,
    /// Unlocked consuming actions for relevant skills.
    pub consuming_activity_ids: Vec<ActionId>,
}

impl WatchSet {
    pub fn watches_skill(&self, skill: Skill) -> bool {
        self.watched_skills.contains(&skill)
    }
}

/// The planner's menu at one decision point.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// Competitive switch targets; the intended action leads.
    pub switch_to: Vec<ActionId>,
    /// Competitive subset of the watched upgrades: these may emit a buy.
    pub buy_upgrades: Vec<PurchaseId>,
    pub should_emit_sell: bool,
    pub watch: WatchSet,
}

/// Build the watch set and competitive options for one decision point.
pub fn enumerate_candidates(
    catalog: &Catalog,
    state: &GlobalState,
    goal: &Goal,
    inventory_pressure_threshold: f64,
) -> Candidates {
    let relevant = goal.relevant_skills(catalog);

    let mut watched_skills = relevant.clone();
    if let Some(active) = state.active_action {
        let skill = catalog.action(active.action).skill;
        if !watched_skills.contains(&skill) {
            watched_skills.push(skill);
        }
    }

    let upgrade_purchase_ids: Vec<PurchaseId> = catalog
        .purchases()
        .iter()
        .filter(|p| {
            let unowned = p.buy_limit.is_none_or(|limit| state.shop.owned(p.id) < limit)
                && !matches!(p.effect, PurchaseEffect::BankSlot);
            unowned
                && p.effect
                    .affected_skill()
                    .is_some_and(|s| relevant.contains(&s))
        })
        .map(|p| p.id)
        .collect();

    let unlock_levels: HashMap<Skill, Vec<Level>> = watched_skills
        .iter()
        .map(|s| (*s, catalog.unlock_levels(*s).to_vec()))
        .collect();

    let consuming_activity_ids: Vec<ActionId> = catalog
        .actions()
        .iter()
        .filter(|a| {
            a.skill.is_consuming()
                && relevant.contains(&a.skill)
                && state.is_unlocked(catalog, a)
        })
        .map(|a| a.id)
        .collect();

    let intended = intended_action(catalog, state, goal);

    // Competitive upgrades: watched ones that speed up the action we intend
    // to run and whose unlock gates are already open. Affordability decides
    // when, not whether.
    let intended_skill = intended.map(|a| catalog.action(a).skill);
    let buy_upgrades: Vec<PurchaseId> = upgrade_purchase_ids
        .iter()
        .copied()
        .filter(|id| {
            let def = catalog.purchase(*id);
            def.effect.affected_skill() == intended_skill
                && def
                    .unlock
                    .is_none_or(|(skill, level)| state.skill_level(catalog, skill) >= level)
        })
        .collect();

    let mut switch_to = Vec::new();
    if let Some(action) = intended {
        switch_to.push(action);
    }

    let capacity = state.bank_capacity(catalog) as f64;
    let occupancy = state.inventory.slots_used() as f64 / capacity;
    let should_emit_sell =
        occupancy >= inventory_pressure_threshold || matches!(goal, Goal::GpTarget { .. });

    Candidates {
        switch_to,
        buy_upgrades,
        should_emit_sell,
        watch: WatchSet {
            upgrade_purchase_ids,
            unlock_levels,
            watched_skills,
            consuming_activity_ids,
        },
    }
}

/// The action that best advances the goal's pressing subgoal right now.
///
/// For a consuming-skill goal the choice defers between the consumer (inputs
/// banked) and the best producer of the limiting input, which keeps the
/// planner from thrashing between the two.
pub fn intended_action(catalog: &Catalog, state: &GlobalState, goal: &Goal) -> Option<ActionId> {
    match goal {
        Goal::SkillLevel { skill, .. } if skill.is_consuming() => {
            let consumer = best_by(catalog, state, *skill, |rates_action| {
                xp_rate_ignoring_inputs(catalog, state, *skill, rates_action)
            })?;
            let def = catalog.action(consumer);
            let selection = state.recipe_selection(consumer);
            let fundable = def
                .inputs_for(selection)
                .iter()
                .all(|(item, count)| state.inventory.has(*item, *count));
            if fundable {
                return Some(consumer);
            }
            // Produce the limiting input instead.
            let (limiting, _) = def
                .inputs_for(selection)
                .iter()
                .min_by_key(|(item, count)| state.inventory.count_of(*item) / count.max(&1))?;
            best_producer(catalog, state, *limiting)
        }
        Goal::SkillLevel { skill, .. } => best_by(catalog, state, *skill, |action| {
            estimate_rates(catalog, state, action).xp_rate(*skill)
        }),
        Goal::GpTarget { .. } => {
            let mut best: Option<(ActionId, f64)> = None;
            for action in catalog.actions() {
                if !state.is_unlocked(catalog, action) {
                    continue;
                }
                let rates = estimate_rates(catalog, state, action.id);
                let adjusted = crate::rates::death_cycle_adjusted_rates(state, &rates);
                let score = adjusted.sellable_gp_per_tick(catalog);
                if best.is_none_or(|(_, b)| score > b) {
                    best = Some((action.id, score));
                }
            }
            best.map(|(id, _)| id)
        }
        Goal::ItemCount { item, .. } => best_producer(catalog, state, *item),
    }
}

/// Best unlocked action in `skill` by a scoring function.
fn best_by(
    catalog: &Catalog,
    state: &GlobalState,
    skill: Skill,
    score: impl Fn(ActionId) -> f64,
) -> Option<ActionId> {
    let mut best: Option<(ActionId, f64)> = None;
    for action in catalog.actions_for_skill(skill) {
        if !state.is_unlocked(catalog, action) {
            continue;
        }
        let s = score(action.id);
        if s > 0.0 && best.is_none_or(|(_, b)| s > b) {
            best = Some((action.id, s));
        }
    }
    best.map(|(id, _)| id)
}

/// Xp rate an action would have if its inputs were flowing; used to rank
/// consumers whose bank happens to be empty right now.
fn xp_rate_ignoring_inputs(
    catalog: &Catalog,
    state: &GlobalState,
    skill: Skill,
    action: ActionId,
) -> f64 {
    let def = catalog.action(action);
    if def.skill != skill {
        return 0.0;
    }
    let eff_ticks = state.effective_mean_ticks(catalog, def);
    def.xp / eff_ticks
}

/// Best unlocked producer of `item` by net flow.
fn best_producer(catalog: &Catalog, state: &GlobalState, item: crate::types::ItemId) -> Option<ActionId> {
    let mut best: Option<(ActionId, f64)> = None;
    for action in catalog.actions() {
        if !state.is_unlocked(catalog, action) {
            continue;
        }
        let rates = estimate_rates(catalog, state, action.id);
        let flow = rates.net_item_rate(item);
        if flow > 0.0 && best.is_none_or(|(_, b)| flow > b) {
            best = Some((action.id, flow));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    #[test]
    fn test_watch_set_for_firemaking_goal() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = Goal::SkillLevel {
            skill: Skill::Firemaking,
            level: 2,
        };

        let candidates = enumerate_candidates(&catalog, &state, &goal, 0.9);
        assert!(candidates.watch.watches_skill(Skill::Firemaking));
        assert!(candidates.watch.watches_skill(Skill::Woodcutting));

        // Burn Normal Logs is unlocked and consuming; oak burning is gated.
        let burn = catalog.action_by_name("Burn Normal Logs").unwrap();
        let oak = catalog.action_by_name("Burn Oak Logs").unwrap();
        assert!(candidates.watch.consuming_activity_ids.contains(&burn));
        assert!(!candidates.watch.consuming_activity_ids.contains(&oak));

        // The axes affect Woodcutting, a relevant skill.
        let iron_axe = catalog.purchase_by_name("Iron Axe").unwrap();
        assert!(candidates.watch.upgrade_purchase_ids.contains(&iron_axe));
    }

    #[test]
    fn test_intended_defers_to_producer_when_inputs_empty() {
        let catalog = default_catalog();
        let mut state = GlobalState::empty(&catalog);
        let goal = Goal::SkillLevel {
            skill: Skill::Firemaking,
            level: 2,
        };

        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let burn = catalog.action_by_name("Burn Normal Logs").unwrap();
        let logs = catalog.item_by_name("Normal Logs").unwrap();

        assert_eq!(intended_action(&catalog, &state, &goal), Some(tree));

        state.inventory.add(logs, 5, 12).unwrap();
        assert_eq!(intended_action(&catalog, &state, &goal), Some(burn));
    }

    #[test]
    fn test_competitive_upgrades_track_intended_skill() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = Goal::SkillLevel {
            skill: Skill::Firemaking,
            level: 2,
        };

        // Intended is woodcutting (no logs banked), so the iron axe is
        // competitive; the steel axe stays watch-only behind its gate.
        let candidates = enumerate_candidates(&catalog, &state, &goal, 0.9);
        let iron_axe = catalog.purchase_by_name("Iron Axe").unwrap();
        let steel_axe = catalog.purchase_by_name("Steel Axe").unwrap();
        assert!(candidates.buy_upgrades.contains(&iron_axe));
        assert!(!candidates.buy_upgrades.contains(&steel_axe));
        assert!(candidates.watch.upgrade_purchase_ids.contains(&steel_axe));
    }

    #[test]
    fn test_gp_goal_prefers_best_earner() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = Goal::GpTarget { gp: 1_000 };
        let intended = intended_action(&catalog, &state, &goal);
        assert!(intended.is_some());
    }
}
