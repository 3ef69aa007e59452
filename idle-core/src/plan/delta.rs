//! The next-decision delta: how long the planner may safely wait before the
//! world presents a new choice.

use crate::catalog::Catalog;
use crate::goal::Goal;
use crate::interact::SellPolicy;
use crate::rates::{
    active_rates, death_cycle_adjusted_rates, estimate_rates, next_unlock_level,
};
use crate::state::GlobalState;
use crate::types::{INF_TICKS, Skill, Ticks};
use crate::waitfor::WaitFor;

use super::candidates::{Candidates, intended_action};

/// Mastery boundaries that matter land every ten levels (and at the cap).
const MASTERY_BOUNDARY_STEP: u32 = 10;

/// Outcome of a decision-delta computation.
#[derive(Debug, Clone)]
pub struct NextDecision {
    /// Minimum positive estimate among the contributing conditions;
    /// `INF_TICKS` reports a dead end.
    pub delta: Ticks,
    /// Disjunction of every condition that contributed a finite estimate.
    pub wait_for: WaitFor,
    /// The action that best advances the pressing subgoal.
    pub intended: Option<crate::types::ActionId>,
}

impl NextDecision {
    pub fn is_dead_end(&self) -> bool {
        self.delta == INF_TICKS
    }
}

/// Collect every upcoming decision point and take the soonest.
pub fn next_decision_delta(
    catalog: &Catalog,
    state: &GlobalState,
    goal: &Goal,
    candidates: &Candidates,
    sell_policy: &SellPolicy,
) -> NextDecision {
    let rates = active_rates(catalog, state);
    let intended = intended_action(catalog, state, goal);
    let mut conditions: Vec<(Ticks, WaitFor)> = Vec::new();

    // Time until the goal itself, but only when the intended action actually
    // trains a goal-relevant skill; otherwise the goal estimate is noise.
    if let Some(intended_id) = intended {
        let intended_skill = catalog.action(intended_id).skill;
        if goal.relevant_skills(catalog).contains(&intended_skill) {
            let intended_rates = estimate_rates(catalog, state, intended_id);
            let adjusted = death_cycle_adjusted_rates(state, &intended_rates);
            let wait = WaitFor::Goal { goal: goal.clone() };
            let est = wait.estimate_ticks(catalog, state, &adjusted);
            conditions.push((est, wait));
        }
    }

    // Soonest affordable watched upgrade, by effective credits.
    for purchase in &candidates.watch.upgrade_purchase_ids {
        let def = catalog.purchase(*purchase);
        let wait = WaitFor::EffectiveCredits {
            target: def.next_cost(state.shop.bank_slots),
            policy: sell_policy.clone(),
            reason: def.name.clone(),
        };
        let est = wait.estimate_ticks(catalog, state, &rates);
        conditions.push((est, wait));
    }

    // Soonest watched unlock: the next level at which new actions appear.
    for skill in &candidates.watch.watched_skills {
        if let Some(level) = next_unlock_level(catalog, state.skill_level(catalog, *skill), *skill)
        {
            let wait = WaitFor::SkillXp {
                skill: *skill,
                target_xp: catalog.xp_table().start_xp_for_level(level),
                reason: Some(format!("unlock at {} {}", skill.name(), level)),
            };
            let est = wait.estimate_ticks(catalog, state, &rates);
            conditions.push((est, wait));
        }
    }

    // Inventory pressure from the active action's flows.
    let full = WaitFor::InventoryFull;
    let est = full.estimate_ticks(catalog, state, &rates);
    conditions.push((est, full));

    // The active action running out of inputs.
    if let Some(active) = state.active_action {
        let def = catalog.action(active.action);
        if def.consumes_inputs(state.recipe_selection(active.action)) {
            let wait = WaitFor::InputsDepleted {
                action: active.action,
            };
            let est = wait.estimate_ticks(catalog, state, &rates);
            conditions.push((est, wait));
        }
    }

    // A watched consumer becoming fundable.
    for consumer in &candidates.watch.consuming_activity_ids {
        if state.active_action.is_some_and(|a| a.action == *consumer) {
            continue;
        }
        let def = catalog.action(*consumer);
        let selection = state.recipe_selection(*consumer);
        if let Some((item, count)) = def
            .inputs_for(selection)
            .iter()
            .min_by_key(|(item, count)| state.inventory.count_of(*item) / count.max(&1))
        {
            if state.inventory.count_of(*item) < *count {
                let wait = WaitFor::InventoryAtLeast {
                    item: *item,
                    count: *count,
                };
                let est = wait.estimate_ticks(catalog, state, &rates);
                conditions.push((est, wait));
            }
        }
    }

    // Enough banked inputs to carry the goal home in one consuming stretch.
    if let Some((consumer, target)) = sufficient_inputs_target(catalog, state, goal) {
        let wait = WaitFor::SufficientInputs {
            action: consumer,
            target_count: target,
        };
        let est = wait.estimate_ticks(catalog, state, &rates);
        conditions.push((est, wait));
    }

    // Thieving mastery boundary: success odds shift every ten levels.
    if let Some(active) = state.active_action {
        let def = catalog.action(active.action);
        if def.is_thieving() {
            let level = state.mastery_level(catalog, active.action);
            let cap = catalog.mastery_table().max_level();
            let next = ((level / MASTERY_BOUNDARY_STEP) + 1) * MASTERY_BOUNDARY_STEP;
            let boundary = next.min(cap);
            if boundary > level {
                let wait = WaitFor::MasteryXp {
                    action: active.action,
                    target_xp: catalog.mastery_table().start_xp_for_level(boundary),
                };
                let est = wait.estimate_ticks(catalog, state, &rates);
                conditions.push((est, wait));
            }
        }
    }

    // Keep only genuine waits: a zero estimate is an immediate interaction's
    // job, infinity contributes nothing.
    let finite: Vec<(Ticks, WaitFor)> = conditions
        .into_iter()
        .filter(|(est, _)| *est >= 1 && *est < INF_TICKS)
        .collect();

    let delta = finite.iter().map(|(est, _)| *est).min().unwrap_or(INF_TICKS);
    let wait_for = match finite.len() {
        0 => WaitFor::Goal { goal: goal.clone() },
        1 => finite.into_iter().next().expect("len checked").1,
        _ => WaitFor::any_of(finite.into_iter().map(|(_, w)| w).collect()),
    };

    NextDecision {
        delta,
        wait_for,
        intended,
    }
}

/// For a consuming-skill goal being fed by a producer: how many consumer
/// completions are still needed, as a banked-inputs target.
fn sufficient_inputs_target(
    catalog: &Catalog,
    state: &GlobalState,
    goal: &Goal,
) -> Option<(crate::types::ActionId, u32)> {
    let Goal::SkillLevel { skill, level } = goal else {
        return None;
    };
    if !skill.is_consuming() {
        return None;
    }
    // Producing only matters while the consumer is parked.
    let active_skill = state
        .active_action
        .map(|a| catalog.action(a.action).skill);
    if active_skill == Some(*skill) {
        return None;
    }

    let consumer = best_consumer(catalog, state, *skill)?;
    let def = catalog.action(consumer);
    let remaining_xp = catalog
        .xp_table()
        .xp_until_level(state.skill_xp(*skill), *level);
    if remaining_xp <= 0.0 || def.xp <= 0.0 {
        return None;
    }
    let completions = (remaining_xp / def.xp).ceil() as u32;
    Some((consumer, completions))
}

fn best_consumer(
    catalog: &Catalog,
    state: &GlobalState,
    skill: Skill,
) -> Option<crate::types::ActionId> {
    let mut best: Option<(crate::types::ActionId, f64)> = None;
    for action in catalog.actions_for_skill(skill) {
        if !state.is_unlocked(catalog, action) {
            continue;
        }
        let score = action.xp / state.effective_mean_ticks(catalog, action);
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((action.id, score));
        }
    }
    best.map(|(id, _)| id)
}
