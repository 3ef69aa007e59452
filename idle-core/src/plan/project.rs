//! Expected-value state projection.
//!
//! The planner never rolls dice: it pushes a snapshot forward by applying
//! per-tick expected flows for a whole wait edge at once. The tick engine is
//! the ground truth the executor reconciles against.

use crate::catalog::Catalog;
use crate::rates::Rates;
use crate::state::GlobalState;
use crate::types::{TICK_DURATION_MS, Ticks};

/// Advance `state` by `ticks` of expected flows under `rates`.
pub fn project(catalog: &Catalog, state: &GlobalState, rates: &Rates, ticks: Ticks) -> GlobalState {
    let mut next = state.clone();
    let t = ticks as f64;

    for (skill, rate) in &rates.xp_per_tick {
        if *rate > 0.0 {
            next.skill_states.entry(*skill).or_default().xp += rate * t;
        }
    }
    if let Some(action) = rates.action {
        if rates.mastery_xp_per_tick > 0.0 {
            let gain = rates.mastery_xp_per_tick * t;
            next.action_states.entry(action).or_default().mastery_xp += gain;
            let skill = catalog.action(action).skill;
            next.skill_states.entry(skill).or_default().mastery_xp += gain;
        }
    }

    next.gp += (rates.gp_per_tick * t).floor().max(0.0) as u64;

    // Net item flows, whole units only; new types respect slot capacity and
    // are silently skipped once the bank is full (the planner watches fill
    // via its own boundary conditions).
    let capacity = next.bank_capacity(catalog);
    let mut flows: Vec<(crate::types::ItemId, f64)> = rates
        .items_per_tick
        .iter()
        .map(|(item, rate)| (*item, *rate))
        .collect();
    for (item, rate) in &rates.items_consumed_per_tick {
        if let Some(entry) = flows.iter_mut().find(|(i, _)| i == item) {
            entry.1 -= rate;
        } else {
            flows.push((*item, -rate));
        }
    }
    flows.sort_by_key(|(item, _)| *item);
    for (item, rate) in flows {
        let delta = rate * t;
        if delta >= 1.0 {
            let _ = next.inventory.add(item, delta.floor() as u32, capacity);
        } else if delta <= -1.0 {
            let have = next.inventory.count_of(item);
            let take = ((-delta).floor() as u32).min(have);
            let _ = next.inventory.remove(item, take);
        }
    }

    // Hp drifts down under hazard but never projects through death; the
    // death cycle is already priced into adjusted rates.
    if rates.hp_loss_per_tick > 0.0 {
        let loss = (rates.hp_loss_per_tick * t).floor() as u32;
        next.hp = next.hp.saturating_sub(loss).max(1);
    }

    next.touch(
        state
            .updated_at
            .saturating_add(ticks.saturating_mul(TICK_DURATION_MS)),
    );
    next
}
