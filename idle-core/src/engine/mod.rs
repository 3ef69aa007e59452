//! The deterministic tick engine.
//!
//! `advance` moves a state snapshot forward by a tick budget, applying action
//! progress, completions, drops, xp and mastery accrual, thieving stuns,
//! combat exchanges, hp regen, and the death/restart cycle. Runs are chunked
//! between events rather than stepped per tick, so arbitrarily long absences
//! advance in one call.
//!
//! All randomness comes from the caller-supplied [`SimRng`]; fixed seeds give
//! bit-identical runs, and `advance(s, a)` then `advance(·, b)` on the same
//! generator equals `advance(s, a + b)`.

pub mod rng;

use rand::Rng;

use crate::catalog::{
    ActionDef, ActionKind, Catalog, CombatSpec, DEATH_RESTART_TICKS, HP_REGEN_INTERVAL_TICKS,
    ThievingSpec,
};
use crate::error::SimError;
use crate::state::{
    ActiveAction, Changes, CombatState, GlobalState, MiningState, StopCause, TimeAway,
};
use crate::types::{ActionId, Skill, TICK_DURATION_MS, Ticks, Xp};

pub use rng::SimRng;

/// Advance `state` by up to `ticks`, returning the new snapshot and the
/// change log. Returns early (with `Changes::stop` set) when the active
/// action exhausts inputs or output space; never for hazards, which the
/// death cycle absorbs.
pub fn advance(
    catalog: &Catalog,
    state: &GlobalState,
    ticks: Ticks,
    rng: &mut SimRng,
) -> (GlobalState, Changes) {
    let mut sim = Sim {
        catalog,
        state: state.clone(),
        changes: Changes::default(),
        rng,
    };
    sim.run(ticks);
    let consumed = sim.changes.ticks_advanced;
    sim.state
        .touch(state.updated_at.saturating_add(consumed.saturating_mul(TICK_DURATION_MS)));
    debug_assert!(sim.state.check_invariants(catalog));
    (sim.state, sim.changes)
}

/// Specialisation of [`advance`] for driving the active action; reports
/// [`StopCause::Idle`] without consuming budget when nothing is active.
pub fn consume_ticks(
    catalog: &Catalog,
    state: &GlobalState,
    ticks: Ticks,
    rng: &mut SimRng,
) -> (GlobalState, Changes) {
    if state.active_action.is_none() {
        let changes = Changes {
            stop: Some(StopCause::Idle),
            ..Changes::default()
        };
        return (state.clone(), changes);
    }
    advance(catalog, state, ticks, rng)
}

/// Process a host absence: advance by the elapsed wall-clock gap and fold the
/// result into the state's pending time-away envelope.
pub fn advance_time_away(
    catalog: &Catalog,
    state: &GlobalState,
    now_ms: u64,
    rng: &mut SimRng,
) -> (GlobalState, TimeAway) {
    let elapsed_ms = now_ms.saturating_sub(state.updated_at);
    let ticks = elapsed_ms / TICK_DURATION_MS;
    let active_skill = state
        .active_action
        .map(|a| catalog.action(a.action).skill);

    let (mut next, changes) = advance(catalog, state, ticks, rng);
    let envelope = TimeAway {
        start_time: state.updated_at,
        end_time: now_ms,
        active_skill,
        changes,
    };
    let merged = match next.time_away.take() {
        Some(mut pending) => {
            pending.merge(&envelope);
            pending
        }
        None => envelope.clone(),
    };
    next.time_away = Some(merged.clone());
    next.touch(now_ms);
    (next, merged)
}

/// Begin `action` on `state`, rolling its first duration. Validates unlock,
/// inputs, and node availability; used by the interaction layer and by the
/// engine's own restarts.
pub fn start_action(
    catalog: &Catalog,
    state: &mut GlobalState,
    action: ActionId,
    rng: &mut SimRng,
) -> Result<(), SimError> {
    let def = catalog.action(action);
    state.can_start(catalog, def)?;

    // Variant bookkeeping is created lazily on first start.
    let entry = state.action_states.entry(action).or_default();
    match &def.kind {
        ActionKind::Combat(spec) => {
            entry.combat.get_or_insert(CombatState::fresh(
                spec.monster_hp,
                spec.attack_speed,
                spec.monster_attack_speed,
            ));
        }
        _ => {
            if let Some(mining) = &def.mining {
                entry.mining.get_or_insert(MiningState::fresh(mining));
            }
        }
    }

    let total = roll_duration(catalog, state, def, rng);
    state.active_action = Some(ActiveAction {
        action,
        remaining_ticks: total,
        total_ticks: total,
    });
    Ok(())
}

/// Roll a concrete duration and apply owned interval upgrades.
fn roll_duration(
    catalog: &Catalog,
    state: &GlobalState,
    def: &ActionDef,
    rng: &mut SimRng,
) -> Ticks {
    let rolled = def.duration.roll(&mut rng.durations);
    let modifier = 1.0 + state.interval_modifier(catalog, def.skill) / 100.0;
    ((rolled as f64 * modifier).round() as Ticks).max(1)
}

// === SIMULATION CORE ===

struct Sim<'a> {
    catalog: &'a Catalog,
    state: GlobalState,
    changes: Changes,
    rng: &'a mut SimRng,
}

impl Sim<'_> {
    fn run(&mut self, mut budget: Ticks) {
        while budget > 0 {
            // Stun (and death overhead) gates everything except regen.
            if self.state.stun_remaining > 0 {
                let chunk = budget.min(self.state.stun_remaining);
                self.state.stun_remaining -= chunk;
                self.elapse(chunk, &mut budget);
                continue;
            }

            let Some(active) = self.state.active_action else {
                // Idle: only passive regen runs.
                self.elapse(budget, &mut budget);
                break;
            };

            let def = self.catalog.action(active.action).clone();
            let keep_going = match def.kind.clone() {
                ActionKind::Combat(spec) => self.step_combat(&def, &spec, &mut budget),
                _ => self.step_action(&def, &mut budget),
            };
            if !keep_going {
                break;
            }
        }
    }

    /// Consume `chunk` ticks of budget, applying passive hp regen.
    fn elapse(&mut self, chunk: Ticks, budget: &mut Ticks) {
        debug_assert!(chunk <= *budget);
        *budget -= chunk;
        self.changes.ticks_advanced += chunk;

        let total = self.state.regen_counter + chunk;
        let heals = total / HP_REGEN_INTERVAL_TICKS;
        self.state.regen_counter = total % HP_REGEN_INTERVAL_TICKS;
        if heals > 0 {
            let max = self.catalog.max_hp;
            let heal = heals.min(u64::from(max)) as u32;
            self.state.hp = self.state.hp.saturating_add(heal).min(max);
        }
    }

    // === SKILL / THIEVING / MINING PROGRESS ===

    /// One bounded step of a non-combat action. Returns false when the run
    /// should stop early.
    fn step_action(&mut self, def: &ActionDef, budget: &mut Ticks) -> bool {
        // Depleted node: wait out the respawn.
        if let Some(spec) = &def.mining {
            let mining = *self
                .state
                .action_states
                .entry(def.id)
                .or_default()
                .mining
                .get_or_insert(MiningState::fresh(spec));
            if mining.is_depleted() {
                let chunk = (*budget).min(mining.respawn_remaining);
                self.elapse(chunk, budget);
                let entry = self
                    .state
                    .action_states
                    .get_mut(&def.id)
                    .and_then(|s| s.mining.as_mut())
                    .expect("mining state inserted above");
                entry.respawn_remaining -= chunk;
                if entry.respawn_remaining == 0 {
                    entry.node_hp = spec.node_hp;
                } else if *budget == 0 {
                    self.changes.stop = Some(StopCause::NodeDepleted { action: def.id });
                }
                return true;
            }
        }

        let remaining = self
            .state
            .active_action
            .expect("step_action requires an active action")
            .remaining_ticks;
        if remaining > 0 {
            let chunk = (*budget).min(remaining);
            if let Some(active) = self.state.active_action.as_mut() {
                active.remaining_ticks -= chunk;
            }
            self.elapse(chunk, budget);
            if chunk < remaining {
                return true; // budget exhausted mid-action
            }
        }
        self.complete(def)
    }

    /// Apply one completion of a non-combat action.
    fn complete(&mut self, def: &ActionDef) -> bool {
        let selection = self.state.recipe_selection(def.id);

        if let ActionKind::Thieving(spec) = &def.kind {
            if !self.resolve_thieving_attempt(def, spec) {
                // Failed attempt: stunned, no xp, no drops; next attempt is
                // already rolled.
                return true;
            }
        }

        // Inputs are transactional per completion: verify, then consume.
        for (item, count) in def.inputs_for(selection) {
            if !self.state.inventory.has(*item, *count) {
                self.changes.stop = Some(StopCause::InputsMissing {
                    action: def.id,
                    item: *item,
                });
                return false;
            }
        }
        for (item, count) in def.inputs_for(selection) {
            self.state
                .inventory
                .remove(*item, *count)
                .expect("verified above");
            self.changes.record_item(*item, -i64::from(*count));
        }

        let stopped = self.apply_drops(def, selection);
        self.grant_xp(def.skill, def.xp);
        self.grant_mastery(def);

        // Mining nodes wear down one completion at a time.
        if let Some(spec) = &def.mining {
            let entry = self
                .state
                .action_states
                .entry(def.id)
                .or_default()
                .mining
                .get_or_insert(MiningState::fresh(spec));
            entry.node_hp = entry.node_hp.saturating_sub(1);
            if entry.node_hp == 0 {
                entry.respawn_remaining = spec.node_respawn_ticks;
            }
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "completion",
            action = def.name.as_str(),
            ticks = self.changes.ticks_advanced,
        );

        self.reroll_active(def);
        if stopped {
            return false;
        }

        // Stop ahead of a cycle that could never complete.
        if def.consumes_inputs(selection) {
            for (item, count) in def.inputs_for(selection) {
                if !self.state.inventory.has(*item, *count) {
                    self.changes.stop = Some(StopCause::InputsMissing {
                        action: def.id,
                        item: *item,
                    });
                    return false;
                }
            }
        }
        true
    }

    /// Roll a thieving attempt. Returns true on success; on failure applies
    /// stun and damage.
    fn resolve_thieving_attempt(&mut self, def: &ActionDef, spec: &ThievingSpec) -> bool {
        let p = self
            .state
            .thieving_success_chance(self.catalog, spec.perception);
        let roll: f64 = self.rng.thieving.random();
        if roll < p {
            let gold = self.rng.thieving.random_range(1..=spec.max_gold);
            self.state.gp += gold;
            self.changes.gp_delta += gold as i64;
            return true;
        }

        self.state.stun_remaining += spec.stun_ticks;
        let damage = self.rng.thieving.random_range(1..=spec.max_hit);
        #[cfg(feature = "instrument")]
        tracing::info!(target: "stun", action = def.name.as_str(), damage);
        self.damage_player(damage, def);
        self.reroll_active(def);
        false
    }

    /// Roll and place every drop for a completion. Returns true when a
    /// deterministic output was refused and the run must stop.
    fn apply_drops(&mut self, def: &ActionDef, selection: usize) -> bool {
        let level = self.state.skill_level(self.catalog, def.skill);
        let doubling = self.state.doubling_chance(self.catalog, def.skill);
        let capacity = self.state.bank_capacity(self.catalog);
        let mut stopped = false;

        for drop in self
            .catalog
            .all_drops_for_action(def, selection, level)
        {
            if !drop.is_certain() {
                let roll: f64 = self.rng.drops.random();
                if roll >= drop.rate {
                    continue;
                }
            }
            let mut count = drop.count;
            if doubling > 0.0 {
                let roll: f64 = self.rng.drops.random();
                if roll < doubling {
                    count *= 2;
                }
            }
            match self.state.inventory.add(drop.item, count, capacity) {
                Ok(()) => {
                    self.changes.record_item(drop.item, i64::from(count));
                    #[cfg(feature = "instrument")]
                    tracing::info!(target: "drop", item = drop.item.0, count);
                }
                Err(_) if drop.is_certain() => {
                    // The main output has nowhere to go; finish the
                    // completion, then stop.
                    self.changes.stop = Some(StopCause::InventoryFull { item: drop.item });
                    stopped = true;
                }
                Err(_) => {
                    // A rare drop missing a slot is simply lost.
                }
            }
        }
        stopped
    }

    // === COMBAT ===

    /// One bounded combat step: respawn wait, or advance to the next swing.
    fn step_combat(&mut self, def: &ActionDef, spec: &CombatSpec, budget: &mut Ticks) -> bool {
        let mut cs = *self
            .state
            .action_states
            .entry(def.id)
            .or_default()
            .combat
            .get_or_insert(CombatState::fresh(
                spec.monster_hp,
                spec.attack_speed,
                spec.monster_attack_speed,
            ));

        if cs.respawn_remaining > 0 {
            let chunk = (*budget).min(cs.respawn_remaining);
            cs.respawn_remaining -= chunk;
            self.elapse(chunk, budget);
            if cs.respawn_remaining == 0 {
                cs.monster_hp = spec.monster_hp;
                cs.player_cooldown = spec.attack_speed;
                cs.monster_cooldown = spec.monster_attack_speed;
            }
            self.store_combat(def.id, cs);
            return true;
        }

        let next_event = cs.player_cooldown.min(cs.monster_cooldown);
        if *budget < next_event {
            cs.player_cooldown -= *budget;
            cs.monster_cooldown -= *budget;
            let chunk = *budget;
            self.elapse(chunk, budget);
            self.store_combat(def.id, cs);
            return true;
        }

        cs.player_cooldown -= next_event;
        cs.monster_cooldown -= next_event;
        self.elapse(next_event, budget);

        let mut stopped = false;
        if cs.player_cooldown == 0 {
            cs.player_cooldown = spec.attack_speed;
            let damage = self.rng.combat.random_range(1..=spec.max_hit);
            cs.monster_hp = cs.monster_hp.saturating_sub(damage);
            if cs.monster_hp == 0 {
                stopped = self.monster_slain(def, spec);
                cs.respawn_remaining = spec.respawn_ticks;
            }
        }
        if cs.monster_cooldown == 0 {
            cs.monster_cooldown = spec.monster_attack_speed;
            if cs.monster_hp > 0 {
                let raw = self.rng.combat.random_range(1..=spec.monster_max_hit);
                let damage = (f64::from(raw) * (1.0 - spec.damage_reduction)).floor() as u32;
                if damage > 0 && self.damage_player(damage, def) {
                    // Death resets the encounter.
                    cs = CombatState::fresh(
                        spec.monster_hp,
                        spec.attack_speed,
                        spec.monster_attack_speed,
                    );
                }
            }
        }

        self.store_combat(def.id, cs);
        !stopped
    }

    /// Loot, xp, and mastery for a kill. Returns true when loot placement
    /// forces a stop.
    fn monster_slain(&mut self, def: &ActionDef, spec: &CombatSpec) -> bool {
        let gold = self.rng.combat.random_range(spec.gp_min..=spec.gp_max);
        self.state.gp += gold;
        self.changes.gp_delta += gold as i64;

        let capacity = self.state.bank_capacity(self.catalog);
        let mut stopped = false;
        for drop in &spec.drops {
            if !drop.is_certain() {
                let roll: f64 = self.rng.drops.random();
                if roll >= drop.rate {
                    continue;
                }
            }
            match self.state.inventory.add(drop.item, drop.count, capacity) {
                Ok(()) => self.changes.record_item(drop.item, i64::from(drop.count)),
                Err(_) if drop.is_certain() => {
                    self.changes.stop = Some(StopCause::InventoryFull { item: drop.item });
                    stopped = true;
                }
                Err(_) => {}
            }
        }

        self.grant_xp(def.skill, def.xp);
        self.grant_mastery(def);
        stopped
    }

    fn store_combat(&mut self, action: ActionId, cs: CombatState) {
        self.state
            .action_states
            .entry(action)
            .or_default()
            .combat = Some(cs);
        // Mirror the swing timer into the active-action view.
        if let Some(active) = self.state.active_action.as_mut() {
            if active.action == action {
                active.remaining_ticks = cs.player_cooldown;
            }
        }
    }

    // === SHARED GRANTS ===

    fn grant_xp(&mut self, skill: Skill, xp: Xp) {
        if xp <= 0.0 {
            return;
        }
        let before = self.state.skill_level(self.catalog, skill);
        self.state.skill_states.entry(skill).or_default().xp += xp;
        self.changes.record_xp(skill, xp);
        let after = self.state.skill_level(self.catalog, skill);
        if after > before {
            self.changes.record_level_up(skill, before, after);
        }
    }

    /// Mastery accrual: the item portion only, floored with a minimum grant
    /// of one point per completion.
    fn grant_mastery(&mut self, def: &ActionDef) {
        let mastery_level = self.state.mastery_level(self.catalog, def.id) as f64;
        let total_in_skill = self.catalog.actions_in_skill(def.skill) as f64;
        let seconds = def.duration.mean_seconds();
        let bonus = self.state.mastery_bonus(self.catalog, def.skill);
        let xp = (mastery_level * (total_in_skill / 10.0) * seconds * 0.5 * (1.0 + bonus))
            .floor()
            .max(1.0);

        self.state
            .action_states
            .entry(def.id)
            .or_default()
            .mastery_xp += xp;
        self.state
            .skill_states
            .entry(def.skill)
            .or_default()
            .mastery_xp += xp;
    }

    /// Death cycle: refill hp, charge the restart overhead, restart the
    /// encounter. Returns true when the hit was fatal.
    fn damage_player(&mut self, damage: u32, def: &ActionDef) -> bool {
        if damage < self.state.hp {
            self.state.hp -= damage;
            return false;
        }
        self.changes.deaths += 1;
        self.state.hp = self.catalog.max_hp;
        self.state.stun_remaining += DEATH_RESTART_TICKS;
        #[cfg(feature = "instrument")]
        tracing::info!(target: "death", action = def.name.as_str());
        self.reroll_active(def);
        true
    }

    fn reroll_active(&mut self, def: &ActionDef) {
        let total = roll_duration(self.catalog, &self.state, def, self.rng);
        if let Some(active) = self.state.active_action.as_mut() {
            if active.action == def.id {
                active.remaining_ticks = total;
                active.total_ticks = total;
            }
        }
    }
}
