//! The game state snapshot and its derived views.
//!
//! State is owned by value: registries stay outside, every snapshot carries
//! its own inventory and per-skill/per-action sub-states, and mutation goes
//! through the tick engine or the interaction layer, both of which stamp
//! `updated_at`.

pub mod changes;
pub mod inventory;

use std::collections::HashMap;

use crate::catalog::{ActionDef, Catalog, MiningSpec, PurchaseEffect};
use crate::error::SimError;
use crate::types::{ActionId, Gp, Level, PurchaseId, Skill, Ticks, Xp};

pub use changes::{Changes, LevelChange, StopCause, TimeAway};
pub use inventory::{Inventory, ItemShortfall, ItemStack};

// === SUB-STATES ===

/// Per-skill progress.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkillState {
    pub xp: Xp,
    pub mastery_xp: Xp,
}

/// Live combat bookkeeping for a combat action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatState {
    pub monster_hp: u32,
    /// Ticks until the monster spawns; 0 when it is up.
    pub respawn_remaining: Ticks,
    /// Ticks until the player's next swing.
    pub player_cooldown: Ticks,
    /// Ticks until the monster's next swing.
    pub monster_cooldown: Ticks,
}

impl CombatState {
    pub fn fresh(monster_hp: u32, attack_speed: Ticks, monster_attack_speed: Ticks) -> Self {
        Self {
            monster_hp,
            respawn_remaining: 0,
            player_cooldown: attack_speed,
            monster_cooldown: monster_attack_speed,
        }
    }
}

/// Mining node bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningState {
    pub node_hp: u32,
    /// Ticks until a depleted node refills; 0 when the node is up.
    pub respawn_remaining: Ticks,
}

impl MiningState {
    pub fn fresh(spec: &MiningSpec) -> Self {
        Self {
            node_hp: spec.node_hp,
            respawn_remaining: 0,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.node_hp == 0
    }
}

/// Per-action state: mastery progress plus variant bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionState {
    pub mastery_xp: Xp,
    pub recipe_selection: Option<usize>,
    pub combat: Option<CombatState>,
    pub mining: Option<MiningState>,
}

/// The action in progress. Exists iff the player is performing an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveAction {
    pub action: ActionId,
    pub remaining_ticks: Ticks,
    pub total_ticks: Ticks,
}

impl ActiveAction {
    pub fn progress_ticks(&self) -> Ticks {
        self.total_ticks - self.remaining_ticks
    }
}

/// Shop ownership: purchase counts plus the bank-slot counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopState {
    pub purchased: HashMap<PurchaseId, u32>,
    pub bank_slots: u32,
}

impl ShopState {
    pub fn owned(&self, purchase: PurchaseId) -> u32 {
        self.purchased.get(&purchase).copied().unwrap_or(0)
    }
}

// === GLOBAL STATE ===

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalState {
    pub inventory: Inventory,
    pub active_action: Option<ActiveAction>,
    pub skill_states: HashMap<Skill, SkillState>,
    pub action_states: HashMap<ActionId, ActionState>,
    /// Epoch milliseconds of the last mutation.
    pub updated_at: u64,
    pub gp: Gp,
    pub hp: u32,
    pub shop: ShopState,
    pub time_away: Option<TimeAway>,
    /// Ticks left in the current stun; 0 when free.
    pub stun_remaining: Ticks,
    /// Ticks accumulated toward the next passive hp regen.
    pub regen_counter: Ticks,
}

impl GlobalState {
    /// A fresh save: empty bank, full hp, nothing active.
    pub fn empty(catalog: &Catalog) -> Self {
        Self {
            inventory: Inventory::new(),
            active_action: None,
            skill_states: HashMap::new(),
            action_states: HashMap::new(),
            updated_at: 0,
            gp: 0,
            hp: catalog.max_hp,
            shop: ShopState::default(),
            time_away: None,
            stun_remaining: 0,
            regen_counter: 0,
        }
    }

    // === SKILL VIEWS ===

    pub fn skill_state(&self, skill: Skill) -> SkillState {
        self.skill_states.get(&skill).copied().unwrap_or_default()
    }

    pub fn skill_xp(&self, skill: Skill) -> Xp {
        self.skill_state(skill).xp
    }

    pub fn skill_level(&self, catalog: &Catalog, skill: Skill) -> Level {
        catalog.xp_table().level_for_xp(self.skill_xp(skill))
    }

    pub fn action_state(&self, action: ActionId) -> ActionState {
        self.action_states.get(&action).cloned().unwrap_or_default()
    }

    pub fn mastery_xp(&self, action: ActionId) -> Xp {
        self.action_state(action).mastery_xp
    }

    pub fn mastery_level(&self, catalog: &Catalog, action: ActionId) -> Level {
        catalog.mastery_table().level_for_xp(self.mastery_xp(action))
    }

    /// Selected recipe for an action; defaults to the base recipe.
    pub fn recipe_selection(&self, action: ActionId) -> usize {
        self.action_states
            .get(&action)
            .and_then(|s| s.recipe_selection)
            .unwrap_or(0)
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_remaining > 0
    }

    // === SHOP-DERIVED VIEWS ===

    /// Inventory slot capacity: the base allowance plus purchased slots.
    pub fn bank_capacity(&self, catalog: &Catalog) -> usize {
        (catalog.base_bank_slots + self.shop.bank_slots) as usize
    }

    /// Summed interval percent for a skill from owned upgrades (negative is
    /// faster).
    pub fn interval_modifier(&self, catalog: &Catalog, skill: Skill) -> f64 {
        self.sum_effects(catalog, |effect| match effect {
            PurchaseEffect::ActionInterval { skill: s, percent } if s == skill => Some(percent),
            _ => None,
        })
    }

    pub fn doubling_chance(&self, catalog: &Catalog, skill: Skill) -> f64 {
        self.sum_effects(catalog, |effect| match effect {
            PurchaseEffect::ItemDoubling { skill: s, chance } if s == skill => Some(chance),
            _ => None,
        })
    }

    /// Mastery xp bonus fraction for a skill.
    pub fn mastery_bonus(&self, catalog: &Catalog, skill: Skill) -> f64 {
        self.sum_effects(catalog, |effect| match effect {
            PurchaseEffect::MasteryBonus { skill: s, percent } if s == skill => {
                Some(percent / 100.0)
            }
            _ => None,
        })
    }

    fn sum_effects(&self, catalog: &Catalog, pick: impl Fn(PurchaseEffect) -> Option<f64>) -> f64 {
        self.shop
            .purchased
            .iter()
            .filter(|(_, count)| **count > 0)
            .filter_map(|(id, count)| {
                pick(catalog.purchase(*id).effect).map(|v| v * *count as f64)
            })
            .sum()
    }

    /// Mean action duration in ticks after interval upgrades.
    pub fn effective_mean_ticks(&self, catalog: &Catalog, action: &ActionDef) -> f64 {
        let modifier = 1.0 + self.interval_modifier(catalog, action.skill) / 100.0;
        (action.duration.mean_ticks() * modifier).max(1.0)
    }

    // === THIEVING ===

    /// Stealth rating; grows with the thieving level.
    pub fn stealth(&self, catalog: &Catalog) -> f64 {
        40.0 + 2.0 * self.skill_level(catalog, Skill::Thieving) as f64
    }

    pub fn thieving_success_chance(&self, catalog: &Catalog, perception: f64) -> f64 {
        (self.stealth(catalog) / perception).clamp(0.0, 1.0)
    }

    // === PREDICATES ===

    pub fn is_unlocked(&self, catalog: &Catalog, action: &ActionDef) -> bool {
        self.skill_level(catalog, action.skill) >= action.unlock_level
    }

    /// Can this action begin right now? Checks unlock, inputs for the
    /// selected recipe, and mining node availability.
    pub fn can_start(&self, catalog: &Catalog, action: &ActionDef) -> Result<(), SimError> {
        if !self.is_unlocked(catalog, action) {
            return Err(SimError::RequirementsUnmet {
                what: format!(
                    "{} requires {} level {}",
                    action.name,
                    action.skill.name(),
                    action.unlock_level
                ),
            });
        }
        let selection = self.recipe_selection(action.id);
        for (item, count) in action.inputs_for(selection) {
            if !self.inventory.has(*item, *count) {
                return Err(SimError::InputsMissing {
                    action: action.id,
                    item: *item,
                    count: *count,
                });
            }
        }
        if action.mining.is_some() {
            if let Some(mining) = self.action_state(action.id).mining {
                if mining.is_depleted() {
                    return Err(SimError::NodeDepleted { action: action.id });
                }
            }
        }
        Ok(())
    }

    /// Postconditions every mutator maintains.
    pub fn check_invariants(&self, catalog: &Catalog) -> bool {
        self.hp <= catalog.max_hp && self.inventory.check_invariants()
    }

    /// Stamp a mutation time.
    pub fn touch(&mut self, now_ms: u64) {
        self.updated_at = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    #[test]
    fn test_empty_state() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        assert_eq!(state.gp, 0);
        assert_eq!(state.hp, catalog.max_hp);
        assert_eq!(state.bank_capacity(&catalog), 12);
        assert!(state.check_invariants(&catalog));
        assert_eq!(state.skill_level(&catalog, Skill::Woodcutting), 1);
    }

    #[test]
    fn test_interval_modifier_sums_owned_upgrades() {
        let catalog = default_catalog();
        let mut state = GlobalState::empty(&catalog);
        let iron_axe = catalog.purchase_by_name("Iron Axe").unwrap();
        let steel_axe = catalog.purchase_by_name("Steel Axe").unwrap();

        assert_eq!(state.interval_modifier(&catalog, Skill::Woodcutting), 0.0);
        state.shop.purchased.insert(iron_axe, 1);
        assert_eq!(state.interval_modifier(&catalog, Skill::Woodcutting), -5.0);
        state.shop.purchased.insert(steel_axe, 1);
        assert_eq!(state.interval_modifier(&catalog, Skill::Woodcutting), -15.0);
        // Other skills untouched.
        assert_eq!(state.interval_modifier(&catalog, Skill::Mining), 0.0);

        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let effective = state.effective_mean_ticks(&catalog, catalog.action(tree));
        assert!((effective - 25.5).abs() < 1e-9, "effective {effective}");
    }

    #[test]
    fn test_can_start_checks_inputs() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let burn = catalog.action_by_name("Burn Normal Logs").unwrap();
        assert!(matches!(
            state.can_start(&catalog, catalog.action(burn)),
            Err(SimError::InputsMissing { .. })
        ));

        let tree = catalog.action_by_name("Normal Tree").unwrap();
        assert!(state.can_start(&catalog, catalog.action(tree)).is_ok());
    }

    #[test]
    fn test_can_start_checks_unlock() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let willow = catalog.action_by_name("Willow Tree").unwrap();
        assert!(matches!(
            state.can_start(&catalog, catalog.action(willow)),
            Err(SimError::RequirementsUnmet { .. })
        ));
    }
}
