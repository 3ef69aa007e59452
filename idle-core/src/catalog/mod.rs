//! Immutable registries: items, actions, drops, shop purchases, and the xp
//! curve. A [`Catalog`] is built once at boot and shared read-only; state
//! snapshots never embed catalog data, only ids.

pub mod actions;
pub mod data;
pub mod items;
pub mod shop;
pub mod xp;

use std::collections::HashMap;

use crate::error::SimError;
use crate::types::{ActionId, ItemId, Level, PurchaseId, Skill};

pub use actions::{
    ActionDef, ActionKind, CombatSpec, Drop, DurationSpec, MiningSpec, Recipe, SkillDrop,
    ThievingSpec,
};
pub use data::default_catalog;
pub use items::ItemDef;
pub use shop::{
    BANK_SLOT_COST_MAX, PurchaseCost, PurchaseDef, PurchaseEffect, next_bank_slot_cost,
};
pub use xp::{XpProgress, XpTable};

/// Ticks of overhead charged when the player dies and restarts an action.
pub const DEATH_RESTART_TICKS: u64 = 100;

/// Hp regenerated passively every [`HP_REGEN_INTERVAL_TICKS`] ticks.
pub const HP_REGEN_INTERVAL_TICKS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ItemDef>,
    actions: Vec<ActionDef>,
    purchases: Vec<PurchaseDef>,
    skill_drops: Vec<SkillDrop>,
    global_drops: Vec<Drop>,
    xp: XpTable,
    mastery: XpTable,

    item_names: HashMap<String, ItemId>,
    action_names: HashMap<String, ActionId>,
    purchase_names: HashMap<String, PurchaseId>,
    /// Per-skill sorted unique unlock levels, computed once.
    unlock_levels: HashMap<Skill, Vec<Level>>,

    /// Inventory slots before any bank-slot purchases.
    pub base_bank_slots: u32,
    pub max_hp: u32,
}

impl Catalog {
    // === LOOKUP BY ID ===
    //
    // Ids are dense indices handed out by the builder; lookups by id are
    // infallible for any id the catalog itself produced.

    pub fn item(&self, id: ItemId) -> &ItemDef {
        &self.items[id.index()]
    }

    pub fn action(&self, id: ActionId) -> &ActionDef {
        &self.actions[id.index()]
    }

    pub fn purchase(&self, id: PurchaseId) -> &PurchaseDef {
        &self.purchases[id.index()]
    }

    pub fn items(&self) -> &[ItemDef] {
        &self.items
    }

    pub fn actions(&self) -> &[ActionDef] {
        &self.actions
    }

    pub fn purchases(&self) -> &[PurchaseDef] {
        &self.purchases
    }

    pub fn xp_table(&self) -> &XpTable {
        &self.xp
    }

    pub fn mastery_table(&self) -> &XpTable {
        &self.mastery
    }

    // === LOOKUP BY NAME (persistence boundary) ===

    pub fn item_by_name(&self, name: &str) -> Result<ItemId, SimError> {
        self.item_names
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownId { name: name.into() })
    }

    pub fn action_by_name(&self, name: &str) -> Result<ActionId, SimError> {
        self.action_names
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownId { name: name.into() })
    }

    pub fn purchase_by_name(&self, name: &str) -> Result<PurchaseId, SimError> {
        self.purchase_names
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownId { name: name.into() })
    }

    // === DERIVED VIEWS ===

    pub fn actions_for_skill(&self, skill: Skill) -> impl Iterator<Item = &ActionDef> {
        self.actions.iter().filter(move |a| a.skill == skill)
    }

    /// Number of actions in a skill; feeds the mastery xp formula.
    pub fn actions_in_skill(&self, skill: Skill) -> usize {
        self.actions_for_skill(skill).count()
    }

    /// Sorted unique levels at which any action in `skill` unlocks.
    pub fn unlock_levels(&self, skill: Skill) -> &[Level] {
        self.unlock_levels
            .get(&skill)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn unlocked_actions(&self, skill: Skill, level: Level) -> impl Iterator<Item = &ActionDef> {
        self.actions_for_skill(skill)
            .filter(move |a| a.unlock_level <= level)
    }

    /// All drops granted when `action` completes with `selection`: recipe
    /// outputs first, then level-gated skill drops, then global drops.
    pub fn all_drops_for_action(
        &self,
        action: &ActionDef,
        selection: usize,
        skill_level: Level,
    ) -> Vec<Drop> {
        let mut drops: Vec<Drop> = action.outputs_for(selection).to_vec();
        drops.extend(
            self.skill_drops
                .iter()
                .filter(|sd| sd.skill == action.skill && sd.min_level <= skill_level)
                .map(|sd| sd.drop),
        );
        drops.extend(self.global_drops.iter().copied());
        drops
    }
}

// === BUILDER ===

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    actions: Vec<ActionDef>,
    purchases: Vec<PurchaseDef>,
    skill_drops: Vec<SkillDrop>,
    global_drops: Vec<Drop>,
    base_bank_slots: u32,
    max_hp: u32,
    max_level: Level,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            base_bank_slots: 12,
            max_hp: 100,
            max_level: 99,
            ..Default::default()
        }
    }

    pub fn item(&mut self, name: &str, sells_for: u64) -> ItemId {
        let id = ItemId::new(self.items.len() as u32);
        self.items.push(ItemDef::new(id, name, sells_for));
        id
    }

    /// Register an action. The closure receives the allocated id so drops and
    /// recipes can be attached fluently.
    pub fn action(&mut self, build: impl FnOnce(ActionId) -> ActionDef) -> ActionId {
        let id = ActionId::new(self.actions.len() as u32);
        let def = build(id);
        debug_assert_eq!(def.id, id);
        self.actions.push(def);
        id
    }

    pub fn purchase(&mut self, build: impl FnOnce(PurchaseId) -> PurchaseDef) -> PurchaseId {
        let id = PurchaseId::new(self.purchases.len() as u32);
        let def = build(id);
        debug_assert_eq!(def.id, id);
        self.purchases.push(def);
        id
    }

    pub fn skill_drop(&mut self, skill: Skill, min_level: Level, drop: Drop) {
        self.skill_drops.push(SkillDrop {
            skill,
            min_level,
            drop,
        });
    }

    pub fn global_drop(&mut self, drop: Drop) {
        self.global_drops.push(drop);
    }

    pub fn build(self) -> Catalog {
        let item_names = self
            .items
            .iter()
            .map(|i| (i.name.clone(), i.id))
            .collect();
        let action_names = self
            .actions
            .iter()
            .map(|a| (a.name.clone(), a.id))
            .collect();
        let purchase_names = self
            .purchases
            .iter()
            .map(|p| (p.name.clone(), p.id))
            .collect();

        let mut unlock_levels: HashMap<Skill, Vec<Level>> = HashMap::new();
        for action in &self.actions {
            unlock_levels
                .entry(action.skill)
                .or_default()
                .push(action.unlock_level);
        }
        for levels in unlock_levels.values_mut() {
            levels.sort_unstable();
            levels.dedup();
        }

        Catalog {
            items: self.items,
            actions: self.actions,
            purchases: self.purchases,
            skill_drops: self.skill_drops,
            global_drops: self.global_drops,
            xp: XpTable::standard(self.max_level),
            mastery: XpTable::standard(self.max_level),
            item_names,
            action_names,
            purchase_names,
            unlock_levels,
            base_bank_slots: self.base_bank_slots,
            max_hp: self.max_hp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Skill;

    #[test]
    fn test_builder_interning() {
        let mut b = CatalogBuilder::new();
        let logs = b.item("Normal Logs", 1);
        let tree = b.action(|id| {
            ActionDef::new(id, "Normal Tree", Skill::Woodcutting, 1, DurationSpec::Fixed(30), 10.0)
                .with_output(Drop::certain(logs, 1))
        });
        let catalog = b.build();

        assert_eq!(catalog.item_by_name("Normal Logs").unwrap(), logs);
        assert_eq!(catalog.action_by_name("Normal Tree").unwrap(), tree);
        assert!(matches!(
            catalog.action_by_name("Magic Tree"),
            Err(SimError::UnknownId { .. })
        ));
    }

    #[test]
    fn test_unlock_levels_sorted_unique() {
        let mut b = CatalogBuilder::new();
        for (name, level) in [("A", 25), ("B", 1), ("C", 25), ("D", 10)] {
            b.action(|id| {
                ActionDef::new(id, name, Skill::Fishing, level, DurationSpec::Fixed(30), 5.0)
            });
        }
        let catalog = b.build();
        assert_eq!(catalog.unlock_levels(Skill::Fishing), &[1, 10, 25]);
        assert_eq!(catalog.unlock_levels(Skill::Mining), &[] as &[Level]);
    }

    #[test]
    fn test_drop_concatenation_order() {
        let mut b = CatalogBuilder::new();
        let fish = b.item("Raw Shrimp", 1);
        let pearl = b.item("Pearl", 100);
        let gem = b.item("Gem", 200);
        let act = b.action(|id| {
            ActionDef::new(id, "Shrimp", Skill::Fishing, 1, DurationSpec::Fixed(30), 5.0)
                .with_output(Drop::certain(fish, 1))
        });
        b.skill_drop(Skill::Fishing, 1, Drop::rare(pearl, 1, 0.01));
        b.global_drop(Drop::rare(gem, 1, 0.005));
        let catalog = b.build();

        let drops = catalog.all_drops_for_action(catalog.action(act), 0, 1);
        let items: Vec<ItemId> = drops.iter().map(|d| d.item).collect();
        assert_eq!(items, vec![fish, pearl, gem]);
    }
}
