//! The default game content: enough items, actions, and shop entries to
//! exercise every engine and planner mechanic.

use crate::types::Skill;

use super::actions::{
    ActionDef, CombatSpec, Drop, DurationSpec, MiningSpec, Recipe, ThievingSpec,
};
use super::shop::{PurchaseCost, PurchaseDef, PurchaseEffect};
use super::{Catalog, CatalogBuilder};

/// Build the stock catalog.
pub fn default_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();

    // === ITEMS ===

    let normal_logs = b.item("Normal Logs", 1);
    let oak_logs = b.item("Oak Logs", 5);
    let willow_logs = b.item("Willow Logs", 10);
    let raw_shrimp = b.item("Raw Shrimp", 1);
    let raw_trout = b.item("Raw Trout", 10);
    let shrimp = b.item("Shrimp", 2);
    let trout = b.item("Trout", 20);
    let copper_ore = b.item("Copper Ore", 2);
    let tin_ore = b.item("Tin Ore", 2);
    let iron_ore = b.item("Iron Ore", 6);
    let bronze_bar = b.item("Bronze Bar", 8);
    let iron_bar = b.item("Iron Bar", 18);
    let bones = b.item("Bones", 3);
    let feathers = b.item("Feathers", 1);
    let bird_nest = b.item("Bird Nest", 350);
    let circlet = b.item("Gold Topaz Ring", 750);

    // === WOODCUTTING ===

    b.action(|id| {
        ActionDef::new(id, "Normal Tree", Skill::Woodcutting, 1, DurationSpec::Fixed(30), 10.0)
            .with_output(Drop::certain(normal_logs, 1))
    });
    b.action(|id| {
        ActionDef::new(id, "Oak Tree", Skill::Woodcutting, 10, DurationSpec::Fixed(40), 15.0)
            .with_output(Drop::certain(oak_logs, 1))
    });
    b.action(|id| {
        ActionDef::new(id, "Willow Tree", Skill::Woodcutting, 25, DurationSpec::Fixed(50), 22.0)
            .with_output(Drop::certain(willow_logs, 1))
    });
    b.skill_drop(Skill::Woodcutting, 1, Drop::rare(bird_nest, 1, 0.005));

    // === FISHING ===

    b.action(|id| {
        ActionDef::new(
            id,
            "Shrimp Pool",
            Skill::Fishing,
            1,
            DurationSpec::Uniform { min: 30, max: 50 },
            5.0,
        )
        .with_output(Drop::certain(raw_shrimp, 1))
    });
    b.action(|id| {
        ActionDef::new(
            id,
            "Trout Stream",
            Skill::Fishing,
            20,
            DurationSpec::Uniform { min: 40, max: 60 },
            50.0,
        )
        .with_output(Drop::certain(raw_trout, 1))
    });

    // === MINING ===

    b.action(|id| {
        ActionDef::new(id, "Copper Rock", Skill::Mining, 1, DurationSpec::Fixed(30), 7.0)
            .with_output(Drop::certain(copper_ore, 1))
            .with_mining(MiningSpec {
                node_hp: 5,
                node_respawn_ticks: 100,
            })
    });
    b.action(|id| {
        ActionDef::new(id, "Tin Rock", Skill::Mining, 1, DurationSpec::Fixed(30), 7.0)
            .with_output(Drop::certain(tin_ore, 1))
            .with_mining(MiningSpec {
                node_hp: 5,
                node_respawn_ticks: 100,
            })
    });
    b.action(|id| {
        ActionDef::new(id, "Iron Rock", Skill::Mining, 15, DurationSpec::Fixed(30), 14.0)
            .with_output(Drop::certain(iron_ore, 1))
            .with_mining(MiningSpec {
                node_hp: 5,
                node_respawn_ticks: 150,
            })
    });

    // === FIREMAKING ===

    b.action(|id| {
        ActionDef::new(id, "Burn Normal Logs", Skill::Firemaking, 1, DurationSpec::Fixed(20), 25.0)
            .with_input(normal_logs, 1)
    });
    b.action(|id| {
        ActionDef::new(id, "Burn Oak Logs", Skill::Firemaking, 10, DurationSpec::Fixed(20), 45.0)
            .with_input(oak_logs, 1)
    });

    // === COOKING ===

    b.action(|id| {
        ActionDef::new(id, "Basic Fire", Skill::Cooking, 1, DurationSpec::Fixed(10), 5.0)
            .with_input(raw_shrimp, 1)
            .with_output(Drop::certain(shrimp, 1))
            .with_recipe(Recipe {
                name: "Trout".into(),
                inputs: vec![(raw_trout, 1)],
                outputs: vec![Drop::certain(trout, 1)],
            })
    });

    // === SMITHING ===

    b.action(|id| {
        ActionDef::new(id, "Bronze Bar", Skill::Smithing, 1, DurationSpec::Fixed(20), 5.0)
            .with_input(copper_ore, 1)
            .with_input(tin_ore, 1)
            .with_output(Drop::certain(bronze_bar, 1))
    });
    b.action(|id| {
        ActionDef::new(id, "Iron Bar", Skill::Smithing, 10, DurationSpec::Fixed(20), 8.0)
            .with_input(iron_ore, 2)
            .with_output(Drop::certain(iron_bar, 1))
    });

    // === THIEVING ===

    b.action(|id| {
        ActionDef::new(id, "Man", Skill::Thieving, 1, DurationSpec::Fixed(30), 8.0)
            .thieving(ThievingSpec {
                perception: 100.0,
                max_gold: 64,
                max_hit: 8,
                stun_ticks: 30,
            })
    });
    b.action(|id| {
        ActionDef::new(id, "Golbin Village", Skill::Thieving, 15, DurationSpec::Fixed(30), 25.5)
            .thieving(ThievingSpec {
                perception: 160.0,
                max_gold: 120,
                max_hit: 16,
                stun_ticks: 30,
            })
            .with_output(Drop::rare(circlet, 1, 0.01))
    });

    // === COMBAT ===

    b.action(|id| {
        ActionDef::new(id, "Chicken", Skill::Attack, 1, DurationSpec::Fixed(26), 4.0).combat(
            CombatSpec {
                attack_speed: 26,
                max_hit: 4,
                monster_attack_speed: 24,
                monster_max_hit: 1,
                damage_reduction: 0.0,
                monster_hp: 10,
                respawn_ticks: 30,
                gp_min: 1,
                gp_max: 5,
                drops: vec![
                    Drop::certain(bones, 1),
                    Drop::rare(feathers, 5, 0.75),
                ],
            },
        )
    });
    b.action(|id| {
        ActionDef::new(id, "Plant", Skill::Attack, 1, DurationSpec::Fixed(26), 8.0).combat(
            CombatSpec {
                attack_speed: 26,
                max_hit: 4,
                monster_attack_speed: 28,
                monster_max_hit: 3,
                damage_reduction: 0.0,
                monster_hp: 20,
                respawn_ticks: 30,
                gp_min: 2,
                gp_max: 10,
                drops: vec![Drop::certain(bones, 1)],
            },
        )
    });

    // === SHOP ===

    b.purchase(|id| {
        PurchaseDef::new(id, "Extra Bank Slot", PurchaseCost::BankSlotCurve, PurchaseEffect::BankSlot)
            .unlimited()
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Iron Axe",
            PurchaseCost::Gp(50),
            PurchaseEffect::ActionInterval {
                skill: Skill::Woodcutting,
                percent: -5.0,
            },
        )
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Steel Axe",
            PurchaseCost::Gp(750),
            PurchaseEffect::ActionInterval {
                skill: Skill::Woodcutting,
                percent: -10.0,
            },
        )
        .with_unlock(Skill::Woodcutting, 10)
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Iron Pickaxe",
            PurchaseCost::Gp(250),
            PurchaseEffect::ActionInterval {
                skill: Skill::Mining,
                percent: -5.0,
            },
        )
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Iron Fishing Rod",
            PurchaseCost::Gp(100),
            PurchaseEffect::ActionInterval {
                skill: Skill::Fishing,
                percent: -5.0,
            },
        )
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Firemaking Gloves",
            PurchaseCost::Gp(500),
            PurchaseEffect::ItemDoubling {
                skill: Skill::Firemaking,
                chance: 0.05,
            },
        )
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Expanded Coal Sack",
            PurchaseCost::Gp(2_000),
            PurchaseEffect::ItemDoubling {
                skill: Skill::Mining,
                chance: 0.1,
            },
        )
        .with_unlock(Skill::Mining, 20)
    });
    b.purchase(|id| {
        PurchaseDef::new(
            id,
            "Thieving Gloves",
            PurchaseCost::Gp(1_000),
            PurchaseEffect::MasteryBonus {
                skill: Skill::Thieving,
                percent: 10.0,
            },
        )
        .with_unlock(Skill::Thieving, 10)
    });

    b.build()
}
