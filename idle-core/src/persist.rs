//! The persisted JSON formats and their mapping onto engine types.
//!
//! The wire layer speaks display names; the engine speaks interned ids. All
//! conversions go through the catalog, and an unresolvable name surfaces as
//! the fatal `UnknownId`. Unknown JSON keys are ignored; missing optional
//! fields take their documented defaults.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::catalog::Catalog;
use crate::error::SimError;
use crate::goal::Goal;
use crate::interact::{Interaction, SellPolicy};
use crate::state::{
    ActionState, ActiveAction, Changes, CombatState, GlobalState, LevelChange, MiningState,
    ShopState, SkillState, TimeAway,
};
use crate::types::{Skill, Ticks};
use crate::waitfor::WaitFor;

// === GLOBAL STATE ===

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStateDto {
    /// ISO-8601 timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub inventory: InventoryDto,
    #[serde(default)]
    pub active_action: Option<ActiveActionDto>,
    #[serde(default)]
    pub skill_states: HashMap<String, SkillStateDto>,
    #[serde(default)]
    pub action_states: HashMap<String, ActionStateDto>,
    #[serde(default)]
    pub gp: u64,
    #[serde(default)]
    pub shop: ShopDto,
    pub player_hp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_away: Option<TimeAwayDto>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stun_ticks: Ticks,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub regen_ticks: Ticks,
}

fn is_zero(v: &Ticks) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDto {
    #[serde(default)]
    pub counts: HashMap<String, u32>,
    #[serde(default)]
    pub ordered_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct ActiveActionDto {
    pub name: String,
    pub remaining_ticks: Ticks,
    pub total_ticks: Ticks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct SkillStateDto {
    #[serde(default)]
    pub xp: f64,
    #[serde(default)]
    pub mastery_xp: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct ActionStateDto {
    #[serde(default)]
    pub mastery_xp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_selection: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat: Option<CombatStateDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mining: Option<MiningStateDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct CombatStateDto {
    pub monster_hp: u32,
    #[serde(default)]
    pub respawn_remaining: Ticks,
    #[serde(default)]
    pub player_cooldown: Ticks,
    #[serde(default)]
    pub monster_cooldown: Ticks,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct MiningStateDto {
    pub node_hp: u32,
    #[serde(default)]
    pub respawn_remaining: Ticks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct ShopDto {
    #[serde(default)]
    pub bank_slots: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub purchased: HashMap<String, u32>,
}

// === TIME AWAY ===

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct TimeAwayDto {
    /// Epoch milliseconds.
    pub start_time: u64,
    pub end_time: u64,
    #[serde(default)]
    pub active_skill: Option<String>,
    pub changes: ChangesDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct ChangesDto {
    #[serde(default)]
    pub inventory_changes: HashMap<String, i64>,
    #[serde(default)]
    pub skill_xp_changes: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dropped_items: HashMap<String, u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub skill_level_changes: HashMap<String, LevelChangeDto>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct LevelChangeDto {
    pub start_level: u32,
    pub end_level: u32,
}

// === WAIT FOR ===

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "type")]
pub enum WaitForDto {
    WaitForGoal {
        goal: GoalDto,
    },
    WaitForSkillXp {
        skill: String,
        #[serde(rename = "targetXp")]
        target_xp: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    WaitForMasteryXp {
        action: String,
        #[serde(rename = "targetXp")]
        target_xp: f64,
    },
    WaitForEffectiveCredits {
        target: u64,
        policy: SellPolicyDto,
        reason: String,
    },
    WaitForInventoryThreshold {
        fraction: f64,
    },
    WaitForInventoryFull,
    WaitForInventoryAtLeast {
        item: String,
        count: u32,
    },
    WaitForInventoryDelta {
        item: String,
        delta: i64,
        #[serde(rename = "startCount")]
        start_count: u32,
    },
    WaitForInputsDepleted {
        action: String,
    },
    WaitForInputsAvailable {
        action: String,
    },
    WaitForSufficientInputs {
        action: String,
        #[serde(rename = "targetCount")]
        target_count: u32,
    },
    WaitForAnyOf {
        children: Vec<WaitForDto>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "type")]
pub enum GoalDto {
    SkillLevelGoal { skill: String, level: u32 },
    GpGoal { gp: u64 },
    ItemCountGoal { item: String, count: u32 },
}

// === INTERACTIONS ===

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "type")]
pub enum InteractionDto {
    SwitchActivity {
        #[serde(rename = "actionId")]
        action_id: String,
    },
    BuyShopItem {
        #[serde(rename = "purchaseId")]
        purchase_id: String,
    },
    SellItems {
        policy: SellPolicyDto,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "type")]
pub enum SellPolicyDto {
    SellAllPolicy,
    SellExceptPolicy {
        #[serde(rename = "keepItems")]
        keep_items: Vec<String>,
    },
}

// === PLANS ===

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "type")]
pub enum StepDto {
    Interaction {
        interaction: InteractionDto,
    },
    Wait {
        ticks: Ticks,
        #[serde(rename = "waitFor")]
        wait_for: WaitForDto,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "type")]
pub enum SegmentBoundaryDto {
    GoalReached,
    InventoryFull,
    InventoryPressure,
    PlannedSegmentStop,
    UpgradeAffordable { purchase: String },
    UnlockObserved { skill: String, level: u32 },
    InputsDepleted { action: String },
    WaitConditionSatisfied,
    WaitExpired,
    Death,
    DeadEnd,
    BudgetExceeded,
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub steps: Vec<StepDto>,
    pub expected_ticks: Ticks,
    pub boundary: SegmentBoundaryDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct ReplanBoundaryDto {
    pub boundary: SegmentBoundaryDto,
    pub at_step: usize,
    pub ticks_into_plan: Ticks,
}

pub fn plan_to_dto(catalog: &Catalog, plan: &crate::plan::Plan) -> PlanDto {
    PlanDto {
        steps: plan
            .steps
            .iter()
            .map(|step| match step {
                crate::plan::Step::Interaction(interaction) => StepDto::Interaction {
                    interaction: interaction_to_dto(catalog, interaction),
                },
                crate::plan::Step::Wait { ticks, wait_for } => StepDto::Wait {
                    ticks: *ticks,
                    wait_for: wait_for_to_dto(catalog, wait_for),
                },
            })
            .collect(),
        expected_ticks: plan.expected_ticks,
        boundary: boundary_to_dto(catalog, &plan.boundary),
    }
}

pub fn plan_from_dto(catalog: &Catalog, dto: &PlanDto) -> Result<crate::plan::Plan, SimError> {
    Ok(crate::plan::Plan {
        steps: dto
            .steps
            .iter()
            .map(|step| {
                Ok(match step {
                    StepDto::Interaction { interaction } => crate::plan::Step::Interaction(
                        interaction_from_dto(catalog, interaction)?,
                    ),
                    StepDto::Wait { ticks, wait_for } => crate::plan::Step::Wait {
                        ticks: *ticks,
                        wait_for: wait_for_from_dto(catalog, wait_for)?,
                    },
                })
            })
            .collect::<Result<_, SimError>>()?,
        expected_ticks: dto.expected_ticks,
        boundary: boundary_from_dto(catalog, &dto.boundary)?,
    })
}

pub fn boundary_to_dto(
    catalog: &Catalog,
    boundary: &crate::plan::SegmentBoundary,
) -> SegmentBoundaryDto {
    use crate::plan::SegmentBoundary as B;
    match boundary {
        B::GoalReached => SegmentBoundaryDto::GoalReached,
        B::InventoryFull => SegmentBoundaryDto::InventoryFull,
        B::InventoryPressure => SegmentBoundaryDto::InventoryPressure,
        B::PlannedSegmentStop => SegmentBoundaryDto::PlannedSegmentStop,
        B::UpgradeAffordable { purchase } => SegmentBoundaryDto::UpgradeAffordable {
            purchase: catalog.purchase(*purchase).name.clone(),
        },
        B::UnlockObserved { skill, level } => SegmentBoundaryDto::UnlockObserved {
            skill: skill.name().to_string(),
            level: *level,
        },
        B::InputsDepleted { action } => SegmentBoundaryDto::InputsDepleted {
            action: catalog.action(*action).name.clone(),
        },
        B::WaitConditionSatisfied => SegmentBoundaryDto::WaitConditionSatisfied,
        B::WaitExpired => SegmentBoundaryDto::WaitExpired,
        B::Death => SegmentBoundaryDto::Death,
        B::DeadEnd => SegmentBoundaryDto::DeadEnd,
        B::BudgetExceeded => SegmentBoundaryDto::BudgetExceeded,
        B::Error { error } => SegmentBoundaryDto::Error {
            message: error.to_string(),
        },
    }
}

fn boundary_from_dto(
    catalog: &Catalog,
    dto: &SegmentBoundaryDto,
) -> Result<crate::plan::SegmentBoundary, SimError> {
    use crate::plan::SegmentBoundary as B;
    Ok(match dto {
        SegmentBoundaryDto::GoalReached => B::GoalReached,
        SegmentBoundaryDto::InventoryFull => B::InventoryFull,
        SegmentBoundaryDto::InventoryPressure => B::InventoryPressure,
        SegmentBoundaryDto::PlannedSegmentStop => B::PlannedSegmentStop,
        SegmentBoundaryDto::UpgradeAffordable { purchase } => B::UpgradeAffordable {
            purchase: catalog.purchase_by_name(purchase)?,
        },
        SegmentBoundaryDto::UnlockObserved { skill, level } => B::UnlockObserved {
            skill: Skill::from_name(skill).ok_or_else(|| SimError::UnknownId {
                name: skill.clone(),
            })?,
            level: *level,
        },
        SegmentBoundaryDto::InputsDepleted { action } => B::InputsDepleted {
            action: catalog.action_by_name(action)?,
        },
        SegmentBoundaryDto::WaitConditionSatisfied => B::WaitConditionSatisfied,
        SegmentBoundaryDto::WaitExpired => B::WaitExpired,
        SegmentBoundaryDto::Death => B::Death,
        SegmentBoundaryDto::DeadEnd => B::DeadEnd,
        SegmentBoundaryDto::BudgetExceeded => B::BudgetExceeded,
        // Execution errors are reported outward, never loaded back into a
        // plan; treat them as corrupt input.
        SegmentBoundaryDto::Error { message } => {
            return Err(SimError::UnknownId {
                name: format!("error boundary: {message}"),
            });
        }
    })
}

pub fn replan_boundary_to_dto(
    catalog: &Catalog,
    boundary: &crate::plan::ReplanBoundary,
) -> ReplanBoundaryDto {
    ReplanBoundaryDto {
        boundary: boundary_to_dto(catalog, &boundary.boundary),
        at_step: boundary.at_step,
        ticks_into_plan: boundary.ticks_into_plan,
    }
}

// === STATE CONVERSIONS ===

pub fn state_to_dto(catalog: &Catalog, state: &GlobalState) -> GlobalStateDto {
    GlobalStateDto {
        updated_at: DateTime::from_timestamp_millis(state.updated_at as i64)
            .unwrap_or_default(),
        inventory: InventoryDto {
            counts: state
                .inventory
                .stacks()
                .map(|s| (catalog.item(s.item).name.clone(), s.count))
                .collect(),
            ordered_items: state
                .inventory
                .stacks()
                .map(|s| catalog.item(s.item).name.clone())
                .collect(),
        },
        active_action: state.active_action.map(|a| ActiveActionDto {
            name: catalog.action(a.action).name.clone(),
            remaining_ticks: a.remaining_ticks,
            total_ticks: a.total_ticks,
        }),
        skill_states: state
            .skill_states
            .iter()
            .map(|(skill, s)| {
                (
                    skill.name().to_string(),
                    SkillStateDto {
                        xp: s.xp,
                        mastery_xp: s.mastery_xp,
                    },
                )
            })
            .collect(),
        action_states: state
            .action_states
            .iter()
            .map(|(action, s)| {
                (
                    catalog.action(*action).name.clone(),
                    ActionStateDto {
                        mastery_xp: s.mastery_xp,
                        recipe_selection: s.recipe_selection,
                        combat: s.combat.map(|c| CombatStateDto {
                            monster_hp: c.monster_hp,
                            respawn_remaining: c.respawn_remaining,
                            player_cooldown: c.player_cooldown,
                            monster_cooldown: c.monster_cooldown,
                        }),
                        mining: s.mining.map(|m| MiningStateDto {
                            node_hp: m.node_hp,
                            respawn_remaining: m.respawn_remaining,
                        }),
                    },
                )
            })
            .collect(),
        gp: state.gp,
        shop: ShopDto {
            bank_slots: state.shop.bank_slots,
            purchased: state
                .shop
                .purchased
                .iter()
                .map(|(id, count)| (catalog.purchase(*id).name.clone(), *count))
                .collect(),
        },
        player_hp: state.hp,
        time_away: state
            .time_away
            .as_ref()
            .map(|t| time_away_to_dto(catalog, t)),
        stun_ticks: state.stun_remaining,
        regen_ticks: state.regen_counter,
    }
}

pub fn state_from_dto(catalog: &Catalog, dto: &GlobalStateDto) -> Result<GlobalState, SimError> {
    let mut state = GlobalState::empty(catalog);
    state.updated_at = dto.updated_at.timestamp_millis().max(0) as u64;

    for name in &dto.inventory.ordered_items {
        let item = catalog.item_by_name(name)?;
        let count = dto.inventory.counts.get(name).copied().unwrap_or(0);
        if count > 0 {
            // Loading trusts the save's own slot count.
            state
                .inventory
                .add(item, count, usize::MAX)
                .expect("unbounded capacity");
        }
    }

    state.active_action = match &dto.active_action {
        Some(a) => Some(ActiveAction {
            action: catalog.action_by_name(&a.name)?,
            remaining_ticks: a.remaining_ticks,
            total_ticks: a.total_ticks,
        }),
        None => None,
    };

    for (name, s) in &dto.skill_states {
        let skill = Skill::from_name(name).ok_or_else(|| SimError::UnknownId {
            name: name.clone(),
        })?;
        state.skill_states.insert(
            skill,
            SkillState {
                xp: s.xp,
                mastery_xp: s.mastery_xp,
            },
        );
    }

    for (name, s) in &dto.action_states {
        let action = catalog.action_by_name(name)?;
        state.action_states.insert(
            action,
            ActionState {
                mastery_xp: s.mastery_xp,
                recipe_selection: s.recipe_selection,
                combat: s.combat.as_ref().map(|c| CombatState {
                    monster_hp: c.monster_hp,
                    respawn_remaining: c.respawn_remaining,
                    player_cooldown: c.player_cooldown,
                    monster_cooldown: c.monster_cooldown,
                }),
                mining: s.mining.as_ref().map(|m| MiningState {
                    node_hp: m.node_hp,
                    respawn_remaining: m.respawn_remaining,
                }),
            },
        );
    }

    state.gp = dto.gp;
    state.hp = dto.player_hp.min(catalog.max_hp);
    state.shop = ShopState {
        bank_slots: dto.shop.bank_slots,
        purchased: dto
            .shop
            .purchased
            .iter()
            .map(|(name, count)| Ok((catalog.purchase_by_name(name)?, *count)))
            .collect::<Result<_, SimError>>()?,
    };
    state.time_away = match &dto.time_away {
        Some(t) => Some(time_away_from_dto(catalog, t)?),
        None => None,
    };
    state.stun_remaining = dto.stun_ticks;
    state.regen_counter = dto.regen_ticks;
    Ok(state)
}

// === TIME AWAY CONVERSIONS ===

pub fn time_away_to_dto(catalog: &Catalog, time_away: &TimeAway) -> TimeAwayDto {
    let changes = &time_away.changes;
    TimeAwayDto {
        start_time: time_away.start_time,
        end_time: time_away.end_time,
        active_skill: time_away.active_skill.map(|s| s.name().to_string()),
        changes: ChangesDto {
            inventory_changes: changes
                .inventory_delta
                .iter()
                .map(|(item, delta)| (catalog.item(*item).name.clone(), *delta))
                .collect(),
            skill_xp_changes: changes
                .skill_xp_delta
                .iter()
                .map(|(skill, xp)| (skill.name().to_string(), *xp))
                .collect(),
            dropped_items: changes
                .dropped_items
                .iter()
                .map(|(item, count)| (catalog.item(*item).name.clone(), *count))
                .collect(),
            skill_level_changes: changes
                .level_ups
                .iter()
                .map(|(skill, w)| {
                    (
                        skill.name().to_string(),
                        LevelChangeDto {
                            start_level: w.start_level,
                            end_level: w.end_level,
                        },
                    )
                })
                .collect(),
        },
    }
}

pub fn time_away_from_dto(catalog: &Catalog, dto: &TimeAwayDto) -> Result<TimeAway, SimError> {
    let mut changes = Changes::default();
    for (name, delta) in &dto.changes.inventory_changes {
        changes
            .inventory_delta
            .insert(catalog.item_by_name(name)?, *delta);
    }
    for (name, xp) in &dto.changes.skill_xp_changes {
        let skill = Skill::from_name(name).ok_or_else(|| SimError::UnknownId {
            name: name.clone(),
        })?;
        changes.skill_xp_delta.insert(skill, *xp);
    }
    for (name, count) in &dto.changes.dropped_items {
        changes
            .dropped_items
            .insert(catalog.item_by_name(name)?, *count);
    }
    for (name, w) in &dto.changes.skill_level_changes {
        let skill = Skill::from_name(name).ok_or_else(|| SimError::UnknownId {
            name: name.clone(),
        })?;
        changes.level_ups.insert(
            skill,
            LevelChange {
                start_level: w.start_level,
                end_level: w.end_level,
            },
        );
    }
    let active_skill = match &dto.active_skill {
        Some(name) => Some(Skill::from_name(name).ok_or_else(|| SimError::UnknownId {
            name: name.clone(),
        })?),
        None => None,
    };
    Ok(TimeAway {
        start_time: dto.start_time,
        end_time: dto.end_time,
        active_skill,
        changes,
    })
}

// === WAIT FOR CONVERSIONS ===

pub fn wait_for_to_dto(catalog: &Catalog, wait: &WaitFor) -> WaitForDto {
    match wait {
        WaitFor::Goal { goal } => WaitForDto::WaitForGoal {
            goal: goal_to_dto(catalog, goal),
        },
        WaitFor::SkillXp {
            skill,
            target_xp,
            reason,
        } => WaitForDto::WaitForSkillXp {
            skill: skill.name().to_string(),
            target_xp: *target_xp,
            reason: reason.clone(),
        },
        WaitFor::MasteryXp { action, target_xp } => WaitForDto::WaitForMasteryXp {
            action: catalog.action(*action).name.clone(),
            target_xp: *target_xp,
        },
        WaitFor::EffectiveCredits {
            target,
            policy,
            reason,
        } => WaitForDto::WaitForEffectiveCredits {
            target: *target,
            policy: sell_policy_to_dto(catalog, policy),
            reason: reason.clone(),
        },
        WaitFor::InventoryThreshold { fraction } => WaitForDto::WaitForInventoryThreshold {
            fraction: *fraction,
        },
        WaitFor::InventoryFull => WaitForDto::WaitForInventoryFull,
        WaitFor::InventoryAtLeast { item, count } => WaitForDto::WaitForInventoryAtLeast {
            item: catalog.item(*item).name.clone(),
            count: *count,
        },
        WaitFor::InventoryDelta {
            item,
            delta,
            start_count,
        } => WaitForDto::WaitForInventoryDelta {
            item: catalog.item(*item).name.clone(),
            delta: *delta,
            start_count: *start_count,
        },
        WaitFor::InputsDepleted { action } => WaitForDto::WaitForInputsDepleted {
            action: catalog.action(*action).name.clone(),
        },
        WaitFor::InputsAvailable { action } => WaitForDto::WaitForInputsAvailable {
            action: catalog.action(*action).name.clone(),
        },
        WaitFor::SufficientInputs {
            action,
            target_count,
        } => WaitForDto::WaitForSufficientInputs {
            action: catalog.action(*action).name.clone(),
            target_count: *target_count,
        },
        WaitFor::AnyOf { children } => WaitForDto::WaitForAnyOf {
            children: children.iter().map(|c| wait_for_to_dto(catalog, c)).collect(),
        },
    }
}

pub fn wait_for_from_dto(catalog: &Catalog, dto: &WaitForDto) -> Result<WaitFor, SimError> {
    Ok(match dto {
        WaitForDto::WaitForGoal { goal } => WaitFor::Goal {
            goal: goal_from_dto(catalog, goal)?,
        },
        WaitForDto::WaitForSkillXp {
            skill,
            target_xp,
            reason,
        } => WaitFor::SkillXp {
            skill: Skill::from_name(skill).ok_or_else(|| SimError::UnknownId {
                name: skill.clone(),
            })?,
            target_xp: *target_xp,
            reason: reason.clone(),
        },
        WaitForDto::WaitForMasteryXp { action, target_xp } => WaitFor::MasteryXp {
            action: catalog.action_by_name(action)?,
            target_xp: *target_xp,
        },
        WaitForDto::WaitForEffectiveCredits {
            target,
            policy,
            reason,
        } => WaitFor::EffectiveCredits {
            target: *target,
            policy: sell_policy_from_dto(catalog, policy)?,
            reason: reason.clone(),
        },
        WaitForDto::WaitForInventoryThreshold { fraction } => WaitFor::InventoryThreshold {
            fraction: *fraction,
        },
        WaitForDto::WaitForInventoryFull => WaitFor::InventoryFull,
        WaitForDto::WaitForInventoryAtLeast { item, count } => WaitFor::InventoryAtLeast {
            item: catalog.item_by_name(item)?,
            count: *count,
        },
        WaitForDto::WaitForInventoryDelta {
            item,
            delta,
            start_count,
        } => WaitFor::InventoryDelta {
            item: catalog.item_by_name(item)?,
            delta: *delta,
            start_count: *start_count,
        },
        WaitForDto::WaitForInputsDepleted { action } => WaitFor::InputsDepleted {
            action: catalog.action_by_name(action)?,
        },
        WaitForDto::WaitForInputsAvailable { action } => WaitFor::InputsAvailable {
            action: catalog.action_by_name(action)?,
        },
        WaitForDto::WaitForSufficientInputs {
            action,
            target_count,
        } => WaitFor::SufficientInputs {
            action: catalog.action_by_name(action)?,
            target_count: *target_count,
        },
        WaitForDto::WaitForAnyOf { children } => WaitFor::AnyOf {
            children: children
                .iter()
                .map(|c| wait_for_from_dto(catalog, c))
                .collect::<Result<_, _>>()?,
        },
    })
}

pub fn goal_to_dto(catalog: &Catalog, goal: &Goal) -> GoalDto {
    match goal {
        Goal::SkillLevel { skill, level } => GoalDto::SkillLevelGoal {
            skill: skill.name().to_string(),
            level: *level,
        },
        Goal::GpTarget { gp } => GoalDto::GpGoal { gp: *gp },
        Goal::ItemCount { item, count } => GoalDto::ItemCountGoal {
            item: catalog.item(*item).name.clone(),
            count: *count,
        },
    }
}

pub fn goal_from_dto(catalog: &Catalog, dto: &GoalDto) -> Result<Goal, SimError> {
    Ok(match dto {
        GoalDto::SkillLevelGoal { skill, level } => Goal::SkillLevel {
            skill: Skill::from_name(skill).ok_or_else(|| SimError::UnknownId {
                name: skill.clone(),
            })?,
            level: *level,
        },
        GoalDto::GpGoal { gp } => Goal::GpTarget { gp: *gp },
        GoalDto::ItemCountGoal { item, count } => Goal::ItemCount {
            item: catalog.item_by_name(item)?,
            count: *count,
        },
    })
}

// === INTERACTION CONVERSIONS ===

pub fn interaction_to_dto(catalog: &Catalog, interaction: &Interaction) -> InteractionDto {
    match interaction {
        Interaction::SwitchActivity { action } => InteractionDto::SwitchActivity {
            action_id: catalog.action(*action).name.clone(),
        },
        Interaction::BuyShopItem { purchase } => InteractionDto::BuyShopItem {
            purchase_id: catalog.purchase(*purchase).name.clone(),
        },
        Interaction::SellItems { policy } => InteractionDto::SellItems {
            policy: sell_policy_to_dto(catalog, policy),
        },
    }
}

pub fn interaction_from_dto(
    catalog: &Catalog,
    dto: &InteractionDto,
) -> Result<Interaction, SimError> {
    Ok(match dto {
        InteractionDto::SwitchActivity { action_id } => Interaction::SwitchActivity {
            action: catalog.action_by_name(action_id)?,
        },
        InteractionDto::BuyShopItem { purchase_id } => Interaction::BuyShopItem {
            purchase: catalog.purchase_by_name(purchase_id)?,
        },
        InteractionDto::SellItems { policy } => Interaction::SellItems {
            policy: sell_policy_from_dto(catalog, policy)?,
        },
    })
}

pub fn sell_policy_to_dto(catalog: &Catalog, policy: &SellPolicy) -> SellPolicyDto {
    match policy {
        SellPolicy::SellAll => SellPolicyDto::SellAllPolicy,
        SellPolicy::SellExcept { keep } => SellPolicyDto::SellExceptPolicy {
            keep_items: keep
                .iter()
                .map(|item| catalog.item(*item).name.clone())
                .collect(),
        },
    }
}

pub fn sell_policy_from_dto(
    catalog: &Catalog,
    dto: &SellPolicyDto,
) -> Result<SellPolicy, SimError> {
    Ok(match dto {
        SellPolicyDto::SellAllPolicy => SellPolicy::SellAll,
        SellPolicyDto::SellExceptPolicy { keep_items } => SellPolicy::SellExcept {
            keep: keep_items
                .iter()
                .map(|name| catalog.item_by_name(name))
                .collect::<Result<_, _>>()?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::engine::{SimRng, start_action};

    fn populated_state(catalog: &Catalog) -> GlobalState {
        let mut rng = SimRng::from_seed(4);
        let mut state = GlobalState::empty(catalog);
        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let ore = catalog.item_by_name("Copper Ore").unwrap();
        state.inventory.add(logs, 42, 12).unwrap();
        state.inventory.add(ore, 7, 12).unwrap();
        state.gp = 123;
        state.hp = 88;
        state.updated_at = 1_700_000_000_000;
        state.shop.bank_slots = 2;
        let axe = catalog.purchase_by_name("Iron Axe").unwrap();
        state.shop.purchased.insert(axe, 1);
        state.skill_states.insert(
            Skill::Woodcutting,
            SkillState {
                xp: 150.0,
                mastery_xp: 12.0,
            },
        );
        let tree = catalog.action_by_name("Normal Tree").unwrap();
        start_action(catalog, &mut state, tree, &mut rng).unwrap();
        state
    }

    #[test]
    fn test_state_round_trip() {
        let catalog = default_catalog();
        let state = populated_state(&catalog);
        let dto = state_to_dto(&catalog, &state);
        let json = serde_json::to_string(&dto).unwrap();
        let parsed: GlobalStateDto = serde_json::from_str(&json).unwrap();
        let back = state_from_dto(&catalog, &parsed).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_unknown_keys_ignored_and_defaults_applied() {
        let catalog = default_catalog();
        let json = r#"{
            "updatedAt": "2024-01-15T10:30:00Z",
            "playerHp": 100,
            "someFutureField": {"x": 1}
        }"#;
        let dto: GlobalStateDto = serde_json::from_str(json).unwrap();
        let state = state_from_dto(&catalog, &dto).unwrap();
        assert_eq!(state.gp, 0);
        assert!(state.inventory.is_empty());
        assert!(state.active_action.is_none());
    }

    #[test]
    fn test_unknown_action_name_is_fatal() {
        let catalog = default_catalog();
        let json = r#"{
            "updatedAt": "2024-01-15T10:30:00Z",
            "playerHp": 100,
            "activeAction": {"name": "Magic Tree", "remainingTicks": 5, "totalTicks": 30}
        }"#;
        let dto: GlobalStateDto = serde_json::from_str(json).unwrap();
        let err = state_from_dto(&catalog, &dto).unwrap_err();
        assert!(matches!(err, SimError::UnknownId { .. }));
    }

    #[test]
    fn test_wait_for_round_trip() {
        let catalog = default_catalog();
        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let burn = catalog.action_by_name("Burn Normal Logs").unwrap();

        let wait = WaitFor::any_of(vec![
            WaitFor::SkillXp {
                skill: Skill::Firemaking,
                target_xp: 83.0,
                reason: Some("level 2".into()),
            },
            WaitFor::InventoryAtLeast {
                item: logs,
                count: 4,
            },
            WaitFor::InputsDepleted { action: burn },
            WaitFor::EffectiveCredits {
                target: 50,
                policy: SellPolicy::SellAll,
                reason: "Iron Axe".into(),
            },
        ]);

        let dto = wait_for_to_dto(&catalog, &wait);
        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"WaitForAnyOf\""));
        assert!(json.contains("\"WaitForSkillXp\""));
        let parsed: WaitForDto = serde_json::from_str(&json).unwrap();
        let back = wait_for_from_dto(&catalog, &parsed).unwrap();
        assert_eq!(back, wait);
    }

    #[test]
    fn test_interaction_round_trip() {
        let catalog = default_catalog();
        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let logs = catalog.item_by_name("Normal Logs").unwrap();

        let interactions = vec![
            Interaction::SwitchActivity { action: tree },
            Interaction::BuyShopItem {
                purchase: catalog.purchase_by_name("Iron Axe").unwrap(),
            },
            Interaction::SellItems {
                policy: SellPolicy::SellExcept {
                    keep: [logs].into_iter().collect(),
                },
            },
        ];

        for interaction in interactions {
            let dto = interaction_to_dto(&catalog, &interaction);
            let json = serde_json::to_string(&dto).unwrap();
            let parsed: InteractionDto = serde_json::from_str(&json).unwrap();
            let back = interaction_from_dto(&catalog, &parsed).unwrap();
            assert_eq!(back, interaction);
        }
    }

    #[test]
    fn test_plan_round_trip() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = crate::goal::Goal::SkillLevel {
            skill: Skill::Woodcutting,
            level: 3,
        };
        let plan = crate::plan::plan_segment(
            &catalog,
            &state,
            &goal,
            crate::plan::SegmentConfig::default(),
        )
        .unwrap();

        let dto = plan_to_dto(&catalog, &plan);
        let json = serde_json::to_string(&dto).unwrap();
        let parsed: PlanDto = serde_json::from_str(&json).unwrap();
        let back = plan_from_dto(&catalog, &parsed).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn test_time_away_round_trip() {
        let catalog = default_catalog();
        let logs = catalog.item_by_name("Normal Logs").unwrap();

        let mut changes = Changes::default();
        changes.record_item(logs, 120);
        changes.record_xp(Skill::Woodcutting, 1200.0);
        changes.record_level_up(Skill::Woodcutting, 3, 9);
        let time_away = TimeAway {
            start_time: 1_700_000_000_000,
            end_time: 1_700_003_600_000,
            active_skill: Some(Skill::Woodcutting),
            changes,
        };

        let dto = time_away_to_dto(&catalog, &time_away);
        let json = serde_json::to_string(&dto).unwrap();
        let parsed: TimeAwayDto = serde_json::from_str(&json).unwrap();
        let back = time_away_from_dto(&catalog, &parsed).unwrap();
        // The dto drops tick accounting, which is engine-internal.
        assert_eq!(back.start_time, time_away.start_time);
        assert_eq!(back.end_time, time_away.end_time);
        assert_eq!(back.changes.inventory_delta, time_away.changes.inventory_delta);
        assert_eq!(back.changes.level_ups, time_away.changes.level_ups);
    }
}
