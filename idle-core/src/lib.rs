//! Idle-game simulation and planning engine.
//!
//! This crate is the offline core of an idle RPG: given a persisted game
//! state, a catalog of actions/recipes/shop entries, and a player goal, it
//! can (a) advance the state deterministically for any amount of elapsed
//! time and (b) plan an action schedule that reaches the goal in minimum
//! simulated ticks.
//!
//! ## Tick engine
//!
//! Time is discrete: one tick is 100 ms. The engine advances a snapshot by
//! a tick budget, resolving action progress and completions, drop rolls,
//! xp and mastery accrual, thieving stuns, combat exchanges, mining node
//! depletion, passive hp regen, and the death/restart cycle. Randomness is
//! supplied by the caller as a seeded, per-concern split generator, so runs
//! are reproducible and adding a mechanic never perturbs existing rolls.
//!
//! ## Planner
//!
//! The planner advances time in **segments**. At each decision point it
//! enumerates the *watch set* (upgrades, unlocks, consumers worth stopping
//! for), computes expected per-tick flows for candidate actions, and runs a
//! best-first search whose edges are 0-tick interactions (switch / buy /
//! sell) and bounded waits, each wait tagged with the stop condition that
//! justifies it. Executing a plan replays it against the real engine with
//! early-termination waits and reports structured replan boundaries when
//! reality diverges from expectation.
//!
//! ## Module Structure
//!
//! - `types`    Ids, skills, tick arithmetic
//! - `catalog`  Immutable item/action/drop/shop/xp registries
//! - `state`    The owned-by-value game snapshot and change log
//! - `engine`   The deterministic tick simulator
//! - `interact` 0-tick transactional mutations and sell policies
//! - `rates`    Expected flows and time predicates
//! - `waitfor`  Stop-condition algebra for wait edges
//! - `goal`     Terminal predicates
//! - `plan`     Candidates, decision deltas, segment search, executor
//! - `persist`  The documented JSON wire formats
//! - `host`     Wasm entry points (wasm32 only)

pub mod catalog;
pub mod engine;
pub mod error;
pub mod goal;
pub mod host;
#[cfg(feature = "instrument")]
pub use instrument;
pub mod interact;
pub mod persist;
pub mod plan;
pub mod rates;
pub mod state;
pub mod types;
pub mod waitfor;

// Re-export commonly used types at the crate root

// Types
pub use types::{
    ActionId, Gp, INF_TICKS, ItemId, Level, PurchaseId, Skill, TICK_DURATION_MS, Ticks, Xp,
    ticks_from_duration_ms,
};

// Errors
pub use error::SimError;

// Catalog
pub use catalog::{
    ActionDef, ActionKind, Catalog, CatalogBuilder, Drop, DurationSpec, ItemDef, PurchaseDef,
    PurchaseEffect, XpTable, default_catalog, next_bank_slot_cost,
};

// State
pub use state::{
    ActionState, ActiveAction, Changes, GlobalState, Inventory, LevelChange, ShopState,
    SkillState, StopCause, TimeAway,
};

// Engine
pub use engine::{SimRng, advance, advance_time_away, consume_ticks, start_action};

// Interactions
pub use interact::{
    Interaction, SellPolicy, SellPolicySpec, apply_interaction, effective_credits,
};

// Rates
pub use rates::{
    Rates, death_cycle_adjusted_rates, estimate_rates, ticks_until_death,
    ticks_until_inputs_depleted, ticks_until_inventory_full, ticks_until_next_mastery_level,
    ticks_until_next_skill_level,
};

// Goals and waiting
pub use goal::Goal;
pub use waitfor::WaitFor;

// Planning
pub use plan::{
    Candidates, ExecuteOutcome, NextDecision, Plan, ReplanBoundary, SegmentBoundary,
    SegmentConfig, SegmentContext, Step, WatchSet, enumerate_candidates, execute_plan,
    next_decision_delta, plan_segment,
};
