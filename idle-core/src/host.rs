//! Wasm host boundary: JSON-in/JSON-out entry points over the public API.
//!
//! The host owns scheduling (a periodic timer, pause/resume); the engine
//! only ever sees explicit tick budgets and seeds.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;

use crate::catalog::{Catalog, default_catalog};
use crate::engine::SimRng;
use crate::persist::{
    GlobalStateDto, GoalDto, InteractionDto, PlanDto, interaction_from_dto, plan_from_dto,
    plan_to_dto, replan_boundary_to_dto, state_from_dto, state_to_dto, time_away_to_dto,
};
use crate::plan::{SegmentConfig, SegmentContext};

thread_local! {
    static CATALOG: Catalog = default_catalog();
}

/// Install the panic hook; call once at module load.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn err_to_js(e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Advance a persisted state by `ticks`, returning `{state, changes}`.
#[wasm_bindgen]
pub fn advance(state: JsValue, ticks: u64, seed: u64) -> Result<JsValue, JsValue> {
    CATALOG.with(|catalog| {
        let dto: GlobalStateDto = serde_wasm_bindgen::from_value(state)?;
        let state = state_from_dto(catalog, &dto).map_err(err_to_js)?;
        let mut rng = SimRng::from_seed(seed);
        let (next, changes) = crate::engine::advance(catalog, &state, ticks, &mut rng);
        let envelope = crate::state::TimeAway {
            start_time: state.updated_at,
            end_time: next.updated_at,
            active_skill: state
                .active_action
                .map(|a| catalog.action(a.action).skill),
            changes,
        };
        let result = serde_json::json!({
            "state": state_to_dto(catalog, &next),
            "timeAway": time_away_to_dto(catalog, &envelope),
        });
        Ok(serde_wasm_bindgen::to_value(&result)?)
    })
}

/// Apply a 0-tick interaction to a persisted state.
#[wasm_bindgen]
pub fn apply_interaction(state: JsValue, interaction: JsValue, seed: u64) -> Result<JsValue, JsValue> {
    CATALOG.with(|catalog| {
        let state_dto: GlobalStateDto = serde_wasm_bindgen::from_value(state)?;
        let interaction_dto: InteractionDto = serde_wasm_bindgen::from_value(interaction)?;
        let state = state_from_dto(catalog, &state_dto).map_err(err_to_js)?;
        let interaction = interaction_from_dto(catalog, &interaction_dto).map_err(err_to_js)?;
        let mut rng = SimRng::from_seed(seed);
        let next = crate::interact::apply_interaction(catalog, &state, &interaction, &mut rng)
            .map_err(err_to_js)?;
        Ok(serde_wasm_bindgen::to_value(&state_to_dto(catalog, &next))?)
    })
}

/// Plan one segment toward a goal, with the default segment config.
#[wasm_bindgen]
pub fn plan_segment(state: JsValue, goal: JsValue) -> Result<JsValue, JsValue> {
    CATALOG.with(|catalog| {
        let state_dto: GlobalStateDto = serde_wasm_bindgen::from_value(state)?;
        let goal_dto: GoalDto = serde_wasm_bindgen::from_value(goal)?;
        let state = state_from_dto(catalog, &state_dto).map_err(err_to_js)?;
        let goal = crate::persist::goal_from_dto(catalog, &goal_dto).map_err(err_to_js)?;
        let plan = crate::plan::plan_segment(catalog, &state, &goal, SegmentConfig::default())
            .map_err(err_to_js)?;
        Ok(serde_wasm_bindgen::to_value(&plan_to_dto(catalog, &plan))?)
    })
}

/// Execute a plan against the engine, returning `{state, boundary}`.
#[wasm_bindgen]
pub fn execute_plan(
    state: JsValue,
    goal: JsValue,
    plan: JsValue,
    seed: u64,
) -> Result<JsValue, JsValue> {
    CATALOG.with(|catalog| {
        let state_dto: GlobalStateDto = serde_wasm_bindgen::from_value(state)?;
        let goal_dto: GoalDto = serde_wasm_bindgen::from_value(goal)?;
        let plan_dto: PlanDto = serde_wasm_bindgen::from_value(plan)?;
        let state = state_from_dto(catalog, &state_dto).map_err(err_to_js)?;
        let goal = crate::persist::goal_from_dto(catalog, &goal_dto).map_err(err_to_js)?;
        let plan = plan_from_dto(catalog, &plan_dto).map_err(err_to_js)?;

        let ctx = SegmentContext::enter(catalog, &state, goal, SegmentConfig::default());
        let mut rng = SimRng::from_seed(seed);
        let outcome = crate::plan::execute_plan(catalog, &state, &plan, &ctx, &mut rng);
        let result = serde_json::json!({
            "state": state_to_dto(catalog, &outcome.state),
            "boundary": outcome
                .boundary
                .as_ref()
                .map(|b| replan_boundary_to_dto(catalog, b)),
        });
        Ok(serde_wasm_bindgen::to_value(&result)?)
    })
}
