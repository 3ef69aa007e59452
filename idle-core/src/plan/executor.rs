//! Plan execution: replay a schedule against the real tick engine.
//!
//! Rates are expectations and tick outcomes are stochastic, so waits run
//! with early-termination semantics: drive the engine in chunks, stop as
//! soon as the wait condition is satisfied or a material boundary appears,
//! and report divergence as a structured [`ReplanBoundary`] instead of
//! failing the whole plan.

use crate::catalog::Catalog;
use crate::engine::{SimRng, consume_ticks};
use crate::state::{Changes, GlobalState, StopCause};
use crate::types::Ticks;

use super::boundary::{ReplanBoundary, SegmentBoundary};
use super::candidates::enumerate_candidates;
use super::segment::{Plan, SegmentContext, Step};

/// Engine ticks between wait-condition checks.
const WAIT_CHECK_CHUNK: Ticks = 25;

/// The result of driving a plan: the final state, everything that happened,
/// and the boundary that interrupted execution, if any.
#[derive(Debug)]
pub struct ExecuteOutcome {
    pub state: GlobalState,
    pub changes: Changes,
    pub boundary: Option<ReplanBoundary>,
}

/// Replay `plan` from `state`. Returns at the first material divergence.
pub fn execute_plan(
    catalog: &Catalog,
    state: &GlobalState,
    plan: &Plan,
    ctx: &SegmentContext,
    rng: &mut SimRng,
) -> ExecuteOutcome {
    let mut current = state.clone();
    let mut changes = Changes::default();
    let mut ticks_into_plan: Ticks = 0;

    for (index, step) in plan.steps.iter().enumerate() {
        match step {
            Step::Interaction(interaction) => {
                match crate::interact::apply_interaction(catalog, &current, interaction, rng) {
                    Ok(next) => current = next,
                    Err(error) => {
                        return ExecuteOutcome {
                            state: current,
                            changes,
                            boundary: Some(ReplanBoundary {
                                boundary: SegmentBoundary::Error { error },
                                at_step: index,
                                ticks_into_plan,
                            }),
                        };
                    }
                }
            }
            Step::Wait { ticks, wait_for } => {
                // Planned waits are expectations; grant some overtime before
                // declaring divergence so near-misses resolve themselves.
                let slack = (*ticks / 4).max(WAIT_CHECK_CHUNK * 4);
                let mut remaining = ticks.saturating_add(slack);
                while remaining > 0 {
                    if wait_for.is_satisfied(catalog, &current) {
                        break;
                    }
                    let chunk = remaining.min(WAIT_CHECK_CHUNK);
                    let (next, chunk_changes) = consume_ticks(catalog, &current, chunk, rng);
                    ticks_into_plan += chunk_changes.ticks_advanced;
                    remaining = remaining.saturating_sub(chunk_changes.ticks_advanced.max(1));
                    changes.merge(&chunk_changes);

                    let boundary = wait_boundary(catalog, ctx, &next, &chunk_changes);
                    let stalled = chunk_changes.ticks_advanced == 0;
                    current = next;
                    if let Some(boundary) = boundary {
                        if is_material(catalog, ctx, &current, &boundary) {
                            return ExecuteOutcome {
                                state: current,
                                changes,
                                boundary: Some(ReplanBoundary {
                                    boundary,
                                    at_step: index,
                                    ticks_into_plan,
                                }),
                            };
                        }
                    }
                    if stalled {
                        // The engine cannot consume this wait at all; fall
                        // through to the expiry check instead of spinning.
                        remaining = 0;
                    }
                }
                if remaining == 0 && !wait_for.is_satisfied(catalog, &current) {
                    return ExecuteOutcome {
                        state: current,
                        changes,
                        boundary: Some(ReplanBoundary {
                            boundary: SegmentBoundary::WaitExpired,
                            at_step: index,
                            ticks_into_plan,
                        }),
                    };
                }
            }
        }
    }

    let boundary = ctx
        .goal
        .is_satisfied(catalog, &current)
        .then(|| ReplanBoundary {
            boundary: SegmentBoundary::GoalReached,
            at_step: plan.steps.len(),
            ticks_into_plan,
        });
    ExecuteOutcome {
        state: current,
        changes,
        boundary,
    }
}

/// Inspect a chunk's outcome for boundary events.
fn wait_boundary(
    catalog: &Catalog,
    ctx: &SegmentContext,
    state: &GlobalState,
    chunk: &Changes,
) -> Option<SegmentBoundary> {
    if let Some(stop) = chunk.stop {
        return Some(match stop {
            StopCause::InputsMissing { action, .. } => SegmentBoundary::InputsDepleted { action },
            StopCause::InventoryFull { .. } => SegmentBoundary::InventoryFull,
            StopCause::NodeDepleted { action } => SegmentBoundary::InputsDepleted { action },
            StopCause::Idle => SegmentBoundary::DeadEnd,
        });
    }
    if chunk.deaths > 0 {
        return Some(SegmentBoundary::Death);
    }

    // A watched unlock crossed mid-wait.
    for (skill, window) in &chunk.level_ups {
        if let Some(levels) = ctx.candidates.watch.unlock_levels.get(skill) {
            if let Some(level) = levels
                .iter()
                .find(|l| **l > window.start_level && **l <= window.end_level)
            {
                return Some(SegmentBoundary::UnlockObserved {
                    skill: *skill,
                    level: *level,
                });
            }
        }
    }

    // A watched upgrade became affordable ahead of schedule.
    for purchase in &ctx.candidates.watch.upgrade_purchase_ids {
        let cost = catalog
            .purchase(*purchase)
            .next_cost(state.shop.bank_slots);
        if crate::interact::effective_credits(catalog, state, &ctx.sell_policy) >= cost {
            return Some(SegmentBoundary::UpgradeAffordable {
                purchase: *purchase,
            });
        }
    }

    // Inventory pressure.
    if ctx.config.stop_at_inventory_pressure {
        let occupancy =
            state.inventory.slots_used() as f64 / state.bank_capacity(catalog) as f64;
        if occupancy >= ctx.config.inventory_pressure_threshold {
            return Some(SegmentBoundary::InventoryPressure);
        }
    }

    None
}

/// Materiality is judged against the *current* candidates so that stale
/// watch entries cannot interrupt execution.
fn is_material(
    catalog: &Catalog,
    ctx: &SegmentContext,
    state: &GlobalState,
    boundary: &SegmentBoundary,
) -> bool {
    let candidates = enumerate_candidates(
        catalog,
        state,
        &ctx.goal,
        ctx.config.inventory_pressure_threshold,
    );
    match boundary {
        SegmentBoundary::UnlockObserved { .. } if !ctx.config.stop_at_unlock_boundary => false,
        SegmentBoundary::UpgradeAffordable { .. } if !ctx.config.stop_at_upgrade_affordable => {
            false
        }
        SegmentBoundary::InputsDepleted { .. } if !ctx.config.stop_at_inputs_depleted => false,
        _ => boundary.is_material(&candidates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::goal::Goal;
    use crate::plan::segment::{SegmentConfig, plan_segment};
    use crate::types::Skill;

    #[test]
    fn test_execute_simple_plan_reaches_goal() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = Goal::SkillLevel {
            skill: Skill::Woodcutting,
            level: 2,
        };

        let plan = plan_segment(&catalog, &state, &goal, SegmentConfig::default()).unwrap();
        let ctx = SegmentContext::enter(&catalog, &state, goal.clone(), SegmentConfig::default());
        let mut rng = SimRng::from_seed(11);
        let outcome = execute_plan(&catalog, &state, &plan, &ctx, &mut rng);

        assert!(goal.is_satisfied(&catalog, &outcome.state));
        assert!(matches!(
            outcome.boundary,
            Some(ReplanBoundary {
                boundary: SegmentBoundary::GoalReached,
                ..
            })
        ));
    }

    #[test]
    fn test_wait_terminates_early_when_condition_fires() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = Goal::SkillLevel {
            skill: Skill::Woodcutting,
            level: 2,
        };
        let ctx = SegmentContext::enter(&catalog, &state, goal, SegmentConfig::default());

        // A wait far longer than the condition needs.
        let tree = catalog.action_by_name("Normal Tree").unwrap();
        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let plan = Plan {
            steps: vec![
                Step::Interaction(crate::interact::Interaction::SwitchActivity { action: tree }),
                Step::Wait {
                    ticks: 1_000_000,
                    wait_for: crate::waitfor::WaitFor::InventoryAtLeast {
                        item: logs,
                        count: 2,
                    },
                },
            ],
            expected_ticks: 60,
            boundary: SegmentBoundary::PlannedSegmentStop,
        };

        let mut rng = SimRng::from_seed(3);
        let outcome = execute_plan(&catalog, &state, &plan, &ctx, &mut rng);
        assert_eq!(outcome.state.inventory.count_of(logs), 2);
        // Two chops plus at most one check chunk of slack.
        assert!(outcome.changes.ticks_advanced < 100);
    }
}
