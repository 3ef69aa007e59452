//! End-to-end scenarios against the stock catalog.

use idle_core::{
    Gp, GlobalState, Goal, Interaction, SegmentBoundary, SegmentConfig, SimRng, Skill, Step,
    advance, default_catalog, execute_plan, next_bank_slot_cost, plan_segment, start_action,
};
use idle_core::plan::SegmentContext;

#[test]
fn scenario_woodcut_one_tree() {
    let catalog = default_catalog();
    let mut rng = SimRng::from_seed(1);
    let mut state = GlobalState::empty(&catalog);
    let tree = catalog.action_by_name("Normal Tree").unwrap();
    let logs = catalog.item_by_name("Normal Logs").unwrap();
    start_action(&catalog, &mut state, tree, &mut rng).unwrap();

    // 3 s action: 30 ticks completes exactly once and re-arms.
    let (next, changes) = advance(&catalog, &state, 30, &mut rng);
    assert_eq!(next.inventory.count_of(logs), 1);
    assert_eq!(next.skill_xp(Skill::Woodcutting), 10.0);
    let active = next.active_action.unwrap();
    assert_eq!(active.remaining_ticks, active.total_ticks);
    assert_eq!(changes.ticks_advanced, 30);
}

#[test]
fn scenario_five_completions() {
    let catalog = default_catalog();
    let mut rng = SimRng::from_seed(1);
    let mut state = GlobalState::empty(&catalog);
    let tree = catalog.action_by_name("Normal Tree").unwrap();
    let logs = catalog.item_by_name("Normal Logs").unwrap();
    start_action(&catalog, &mut state, tree, &mut rng).unwrap();

    let (next, _) = advance(&catalog, &state, 150, &mut rng);
    assert_eq!(next.inventory.count_of(logs), 5);
    assert_eq!(next.skill_xp(Skill::Woodcutting), 50.0);
}

#[test]
fn scenario_partial_progress() {
    let catalog = default_catalog();
    let mut rng = SimRng::from_seed(1);
    let mut state = GlobalState::empty(&catalog);
    let tree = catalog.action_by_name("Normal Tree").unwrap();
    start_action(&catalog, &mut state, tree, &mut rng).unwrap();

    let (next, _) = advance(&catalog, &state, 15, &mut rng);
    assert_eq!(next.active_action.unwrap().remaining_ticks, 15);
    assert!(next.inventory.is_empty());
    assert_eq!(next.skill_xp(Skill::Woodcutting), 0.0);
}

#[test]
fn scenario_firemaking_gated_on_producer() {
    let catalog = default_catalog();
    let state = GlobalState::empty(&catalog);
    let goal = Goal::SkillLevel {
        skill: Skill::Firemaking,
        level: 2,
    };

    let plan = plan_segment(&catalog, &state, &goal, SegmentConfig::default()).unwrap();
    assert_eq!(plan.boundary, SegmentBoundary::GoalReached);

    // The schedule must produce logs before it can burn them.
    let tree = catalog.action_by_name("Normal Tree").unwrap();
    let burn = catalog.action_by_name("Burn Normal Logs").unwrap();
    let switches: Vec<_> = plan
        .steps
        .iter()
        .filter_map(|s| match s {
            Step::Interaction(Interaction::SwitchActivity { action }) => Some(*action),
            _ => None,
        })
        .collect();
    let tree_pos = switches.iter().position(|a| *a == tree);
    let burn_pos = switches.iter().position(|a| *a == burn);
    assert!(
        tree_pos.is_some() && burn_pos.is_some() && tree_pos < burn_pos,
        "expected chop-then-burn, got switches {switches:?}"
    );

    // Executing the plan against the real engine reaches the goal.
    let ctx = SegmentContext::enter(&catalog, &state, goal.clone(), SegmentConfig::default());
    let mut rng = SimRng::from_seed(21);
    let outcome = execute_plan(&catalog, &state, &plan, &ctx, &mut rng);
    assert!(
        goal.is_satisfied(&catalog, &outcome.state),
        "firemaking level {} after execution",
        outcome.state.skill_level(&catalog, Skill::Firemaking)
    );
}

#[test]
fn scenario_time_away_envelope() {
    let catalog = default_catalog();
    let mut rng = SimRng::from_seed(13);
    let mut state = GlobalState::empty(&catalog);
    state.updated_at = 1_700_000_000_000;
    let tree = catalog.action_by_name("Normal Tree").unwrap();
    let logs = catalog.item_by_name("Normal Logs").unwrap();
    idle_core::start_action(&catalog, &mut state, tree, &mut rng).unwrap();

    // An hour offline: 36 000 ticks, 1 200 chops.
    let now = state.updated_at + 3_600_000;
    let (next, time_away) = idle_core::advance_time_away(&catalog, &state, now, &mut rng);
    assert_eq!(time_away.start_time, 1_700_000_000_000);
    assert_eq!(time_away.end_time, now);
    assert_eq!(time_away.active_skill, Some(Skill::Woodcutting));
    assert_eq!(time_away.changes.inventory_delta[&logs], 1_200);
    assert_eq!(time_away.changes.skill_xp_delta[&Skill::Woodcutting], 12_000.0);
    // 12 000 xp lands in the middle of the table.
    let window = time_away.changes.level_ups[&Skill::Woodcutting];
    assert_eq!(window.start_level, 1);
    assert_eq!(
        window.end_level,
        next.skill_level(&catalog, Skill::Woodcutting)
    );
    assert_eq!(next.updated_at, now);
    assert_eq!(next.time_away, Some(time_away));
}

#[test]
fn scenario_bank_slot_cost_table() {
    let expected: [Gp; 10] = [34, 59, 89, 126, 172, 226, 291, 368, 459, 566];
    for (n, want) in expected.iter().enumerate() {
        assert_eq!(next_bank_slot_cost(n as u32), *want, "slot {}", n + 1);
    }
}

#[test]
fn scenario_xp_progress_monotone() {
    let catalog = default_catalog();
    let table = catalog.xp_table();
    let mut last_level = 0;
    let mut xp = 0.0;
    while xp <= 100_000.0 {
        let p = table.xp_progress_for_xp(xp);
        assert!(
            (0.0..=1.0).contains(&p.progress),
            "progress {} at xp {xp}",
            p.progress
        );
        assert!(p.level >= last_level, "level decreased at xp {xp}");
        last_level = p.level;
        xp += 100.0;
    }
}
