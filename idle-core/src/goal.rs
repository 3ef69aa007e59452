//! Player goals: the terminal predicates the planner drives toward.

use crate::catalog::{ActionKind, Catalog};
use crate::rates::Rates;
use crate::state::GlobalState;
use crate::types::{Gp, ItemId, Level, Skill};

/// A terminal predicate with a progress metric and the skills whose training
/// can move it.
#[derive(Debug, Clone, PartialEq)]
pub enum Goal {
    SkillLevel { skill: Skill, level: Level },
    GpTarget { gp: Gp },
    ItemCount { item: ItemId, count: u32 },
}

impl Goal {
    pub fn is_satisfied(&self, catalog: &Catalog, state: &GlobalState) -> bool {
        match self {
            Goal::SkillLevel { skill, level } => state.skill_level(catalog, *skill) >= *level,
            Goal::GpTarget { gp } => state.gp >= *gp,
            Goal::ItemCount { item, count } => state.inventory.count_of(*item) >= *count,
        }
    }

    /// Distance to the goal in its own units (xp, gp, or items).
    pub fn remaining(&self, catalog: &Catalog, state: &GlobalState) -> f64 {
        match self {
            Goal::SkillLevel { skill, level } => catalog
                .xp_table()
                .xp_until_level(state.skill_xp(*skill), *level),
            Goal::GpTarget { gp } => gp.saturating_sub(state.gp) as f64,
            Goal::ItemCount { item, count } => {
                f64::from(count.saturating_sub(state.inventory.count_of(*item)))
            }
        }
    }

    /// Goal units gained per tick under `rates`.
    pub fn progress_per_tick(&self, catalog: &Catalog, rates: &Rates) -> f64 {
        match self {
            Goal::SkillLevel { skill, .. } => rates.xp_rate(*skill),
            Goal::GpTarget { .. } => rates.sellable_gp_per_tick(catalog),
            Goal::ItemCount { item, .. } => rates.net_item_rate(*item),
        }
    }

    /// Skills whose actions bear on this goal. For a consuming skill this
    /// includes the skills that produce its inputs; for an item target, the
    /// skills that produce the item.
    pub fn relevant_skills(&self, catalog: &Catalog) -> Vec<Skill> {
        let mut skills = Vec::new();
        let mut push = |s: Skill| {
            if !skills.contains(&s) {
                skills.push(s);
            }
        };
        match self {
            Goal::SkillLevel { skill, .. } => {
                push(*skill);
                if skill.is_consuming() {
                    for producer in input_producers(catalog, *skill) {
                        push(producer);
                    }
                }
            }
            Goal::GpTarget { .. } => {
                // Credits can come from anywhere; direct earners first.
                for action in catalog.actions() {
                    match action.kind {
                        ActionKind::Thieving(_) | ActionKind::Combat(_) => push(action.skill),
                        ActionKind::Skill => {
                            if action.outputs.iter().any(|d| {
                                d.is_certain() && catalog.item(d.item).sells_for > 0
                            }) {
                                push(action.skill);
                            }
                        }
                    }
                }
            }
            Goal::ItemCount { item, .. } => {
                for action in catalog.actions() {
                    let produces = (0..action.recipe_count()).any(|sel| {
                        action.outputs_for(sel).iter().any(|d| d.item == *item)
                    });
                    if produces {
                        push(action.skill);
                    }
                }
            }
        }
        skills
    }
}

/// Skills producing any input consumed by `skill`'s actions.
fn input_producers(catalog: &Catalog, skill: Skill) -> Vec<Skill> {
    let mut producers = Vec::new();
    for consumer in catalog.actions_for_skill(skill) {
        for selection in 0..consumer.recipe_count() {
            for (input, _) in consumer.inputs_for(selection) {
                for producer in catalog.actions() {
                    if producer.skill == skill {
                        continue;
                    }
                    let makes_it = (0..producer.recipe_count())
                        .any(|sel| producer.outputs_for(sel).iter().any(|d| d.item == *input));
                    if makes_it && !producers.contains(&producer.skill) {
                        producers.push(producer.skill);
                    }
                }
            }
        }
    }
    producers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    #[test]
    fn test_firemaking_goal_watches_woodcutting() {
        let catalog = default_catalog();
        let goal = Goal::SkillLevel {
            skill: Skill::Firemaking,
            level: 2,
        };
        let skills = goal.relevant_skills(&catalog);
        assert!(skills.contains(&Skill::Firemaking));
        assert!(skills.contains(&Skill::Woodcutting));
        assert!(!skills.contains(&Skill::Thieving));
    }

    #[test]
    fn test_skill_goal_remaining() {
        let catalog = default_catalog();
        let state = GlobalState::empty(&catalog);
        let goal = Goal::SkillLevel {
            skill: Skill::Woodcutting,
            level: 2,
        };
        assert!(!goal.is_satisfied(&catalog, &state));
        assert_eq!(goal.remaining(&catalog, &state), 83.0);
    }

    #[test]
    fn test_item_goal_producers() {
        let catalog = default_catalog();
        let logs = catalog.item_by_name("Normal Logs").unwrap();
        let goal = Goal::ItemCount {
            item: logs,
            count: 10,
        };
        assert_eq!(goal.relevant_skills(&catalog), vec![Skill::Woodcutting]);
    }
}
