//! Action definitions: skill activities, thieving targets, and combat
//! encounters, plus their durations, recipes, and drops.

use rand::Rng;

use crate::types::{ActionId, Gp, ItemId, Level, Skill, Ticks, Xp, ticks_to_seconds};

// === DURATION ===

/// Fixed or uniformly-ranged action duration in ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationSpec {
    Fixed(Ticks),
    Uniform { min: Ticks, max: Ticks },
}

impl DurationSpec {
    /// Arithmetic mean of the endpoints.
    pub fn mean_ticks(self) -> f64 {
        match self {
            DurationSpec::Fixed(ticks) => ticks as f64,
            DurationSpec::Uniform { min, max } => (min + max) as f64 / 2.0,
        }
    }

    /// Roll a concrete duration. Fixed durations do not consume randomness.
    pub fn roll<R: Rng>(self, rng: &mut R) -> Ticks {
        match self {
            DurationSpec::Fixed(ticks) => ticks,
            DurationSpec::Uniform { min, max } => rng.random_range(min..=max),
        }
    }

    pub fn mean_seconds(self) -> f64 {
        ticks_to_seconds(self.mean_ticks().round() as Ticks)
    }
}

// === DROPS ===

/// A weighted item grant: `count` of `item` with probability `rate`.
/// Deterministic outputs are drops with rate 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drop {
    pub item: ItemId,
    pub count: u32,
    pub rate: f64,
}

impl Drop {
    pub fn certain(item: ItemId, count: u32) -> Self {
        Self {
            item,
            count,
            rate: 1.0,
        }
    }

    pub fn rare(item: ItemId, count: u32, rate: f64) -> Self {
        Self { item, count, rate }
    }

    /// Expected items per completion.
    pub fn expected_items(&self) -> f64 {
        self.count as f64 * self.rate
    }

    /// Is this a deterministic output rather than a chance roll?
    pub fn is_certain(&self) -> bool {
        self.rate >= 1.0
    }
}

/// A level-gated drop granted on any completion within a skill.
#[derive(Debug, Clone, Copy)]
pub struct SkillDrop {
    pub skill: Skill,
    pub min_level: Level,
    pub drop: Drop,
}

// === RECIPES ===

/// An alternative input/output set for an action. The action's base inputs
/// and outputs form recipe 0; catalog alternatives follow.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub inputs: Vec<(ItemId, u32)>,
    pub outputs: Vec<Drop>,
}

// === VARIANT EXTRAS ===

/// Thieving attempt parameters. Failure stuns and deals uniform [1..max_hit]
/// damage.
#[derive(Debug, Clone, Copy)]
pub struct ThievingSpec {
    pub perception: f64,
    pub max_gold: Gp,
    pub max_hit: u32,
    pub stun_ticks: Ticks,
}

/// Combat encounter parameters.
#[derive(Debug, Clone)]
pub struct CombatSpec {
    /// Ticks between player attacks.
    pub attack_speed: Ticks,
    /// Maximum player hit per attack.
    pub max_hit: u32,
    /// Ticks between monster attacks.
    pub monster_attack_speed: Ticks,
    pub monster_max_hit: u32,
    /// Fraction of incoming damage absorbed, in [0, 1).
    pub damage_reduction: f64,
    pub monster_hp: u32,
    pub respawn_ticks: Ticks,
    pub gp_min: Gp,
    pub gp_max: Gp,
    pub drops: Vec<Drop>,
}

/// Mining node parameters: completions deplete the node, which then respawns
/// on a timer.
#[derive(Debug, Clone, Copy)]
pub struct MiningSpec {
    pub node_hp: u32,
    pub node_respawn_ticks: Ticks,
}

/// Polymorphic action variant data.
#[derive(Debug, Clone)]
pub enum ActionKind {
    Skill,
    Thieving(ThievingSpec),
    Combat(CombatSpec),
}

// === ACTION ===

/// A named, level-gated, producing/consuming activity.
#[derive(Debug, Clone)]
pub struct ActionDef {
    pub id: ActionId,
    pub name: String,
    pub skill: Skill,
    pub unlock_level: Level,
    pub duration: DurationSpec,
    pub xp: Xp,
    /// Inputs consumed per completion (recipe 0).
    pub inputs: Vec<(ItemId, u32)>,
    /// Outputs granted per completion (recipe 0).
    pub outputs: Vec<Drop>,
    /// Alternative recipes, selectable per action state.
    pub recipes: Vec<Recipe>,
    pub kind: ActionKind,
    pub mining: Option<MiningSpec>,
}

impl ActionDef {
    pub fn new(
        id: ActionId,
        name: impl Into<String>,
        skill: Skill,
        unlock_level: Level,
        duration: DurationSpec,
        xp: Xp,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            skill,
            unlock_level,
            duration,
            xp,
            inputs: Vec::new(),
            outputs: Vec::new(),
            recipes: Vec::new(),
            kind: ActionKind::Skill,
            mining: None,
        }
    }

    pub fn with_input(mut self, item: ItemId, count: u32) -> Self {
        self.inputs.push((item, count));
        self
    }

    pub fn with_output(mut self, drop: Drop) -> Self {
        self.outputs.push(drop);
        self
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.push(recipe);
        self
    }

    pub fn thieving(mut self, spec: ThievingSpec) -> Self {
        self.kind = ActionKind::Thieving(spec);
        self
    }

    pub fn combat(mut self, spec: CombatSpec) -> Self {
        self.kind = ActionKind::Combat(spec);
        self
    }

    pub fn with_mining(mut self, spec: MiningSpec) -> Self {
        self.mining = Some(spec);
        self
    }

    /// Total selectable recipes: the base set plus catalog alternatives.
    pub fn recipe_count(&self) -> usize {
        1 + self.recipes.len()
    }

    /// Inputs for the selected recipe. Selection 0 is the base set.
    pub fn inputs_for(&self, selection: usize) -> &[(ItemId, u32)] {
        if selection == 0 || selection > self.recipes.len() {
            &self.inputs
        } else {
            &self.recipes[selection - 1].inputs
        }
    }

    /// Outputs for the selected recipe. Selection 0 is the base set.
    pub fn outputs_for(&self, selection: usize) -> &[Drop] {
        if selection == 0 || selection > self.recipes.len() {
            &self.outputs
        } else {
            &self.recipes[selection - 1].outputs
        }
    }

    /// Does completing this action consume any inputs?
    pub fn consumes_inputs(&self, selection: usize) -> bool {
        !self.inputs_for(selection).is_empty()
    }

    pub fn is_thieving(&self) -> bool {
        matches!(self.kind, ActionKind::Thieving(_))
    }

    pub fn is_combat(&self) -> bool {
        matches!(self.kind, ActionKind::Combat(_))
    }
}
