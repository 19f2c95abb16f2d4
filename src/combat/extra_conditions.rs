//! Hard overrides checked before the numeric combat score
//!
//! Two rules short-circuit the evaluator: units defending the main base
//! fight regardless of the odds, and unsupported units retreat regardless of
//! the odds. Both are deliberately blunt; they exist to cover the situations
//! the ratio math gets wrong.

use crate::core::config::CombatConfig;
use crate::combat::retreat::RetreatController;
use crate::world::{Select, UnitSnapshot, WorldQuery};

/// Always-fight / always-retreat rules.
pub struct ExtraConditions {
    config: CombatConfig,
}

impl ExtraConditions {
    pub fn new(config: CombatConfig) -> Self {
        Self { config }
    }

    /// Units close to the main base hold their ground even at bad odds;
    /// losing the base loses the game. Nearly dead units are exempt.
    pub fn should_always_fight(&self, world: &dyn WorldQuery, unit: &UnitSnapshot) -> bool {
        let Some(base) = world.main_base_position() else {
            return false;
        };
        base.distance(&unit.position) < self.config.base_defense_radius
            && unit.hit_points >= self.config.base_defense_min_hp
    }

    /// A unit with an enemy nearby and too little standing support around it
    /// must not engage: it would fight isolated and lose for free. Retreating
    /// neighbors count for nothing.
    pub fn should_always_retreat(
        &self,
        world: &dyn WorldQuery,
        unit: &UnitSnapshot,
        nearest_enemy: Option<&UnitSnapshot>,
        retreat: &RetreatController,
    ) -> bool {
        let Some(enemy) = nearest_enemy else {
            return false;
        };
        if enemy.distance_to(unit) > self.config.lone_enemy_radius {
            return false;
        }

        self.config.support_rules.iter().any(|rule| {
            let standing = Select::our(world)
                .combat_units()
                .in_radius(rule.radius, unit.position)
                .list()
                .iter()
                .filter(|ally| !retreat.is_running(ally.id))
                .count();
            standing <= rule.min_allies
        })
    }
}
