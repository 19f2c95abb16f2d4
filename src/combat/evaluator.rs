//! Local combat-strength evaluation
//!
//! Scores a unit's immediate surroundings as a single signed number:
//! positive means the local fight is winnable, negative means pull back.
//! Scores are cached per unit for a few ticks so repeated queries within a
//! tick are cheap and idempotent.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::types::{ticks_to_seconds, Tick, UnitId};
use crate::world::{Select, UnitClass, UnitSnapshot, WorldQuery};

/// A score together with the tick it was computed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedScore {
    pub value: f32,
    pub computed_at: Tick,
}

/// Which side of the fight an aggregate is computed for. Our own side gets
/// presence bonuses for defensive buildings; the enemy's does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Own,
    Enemy,
}

/// Scores each unit's local combat situation.
pub struct CombatEvaluator {
    config: CombatConfig,
    cache: AHashMap<UnitId, CachedScore>,
}

impl CombatEvaluator {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            cache: AHashMap::new(),
        }
    }

    /// Signed local-strength score for `unit`. Positive favors fighting.
    ///
    /// Returns the no-threat score when no enemy combat unit is within the
    /// enemy scan radius.
    pub fn evaluate(&mut self, world: &dyn WorldQuery, unit: &UnitSnapshot) -> f32 {
        let tick = world.current_tick();
        if let Some(cached) = self.cache.get(&unit.id) {
            if tick.saturating_sub(cached.computed_at) < self.config.eval_cache_ttl {
                return cached.value;
            }
        }

        let enemies = Select::enemy(world)
            .combat_units()
            .in_radius(self.config.enemy_scan_radius, unit.position)
            .list();
        if enemies.is_empty() {
            return self.store(unit.id, tick, self.config.no_threat_score);
        }

        let allies = Select::our(world)
            .combat_units()
            .in_radius(self.config.ally_scan_radius, unit.position)
            .list();

        let enemy_strength = self.aggregate_strength(&enemies, unit, Side::Enemy);
        let own_strength = self.aggregate_strength(&allies, enemies[0], Side::Own);
        let low_health_penalty = (100.0 - unit.hp_percent()) / self.config.low_health_divisor;
        let score = own_strength / enemy_strength - 1.0 - low_health_penalty;

        self.store(unit.id, tick, score)
    }

    /// True if the local situation clears the current safety margin.
    pub fn is_favorable(&mut self, world: &dyn WorldQuery, unit: &UnitSnapshot) -> bool {
        let margin = self.safety_margin(world.current_tick());
        self.evaluate(world, unit) >= margin
    }

    /// True if the local fight is overwhelmingly winnable.
    pub fn is_extremely_favorable(&mut self, world: &dyn WorldQuery, unit: &UnitSnapshot) -> bool {
        let margin = self.safety_margin(world.current_tick()) + self.config.extreme_margin_bonus;
        self.evaluate(world, unit) >= margin
    }

    /// Required local superiority before engaging. Ramps up over game time:
    /// early skirmishes are taken at near-even odds, late-game fights only
    /// with a clear edge.
    pub fn safety_margin(&self, tick: Tick) -> f32 {
        let ramp = ticks_to_seconds(tick) / self.config.safety_margin_ramp_seconds;
        self.config.safety_margin_base + ramp.min(self.config.safety_margin_cap)
    }

    /// Drop cache entries that expired or whose unit no longer exists.
    pub fn prune(&mut self, world: &dyn WorldQuery) {
        let tick = world.current_tick();
        let ttl = self.config.eval_cache_ttl;
        self.cache.retain(|id, cached| {
            tick.saturating_sub(cached.computed_at) < ttl && world.unit(*id).is_some()
        });
    }

    /// Cached score for debug overlays; never triggers a recomputation.
    pub fn cached_score(&self, unit: UnitId) -> Option<CachedScore> {
        self.cache.get(&unit).copied()
    }

    fn store(&mut self, unit: UnitId, tick: Tick, value: f32) -> f32 {
        self.cache.insert(unit, CachedScore { value, computed_at: tick });
        value
    }

    /// Sum the combat value of `units` against a reference target.
    ///
    /// Own-side aggregates additionally earn flat bonuses for defensive
    /// building presence; enemy defensive buildings are taken at face value
    /// (with the heavy-defense exception). The asymmetry is tuned behavior.
    fn aggregate_strength(
        &self,
        units: &[&UnitSnapshot],
        against: &UnitSnapshot,
        side: Side,
    ) -> f32 {
        let cfg = &self.config;
        let mut strength = 0.0;
        let mut defensive_building_found = false;
        let mut defensive_building_in_range = false;

        for unit in units {
            let value = self.unit_value(unit, against);

            if unit.class == UnitClass::Worker {
                strength += cfg.worker_factor * value;
            } else if unit.is_building && unit.is_completed {
                if unit.is_military_building(against) {
                    defensive_building_found = true;
                    if unit.class == UnitClass::HeavyDefense {
                        strength += cfg.heavy_defense_factor * self.reference_value(against);
                    } else {
                        strength += cfg.military_building_factor * value;
                    }
                    if unit.distance_to(against) <= cfg.defensive_range {
                        defensive_building_in_range = true;
                    }
                }
            } else {
                strength += value;
            }
        }

        if side == Side::Own {
            if defensive_building_found {
                strength += cfg.defensive_presence_bonus;
            }
            if defensive_building_in_range {
                strength += cfg.defensive_presence_bonus;
            }
        }

        strength
    }

    /// A single unit's combat value against the given target.
    fn unit_value(&self, unit: &UnitSnapshot, against: &UnitSnapshot) -> f32 {
        let cfg = &self.config;
        let damage = unit.damage_against(against);
        let mut total =
            unit.hit_points as f32 * cfg.hp_factor + damage * cfg.damage_factor;

        // Units that cannot hit the target barely matter, healers excepted.
        if damage == 0.0 && unit.class != UnitClass::Healer {
            total /= cfg.noncombat_divisor;
        }

        total
    }

    /// Value of the reference infantry loadout against the given target,
    /// used to price heavy static defense.
    fn reference_value(&self, against: &UnitSnapshot) -> f32 {
        let cfg = &self.config;
        let reference = &cfg.reference_infantry;
        let damage = if against.is_flyer {
            reference.air_damage
        } else {
            reference.ground_damage
        };
        reference.hit_points as f32 * cfg.hp_factor + damage * cfg.damage_factor
    }
}
