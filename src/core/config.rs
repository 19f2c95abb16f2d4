//! Combat tuning constants with documented defaults
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Distances are in tiles, times in
//! ticks unless noted otherwise.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

/// One local-support requirement for the lone-unit retreat override.
///
/// The override fires when at most `min_allies` non-retreating friendly
/// combat units are found within `radius` tiles of the unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SupportRule {
    pub radius: f32,
    pub min_allies: usize,
}

/// Stats of the reference infantry loadout used to value heavy static
/// defense (which fires that infantry's weapon with area effect, so its raw
/// building stats badly understate it).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReferenceInfantry {
    pub hit_points: i32,
    pub ground_damage: f32,
    pub air_damage: f32,
}

/// Configuration for the combat decision core
///
/// These values have been tuned against real games. Changing them shifts the
/// fight/flee balance and how tightly the army holds its ground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    // === COMBAT EVALUATION ===
    /// Radius around a unit in which enemy combat units count toward the
    /// local threat estimate.
    pub enemy_scan_radius: f32,

    /// Radius around a unit in which friendly combat units count as support.
    ///
    /// Deliberately smaller than `enemy_scan_radius`: allies slightly behind
    /// the unit will not arrive in time to matter.
    pub ally_scan_radius: f32,

    /// Score returned (and cached) when no enemy combat unit is in scan
    /// range. Large enough to dominate every margin check.
    pub no_threat_score: f32,

    /// Multiplier for hit points when evaluating a unit's combat value.
    pub hp_factor: f32,

    /// Multiplier for normalized weapon damage when evaluating a unit's
    /// combat value.
    pub damage_factor: f32,

    /// Divisor applied to units that cannot hit the reference target and are
    /// not healers. Non-combat units contribute little.
    pub noncombat_divisor: f32,

    /// Contribution multiplier for worker-class units.
    pub worker_factor: f32,

    /// Contribution multiplier for completed military buildings.
    pub military_building_factor: f32,

    /// Heavy static defense is valued as this many reference infantry
    /// loadouts instead of its raw stats.
    pub heavy_defense_factor: f32,

    /// Stats of the reference infantry loadout, see `heavy_defense_factor`.
    pub reference_infantry: ReferenceInfantry,

    /// Flat bonus added to our own side when any defensive building is among
    /// the counted units, plus the same again when one is within
    /// `defensive_range` of the reference enemy. Enemy defensive buildings
    /// get no such bonus; the asymmetry is tuned behavior.
    pub defensive_presence_bonus: f32,

    /// Range within which an own defensive building earns the second
    /// presence bonus.
    pub defensive_range: f32,

    /// Denominator of the low-health penalty `(100 - hp%) / d`.
    pub low_health_divisor: f32,

    /// Base required local superiority before engaging. 0.03 = 3%.
    pub safety_margin_base: f32,

    /// Cap on the time-scaled part of the safety margin.
    pub safety_margin_cap: f32,

    /// In-game seconds over which the margin ramps toward the cap.
    pub safety_margin_ramp_seconds: f32,

    /// Extra margin required for the "extremely favorable" verdict.
    pub extreme_margin_bonus: f32,

    /// Cached evaluation scores are valid for this many ticks.
    ///
    /// Must be at least 1 so repeated reads within one tick are idempotent.
    pub eval_cache_ttl: Tick,

    // === HARD OVERRIDES ===
    /// Units within this range of the main base always fight.
    pub base_defense_radius: f32,

    /// ...unless nearly dead: minimum hit points for the forced fight.
    pub base_defense_min_hp: i32,

    /// Nearest-enemy distance beyond which the lone-unit retreat override
    /// does not apply.
    pub lone_enemy_radius: f32,

    /// Local-support doctrine: the lone-unit override fires if any rule is
    /// unsatisfied. See [`CombatConfig::tight_support_rules`] for the
    /// stricter two-tier doctrine.
    pub support_rules: Vec<SupportRule>,

    // === RETREAT ===
    /// The main base is preferred as a rally point only when it is farther
    /// than this from the retreating unit.
    pub rally_min_distance: f32,

    /// Smallest away-vector escape radius tried, in whole tiles.
    pub escape_radius_min: u32,

    /// Largest away-vector escape radius tried, in whole tiles.
    pub escape_radius_max: u32,

    /// Escape points closer than this to the unit are rejected as
    /// degenerate.
    pub escape_min_distance: f32,

    /// While retreating with a score below this, allies within
    /// `flood_radius` are told to retreat too so they do not box in the
    /// escape route.
    pub flood_eval_threshold: f32,

    /// See `flood_eval_threshold`.
    pub flood_radius: f32,

    /// Base number of ticks a unit must keep retreating before a stop
    /// request is honored.
    pub stop_ticks_base: Tick,

    /// Additional hold ticks per non-retreating neighbor; crowded retreats
    /// take longer to resolve.
    pub stop_ticks_per_neighbor: Tick,

    /// Neighborhood radius for the crowding term above.
    pub stop_neighbor_radius: f32,

    /// The orchestrator requests a stop only once the score has recovered to
    /// at least this value.
    pub stop_eval_threshold: f32,

    // === MICRO GUARDS ===
    /// The low-health guard only applies with an enemy within this range.
    pub low_hp_enemy_radius: f32,

    /// Absolute hit-point floor for the low-health guard.
    pub low_hp_flat: i32,

    /// Hit-point percentage floor for the low-health guard.
    pub low_hp_percent: f32,

    /// The guard is skipped when more than `low_hp_max_allies` friendly
    /// combat units stand within this radius; a wounded unit inside a big
    /// army is safer staying put.
    pub low_hp_ally_radius: f32,

    /// See `low_hp_ally_radius`.
    pub low_hp_max_allies: usize,

    /// Scan radius for enemies that might already have this unit in weapon
    /// range.
    pub shoot_range_scan: f32,

    /// Safety buffer added to the unit-enemy distance when comparing against
    /// enemy weapon range.
    pub shoot_range_buffer: f32,

    // === MISSIONS ===
    /// Attack: no order is issued when the unit is already within this
    /// distance of the focus point.
    pub attack_focus_min_distance: f32,

    /// Attack: attempts at sampling a random unexplored scatter point before
    /// giving up for the tick.
    pub scatter_attempts: u32,

    /// Defend: positioning is skipped when an enemy is within this range;
    /// per-unit combat logic takes over instead.
    pub defend_enemy_clearance: f32,

    /// Defend: floor of the critical don't-clump distance from the
    /// chokepoint center (the unit's ground range + 1 applies if larger).
    pub defend_critical_base: f32,

    /// Defend: added to ground weapon range for the critical distance.
    pub defend_range_bonus: f32,

    /// Defend: added to ground weapon range for the close-enough band.
    pub defend_close_bonus: f32,

    /// Defend: anti-stacking radius and the number of *other* allies that
    /// must exceed it to trigger a step away.
    pub defend_stack_radius: f32,

    /// See `defend_stack_radius`.
    pub defend_stack_limit: usize,

    /// Defend: step size when backing off the chokepoint.
    pub defend_step_back: f32,

    /// Prepare: step size when backing off the chokepoint.
    pub prepare_step_back: f32,

    /// Prepare: nudge size when de-stacking.
    pub prepare_nudge: f32,

    /// Prepare: anti-stacking radius; at least `prepare_stack_limit` allies
    /// within it trigger the nudge.
    pub prepare_stack_radius: f32,

    /// See `prepare_stack_radius`.
    pub prepare_stack_limit: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enemy_scan_radius: 12.0,
            ally_scan_radius: 8.5,
            no_threat_score: 999.0,
            hp_factor: 0.2,
            damage_factor: 1.0,
            noncombat_divisor: 15.0,
            worker_factor: 0.2,
            military_building_factor: 1.3,
            heavy_defense_factor: 7.0,
            reference_infantry: ReferenceInfantry {
                hit_points: 40,
                ground_damage: 6.0,
                air_damage: 6.0,
            },
            defensive_presence_bonus: 100.0,
            defensive_range: 8.5,
            low_health_divisor: 80.0,
            safety_margin_base: 0.03,
            safety_margin_cap: 0.1,
            safety_margin_ramp_seconds: 3000.0,
            extreme_margin_bonus: 0.5,
            eval_cache_ttl: 5,
            base_defense_radius: 7.0,
            base_defense_min_hp: 11,
            lone_enemy_radius: 12.2,
            support_rules: vec![SupportRule { radius: 8.0, min_allies: 6 }],
            rally_min_distance: 5.0,
            escape_radius_min: 6,
            escape_radius_max: 9,
            escape_min_distance: 0.8,
            flood_eval_threshold: 0.2,
            flood_radius: 1.5,
            stop_ticks_base: 20,
            stop_ticks_per_neighbor: 10,
            stop_neighbor_radius: 6.0,
            stop_eval_threshold: 0.3,
            low_hp_enemy_radius: 6.0,
            low_hp_flat: 16,
            low_hp_percent: 30.0,
            low_hp_ally_radius: 4.0,
            low_hp_max_allies: 6,
            shoot_range_scan: 12.0,
            shoot_range_buffer: 0.5,
            attack_focus_min_distance: 5.0,
            scatter_attempts: 10,
            defend_enemy_clearance: 15.0,
            defend_critical_base: 3.8,
            defend_range_bonus: 1.0,
            defend_close_bonus: 0.3,
            defend_stack_radius: 1.0,
            defend_stack_limit: 3,
            defend_step_back: 1.0,
            prepare_step_back: 1.5,
            prepare_nudge: 0.2,
            prepare_stack_radius: 0.8,
            prepare_stack_limit: 4,
        }
    }
}

impl CombatConfig {
    /// Two-tier support doctrine for armies built around small squads: both
    /// an inner and an outer support ring must be populated before a unit is
    /// allowed to fight near an enemy.
    pub fn tight_support_rules() -> Vec<SupportRule> {
        vec![
            SupportRule { radius: 2.5, min_allies: 2 },
            SupportRule { radius: 5.0, min_allies: 5 },
        ]
    }
}
