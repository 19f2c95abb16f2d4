//! Retreat state and escape-route search
//!
//! Remembers, per unit, where it is running to and since when. Stopping is
//! deliberately sticky: a retreat decision holds for a minimum number of
//! ticks so an oscillating combat score cannot make units flap between
//! advancing and fleeing every frame.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::evaluator::CombatEvaluator;
use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::CombatConfig;
use crate::core::types::{Tick, UnitId, Vec2};
use crate::world::{Select, UnitSnapshot, WorldQuery};

/// Per-unit retreat bookkeeping. Exists only while the unit is running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetreatState {
    pub destination: Vec2,
    pub decided_at: Tick,
}

/// Computes escape destinations and tracks which units are running.
pub struct RetreatController {
    config: CombatConfig,
    states: AHashMap<UnitId, RetreatState>,
}

impl RetreatController {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            states: AHashMap::new(),
        }
    }

    /// True if the unit currently holds a retreat destination.
    pub fn is_running(&self, unit: UnitId) -> bool {
        self.states.contains_key(&unit)
    }

    /// Where the unit is running to, while it is running.
    pub fn destination(&self, unit: UnitId) -> Option<Vec2> {
        self.states.get(&unit).map(|s| s.destination)
    }

    /// Make the unit run from `threat` (or from the nearest enemy when no
    /// threat is given). Returns true if a move order was issued this tick.
    ///
    /// A retreat that still evaluates as dire floods outward: every
    /// non-running ally close enough to block the escape route is told to
    /// run too. The cascade terminates because the running set only grows
    /// within a tick.
    pub fn run_from(
        &mut self,
        world: &dyn WorldQuery,
        evaluator: &mut CombatEvaluator,
        unit: &UnitSnapshot,
        threat: Option<&UnitSnapshot>,
        orders: &mut CommandBuffer,
    ) -> bool {
        let away_from = threat.map(|t| t.position).or_else(|| {
            Select::enemy(world)
                .nearest_to(unit.position)
                .map(|e| e.position)
        });

        let Some(destination) = self.find_escape_point(world, unit, away_from) else {
            debug!(unit = unit.id.0, "no escape route found");
            return false;
        };

        self.states.insert(
            unit.id,
            RetreatState {
                destination,
                decided_at: world.current_tick(),
            },
        );

        if destination == unit.position {
            return false;
        }

        orders.push(UnitCommand::move_to(unit.id, destination));
        debug!(
            unit = unit.id.0,
            x = destination.x,
            y = destination.y,
            "retreat order issued"
        );

        if evaluator.evaluate(world, unit) < self.config.flood_eval_threshold {
            self.notify_allies_around(world, evaluator, unit, orders);
        }

        true
    }

    /// Honor a stop request only after the hysteresis window has elapsed.
    /// Returns true if the unit is no longer running.
    pub fn request_stop(&mut self, world: &dyn WorldQuery, unit: UnitId) -> bool {
        let Some(state) = self.states.get(&unit) else {
            return true;
        };
        let Some(snapshot) = world.unit(unit) else {
            // Unit died while running; nothing left to keep retreating.
            self.states.remove(&unit);
            return true;
        };

        let elapsed = world.current_tick().saturating_sub(state.decided_at);
        if elapsed >= self.min_ticks_before_stop(world, snapshot.position) {
            self.states.remove(&unit);
            debug!(unit = unit.0, "retreat ended");
            true
        } else {
            false
        }
    }

    /// Ticks since the unit's latest retreat decision.
    pub fn ticks_since_last_decision(&self, world: &dyn WorldQuery, unit: UnitId) -> Option<Tick> {
        self.states
            .get(&unit)
            .map(|s| world.current_tick().saturating_sub(s.decided_at))
    }

    /// Minimum commitment to a retreat decision at the given spot. Crowded
    /// retreats resolve slower: every standing neighbor adds hold time.
    pub fn min_ticks_before_stop(&self, world: &dyn WorldQuery, position: Vec2) -> Tick {
        let standing_neighbors = Select::our(world)
            .in_radius(self.config.stop_neighbor_radius, position)
            .list()
            .iter()
            .filter(|u| !self.is_running(u.id))
            .count() as Tick;
        self.config.stop_ticks_base + self.config.stop_ticks_per_neighbor * standing_neighbors
    }

    /// Ticks the unit must keep running before a stop request can succeed.
    pub fn ticks_still_required(&self, world: &dyn WorldQuery, unit: UnitId) -> Tick {
        let Some(state) = self.states.get(&unit) else {
            return 0;
        };
        let Some(snapshot) = world.unit(unit) else {
            return 0;
        };
        let elapsed = world.current_tick().saturating_sub(state.decided_at);
        self.min_ticks_before_stop(world, snapshot.position)
            .saturating_sub(elapsed)
    }

    /// Drop state for units that no longer exist.
    pub fn prune(&mut self, world: &dyn WorldQuery) {
        self.states.retain(|id, _| world.unit(*id).is_some());
    }

    /// Pick where to run. The main base is the preferred rally point when it
    /// exists and is not right next to the unit; otherwise search for a
    /// reachable point directly away from the threat.
    fn find_escape_point(
        &self,
        world: &dyn WorldQuery,
        unit: &UnitSnapshot,
        away_from: Option<Vec2>,
    ) -> Option<Vec2> {
        let base = world.main_base_position();
        if let Some(base) = base {
            if base.distance(&unit.position) > self.config.rally_min_distance {
                return Some(base);
            }
        }

        let away_from = match away_from {
            Some(p) if p != unit.position => p,
            _ => return base,
        };

        let bounds = world.bounds();
        let max_radius = self.config.escape_radius_max;
        for radius in self.config.escape_radius_min..=max_radius {
            let candidate = bounds.clamp(unit.position.away_from(away_from, radius as f32));
            if world.is_buildable(candidate)
                && world.has_path(unit.position, candidate)
                && world.are_connected(unit.position, candidate)
            {
                let distance = unit.position.distance(&candidate);
                if distance >= self.config.escape_min_distance
                    && distance <= max_radius as f32 + 1.0
                {
                    return Some(candidate);
                }
                break;
            }
        }

        base
    }

    fn notify_allies_around(
        &mut self,
        world: &dyn WorldQuery,
        evaluator: &mut CombatEvaluator,
        unit: &UnitSnapshot,
        orders: &mut CommandBuffer,
    ) {
        let neighbors: Vec<&UnitSnapshot> = Select::our(world)
            .in_radius(self.config.flood_radius, unit.position)
            .exclude(unit.id)
            .list();

        for ally in neighbors {
            if !self.is_running(ally.id) {
                self.run_from(world, evaluator, ally, None, orders);
            }
        }
    }
}
