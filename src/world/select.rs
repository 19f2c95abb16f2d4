//! Chainable unit selection over a tick snapshot
//!
//! Every query in the decision core is phrased as "units of side S, filtered,
//! within radius r of p". `Select` keeps those call sites readable and pure:
//! it borrows snapshots, never mutates world state.

use ordered_float::OrderedFloat;

use crate::core::types::{UnitId, Vec2};
use crate::world::unit::{Faction, UnitSnapshot};
use crate::world::WorldQuery;

/// A filtered view over unit snapshots.
pub struct Select<'a> {
    units: Vec<&'a UnitSnapshot>,
}

impl<'a> Select<'a> {
    pub fn new(units: Vec<&'a UnitSnapshot>) -> Self {
        Self { units }
    }

    /// All friendly units.
    pub fn our(world: &'a dyn WorldQuery) -> Self {
        Self::new(world.units_of(Faction::Own))
    }

    /// All known enemy units.
    pub fn enemy(world: &'a dyn WorldQuery) -> Self {
        Self::new(world.units_of(Faction::Enemy))
    }

    /// Keep only units that matter in a fight: completed, and buildings only
    /// if they can defend themselves. Workers stay in; they fight badly but
    /// they do fight.
    pub fn combat_units(mut self) -> Self {
        self.units
            .retain(|u| u.is_completed && (!u.is_building || u.is_defensive_building()));
        self
    }

    /// Keep only buildings.
    pub fn buildings(mut self) -> Self {
        self.units.retain(|u| u.is_building);
        self
    }

    /// Keep only units within `radius` tiles of `point`.
    pub fn in_radius(mut self, radius: f32, point: Vec2) -> Self {
        self.units.retain(|u| u.position.distance(&point) <= radius);
        self
    }

    /// Drop one specific unit, typically the unit asking the question.
    pub fn exclude(mut self, id: UnitId) -> Self {
        self.units.retain(|u| u.id != id);
        self
    }

    /// Closest remaining unit to `point`.
    pub fn nearest_to(self, point: Vec2) -> Option<&'a UnitSnapshot> {
        self.units
            .into_iter()
            .min_by_key(|u| OrderedFloat(u.position.distance(&point)))
    }

    /// First remaining unit, in host snapshot order.
    pub fn first(self) -> Option<&'a UnitSnapshot> {
        self.units.into_iter().next()
    }

    pub fn count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn list(self) -> Vec<&'a UnitSnapshot> {
        self.units
    }
}
