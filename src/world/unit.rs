//! Per-tick unit snapshots
//!
//! The host engine owns every unit; the decision core only ever sees
//! immutable snapshots taken at the start of the tick. A snapshot carries
//! exactly the attributes the combat evaluation needs.

use serde::{Deserialize, Serialize};

use crate::core::types::{UnitId, Vec2};

/// Which side a unit belongs to, from our point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Own,
    Enemy,
    Neutral,
}

/// Coarse unit classification used by the strength aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    /// Economy unit; fights poorly and only in emergencies.
    Worker,
    /// Ordinary military unit.
    Military,
    /// Weaponless support unit that still matters in a fight.
    Healer,
    /// Static defense valued far above its raw stats (area damage).
    HeavyDefense,
}

/// One weapon's stats, damage already normalized by its hit multiplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: f32,
    pub cooldown: f32,
    pub max_range: f32,
}

impl Weapon {
    pub fn new(damage: f32, cooldown: f32, max_range: f32) -> Self {
        Self { damage, cooldown, max_range }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn can_shoot(&self) -> bool {
        self.damage > 0.0
    }
}

/// What the unit is currently busy with, as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFlags {
    pub attacking: bool,
    /// Attack committed but the first swing has not landed yet.
    pub starting_attack: bool,
    /// Mid swing; the attack cannot be cancelled without wasting it.
    pub attack_anim: bool,
    pub moving: bool,
}

/// Immutable per-tick view of one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub faction: Faction,
    pub class: UnitClass,
    pub position: Vec2,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub is_flyer: bool,
    pub is_building: bool,
    pub is_completed: bool,
    pub ground_weapon: Weapon,
    pub air_weapon: Weapon,
    pub activity: ActivityFlags,
}

impl UnitSnapshot {
    /// Bare snapshot with full health and no weapons; callers layer stats on
    /// top with the `with_*` methods.
    pub fn new(id: UnitId, faction: Faction, class: UnitClass, position: Vec2) -> Self {
        Self {
            id,
            faction,
            class,
            position,
            hit_points: 100,
            max_hit_points: 100,
            is_flyer: false,
            is_building: false,
            is_completed: true,
            ground_weapon: Weapon::none(),
            air_weapon: Weapon::none(),
            activity: ActivityFlags::default(),
        }
    }

    pub fn with_hp(mut self, hit_points: i32, max_hit_points: i32) -> Self {
        self.hit_points = hit_points;
        self.max_hit_points = max_hit_points;
        self
    }

    pub fn with_ground_weapon(mut self, weapon: Weapon) -> Self {
        self.ground_weapon = weapon;
        self
    }

    pub fn with_air_weapon(mut self, weapon: Weapon) -> Self {
        self.air_weapon = weapon;
        self
    }

    pub fn with_flyer(mut self, is_flyer: bool) -> Self {
        self.is_flyer = is_flyer;
        self
    }

    pub fn as_building(mut self, is_completed: bool) -> Self {
        self.is_building = true;
        self.is_completed = is_completed;
        self
    }

    pub fn with_activity(mut self, activity: ActivityFlags) -> Self {
        self.activity = activity;
        self
    }

    /// Hit points as a 0-100 percentage.
    pub fn hp_percent(&self) -> f32 {
        if self.max_hit_points <= 0 {
            return 0.0;
        }
        100.0 * self.hit_points as f32 / self.max_hit_points as f32
    }

    /// Units the per-unit combat pipeline governs: mobile, non-economy.
    pub fn is_combat(&self) -> bool {
        !self.is_building && self.class != UnitClass::Worker
    }

    /// Damage this unit deals against the given target, picking the ground
    /// or air weapon as appropriate.
    pub fn damage_against(&self, target: &UnitSnapshot) -> f32 {
        if target.is_flyer {
            self.air_weapon.damage
        } else {
            self.ground_weapon.damage
        }
    }

    /// Weapon this unit would use against the given target.
    pub fn weapon_against(&self, target: &UnitSnapshot) -> Weapon {
        if target.is_flyer {
            self.air_weapon
        } else {
            self.ground_weapon
        }
    }

    /// True for a building that can defend itself against anything.
    pub fn is_defensive_building(&self) -> bool {
        self.is_building
            && (self.class == UnitClass::HeavyDefense
                || self.ground_weapon.can_shoot()
                || self.air_weapon.can_shoot())
    }

    /// True for a completed building that can hit the given target.
    pub fn is_military_building(&self, against: &UnitSnapshot) -> bool {
        self.is_building
            && self.is_completed
            && (self.damage_against(against) > 0.0 || self.class == UnitClass::HeavyDefense)
    }

    pub fn distance_to(&self, other: &UnitSnapshot) -> f32 {
        self.position.distance(&other.position)
    }
}
