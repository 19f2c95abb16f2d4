//! Army-wide mission state
//!
//! Exactly one mission is active at a time and applies to the whole army.
//! Mission selection itself is the host's call (strategy layer); this module
//! only answers "where should the army point" and "what should this idle
//! unit do about it". Per-unit fight-or-flee decisions always run first and
//! a unit only reaches its mission when none of them fired.

pub mod attack;
pub mod defend;
pub mod prepare;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::retreat::RetreatController;
use crate::command::CommandBuffer;
use crate::core::config::CombatConfig;
use crate::core::types::Vec2;
use crate::world::{UnitSnapshot, WorldQuery};

/// The army-wide posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mission {
    /// Push toward the enemy base, or wherever the enemy still lives.
    Attack,
    /// Hold the main-base chokepoint.
    Defend,
    /// Stage at the chokepoint in a loose arc, ready to switch postures.
    Prepare,
}

/// Dispatches idle units to the active mission's positioning logic.
pub struct MissionStateMachine {
    config: CombatConfig,
    active: Mission,
    rng: StdRng,
}

impl MissionStateMachine {
    /// Starts in [`Mission::Defend`]; the strategy layer switches postures
    /// through [`set_active`](Self::set_active).
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            active: Mission::Defend,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for tests and replays; the seed only affects
    /// the attack mission's exploration scatter.
    pub fn with_seed(config: CombatConfig, seed: u64) -> Self {
        Self {
            config,
            active: Mission::Defend,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn active(&self) -> Mission {
        self.active
    }

    pub fn set_active(&mut self, mission: Mission) {
        if mission != self.active {
            debug!(from = ?self.active, to = ?mission, "mission change");
            self.active = mission;
        }
    }

    /// Where the active mission currently points the army, if anywhere.
    pub fn focus_point(&self, world: &dyn WorldQuery) -> Option<Vec2> {
        match self.active {
            Mission::Attack => attack::focus_point(world),
            Mission::Defend | Mission::Prepare => {
                world.main_base_chokepoint().map(|c| c.center)
            }
        }
    }

    /// Run the active mission's per-unit logic. Returns true if an order was
    /// issued for the unit this tick.
    pub fn update(
        &mut self,
        world: &dyn WorldQuery,
        unit: &UnitSnapshot,
        retreat: &RetreatController,
        orders: &mut CommandBuffer,
    ) -> bool {
        match self.active {
            Mission::Attack => {
                attack::update(&self.config, world, unit, retreat, &mut self.rng, orders)
            }
            Mission::Defend => defend::update(&self.config, world, unit, retreat, orders),
            Mission::Prepare => prepare::update(&self.config, world, unit, retreat, orders),
        }
    }
}
