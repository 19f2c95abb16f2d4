//! Prepare mission: stage at the chokepoint without blocking it
//!
//! Like defend, but tuned for sitting in formation rather than holding under
//! pressure: the keep-out zone around the passage scales inversely with its
//! width, and de-stacking uses a gentle nudge instead of a full step so the
//! arc settles instead of oscillating.

use tracing::warn;

use crate::combat::retreat::RetreatController;
use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::CombatConfig;
use crate::world::{Select, UnitSnapshot, WorldQuery};

pub fn update(
    config: &CombatConfig,
    world: &dyn WorldQuery,
    unit: &UnitSnapshot,
    retreat: &RetreatController,
    orders: &mut CommandBuffer,
) -> bool {
    let Some(choke) = world.main_base_chokepoint() else {
        warn!("prepare mission active but no chokepoint is known");
        return false;
    };

    let activity = unit.activity;
    if activity.attacking
        || activity.starting_attack
        || activity.moving
        || retreat.is_running(unit.id)
    {
        return false;
    }

    let center = choke.center;
    let width = choke.width;
    let distance = unit.position.distance(&center);

    // Narrow passages need more clearance; width is in tiles, the original
    // tuning worked in 32-pixel tiles.
    let critical = 2.0 + 2.0 / (width * 32.0);
    if distance < critical {
        let back = world
            .bounds()
            .clamp(unit.position.away_from(center, config.prepare_step_back));
        orders.push(UnitCommand::move_to(unit.id, back));
        return true;
    }

    let close_band = (4.5 - width / 3.0).max(2.5);
    if distance - width <= close_band {
        let stacked = Select::our(world)
            .combat_units()
            .in_radius(config.prepare_stack_radius, unit.position)
            .count();
        if stacked >= config.prepare_stack_limit {
            let nudge = world
                .bounds()
                .clamp(unit.position.away_from(center, config.prepare_nudge));
            orders.push(UnitCommand::move_to(unit.id, nudge));
            return true;
        }
        return false;
    }

    orders.push(UnitCommand::move_to(unit.id, center));
    true
}
