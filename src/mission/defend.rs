//! Defend mission: hold the main-base chokepoint
//!
//! Positioning only; actual fighting is handled by the per-unit combat
//! pipeline before a unit ever reaches this code. Units too close to the
//! chokepoint center back off so they do not plug the passage, units in
//! a crowded front rank spread out, and everyone else closes in.

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
        warn!("defend mission active but no chokepoint is known");
        return false;
    };

    let activity = unit.activity;
    if activity.attacking
        || activity.starting_attack
        || activity.attack_anim
        || activity.moving
        || retreat.is_running(unit.id)
    {
        return false;
    }

    // With an enemy this close, positioning would only get in the way of the
    // fight-or-flee logic.
    let enemy_near = !Select::enemy(world)
        .combat_units()
        .in_radius(config.defend_enemy_clearance, unit.position)
        .is_empty();
    if enemy_near {
        return false;
    }

    let center = choke.center;
    let distance = unit.position.distance(&center);
    let range = unit.ground_weapon.max_range;
    let critical = (range + config.defend_range_bonus).max(config.defend_critical_base);

    if distance < critical {
        let back = world
            .bounds()
            .clamp(unit.position.away_from(center, config.defend_step_back));
        orders.push(UnitCommand::move_to(unit.id, back));
        return true;
    }

    if distance <= range + config.defend_close_bonus {
        let stacked = Select::our(world)
            .combat_units()
            .in_radius(config.defend_stack_radius, unit.position)
            .exclude(unit.id)
            .count();
        if stacked > config.defend_stack_limit {
            let back = world
                .bounds()
                .clamp(unit.position.away_from(center, config.defend_step_back));
            orders.push(UnitCommand::move_to(unit.id, back));
            return true;
        }
        return false;
    }

    orders.push(UnitCommand::move_to(unit.id, center));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::core::types::{UnitId, Vec2};
    use crate::world::{Chokepoint, Faction, GridWorld, UnitClass, Weapon};

    fn soldier(id: u32, faction: Faction, pos: Vec2) -> UnitSnapshot {
        UnitSnapshot::new(UnitId(id), faction, UnitClass::Military, pos)
            .with_hp(40, 40)
            .with_ground_weapon(Weapon::new(6.0, 15.0, 4.0))
    }

    fn guarded_world() -> GridWorld {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_chokepoint(Some(Chokepoint::new(Vec2::new(20.0, 20.0), 3.0)));
        world
    }

    fn run(world: &GridWorld, unit: &UnitSnapshot) -> (bool, CommandBuffer) {
        let cfg = CombatConfig::default();
        let retreat = RetreatController::new(cfg.clone());
        let mut orders = CommandBuffer::new();
        let issued = update(&cfg, world, unit, &retreat, &mut orders);
        (issued, orders)
    }

    #[test]
    fn test_no_chokepoint_no_orders() {
        let mut world = GridWorld::new(64, 64).unwrap();
        let unit = soldier(1, Faction::Own, Vec2::new(10.0, 10.0));
        world.add_unit(unit.clone()).unwrap();
        let (issued, orders) = run(&world, &unit);
        assert!(!issued);
        assert!(orders.is_empty());
    }

    #[test]
    fn test_far_unit_moves_to_chokepoint() {
        let mut world = guarded_world();
        let unit = soldier(1, Faction::Own, Vec2::new(40.0, 20.0));
        world.add_unit(unit.clone()).unwrap();
        let (issued, orders) = run(&world, &unit);
        assert!(issued);
        assert_eq!(
            orders.last_for(UnitId(1)).map(|c| c.kind),
            Some(CommandKind::MoveTo(Vec2::new(20.0, 20.0)))
        );
    }

    #[test]
    fn test_too_close_steps_back() {
        let mut world = guarded_world();
        // Critical distance for range 4 is max(3.8, 5) = 5; distance 3.
        let unit = soldier(1, Faction::Own, Vec2::new(23.0, 20.0));
        world.add_unit(unit.clone()).unwrap();
        let (issued, orders) = run(&world, &unit);
        assert!(issued);
        let Some(CommandKind::MoveTo(back)) = orders.last_for(UnitId(1)).map(|c| c.kind) else {
            panic!("expected a move order");
        };
        // One tile directly away from the center.
        assert!((back.x - 24.0).abs() < 1e-4);
        assert!((back.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_enemy_nearby_disables_positioning() {
        let mut world = guarded_world();
        let unit = soldier(1, Faction::Own, Vec2::new(40.0, 20.0));
        world.add_unit(unit.clone()).unwrap();
        world
            .add_unit(soldier(2, Faction::Enemy, Vec2::new(45.0, 20.0)))
            .unwrap();
        let (issued, orders) = run(&world, &unit);
        assert!(!issued);
        assert!(orders.is_empty());
    }

    #[test]
    fn test_busy_unit_left_alone() {
        let mut world = guarded_world();
        let mut unit = soldier(1, Faction::Own, Vec2::new(40.0, 20.0));
        unit.activity.moving = true;
        world.add_unit(unit.clone()).unwrap();
        let (issued, _) = run(&world, &unit);
        assert!(!issued);
    }
}
