//! Attack mission: push at the enemy wherever they still are
//!
//! The focus point degrades gracefully as intel runs out: known enemy base,
//! then their forward buildings, then any visible unit, then the nearest
//! unexplored starting location. With nothing at all left to aim at, units
//! scatter toward random unexplored ground until something is found.

use rand::rngs::StdRng;
use rand::Rng;

use crate::combat::retreat::RetreatController;
use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::CombatConfig;
use crate::core::types::Vec2;
use crate::world::{Select, UnitSnapshot, WorldQuery};

/// Best current guess at where the enemy is.
pub fn focus_point(world: &dyn WorldQuery) -> Option<Vec2> {
    if let Some(base) = world.enemy_base_position() {
        return Some(base);
    }

    let anchor = world.main_base_position().unwrap_or_default();
    if let Some(building) = Select::enemy(world).buildings().nearest_to(anchor) {
        return Some(building.position);
    }
    if let Some(enemy) = Select::enemy(world).first() {
        return Some(enemy.position);
    }

    world.nearest_unexplored_start(anchor)
}

pub fn update(
    config: &CombatConfig,
    world: &dyn WorldQuery,
    unit: &UnitSnapshot,
    retreat: &RetreatController,
    rng: &mut StdRng,
    orders: &mut CommandBuffer,
) -> bool {
    // Units already engaged or fleeing keep doing that.
    if unit.activity.attacking || unit.activity.starting_attack || retreat.is_running(unit.id) {
        return false;
    }

    if let Some(focus) = focus_point(world) {
        if unit.position.distance(&focus) > config.attack_focus_min_distance {
            orders.push(UnitCommand::attack_move(unit.id, focus));
            return true;
        }
        return false;
    }

    // The map has gone quiet: sweep unexplored ground until the enemy turns
    // up again.
    let bounds = world.bounds();
    for _ in 0..config.scatter_attempts {
        let point = Vec2::new(
            rng.gen_range(0.0..bounds.width),
            rng.gen_range(0.0..bounds.height),
        );
        if !world.is_explored(point) && world.are_connected(unit.position, point) {
            orders.push(UnitCommand::attack_move(unit.id, point));
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::command::CommandKind;
    use crate::core::types::UnitId;
    use crate::world::{Faction, GridWorld, UnitClass, Weapon};

    fn soldier(id: u32, faction: Faction, pos: Vec2) -> UnitSnapshot {
        UnitSnapshot::new(UnitId(id), faction, UnitClass::Military, pos)
            .with_hp(40, 40)
            .with_ground_weapon(Weapon::new(6.0, 15.0, 4.0))
    }

    #[test]
    fn test_focus_prefers_enemy_base() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_enemy_base(Some(Vec2::new(50.0, 50.0)));
        world
            .add_unit(soldier(1, Faction::Enemy, Vec2::new(10.0, 10.0)))
            .unwrap();
        assert_eq!(focus_point(&world), Some(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn test_focus_falls_back_to_buildings_then_units() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_main_base(Some(Vec2::new(5.0, 5.0)));
        world
            .add_unit(soldier(1, Faction::Enemy, Vec2::new(40.0, 40.0)))
            .unwrap();
        world
            .add_unit(soldier(2, Faction::Enemy, Vec2::new(30.0, 30.0)).as_building(true))
            .unwrap();
        world
            .add_unit(soldier(3, Faction::Enemy, Vec2::new(50.0, 50.0)).as_building(true))
            .unwrap();

        // Nearest enemy building to our base wins over the mobile unit.
        assert_eq!(focus_point(&world), Some(Vec2::new(30.0, 30.0)));

        world.remove_unit(UnitId(2));
        world.remove_unit(UnitId(3));
        assert_eq!(focus_point(&world), Some(Vec2::new(40.0, 40.0)));
    }

    #[test]
    fn test_focus_falls_back_to_unexplored_start() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_main_base(Some(Vec2::new(5.0, 5.0)));
        world.add_start_location(Vec2::new(60.0, 5.0));
        assert_eq!(focus_point(&world), Some(Vec2::new(60.0, 5.0)));

        world.mark_explored(Vec2::new(60.0, 5.0));
        assert_eq!(focus_point(&world), None);
    }

    #[test]
    fn test_distant_unit_attack_moves_to_focus() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_enemy_base(Some(Vec2::new(50.0, 50.0)));
        let unit = soldier(1, Faction::Own, Vec2::new(10.0, 10.0));
        world.add_unit(unit.clone()).unwrap();

        let cfg = CombatConfig::default();
        let retreat = RetreatController::new(cfg.clone());
        let mut rng = StdRng::seed_from_u64(1);
        let mut orders = CommandBuffer::new();
        assert!(update(&cfg, &world, &unit, &retreat, &mut rng, &mut orders));
        assert_eq!(
            orders.last_for(UnitId(1)).map(|c| c.kind),
            Some(CommandKind::AttackMove(Vec2::new(50.0, 50.0)))
        );
    }

    #[test]
    fn test_unit_near_focus_holds() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_enemy_base(Some(Vec2::new(50.0, 50.0)));
        let unit = soldier(1, Faction::Own, Vec2::new(48.0, 50.0));
        world.add_unit(unit.clone()).unwrap();

        let cfg = CombatConfig::default();
        let retreat = RetreatController::new(cfg.clone());
        let mut rng = StdRng::seed_from_u64(1);
        let mut orders = CommandBuffer::new();
        assert!(!update(&cfg, &world, &unit, &retreat, &mut rng, &mut orders));
        assert!(orders.is_empty());
    }

    #[test]
    fn test_scatter_targets_unexplored_connected_ground() {
        let mut world = GridWorld::new(64, 64).unwrap();
        let unit = soldier(1, Faction::Own, Vec2::new(10.0, 10.0));
        world.add_unit(unit.clone()).unwrap();
        // East half explored; only the west half is worth sweeping.
        for y in 0..64 {
            for x in 32..64 {
                world.mark_explored(Vec2::new(x as f32, y as f32));
            }
        }

        let cfg = CombatConfig::default();
        let retreat = RetreatController::new(cfg.clone());
        let mut rng = StdRng::seed_from_u64(42);
        let mut orders = CommandBuffer::new();
        if update(&cfg, &world, &unit, &retreat, &mut rng, &mut orders) {
            let Some(CommandKind::AttackMove(point)) = orders.last_for(UnitId(1)).map(|c| c.kind)
            else {
                panic!("expected an attack-move order");
            };
            assert!(!world.is_explored(point));
            assert!(world.are_connected(unit.position, point));
        }
    }
}
