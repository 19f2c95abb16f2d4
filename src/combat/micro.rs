//! Per-unit tactical orchestration
//!
//! [`MicroManager`] owns the evaluator, retreat state and mission machine
//! and runs every friendly mobile combat unit through the same decision
//! pipeline each tick. Workers and buildings are the economy layer's problem
//! and never enter the pipeline.
//!
//! The pipeline, in order: hard overrides, the fight-or-flee verdict, stop
//! requests for recovered runners, the low-health and shoot-range guards,
//! and finally the active mission. Earlier stages win; a unit gets at most
//! one decision per tick.

use tracing::debug;

use crate::combat::evaluator::CombatEvaluator;
use crate::combat::extra_conditions::ExtraConditions;
use crate::combat::retreat::RetreatController;
use crate::command::{CommandBuffer, UnitCommand};
use crate::core::config::CombatConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::UnitId;
use crate::mission::{Mission, MissionStateMachine};
use crate::world::{Select, UnitSnapshot, WorldQuery};

/// Tick-level entry point of the combat decision core.
pub struct MicroManager {
    config: CombatConfig,
    evaluator: CombatEvaluator,
    retreat: RetreatController,
    extra: ExtraConditions,
    missions: MissionStateMachine,
}

impl MicroManager {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            evaluator: CombatEvaluator::new(config.clone()),
            retreat: RetreatController::new(config.clone()),
            extra: ExtraConditions::new(config.clone()),
            missions: MissionStateMachine::new(config.clone()),
            config,
        }
    }

    /// Deterministic variant; the seed feeds the mission scatter search.
    pub fn with_seed(config: CombatConfig, seed: u64) -> Self {
        Self {
            evaluator: CombatEvaluator::new(config.clone()),
            retreat: RetreatController::new(config.clone()),
            extra: ExtraConditions::new(config.clone()),
            missions: MissionStateMachine::with_seed(config.clone(), seed),
            config,
        }
    }

    pub fn set_mission(&mut self, mission: Mission) {
        self.missions.set_active(mission);
    }

    pub fn mission(&self) -> Mission {
        self.missions.active()
    }

    /// Read access for hosts that render retreat paths or debug overlays.
    pub fn retreat(&self) -> &RetreatController {
        &self.retreat
    }

    pub fn evaluator(&self) -> &CombatEvaluator {
        &self.evaluator
    }

    /// Run one full decision tick over every friendly mobile combat unit.
    /// Returns the batch of commands for the host to apply.
    pub fn process_tick(&mut self, world: &dyn WorldQuery) -> Vec<UnitCommand> {
        self.evaluator.prune(world);
        self.retreat.prune(world);

        let mut orders = CommandBuffer::new();
        let units = Select::our(world).list();
        for unit in units {
            if unit.is_combat() {
                self.update_unit(world, unit, &mut orders);
            }
        }
        orders.into_commands()
    }

    /// Decide for a single unit, for hosts that interleave their own per-unit
    /// logic. Fails when the id is unknown to the snapshot.
    pub fn process_unit(
        &mut self,
        world: &dyn WorldQuery,
        id: UnitId,
    ) -> Result<Vec<UnitCommand>> {
        let unit = world.unit(id).ok_or(TacticsError::UnknownUnit(id))?;
        let mut orders = CommandBuffer::new();
        self.update_unit(world, unit, &mut orders);
        Ok(orders.into_commands())
    }

    fn update_unit(
        &mut self,
        world: &dyn WorldQuery,
        unit: &UnitSnapshot,
        orders: &mut CommandBuffer,
    ) {
        let nearest_enemy = Select::enemy(world)
            .combat_units()
            .nearest_to(unit.position);

        let force_fight = self.extra.should_always_fight(world, unit);
        if !force_fight {
            if self
                .extra
                .should_always_retreat(world, unit, nearest_enemy, &self.retreat)
            {
                debug!(unit = unit.id.0, "retreating: unsupported near enemy");
                self.retreat
                    .run_from(world, &mut self.evaluator, unit, nearest_enemy, orders);
                return;
            }

            if !self.evaluator.is_favorable(world, unit) {
                // A committed swing is wasted by turning away; let it land
                // and reconsider next tick.
                if unit.activity.attack_anim || unit.activity.starting_attack {
                    return;
                }
                self.retreat
                    .run_from(world, &mut self.evaluator, unit, nearest_enemy, orders);
                return;
            }

            if self.retreat.is_running(unit.id)
                && self.evaluator.evaluate(world, unit) >= self.config.stop_eval_threshold
            {
                self.retreat.request_stop(world, unit.id);
            }
        }

        // The remaining guards apply even to forced defenders: a unit about
        // to die helps nobody by standing in the wrong place.
        if self.should_flee_on_low_health(world, unit, nearest_enemy) {
            debug!(unit = unit.id.0, hp = unit.hit_points, "retreating: low health");
            self.retreat
                .run_from(world, &mut self.evaluator, unit, nearest_enemy, orders);
            return;
        }

        if !self.evaluator.is_extremely_favorable(world, unit)
            && self.enemy_has_unit_in_range(world, unit)
        {
            self.retreat
                .run_from(world, &mut self.evaluator, unit, nearest_enemy, orders);
            return;
        }

        if self.retreat.is_running(unit.id) {
            return;
        }
        self.missions.update(world, unit, &self.retreat, orders);
    }

    /// Wounded, threatened and without an army around it: run regardless of
    /// what the rest of the pipeline decided.
    fn should_flee_on_low_health(
        &self,
        world: &dyn WorldQuery,
        unit: &UnitSnapshot,
        nearest_enemy: Option<&UnitSnapshot>,
    ) -> bool {
        let cfg = &self.config;
        let Some(enemy) = nearest_enemy else {
            return false;
        };
        if enemy.distance_to(unit) > cfg.low_hp_enemy_radius {
            return false;
        }
        if unit.hit_points > cfg.low_hp_flat && unit.hp_percent() >= cfg.low_hp_percent {
            return false;
        }
        let allies = Select::our(world)
            .combat_units()
            .in_radius(cfg.low_hp_ally_radius, unit.position)
            .count();
        allies <= cfg.low_hp_max_allies
    }

    /// Some enemy already has this unit inside weapon range plus a buffer.
    fn enemy_has_unit_in_range(&self, world: &dyn WorldQuery, unit: &UnitSnapshot) -> bool {
        Select::enemy(world)
            .combat_units()
            .in_radius(self.config.shoot_range_scan, unit.position)
            .list()
            .iter()
            .any(|enemy| {
                let weapon = enemy.weapon_against(unit);
                weapon.can_shoot()
                    && enemy.distance_to(unit) + self.config.shoot_range_buffer
                        <= weapon.max_range
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::core::types::Vec2;
    use crate::world::{ActivityFlags, Faction, GridWorld, UnitClass, Weapon};

    fn soldier(id: u32, faction: Faction, pos: Vec2) -> UnitSnapshot {
        UnitSnapshot::new(UnitId(id), faction, UnitClass::Military, pos)
            .with_hp(40, 40)
            .with_ground_weapon(Weapon::new(16.0, 22.0, 4.0))
    }

    fn manager() -> MicroManager {
        MicroManager::with_seed(CombatConfig::default(), 7)
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let world = GridWorld::new(64, 64).unwrap();
        let mut micro = manager();
        assert!(matches!(
            micro.process_unit(&world, UnitId(99)),
            Err(TacticsError::UnknownUnit(UnitId(99)))
        ));
    }

    #[test]
    fn test_outnumbered_unit_retreats() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.add_unit(soldier(1, Faction::Own, Vec2::new(30.0, 30.0))).unwrap();
        for i in 0..3 {
            world
                .add_unit(soldier(10 + i, Faction::Enemy, Vec2::new(40.0, 29.0 + i as f32)))
                .unwrap();
        }

        let mut micro = manager();
        let commands = micro.process_unit(&world, UnitId(1)).unwrap();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0].kind, CommandKind::MoveTo(_)));
        assert!(micro.retreat().is_running(UnitId(1)));
    }

    #[test]
    fn test_mid_swing_unit_holds_instead_of_running() {
        let mut world = GridWorld::new(64, 64).unwrap();
        let unit = soldier(1, Faction::Own, Vec2::new(30.0, 30.0)).with_activity(ActivityFlags {
            attack_anim: true,
            ..Default::default()
        });
        world.add_unit(unit).unwrap();
        // Enough standing support that the lone-unit override stays quiet,
        // but far too many enemies for a favorable verdict.
        for i in 0..6 {
            world
                .add_unit(soldier(20 + i, Faction::Own, Vec2::new(28.0, 26.0 + i as f32)))
                .unwrap();
        }
        for i in 0..12 {
            world
                .add_unit(soldier(40 + i, Faction::Enemy, Vec2::new(40.0, 24.0 + i as f32)))
                .unwrap();
        }

        let mut micro = manager();
        let commands = micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(commands.is_empty());
        assert!(!micro.retreat().is_running(UnitId(1)));
    }

    #[test]
    fn test_base_defender_stands_at_bad_odds() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_main_base(Some(Vec2::new(30.0, 30.0)));
        world.add_unit(soldier(1, Faction::Own, Vec2::new(32.0, 30.0))).unwrap();
        // Outnumbered, but the enemies cannot reach weapon range yet.
        for i in 0..3 {
            world
                .add_unit(soldier(10 + i, Faction::Enemy, Vec2::new(41.0, 29.0 + i as f32)))
                .unwrap();
        }

        let mut micro = manager();
        micro.set_mission(Mission::Attack);
        let commands = micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(!micro.retreat().is_running(UnitId(1)));
        // Whatever the mission ordered, it was not a retreat move.
        for command in &commands {
            assert!(!matches!(command.kind, CommandKind::MoveTo(_)));
        }
    }

    #[test]
    fn test_wounded_base_defender_still_flees() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_main_base(Some(Vec2::new(30.0, 30.0)));
        world
            .add_unit(soldier(1, Faction::Own, Vec2::new(32.0, 30.0)).with_hp(12, 40))
            .unwrap();
        world
            .add_unit(soldier(10, Faction::Enemy, Vec2::new(36.0, 30.0)))
            .unwrap();

        let mut micro = manager();
        micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(micro.retreat().is_running(UnitId(1)));
    }

    #[test]
    fn test_low_health_percent_triggers_without_flat_floor() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.set_main_base(Some(Vec2::new(30.0, 30.0)));
        // 20/100 hp: above the 16 hp flat floor, but only 20% health.
        world
            .add_unit(
                UnitSnapshot::new(
                    UnitId(1),
                    Faction::Own,
                    UnitClass::Military,
                    Vec2::new(32.0, 30.0),
                )
                .with_hp(20, 100)
                .with_ground_weapon(Weapon::new(16.0, 22.0, 4.0)),
            )
            .unwrap();
        world
            .add_unit(soldier(10, Faction::Enemy, Vec2::new(36.0, 30.0)))
            .unwrap();

        let mut micro = manager();
        micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(micro.retreat().is_running(UnitId(1)));

        // At 35% with the same flat hp margin the guard stays quiet.
        let mut steady_world = GridWorld::new(64, 64).unwrap();
        steady_world.set_main_base(Some(Vec2::new(30.0, 30.0)));
        steady_world
            .add_unit(
                UnitSnapshot::new(
                    UnitId(1),
                    Faction::Own,
                    UnitClass::Military,
                    Vec2::new(32.0, 30.0),
                )
                .with_hp(35, 100)
                .with_ground_weapon(Weapon::new(16.0, 22.0, 4.0)),
            )
            .unwrap();
        steady_world
            .add_unit(soldier(10, Faction::Enemy, Vec2::new(36.0, 30.0)))
            .unwrap();

        let mut steady = manager();
        steady.process_unit(&steady_world, UnitId(1)).unwrap();
        assert!(!steady.retreat().is_running(UnitId(1)));
    }

    #[test]
    fn test_in_enemy_weapon_range_without_superiority_retreats() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.add_unit(soldier(1, Faction::Own, Vec2::new(30.0, 30.0))).unwrap();
        // Slightly weaker enemy with a long-range weapon: favorable but not
        // extremely, and it can already shoot us.
        world
            .add_unit(
                UnitSnapshot::new(UnitId(2), Faction::Enemy, UnitClass::Military, Vec2::new(36.0, 30.0))
                    .with_hp(40, 40)
                    .with_ground_weapon(Weapon::new(8.0, 22.0, 7.0)),
            )
            .unwrap();

        let mut micro = manager();
        micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(micro.retreat().is_running(UnitId(1)));
    }

    #[test]
    fn test_recovered_runner_stops_after_hysteresis() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.add_unit(soldier(1, Faction::Own, Vec2::new(30.0, 30.0))).unwrap();
        for i in 0..3 {
            world
                .add_unit(soldier(10 + i, Faction::Enemy, Vec2::new(40.0, 29.0 + i as f32)))
                .unwrap();
        }

        let mut micro = manager();
        micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(micro.retreat().is_running(UnitId(1)));

        // Threat gone, hysteresis elapsed: the next tick releases the unit.
        for i in 0..3 {
            world.remove_unit(UnitId(10 + i));
        }
        world.advance_ticks(20);
        micro.process_unit(&world, UnitId(1)).unwrap();
        assert!(!micro.retreat().is_running(UnitId(1)));
    }

    #[test]
    fn test_process_tick_skips_workers_and_buildings() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world
            .add_unit(UnitSnapshot::new(
                UnitId(1),
                Faction::Own,
                UnitClass::Worker,
                Vec2::new(30.0, 30.0),
            ))
            .unwrap();
        world
            .add_unit(soldier(2, Faction::Own, Vec2::new(31.0, 30.0)).as_building(true))
            .unwrap();
        for i in 0..3 {
            world
                .add_unit(soldier(10 + i, Faction::Enemy, Vec2::new(35.0, 29.0 + i as f32)))
                .unwrap();
        }

        let mut micro = manager();
        let commands = micro.process_tick(&world);
        assert!(commands.is_empty());
    }
}
