//! Grid-backed world implementation
//!
//! A minimal, fully in-memory [`WorldQuery`] implementation: a passability
//! grid with flood-filled connectivity regions, an explored mask and a flat
//! unit store. Hosts with a real terrain oracle implement [`WorldQuery`]
//! themselves; this one exists for tests and offline simulation harnesses.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, TacticsError};
use crate::core::types::{MapBounds, Tick, UnitId, Vec2};
use crate::world::unit::{Faction, UnitSnapshot};
use crate::world::{Chokepoint, WorldQuery};

/// Generic 2D grid with one cell per tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    pub fn fill(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            Some(&self.data[y * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Convert a tile-space position to cell coordinates, clamped to the
    /// grid.
    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> (usize, usize) {
        let x = pos.x.floor() as i32;
        let y = pos.y.floor() as i32;
        (
            x.clamp(0, self.width as i32 - 1) as usize,
            y.clamp(0, self.height as i32 - 1) as usize,
        )
    }

    /// Sample the grid at a tile-space position.
    pub fn sample(&self, pos: Vec2) -> &T {
        let (x, y) = self.world_to_cell(pos);
        &self.data[y * self.width + x]
    }
}

/// In-memory world snapshot over a tile grid.
#[derive(Debug, Clone)]
pub struct GridWorld {
    tick: Tick,
    passable: Grid<bool>,
    /// Connectivity region per tile; 0 = impassable, regions start at 1.
    region: Grid<u16>,
    explored: Grid<bool>,
    units: Vec<UnitSnapshot>,
    main_base: Option<Vec2>,
    chokepoint: Option<Chokepoint>,
    enemy_base: Option<Vec2>,
    start_locations: Vec<Vec2>,
}

impl GridWorld {
    /// Create a fully passable, unexplored world.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TacticsError::InvalidMap { width, height });
        }
        let mut world = Self {
            tick: 0,
            passable: Grid::fill(width, height, true),
            region: Grid::new(width, height),
            explored: Grid::new(width, height),
            units: Vec::new(),
            main_base: None,
            chokepoint: None,
            enemy_base: None,
            start_locations: Vec::new(),
        };
        world.recompute_regions();
        Ok(world)
    }

    pub fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    pub fn advance_ticks(&mut self, ticks: Tick) {
        self.tick += ticks;
    }

    /// Mark a tile impassable/passable and refresh connectivity.
    pub fn set_passable(&mut self, x: usize, y: usize, passable: bool) {
        self.passable.set(x, y, passable);
        self.recompute_regions();
    }

    /// Carve an impassable wall along a column, leaving an optional gap.
    pub fn add_wall_column(&mut self, x: usize, gap_y: Option<usize>) {
        for y in 0..self.passable.height {
            if Some(y) != gap_y {
                self.passable.set(x, y, false);
            }
        }
        self.recompute_regions();
    }

    pub fn mark_explored(&mut self, point: Vec2) {
        let (x, y) = self.explored.world_to_cell(point);
        self.explored.set(x, y, true);
    }

    pub fn mark_all_explored(&mut self) {
        for y in 0..self.explored.height {
            for x in 0..self.explored.width {
                self.explored.set(x, y, true);
            }
        }
    }

    pub fn set_main_base(&mut self, position: Option<Vec2>) {
        self.main_base = position;
    }

    pub fn set_chokepoint(&mut self, chokepoint: Option<Chokepoint>) {
        self.chokepoint = chokepoint;
    }

    pub fn set_enemy_base(&mut self, position: Option<Vec2>) {
        self.enemy_base = position;
    }

    pub fn add_start_location(&mut self, position: Vec2) {
        self.start_locations.push(position);
    }

    /// Add a unit snapshot. Fails if the position is off the map or the id
    /// is already taken.
    pub fn add_unit(&mut self, unit: UnitSnapshot) -> Result<UnitId> {
        if !self.bounds().contains(unit.position) {
            return Err(TacticsError::OutOfBounds {
                x: unit.position.x,
                y: unit.position.y,
            });
        }
        if self.units.iter().any(|u| u.id == unit.id) {
            return Err(TacticsError::DuplicateUnit(unit.id));
        }
        let id = unit.id;
        self.units.push(unit);
        Ok(id)
    }

    pub fn remove_unit(&mut self, id: UnitId) {
        self.units.retain(|u| u.id != id);
    }

    /// Mutable access for harnesses that move units between ticks.
    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut UnitSnapshot> {
        self.units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(TacticsError::UnknownUnit(id))
    }

    fn recompute_regions(&mut self) {
        let (w, h) = (self.passable.width, self.passable.height);
        self.region = Grid::new(w, h);
        let mut next_region: u16 = 1;
        let mut queue = Vec::new();

        for sy in 0..h {
            for sx in 0..w {
                if !self.passable.get(sx, sy).copied().unwrap_or(false)
                    || self.region.get(sx, sy).copied().unwrap_or(0) != 0
                {
                    continue;
                }
                self.region.set(sx, sy, next_region);
                queue.push((sx, sy));
                while let Some((x, y)) = queue.pop() {
                    let neighbors = [
                        (x.wrapping_sub(1), y),
                        (x + 1, y),
                        (x, y.wrapping_sub(1)),
                        (x, y + 1),
                    ];
                    for (nx, ny) in neighbors {
                        if self.passable.get(nx, ny).copied().unwrap_or(false)
                            && self.region.get(nx, ny).copied().unwrap_or(1) == 0
                        {
                            self.region.set(nx, ny, next_region);
                            queue.push((nx, ny));
                        }
                    }
                }
                next_region += 1;
            }
        }
    }

    fn region_at(&self, point: Vec2) -> u16 {
        if !self.bounds().contains(point) {
            return 0;
        }
        *self.region.sample(point)
    }
}

impl WorldQuery for GridWorld {
    fn current_tick(&self) -> Tick {
        self.tick
    }

    fn units_of(&self, faction: Faction) -> Vec<&UnitSnapshot> {
        self.units.iter().filter(|u| u.faction == faction).collect()
    }

    fn unit(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.units.iter().find(|u| u.id == id)
    }

    fn is_buildable(&self, point: Vec2) -> bool {
        self.bounds().contains(point) && *self.passable.sample(point)
    }

    fn has_path(&self, from: Vec2, to: Vec2) -> bool {
        let a = self.region_at(from);
        a != 0 && a == self.region_at(to)
    }

    fn are_connected(&self, from: Vec2, to: Vec2) -> bool {
        self.has_path(from, to)
    }

    fn bounds(&self) -> MapBounds {
        MapBounds::new(self.passable.width as f32, self.passable.height as f32)
    }

    fn main_base_position(&self) -> Option<Vec2> {
        self.main_base
    }

    fn main_base_chokepoint(&self) -> Option<Chokepoint> {
        self.chokepoint
    }

    fn enemy_base_position(&self) -> Option<Vec2> {
        self.enemy_base
    }

    fn nearest_unexplored_start(&self, from: Vec2) -> Option<Vec2> {
        self.start_locations
            .iter()
            .copied()
            .filter(|p| !self.is_explored(*p))
            .min_by_key(|p| OrderedFloat(p.distance(&from)))
    }

    fn is_explored(&self, point: Vec2) -> bool {
        self.bounds().contains(point) && *self.explored.sample(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::unit::UnitClass;

    #[test]
    fn test_zero_sized_map_rejected() {
        assert!(matches!(
            GridWorld::new(0, 10),
            Err(TacticsError::InvalidMap { .. })
        ));
    }

    #[test]
    fn test_add_unit_out_of_bounds() {
        let mut world = GridWorld::new(16, 16).unwrap();
        let unit = UnitSnapshot::new(
            UnitId(1),
            Faction::Own,
            UnitClass::Military,
            Vec2::new(50.0, 2.0),
        );
        assert!(matches!(
            world.add_unit(unit),
            Err(TacticsError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_duplicate_unit_id_rejected() {
        let mut world = GridWorld::new(16, 16).unwrap();
        let unit = UnitSnapshot::new(
            UnitId(1),
            Faction::Own,
            UnitClass::Military,
            Vec2::new(2.0, 2.0),
        );
        world.add_unit(unit.clone()).unwrap();
        assert!(world.add_unit(unit).is_err());
    }

    #[test]
    fn test_connectivity_split_by_wall() {
        let mut world = GridWorld::new(32, 32).unwrap();
        let left = Vec2::new(4.0, 16.0);
        let right = Vec2::new(28.0, 16.0);
        assert!(world.has_path(left, right));

        world.add_wall_column(16, None);
        assert!(!world.has_path(left, right));
        assert!(!world.is_buildable(Vec2::new(16.0, 8.0)));

        // A gap restores the path
        let mut gapped = GridWorld::new(32, 32).unwrap();
        gapped.add_wall_column(16, Some(16));
        assert!(gapped.has_path(left, right));
    }

    #[test]
    fn test_explored_mask() {
        let mut world = GridWorld::new(16, 16).unwrap();
        let p = Vec2::new(3.0, 3.0);
        assert!(!world.is_explored(p));
        world.mark_explored(p);
        assert!(world.is_explored(p));
    }

    #[test]
    fn test_nearest_unexplored_start() {
        let mut world = GridWorld::new(64, 64).unwrap();
        world.add_start_location(Vec2::new(60.0, 60.0));
        world.add_start_location(Vec2::new(10.0, 10.0));
        let nearest = world.nearest_unexplored_start(Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest, Vec2::new(10.0, 10.0));

        world.mark_explored(Vec2::new(10.0, 10.0));
        let nearest = world.nearest_unexplored_start(Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest, Vec2::new(60.0, 60.0));
    }
}
