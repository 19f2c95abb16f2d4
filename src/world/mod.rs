//! World-state access layer
//!
//! The decision core never owns the game world. Each tick it reads one
//! immutable snapshot through [`WorldQuery`] and emits commands as data; the
//! host applies them. [`GridWorld`] is a self-contained implementation backed
//! by a tile grid, used by the test suite and by hosts that want a quick
//! harness.

pub mod grid;
pub mod select;
pub mod unit;

use serde::{Deserialize, Serialize};

use crate::core::types::{MapBounds, Tick, UnitId, Vec2};

pub use grid::GridWorld;
pub use select::Select;
pub use unit::{ActivityFlags, Faction, UnitClass, UnitSnapshot, Weapon};

/// A narrow terrain passage, used as the rally/defend anchor.
///
/// Supplied by the host's terrain analysis; read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chokepoint {
    pub center: Vec2,
    /// Passage width in tiles.
    pub width: f32,
}

impl Chokepoint {
    pub fn new(center: Vec2, width: f32) -> Self {
        Self { center, width }
    }
}

/// Read-only oracle over the current tick's world snapshot.
///
/// All distances are in tiles. Implementations must answer every call from
/// the same snapshot for the duration of a tick; the core assumes no
/// partial updates between two queries within one tick.
pub trait WorldQuery {
    /// Current simulation tick.
    fn current_tick(&self) -> Tick;

    /// All known units of the given faction, in stable host order.
    fn units_of(&self, faction: Faction) -> Vec<&UnitSnapshot>;

    /// Look up a single unit by id.
    fn unit(&self, id: UnitId) -> Option<&UnitSnapshot>;

    /// True if the tile under `point` is buildable ground.
    fn is_buildable(&self, point: Vec2) -> bool;

    /// True if a ground path exists between the two points.
    fn has_path(&self, from: Vec2, to: Vec2) -> bool;

    /// True if the tiles under the two points are in the same ground region.
    fn are_connected(&self, from: Vec2, to: Vec2) -> bool;

    /// Map extent, for clamping computed positions.
    fn bounds(&self) -> MapBounds;

    /// Our main base, if we still have one.
    fn main_base_position(&self) -> Option<Vec2>;

    /// The chokepoint guarding our main base, if terrain analysis found one.
    fn main_base_chokepoint(&self) -> Option<Chokepoint>;

    /// The enemy's base, once discovered.
    fn enemy_base_position(&self) -> Option<Vec2>;

    /// Nearest potential starting location we have not explored yet.
    fn nearest_unexplored_start(&self, from: Vec2) -> Option<Vec2>;

    /// True if we have ever had vision of the tile under `point`.
    fn is_explored(&self, point: Vec2) -> bool;
}
