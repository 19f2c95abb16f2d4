//! Vanguard: tactical combat decisions for a real-time strategy agent
//!
//! Each simulation tick, the core reads one immutable world snapshot through
//! the [`world::WorldQuery`] trait, decides fight / retreat / hold for every
//! friendly mobile combat unit, and returns a batch of
//! [`command::UnitCommand`] values for the host engine to apply. Commands
//! are fire-and-forget; the next tick's snapshot shows what actually
//! happened.
//!
//! The typical host loop:
//!
//! ```
//! use vanguard::combat::MicroManager;
//! use vanguard::core::config::CombatConfig;
//! use vanguard::mission::Mission;
//! use vanguard::world::GridWorld;
//!
//! let world = GridWorld::new(64, 64).expect("valid map size");
//! let mut micro = MicroManager::with_seed(CombatConfig::default(), 42);
//! micro.set_mission(Mission::Attack);
//!
//! let commands = micro.process_tick(&world);
//! assert!(commands.is_empty()); // nothing to command in an empty world
//! ```

pub mod combat;
pub mod command;
pub mod core;
pub mod mission;
pub mod world;
