//! Unit commands as data
//!
//! The decision core never calls into the engine directly: each tick it
//! produces a batch of fire-and-forget commands the host applies in order.
//! Nothing here awaits confirmation; the next tick's snapshot shows whatever
//! the engine actually did.

use serde::{Deserialize, Serialize};

use crate::core::types::{UnitId, Vec2};

/// What a unit is told to do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Move without engaging.
    MoveTo(Vec2),
    /// Move toward the point, engaging anything hostile on the way.
    AttackMove(Vec2),
    /// Explicitly do nothing this tick.
    Hold,
}

/// One order for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCommand {
    pub unit: UnitId,
    pub kind: CommandKind,
}

impl UnitCommand {
    pub fn move_to(unit: UnitId, target: Vec2) -> Self {
        Self { unit, kind: CommandKind::MoveTo(target) }
    }

    pub fn attack_move(unit: UnitId, target: Vec2) -> Self {
        Self { unit, kind: CommandKind::AttackMove(target) }
    }

    pub fn hold(unit: UnitId) -> Self {
        Self { unit, kind: CommandKind::Hold }
    }
}

/// Per-tick command accumulator.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<UnitCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: UnitCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last command issued for the given unit this tick, if any.
    pub fn last_for(&self, unit: UnitId) -> Option<&UnitCommand> {
        self.commands.iter().rev().find(|c| c.unit == unit)
    }

    pub fn commands(&self) -> &[UnitCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<UnitCommand> {
        self.commands
    }
}
