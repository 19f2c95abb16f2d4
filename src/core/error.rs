use thiserror::Error;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Unknown unit: {0:?}")]
    UnknownUnit(crate::core::types::UnitId),

    #[error("Unit id already in use: {0:?}")]
    DuplicateUnit(crate::core::types::UnitId),

    #[error("Invalid map dimensions: {width}x{height}")]
    InvalidMap { width: usize, height: usize },

    #[error("Position out of map bounds: ({x:.1}, {y:.1})")]
    OutOfBounds { x: f32, y: f32 },
}

pub type Result<T> = std::result::Result<T, TacticsError>;
