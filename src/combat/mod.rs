//! Fight-or-flee decision making
//!
//! The pipeline: [`CombatEvaluator`] scores the local situation,
//! [`ExtraConditions`] overrides it in the two cases the score gets wrong,
//! [`RetreatController`] executes and remembers retreats, and
//! [`MicroManager`] ties it all together per unit per tick.

pub mod evaluator;
pub mod extra_conditions;
pub mod micro;
pub mod retreat;

pub use evaluator::{CachedScore, CombatEvaluator};
pub use extra_conditions::ExtraConditions;
pub use micro::MicroManager;
pub use retreat::{RetreatController, RetreatState};
