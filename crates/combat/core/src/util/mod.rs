//! Stateless helpers shared by every subsystem.
//!
//! - `dice`: `NdM±K` parsing and rolling
//! - `element`: type-effectiveness chart
//! - `status`: status-effect modifier aggregation
//! - `ai`: weighted move selection
pub mod ai;
pub mod dice;
pub mod element;
pub mod status;

pub use dice::{DiceError, DiceExpr, roll_str};
pub use element::{Effectiveness, Element, effectiveness, matchup};
pub use status::{StatusEffect, StatusKind, StatusModifiers, has_action_denial};
