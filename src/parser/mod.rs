//! Parser layer
//! - types.rs: Common types (Requirement, LineParts)
//! - requirements.rs: requirements.txt line grammar
//! - constraint.rs: version constraint grammar

pub mod constraint;
pub mod requirements;
pub mod types;

pub use constraint::{Clause, Constraint, ConstraintError, Operator, parse_constraint};
pub use requirements::{parse_requirements, split_requirement_line};
pub use types::{LineParts, Requirement};
