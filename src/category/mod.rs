//! Category blueprints, their compiled predicate trees and the categorisation pass.

pub mod blueprint;
pub mod expr;
pub mod predicate;
pub mod tree;

pub use blueprint::{CategoryBlueprint, FilterKind};
pub use predicate::{CompareOp, Predicate};
pub use tree::{categorize, CategorizationResult, CategoryNode, CategoryTree, OTHER_SUFFIX};
