//! Session models tying the engines to persisted state.

pub mod analysis;
pub mod categories;

pub use analysis::Analysis;
pub use categories::{CategorySet, CATEGORY_FORMAT_ID, CATEGORY_FORMAT_VERSION};
