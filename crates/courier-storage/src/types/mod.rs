//! Type definitions for courier storage.

mod audience;
mod contacts;
mod fields;
mod ids;
mod lists;

// Re-export all types from submodules
pub use audience::*;
pub use contacts::*;
pub use fields::*;
pub use ids::*;
pub use lists::*;
