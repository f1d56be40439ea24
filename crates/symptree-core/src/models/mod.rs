//! Domain models for the symptree system.

mod catalog;
mod diagnosis;
mod node;

pub use catalog::*;
pub use diagnosis::*;
pub use node::*;
