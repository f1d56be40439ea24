//! Decision tree construction, rendering and traversal.

mod builder;
mod render;
mod walker;

pub use builder::*;
pub use render::*;
pub use walker::*;
