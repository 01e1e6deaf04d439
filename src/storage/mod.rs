//! Storage layer for persistence.

mod engine;
mod index;
mod layout;
mod store;

pub use engine::*;
pub use index::*;
pub use layout::Layout;
pub use store::*;
