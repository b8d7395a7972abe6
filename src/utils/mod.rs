//! Utility modules shared by the publish pipeline.

pub mod hash;
pub mod path;
mod plural;

pub use plural::plural_count;
