//! Command-line interface module.

mod args;
pub mod publish;
pub mod verify;

pub use args::{Cli, Commands, PublishArgs};
