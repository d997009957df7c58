//! Subcommand implementations.

pub mod sweep;
pub mod token;
