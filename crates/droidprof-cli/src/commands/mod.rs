//! Subcommand implementations.

pub mod aggregate;
pub mod sample;
