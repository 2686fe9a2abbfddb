//! CLI module for gridctl - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
