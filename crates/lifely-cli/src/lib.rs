//! CLI, configuration, event cache and subcommands
//!
//! This crate provides the `lifely` command-line interface.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod places;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
