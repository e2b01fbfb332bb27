//! Command-line interface for Assessa.
//!
//! - [`cli`]: clap argument and subcommand definitions
//! - [`config`]: [`AssessaConfig`] loading via `confyg`
//! - [`handlers`]: index, query, train, evaluate and health commands
//! - [`config_handlers`]: `assessa config` subcommands
//! - [`app`]: [`AssessaCli`], logging setup and dispatch

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod handlers;

pub use app::AssessaCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::AssessaConfig;
