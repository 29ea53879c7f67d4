pub mod commands;
pub mod context;
pub mod output;
mod shell;

pub use context::{CliError, CliMode, CliOptions};
pub use shell::run_cli;
