pub mod commands;

pub use commands::{Cli, Commands, EligibilityFlag, FlagState, OutputFormat};
