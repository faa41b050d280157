mod args;
pub mod commands;
mod picker;

pub use args::{Cli, Commands, LicenseCommand, SeasonArgs};
