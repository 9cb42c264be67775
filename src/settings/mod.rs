//! Process settings: a TOML file selected on the command line, overlaid with
//! `STOCKAUTH__`-prefixed environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
