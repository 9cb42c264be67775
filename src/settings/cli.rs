use super::Parser;

/// Command line of the `stockauth` server.
#[derive(Parser, Debug)]
#[command(name = "stockauth", about = "Token-based authentication service")]
pub struct Cli {
    /// Path to a TOML settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
