use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use ushuffle_core::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "ushuffle")]
#[command(about = "Shuffle a small users table between project groups")]
pub struct Cli {
    #[arg(
        long,
        value_parser = parse_backend,
        help = "Backend key (m, g, s or p); prompted when omitted"
    )]
    pub backend: Option<BackendKind>,
    #[arg(long, value_enum, default_value_t = Strategy::Direct)]
    pub strategy: Strategy,
    #[arg(long)]
    pub db_name: Option<String>,
    #[arg(long, help = "Parent directory for file-based databases")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, help = "Seed for reproducible group draws")]
    pub seed: Option<u64>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Literal SQL statements per step.
    Direct,
    /// Identity-mapped records committed as a unit of work.
    Session,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Session => "session",
        }
    }
}

fn parse_backend(value: &str) -> Result<BackendKind, String> {
    BackendKind::from_choice(value).map_err(|err| err.to_string())
}
