//! `clap`-derived CLI overrides layered on top of a config file (spec.md
//! §6.1; same `clap::Parser` style the teacher's own binaries use).

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "bridge-validator", about = "Cross-chain bridge validator node")]
pub struct Cli {
    /// Path to the node's TOML configuration file.
    #[arg(long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Start even if `threshold` is below the Byzantine safety floor
    /// `⌈2n/3⌉+1` for the configured `total_validators`.
    #[arg(long)]
    pub i_know_what_im_doing: bool,
}
