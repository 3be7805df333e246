// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::Parser;

/// Mirror attached storage devices into by-path, by-uuid and by-serial symlinks
#[derive(Debug, Default, Parser)]
#[command(name = "storage-linkd", version)]
#[command(about = "Maintain symlink trees for attached storage devices", long_about = None)]
pub struct Cli {
    /// Print every device event with its attributes
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory holding the by-path, by-uuid and by-serial trees
    #[arg(short = 'p', long, value_name = "PATH")]
    pub base_path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep links left in the trees by a previous run
    #[arg(long)]
    pub no_prune: bool,
}
