use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::UnknownDropinPolicy;

/// Environment variable read when `--wp-version` is not given.
pub const WP_VERSION_ENV: &str = "DROPINS_WP_VERSION";

/// Dropins - install WordPress dropins into a project's content directory
#[derive(Parser)]
#[command(name = "dropins")]
#[command(about = "Install WordPress dropins from local paths or URLs")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the dropins listed in a configuration file
    Run {
        /// Path to the JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Content directory (overrides "content-dir" from the config)
        #[arg(long)]
        content_dir: Option<PathBuf>,

        /// Project root for relative paths (defaults to the config file's directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Never ask: unverifiable dropins are skipped
        #[arg(short = 'n', long)]
        no_interaction: bool,

        /// WordPress version, used when the config has no "wp-version"
        #[arg(short, long, env = WP_VERSION_ENV)]
        wp_version: Option<String>,
    },
    /// Show how dropin names would be classified
    Check {
        /// Dropin file names to check
        #[arg(required = true)]
        names: Vec<String>,

        /// Policy for unknown dropins (allow, ask, reject)
        #[arg(short, long, default_value = "reject")]
        policy: UnknownDropinPolicy,

        /// WordPress version used to look up available locales
        #[arg(short, long, env = WP_VERSION_ENV)]
        wp_version: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
