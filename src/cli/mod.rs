pub mod commands;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::chunker::MAX_CHUNK;

#[derive(Parser)]
#[command(name = "socialcast")]
#[command(about = "Narrates live social media feeds", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/socialcast/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch a feed page and narrate new posts as they appear
    Watch {
        /// URL of the feed page
        url: String,

        /// Platform id to use instead of detecting it from the URL
        #[arg(short, long)]
        platform: Option<String>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },
    /// Split text into speech-request sized chunks
    Chunk {
        /// File to read (default: stdin)
        file: Option<PathBuf>,

        /// Maximum characters per chunk
        #[arg(short, long, default_value_t = MAX_CHUNK)]
        max: usize,
    },
    /// List available narration voices
    Voices,
    /// List registered platforms and the hosts they match
    Platforms,
}
