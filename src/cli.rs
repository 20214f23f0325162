use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::settings::AppSettings;

#[derive(Debug, Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Backend API root, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify a URL without contacting the backend
    Detect { url: String },
    /// Analyze a video and print its formats
    Info { url: String },
    /// Analyze and download a video
    Download {
        url: String,
        /// Format key (no_watermark, watermark, hd, sd, auto)
        #[arg(short, long)]
        format: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze and save the preview clip
    Preview {
        url: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that the backend is up
    Health,
}

impl Cli {
    /// Applies command-line overrides on top of file settings.
    pub fn apply_overrides(&self, settings: &mut AppSettings) {
        if let Some(base) = &self.api_base {
            settings.api_base = base.clone();
        }
        if let Command::Download {
            output: Some(dir), ..
        } = &self.command
        {
            settings.download.output_dir = dir.clone();
        }
    }
}
