// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - tree:    list a repository and print its file tree
// - combine: select files by pattern and write them into one document
//
// Options shared by both (token, API base, timeout, logging) are marked
// `global = true` so they can be given before or after the subcommand.
// =============================================================================

use crate::logging::{LogConfig, LogFormat};
use clap::{Parser, Subcommand};
use repo_combiner::github::{ClientConfig, DEFAULT_API_BASE};
use repo_combiner::tree::DEFAULT_CONCURRENCY;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "repo-combiner",
    version,
    about = "Combine files of a GitHub repository into a single text document",
    long_about = "repo-combiner lists a GitHub repository, selects files by glob pattern and \
                  concatenates them into one document, each file under a banner. \
                  Images can be embedded as (optionally downsized) data URIs."
)]
pub struct Cli {
    /// GitHub token, raises the API rate limit and allows private repositories
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "REPO_COMBINER_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    /// How many directory listings may run at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, global = true)]
    pub concurrency: usize,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the file tree of a GitHub repository
    ///
    /// Example: repo-combiner tree https://github.com/rust-lang/log
    Tree {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// Output the tree as JSON instead of indented text
        #[arg(long)]
        json: bool,
    },

    /// Combine matching files of a GitHub repository into one document
    ///
    /// Example: repo-combiner combine https://github.com/user/repo -p "*.rs" "*.md" -o out.txt
    Combine {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// File patterns to include (e.g., "*.py" "docs/**")
        #[arg(short, long, num_args = 1.., default_value = "*")]
        patterns: Vec<String>,

        /// File patterns to leave out
        #[arg(short = 'x', long, num_args = 1..)]
        exclude: Vec<String>,

        /// Embed images as base64 data URIs
        #[arg(long)]
        images: bool,

        /// Maximum image size in pixels (width * height); larger images are scaled down
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_image_size: Option<u64>,

        /// Write the document to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.api_base.clone(),
            token: self.token.clone().filter(|t| !t.trim().is_empty()),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbosity: self.verbose,
            format: self.log_format,
        }
    }
}

// BEGINNER NOTES:
//
// 1. What does global = true do?
//    - The flag is accepted on the top-level command and every subcommand
//    - `repo-combiner -v tree URL` and `repo-combiner tree URL -v` both work
//
// 2. What is env = "GITHUB_TOKEN"?
//    - If --token is not given, clap reads the environment variable
//    - hide_env_values keeps the token out of --help output
//
// 3. What is num_args = 1..?
//    - `-p "*.rs" "*.md"` collects both values into one Vec
//    - The URL must come before -p, otherwise it would be eaten as a pattern
