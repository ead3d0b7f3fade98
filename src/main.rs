// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = nothing matched, 2 = error)
//
// Status messages go to stderr so that `repo-combiner combine ... > out.txt`
// captures only the combined document.
// =============================================================================

mod cli; // src/cli.rs - command-line parsing
mod logging; // src/logging.rs - tracing setup

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use repo_combiner::github::{ClientConfig, GithubClient, RepoRef};
use repo_combiner::tree::{Node, PathFilter, Tree};
use repo_combiner::{CombineOptions, Session};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = success
//   Ok(1) = no files matched the patterns
//   Err   = anything else (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.log_config())?;

    let client_config = cli.client_config();
    let concurrency = cli.concurrency;

    match cli.command {
        Commands::Tree { repo_url, json } => {
            handle_tree(&repo_url, json, &client_config, concurrency).await
        }
        Commands::Combine {
            repo_url,
            patterns,
            exclude,
            images,
            max_image_size,
            output,
        } => {
            let request = CombineRequest {
                repo_url,
                patterns,
                exclude,
                options: CombineOptions::from_flags(images, max_image_size.is_some(), max_image_size),
                output,
            };
            handle_combine(request, &client_config, concurrency).await
        }
    }
}

struct CombineRequest {
    repo_url: String,
    patterns: Vec<String>,
    exclude: Vec<String>,
    options: CombineOptions,
    output: Option<PathBuf>,
}

// Parses the URL, builds the client and lists the whole repository.
// An invalid URL fails here, before any request is made.
async fn open_session(
    repo_url: &str,
    client_config: &ClientConfig,
    concurrency: usize,
) -> Result<(Session, GithubClient)> {
    let repo = RepoRef::parse(repo_url)?;
    let client = GithubClient::new(repo.clone(), client_config)?;

    eprintln!("🔍 Fetching repository tree: {}", repo);

    let mut session = Session::new(repo);
    session
        .load(&client, concurrency)
        .await
        .context("Error accessing repository")?;

    Ok((session, client))
}

// Handles the 'tree' subcommand
async fn handle_tree(
    repo_url: &str,
    json: bool,
    client_config: &ClientConfig,
    concurrency: usize,
) -> Result<i32> {
    let (session, _client) = open_session(repo_url, client_config, concurrency).await?;
    let tree = session.tree();

    if json {
        println!("{}", serde_json::to_string_pretty(tree)?);
    } else {
        print_tree(tree);
        eprintln!(
            "\n📊 {} file(s) in {} director(y/ies)",
            tree.file_count(),
            tree.dir_count()
        );
    }

    Ok(0)
}

// Handles the 'combine' subcommand
async fn handle_combine(
    request: CombineRequest,
    client_config: &ClientConfig,
    concurrency: usize,
) -> Result<i32> {
    // Validate patterns before spending requests on the listing
    let filter = PathFilter::new(&request.patterns, &request.exclude)?;

    let (mut session, client) = open_session(&request.repo_url, client_config, concurrency).await?;

    let selected = session.select_matching(&filter).len();
    if selected == 0 {
        eprintln!(
            "⚠️  No files found matching patterns: {}",
            request.patterns.join(", ")
        );
        return Ok(1);
    }

    eprintln!("📄 Found {} matching file(s)", selected);
    info!(options = ?request.options, "combining");

    let combined = session
        .combine(&client, &request.options)
        .await
        .context("Failed to combine files")?;

    match &request.output {
        Some(path) => {
            tokio::fs::write(path, &combined)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✅ Combined content written to: {}", path.display());
        }
        None => println!("{}", combined),
    }

    Ok(0)
}

// Prints the tree with two spaces of indentation per level
fn print_tree(tree: &Tree) {
    fn walk(nodes: &[Node], depth: usize) {
        for node in nodes {
            let marker = if node.is_dir() { "/" } else { "" };
            println!("{}{}{}", "  ".repeat(depth), node.name, marker);
            walk(node.children(), depth + 1);
        }
    }

    walk(&tree.nodes, 0);
}
