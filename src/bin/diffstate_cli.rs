//! diffstate CLI entry point.
//!
//! Replays captured diff batch responses through the engine and prints what
//! the reviewer would see.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use diffstate::domain::{DeepLink, TreeEntry};
use diffstate::infra::app_config::{load_config, load_config_from};
use diffstate::{DiffEvent, DiffReviewSession, FixtureTransport, fetch_linked_file, load_batches};

#[derive(Parser, Debug)]
#[command(name = "diffstate")]
#[command(version)]
#[command(about = "Diff state engine for merge request review", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load captured batch pages from a directory and print the result
    Replay {
        /// Directory holding page-<offset>.json, lines-*.json and file-*.json
        dir: PathBuf,

        /// Size of the first batch page
        #[arg(long)]
        per_page: Option<u32>,

        /// Review one file at a time (first page holds a single file)
        #[arg(long)]
        single_file: bool,

        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,

        /// Location fragment to replay as a deep link (e.g. note_12)
        #[arg(long)]
        fragment: Option<String>,

        /// Linked single-file URL to fetch before the batches
        #[arg(long)]
        linked: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Replay {
            dir,
            per_page,
            single_file,
            config,
            fragment,
            linked,
        } => replay(dir, per_page, single_file, config, fragment, linked).await,
    }
}

async fn replay(
    dir: PathBuf,
    per_page: Option<u32>,
    single_file: bool,
    config_path: Option<PathBuf>,
    fragment: Option<String>,
    linked: Option<String>,
) -> Result<()> {
    let mut app_config = match &config_path {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    if let Some(per_page) = per_page {
        app_config.engine.per_page = per_page;
    }
    app_config.engine.single_file_mode |= single_file;

    let deep_link = match fragment.as_deref() {
        Some(fragment) => DeepLink::parse(fragment).context("parse --fragment")?,
        None => None,
    };

    let session = DiffReviewSession::new(app_config.engine, app_config.view)
        .with_deep_link(deep_link)
        .shared();
    let transport = FixtureTransport::new(&dir);
    let (events, mut receiver) = tokio::sync::mpsc::unbounded_channel();

    if let Some(url) = linked.as_deref() {
        fetch_linked_file(&session, &transport, &events, url)
            .await
            .with_context(|| format!("fetch linked file from {}", dir.display()))?;
    }

    let summary = load_batches(&session, &transport, "diffs_batch", &events)
        .await
        .with_context(|| format!("replay batches from {}", dir.display()))?;

    drop(events);
    while let Some(event) = receiver.recv().await {
        if let DiffEvent::ScrollToIndex(index) = event {
            println!("scroll to file #{index}");
        }
    }

    println!(
        "{} files in {} pages (sizes {:?})",
        summary.files, summary.pages, summary.page_sizes
    );

    let session = session.lock();
    println!();
    print_entries(&session.tree.tree, 0);

    println!();
    for file in session.registry.files() {
        let current = session.current_file_hash.as_deref() == Some(file.file_hash.as_str());
        println!(
            "{} {} +{} -{} inline:{} parallel:{}{}",
            if current { "*" } else { " " },
            file.new_path,
            file.added_lines,
            file.removed_lines,
            file.inline_lines.len(),
            file.side_by_side_lines.len(),
            if file.collapsed { " (collapsed)" } else { "" }
        );
    }
    Ok(())
}

fn print_entries(entries: &[TreeEntry], depth: usize) {
    for entry in entries {
        let suffix = if entry.is_tree() { "/" } else { "" };
        println!("{}{}{}", "  ".repeat(depth), entry.name, suffix);
        print_entries(&entry.tree, depth + 1);
    }
}
