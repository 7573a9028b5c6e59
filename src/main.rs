// Friends Map - CLI
// Runs the pipeline end to end: fetch friends, resolve locations,
// write the map artifact.

use anyhow::Result;
use friends_map::{run_pipeline, ArtifactStore};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("list") => run_list(),
        Some("remove") if args.len() > 2 => run_remove(&args[2]),
        Some(username) if args.len() > 2 => run_generate(username, &args[2]).await,
        _ => {
            eprintln!("Usage: friends-map <username> <bearer-token>");
            eprintln!("       friends-map list");
            eprintln!("       friends-map remove <name>");
            eprintln!();
            eprintln!("Artifact directory defaults to ./static");
            eprintln!("(override with FRIENDS_MAP_STATIC_DIR)");
            std::process::exit(1);
        }
    }
}

fn static_dir() -> PathBuf {
    env::var("FRIENDS_MAP_STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("static"))
}

async fn run_generate(username: &str, token: &str) -> Result<()> {
    println!("🗺  Friends Map - Pipeline");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n👥 Fetching friends of @{}...", username);
    println!("📍 Resolving locations (rate-limited, this takes a moment)...");

    let report = run_pipeline(username, token, &static_dir()).await?;

    println!("✓ {} friends had a location", report.requested);
    println!(
        "✓ Resolved {} of {} ({} dropped)",
        report.resolved, report.requested, report.dropped
    );
    println!("✓ Map written to {:?}", report.artifact.path);

    Ok(())
}

fn run_list() -> Result<()> {
    let store = ArtifactStore::new(static_dir());
    let entries = store.entries();

    if entries.is_empty() {
        println!("No maps generated yet.");
        return Ok(());
    }

    for entry in entries {
        match entry.modified {
            Some(modified) => println!("{}  ({})", entry.name, modified.format("%Y-%m-%d %H:%M")),
            None => println!("{}", entry.name),
        }
    }

    Ok(())
}

fn run_remove(name: &str) -> Result<()> {
    let store = ArtifactStore::new(static_dir());
    store.remove(name)?;
    println!("✓ Removed {}", name);
    Ok(())
}
