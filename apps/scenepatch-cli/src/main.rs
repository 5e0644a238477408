use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use scenepatch_runtime::{Outcome, StopHandle, Watcher, apply_once, simulate};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scenepatch", about = "Apply scene patches to a world file")]
struct Cli {
    /// Path to the world JSON file
    #[arg(long, default_value = "world.json")]
    world: PathBuf,

    /// Patch JSON file to apply. Repeat for multiple files
    #[arg(long = "patch")]
    patches: Vec<PathBuf>,

    /// Directory scanned for *.json patch files when no --patch is given
    #[arg(long)]
    patch_dir: Option<PathBuf>,

    /// Watch this patch file and apply patches as they appear
    #[arg(long, conflicts_with = "simulate")]
    watch: Option<PathBuf>,

    /// Apply patches from this file once, reporting per-patch status
    #[arg(long)]
    simulate: Option<PathBuf>,

    /// Poll interval in seconds for watch mode
    #[arg(long, default_value_t = 0.2)]
    interval: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Some(patch_path) = cli.watch {
        // Runs until the process is killed; the stop handle exists for
        // embedders and tests, nothing flips it here.
        let mut watcher = Watcher::new(
            cli.world,
            patch_path,
            Duration::from_secs_f64(cli.interval),
        )?;
        watcher.run(&StopHandle::new())?;
        return Ok(());
    }

    if let Some(patch_path) = cli.simulate {
        let report = simulate(&cli.world, &patch_path)?;
        for result in &report.results {
            let label = result.id.as_deref().unwrap_or("<no id>");
            match &result.outcome {
                Outcome::Applied => println!("applied {label} ({})", result.kind),
                Outcome::Skipped(reason) => {
                    println!("skipped {label} ({}): {reason}", result.kind)
                }
            }
        }
        println!(
            "{} patch(es): {} applied, {} skipped",
            report.results.len(),
            report.applied(),
            report.skipped()
        );
        return Ok(());
    }

    let patch_paths = scenepatch_persist::discover_patch_files(&cli.patches, cli.patch_dir.as_deref());
    let world = apply_once(&cli.world, &patch_paths)?;
    println!(
        "world written to {} ({} entities)",
        cli.world.display(),
        world.entity_count()
    );
    Ok(())
}
