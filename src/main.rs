mod db;
mod readme;
mod registry;
mod runner;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use db::Store;
use registry::Registry;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "readme_stats",
    about = "Word and code-block counts for npm or PyPI package READMEs"
)]
struct Cli {
    /// Package database to analyze
    #[arg(long, value_enum)]
    package_list: Option<Registry>,
    /// Database file to use instead of the configured one
    #[arg(long)]
    db: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let Some(registry) = cli.package_list else {
        println!("Please provide a valid argument to --package-list: 'npm' or 'pypi'");
        return Ok(());
    };

    let t0 = Instant::now();
    let path = match cli.db {
        Some(p) => p,
        None => {
            let settings = Settings::load().context("Failed to load settings")?;
            settings.db_path(registry).to_path_buf()
        }
    };

    println!("{} README analysis", registry.label());
    println!("Database: {:?}\n", path);

    let store = Store::open(&path, registry)?;
    store.ensure_tables()?;

    let summary = runner::run_analysis(&store)?;
    summary.print();
    println!("Stored analyses: {}", store.count_analyses()?);

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}
