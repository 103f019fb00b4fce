use anyhow::Result;
use tracing::{debug, info};

use crate::db::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: usize,
    pub created: usize,
    pub updated: usize,
}

impl RunSummary {
    pub fn print(&self) {
        println!(
            "Analyzed {} READMEs ({} created, {} updated).",
            self.scanned, self.created, self.updated
        );
    }
}

/// Compute metrics for every package with a README and upsert its analysis
/// row. Any storage error aborts the run; rows written before the failure
/// are kept and a re-run picks up where it stopped.
pub fn run_analysis(store: &Store) -> Result<RunSummary> {
    let registry = store.registry();
    info!("Starting {} package analysis.", registry.label());

    let packages = store.fetch_readme_packages()?;
    let mut summary = RunSummary::default();

    for package in &packages {
        let metrics = registry.analyze(&package.readme);
        match store.find_analysis(package.id)? {
            None => {
                store.insert_analysis(package.id, metrics)?;
                summary.created += 1;
                debug!("Created README analysis for package {}", package.name);
            }
            Some(mut analysis) => {
                analysis.word_count = metrics.word_count;
                analysis.code_count = metrics.code_count;
                store.update_analysis(&analysis)?;
                summary.updated += 1;
                debug!("Updated README analysis for package {}", package.name);
            }
        }
        summary.scanned += 1;
    }

    info!("Finished analyzing READMEs.");
    Ok(summary)
}
