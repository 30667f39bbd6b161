use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::info;

use crate::error::FilterError;
use crate::filter::Classifier;
use crate::sources::{backup_file_if_exists, discover_sources, read_sources};
use crate::stats::RunSummary;
use crate::whitelist::Whitelist;
use crate::Args;

/// Locations and knobs for one filtering run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub whitelist: PathBuf,
    pub sub_dir: PathBuf,
    pub accepted: PathBuf,
    pub rejected: PathBuf,
    pub backups_dir: Option<PathBuf>,
    pub workers: Option<usize>,
}

impl From<&Args> for FilterConfig {
    fn from(args: &Args) -> Self {
        Self {
            whitelist: args.whitelist.clone(),
            sub_dir: args.sub_dir.clone(),
            accepted: args.accepted.clone(),
            rejected: args.rejected.clone(),
            backups_dir: (!args.no_backup).then(|| args.backups_dir.clone()),
            workers: args.workers,
        }
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>, FilterError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| FilterError::Output {
            path: path.to_path_buf(),
            source,
        })
}

/// Runs the whole filter: load whitelist, read sources, back up and
/// truncate outputs, classify every link.
///
/// Outputs are only touched once the whitelist and at least one link are
/// available, so a `ConfigMissing` failure leaves previous results intact.
pub fn run_filter(config: &FilterConfig, cancel: &AtomicBool) -> Result<RunSummary, FilterError> {
    let whitelist = Whitelist::load(&config.whitelist)?;
    let paths = discover_sources(&config.sub_dir)?;
    let sources = read_sources(&paths, config.workers)?;

    let total_links: usize = sources.iter().map(|s| s.links.len()).sum();
    if total_links == 0 {
        return Err(FilterError::ConfigMissing(format!(
            "no links found in {}",
            config.sub_dir.display()
        )));
    }

    if let Some(backups_dir) = &config.backups_dir {
        backup_file_if_exists(&config.accepted, backups_dir)?;
        backup_file_if_exists(&config.rejected, backups_dir)?;
    }

    let accepted_out = create_output(&config.accepted)?;
    let rejected_out = create_output(&config.rejected)?;

    info!(
        action = "start",
        component = "filter",
        file_count = sources.len(),
        domain_count = whitelist.len(),
        link_count = total_links,
        "Filtering links"
    );
    let start_time = Instant::now();

    let mut classifier = Classifier::new(&whitelist, accepted_out, rejected_out);
    for source in &sources {
        classifier.register_file(&source.label, source.links.len() as u64, source.error.clone());
    }

    let links = sources.iter().flat_map(|source| {
        source
            .links
            .iter()
            .map(move |link| (link.as_str(), source.label.as_str()))
    });
    let interrupted = classifier.process(links, total_links, cancel)?;

    let mut summary = classifier.finish()?;
    summary.total_links = total_links as u64;
    summary.interrupted = interrupted;
    summary.elapsed_ms = start_time.elapsed().as_millis();

    info!(
        action = "complete",
        component = "filter",
        duration_ms = summary.elapsed_ms,
        interrupted = interrupted,
        "Filtering finished"
    );
    Ok(summary)
}
