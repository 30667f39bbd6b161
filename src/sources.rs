use chrono::Local;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::error::FilterError;
use crate::links::extract_individual_links;

/// Links read from one input file.
#[derive(Debug, Clone)]
pub struct LinkSource {
    pub label: String,
    pub links: Vec<String>,
    pub error: Option<String>,
}

/// Lists the `*.txt` files of `dir` in file-name order.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, FilterError> {
    if !dir.is_dir() {
        return Err(FilterError::ConfigMissing(format!(
            "input directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(FilterError::ConfigMissing(format!(
            "no .txt files in {}",
            dir.display()
        )));
    }

    info!(action = "discover", component = "sources", dir = ?dir, file_count = paths.len(), "Found input files");
    Ok(paths)
}

fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Splits every non-blank line of `content` into links.
pub fn links_from_text(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(extract_individual_links)
        .collect()
}

pub fn read_source(path: &Path) -> Result<Vec<String>, FilterError> {
    let content = fs::read_to_string(path).map_err(|source| FilterError::SourceRead {
        label: source_label(path),
        source,
    })?;
    Ok(links_from_text(&content))
}

fn load_source(path: &PathBuf) -> LinkSource {
    let label = source_label(path);
    match read_source(path) {
        Ok(links) => LinkSource {
            label,
            links,
            error: None,
        },
        Err(e) => LinkSource {
            label,
            links: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

/// Reads all sources, one after another unless `workers` asks for a
/// thread pool. The result keeps the order of `paths` either way;
/// unreadable files come back empty with their error recorded.
pub fn read_sources(
    paths: &[PathBuf],
    workers: Option<usize>,
) -> Result<Vec<LinkSource>, FilterError> {
    let start_time = Instant::now();
    let workers = workers.unwrap_or(1);

    info!(action = "start", component = "source_reading", file_count = paths.len(), workers = workers, "Reading input files");

    let sources: Vec<LinkSource> = if workers <= 1 {
        paths.iter().map(load_source).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| FilterError::Io(std::io::Error::other(e)))?;
        pool.install(|| paths.par_iter().map(load_source).collect())
    };

    for source in &sources {
        match &source.error {
            None => info!(action = "read", component = "source", file = %source.label, link_count = source.links.len(), "Read input file"),
            Some(e) => warn!(action = "read", component = "source", file = %source.label, error = %e, "Failed to read input file"),
        }
    }

    info!(
        action = "complete",
        component = "source_reading",
        link_count = sources.iter().map(|s| s.links.len()).sum::<usize>(),
        duration_ms = start_time.elapsed().as_millis(),
        "Finished reading input files"
    );
    Ok(sources)
}

/// Copies `src_path` into `backups_dir` as `<stem>_backup_<timestamp><.ext>`.
/// Returns the backup path, or `None` when there was nothing to back up.
pub fn backup_file_if_exists(
    src_path: &Path,
    backups_dir: &Path,
) -> Result<Option<PathBuf>, FilterError> {
    if !src_path.exists() {
        return Ok(None);
    }

    fs::create_dir_all(backups_dir)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let stem = src_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = src_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let backup_path = backups_dir.join(format!("{}_backup_{}{}", stem, timestamp, ext));

    fs::copy(src_path, &backup_path)?;
    info!(action = "backup", component = "outputs", source = ?src_path, destination = ?backup_path, "Backed up previous output");
    Ok(Some(backup_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_from_text() {
        let content = "\n  vless://a?sni=x.com  \n\nvmess://b trojan://c\r\nplain-line\n   \n";
        assert_eq!(
            links_from_text(content),
            vec!["vless://a?sni=x.com", "vmess://b", "trojan://c", "plain-line"]
        );
    }

    #[test]
    fn test_source_label() {
        assert_eq!(source_label(Path::new("sub/list.txt")), "list.txt");
    }

    #[test]
    fn test_parallel_read_keeps_order() {
        let dir = std::env::temp_dir().join(format!("sni-filter-read-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let mut paths = Vec::new();
        for i in 0..6 {
            let path = dir.join(format!("{}.txt", i));
            fs::write(&path, format!("vless://n{}?sni=a.com\n", i)).unwrap();
            paths.push(path);
        }

        let sequential = read_sources(&paths, None).unwrap();
        let parallel = read_sources(&paths, Some(3)).unwrap();

        let labels = |sources: &[LinkSource]| -> Vec<String> {
            sources.iter().map(|s| s.label.clone()).collect()
        };
        assert_eq!(labels(&sequential), labels(&parallel));
        assert_eq!(parallel[4].links, vec!["vless://n4?sni=a.com"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_dir_is_config_missing() {
        let err = discover_sources(Path::new("definitely/not/a/dir")).unwrap_err();
        assert!(matches!(err, FilterError::ConfigMissing(_)));
    }
}
