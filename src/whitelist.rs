use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::FilterError;

/// Ordered list of accepted domains. Earlier entries win ties.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: Vec<String>,
}

impl Whitelist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads one domain per line, skipping blank lines.
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let start_time = Instant::now();
        info!(action = "start", component = "whitelist", file_path = ?path, "Loading whitelist");

        if !path.exists() {
            return Err(FilterError::ConfigMissing(format!(
                "whitelist not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let whitelist = Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );

        if whitelist.is_empty() {
            return Err(FilterError::ConfigMissing(format!(
                "whitelist is empty: {}",
                path.display()
            )));
        }

        info!(
            action = "loaded",
            component = "whitelist",
            domain_count = whitelist.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Loaded whitelist"
        );
        Ok(whitelist)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn match_host(&self, host: Option<&str>) -> Option<&str> {
        match_host(host, self.entries.as_slice())
    }
}

/// Returns the first whitelist entry (trimmed, original casing) that covers
/// `host`.
///
/// An entry covers a hostname when they are equal, when the hostname is a
/// subdomain of it, or when the entry appears inside the hostname on label
/// boundaries: preceded by the start or a `.`, followed by the end, a `.` or
/// a `:`. The last rule also accepts `cdn.example.com.evil.net` for
/// `example.com`.
pub fn match_host<'a, S: AsRef<str>>(host: Option<&str>, entries: &'a [S]) -> Option<&'a str> {
    let host = host.filter(|h| !h.is_empty())?.to_lowercase();

    for entry in entries {
        let entry = entry.as_ref().trim();
        let entry_lower = entry.to_lowercase();
        if entry_lower.is_empty() {
            continue;
        }

        if host == entry_lower
            || host.ends_with(&format!(".{}", entry_lower))
            || contains_on_label_boundary(&host, &entry_lower)
        {
            return Some(entry);
        }
    }

    None
}

fn contains_on_label_boundary(host: &str, entry: &str) -> bool {
    host.char_indices()
        .filter(|(start, _)| host[*start..].starts_with(entry))
        .any(|(start, _)| {
            let end = start + entry.len();
            let before_ok = start == 0 || host[..start].ends_with('.');
            let after_ok = end == host.len() || host[end..].starts_with(['.', ':']);
            before_ok && after_ok
        })
}
