use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub key: String,
    pub count: u64,
}

/// Additive key counter that remembers first-encounter order, so equal
/// counts keep a stable order after sorting.
#[derive(Debug, Default, Clone)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<CountEntry>,
}

impl Tally {
    pub fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(CountEntry {
                    key: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    /// Entries by count, highest first.
    pub fn sorted(&self) -> Vec<CountEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub label: String,
    pub links: u64,
    pub accepted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileStats {
    pub fn new(label: impl Into<String>, links: u64) -> Self {
        Self {
            label: label.into(),
            links,
            accepted: 0,
            error: None,
        }
    }

    pub fn match_rate(&self) -> f64 {
        crate::utils::percentage(self.accepted, self.links)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_links: u64,
    pub processed: u64,
    pub accepted: u64,
    pub unique_accepted: u64,
    pub rejected: u64,
    pub no_hostname: u64,
    pub interrupted: bool,
    pub elapsed_ms: u128,
    pub files: Vec<FileStats>,
    pub sources: Vec<CountEntry>,
    pub matched_domains: Vec<CountEntry>,
    pub rejected_hosts: Vec<CountEntry>,
}

impl RunSummary {
    pub fn match_rate(&self) -> f64 {
        crate::utils::percentage(self.accepted, self.total_links)
    }

    pub fn top_matched(&self, n: usize) -> &[CountEntry] {
        &self.matched_domains[..n.min(self.matched_domains.len())]
    }

    pub fn top_rejected(&self, n: usize) -> &[CountEntry] {
        &self.rejected_hosts[..n.min(self.rejected_hosts.len())]
    }
}
