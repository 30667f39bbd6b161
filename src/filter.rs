use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::host::{extract_host, Extraction};
use crate::stats::{FileStats, RunSummary, Tally};
use crate::whitelist::Whitelist;

/// Outcome of classifying one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub extraction: Extraction,
    pub matched: Option<String>,
    /// Set when the link was written to the accepted output by this call.
    pub written: bool,
}

/// Routes links to the accepted or rejected output and keeps the run's
/// counters. Accepted links are written once per distinct text; rejected
/// links are written on every occurrence.
pub struct Classifier<'w, A: Write, R: Write> {
    whitelist: &'w Whitelist,
    accepted_out: A,
    rejected_out: R,
    seen: HashSet<String>,
    matched_domains: Tally,
    rejected_hosts: Tally,
    sources: Tally,
    files: Vec<FileStats>,
    file_index: HashMap<String, usize>,
    processed: u64,
    accepted: u64,
    no_hostname: u64,
}

impl<'w, A: Write, R: Write> Classifier<'w, A, R> {
    pub fn new(whitelist: &'w Whitelist, accepted_out: A, rejected_out: R) -> Self {
        Self {
            whitelist,
            accepted_out,
            rejected_out,
            seen: HashSet::new(),
            matched_domains: Tally::default(),
            rejected_hosts: Tally::default(),
            sources: Tally::default(),
            files: Vec::new(),
            file_index: HashMap::new(),
            processed: 0,
            accepted: 0,
            no_hostname: 0,
        }
    }

    /// Registers an input file with the number of links read from it.
    /// Files keep their registration order in the per-file breakdown.
    pub fn register_file(&mut self, label: &str, links: u64, error: Option<String>) {
        let i = self.file_slot(label);
        self.files[i].links = links;
        if error.is_some() {
            self.files[i].error = error;
        }
    }

    fn file_slot(&mut self, label: &str) -> usize {
        if let Some(&i) = self.file_index.get(label) {
            return i;
        }
        self.files.push(FileStats::new(label, 0));
        self.file_index.insert(label.to_string(), self.files.len() - 1);
        self.files.len() - 1
    }

    pub fn classify(&mut self, link: &str, origin: &str) -> io::Result<Decision> {
        let extraction = extract_host(link);
        let matched = self
            .whitelist
            .match_host(extraction.host.as_deref())
            .map(str::to_string);

        self.processed += 1;
        self.sources.increment(extraction.source.as_str());
        let file = self.file_slot(origin);

        let mut written = false;
        match (&matched, &extraction.host) {
            (Some(domain), _) => {
                self.matched_domains.increment(domain);
                self.accepted += 1;
                self.files[file].accepted += 1;

                if !self.seen.contains(link) {
                    writeln!(self.accepted_out, "{}", link)?;
                    self.seen.insert(link.to_string());
                    written = true;
                }
            }
            (None, host) => {
                writeln!(self.rejected_out, "{}", link)?;
                match host {
                    Some(host) => self.rejected_hosts.increment(host),
                    None => self.no_hostname += 1,
                }
            }
        }

        Ok(Decision {
            extraction,
            matched,
            written,
        })
    }

    /// Classifies links in order until the input ends or `cancel` is set.
    /// Returns `true` when the run was cut short.
    pub fn process<I, L, O>(
        &mut self,
        links: I,
        total: usize,
        cancel: &AtomicBool,
    ) -> io::Result<bool>
    where
        I: IntoIterator<Item = (L, O)>,
        L: AsRef<str>,
        O: AsRef<str>,
    {
        for (idx, (link, origin)) in links.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                warn!(
                    action = "interrupt",
                    component = "classifier",
                    processed = idx,
                    total = total,
                    "Processing interrupted"
                );
                return Ok(true);
            }

            let decision = self.classify(link.as_ref(), origin.as_ref())?;
            let host = decision.extraction.host.as_deref().unwrap_or("no SNI");
            match &decision.matched {
                Some(domain) => debug!(
                    index = idx + 1,
                    total = total,
                    source = %decision.extraction.source,
                    matched = %domain,
                    host = host,
                    "accepted"
                ),
                None => debug!(
                    index = idx + 1,
                    total = total,
                    source = %decision.extraction.source,
                    host = host,
                    "rejected"
                ),
            }
        }

        Ok(false)
    }

    /// Flushes both outputs and produces the summary.
    ///
    /// `total_links` is the processed count; callers that know the corpus
    /// size overwrite it.
    pub fn finish(mut self) -> io::Result<RunSummary> {
        self.accepted_out.flush()?;
        self.rejected_out.flush()?;

        info!(
            action = "complete",
            component = "classifier",
            processed = self.processed,
            accepted = self.accepted,
            unique_accepted = self.seen.len(),
            "Classification finished"
        );

        Ok(RunSummary {
            total_links: self.processed,
            processed: self.processed,
            accepted: self.accepted,
            unique_accepted: self.seen.len() as u64,
            rejected: self.processed - self.accepted,
            no_hostname: self.no_hostname,
            interrupted: false,
            elapsed_ms: 0,
            files: self.files,
            sources: self.sources.sorted(),
            matched_domains: self.matched_domains.sorted(),
            rejected_hosts: self.rejected_hosts.sorted(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CountEntry;

    fn entry(key: &str, count: u64) -> CountEntry {
        CountEntry {
            key: key.to_string(),
            count,
        }
    }

    fn lines(buf: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_accept_and_reject() {
        let whitelist = Whitelist::new(["good.com"]);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        let summary = {
            let mut classifier = Classifier::new(&whitelist, &mut accepted, &mut rejected);
            let cancel = AtomicBool::new(false);
            let input = vec![
                ("vless://abc?sni=good.com#x", "a.txt"),
                ("vless://abc?sni=bad.com#x", "a.txt"),
            ];
            let interrupted = classifier.process(input, 2, &cancel).unwrap();
            assert!(!interrupted);
            classifier.finish().unwrap()
        };

        assert_eq!(lines(&accepted), vec!["vless://abc?sni=good.com#x"]);
        assert_eq!(lines(&rejected), vec!["vless://abc?sni=bad.com#x"]);
        assert_eq!(summary.matched_domains, vec![entry("good.com", 1)]);
        assert_eq!(summary.rejected_hosts, vec![entry("bad.com", 1)]);
        assert_eq!(summary.sources, vec![entry("sni", 2)]);
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.no_hostname, 0);
    }

    #[test]
    fn test_duplicate_accepted_written_once_but_counted_twice() {
        let whitelist = Whitelist::new(["good.com"]);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        let summary = {
            let mut classifier = Classifier::new(&whitelist, &mut accepted, &mut rejected);
            classifier.register_file("f.txt", 2, None);
            let first = classifier.classify("trojan://p@h:1?sni=good.com", "f.txt").unwrap();
            let second = classifier.classify("trojan://p@h:1?sni=good.com", "f.txt").unwrap();
            assert!(first.written);
            assert_eq!(second.matched.as_deref(), Some("good.com"));
            assert!(!second.written);
            classifier.finish().unwrap()
        };

        assert_eq!(lines(&accepted).len(), 1);
        assert!(rejected.is_empty());
        assert_eq!(summary.matched_domains, vec![entry("good.com", 2)]);
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.unique_accepted, 1);
        assert_eq!(summary.files[0].accepted, 2);
        assert_eq!(summary.files[0].links, 2);
    }

    #[test]
    fn test_rejected_never_deduplicated() {
        let whitelist = Whitelist::new(["good.com"]);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        let summary = {
            let mut classifier = Classifier::new(&whitelist, &mut accepted, &mut rejected);
            classifier.classify("vmess://opaque", "f.txt").unwrap();
            classifier.classify("vmess://opaque", "f.txt").unwrap();
            classifier.classify("vless://x?host=other.net", "g.txt").unwrap();
            classifier.finish().unwrap()
        };

        assert_eq!(
            lines(&rejected),
            vec!["vmess://opaque", "vmess://opaque", "vless://x?host=other.net"]
        );
        assert_eq!(summary.no_hostname, 2);
        assert_eq!(summary.rejected_hosts, vec![entry("other.net", 1)]);
        assert_eq!(summary.sources, vec![entry("none", 2), entry("host", 1)]);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[1].label, "g.txt");
    }

    #[test]
    fn test_cancel_stops_before_next_link() {
        let whitelist = Whitelist::new(["good.com"]);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let cancel = AtomicBool::new(true);

        let summary = {
            let mut classifier = Classifier::new(&whitelist, &mut accepted, &mut rejected);
            classifier.register_file("f.txt", 1, None);
            let interrupted = classifier
                .process([("vless://a?sni=good.com", "f.txt")], 1, &cancel)
                .unwrap();
            assert!(interrupted);
            classifier.finish().unwrap()
        };

        assert_eq!(summary.processed, 0);
        assert!(accepted.is_empty());
        assert_eq!(summary.files[0].links, 1);
        assert_eq!(summary.files[0].accepted, 0);
    }

    #[test]
    fn test_registered_file_without_links() {
        let whitelist = Whitelist::new(["good.com"]);
        let mut classifier = Classifier::new(&whitelist, Vec::<u8>::new(), Vec::<u8>::new());
        classifier.register_file("broken.txt", 0, Some("permission denied".to_string()));
        classifier.register_file("empty.txt", 0, None);

        let summary = classifier.finish().unwrap();
        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[0].error.as_deref(), Some("permission denied"));
        assert_eq!(summary.files[1].links, 0);
    }
}
