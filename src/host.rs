use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Which query parameter supplied the hostname of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSource {
    Sni,
    Host,
    ServerName,
    Peer,
    RealityHost,
    None,
}

impl HostSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostSource::Sni => "sni",
            HostSource::Host => "host",
            HostSource::ServerName => "servername",
            HostSource::Peer => "peer",
            HostSource::RealityHost => "reality_host",
            HostSource::None => "none",
        }
    }
}

impl fmt::Display for HostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub host: Option<String>,
    pub source: HostSource,
}

impl Extraction {
    fn none() -> Self {
        Self {
            host: None,
            source: HostSource::None,
        }
    }
}

// Most authoritative first.
const PRIORITY: [HostSource; 4] = [
    HostSource::Sni,
    HostSource::Host,
    HostSource::ServerName,
    HostSource::Peer,
];

static PARAM_PATTERNS: Lazy<Vec<(HostSource, Regex)>> = Lazy::new(|| {
    PRIORITY
        .iter()
        .map(|source| {
            let pattern = format!(r"(?i)[?&]{}=([^&?#]+)", source.as_str());
            (*source, Regex::new(&pattern).expect("valid parameter pattern"))
        })
        .collect()
});

static HOST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[?&]host=([^&?#]+)").expect("valid host pattern"));

/// Extracts the SNI-like hostname of a proxy link.
///
/// Parameters are tried in the order `sni`, `host`, `servername`, `peer` and
/// the first one carrying a usable value wins, tagged with its parameter
/// name. Reality links (`security=reality`) get one more pass over `host`,
/// tagged [`HostSource::RealityHost`].
pub fn extract_host(link: &str) -> Extraction {
    for (source, pattern) in PARAM_PATTERNS.iter() {
        if let Some(host) = find_param(link, pattern) {
            return Extraction {
                host: Some(host),
                source: *source,
            };
        }
    }

    // `host` was already tried above with the same cleaning, so this pass
    // only ever yields what the main loop rejected.
    if link.to_lowercase().contains("security=reality") {
        if let Some(host) = find_param(link, &HOST_PATTERN) {
            return Extraction {
                host: Some(host),
                source: HostSource::RealityHost,
            };
        }
    }

    Extraction::none()
}

fn find_param(link: &str, pattern: &Regex) -> Option<String> {
    let raw = pattern.captures(link)?.get(1)?.as_str();
    clean_value(raw)
}

/// Percent-decodes a raw parameter value and strips trailing noise.
///
/// Undecodable input is kept as-is.
fn clean_value(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));

    let value = decoded
        .split(['#', '&'])
        .next()
        .unwrap_or_default()
        .trim_matches(|c| c == '"' || c == '\'' || c == ' ');

    if value.trim().is_empty() {
        return None;
    }

    Some(value.trim().to_string())
}
