use once_cell::sync::Lazy;
use regex::Regex;

/// Link schemes recognised inside a raw line, in scan order.
const SCHEMES: [&str; 3] = ["vmess", "vless", "trojan"];

static SCHEME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    SCHEMES
        .iter()
        .map(|scheme| {
            Regex::new(&format!(r#"(?i){}://[^\s"]+"#, scheme)).expect("valid scheme pattern")
        })
        .collect()
});

/// Pulls individual proxy links out of one raw line.
///
/// Each scheme is scanned separately and the results are concatenated in
/// scheme order (all `vmess://` hits, then `vless://`, then `trojan://`),
/// not in positional order. A line without any recognised scheme is
/// returned whole (trimmed) as a single opaque link.
pub fn extract_individual_links(line: &str) -> Vec<String> {
    let mut links = Vec::new();

    for pattern in SCHEME_PATTERNS.iter() {
        links.extend(pattern.find_iter(line).map(|m| m.as_str().to_string()));
    }

    if links.is_empty() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            links.push(trimmed.to_string());
        }
    }

    links
}
