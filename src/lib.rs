pub mod args;
pub mod error;
pub mod filter;
pub mod host;
pub mod links;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod stats;
pub mod utils;
pub mod whitelist;

pub use args::Args;
pub use error::FilterError;
pub use filter::{Classifier, Decision};
pub use host::{extract_host, Extraction, HostSource};
pub use links::extract_individual_links;
pub use pipeline::{run_filter, FilterConfig};
pub use stats::{CountEntry, FileStats, RunSummary};
pub use whitelist::{match_host, Whitelist};
