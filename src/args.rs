use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sni-filter",
    about = "Split proxy links into whitelisted and rejected sets by their SNI host",
    version,
    long_about = None
)]
pub struct Args {
    /// Whitelist file, one domain per line
    #[arg(long, default_value = "whitelist.txt")]
    pub whitelist: PathBuf,

    /// Directory holding the .txt files with proxy links
    #[arg(short, long, default_value = "sub")]
    pub sub_dir: PathBuf,

    /// Output file for accepted links
    #[arg(long, default_value = "subWhitelist.txt")]
    pub accepted: PathBuf,

    /// Output file for rejected links
    #[arg(long, default_value = "subNo.txt")]
    pub rejected: PathBuf,

    /// Directory for backups of previous output files
    #[arg(long, default_value = "backups")]
    pub backups_dir: PathBuf,

    /// Do not back up previous output files
    #[arg(long)]
    pub no_backup: bool,

    /// Number of entries in the top matched / rejected lists
    #[arg(short, long, default_value_t = 15)]
    pub top: usize,

    /// Number of threads used to read input files (sequential when unset)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
