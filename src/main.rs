use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use sni_filter::report::{print_summary, print_summary_json};
use sni_filter::utils::{setup_logging, validate_args};
use sni_filter::{run_filter, Args, FilterConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let signal_flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        // First Ctrl+C stops classification gracefully, a second one exits.
        while tokio::signal::ctrl_c().await.is_ok() {
            if signal_flag.swap(true, Ordering::Relaxed) {
                warn!(action = "signal", component = "main", "Received second Ctrl+C, exiting");
                std::process::exit(130);
            }
            info!(action = "signal", component = "main", "Received Ctrl+C");
        }
    });

    let config = FilterConfig::from(&args);
    let result = tokio::task::spawn_blocking(move || run_filter(&config, &cancel)).await?;

    match result {
        Ok(summary) => {
            if args.json {
                print_summary_json(&summary)?;
            } else {
                print_summary(&summary, args.top, &args.accepted, &args.rejected);
            }
            Ok(())
        }
        Err(e) => {
            error!("Error: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
