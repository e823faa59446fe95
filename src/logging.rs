//! Log setup shared by the binaries.
//!
//! Logs go to stderr so rankings can be piped from stdout. `RUST_LOG` wins
//! over the flags when set.

use tracing_subscriber::EnvFilter;

/// Default filter for the verbosity flags: `warn`, `info` or `debug`.
pub fn default_level(verbose: bool, diagnose: bool) -> &'static str {
    match (verbose, diagnose) {
        (_, true) => "gemrank=debug",
        (true, false) => "gemrank=info",
        _ => "warn",
    }
}

pub fn init(verbose: bool, diagnose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, diagnose)));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
