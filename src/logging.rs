//! Diagnostic logging setup.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Default filter directive for the given verbosity.
///
/// `RUST_LOG`, when set, takes precedence over this.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "dirplan=info,warn",
        2 => "dirplan=debug,info",
        _ => "trace",
    }
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Events go to stderr so JSON printed on stdout stays machine-readable.
pub fn init_tracing(verbose: u8, quiet: bool) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    });
}
