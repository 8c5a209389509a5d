use std::io;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "lmt=info,warn";
const VERBOSE_FILTER: &str = "lmt=debug,info";

/// Installs the global subscriber.
///
/// Events go to stderr so that reports and JSON on stdout stay clean.
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
