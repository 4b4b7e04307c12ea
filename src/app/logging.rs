//! Logging configuration and initialization

use crate::app::config::TaskConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for a task process.
///
/// `RUST_LOG` takes precedence over the configured verbosity. Calling this
/// more than once keeps the first subscriber.
pub fn init_logging(config: &TaskConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2)
        .with_thread_ids(config.verbose >= 3)
        .with_line_number(config.verbose >= 3)
        .try_init()
        .is_ok();

    if installed {
        debug!("Logging initialized at verbosity {}", config.verbose);
    }
}

/// Initialize tracing with just a verbosity level
pub fn init_tracing(verbose: u8) {
    init_logging(&TaskConfig::default().with_verbose(verbose));
}
