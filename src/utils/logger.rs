// Logger initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "paper_agents=info,tower_http=info";

/// Install the process-wide tracing subscriber.
///
/// Output goes to stderr so CLI commands can print JSON on stdout. Calling this
/// twice is harmless; the second call is ignored.
pub fn init_logger() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
