//! Tracing setup for the CLI and long-running demo sessions.
//!
//! Filter comes from `RUST_LOG` (default `info`); `CARENODE_LOG_JSON=1`
//! switches to JSON lines for log shippers. Logs go to stderr so JSON
//! command output on stdout stays parseable.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let json = matches!(std::env::var("CARENODE_LOG_JSON").as_deref(), Ok("1"));
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
}
