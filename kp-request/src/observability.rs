//! Tracing subscriber setup for hosts embedding the client.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! up to the host. [`init_observability`] is a ready-made one.

use std::io;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

impl LogFormat {
    /// Reads the format from `LOG_FORMAT` (`json` or `pretty`, default `pretty`).
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    /// Parses a format name, case-insensitively. Unknown names mean pretty.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") { Self::Json } else { Self::Pretty }
    }
}

/// Installs a global subscriber writing to stderr.
///
/// The level filter comes from `RUST_LOG` and defaults to `info`. Exchange
/// records use the `kp_request::exchange` target, so
/// `RUST_LOG=kp_request::exchange=info` isolates them.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
///
/// # Examples
///
/// ```no_run
/// use kp_request::observability::{LogFormat, init_observability};
///
/// init_observability(LogFormat::from_env());
/// ```
pub fn init_observability(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    installed.is_ok()
}
