/*!
 * Tracing Setup
 * Structured output for signal dispatch and task lifecycle events
 *
 * The library only emits `tracing` events. Binaries and tests that want to
 * see them call [`init_tracing`] once.
 */

use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set to `1` or `true` for JSON output
pub const TRACE_JSON_ENV: &str = "SIGSLOT_TRACE_JSON";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFormat {
    /// Human-readable, one line per event
    Compact,
    /// One JSON object per event, with span context
    Json,
}

impl TraceFormat {
    /// Read the format from `SIGSLOT_TRACE_JSON`
    pub fn from_env() -> Self {
        Self::from_flag(std::env::var(TRACE_JSON_ENV).ok().as_deref())
    }

    fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("1") | Some("true") => TraceFormat::Json,
            _ => TraceFormat::Compact,
        }
    }
}

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SIGSLOT_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = TraceFormat::from_env();
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        TraceFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok(),
        TraceFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok(),
    };

    if installed {
        info!(format = ?format, "Tracing initialized");
    }
    installed
}
