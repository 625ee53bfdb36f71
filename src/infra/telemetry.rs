use std::{io, sync::Once};

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Events go to stderr; stdout is reserved for command output.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the cache emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "touchline_cache_hit_total",
            Unit::Count,
            "Lookups answered from a fresh stored payload."
        );
        describe_counter!(
            "touchline_cache_refresh_total",
            Unit::Count,
            "Lookups that refetched a missing or stale payload from upstream."
        );
        describe_counter!(
            "touchline_cache_stale_served_total",
            Unit::Count,
            "Lookups that served a stale payload after the upstream refresh failed."
        );
        describe_counter!(
            "touchline_cache_failed_total",
            Unit::Count,
            "Lookups that failed with nothing stored to fall back on."
        );
        describe_counter!(
            "touchline_upstream_request_total",
            Unit::Count,
            "Calls issued to the third-party football API."
        );
        describe_counter!(
            "touchline_store_error_total",
            Unit::Count,
            "Persistent cache reads or writes that failed."
        );
        describe_counter!(
            "touchline_request_scope_dedup_total",
            Unit::Count,
            "Lookups answered by an identical lookup already started in the same request."
        );
        describe_histogram!(
            "touchline_batch_ms",
            Unit::Milliseconds,
            "Wall time of one bulk batch run in milliseconds."
        );
    });
}
