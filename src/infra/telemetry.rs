use std::sync::Once;

use metrics::{Unit, describe_counter};
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
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "placard_cache_hit_total",
            Unit::Count,
            "Total number of config cache reads served from a fresh entry."
        );
        describe_counter!(
            "placard_cache_miss_total",
            Unit::Count,
            "Total number of config cache reads that found no fresh entry."
        );
        describe_counter!(
            "placard_cache_storage_error_total",
            Unit::Count,
            "Total number of session storage failures absorbed by the config cache."
        );
        describe_counter!(
            "placard_cache_invalidate_total",
            Unit::Count,
            "Total number of explicit config cache invalidations."
        );
        describe_counter!(
            "placard_fetch_failure_total",
            Unit::Count,
            "Total number of failed UI config fetches from the asset store."
        );
        describe_counter!(
            "placard_apply_target_failure_total",
            Unit::Count,
            "Total number of display targets that could not be updated."
        );
    });
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn second_subscriber_install_is_a_telemetry_error() {
        let logging = LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        };
        let _ = init(&logging);

        let err = init(&logging).expect_err("global subscriber already installed");
        assert!(matches!(err, InfraError::Telemetry(_)));
        assert!(err.to_string().starts_with("telemetry initialization failed"));
    }
}
