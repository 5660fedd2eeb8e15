use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::application::auth::METRIC_LOGIN_THROTTLED;
use crate::cache::{
    METRIC_PAGE_CACHE_HIT, METRIC_PAGE_CACHE_MISS, METRIC_PAGE_CACHE_REFRESH,
    METRIC_PAGE_CACHE_REMOVED,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

const COUNTERS: [(&str, &str); 5] = [
    (
        METRIC_PAGE_CACHE_HIT,
        "Page lookups answered from the rendered-page cache.",
    ),
    (
        METRIC_PAGE_CACHE_MISS,
        "Page lookups that built and cached a page for the first time.",
    ),
    (
        METRIC_PAGE_CACHE_REFRESH,
        "Cached pages rebuilt because their source was modified.",
    ),
    (
        METRIC_PAGE_CACHE_REMOVED,
        "Cached pages evicted because their source could not be stat'ed.",
    ),
    (
        METRIC_LOGIN_THROTTLED,
        "Login requests rejected by the brute-force throttle.",
    ),
];

/// Install the global subscriber and register metric descriptions.
///
/// `RUST_LOG` directives take precedence over `logging.level`.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, help) in COUNTERS {
            describe_counter!(name, Unit::Count, help);
        }
    });

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("tracing subscriber already set: {err}")))
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    }
}
