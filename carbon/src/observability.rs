//! Process-wide logging, error reporting and metrics setup.

use crate::config::{CommonConfig, LogFormat, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const METRICS_PREFIX: &str = "carbon";

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("could not set up statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
    #[error("could not install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps error reporting alive; drop it only when the process exits.
pub struct Guard {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Installs the log subscriber, the Sentry client and the StatsD recorder.
/// Call once, before the runtime starts.
pub fn init(common: &CommonConfig) -> Result<Guard, ObservabilityError> {
    let logging = common.logging.clone().unwrap_or_default();
    let sentry = logging.sentry_dsn.as_deref().map(init_sentry);
    init_logging(&logging, sentry.is_some())?;

    if let Some(metrics) = &common.metrics {
        init_metrics(metrics)?;
    }
    Ok(Guard { _sentry: sentry })
}

fn init_sentry(dsn: &str) -> sentry::ClientInitGuard {
    sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ))
}

fn init_logging(logging: &LoggingConfig, with_sentry: bool) -> Result<(), ObservabilityError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let sentry_layer = with_sentry.then(|| sentry::integrations::tracing::layer());
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_layer);

    match logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer()).try_init()?,
    }
    Ok(())
}

fn init_metrics(config: &MetricsConfig) -> Result<(), ObservabilityError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| ObservabilityError::RecorderAlreadySet)?;
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "sending metrics to statsd"
    );
    Ok(())
}
