//! Logging for the CLI: a stderr fmt layer (text or JSON) behind an
//! `EnvFilter`, plus an OTLP span exporter when an endpoint is configured.

use crate::cli::commands::logging::{LogFormat, LogSettings};
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{SdkTracerProvider, Tracer},
    Resource,
};
use std::{env, io, time::Duration};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};
use ulid::Ulid;

pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

/// Noisy transport crates stay quiet unless asked for by `RUST_LOG`.
const QUIET_TARGETS: [&str; 4] = [
    "hyper=error",
    "hyper_util=error",
    "h2=error",
    "opentelemetry_sdk=warn",
];

static PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Bare `host:port` endpoints are assumed to be TLS.
fn with_scheme(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    }
}

fn otlp_tracer(endpoint: &str) -> Result<Tracer> {
    if let Ok(protocol) = env::var("OTEL_EXPORTER_OTLP_PROTOCOL") {
        if protocol != "grpc" {
            debug!(%protocol, "only grpc export is supported, ignoring protocol");
        }
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(with_scheme(endpoint))
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("failed to build OTLP span exporter")?;

    let instance = env::var("OTEL_SERVICE_INSTANCE_ID").unwrap_or_else(|_| Ulid::new().to_string());
    let resource = Resource::builder_empty()
        .with_attributes([
            KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("service.instance.id", instance),
        ])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
    let _ = PROVIDER.set(provider);

    Ok(tracer)
}

fn filter(level: Option<Level>) -> Result<EnvFilter> {
    QUIET_TARGETS.iter().try_fold(
        EnvFilter::builder()
            .with_default_directive(level.unwrap_or(Level::ERROR).into())
            .from_env_lossy(),
        |filter, directive| Ok(filter.add_directive(directive.parse()?)),
    )
}

/// Installs the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built or a global subscriber is
/// already installed.
pub fn init(settings: LogSettings) -> Result<()> {
    let text = (settings.format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
    });
    let json = (settings.format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
    });

    let otel = match env::var(ENV_OTLP_ENDPOINT) {
        Ok(endpoint) if !endpoint.trim().is_empty() => {
            Some(tracing_opentelemetry::layer().with_tracer(otlp_tracer(endpoint.trim())?))
        }
        _ => None,
    };

    let subscriber = Registry::default()
        .with(filter(settings.level)?)
        .with(text)
        .with(json)
        .with(otel);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flushes pending spans; does nothing when no exporter was installed.
pub fn shutdown_tracer() {
    if let Some(provider) = PROVIDER.get() {
        debug!("flushing spans");
        if let Err(err) = provider.shutdown() {
            eprintln!("failed to flush spans: {err}");
        }
    }
}
