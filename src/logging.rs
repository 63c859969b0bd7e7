use color_eyre::Result;
use color_eyre::eyre::Context;
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Handle to the installed tracing pipeline.
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Flushes spans still buffered for the OTLP exporter.
    pub fn shutdown(self) {
        if let Some(tracer_provider) = self.tracer_provider
            && let Err(error) = tracer_provider.shutdown()
        {
            eprintln!("Failed to flush traces: {}", error);
        }
    }
}

/// A bare level applies to this crate only; dependencies (reqwest, hyper, tonic) stay
/// at `warn` or quieter. Anything else is taken as a full `EnvFilter` directive.
fn filter_directives(level: &str) -> String {
    match level.parse::<LevelFilter>() {
        Ok(level) => format!(
            "{},{}={}",
            level.min(LevelFilter::WARN),
            CRATE_TARGET,
            level
        ),
        Err(_) => level.to_string(),
    }
}

fn otlp_tracer_provider(service_name: &str, endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .wrap_err_with(|| format!("Failed to create OTLP span exporter for {}", endpoint))?;

    let resource = Resource::builder()
        .with_attributes(vec![
            KeyValue::new(SERVICE_NAME, service_name.to_string()),
            KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Installs the global subscriber. Logs go to stderr so `--json` output on stdout
/// stays machine readable. Spans are also exported over OTLP when an endpoint is set.
pub fn init_tracing(
    service_name: &str,
    otlp_endpoint: Option<&str>,
    level: &str,
) -> Result<Telemetry> {
    let tracer_provider = otlp_endpoint
        .map(|endpoint| otlp_tracer_provider(service_name, endpoint))
        .transpose()?;

    let telemetry_layer = tracer_provider.as_ref().map(|provider| {
        opentelemetry::global::set_tracer_provider(provider.clone());
        tracing_opentelemetry::layer().with_tracer(provider.tracer(CRATE_TARGET))
    });

    let filter = EnvFilter::try_new(filter_directives(level))
        .wrap_err_with(|| format!("Invalid log level: {}", level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .with(telemetry_layer)
        .init();

    Ok(Telemetry { tracer_provider })
}
