//! Logging setup with optional `OpenTelemetry` span export.
//!
//! Console logging through `tracing-subscriber` is always installed, filtered
//! by `RUST_LOG`. With the `telemetry` feature and `OTEL_EXPORTER_OTLP_*`
//! variables present, spans are also exported over OTLP.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "telemetry")]
mod otlp {
    use std::env;

    use opentelemetry::KeyValue;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::{SCHEMA_URL, attribute::SERVICE_VERSION};

    /// OTLP transport selected by `OTEL_EXPORTER_OTLP_PROTOCOL`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum Protocol {
        Http,
        Grpc,
    }

    /// `None` when no OTLP variable is set.
    pub(super) fn detect_protocol() -> Option<Protocol> {
        let configured = [
            "OTEL_EXPORTER_OTLP_ENDPOINT",
            "OTEL_EXPORTER_OTLP_HEADERS",
            "OTEL_EXPORTER_OTLP_PROTOCOL",
        ]
        .iter()
        .any(|key| env::var_os(key).is_some());
        configured.then(|| match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
            Ok("grpc") => Protocol::Grpc,
            _ => Protocol::Http,
        })
    }

    fn resource(name: &str, version: &str) -> Resource {
        let name = env::var("OTEL_SERVICE_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| name.to_owned());
        Resource::builder()
            .with_service_name(name)
            .with_schema_url([KeyValue::new(SERVICE_VERSION, version.to_owned())], SCHEMA_URL)
            .build()
    }

    pub(super) fn tracer_provider(
        protocol: Protocol,
        name: &str,
        version: &str,
    ) -> Option<SdkTracerProvider> {
        let exporter = match protocol {
            Protocol::Http => opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .build(),
            Protocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .build(),
        };
        let exporter = exporter.ok()?;
        Some(
            SdkTracerProvider::builder()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource(name, version))
                .with_batch_exporter(exporter)
                .build(),
        )
    }
}

/// Process-wide logging configuration.
#[derive(Debug, Default)]
pub struct Telemetry {
    name: Option<String>,
    version: Option<String>,
    log_level: Option<String>,
}

impl Telemetry {
    /// Creates an empty [`Telemetry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Service name reported to the exporter.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Service version reported to the exporter.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Filter directive used when `RUST_LOG` is unset, e.g. `"webhost=debug"`.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Installs the global subscriber. Call once per process.
    ///
    /// The returned guard flushes exporters when dropped.
    pub fn register(self) -> TelemetryGuard {
        let fallback = self.log_level.as_deref().unwrap_or("info");
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

        #[cfg(feature = "telemetry")]
        {
            use opentelemetry::trace::TracerProvider;
            use tracing_opentelemetry::OpenTelemetryLayer;

            let name = self.name.as_deref().unwrap_or(env!("CARGO_PKG_NAME"));
            let version = self.version.as_deref().unwrap_or(env!("CARGO_PKG_VERSION"));
            let tracer_provider = otlp::detect_protocol()
                .and_then(|protocol| otlp::tracer_provider(protocol, name, version));
            let otel_layer = tracer_provider
                .as_ref()
                .map(|tp| OpenTelemetryLayer::new(tp.tracer("webhost")));

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(otel_layer)
                .init();

            if tracer_provider.is_some() {
                tracing::info!("OpenTelemetry span export enabled");
            }
            TelemetryGuard { tracer_provider }
        }

        #[cfg(not(feature = "telemetry"))]
        {
            let _ = (self.name, self.version);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            TelemetryGuard {}
        }
    }
}

/// Flushes span exporters on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(ref tp) = self.tracer_provider
            && let Err(err) = tp.shutdown()
        {
            tracing::error!(?err, "tracer provider shutdown error");
        }
    }
}
