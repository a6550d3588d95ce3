//! Prometheus metrics for Kafka clients, driven by the lifecycle and network events the
//! clients emit.
//!
//! Build a [`ConsumerExporter`] or [`ProducerExporter`] against a [`MetricsRegistry`], then
//! call `enable_metrics` to subscribe it to the client's [`EventSource`]. Exporters for several
//! clients can share one registry.

pub mod catalog;
pub mod config;
pub mod consumer;
pub mod error;
pub mod event;
pub mod labels;
pub mod options;
pub mod producer;
#[cfg(feature = "rdkafka")]
pub mod rdkafka_context;
pub mod registry;
pub mod source;

// Shared with the integration tests, which enable the feature through a dev-dependency.
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

pub use catalog::DEFAULT_BUCKETS;
pub use config::Config;
pub use consumer::{ConsumerExporter, ConsumerMetrics};
pub use error::Error;
pub use event::{ClientEvent, ClientRole, EventType};
pub use labels::StandardLabels;
pub use options::{ConsumerExporterOptions, ProducerExporterOptions};
pub use producer::{ProducerExporter, ProducerMetrics};
pub use registry::{Metric, MetricKind, MetricsRegistry};
pub use source::{EventBus, EventSource, Handler};

/// Export metrics for `consumer` into `registry` with default options.
pub fn monitor_consumer<S: EventSource>(
    consumer: S,
    registry: &MetricsRegistry,
) -> Result<ConsumerExporter<S>, Error> {
    let exporter = ConsumerExporter::new(consumer, registry, ConsumerExporterOptions::default())?;
    exporter.enable_metrics();
    Ok(exporter)
}

/// Export metrics for `producer` into `registry` with default options.
pub fn monitor_producer<S: EventSource>(
    producer: S,
    registry: &MetricsRegistry,
) -> Result<ProducerExporter<S>, Error> {
    let exporter = ProducerExporter::new(producer, registry, ProducerExporterOptions::default())?;
    exporter.enable_metrics();
    Ok(exporter)
}
