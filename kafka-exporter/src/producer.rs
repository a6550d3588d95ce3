use std::sync::Arc;

use prometheus::{CounterVec, GaugeVec, HistogramVec};
use tracing::info;

use crate::catalog::{ms_to_seconds, MetricDef};
use crate::error::Error;
use crate::event::{ClientEvent, ClientRole, EventType, RequestPayload, RequestQueueSizePayload};
use crate::labels::{as_label_refs, merge_labels, Labels, StandardLabels};
use crate::options::{buckets_or_default, ProducerExporterOptions};
use crate::registry::MetricsRegistry;
use crate::source::EventSource;

pub const CONNECTION_COUNT: MetricDef = MetricDef::new(
    "kafka_producer_connection_count",
    "The current number of active connections established with a broker",
    &[],
);
pub const CONNECTION_CREATION_TOTAL: MetricDef = MetricDef::new(
    "kafka_producer_connection_creation_total",
    "The total number of connections established with a broker",
    &[],
);
pub const CONNECTION_CLOSE_TOTAL: MetricDef = MetricDef::new(
    "kafka_producer_connection_close_total",
    "The total number of connections closed with a broker",
    &[],
);
pub const REQUEST_DURATION_SECONDS: MetricDef = MetricDef::new(
    "kafka_producer_request_duration_seconds",
    "The time taken for processing a producer request.",
    &["broker"],
);
pub const REQUEST_TOTAL: MetricDef = MetricDef::new(
    "kafka_producer_request_total",
    "The total number of requests sent.",
    &["broker"],
);
pub const REQUEST_SIZE_TOTAL: MetricDef = MetricDef::new(
    "kafka_producer_request_size_total",
    "The size of any request sent.",
    &["broker"],
);
pub const REQUEST_QUEUE_SIZE: MetricDef = MetricDef::new(
    "kafka_producer_request_queue_size",
    "Size of the request queue.",
    &["broker"],
);

/// Events a producer exporter subscribes to.
pub const PRODUCER_EVENTS: &[EventType] = &[
    EventType::Connect,
    EventType::Disconnect,
    EventType::NetworkRequest,
    EventType::NetworkRequestQueueSize,
];

const NO_LABELS: [(&str, &str); 0] = [];

/// The producer metric catalog and its handlers.
///
/// Several producers in one process can share a registry: every metric is looked up by name
/// before it is created, so all of them update the same series.
pub struct ProducerMetrics {
    standard_labels: StandardLabels,
    active_connections: GaugeVec,
    connections_created_total: CounterVec,
    connections_closed_total: CounterVec,
    request_duration: HistogramVec,
    request_total: CounterVec,
    request_size_total: CounterVec,
    request_queue_size: GaugeVec,
}

impl ProducerMetrics {
    pub fn new(
        registry: &MetricsRegistry,
        options: &ProducerExporterOptions,
    ) -> Result<Self, Error> {
        let standard = &options.standard_labels;

        Ok(Self {
            active_connections: CONNECTION_COUNT.gauge(registry, standard)?,
            connections_created_total: CONNECTION_CREATION_TOTAL.counter(registry, standard)?,
            connections_closed_total: CONNECTION_CLOSE_TOTAL.counter(registry, standard)?,
            request_duration: REQUEST_DURATION_SECONDS.histogram(
                registry,
                standard,
                buckets_or_default(&options.request_duration_buckets),
            )?,
            request_total: REQUEST_TOTAL.counter(registry, standard)?,
            request_size_total: REQUEST_SIZE_TOTAL.counter(registry, standard)?,
            request_queue_size: REQUEST_QUEUE_SIZE.gauge(registry, standard)?,
            standard_labels: standard.clone(),
        })
    }

    pub fn handle(&self, event: &ClientEvent) -> Result<(), Error> {
        match event {
            ClientEvent::Connect => self.on_connect(),
            ClientEvent::Disconnect => self.on_disconnect(),
            ClientEvent::NetworkRequest(payload) => self.on_request(payload),
            ClientEvent::NetworkRequestQueueSize(payload) => self.on_request_queue_size(payload),
            ClientEvent::Crash(_)
            | ClientEvent::Heartbeat(_)
            | ClientEvent::Fetch(_)
            | ClientEvent::EndBatchProcess(_) => Err(Error::UnsupportedEvent {
                role: ClientRole::Producer.as_str(),
                event: event.event_type(),
            }),
        }
    }

    pub fn on_connect(&self) -> Result<(), Error> {
        let labels = self.labels(NO_LABELS);
        let labels = as_label_refs(&labels);
        self.active_connections.get_metric_with(&labels)?.inc();
        self.connections_created_total.get_metric_with(&labels)?.inc();
        Ok(())
    }

    pub fn on_disconnect(&self) -> Result<(), Error> {
        let labels = self.labels(NO_LABELS);
        let labels = as_label_refs(&labels);
        self.active_connections.get_metric_with(&labels)?.dec();
        self.connections_closed_total.get_metric_with(&labels)?.inc();
        Ok(())
    }

    pub fn on_request(&self, payload: &RequestPayload) -> Result<(), Error> {
        let labels = self.labels([("broker", payload.broker.as_str())]);
        let labels = as_label_refs(&labels);
        self.request_total.get_metric_with(&labels)?.inc();
        self.request_size_total
            .get_metric_with(&labels)?
            .inc_by(payload.size as f64);
        self.request_duration
            .get_metric_with(&labels)?
            .observe(ms_to_seconds(payload.duration));
        Ok(())
    }

    pub fn on_request_queue_size(&self, payload: &RequestQueueSizePayload) -> Result<(), Error> {
        let labels = self.labels([("broker", payload.broker.as_str())]);
        self.request_queue_size
            .get_metric_with(&as_label_refs(&labels))?
            .set(payload.queue_size as f64);
        Ok(())
    }

    fn labels<I, K, V>(&self, labels: I) -> Labels
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        merge_labels(labels, &self.standard_labels)
    }
}

/// Exports metrics for a Kafka producer.
pub struct ProducerExporter<S> {
    producer: S,
    metrics: Arc<ProducerMetrics>,
}

impl<S: EventSource> ProducerExporter<S> {
    pub fn new(
        producer: S,
        registry: &MetricsRegistry,
        options: ProducerExporterOptions,
    ) -> Result<Self, Error> {
        Ok(Self {
            producer,
            metrics: Arc::new(ProducerMetrics::new(registry, &options)?),
        })
    }

    /// Subscribe every producer handler. Calling this twice counts every event twice.
    pub fn enable_metrics(&self) {
        for &event_type in PRODUCER_EVENTS {
            let metrics = Arc::clone(&self.metrics);
            self.producer
                .on(event_type, Box::new(move |event| metrics.handle(event)));
        }

        info!(
            role = %ClientRole::Producer,
            subscriptions = PRODUCER_EVENTS.len(),
            "enabled kafka client metrics"
        );
    }

    pub fn metrics(&self) -> &ProducerMetrics {
        &self.metrics
    }
}
