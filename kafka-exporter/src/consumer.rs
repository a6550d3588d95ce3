use std::sync::Arc;

use prometheus::{CounterVec, GaugeVec, HistogramVec};
use tracing::info;

use crate::catalog::{ms_to_seconds, MetricDef};
use crate::error::Error;
use crate::event::{
    ClientEvent, ClientRole, CrashPayload, EndBatchProcessPayload, EventType, FetchPayload,
    HeartbeatPayload, RequestPayload, RequestQueueSizePayload,
};
use crate::labels::{as_label_refs, merge_labels, Labels, StandardLabels};
use crate::options::{buckets_or_default, ConsumerExporterOptions};
use crate::registry::MetricsRegistry;
use crate::source::EventSource;

pub const CONNECTION_COUNT: MetricDef = MetricDef::new(
    "kafka_consumer_connection_count",
    "The current number of active connections established with a broker",
    &[],
);
pub const CONNECTION_CREATION_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_connection_creation_total",
    "The total number of connections established with a broker",
    &[],
);
pub const CONNECTION_CLOSE_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_connection_close_total",
    "The total number of connections closed with a broker",
    &[],
);
pub const CONNECTION_CRASHED_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_connection_crashed_total",
    "The total number of crashed connections with a broker",
    &["group_id", "error", "restart"],
);
pub const HEARTBEAT_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_heartbeat_total",
    "The total number of heartbeats with a broker",
    &["group_id", "member_id"],
);
pub const REQUEST_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_request_total",
    "The total number of requests sent.",
    &["broker"],
);
// A gauge, incremented by the size of every request.
pub const REQUEST_SIZE_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_request_size_total",
    "The size of any request sent.",
    &["broker"],
);
pub const REQUEST_QUEUE_SIZE: MetricDef = MetricDef::new(
    "kafka_consumer_request_queue_size",
    "Size of the request queue.",
    &["broker"],
);
pub const FETCH_LATENCY: MetricDef = MetricDef::new(
    "kafka_consumer_fetch_latency",
    "The time taken for a fetch request.",
    &[],
);
pub const FETCH_DURATION_SECONDS: MetricDef = MetricDef::new(
    "kafka_consumer_fetch_duration_seconds",
    "The time taken for a fetch request.",
    &[],
);
pub const FETCH_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_fetch_total",
    "The total number of fetch requests.",
    &[],
);
pub const BATCH_SIZE_TOTAL: MetricDef = MetricDef::new(
    "kafka_consumer_batch_size_total",
    "The number of bytes received per partition per request",
    &["topic", "partition"],
);
pub const BATCH_LATENCY: MetricDef = MetricDef::new(
    "kafka_consumer_batch_latency",
    "The time taken for processing a batch.",
    &["topic", "partition"],
);
pub const BATCH_DURATION_SECONDS: MetricDef = MetricDef::new(
    "kafka_consumer_batch_duration_seconds",
    "The time taken for processing a batch.",
    &["topic", "partition"],
);
pub const REQUEST_DURATION_SECONDS: MetricDef = MetricDef::new(
    "kafka_consumer_request_duration_seconds",
    "The time taken for processing a consumer request.",
    &["broker"],
);

/// Events a consumer exporter subscribes to.
pub const CONSUMER_EVENTS: &[EventType] = &[
    EventType::Connect,
    EventType::Disconnect,
    EventType::Crash,
    EventType::Heartbeat,
    EventType::NetworkRequest,
    EventType::NetworkRequestQueueSize,
    EventType::Fetch,
    EventType::EndBatchProcess,
];

const NO_LABELS: [(&str, &str); 0] = [];

/// The consumer metric catalog, bound to one registry, and the handlers that update it.
pub struct ConsumerMetrics {
    standard_labels: StandardLabels,
    active_connections: GaugeVec,
    connections_created_total: CounterVec,
    connections_closed_total: CounterVec,
    connections_crashed_total: CounterVec,
    heartbeats: CounterVec,
    request_queue_size: GaugeVec,
    fetch_latency: HistogramVec,
    fetch_duration: HistogramVec,
    fetch_total: CounterVec,
    batch_size_total: CounterVec,
    batch_latency: HistogramVec,
    batch_duration: HistogramVec,
    request_total: CounterVec,
    request_size_total: GaugeVec,
    request_duration: HistogramVec,
}

impl ConsumerMetrics {
    pub fn new(
        registry: &MetricsRegistry,
        options: &ConsumerExporterOptions,
    ) -> Result<Self, Error> {
        let standard = &options.standard_labels;

        Ok(Self {
            active_connections: CONNECTION_COUNT.gauge(registry, standard)?,
            connections_created_total: CONNECTION_CREATION_TOTAL.counter(registry, standard)?,
            connections_closed_total: CONNECTION_CLOSE_TOTAL.counter(registry, standard)?,
            connections_crashed_total: CONNECTION_CRASHED_TOTAL.counter(registry, standard)?,
            heartbeats: HEARTBEAT_TOTAL.counter(registry, standard)?,
            request_total: REQUEST_TOTAL.counter(registry, standard)?,
            request_size_total: REQUEST_SIZE_TOTAL.gauge(registry, standard)?,
            request_queue_size: REQUEST_QUEUE_SIZE.gauge(registry, standard)?,
            fetch_latency: FETCH_LATENCY.histogram(
                registry,
                standard,
                buckets_or_default(&options.fetch_latency_buckets),
            )?,
            fetch_duration: FETCH_DURATION_SECONDS.histogram(
                registry,
                standard,
                buckets_or_default(&options.fetch_duration_buckets),
            )?,
            fetch_total: FETCH_TOTAL.counter(registry, standard)?,
            batch_size_total: BATCH_SIZE_TOTAL.counter(registry, standard)?,
            batch_latency: BATCH_LATENCY.histogram(
                registry,
                standard,
                buckets_or_default(&options.batch_latency_buckets),
            )?,
            batch_duration: BATCH_DURATION_SECONDS.histogram(
                registry,
                standard,
                buckets_or_default(&options.batch_duration_buckets),
            )?,
            request_duration: REQUEST_DURATION_SECONDS.histogram(
                registry,
                standard,
                buckets_or_default(&options.request_duration_buckets),
            )?,
            standard_labels: standard.clone(),
        })
    }

    /// Apply the metric updates for one event.
    pub fn handle(&self, event: &ClientEvent) -> Result<(), Error> {
        match event {
            ClientEvent::Connect => self.on_connect(),
            ClientEvent::Disconnect => self.on_disconnect(),
            ClientEvent::Crash(payload) => self.on_crash(payload),
            ClientEvent::Heartbeat(payload) => self.on_heartbeat(payload),
            ClientEvent::NetworkRequest(payload) => self.on_request(payload),
            ClientEvent::NetworkRequestQueueSize(payload) => self.on_request_queue_size(payload),
            ClientEvent::Fetch(payload) => self.on_fetch(payload),
            ClientEvent::EndBatchProcess(payload) => self.on_end_batch_process(payload),
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

    pub fn on_crash(&self, payload: &CrashPayload) -> Result<(), Error> {
        let labels = self.labels([
            ("group_id", payload.group_id.as_str()),
            ("error", payload.error.name.as_str()),
            ("restart", if payload.restart { "true" } else { "false" }),
        ]);
        self.connections_crashed_total
            .get_metric_with(&as_label_refs(&labels))?
            .inc();
        Ok(())
    }

    pub fn on_heartbeat(&self, payload: &HeartbeatPayload) -> Result<(), Error> {
        let labels = self.labels([
            ("group_id", payload.group_id.as_str()),
            ("member_id", payload.member_id.as_str()),
        ]);
        self.heartbeats.get_metric_with(&as_label_refs(&labels))?.inc();
        Ok(())
    }

    pub fn on_request(&self, payload: &RequestPayload) -> Result<(), Error> {
        let labels = self.labels([("broker", payload.broker.as_str())]);
        let labels = as_label_refs(&labels);
        self.request_total.get_metric_with(&labels)?.inc();
        self.request_size_total
            .get_metric_with(&labels)?
            .add(payload.size as f64);
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

    pub fn on_fetch(&self, payload: &FetchPayload) -> Result<(), Error> {
        let labels = self.labels(NO_LABELS);
        let labels = as_label_refs(&labels);
        let seconds = ms_to_seconds(payload.duration);
        self.fetch_duration.get_metric_with(&labels)?.observe(seconds);
        self.fetch_latency.get_metric_with(&labels)?.observe(seconds);
        self.fetch_total.get_metric_with(&labels)?.inc();
        Ok(())
    }

    pub fn on_end_batch_process(&self, payload: &EndBatchProcessPayload) -> Result<(), Error> {
        let labels = self.labels([
            ("topic", payload.topic.clone()),
            ("partition", payload.partition.to_string()),
        ]);
        let labels = as_label_refs(&labels);
        let seconds = ms_to_seconds(payload.duration);
        self.batch_size_total
            .get_metric_with(&labels)?
            .inc_by(payload.batch_size as f64);
        self.batch_duration.get_metric_with(&labels)?.observe(seconds);
        self.batch_latency.get_metric_with(&labels)?.observe(seconds);
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

/// Exports metrics for a Kafka consumer.
///
/// Nothing is recorded until [`enable_metrics`](ConsumerExporter::enable_metrics) subscribes
/// the handlers to the consumer's events.
pub struct ConsumerExporter<S> {
    consumer: S,
    metrics: Arc<ConsumerMetrics>,
}

impl<S: EventSource> ConsumerExporter<S> {
    pub fn new(
        consumer: S,
        registry: &MetricsRegistry,
        options: ConsumerExporterOptions,
    ) -> Result<Self, Error> {
        Ok(Self {
            consumer,
            metrics: Arc::new(ConsumerMetrics::new(registry, &options)?),
        })
    }

    /// Subscribe every consumer handler. Calling this twice counts every event twice.
    pub fn enable_metrics(&self) {
        for &event_type in CONSUMER_EVENTS {
            let metrics = Arc::clone(&self.metrics);
            self.consumer
                .on(event_type, Box::new(move |event| metrics.handle(event)));
        }

        info!(
            role = %ClientRole::Consumer,
            subscriptions = CONSUMER_EVENTS.len(),
            "enabled kafka client metrics"
        );
    }

    pub fn metrics(&self) -> &ConsumerMetrics {
        &self.metrics
    }
}
