use std::sync::Arc;

use kafka_exporter::producer::{
    CONNECTION_COUNT, CONNECTION_CREATION_TOTAL, REQUEST_DURATION_SECONDS, REQUEST_QUEUE_SIZE,
    REQUEST_SIZE_TOTAL, REQUEST_TOTAL,
};
use kafka_exporter::{
    monitor_consumer, monitor_producer, Error, EventBus, EventType, MetricsRegistry,
    ProducerExporter, ProducerExporterOptions, StandardLabels,
};

mod common;
use common::{counter_value, event, gauge_value, histogram_samples};

#[test]
fn test_producers_share_metrics_in_one_registry() {
    let registry = MetricsRegistry::new();
    let first_bus = Arc::new(EventBus::new());
    let second_bus = Arc::new(EventBus::new());
    let first = monitor_producer(Arc::clone(&first_bus), &registry).unwrap();
    let second = monitor_producer(Arc::clone(&second_bus), &registry).unwrap();

    first.metrics().on_connect().unwrap();
    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(1.0));

    second_bus.emit(&event(r#"{"type":"connect"}"#));
    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(2.0));
    assert_eq!(
        counter_value(&registry, CONNECTION_CREATION_TOTAL.name, &[]),
        Some(2.0)
    );

    second.metrics().on_disconnect().unwrap();
    first_bus.emit(&event(r#"{"type":"disconnect"}"#));
    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(0.0));

    let families = registry
        .gather()
        .into_iter()
        .filter(|family| family.get_name() == CONNECTION_COUNT.name)
        .count();
    assert_eq!(families, 1);
}

#[test]
fn test_producer_request_events() {
    let registry = MetricsRegistry::new();
    let bus = Arc::new(EventBus::new());
    let exporter = ProducerExporter::new(
        Arc::clone(&bus),
        &registry,
        ProducerExporterOptions {
            standard_labels: StandardLabels::new().with("service", "ingest"),
            ..Default::default()
        },
    )
    .unwrap();
    exporter.enable_metrics();

    bus.emit(&event(
        r#"{"type":"network.request","payload":{"broker":"b1","clientId":"p1","apiName":"Produce","size":300,"duration":1500}}"#,
    ));
    bus.emit(&event(
        r#"{"type":"network.request_queue_size","payload":{"broker":"b1","queueSize":4}}"#,
    ));

    let labels = [("broker", "b1"), ("service", "ingest")];
    assert_eq!(counter_value(&registry, REQUEST_TOTAL.name, &labels), Some(1.0));
    assert_eq!(
        counter_value(&registry, REQUEST_SIZE_TOTAL.name, &labels),
        Some(300.0)
    );
    assert_eq!(
        histogram_samples(&registry, REQUEST_DURATION_SECONDS.name, &labels),
        Some((1, 1.5))
    );
    assert_eq!(
        gauge_value(&registry, REQUEST_QUEUE_SIZE.name, &labels),
        Some(4.0)
    );
}

#[test]
fn test_producer_only_subscribes_its_events() {
    let registry = MetricsRegistry::new();
    let bus = Arc::new(EventBus::new());
    let _exporter = monitor_producer(Arc::clone(&bus), &registry).unwrap();

    assert_eq!(bus.subscriber_count(EventType::Connect), 1);
    assert_eq!(bus.subscriber_count(EventType::NetworkRequest), 1);
    assert_eq!(bus.subscriber_count(EventType::Fetch), 0);
    assert_eq!(bus.subscriber_count(EventType::Crash), 0);
}

#[test]
fn test_mismatched_standard_labels_fail_construction() {
    let registry = MetricsRegistry::new();
    let _first = monitor_producer(EventBus::new(), &registry).unwrap();

    let err = ProducerExporter::new(
        EventBus::new(),
        &registry,
        ProducerExporterOptions {
            standard_labels: StandardLabels::new().with("env", "prod"),
            ..Default::default()
        },
    )
    .err()
    .unwrap();

    assert!(matches!(err, Error::LabelNamesMismatch { .. }));
}

#[test]
fn test_consumer_and_producer_share_a_registry() {
    let registry = MetricsRegistry::new();
    let consumer_bus = Arc::new(EventBus::new());
    let producer_bus = Arc::new(EventBus::new());
    let _consumer = monitor_consumer(Arc::clone(&consumer_bus), &registry).unwrap();
    let _producer = monitor_producer(Arc::clone(&producer_bus), &registry).unwrap();

    consumer_bus.emit(&event(r#"{"type":"connect"}"#));

    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), None);
    assert_eq!(
        gauge_value(
            &registry,
            kafka_exporter::consumer::CONNECTION_COUNT.name,
            &[]
        ),
        Some(1.0)
    );
}
