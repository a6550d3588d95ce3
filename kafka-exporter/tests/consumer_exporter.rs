use std::sync::Arc;

use kafka_exporter::consumer::{
    BATCH_DURATION_SECONDS, BATCH_LATENCY, BATCH_SIZE_TOTAL, CONNECTION_COUNT,
    CONNECTION_CRASHED_TOTAL, FETCH_DURATION_SECONDS, FETCH_LATENCY, FETCH_TOTAL,
    HEARTBEAT_TOTAL, REQUEST_DURATION_SECONDS, REQUEST_TOTAL,
};
use kafka_exporter::{
    monitor_consumer, ConsumerExporter, ConsumerExporterOptions, EventBus, EventType,
    MetricsRegistry, StandardLabels,
};

mod common;
use common::{counter_value, event, find_series, gauge_value, histogram_samples};

fn exporter(
    labels: StandardLabels,
) -> (MetricsRegistry, Arc<EventBus>, ConsumerExporter<Arc<EventBus>>) {
    let registry = MetricsRegistry::new();
    let bus = Arc::new(EventBus::new());
    let exporter = ConsumerExporter::new(
        Arc::clone(&bus),
        &registry,
        ConsumerExporterOptions {
            standard_labels: labels,
            ..Default::default()
        },
    )
    .unwrap();
    exporter.enable_metrics();
    (registry, bus, exporter)
}

#[test]
fn test_nothing_is_recorded_before_activation() {
    let registry = MetricsRegistry::new();
    let bus = Arc::new(EventBus::new());
    let _exporter =
        ConsumerExporter::new(Arc::clone(&bus), &registry, ConsumerExporterOptions::default())
            .unwrap();

    assert_eq!(bus.emit(&event(r#"{"type":"connect"}"#)), 0);
    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), None);
}

#[test]
fn test_activation_subscribes_every_consumer_event() {
    let (_registry, bus, _exporter) = exporter(StandardLabels::new());

    for event_type in [
        EventType::Connect,
        EventType::Disconnect,
        EventType::Crash,
        EventType::Heartbeat,
        EventType::NetworkRequest,
        EventType::NetworkRequestQueueSize,
        EventType::Fetch,
        EventType::EndBatchProcess,
    ] {
        assert_eq!(bus.subscriber_count(event_type), 1, "{event_type}");
    }
}

#[test]
fn test_connect_then_disconnect_restores_gauge() {
    let (registry, bus, _exporter) = exporter(StandardLabels::new());

    bus.emit(&event(r#"{"type":"connect"}"#));
    bus.emit(&event(r#"{"type":"connect"}"#));
    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(2.0));

    bus.emit(&event(r#"{"type":"disconnect"}"#));
    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(1.0));
}

#[test]
fn test_request_labels_include_standard_labels() {
    let (registry, bus, _exporter) = exporter(StandardLabels::new().with("env", "prod"));

    bus.emit(&event(
        r#"{"type":"network.request","payload":{"broker":"b1","apiName":"Fetch","size":64,"duration":1500}}"#,
    ));

    let series = find_series(
        &registry,
        REQUEST_DURATION_SECONDS.name,
        &[("broker", "b1"), ("env", "prod")],
    )
    .unwrap();
    assert_eq!(series.get_label().len(), 2);
    assert_eq!(series.get_histogram().get_sample_sum(), 1.5);
    assert_eq!(
        counter_value(&registry, REQUEST_TOTAL.name, &[("broker", "b1"), ("env", "prod")]),
        Some(1.0)
    );
}

#[test]
fn test_crash_and_heartbeat_events() {
    let (registry, bus, _exporter) = exporter(StandardLabels::new());

    bus.emit(&event(
        r#"{"type":"crash","payload":{"groupId":"g1","error":{"name":"KafkaJSError","message":"lost"},"restart":true}}"#,
    ));
    bus.emit(&event(
        r#"{"type":"heartbeat","payload":{"groupId":"g1","memberId":"m-1","groupGenerationId":3}}"#,
    ));

    assert_eq!(
        counter_value(
            &registry,
            CONNECTION_CRASHED_TOTAL.name,
            &[("group_id", "g1"), ("error", "KafkaJSError"), ("restart", "true")]
        ),
        Some(1.0)
    );
    assert_eq!(
        counter_value(
            &registry,
            HEARTBEAT_TOTAL.name,
            &[("group_id", "g1"), ("member_id", "m-1")]
        ),
        Some(1.0)
    );
}

#[test]
fn test_fetch_and_batch_events() {
    let (registry, bus, _exporter) = exporter(StandardLabels::new());

    bus.emit(&event(
        r#"{"type":"fetch","payload":{"numberOfBatches":2,"duration":1500}}"#,
    ));
    bus.emit(&event(
        r#"{"type":"end_batch_process","payload":{"topic":"t","partition":2,"batchSize":10,"duration":200}}"#,
    ));

    assert_eq!(
        histogram_samples(&registry, FETCH_DURATION_SECONDS.name, &[]),
        Some((1, 1.5))
    );
    assert_eq!(
        histogram_samples(&registry, FETCH_LATENCY.name, &[]),
        Some((1, 1.5))
    );
    assert_eq!(counter_value(&registry, FETCH_TOTAL.name, &[]), Some(1.0));

    let labels = [("topic", "t"), ("partition", "2")];
    assert_eq!(
        counter_value(&registry, BATCH_SIZE_TOTAL.name, &labels),
        Some(10.0)
    );
    assert_eq!(
        histogram_samples(&registry, BATCH_DURATION_SECONDS.name, &labels),
        Some((1, 0.2))
    );
    assert_eq!(
        histogram_samples(&registry, BATCH_LATENCY.name, &labels),
        Some((1, 0.2))
    );
}

#[test]
fn test_double_activation_double_counts() {
    let (registry, bus, exporter) = exporter(StandardLabels::new());
    exporter.enable_metrics();

    bus.emit(&event(r#"{"type":"connect"}"#));

    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(2.0));
}

#[test]
fn test_consumers_can_share_a_registry() {
    let registry = MetricsRegistry::new();
    let first = Arc::new(EventBus::new());
    let second = Arc::new(EventBus::new());
    let _a = monitor_consumer(Arc::clone(&first), &registry).unwrap();
    let _b = monitor_consumer(Arc::clone(&second), &registry).unwrap();

    first.emit(&event(r#"{"type":"connect"}"#));
    second.emit(&event(r#"{"type":"connect"}"#));

    assert_eq!(gauge_value(&registry, CONNECTION_COUNT.name, &[]), Some(2.0));
}

#[test]
fn test_render_exposes_consumer_metrics() {
    let (registry, bus, _exporter) = exporter(StandardLabels::new().with("env", "prod"));

    bus.emit(&event(r#"{"type":"connect"}"#));
    bus.emit(&event(
        r#"{"type":"network.request_queue_size","payload":{"broker":"b1","clientId":"c","queueSize":5}}"#,
    ));

    let text = registry.render().unwrap();

    assert!(text.contains("# TYPE kafka_consumer_connection_count gauge"));
    assert!(text.contains("kafka_consumer_connection_count{env=\"prod\"} 1"));
    assert!(text.contains("kafka_consumer_request_queue_size{broker=\"b1\",env=\"prod\"} 5"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_events_are_all_counted() {
    let (registry, bus, _exporter) = exporter(StandardLabels::new());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bus = Arc::clone(&bus);
        tasks.push(tokio::spawn(async move {
            let request = event(
                r#"{"type":"network.request","payload":{"broker":"b1","size":10,"duration":5}}"#,
            );
            for _ in 0..250 {
                bus.emit(&request);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(
        counter_value(&registry, REQUEST_TOTAL.name, &[("broker", "b1")]),
        Some(2000.0)
    );
    assert_eq!(
        histogram_samples(&registry, REQUEST_DURATION_SECONDS.name, &[("broker", "b1")])
            .map(|(count, _)| count),
        Some(2000)
    );
}
