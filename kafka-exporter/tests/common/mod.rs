pub use kafka_exporter::test_utils::*;

/// Decode an event in the client's JSON wire shape.
#[allow(dead_code)]
pub fn event(json: &str) -> kafka_exporter::ClientEvent {
    serde_json::from_str(json).expect("valid client event")
}
