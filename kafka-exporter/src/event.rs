use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// The role of the instrumented client. Events are namespaced by role in logs, e.g.
/// `consumer.network.request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientRole {
    Consumer,
    Producer,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::Consumer => "consumer",
            ClientRole::Producer => "producer",
        }
    }

    /// Fully qualified event name, as emitted by the client.
    pub fn event_name(&self, event_type: EventType) -> String {
        format!("{}.{}", self.as_str(), event_type.as_str())
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of lifecycle and I/O events a client can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Connect,
    Disconnect,
    Crash,
    Heartbeat,
    NetworkRequest,
    NetworkRequestQueueSize,
    Fetch,
    EndBatchProcess,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Connect => "connect",
            EventType::Disconnect => "disconnect",
            EventType::Crash => "crash",
            EventType::Heartbeat => "heartbeat",
            EventType::NetworkRequest => "network.request",
            EventType::NetworkRequestQueueSize => "network.request_queue_size",
            EventType::Fetch => "fetch",
            EventType::EndBatchProcess => "end_batch_process",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted by the instrumented client, in its `{"type", "payload"}` wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEvent {
    #[serde(rename = "connect", deserialize_with = "ignore_payload")]
    Connect,
    #[serde(rename = "disconnect", deserialize_with = "ignore_payload")]
    Disconnect,
    #[serde(rename = "crash")]
    Crash(CrashPayload),
    #[serde(rename = "heartbeat")]
    Heartbeat(HeartbeatPayload),
    #[serde(rename = "network.request")]
    NetworkRequest(RequestPayload),
    #[serde(rename = "network.request_queue_size")]
    NetworkRequestQueueSize(RequestQueueSizePayload),
    #[serde(rename = "fetch")]
    Fetch(FetchPayload),
    #[serde(rename = "end_batch_process")]
    EndBatchProcess(EndBatchProcessPayload),
}

impl ClientEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            ClientEvent::Connect => EventType::Connect,
            ClientEvent::Disconnect => EventType::Disconnect,
            ClientEvent::Crash(_) => EventType::Crash,
            ClientEvent::Heartbeat(_) => EventType::Heartbeat,
            ClientEvent::NetworkRequest(_) => EventType::NetworkRequest,
            ClientEvent::NetworkRequestQueueSize(_) => EventType::NetworkRequestQueueSize,
            ClientEvent::Fetch(_) => EventType::Fetch,
            ClientEvent::EndBatchProcess(_) => EventType::EndBatchProcess,
        }
    }
}

/// Connection events carry nothing we record; clients send no payload, `null` or `{}`.
fn ignore_payload<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer).map(|_| ())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error kind, e.g. `KafkaJSNumberOfRetriesExceeded`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashPayload {
    pub error: ErrorInfo,
    pub group_id: String,
    pub restart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatPayload {
    pub group_id: String,
    pub member_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_generation_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub broker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    /// Request size in bytes.
    pub size: u64,
    /// Round trip in milliseconds.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQueueSizePayload {
    pub broker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub queue_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchPayload {
    #[serde(default)]
    pub number_of_batches: u64,
    /// Milliseconds.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndBatchProcessPayload {
    pub topic: String,
    pub partition: i32,
    pub batch_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_offset: Option<String>,
    /// Milliseconds.
    pub duration: f64,
}
