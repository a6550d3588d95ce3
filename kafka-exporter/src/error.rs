use thiserror::Error;

use crate::event::EventType;
use crate::registry::MetricKind;

/// Enumeration of errors raised while building exporters or translating events into metrics.
#[derive(Error, Debug)]
pub enum Error {
    #[error("metric {name} is already registered as a {found}, expected a {expected}")]
    KindMismatch {
        name: String,
        expected: MetricKind,
        found: MetricKind,
    },
    #[error("metric {name} is already registered with labels {found:?}, expected {expected:?}")]
    LabelNamesMismatch {
        name: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("{role} exporter does not handle {event} events")]
    UnsupportedEvent {
        role: &'static str,
        event: EventType,
    },
    #[error("metrics registry rejected the operation: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("failed to render metrics as text: {0}")]
    Render(#[from] std::string::FromUtf8Error),
}
