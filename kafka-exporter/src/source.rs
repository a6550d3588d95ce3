use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use metrics::counter;
use tracing::error;

use crate::error::Error;
use crate::event::{ClientEvent, EventType};

/// A subscribed event handler. Handlers are synchronous and may be called from any thread.
pub type Handler = Box<dyn Fn(&ClientEvent) -> Result<(), Error> + Send + Sync>;

/// Something that emits client events and lets callers subscribe to them by type.
///
/// Subscribing the same handler twice delivers every event to it twice.
pub trait EventSource {
    fn on(&self, event_type: EventType, handler: Handler);
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn on(&self, event_type: EventType, handler: Handler) {
        (**self).on(event_type, handler)
    }
}

/// In-process [`EventSource`] that delivers each emitted event to the handlers subscribed to
/// its type, in subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventType, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every handler subscribed to its type and return how many ran.
    ///
    /// A failing handler does not stop delivery to the others; its error is logged and
    /// counted in `kafka_exporter_handler_errors_total`.
    pub fn emit(&self, event: &ClientEvent) -> usize {
        let event_type = event.event_type();
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);

        let Some(subscribed) = handlers.get(&event_type) else {
            return 0;
        };

        counter!("kafka_exporter_events_total", "event" => event_type.as_str()).increment(1);

        for handler in subscribed {
            if let Err(err) = handler(event) {
                counter!("kafka_exporter_handler_errors_total", "event" => event_type.as_str())
                    .increment(1);
                error!(event = %event_type, error = %err, "failed to record metrics for event");
            }
        }

        subscribed.len()
    }

    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .map_or(0, Vec::len)
    }
}

impl EventSource for EventBus {
    fn on(&self, event_type: EventType, handler: Handler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type)
            .or_default()
            .push(handler);
    }
}
