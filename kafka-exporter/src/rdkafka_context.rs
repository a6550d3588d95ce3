use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use rdkafka::consumer::ConsumerContext;
use rdkafka::error::KafkaError;
use rdkafka::{ClientContext, Statistics};
use tracing::{debug, error};

use crate::event::{ClientEvent, ClientRole, RequestQueueSizePayload};
use crate::source::EventBus;

/// librdkafka's state name for a broker with an established connection.
const BROKER_UP: &str = "UP";

/// rdkafka client context that turns librdkafka statistics into client events.
///
/// Needs `statistics.interval.ms` set on the client. Each snapshot emits a
/// `network.request_queue_size` event per broker, plus `connect` / `disconnect` when a broker
/// changes between up and down or disappears.
pub struct EventContext {
    role: ClientRole,
    events: Arc<EventBus>,
    brokers: Mutex<HashMap<String, bool>>,
}

impl EventContext {
    pub fn new(role: ClientRole, events: Arc<EventBus>) -> Self {
        Self {
            role,
            events,
            brokers: Mutex::default(),
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Emit events for one snapshot of `(broker name, state, requests waiting to be sent)`.
    ///
    /// A broker that was up and is missing from the snapshot counts as disconnected. librdkafka
    /// renames bootstrap brokers once metadata arrives and drops decommissioned ones.
    fn observe_brokers<'a, I>(&self, brokers: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str, i64)>,
    {
        let mut known = self.brokers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut seen = HashSet::new();

        for (name, state, waiting) in brokers {
            let up = state == BROKER_UP;
            let was_up = known.insert(name.to_owned(), up).unwrap_or(false);
            seen.insert(name);

            if up && !was_up {
                debug!(role = %self.role, broker = name, "broker connected");
                self.events.emit(&ClientEvent::Connect);
            } else if was_up && !up {
                debug!(role = %self.role, broker = name, state, "broker disconnected");
                self.events.emit(&ClientEvent::Disconnect);
            }

            self.events.emit(&ClientEvent::NetworkRequestQueueSize(
                RequestQueueSizePayload {
                    broker: name.to_owned(),
                    client_id: None,
                    queue_size: u64::try_from(waiting).unwrap_or(0),
                },
            ));
        }

        known.retain(|name, up| {
            if seen.contains(name.as_str()) {
                return true;
            }
            if *up {
                debug!(role = %self.role, broker = %name, "broker left the statistics");
                self.events.emit(&ClientEvent::Disconnect);
            }
            false
        });
    }
}

impl ClientContext for EventContext {
    fn stats(&self, statistics: Statistics) {
        self.observe_brokers(
            statistics
                .brokers
                .values()
                .map(|broker| (broker.name.as_str(), broker.state.as_str(), broker.outbuf_cnt)),
        );
    }

    fn error(&self, error: KafkaError, reason: &str) {
        error!(role = %self.role, error = %error, reason, "librdkafka client error");
    }
}

impl ConsumerContext for EventContext {}
