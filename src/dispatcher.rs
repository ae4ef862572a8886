use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::{Event, EventConsumer, EventType, MentcareError, Result};

struct Subscriptions {
    event_type: EventType,
    consumers: Vec<Arc<dyn EventConsumer>>,
}

/// In-process publish/subscribe router.
///
/// Consumers subscribe under an [`EventType`]. Publishing an event calls, synchronously and on
/// the caller's thread, every consumer subscribed under the event's own type or any of its
/// ancestors. Type keys are visited in the order they were first subscribed to; consumers under
/// the same key run in registration order.
///
/// A consumer subscribed under several keys that all match an event is called once per matching
/// subscription.
///
/// The registry sits behind a lock. `publish` copies the matching consumers out before calling
/// them, so concurrent `subscribe` calls (including ones made from inside a consumer) never
/// disturb an in-flight delivery; they take effect from the next `publish`.
#[derive(Default)]
pub struct Dispatcher {
    subscriptions: RwLock<Vec<Subscriptions>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `consumer` under `event_type`.
    pub fn subscribe(&self, event_type: EventType, consumer: Arc<dyn EventConsumer>) {
        debug!(%event_type, consumer = consumer.name(), "subscribing consumer");

        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match subscriptions
            .iter_mut()
            .find(|s| s.event_type == event_type)
        {
            Some(entry) => entry.consumers.push(consumer),
            None => subscriptions.push(Subscriptions {
                event_type,
                consumers: vec![consumer],
            }),
        }
    }

    /// Removes every subscription of `consumer` under `event_type`, comparing by pointer.
    ///
    /// Subscriptions under other keys stay. Returns `false` if nothing was removed. A `publish`
    /// already in progress still calls the consumer.
    pub fn unsubscribe<C>(&self, event_type: EventType, consumer: &Arc<C>) -> bool
    where
        C: EventConsumer + ?Sized,
    {
        let target = Arc::as_ptr(consumer).cast::<()>();
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = subscriptions
            .iter_mut()
            .find(|s| s.event_type == event_type)
        else {
            return false;
        };

        let before = entry.consumers.len();
        entry
            .consumers
            .retain(|c| Arc::as_ptr(c).cast::<()>() != target);
        let removed = entry.consumers.len() != before;

        if removed {
            debug!(%event_type, consumer = consumer.name(), "unsubscribed consumer");
        }
        subscriptions.retain(|s| !s.consumers.is_empty());

        removed
    }

    /// Delivers `event` to every matching consumer.
    ///
    /// Stops at the first consumer error and returns it as [`MentcareError::Handler`]; the
    /// remaining consumers are skipped and effects of those already called are kept.
    pub fn publish(&self, event: &Event) -> Result<()> {
        let event_type = event.event_type();
        let consumers = self.matching(event_type);

        debug!(
            %event_type,
            event_id = %event.id(),
            consumers = consumers.len(),
            "publishing event"
        );

        for consumer in consumers {
            if let Err(source) = consumer.process(event) {
                warn!(
                    %event_type,
                    event_id = %event.id(),
                    consumer = consumer.name(),
                    error = %source,
                    "event consumer failed, skipping remaining consumers"
                );
                return Err(MentcareError::Handler {
                    consumer: consumer.name().to_string(),
                    event_type,
                    source,
                });
            }
        }

        Ok(())
    }

    /// Number of subscriptions that would receive an event of `event_type`.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.matching(event_type).len()
    }

    fn matching(&self, event_type: EventType) -> Vec<Arc<dyn EventConsumer>> {
        let subscriptions = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        subscriptions
            .iter()
            .filter(|s| s.event_type.matches(event_type))
            .flat_map(|s| s.consumers.iter().cloned())
            .collect()
    }
}
