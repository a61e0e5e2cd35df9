//! Attribute Lifecycle Events
//!
//! Each [`Attribute`](crate::attribute::Attribute) value exposes an event
//! stream: a generic `attached` channel plus one channel per attachment
//! kind. Events fire synchronously, in attachment order, immediately after
//! registration and before control returns to the applying caller.
//! Subscribers run in subscription order; a panicking subscriber propagates
//! to that caller and aborts the remaining subscribers.
//!
//! Delivery snapshots the subscriber list before invoking anything, so a
//! callback may subscribe or unsubscribe; the change takes effect from the
//! next emission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::attribute::registry::{AttachmentKind, AttributeTarget};

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Payload delivered to subscribers: the attachment identity and the
/// handler instance that was just registered.
#[derive(Debug, Clone)]
pub struct Attached<H> {
    /// The attachment kind.
    pub kind: AttachmentKind,
    /// The concrete target identity.
    pub target: AttributeTarget,
    /// The registered handler instance.
    pub instance: Arc<H>,
}

type Callback<H> = Arc<dyn Fn(&Attached<H>) + Send + Sync>;

struct Channel<H> {
    subscribers: Vec<(SubscriptionId, Callback<H>)>,
}

impl<H> Default for Channel<H> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<H> Channel<H> {
    fn snapshot(&self, into: &mut Vec<Callback<H>>) {
        into.extend(self.subscribers.iter().map(|(_, cb)| Arc::clone(cb)));
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }
}

struct Channels<H> {
    attached: Channel<H>,
    class: Channel<H>,
    method: Channel<H>,
    property: Channel<H>,
    parameter: Channel<H>,
}

impl<H> Default for Channels<H> {
    fn default() -> Self {
        Self {
            attached: Channel::default(),
            class: Channel::default(),
            method: Channel::default(),
            property: Channel::default(),
            parameter: Channel::default(),
        }
    }
}

/// Event stream for one attribute value.
pub struct AttributeEvents<H> {
    channels: Mutex<Channels<H>>,
    next_id: AtomicU64,
}

impl<H> Default for AttributeEvents<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> AttributeEvents<H> {
    /// Creates an empty event stream.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(Channels::default()),
            next_id: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribes to every attachment, regardless of kind.
    pub fn on_attached(
        &self,
        callback: impl Fn(&Attached<H>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.channels
            .lock()
            .attached
            .subscribers
            .push((id, Arc::new(callback)));
        id
    }

    /// Subscribes to class attachments.
    pub fn on_class_attached(
        &self,
        callback: impl Fn(&Attached<H>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.channels
            .lock()
            .class
            .subscribers
            .push((id, Arc::new(callback)));
        id
    }

    /// Subscribes to method attachments.
    pub fn on_method_attached(
        &self,
        callback: impl Fn(&Attached<H>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.channels
            .lock()
            .method
            .subscribers
            .push((id, Arc::new(callback)));
        id
    }

    /// Subscribes to property attachments.
    pub fn on_property_attached(
        &self,
        callback: impl Fn(&Attached<H>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.channels
            .lock()
            .property
            .subscribers
            .push((id, Arc::new(callback)));
        id
    }

    /// Subscribes to parameter attachments.
    pub fn on_parameter_attached(
        &self,
        callback: impl Fn(&Attached<H>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.channels
            .lock()
            .parameter
            .subscribers
            .push((id, Arc::new(callback)));
        id
    }

    /// Removes a subscription from whichever channel holds it.
    /// Returns true if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut channels = self.channels.lock();
        channels.attached.remove(id)
            || channels.class.remove(id)
            || channels.method.remove(id)
            || channels.property.remove(id)
            || channels.parameter.remove(id)
    }

    /// Delivers an event: the generic channel first, then the kind-specific
    /// channel, synchronously.
    ///
    /// The subscriber list is snapshotted and the lock released before any
    /// callback runs, so callbacks are free to subscribe, unsubscribe, or
    /// apply attributes themselves.
    pub(crate) fn emit(&self, event: &Attached<H>) {
        let mut callbacks = Vec::new();
        {
            let channels = self.channels.lock();
            channels.attached.snapshot(&mut callbacks);
            match event.kind {
                AttachmentKind::Class => channels.class.snapshot(&mut callbacks),
                AttachmentKind::Method => channels.method.snapshot(&mut callbacks),
                AttachmentKind::Property => channels.property.snapshot(&mut callbacks),
                AttachmentKind::Parameter => channels.parameter.snapshot(&mut callbacks),
            }
        }

        for callback in callbacks {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ClassId;
    use std::sync::atomic::AtomicUsize;

    struct Noop;

    fn event(kind: AttachmentKind) -> Attached<Noop> {
        let target = match kind {
            AttachmentKind::Class => AttributeTarget::Class { class: ClassId(0) },
            AttachmentKind::Method => AttributeTarget::Method {
                class: ClassId(0),
                method: "run".to_string(),
            },
            AttachmentKind::Property => AttributeTarget::Property {
                class: ClassId(0),
                property: "count".to_string(),
            },
            AttachmentKind::Parameter => AttributeTarget::constructor_parameter(ClassId(0), 0),
        };

        Attached {
            kind,
            target,
            instance: Arc::new(Noop),
        }
    }

    #[test]
    fn test_generic_and_specific_channels() {
        let events: AttributeEvents<Noop> = AttributeEvents::new();
        let any_count = Arc::new(AtomicUsize::new(0));
        let class_count = Arc::new(AtomicUsize::new(0));

        let any = Arc::clone(&any_count);
        events.on_attached(move |_| {
            any.fetch_add(1, Ordering::SeqCst);
        });
        let class = Arc::clone(&class_count);
        events.on_class_attached(move |_| {
            class.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(&event(AttachmentKind::Class));
        events.emit(&event(AttachmentKind::Method));

        assert_eq!(any_count.load(Ordering::SeqCst), 2);
        assert_eq!(class_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let events: AttributeEvents<Noop> = AttributeEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            events.on_attached(move |_| log.lock().push(tag));
        }

        events.emit(&event(AttachmentKind::Class));
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe() {
        let events: AttributeEvents<Noop> = AttributeEvents::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let id = events.on_method_attached(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(&event(AttachmentKind::Method));
        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        events.emit(&event(AttachmentKind::Method));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_from_within_callback() {
        let events = Arc::new(AttributeEvents::<Noop>::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let stream = Arc::clone(&events);
        let counter = Arc::clone(&late_calls);
        events.on_attached(move |_| {
            let counter = Arc::clone(&counter);
            stream.on_attached(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        // Must not deadlock; the new subscriber only sees later emissions.
        events.emit(&event(AttachmentKind::Class));
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        events.emit(&event(AttachmentKind::Class));
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_self_during_delivery() {
        let events = Arc::new(AttributeEvents::<Noop>::new());
        let count = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None::<SubscriptionId>));

        let stream = Arc::clone(&events);
        let counter = Arc::clone(&count);
        let id_slot = Arc::clone(&own_id);
        let id = events.on_attached(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *id_slot.lock() {
                stream.unsubscribe(id);
            }
        });
        *own_id.lock() = Some(id);

        events.emit(&event(AttachmentKind::Class));
        events.emit(&event(AttachmentKind::Class));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_carries_target_identity() {
        let events: AttributeEvents<Noop> = AttributeEvents::new();
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        events.on_parameter_attached(move |e| {
            *sink.lock() = Some(e.target.clone());
        });

        events.emit(&event(AttachmentKind::Parameter));
        assert_eq!(
            seen.lock().clone(),
            Some(AttributeTarget::constructor_parameter(ClassId(0), 0))
        );
    }
}
