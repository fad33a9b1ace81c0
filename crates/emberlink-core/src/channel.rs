use tokio::sync::mpsc;

use crate::types::{ClientEvent, Event, StatusFlags};

/// Receiving half of the delivery channel, drained by the application on its
/// chosen thread or task. Queue order is delivery order.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Sending half of the delivery channel.
///
/// Cloned freely across threads; every queued event reaches the single
/// consumer in queue order. This is the ordering guarantee of the library:
/// notifications may originate on arbitrary transport threads, but the
/// receiver observes them in the order they were queued.
#[derive(Debug, Clone)]
pub struct DeliverySender {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

/// Create the delivery channel pair.
pub fn delivery_channel() -> (DeliverySender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliverySender { tx }, rx)
}

impl DeliverySender {
    /// Queue one event for the delivery context.
    ///
    /// Delivery is best-effort: events queued after the receiver was dropped
    /// are discarded, matching the owner's responsibility to ignore late
    /// notifications.
    pub fn deliver(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }
}

/// Application-facing callbacks with default no-op implementations.
///
/// Implement only the methods you care about and feed the handler from the
/// delivery receiver via [`dispatch_to`].
pub trait ClientCallbacks {
    /// The connection is established; proxied calls may now be issued.
    fn on_ready(&mut self) {}
    /// The connection is gone and any retained handle is invalid.
    fn on_destroyed(&mut self) {}
    /// Current event list as verbatim wire strings.
    fn on_raw_events_changed(&mut self, _events: &[String]) {}
    /// Current event list decoded via the codec.
    fn on_events_changed(&mut self, _events: &[Event]) {}
    /// A peripheral was seen while no address is bound.
    fn on_new_peripheral(&mut self, _address: &str) {}
    /// Low-power condition signaled by the peripheral.
    fn on_brownout(&mut self, _battery_empty: bool) {}
    /// Service status flags changed.
    fn on_status_changed(&mut self, _status: StatusFlags) {}
}

/// Map one queued event onto the matching [`ClientCallbacks`] method.
pub fn dispatch_to(handler: &mut dyn ClientCallbacks, event: &ClientEvent) {
    match event {
        ClientEvent::Ready => handler.on_ready(),
        ClientEvent::Destroyed => handler.on_destroyed(),
        ClientEvent::EventsChangedRaw { events } => handler.on_raw_events_changed(events),
        ClientEvent::EventsChanged { events } => handler.on_events_changed(events),
        ClientEvent::NewPeripheral { address } => handler.on_new_peripheral(address),
        ClientEvent::Brownout { battery_empty } => handler.on_brownout(*battery_empty),
        ClientEvent::StatusChanged { status } => handler.on_status_changed(*status),
    }
}
