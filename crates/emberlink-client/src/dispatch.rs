//! Adapts remote-origin notifications into ordered delivery-queue events.

use emberlink_core::{ClientEvent, DeliverySender, StatusFlags, codec};

use crate::platform::ServiceCallbacks;

/// The notification sink registered with the remote service.
///
/// The transport may call into this from any thread, at any time, with no
/// ordering across notification kinds; each call is turned into one or two
/// queued [`ClientEvent`]s, and the single-consumer queue is what gives the
/// application its in-order, single-threaded view. Notifications arriving
/// after the supervisor returned to `Unbound` are queued all the same; the
/// owner decides whether they still matter.
pub struct CallbackDispatcher {
    events: DeliverySender,
}

impl CallbackDispatcher {
    /// Build a dispatcher feeding the given delivery channel.
    pub fn new(events: DeliverySender) -> Self {
        Self { events }
    }
}

impl ServiceCallbacks for CallbackDispatcher {
    fn on_events_changed(&self, events: Vec<String>) {
        // Two deliveries per notification, raw strictly before decoded; both
        // go through the same queue so nothing can interleave between them.
        let decoded = codec::decode_events(&events);
        self.events.deliver(ClientEvent::EventsChangedRaw { events });
        self.events.deliver(ClientEvent::EventsChanged { events: decoded });
    }

    fn on_new_peripheral(&self, address: String) {
        self.events.deliver(ClientEvent::NewPeripheral { address });
    }

    fn on_brownout(&self, battery_empty: bool) {
        self.events.deliver(ClientEvent::Brownout { battery_empty });
    }

    fn on_status_changed(&self, status: StatusFlags) {
        self.events.deliver(ClientEvent::StatusChanged { status });
    }
}

#[cfg(test)]
mod tests {
    use emberlink_core::delivery_channel;

    use super::*;

    #[tokio::test]
    async fn sequences_raw_before_decoded_before_later_notifications() {
        let (sender, mut receiver) = delivery_channel();
        let dispatcher = CallbackDispatcher::new(sender);

        let wire =
            vec![r#"{"beg":"2020-01-01T00:00:00Z","end":"2020-01-01T00:05:00Z","sid":9}"#.to_owned()];
        dispatcher.on_events_changed(wire.clone());
        dispatcher.on_brownout(true);

        match receiver.recv().await.expect("raw delivery expected") {
            ClientEvent::EventsChangedRaw { events } => assert_eq!(events, wire),
            other => panic!("unexpected event: {other:?}"),
        }
        match receiver.recv().await.expect("decoded delivery expected") {
            ClientEvent::EventsChanged { events } => {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].session_id(), 9);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(
            receiver.recv().await,
            Some(ClientEvent::Brownout {
                battery_empty: true
            })
        );
    }

    #[tokio::test]
    async fn keeps_dispatching_when_an_entry_fails_to_decode() {
        let (sender, mut receiver) = delivery_channel();
        let dispatcher = CallbackDispatcher::new(sender);

        dispatcher.on_events_changed(vec![
            "garbage".to_owned(),
            r#"{"beg":"2020-01-01T00:00:00Z","end":"2020-01-01T00:05:00Z"}"#.to_owned(),
        ]);

        match receiver.recv().await.expect("raw delivery expected") {
            ClientEvent::EventsChangedRaw { events } => assert_eq!(events.len(), 2),
            other => panic!("unexpected event: {other:?}"),
        }
        match receiver.recv().await.expect("decoded delivery expected") {
            ClientEvent::EventsChanged { events } => {
                assert_eq!(events.len(), 1, "bad entry is skipped, not fatal");
                assert_eq!(events[0].session_id(), 0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn forwards_status_and_discovery_notifications() {
        let (sender, mut receiver) = delivery_channel();
        let dispatcher = CallbackDispatcher::new(sender);

        dispatcher.on_new_peripheral("00:11:22:33:44:55".to_owned());
        dispatcher.on_status_changed(StatusFlags::RUNNING);

        assert_eq!(
            receiver.recv().await,
            Some(ClientEvent::NewPeripheral {
                address: "00:11:22:33:44:55".to_owned()
            })
        );
        assert_eq!(
            receiver.recv().await,
            Some(ClientEvent::StatusChanged {
                status: StatusFlags::RUNNING
            })
        );
    }
}
