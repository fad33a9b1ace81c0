//! Connection supervision for the companion service binding.

use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use emberlink_core::{
    BindDecision, ClientError, ClientEvent, DeliverySender, LinkState, LinkStateMachine,
};

use crate::platform::{BindWatcher, RemoteService, ServiceBinder, ServiceCallbacks};

/// Owns the binding to the companion service and the live remote handle.
///
/// At most one live handle exists at a time; the supervisor is its sole
/// mutator and swaps it atomically with connect/disconnect. There is no
/// automatic reconnection: after a `Destroyed` signal, binding again is the
/// owning application's decision.
pub struct ConnectionSupervisor {
    binder: Arc<dyn ServiceBinder>,
    endpoint: String,
    link: Mutex<LinkStateMachine>,
    handle: RwLock<Option<Arc<dyn RemoteService>>>,
    sink: Arc<dyn ServiceCallbacks>,
    events: DeliverySender,
}

impl ConnectionSupervisor {
    /// Build a supervisor for `endpoint` that registers `sink` with the
    /// remote service on every successful connection.
    pub fn new(
        binder: Arc<dyn ServiceBinder>,
        endpoint: impl Into<String>,
        sink: Arc<dyn ServiceCallbacks>,
        events: DeliverySender,
    ) -> Arc<Self> {
        Arc::new(Self {
            binder,
            endpoint: endpoint.into(),
            link: Mutex::new(LinkStateMachine::default()),
            handle: RwLock::new(None),
            sink,
            events,
        })
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.link.lock().expect("link state lock poisoned").state()
    }

    /// Request a connection to the service endpoint.
    ///
    /// Idempotent while a binding is being established or live. A request
    /// that cannot even be issued is fatal for this attempt: the owner gets
    /// a `Destroyed` signal and the error is returned; nothing is retried.
    pub fn bind(self: &Arc<Self>) -> Result<(), ClientError> {
        {
            let mut link = self.link.lock().expect("link state lock poisoned");
            if link.begin_bind() == BindDecision::AlreadyActive {
                debug!(endpoint = %self.endpoint, "bind requested while already active");
                return Ok(());
            }
        }

        let watcher: Arc<dyn BindWatcher> = Arc::clone(self) as Arc<dyn BindWatcher>;
        if let Err(err) = self.binder.bind(&self.endpoint, watcher) {
            self.link.lock().expect("link state lock poisoned").reset();
            self.events.deliver(ClientEvent::Destroyed);
            return Err(ClientError::Setup {
                message: err.message,
            });
        }
        Ok(())
    }

    /// The live remote handle, or `NotConnected` in any other state.
    ///
    /// The returned clone stays usable for the duration of one call even if
    /// a disconnect races it; the call then fails at the transport level.
    pub fn current_handle(&self) -> Result<Arc<dyn RemoteService>, ClientError> {
        self.handle
            .read()
            .expect("remote handle lock poisoned")
            .clone()
            .ok_or(ClientError::NotConnected)
    }

    /// Release the binding.
    ///
    /// Safe to call in any state, including before a connection was ever
    /// established; a second close is a no-op. Close never blocks on
    /// in-flight proxy calls.
    pub fn close(&self) {
        let was_bound = {
            let mut link = self.link.lock().expect("link state lock poisoned");
            *self.handle.write().expect("remote handle lock poisoned") = None;
            link.reset()
        };
        if was_bound {
            self.binder.unbind();
        }
    }
}

impl BindWatcher for ConnectionSupervisor {
    fn on_connected(&self, remote: Arc<dyn RemoteService>) {
        let binding = self.state() == LinkState::Binding;
        if !binding {
            // Closed while the platform was still connecting; release the
            // connection we no longer want.
            debug!(endpoint = %self.endpoint, "dropping stale connection");
            self.binder.unbind();
            return;
        }

        if let Err(err) = remote.register(Arc::clone(&self.sink)) {
            warn!(error = %err, "callback registration failed, tearing the binding down");
            self.link.lock().expect("link state lock poisoned").reset();
            self.binder.unbind();
            self.events.deliver(ClientEvent::Destroyed);
            return;
        }

        // Handle swaps happen under the link lock so a racing close cannot
        // leave a live handle behind.
        let became_connected = {
            let mut link = self.link.lock().expect("link state lock poisoned");
            if link.on_connected() {
                *self.handle.write().expect("remote handle lock poisoned") = Some(remote);
                true
            } else {
                false
            }
        };
        if !became_connected {
            debug!(endpoint = %self.endpoint, "closed during registration, dropping connection");
            self.binder.unbind();
            return;
        }
        self.events.deliver(ClientEvent::Ready);
    }

    fn on_disconnected(&self) {
        let was_bound = {
            let mut link = self.link.lock().expect("link state lock poisoned");
            *self.handle.write().expect("remote handle lock poisoned") = None;
            link.reset()
        };
        if was_bound {
            self.events.deliver(ClientEvent::Destroyed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dispatch::CallbackDispatcher,
        memory::{InMemoryBinder, InMemoryCompanion},
    };
    use emberlink_core::{EventReceiver, delivery_channel};

    fn supervised(
        service: Arc<InMemoryCompanion>,
    ) -> (Arc<ConnectionSupervisor>, Arc<InMemoryBinder>, EventReceiver) {
        let binder = Arc::new(InMemoryBinder::new(service));
        let (sender, receiver) = delivery_channel();
        let dispatcher = Arc::new(CallbackDispatcher::new(sender.clone()));
        let supervisor = ConnectionSupervisor::new(
            Arc::clone(&binder) as Arc<dyn ServiceBinder>,
            "test/endpoint",
            dispatcher,
            sender,
        );
        (supervisor, binder, receiver)
    }

    #[test]
    fn rejects_proxy_calls_while_unbound() {
        let (supervisor, _binder, _receiver) = supervised(Arc::new(InMemoryCompanion::default()));
        assert_eq!(supervisor.state(), LinkState::Unbound);
        assert!(matches!(
            supervisor.current_handle().err(),
            Some(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn bind_connects_and_signals_ready_once() {
        let service = Arc::new(InMemoryCompanion::default());
        let (supervisor, _binder, mut receiver) = supervised(service);

        supervisor.bind().expect("bind should start");
        assert_eq!(supervisor.state(), LinkState::Connected);
        assert!(supervisor.current_handle().is_ok());

        assert_eq!(receiver.recv().await, Some(ClientEvent::Ready));
        assert!(receiver.try_recv().is_err(), "exactly one ready signal");
    }

    #[tokio::test]
    async fn repeated_bind_is_idempotent() {
        let service = Arc::new(InMemoryCompanion::default());
        let (supervisor, _binder, mut receiver) = supervised(service);

        supervisor.bind().expect("first bind should start");
        supervisor.bind().expect("second bind is a no-op");

        assert_eq!(receiver.recv().await, Some(ClientEvent::Ready));
        assert!(receiver.try_recv().is_err(), "no duplicate ready signal");
    }

    #[tokio::test]
    async fn unsolicited_disconnect_signals_destroyed_once() {
        let service = Arc::new(InMemoryCompanion::default());
        let (supervisor, binder, mut receiver) = supervised(service);

        supervisor.bind().expect("bind should start");
        assert_eq!(receiver.recv().await, Some(ClientEvent::Ready));

        binder.drop_connection();
        assert_eq!(supervisor.state(), LinkState::Unbound);
        assert!(matches!(
            supervisor.current_handle().err(),
            Some(ClientError::NotConnected)
        ));

        assert_eq!(receiver.recv().await, Some(ClientEvent::Destroyed));
        assert!(receiver.try_recv().is_err(), "exactly one destroyed signal");
    }

    #[tokio::test]
    async fn registration_failure_counts_as_immediate_disconnect() {
        let service = Arc::new(InMemoryCompanion::default());
        service.fail_registration();
        let (supervisor, _binder, mut receiver) = supervised(service);

        supervisor.bind().expect("bind request itself still starts");
        assert_eq!(supervisor.state(), LinkState::Unbound);
        assert!(matches!(
            supervisor.current_handle().err(),
            Some(ClientError::NotConnected)
        ));
        assert_eq!(receiver.recv().await, Some(ClientEvent::Destroyed));
    }

    #[tokio::test]
    async fn rejected_bind_request_is_fatal_for_the_attempt() {
        let service = Arc::new(InMemoryCompanion::default());
        let (supervisor, binder, mut receiver) = supervised(service);
        binder.reject_bind_requests();

        let err = supervisor.bind().expect_err("bind must fail");
        assert!(matches!(err, ClientError::Setup { .. }));
        assert_eq!(supervisor.state(), LinkState::Unbound);
        assert_eq!(receiver.recv().await, Some(ClientEvent::Destroyed));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_safe_before_connecting() {
        let service = Arc::new(InMemoryCompanion::default());
        let (supervisor, _binder, mut receiver) = supervised(service);

        // Never bound: both closes are no-ops.
        supervisor.close();
        supervisor.close();
        assert!(receiver.try_recv().is_err());

        supervisor.bind().expect("bind should start");
        assert_eq!(receiver.recv().await, Some(ClientEvent::Ready));

        supervisor.close();
        assert_eq!(supervisor.state(), LinkState::Unbound);
        supervisor.close();
        assert!(
            receiver.try_recv().is_err(),
            "close is not a destroy signal and the second close is a no-op"
        );
    }

    #[tokio::test]
    async fn can_bind_again_after_disconnect() {
        let service = Arc::new(InMemoryCompanion::default());
        let (supervisor, binder, mut receiver) = supervised(service);

        supervisor.bind().expect("bind should start");
        assert_eq!(receiver.recv().await, Some(ClientEvent::Ready));

        binder.drop_connection();
        assert_eq!(receiver.recv().await, Some(ClientEvent::Destroyed));

        // Reconnection is the owner's decision; a fresh bind works.
        supervisor.bind().expect("rebind should start");
        assert_eq!(receiver.recv().await, Some(ClientEvent::Ready));
        assert_eq!(supervisor.state(), LinkState::Connected);
    }
}
