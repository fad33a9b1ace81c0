//! The single object applications hold.

use std::sync::Arc;

use tracing::error;

use emberlink_core::{
    ClientError, Event, EventReceiver, LinkState, codec, delivery_channel,
};

use crate::{
    config::ClientConfig,
    dispatch::CallbackDispatcher,
    install::{InstallResolver, Resolution},
    platform::{AcquisitionPrompt, InstallFeed, InstallHandler, PackageRegistry, ServiceBinder},
    supervisor::ConnectionSupervisor,
};

/// Platform collaborators the client is built on.
///
/// A real deployment supplies a thin adapter over the platform's IPC and
/// package machinery; tests and the smoke binary use [`crate::memory`].
pub struct PlatformServices {
    /// Binding surface for the service endpoint.
    pub binder: Arc<dyn ServiceBinder>,
    /// Installed-package lookup.
    pub packages: Arc<dyn PackageRegistry>,
    /// External acquisition flow for the missing companion application.
    pub prompt: Arc<dyn AcquisitionPrompt>,
    /// System install-notice subscription.
    pub installs: Arc<dyn InstallFeed>,
}

/// Client facade for the companion service.
///
/// Owns the installation resolver and the connection supervisor; the
/// delivery receiver returned by [`connect`](Self::connect) is the single
/// consumer of all notifications, in arrival order.
///
/// Remote-proxied operations are synchronous cross-process calls made on the
/// calling thread. Do not issue them from the delivery drain loop if your
/// transport serializes callbacks against outgoing calls; that can deadlock
/// against a notification being delivered concurrently.
pub struct CompanionClient {
    supervisor: Arc<ConnectionSupervisor>,
    resolver: Arc<InstallResolver>,
}

impl CompanionClient {
    /// Resolve the companion application and start connecting.
    ///
    /// When the companion application is installed, a bind is issued
    /// immediately and a failure to even start it is returned as
    /// [`ClientError::Setup`]. When it is missing, the user is redirected to
    /// the acquisition flow and the bind happens once a matching install
    /// notice arrives; watch the receiver for `Ready`.
    pub fn connect(
        config: ClientConfig,
        platform: PlatformServices,
    ) -> Result<(Self, EventReceiver), ClientError> {
        let (events, receiver) = delivery_channel();
        let dispatcher = Arc::new(CallbackDispatcher::new(events.clone()));
        let supervisor = ConnectionSupervisor::new(
            platform.binder,
            config.endpoint.clone(),
            dispatcher,
            events,
        );
        let resolver = Arc::new(InstallResolver::new(
            &config,
            platform.packages,
            platform.prompt,
            platform.installs,
        ));

        let handler = install_notice_handler(Arc::clone(&resolver), Arc::clone(&supervisor));
        match resolver.resolve(handler) {
            Resolution::Present => supervisor.bind()?,
            Resolution::Triggered => {}
        }

        Ok((
            Self {
                supervisor,
                resolver,
            },
            receiver,
        ))
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.supervisor.state()
    }

    /// Address of the currently bound peripheral, `None` when unbound.
    pub fn address(&self) -> Result<Option<String>, ClientError> {
        Ok(self.supervisor.current_handle()?.address()?)
    }

    /// Bind to the peripheral at `address`, or unbind with `None`.
    pub fn set_address(&self, address: Option<&str>) -> Result<(), ClientError> {
        Ok(self.supervisor.current_handle()?.set_address(address)?)
    }

    /// Event list stored on the device, as verbatim wire strings.
    pub fn events_raw(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.supervisor.current_handle()?.events()?)
    }

    /// Replace the event list stored on the device with wire strings.
    pub fn set_events_raw(&self, events: &[String]) -> Result<(), ClientError> {
        Ok(self.supervisor.current_handle()?.set_events(events)?)
    }

    /// Event list stored on the device, decoded.
    ///
    /// An entry that fails to decode surfaces its [`ClientError::Decode`];
    /// the push path through the delivery channel skips such entries instead.
    pub fn events(&self) -> Result<Vec<Event>, ClientError> {
        let raw = self.events_raw()?;
        raw.iter()
            .map(|text| codec::decode_event(text).map_err(ClientError::from))
            .collect()
    }

    /// Replace the event list stored on the device.
    pub fn set_events(&self, events: &[Event]) -> Result<(), ClientError> {
        self.set_events_raw(&codec::encode_events(events))
    }

    /// Release the binding and the install-feed subscription.
    ///
    /// Safe in any state; a second close is a no-op.
    pub fn close(&self) {
        self.resolver.release();
        self.supervisor.close();
    }
}

/// Named install-notice handler: gates on the package identity, then binds.
fn install_notice_handler(
    resolver: Arc<InstallResolver>,
    supervisor: Arc<ConnectionSupervisor>,
) -> InstallHandler {
    Arc::new(move |package: &str| {
        if !resolver.matches_identity(package) {
            return;
        }
        resolver.release();
        if let Err(err) = supervisor.bind() {
            // The owner sees this attempt's `Destroyed`; recovery is theirs.
            error!(error = %err, "bind after install notice failed");
        }
    })
}
