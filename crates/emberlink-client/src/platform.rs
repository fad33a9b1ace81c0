//! Capability traits at the platform boundary.
//!
//! The cross-process transport is an external collaborator: a thin adapter
//! implements these traits on top of whatever IPC the platform provides. The
//! [`crate::memory`] module ships in-memory implementations for tests and the
//! smoke binary.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use emberlink_core::{RemoteError, StatusFlags};

/// Notification sink registered with the companion service.
///
/// The transport may invoke these methods on arbitrary threads it controls,
/// concurrently with application-initiated calls; implementations must be
/// cheap and non-blocking.
pub trait ServiceCallbacks: Send + Sync {
    /// The stored event list changed; carries the full current list as wire
    /// strings.
    fn on_events_changed(&self, events: Vec<String>);
    /// A peripheral was seen while no address is bound.
    fn on_new_peripheral(&self, address: String);
    /// Low-power condition signaled by the peripheral.
    fn on_brownout(&self, battery_empty: bool);
    /// Service status flags changed.
    fn on_status_changed(&self, status: StatusFlags);
}

/// Live remote API surface of the companion service.
///
/// Calls are synchronous cross-process calls made on the caller's thread.
pub trait RemoteService: Send + Sync {
    /// Address of the currently bound peripheral, `None` when unbound.
    fn address(&self) -> Result<Option<String>, RemoteError>;
    /// Bind to the peripheral at `address`, or unbind with `None`.
    fn set_address(&self, address: Option<&str>) -> Result<(), RemoteError>;
    /// Full current event list as wire strings.
    fn events(&self) -> Result<Vec<String>, RemoteError>;
    /// Replace the stored event list. Use carefully.
    fn set_events(&self, events: &[String]) -> Result<(), RemoteError>;
    /// Register the sole notification sink for this connection.
    fn register(&self, sink: Arc<dyn ServiceCallbacks>) -> Result<(), RemoteError>;
}

/// The bind request could not even be issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BindRequestError {
    /// Platform-supplied failure description.
    pub message: String,
}

impl BindRequestError {
    /// Wrap a platform failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Observer driven by the binder with connection lifecycle signals.
///
/// The platform serializes these signals; `on_disconnected` may arrive
/// unsolicited at any time after `on_connected`, e.g. when the service
/// process is killed.
pub trait BindWatcher: Send + Sync {
    /// The connection is established and `remote` is live.
    fn on_connected(&self, remote: Arc<dyn RemoteService>);
    /// The connection is gone; the previously handed-out remote is invalid.
    fn on_disconnected(&self);
}

/// Platform surface for binding to a named service endpoint.
pub trait ServiceBinder: Send + Sync {
    /// Request a connection to `endpoint`, reporting lifecycle to `watcher`.
    ///
    /// An `Err` means the request could not even be issued and the attempt is
    /// over; establishment itself is reported asynchronously via `watcher`.
    fn bind(&self, endpoint: &str, watcher: Arc<dyn BindWatcher>) -> Result<(), BindRequestError>;
    /// Release the current connection, if any.
    fn unbind(&self);
}

/// Lookup of installed packages by identity.
pub trait PackageRegistry: Send + Sync {
    /// Whether the application identified by `package` is installed.
    fn is_installed(&self, package: &str) -> bool;
}

/// External acquisition flow shown to the user when the companion
/// application is missing.
pub trait AcquisitionPrompt: Send + Sync {
    /// Open the acquisition URI (e.g. an app-store listing).
    fn open(&self, uri: &Url);
}

/// Handler invoked with the package identity carried by an install notice.
pub type InstallHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// System install-notice subscription.
///
/// Handlers are registered and removed under an explicit identity key, so no
/// anonymous captured-state subscription outlives its owner unnoticed. The
/// feed invokes every registered handler for every notice; identity matching
/// is the handler's job.
pub trait InstallFeed: Send + Sync {
    /// Register `handler` under `key`, replacing any previous registration.
    fn register(&self, key: &str, handler: InstallHandler);
    /// Remove the handler registered under `key`, if any.
    fn unregister(&self, key: &str);
}
