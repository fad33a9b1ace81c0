//! Client library for the Emberlink companion service.
//!
//! Applications hold one [`CompanionClient`]: it resolves the companion
//! application's installation, supervises the cross-process binding, and
//! delivers all service-originated notifications in order through a single
//! delivery channel. The wire codec and protocol types live in
//! [`emberlink_core`].

/// Environment-backed client configuration.
pub mod config;
/// Remote-notification dispatcher feeding the delivery channel.
pub mod dispatch;
/// The application-facing facade.
pub mod facade;
/// Installation resolution for the companion application.
pub mod install;
/// In-memory platform implementations for tests and smoke runs.
pub mod memory;
/// Capability traits at the platform boundary.
pub mod platform;
/// Connection supervision and handle ownership.
pub mod supervisor;

pub use config::{ClientConfig, ConfigError};
pub use dispatch::CallbackDispatcher;
pub use facade::{CompanionClient, PlatformServices};
pub use install::{InstallResolver, Resolution};
pub use platform::{
    AcquisitionPrompt, BindRequestError, BindWatcher, InstallFeed, InstallHandler,
    PackageRegistry, RemoteService, ServiceBinder, ServiceCallbacks,
};
pub use supervisor::ConnectionSupervisor;
