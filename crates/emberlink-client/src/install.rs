//! Installation resolution for the companion service application.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::{
    config::ClientConfig,
    platform::{AcquisitionPrompt, InstallFeed, InstallHandler, PackageRegistry},
};

/// Outcome of the one-shot installation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The companion application is installed; binding can proceed now.
    Present,
    /// The user was redirected to the acquisition flow; binding proceeds
    /// asynchronously once a matching install notice arrives.
    Triggered,
}

/// Detects the companion application and, when missing, arranges for a bind
/// once it gets installed.
///
/// Resolution happens at most once per facade lifetime.
pub struct InstallResolver {
    package: String,
    acquisition_uri: Url,
    registry: Arc<dyn PackageRegistry>,
    prompt: Arc<dyn AcquisitionPrompt>,
    feed: Arc<dyn InstallFeed>,
}

impl InstallResolver {
    /// Build a resolver for the configured companion package.
    pub fn new(
        config: &ClientConfig,
        registry: Arc<dyn PackageRegistry>,
        prompt: Arc<dyn AcquisitionPrompt>,
        feed: Arc<dyn InstallFeed>,
    ) -> Self {
        Self {
            package: config.package.clone(),
            acquisition_uri: config.acquisition_uri.clone(),
            registry,
            prompt,
            feed,
        }
    }

    /// Check for the companion application.
    ///
    /// When absent, opens the acquisition flow and registers `handler` with
    /// the install feed under the package identity key. The handler is
    /// invoked for every notice on the feed and must gate on
    /// [`matches_identity`](Self::matches_identity) itself.
    pub fn resolve(&self, handler: InstallHandler) -> Resolution {
        if self.registry.is_installed(&self.package) {
            return Resolution::Present;
        }

        info!(package = %self.package, "companion application missing, opening acquisition flow");
        self.prompt.open(&self.acquisition_uri);
        self.feed.register(&self.package, handler);
        Resolution::Triggered
    }

    /// Whether an install notice names the expected package.
    ///
    /// The feed carries notices for unrelated packages too; mismatches are
    /// ignored and waiting continues.
    pub fn matches_identity(&self, notified: &str) -> bool {
        if notified == self.package {
            return true;
        }
        debug!(notified, expected = %self.package, "ignoring unrelated install notice");
        false
    }

    /// Drop the install-feed registration, if one exists.
    pub fn release(&self) {
        self.feed.unregister(&self.package);
    }
}
