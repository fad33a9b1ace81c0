//! In-memory platform implementations for tests and the smoke binary.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use url::Url;

use emberlink_core::{RemoteError, StatusFlags};

use crate::platform::{
    AcquisitionPrompt, BindRequestError, BindWatcher, InstallFeed, InstallHandler, PackageRegistry,
    RemoteService, ServiceBinder, ServiceCallbacks,
};

#[derive(Default)]
struct CompanionState {
    address: Option<String>,
    events: Vec<String>,
}

/// In-memory companion service.
///
/// Stores address and event list, notifies its registered sink on event-list
/// changes, and can emit the other notification kinds on demand. Failure
/// injection covers registration and proxy calls.
#[derive(Default)]
pub struct InMemoryCompanion {
    state: Mutex<CompanionState>,
    sink: Mutex<Option<Arc<dyn ServiceCallbacks>>>,
    fail_registration: AtomicBool,
    fail_calls: AtomicBool,
}

impl InMemoryCompanion {
    pub fn fail_registration(&self) {
        self.fail_registration.store(true, Ordering::SeqCst);
    }

    pub fn fail_calls(&self, fail: bool) {
        self.fail_calls.store(fail, Ordering::SeqCst);
    }

    /// Replace the stored event list directly and notify the sink, as if the
    /// peripheral had synced new events.
    pub fn seed_events(&self, events: Vec<String>) {
        {
            let mut state = self.state.lock().expect("companion state lock poisoned");
            state.events = events;
        }
        self.notify_events_changed();
    }

    pub fn emit_new_peripheral(&self, address: &str) {
        if let Some(sink) = self.current_sink() {
            sink.on_new_peripheral(address.to_owned());
        }
    }

    pub fn emit_brownout(&self, battery_empty: bool) {
        if let Some(sink) = self.current_sink() {
            sink.on_brownout(battery_empty);
        }
    }

    pub fn emit_status(&self, status: StatusFlags) {
        if let Some(sink) = self.current_sink() {
            sink.on_status_changed(status);
        }
    }

    fn current_sink(&self) -> Option<Arc<dyn ServiceCallbacks>> {
        self.sink.lock().expect("companion sink lock poisoned").clone()
    }

    fn notify_events_changed(&self) {
        let events = {
            let state = self.state.lock().expect("companion state lock poisoned");
            state.events.clone()
        };
        if let Some(sink) = self.current_sink() {
            sink.on_events_changed(events);
        }
    }

    fn check_transport(&self) -> Result<(), RemoteError> {
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(RemoteError::new("injected transport failure"));
        }
        Ok(())
    }
}

impl RemoteService for InMemoryCompanion {
    fn address(&self) -> Result<Option<String>, RemoteError> {
        self.check_transport()?;
        let state = self.state.lock().expect("companion state lock poisoned");
        Ok(state.address.clone())
    }

    fn set_address(&self, address: Option<&str>) -> Result<(), RemoteError> {
        self.check_transport()?;
        let mut state = self.state.lock().expect("companion state lock poisoned");
        state.address = address.map(str::to_owned);
        Ok(())
    }

    fn events(&self) -> Result<Vec<String>, RemoteError> {
        self.check_transport()?;
        let state = self.state.lock().expect("companion state lock poisoned");
        Ok(state.events.clone())
    }

    fn set_events(&self, events: &[String]) -> Result<(), RemoteError> {
        self.check_transport()?;
        {
            let mut state = self.state.lock().expect("companion state lock poisoned");
            state.events = events.to_vec();
        }
        // The service reports every event-list change back to its sink.
        self.notify_events_changed();
        Ok(())
    }

    fn register(&self, sink: Arc<dyn ServiceCallbacks>) -> Result<(), RemoteError> {
        if self.fail_registration.load(Ordering::SeqCst) {
            return Err(RemoteError::new("injected registration failure"));
        }
        *self.sink.lock().expect("companion sink lock poisoned") = Some(sink);
        Ok(())
    }
}

/// In-memory binder that connects synchronously to one companion service.
pub struct InMemoryBinder {
    service: Arc<InMemoryCompanion>,
    watcher: Mutex<Option<Arc<dyn BindWatcher>>>,
    reject_bind: AtomicBool,
}

impl InMemoryBinder {
    pub fn new(service: Arc<InMemoryCompanion>) -> Self {
        Self {
            service,
            watcher: Mutex::new(None),
            reject_bind: AtomicBool::new(false),
        }
    }

    pub fn reject_bind_requests(&self) {
        self.reject_bind.store(true, Ordering::SeqCst);
    }

    /// Simulate the service process dying: signals the watcher, if any.
    pub fn drop_connection(&self) {
        let watcher = self
            .watcher
            .lock()
            .expect("binder watcher lock poisoned")
            .take();
        if let Some(watcher) = watcher {
            watcher.on_disconnected();
        }
    }
}

impl ServiceBinder for InMemoryBinder {
    fn bind(&self, _endpoint: &str, watcher: Arc<dyn BindWatcher>) -> Result<(), BindRequestError> {
        if self.reject_bind.load(Ordering::SeqCst) {
            return Err(BindRequestError::new("bind request rejected"));
        }
        *self.watcher.lock().expect("binder watcher lock poisoned") = Some(Arc::clone(&watcher));
        watcher.on_connected(Arc::clone(&self.service) as Arc<dyn RemoteService>);
        Ok(())
    }

    fn unbind(&self) {
        self.watcher
            .lock()
            .expect("binder watcher lock poisoned")
            .take();
    }
}

/// In-memory package registry.
#[derive(Default)]
pub struct InMemoryPackageRegistry {
    installed: Mutex<HashSet<String>>,
}

impl InMemoryPackageRegistry {
    pub fn mark_installed(&self, package: &str) {
        self.installed
            .lock()
            .expect("registry lock poisoned")
            .insert(package.to_owned());
    }
}

impl PackageRegistry for InMemoryPackageRegistry {
    fn is_installed(&self, package: &str) -> bool {
        self.installed
            .lock()
            .expect("registry lock poisoned")
            .contains(package)
    }
}

/// Acquisition prompt that records opened URIs instead of showing anything.
#[derive(Default)]
pub struct RecordingPrompt {
    opened: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("prompt lock poisoned").clone()
    }
}

impl AcquisitionPrompt for RecordingPrompt {
    fn open(&self, uri: &Url) {
        self.opened
            .lock()
            .expect("prompt lock poisoned")
            .push(uri.as_str().to_owned());
    }
}

/// In-memory install-notice feed.
///
/// `announce` invokes every registered handler with the announced package
/// identity, mirroring a system-wide install broadcast.
#[derive(Default)]
pub struct InMemoryInstallFeed {
    handlers: Mutex<HashMap<String, InstallHandler>>,
}

impl InMemoryInstallFeed {
    /// Deliver an install notice for `package` to all registered handlers.
    pub fn announce(&self, package: &str) {
        let handlers: Vec<InstallHandler> = {
            let handlers = self.handlers.lock().expect("install feed lock poisoned");
            handlers.values().cloned().collect()
        };
        for handler in handlers {
            handler(package);
        }
    }
}

impl InstallFeed for InMemoryInstallFeed {
    fn register(&self, key: &str, handler: InstallHandler) {
        self.handlers
            .lock()
            .expect("install feed lock poisoned")
            .insert(key.to_owned(), handler);
    }

    fn unregister(&self, key: &str) {
        self.handlers
            .lock()
            .expect("install feed lock poisoned")
            .remove(key);
    }
}
