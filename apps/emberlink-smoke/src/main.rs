use std::sync::Arc;

use chrono::{Duration, Utc};

use emberlink_client::{
    ClientConfig, CompanionClient, PlatformServices,
    memory::{
        InMemoryBinder, InMemoryCompanion, InMemoryInstallFeed, InMemoryPackageRegistry,
        RecordingPrompt,
    },
    platform::{AcquisitionPrompt, InstallFeed, PackageRegistry, ServiceBinder},
};
use emberlink_core::{ClientEvent, Event, StatusFlags};

mod logging;

#[tokio::main]
async fn main() {
    logging::init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let service = Arc::new(InMemoryCompanion::default());
    let binder = Arc::new(InMemoryBinder::new(Arc::clone(&service)));
    let registry = Arc::new(InMemoryPackageRegistry::default());
    registry.mark_installed(&config.package);

    let platform = PlatformServices {
        binder: binder as Arc<dyn ServiceBinder>,
        packages: registry as Arc<dyn PackageRegistry>,
        prompt: Arc::new(RecordingPrompt::default()) as Arc<dyn AcquisitionPrompt>,
        installs: Arc::new(InMemoryInstallFeed::default()) as Arc<dyn InstallFeed>,
    };

    let (client, mut receiver) = match CompanionClient::connect(config, platform) {
        Ok(connected) => connected,
        Err(err) => {
            eprintln!("Failed to connect: {err}");
            std::process::exit(1);
        }
    };

    // Drive the fake service a little: discover and bind a peripheral, store
    // two events, let the service report status.
    service.emit_new_peripheral("00:11:22:33:44:55");
    client
        .set_address(Some("00:11:22:33:44:55"))
        .expect("address set against in-memory service");

    let end = Utc::now();
    let begin = end - Duration::minutes(4);
    client
        .set_events(&[
            Event::new(begin, end, 1),
            Event::new(begin - Duration::hours(1), end - Duration::hours(1), 2),
        ])
        .expect("event set against in-memory service");
    service.emit_status(StatusFlags::RUNNING);
    service.emit_brownout(false);

    client.close();

    // Ready + discovery + raw + decoded + status + brownout.
    for _ in 0..6 {
        match receiver.recv().await {
            Some(ClientEvent::Ready) => println!("ready"),
            Some(ClientEvent::NewPeripheral { address }) => {
                println!("peripheral discovered: {address}");
            }
            Some(ClientEvent::EventsChangedRaw { events }) => {
                println!("raw events changed: {} entries", events.len());
            }
            Some(ClientEvent::EventsChanged { events }) => {
                for event in events {
                    println!(
                        "event session={} {} -> {}",
                        event.session_id(),
                        event.begin(),
                        event.end()
                    );
                }
            }
            Some(ClientEvent::StatusChanged { status }) => {
                println!("status: running={}", status.contains(StatusFlags::RUNNING));
            }
            Some(ClientEvent::Brownout { battery_empty }) => {
                println!("brownout: battery_empty={battery_empty}");
            }
            Some(other) => println!("other notification: {other:?}"),
            None => break,
        }
    }
}
