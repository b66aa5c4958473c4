//! Contact fixtures and archiver builders

use contact_archiver::clock::ManualClock;
use contact_archiver::{ArchiveConfig, Archiver, Contact, ContactStore, RecordsConfig};
use std::sync::Arc;
use std::time::Duration;

/// Nominal duration used by most tests
pub const NOMINAL: Duration = Duration::from_secs(10);

/// Build `count` contacts with ids 1..=count and unique emails
pub fn contacts(count: u64) -> Vec<Contact> {
    (1..=count)
        .map(|i| Contact {
            id: i,
            first: format!("First{i}"),
            last: format!("Last{i}"),
            phone: format!("555-{i:04}"),
            email: format!("contact{i}@example.com"),
        })
        .collect()
}

/// Store seeded with `count` contacts
pub fn seeded_store(count: u64) -> ContactStore {
    ContactStore::from_contacts(&RecordsConfig::default(), contacts(count))
}

/// Archiver over `store` driven by a manual clock, with the given nominal duration
pub fn archiver_with(store: ContactStore, nominal: Duration) -> (Archiver, ManualClock) {
    let clock = ManualClock::default();
    let config = ArchiveConfig {
        nominal_duration: nominal,
        ..ArchiveConfig::default()
    };
    let archiver = Archiver::with_clock(config, Arc::new(store), Arc::new(clock.clone()));
    (archiver, clock)
}
