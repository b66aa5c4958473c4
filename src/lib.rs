//! # contact-archiver
//!
//! Background archive job for a contact-management application.
//!
//! The application lets users export their contact list. The export runs as
//! a job with three phases: idle, running and complete. The web layer polls
//! it to draw a progress bar, offers the file for download once it is
//! complete, and can reset it at any time. This crate is that job, and it is
//! independent of any web framework.
//!
//! ## Design
//!
//! - **One job, explicit handle** - an [`Archiver`] is created once and
//!   cloned into request handlers; clones share the job
//! - **Total triggers** - `start`, `poll` and `reset` never fail; calls that
//!   do not apply are no-ops
//! - **Simulated progress** - progress is elapsed time over a fixed nominal
//!   duration, with an injectable [`clock::Clock`]
//! - **Event-driven** - consumers can subscribe to transitions instead of
//!   polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use contact_archiver::{Archiver, Config, ContactStore, NewContact, Phase};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let contacts = ContactStore::new(&config.records);
//!     contacts
//!         .insert(NewContact {
//!             first: "Ada".into(),
//!             last: "Lovelace".into(),
//!             phone: "555-0100".into(),
//!             email: "ada@example.com".into(),
//!         })
//!         .await?;
//!
//!     let archiver = Archiver::new(config.archive.clone(), Arc::new(contacts));
//!     archiver.start().await;
//!
//!     loop {
//!         let status = archiver.poll().await;
//!         if status.phase == Phase::Complete {
//!             break;
//!         }
//!         println!("{:.0}%", status.percent());
//!         tokio::time::sleep(std::time::Duration::from_millis(600)).await;
//!     }
//!
//!     let artifact = archiver.artifact().await?;
//!     println!("{} bytes ready as {}", artifact.size_bytes(), artifact.location.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Background archive job
pub mod archiver;
/// Time sources for progress
pub mod clock;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Contact records and snapshot sources
pub mod records;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use archiver::Archiver;
pub use config::{ArchiveConfig, Config, RecordsConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use records::{Contact, ContactId, ContactStore, NewContact, RecordSource};
pub use types::{ArchiveArtifact, ArchiveStatus, ArtifactInfo, Event, Phase};
