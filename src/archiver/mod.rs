//! Background archive job.
//!
//! The [`Archiver`] tracks one export job at a time. Callers drive it with
//! three triggers and read it back with a few queries:
//! - [`Archiver::start`] begins a run (no-op unless idle)
//! - [`Archiver::poll`] recomputes progress and completes the run once the
//!   nominal duration has elapsed
//! - [`Archiver::reset`] returns to idle, cancelling a run or discarding the
//!   artifact
//!
//! There is no worker task. Progress is simulated from wall-clock time, so a
//! poll is a quick recomputation under a lock and never waits on real work.
//! The transition rules live in the `state` submodule.

mod state;


use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

use crate::clock::{Clock, SystemClock};
use crate::config::{ArchiveConfig, MAX_EVENT_BUFFER};
use crate::error::{Error, Result};
use crate::records::RecordSource;
use crate::types::{ArchiveArtifact, ArchiveStatus, Event, Phase};

use state::{JobState, Tick};

/// Handle to the archive job (cloneable - all fields are Arc-wrapped)
///
/// Clones share one job. Create a single `Archiver` at startup and pass
/// clones to whatever serves requests.
///
/// # Examples
///
/// ```
/// use contact_archiver::{Archiver, ArchiveConfig, ContactStore, Phase, RecordsConfig};
/// use contact_archiver::clock::ManualClock;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> contact_archiver::Result<()> {
/// let clock = ManualClock::default();
/// let store = ContactStore::new(&RecordsConfig::default());
/// let archiver = Archiver::with_clock(
///     ArchiveConfig::default(),
///     Arc::new(store),
///     Arc::new(clock.clone()),
/// );
///
/// archiver.start().await;
/// clock.advance(Duration::from_secs(10));
/// let status = archiver.poll().await;
///
/// assert_eq!(status.phase, Phase::Complete);
/// let artifact = archiver.artifact().await?;
/// assert_eq!(&artifact.content[..], b"[]");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Archiver {
    /// Job state; every trigger and query goes through this lock
    state: Arc<Mutex<JobState>>,
    /// Time source for progress
    clock: Arc<dyn Clock>,
    /// Supplies the snapshot written into the artifact
    source: Arc<dyn RecordSource>,
    config: Arc<ArchiveConfig>,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
}

impl std::fmt::Debug for Archiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Archiver {
    /// Create an archiver that measures progress with wall-clock time
    pub fn new(config: ArchiveConfig, source: Arc<dyn RecordSource>) -> Self {
        Self::with_clock(config, source, Arc::new(SystemClock))
    }

    /// Create an archiver with an explicit time source
    ///
    /// `event_buffer` is clamped to `1..=MAX_EVENT_BUFFER`, so an unvalidated
    /// config still yields a working channel.
    pub fn with_clock(
        config: ArchiveConfig,
        source: Arc<dyn RecordSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capacity = config.event_buffer.clamp(1, MAX_EVENT_BUFFER);
        let (event_tx, _rx) = broadcast::channel(capacity);
        Self {
            state: Arc::new(Mutex::new(JobState::default())),
            clock,
            source,
            config: Arc::new(config),
            event_tx,
        }
    }

    /// Subscribe to archive events
    ///
    /// Each subscriber receives every event sent after it subscribed. Slow
    /// subscribers that fall more than `event_buffer` events behind see
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Begin a run if the job is idle
    ///
    /// While running or complete this changes nothing, so repeated clicks
    /// or retried requests never restart a run or discard a finished one.
    pub async fn start(&self) -> ArchiveStatus {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if state.start(now) {
            tracing::info!(started_at = %now, "Archive job started");
            self.emit_event(Event::Started { started_at: now });
        } else {
            tracing::debug!(phase = %state.phase(), "Archive job already active, start ignored");
        }
        state.status()
    }

    /// Recompute progress and complete the run if its time is up
    ///
    /// Idle and complete jobs are returned unchanged. A running job whose
    /// elapsed time has reached the nominal duration is completed within
    /// this call: the record snapshot is taken and the artifact stored
    /// before the lock is released.
    pub async fn poll(&self) -> ArchiveStatus {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        match state.advance(now, self.config.nominal_duration) {
            Tick::Inactive => {}
            Tick::Running(progress) => {
                tracing::debug!(progress, "Archive job progress");
                self.emit_event(Event::Progress { progress });
            }
            Tick::Held => tracing::debug!(
                progress = state.progress(),
                "Archive job progress unchanged"
            ),
            Tick::Finished => {
                let artifact = self.materialize(now).await;
                let location = artifact.location.clone();
                let record_count = artifact.record_count;

                if state.complete(artifact) {
                    tracing::info!(
                        location = %location.display(),
                        record_count,
                        "Archive job complete"
                    );
                    self.emit_event(Event::Completed {
                        location,
                        record_count,
                    });
                }
            }
        }
        state.status()
    }

    /// Return to idle, cancelling a run or discarding a finished artifact
    pub async fn reset(&self) -> ArchiveStatus {
        let mut state = self.state.lock().await;

        match state.reset() {
            Some(from) => {
                if from == Phase::Running {
                    tracing::info!("Archive job cancelled");
                } else {
                    tracing::info!("Archive artifact discarded");
                }
                self.emit_event(Event::Reset { from });
            }
            None => tracing::debug!("Archive job already idle, reset ignored"),
        }
        state.status()
    }

    /// Current state without recomputing progress
    pub async fn status(&self) -> ArchiveStatus {
        self.state.lock().await.status()
    }

    /// Current phase
    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase()
    }

    /// Progress as of the last trigger (0.0 while idle, 1.0 once complete)
    pub async fn progress(&self) -> f64 {
        self.state.lock().await.progress()
    }

    /// Where the finished artifact is served from
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] unless the job is complete.
    pub async fn artifact_location(&self) -> Result<PathBuf> {
        self.artifact().await.map(|artifact| artifact.location)
    }

    /// The finished artifact, including its content
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] unless the job is complete.
    pub async fn artifact(&self) -> Result<ArchiveArtifact> {
        let state = self.state.lock().await;
        state.artifact().cloned().ok_or(Error::NotReady {
            phase: state.phase(),
        })
    }

    /// Take the record snapshot and serialize it
    ///
    /// Never fails: a snapshot that cannot be produced is logged and
    /// archived as an empty list, so a finished run always completes.
    async fn materialize(&self, now: DateTime<Utc>) -> ArchiveArtifact {
        let encoded = self.source.snapshot().await.and_then(|snapshot| {
            let record_count = count_records(&snapshot);
            self.encode(&snapshot).map(|bytes| (bytes, record_count))
        });

        let (content, record_count) = encoded.unwrap_or_else(|e| {
            tracing::error!(
                error = %e,
                source = self.source.name(),
                "Failed to snapshot records for archive, writing empty archive"
            );
            (b"[]".to_vec(), 0)
        });

        ArchiveArtifact {
            location: self.config.download_name.clone(),
            content: Arc::from(content),
            record_count,
            created_at: now,
        }
    }

    fn encode(&self, snapshot: &serde_json::Value) -> Result<Vec<u8>> {
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(snapshot)?
        } else {
            serde_json::to_vec(snapshot)?
        };
        Ok(bytes)
    }

    fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}

fn count_records(snapshot: &serde_json::Value) -> usize {
    match snapshot {
        serde_json::Value::Array(items) => items.len(),
        serde_json::Value::Null => 0,
        _ => 1,
    }
}
