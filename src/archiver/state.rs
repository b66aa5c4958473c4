//! Archive job state machine.
//!
//! Pure and synchronous: every transition takes the current time as an
//! argument, so the table below can be exercised without a clock or a
//! runtime.
//!
//! | phase    | start        | advance                       | reset  |
//! |----------|--------------|-------------------------------|--------|
//! | Idle     | → Running    | no-op                         | no-op  |
//! | Running  | no-op        | recompute; at 1.0 → Finished  | → Idle |
//! | Complete | no-op        | no-op                         | → Idle |
//!
//! Completion is split in two: [`JobState::advance`] reports
//! [`Tick::Finished`] once elapsed time reaches the nominal duration, and the
//! caller then supplies the artifact via [`JobState::complete`]. The caller
//! holds its lock across both steps, so no observer sees a finished run
//! without an artifact.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::types::{ArchiveArtifact, ArchiveStatus, Phase};

/// Outcome of recomputing progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Tick {
    /// Not running; nothing was recomputed
    Inactive,
    /// Still running; progress rose to the given value
    Running(f64),
    /// Still running; progress did not move since the last recompute
    Held,
    /// Elapsed time reached the nominal duration; artifact needed
    Finished,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Job {
    #[default]
    Idle,
    Running {
        started_at: DateTime<Utc>,
        progress: f64,
    },
    Complete {
        started_at: DateTime<Utc>,
        artifact: ArchiveArtifact,
    },
}

/// The single archive job
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct JobState {
    job: Job,
}

impl JobState {
    pub(crate) fn phase(&self) -> Phase {
        match self.job {
            Job::Idle => Phase::Idle,
            Job::Running { .. } => Phase::Running,
            Job::Complete { .. } => Phase::Complete,
        }
    }

    pub(crate) fn progress(&self) -> f64 {
        match self.job {
            Job::Idle => 0.0,
            Job::Running { progress, .. } => progress,
            Job::Complete { .. } => 1.0,
        }
    }

    pub(crate) fn started_at(&self) -> Option<DateTime<Utc>> {
        match self.job {
            Job::Idle => None,
            Job::Running { started_at, .. } | Job::Complete { started_at, .. } => Some(started_at),
        }
    }

    pub(crate) fn artifact(&self) -> Option<&ArchiveArtifact> {
        match &self.job {
            Job::Complete { artifact, .. } => Some(artifact),
            Job::Idle | Job::Running { .. } => None,
        }
    }

    pub(crate) fn status(&self) -> ArchiveStatus {
        ArchiveStatus {
            phase: self.phase(),
            progress: self.progress(),
            started_at: self.started_at(),
            artifact: self.artifact().map(ArchiveArtifact::info),
        }
    }

    /// Idle → Running. Returns whether the transition happened.
    pub(crate) fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self.job {
            Job::Idle => {
                self.job = Job::Running {
                    started_at: now,
                    progress: 0.0,
                };
                true
            }
            Job::Running { .. } | Job::Complete { .. } => false,
        }
    }

    /// Recompute progress from elapsed time.
    ///
    /// Progress never moves backwards, even if `now` is earlier than a
    /// previous call.
    pub(crate) fn advance(&mut self, now: DateTime<Utc>, nominal: Duration) -> Tick {
        let Job::Running {
            started_at,
            progress,
        } = &mut self.job
        else {
            return Tick::Inactive;
        };

        let computed = fraction_elapsed(*started_at, now, nominal);
        if computed < *progress {
            tracing::warn!(
                previous = *progress,
                computed,
                "Clock moved backwards during archive run, keeping previous progress"
            );
        }
        let rose = computed > *progress;
        *progress = progress.max(computed);

        if *progress >= 1.0 {
            *progress = 1.0;
            Tick::Finished
        } else if rose {
            Tick::Running(*progress)
        } else {
            Tick::Held
        }
    }

    /// Running → Complete with the materialized artifact.
    ///
    /// Only valid after [`Tick::Finished`]; any other phase is left alone.
    pub(crate) fn complete(&mut self, artifact: ArchiveArtifact) -> bool {
        match self.job {
            Job::Running {
                started_at,
                progress,
            } if progress >= 1.0 => {
                self.job = Job::Complete {
                    started_at,
                    artifact,
                };
                true
            }
            _ => false,
        }
    }

    /// Any phase → Idle. Returns the phase left, or None if already idle.
    pub(crate) fn reset(&mut self) -> Option<Phase> {
        let from = self.phase();
        match std::mem::take(&mut self.job) {
            Job::Idle => None,
            Job::Running { .. } | Job::Complete { .. } => Some(from),
        }
    }
}

fn fraction_elapsed(started_at: DateTime<Utc>, now: DateTime<Utc>, nominal: Duration) -> f64 {
    if nominal.is_zero() {
        return 1.0;
    }
    // Negative elapsed time (clock behind start) counts as zero
    let elapsed = (now - started_at).to_std().unwrap_or(Duration::ZERO);
    (elapsed.as_secs_f64() / nominal.as_secs_f64()).min(1.0)
}
