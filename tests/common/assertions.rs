//! Invariant checks shared by integration tests

use contact_archiver::{ArchiveStatus, Archiver, Error, Phase};

/// Assert the invariants that must hold after any trigger
///
/// - progress is within [0, 1]
/// - idle means zero progress and no start time
/// - complete means full progress
/// - an artifact is present exactly when complete
pub async fn assert_consistent(archiver: &Archiver) -> ArchiveStatus {
    let status = archiver.status().await;

    assert!(
        (0.0..=1.0).contains(&status.progress),
        "progress out of range: {status:?}"
    );
    match status.phase {
        Phase::Idle => {
            assert_eq!(status.progress, 0.0, "idle job has progress: {status:?}");
            assert!(status.started_at.is_none(), "idle job has start time");
        }
        Phase::Running => assert!(status.started_at.is_some()),
        Phase::Complete => assert_eq!(status.progress, 1.0),
    }

    let artifact = archiver.artifact_location().await;
    match (status.phase, artifact) {
        (Phase::Complete, Ok(_)) => {}
        (phase, Err(Error::NotReady { phase: reported })) if phase != Phase::Complete => {
            assert_eq!(phase, reported, "NotReady should report the current phase");
        }
        (phase, other) => panic!("artifact access inconsistent with phase {phase}: {other:?}"),
    }
    assert_eq!(status.artifact.is_some(), status.phase == Phase::Complete);

    status
}
