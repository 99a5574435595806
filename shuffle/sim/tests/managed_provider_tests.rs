// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_provider_core::{
    InMemorySecretManager, JobConf, JobContext, JobId, MapCompletion, ManagedProvider,
    ProviderContext, ProviderError, ProviderState, ShuffleProvider, TaskId,
};
use shuffle_sim::{Notification, NotificationLog, Operation, RecordingProvider};
use std::path::PathBuf;
use std::sync::Arc;

fn context() -> ProviderContext {
    ProviderContext::new(
        Arc::new(JobConf::new()),
        Arc::new(InMemorySecretManager::new()),
    )
}

fn managed(log: &NotificationLog) -> ManagedProvider {
    ManagedProvider::new(
        "recording",
        Box::new(RecordingProvider::from_conf(&JobConf::new(), log.clone())),
    )
}

fn managed_failing(log: &NotificationLog, operation: Operation) -> ManagedProvider {
    ManagedProvider::new(
        "recording",
        Box::new(RecordingProvider::from_conf(&JobConf::new(), log.clone()).failing_on(operation)),
    )
}

fn job(id: &str) -> JobContext {
    JobContext::new(JobId::new(id), "alice", 2)
}

fn completion(job_id: &str, task_id: &str) -> MapCompletion {
    MapCompletion::new(
        "alice",
        JobId::new(job_id),
        TaskId::new(task_id),
        PathBuf::from(format!("/local/{}/{}/file.out", job_id, task_id)),
        PathBuf::from(format!("/local/{}/{}/file.out.index", job_id, task_id)),
    )
}

// ============================================================
// Job notification ordering
// ============================================================

#[test]
fn test_liveness_job_with_two_maps_sees_exact_sequence() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();

    provider.job_init(&job("J1")).unwrap();
    provider.map_done(&completion("J1", "t1")).unwrap();
    provider.map_done(&completion("J1", "t2")).unwrap();
    provider.job_done(&JobId::new("J1")).unwrap();

    assert_eq!(
        log.lifecycle(),
        vec![
            Notification::Initialize,
            Notification::JobInit(JobId::new("J1")),
            Notification::MapDone {
                user: "alice".to_string(),
                job_id: JobId::new("J1"),
                task_id: TaskId::new("t1"),
                data_path: PathBuf::from("/local/J1/t1/file.out"),
                index_path: PathBuf::from("/local/J1/t1/file.out.index"),
            },
            Notification::MapDone {
                user: "alice".to_string(),
                job_id: JobId::new("J1"),
                task_id: TaskId::new("t2"),
                data_path: PathBuf::from("/local/J1/t2/file.out"),
                index_path: PathBuf::from("/local/J1/t2/file.out.index"),
            },
            Notification::JobDone(JobId::new("J1")),
        ]
    );
    assert_eq!(provider.state(), ProviderState::Initialized);
}

#[test]
fn test_liveness_job_without_maps() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();

    provider.job_init(&job("J1")).unwrap();
    assert_eq!(provider.state(), ProviderState::JobActive);
    provider.job_done(&JobId::new("J1")).unwrap();

    assert_eq!(
        log.for_job(&JobId::new("J1")),
        vec![
            Notification::JobInit(JobId::new("J1")),
            Notification::JobDone(JobId::new("J1")),
        ]
    );
}

#[test]
fn test_liveness_interleaved_jobs_are_tracked_independently() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();

    provider.job_init(&job("J1")).unwrap();
    provider.job_init(&job("J2")).unwrap();
    provider.map_done(&completion("J2", "m1")).unwrap();
    provider.map_done(&completion("J1", "m1")).unwrap();
    provider.job_done(&JobId::new("J1")).unwrap();

    assert_eq!(provider.state(), ProviderState::JobActive);
    assert!(provider.is_job_active(&JobId::new("J2")));
    assert!(!provider.is_job_active(&JobId::new("J1")));

    provider.job_done(&JobId::new("J2")).unwrap();
    assert_eq!(provider.state(), ProviderState::Initialized);
    assert_eq!(log.for_job(&JobId::new("J2")).len(), 3);
}

#[test]
fn test_safety_map_done_before_job_init_is_rejected() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();

    let result = provider.map_done(&completion("J1", "t1"));

    assert!(matches!(result, Err(ProviderError::UnknownJob(id)) if id == JobId::new("J1")));
    assert_eq!(log.lifecycle(), vec![Notification::Initialize]);
}

#[test]
fn test_safety_job_done_twice_is_rejected() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();
    provider.job_init(&job("J1")).unwrap();
    provider.job_done(&JobId::new("J1")).unwrap();

    let result = provider.job_done(&JobId::new("J1"));

    assert!(matches!(result, Err(ProviderError::UnknownJob(_))));
    assert_eq!(log.for_job(&JobId::new("J1")).len(), 2);
}

#[test]
fn test_safety_duplicate_job_init_is_rejected() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();
    provider.job_init(&job("J1")).unwrap();

    let result = provider.job_init(&job("J1"));

    assert!(matches!(result, Err(ProviderError::DuplicateJob(_))));
    assert_eq!(log.for_job(&JobId::new("J1")).len(), 1);
}

#[test]
fn test_safety_notifications_before_initialize_are_rejected() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);

    let result = provider.job_init(&job("J1"));

    match result {
        Err(ProviderError::Lifecycle { state, .. }) => {
            assert_eq!(state, ProviderState::Uninitialized)
        }
        other => panic!("Expected Lifecycle error, got {:?}", other),
    }
    assert!(log.lifecycle().is_empty());
}

#[test]
fn test_safety_notifications_after_close_are_rejected() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();
    provider.close().unwrap();

    assert!(matches!(
        provider.job_init(&job("J1")),
        Err(ProviderError::Lifecycle {
            state: ProviderState::Closed,
            ..
        })
    ));
    assert!(matches!(
        provider.job_done(&JobId::new("J1")),
        Err(ProviderError::Lifecycle { .. })
    ));
}

#[test]
fn test_safety_double_initialize_is_rejected() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();

    let result = provider.initialize(context());

    assert!(matches!(
        result,
        Err(ProviderError::Lifecycle {
            operation: "initialize",
            state: ProviderState::Initialized,
        })
    ));
    assert_eq!(log.lifecycle(), vec![Notification::Initialize]);
}

#[test]
fn test_failing_map_done_is_propagated() {
    let log = NotificationLog::new();
    let mut provider = managed_failing(&log, Operation::MapDone);
    provider.initialize(context()).unwrap();
    provider.job_init(&job("J1")).unwrap();

    let result = provider.map_done(&completion("J1", "t1"));

    assert!(matches!(result, Err(ProviderError::Internal(_))));
    assert!(provider.is_job_active(&JobId::new("J1")));
}

#[test]
fn test_failing_job_done_still_releases_job() {
    let log = NotificationLog::new();
    let mut provider = managed_failing(&log, Operation::JobDone);
    provider.initialize(context()).unwrap();
    provider.job_init(&job("J1")).unwrap();

    assert!(provider.job_done(&JobId::new("J1")).is_err());

    assert!(!provider.is_job_active(&JobId::new("J1")));
    assert_eq!(provider.state(), ProviderState::Initialized);
}

// ============================================================
// Close and recycling
// ============================================================

#[test]
fn test_close_without_initialize_is_safe() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);

    provider.close().unwrap();

    assert_eq!(provider.state(), ProviderState::Closed);
    assert_eq!(log.lifecycle(), vec![Notification::Close]);
}

#[test]
fn test_close_twice_reaches_provider_once() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();

    provider.close().unwrap();
    provider.close().unwrap();

    assert_eq!(
        log.lifecycle(),
        vec![Notification::Initialize, Notification::Close]
    );
}

#[test]
fn test_close_discards_open_jobs() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);
    provider.initialize(context()).unwrap();
    provider.job_init(&job("J1")).unwrap();

    provider.close().unwrap();

    assert_eq!(provider.active_jobs().count(), 0);
    assert_eq!(provider.state(), ProviderState::Closed);
}

#[test]
fn test_recycle_initialize_close_initialize() {
    let log = NotificationLog::new();
    let mut provider = managed(&log);

    provider.initialize(context()).unwrap();
    provider.close().unwrap();
    provider.initialize(context()).unwrap();

    assert_eq!(provider.state(), ProviderState::Initialized);
    provider.job_init(&job("J2")).unwrap();
    provider.map_done(&completion("J2", "t1")).unwrap();
    provider.job_done(&JobId::new("J2")).unwrap();

    assert_eq!(
        log.lifecycle()[..3],
        [
            Notification::Initialize,
            Notification::Close,
            Notification::Initialize,
        ]
    );
}

#[test]
fn test_failed_initialize_leaves_provider_closable_and_retryable() {
    let log = NotificationLog::new();
    let mut provider = managed_failing(&log, Operation::Initialize);

    assert!(provider.initialize(context()).is_err());
    assert_eq!(provider.state(), ProviderState::Uninitialized);

    provider.close().unwrap();
    assert_eq!(provider.state(), ProviderState::Closed);
    assert_eq!(
        log.lifecycle(),
        vec![Notification::Initialize, Notification::Close]
    );
}

#[test]
fn test_close_failure_is_reported_but_instance_still_recyclable() {
    let log = NotificationLog::new();
    let mut provider = managed_failing(&log, Operation::Close);
    provider.initialize(context()).unwrap();

    assert!(provider.close().is_err());
    assert_eq!(provider.state(), ProviderState::Closed);

    provider.initialize(context()).unwrap();
    assert_eq!(provider.state(), ProviderState::Initialized);
}

#[test]
fn test_recording_provider_counts_initializations() {
    let log = NotificationLog::new();
    let mut provider = RecordingProvider::from_conf(&JobConf::new(), log);

    provider.initialize(context()).unwrap();
    assert!(provider.initialize(context()).is_err());
    provider.close().unwrap();
    provider.initialize(context()).unwrap();

    assert!(provider.is_initialized());
    assert_eq!(provider.initializations(), 2);
}
