// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_provider_core::{JobConf, JobId, TaskId};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// One call observed by a recording provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Configured(JobConf),
    Initialize,
    Close,
    JobInit(JobId),
    MapDone {
        user: String,
        job_id: JobId,
        task_id: TaskId,
        data_path: PathBuf,
        index_path: PathBuf,
    },
    JobDone(JobId),
}

/// Shared, append-only record of notifications
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: Notification) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).push(notification);
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifications other than `Configured`, i.e. the lifecycle calls
    pub fn lifecycle(&self) -> Vec<Notification> {
        self.snapshot()
            .into_iter()
            .filter(|n| !matches!(n, Notification::Configured(_)))
            .collect()
    }

    /// Lifecycle notifications that concern one job
    pub fn for_job(&self, job_id: &JobId) -> Vec<Notification> {
        self.snapshot()
            .into_iter()
            .filter(|n| match n {
                Notification::JobInit(id) | Notification::JobDone(id) => id == job_id,
                Notification::MapDone { job_id: id, .. } => id == job_id,
                _ => false,
            })
            .collect()
    }
}
