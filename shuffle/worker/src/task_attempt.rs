// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_provider_core::{JobId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Map,
    Reduce,
}

/// A task attempt the worker ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskAttempt {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub user: String,
    pub kind: TaskKind,
}

impl TaskAttempt {
    pub fn map(job_id: JobId, task_id: TaskId, user: impl Into<String>) -> Self {
        Self {
            job_id,
            task_id,
            user: user.into(),
            kind: TaskKind::Map,
        }
    }

    pub fn reduce(job_id: JobId, task_id: TaskId, user: impl Into<String>) -> Self {
        Self {
            job_id,
            task_id,
            user: user.into(),
            kind: TaskKind::Reduce,
        }
    }

    pub fn is_map(&self) -> bool {
        self.kind == TaskKind::Map
    }
}
