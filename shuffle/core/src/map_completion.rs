// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{JobId, TaskId};
use std::path::{Path, PathBuf};

/// Output of one completed map task, ready to be served to reducers.
///
/// Both files belong to the worker. Providers read them but never move,
/// modify or delete them; the worker removes them once the job is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapCompletion {
    user: String,
    job_id: JobId,
    task_id: TaskId,
    data_path: PathBuf,
    index_path: PathBuf,
}

impl MapCompletion {
    pub fn new(
        user: impl Into<String>,
        job_id: JobId,
        task_id: TaskId,
        data_path: PathBuf,
        index_path: PathBuf,
    ) -> Self {
        Self {
            user: user.into(),
            job_id,
            task_id,
            data_path,
            index_path,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }
}
