// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::JobId;
use serde::{Deserialize, Serialize};

/// Metadata of a job that has just been localized on the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    pub job_id: JobId,
    pub user: String,
    /// Number of reduce partitions every map output of this job carries
    pub num_reduce_tasks: usize,
}

impl JobContext {
    pub fn new(job_id: JobId, user: impl Into<String>, num_reduce_tasks: usize) -> Self {
        Self {
            job_id,
            user: user.into(),
            num_reduce_tasks,
        }
    }
}
