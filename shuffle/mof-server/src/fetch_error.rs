// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_provider_core::{JobId, TaskId};
use thiserror::Error;

/// Reasons a fetch request is answered with `ERR:`
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("request for job {0} failed authentication")]
    Unauthorized(JobId),

    #[error("job {0} is not served here")]
    UnknownJob(JobId),

    #[error("map {map} of job {job} is not served here")]
    UnknownMap { job: JobId, map: TaskId },

    #[error("map {map} has no partition {reduce}")]
    NoSuchPartition { map: TaskId, reduce: usize },

    #[error("failed to read map output: {0}")]
    Io(#[from] std::io::Error),
}
