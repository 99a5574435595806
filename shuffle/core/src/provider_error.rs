// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{ConfigError, JobId, ProviderState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Lifecycle call issued in a state that does not allow it
    #[error("cannot {operation} while provider is {state}")]
    Lifecycle {
        operation: &'static str,
        state: ProviderState,
    },

    /// Notification for a job that received no `job_init`
    #[error("job {0} was never initialized")]
    UnknownJob(JobId),

    /// Second `job_init` for a job that is still open
    #[error("job {0} is already active")]
    DuplicateJob(JobId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Provider-specific failure (runtime startup, background shutdown, ...)
    #[error("internal provider error: {0}")]
    Internal(String),
}
