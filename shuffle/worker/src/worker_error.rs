// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_provider_core::{JobId, LoaderError, ProviderError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("shuffle provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("worker is not initialized")]
    NotRunning,

    #[error("worker is already initialized")]
    AlreadyRunning,

    #[error("job {0} is not running on this worker")]
    UnknownJob(JobId),

    #[error("{kind} '{value}' cannot be used as a local directory name")]
    InvalidPathComponent { kind: &'static str, value: String },

    #[error("'{}' is not configured", shuffle_provider_core::JobConf::LOCAL_DIR_KEY)]
    NoLocalDir,

    #[error("failed to clean up job {job}: {source}")]
    Cleanup {
        job: JobId,
        #[source]
        source: std::io::Error,
    },
}
