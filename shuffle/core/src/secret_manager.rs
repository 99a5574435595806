// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::JobId;

/// Trait for the worker's job token secrets, as seen by shuffle providers.
/// Only read access is exposed; the worker owns registration and removal.
pub trait JobTokenSecretManager: Send + Sync {
    /// Secret of a job, if the worker has registered one
    fn retrieve_secret(&self, job_id: &JobId) -> Option<Vec<u8>>;

    /// Hex-encoded keyed hash of `message` under the job's secret
    /// Returns None if the job has no secret
    fn compute_hash(&self, job_id: &JobId, message: &[u8]) -> Option<String>;

    /// Check a hash produced by a fetcher holding the same job secret
    fn verify_hash(&self, job_id: &JobId, message: &[u8], hash: &str) -> bool;
}
