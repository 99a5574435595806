// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{JobContext, JobId, MapCompletion, ProviderContext, ProviderError};

/// Trait for transports that serve map output to reducers alongside the
/// worker's built-in shuffle server.
///
/// The worker delivers the notifications one at a time, in order, never
/// reentrantly. None of them may block for longer than it takes to update
/// bookkeeping: serving fetches belongs on the provider's own background
/// threads or tasks.
///
/// Call order for one instance:
/// - `initialize` once, at the end of worker initialization
/// - per job: `job_init`, then `map_done` for every finished map task, then `job_done`
/// - `close` at worker shutdown, after which `initialize` may be called again
pub trait ShuffleProvider: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Bind the provider to the worker's dependencies and allocate resources.
    /// Called again on the same object after `close` when the worker restarts.
    fn initialize(&mut self, context: ProviderContext) -> Result<(), ProviderError>;

    /// Release every thread, socket, open file and scratch directory.
    /// Must be safe without a prior (or after a failed) `initialize`, and must
    /// stop background work within bounded time.
    fn close(&mut self) -> Result<(), ProviderError>;

    /// A job was localized on this worker
    fn job_init(&mut self, job: &JobContext) -> Result<(), ProviderError>;

    /// A map task of an initialized job finished and its output may be served
    fn map_done(&mut self, completion: &MapCompletion) -> Result<(), ProviderError>;

    /// The worker is done with the job; drop everything registered for it
    fn job_done(&mut self, job_id: &JobId) -> Result<(), ProviderError>;
}
