// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{
    JobContext, JobId, MapCompletion, ProviderContext, ProviderError, ProviderState,
    ShuffleProvider,
};
use std::collections::BTreeSet;
use std::fmt;

/// Provider wrapped in its lifecycle state machine.
///
/// Every call is checked against the current state before it reaches the
/// provider, so an out-of-order notification is rejected instead of being
/// left to the implementation. Jobs are tracked independently: notifications
/// for different jobs may interleave, but each job sees exactly
/// `job_init`, `map_done`*, `job_done`.
pub struct ManagedProvider {
    id: String,
    provider: Box<dyn ShuffleProvider>,
    state: ProviderState,
    active_jobs: BTreeSet<JobId>,
}

impl ManagedProvider {
    pub fn new(id: impl Into<String>, provider: Box<dyn ShuffleProvider>) -> Self {
        Self {
            id: id.into(),
            provider,
            state: ProviderState::Uninitialized,
            active_jobs: BTreeSet::new(),
        }
    }

    /// Registry identifier this provider was resolved from
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn is_job_active(&self, job_id: &JobId) -> bool {
        self.active_jobs.contains(job_id)
    }

    pub fn active_jobs(&self) -> impl Iterator<Item = &JobId> {
        self.active_jobs.iter()
    }

    pub fn initialize(&mut self, context: ProviderContext) -> Result<(), ProviderError> {
        if !self.state.can_initialize() {
            return Err(ProviderError::Lifecycle {
                operation: "initialize",
                state: self.state,
            });
        }

        self.provider.initialize(context)?;
        self.state = ProviderState::Initialized;
        tracing::info!("shuffle provider '{}' initialized", self.id);
        Ok(())
    }

    /// Close the provider. Always forwarded unless already closed, because a
    /// failed `initialize` may have left partial resources behind. Open jobs
    /// are discarded; the instance can be initialized again afterwards.
    pub fn close(&mut self) -> Result<(), ProviderError> {
        if self.state == ProviderState::Closed {
            return Ok(());
        }

        if !self.active_jobs.is_empty() {
            tracing::debug!(
                "closing shuffle provider '{}' with {} open job(s)",
                self.id,
                self.active_jobs.len()
            );
        }

        let result = self.provider.close();
        self.active_jobs.clear();
        self.state = ProviderState::Closed;
        tracing::info!("shuffle provider '{}' closed", self.id);
        result
    }

    pub fn job_init(&mut self, job: &JobContext) -> Result<(), ProviderError> {
        self.ensure_accepts("notify job start")?;
        if self.active_jobs.contains(&job.job_id) {
            return Err(ProviderError::DuplicateJob(job.job_id.clone()));
        }

        self.provider.job_init(job)?;
        self.active_jobs.insert(job.job_id.clone());
        self.state = ProviderState::JobActive;
        tracing::debug!("shuffle provider '{}' tracking job {}", self.id, job.job_id);
        Ok(())
    }

    pub fn map_done(&mut self, completion: &MapCompletion) -> Result<(), ProviderError> {
        self.ensure_accepts("notify map completion")?;
        self.ensure_job_active(completion.job_id())?;
        self.provider.map_done(completion)
    }

    /// The job is considered finished even if the provider reports an error,
    /// since `job_done` is delivered exactly once per job.
    pub fn job_done(&mut self, job_id: &JobId) -> Result<(), ProviderError> {
        self.ensure_accepts("notify job completion")?;
        self.ensure_job_active(job_id)?;

        let result = self.provider.job_done(job_id);
        self.active_jobs.remove(job_id);
        if self.active_jobs.is_empty() {
            self.state = ProviderState::Initialized;
        }
        tracing::debug!("shuffle provider '{}' released job {}", self.id, job_id);
        result
    }

    fn ensure_accepts(&self, operation: &'static str) -> Result<(), ProviderError> {
        if self.state.accepts_notifications() {
            Ok(())
        } else {
            Err(ProviderError::Lifecycle {
                operation,
                state: self.state,
            })
        }
    }

    fn ensure_job_active(&self, job_id: &JobId) -> Result<(), ProviderError> {
        if self.active_jobs.contains(job_id) {
            Ok(())
        } else {
            Err(ProviderError::UnknownJob(job_id.clone()))
        }
    }
}

impl fmt::Debug for ManagedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProvider")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("active_jobs", &self.active_jobs)
            .finish()
    }
}
