// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{MapOutputFile, TaskAttempt, WorkerError};
use rand::Rng;
use shuffle_provider_core::{
    InMemorySecretManager, JobConf, JobContext, JobId, ManagedProvider, MapCompletion,
    ProviderContext, ProviderRegistry,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const JOB_SECRET_LENGTH: usize = 20;

/// Random secret for a newly localized job
pub fn generate_job_secret() -> Vec<u8> {
    let mut secret = vec![0u8; JOB_SECRET_LENGTH];
    rand::rng().fill(&mut secret[..]);
    secret
}

struct RunningJob {
    context: JobContext,
    completed_maps: usize,
}

/// Worker-side driver of the shuffle provider lifecycle.
///
/// The provider is resolved once when the worker is built. It is initialized
/// at the end of worker initialization, learns about a job when the job's
/// first task is localized, about every finished map task, and about the end
/// of job cleanup. `close` runs at worker shutdown and never fails.
pub struct ShuffleWorker {
    conf: Arc<JobConf>,
    secrets: Arc<InMemorySecretManager>,
    provider: Option<ManagedProvider>,
    running_jobs: BTreeMap<JobId, RunningJob>,
    initialized: bool,
}

impl ShuffleWorker {
    /// Resolve the configured provider. Failures here abort worker startup.
    pub fn new(conf: JobConf, registry: &ProviderRegistry) -> Result<Self, WorkerError> {
        let provider = registry.resolve_configured(&conf)?;
        Ok(Self {
            conf: Arc::new(conf),
            secrets: Arc::new(InMemorySecretManager::new()),
            provider,
            running_jobs: BTreeMap::new(),
            initialized: false,
        })
    }

    pub fn conf(&self) -> &JobConf {
        &self.conf
    }

    pub fn secret_manager(&self) -> &Arc<InMemorySecretManager> {
        &self.secrets
    }

    pub fn provider(&self) -> Option<&ManagedProvider> {
        self.provider.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn running_jobs(&self) -> impl Iterator<Item = &JobId> {
        self.running_jobs.keys()
    }

    pub fn initialize(&mut self) -> Result<(), WorkerError> {
        if self.initialized {
            return Err(WorkerError::AlreadyRunning);
        }

        if let Some(provider) = self.provider.as_mut() {
            let context = ProviderContext::new(self.conf.clone(), self.secrets.clone());
            provider.initialize(context)?;
        }

        self.initialized = true;
        info!("shuffle worker initialized");
        Ok(())
    }

    /// Register a job the first time one of its tasks is launched here.
    /// Returns false if the job was already localized.
    pub fn localize_job(&mut self, job: JobContext, secret: Vec<u8>) -> Result<bool, WorkerError> {
        self.ensure_running()?;
        if self.running_jobs.contains_key(&job.job_id) {
            return Ok(false);
        }
        MapOutputFile::check_component("job id", job.job_id.as_str())?;
        MapOutputFile::check_component("user", &job.user)?;

        self.secrets.add_token(job.job_id.clone(), secret);
        if let Some(provider) = self.provider.as_mut() {
            if let Err(e) = provider.job_init(&job) {
                self.secrets.remove_token(&job.job_id);
                return Err(e.into());
            }
        }

        info!(
            "localized job {} for user {} with {} reduce task(s)",
            job.job_id, job.user, job.num_reduce_tasks
        );
        self.running_jobs.insert(
            job.job_id.clone(),
            RunningJob {
                context: job,
                completed_maps: 0,
            },
        );
        Ok(true)
    }

    /// Where the map output of `task` lives on this worker
    pub fn map_output_file(&self, task: &TaskAttempt) -> Result<MapOutputFile, WorkerError> {
        MapOutputFile::check_component("job id", task.job_id.as_str())?;
        MapOutputFile::check_component("user", &task.user)?;
        MapOutputFile::check_component("task id", task.task_id.as_str())?;
        let local_dir = self.local_dir()?;
        Ok(MapOutputFile::for_task(
            &local_dir,
            &task.user,
            &task.job_id,
            &task.task_id,
        ))
    }

    /// Record a successfully finished task. Only map tasks reach the provider.
    pub fn task_done(&mut self, task: &TaskAttempt) -> Result<(), WorkerError> {
        self.ensure_running()?;
        if !self.running_jobs.contains_key(&task.job_id) {
            return Err(WorkerError::UnknownJob(task.job_id.clone()));
        }

        if !task.is_map() {
            debug!("reduce task {} of job {} done", task.task_id, task.job_id);
            return Ok(());
        }

        let output = self.map_output_file(task)?;
        if let Some(provider) = self.provider.as_mut() {
            let completion = MapCompletion::new(
                task.user.clone(),
                task.job_id.clone(),
                task.task_id.clone(),
                output.data_path,
                output.index_path,
            );
            provider.map_done(&completion)?;
        }

        if let Some(job) = self.running_jobs.get_mut(&task.job_id) {
            job.completed_maps += 1;
        }
        debug!("map task {} of job {} done", task.task_id, task.job_id);
        Ok(())
    }

    /// End of job cleanup: the provider is told first, then the job token and
    /// the job's local files go away.
    pub fn job_done(&mut self, job_id: &JobId) -> Result<(), WorkerError> {
        self.ensure_running()?;
        let job = self
            .running_jobs
            .remove(job_id)
            .ok_or_else(|| WorkerError::UnknownJob(job_id.clone()))?;

        let notified = match self.provider.as_mut() {
            Some(provider) => provider.job_done(job_id),
            None => Ok(()),
        };
        self.secrets.remove_token(job_id);
        let cleaned = self.remove_job_dir(&job.context);

        info!(
            "job {} done after {} map task(s)",
            job_id, job.completed_maps
        );
        notified?;
        cleaned
    }

    /// Shut the worker down. Provider failures are logged and swallowed so
    /// the rest of the shutdown still runs.
    pub fn close(&mut self) {
        if let Some(provider) = self.provider.as_mut() {
            if let Err(e) = provider.close() {
                warn!("shuffle provider '{}' failed to close: {}", provider.id(), e);
            }
        }

        for job_id in std::mem::take(&mut self.running_jobs).into_keys() {
            self.secrets.remove_token(&job_id);
        }
        self.initialized = false;
        info!("shuffle worker closed");
    }

    fn ensure_running(&self) -> Result<(), WorkerError> {
        if self.initialized {
            Ok(())
        } else {
            Err(WorkerError::NotRunning)
        }
    }

    fn local_dir(&self) -> Result<PathBuf, WorkerError> {
        self.conf.local_dir().ok_or(WorkerError::NoLocalDir)
    }

    fn remove_job_dir(&self, job: &JobContext) -> Result<(), WorkerError> {
        let Some(local_dir) = self.conf.local_dir() else {
            return Ok(());
        };

        let job_dir = MapOutputFile::job_dir(&local_dir, &job.user, &job.job_id);
        match std::fs::remove_dir_all(&job_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkerError::Cleanup {
                job: job.job_id.clone(),
                source,
            }),
        }
    }
}
