// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::FetchError;
use shuffle_provider_core::{JobContext, JobId, MapCompletion, ProviderError, TaskId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Files of one completed map task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutput {
    pub data_path: PathBuf,
    pub index_path: PathBuf,
}

/// Per-job fetch counters, discarded with the job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub requests: u64,
    pub bytes_sent: u64,
}

struct JobOutputs {
    num_reduce_tasks: usize,
    maps: HashMap<TaskId, MapOutput>,
    stats: FetchStats,
}

/// Map outputs the server may hand out, grouped by job.
/// Written by lifecycle notifications, read by connection tasks.
#[derive(Default)]
pub struct MapOutputCatalog {
    jobs: Mutex<HashMap<JobId, JobOutputs>>,
}

impl MapOutputCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the job was already registered
    pub fn register_job(&self, job: &JobContext) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if jobs.contains_key(&job.job_id) {
            return false;
        }
        jobs.insert(
            job.job_id.clone(),
            JobOutputs {
                num_reduce_tasks: job.num_reduce_tasks,
                maps: HashMap::new(),
                stats: FetchStats::default(),
            },
        );
        true
    }

    pub fn add_map_output(&self, completion: &MapCompletion) -> Result<(), ProviderError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let outputs = jobs
            .get_mut(completion.job_id())
            .ok_or_else(|| ProviderError::UnknownJob(completion.job_id().clone()))?;

        outputs.maps.insert(
            completion.task_id().clone(),
            MapOutput {
                data_path: completion.data_path().to_path_buf(),
                index_path: completion.index_path().to_path_buf(),
            },
        );
        Ok(())
    }

    /// Forget a job and return the fetch counters it accumulated
    pub fn remove_job(&self, job_id: &JobId) -> Option<FetchStats> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.remove(job_id).map(|outputs| outputs.stats)
    }

    /// Find the map output holding partition `reduce`
    pub fn lookup(&self, job_id: &JobId, map_id: &TaskId, reduce: usize) -> Result<MapOutput, FetchError> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let outputs = jobs
            .get(job_id)
            .ok_or_else(|| FetchError::UnknownJob(job_id.clone()))?;

        let output = outputs
            .maps
            .get(map_id)
            .ok_or_else(|| FetchError::UnknownMap {
                job: job_id.clone(),
                map: map_id.clone(),
            })?;

        if outputs.num_reduce_tasks > 0 && reduce >= outputs.num_reduce_tasks {
            return Err(FetchError::NoSuchPartition {
                map: map_id.clone(),
                reduce,
            });
        }
        Ok(output.clone())
    }

    pub fn record_fetch(&self, job_id: &JobId, bytes_sent: u64) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        // The job may have finished while the chunk was in flight
        if let Some(outputs) = jobs.get_mut(job_id) {
            outputs.stats.requests += 1;
            outputs.stats.bytes_sent += bytes_sent;
        }
    }

    pub fn stats(&self, job_id: &JobId) -> Option<FetchStats> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.get(job_id).map(|outputs| outputs.stats)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn map_count(&self, job_id: &JobId) -> usize {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.get(job_id).map_or(0, |outputs| outputs.maps.len())
    }
}
