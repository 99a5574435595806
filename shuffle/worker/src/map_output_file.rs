// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::WorkerError;
use shuffle_mof_server::IndexRecord;
use shuffle_provider_core::{JobId, TaskId};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// On-disk location of a map task's output under the worker's local dir:
/// `<local>/taskTracker/<user>/jobcache/<job>/<task>/output/file.out[.index]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutputFile {
    pub data_path: PathBuf,
    pub index_path: PathBuf,
}

impl MapOutputFile {
    /// Reject names that would not stay one directory level below their parent
    pub fn check_component(kind: &'static str, value: &str) -> Result<(), WorkerError> {
        let single_level = !value.is_empty()
            && value != "."
            && value != ".."
            && !value.contains(['/', '\\'])
            && Path::new(value).components().count() == 1;
        if single_level {
            Ok(())
        } else {
            Err(WorkerError::InvalidPathComponent {
                kind,
                value: value.to_string(),
            })
        }
    }

    pub fn job_dir(local_dir: &Path, user: &str, job_id: &JobId) -> PathBuf {
        local_dir
            .join("taskTracker")
            .join(user)
            .join("jobcache")
            .join(job_id.as_str())
    }

    pub fn for_task(local_dir: &Path, user: &str, job_id: &JobId, task_id: &TaskId) -> Self {
        let output_dir = Self::job_dir(local_dir, user, job_id)
            .join(task_id.as_str())
            .join("output");
        Self {
            data_path: output_dir.join("file.out"),
            index_path: output_dir.join("file.out.index"),
        }
    }

    /// Write one data file holding `partitions` back to back, and its index
    pub fn write(&self, partitions: &[Vec<u8>]) -> io::Result<()> {
        if let Some(parent) = self.data_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut data = Vec::new();
        let mut index = Vec::with_capacity(partitions.len() * 24);
        for partition in partitions {
            let record = IndexRecord {
                start_offset: data.len() as u64,
                raw_length: partition.len() as u64,
                part_length: partition.len() as u64,
            };
            index.extend_from_slice(&record.to_bytes());
            data.extend_from_slice(partition);
        }

        fs::write(&self.data_path, data)?;
        fs::write(&self.index_path, index)
    }
}
