// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::FetchError;
use shuffle_provider_core::{JobId, JobTokenSecretManager, TaskId};

/// One partition fetch, sent as `<job>:<map>:<offset>:<reduce>:<hash>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub job_id: JobId,
    pub map_id: TaskId,
    /// Byte offset into the partition, for fetching it in chunks
    pub offset: u64,
    pub reduce: usize,
    pub hash: String,
}

impl FetchRequest {
    /// Build a request signed with the job's secret
    /// Returns None if the secret manager has no secret for the job
    pub fn signed(
        job_id: JobId,
        map_id: TaskId,
        offset: u64,
        reduce: usize,
        secrets: &dyn JobTokenSecretManager,
    ) -> Option<Self> {
        let message = Self::hash_message(&job_id, &map_id, reduce);
        let hash = secrets.compute_hash(&job_id, message.as_bytes())?;
        Some(Self {
            job_id,
            map_id,
            offset,
            reduce,
            hash,
        })
    }

    pub fn parse(line: &str) -> Result<Self, FetchError> {
        let fields: Vec<&str> = line.trim_end().split(':').collect();
        if fields.len() != 5 {
            return Err(FetchError::Malformed(format!(
                "expected 5 fields, got {}",
                fields.len()
            )));
        }
        if fields[0].is_empty() || fields[1].is_empty() {
            return Err(FetchError::Malformed("empty job or map id".to_string()));
        }

        let offset = fields[2]
            .parse()
            .map_err(|_| FetchError::Malformed(format!("bad offset '{}'", fields[2])))?;
        let reduce = fields[3]
            .parse()
            .map_err(|_| FetchError::Malformed(format!("bad reduce '{}'", fields[3])))?;

        Ok(Self {
            job_id: JobId::new(fields[0]),
            map_id: TaskId::new(fields[1]),
            offset,
            reduce,
            hash: fields[4].to_string(),
        })
    }

    /// Text covered by the request hash. The offset is left out so one
    /// hash authorizes every chunk of a partition.
    pub fn hash_message(job_id: &JobId, map_id: &TaskId, reduce: usize) -> String {
        format!("{}:{}:{}", job_id, map_id, reduce)
    }

    pub fn verify(&self, secrets: &dyn JobTokenSecretManager) -> bool {
        let message = Self::hash_message(&self.job_id, &self.map_id, self.reduce);
        secrets.verify_hash(&self.job_id, message.as_bytes(), &self.hash)
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}\n",
            self.job_id, self.map_id, self.offset, self.reduce, self.hash
        )
    }
}
