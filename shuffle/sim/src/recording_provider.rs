// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Notification, NotificationLog};
use shuffle_provider_core::{
    JobConf, JobContext, JobId, MapCompletion, ProviderContext, ProviderError, ShuffleProvider,
};

/// Lifecycle call a recording provider can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Close,
    JobInit,
    MapDone,
    JobDone,
}

/// Provider that records every call it receives into a shared log.
///
/// It also holds a fake "resource" between `initialize` and `close` so tests
/// can observe leaks across a recycle cycle.
pub struct RecordingProvider {
    log: NotificationLog,
    conf: JobConf,
    context: Option<ProviderContext>,
    fail_on: Option<Operation>,
    initializations: usize,
}

impl RecordingProvider {
    /// Construct and apply configuration, the way a registry factory does
    pub fn from_conf(conf: &JobConf, log: NotificationLog) -> Self {
        log.push(Notification::Configured(conf.clone()));
        Self {
            log,
            conf: conf.clone(),
            context: None,
            fail_on: None,
            initializations: 0,
        }
    }

    pub fn failing_on(mut self, operation: Operation) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn conf(&self) -> &JobConf {
        &self.conf
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    pub fn initializations(&self) -> usize {
        self.initializations
    }

    fn check(&self, operation: Operation) -> Result<(), ProviderError> {
        if self.fail_on == Some(operation) {
            Err(ProviderError::Internal(format!("injected {:?} failure", operation)))
        } else {
            Ok(())
        }
    }
}

impl ShuffleProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    fn initialize(&mut self, context: ProviderContext) -> Result<(), ProviderError> {
        self.log.push(Notification::Initialize);
        self.check(Operation::Initialize)?;
        if self.context.is_some() {
            return Err(ProviderError::Internal(
                "initialized twice without close".to_string(),
            ));
        }
        self.context = Some(context);
        self.initializations += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProviderError> {
        self.log.push(Notification::Close);
        self.context = None;
        self.check(Operation::Close)
    }

    fn job_init(&mut self, job: &JobContext) -> Result<(), ProviderError> {
        self.log.push(Notification::JobInit(job.job_id.clone()));
        self.check(Operation::JobInit)
    }

    fn map_done(&mut self, completion: &MapCompletion) -> Result<(), ProviderError> {
        self.log.push(Notification::MapDone {
            user: completion.user().to_string(),
            job_id: completion.job_id().clone(),
            task_id: completion.task_id().clone(),
            data_path: completion.data_path().to_path_buf(),
            index_path: completion.index_path().to_path_buf(),
        });
        self.check(Operation::MapDone)
    }

    fn job_done(&mut self, job_id: &JobId) -> Result<(), ProviderError> {
        self.log.push(Notification::JobDone(job_id.clone()));
        self.check(Operation::JobDone)
    }
}
