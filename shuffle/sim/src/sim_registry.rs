// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{NotificationLog, Operation, RecordingProvider};
use shuffle_provider_core::{ConfigError, JobConf, LoaderError, ProviderError, ProviderRegistry};

pub const RECORDING_ID: &str = "recording";
/// Identifier whose constructor always fails
pub const BROKEN_ID: &str = "broken";

/// Configuration key selecting a lifecycle call the recording provider fails
pub const FAIL_ON_KEY: &str = "shuffle.sim.fail.on";

/// Registry with a recording provider writing into `log` and a provider
/// that cannot be constructed
pub fn sim_registry(log: NotificationLog) -> Result<ProviderRegistry, LoaderError> {
    let mut registry = ProviderRegistry::new();

    registry
        .register(RECORDING_ID, move |conf: &JobConf| {
            let mut provider = RecordingProvider::from_conf(conf, log.clone());
            if let Some(operation) = conf.get(FAIL_ON_KEY) {
                provider = provider.failing_on(parse_operation(operation)?);
            }
            Ok(Box::new(provider) as Box<_>)
        })?;

    registry
        .register(BROKEN_ID, |_conf: &JobConf| {
            Err(ProviderError::Internal(
                "constructor is not accessible".to_string(),
            ))
        })?;

    Ok(registry)
}

fn parse_operation(value: &str) -> Result<Operation, ProviderError> {
    match value {
        "initialize" => Ok(Operation::Initialize),
        "close" => Ok(Operation::Close),
        "job_init" => Ok(Operation::JobInit),
        "map_done" => Ok(Operation::MapDone),
        "job_done" => Ok(Operation::JobDone),
        other => Err(ConfigError::InvalidValue {
            key: FAIL_ON_KEY.to_string(),
            value: other.to_string(),
            reason: "unknown lifecycle operation".to_string(),
        }
        .into()),
    }
}
