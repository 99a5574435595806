// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_provider_core::{ConfigError, JobConf};
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDRESS: ([u8; 4], u16) = ([0, 0, 0, 0], 9011);
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_WORKER_THREADS: usize = 2;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MofSettings {
    pub bind_address: SocketAddr,
    /// Largest number of partition bytes sent for one request
    pub chunk_size: usize,
    pub worker_threads: usize,
    /// Upper bound on how long `close` waits for connection tasks
    pub shutdown_timeout: Duration,
}

impl MofSettings {
    pub const BIND_ADDRESS_KEY: &'static str = "shuffle.mof.bind.address";
    pub const CHUNK_SIZE_KEY: &'static str = "shuffle.mof.chunk.size";
    pub const WORKER_THREADS_KEY: &'static str = "shuffle.mof.worker.threads";
    pub const SHUTDOWN_TIMEOUT_KEY: &'static str = "shuffle.mof.shutdown.timeout.ms";

    pub fn from_conf(conf: &JobConf) -> Result<Self, ConfigError> {
        let bind_address = conf
            .get_parsed(Self::BIND_ADDRESS_KEY)?
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDRESS));
        let chunk_size = positive(conf, Self::CHUNK_SIZE_KEY, DEFAULT_CHUNK_SIZE)?;
        let worker_threads = positive(conf, Self::WORKER_THREADS_KEY, DEFAULT_WORKER_THREADS)?;
        let shutdown_timeout_ms =
            conf.get_parsed_or(Self::SHUTDOWN_TIMEOUT_KEY, DEFAULT_SHUTDOWN_TIMEOUT_MS)?;

        Ok(Self {
            bind_address,
            chunk_size,
            worker_threads,
            shutdown_timeout: Duration::from_millis(shutdown_timeout_ms),
        })
    }
}

fn positive(conf: &JobConf, key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = conf.get_parsed_or(key, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
