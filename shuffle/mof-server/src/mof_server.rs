// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::connection::{accept_loop, ServerShared};
use crate::{FetchStats, MapOutputCatalog, MofSettings};
use shuffle_provider_core::{
    JobConf, JobContext, JobId, MapCompletion, ProviderContext, ProviderError, ShuffleProvider,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

/// Registry identifier of the MOF server
pub const MOF_PROVIDER_ID: &str = "mof";

/// Shuffle provider serving map output files over TCP.
///
/// Each `initialize` builds a dedicated tokio runtime and listener; `close`
/// cancels every task and tears the runtime down within the configured
/// shutdown timeout, so a later `initialize` starts from nothing.
/// Lifecycle calls must come from outside any tokio runtime.
pub struct MofServer {
    settings: MofSettings,
    running: Option<RunningServer>,
}

struct RunningServer {
    runtime: Runtime,
    shutdown: CancellationToken,
    local_addr: SocketAddr,
    catalog: Arc<MapOutputCatalog>,
}

impl MofServer {
    pub fn new(settings: MofSettings) -> Self {
        Self {
            settings,
            running: None,
        }
    }

    pub fn from_conf(conf: &JobConf) -> Result<Self, ProviderError> {
        Ok(Self::new(MofSettings::from_conf(conf)?))
    }

    pub fn settings(&self) -> &MofSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Address the listener is bound to while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    pub fn fetch_stats(&self, job_id: &JobId) -> Option<FetchStats> {
        self.running
            .as_ref()
            .and_then(|running| running.catalog.stats(job_id))
    }

    fn running(&self, operation: &str) -> Result<&RunningServer, ProviderError> {
        self.running
            .as_ref()
            .ok_or_else(|| ProviderError::Internal(format!("mof server not running, cannot {operation}")))
    }

    fn start(&self, context: &ProviderContext) -> Result<RunningServer, ProviderError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.settings.worker_threads)
            .thread_name("mof-server")
            .enable_all()
            .build()?;

        let std_listener = std::net::TcpListener::bind(self.settings.bind_address)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;
        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(std_listener)?
        };

        let catalog = Arc::new(MapOutputCatalog::new());
        let shared = Arc::new(ServerShared {
            catalog: Arc::clone(&catalog),
            secrets: context.secret_manager(),
            chunk_size: self.settings.chunk_size,
        });
        let shutdown = CancellationToken::new();
        runtime.spawn(accept_loop(listener, shared, shutdown.clone()));

        Ok(RunningServer {
            runtime,
            shutdown,
            local_addr,
            catalog,
        })
    }
}

impl ShuffleProvider for MofServer {
    fn name(&self) -> &str {
        "mof-server"
    }

    fn initialize(&mut self, context: ProviderContext) -> Result<(), ProviderError> {
        if self.running.is_some() {
            return Err(ProviderError::Internal(
                "mof server is already running".to_string(),
            ));
        }

        let running = self.start(&context)?;
        tracing::info!("mof server listening on {}", running.local_addr);
        self.running = Some(running);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProviderError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.shutdown.cancel();
        let open_jobs = running.catalog.job_count();
        running.runtime.shutdown_timeout(self.settings.shutdown_timeout);
        tracing::info!(
            "mof server on {} stopped ({} job(s) still registered)",
            running.local_addr,
            open_jobs
        );
        Ok(())
    }

    fn job_init(&mut self, job: &JobContext) -> Result<(), ProviderError> {
        let running = self.running("register a job")?;
        if !running.catalog.register_job(job) {
            return Err(ProviderError::DuplicateJob(job.job_id.clone()));
        }
        tracing::debug!(
            "mof server serving job {} for {} ({} partitions)",
            job.job_id,
            job.user,
            job.num_reduce_tasks
        );
        Ok(())
    }

    fn map_done(&mut self, completion: &MapCompletion) -> Result<(), ProviderError> {
        let running = self.running("register a map output")?;
        running.catalog.add_map_output(completion)?;
        tracing::debug!(
            "mof server serving map {} of job {}",
            completion.task_id(),
            completion.job_id()
        );
        Ok(())
    }

    fn job_done(&mut self, job_id: &JobId) -> Result<(), ProviderError> {
        let running = self.running("release a job")?;
        let stats = running
            .catalog
            .remove_job(job_id)
            .ok_or_else(|| ProviderError::UnknownJob(job_id.clone()))?;
        tracing::info!(
            "job {} released by mof server: {} fetch(es), {} byte(s) sent",
            job_id,
            stats.requests,
            stats.bytes_sent
        );
        Ok(())
    }
}
