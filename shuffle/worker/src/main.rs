// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use shuffle_provider_core::{JobConf, JobContext, JobId, TaskId};
use shuffle_worker::{default_registry, generate_job_secret, ShuffleWorker, TaskAttempt};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shuffle-worker", about = "Runs a demo job through the shuffle provider lifecycle")]
struct Args {
    /// JSON property file with the worker configuration
    #[arg(long, default_value = "worker.json")]
    config: PathBuf,

    /// Overrides mapreduce.shuffle.provider.plugin
    #[arg(long)]
    provider: Option<String>,

    #[arg(long, default_value = "job_local_0001")]
    job: String,

    #[arg(long, default_value = "hadoop")]
    user: String,

    #[arg(long, default_value_t = 2)]
    maps: usize,

    #[arg(long, default_value_t = 2)]
    reduces: usize,

    #[arg(long, default_value_t = 1_000)]
    words_per_map: usize,

    /// Keep the job open until Ctrl+C so reducers can fetch its outputs
    #[arg(long)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut conf = match JobConf::load(&args.config) {
        Ok(conf) => conf,
        Err(e) => {
            warn!("{}; using default configuration", e);
            JobConf::new()
        }
    };
    if let Some(provider) = &args.provider {
        conf.set(JobConf::SHUFFLE_PROVIDER_KEY, provider.as_str());
    }
    if conf.local_dir().is_none() {
        let local_dir = std::env::temp_dir().join("shuffle-worker");
        conf.set(JobConf::LOCAL_DIR_KEY, local_dir.to_string_lossy());
    }

    let registry = default_registry()?;
    let mut worker =
        ShuffleWorker::new(conf, &registry).context("failed to load shuffle provider")?;
    if let Some(provider) = worker.provider() {
        info!("additional shuffle provider: {} ({})", provider.id(), provider.name());
    }

    let result = worker
        .initialize()
        .map_err(anyhow::Error::from)
        .and_then(|()| run_demo_job(&mut worker, &args));
    worker.close();
    result
}

fn run_demo_job(worker: &mut ShuffleWorker, args: &Args) -> anyhow::Result<()> {
    let job_id = JobId::new(args.job.as_str());
    let job = JobContext::new(job_id.clone(), args.user.as_str(), args.reduces);
    worker.localize_job(job, generate_job_secret())?;

    let mut rng = rand::rng();
    for map in 0..args.maps {
        let task = TaskAttempt::map(
            job_id.clone(),
            TaskId::new(format!("attempt_{}_m_{:06}_0", args.job, map)),
            args.user.as_str(),
        );

        let partitions = generate_partitions(&mut rng, args.words_per_map, args.reduces);
        let output = worker.map_output_file(&task)?;
        output
            .write(&partitions)
            .with_context(|| format!("failed to write map output of {}", task.task_id))?;
        info!(
            "map {} wrote {} bytes to {}",
            task.task_id,
            partitions.iter().map(Vec::len).sum::<usize>(),
            output.data_path.display()
        );

        worker.task_done(&task)?;
    }

    if args.serve {
        let (tx, rx) = mpsc::channel();
        ctrlc::set_handler(move || {
            let _ = tx.send(());
        })?;
        info!("job {} serving map outputs, press Ctrl+C to finish", job_id);
        rx.recv()?;
    }

    for reduce in 0..args.reduces {
        let task = TaskAttempt::reduce(
            job_id.clone(),
            TaskId::new(format!("attempt_{}_r_{:06}_0", args.job, reduce)),
            args.user.as_str(),
        );
        worker.task_done(&task)?;
    }

    worker.job_done(&job_id)?;
    Ok(())
}

/// Random lowercase words, one per line, split over `reduces` partitions by length
fn generate_partitions(rng: &mut impl Rng, words: usize, reduces: usize) -> Vec<Vec<u8>> {
    let count = reduces.max(1);
    let mut partitions = vec![Vec::new(); count];
    for _ in 0..words {
        let len = rng.random_range(1..=12);
        let word: String = (0..len)
            .map(|_| (b'a' + rng.random_range(0..26u8)) as char)
            .collect();
        let partition = &mut partitions[len % count];
        partition.extend_from_slice(word.as_bytes());
        partition.push(b'\n');
    }
    partitions
}
