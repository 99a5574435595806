// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod task_attempt;
pub use task_attempt::{TaskAttempt, TaskKind};

mod map_output_file;
pub use map_output_file::MapOutputFile;

mod worker_error;
pub use worker_error::WorkerError;

mod shuffle_worker;
pub use shuffle_worker::{generate_job_secret, ShuffleWorker};

mod registry;
pub use registry::default_registry;
