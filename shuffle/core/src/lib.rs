// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod ids;
pub use ids::{JobId, TaskId};

mod job_context;
pub use job_context::JobContext;

mod map_completion;
pub use map_completion::MapCompletion;

mod job_conf;
pub use job_conf::{ConfigError, JobConf};

pub mod secret_manager;
pub use secret_manager::JobTokenSecretManager;

pub mod in_memory_secret_manager;
pub use in_memory_secret_manager::InMemorySecretManager;

mod provider_context;
pub use provider_context::ProviderContext;

mod provider_error;
pub use provider_error::ProviderError;

mod provider_state;
pub use provider_state::ProviderState;

mod shuffle_provider;
pub use shuffle_provider::ShuffleProvider;

mod managed_provider;
pub use managed_provider::ManagedProvider;

mod loader_error;
pub use loader_error::LoaderError;

mod provider_registry;
pub use provider_registry::{ProviderFactory, ProviderRegistry};
