// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{JobConf, JobTokenSecretManager};
use std::fmt;
use std::sync::Arc;

/// Worker-owned dependencies handed to a provider at initialization.
/// Both are shared read-only; providers keep clones of the `Arc`s at most.
#[derive(Clone)]
pub struct ProviderContext {
    conf: Arc<JobConf>,
    secret_manager: Arc<dyn JobTokenSecretManager>,
}

impl ProviderContext {
    pub fn new(conf: Arc<JobConf>, secret_manager: Arc<dyn JobTokenSecretManager>) -> Self {
        Self {
            conf,
            secret_manager,
        }
    }

    /// Active worker configuration
    pub fn conf(&self) -> &JobConf {
        &self.conf
    }

    /// Token secret manager used to authenticate shuffle fetches
    pub fn secret_manager(&self) -> Arc<dyn JobTokenSecretManager> {
        Arc::clone(&self.secret_manager)
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("conf", &self.conf)
            .finish_non_exhaustive()
    }
}
