// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_mof_server::{MofServer, MOF_PROVIDER_ID};
use shuffle_provider_core::{JobConf, LoaderError, ProviderRegistry};

/// Registry holding every provider shipped with the worker
pub fn default_registry() -> Result<ProviderRegistry, LoaderError> {
    let mut registry = ProviderRegistry::new();
    registry.register(MOF_PROVIDER_ID, |conf: &JobConf| {
        Ok(Box::new(MofServer::from_conf(conf)?) as Box<_>)
    })?;
    Ok(registry)
}
