// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{JobConf, LoaderError, ManagedProvider, ProviderError, ShuffleProvider};
use std::collections::BTreeMap;
use std::fmt;

/// Constructor for one provider implementation. Receives the worker
/// configuration so the instance is configured before it is returned.
pub type ProviderFactory =
    Box<dyn Fn(&JobConf) -> Result<Box<dyn ShuffleProvider>, ProviderError> + Send + Sync>;

/// Maps configuration identifiers to provider constructors
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. Identifiers must be non-blank and unique.
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F) -> Result<(), LoaderError>
    where
        F: Fn(&JobConf) -> Result<Box<dyn ShuffleProvider>, ProviderError> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        if identifier.trim().is_empty() || identifier.trim() != identifier {
            return Err(LoaderError::InvalidIdentifier(identifier));
        }
        if self.factories.contains_key(&identifier) {
            return Err(LoaderError::DuplicateRegistration(identifier));
        }

        self.factories.insert(identifier, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the provider named by `identifier`.
    ///
    /// # Returns
    /// * `Ok(None)` - No identifier configured; only the default transport runs
    /// * `Ok(Some(provider))` - Constructed and configured, not yet initialized
    /// * `Err(LoaderError)` - Unknown identifier or constructor failure
    pub fn resolve(
        &self,
        identifier: Option<&str>,
        conf: &JobConf,
    ) -> Result<Option<ManagedProvider>, LoaderError> {
        let Some(identifier) = identifier.map(str::trim).filter(|id| !id.is_empty()) else {
            tracing::debug!("no additional shuffle provider configured");
            return Ok(None);
        };

        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| LoaderError::UnknownProvider {
                identifier: identifier.to_string(),
                available: self.available(),
            })?;

        let provider = factory(conf).map_err(|source| LoaderError::Construction {
            identifier: identifier.to_string(),
            source,
        })?;

        tracing::info!(
            "loaded shuffle provider '{}' ({})",
            identifier,
            provider.name()
        );
        Ok(Some(ManagedProvider::new(identifier, provider)))
    }

    /// Resolve the identifier stored in the configuration itself
    pub fn resolve_configured(&self, conf: &JobConf) -> Result<Option<ManagedProvider>, LoaderError> {
        self.resolve(conf.shuffle_provider(), conf)
    }

    fn available(&self) -> String {
        if self.factories.is_empty() {
            "none".to_string()
        } else {
            self.identifiers().collect::<Vec<_>>().join(", ")
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("identifiers", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
