// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("no shuffle provider registered as '{identifier}' (available: {available})")]
    UnknownProvider {
        identifier: String,
        available: String,
    },

    #[error("failed to construct shuffle provider '{identifier}': {source}")]
    Construction {
        identifier: String,
        #[source]
        source: ProviderError,
    },

    #[error("shuffle provider '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("invalid shuffle provider identifier '{0}'")]
    InvalidIdentifier(String),
}
