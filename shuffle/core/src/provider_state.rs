// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt;

/// Lifecycle state of a provider instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// Constructed, never initialized
    Uninitialized,
    /// Initialized with no open job
    Initialized,
    /// At least one job between `job_init` and `job_done`
    JobActive,
    /// Closed; may be initialized again
    Closed,
}

impl ProviderState {
    pub fn accepts_notifications(self) -> bool {
        matches!(self, ProviderState::Initialized | ProviderState::JobActive)
    }

    pub fn can_initialize(self) -> bool {
        matches!(self, ProviderState::Uninitialized | ProviderState::Closed)
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderState::Uninitialized => "uninitialized",
            ProviderState::Initialized => "initialized",
            ProviderState::JobActive => "job-active",
            ProviderState::Closed => "closed",
        };
        f.write_str(name)
    }
}
