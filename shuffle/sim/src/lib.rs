// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod notification_log;
pub use notification_log::{Notification, NotificationLog};

pub mod recording_provider;
pub use recording_provider::{Operation, RecordingProvider};

pub mod sim_registry;
pub use sim_registry::{sim_registry, BROKEN_ID, FAIL_ON_KEY, RECORDING_ID};
