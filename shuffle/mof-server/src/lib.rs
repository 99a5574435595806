// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod fetch_error;
pub use fetch_error::FetchError;

mod fetch_request;
pub use fetch_request::FetchRequest;

mod index_record;
pub use index_record::{IndexRecord, INDEX_RECORD_LENGTH};

mod map_output_catalog;
pub use map_output_catalog::{FetchStats, MapOutput, MapOutputCatalog};

mod mof_settings;
pub use mof_settings::MofSettings;

mod connection;
pub use connection::MAX_REQUEST_LINE;

mod mof_server;
pub use mof_server::{MofServer, MOF_PROVIDER_ID};

mod mof_client;
pub use mof_client::{FetchReply, FetchResponse, MofClient};
