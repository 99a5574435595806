// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use shuffle_mof_server::{
    FetchError, FetchReply, FetchRequest, FetchResponse, IndexRecord, MapOutputCatalog, MofClient,
    MofServer, MofSettings, MAX_REQUEST_LINE,
};
use shuffle_provider_core::{
    InMemorySecretManager, JobConf, JobContext, JobId, MapCompletion, ProviderContext,
    ShuffleProvider, TaskId,
};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Fixture {
    dir: TempDir,
    secrets: Arc<InMemorySecretManager>,
    server: MofServer,
}

impl Fixture {
    fn new(chunk_size: usize) -> Self {
        let conf = local_conf(chunk_size);
        let secrets = Arc::new(InMemorySecretManager::new());
        secrets.add_token(JobId::new("J1"), b"job-one-secret".to_vec());

        let mut server = MofServer::from_conf(&conf).unwrap();
        server
            .initialize(ProviderContext::new(Arc::new(conf), secrets.clone()))
            .unwrap();

        Self {
            dir: TempDir::new().unwrap(),
            secrets,
            server,
        }
    }

    fn addr(&self) -> SocketAddr {
        self.server.local_addr().expect("server running")
    }

    /// Registers J1 with one map output whose partitions are `partitions`
    fn serve_map(&mut self, task: &str, partitions: &[&[u8]]) {
        let (data_path, index_path) = write_map_output(self.dir.path(), task, partitions);
        self.server
            .job_init(&JobContext::new(JobId::new("J1"), "alice", partitions.len()))
            .unwrap();
        self.server
            .map_done(&MapCompletion::new(
                "alice",
                JobId::new("J1"),
                TaskId::new(task),
                data_path,
                index_path,
            ))
            .unwrap();
    }

    fn request(&self, task: &str, reduce: usize) -> FetchRequest {
        FetchRequest::signed(
            JobId::new("J1"),
            TaskId::new(task),
            0,
            reduce,
            self.secrets.as_ref(),
        )
        .expect("job has a secret")
    }

    fn fetch(&self, request: &FetchRequest) -> FetchResponse {
        let mut client = MofClient::connect(self.addr(), TIMEOUT).unwrap();
        client.fetch(request).unwrap()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self.server.close();
    }
}

fn local_conf(chunk_size: usize) -> JobConf {
    JobConf::new()
        .with("shuffle.mof.bind.address", "127.0.0.1:0")
        .with("shuffle.mof.chunk.size", chunk_size.to_string())
        .with("shuffle.mof.shutdown.timeout.ms", "1000")
}

/// Writes a data file and an index file with a trailing checksum word
fn write_map_output(dir: &Path, task: &str, partitions: &[&[u8]]) -> (PathBuf, PathBuf) {
    let data_path = dir.join(format!("{}.out", task));
    let index_path = dir.join(format!("{}.out.index", task));

    let mut data = Vec::new();
    let mut index = Vec::new();
    for partition in partitions {
        let record = IndexRecord {
            start_offset: data.len() as u64,
            raw_length: partition.len() as u64,
            part_length: partition.len() as u64,
        };
        index.extend_from_slice(&record.to_bytes());
        data.extend_from_slice(partition);
    }
    index.extend_from_slice(&0xC0FFEEu64.to_be_bytes());

    fs::write(&data_path, data).unwrap();
    fs::write(&index_path, index).unwrap();
    (data_path, index_path)
}

fn expect_data(response: FetchResponse) -> FetchReply {
    match response {
        FetchResponse::Data(reply) => reply,
        FetchResponse::Rejected(reason) => panic!("Expected data, got rejection: {}", reason),
    }
}

fn expect_rejected(response: FetchResponse) -> String {
    match response {
        FetchResponse::Rejected(reason) => reason,
        FetchResponse::Data(reply) => panic!("Expected rejection, got {:?}", reply),
    }
}

// ============================================================
// Serving map output
// ============================================================

#[test]
fn test_serves_requested_partition() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"hello", b"shuffle world"]);

    let reply = expect_data(fixture.fetch(&fixture.request("m1", 1)));

    assert_eq!(reply.data, b"shuffle world");
    assert_eq!(reply.raw_length, 13);
    assert_eq!(reply.part_length, 13);
}

#[test]
fn test_serves_partition_in_chunks() {
    let mut fixture = Fixture::new(4);
    fixture.serve_map("m1", &[b"0123456789"]);

    let first = expect_data(fixture.fetch(&fixture.request("m1", 0)));
    assert_eq!(first.data, b"0123");

    let mut client = MofClient::connect(fixture.addr(), TIMEOUT).unwrap();
    let whole = expect_data(client.fetch_partition(&fixture.request("m1", 0)).unwrap());
    assert_eq!(whole.data, b"0123456789");

    let stats = fixture.server.fetch_stats(&JobId::new("J1")).unwrap();
    assert_eq!(stats.requests, 4);
    assert_eq!(stats.bytes_sent, 14);
}

#[test]
fn test_offset_past_partition_sends_nothing() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"abc"]);

    let mut request = fixture.request("m1", 0);
    request.offset = 10;
    let reply = expect_data(fixture.fetch(&request));

    assert!(reply.data.is_empty());
    assert_eq!(reply.part_length, 3);
}

#[test]
fn test_several_requests_share_one_connection() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"left", b"right"]);

    let mut client = MofClient::connect(fixture.addr(), TIMEOUT).unwrap();
    let left = expect_data(client.fetch(&fixture.request("m1", 0)).unwrap());
    let right = expect_data(client.fetch(&fixture.request("m1", 1)).unwrap());

    assert_eq!(left.data, b"left");
    assert_eq!(right.data, b"right");
}

// ============================================================
// Rejected fetches
// ============================================================

#[test]
fn test_rejects_bad_hash() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"secret data"]);

    let mut request = fixture.request("m1", 0);
    request.hash = "00".repeat(32);

    let reason = expect_rejected(fixture.fetch(&request));
    assert!(reason.contains("failed authentication"));
}

#[test]
fn test_rejects_unknown_map_and_partition() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"only"]);

    let reason = expect_rejected(fixture.fetch(&fixture.request("m9", 0)));
    assert!(reason.contains("map m9 of job J1"));

    let reason = expect_rejected(fixture.fetch(&fixture.request("m1", 3)));
    assert!(reason.contains("no partition 3"));
}

#[test]
fn test_rejects_malformed_request_and_keeps_connection() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"still here"]);

    let mut client = MofClient::connect(fixture.addr(), TIMEOUT).unwrap();
    let mut malformed = fixture.request("m1", 0);
    malformed.job_id = JobId::new("J1:extra");
    let reason = expect_rejected(client.fetch(&malformed).unwrap());
    assert!(reason.contains("malformed request"));

    let reply = expect_data(client.fetch(&fixture.request("m1", 0)).unwrap());
    assert_eq!(reply.data, b"still here");
}

#[test]
fn test_job_done_stops_serving_job() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"gone soon"]);
    expect_data(fixture.fetch(&fixture.request("m1", 0)));

    fixture.server.job_done(&JobId::new("J1")).unwrap();

    let reason = expect_rejected(fixture.fetch(&fixture.request("m1", 0)));
    assert!(reason.contains("job J1 is not served"));
    assert!(fixture.server.fetch_stats(&JobId::new("J1")).is_none());
}

#[test]
fn test_job_done_does_not_touch_map_output_files() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"owned by worker"]);

    fixture.server.job_done(&JobId::new("J1")).unwrap();

    assert!(fixture.dir.path().join("m1.out").exists());
    assert!(fixture.dir.path().join("m1.out.index").exists());
}

#[test]
fn test_overlong_request_line_is_rejected_and_connection_dropped() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"data"]);

    let mut stream = TcpStream::connect_timeout(&fixture.addr(), TIMEOUT).unwrap();
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    stream.write_all(&vec![b'a'; MAX_REQUEST_LINE]).unwrap();

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    reader.read_line(&mut reply).unwrap();
    assert!(reply.starts_with("ERR:malformed request"));
    assert!(reply.contains(&format!("exceeds {} bytes", MAX_REQUEST_LINE)));

    let mut rest = Vec::new();
    assert_eq!(reader.read_to_end(&mut rest).unwrap(), 0);

    // Other connections are unaffected
    let reply = expect_data(fixture.fetch(&fixture.request("m1", 0)));
    assert_eq!(reply.data, b"data");
}

#[test]
fn test_huge_partition_number_is_rejected_for_job_without_reduces() {
    let mut fixture = Fixture::new(1024);
    let (data_path, index_path) = write_map_output(fixture.dir.path(), "m1", &[b"data"]);
    fixture
        .server
        .job_init(&JobContext::new(JobId::new("J1"), "alice", 0))
        .unwrap();
    fixture
        .server
        .map_done(&MapCompletion::new(
            "alice",
            JobId::new("J1"),
            TaskId::new("m1"),
            data_path,
            index_path,
        ))
        .unwrap();

    let mut client = MofClient::connect(fixture.addr(), TIMEOUT).unwrap();
    let reason = expect_rejected(client.fetch(&fixture.request("m1", usize::MAX)).unwrap());
    assert!(reason.contains("no partition"));

    let reply = expect_data(client.fetch(&fixture.request("m1", 0)).unwrap());
    assert_eq!(reply.data, b"data");
}

// ============================================================
// Catalog
// ============================================================

#[test]
fn test_catalog_tracks_map_outputs_per_job() {
    let catalog = MapOutputCatalog::new();
    let job = JobContext::new(JobId::new("J1"), "alice", 2);

    assert!(catalog.register_job(&job));
    assert!(!catalog.register_job(&job));
    catalog
        .add_map_output(&MapCompletion::new(
            "alice",
            JobId::new("J1"),
            TaskId::new("m1"),
            PathBuf::from("m1.out"),
            PathBuf::from("m1.out.index"),
        ))
        .unwrap();

    assert_eq!(catalog.map_count(&JobId::new("J1")), 1);
    assert_eq!(catalog.map_count(&JobId::new("J2")), 0);
    assert!(matches!(
        catalog.lookup(&JobId::new("J1"), &TaskId::new("m1"), 2),
        Err(FetchError::NoSuchPartition { reduce: 2, .. })
    ));

    assert!(catalog.remove_job(&JobId::new("J1")).is_some());
    assert_eq!(catalog.map_count(&JobId::new("J1")), 0);
    assert_eq!(catalog.job_count(), 0);
}

// ============================================================
// Lifecycle
// ============================================================

#[test]
fn test_close_releases_listener() {
    let mut fixture = Fixture::new(1024);
    let addr = fixture.addr();

    fixture.server.close().unwrap();

    assert!(!fixture.server.is_running());
    assert!(fixture.server.local_addr().is_none());
    assert!(TcpStream::connect_timeout(&addr, TIMEOUT).is_err());
}

#[test]
fn test_close_interrupts_idle_connections() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"data"]);
    let mut client = MofClient::connect(fixture.addr(), TIMEOUT).unwrap();
    expect_data(client.fetch(&fixture.request("m1", 0)).unwrap());

    fixture.server.close().unwrap();

    assert!(client.fetch(&fixture.request("m1", 0)).is_err());
}

#[test]
fn test_recycle_after_close_serves_again() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"first life"]);
    fixture.server.close().unwrap();

    let conf = local_conf(1024);
    fixture
        .server
        .initialize(ProviderContext::new(Arc::new(conf), fixture.secrets.clone()))
        .unwrap();

    // Registrations do not survive a recycle
    let reason = expect_rejected(fixture.fetch(&fixture.request("m1", 0)));
    assert!(reason.contains("job J1 is not served"));

    fixture.serve_map("m1", &[b"second life"]);
    let reply = expect_data(fixture.fetch(&fixture.request("m1", 0)));
    assert_eq!(reply.data, b"second life");
}

#[test]
fn test_close_without_initialize_is_noop() {
    let mut server = MofServer::from_conf(&local_conf(1024)).unwrap();

    server.close().unwrap();
    server.close().unwrap();

    assert!(!server.is_running());
}

#[test]
fn test_notifications_require_running_server() {
    let mut server = MofServer::from_conf(&local_conf(1024)).unwrap();

    let result = server.job_init(&JobContext::new(JobId::new("J1"), "alice", 1));

    assert!(result.is_err());
}

#[test]
fn test_initialize_twice_without_close_fails() {
    let mut fixture = Fixture::new(1024);
    let context = ProviderContext::new(Arc::new(local_conf(1024)), fixture.secrets.clone());

    assert!(fixture.server.initialize(context).is_err());
    assert!(fixture.server.is_running());
}

#[test]
fn test_duplicate_job_init_and_unknown_job_done_fail() {
    let mut fixture = Fixture::new(1024);
    fixture.serve_map("m1", &[b"x"]);

    assert!(fixture
        .server
        .job_init(&JobContext::new(JobId::new("J1"), "alice", 1))
        .is_err());
    assert!(fixture.server.job_done(&JobId::new("J7")).is_err());
}

// ============================================================
// Settings
// ============================================================

#[test]
fn test_settings_defaults() {
    let settings = MofSettings::from_conf(&JobConf::new()).unwrap();

    assert_eq!(settings.bind_address, "0.0.0.0:9011".parse::<SocketAddr>().unwrap());
    assert_eq!(settings.chunk_size, 64 * 1024);
    assert_eq!(settings.worker_threads, 2);
    assert_eq!(settings.shutdown_timeout, Duration::from_secs(5));
}

#[test]
fn test_settings_reject_invalid_values() {
    assert!(MofSettings::from_conf(&local_conf(0)).is_err());
    assert!(
        MofSettings::from_conf(&JobConf::new().with("shuffle.mof.bind.address", "nowhere"))
            .is_err()
    );
    assert!(
        MofSettings::from_conf(&JobConf::new().with("shuffle.mof.worker.threads", "-1")).is_err()
    );
}
