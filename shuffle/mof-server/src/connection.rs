// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{FetchError, FetchRequest, IndexRecord, MapOutputCatalog};
use shuffle_provider_core::JobTokenSecretManager;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

/// Longest request line accepted, newline included
pub const MAX_REQUEST_LINE: usize = 4096;

/// State shared by the accept loop and every connection task
pub(crate) struct ServerShared {
    pub catalog: Arc<MapOutputCatalog>,
    pub secrets: Arc<dyn JobTokenSecretManager>,
    pub chunk_size: usize,
}

pub(crate) async fn accept_loop(
    listener: TcpListener,
    shared: Arc<ServerShared>,
    shutdown: CancellationToken,
) {
    let mut incoming = TcpListenerStream::new(listener);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            next = incoming.next() => match next {
                Some(Ok(stream)) => {
                    tokio::spawn(serve_connection(stream, Arc::clone(&shared), shutdown.clone()));
                }
                Some(Err(e)) => tracing::warn!("failed to accept shuffle connection: {e}"),
                None => break,
            },
        }
    }

    tracing::debug!("mof server stopped accepting connections");
}

async fn serve_connection(stream: TcpStream, shared: Arc<ServerShared>, shutdown: CancellationToken) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = read_request_line(&mut reader) => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("connection from {peer} failed: {e}");
                break;
            }
        };

        let line = match line {
            RequestLine::Complete(line) => line,
            RequestLine::TooLong => {
                tracing::debug!("dropping connection from {peer}: request line too long");
                let reply = format!(
                    "ERR:{}\n",
                    FetchError::Malformed(format!(
                        "request line exceeds {} bytes",
                        MAX_REQUEST_LINE
                    ))
                );
                let _ = writer.write_all(reply.as_bytes()).await;
                let _ = writer.shutdown().await;
                break;
            }
        };

        let reply = match shared.handle(&line).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!("rejected fetch from {peer}: {e}");
                format!("ERR:{}\n", e).into_bytes()
            }
        };

        if writer.write_all(&reply).await.is_err() {
            break;
        }
    }
}

enum RequestLine {
    Complete(String),
    TooLong,
}

/// Read one request line without buffering more than `MAX_REQUEST_LINE` bytes.
/// Returns Ok(None) at end of stream.
async fn read_request_line(
    reader: &mut BufReader<OwnedReadHalf>,
) -> std::io::Result<Option<RequestLine>> {
    let mut buf = Vec::with_capacity(128);
    let read = reader
        .take(MAX_REQUEST_LINE as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && buf.len() >= MAX_REQUEST_LINE {
        return Ok(Some(RequestLine::TooLong));
    }

    Ok(Some(RequestLine::Complete(
        String::from_utf8_lossy(&buf).into_owned(),
    )))
}

impl ServerShared {
    /// Answer one request line with `<raw>:<part>:<sent>:\n` and the bytes
    async fn handle(&self, line: &str) -> Result<Vec<u8>, FetchError> {
        let request = FetchRequest::parse(line)?;
        if !request.verify(self.secrets.as_ref()) {
            return Err(FetchError::Unauthorized(request.job_id));
        }

        let output = self
            .catalog
            .lookup(&request.job_id, &request.map_id, request.reduce)?;
        let record = IndexRecord::read(&output.index_path, request.reduce)
            .await?
            .ok_or_else(|| FetchError::NoSuchPartition {
                map: request.map_id.clone(),
                reduce: request.reduce,
            })?;

        let remaining = record.part_length.saturating_sub(request.offset);
        let length = remaining.min(self.chunk_size as u64) as usize;
        let mut data = vec![0u8; length];
        if length > 0 {
            let mut file = File::open(&output.data_path).await?;
            file.seek(SeekFrom::Start(record.start_offset + request.offset))
                .await?;
            file.read_exact(&mut data).await?;
        }

        self.catalog.record_fetch(&request.job_id, length as u64);

        let mut reply =
            format!("{}:{}:{}:\n", record.raw_length, record.part_length, length).into_bytes();
        reply.extend_from_slice(&data);
        Ok(reply)
    }
}
