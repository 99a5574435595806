// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::FetchRequest;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// One chunk of a partition as returned by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReply {
    pub raw_length: u64,
    pub part_length: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    Data(FetchReply),
    Rejected(String),
}

/// Blocking fetch client, used by tools and tests
pub struct MofClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl MofClient {
    pub fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    pub fn fetch(&mut self, request: &FetchRequest) -> io::Result<FetchResponse> {
        self.writer.write_all(request.to_line().as_bytes())?;
        self.writer.flush()?;

        let mut header = String::new();
        if self.reader.read_line(&mut header)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        let header = header.trim_end();

        if let Some(reason) = header.strip_prefix("ERR:") {
            return Ok(FetchResponse::Rejected(reason.to_string()));
        }

        let fields: Vec<&str> = header.split(':').collect();
        if fields.len() != 4 {
            return Err(invalid_header(header));
        }
        let parse = |field: &str| field.parse::<u64>().map_err(|_| invalid_header(header));
        let raw_length = parse(fields[0])?;
        let part_length = parse(fields[1])?;
        let sent = parse(fields[2])?;

        let mut data = vec![0u8; sent as usize];
        self.reader.read_exact(&mut data)?;
        Ok(FetchResponse::Data(FetchReply {
            raw_length,
            part_length,
            data,
        }))
    }

    /// Fetch a whole partition chunk by chunk, starting at `request.offset`
    pub fn fetch_partition(&mut self, request: &FetchRequest) -> io::Result<FetchResponse> {
        let mut request = request.clone();
        let mut collected = Vec::new();

        loop {
            let reply = match self.fetch(&request)? {
                FetchResponse::Data(reply) => reply,
                rejected => return Ok(rejected),
            };
            let done = reply.data.is_empty()
                || request.offset + reply.data.len() as u64 >= reply.part_length;
            request.offset += reply.data.len() as u64;
            collected.extend_from_slice(&reply.data);

            if done {
                return Ok(FetchResponse::Data(FetchReply {
                    raw_length: reply.raw_length,
                    part_length: reply.part_length,
                    data: collected,
                }));
            }
        }
    }
}

fn invalid_header(header: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("malformed reply header '{}'", header),
    )
}
