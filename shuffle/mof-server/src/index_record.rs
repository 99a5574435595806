// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Size of one partition entry in a map output index file
pub const INDEX_RECORD_LENGTH: u64 = 24;

/// Location of one reduce partition inside a map output data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub start_offset: u64,
    /// Uncompressed length of the partition
    pub raw_length: u64,
    /// Length of the partition as stored on disk
    pub part_length: u64,
}

impl IndexRecord {
    pub fn to_bytes(self) -> [u8; INDEX_RECORD_LENGTH as usize] {
        let mut bytes = [0u8; INDEX_RECORD_LENGTH as usize];
        bytes[0..8].copy_from_slice(&(self.start_offset as i64).to_be_bytes());
        bytes[8..16].copy_from_slice(&(self.raw_length as i64).to_be_bytes());
        bytes[16..24].copy_from_slice(&(self.part_length as i64).to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; INDEX_RECORD_LENGTH as usize]) -> io::Result<Self> {
        let field = |range: std::ops::Range<usize>| -> io::Result<u64> {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[range]);
            u64::try_from(i64::from_be_bytes(raw))
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative index field"))
        };

        Ok(Self {
            start_offset: field(0..8)?,
            raw_length: field(8..16)?,
            part_length: field(16..24)?,
        })
    }

    /// Read the entry of partition `reduce`.
    /// Returns Ok(None) if the index file holds fewer partitions.
    pub async fn read(index_path: &Path, reduce: usize) -> io::Result<Option<Self>> {
        let Some(position) = (reduce as u64).checked_mul(INDEX_RECORD_LENGTH) else {
            return Ok(None);
        };
        let Some(end) = position.checked_add(INDEX_RECORD_LENGTH) else {
            return Ok(None);
        };

        let mut file = File::open(index_path).await?;
        // Any trailing checksum is shorter than a record and never matched here
        if file.metadata().await?.len() < end {
            return Ok(None);
        }

        file.seek(SeekFrom::Start(position)).await?;
        let mut bytes = [0u8; INDEX_RECORD_LENGTH as usize];
        file.read_exact(&mut bytes).await?;
        Self::from_bytes(&bytes).map(Some)
    }
}
