// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{JobId, JobTokenSecretManager};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::RwLock;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 secret manager keeping job secrets in memory
#[derive(Default)]
pub struct InMemorySecretManager {
    secrets: RwLock<HashMap<JobId, Vec<u8>>>,
}

impl InMemorySecretManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&self, job_id: JobId, secret: Vec<u8>) {
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        secrets.insert(job_id, secret);
    }

    pub fn remove_token(&self, job_id: &JobId) -> bool {
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        secrets.remove(job_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.secrets.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mac(&self, job_id: &JobId, message: &[u8]) -> Option<HmacSha256> {
        let secret = self.retrieve_secret(job_id)?;
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&secret).ok()?;
        mac.update(message);
        Some(mac)
    }
}

impl JobTokenSecretManager for InMemorySecretManager {
    fn retrieve_secret(&self, job_id: &JobId) -> Option<Vec<u8>> {
        let secrets = self.secrets.read().unwrap_or_else(|e| e.into_inner());
        secrets.get(job_id).cloned()
    }

    fn compute_hash(&self, job_id: &JobId, message: &[u8]) -> Option<String> {
        let digest = self.mac(job_id, message)?.finalize().into_bytes();
        Some(encode_hex(&digest))
    }

    fn verify_hash(&self, job_id: &JobId, message: &[u8], hash: &str) -> bool {
        let Some(expected) = decode_hex(hash) else {
            return false;
        };
        match self.mac(job_id, message) {
            Some(mac) => mac.verify_slice(&expected).is_ok(),
            None => false,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
