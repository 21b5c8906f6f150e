//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::store::{StoreError, StoreResult};

/// Header size: LSN (8) + CRC (4) + data length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest data section accepted when reading (16 MB)
pub const MAX_ENTRY_SIZE: u32 = 16 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert a full document under `id`
    Insert { id: String, document: String },

    /// Merge `patch` into the document stored under `id`
    Update { id: String, patch: String },

    /// Remove the document stored under `id`
    Delete { id: String },

    /// Remove every document
    Clear,
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode header + data
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        let data = bincode::serialize(&(self.timestamp, &self.operation))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(StoreError::WalWrite(format!(
                "Entry too large: {} bytes (max {})",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_be_bytes());
        bytes.extend_from_slice(&Self::compute_crc(&data).to_be_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Decode a complete entry (header + data), verifying the checksum
    pub fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::WalCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let (lsn, crc, len) = Self::decode_header(&bytes[..HEADER_SIZE]);
        let data = &bytes[HEADER_SIZE..];
        if data.len() != len as usize {
            return Err(StoreError::WalCorruption(format!(
                "Length mismatch: header says {}, got {}",
                len,
                data.len()
            )));
        }

        Self::from_parts(lsn, crc, data)
    }

    /// Split a header into (lsn, crc, data_len)
    pub fn decode_header(header: &[u8]) -> (u64, u32, u32) {
        let mut lsn = [0u8; 8];
        lsn.copy_from_slice(&header[0..8]);
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&header[8..12]);
        let mut len = [0u8; 4];
        len.copy_from_slice(&header[12..16]);

        (
            u64::from_be_bytes(lsn),
            u32::from_be_bytes(crc),
            u32::from_be_bytes(len),
        )
    }

    /// Rebuild an entry from a parsed header and its data section
    pub fn from_parts(lsn: u64, crc: u32, data: &[u8]) -> StoreResult<Self> {
        let actual = Self::compute_crc(data);
        if actual != crc {
            return Err(StoreError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                lsn, crc, actual
            )));
        }

        let (timestamp, operation): (u64, Operation) = bincode::deserialize(data)
            .map_err(|e| StoreError::WalCorruption(format!("LSN {}: {}", lsn, e)))?;

        Ok(Self {
            lsn,
            operation,
            timestamp,
        })
    }

    /// CRC32 over the data section
    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
