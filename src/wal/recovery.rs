//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::store::StoreResult;

use super::{WalEntry, WalReader, WalRecord};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Detect and skip corrupted entries
    /// 3. Truncate partial writes at end
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> StoreResult<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, partial_at, mut result) = Self::scan(path)?;

        if let Some(offset) = partial_at {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset)?;
            file.sync_all()?;
            result.was_truncated = true;
            tracing::warn!("Truncated partial WAL tail at offset {}", offset);
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> StoreResult<RecoveryResult> {
        let (_, partial_at, mut result) = Self::scan(path)?;
        result.was_truncated = partial_at.is_some();
        Ok(result)
    }

    fn scan(path: &Path) -> StoreResult<(Vec<WalEntry>, Option<u64>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut partial_at = None;

        while let Some(record) = reader.next_record()? {
            match record {
                WalRecord::Entry(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = result.last_lsn.max(entry.lsn);
                    entries.push(entry);
                }
                WalRecord::Corrupted { .. } => {
                    result.entries_corrupted += 1;
                }
                WalRecord::Partial { offset } => {
                    partial_at = Some(offset);
                    break;
                }
            }
        }

        Ok((entries, partial_at, result))
    }
}
