//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::store::StoreResult;

use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    /// Buffered handle, opened in append mode
    writer: BufWriter<File>,

    /// Location of the log (needed for truncation and checkpoints)
    path: PathBuf,

    /// LSN the next appended entry receives
    current_lsn: u64,

    sync_strategy: WalSyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// Continues numbering after the last valid LSN already in the file.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> StoreResult<Self> {
        let last_lsn = if path.exists() {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            current_lsn: last_lsn + 1,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an operation to the WAL
    ///
    /// Returns the LSN assigned to the entry. The entry is handed to the OS
    /// before returning; fsync follows the sync strategy.
    pub fn append(&mut self, operation: Operation) -> StoreResult<u64> {
        let lsn = self.current_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        self.current_lsn += 1;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count.max(1),
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> StoreResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry (LSNs keep increasing)
    pub fn truncate(&mut self) -> StoreResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(0)?;
        self.writer.get_ref().sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Replace the log with `operations`, atomically
    ///
    /// Writes a sibling `.tmp` file, syncs it and renames it over the log.
    /// The handle to the new file is swapped in only after the rename; on
    /// any error the writer keeps appending to the old log.
    pub fn checkpoint<I>(&mut self, operations: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = Operation>,
    {
        self.writer.flush()?;

        let tmp_path = self.path.with_extension("wal.tmp");
        let (file, next_lsn) = match Self::write_snapshot(&tmp_path, operations) {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        self.writer = BufWriter::new(file);
        self.current_lsn = next_lsn;
        self.unsynced = 0;
        Ok(())
    }

    /// Write `operations` to a fresh file, returning its handle and the next LSN
    fn write_snapshot<I>(path: &Path, operations: I) -> StoreResult<(File, u64)>
    where
        I: IntoIterator<Item = Operation>,
    {
        let mut tmp = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(path)?,
        );

        let mut lsn = 1;
        for operation in operations {
            tmp.write_all(&WalEntry::new(lsn, operation).serialize()?)?;
            lsn += 1;
        }
        tmp.flush()?;
        tmp.get_ref().sync_all()?;

        let file = tmp.into_inner().map_err(|e| e.into_error())?;
        Ok((file, lsn))
    }

    /// Get the current LSN (the one the next append receives)
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
