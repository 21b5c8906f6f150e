//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::store::{StoreError, StoreResult};

use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// One framed record as found on disk
#[derive(Debug)]
pub enum WalRecord {
    /// A valid entry
    Entry(WalEntry),

    /// A fully framed entry whose checksum or payload is bad
    Corrupted { lsn: u64, offset: u64 },

    /// The file ends in the middle of an entry starting at `offset`
    Partial { offset: u64 },
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset of the next record
    position: u64,

    /// File length at open time
    len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            len,
        })
    }

    /// Read the next framed record, or `None` at a clean end of file
    pub fn next_record(&mut self) -> StoreResult<Option<WalRecord>> {
        let offset = self.position;
        let remaining = self.len - self.position;

        if remaining == 0 {
            return Ok(None);
        }
        if remaining < HEADER_SIZE as u64 {
            self.position = self.len;
            return Ok(Some(WalRecord::Partial { offset }));
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;
        let (lsn, crc, data_len) = WalEntry::decode_header(&header);

        // A garbage length cannot be skipped over safely
        if data_len > MAX_ENTRY_SIZE || (data_len as u64) > remaining - HEADER_SIZE as u64 {
            self.position = self.len;
            return Ok(Some(WalRecord::Partial { offset }));
        }

        let mut data = vec![0u8; data_len as usize];
        self.reader.read_exact(&mut data)?;
        self.position += (HEADER_SIZE + data.len()) as u64;

        match WalEntry::from_parts(lsn, crc, &data) {
            Ok(entry) => Ok(Some(WalRecord::Entry(entry))),
            Err(StoreError::WalCorruption(reason)) => {
                tracing::warn!("Skipping corrupted WAL entry at offset {}: {}", offset, reason);
                Ok(Some(WalRecord::Corrupted { lsn, offset }))
            }
            Err(e) => Err(e),
        }
    }

    /// Read the next valid entry
    ///
    /// Corrupted entries are skipped; a partial tail ends the stream.
    pub fn next_entry(&mut self) -> StoreResult<Option<WalEntry>> {
        loop {
            match self.next_record()? {
                Some(WalRecord::Entry(entry)) => return Ok(Some(entry)),
                Some(WalRecord::Corrupted { .. }) => continue,
                Some(WalRecord::Partial { .. }) | None => return Ok(None),
            }
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> u64 {
        self.position
    }
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = StoreResult<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
