//! Pagination parameters for list requests.

use serde::{Deserialize, Serialize};

use crate::error::{PokedexError, Result};

/// `limit` / `offset` as received from callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page size (must be positive when present)
    pub limit: Option<u64>,

    /// Page number
    pub offset: Option<u64>,
}

impl Pagination {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(PokedexError::BadRequest(
                "limit must be a positive number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn limit_or(&self, default_limit: u64) -> u64 {
        self.limit.unwrap_or(default_limit)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    /// Documents to skip: `(offset - 1) * limit`, clamped at zero
    ///
    /// Offsets 0 and 1 both start at the first record.
    pub fn skip(&self, default_limit: u64) -> u64 {
        self.offset()
            .saturating_sub(1)
            .saturating_mul(self.limit_or(default_limit))
    }
}
