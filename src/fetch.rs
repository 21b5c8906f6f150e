//! Outbound Fetch Adapter
//!
//! Typed GET-and-decode over an external HTTP source. Every failure reaches
//! the caller as [`PokedexError::FetchFailure`] with a fixed message; the
//! underlying detail only goes to the server log.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{FetchErrorKind, PokedexError, Result};

/// GET a URL and decode its body as `T`
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static;
}

/// [`HttpAdapter`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestAdapter {
    client: reqwest::Client,
}

impl ReqwestAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Client with a whole-request timeout (`0` disables it)
    pub fn with_timeout_ms(timeout_ms: u64) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        let client = builder
            .build()
            .map_err(|e| PokedexError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpAdapter for ReqwestAdapter {
    async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("GET {} failed: {}", url, e);
            PokedexError::FetchFailure {
                kind: FetchErrorKind::Transport,
            }
        })?;

        let response = response.error_for_status().map_err(|e| {
            tracing::error!("GET {} returned an error status: {}", url, e);
            PokedexError::FetchFailure {
                kind: FetchErrorKind::Status,
            }
        })?;

        response.json::<T>().await.map_err(|e| {
            tracing::error!("GET {} body could not be decoded: {}", url, e);
            PokedexError::FetchFailure {
                kind: if e.is_decode() {
                    FetchErrorKind::Decode
                } else {
                    FetchErrorKind::Transport
                },
            }
        })
    }
}
