//! HTTP client for the upstream sensor API.
//!
//! Exchanges credentials for a bearer token, renews it once it ages past the
//! configured TTL (or the API answers 401), and pulls the latest batch of
//! rows with a bounded number of attempts.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{Config, RawReading};

// ---

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token generation failed: {0}")]
    Token(String),

    #[error("token rejected by the API")]
    Unauthorized,

    #[error("data fetch failed with status {0}")]
    Status(StatusCode),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt in the same cycle could succeed.
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Http(_) | FetchError::Token(_) | FetchError::Unauthorized
        )
    }
}

/// Anything that can hand the poller a raw batch.
pub trait ReadingSource {
    fn fetch(&mut self) -> impl Future<Output = Result<Vec<RawReading>, FetchError>> + Send;
}

#[derive(Serialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

struct Token {
    value: String,
    acquired: Instant,
}

pub struct Fetcher {
    client: reqwest::Client,
    api_url: String,
    credentials: Credentials,
    token: Option<Token>,
    token_ttl: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        // ---
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials: Credentials {
                username: config.api_username.clone(),
                password: config.api_password.clone(),
            },
            token: None,
            token_ttl: config.token_ttl,
            max_retries: config.fetch_max_retries.max(1),
            retry_delay: config.fetch_retry_delay,
        })
    }

    fn token_is_stale(&self) -> bool {
        self.token
            .as_ref()
            .map_or(true, |t| t.acquired.elapsed() > self.token_ttl)
    }

    async fn generate_token(&mut self) -> Result<String, FetchError> {
        // ---
        let url = format!("{}/get_token", self.api_url);
        debug!("Requesting token from {}", url);

        let response = self.client.post(&url).json(&self.credentials).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Token(format!("status {}", status)));
        }

        let body: TokenResponse = response.json().await?;
        let value = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FetchError::Token("response carried no token".to_string()))?;

        info!("Acquired new API token");
        self.token = Some(Token {
            value: value.clone(),
            acquired: Instant::now(),
        });
        Ok(value)
    }

    async fn fetch_once(&mut self) -> Result<Vec<RawReading>, FetchError> {
        // ---
        let cached = match &self.token {
            Some(t) if !self.token_is_stale() => Some(t.value.clone()),
            _ => None,
        };
        let token = match cached {
            Some(token) => token,
            None => self.generate_token().await?,
        };

        let url = format!("{}/data", self.api_url);
        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await?;
                let body: Value = serde_json::from_slice(&bytes)
                    .map_err(|e| FetchError::Payload(format!("invalid JSON body: {}", e)))?;
                decode_rows(body)
            }
            StatusCode::UNAUTHORIZED => {
                warn!("Token expired, retrying...");
                self.token = None;
                Err(FetchError::Unauthorized)
            }
            status => Err(FetchError::Status(status)),
        }
    }
}

impl ReadingSource for Fetcher {
    async fn fetch(&mut self) -> Result<Vec<RawReading>, FetchError> {
        // ---
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.fetch_once().await {
                Ok(rows) => {
                    info!("Fetched {} rows on attempt {}", rows.len(), attempt);
                    return Ok(rows);
                }
                Err(e) if !e.is_retryable() => {
                    error!("Data fetch failed: {}", e);
                    return Err(e);
                }
                Err(e) => e,
            };

            error!("Data fetch error (attempt {}): {}", attempt, err);
            if attempt >= self.max_retries {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

/// Turn a response body into rows.
///
/// Accepts a bare array or an object wrapping it under `data` or `results`.
/// Rows that are not objects are skipped.
pub fn decode_rows(body: Value) -> Result<Vec<RawReading>, FetchError> {
    // ---
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("results")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(FetchError::Payload(
                    "object without a 'data' or 'results' array".to_string(),
                ))
            }
        },
        other => {
            return Err(FetchError::Payload(format!(
                "expected an array of rows, got {}",
                other
            )))
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            debug!("Skipping row {}: not an object - Raw item: {}", i, item);
            continue;
        }
        match serde_json::from_value::<RawReading>(item) {
            Ok(row) => rows.push(row),
            Err(e) => debug!("Failed to parse row {}: {}", i, e),
        }
    }
    Ok(rows)
}
