// Network module - the thin HTTP wrapper the specialized caches fetch with
//
// Everything here runs on cache worker threads (or synchronously during
// cache priming at startup), never on the render loop, which is why the
// blocking reqwest client is the right tool.

pub mod feed;

use crate::error::FetchError;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;

/// Some feed servers reject unknown clients; present a plain browser UA.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:112.0) Gecko/20100101 Firefox/112.0";

/// Build a blocking client with the given request timeout.
pub fn client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| FetchError::Request {
            url: String::new(),
            source,
        })
}

/// A fetched response: status, normalized content type, body bytes.
#[derive(Debug)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// GET a URL, failing on transport errors and non-2xx statuses.
pub fn http_get(client: &Client, url: &str) -> Result<FetchResponse, FetchError> {
    let response = client
        .get(url)
        .header(USER_AGENT, DEFAULT_USER_AGENT)
        .send()
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let body = response
        .bytes()
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?
        .to_vec();

    tracing::debug!(
        "GET {} -> {} ({}, {} bytes)",
        url,
        status,
        content_type,
        body.len()
    );

    Ok(FetchResponse {
        status,
        content_type,
        body,
    })
}
