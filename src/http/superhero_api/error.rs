// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use bytes::Bytes;
use reqwest::{Response, StatusCode};
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure classes for superhero API calls. Note that "hero not found" is NOT an error: the API
/// reports it in-band with an HTTP 200, and the caller maps that envelope to `None`/empty.
#[derive(Debug)]
#[allow(dead_code)] // these are debug printed frequently
pub enum ApiError {
    /// Any error for which we got an HTTP response. Built for any non-2xx status code.
    HttpResponse(HttpResponse),
    /// Any error for which we did not get an HTTP response. Happens if we fail during the initial request `.send()`.
    HttpRequest(ReqwestError),
    /// An error occurred reading response body.
    HttpRead(ReqwestError),
    /// We received a successful response which we could not deserialize
    JsonDeserialize(serde_json::Error),
}

impl std::error::Error for ApiError {}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::HttpResponse(e) => write!(f, "superhero API error: {e:?}"),
            ApiError::HttpRequest(e) => write!(f, "HTTP general failure: {e:?}"),
            ApiError::HttpRead(e) => write!(f, "HTTP body read failed: {e:?}"),
            ApiError::JsonDeserialize(e) => write!(f, "JSON deserialization failed: {e}"),
        }
    }
}

impl ApiError {
    /// Create an ApiError from a non-2xx response, capturing status, headers, and raw body
    pub async fn from_response(endpoint: &'static str, response: Response) -> Self {
        let status_code = response.status();
        let headers = format!("{:?}", response.headers());
        let body = match response.bytes().await {
            Ok(bytes) => HttpBody::Body(bytes),
            Err(read_error) => HttpBody::ReadError(read_error),
        };
        let http = HttpResponse {
            endpoint,
            status_code,
            headers,
            body,
        };
        Self::HttpResponse(http)
    }

    /// Create an ApiError from a reqwest error (use this after `.send()`)
    pub fn from_request(endpoint: &'static str, error: reqwest::Error) -> Self {
        let inner = ReqwestError { endpoint, error };
        Self::HttpRequest(inner)
    }

    /// Create an ApiError from a reqwest error attempting to read response body (use this after `.bytes()`)
    pub fn from_read(endpoint: &'static str, error: reqwest::Error) -> Self {
        let inner = ReqwestError { endpoint, error };
        Self::HttpRead(inner)
    }

    /// Create an ApiError from a serde_json Error
    pub fn from_json(json_error: serde_json::Error) -> Self {
        Self::JsonDeserialize(json_error)
    }
}

/// Generic wrapper for a reqwest error.
#[derive(Debug)]
#[allow(dead_code)] // these are debug printed frequently
pub struct ReqwestError {
    endpoint: &'static str,
    error: reqwest::Error,
}

#[derive(Debug)]
#[allow(dead_code)] // these are debug printed frequently
pub struct HttpResponse {
    endpoint: &'static str,
    status_code: StatusCode,
    headers: String,
    body: HttpBody,
}

#[derive(Debug)]
#[allow(dead_code)] // these are debug printed frequently
pub enum HttpBody {
    /// Raw error response body. The superhero API has no documented error schema for non-2xx
    /// responses, so the bytes are kept as-is for debug logging.
    Body(Bytes),
    /// An error occurred reading the response body.
    ReadError(reqwest::Error),
}
