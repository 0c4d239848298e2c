//! Reqwest-based transport for s3lite.
//!
//! This crate provides `ReqwestHttpSend`, which implements the `HttpSend`
//! trait from `s3lite_core` on top of a `reqwest::Client`.
//!
//! ## Example
//!
//! ```no_run
//! use s3lite_core::Context;
//! use s3lite_http_send_reqwest::ReqwestHttpSend;
//! use std::time::Duration;
//!
//! # fn main() -> anyhow::Result<()> {
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqwest::{Client, Request};
use s3lite_core::{Error, HttpSend, Result};

/// HttpSend implementation backed by `reqwest`.
///
/// Every response is returned as-is regardless of its status; only failures
/// to obtain a response surface as errors.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let method = req.method().clone();
        let uri = req.uri().to_string();

        let req = Request::try_from(req).map_err(|e| {
            Error::request_invalid("failed to convert request into reqwest request")
                .with_source(e)
                .with_context(format!("uri: {uri}"))
        })?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| {
                Error::unexpected("failed to send http request")
                    .with_source(e)
                    .with_context(format!("method: {method}"))
                    .with_context(format!("uri: {uri}"))
            })?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| {
                Error::unexpected("failed to read http response body")
                    .with_source(e)
                    .with_context(format!("uri: {uri}"))
            })?;
        debug!("{method} {uri} -> {} ({} bytes)", parts.status, bs.len());

        Ok(http::Response::from_parts(parts, bs))
    }
}
