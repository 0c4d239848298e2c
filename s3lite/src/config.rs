use http::uri::{Authority, Scheme};
use http::Uri;
use s3lite_aws_v4::canonical::uri_encode_path;
use serde::Deserialize;

use crate::{Error, Result};

/// How the bucket is placed into request URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum AddressingStyle {
    /// `https://endpoint/bucket/key`
    #[serde(rename = "path")]
    PathStyle,
    /// `https://bucket.endpoint/key`
    #[default]
    #[serde(rename = "virtual")]
    VirtualHosted,
}

/// Where and how to reach an S3 compatible service.
///
/// Loaded from any serde format, for example TOML:
///
/// ```toml
/// endpoint = "http://127.0.0.1:9000"
/// region = "us-east-1"
/// addressing_style = "path"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Endpoint with scheme, like `https://s3.us-east-1.amazonaws.com`.
    pub endpoint: String,
    /// Region used in the credential scope.
    pub region: String,
    /// Defaults to virtual-hosted.
    #[serde(default)]
    pub addressing_style: AddressingStyle,
}

impl EndpointConfig {
    /// Create a config for any S3 compatible endpoint.
    pub fn new(endpoint: &str, region: &str, addressing_style: AddressingStyle) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            region: region.to_string(),
            addressing_style,
        }
    }

    /// AWS S3 in the given region.
    pub fn aws(region: &str) -> Self {
        Self::new(
            &format!("https://s3.{region}.amazonaws.com"),
            region,
            AddressingStyle::VirtualHosted,
        )
    }

    /// Cloudflare R2 of the given account.
    pub fn cloudflare_r2(account_id: &str) -> Self {
        Self::new(
            &format!("https://{account_id}.r2.cloudflarestorage.com"),
            "auto",
            AddressingStyle::PathStyle,
        )
    }

    /// Split the endpoint into scheme and authority.
    ///
    /// Any path on the endpoint is ignored.
    pub(crate) fn scheme_and_authority(&self) -> Result<(Scheme, Authority)> {
        let uri: Uri = self.endpoint.trim_end_matches('/').parse().map_err(|e| {
            Error::request_invalid(format!("endpoint {} is not a valid uri", self.endpoint))
                .with_source(e)
        })?;
        let parts = uri.into_parts();
        match (parts.scheme, parts.authority) {
            (Some(scheme), Some(authority)) => Ok((scheme, authority)),
            _ => Err(Error::request_invalid(format!(
                "endpoint {} must contain scheme and host",
                self.endpoint
            ))),
        }
    }

    /// Build the request url for `key` in `bucket`.
    ///
    /// `key` of `None` addresses the bucket itself. `query` pairs are raw and
    /// get encoded here.
    pub fn object_url(&self, bucket: &str, key: Option<&str>, query: &[(&str, &str)]) -> Result<String> {
        let (scheme, authority) = self.scheme_and_authority()?;

        let mut url = match self.addressing_style {
            AddressingStyle::PathStyle => format!("{scheme}://{authority}/{bucket}"),
            AddressingStyle::VirtualHosted => format!("{scheme}://{bucket}.{authority}"),
        };
        match key {
            Some(key) => {
                check_key(key)?;
                url.push('/');
                url.push_str(&uri_encode_path(key));
            }
            None if self.addressing_style == AddressingStyle::VirtualHosted => url.push('/'),
            None => {}
        }

        if !query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        Ok(url)
    }
}

/// Reject keys with `.` or `..` segments.
///
/// URL parsers collapse dot segments before sending, so the path on the wire
/// would no longer be the path that was signed.
pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.split('/').any(|seg| seg == "." || seg == "..") {
        return Err(Error::request_invalid(format!(
            "key {key} must not contain `.` or `..` segments"
        )));
    }
    Ok(())
}
