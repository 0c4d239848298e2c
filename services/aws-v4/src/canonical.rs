//! Canonicalization of requests for SigV4.
//!
//! Every function here is pure: the same input always yields the same
//! canonical string, which is what makes signatures reproducible.
//!
//! - [Create a canonical request](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html#create-canonical-request)

use std::collections::BTreeMap;
use std::fmt::Write;

use percent_encoding::{percent_decode_str, percent_encode, utf8_percent_encode};
use s3lite_core::hash::hex_sha256;

use crate::constants::{AWS_URI_ENCODE_SET, EMPTY_STRING_SHA256};

/// Canonical header block together with the list of signed header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalHeaders {
    /// `name:value\n` lines sorted by lower-cased name.
    pub canonical: String,
    /// Sorted lower-cased names joined by `;`.
    pub signed: String,
}

/// Encode a raw (not yet encoded) path segment by segment.
///
/// `/` separators are kept, everything inside a segment outside the
/// unreserved set is percent encoded.
///
/// ```
/// use s3lite_aws_v4::canonical::uri_encode_path;
///
/// assert_eq!(uri_encode_path("photos/2024 summer/a+b.jpg"), "photos/2024%20summer/a%2Bb.jpg");
/// ```
pub fn uri_encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| utf8_percent_encode(seg, &AWS_URI_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the canonical URI from the path as it appears on the wire.
///
/// Each segment is decoded and then encoded again independently, so already
/// encoded paths are not double encoded and `/` separators are never touched.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    path.split('/')
        .map(|seg| {
            let decoded: Vec<u8> = percent_decode_str(seg).collect();
            percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Encode query names and values, then sort them by name and value.
///
/// The input is expected to be percent decoded.
pub fn canonical_query_pairs(query: &[(String, String)]) -> Vec<(String, String)> {
    let mut pairs = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_URI_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_URI_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    // Tuple ordering compares name first, then value, both byte-wise.
    pairs.sort();
    pairs
}

/// Build the canonical query string: `a=1&b=2`.
///
/// Returns an empty string if there is no query.
pub fn canonical_query_string(query: &[(String, String)]) -> String {
    canonical_query_pairs(query)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Trim a header value and collapse inner whitespace runs into one space.
pub fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the canonical header block and the signed header list.
///
/// Names are lower-cased; repeated names are merged into one entry whose
/// values are joined by `,` in input order, so every name appears once.
pub fn canonical_headers<'a, I>(headers: I) -> CanonicalHeaders
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        merged
            .entry(name.trim().to_ascii_lowercase())
            .or_default()
            .push(normalize_header_value(value));
    }

    let mut canonical = String::with_capacity(256);
    for (name, values) in &merged {
        canonical.push_str(name);
        canonical.push(':');
        canonical.push_str(&values.join(","));
        canonical.push('\n');
    }
    let signed = merged.keys().map(String::as_str).collect::<Vec<_>>().join(";");

    CanonicalHeaders { canonical, signed }
}

/// Hex encoded SHA-256 of the payload.
///
/// Requests without body use [`EMPTY_STRING_SHA256`] directly.
pub fn payload_hash(body: Option<&[u8]>) -> String {
    match body {
        Some(bs) if !bs.is_empty() => hex_sha256(bs),
        _ => EMPTY_STRING_SHA256.to_string(),
    }
}

/// Assemble the canonical request.
///
/// ```text
/// METHOD
/// CanonicalURI
/// CanonicalQuery
/// CanonicalHeaders
///
/// SignedHeaders
/// PayloadHash
/// ```
pub fn canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &CanonicalHeaders,
    payload_hash: &str,
) -> String {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);
    // Writing into a String never fails.
    let _ = write!(
        f,
        "{method}\n{canonical_uri}\n{canonical_query}\n{}\n{}\n{payload_hash}",
        headers.canonical, headers.signed
    );
    f
}
