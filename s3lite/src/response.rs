use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Response, StatusCode};
use log::debug;
use quick_xml::events::Event;
use quick_xml::{de, Reader};
use s3lite_aws_v4::X_AMZ_REQUEST_ID;
use serde::Deserialize;

use crate::{Error, ErrorKind, Result};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// 204 or a zero length body.
    Empty,
    /// XML or JSON content.
    Text(String),
    /// Anything else, returned untouched.
    Bytes(Bytes),
}

impl ResponseBody {
    /// Convert into text, failing if the body is not valid UTF-8.
    pub fn into_text(self) -> Result<String> {
        match self {
            ResponseBody::Empty => Ok(String::new()),
            ResponseBody::Text(s) => Ok(s),
            ResponseBody::Bytes(bs) => String::from_utf8(bs.to_vec()).map_err(|e| {
                Error::protocol_failure("response body is not valid utf-8").with_source(e)
            }),
        }
    }

    /// Convert into raw bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            ResponseBody::Empty => Bytes::new(),
            ResponseBody::Text(s) => Bytes::from(s),
            ResponseBody::Bytes(bs) => bs,
        }
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorDocument {
    code: String,
    message: String,
    request_id: String,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct JsonErrorDocument {
    #[serde(alias = "Code")]
    code: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Turn a non-2xx response into an error, pass everything else through.
pub(crate) fn check_status(resp: Response<Bytes>) -> Result<Response<Bytes>> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let (parts, body) = resp.into_parts();
    Err(parse_error(parts.status, &parts.headers, &body))
}

/// Classify the successful response body.
pub(crate) fn into_body(resp: Response<Bytes>) -> ResponseBody {
    let (parts, body) = resp.into_parts();
    if parts.status == StatusCode::NO_CONTENT || body.is_empty() {
        return ResponseBody::Empty;
    }

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !(content_type.contains("xml") || content_type.contains("json")) {
        return ResponseBody::Bytes(body);
    }

    match String::from_utf8(body.to_vec()) {
        Ok(s) => ResponseBody::Text(s),
        Err(_) => ResponseBody::Bytes(body),
    }
}

/// Build the error of a failed response.
///
/// The body is tried as an XML error document first, then as JSON, and is
/// kept as plain text otherwise.
pub(crate) fn parse_error(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Error {
    let text = String::from_utf8_lossy(body);
    let (code, message, mut request_id) = parse_error_body(&text);

    if let Some(v) = headers.get(X_AMZ_REQUEST_ID).and_then(|v| v.to_str().ok()) {
        request_id = Some(v.to_string());
    }

    // HEAD answers carry no body, so a bare 404 still means a missing object.
    let bare = code.is_none() && text.trim().is_empty();
    let kind = match status {
        StatusCode::NOT_FOUND if bare || code.as_deref() == Some("NoSuchKey") => {
            ErrorKind::ObjectNotFound
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::AuthorizationFailure,
        _ => ErrorKind::ProtocolFailure,
    };
    let message = match message {
        Some(m) => m,
        None if !text.trim().is_empty() => text.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
    };
    debug!("response failed with {status}: code {code:?}, message {message}");

    let mut err = Error::new(kind, message).with_status(status);
    if let Some(code) = code {
        err = err.with_code(code);
    }
    if let Some(request_id) = request_id {
        err = err.with_request_id(request_id);
    }
    err
}

/// Find an `<Error>` document in a successful response.
///
/// S3 may answer a copy with 200 and report the failure in the body.
pub(crate) fn embedded_error(resp: &Response<Bytes>) -> Option<Error> {
    let text = std::str::from_utf8(resp.body()).ok()?;
    if root_element(text)?.as_str() != "Error" {
        return None;
    }

    let (code, message, request_id) = parse_error_body(text);
    let mut err = Error::protocol_failure(
        message.unwrap_or_else(|| "service returned an error document".to_string()),
    )
    .with_status(resp.status());
    if let Some(code) = code {
        err = err.with_code(code);
    }
    if let Some(request_id) = request_id {
        err = err.with_request_id(request_id);
    }
    Some(err)
}

type ErrorFields = (Option<String>, Option<String>, Option<String>);

fn parse_error_body(text: &str) -> ErrorFields {
    fn non_empty(s: String) -> Option<String> {
        (!s.is_empty()).then_some(s)
    }

    if root_element(text).is_some() {
        if let Ok(doc) = de::from_str::<ErrorDocument>(text) {
            return (
                non_empty(doc.code),
                non_empty(doc.message),
                non_empty(doc.request_id),
            );
        }
    }

    if let Ok(doc) = serde_json::from_str::<JsonErrorDocument>(text) {
        return (doc.code, doc.message, None);
    }

    (None, None, None)
}

/// Name of the first element of an XML document.
fn root_element(text: &str) -> Option<String> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).to_string())
            }
            Ok(Event::Decl(_)) | Ok(Event::Comment(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {}
            Ok(Event::Text(e)) if e.iter().all(|b| b.is_ascii_whitespace()) => {}
            _ => return None,
        }
    }
}
