//! An in-memory S3 that speaks just enough of the protocol for the client.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use quick_xml::escape::escape;
use s3lite::{AddressingStyle, Client, Context, Credential, EndpointConfig, HttpSend};
use s3lite_aws_v4::canonical::{
    canonical_headers, canonical_query_string, canonical_request, canonical_uri, payload_hash,
};
use s3lite_aws_v4::{
    credential_scope, generate_signing_key, string_to_sign, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE,
};
use s3lite_core::hash::hex_hmac_sha256;
use s3lite_core::time::parse_iso8601;

pub const ENDPOINT: &str = "http://s3.test.local:9000";
pub const REGION: &str = "us-east-1";
pub const BUCKET: &str = "testing";
pub const ACCESS_KEY: &str = "access_key_id";
pub const SECRET_KEY: &str = "secret_access_key";

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, Bytes>,
    page_size: usize,
    deny: bool,
    fail_copy: bool,
    stuck_token: bool,
    requests: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FakeS3 {
    style: AddressingStyle,
    state: Arc<Mutex<State>>,
}

impl FakeS3 {
    pub fn new(style: AddressingStyle) -> Self {
        Self {
            style,
            state: Arc::new(Mutex::new(State {
                page_size: 1000,
                ..Default::default()
            })),
        }
    }

    pub fn client(&self) -> Client {
        self.client_for(BUCKET)
    }

    pub fn client_for(&self, bucket: &str) -> Client {
        self.client_with(bucket, Credential::new(ACCESS_KEY, SECRET_KEY))
    }

    pub fn client_with(&self, bucket: &str, cred: Credential) -> Client {
        let _ = env_logger::builder().is_test(true).try_init();

        Client::with_context(
            Context::new().with_http_send(self.clone()),
            EndpointConfig::new(ENDPOINT, REGION, self.style),
            bucket,
            cred,
        )
        .expect("client must be valid")
    }

    pub fn set_page_size(&self, size: usize) {
        self.state.lock().unwrap().page_size = size;
    }

    pub fn set_deny(&self, deny: bool) {
        self.state.lock().unwrap().deny = deny;
    }

    pub fn set_fail_copy(&self, fail: bool) {
        self.state.lock().unwrap().fail_copy = fail;
    }

    /// Answer every list call as truncated with the same token.
    pub fn set_stuck_token(&self, stuck: bool) {
        self.state.lock().unwrap().stuck_token = stuck;
    }

    pub fn insert(&self, key: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), Bytes::from(body.to_string()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(key)
    }

    /// `METHOD uri` of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Split a request into bucket and decoded key, following our addressing style.
    fn locate(&self, req: &Request<Bytes>) -> Option<(String, String)> {
        let host = req.uri().host()?;
        let path = req.uri().path();

        let (bucket, raw_key) = match self.style {
            AddressingStyle::PathStyle => {
                let path = path.trim_start_matches('/');
                match path.split_once('/') {
                    Some((bucket, key)) => (bucket.to_string(), key.to_string()),
                    None => (path.to_string(), String::new()),
                }
            }
            AddressingStyle::VirtualHosted => {
                let (bucket, _) = host.split_once('.')?;
                (
                    bucket.to_string(),
                    path.trim_start_matches('/').to_string(),
                )
            }
        };

        let key = percent_decode_str(&raw_key).decode_utf8().ok()?.to_string();
        Some((bucket, key))
    }

    fn handle(&self, req: Request<Bytes>) -> Response<Bytes> {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .push(format!("{} {}", req.method(), req.uri()));

        if let Err(code) = verify_signature(&req) {
            return error(&req, StatusCode::FORBIDDEN, code, "signature check failed");
        }
        if state.deny {
            return error(&req, StatusCode::FORBIDDEN, "AccessDenied", "Access Denied");
        }

        let Some((bucket, key)) = self.locate(&req) else {
            return error(&req, StatusCode::BAD_REQUEST, "InvalidURI", "bad uri");
        };
        if bucket != BUCKET {
            return error(
                &req,
                StatusCode::NOT_FOUND,
                "NoSuchBucket",
                "The specified bucket does not exist",
            );
        }

        if key.is_empty() {
            return match *req.method() {
                Method::HEAD => empty(StatusCode::OK),
                Method::GET => list(&state, &req),
                _ => error(&req, StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", ""),
            };
        }

        match *req.method() {
            Method::PUT => {
                let Some(source) = req.headers().get("x-amz-copy-source") else {
                    state.objects.insert(key, req.body().clone());
                    return empty(StatusCode::OK);
                };

                let source = percent_decode_str(source.to_str().unwrap_or_default())
                    .decode_utf8_lossy()
                    .to_string();
                let prefix = format!("/{BUCKET}/");
                let Some(src) = source.strip_prefix(&prefix) else {
                    return error(&req, StatusCode::BAD_REQUEST, "InvalidArgument", "bad source");
                };
                if state.fail_copy {
                    return xml(
                        StatusCode::OK,
                        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                         <Error><Code>InternalError</Code>\
                         <Message>We encountered an internal error. Please try again.</Message></Error>"
                            .to_string(),
                    );
                }
                let Some(content) = state.objects.get(src).cloned() else {
                    return error(
                        &req,
                        StatusCode::NOT_FOUND,
                        "NoSuchKey",
                        "The specified key does not exist.",
                    );
                };
                state.objects.insert(key, content);
                xml(
                    StatusCode::OK,
                    "<CopyObjectResult><ETag>\"etag\"</ETag></CopyObjectResult>".to_string(),
                )
            }
            Method::GET => match state.objects.get(&key) {
                Some(content) => Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(content.clone())
                    .unwrap(),
                None => error(
                    &req,
                    StatusCode::NOT_FOUND,
                    "NoSuchKey",
                    "The specified key does not exist.",
                ),
            },
            Method::HEAD if state.objects.contains_key(&key) => empty(StatusCode::OK),
            Method::HEAD => empty(StatusCode::NOT_FOUND),
            // Some vendors answer deleting a missing key with 404.
            Method::DELETE => match state.objects.remove(&key) {
                Some(_) => empty(StatusCode::NO_CONTENT),
                None => error(
                    &req,
                    StatusCode::NOT_FOUND,
                    "NoSuchKey",
                    "The specified key does not exist.",
                ),
            },
            _ => error(&req, StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", ""),
        }
    }
}

#[async_trait]
impl HttpSend for FakeS3 {
    async fn http_send(&self, req: Request<Bytes>) -> s3lite_core::Result<Response<Bytes>> {
        Ok(self.handle(req))
    }
}

/// Recompute the signature from the request as received.
fn verify_signature(req: &Request<Bytes>) -> std::result::Result<(), &'static str> {
    let auth = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or("MissingSecurityHeader")?;
    let rest = auth
        .strip_prefix("AWS4-HMAC-SHA256 ")
        .ok_or("AuthorizationHeaderMalformed")?;

    let (mut credential, mut signed_headers, mut signature) = ("", "", "");
    for field in rest.split(", ") {
        match field.split_once('=') {
            Some(("Credential", v)) => credential = v,
            Some(("SignedHeaders", v)) => signed_headers = v,
            Some(("Signature", v)) => signature = v,
            _ => return Err("AuthorizationHeaderMalformed"),
        }
    }
    let (access_key, scope) = credential
        .split_once('/')
        .ok_or("AuthorizationHeaderMalformed")?;
    if access_key != ACCESS_KEY {
        return Err("InvalidAccessKeyId");
    }

    let content_sha256 = req
        .headers()
        .get(X_AMZ_CONTENT_SHA_256)
        .and_then(|v| v.to_str().ok())
        .ok_or("MissingSecurityHeader")?;
    if content_sha256 != payload_hash(Some(&req.body()[..])) {
        return Err("XAmzContentSHA256Mismatch");
    }
    let time = req
        .headers()
        .get(X_AMZ_DATE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_iso8601(v).ok())
        .ok_or("AccessDenied")?;
    if scope != credential_scope(time, REGION, "s3") {
        return Err("AuthorizationHeaderMalformed");
    }

    // The copy source must be covered whenever it is present.
    let signed = signed_headers.split(';').collect::<Vec<_>>();
    if !signed.contains(&"host")
        || (req.headers().contains_key("x-amz-copy-source") && !signed.contains(&"x-amz-copy-source"))
    {
        return Err("AccessDenied");
    }

    let header_pairs = signed
        .iter()
        .flat_map(|name| {
            req.headers()
                .get_all(*name)
                .iter()
                .map(move |v| (*name, v.to_str().unwrap_or_default()))
        })
        .collect::<Vec<_>>();
    let query = form_urlencoded::parse(req.uri().query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect::<Vec<_>>();
    let creq = canonical_request(
        req.method().as_str(),
        &canonical_uri(req.uri().path()),
        &canonical_query_string(&query),
        &canonical_headers(header_pairs),
        content_sha256,
    );

    let key = generate_signing_key(SECRET_KEY, time, REGION, "s3");
    if hex_hmac_sha256(&key, string_to_sign(time, scope, &creq).as_bytes()) != signature {
        return Err("SignatureDoesNotMatch");
    }
    Ok(())
}

fn list(state: &State, req: &Request<Bytes>) -> Response<Bytes> {
    let query = form_urlencoded::parse(req.uri().query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect::<BTreeMap<_, _>>();
    if query.get("list-type").map(String::as_str) != Some("2") {
        return error(req, StatusCode::BAD_REQUEST, "InvalidArgument", "list-type");
    }
    let prefix = query.get("prefix").cloned().unwrap_or_default();
    let start = query.get("continuation-token").cloned().unwrap_or_default();

    let matched = state
        .objects
        .keys()
        .filter(|k| k.starts_with(&prefix) && k.as_str() >= start.as_str())
        .collect::<Vec<_>>();
    let page = &matched[..matched.len().min(state.page_size)];
    let next = if state.stuck_token {
        matched.first()
    } else {
        matched.get(state.page_size)
    };

    let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    body.push_str("<ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">");
    body.push_str(&format!("<Name>{BUCKET}</Name><Prefix>{}</Prefix>", escape(&prefix)));
    body.push_str(&format!("<KeyCount>{}</KeyCount>", page.len()));
    body.push_str(&format!("<IsTruncated>{}</IsTruncated>", next.is_some()));
    for key in page {
        body.push_str(&format!(
            "<Contents><Key>{}</Key><Size>{}</Size></Contents>",
            escape(key.as_str()),
            state.objects[key.as_str()].len()
        ));
    }
    if let Some(next) = next {
        body.push_str(&format!(
            "<NextContinuationToken>{}</NextContinuationToken>",
            escape(next.as_str())
        ));
    }
    body.push_str("</ListBucketResult>");

    xml(StatusCode::OK, body)
}

fn empty(status: StatusCode) -> Response<Bytes> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .unwrap()
}

fn xml(status: StatusCode, body: String) -> Response<Bytes> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/xml")
        .header("x-amz-request-id", "fake-request-id")
        .body(Bytes::from(body))
        .unwrap()
}

fn error(req: &Request<Bytes>, status: StatusCode, code: &str, message: &str) -> Response<Bytes> {
    // HEAD responses never carry a body.
    if req.method() == Method::HEAD {
        return empty(status);
    }

    xml(
        status,
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Error><Code>{code}</Code><Message>{message}</Message>\
             <RequestId>fake-request-id</RequestId></Error>"
        ),
    )
}
