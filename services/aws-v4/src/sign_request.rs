use crate::canonical::{
    canonical_headers, canonical_query_pairs, canonical_query_string, canonical_request,
    canonical_uri, payload_hash,
};
use crate::constants::{
    AWS4_HMAC_SHA256, AWS4_REQUEST, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::Credential;
use async_trait::async_trait;
use http::request::Parts;
use http::{header, HeaderName, HeaderValue};
use log::debug;
use s3lite_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use s3lite_core::time::{format_date, format_iso8601, now, parse_iso8601, DateTime};
use s3lite_core::{Context, Error, Result, SignRequest, SigningCredential, SigningRequest};

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// The signing key is derived again for every request; nothing is cached
/// between calls, so one signer can be shared freely across tasks.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,

    time: Option<DateTime>,
}

/// Everything one signing operation produced.
///
/// Mostly useful for debugging signature mismatches against a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutput {
    /// The canonical request that was hashed.
    pub canonical_request: String,
    /// The string that was signed.
    pub string_to_sign: String,
    /// Hex encoded signature.
    pub signature: String,
    /// Value of the `Authorization` header.
    pub authorization: String,
}

impl RequestSigner {
    /// Create a new builder for AWS V4 signer.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Region this signer binds signatures to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign the request in place and return the intermediate strings.
    ///
    /// The signing time is taken from an existing `x-amz-date` header if the
    /// caller set one, so the header and the credential scope always agree.
    pub fn sign_parts(
        &self,
        req: &mut Parts,
        body: Option<&[u8]>,
        cred: &Credential,
    ) -> Result<SigningOutput> {
        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "access key id and secret access key must not be empty",
            ));
        }

        let mut signed_req = SigningRequest::build(req)?;
        let now = match signed_req.header_get(X_AMZ_DATE)? {
            Some(v) => parse_iso8601(v)?,
            None => self.time.unwrap_or_else(now),
        };

        // canonicalize context
        canonicalize_header(&mut signed_req, cred, body, now)?;

        let header_pairs = signed_req
            .headers
            .iter()
            .map(|(k, v)| Ok((k.as_str(), v.to_str()?)))
            .collect::<Result<Vec<_>>>()?;
        let headers = canonical_headers(header_pairs);
        let payload = signed_req
            .header_get(X_AMZ_CONTENT_SHA_256)?
            .unwrap_or_default()
            .to_string();

        // build canonical request and string to sign.
        let creq = canonical_request(
            signed_req.method.as_str(),
            &canonical_uri(&signed_req.path),
            &canonical_query_string(&signed_req.query),
            &headers,
            &payload,
        );
        debug!("calculated canonical request: {creq}");

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = credential_scope(now, &self.region, &self.service);
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = string_to_sign(now, &scope, &creq);
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "{AWS4_HMAC_SHA256} Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id, scope, headers.signed, signature
        );
        let mut value = HeaderValue::from_str(&authorization).map_err(|e| {
            Error::request_invalid("failed to create authorization header").with_source(e)
        })?;
        value.set_sensitive(true);
        signed_req.headers.insert(header::AUTHORIZATION, value);

        // The query on the wire must be exactly the one we signed.
        signed_req.query = canonical_query_pairs(&signed_req.query);

        // Apply to the request.
        signed_req.apply(req)?;

        Ok(SigningOutput {
            canonical_request: creq,
            string_to_sign,
            signature,
            authorization,
        })
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        body: Option<&[u8]>,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };

        self.sign_parts(req, body, cred).map(|_| ())
    }
}

fn canonicalize_header(
    ctx: &mut SigningRequest,
    cred: &Credential,
    body: Option<&[u8]>,
    now: DateTime,
) -> Result<()> {
    // Header names and values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
    for (_, value) in ctx.headers.iter_mut() {
        SigningRequest::header_value_normalize(value)
    }

    // Insert HOST header if not present.
    let host = HeaderValue::from_str(ctx.authority.as_str()).map_err(|e| {
        Error::request_invalid("failed to parse authority as header value").with_source(e)
    })?;
    ctx.header_insert_if_absent(header::HOST, host);

    // Insert DATE header if not present.
    ctx.header_insert_if_absent(
        HeaderName::from_static(X_AMZ_DATE),
        HeaderValue::try_from(format_iso8601(now))?,
    );

    // Insert X_AMZ_CONTENT_SHA_256 header if not present.
    ctx.header_insert_if_absent(
        HeaderName::from_static(X_AMZ_CONTENT_SHA_256),
        HeaderValue::try_from(payload_hash(body))?,
    );

    // Insert X_AMZ_SECURITY_TOKEN header if security token exists.
    if let Some(token) = &cred.session_token {
        let mut value = HeaderValue::from_str(token).map_err(|e| {
            Error::request_invalid("failed to create security token header").with_source(e)
        })?;
        // Set token value sensitive to valid leaking.
        value.set_sensitive(true);

        ctx.headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }

    Ok(())
}

/// Build the credential scope: `20130524/us-east-1/s3/aws4_request`.
pub fn credential_scope(time: DateTime, region: &str, service: &str) -> String {
    format!("{}/{region}/{service}/{AWS4_REQUEST}", format_date(time))
}

/// Build the string to sign from the scope and the canonical request.
pub fn string_to_sign(time: DateTime, scope: &str, canonical_request: &str) -> String {
    format!(
        "{AWS4_HMAC_SHA256}\n{}\n{scope}\n{}",
        format_iso8601(time),
        hex_sha256(canonical_request.as_bytes())
    )
}

/// Derive the signing key through the HMAC chain of date, region and service.
pub fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}
