use std::collections::HashSet;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response};
use log::{debug, warn};
use s3lite_aws_v4::canonical::uri_encode_path;
use s3lite_aws_v4::{Credential, RequestSigner, S3_SERVICE, X_AMZ_COPY_SOURCE};
use s3lite_core::{Context, SignRequest, SigningCredential};

use crate::config::check_key;
use crate::list::{parse_list_page, ListPage};
use crate::response::{check_status, embedded_error, into_body, ResponseBody};
use crate::{EndpointConfig, Error, ErrorKind, Result};

/// Client of one bucket on an S3 compatible service.
///
/// Every call builds, signs and sends a fresh request; the client holds no
/// mutable state and is cheap to clone.
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    config: EndpointConfig,
    bucket: String,
    credential: Credential,
    signer: RequestSigner,
}

impl Client {
    /// Create a client that sends requests with reqwest.
    #[cfg(feature = "default-context")]
    pub fn new(config: EndpointConfig, bucket: &str, credential: Credential) -> Result<Self> {
        let ctx = Context::new()
            .with_http_send(s3lite_http_send_reqwest::ReqwestHttpSend::default());
        Self::with_context(ctx, config, bucket, credential)
    }

    /// Create a client on top of the given context.
    pub fn with_context(
        ctx: Context,
        config: EndpointConfig,
        bucket: &str,
        credential: Credential,
    ) -> Result<Self> {
        if !credential.is_valid() {
            return Err(s3lite_core::Error::credential_invalid(
                "access key id and secret access key must not be empty",
            )
            .into());
        }
        if bucket.is_empty() {
            return Err(s3lite_core::Error::config_invalid("bucket must not be empty").into());
        }
        // Fail early on endpoints we can't build urls from.
        config.scheme_and_authority()?;

        let signer = RequestSigner::new(S3_SERVICE, &config.region);
        Ok(Self {
            ctx,
            config,
            bucket: bucket.to_string(),
            credential,
            signer,
        })
    }

    /// Name of the bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Endpoint config of this client.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Sign and send one request, returning the classified body.
    ///
    /// `key` of `None` addresses the bucket itself.
    pub async fn send(
        &self,
        method: Method,
        key: Option<&str>,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<ResponseBody> {
        let resp = self.execute(method, key, query, headers, body).await?;
        Ok(into_body(resp))
    }

    async fn execute(
        &self,
        method: Method,
        key: Option<&str>,
        query: &[(&str, &str)],
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response<Bytes>> {
        let url = self.config.object_url(&self.bucket, key, query)?;
        debug!("{method} {url}");

        let mut req = Request::builder().method(method).uri(&url).body(body)?;
        req.headers_mut().extend(headers);

        let (mut parts, body) = req.into_parts();
        self.signer
            .sign_request(&self.ctx, &mut parts, Some(&body[..]), Some(&self.credential))
            .await?;
        let req = Request::from_parts(parts, body);

        let resp = self.ctx.http_send(req).await.map_err(|e| {
            Error::transport_failure(format!("failed to send request to {url}")).with_source(e)
        })?;

        check_status(resp)
    }

    /// Upload `body` as `key`, replacing any existing object.
    pub async fn upload_object(&self, key: &str, body: impl Into<Bytes>) -> Result<()> {
        self.send(Method::PUT, Some(key), &[], HeaderMap::new(), body.into())
            .await?;
        Ok(())
    }

    /// Download `key` as text.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub async fn download_object_as_text(&self, key: &str) -> Result<Option<String>> {
        match self.download(key).await? {
            Some(body) => Ok(Some(body.into_text()?)),
            None => Ok(None),
        }
    }

    /// Download `key` as raw bytes.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub async fn download_object_as_bytes(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.download(key).await?.map(ResponseBody::into_bytes))
    }

    async fn download(&self, key: &str) -> Result<Option<ResponseBody>> {
        match self
            .send(Method::GET, Some(key), &[], HeaderMap::new(), Bytes::new())
            .await
        {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Delete `key`. Deleting a missing object succeeds.
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        match self
            .send(Method::DELETE, Some(key), &[], HeaderMap::new(), Bytes::new())
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Copy `src` to `dst` inside the bucket on the server side.
    pub async fn copy_object(&self, src: &str, dst: &str) -> Result<()> {
        check_key(src)?;
        let source = format!("/{}/{}", self.bucket, uri_encode_path(src));
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(X_AMZ_COPY_SOURCE),
            HeaderValue::from_str(&source).map_err(|e| {
                Error::request_invalid(format!("invalid copy source {source}")).with_source(e)
            })?,
        );

        let resp = self
            .execute(Method::PUT, Some(dst), &[], headers, Bytes::new())
            .await?;
        match embedded_error(&resp) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Move `src` to `dst`: copy, then delete the source.
    ///
    /// Not atomic. If the delete fails both objects exist and the delete
    /// error is returned.
    pub async fn move_object(&self, src: &str, dst: &str) -> Result<()> {
        self.copy_object(src, dst).await?;
        if let Err(err) = self.delete_object(src).await {
            warn!("copied {src} to {dst} but failed to delete source: {err}");
            return Err(err);
        }
        Ok(())
    }

    /// List keys under `prefix`.
    ///
    /// Only the first page (up to 1000 keys on AWS) is returned; use
    /// [`Client::list_all_objects`] to walk every page.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.list_objects_page(prefix, None).await?.keys)
    }

    /// List one page of keys under `prefix`, continuing from `continuation_token`.
    pub async fn list_objects_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListPage> {
        let mut query = vec![("list-type", "2")];
        if !prefix.is_empty() {
            query.push(("prefix", prefix));
        }
        if let Some(token) = continuation_token {
            query.push(("continuation-token", token));
        }

        let body = self
            .send(Method::GET, None, &query, HeaderMap::new(), Bytes::new())
            .await?;
        let text = body.into_text()?;
        if text.is_empty() {
            return Ok(ListPage::default());
        }
        parse_list_page(&text)
    }

    /// List every key under `prefix`, following continuation tokens.
    pub async fn list_all_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let page = self.list_objects_page(prefix, token.as_deref()).await?;
            keys.extend(page.keys);

            match (page.is_truncated, page.next_continuation_token) {
                (true, Some(next)) if !seen.insert(next.clone()) => {
                    return Err(Error::protocol_failure(format!(
                        "list response repeats continuation token {next}"
                    )))
                }
                (true, Some(next)) => token = Some(next),
                (true, None) => {
                    return Err(Error::protocol_failure(
                        "list response is truncated but has no continuation token",
                    ))
                }
                (false, _) => break,
            }
        }

        Ok(keys)
    }

    /// Check whether `key` exists.
    pub async fn object_exists(&self, key: &str) -> Result<bool> {
        match self
            .send(Method::HEAD, Some(key), &[], HeaderMap::new(), Bytes::new())
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::ObjectNotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Check whether the bucket can be reached with our credential.
    ///
    /// Never fails: every error is reported as `false`.
    pub async fn check_bucket_access(&self) -> bool {
        match self
            .send(Method::HEAD, None, &[], HeaderMap::new(), Bytes::new())
            .await
        {
            Ok(_) => true,
            Err(err) if err.kind() == ErrorKind::AuthorizationFailure => {
                warn!("access to bucket {} denied: {err}", self.bucket);
                false
            }
            Err(err) => {
                warn!("failed to check access to bucket {}: {err}", self.bucket);
                false
            }
        }
    }
}
