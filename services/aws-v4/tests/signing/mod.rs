
use anyhow::Result;
use bytes::Bytes;
use http::{Request, StatusCode};
use log::debug;
use s3lite_aws_v4::{Credential, RequestSigner};
use s3lite_core::{Context, SignRequest};
use s3lite_http_send_reqwest::ReqwestHttpSend;
use std::env;

/// Load static credential from environment variables
pub fn load_static_credential() -> Credential {
    let access_key = env::var("S3LITE_ACCESS_KEY").expect("S3LITE_ACCESS_KEY must be set");
    let secret_key = env::var("S3LITE_SECRET_KEY").expect("S3LITE_SECRET_KEY must be set");

    let cred = Credential::new(access_key, secret_key);
    match env::var("S3LITE_SESSION_TOKEN") {
        Ok(token) => cred.with_session_token(token),
        Err(_) => cred,
    }
}

/// Initialize test environment
///
/// Returns `None` unless `S3LITE_TEST=on`, `S3LITE_URL` points to a bucket
/// in path style, for example `http://127.0.0.1:9000/testing`.
pub fn init_signing_test() -> Option<(Context, RequestSigner, String)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("S3LITE_TEST").as_deref() != Ok("on") {
        return None;
    }

    let region = env::var("S3LITE_REGION").expect("S3LITE_REGION must be set");
    let url = env::var("S3LITE_URL").expect("S3LITE_URL must be set");

    let context = Context::new().with_http_send(ReqwestHttpSend::default());
    let signer = RequestSigner::new("s3", &region);

    Some((context, signer, url))
}

/// Send signed request and return response
pub async fn send_signed_request(
    ctx: &Context,
    signer: &RequestSigner,
    req: Request<Bytes>,
    cred: &Credential,
) -> Result<(StatusCode, String)> {
    let (mut parts, body) = req.into_parts();
    signer
        .sign_request(ctx, &mut parts, Some(&body[..]), Some(cred))
        .await
        .expect("sign request must succeed");
    let req = Request::from_parts(parts, body);

    debug!("signed request: {req:?}");

    let resp = ctx.http_send(req).await?;
    let status = resp.status();
    let body = String::from_utf8_lossy(resp.body()).to_string();

    debug!("response status: {status}, body: {body}");
    Ok((status, body))
}
