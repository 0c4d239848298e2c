//! AWS SigV4 signing for S3 compatible object storage.
//!
//! This crate signs `http::request::Parts` in place with the
//! `AWS4-HMAC-SHA256` algorithm using header based authentication.
//!
//! ## Quick Start
//!
//! ```no_run
//! use s3lite_aws_v4::{Credential, RequestSigner};
//! use s3lite_core::{Context, SignRequest};
//!
//! # async fn example() -> s3lite_core::Result<()> {
//! let ctx = Context::new();
//! let signer = RequestSigner::new("s3", "us-east-1");
//! let cred = Credential::new("access_key_id", "secret_access_key");
//!
//! let req = http::Request::get("https://examplebucket.s3.amazonaws.com/test.txt")
//!     .body(())
//!     .unwrap();
//! let (mut parts, _) = req.into_parts();
//! signer
//!     .sign_request(&ctx, &mut parts, None, Some(&cred))
//!     .await?;
//!
//! assert!(parts.headers.contains_key(http::header::AUTHORIZATION));
//! # Ok(())
//! # }
//! ```
//!
//! The lower level pieces of the algorithm live in [`canonical`] and can be
//! used on their own to inspect or debug a signature.

pub mod canonical;

mod constants;
pub use constants::AWS4_HMAC_SHA256;
pub use constants::EMPTY_STRING_SHA256;
pub use constants::S3_SERVICE;
pub use constants::X_AMZ_CONTENT_SHA_256;
pub use constants::X_AMZ_COPY_SOURCE;
pub use constants::X_AMZ_DATE;
pub use constants::X_AMZ_REQUEST_ID;
pub use constants::X_AMZ_SECURITY_TOKEN;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::credential_scope;
pub use sign_request::generate_signing_key;
pub use sign_request::string_to_sign;
pub use sign_request::RequestSigner;
pub use sign_request::SigningOutput;
