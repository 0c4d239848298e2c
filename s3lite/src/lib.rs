//! Object operations on S3 compatible storage without a vendor SDK.
//!
//! `s3lite` signs every request with AWS SigV4 ([`s3lite_aws_v4`]) and sends
//! it through the [`HttpSend`] of a [`Context`], so AWS S3, Cloudflare R2 and
//! self hosted MinIO style services share one code path. Only the
//! differences that matter are configured: the endpoint, the region and the
//! [`AddressingStyle`].
//!
//! ## Example
//!
//! ```no_run
//! use s3lite::{Client, Credential, EndpointConfig};
//!
//! # async fn example() -> s3lite::Result<()> {
//! let client = Client::new(
//!     EndpointConfig::cloudflare_r2("my-account-id"),
//!     "my-bucket",
//!     Credential::new("access_key_id", "secret_access_key"),
//! )?;
//!
//! client.upload_object("hello.txt", "Hello, World!").await?;
//! assert_eq!(
//!     client.download_object_as_text("hello.txt").await?.as_deref(),
//!     Some("Hello, World!")
//! );
//!
//! // Missing objects are not errors.
//! assert_eq!(client.download_object_as_text("missing.txt").await?, None);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every failure is an [`Error`] whose [`ErrorKind`] tells what went wrong.
//! Reads, `object_exists` and `delete_object` turn
//! [`ErrorKind::ObjectNotFound`] into `None`, `false` and `Ok(())`.

#![warn(missing_docs)]

pub use s3lite_aws_v4::Credential;
pub use s3lite_core::{Context, HttpSend};

mod config;
pub use config::AddressingStyle;
pub use config::EndpointConfig;

mod error;
pub use error::{Error, ErrorKind, Result};

mod response;
pub use response::ResponseBody;

mod list;
pub use list::ListPage;

mod client;
pub use client::Client;
