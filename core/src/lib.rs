//! Core components for signing and sending object storage requests.
//!
//! This crate provides the foundational types and traits shared by the s3lite
//! workspace: the error type, hashing and time helpers, the [`Context`] that
//! carries the HTTP transport, and the [`SignRequest`] trait implemented by
//! request signers.
//!
//! ## Overview
//!
//! - **Context**: A container that holds the [`HttpSend`] implementation used to reach the network
//! - **Traits**: [`SignRequest`] for request signing and [`SigningCredential`] for credential validation
//! - **SigningRequest**: A mutable view over `http::request::Parts` that signers canonicalize and apply back
//!
//! ## Example
//!
//! ```no_run
//! use s3lite_core::{Context, SignRequest, SigningCredential, SigningRequest};
//! use async_trait::async_trait;
//! use http::request::Parts;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     token: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.token.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct BearerSigner;
//!
//! #[async_trait]
//! impl SignRequest for BearerSigner {
//!     type Credential = MyCredential;
//!
//!     async fn sign_request(
//!         &self,
//!         _ctx: &Context,
//!         req: &mut Parts,
//!         _body: Option<&[u8]>,
//!         cred: Option<&Self::Credential>,
//!     ) -> s3lite_core::Result<()> {
//!         let mut signing = SigningRequest::build(req)?;
//!         if let Some(cred) = cred {
//!             signing.headers.insert(
//!                 http::header::AUTHORIZATION,
//!                 format!("Bearer {}", cred.token).parse()?,
//!             );
//!         }
//!         signing.apply(req)
//!     }
//! }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::HttpSend;
pub use context::NoopHttpSend;

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{SignRequest, SigningCredential};
mod request;
pub use request::SigningRequest;
