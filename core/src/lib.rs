//! Core components for signing API requests.
//!
//! This crate provides the foundational types and traits shared by signers.
//!
//! ## Overview
//!
//! - **Context**: the environment credential providers read from
//! - **Payload**: a request body that can be hashed and then sent
//! - **SigningRequest**: a working copy of the request that signers mutate
//! - **Traits**: credential loading (`ProvideCredential`) and request signing (`SignRequest`)
//! - **Signer**: ties a provider and a request signer together
//!
//! ## Example
//!
//! ```
//! use sigv4_core::{
//!     Context, Payload, ProvideCredential, Result, SignRequest, Signer, SigningCredential,
//!     SigningMethod, SigningRequest,
//! };
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
//! struct MyLoader;
//!
//! impl ProvideCredential for MyLoader {
//!     type Credential = MyCredential;
//!
//!     fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
//!         Ok(Some(MyCredential {
//!             token: "my-token".to_string(),
//!         }))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyBuilder;
//!
//! impl SignRequest for MyBuilder {
//!     type Credential = MyCredential;
//!
//!     fn sign_request(
//!         &self,
//!         req: &mut SigningRequest,
//!         _: &mut dyn Payload,
//!         credential: Option<&Self::Credential>,
//!         _: SigningMethod,
//!     ) -> Result<()> {
//!         if let Some(cred) = credential {
//!             req.header_insert(http::header::AUTHORIZATION, &format!("Bearer {}", cred.token))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let signer = Signer::new(Context::default(), MyLoader, MyBuilder);
//!
//! let mut req = http::Request::get("https://example.com").body(())?;
//! signer.sign(&mut req, SigningMethod::Header)?;
//! assert_eq!(req.headers()["authorization"], "Bearer my-token");
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::NoopEnv;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};

mod body;
pub use body::{Body, Payload, ReadSeek};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod request;
pub use request::{ContentSha256Required, SigningMethod, SigningRequest, TimeOffset};
mod signer;
pub use signer::Signer;
