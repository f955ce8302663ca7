//! AWS SigV4 signer.
//!
//! ## Example
//!
//! ```
//! use sigv4_aws::{Credential, RequestSigner};
//!
//! # fn main() -> sigv4_core::Result<()> {
//! let signer = RequestSigner::new();
//! let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
//!
//! let mut req = http::Request::get("https://iam.amazonaws.com/?Action=ListUsers").body(())?;
//! signer.sign(&mut req, Some(&cred))?;
//! assert!(req.headers().contains_key(http::header::AUTHORIZATION));
//! # Ok(())
//! # }
//! ```
//!
//! Use [`sigv4_core::Signer`] with a credential provider to load credentials on
//! every request:
//!
//! ```
//! use sigv4_aws::{EnvCredentialProvider, RequestSigner};
//! use sigv4_core::{Context, OsEnv, Signer, SigningMethod};
//!
//! # fn main() -> sigv4_core::Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let signer = Signer::new(ctx, EnvCredentialProvider::new(), RequestSigner::new());
//!
//! let mut req = http::Request::get("https://s3.amazonaws.com/bucket/key").body(())?;
//! signer.sign(&mut req, SigningMethod::Query(None))?;
//! # Ok(())
//! # }
//! ```

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod canonical;
pub use canonical::{needs_signing, CanonicalRequest};

mod endpoint;
pub use endpoint::{parse_region_name, parse_service_name};

mod sign_request;
pub use sign_request::{
    generate_signing_key, unsigned_payload, ContentHashFn, HeaderSigningResult,
    ProcessPayloadFn, RequestSigner,
};

mod provide_credential;
pub use provide_credential::*;

mod constants;
pub use constants::{MAX_PRESIGN_EXPIRES, UNSIGNED_PAYLOAD};
