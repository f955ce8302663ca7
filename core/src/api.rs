use std::fmt::Debug;

use crate::Context;
use crate::Payload;
use crate::Result;
use crate::SigningMethod;
use crate::SigningRequest;

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is valid.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential is the trait used by signer to load the credential from the environment.
///
/// Returning `Ok(None)` means no credential is available and the request
/// will be sent anonymously.
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this loader.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load signing credential from current env.
    fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used by signer to sign the request.
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this builder.
    type Credential: Send + Sync + Unpin + 'static;

    /// Sign the working copy of a request.
    ///
    /// ## Credential
    ///
    /// `None` means anonymous access: implementations must leave `req` untouched.
    ///
    /// ## Method
    ///
    /// [`SigningMethod::Header`] puts the signature in headers while
    /// [`SigningMethod::Query`] produces a presigned URL. Implementations that
    /// can't presign should return an error.
    fn sign_request(
        &self,
        req: &mut SigningRequest,
        body: &mut dyn Payload,
        credential: Option<&Self::Credential>,
        method: SigningMethod,
    ) -> Result<()>;
}
