use std::sync::Arc;

use log::debug;

use crate::Context;
use crate::Error;
use crate::Payload;
use crate::ProvideCredential;
use crate::Result;
use crate::SignRequest;
use crate::SigningCredential;
use crate::SigningMethod;
use crate::SigningRequest;

/// Signer is the main struct used to sign the request.
///
/// Credentials are loaded on every call and never cached.
#[derive(Clone, Debug)]
pub struct Signer<C: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = C>>,
    builder: Arc<dyn SignRequest<Credential = C>>,
}

impl<C: SigningCredential> Signer<C> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = C>,
        builder: impl SignRequest<Credential = C>,
    ) -> Self {
        Self {
            ctx,

            loader: Arc::new(loader),
            builder: Arc::new(builder),
        }
    }

    /// Signing request.
    ///
    /// The request is only modified when signing succeeds.
    pub fn sign<B: Payload>(
        &self,
        req: &mut http::Request<B>,
        method: SigningMethod,
    ) -> Result<()> {
        let credential = self.loader.provide_credential(&self.ctx)?;
        match &credential {
            Some(c) if !c.is_valid() => {
                return Err(Error::credential_invalid(
                    "loaded credential is incomplete or expired",
                ));
            }
            Some(_) => {}
            None => debug!("no credential loaded, request is left unsigned"),
        }

        let mut signing = SigningRequest::build(req)?;
        self.builder
            .sign_request(&mut signing, req.body_mut(), credential.as_ref(), method)?;
        signing.apply(req)
    }
}
