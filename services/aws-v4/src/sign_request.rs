use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;

use chrono::TimeDelta;
use http::header;
use log::debug;
use log::trace;
use sigv4_core::hash::hex_sha256;
use sigv4_core::hash::hmac_sha256;
use sigv4_core::hash::EMPTY_SHA256;
use sigv4_core::time::apply_skew;
use sigv4_core::time::format_date;
use sigv4_core::time::format_iso8601;
use sigv4_core::time::now;
use sigv4_core::time::DateTime;
use sigv4_core::Error;
use sigv4_core::Payload;
use sigv4_core::Result;
use sigv4_core::SignRequest;
use sigv4_core::SigningMethod;
use sigv4_core::SigningRequest;

use crate::canonical::signed_header_names;
use crate::canonical::CanonicalRequest;
use crate::constants::*;
use crate::endpoint::parse_region_name;
use crate::endpoint::parse_service_name;
use crate::Config;
use crate::Credential;

/// Strategy computing the hex SHA-256 that ends the canonical request.
pub type ContentHashFn =
    Arc<dyn Fn(&SigningRequest, &mut dyn Payload) -> Result<String> + Send + Sync>;

/// Hook called after a request got its `Authorization` header, for example to
/// rewrite the body into a chunked upload signed with the same key.
pub type ProcessPayloadFn =
    Arc<dyn Fn(&mut SigningRequest, &HeaderSigningResult) -> Result<()> + Send + Sync>;

/// Content hash strategy that leaves the payload unsigned.
///
/// S3 accepts it for presigned URLs:
///
/// ```
/// use sigv4_aws::{unsigned_payload, RequestSigner};
///
/// let signer = RequestSigner::new()
///     .with_service("s3")
///     .with_content_hash_presign(unsigned_payload);
/// ```
pub fn unsigned_payload(_: &SigningRequest, _: &mut dyn Payload) -> Result<String> {
    Ok(UNSIGNED_PAYLOAD.to_string())
}

/// HeaderSigningResult carries the material produced by a header signing.
#[derive(Clone)]
pub struct HeaderSigningResult {
    date_time: String,
    scope: String,
    signing_key: Vec<u8>,
    signature: Vec<u8>,
}

impl HeaderSigningResult {
    /// Signing time in ISO 8601 basic format: `20150830T123600Z`.
    pub fn date_time(&self) -> &str {
        &self.date_time
    }

    /// Credential scope: `20150830/us-east-1/iam/aws4_request`.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Derived signing key.
    pub fn signing_key(&self) -> Vec<u8> {
        self.signing_key.clone()
    }

    /// Raw signature.
    pub fn signature(&self) -> Vec<u8> {
        self.signature.clone()
    }

    /// Signature in lowercase hex, as sent in the `Authorization` header.
    pub fn signature_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

impl Debug for HeaderSigningResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderSigningResult")
            .field("date_time", &self.date_time)
            .field("scope", &self.scope)
            .field("signing_key", &"<redacted>")
            .field("signature", &self.signature_hex())
            .finish()
    }
}

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// Configuration is fixed once built, so a signer can be shared between threads.
#[derive(Clone)]
pub struct RequestSigner {
    service: Option<String>,
    region: Option<String>,
    double_url_encode: bool,
    time_offset: i64,

    time: Option<DateTime>,

    content_hash: Option<ContentHashFn>,
    content_hash_presign: Option<ContentHashFn>,
    payload_processor: Option<ProcessPayloadFn>,
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RequestSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("service", &self.service)
            .field("region", &self.region)
            .field("double_url_encode", &self.double_url_encode)
            .field("time_offset", &self.time_offset)
            .field("time", &self.time)
            .field("content_hash", &self.content_hash.is_some())
            .field("content_hash_presign", &self.content_hash_presign.is_some())
            .field("payload_processor", &self.payload_processor.is_some())
            .finish()
    }
}

impl RequestSigner {
    /// Create a new signer.
    ///
    /// Service and region are parsed from the request host unless set.
    pub fn new() -> Self {
        Self {
            service: None,
            region: None,
            double_url_encode: true,
            time_offset: 0,

            time: None,

            content_hash: None,
            content_hash_presign: None,
            payload_processor: None,
        }
    }

    /// Create a signer from [`Config`].
    pub fn from_config(cfg: &Config) -> Self {
        let mut signer = Self::new()
            .with_double_url_encode(cfg.double_url_encode)
            .with_time_offset(cfg.time_offset);
        if let Some(service) = &cfg.service {
            signer = signer.with_service(service);
        }
        if let Some(region) = &cfg.region {
            signer = signer.with_region(region);
        }
        signer
    }

    /// Set the service name instead of parsing it from the host.
    pub fn with_service(mut self, service: &str) -> Self {
        self.service = Some(service.to_string());
        self
    }

    /// Set the region name instead of parsing it from the host.
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set whether the canonical URI is encoded twice. Default to `true`.
    pub fn with_double_url_encode(mut self, double_url_encode: bool) -> Self {
        self.double_url_encode = double_url_encode;
        self
    }

    /// Set the clock skew in seconds used for every request.
    ///
    /// A non-zero value takes precedence over the [`TimeOffset`](sigv4_core::TimeOffset)
    /// carried by a request.
    pub fn with_time_offset(mut self, offset: i64) -> Self {
        self.time_offset = offset;
        self
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

    /// Replace how the body hash is computed when signing with headers.
    pub fn with_content_hash(
        mut self,
        f: impl Fn(&SigningRequest, &mut dyn Payload) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.content_hash = Some(Arc::new(f));
        self
    }

    /// Replace how the body hash is computed when presigning.
    pub fn with_content_hash_presign(
        mut self,
        f: impl Fn(&SigningRequest, &mut dyn Payload) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.content_hash_presign = Some(Arc::new(f));
        self
    }

    /// Run `f` once a request has been signed with headers.
    pub fn with_payload_processor(
        mut self,
        f: impl Fn(&mut SigningRequest, &HeaderSigningResult) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.payload_processor = Some(Arc::new(f));
        self
    }

    /// Build the canonical request of `req` ending with `content_sha256`.
    pub fn canonicalize<'a>(
        &self,
        req: &'a SigningRequest,
        content_sha256: &'a str,
    ) -> Result<CanonicalRequest<'a>> {
        CanonicalRequest::new(req, content_sha256, self.double_url_encode)
    }

    /// Sign `string_to_sign` with a key derived by [`generate_signing_key`].
    pub fn compute_signature(&self, string_to_sign: &str, signing_key: &[u8]) -> Result<Vec<u8>> {
        hmac_sha256(signing_key, string_to_sign.as_bytes())
    }

    /// Sign a request with the `Authorization` header.
    ///
    /// `None` credential means anonymous access: the request is left untouched and
    /// `Ok(None)` is returned. On error the request is left untouched as well.
    pub fn sign<B: Payload>(
        &self,
        req: &mut http::Request<B>,
        credential: Option<&Credential>,
    ) -> Result<Option<HeaderSigningResult>> {
        let Some(cred) = credential else {
            debug!("anonymous credential, skip signing request");
            return Ok(None);
        };

        let mut signing = SigningRequest::build(req)?;
        let result = self.sign_header(&mut signing, req.body_mut(), cred)?;
        signing.apply(req)?;
        Ok(Some(result))
    }

    /// Presign a request by adding the signature into its query.
    ///
    /// The URL stays valid until `expires_at`, or for seven days when it's `None`.
    pub fn presign<B: Payload>(
        &self,
        req: &mut http::Request<B>,
        credential: Option<&Credential>,
        expires_at: Option<DateTime>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            debug!("anonymous credential, skip presigning request");
            return Ok(());
        };

        let mut signing = SigningRequest::build(req)?;
        self.sign_query(&mut signing, req.body_mut(), cred, expires_at)?;
        signing.apply(req)
    }

    fn signing_time(&self, req: &SigningRequest) -> Result<DateTime> {
        if let Some(time) = self.time {
            return Ok(time);
        }

        let offset = if self.time_offset != 0 {
            self.time_offset
        } else {
            req.time_offset.unwrap_or_default()
        };
        apply_skew(now(), offset)
    }

    fn region_and_service(&self, req: &SigningRequest) -> Result<(String, String)> {
        let host = req.authority.host();
        let service = match &self.service {
            Some(v) => v.clone(),
            None => parse_service_name(host)?,
        };
        let region = match &self.region {
            Some(v) => v.clone(),
            None => parse_region_name(host, Some(&service)),
        };
        Ok((region, service))
    }

    fn sign_header(
        &self,
        req: &mut SigningRequest,
        body: &mut dyn Payload,
        cred: &Credential,
    ) -> Result<HeaderSigningResult> {
        let cred = cred.sanitized();

        if let Some(token) = &cred.session_token {
            req.header_insert_sensitive(X_AMZ_SECURITY_TOKEN, token)?;
        }
        let host = req.host_port();
        req.header_insert(header::HOST, &host)?;

        let now = self.signing_time(req)?;
        let date_time = format_iso8601(now);
        req.header_insert(X_AMZ_DATE, &date_time)?;

        let content_sha256 = match &self.content_hash {
            Some(f) => f(req, body)?,
            None => req.payload_hash(body)?,
        };
        if req.content_sha256_required {
            req.header_insert(X_AMZ_CONTENT_SHA_256, &content_sha256)?;
        }

        let (region, service) = self.region_and_service(req)?;
        let scope = format!("{}/{region}/{service}/{AWS4_REQUEST}", format_date(now));
        debug!("calculated scope: {scope}");

        let creq = self.canonicalize(req, &content_sha256)?;
        trace!("calculated canonical request: {}", creq.to_loggable_string());
        let signed_headers = creq.signed_headers();
        debug!("calculated signed headers: {signed_headers}");

        let string_to_sign = string_to_sign(&date_time, &scope, &creq);
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = generate_signing_key(&cred.secret_access_key, now, &region, &service)?;
        let signature = self.compute_signature(&string_to_sign, &signing_key)?;
        let result = HeaderSigningResult {
            date_time,
            scope,
            signing_key,
            signature,
        };

        req.header_insert_sensitive(
            header::AUTHORIZATION,
            &format!(
                "{ALGORITHM} Credential={}/{}, SignedHeaders={signed_headers}, Signature={}",
                cred.access_key_id,
                result.scope,
                result.signature_hex()
            ),
        )?;

        if let Some(process) = &self.payload_processor {
            process(req, &result)?;
        }
        Ok(result)
    }

    fn sign_query(
        &self,
        req: &mut SigningRequest,
        body: &mut dyn Payload,
        cred: &Credential,
        expires_at: Option<DateTime>,
    ) -> Result<()> {
        let expires_in = match expires_at {
            None => MAX_PRESIGN_EXPIRES,
            Some(expires_at) => whole_seconds_until(self.time.unwrap_or_else(now), expires_at),
        };
        if expires_in > MAX_PRESIGN_EXPIRES {
            return Err(Error::expiration_too_large(format!(
                "presigned url can't be valid for {expires_in} seconds, the maximum is {MAX_PRESIGN_EXPIRES} seconds"
            )));
        }
        if expires_in < 0 {
            return Err(Error::request_invalid(format!(
                "presigned url expiration is {} seconds in the past",
                -expires_in
            )));
        }

        let cred = cred.sanitized();

        // The body hash only covers the parameters given by the caller.
        let content_sha256 = match &self.content_hash_presign {
            Some(f) => f(req, body)?,
            None if req.use_payload_for_query_parameters() => req.payload_hash(body)?,
            None => EMPTY_SHA256.to_string(),
        };

        if let Some(token) = &cred.session_token {
            req.query_push(X_AMZ_SECURITY_TOKEN_QUERY, token);
        }
        let host = req.host_port();
        req.header_insert(header::HOST, &host)?;

        let now = self.signing_time(req)?;
        let date_time = format_iso8601(now);
        let (region, service) = self.region_and_service(req)?;
        let scope = format!("{}/{region}/{service}/{AWS4_REQUEST}", format_date(now));
        debug!("calculated scope: {scope}");

        let signed_headers = signed_header_names(&req.headers).join(";");
        req.query_push(X_AMZ_ALGORITHM_QUERY, ALGORITHM);
        req.query_push(X_AMZ_DATE_QUERY, date_time.as_str());
        req.query_push(X_AMZ_SIGNED_HEADERS_QUERY, signed_headers);
        req.query_push(X_AMZ_EXPIRES_QUERY, expires_in.to_string());
        req.query_push(
            X_AMZ_CREDENTIAL_QUERY,
            format!("{}/{scope}", cred.access_key_id),
        );

        let creq = self.canonicalize(req, &content_sha256)?;
        trace!("calculated canonical request: {}", creq.to_loggable_string());

        let string_to_sign = string_to_sign(&date_time, &scope, &creq);
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key = generate_signing_key(&cred.secret_access_key, now, &region, &service)?;
        let signature = self.compute_signature(&string_to_sign, &signing_key)?;
        req.query_push(X_AMZ_SIGNATURE_QUERY, hex::encode(signature));
        Ok(())
    }
}

impl SignRequest for RequestSigner {
    type Credential = Credential;

    fn sign_request(
        &self,
        req: &mut SigningRequest,
        body: &mut dyn Payload,
        credential: Option<&Self::Credential>,
        method: SigningMethod,
    ) -> Result<()> {
        let Some(cred) = credential else {
            debug!("anonymous credential, skip signing request");
            return Ok(());
        };

        match method {
            SigningMethod::Header => self.sign_header(req, body, cred).map(|_| ()),
            SigningMethod::Query(expires_at) => self.sign_query(req, body, cred, expires_at),
        }
    }
}

/// Whole seconds from `from` until `to`, rounded up.
fn whole_seconds_until(from: DateTime, to: DateTime) -> i64 {
    let delta = to - from;
    let secs = delta.num_seconds();
    if delta > TimeDelta::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}

// StringToSign:
//
// AWS4-HMAC-SHA256
// 20220313T072004Z
// 20220313/<region>/<service>/aws4_request
// <hashed_canonical_request>
fn string_to_sign(date_time: &str, scope: &str, creq: &CanonicalRequest) -> String {
    format!(
        "{ALGORITHM}\n{date_time}\n{scope}\n{}",
        hex_sha256(creq.to_string().as_bytes())
    )
}

/// Derive the signing key of a credential scope.
pub fn generate_signing_key(
    secret: &str,
    time: DateTime,
    region: &str,
    service: &str,
) -> Result<Vec<u8>> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes())?;
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes())?;
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes())?;
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}
