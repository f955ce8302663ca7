use std::borrow::Cow;
use std::io::Write;
use std::str::FromStr;

use bytes::Bytes;
use http::header::AsHeaderName;
use http::header::IntoHeaderName;
use http::header::CONTENT_TYPE;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use crate::hash::finish_hex_sha256;
use crate::hash::sha256_hasher;
use crate::time::DateTime;
use crate::Error;
use crate::Payload;
use crate::Result;

/// Query components are encoded with the RFC 3986 unreserved set.
static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Per-request clock skew in seconds, stored in [`http::Request::extensions`].
///
/// A positive value means the local clock runs ahead of the server's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOffset(pub i64);

/// Marker stored in [`http::Request::extensions`] asking the signer to surface the
/// computed body hash in the `x-amz-content-sha256` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentSha256Required;

/// Signing context for request.
///
/// It's a working copy of the request: signers mutate it freely and the
/// original request is only touched by [`SigningRequest::apply`].
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as it appears in the URI.
    pub path: String,
    /// HTTP query parameters, percent decoded, in request order.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,

    /// Clock skew carried by the request.
    pub time_offset: Option<i64>,
    /// Whether the body hash must be sent as `x-amz-content-sha256`.
    pub content_sha256_required: bool,

    payload_as_query: bool,
    /// Query text and pairs of the caller's request, kept so that `apply`
    /// leaves them byte for byte.
    raw_query: Option<String>,
    raw_query_pairs: Vec<(String, String)>,
}

impl SigningRequest {
    /// Build a signing context from `http::Request`.
    pub fn build<B: Payload>(req: &http::Request<B>) -> Result<Self> {
        let uri = req.uri().clone().into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        let raw_query = paq.query().filter(|v| !v.is_empty()).map(str::to_string);
        let query: Vec<(String, String)> = raw_query
            .as_deref()
            .map(|v| {
                form_urlencoded::parse(v.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(SigningRequest {
            method: req.method().clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            payload_as_query: payload_as_query(
                req.method(),
                req.body().is_absent(),
                &query,
                req.headers(),
            ),
            raw_query_pairs: query.clone(),
            raw_query,
            query,
            headers: req.headers().clone(),

            time_offset: req.extensions().get::<TimeOffset>().map(|v| v.0),
            content_sha256_required: req.extensions().get::<ContentSha256Required>().is_some(),
        })
    }

    /// Apply the signing context back to `http::Request`.
    ///
    /// The request body is never touched. When the caller's parameters are
    /// still in front of the query list, their original text is kept and only
    /// the pairs pushed afterwards are encoded.
    pub fn apply<B>(self, req: &mut http::Request<B>) -> Result<()> {
        let query = match &self.raw_query {
            Some(raw) if self.query.starts_with(&self.raw_query_pairs) => {
                let pushed = &self.query[self.raw_query_pairs.len()..];
                if pushed.is_empty() {
                    raw.clone()
                } else {
                    format!("{raw}&{}", Self::encode_query(pushed))
                }
            }
            _ => Self::encode_query(&self.query),
        };

        let mut paq = self.path;
        if !query.is_empty() {
            paq.push('?');
            paq.push_str(&query);
        }

        let mut uri_parts = req.uri().clone().into_parts();
        uri_parts.scheme = Some(self.scheme);
        uri_parts.authority = Some(self.authority);
        uri_parts.path_and_query = Some(PathAndQuery::from_str(&paq)?);
        let uri = Uri::from_parts(uri_parts)?;

        *req.uri_mut() = uri;
        *req.method_mut() = self.method;
        *req.headers_mut() = self.headers;
        Ok(())
    }

    /// Get the path percent decoded.
    pub fn path_percent_decoded(&self) -> Cow<'_, str> {
        percent_encoding::percent_decode_str(&self.path).decode_utf8_lossy()
    }

    /// Get the host and port used to reach the endpoint.
    ///
    /// The port is only included when it isn't the default one of the scheme.
    pub fn host_port(&self) -> String {
        let host = self.authority.host();
        match self.authority.port_u16() {
            Some(port) if !is_default_port(&self.scheme, port) => format!("{host}:{port}"),
            _ => host.to_string(),
        }
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Encode query pairs as `k=v` joined by `&`, keeping their order.
    pub fn encode_query(query: &[(String, String)]) -> String {
        let mut s = String::with_capacity(16);
        for (idx, (k, v)) in query.iter().enumerate() {
            if idx != 0 {
                s.push('&');
            }
            s.extend(utf8_percent_encode(k, &QUERY_ENCODE_SET));
            s.push('=');
            s.extend(utf8_percent_encode(v, &QUERY_ENCODE_SET));
        }
        s
    }

    /// Insert a header, replacing any existing value.
    pub fn header_insert(&mut self, name: impl IntoHeaderName, value: &str) -> Result<()> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(())
    }

    /// Insert a header whose value must never show up in debug output.
    pub fn header_insert_sensitive(
        &mut self,
        name: impl IntoHeaderName,
        value: &str,
    ) -> Result<()> {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(())
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: impl AsHeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Whether the query parameters travel as a form-urlencoded body.
    ///
    /// That's the case for a POST without body that carries parameters and
    /// declares no content type other than `application/x-www-form-urlencoded`.
    /// It's decided from the caller's request in [`build`](Self::build):
    /// parameters pushed by a signer afterwards don't change the answer.
    #[inline]
    pub fn use_payload_for_query_parameters(&self) -> bool {
        self.payload_as_query
    }

    /// The form-urlencoded parameter string sent as body when
    /// [`use_payload_for_query_parameters`](Self::use_payload_for_query_parameters) holds.
    pub fn encoded_parameters(&self) -> String {
        Self::encode_query(&self.query)
    }

    /// Copy the payload that is signed for this request into `w`.
    ///
    /// This is the single source for both [`payload`](Self::payload) and
    /// [`payload_hash`](Self::payload_hash).
    pub fn copy_payload_to(&self, body: &mut dyn Payload, w: &mut dyn Write) -> Result<u64> {
        if self.use_payload_for_query_parameters() {
            let params = self.encoded_parameters();
            w.write_all(params.as_bytes())?;
            return Ok(params.len() as u64);
        }

        body.copy_to(w)
    }

    /// Get the payload that is signed for this request.
    pub fn payload(&self, body: &mut dyn Payload) -> Result<Bytes> {
        let mut buf = Vec::new();
        self.copy_payload_to(body, &mut buf)?;
        Ok(buf.into())
    }

    /// Get the lowercase hex SHA-256 of the payload that is signed for this request.
    ///
    /// The body is streamed through the hasher and rewound afterwards.
    pub fn payload_hash(&self, body: &mut dyn Payload) -> Result<String> {
        let mut hasher = sha256_hasher();
        self.copy_payload_to(body, &mut hasher)?;
        Ok(finish_hex_sha256(hasher))
    }
}

fn payload_as_query(
    method: &Method,
    body_absent: bool,
    query: &[(String, String)],
    headers: &HeaderMap,
) -> bool {
    if *method != Method::POST || !body_absent || query.is_empty() {
        return false;
    }

    match headers.get(CONTENT_TYPE) {
        None => true,
        Some(v) => v
            .as_bytes()
            .to_ascii_lowercase()
            .starts_with(b"application/x-www-form-urlencoded"),
    }
}

fn is_default_port(scheme: &Scheme, port: u16) -> bool {
    (*scheme == Scheme::HTTP && port == 80) || (*scheme == Scheme::HTTPS && port == 443)
}

/// SigningMethod is the method that used in signing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SigningMethod {
    /// Signing with header.
    Header,
    /// Signing with query, valid until the given instant.
    ///
    /// `None` asks for the longest window the signer allows.
    Query(Option<DateTime>),
}
