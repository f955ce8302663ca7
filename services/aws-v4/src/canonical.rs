//! Canonical request of [AWS SigV4](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html#create-canonical-request).

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

use http::HeaderMap;
use http::Method;
use percent_encoding::percent_decode_str;
use percent_encoding::percent_encode;
use percent_encoding::utf8_percent_encode;
use sigv4_core::Result;
use sigv4_core::SigningRequest;

use crate::constants::AWS_QUERY_ENCODE_SET;
use crate::constants::AWS_URI_ENCODE_SET;

/// Check if a header takes part in the signature.
///
/// `name` must be lowercase, which is always the case for `http::HeaderName`.
pub fn needs_signing(name: &str) -> bool {
    matches!(name, "date" | "content-md5" | "host") || name.starts_with("x-amz")
}

/// Names of the headers that take part in the signature, sorted.
///
/// Both the canonical header block and the signed headers list are built
/// from this, so they always agree.
pub fn signed_header_names(headers: &HeaderMap) -> Vec<&str> {
    let mut names: Vec<&str> = headers
        .keys()
        .map(|k| k.as_str())
        .filter(|k| needs_signing(k))
        .collect();
    names.sort_unstable();
    names
}

/// Build the canonical URI from a path as it appears in a URI.
///
/// Every segment is normalized to the AWS encoding, so an encoded `/` inside
/// a segment stays encoded. With `double_url_encode` the result is encoded
/// once more, as most services except S3 expect.
pub fn canonical_uri(path: &str, double_url_encode: bool) -> String {
    let mut uri = String::with_capacity(path.len());
    for (idx, segment) in path.split('/').enumerate() {
        if idx != 0 {
            uri.push('/');
        }
        let raw: Vec<u8> = percent_decode_str(segment).collect();
        uri.extend(percent_encode(&raw, &AWS_QUERY_ENCODE_SET));
    }

    if double_url_encode {
        uri = utf8_percent_encode(&uri, &AWS_URI_ENCODE_SET).to_string();
    }

    if uri.is_empty() {
        return "/".to_string();
    }
    if !uri.starts_with('/') {
        uri.insert(0, '/');
    }
    uri
}

/// Build the canonical query string: pairs encoded one by one, sorted by
/// key and then by value, joined with `&`.
pub fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    pairs.sort_unstable();

    let mut s = String::with_capacity(64);
    for (idx, (k, v)) in pairs.iter().enumerate() {
        if idx != 0 {
            s.push('&');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }
    s
}

/// Replace every run of whitespace with a single space.
fn collapse_whitespace(value: &str, out: &mut String) {
    let mut in_space = false;
    for c in value.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c') {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
}

/// CanonicalRequest is the canonical form of a [`SigningRequest`].
///
/// Its `Display` output is the exact string that gets hashed into the string to sign.
#[derive(Debug, Clone)]
pub struct CanonicalRequest<'a> {
    method: &'a Method,
    uri: String,
    query: String,
    headers: Vec<(&'a str, String)>,
    content_sha256: &'a str,
}

impl<'a> CanonicalRequest<'a> {
    /// Canonicalize `req` with the hex SHA-256 of its payload.
    pub fn new(
        req: &'a SigningRequest,
        content_sha256: &'a str,
        double_url_encode: bool,
    ) -> Result<Self> {
        let query = if req.use_payload_for_query_parameters() {
            String::new()
        } else {
            canonical_query(&req.query)
        };

        let mut headers = Vec::with_capacity(req.headers.len());
        for name in signed_header_names(&req.headers) {
            let mut value = String::new();
            for (idx, v) in req.headers.get_all(name).iter().enumerate() {
                if idx != 0 {
                    value.push(',');
                }
                collapse_whitespace(std::str::from_utf8(v.as_bytes())?, &mut value);
            }
            headers.push((name, value));
        }

        Ok(CanonicalRequest {
            method: &req.method,
            uri: canonical_uri(&req.path, double_url_encode),
            query,
            headers,
            content_sha256,
        })
    }

    /// Signed headers list: the canonical header names joined with `;`.
    pub fn signed_headers(&self) -> String {
        let mut s = String::with_capacity(self.headers.len() * 16);
        for (idx, (name, _)) in self.headers.iter().enumerate() {
            if idx != 0 {
                s.push(';');
            }
            s.push_str(name);
        }
        s
    }

    /// Render the canonical request like [`Display`] does, omitting the value of
    /// `x-amz-security-token` so that the result can be logged.
    pub fn to_loggable_string(&self) -> String {
        let mut s = String::new();
        // Writing into a String never fails.
        let _ = self.write_to(&mut s, true);
        s
    }

    fn write_to(&self, f: &mut impl Write, hide_token: bool) -> std::fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        for (name, value) in &self.headers {
            if hide_token && *name == crate::constants::X_AMZ_SECURITY_TOKEN {
                writeln!(f, "{name}:<redacted>")?;
            } else {
                writeln!(f, "{name}:{value}")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "{}", self.signed_headers())?;
        write!(f, "{}", self.content_sha256)
    }
}

impl Display for CanonicalRequest<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_to(f, false)
    }
}
