// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.


use std::time::Duration;
use std::time::SystemTime;

use aws_credential_types::Credentials;
pub use aws_sigv4::http_request::PercentEncodingMode;
use aws_sigv4::http_request::PayloadChecksumKind;
use aws_sigv4::http_request::SignableBody;
use aws_sigv4::http_request::SignableRequest;
use aws_sigv4::http_request::SignatureLocation;
use aws_sigv4::http_request::SigningSettings;
use aws_sigv4::sign::v4;
use sigv4_aws::Credential;
use sigv4_aws::RequestSigner;
use sigv4_core::time::parse_rfc3339;
use sigv4_core::time::DateTime;

mod presigned;
mod special_chars;

/// Credential used by the AWS SigV4 test suite.
pub const ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
pub const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 2015-08-30T12:36:00Z, the time used by the AWS SigV4 test suite.
pub fn signing_time() -> DateTime {
    parse_rfc3339("2015-08-30T12:36:00Z").expect("time must be valid")
}

pub fn credential() -> Credential {
    Credential::new(ACCESS_KEY_ID, SECRET_ACCESS_KEY)
}

pub fn request_signer(region: &str, service: &str) -> RequestSigner {
    RequestSigner::new()
        .with_region(region)
        .with_service(service)
        .with_time(signing_time())
}

pub fn request(method: http::Method, uri: &str, headers: &[(&str, &str)]) -> http::Request<&'static str> {
    let mut req = http::Request::new("");
    *req.method_mut() = method;
    *req.uri_mut() = uri.parse().expect("uri must be valid");
    for (k, v) in headers {
        req.headers_mut().insert(
            http::HeaderName::try_from(*k).expect("header name must be valid"),
            http::HeaderValue::from_str(v).expect("header value must be valid"),
        );
    }
    req
}

/// Settings matching [`RequestSigner`] defaults: double encoded paths and no
/// `x-amz-content-sha256` header.
pub fn reference_settings() -> SigningSettings {
    let mut ss = SigningSettings::default();
    ss.percent_encoding_mode = PercentEncodingMode::Double;
    ss.payload_checksum_kind = PayloadChecksumKind::NoHeader;
    ss
}

pub fn reference_presign_settings(expires_in: Duration) -> SigningSettings {
    let mut ss = reference_settings();
    ss.signature_location = SignatureLocation::QueryParams;
    ss.expires_in = Some(expires_in);
    ss
}

/// Sign `req` with `aws-sigv4` and return the hex signature.
pub fn reference_signature(
    req: &http::Request<&'static str>,
    cred: &Credential,
    region: &str,
    service: &str,
    settings: SigningSettings,
) -> String {
    let id = Credentials::new(
        cred.access_key_id.clone(),
        cred.secret_access_key.clone(),
        cred.session_token.clone(),
        None,
        "test",
    )
    .into();
    let sp = v4::SigningParams::builder()
        .identity(&id)
        .region(region)
        .name(service)
        .time(SystemTime::from(signing_time()))
        .settings(settings)
        .build()
        .expect("signing params must be valid");

    let output = aws_sigv4::http_request::sign(
        SignableRequest::new(
            req.method().as_str(),
            req.uri().to_string(),
            req.headers().iter().map(|(k, v)| {
                (
                    k.as_str(),
                    std::str::from_utf8(v.as_bytes()).expect("header value must be utf-8"),
                )
            }),
            SignableBody::Bytes(req.body().as_bytes()),
        )
        .expect("request must be signable"),
        &sp.into(),
    )
    .expect("reference signing must succeed");
    let (_, signature) = output.into_parts();
    signature
}

/// Extract `Signature=` from an `Authorization` header.
pub fn authorization_signature(req: &http::Request<&'static str>) -> String {
    authorization_part(req, "Signature=")
}

/// Extract `SignedHeaders=` from an `Authorization` header.
pub fn authorization_signed_headers(req: &http::Request<&'static str>) -> String {
    authorization_part(req, "SignedHeaders=")
}

fn authorization_part(req: &http::Request<&'static str>, prefix: &str) -> String {
    let auth = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .expect("authorization header must exist")
        .to_str()
        .expect("authorization header must be valid");
    auth.split(", ")
        .find_map(|part| part.rsplit(' ').next()?.strip_prefix(prefix))
        .expect("authorization part must exist")
        .to_string()
}

/// Extract a query parameter from a presigned request.
pub fn query_param(req: &http::Request<&'static str>, key: &str) -> Option<String> {
    form_urlencoded::parse(req.uri().query().unwrap_or_default().as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
