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


use http::Method;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use pretty_assertions::assert_eq;
use sigv4_core::Result;
use test_case::test_case;

use super::*;

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn object_uri(name: &str) -> String {
    format!(
        "https://example.amazonaws.com/bucket/{}",
        utf8_percent_encode(name, PATH_SEGMENT)
    )
}

#[test_case("!@#$%^&*()_+-=;:'><,/?.txt"; "special chars")]
#[test_case("test file with spaces.txt"; "spaces")]
#[test_case("文件名.txt"; "unicode")]
#[test_case("a/b/c.txt"; "encoded slashes")]
fn test_double_encoding_matches_aws_sigv4(name: &str) {
    init();

    let mut req = request(Method::GET, &object_uri(name), &[]);
    let expected = reference_signature(
        &req,
        &credential(),
        "us-east-1",
        "service",
        reference_settings(),
    );

    request_signer("us-east-1", "service")
        .sign(&mut req, Some(&credential()))
        .expect("signing must succeed");
    assert_eq!(authorization_signature(&req), expected);
}

#[test_case("!@#$%^&*()_+-=;:'><,/?.txt"; "special chars")]
#[test_case("test file with spaces.txt"; "spaces")]
#[test_case("文件名.txt"; "unicode")]
fn test_single_encoding_matches_aws_sigv4(name: &str) {
    init();

    let mut req = request(Method::GET, &object_uri(name), &[]);
    let mut settings = reference_settings();
    settings.percent_encoding_mode = PercentEncodingMode::Single;
    let expected = reference_signature(&req, &credential(), "us-east-1", "s3", settings);

    request_signer("us-east-1", "s3")
        .with_double_url_encode(false)
        .sign(&mut req, Some(&credential()))
        .expect("signing must succeed");
    assert_eq!(authorization_signature(&req), expected);
}

#[test]
fn test_double_encoding_changes_signature() -> Result<()> {
    init();

    let uri = object_uri("test file with spaces.txt");

    let mut double = request(Method::GET, &uri, &[]);
    request_signer("us-east-1", "service").sign(&mut double, Some(&credential()))?;

    let mut single = request(Method::GET, &uri, &[]);
    request_signer("us-east-1", "service")
        .with_double_url_encode(false)
        .sign(&mut single, Some(&credential()))?;

    assert_ne!(
        authorization_signature(&double),
        authorization_signature(&single)
    );
    Ok(())
}

#[test]
fn test_raw_and_encoded_path_sign_the_same() -> Result<()> {
    init();

    // `http::Uri` keeps some characters unencoded that AWS expects encoded.
    let mut raw = request(
        Method::GET,
        "https://example.amazonaws.com/bucket/a:b@c",
        &[],
    );
    request_signer("us-east-1", "service").sign(&mut raw, Some(&credential()))?;

    let mut encoded = request(
        Method::GET,
        "https://example.amazonaws.com/bucket/a%3Ab%40c",
        &[],
    );
    request_signer("us-east-1", "service").sign(&mut encoded, Some(&credential()))?;

    assert_eq!(
        authorization_signature(&raw),
        authorization_signature(&encoded)
    );
    assert_eq!(raw.uri().path(), "/bucket/a:b@c");
    Ok(())
}

#[test_case("prefix", "a b/c"; "space and slash")]
#[test_case("prefix", "文件"; "unicode")]
#[test_case("marker", "~-._"; "unreserved")]
fn test_query_values_match_aws_sigv4(key: &str, value: &str) {
    init();

    let uri = format!(
        "https://example.amazonaws.com/bucket?{key}={}",
        utf8_percent_encode(value, PATH_SEGMENT)
    );
    let mut req = request(Method::GET, &uri, &[]);
    let expected = reference_signature(
        &req,
        &credential(),
        "us-east-1",
        "service",
        reference_settings(),
    );

    request_signer("us-east-1", "service")
        .sign(&mut req, Some(&credential()))
        .expect("signing must succeed");
    assert_eq!(authorization_signature(&req), expected);
}
