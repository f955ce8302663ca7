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

//! Hash related utils.
//!
//! All digests are rendered as lowercase hex.

use crate::Error;
use crate::Result;
use hmac::Hmac;
use hmac::Mac;
use sha2::Digest;
use sha2::Sha256;

/// Lowercase hex of the SHA-256 of an empty input.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Hex encoded SHA256 hash.
///
/// Use this function instead of `hex::encode(sha256(content))` can reduce
/// extra copy.
pub fn hex_sha256(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content).as_slice())
}

/// Create a SHA256 hasher that can be fed through `std::io::Write`.
pub fn sha256_hasher() -> Sha256 {
    Sha256::new()
}

/// Finish a hasher created by [`sha256_hasher`] into lowercase hex.
pub fn finish_hex_sha256(hasher: Sha256) -> String {
    hex::encode(hasher.finalize().as_slice())
}

fn new_hmac_sha256(key: &[u8]) -> Result<Hmac<Sha256>> {
    Hmac::<Sha256>::new_from_slice(key).map_err(|e| {
        Error::hashing_unavailable("failed to initialize HMAC-SHA256").with_source(
            anyhow::anyhow!("{e}"),
        )
    })
}

/// HMAC with SHA256 hash.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> Result<Vec<u8>> {
    let mut h = new_hmac_sha256(key)?;
    h.update(content);

    Ok(h.finalize().into_bytes().to_vec())
}
