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

use sigv4_core::utils::Redact;
use sigv4_core::Context;
use std::fmt::{Debug, Formatter};

use crate::constants::*;

/// Config for signing requests with AWS SigV4.
#[derive(Clone)]
pub struct Config {
    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`]
    /// - the request host when signing
    pub region: Option<String>,
    /// `service` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - the request host when signing
    pub service: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    pub session_token: Option<String>,
    /// Clock skew in seconds applied to every signing time.
    ///
    /// A positive value means the local clock runs ahead of the server's.
    pub time_offset: i64,
    /// Whether the canonical URI is percent-encoded twice.
    ///
    /// Default to `true`. S3 expects `false`.
    pub double_url_encode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            service: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            time_offset: 0,
            double_url_encode: true,
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("region", &self.region)
            .field("service", &self.service)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("time_offset", &self.time_offset)
            .field("double_url_encode", &self.double_url_encode)
            .finish()
    }
}

impl Config {
    /// Load unset fields from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if self.region.is_none() {
            self.region = envs.get(AWS_REGION).cloned();
        }
        if self.access_key_id.is_none() {
            self.access_key_id = envs.get(AWS_ACCESS_KEY_ID).cloned();
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = envs.get(AWS_SECRET_ACCESS_KEY).cloned();
        }
        if self.session_token.is_none() {
            self.session_token = envs.get(AWS_SESSION_TOKEN).cloned();
        }

        self
    }
}
