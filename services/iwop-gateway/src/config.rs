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

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use iwopsign_core::{utils::Redact, Context};
use log::warn;

use crate::constants::*;

/// Config carries all the configuration for signing IWOP gateway requests.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`IWOP_ACCESS_ID`]
    pub access_id: Option<String>,
    /// `secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`IWOP_SECRET`]
    pub secret: Option<String>,
    /// Default expiry window for query mode signatures.
    ///
    /// Loaded from env [`IWOP_QUERY_DURATION`] (seconds) if unset, and falls
    /// back to [`DEFAULT_QUERY_DURATION`].
    pub query_duration: Option<Duration>,
    /// Report every canonical string and signature to the log.
    ///
    /// Switched on by env [`IWOP_DEBUG`] set to `true` or `1`.
    pub debug: bool,
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set access_id
    pub fn with_access_id(mut self, access_id: impl Into<String>) -> Self {
        self.access_id = Some(access_id.into());
        self
    }

    /// Set secret
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the default query mode expiry window
    pub fn with_query_duration(mut self, duration: Duration) -> Self {
        self.query_duration = Some(duration);
        self
    }

    /// Set debug
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(IWOP_ACCESS_ID) {
            self.access_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(IWOP_SECRET) {
            self.secret.get_or_insert(v);
        }
        if self.query_duration.is_none() {
            if let Some(v) = ctx.env_var(IWOP_QUERY_DURATION) {
                match v.trim().parse::<u64>() {
                    Ok(secs) => self.query_duration = Some(Duration::from_secs(secs)),
                    Err(e) => warn!("ignore invalid {IWOP_QUERY_DURATION} '{v}': {e}"),
                }
            }
        }
        if !self.debug {
            self.debug = matches!(ctx.env_var(IWOP_DEBUG).as_deref(), Some("true" | "1"));
        }

        self
    }

    /// The effective query mode expiry window.
    pub fn query_duration(&self) -> Duration {
        self.query_duration.unwrap_or(DEFAULT_QUERY_DURATION)
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_id", &Redact::from(&self.access_id))
            .field("secret", &Redact::from(&self.secret))
            .field("query_duration", &self.query_duration)
            .field("debug", &self.debug)
            .finish()
    }
}
