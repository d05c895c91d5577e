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

/// Marker for headers and query parameters that take part in signing.
pub const CUSTOM_PREFIX: &str = "x-iwop-";

/// Query parameter carrying the access id in query mode.
pub const QUERY_ACCESS_ID: &str = "AccessId";
/// Query parameter carrying the expiry (unix seconds) in query mode.
pub const QUERY_EXPIRES: &str = "Expires";
/// Query parameter carrying the signature in query mode.
pub const QUERY_SIGNATURE: &str = "Signature";
/// Query parameters reserved for authentication; never part of the canonicalized resource.
pub const QUERY_KEYS: [&str; 3] = [QUERY_ACCESS_ID, QUERY_EXPIRES, QUERY_SIGNATURE];

pub(crate) const AUTHORIZATION_SCHEME: &str = "IWOP";

/// Expiry window used by query mode when neither the call nor the config sets one.
pub const DEFAULT_QUERY_DURATION: Duration = Duration::from_secs(3600);

pub(crate) const DEFAULT_JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Env holding the access id.
pub const IWOP_ACCESS_ID: &str = "IWOP_ACCESS_ID";
/// Env holding the shared secret.
pub const IWOP_SECRET: &str = "IWOP_SECRET";
/// Env holding the default query mode expiry window in seconds.
pub const IWOP_QUERY_DURATION: &str = "IWOP_QUERY_DURATION";
/// Env switching on signature diagnostics (`true` or `1`).
pub const IWOP_DEBUG: &str = "IWOP_DEBUG";
