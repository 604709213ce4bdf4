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

use std::fmt::{self, Debug};

use log::debug;

use keybroker_core::Result;
use keybroker_core::time::{self, SignedDuration, Timestamp};
use keybroker_core::utils::Redact;

/// Tokens are refreshed once they expire in less than this.
pub const TOKEN_BUFFER: SignedDuration = SignedDuration::from_secs(5 * 60);

/// Default session key holding the user id.
pub const SESSION_KEY_USER_ID: &str = "user_id";
/// Default session key holding the user password.
pub const SESSION_KEY_PASSWORD: &str = "password";
/// Default session key holding the cached token.
pub const SESSION_KEY_TOKEN: &str = "keystone_token";
/// Default session key holding the cached token expiration.
pub const SESSION_KEY_TOKEN_EXPIRATION: &str = "keystone_expiration";
/// Default session key holding the project the cached token is scoped to.
pub const SESSION_KEY_TOKEN_PROJECT: &str = "keystone_project";

/// Names of the session keys the broker reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    /// Key of the numeric user id, written by the host on login.
    pub user_id: String,
    /// Key of the user password, written by the host on login.
    pub password: String,
    /// Key of the cached token.
    pub token: String,
    /// Key of the cached token expiration.
    pub token_expiration: String,
    /// Key of the project the cached token is scoped to.
    pub token_project: String,
}

impl Default for SessionKeys {
    fn default() -> Self {
        Self {
            user_id: SESSION_KEY_USER_ID.to_string(),
            password: SESSION_KEY_PASSWORD.to_string(),
            token: SESSION_KEY_TOKEN.to_string(),
            token_expiration: SESSION_KEY_TOKEN_EXPIRATION.to_string(),
            token_project: SESSION_KEY_TOKEN_PROJECT.to_string(),
        }
    }
}

/// Clock provides the current time to the broker.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Return the current time.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        time::now()
    }
}

/// Token state cached in the session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CachedToken {
    /// The bearer token.
    pub token: Option<String>,
    /// The token expiration in RFC3339.
    pub expiration: Option<String>,
    /// Name of the project the token is scoped to.
    pub project: Option<String>,
}

impl Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &Redact::from(&self.token))
            .field("expiration", &self.expiration)
            .field("project", &self.project)
            .finish()
    }
}

/// TokenCache decides whether a cached token may be reused.
#[derive(Debug, Clone, Copy)]
pub struct TokenCache {
    buffer: SignedDuration,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    /// Create a cache with the default [`TOKEN_BUFFER`].
    pub fn new() -> Self {
        Self {
            buffer: TOKEN_BUFFER,
        }
    }

    /// Override the refresh buffer.
    pub fn with_buffer(mut self, buffer: SignedDuration) -> Self {
        self.buffer = buffer;
        self
    }

    /// Return the refresh buffer.
    pub fn buffer(&self) -> SignedDuration {
        self.buffer
    }

    /// Check whether `cached` can be used for `current_org` at `now`.
    ///
    /// A missing token or expiration is a plain cache miss. An expiration that
    /// is present but can't be parsed is returned as an
    /// [`ErrorKind::ExpirationInvalid`](keybroker_core::ErrorKind::ExpirationInvalid)
    /// error so it can be told apart from a miss.
    pub fn is_valid(
        &self,
        cached: &CachedToken,
        current_org: &str,
        now: Timestamp,
    ) -> Result<bool> {
        if cached.token.is_none() {
            debug!("no cached keystone token");
            return Ok(false);
        }

        let expiration = match cached.expiration.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => {
                debug!("cached keystone token has no expiration");
                return Ok(false);
            }
        };
        let expires_at = time::parse_rfc3339(expiration)?;

        let Some(refresh_at) = time::refresh_deadline(expires_at, self.buffer) else {
            return Ok(false);
        };
        if now >= refresh_at {
            debug!("cached keystone token expires at {expires_at}, refreshing");
            return Ok(false);
        }

        if cached.project.as_deref() != Some(current_org) {
            debug!(
                "cached keystone token is scoped to {:?}, current organization is {current_org}",
                cached.project
            );
            return Ok(false);
        }

        Ok(true)
    }
}
