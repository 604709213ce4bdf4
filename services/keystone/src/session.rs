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

use std::collections::HashMap;
use std::fmt::{self, Debug};

use keybroker_core::utils::Redact;
use keybroker_core::{Error, Result};

use crate::cache::{CachedToken, SessionKeys};
use crate::codec::AuthResult;

/// SessionStore is the host application's per-session key/value store.
///
/// One session is driven by at most one request at a time, so implementations
/// need no locking of their own.
pub trait SessionStore: Send {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);
}

/// In-memory session store.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// Typed view of everything the broker reads from a session.
#[derive(Clone, Default)]
pub struct SessionState {
    /// Id of the logged in user, as stored by the host.
    ///
    /// Parsed by [`require_user_id`](Self::require_user_id) so a cached token
    /// stays usable even when the id is malformed.
    pub user_id: Option<String>,
    /// Password of the logged in user.
    pub password: Option<String>,
    /// Token state cached by a previous acquisition.
    pub cached: CachedToken,
}

impl Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("user_id", &self.user_id)
            .field("password", &Redact::from(&self.password))
            .field("cached", &self.cached)
            .finish()
    }
}

impl SessionState {
    /// Read every field the broker relies on from the session at once.
    pub fn load(store: &impl SessionStore, keys: &SessionKeys) -> Self {
        Self {
            user_id: store.get(&keys.user_id),
            password: store.get(&keys.password),
            cached: CachedToken {
                token: store.get(&keys.token),
                expiration: store.get(&keys.token_expiration),
                project: store.get(&keys.token_project),
            },
        }
    }

    /// Return the numeric user id or fail with `SessionExpired`.
    pub fn require_user_id(&self) -> Result<i64> {
        let user_id = self
            .user_id
            .as_deref()
            .ok_or_else(|| Error::session_expired("session timed out trying to get user id"))?;

        user_id.trim().parse::<i64>().map_err(|e| {
            Error::session_expired("session user id is not a number")
                .with_source(e)
                .with_context(format!("user_id: {user_id}"))
        })
    }

    /// Return the password or fail with `SessionExpired`.
    pub fn require_password(&self) -> Result<&str> {
        self.password
            .as_deref()
            .ok_or_else(|| Error::session_expired("session timed out trying to get password"))
    }
}

/// Write a freshly issued token back into the session.
pub fn store_token(
    store: &mut impl SessionStore,
    keys: &SessionKeys,
    result: &AuthResult,
    project: &str,
) {
    store.set(&keys.token, result.token.clone());
    store.set(&keys.token_expiration, result.expiration.clone());
    store.set(&keys.token_project, project.to_string());
}
