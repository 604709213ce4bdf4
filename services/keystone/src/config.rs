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

use keybroker_core::time::SignedDuration;
use keybroker_core::{Context, Error, Result};

use crate::cache::TOKEN_BUFFER;

// Env values used to configure the broker.
pub(crate) const KEYSTONE_URL: &str = "KEYSTONE_URL";
pub(crate) const KEYSTONE_DEFAULT_DOMAIN: &str = "KEYSTONE_DEFAULT_DOMAIN";
pub(crate) const KEYSTONE_TOKEN_BUFFER_MINUTES: &str = "KEYSTONE_TOKEN_BUFFER_MINUTES";

/// Domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "Default";

/// Config carries all the configuration for the Keystone token broker.
#[derive(Clone, Default, Debug)]
pub struct Config {
    /// Base URL of the identity service, without the `/v3` suffix.
    ///
    /// Loaded from env: [`KEYSTONE_URL`]
    pub auth_url: Option<String>,
    /// Domain name used for both users and projects. Defaults to "Default".
    ///
    /// Loaded from env: [`KEYSTONE_DEFAULT_DOMAIN`]
    pub default_domain: Option<String>,
    /// How long before expiration a cached token is refreshed, in minutes. Defaults to 5.
    ///
    /// Loaded from env: [`KEYSTONE_TOKEN_BUFFER_MINUTES`]
    pub token_buffer_minutes: Option<i64>,
}

impl Config {
    /// Load config from the context's environment.
    ///
    /// Fields that are already set take priority over env values.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if let Some(v) = ctx.env_var(KEYSTONE_URL) {
            self.auth_url.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(KEYSTONE_DEFAULT_DOMAIN) {
            self.default_domain.get_or_insert(v);
        }
        if self.token_buffer_minutes.is_none() {
            if let Some(v) = ctx.env_var(KEYSTONE_TOKEN_BUFFER_MINUTES) {
                let minutes = v.trim().parse::<i64>().map_err(|e| {
                    Error::config_invalid("token buffer is not a number of minutes")
                        .with_source(e)
                        .with_context(format!("{KEYSTONE_TOKEN_BUFFER_MINUTES}: {v}"))
                })?;
                self.token_buffer_minutes = Some(minutes);
            }
        }

        Ok(self)
    }

    /// Return the identity service URL, failing if it is not configured.
    pub fn auth_url(&self) -> Result<&str> {
        match self.auth_url.as_deref() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(Error::config_invalid("keystone url is not configured")
                .with_context(format!("hint: set {KEYSTONE_URL}"))),
        }
    }

    /// Return the configured domain or [`DEFAULT_DOMAIN`].
    pub fn default_domain(&self) -> &str {
        match self.default_domain.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => DEFAULT_DOMAIN,
        }
    }

    /// Return the configured refresh buffer or [`TOKEN_BUFFER`].
    pub fn token_buffer(&self) -> Result<SignedDuration> {
        match self.token_buffer_minutes {
            None => Ok(TOKEN_BUFFER),
            Some(v) if (0..=24 * 60).contains(&v) => Ok(SignedDuration::from_secs(v * 60)),
            Some(v) => Err(Error::config_invalid(format!(
                "token buffer of {v} minutes is out of range"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybroker_core::{ErrorKind, StaticEnv};
    use std::collections::HashMap;

    fn ctx_with_env(vars: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv {
            envs: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[test]
    fn test_config_from_env() {
        let ctx = ctx_with_env(&[
            (KEYSTONE_URL, "http://keystone:5000"),
            (KEYSTONE_DEFAULT_DOMAIN, "corp"),
            (KEYSTONE_TOKEN_BUFFER_MINUTES, "10"),
        ]);

        let config = Config::default().from_env(&ctx).unwrap();
        assert_eq!(config.auth_url().unwrap(), "http://keystone:5000");
        assert_eq!(config.default_domain(), "corp");
        assert_eq!(
            config.token_buffer().unwrap(),
            SignedDuration::from_secs(600)
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default().from_env(&ctx_with_env(&[])).unwrap();

        assert_eq!(config.auth_url().unwrap_err().kind(), ErrorKind::ConfigInvalid);
        assert_eq!(config.default_domain(), DEFAULT_DOMAIN);
        assert_eq!(config.token_buffer().unwrap(), TOKEN_BUFFER);
    }

    #[test]
    fn test_config_field_takes_priority_over_env() {
        let ctx = ctx_with_env(&[(KEYSTONE_URL, "http://from-env:5000")]);

        let config = Config {
            auth_url: Some("http://from-field:5000".to_string()),
            ..Default::default()
        }
        .from_env(&ctx)
        .unwrap();
        assert_eq!(config.auth_url().unwrap(), "http://from-field:5000");
    }

    #[test]
    fn test_config_rejects_bad_buffer() {
        let ctx = ctx_with_env(&[(KEYSTONE_TOKEN_BUFFER_MINUTES, "five")]);
        let err = Config::default().from_env(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let config = Config {
            token_buffer_minutes: Some(-1),
            ..Default::default()
        };
        assert_eq!(
            config.token_buffer().unwrap_err().kind(),
            ErrorKind::ConfigInvalid
        );
    }
}
