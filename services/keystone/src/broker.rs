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

use std::sync::Arc;

use log::{debug, warn};

use keybroker_core::{Context, Error, ErrorKind, Result};

use crate::cache::{Clock, SessionKeys, SystemClock, TokenCache};
use crate::client::{IdentityClient, X_SUBJECT_TOKEN};
use crate::codec::{self, AuthRequest, AuthResult};
use crate::config::Config;
use crate::directory::Directory;
use crate::session::{self, SessionState, SessionStore};

/// TokenBroker hands out Keystone tokens scoped to the session's current organization.
///
/// The broker keeps no state of its own: the cached token lives in the
/// caller's session, so one broker can serve every session of a host
/// concurrently.
///
/// # Example
///
/// ```no_run
/// use keybroker_core::Context;
/// use keybroker_keystone::{Config, MemorySession, StaticDirectory, TokenBroker};
///
/// # async fn example() -> keybroker_core::Result<()> {
/// let config = Config {
///     auth_url: Some("http://keystone:5000".to_string()),
///     ..Default::default()
/// };
/// let directory = StaticDirectory::default()
///     .with_user(1, "alice")
///     .with_org(7, "proj1");
/// let broker = TokenBroker::new(Context::new(), &config, directory)?;
///
/// let mut session = MemorySession::new()
///     .with_value("user_id", "1")
///     .with_value("password", "secret");
/// let token = broker.get_token(&mut session, 7).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenBroker {
    client: IdentityClient,
    directory: Arc<dyn Directory>,
    domain: String,
    cache: TokenCache,
    keys: SessionKeys,
    clock: Arc<dyn Clock>,
}

impl TokenBroker {
    /// Create a broker talking to the identity service configured in `config`.
    pub fn new(ctx: Context, config: &Config, directory: impl Directory) -> Result<Self> {
        let auth_url = config.auth_url()?;
        let cache = TokenCache::new().with_buffer(config.token_buffer()?);

        Ok(Self {
            client: IdentityClient::new(ctx, auth_url),
            directory: Arc::new(directory),
            domain: config.default_domain().to_string(),
            cache,
            keys: SessionKeys::default(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for expiration checks.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the session key names.
    pub fn with_session_keys(mut self, keys: SessionKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Return the domain used for users and projects.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Return a token scoped to organization `org_id`.
    ///
    /// The token cached in `session` is returned as long as it is scoped to
    /// that organization and not about to expire. Otherwise a new token is
    /// requested with the user's password and written back into `session`.
    /// The session is left untouched on any failure.
    pub async fn get_token<S: SessionStore>(
        &self,
        session: &mut S,
        org_id: i64,
    ) -> Result<String> {
        let state = SessionState::load(&*session, &self.keys);
        let project = self.org_name(org_id).await?;
        if let Some(token) = self.reusable_token(&state, &project)? {
            return Ok(token);
        }

        let username = self.user_login(state.require_user_id()?).await?;
        let password = state.require_password()?;

        let req = AuthRequest::ScopedPassword {
            username,
            password: password.to_string(),
            domain: self.domain.clone(),
            project: project.clone(),
        };
        let result = self.authenticate(&req).await?;

        session::store_token(session, &self.keys, &result, &project);
        Ok(result.token)
    }

    /// Like [`get_token`](Self::get_token), but re-scopes `unscoped_token` instead
    /// of sending the user's password.
    pub async fn get_token_with_unscoped<S: SessionStore>(
        &self,
        session: &mut S,
        org_id: i64,
        unscoped_token: &str,
    ) -> Result<String> {
        let state = SessionState::load(&*session, &self.keys);
        let project = self.org_name(org_id).await?;
        if let Some(token) = self.reusable_token(&state, &project)? {
            return Ok(token);
        }

        let req = AuthRequest::ScopedToken {
            unscoped_token: unscoped_token.to_string(),
            domain: self.domain.clone(),
            project: project.clone(),
        };
        let result = self.authenticate(&req).await?;

        session::store_token(session, &self.keys, &result, &project);
        Ok(result.token)
    }

    /// Authenticate with a password without scoping the token to a project.
    ///
    /// Nothing is cached; the caller owns the returned token.
    pub async fn authenticate_unscoped(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthResult> {
        let req = AuthRequest::UnscopedPassword {
            username: username.to_string(),
            password: password.to_string(),
            domain: self.domain.clone(),
        };
        self.authenticate(&req).await
    }

    /// List the names of enabled projects in `domain_id` visible to `token`.
    pub async fn list_projects(&self, token: &str, domain_id: &str) -> Result<Vec<String>> {
        let resp = self.client.list_projects(token).await?;
        let projects = codec::decode_projects_response(resp.body())?;
        Ok(codec::filter_projects(projects, domain_id))
    }

    /// Issue a token for `req`: encode, exchange and decode, failing at the first error.
    pub async fn authenticate(&self, req: &AuthRequest) -> Result<AuthResult> {
        debug!("requesting keystone token: {req:?}");

        let body = codec::encode(req)?;
        let resp = self.client.issue_token(body).await?;
        let token_header = resp.headers().get(X_SUBJECT_TOKEN);
        let result = codec::decode_auth_response(resp.body(), token_header)?;

        debug!(
            "keystone token issued for {}, expires at {}",
            result.resolved_username, result.expiration
        );
        Ok(result)
    }

    fn reusable_token(&self, state: &SessionState, project: &str) -> Result<Option<String>> {
        let valid = self
            .cache
            .is_valid(&state.cached, project, self.clock.now())
            .inspect_err(|err| {
                if err.kind() == ErrorKind::ExpirationInvalid {
                    warn!("cached keystone token expiration is corrupt: {err}");
                }
            })?;
        if !valid {
            return Ok(None);
        }

        let token = state
            .cached
            .token
            .clone()
            .ok_or_else(|| Error::session_expired("session timed out trying to get token"))?;
        debug!("reusing cached keystone token for project {project}");
        Ok(Some(token))
    }

    async fn user_login(&self, user_id: i64) -> Result<String> {
        self.directory
            .get_user_by_id(user_id)
            .await?
            .map(|user| user.login)
            .ok_or_else(|| {
                Error::directory_lookup_failed("user not found")
                    .with_context(format!("user_id: {user_id}"))
            })
    }

    async fn org_name(&self, org_id: i64) -> Result<String> {
        self.directory
            .get_org_by_id(org_id)
            .await?
            .map(|org| org.name)
            .ok_or_else(|| {
                Error::directory_lookup_failed("organization not found")
                    .with_context(format!("org_id: {org_id}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::session::MemorySession;
    use async_trait::async_trait;
    use bytes::Bytes;
    use keybroker_core::HttpSend;
    use keybroker_core::time::Timestamp;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    #[derive(Debug, Clone, Default)]
    struct CountingHttpSend {
        calls: Arc<AtomicUsize>,
        bodies: Arc<Mutex<Vec<Bytes>>>,
    }

    #[async_trait]
    impl HttpSend for CountingHttpSend {
        async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.bodies.lock().unwrap().push(req.body().clone());
            let body = r#"{"token":{"expires_at":"2030-01-01T13:00:00Z","roles":[],"user":{"name":"alice","domain":{"id":"d1"}}}}"#;
            Ok(http::Response::builder()
                .status(http::StatusCode::CREATED)
                .header(X_SUBJECT_TOKEN, format!("tok{n}"))
                .body(Bytes::from_static(body.as_bytes()))
                .expect("response must build"))
        }
    }

    fn broker(http_send: CountingHttpSend) -> TokenBroker {
        let config = Config {
            auth_url: Some("http://keystone:5000".to_string()),
            default_domain: Some("default".to_string()),
            ..Default::default()
        };
        let directory = StaticDirectory::default()
            .with_user(1, "alice")
            .with_org(7, "alpha")
            .with_org(8, "beta");

        TokenBroker::new(Context::new().with_http_send(http_send), &config, directory)
            .unwrap()
            .with_clock(FixedClock("2030-01-01T12:00:00Z".parse().unwrap()))
    }

    fn session() -> MemorySession {
        MemorySession::new()
            .with_value("user_id", "1")
            .with_value("password", "p")
    }

    #[tokio::test]
    async fn test_get_token_caches_until_org_changes() {
        let http_send = CountingHttpSend::default();
        let broker = broker(http_send.clone());
        let mut session = session();

        assert_eq!(broker.get_token(&mut session, 7).await.unwrap(), "tok1");
        assert_eq!(broker.get_token(&mut session, 7).await.unwrap(), "tok1");
        assert_eq!(http_send.calls.load(Ordering::SeqCst), 1);

        assert_eq!(broker.get_token(&mut session, 8).await.unwrap(), "tok2");
        assert_eq!(session.get("keystone_project").as_deref(), Some("beta"));
        assert_eq!(http_send.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_token_with_unscoped_sends_token_identity() {
        let http_send = CountingHttpSend::default();
        let broker = broker(http_send.clone());
        let mut session = MemorySession::new();

        let token = broker
            .get_token_with_unscoped(&mut session, 7, "unscoped-tok")
            .await
            .unwrap();
        assert_eq!(token, "tok1");

        let bodies = http_send.bodies.lock().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bodies[0]).unwrap();
        assert_eq!(json["auth"]["identity"]["token"]["id"], "unscoped-tok");
        assert_eq!(json["auth"]["scope"]["project"]["name"], "alpha");
    }

    #[tokio::test]
    async fn test_unknown_org_fails_before_network() {
        let http_send = CountingHttpSend::default();
        let broker = broker(http_send.clone());

        let err = broker.get_token(&mut session(), 99).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryLookupFailed);
        assert_eq!(http_send.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_requires_auth_url() {
        let directory = StaticDirectory::default();
        let err = TokenBroker::new(Context::new(), &Config::default(), directory).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
