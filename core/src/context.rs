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
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;

use crate::{Error, Result};

/// HttpSend is used to send a single HTTP request and collect its full response.
///
/// Implementations must be safe for concurrent use: one transport is shared
/// by every session a broker serves.
#[async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send the request and return the response with a fully collected body.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// Env is used to read environment variables.
pub trait Env: Debug + Send + Sync + 'static {
    /// Get an environment variable, returning `None` if it is not set.
    fn var(&self, key: &str) -> Option<String>;
}

/// Env that reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)?.into_string().ok()
    }
}

/// Env backed by a fixed map, mostly used in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// Environment variables in this env.
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }
}

#[derive(Debug)]
struct NoopHttpSend;

#[async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::unexpected(
            "http send is not configured, please set it via Context::with_http_send",
        ))
    }
}

#[derive(Debug)]
struct NoopEnv;

impl Env for NoopEnv {
    fn var(&self, _: &str) -> Option<String> {
        None
    }
}

/// Context carries the collaborators the broker needs to talk to the outside world.
///
/// A fresh context has no transport and an empty environment; use
/// [`Context::with_http_send`] and [`Context::with_env`] to plug them in.
#[derive(Debug, Clone)]
pub struct Context {
    http: Arc<dyn HttpSend>,
    env: Arc<dyn Env>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a new context with no-op collaborators.
    pub fn new() -> Self {
        Self {
            http: Arc::new(NoopHttpSend),
            env: Arc::new(NoopEnv),
        }
    }

    /// Replace the http send implementation.
    pub fn with_http_send(mut self, http: impl HttpSend) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Replace the env implementation.
    pub fn with_env(mut self, env: impl Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Send an HTTP request through the configured transport.
    pub async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        debug!("sending {} {}", req.method(), req.uri());
        self.http.http_send(req).await
    }

    /// Get an environment variable from the configured env.
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env.var(key)
    }
}
