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

use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode, header};
use log::debug;

use keybroker_core::{Context, Error, Result};

/// Header carrying the caller's token on authenticated Keystone requests.
pub const X_AUTH_TOKEN: &str = "x-auth-token";
/// Header carrying the issued token on `POST /v3/auth/tokens` responses.
pub const X_SUBJECT_TOKEN: &str = "x-subject-token";

/// Client for the Keystone v3 identity service.
///
/// Every call performs exactly one HTTP exchange through the context's
/// transport. Nothing is retried.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    ctx: Context,
    server: String,
}

impl IdentityClient {
    /// Create a client for the identity service at `server`, e.g. `http://keystone:5000`.
    pub fn new(ctx: Context, server: impl Into<String>) -> Self {
        let server = server.into();
        Self {
            server: server.trim_end_matches('/').to_string(),
            ctx,
        }
    }

    /// Return the base URL of the identity service.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// `POST {server}/v3/auth/tokens` with an encoded auth request.
    ///
    /// Only `201 Created` is a success; the response is returned as is so the
    /// caller can read the `X-Subject-Token` header.
    pub async fn issue_token(&self, body: Bytes) -> Result<http::Response<Bytes>> {
        let url = format!("{}/v3/auth/tokens", self.server);

        let req = http::Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|e| {
                Error::unexpected("failed to build HTTP request")
                    .with_source(e)
                    .with_context(format!("url: {url}"))
            })?;

        let resp = self.ctx.http_send(req).await?;
        if resp.status() != StatusCode::CREATED {
            return Err(Error::auth_failure(resp.status()).with_context(format!("url: {url}")));
        }

        debug!(
            "authentication response: \n{}",
            String::from_utf8_lossy(resp.body())
        );
        Ok(resp)
    }

    /// `GET {server}/v3/auth/projects` on behalf of `token`.
    ///
    /// Only `200 OK` is a success.
    pub async fn list_projects(&self, token: &str) -> Result<http::Response<Bytes>> {
        let url = format!("{}/v3/auth/projects", self.server);

        let mut value: HeaderValue = token.parse().map_err(|e| {
            Error::unexpected("failed to parse token as header value").with_source(e)
        })?;
        value.set_sensitive(true);

        let req = http::Request::builder()
            .method(Method::GET)
            .uri(&url)
            .header(X_AUTH_TOKEN, value)
            .body(Bytes::new())
            .map_err(|e| {
                Error::unexpected("failed to build HTTP request")
                    .with_source(e)
                    .with_context(format!("url: {url}"))
            })?;

        let resp = self.ctx.http_send(req).await?;
        if resp.status() != StatusCode::OK {
            return Err(
                Error::project_list_failure(resp.status()).with_context(format!("url: {url}"))
            );
        }

        debug!(
            "projects response: \n{}",
            String::from_utf8_lossy(resp.body())
        );
        Ok(resp)
    }
}
