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

//! Reqwest-based HTTP transport for keybroker.
//!
//! This crate provides `ReqwestHttpSend`, a transport that implements
//! the `HttpSend` trait from `keybroker_core` using reqwest.
//!
//! ## Example
//!
//! ```no_run
//! use keybroker_core::Context;
//! use keybroker_http_send_reqwest::ReqwestHttpSend;
//! use reqwest::Client;
//!
//! // Use default client
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//!
//! // The broker applies no timeout of its own, so hosts usually set one here.
//! let client = Client::builder()
//!     .timeout(std::time::Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use keybroker_core::{Error, HttpSend, Result};
use reqwest::{Client, Request};

/// Reqwest-based implementation of the `HttpSend` trait.
///
/// The wrapped `reqwest::Client` owns the connection pool, which is shared
/// by every clone and is safe for concurrent use.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a custom reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::unexpected("failed to convert request").with_source(e))?;
        let url = req.url().to_string();

        let resp = self.client.execute(req).await.map_err(|e| {
            Error::transport("failed to send HTTP request")
                .with_source(e)
                .with_context(format!("url: {url}"))
        })?;

        let resp: http::Response<_> = resp.into();
        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::transport("failed to collect response body").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
