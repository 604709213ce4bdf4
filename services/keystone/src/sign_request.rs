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

use keybroker_core::{Error, Result};

use crate::client::X_AUTH_TOKEN;

/// RequestSigner for OpenStack services.
///
/// Signs requests by inserting the `X-Auth-Token` header with a token handed
/// out by the broker, for hosts that proxy calls to other OpenStack services.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestSigner;

impl RequestSigner {
    /// Insert `token` as a sensitive `X-Auth-Token` header, replacing any existing one.
    pub fn sign(&self, req: &mut http::request::Parts, token: &str) -> Result<()> {
        let mut value: http::HeaderValue = token.parse().map_err(|e| {
            Error::unexpected("failed to parse token as header value").with_source(e)
        })?;
        value.set_sensitive(true);

        req.headers.insert(X_AUTH_TOKEN, value);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(uri: &str) -> http::request::Parts {
        let req = http::Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-auth-token", "stale-token")
            .header("content-type", "application/json")
            .body(())
            .unwrap();
        req.into_parts().0
    }

    #[test]
    fn test_sign_replaces_token() {
        let mut parts = parts("http://nova:8774/v2.1/servers");

        RequestSigner.sign(&mut parts, "tok123").unwrap();

        let values: Vec<_> = parts.headers.get_all("x-auth-token").iter().collect();
        assert_eq!(values, vec!["tok123"]);
        assert!(values[0].is_sensitive());
        assert_eq!(parts.headers["content-type"], "application/json");
    }

    #[test]
    fn test_sign_rejects_invalid_token() {
        let mut parts = parts("http://nova:8774/v2.1/servers");

        assert!(RequestSigner.sign(&mut parts, "tok\n123").is_err());
        assert_eq!(parts.headers["x-auth-token"], "stale-token");
    }
}
