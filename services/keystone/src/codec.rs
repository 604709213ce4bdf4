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

//! Translation between broker values and the Keystone v3 wire format.

use std::fmt::{self, Debug};

use bytes::Bytes;
use http::HeaderValue;
use keybroker_core::{Error, Result, time, utils::Redact};
use serde::Deserialize;

/// A token issuance request.
///
/// Each variant carries exactly one identity method.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthRequest {
    /// Password authentication without a project scope.
    UnscopedPassword {
        /// User login name.
        username: String,
        /// User password.
        password: String,
        /// Domain name of the user.
        domain: String,
    },
    /// Password authentication scoped to a project.
    ScopedPassword {
        /// User login name.
        username: String,
        /// User password.
        password: String,
        /// Domain name of both the user and the project.
        domain: String,
        /// Project name to scope the token to.
        project: String,
    },
    /// Re-scope an existing unscoped token to a project.
    ScopedToken {
        /// The unscoped token used as identity.
        unscoped_token: String,
        /// Domain name of the project.
        domain: String,
        /// Project name to scope the token to.
        project: String,
    },
}

impl Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRequest::UnscopedPassword {
                username,
                password,
                domain,
            } => f
                .debug_struct("UnscopedPassword")
                .field("username", username)
                .field("password", &Redact::from(password))
                .field("domain", domain)
                .finish(),
            AuthRequest::ScopedPassword {
                username,
                password,
                domain,
                project,
            } => f
                .debug_struct("ScopedPassword")
                .field("username", username)
                .field("password", &Redact::from(password))
                .field("domain", domain)
                .field("project", project)
                .finish(),
            AuthRequest::ScopedToken {
                unscoped_token,
                domain,
                project,
            } => f
                .debug_struct("ScopedToken")
                .field("unscoped_token", &Redact::from(unscoped_token))
                .field("domain", domain)
                .field("project", project)
                .finish(),
        }
    }
}

/// A role granted on the scoped project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Role {
    /// Role id.
    pub id: String,
    /// Role name.
    pub name: String,
}

/// The outcome of a successful token issuance.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// The bearer token, taken from the `X-Subject-Token` header.
    pub token: String,
    /// The token expiration as returned by Keystone, in RFC3339.
    pub expiration: String,
    /// Roles granted on the scoped project, in response order.
    pub roles: Vec<Role>,
    /// Id of the domain the user belongs to.
    pub domain_id: String,
    /// Login name of the user as known to Keystone.
    pub resolved_username: String,
}

impl Debug for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResult")
            .field("token", &Redact::from(&self.token))
            .field("expiration", &self.expiration)
            .field("roles", &self.roles)
            .field("domain_id", &self.domain_id)
            .field("resolved_username", &self.resolved_username)
            .finish()
    }
}

/// A project visible to the token holder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Whether the project is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Id of the domain owning the project.
    #[serde(default)]
    pub domain_id: String,
}

/// Encode the request into the JSON body of `POST /v3/auth/tokens`.
pub fn encode(req: &AuthRequest) -> Result<Bytes> {
    let body = match req {
        AuthRequest::UnscopedPassword {
            username,
            password,
            domain,
        } => keystone_v3::AuthRequest {
            auth: keystone_v3::Auth {
                nocatalog: None,
                identity: keystone_v3::Identity::password(username, password, domain),
                scope: keystone_v3::Scope::Unscoped(keystone_v3::UNSCOPED),
            },
        },
        AuthRequest::ScopedPassword {
            username,
            password,
            domain,
            project,
        } => keystone_v3::AuthRequest {
            auth: keystone_v3::Auth {
                nocatalog: Some(true),
                identity: keystone_v3::Identity::password(username, password, domain),
                scope: keystone_v3::Scope::project(project, domain),
            },
        },
        AuthRequest::ScopedToken {
            unscoped_token,
            domain,
            project,
        } => keystone_v3::AuthRequest {
            auth: keystone_v3::Auth {
                nocatalog: Some(true),
                identity: keystone_v3::Identity::Token {
                    methods: [keystone_v3::METHOD_TOKEN],
                    token: keystone_v3::TokenId { id: unscoped_token },
                },
                scope: keystone_v3::Scope::project(project, domain),
            },
        },
    };

    let bs = serde_json::to_vec(&body)
        .map_err(|e| Error::unexpected("failed to serialize auth request").with_source(e))?;
    Ok(Bytes::from(bs))
}

/// Decode a `201 Created` token issuance response.
///
/// Keystone v3 returns the token itself in the `X-Subject-Token` header, so the
/// header value must be passed in alongside the body.
pub fn decode_auth_response(
    body: &[u8],
    token_header: Option<&HeaderValue>,
) -> Result<AuthResult> {
    let token = token_header
        .ok_or_else(|| Error::decode("keystone response missing X-Subject-Token header"))?
        .to_str()
        .map_err(|e| Error::decode("X-Subject-Token header is not valid UTF-8").with_source(e))?;
    if token.is_empty() {
        return Err(Error::decode("X-Subject-Token header is empty"));
    }

    let resp: keystone_v3::TokenResponse = serde_json::from_slice(body).map_err(|e| {
        Error::decode("failed to parse keystone token response")
            .with_source(e)
            .with_context(format!("response_length: {}", body.len()))
    })?;

    // Reject the whole response rather than cache an expiration nobody can read back.
    time::parse_rfc3339(&resp.token.expires_at).map_err(|e| {
        Error::decode("keystone token expiration is not a valid timestamp")
            .with_source(e)
            .with_context(format!("expires_at: {}", resp.token.expires_at))
    })?;

    Ok(AuthResult {
        token: token.to_string(),
        expiration: resp.token.expires_at,
        roles: resp.token.roles,
        domain_id: resp.token.user.domain.id,
        resolved_username: resp.token.user.name,
    })
}

/// Decode a `200 OK` project listing response.
pub fn decode_projects_response(body: &[u8]) -> Result<Vec<Project>> {
    let resp: keystone_v3::ProjectsResponse = serde_json::from_slice(body).map_err(|e| {
        Error::decode("failed to parse keystone projects response")
            .with_source(e)
            .with_context(format!("response_length: {}", body.len()))
    })?;

    Ok(resp.projects)
}

/// Keep the names of enabled projects that belong to `domain_id`, in response order.
pub fn filter_projects(projects: Vec<Project>, domain_id: &str) -> Vec<String> {
    projects
        .into_iter()
        .filter(|p| p.enabled && p.domain_id == domain_id)
        .map(|p| p.name)
        .collect()
}

/// Keystone v3 authentication request/response types.
mod keystone_v3 {
    use serde::{Deserialize, Serialize};

    pub(super) const METHOD_PASSWORD: &str = "password";
    pub(super) const METHOD_TOKEN: &str = "token";
    pub(super) const UNSCOPED: &str = "unscoped";

    /// Top-level authentication request body.
    #[derive(Serialize)]
    pub(super) struct AuthRequest<'a> {
        pub(super) auth: Auth<'a>,
    }

    #[derive(Serialize)]
    pub(super) struct Auth<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub(super) nocatalog: Option<bool>,
        pub(super) identity: Identity<'a>,
        pub(super) scope: Scope<'a>,
    }

    /// Identity section, holding exactly one method.
    #[derive(Serialize)]
    #[serde(untagged)]
    pub(super) enum Identity<'a> {
        Password {
            methods: [&'static str; 1],
            password: Password<'a>,
        },
        Token {
            methods: [&'static str; 1],
            token: TokenId<'a>,
        },
    }

    impl<'a> Identity<'a> {
        pub(super) fn password(name: &'a str, password: &'a str, domain: &'a str) -> Self {
            Identity::Password {
                methods: [METHOD_PASSWORD],
                password: Password {
                    user: User {
                        name,
                        password,
                        domain: Domain { name: domain },
                    },
                },
            }
        }
    }

    #[derive(Serialize)]
    pub(super) struct Password<'a> {
        pub(super) user: User<'a>,
    }

    #[derive(Serialize)]
    pub(super) struct User<'a> {
        pub(super) name: &'a str,
        pub(super) password: &'a str,
        pub(super) domain: Domain<'a>,
    }

    #[derive(Serialize)]
    pub(super) struct TokenId<'a> {
        pub(super) id: &'a str,
    }

    #[derive(Serialize)]
    pub(super) struct Domain<'a> {
        pub(super) name: &'a str,
    }

    /// Either the literal `"unscoped"` or a project scope.
    #[derive(Serialize)]
    #[serde(untagged)]
    pub(super) enum Scope<'a> {
        Unscoped(&'static str),
        Project { project: Project<'a> },
    }

    impl<'a> Scope<'a> {
        pub(super) fn project(name: &'a str, domain: &'a str) -> Self {
            Scope::Project {
                project: Project {
                    name,
                    domain: Domain { name: domain },
                },
            }
        }
    }

    #[derive(Serialize)]
    pub(super) struct Project<'a> {
        pub(super) name: &'a str,
        pub(super) domain: Domain<'a>,
    }

    #[derive(Deserialize)]
    pub(super) struct TokenResponse {
        pub(super) token: TokenBody,
    }

    #[derive(Deserialize)]
    pub(super) struct TokenBody {
        pub(super) expires_at: String,
        // Unscoped tokens carry no roles.
        #[serde(default)]
        pub(super) roles: Vec<super::Role>,
        pub(super) user: UserBody,
    }

    #[derive(Deserialize)]
    pub(super) struct UserBody {
        pub(super) name: String,
        pub(super) domain: DomainRef,
    }

    #[derive(Deserialize)]
    pub(super) struct DomainRef {
        pub(super) id: String,
    }

    #[derive(Deserialize)]
    pub(super) struct ProjectsResponse {
        pub(super) projects: Vec<super::Project>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybroker_core::ErrorKind;
    use serde_json::{Value, json};

    fn encode_json(req: &AuthRequest) -> Value {
        serde_json::from_slice(&encode(req).unwrap()).unwrap()
    }

    #[test]
    fn test_encode_scoped_password() {
        let req = AuthRequest::ScopedPassword {
            username: "alice".to_string(),
            password: "p".to_string(),
            domain: "default".to_string(),
            project: "proj1".to_string(),
        };

        assert_eq!(
            encode_json(&req),
            json!({
                "auth": {
                    "nocatalog": true,
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": "alice",
                                "password": "p",
                                "domain": {"name": "default"}
                            }
                        }
                    },
                    "scope": {
                        "project": {
                            "name": "proj1",
                            "domain": {"name": "default"}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_encode_scoped_token() {
        let req = AuthRequest::ScopedToken {
            unscoped_token: "unscoped-tok".to_string(),
            domain: "default".to_string(),
            project: "proj1".to_string(),
        };

        assert_eq!(
            encode_json(&req),
            json!({
                "auth": {
                    "nocatalog": true,
                    "identity": {
                        "methods": ["token"],
                        "token": {"id": "unscoped-tok"}
                    },
                    "scope": {
                        "project": {
                            "name": "proj1",
                            "domain": {"name": "default"}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_encode_unscoped_password() {
        let req = AuthRequest::UnscopedPassword {
            username: "alice".to_string(),
            password: "p".to_string(),
            domain: "default".to_string(),
        };

        let json = encode_json(&req);
        assert_eq!(json["auth"]["scope"], "unscoped");
        assert!(json["auth"].get("nocatalog").is_none());
        assert_eq!(json["auth"]["identity"]["methods"], json!(["password"]));
        assert!(json["auth"]["identity"].get("token").is_none());
        assert_eq!(
            json["auth"]["identity"]["password"]["user"]["domain"]["name"],
            "default"
        );
    }

    #[test]
    fn test_decode_auth_response() {
        let body = br#"{"token":{"expires_at":"2030-01-01T00:00:00Z","roles":[{"id":"r1","name":"admin"}],"user":{"name":"alice","domain":{"id":"d1"}}}}"#;
        let header = HeaderValue::from_static("tok123");

        let result = decode_auth_response(body, Some(&header)).unwrap();
        assert_eq!(
            result,
            AuthResult {
                token: "tok123".to_string(),
                expiration: "2030-01-01T00:00:00Z".to_string(),
                roles: vec![Role {
                    id: "r1".to_string(),
                    name: "admin".to_string(),
                }],
                domain_id: "d1".to_string(),
                resolved_username: "alice".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_auth_response_ignores_extra_fields() {
        let body = br#"{
            "token": {
                "methods": ["password"],
                "expires_at": "2030-01-01T00:00:00.000000Z",
                "issued_at": "2029-12-31T23:00:00.000000Z",
                "user": {"id": "u1", "name": "alice", "domain": {"id": "d1", "name": "Default"}},
                "project": {"id": "p1", "name": "proj1"}
            }
        }"#;
        let header = HeaderValue::from_static("tok123");

        let result = decode_auth_response(body, Some(&header)).unwrap();
        assert!(result.roles.is_empty());
        assert_eq!(result.expiration, "2030-01-01T00:00:00.000000Z");
    }

    #[test]
    fn test_decode_auth_response_requires_header() {
        let body = br#"{"token":{"expires_at":"2030-01-01T00:00:00Z","user":{"name":"alice","domain":{"id":"d1"}}}}"#;

        let err = decode_auth_response(body, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let empty = HeaderValue::from_static("");
        let err = decode_auth_response(body, Some(&empty)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_auth_response_rejects_non_utf8_header() {
        let body = br#"{"token":{"expires_at":"2030-01-01T00:00:00Z","user":{"name":"alice","domain":{"id":"d1"}}}}"#;
        let header = HeaderValue::from_bytes(b"tok\xff123").unwrap();

        let err = decode_auth_response(body, Some(&header)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_auth_response_rejects_loose_expiration() {
        let header = HeaderValue::from_static("tok123");

        for expires_at in ["2030-01-01 00:00:00Z", "2030-01-01T00:00Z"] {
            let body = format!(
                r#"{{"token":{{"expires_at":"{expires_at}","user":{{"name":"alice","domain":{{"id":"d1"}}}}}}}}"#
            );
            let err = decode_auth_response(body.as_bytes(), Some(&header)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decode);
        }
    }

    #[test]
    fn test_decode_auth_response_rejects_incomplete_body() {
        let header = HeaderValue::from_static("tok123");

        let bodies: [&[u8]; 4] = [
            b"not json",
            br#"{"token":{"user":{"name":"alice","domain":{"id":"d1"}}}}"#,
            br#"{"token":{"expires_at":"2030-01-01T00:00:00Z","user":{"name":"alice"}}}"#,
            br#"{"token":{"expires_at":"soon","user":{"name":"alice","domain":{"id":"d1"}}}}"#,
        ];
        for body in bodies {
            let err = decode_auth_response(body, Some(&header)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decode);
        }
    }

    #[test]
    fn test_decode_projects_response() {
        let body = br#"{
            "links": {"self": "http://keystone:5000/v3/auth/projects"},
            "projects": [
                {"name": "p1", "enabled": true, "domain_id": "d1", "id": "1"},
                {"name": "p2", "enabled": false, "domain_id": "d1", "id": "2"}
            ]
        }"#;

        let projects = decode_projects_response(body).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "p1");
        assert!(!projects[1].enabled);

        let err = decode_projects_response(b"[").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_filter_projects() {
        let projects = vec![
            Project {
                name: "p1".to_string(),
                enabled: true,
                domain_id: "d1".to_string(),
            },
            Project {
                name: "p2".to_string(),
                enabled: false,
                domain_id: "d1".to_string(),
            },
            Project {
                name: "p3".to_string(),
                enabled: true,
                domain_id: "d2".to_string(),
            },
        ];

        assert_eq!(filter_projects(projects, "d1"), vec!["p1".to_string()]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let req = AuthRequest::ScopedPassword {
            username: "alice".to_string(),
            password: "correct horse battery staple".to_string(),
            domain: "default".to_string(),
            project: "proj1".to_string(),
        };

        let out = format!("{req:?}");
        assert!(!out.contains("correct horse"));
        assert!(out.contains("alice"));
    }
}
