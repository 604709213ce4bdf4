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

//! Error types shared by every keybroker crate.

use std::fmt;

use http::StatusCode;

/// Result that is a wrapper of `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// ErrorKind classifies a failure by the stage of token acquisition that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required session field (user id, password, cached token) is missing or malformed.
    SessionExpired,
    /// The directory could not resolve a user or organization id.
    DirectoryLookupFailed,
    /// The cached token expiration is present but is not a valid RFC3339 timestamp.
    ExpirationInvalid,
    /// The identity service could not be reached.
    Transport,
    /// The identity service refused to issue a token.
    AuthFailure,
    /// A successful response carried malformed or incomplete content.
    Decode,
    /// The identity service refused to list projects.
    ProjectListFailure,
    /// The broker configuration is incomplete or invalid.
    ConfigInvalid,
    /// Anything else, such as a request that could not be built.
    Unexpected,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SessionExpired => "SessionExpired",
            ErrorKind::DirectoryLookupFailed => "DirectoryLookupFailed",
            ErrorKind::ExpirationInvalid => "ExpirationInvalid",
            ErrorKind::Transport => "Transport",
            ErrorKind::AuthFailure => "AuthFailure",
            ErrorKind::Decode => "Decode",
            ErrorKind::ProjectListFailure => "ProjectListFailure",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::Unexpected => "Unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by keybroker.
///
/// An error carries its [`ErrorKind`], a human readable message, an optional
/// HTTP status for failures reported by the identity service, a list of
/// context lines and the underlying source error.
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    context: Vec<String>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            context: Vec::new(),
            source: None,
        }
    }

    /// Create a [`ErrorKind::SessionExpired`] error.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionExpired, message)
    }

    /// Create a [`ErrorKind::DirectoryLookupFailed`] error.
    pub fn directory_lookup_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DirectoryLookupFailed, message)
    }

    /// Create a [`ErrorKind::ExpirationInvalid`] error.
    pub fn expiration_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpirationInvalid, message)
    }

    /// Create a [`ErrorKind::Transport`] error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a [`ErrorKind::AuthFailure`] error for the given response status.
    pub fn auth_failure(status: StatusCode) -> Self {
        Self::new(
            ErrorKind::AuthFailure,
            format!("keystone authentication failed: {status}"),
        )
        .with_status(status)
    }

    /// Create a [`ErrorKind::Decode`] error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Create a [`ErrorKind::ProjectListFailure`] error for the given response status.
    pub fn project_list_failure(status: StatusCode) -> Self {
        Self::new(
            ErrorKind::ProjectListFailure,
            format!("keystone project-list failed: {status}"),
        )
        .with_status(status)
    }

    /// Create a [`ErrorKind::ConfigInvalid`] error.
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a [`ErrorKind::Unexpected`] error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Attach the HTTP status reported by the identity service.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a context line.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Set the source error.
    ///
    /// # Notes
    ///
    /// The previous source, if any, is replaced.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return the message of this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Return the HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Return the canonical reason phrase of the attached HTTP status, if any.
    pub fn status_text(&self) -> Option<&'static str> {
        self.status.and_then(|s| s.canonical_reason())
    }

    /// Return the context lines attached to this error.
    pub fn context(&self) -> &[String] {
        &self.context
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use the display format for `{:?}` too, so `unwrap()` output is readable.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("status", &self.status);
            de.field("context", &self.context);
            de.field("source", &self.source);
            return de.finish();
        }

        write!(f, "{self}")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if !self.context.is_empty() {
            write!(f, ", context: [{}]", self.context.join(", "))?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| {
            let err: &(dyn std::error::Error + Send + Sync + 'static) = v.as_ref();
            err as &(dyn std::error::Error + 'static)
        })
    }
}
