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

//! Keystone token broker for keybroker.
//!
//! [`TokenBroker`] hands out Keystone v3 tokens scoped to the organization a
//! web session is currently working in. Tokens are cached in the host's
//! session store and reused until they are about to expire or the user
//! switches organization.
//!
//! The crate is split along the exchange with the identity service:
//!
//! - [`codec`]: request bodies and response parsing
//! - [`IdentityClient`]: the HTTP exchanges themselves
//! - [`TokenCache`]: whether a cached token may be reused
//! - [`TokenBroker`]: ties the above to the session and the directory

mod broker;
pub use broker::TokenBroker;

mod cache;
pub use cache::{
    CachedToken, Clock, SESSION_KEY_PASSWORD, SESSION_KEY_TOKEN, SESSION_KEY_TOKEN_EXPIRATION,
    SESSION_KEY_TOKEN_PROJECT, SESSION_KEY_USER_ID, SessionKeys, SystemClock, TOKEN_BUFFER,
    TokenCache,
};

mod client;
pub use client::{IdentityClient, X_AUTH_TOKEN, X_SUBJECT_TOKEN};

pub mod codec;
pub use codec::{AuthRequest, AuthResult, Project, Role};

mod config;
pub use config::{Config, DEFAULT_DOMAIN};

mod directory;
pub use directory::{Directory, DirectoryOrg, DirectoryUser, StaticDirectory};

mod session;
pub use session::{MemorySession, SessionState, SessionStore, store_token};

mod sign_request;
pub use sign_request::RequestSigner;
