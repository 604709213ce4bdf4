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

//! Keystone token broker for web sessions.
//!
//! This crate bundles the pieces of keybroker behind one dependency:
//!
//! - [`keybroker_core`] types are re-exported at the crate root
//! - [`keystone`] holds the broker itself
//!
//! With the `default-context` feature (on by default), [`default_context`]
//! returns a [`Context`] backed by reqwest and the OS environment.

pub use keybroker_core::*;

pub mod keystone;

/// Create a context with the reqwest transport and the OS environment.
#[cfg(feature = "default-context")]
pub fn default_context() -> Context {
    Context::new()
        .with_http_send(keybroker_http_send_reqwest::ReqwestHttpSend::default())
        .with_env(OsEnv)
}
