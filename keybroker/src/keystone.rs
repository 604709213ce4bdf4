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

//! Keystone token broker with convenience constructors.

pub use keybroker_keystone::*;

#[cfg(feature = "default-context")]
use crate::{Result, default_context};

/// Create a broker configured from the environment.
///
/// The broker uses:
/// - the default context (reqwest transport, OS environment)
/// - `KEYSTONE_URL`, `KEYSTONE_DEFAULT_DOMAIN` and `KEYSTONE_TOKEN_BUFFER_MINUTES`
/// - the host's `directory` for user and organization names
///
/// # Example
///
/// ```no_run
/// use keybroker::keystone::{MemorySession, StaticDirectory};
///
/// # #[tokio::main]
/// # async fn main() -> keybroker::Result<()> {
/// let directory = StaticDirectory::default()
///     .with_user(1, "alice")
///     .with_org(7, "proj1");
/// let broker = keybroker::keystone::default_broker(directory)?;
///
/// let mut session = MemorySession::new()
///     .with_value("user_id", "1")
///     .with_value("password", "secret");
/// let token = broker.get_token(&mut session, 7).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-context")]
pub fn default_broker(directory: impl Directory) -> Result<TokenBroker> {
    let ctx = default_context();
    let config = Config::default().from_env(&ctx)?;
    TokenBroker::new(ctx, &config, directory)
}
