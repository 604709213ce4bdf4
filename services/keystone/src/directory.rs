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

use async_trait::async_trait;

use keybroker_core::Result;

/// A user as known to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Login name, used as the Keystone user name.
    pub login: String,
}

/// An organization as known to the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryOrg {
    /// Organization name, used as the Keystone project name.
    pub name: String,
}

/// Directory resolves the host's numeric ids into names.
///
/// `Ok(None)` means the id is unknown; `Err` is reserved for failures of the
/// directory itself.
#[async_trait]
pub trait Directory: Debug + Send + Sync + 'static {
    /// Look up a user by id.
    async fn get_user_by_id(&self, id: i64) -> Result<Option<DirectoryUser>>;

    /// Look up an organization by id.
    async fn get_org_by_id(&self, id: i64) -> Result<Option<DirectoryOrg>>;
}

/// Directory backed by fixed maps, mostly used in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    /// Login names by user id.
    pub users: HashMap<i64, String>,
    /// Organization names by organization id.
    pub orgs: HashMap<i64, String>,
}

impl StaticDirectory {
    /// Add a user.
    pub fn with_user(mut self, id: i64, login: impl Into<String>) -> Self {
        self.users.insert(id, login.into());
        self
    }

    /// Add an organization.
    pub fn with_org(mut self, id: i64, name: impl Into<String>) -> Self {
        self.orgs.insert(id, name.into());
        self
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn get_user_by_id(&self, id: i64) -> Result<Option<DirectoryUser>> {
        Ok(self
            .users
            .get(&id)
            .map(|login| DirectoryUser { login: login.clone() }))
    }

    async fn get_org_by_id(&self, id: i64) -> Result<Option<DirectoryOrg>> {
        Ok(self
            .orgs
            .get(&id)
            .map(|name| DirectoryOrg { name: name.clone() }))
    }
}
