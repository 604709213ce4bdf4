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

//! Core components for keybroker.
//!
//! This crate holds what every other keybroker crate shares:
//!
//! - [`Error`], [`ErrorKind`] and [`Result`]
//! - [`HttpSend`] and [`Env`], the seams to the transport and process environment
//! - [`Context`], which carries those collaborators
//! - [`time`] helpers backed by `jiff`
//! - [`utils::Redact`] for keeping secrets out of `Debug` output

mod error;
pub use error::{Error, ErrorKind, Result};

mod context;
pub use context::{Context, Env, HttpSend, OsEnv, StaticEnv};

pub mod time;
pub mod utils;
