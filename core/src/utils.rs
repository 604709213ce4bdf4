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

//! Utility functions and types.

use std::fmt::{self, Debug};

/// Redacts a secret for `Debug` output.
///
/// Short values are fully hidden; longer ones keep their first and last three
/// characters so tokens stay distinguishable in logs.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(""),
            Some(v) => Redact(v.as_str()),
        }
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = self.0.chars().count();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 {
            f.write_str("***")
        } else {
            let head: String = self.0.chars().take(3).collect();
            let tail: String = self.0.chars().skip(length - 3).collect();
            write!(f, "{head}***{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("", "EMPTY"),
            ("secret", "***"),
            ("gAAAAABkZ-token-value", "gAA***lue"),
        ];

        for (input, expected) in cases {
            assert_eq!(format!("{:?}", Redact::from(input)), expected);
        }
    }

    #[test]
    fn test_redact_option() {
        let none: Option<String> = None;
        assert_eq!(format!("{:?}", Redact::from(&none)), "EMPTY");
        let some = Some("p".to_string());
        assert_eq!(format!("{:?}", Redact::from(&some)), "***");
    }
}
