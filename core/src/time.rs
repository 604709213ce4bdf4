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

//! Timestamps and the expiration arithmetic built on them.

use crate::Error;

/// Timestamp is the alias for `jiff::Timestamp`.
pub type Timestamp = jiff::Timestamp;

/// Signed duration between two timestamps, alias for `jiff::SignedDuration`.
pub type SignedDuration = jiff::SignedDuration;

/// Create timestamp of now.
pub fn now() -> Timestamp {
    Timestamp::now()
}

/// Parse an expiration timestamp in RFC3339.
///
/// Keystone renders expirations with microseconds, but any precision and
/// numeric offset is accepted:
///
/// - `2022-03-13T07:20:04Z`
/// - `2022-03-01T08:12:34+00:00`
/// - `2022-03-01T08:12:34.000000Z`
///
/// The looser ISO 8601 forms jiff would otherwise take (missing seconds, a
/// space or lowercase separator, `+0000` offsets) are rejected.
///
/// Returns an [`ErrorKind::ExpirationInvalid`](crate::ErrorKind::ExpirationInvalid) error otherwise.
pub fn parse_rfc3339(s: &str) -> crate::Result<Timestamp> {
    if !is_rfc3339(s.as_bytes()) {
        return Err(Error::expiration_invalid(format!(
            "'{s}' is not an rfc3339 timestamp"
        )));
    }

    s.parse::<Timestamp>().map_err(|err| {
        Error::expiration_invalid(format!("parse '{s}' into rfc3339 failed")).with_source(err)
    })
}

/// Check the `date-time` production of RFC3339 with uppercase `T` and `Z`.
///
/// Field ranges are left to jiff.
fn is_rfc3339(s: &[u8]) -> bool {
    fn digits(s: &[u8]) -> bool {
        !s.is_empty() && s.iter().all(u8::is_ascii_digit)
    }

    if s.len() < 20 {
        return false;
    }
    let (datetime, mut rest) = s.split_at(19);
    let shape_ok = digits(&datetime[0..4])
        && datetime[4] == b'-'
        && digits(&datetime[5..7])
        && datetime[7] == b'-'
        && digits(&datetime[8..10])
        && datetime[10] == b'T'
        && digits(&datetime[11..13])
        && datetime[13] == b':'
        && digits(&datetime[14..16])
        && datetime[16] == b':'
        && digits(&datetime[17..19]);
    if !shape_ok {
        return false;
    }

    if let Some(frac) = rest.strip_prefix(b".") {
        let len = frac.iter().take_while(|b| b.is_ascii_digit()).count();
        if len == 0 {
            return false;
        }
        rest = &frac[len..];
    }

    match rest {
        b"Z" => true,
        [b'+' | b'-', h1, h2, b':', m1, m2] => {
            [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

/// Return the instant from which a credential expiring at `expires_at`
/// should no longer be handed out.
///
/// `None` if subtracting `buffer` leaves the supported time range.
pub fn refresh_deadline(expires_at: Timestamp, buffer: SignedDuration) -> Option<Timestamp> {
    expires_at.checked_sub(buffer).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn test_time() -> Timestamp {
        "2022-03-01T08:12:34Z".parse().unwrap()
    }

    #[test]
    fn test_parse_rfc3339() {
        let t = test_time();

        for v in [
            "2022-03-01T08:12:34Z",
            "2022-03-01T08:12:34+00:00",
            "2022-03-01T08:12:34.000000Z",
            "2022-03-01T09:12:34+01:00",
        ] {
            assert_eq!(t, parse_rfc3339(v).expect("must be valid time"));
        }
    }

    #[test]
    fn test_parse_rfc3339_invalid() {
        for v in [
            "",
            "tomorrow",
            "2022-03-01T08:12:34",
            "2030-01-01T00:00Z",
            "2030-01-01 00:00:00Z",
            "2030-01-01t00:00:00z",
            "2030-01-01T00:00:00+0000",
            "2030-01-01T00Z",
            "2030-01-01T00:00:00.Z",
            "2030-13-01T00:00:00Z",
        ] {
            let err = parse_rfc3339(v).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ExpirationInvalid);
        }
    }

    #[test]
    fn test_refresh_deadline() {
        let deadline = refresh_deadline(test_time(), SignedDuration::from_mins(5)).unwrap();
        assert_eq!(deadline, "2022-03-01T08:07:34Z".parse::<Timestamp>().unwrap());

        assert_eq!(refresh_deadline(Timestamp::MIN, SignedDuration::from_secs(1)), None);
    }
}
