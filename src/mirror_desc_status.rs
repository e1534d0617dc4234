// Copyright 2017 LambdaStack All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! rbd-mirror puts a JSON object with replay statistics into the free form
//! description of snapshot mirrored images, e.g.
//! `replaying, {"bytes_per_second":0.0,"remote_snapshot_timestamp":1624011616}`.

use serde::de::DeserializeOwned;

use crate::error::{RbdError, RbdResult};
use crate::mirror::SiteMirrorImageStatus;

/// Replay statistics of a snapshot mirrored image.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MirrorDescriptionReplayStatus {
    pub replay_state: Option<String>,
    pub remote_snapshot_timestamp: Option<i64>,
    pub local_snapshot_timestamp: Option<i64>,
    pub syncing_snapshot_timestamp: Option<i64>,
    pub syncing_percent: Option<i32>,
    pub bytes_per_second: Option<f64>,
    pub bytes_per_snapshot: Option<f64>,
    pub last_snapshot_sync_seconds: Option<i64>,
    pub last_snapshot_bytes: Option<i64>,
}

/// The text from the first `{` to the last `}` of `description`.
///
/// Braces are not matched, a `}` inside a string value after the object
/// would be picked up. `NotFound` if there is no such span.
pub fn extract_embedded_json(description: &str) -> RbdResult<&str> {
    let start = description.find('{').ok_or(RbdError::NotFound)?;
    let end = description.rfind('}').ok_or(RbdError::NotFound)?;
    if start >= end {
        return Err(RbdError::NotFound);
    }
    Ok(&description[start..=end])
}

impl SiteMirrorImageStatus {
    /// Deserialize the JSON embedded in the description into `T`.
    pub fn parse_description_json<T: DeserializeOwned>(&self) -> RbdResult<T> {
        let json = extract_embedded_json(&self.description)?;
        Ok(serde_json::from_str(json)?)
    }

    pub fn describe_replay_status(&self) -> RbdResult<MirrorDescriptionReplayStatus> {
        self.parse_description_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object() {
        let desc = r#"replaying, {"replay_state":"idle"}"#;
        assert_eq!(extract_embedded_json(desc).unwrap(), r#"{"replay_state":"idle"}"#);
    }

    #[test]
    fn missing_or_reversed_braces() {
        assert!(extract_embedded_json("replaying").unwrap_err().is_not_found());
        assert!(extract_embedded_json("{ open").unwrap_err().is_not_found());
        assert!(extract_embedded_json("close }").unwrap_err().is_not_found());
        assert!(extract_embedded_json("} then {").unwrap_err().is_not_found());
        assert!(extract_embedded_json("").unwrap_err().is_not_found());
    }

    #[test]
    fn outermost_span_is_used() {
        let desc = r#"x {"a":{"b":1}} y"#;
        assert_eq!(extract_embedded_json(desc).unwrap(), r#"{"a":{"b":1}}"#);
    }
}
