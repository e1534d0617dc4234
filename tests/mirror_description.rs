extern crate ceph_rbd;

use std::fs::File;
use std::io::Read;
use std::time::UNIX_EPOCH;

use ceph_rbd::error::RbdError;
use ceph_rbd::mirror::{MirrorImageStatusState, SiteMirrorImageStatus};
use ceph_rbd::mirror_desc_status::extract_embedded_json;

fn status_from(fixture: &str) -> SiteMirrorImageStatus {
    let description = {
        let mut buff = String::new();
        let mut f = File::open(format!("tests/fixtures/{}", fixture)).unwrap();
        f.read_to_string(&mut buff).unwrap();
        buff.trim_end().to_string()
    };
    SiteMirrorImageStatus {
        mirror_uuid: String::new(),
        state: MirrorImageStatusState::Replaying,
        description,
        last_update: UNIX_EPOCH,
        up: true,
    }
}

#[test]
fn test_idle_replay_status() {
    let status = status_from("desc_replaying.txt").describe_replay_status().unwrap();
    println!("replay_status: {:#?}", status);
    assert_eq!(status.replay_state.as_ref().map(String::as_str), Some("idle"));
    assert_eq!(status.local_snapshot_timestamp, Some(1624011616));
    assert_eq!(status.remote_snapshot_timestamp, Some(1624011616));
    assert_eq!(status.bytes_per_second, Some(0.0));
    assert_eq!(status.syncing_percent, None);
}

#[test]
fn test_syncing_replay_status() {
    let status = status_from("desc_syncing.txt").describe_replay_status().unwrap();
    println!("replay_status: {:#?}", status);
    assert_eq!(status.replay_state.as_ref().map(String::as_str), Some("syncing"));
    assert_eq!(status.syncing_percent, Some(42));
    assert_eq!(status.syncing_snapshot_timestamp, Some(1624011856));
    assert_eq!(status.last_snapshot_bytes, Some(26214400));
    assert_eq!(status.last_snapshot_sync_seconds, Some(3));
}

#[test]
fn test_description_without_json() {
    let err = status_from("desc_plain.txt").describe_replay_status().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_broken_json() {
    let err = status_from("desc_broken.txt").describe_replay_status().unwrap_err();
    match err {
        RbdError::SerdeError(_) => {}
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_extract_keeps_outer_braces() {
    let description = "replaying, {\"replay_state\":\"idle\"}";
    assert_eq!(extract_embedded_json(description).unwrap(), "{\"replay_state\":\"idle\"}");
}

#[test]
fn test_parse_into_own_type() {
    #[derive(serde_derive::Deserialize)]
    struct Timestamps {
        local_snapshot_timestamp: i64,
    }
    let parsed: Timestamps = status_from("desc_replaying.txt").parse_description_json().unwrap();
    assert_eq!(parsed.local_snapshot_timestamp, 1624011616);
}
