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

//! Snapshots taken across every image of a group at once.

use std::fmt;
use std::mem;
use std::slice;

use libc::{c_int, c_void, size_t};

use crate::callbacks::{dispatch_progress, with_progress, ProgressCallbacks};
use crate::ceph::{ioctx_of, IoContext};
use crate::dlsym::LazySymbol;
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::group::{check_cleanup, check_group_name};
use crate::helpers::{c_string, to_cstring};
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized};

static GROUP_ROLLBACK_CALLBACKS: ProgressCallbacks = ProgressCallbacks::new();

extern "C" fn group_rollback_progress(offset: u64, total: u64, arg: *mut c_void) -> c_int {
    dispatch_progress(&GROUP_ROLLBACK_CALLBACKS, offset, total, arg)
}

static RBD_GROUP_SNAP_GET_INFO: LazySymbol = LazySymbol::new("rbd_group_snap_get_info");
static RBD_GROUP_SNAP_GET_INFO_CLEANUP: LazySymbol = LazySymbol::new("rbd_group_snap_get_info_cleanup");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSnapState {
    Incomplete,
    Complete,
}

impl GroupSnapState {
    fn from_raw(v: rbd_group_snap_state_t) -> RbdResult<GroupSnapState> {
        match v {
            0 => Ok(GroupSnapState::Incomplete),
            1 => Ok(GroupSnapState::Complete),
            _ => Err(RbdError::new(format!("unknown group snapshot state {}", v))),
        }
    }
}

impl fmt::Display for GroupSnapState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            GroupSnapState::Incomplete => "incomplete",
            GroupSnapState::Complete => "complete",
        })
    }
}

/// One entry of `group_snap_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapSummary {
    pub name: String,
    pub state: GroupSnapState,
}

/// An image snapshot that is part of a group snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnap {
    pub image_name: String,
    pub pool_id: i64,
    pub snap_id: u64,
}

/// Full description of a group snapshot, see `group_snap_get_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapInfo {
    pub id: String,
    pub name: String,
    /// Name of the snapshot created on each member image.
    pub image_snap_name: String,
    pub state: GroupSnapState,
    /// Only the user namespace (0) exists so far.
    pub namespace_type: i32,
    pub snapshots: Vec<GroupSnap>,
}

fn names(group: &str, snap: &str) -> RbdResult<()> {
    check_group_name(group)?;
    if snap.is_empty() {
        return Err(RbdError::SnapshotNoName);
    }
    Ok(())
}

pub fn group_snap_create(ioctx: &dyn IoContext, group: &str, snap: &str) -> RbdResult<()> {
    names(group, snap)?;
    let c_group = to_cstring(group)?;
    let c_snap = to_cstring(snap)?;
    trace!("creating group snapshot {}@{}", group, snap);
    check(unsafe { rbd_group_snap_create(ioctx_of(ioctx), c_group.as_ptr(), c_snap.as_ptr()) })
}

pub fn group_snap_remove(ioctx: &dyn IoContext, group: &str, snap: &str) -> RbdResult<()> {
    names(group, snap)?;
    let c_group = to_cstring(group)?;
    let c_snap = to_cstring(snap)?;
    check(unsafe { rbd_group_snap_remove(ioctx_of(ioctx), c_group.as_ptr(), c_snap.as_ptr()) })
}

pub fn group_snap_rename(ioctx: &dyn IoContext, group: &str, src: &str, dest: &str) -> RbdResult<()> {
    names(group, src)?;
    names(group, dest)?;
    let c_group = to_cstring(group)?;
    let c_src = to_cstring(src)?;
    let c_dest = to_cstring(dest)?;
    check(unsafe { rbd_group_snap_rename(ioctx_of(ioctx), c_group.as_ptr(), c_src.as_ptr(), c_dest.as_ptr()) })
}

pub fn group_snap_list(ioctx: &dyn IoContext, group: &str) -> RbdResult<Vec<GroupSnapSummary>> {
    check_group_name(group)?;
    let io = ioctx_of(ioctx);
    let c_group = to_cstring(group)?;
    let entry_size = mem::size_of::<rbd_group_snap_info_t>();
    retry_sized(1024, 262144, |size| {
        let mut count: size_t = size;
        let mut snaps = vec![rbd_group_snap_info_t::default(); size];
        let ret = unsafe { rbd_group_snap_list(io, c_group.as_ptr(), snaps.as_mut_ptr(), entry_size, &mut count) };
        let result = check_if_negative(ret).and_then(|_| {
            let list: RbdResult<Vec<GroupSnapSummary>> = snaps[..count]
                .iter()
                .map(|s| {
                    Ok(GroupSnapSummary {
                        name: c_string(s.name),
                        state: GroupSnapState::from_raw(s.state)?,
                    })
                })
                .collect();
            let cleaned = unsafe { rbd_group_snap_list_cleanup(snaps.as_mut_ptr(), entry_size, count) };
            check_cleanup("group snapshot list", cleaned)?;
            list
        });
        resize_on_range(result, count)
    })
}

/// Roll every member image back to the group snapshot.
pub fn group_snap_rollback(ioctx: &dyn IoContext, group: &str, snap: &str) -> RbdResult<()> {
    names(group, snap)?;
    let c_group = to_cstring(group)?;
    let c_snap = to_cstring(snap)?;
    trace!("rolling back group {} to {}", group, snap);
    check(unsafe { rbd_group_snap_rollback(ioctx_of(ioctx), c_group.as_ptr(), c_snap.as_ptr()) })
}

/// `group_snap_rollback` reporting `(done, total)` to `progress`. A non-zero
/// return from the callback aborts the rollback.
pub fn group_snap_rollback_with_progress<F>(ioctx: &dyn IoContext, group: &str, snap: &str, progress: F) -> RbdResult<()>
where
    F: FnMut(u64, u64) -> i32 + Send + 'static,
{
    names(group, snap)?;
    let io = ioctx_of(ioctx);
    let c_group = to_cstring(group)?;
    let c_snap = to_cstring(snap)?;
    trace!("rolling back group {} to {}", group, snap);
    let ret = with_progress(&GROUP_ROLLBACK_CALLBACKS, progress, |arg| unsafe {
        rbd_group_snap_rollback_with_progress(io, c_group.as_ptr(), c_snap.as_ptr(), Some(group_rollback_progress), arg)
    });
    check(ret)
}

/// Details of one group snapshot, including the image snapshots it is made
/// of. Needs a librbd that exports `rbd_group_snap_get_info`, otherwise
/// `NotImplemented` is returned.
pub fn group_snap_get_info(ioctx: &dyn IoContext, group: &str, snap: &str) -> RbdResult<GroupSnapInfo> {
    names(group, snap)?;
    let get_info = resolve_fn!(RBD_GROUP_SNAP_GET_INFO, rbd_group_snap_get_info_fn);
    let cleanup = resolve_fn!(RBD_GROUP_SNAP_GET_INFO_CLEANUP, rbd_group_snap_get_info_cleanup_fn);
    let c_group = to_cstring(group)?;
    let c_snap = to_cstring(snap)?;
    let mut raw = rbd_group_snap_info2_t::default();
    let ret = unsafe { get_info(ioctx_of(ioctx), c_group.as_ptr(), c_snap.as_ptr(), &mut raw) };
    check_if_negative(ret)?;
    let raw = scopeguard::guard(raw, |mut raw| unsafe { cleanup(&mut raw) });

    let snapshots = if raw.image_snaps.is_null() || raw.image_snaps_count == 0 {
        Vec::new()
    } else {
        unsafe { slice::from_raw_parts(raw.image_snaps, raw.image_snaps_count) }
            .iter()
            .map(|s| GroupSnap {
                image_name: c_string(s.image_name),
                pool_id: s.pool_id,
                snap_id: s.snap_id,
            })
            .collect()
    };
    Ok(GroupSnapInfo {
        id: c_string(raw.id),
        name: c_string(raw.name),
        image_snap_name: c_string(raw.image_snap_name),
        state: GroupSnapState::from_raw(raw.state)?,
        namespace_type: raw.namespace_type,
        snapshots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::FAKE;

    #[test]
    fn snap_states() {
        assert_eq!(GroupSnapState::from_raw(1).unwrap(), GroupSnapState::Complete);
        assert_eq!(GroupSnapState::Incomplete.to_string(), "incomplete");
    }

    #[test]
    fn names_checked_before_librbd() {
        assert!(matches!(group_snap_create(&FAKE, "", "s"), Err(RbdError::NoName)));
        assert!(matches!(group_snap_remove(&FAKE, "g", ""), Err(RbdError::SnapshotNoName)));
        assert!(matches!(group_snap_rename(&FAKE, "g", "s", ""), Err(RbdError::SnapshotNoName)));
        assert!(matches!(group_snap_get_info(&FAKE, "g", ""), Err(RbdError::SnapshotNoName)));
    }

    #[test]
    fn rejected_rollback_leaves_no_callback_behind() {
        let res = group_snap_rollback_with_progress(&FAKE, "", "s", |_, _| 0);
        assert!(matches!(res, Err(RbdError::NoName)));
        assert!(GROUP_ROLLBACK_CALLBACKS.is_empty());
    }
}
