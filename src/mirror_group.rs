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

//! Mirroring of whole groups. The librbd API is not in a release yet, so
//! every entry point is looked up at run time and reports `NotImplemented`
//! when the loaded library lacks it.

use std::fmt;
use std::mem;
use std::slice;
use std::time::SystemTime;

use crate::ceph::{ioctx_of, IoContext};
use crate::dlsym::LazySymbol;
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::group::check_group_name;
use crate::helpers::{c_string, time_from_secs, to_cstring};
use crate::mirror::{ImageMirrorMode, SiteMirrorImageStatus};
use crate::rbd::*;

static RBD_MIRROR_GROUP_ENABLE: LazySymbol = LazySymbol::new("rbd_mirror_group_enable");
static RBD_MIRROR_GROUP_DISABLE: LazySymbol = LazySymbol::new("rbd_mirror_group_disable");
static RBD_MIRROR_GROUP_PROMOTE: LazySymbol = LazySymbol::new("rbd_mirror_group_promote");
static RBD_MIRROR_GROUP_DEMOTE: LazySymbol = LazySymbol::new("rbd_mirror_group_demote");
static RBD_MIRROR_GROUP_RESYNC: LazySymbol = LazySymbol::new("rbd_mirror_group_resync");
static RBD_MIRROR_GROUP_GET_INFO: LazySymbol = LazySymbol::new("rbd_mirror_group_get_info");
static RBD_MIRROR_GROUP_GET_INFO_CLEANUP: LazySymbol = LazySymbol::new("rbd_mirror_group_get_info_cleanup");
static RBD_MIRROR_GROUP_GET_GLOBAL_STATUS: LazySymbol = LazySymbol::new("rbd_mirror_group_get_global_status");
static RBD_MIRROR_GROUP_GLOBAL_STATUS_CLEANUP: LazySymbol =
    LazySymbol::new("rbd_mirror_group_global_status_cleanup");

const MIRROR_GROUP_ENABLE_FLAGS: u32 = 2;
const MIRROR_GROUP_PROMOTE_FLAGS: u32 = 0;
const MIRROR_GROUP_DEMOTE_FLAGS: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorGroupState {
    Disabling,
    Enabling,
    Enabled,
    Disabled,
}

impl MirrorGroupState {
    fn from_raw(v: rbd_mirror_group_state_t) -> RbdResult<MirrorGroupState> {
        match v {
            0 => Ok(MirrorGroupState::Disabling),
            1 => Ok(MirrorGroupState::Enabling),
            2 => Ok(MirrorGroupState::Enabled),
            3 => Ok(MirrorGroupState::Disabled),
            _ => Err(RbdError::new(format!("unknown mirror group state {}", v))),
        }
    }
}

impl fmt::Display for MirrorGroupState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MirrorGroupState::Disabling => "disabling",
            MirrorGroupState::Enabling => "enabling",
            MirrorGroupState::Enabled => "enabled",
            MirrorGroupState::Disabled => "disabled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MirrorGroupStatusState {
    Unknown,
    Error,
    StartingReplay,
    Replaying,
    StoppingReplay,
    Stopped,
}

impl MirrorGroupStatusState {
    fn from_raw(v: rbd_mirror_group_status_state_t) -> RbdResult<MirrorGroupStatusState> {
        match v {
            0 => Ok(MirrorGroupStatusState::Unknown),
            1 => Ok(MirrorGroupStatusState::Error),
            2 => Ok(MirrorGroupStatusState::StartingReplay),
            3 => Ok(MirrorGroupStatusState::Replaying),
            4 => Ok(MirrorGroupStatusState::StoppingReplay),
            5 => Ok(MirrorGroupStatusState::Stopped),
            _ => Err(RbdError::new(format!("unknown mirror group status state {}", v))),
        }
    }
}

impl fmt::Display for MirrorGroupStatusState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MirrorGroupStatusState::Unknown => "unknown",
            MirrorGroupStatusState::Error => "error",
            MirrorGroupStatusState::StartingReplay => "starting_replay",
            MirrorGroupStatusState::Replaying => "replaying",
            MirrorGroupStatusState::StoppingReplay => "stopping_replay",
            MirrorGroupStatusState::Stopped => "stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorGroupInfo {
    pub global_id: String,
    pub mirror_image_mode: ImageMirrorMode,
    pub state: MirrorGroupState,
    pub primary: bool,
}

impl MirrorGroupInfo {
    fn from_raw(info: &rbd_mirror_group_info_t) -> RbdResult<MirrorGroupInfo> {
        Ok(MirrorGroupInfo {
            global_id: c_string(info.global_id),
            mirror_image_mode: ImageMirrorMode::from_raw(info.mirror_image_mode)?,
            state: MirrorGroupState::from_raw(info.state)?,
            primary: info.primary,
        })
    }
}

/// One member image as reported inside a group site status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMemberMirrorStatus {
    pub pool_id: i64,
    pub global_id: String,
    pub status: SiteMirrorImageStatus,
}

/// Status of a group on one site. The local site has an empty
/// `mirror_uuid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMirrorGroupStatus {
    pub mirror_uuid: String,
    pub state: MirrorGroupStatusState,
    pub images: Vec<GroupMemberMirrorStatus>,
    pub description: String,
    pub last_update: SystemTime,
    pub up: bool,
}

impl SiteMirrorGroupStatus {
    fn from_raw(s: &rbd_mirror_group_site_status_t) -> RbdResult<SiteMirrorGroupStatus> {
        let count = s.mirror_image_count as usize;
        let mut images = Vec::with_capacity(count);
        if count > 0 && !s.mirror_images.is_null() {
            let statuses = unsafe { slice::from_raw_parts(s.mirror_images, count) };
            let pool_ids: &[i64] = if s.mirror_image_pool_ids.is_null() {
                &[]
            } else {
                unsafe { slice::from_raw_parts(s.mirror_image_pool_ids, count) }
            };
            let global_ids: &[*mut libc::c_char] = if s.mirror_image_global_ids.is_null() {
                &[]
            } else {
                unsafe { slice::from_raw_parts(s.mirror_image_global_ids, count) }
            };
            for (i, status) in statuses.iter().enumerate() {
                images.push(GroupMemberMirrorStatus {
                    pool_id: pool_ids.get(i).cloned().unwrap_or(-1),
                    global_id: global_ids.get(i).map(|p| c_string(*p)).unwrap_or_default(),
                    status: SiteMirrorImageStatus::from_raw(status)?,
                });
            }
        }
        Ok(SiteMirrorGroupStatus {
            mirror_uuid: c_string(s.mirror_uuid),
            state: MirrorGroupStatusState::from_raw(s.state)?,
            images,
            description: c_string(s.description),
            last_update: time_from_secs(s.last_update),
            up: s.up,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalMirrorGroupStatus {
    pub name: String,
    pub info: MirrorGroupInfo,
    pub site_statuses: Vec<SiteMirrorGroupStatus>,
}

impl GlobalMirrorGroupStatus {
    pub fn local_status(&self) -> RbdResult<&SiteMirrorGroupStatus> {
        self.site_statuses
            .iter()
            .find(|s| s.mirror_uuid.is_empty())
            .ok_or(RbdError::NotFound)
    }
}

pub fn mirror_group_enable(ioctx: &dyn IoContext, group: &str, mode: ImageMirrorMode) -> RbdResult<()> {
    check_group_name(group)?;
    let enable = resolve_fn!(RBD_MIRROR_GROUP_ENABLE, rbd_mirror_group_enable_fn);
    let c_group = to_cstring(group)?;
    check(unsafe { enable(ioctx_of(ioctx), c_group.as_ptr(), mode.to_raw(), MIRROR_GROUP_ENABLE_FLAGS) })
}

pub fn mirror_group_disable(ioctx: &dyn IoContext, group: &str, force: bool) -> RbdResult<()> {
    check_group_name(group)?;
    let disable = resolve_fn!(RBD_MIRROR_GROUP_DISABLE, rbd_mirror_group_disable_fn);
    let c_group = to_cstring(group)?;
    check(unsafe { disable(ioctx_of(ioctx), c_group.as_ptr(), force) })
}

pub fn mirror_group_promote(ioctx: &dyn IoContext, group: &str, force: bool) -> RbdResult<()> {
    check_group_name(group)?;
    let promote = resolve_fn!(RBD_MIRROR_GROUP_PROMOTE, rbd_mirror_group_promote_fn);
    let c_group = to_cstring(group)?;
    check(unsafe { promote(ioctx_of(ioctx), c_group.as_ptr(), MIRROR_GROUP_PROMOTE_FLAGS, force) })
}

pub fn mirror_group_demote(ioctx: &dyn IoContext, group: &str) -> RbdResult<()> {
    check_group_name(group)?;
    let demote = resolve_fn!(RBD_MIRROR_GROUP_DEMOTE, rbd_mirror_group_demote_fn);
    let c_group = to_cstring(group)?;
    check(unsafe { demote(ioctx_of(ioctx), c_group.as_ptr(), MIRROR_GROUP_DEMOTE_FLAGS) })
}

pub fn mirror_group_resync(ioctx: &dyn IoContext, group: &str) -> RbdResult<()> {
    check_group_name(group)?;
    let resync = resolve_fn!(RBD_MIRROR_GROUP_RESYNC, rbd_mirror_group_resync_fn);
    let c_group = to_cstring(group)?;
    check(unsafe { resync(ioctx_of(ioctx), c_group.as_ptr()) })
}

pub fn get_mirror_group_info(ioctx: &dyn IoContext, group: &str) -> RbdResult<MirrorGroupInfo> {
    check_group_name(group)?;
    let get_info = resolve_fn!(RBD_MIRROR_GROUP_GET_INFO, rbd_mirror_group_get_info_fn);
    let cleanup = resolve_fn!(RBD_MIRROR_GROUP_GET_INFO_CLEANUP, rbd_mirror_group_get_info_cleanup_fn);
    let c_group = to_cstring(group)?;
    let mut info = rbd_mirror_group_info_t::default();
    check_if_negative(unsafe {
        get_info(ioctx_of(ioctx), c_group.as_ptr(), &mut info, mem::size_of::<rbd_mirror_group_info_t>())
    })?;
    let info = scopeguard::guard(info, |mut info| unsafe { cleanup(&mut info) });
    MirrorGroupInfo::from_raw(&info)
}

pub fn get_global_mirror_group_status(ioctx: &dyn IoContext, group: &str) -> RbdResult<GlobalMirrorGroupStatus> {
    check_group_name(group)?;
    let get_status = resolve_fn!(RBD_MIRROR_GROUP_GET_GLOBAL_STATUS, rbd_mirror_group_get_global_status_fn);
    let cleanup = resolve_fn!(
        RBD_MIRROR_GROUP_GLOBAL_STATUS_CLEANUP,
        rbd_mirror_group_global_status_cleanup_fn
    );
    let c_group = to_cstring(group)?;
    let mut status = rbd_mirror_group_global_status_t::default();
    check_if_negative(unsafe {
        get_status(
            ioctx_of(ioctx),
            c_group.as_ptr(),
            &mut status,
            mem::size_of::<rbd_mirror_group_global_status_t>(),
        )
    })?;
    let status = scopeguard::guard(status, |mut s| unsafe { cleanup(&mut s) });

    let count = status.site_statuses_count as usize;
    let site_statuses = if count == 0 || status.site_statuses.is_null() {
        Vec::new()
    } else {
        unsafe { slice::from_raw_parts(status.site_statuses, count) }
            .iter()
            .map(SiteMirrorGroupStatus::from_raw)
            .collect::<RbdResult<Vec<_>>>()?
    };
    Ok(GlobalMirrorGroupStatus {
        name: c_string(status.name),
        info: MirrorGroupInfo::from_raw(&status.info)?,
        site_statuses,
    })
}
