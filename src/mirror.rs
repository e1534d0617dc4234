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

//! rbd-mirror configuration and status: pool wide settings, per image
//! mirroring and paged listings over a whole pool.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::mem;
use std::ptr;
use std::slice;
use std::time::SystemTime;

use libc::{c_char, c_int, size_t};

use crate::ceph::{cluster_of, ioctx_of, ClusterHandle, IoContext};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{buf_to_string, c_string, time_from_secs, to_cstring};
use crate::image::Image;
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized};

/// Pool wide mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    Disabled,
    /// Only images with mirroring explicitly enabled.
    Image,
    /// Every image with the journaling feature.
    Pool,
}

impl MirrorMode {
    fn to_raw(self) -> rbd_mirror_mode_t {
        match self {
            MirrorMode::Disabled => 0,
            MirrorMode::Image => 1,
            MirrorMode::Pool => 2,
        }
    }

    fn from_raw(v: rbd_mirror_mode_t) -> RbdResult<MirrorMode> {
        match v {
            0 => Ok(MirrorMode::Disabled),
            1 => Ok(MirrorMode::Image),
            2 => Ok(MirrorMode::Pool),
            _ => Err(RbdError::new(format!("unknown mirror mode {}", v))),
        }
    }
}

impl fmt::Display for MirrorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MirrorMode::Disabled => "disabled",
            MirrorMode::Image => "image",
            MirrorMode::Pool => "pool",
        })
    }
}

/// How a single image is mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMirrorMode {
    Journal,
    Snapshot,
}

impl ImageMirrorMode {
    pub(crate) fn to_raw(self) -> rbd_mirror_image_mode_t {
        match self {
            ImageMirrorMode::Journal => 0,
            ImageMirrorMode::Snapshot => 1,
        }
    }

    pub(crate) fn from_raw(v: rbd_mirror_image_mode_t) -> RbdResult<ImageMirrorMode> {
        match v {
            0 => Ok(ImageMirrorMode::Journal),
            1 => Ok(ImageMirrorMode::Snapshot),
            _ => Err(RbdError::new(format!("unknown image mirror mode {}", v))),
        }
    }
}

impl fmt::Display for ImageMirrorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ImageMirrorMode::Journal => "journal",
            ImageMirrorMode::Snapshot => "snapshot",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorImageState {
    Disabling,
    Enabled,
    Disabled,
}

impl MirrorImageState {
    fn from_raw(v: rbd_mirror_image_state_t) -> RbdResult<MirrorImageState> {
        match v {
            0 => Ok(MirrorImageState::Disabling),
            1 => Ok(MirrorImageState::Enabled),
            2 => Ok(MirrorImageState::Disabled),
            _ => Err(RbdError::new(format!("unknown mirror image state {}", v))),
        }
    }
}

impl fmt::Display for MirrorImageState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MirrorImageState::Disabling => "disabling",
            MirrorImageState::Enabled => "enabled",
            MirrorImageState::Disabled => "disabled",
        })
    }
}

/// Replay state of an image as seen by one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MirrorImageStatusState {
    Unknown,
    Error,
    Syncing,
    StartingReplay,
    Replaying,
    StoppingReplay,
    Stopped,
}

impl MirrorImageStatusState {
    pub(crate) fn from_raw(v: rbd_mirror_image_status_state_t) -> RbdResult<MirrorImageStatusState> {
        match v {
            0 => Ok(MirrorImageStatusState::Unknown),
            1 => Ok(MirrorImageStatusState::Error),
            2 => Ok(MirrorImageStatusState::Syncing),
            3 => Ok(MirrorImageStatusState::StartingReplay),
            4 => Ok(MirrorImageStatusState::Replaying),
            5 => Ok(MirrorImageStatusState::StoppingReplay),
            6 => Ok(MirrorImageStatusState::Stopped),
            _ => Err(RbdError::new(format!("unknown mirror image status state {}", v))),
        }
    }
}

impl fmt::Display for MirrorImageStatusState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MirrorImageStatusState::Unknown => "unknown",
            MirrorImageStatusState::Error => "error",
            MirrorImageStatusState::Syncing => "syncing",
            MirrorImageStatusState::StartingReplay => "starting_replay",
            MirrorImageStatusState::Replaying => "replaying",
            MirrorImageStatusState::StoppingReplay => "stopping_replay",
            MirrorImageStatusState::Stopped => "stopped",
        })
    }
}

/// Which way images flow between this cluster and a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPeerDirection {
    Rx,
    Tx,
    RxTx,
}

impl MirrorPeerDirection {
    pub(crate) fn to_raw(self) -> rbd_mirror_peer_direction_t {
        match self {
            MirrorPeerDirection::Rx => 0,
            MirrorPeerDirection::Tx => 1,
            MirrorPeerDirection::RxTx => 2,
        }
    }

    pub(crate) fn from_raw(v: rbd_mirror_peer_direction_t) -> RbdResult<MirrorPeerDirection> {
        match v {
            0 => Ok(MirrorPeerDirection::Rx),
            1 => Ok(MirrorPeerDirection::Tx),
            2 => Ok(MirrorPeerDirection::RxTx),
            _ => Err(RbdError::new(format!("unknown mirror peer direction {}", v))),
        }
    }
}

impl fmt::Display for MirrorPeerDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MirrorPeerDirection::Rx => "rx-only",
            MirrorPeerDirection::Tx => "tx-only",
            MirrorPeerDirection::RxTx => "rx-tx",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorImageInfo {
    pub global_id: String,
    pub state: MirrorImageState,
    pub primary: bool,
}

impl MirrorImageInfo {
    pub(crate) fn from_raw(info: &rbd_mirror_image_info_t) -> RbdResult<MirrorImageInfo> {
        Ok(MirrorImageInfo {
            global_id: c_string(info.global_id),
            state: MirrorImageState::from_raw(info.state)?,
            primary: info.primary,
        })
    }
}

/// Status of an image on one site. The local site has an empty
/// `mirror_uuid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMirrorImageStatus {
    pub mirror_uuid: String,
    pub state: MirrorImageStatusState,
    pub description: String,
    pub last_update: SystemTime,
    pub up: bool,
}

impl SiteMirrorImageStatus {
    pub(crate) fn from_raw(s: &rbd_mirror_image_site_status_t) -> RbdResult<SiteMirrorImageStatus> {
        Ok(SiteMirrorImageStatus {
            mirror_uuid: c_string(s.mirror_uuid),
            state: MirrorImageStatusState::from_raw(s.state)?,
            description: c_string(s.description),
            last_update: time_from_secs(s.last_update),
            up: s.up,
        })
    }
}

/// Convert `count` site statuses starting at `ptr`.
pub(crate) fn site_statuses(
    ptr: *const rbd_mirror_image_site_status_t,
    count: usize,
) -> RbdResult<Vec<SiteMirrorImageStatus>> {
    if ptr.is_null() || count == 0 {
        return Ok(Vec::new());
    }
    unsafe { slice::from_raw_parts(ptr, count) }
        .iter()
        .map(SiteMirrorImageStatus::from_raw)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalMirrorImageStatus {
    pub name: String,
    pub info: MirrorImageInfo,
    pub site_statuses: Vec<SiteMirrorImageStatus>,
}

impl GlobalMirrorImageStatus {
    fn from_raw(s: &rbd_mirror_image_global_status_t) -> RbdResult<GlobalMirrorImageStatus> {
        Ok(GlobalMirrorImageStatus {
            name: c_string(s.name),
            info: MirrorImageInfo::from_raw(&s.info)?,
            site_statuses: site_statuses(s.site_statuses, s.site_statuses_count as usize)?,
        })
    }

    /// The entry for the local site, `NotFound` if there is none.
    pub fn local_status(&self) -> RbdResult<&SiteMirrorImageStatus> {
        self.site_statuses
            .iter()
            .find(|s| s.mirror_uuid.is_empty())
            .ok_or(RbdError::NotFound)
    }
}

/// An image id with its global mirror status, as yielded by the pool
/// listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalMirrorImageIdAndStatus {
    pub id: String,
    pub status: GlobalMirrorImageStatus,
}

/// An image id with its mirror mode and info, as yielded by the pool
/// listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorImageInfoItem {
    pub id: String,
    pub mode: ImageMirrorMode,
    pub info: MirrorImageInfo,
}

fn string_call<F>(start: usize, max: usize, mut call: F) -> RbdResult<String>
where
    F: FnMut(*mut c_char, &mut size_t) -> c_int,
{
    retry_sized(start, max, |size| {
        let mut buf = vec![0u8; size];
        let mut len: size_t = size;
        let ret = call(buf.as_mut_ptr() as *mut c_char, &mut len);
        resize_on_range(check_if_negative(ret).map(|_| buf_to_string(&buf)), len)
    })
}

pub fn set_mirror_mode(ioctx: &dyn IoContext, mode: MirrorMode) -> RbdResult<()> {
    check(unsafe { rbd_mirror_mode_set(ioctx_of(ioctx), mode.to_raw()) })
}

pub fn get_mirror_mode(ioctx: &dyn IoContext) -> RbdResult<MirrorMode> {
    let mut mode: rbd_mirror_mode_t = 0;
    check(unsafe { rbd_mirror_mode_get(ioctx_of(ioctx), &mut mode) })?;
    MirrorMode::from_raw(mode)
}

/// The mirror uuid of the pool, which peers see as this site's id.
pub fn get_mirror_uuid(ioctx: &dyn IoContext) -> RbdResult<String> {
    let io = ioctx_of(ioctx);
    string_call(512, 65536, |buf, len| unsafe { rbd_mirror_uuid_get(io, buf, len) })
}

pub fn set_mirror_site_name(conn: &dyn ClusterHandle, name: &str) -> RbdResult<()> {
    let c_name = to_cstring(name)?;
    check(unsafe { rbd_mirror_site_name_set(cluster_of(conn), c_name.as_ptr()) })
}

pub fn get_mirror_site_name(conn: &dyn ClusterHandle) -> RbdResult<String> {
    let cluster = cluster_of(conn);
    string_call(512, 65536, |buf, len| unsafe { rbd_mirror_site_name_get(cluster, buf, len) })
}

/// A token a peer cluster can import to set up mirroring with this pool.
pub fn create_mirror_peer_bootstrap_token(ioctx: &dyn IoContext) -> RbdResult<String> {
    let io = ioctx_of(ioctx);
    string_call(4096, 262144, |buf, len| unsafe { rbd_mirror_peer_bootstrap_create(io, buf, len) })
}

pub fn import_mirror_peer_bootstrap_token(
    ioctx: &dyn IoContext,
    direction: MirrorPeerDirection,
    token: &str,
) -> RbdResult<()> {
    let c_token = to_cstring(token)?;
    check(unsafe { rbd_mirror_peer_bootstrap_import(ioctx_of(ioctx), direction.to_raw(), c_token.as_ptr()) })
}

impl Image<'_> {
    pub fn mirror_enable(&self, mode: ImageMirrorMode) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_mirror_image_enable2(handle, mode.to_raw()) })
    }

    pub fn mirror_disable(&self, force: bool) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_mirror_image_disable(handle, force) })
    }

    pub fn mirror_promote(&self, force: bool) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_mirror_image_promote(handle, force) })
    }

    pub fn mirror_demote(&self) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_mirror_image_demote(handle) })
    }

    /// Flag a non-primary image for a full resync from the primary.
    pub fn mirror_resync(&self) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_mirror_image_resync(handle) })
    }

    /// Id of the rbd-mirror instance handling this image.
    pub fn mirror_instance_id(&self) -> RbdResult<String> {
        let handle = self.handle()?;
        string_call(1024, 65536, |buf, len| unsafe { rbd_mirror_image_get_instance_id(handle, buf, len) })
    }

    pub fn get_mirror_image_info(&self) -> RbdResult<MirrorImageInfo> {
        let handle = self.handle()?;
        let mut info = rbd_mirror_image_info_t::default();
        check_if_negative(unsafe {
            rbd_mirror_image_get_info(handle, &mut info, mem::size_of::<rbd_mirror_image_info_t>())
        })?;
        let info = scopeguard::guard(info, |mut info| unsafe { rbd_mirror_image_get_info_cleanup(&mut info) });
        MirrorImageInfo::from_raw(&info)
    }

    pub fn get_image_mirror_mode(&self) -> RbdResult<ImageMirrorMode> {
        let handle = self.handle()?;
        let mut mode: rbd_mirror_image_mode_t = 0;
        check(unsafe { rbd_mirror_image_get_mode(handle, &mut mode) })?;
        ImageMirrorMode::from_raw(mode)
    }

    /// Take a mirror snapshot and return its id.
    pub fn create_mirror_snapshot(&self) -> RbdResult<u64> {
        let handle = self.handle()?;
        let mut snap_id: u64 = 0;
        check(unsafe { rbd_mirror_image_create_snapshot(handle, &mut snap_id) })?;
        Ok(snap_id)
    }

    pub fn get_global_mirror_status(&self) -> RbdResult<GlobalMirrorImageStatus> {
        let handle = self.handle()?;
        let mut status = rbd_mirror_image_global_status_t::default();
        check_if_negative(unsafe {
            rbd_mirror_image_get_global_status(handle, &mut status, mem::size_of::<rbd_mirror_image_global_status_t>())
        })?;
        let status = scopeguard::guard(status, |mut s| unsafe { rbd_mirror_image_global_status_cleanup(&mut s) });
        GlobalMirrorImageStatus::from_raw(&status)
    }
}

/// One page of global statuses, starting after the image id `start`
/// (empty for the first page). At most `max` entries are returned.
pub fn mirror_image_global_status_list(
    ioctx: &dyn IoContext,
    start: &str,
    max: usize,
) -> RbdResult<Vec<GlobalMirrorImageIdAndStatus>> {
    if max == 0 {
        return Err(RbdError::InvalidArgument);
    }
    let c_start = to_cstring(start)?;
    let mut ids: Vec<*mut c_char> = vec![ptr::null_mut(); max];
    let mut statuses = vec![rbd_mirror_image_global_status_t::default(); max];
    let mut len: size_t = 0;
    check(unsafe {
        rbd_mirror_image_global_status_list(
            ioctx_of(ioctx),
            c_start.as_ptr(),
            max,
            ids.as_mut_ptr(),
            statuses.as_mut_ptr(),
            &mut len,
        )
    })?;
    let len = len.min(max);
    let lists = scopeguard::guard((ids, statuses), |(mut ids, mut statuses)| unsafe {
        rbd_mirror_image_global_status_list_cleanup(ids.as_mut_ptr(), statuses.as_mut_ptr(), len)
    });
    let (ids, statuses) = &*lists;
    let items: RbdResult<Vec<_>> = ids[..len]
        .iter()
        .zip(statuses[..len].iter())
        .map(|(id, status)| {
            Ok(GlobalMirrorImageIdAndStatus {
                id: c_string(*id),
                status: GlobalMirrorImageStatus::from_raw(status)?,
            })
        })
        .collect();
    items
}

/// One page of mirror info, optionally only for images mirrored with
/// `mode_filter`.
pub fn mirror_image_info_list(
    ioctx: &dyn IoContext,
    mode_filter: Option<ImageMirrorMode>,
    start: &str,
    max: usize,
) -> RbdResult<Vec<MirrorImageInfoItem>> {
    if max == 0 {
        return Err(RbdError::InvalidArgument);
    }
    let c_start = to_cstring(start)?;
    let mut filter = mode_filter.map(ImageMirrorMode::to_raw).unwrap_or(0);
    let filter_ptr: *mut rbd_mirror_image_mode_t = if mode_filter.is_some() { &mut filter } else { ptr::null_mut() };
    let mut ids: Vec<*mut c_char> = vec![ptr::null_mut(); max];
    let mut modes: Vec<rbd_mirror_image_mode_t> = vec![0; max];
    let mut infos = vec![rbd_mirror_image_info_t::default(); max];
    let mut len: size_t = 0;
    check(unsafe {
        rbd_mirror_image_info_list(
            ioctx_of(ioctx),
            filter_ptr,
            c_start.as_ptr(),
            max,
            ids.as_mut_ptr(),
            modes.as_mut_ptr(),
            infos.as_mut_ptr(),
            &mut len,
        )
    })?;
    let len = len.min(max);
    let lists = scopeguard::guard((ids, infos), |(mut ids, mut infos)| unsafe {
        rbd_mirror_image_info_list_cleanup(ids.as_mut_ptr(), infos.as_mut_ptr(), len)
    });
    let (ids, infos) = &*lists;
    let items: RbdResult<Vec<_>> = ids[..len]
        .iter()
        .zip(modes[..len].iter())
        .zip(infos[..len].iter())
        .map(|((id, mode), info)| {
            Ok(MirrorImageInfoItem {
                id: c_string(*id),
                mode: ImageMirrorMode::from_raw(*mode)?,
                info: MirrorImageInfo::from_raw(info)?,
            })
        })
        .collect();
    items
}

/// Number of images in each replay state across the pool.
pub fn mirror_image_status_summary(ioctx: &dyn IoContext) -> RbdResult<BTreeMap<MirrorImageStatusState, u32>> {
    let io = ioctx_of(ioctx);
    retry_sized(16, 1024, |size| {
        let mut states: Vec<rbd_mirror_image_status_state_t> = vec![0; size];
        let mut counts: Vec<c_int> = vec![0; size];
        let mut len: size_t = size;
        let ret = unsafe { rbd_mirror_image_status_summary(io, states.as_mut_ptr(), counts.as_mut_ptr(), &mut len) };
        let result = check_if_negative(ret).and_then(|_| {
            let n = len.min(size);
            states[..n]
                .iter()
                .zip(counts[..n].iter())
                .map(|(state, count)| Ok((MirrorImageStatusState::from_raw(*state)?, *count as u32)))
                .collect()
        });
        resize_on_range(result, len)
    })
}

/// Default page size of the listing iterators.
pub const DEFAULT_ITER_CHUNK: usize = 64;

/// Pages through a pool listing. `fetch` gets the id of the last item seen
/// and the page size and returns the next page with each item's id.
struct Pager<T> {
    last_id: String,
    chunk: usize,
    buf: VecDeque<T>,
    done: bool,
}

impl<T> Pager<T> {
    fn new(chunk: usize) -> Pager<T> {
        Pager {
            last_id: String::new(),
            chunk: chunk.max(1),
            buf: VecDeque::new(),
            done: false,
        }
    }

    fn next<F, I>(&mut self, fetch: F, id_of: I) -> Option<RbdResult<T>>
    where
        F: FnOnce(&str, usize) -> RbdResult<Vec<T>>,
        I: Fn(&T) -> &str,
    {
        if self.buf.is_empty() && !self.done {
            match fetch(&self.last_id, self.chunk) {
                Ok(page) => {
                    // a short page is the last one
                    if page.len() < self.chunk {
                        self.done = true;
                    }
                    if let Some(last) = page.last() {
                        self.last_id = id_of(last).to_string();
                    }
                    self.buf.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.buf.pop_front().map(Ok)
    }
}

/// Iterator over the global mirror status of every image in a pool.
pub struct MirrorImageGlobalStatusIter<'c> {
    ioctx: &'c dyn IoContext,
    pager: Pager<GlobalMirrorImageIdAndStatus>,
}

impl<'c> MirrorImageGlobalStatusIter<'c> {
    pub fn new(ioctx: &'c dyn IoContext) -> MirrorImageGlobalStatusIter<'c> {
        MirrorImageGlobalStatusIter {
            ioctx,
            pager: Pager::new(DEFAULT_ITER_CHUNK),
        }
    }

    /// Fetch `chunk` entries per native call.
    pub fn with_chunk_size(mut self, chunk: usize) -> Self {
        self.pager.chunk = chunk.max(1);
        self
    }
}

impl Iterator for MirrorImageGlobalStatusIter<'_> {
    type Item = RbdResult<GlobalMirrorImageIdAndStatus>;

    fn next(&mut self) -> Option<Self::Item> {
        let ioctx = self.ioctx;
        self.pager.next(
            |start, max| mirror_image_global_status_list(ioctx, start, max),
            |item| &item.id,
        )
    }
}

/// Iterator over the mirror info of every mirrored image in a pool.
pub struct MirrorImageInfoIter<'c> {
    ioctx: &'c dyn IoContext,
    mode_filter: Option<ImageMirrorMode>,
    pager: Pager<MirrorImageInfoItem>,
}

impl<'c> MirrorImageInfoIter<'c> {
    pub fn new(ioctx: &'c dyn IoContext, mode_filter: Option<ImageMirrorMode>) -> MirrorImageInfoIter<'c> {
        MirrorImageInfoIter {
            ioctx,
            mode_filter,
            pager: Pager::new(DEFAULT_ITER_CHUNK),
        }
    }

    pub fn with_chunk_size(mut self, chunk: usize) -> Self {
        self.pager.chunk = chunk.max(1);
        self
    }
}

impl Iterator for MirrorImageInfoIter<'_> {
    type Item = RbdResult<MirrorImageInfoItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let ioctx = self.ioctx;
        let filter = self.mode_filter;
        self.pager.next(
            |start, max| mirror_image_info_list(ioctx, filter, start, max),
            |item| &item.id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::fake;

    fn site(uuid: &str) -> SiteMirrorImageStatus {
        SiteMirrorImageStatus {
            mirror_uuid: uuid.to_string(),
            state: MirrorImageStatusState::Replaying,
            description: String::new(),
            last_update: std::time::UNIX_EPOCH,
            up: true,
        }
    }

    #[test]
    fn local_status_has_empty_uuid() {
        let status = GlobalMirrorImageStatus {
            name: "img".to_string(),
            info: MirrorImageInfo {
                global_id: "g".to_string(),
                state: MirrorImageState::Enabled,
                primary: true,
            },
            site_statuses: vec![site("remote"), site("")],
        };
        assert_eq!(status.local_status().unwrap().mirror_uuid, "");

        let remote_only = GlobalMirrorImageStatus {
            site_statuses: vec![site("remote")],
            ..status
        };
        assert!(remote_only.local_status().unwrap_err().is_not_found());
    }

    #[test]
    fn state_names() {
        assert_eq!(MirrorImageStatusState::from_raw(3).unwrap().to_string(), "starting_replay");
        assert_eq!(MirrorMode::from_raw(2).unwrap(), MirrorMode::Pool);
        assert_eq!(ImageMirrorMode::Snapshot.to_raw(), 1);
        assert_eq!(MirrorPeerDirection::RxTx.to_raw(), 2);
        assert!(MirrorImageState::from_raw(3).is_err());
    }

    #[test]
    fn pager_stops_after_short_page() {
        let mut pager: Pager<String> = Pager::new(2);
        let mut calls = Vec::new();
        let pages = vec![vec!["a", "b"], vec!["c"]];
        let mut out = Vec::new();
        loop {
            let item = pager.next(
                |start, max| {
                    calls.push((start.to_string(), max));
                    Ok(pages[calls.len() - 1].iter().map(|s| s.to_string()).collect())
                },
                |s| s,
            );
            match item {
                Some(Ok(s)) => out.push(s),
                Some(Err(e)) => panic!("unexpected {:?}", e),
                None => break,
            }
        }
        assert_eq!(out, vec!["a", "b", "c"]);
        assert_eq!(calls, vec![(String::new(), 2), ("b".to_string(), 2)]);
    }

    #[test]
    fn pager_surfaces_error_once() {
        let mut pager: Pager<String> = Pager::new(4);
        assert!(pager.next(|_, _| Err(RbdError::PermissionDenied), |s| s).unwrap().is_err());
        assert!(pager.next(|_, _| Ok(vec!["x".to_string()]), |s| s).is_none());
    }

    #[test]
    fn image_mirroring_needs_open_image() {
        let image = Image::new(fake(true), "img");
        assert!(matches!(image.mirror_enable(ImageMirrorMode::Snapshot), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.get_global_mirror_status(), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.create_mirror_snapshot(), Err(RbdError::ImageNotOpen)));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        use crate::image::tests::FAKE;
        assert!(matches!(mirror_image_global_status_list(&FAKE, "", 0), Err(RbdError::InvalidArgument)));
        assert!(matches!(mirror_image_info_list(&FAKE, None, "", 0), Err(RbdError::InvalidArgument)));
    }
}
