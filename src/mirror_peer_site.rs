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

//! Remote clusters a pool mirrors to or from.

use std::collections::BTreeMap;
use std::time::SystemTime;

use libc::{c_char, c_int, size_t, E2BIG};

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{buf_to_string, c_string, join_nul_terminated, time_from_secs, to_cstring};
use crate::metadata::zip_metadata;
use crate::mirror::MirrorPeerDirection;
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized, Hint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPeerSite {
    pub uuid: String,
    pub direction: MirrorPeerDirection,
    pub site_name: String,
    pub mirror_uuid: String,
    pub client_name: String,
    pub last_seen: SystemTime,
}

impl MirrorPeerSite {
    fn from_raw(p: &rbd_mirror_peer_site_t) -> RbdResult<MirrorPeerSite> {
        Ok(MirrorPeerSite {
            uuid: c_string(p.uuid),
            direction: MirrorPeerDirection::from_raw(p.direction)?,
            site_name: c_string(p.site_name),
            mirror_uuid: c_string(p.mirror_uuid),
            client_name: c_string(p.client_name),
            last_seen: time_from_secs(p.last_seen),
        })
    }
}

/// Register a peer and return the uuid librbd assigned to it.
pub fn add_mirror_peer_site(
    ioctx: &dyn IoContext,
    site_name: &str,
    client_name: &str,
    direction: MirrorPeerDirection,
) -> RbdResult<String> {
    let io = ioctx_of(ioctx);
    let c_site = to_cstring(site_name)?;
    let c_client = to_cstring(client_name)?;
    retry_sized(512, 65536, |size| {
        let mut buf = vec![0u8; size];
        let ret = unsafe {
            rbd_mirror_peer_site_add(
                io,
                buf.as_mut_ptr() as *mut c_char,
                size,
                direction.to_raw(),
                c_site.as_ptr(),
                c_client.as_ptr(),
            )
        };
        if ret == -E2BIG {
            return (Err(RbdError::RangeTooSmall), Hint::DoubleSize);
        }
        (check(ret).map(|_| buf_to_string(&buf)), Hint::Done)
    })
}

pub fn remove_mirror_peer_site(ioctx: &dyn IoContext, uuid: &str) -> RbdResult<()> {
    let c_uuid = to_cstring(uuid)?;
    check(unsafe { rbd_mirror_peer_site_remove(ioctx_of(ioctx), c_uuid.as_ptr()) })
}

pub fn list_mirror_peer_sites(ioctx: &dyn IoContext) -> RbdResult<Vec<MirrorPeerSite>> {
    let io = ioctx_of(ioctx);
    retry_sized(10, 4096, |size| {
        let mut peers = vec![rbd_mirror_peer_site_t::default(); size];
        let mut count = size as c_int;
        let ret = unsafe { rbd_mirror_peer_site_list(io, peers.as_mut_ptr(), &mut count) };
        let result = check(ret).and_then(|_| {
            let n = (count.max(0) as usize).min(size);
            let list = peers[..n].iter().map(MirrorPeerSite::from_raw).collect();
            unsafe { rbd_mirror_peer_site_list_cleanup(peers.as_mut_ptr(), count) };
            list
        });
        resize_on_range(result, count.max(0) as usize)
    })
}

pub fn set_mirror_peer_site_client_name(ioctx: &dyn IoContext, uuid: &str, client_name: &str) -> RbdResult<()> {
    let c_uuid = to_cstring(uuid)?;
    let c_client = to_cstring(client_name)?;
    check(unsafe { rbd_mirror_peer_site_set_client_name(ioctx_of(ioctx), c_uuid.as_ptr(), c_client.as_ptr()) })
}

pub fn set_mirror_peer_site_direction(
    ioctx: &dyn IoContext,
    uuid: &str,
    direction: MirrorPeerDirection,
) -> RbdResult<()> {
    let c_uuid = to_cstring(uuid)?;
    check(unsafe { rbd_mirror_peer_site_set_direction(ioctx_of(ioctx), c_uuid.as_ptr(), direction.to_raw()) })
}

pub fn set_mirror_peer_site_name(ioctx: &dyn IoContext, uuid: &str, site_name: &str) -> RbdResult<()> {
    let c_uuid = to_cstring(uuid)?;
    let c_site = to_cstring(site_name)?;
    check(unsafe { rbd_mirror_peer_site_set_name(ioctx_of(ioctx), c_uuid.as_ptr(), c_site.as_ptr()) })
}

/// Extra peer settings such as `mon_host` and `key`.
pub fn get_mirror_peer_site_attributes(ioctx: &dyn IoContext, uuid: &str) -> RbdResult<BTreeMap<String, String>> {
    let io = ioctx_of(ioctx);
    let c_uuid = to_cstring(uuid)?;
    retry_sized(1024, 65536, |size| {
        let mut keys = vec![0u8; size];
        let mut values = vec![0u8; size];
        let mut keys_len: size_t = size;
        let mut values_len: size_t = size;
        let mut count: size_t = 0;
        let ret = unsafe {
            rbd_mirror_peer_site_get_attributes(
                io,
                c_uuid.as_ptr(),
                keys.as_mut_ptr() as *mut c_char,
                &mut keys_len,
                values.as_mut_ptr() as *mut c_char,
                &mut values_len,
                &mut count,
            )
        };
        let result = check_if_negative(ret)
            .and_then(|_| zip_metadata(&keys[..keys_len.min(size)], &values[..values_len.min(size)]));
        resize_on_range(result, keys_len.max(values_len))
    })
}

pub fn set_mirror_peer_site_attributes(
    ioctx: &dyn IoContext,
    uuid: &str,
    attributes: &BTreeMap<String, String>,
) -> RbdResult<()> {
    let c_uuid = to_cstring(uuid)?;
    let keys = join_nul_terminated(attributes.keys().map(String::as_str))?;
    let values = join_nul_terminated(attributes.values().map(String::as_str))?;
    check(unsafe {
        rbd_mirror_peer_site_set_attributes(
            ioctx_of(ioctx),
            c_uuid.as_ptr(),
            keys.as_ptr() as *const c_char,
            values.as_ptr() as *const c_char,
            attributes.len(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::FAKE;

    #[test]
    fn interior_nul_in_attributes_is_rejected() {
        let mut attrs = BTreeMap::new();
        attrs.insert("mon_host".to_string(), "a\0b".to_string());
        assert!(matches!(
            set_mirror_peer_site_attributes(&FAKE, "uuid", &attrs),
            Err(RbdError::NulError(_))
        ));
    }

    #[test]
    fn direction_round_trips_through_raw() {
        for d in [MirrorPeerDirection::Rx, MirrorPeerDirection::Tx, MirrorPeerDirection::RxTx].iter() {
            assert_eq!(MirrorPeerDirection::from_raw(d.to_raw()).unwrap(), *d);
        }
    }
}
