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

//! Consistency groups and their member images.

use std::fmt;
use std::mem;

use libc::{c_char, size_t};

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{c_string, split_buffer, to_cstring};
use crate::image::Image;
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized};

pub(crate) fn check_group_name(name: &str) -> RbdResult<()> {
    if name.is_empty() {
        return Err(RbdError::NoName);
    }
    Ok(())
}

/// Log and return a failing `*_cleanup` result.
pub(crate) fn check_cleanup(what: &str, ret: i32) -> RbdResult<()> {
    check(ret).map_err(|e| {
        error!("{} cleanup failed: {}", what, e);
        e
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupImageState {
    Attached,
    Incomplete,
}

impl GroupImageState {
    fn from_raw(v: rbd_group_image_state_t) -> RbdResult<GroupImageState> {
        match v {
            0 => Ok(GroupImageState::Attached),
            1 => Ok(GroupImageState::Incomplete),
            _ => Err(RbdError::new(format!("unknown group image state {}", v))),
        }
    }
}

impl fmt::Display for GroupImageState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            GroupImageState::Attached => "attached",
            GroupImageState::Incomplete => "incomplete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupImageInfo {
    pub name: String,
    pub pool_id: i64,
    pub state: GroupImageState,
}

/// The group an image belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
    pub pool_id: i64,
}

pub fn group_create(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    check_group_name(name)?;
    let c_name = to_cstring(name)?;
    check(unsafe { rbd_group_create(ioctx_of(ioctx), c_name.as_ptr()) })
}

pub fn group_remove(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    check_group_name(name)?;
    let c_name = to_cstring(name)?;
    trace!("removing group {}", name);
    check(unsafe { rbd_group_remove(ioctx_of(ioctx), c_name.as_ptr()) })
}

pub fn group_rename(ioctx: &dyn IoContext, src: &str, dest: &str) -> RbdResult<()> {
    check_group_name(src)?;
    check_group_name(dest)?;
    let c_src = to_cstring(src)?;
    let c_dest = to_cstring(dest)?;
    check(unsafe { rbd_group_rename(ioctx_of(ioctx), c_src.as_ptr(), c_dest.as_ptr()) })
}

/// Names of all groups in the pool.
pub fn group_list(ioctx: &dyn IoContext) -> RbdResult<Vec<String>> {
    let io = ioctx_of(ioctx);
    retry_sized(1024, 262144, |size| {
        let mut buf = vec![0u8; size];
        let mut len: size_t = size;
        let ret = unsafe { rbd_group_list(io, buf.as_mut_ptr() as *mut c_char, &mut len) };
        // on success the return value is the number of bytes used
        let result = check_if_negative(ret).map(|used| split_buffer(&buf[..(used as usize).min(size)]));
        resize_on_range(result, len)
    })
}

pub fn group_image_add(
    group_ioctx: &dyn IoContext,
    group: &str,
    image_ioctx: &dyn IoContext,
    image: &str,
) -> RbdResult<()> {
    check_group_name(group)?;
    check_group_name(image)?;
    let c_group = to_cstring(group)?;
    let c_image = to_cstring(image)?;
    check(unsafe {
        rbd_group_image_add(ioctx_of(group_ioctx), c_group.as_ptr(), ioctx_of(image_ioctx), c_image.as_ptr())
    })
}

pub fn group_image_remove(
    group_ioctx: &dyn IoContext,
    group: &str,
    image_ioctx: &dyn IoContext,
    image: &str,
) -> RbdResult<()> {
    check_group_name(group)?;
    check_group_name(image)?;
    let c_group = to_cstring(group)?;
    let c_image = to_cstring(image)?;
    check(unsafe {
        rbd_group_image_remove(ioctx_of(group_ioctx), c_group.as_ptr(), ioctx_of(image_ioctx), c_image.as_ptr())
    })
}

pub fn group_image_remove_by_id(
    group_ioctx: &dyn IoContext,
    group: &str,
    image_ioctx: &dyn IoContext,
    image_id: &str,
) -> RbdResult<()> {
    check_group_name(group)?;
    check_group_name(image_id)?;
    let c_group = to_cstring(group)?;
    let c_id = to_cstring(image_id)?;
    check(unsafe {
        rbd_group_image_remove_by_id(ioctx_of(group_ioctx), c_group.as_ptr(), ioctx_of(image_ioctx), c_id.as_ptr())
    })
}

pub fn group_image_list(ioctx: &dyn IoContext, group: &str) -> RbdResult<Vec<GroupImageInfo>> {
    check_group_name(group)?;
    let io = ioctx_of(ioctx);
    let c_group = to_cstring(group)?;
    let entry_size = mem::size_of::<rbd_group_image_info_t>();
    retry_sized(1024, 262144, |size| {
        let mut count: size_t = size;
        let mut images = vec![rbd_group_image_info_t::default(); size];
        let ret = unsafe { rbd_group_image_list(io, c_group.as_ptr(), images.as_mut_ptr(), entry_size, &mut count) };
        let result = check_if_negative(ret).and_then(|_| {
            let list: RbdResult<Vec<GroupImageInfo>> = images[..count]
                .iter()
                .map(|i| {
                    Ok(GroupImageInfo {
                        name: c_string(i.name),
                        pool_id: i.pool,
                        state: GroupImageState::from_raw(i.state)?,
                    })
                })
                .collect();
            let cleaned = unsafe { rbd_group_image_list_cleanup(images.as_mut_ptr(), entry_size, count) };
            check_cleanup("group image list", cleaned)?;
            list
        });
        resize_on_range(result, count)
    })
}

impl Image<'_> {
    /// The group this image is a member of. The name is empty when the
    /// image is in no group.
    pub fn get_group(&self) -> RbdResult<GroupInfo> {
        let handle = self.handle()?;
        let mut info = rbd_group_info_t::default();
        let ret = unsafe { rbd_get_group(handle, &mut info, mem::size_of::<rbd_group_info_t>()) };
        check_if_negative(ret)?;
        let group = GroupInfo {
            name: c_string(info.name),
            pool_id: info.pool,
        };
        let cleaned = unsafe { rbd_group_info_cleanup(&mut info, mem::size_of::<rbd_group_info_t>()) };
        check_cleanup("group info", cleaned)?;
        Ok(group)
    }
}
