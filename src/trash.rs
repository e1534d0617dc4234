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

use std::fmt;
use std::time::{Duration, SystemTime};

use libc::size_t;

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{c_string, time_from_secs, to_cstring};
use crate::image::{Image, Validate};
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized};

/// Who moved an image into the trash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashSource {
    User,
    Mirroring,
    Migration,
    Removing,
    UserParent,
}

impl TrashSource {
    fn from_raw(v: rbd_trash_image_source_t) -> RbdResult<TrashSource> {
        match v {
            0 => Ok(TrashSource::User),
            1 => Ok(TrashSource::Mirroring),
            2 => Ok(TrashSource::Migration),
            3 => Ok(TrashSource::Removing),
            4 => Ok(TrashSource::UserParent),
            _ => Err(RbdError::new(format!("unknown trash source {}", v))),
        }
    }
}

impl fmt::Display for TrashSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            TrashSource::User => "user",
            TrashSource::Mirroring => "mirroring",
            TrashSource::Migration => "migration",
            TrashSource::Removing => "removing",
            TrashSource::UserParent => "user_parent",
        })
    }
}

/// An image sitting in the pool's trash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashInfo {
    pub id: String,
    pub name: String,
    pub source: TrashSource,
    pub deletion_time: SystemTime,
    /// The image can not be purged before this.
    pub deferment_end_time: SystemTime,
}

impl Image<'_> {
    /// Move the image to the trash. It can be restored until `delay` has
    /// passed.
    pub fn trash(&self, delay: Duration) -> RbdResult<()> {
        self.validate(Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT | Validate::IS_NOT_OPEN)?;
        let c_name = to_cstring(&self.name)?;
        trace!("moving image {} to trash", self.name);
        check(unsafe { rbd_trash_move(self.raw_ioctx()?, c_name.as_ptr(), delay.as_secs()) })
    }
}

pub fn trash_list(ioctx: &dyn IoContext) -> RbdResult<Vec<TrashInfo>> {
    let io = ioctx_of(ioctx);
    retry_sized(32, 1024, |size| {
        let mut count: size_t = size;
        let mut entries = vec![rbd_trash_image_info_t::default(); size];
        let ret = unsafe { rbd_trash_list(io, entries.as_mut_ptr(), &mut count) };
        let result = check_if_negative(ret).and_then(|_| {
            let list = entries[..count]
                .iter()
                .map(|e| {
                    Ok(TrashInfo {
                        id: c_string(e.id),
                        name: c_string(e.name),
                        source: TrashSource::from_raw(e.source)?,
                        deletion_time: time_from_secs(e.deletion_time),
                        deferment_end_time: time_from_secs(e.deferment_end_time),
                    })
                })
                .collect();
            unsafe {
                rbd_trash_list_cleanup(entries.as_mut_ptr(), count);
            }
            list
        });
        resize_on_range(result, count)
    })
}

/// Delete a trashed image for good. `force` ignores the deferment time.
pub fn trash_remove(ioctx: &dyn IoContext, id: &str, force: bool) -> RbdResult<()> {
    if id.is_empty() {
        return Err(RbdError::NoName);
    }
    let c_id = to_cstring(id)?;
    trace!("removing trashed image {}", id);
    check(unsafe { rbd_trash_remove(ioctx_of(ioctx), c_id.as_ptr(), force) })
}

/// Bring a trashed image back as `name`.
pub fn trash_restore(ioctx: &dyn IoContext, id: &str, name: &str) -> RbdResult<()> {
    if id.is_empty() || name.is_empty() {
        return Err(RbdError::NoName);
    }
    let c_id = to_cstring(id)?;
    let c_name = to_cstring(name)?;
    check(unsafe { rbd_trash_restore(ioctx_of(ioctx), c_id.as_ptr(), c_name.as_ptr()) })
}
