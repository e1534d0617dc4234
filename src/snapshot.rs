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

use libc::{c_char, c_int, c_void, size_t};

use crate::callbacks::{dispatch_progress, with_progress, ProgressCallbacks};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{buf_to_string, c_string, to_cstring, zeroed_timespec, OptionalCString, Timespec};
use crate::image::{Image, Validate};
use crate::rbd::*;
use crate::retry::{double_on_range, resize_on_range, retry_sized};

static SNAP_ROLLBACK_CALLBACKS: ProgressCallbacks = ProgressCallbacks::new();

extern "C" fn snap_rollback_progress(offset: u64, total: u64, arg: *mut c_void) -> c_int {
    dispatch_progress(&SNAP_ROLLBACK_CALLBACKS, offset, total, arg)
}

/// A named snapshot of an image. It has no handle of its own; everything
/// goes through the image, which must be open.
pub struct Snapshot<'i, 'a> {
    image: &'i Image<'a>,
    name: String,
}

/// One entry of `Image::get_snapshot_names`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapInfo {
    pub id: u64,
    pub size: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapNamespaceType {
    User,
    Group,
    Trash,
    Mirror,
}

impl SnapNamespaceType {
    pub(crate) fn from_raw(v: rbd_snap_namespace_type_t) -> RbdResult<SnapNamespaceType> {
        match v {
            0 => Ok(SnapNamespaceType::User),
            1 => Ok(SnapNamespaceType::Group),
            2 => Ok(SnapNamespaceType::Trash),
            3 => Ok(SnapNamespaceType::Mirror),
            _ => Err(RbdError::new(format!("unknown snapshot namespace type {}", v))),
        }
    }
}

impl fmt::Display for SnapNamespaceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            SnapNamespaceType::User => "user",
            SnapNamespaceType::Group => "group",
            SnapNamespaceType::Trash => "trash",
            SnapNamespaceType::Mirror => "mirror",
        })
    }
}

/// Where a group snapshot placed this image snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapGroupNamespace {
    pub group_pool: i64,
    pub group_name: String,
    pub group_snap_name: String,
}

impl<'a> Image<'a> {
    pub fn create_snapshot(&self, name: &str) -> RbdResult<Snapshot<'_, 'a>> {
        let handle = self.handle()?;
        if name.is_empty() {
            return Err(RbdError::SnapshotNoName);
        }
        let c_name = to_cstring(name)?;
        trace!("creating snapshot {}@{}", self.name, name);
        check(unsafe { rbd_snap_create(handle, c_name.as_ptr()) })?;
        Ok(self.get_snapshot(name))
    }

    /// A reference to an existing snapshot. Nothing is checked here.
    pub fn get_snapshot(&self, name: &str) -> Snapshot<'_, 'a> {
        Snapshot {
            image: self,
            name: name.to_string(),
        }
    }

    pub fn get_snapshot_names(&self) -> RbdResult<Vec<SnapInfo>> {
        let handle = self.handle()?;
        retry_sized(1024, 262144, |size| {
            let mut max: c_int = size as c_int;
            let mut snaps = vec![rbd_snap_info_t::default(); size];
            let ret = unsafe { rbd_snap_list(handle, snaps.as_mut_ptr(), &mut max) };
            let result = check_if_negative(ret).map(|count| {
                let list = snaps[..count as usize]
                    .iter()
                    .map(|s| SnapInfo {
                        id: s.id,
                        size: s.size,
                        name: c_string(s.name),
                    })
                    .collect();
                unsafe {
                    rbd_snap_list_end(snaps.as_mut_ptr());
                }
                list
            });
            resize_on_range(result, max.max(0) as usize)
        })
    }

    pub fn get_snap_id(&self, name: &str) -> RbdResult<u64> {
        let handle = self.handle()?;
        if name.is_empty() {
            return Err(RbdError::SnapshotNoName);
        }
        let c_name = to_cstring(name)?;
        let mut id: u64 = 0;
        check(unsafe { rbd_snap_get_id(handle, c_name.as_ptr(), &mut id) })?;
        Ok(id)
    }

    pub fn get_snap_name(&self, id: u64) -> RbdResult<String> {
        let handle = self.handle()?;
        retry_sized(64, 65536, |size| {
            let mut buf = vec![0u8; size];
            let mut len: size_t = size;
            let ret = unsafe { rbd_snap_get_name(handle, id, buf.as_mut_ptr() as *mut c_char, &mut len) };
            resize_on_range(check(ret).map(|_| buf_to_string(&buf)), len)
        })
    }

    /// Read from the snapshot with this id instead of the head.
    pub fn set_snap_by_id(&self, id: u64) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_snap_set_by_id(handle, id) })
    }

    /// Read from the named snapshot, or from the head again with `None`.
    pub fn set_snapshot(&self, name: Option<&str>) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_name = OptionalCString::new(name)?;
        check(unsafe { rbd_snap_set(handle, c_name.as_ptr()) })
    }

    pub fn get_snap_timestamp(&self, id: u64) -> RbdResult<Timespec> {
        let handle = self.handle()?;
        let mut ts = zeroed_timespec();
        check(unsafe { rbd_snap_get_timestamp(handle, id, &mut ts) })?;
        Ok(ts.into())
    }

    pub fn get_snap_namespace_type(&self, id: u64) -> RbdResult<SnapNamespaceType> {
        let handle = self.handle()?;
        let mut ns: rbd_snap_namespace_type_t = 0;
        check(unsafe { rbd_snap_get_namespace_type(handle, id, &mut ns) })?;
        SnapNamespaceType::from_raw(ns)
    }

    /// The name a snapshot had before it was moved to the trash namespace.
    pub fn get_snap_trash_namespace(&self, id: u64) -> RbdResult<String> {
        let handle = self.handle()?;
        retry_sized(4096, 262144, |size| {
            let mut buf = vec![0u8; size];
            let ret = unsafe { rbd_snap_get_trash_namespace(handle, id, buf.as_mut_ptr() as *mut c_char, size) };
            double_on_range(check(ret).map(|_| buf_to_string(&buf)))
        })
    }

    pub fn get_snap_group_namespace(&self, id: u64) -> RbdResult<SnapGroupNamespace> {
        let handle = self.handle()?;
        let mut ns = rbd_snap_group_namespace_t::default();
        let size = std::mem::size_of::<rbd_snap_group_namespace_t>();
        check(unsafe { rbd_snap_get_group_namespace(handle, id, &mut ns, size) })?;
        let ns = scopeguard::guard(ns, |mut ns| {
            let ret = unsafe { rbd_snap_group_namespace_cleanup(&mut ns, size) };
            if ret < 0 {
                error!("rbd_snap_group_namespace_cleanup failed: {}", RbdError::from_code(ret));
            }
        });
        Ok(SnapGroupNamespace {
            group_pool: ns.group_pool,
            group_name: c_string(ns.group_name),
            group_snap_name: c_string(ns.group_snap_name),
        })
    }
}

impl<'i, 'a> Snapshot<'i, 'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &'i Image<'a> {
        self.image
    }

    pub(crate) fn validate(&self, req: Validate) -> RbdResult<()> {
        self.image.validate(req - Validate::SNAPSHOT_NEEDS_NAME)?;
        if req.contains(Validate::SNAPSHOT_NEEDS_NAME) && self.name.is_empty() {
            return Err(RbdError::SnapshotNoName);
        }
        Ok(())
    }

    fn prepare(&self) -> RbdResult<(rbd_image_t, std::ffi::CString)> {
        self.validate(Validate::IS_OPEN | Validate::SNAPSHOT_NEEDS_NAME)?;
        Ok((self.image.handle()?, to_cstring(&self.name)?))
    }

    pub fn remove(&self) -> RbdResult<()> {
        let (handle, c_name) = self.prepare()?;
        trace!("removing snapshot {}@{}", self.image.name, self.name);
        check(unsafe { rbd_snap_remove(handle, c_name.as_ptr()) })
    }

    /// Roll the image back to this snapshot.
    pub fn rollback(&self) -> RbdResult<()> {
        let (handle, c_name) = self.prepare()?;
        trace!("rolling back {} to {}", self.image.name, self.name);
        check(unsafe { rbd_snap_rollback(handle, c_name.as_ptr()) })
    }

    /// `rollback` reporting `(offset, total)` as it goes. A non-zero return
    /// from the callback aborts the rollback.
    pub fn rollback_with_progress<F>(&self, callback: F) -> RbdResult<()>
    where
        F: FnMut(u64, u64) -> i32 + Send + 'static,
    {
        let (handle, c_name) = self.prepare()?;
        trace!("rolling back {} to {} with progress", self.image.name, self.name);
        let ret = with_progress(&SNAP_ROLLBACK_CALLBACKS, callback, |arg| unsafe {
            rbd_snap_rollback_with_progress(handle, c_name.as_ptr(), Some(snap_rollback_progress), arg)
        });
        check(ret)
    }

    pub fn protect(&self) -> RbdResult<()> {
        let (handle, c_name) = self.prepare()?;
        check(unsafe { rbd_snap_protect(handle, c_name.as_ptr()) })
    }

    pub fn unprotect(&self) -> RbdResult<()> {
        let (handle, c_name) = self.prepare()?;
        check(unsafe { rbd_snap_unprotect(handle, c_name.as_ptr()) })
    }

    pub fn is_protected(&self) -> RbdResult<bool> {
        let (handle, c_name) = self.prepare()?;
        let mut protected: c_int = 0;
        check(unsafe { rbd_snap_is_protected(handle, c_name.as_ptr(), &mut protected) })?;
        Ok(protected != 0)
    }

    /// Make the image read from this snapshot.
    pub fn set(&self) -> RbdResult<()> {
        let (handle, c_name) = self.prepare()?;
        check(unsafe { rbd_snap_set(handle, c_name.as_ptr()) })
    }

    pub fn rename(&mut self, dest: &str) -> RbdResult<()> {
        let (handle, c_name) = self.prepare()?;
        let c_dest = to_cstring(dest)?;
        check(unsafe { rbd_snap_rename(handle, c_name.as_ptr(), c_dest.as_ptr()) })?;
        self.name = dest.to_string();
        Ok(())
    }
}

impl fmt::Debug for Snapshot<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("image", &self.image.name)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::{fake, with_fake_open};

    #[test]
    fn snapshot_checks_image_before_name() {
        let image = Image::new(fake(true), "img");
        let snap = image.get_snapshot("");
        assert!(matches!(snap.protect(), Err(RbdError::ImageNotOpen)));

        let unnamed = Image::new(fake(true), "");
        let snap = unnamed.get_snapshot("s");
        assert!(matches!(
            snap.validate(Validate::NEEDS_NAME | Validate::SNAPSHOT_NEEDS_NAME),
            Err(RbdError::NoName)
        ));
    }

    #[test]
    fn open_image_with_unnamed_snapshot() {
        with_fake_open("img", true, |image| {
            let snap = image.get_snapshot("");
            assert!(matches!(snap.remove(), Err(RbdError::SnapshotNoName)));
            assert!(matches!(snap.is_protected(), Err(RbdError::SnapshotNoName)));
            assert!(matches!(image.create_snapshot(""), Err(RbdError::SnapshotNoName)));
        });
    }

    #[test]
    fn snap_namespaces_need_open_image() {
        let image = Image::new(fake(true), "img");
        assert!(matches!(image.get_snap_group_namespace(4), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.get_snap_trash_namespace(4), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.get_snap_namespace_type(4), Err(RbdError::ImageNotOpen)));
    }

    #[test]
    fn namespace_type_names() {
        assert_eq!(SnapNamespaceType::from_raw(2).unwrap(), SnapNamespaceType::Trash);
        assert_eq!(SnapNamespaceType::Group.to_string(), "group");
        assert!(SnapNamespaceType::from_raw(9).is_err());
    }
}
