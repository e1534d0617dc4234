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

//! Images: creation, opening, properties and the data path.
//!
//! An `Image` is either a named reference into a pool or an open handle.
//! Every operation states which of those it needs and is rejected before
//! librbd is called when the value is in the wrong state.

use std::convert::TryFrom;
use std::fmt;
use std::io;
use std::mem;
use std::ptr;

use libc::{c_char, c_int, size_t};

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::features::ImageFeatures;
use crate::helpers::{buf_to_string, c_string, to_cstring, zeroed_timespec, OptionalCString, Timespec};
use crate::options::ImageOptions;
use crate::rados::{rados_ioctx_t, OpFlags};
use crate::rbd::*;
use crate::retry::{double_on_range, resize_on_range, retry_sized};

bitflags! {
    /// Preconditions an operation declares before touching librbd.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Validate: u32 {
        const NEEDS_NAME = 1 << 0;
        const NEEDS_IOCONTEXT = 1 << 1;
        const IS_OPEN = 1 << 2;
        const IS_NOT_OPEN = 1 << 3;
        const SNAPSHOT_NEEDS_NAME = 1 << 4;
    }
}

/// The library version as (major, minor, extra).
pub fn version() -> (i32, i32, i32) {
    let mut major: c_int = 0;
    let mut minor: c_int = 0;
    let mut extra: c_int = 0;
    unsafe {
        rbd_version(&mut major, &mut minor, &mut extra);
    }
    (major, minor, extra)
}

/// Output of `Image::stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub size: u64,
    pub obj_size: u64,
    pub num_objs: u64,
    pub order: i32,
    pub block_name_prefix: String,
}

/// An image as listed in a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    pub id: String,
    pub name: String,
}

/// The parent of a cloned image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentInfo {
    pub pool_id: i64,
    pub pool_name: String,
    pub pool_namespace: String,
    pub image_name: String,
    pub image_id: String,
    pub trash: bool,
    pub snap_id: u64,
    pub snap_name: String,
}

/// A reference to an image, open or not.
///
/// The stream style `read`, `write` and `seek` share one cursor and must not
/// be interleaved from several threads; `read_at` and `write_at` do not touch
/// it.
pub struct Image<'a> {
    pub(crate) name: String,
    pub(crate) ioctx: Option<&'a dyn IoContext>,
    pub(crate) image: Option<rbd_image_t>,
    pub(crate) offset: i64,
}

unsafe impl Send for Image<'_> {}
unsafe impl Sync for Image<'_> {}

impl<'a> Image<'a> {
    /// A closed reference to `name`. Nothing is checked until an operation
    /// runs.
    pub fn new(ioctx: Option<&'a dyn IoContext>, name: &str) -> Image<'a> {
        Image {
            name: name.to_string(),
            ioctx,
            image: None,
            offset: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    pub(crate) fn validate(&self, req: Validate) -> RbdResult<()> {
        if req.contains(Validate::NEEDS_NAME) && self.name.is_empty() {
            return Err(RbdError::NoName);
        }
        if req.contains(Validate::NEEDS_IOCONTEXT) && self.ioctx.is_none() {
            return Err(RbdError::NoIOContext);
        }
        if req.contains(Validate::IS_OPEN) && self.image.is_none() {
            return Err(RbdError::ImageNotOpen);
        }
        if req.contains(Validate::IS_NOT_OPEN) && self.image.is_some() {
            return Err(RbdError::ImageIsOpen);
        }
        Ok(())
    }

    /// The native handle, after checking the image is open.
    pub(crate) fn handle(&self) -> RbdResult<rbd_image_t> {
        self.validate(Validate::IS_OPEN)?;
        self.image.ok_or(RbdError::ImageNotOpen)
    }

    pub(crate) fn raw_ioctx(&self) -> RbdResult<rados_ioctx_t> {
        match self.ioctx {
            Some(ioctx) => Ok(ioctx_of(ioctx)),
            None => Err(RbdError::NoIOContext),
        }
    }

    pub fn create(ioctx: &'a dyn IoContext, name: &str, size: u64, order: i32) -> RbdResult<Image<'a>> {
        if name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_name = to_cstring(name)?;
        let mut c_order: c_int = order;
        trace!("creating image {} of {} bytes", name, size);
        check(unsafe { rbd_create(ioctx_of(ioctx), c_name.as_ptr(), size, &mut c_order) })?;
        Ok(Image::new(Some(ioctx), name))
    }

    pub fn create_with_features(
        ioctx: &'a dyn IoContext,
        name: &str,
        size: u64,
        features: ImageFeatures,
        order: i32,
    ) -> RbdResult<Image<'a>> {
        if name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_name = to_cstring(name)?;
        let mut c_order: c_int = order;
        trace!("creating image {} of {} bytes with features {}", name, size, features);
        check(unsafe { rbd_create2(ioctx_of(ioctx), c_name.as_ptr(), size, features.bits(), &mut c_order) })?;
        Ok(Image::new(Some(ioctx), name))
    }

    pub fn create_with_stripes(
        ioctx: &'a dyn IoContext,
        name: &str,
        size: u64,
        features: ImageFeatures,
        order: i32,
        stripe_unit: u64,
        stripe_count: u64,
    ) -> RbdResult<Image<'a>> {
        if name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_name = to_cstring(name)?;
        let mut c_order: c_int = order;
        trace!("creating striped image {} ({}x{})", name, stripe_unit, stripe_count);
        check(unsafe {
            rbd_create3(
                ioctx_of(ioctx),
                c_name.as_ptr(),
                size,
                features.bits(),
                &mut c_order,
                stripe_unit,
                stripe_count,
            )
        })?;
        Ok(Image::new(Some(ioctx), name))
    }

    pub fn create_with_options(
        ioctx: &'a dyn IoContext,
        name: &str,
        size: u64,
        options: &ImageOptions,
    ) -> RbdResult<Image<'a>> {
        if name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_name = to_cstring(name)?;
        trace!("creating image {} of {} bytes from options", name, size);
        check(unsafe { rbd_create4(ioctx_of(ioctx), c_name.as_ptr(), size, options.as_ptr()) })?;
        Ok(Image::new(Some(ioctx), name))
    }

    /// Open `name`, optionally at `snapshot`. `None` opens the head and is
    /// not the same as `Some("")`.
    pub fn open(ioctx: &'a dyn IoContext, name: &str, snapshot: Option<&str>) -> RbdResult<Image<'a>> {
        let mut image = Image::new(Some(ioctx), name);
        image.open_with(snapshot, false, false)?;
        Ok(image)
    }

    pub fn open_read_only(ioctx: &'a dyn IoContext, name: &str, snapshot: Option<&str>) -> RbdResult<Image<'a>> {
        let mut image = Image::new(Some(ioctx), name);
        image.open_with(snapshot, true, false)?;
        Ok(image)
    }

    /// Open by image id. The returned value has an empty name; call
    /// `get_name` if one is needed.
    pub fn open_by_id(ioctx: &'a dyn IoContext, id: &str, snapshot: Option<&str>) -> RbdResult<Image<'a>> {
        let mut image = Image::new(Some(ioctx), id);
        image.open_with(snapshot, false, true)?;
        image.name.clear();
        Ok(image)
    }

    pub fn open_by_id_read_only(ioctx: &'a dyn IoContext, id: &str, snapshot: Option<&str>) -> RbdResult<Image<'a>> {
        let mut image = Image::new(Some(ioctx), id);
        image.open_with(snapshot, true, true)?;
        image.name.clear();
        Ok(image)
    }

    /// Open a closed reference in place.
    pub fn reopen(&mut self, snapshot: Option<&str>, read_only: bool) -> RbdResult<()> {
        self.open_with(snapshot, read_only, false)
    }

    fn open_with(&mut self, snapshot: Option<&str>, read_only: bool, by_id: bool) -> RbdResult<()> {
        self.validate(Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT | Validate::IS_NOT_OPEN)?;
        let io = self.raw_ioctx()?;
        let c_name = to_cstring(&self.name)?;
        let c_snap = OptionalCString::new(snapshot)?;
        let mut handle: rbd_image_t = ptr::null_mut();
        trace!("opening image {}", self.name);
        let ret = unsafe {
            match (read_only, by_id) {
                (false, false) => rbd_open(io, c_name.as_ptr(), &mut handle, c_snap.as_ptr()),
                (true, false) => rbd_open_read_only(io, c_name.as_ptr(), &mut handle, c_snap.as_ptr()),
                (false, true) => rbd_open_by_id(io, c_name.as_ptr(), &mut handle, c_snap.as_ptr()),
                (true, true) => rbd_open_by_id_read_only(io, c_name.as_ptr(), &mut handle, c_snap.as_ptr()),
            }
        };
        check(ret)?;
        self.image = Some(handle);
        self.offset = 0;
        debug!("opened image {}", self.name);
        Ok(())
    }

    /// Close the native handle. The reference stays usable and may be
    /// opened again.
    pub fn close(&mut self) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_close(handle) })?;
        self.image = None;
        debug!("closed image {}", self.name);
        Ok(())
    }

    /// Remove the image. It must not be open.
    pub fn remove(&self) -> RbdResult<()> {
        self.validate(Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT | Validate::IS_NOT_OPEN)?;
        remove_image_raw(self.raw_ioctx()?, &self.name)
    }

    /// Rename the image. `name` only changes once librbd has accepted the
    /// new one.
    pub fn rename(&mut self, dest: &str) -> RbdResult<()> {
        self.validate(Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT)?;
        let c_src = to_cstring(&self.name)?;
        let c_dest = to_cstring(dest)?;
        check(unsafe { rbd_rename(self.raw_ioctx()?, c_src.as_ptr(), c_dest.as_ptr()) })?;
        self.name = dest.to_string();
        Ok(())
    }

    pub fn resize(&self, size: u64) -> RbdResult<()> {
        let handle = self.handle()?;
        trace!("resizing image {} to {}", self.name, size);
        check(unsafe { rbd_resize(handle, size) })
    }

    pub fn stat(&self) -> RbdResult<ImageInfo> {
        let handle = self.handle()?;
        let mut info = rbd_image_info_t::default();
        check(unsafe { rbd_stat(handle, &mut info, mem::size_of::<rbd_image_info_t>()) })?;
        let prefix: Vec<u8> = info.block_name_prefix.iter().map(|c| *c as u8).collect();
        Ok(ImageInfo {
            size: info.size,
            obj_size: info.obj_size,
            num_objs: info.num_objs,
            order: info.order,
            block_name_prefix: buf_to_string(&prefix),
        })
    }

    pub fn is_old_format(&self) -> RbdResult<bool> {
        let handle = self.handle()?;
        let mut old: u8 = 0;
        check(unsafe { rbd_get_old_format(handle, &mut old) })?;
        Ok(old != 0)
    }

    pub fn get_size(&self) -> RbdResult<u64> {
        let handle = self.handle()?;
        let mut size: u64 = 0;
        check(unsafe { rbd_get_size(handle, &mut size) })?;
        Ok(size)
    }

    pub fn get_stripe_unit(&self) -> RbdResult<u64> {
        let handle = self.handle()?;
        let mut stripe_unit: u64 = 0;
        check(unsafe { rbd_get_stripe_unit(handle, &mut stripe_unit) })?;
        Ok(stripe_unit)
    }

    pub fn get_stripe_count(&self) -> RbdResult<u64> {
        let handle = self.handle()?;
        let mut stripe_count: u64 = 0;
        check(unsafe { rbd_get_stripe_count(handle, &mut stripe_count) })?;
        Ok(stripe_count)
    }

    /// How much of a clone still overlaps its parent.
    pub fn get_overlap(&self) -> RbdResult<u64> {
        let handle = self.handle()?;
        let mut overlap: u64 = 0;
        check(unsafe { rbd_get_overlap(handle, &mut overlap) })?;
        Ok(overlap)
    }

    pub fn get_features(&self) -> RbdResult<ImageFeatures> {
        let handle = self.handle()?;
        let mut features: u64 = 0;
        check(unsafe { rbd_get_features(handle, &mut features) })?;
        Ok(ImageFeatures::from_bits_retain(features))
    }

    pub fn update_features(&self, features: ImageFeatures, enabled: bool) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_update_features(handle, features.bits(), enabled as u8) })
    }

    /// The internal image id.
    pub fn get_id(&self) -> RbdResult<String> {
        let handle = self.handle()?;
        retry_sized(1, 8192, |size| {
            let mut buf = vec![0u8; size];
            let ret = unsafe { rbd_get_id(handle, buf.as_mut_ptr() as *mut c_char, size) };
            double_on_range(check(ret).map(|_| buf_to_string(&buf)))
        })
    }

    /// The image name as librbd knows it, which also works after an open by
    /// id.
    pub fn get_name(&self) -> RbdResult<String> {
        let handle = self.handle()?;
        retry_sized(64, 65536, |size| {
            let mut buf = vec![0u8; size];
            let mut len: size_t = size;
            let ret = unsafe { rbd_get_name(handle, buf.as_mut_ptr() as *mut c_char, &mut len) };
            resize_on_range(check(ret).map(|_| buf_to_string(&buf)), len)
        })
    }

    pub fn get_create_timestamp(&self) -> RbdResult<Timespec> {
        let handle = self.handle()?;
        let mut ts = zeroed_timespec();
        check(unsafe { rbd_get_create_timestamp(handle, &mut ts) })?;
        Ok(ts.into())
    }

    pub fn get_access_timestamp(&self) -> RbdResult<Timespec> {
        let handle = self.handle()?;
        let mut ts = zeroed_timespec();
        check(unsafe { rbd_get_access_timestamp(handle, &mut ts) })?;
        Ok(ts.into())
    }

    pub fn get_modify_timestamp(&self) -> RbdResult<Timespec> {
        let handle = self.handle()?;
        let mut ts = zeroed_timespec();
        check(unsafe { rbd_get_modify_timestamp(handle, &mut ts) })?;
        Ok(ts.into())
    }

    /// Copy this open image to a new image `dest_name`.
    pub fn copy(&self, dest_ioctx: &dyn IoContext, dest_name: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        if dest_name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_dest = to_cstring(dest_name)?;
        trace!("copying image {} to {}", self.name, dest_name);
        check(unsafe { rbd_copy(handle, ioctx_of(dest_ioctx), c_dest.as_ptr()) })
    }

    pub fn copy_with_options(&self, dest_ioctx: &dyn IoContext, dest_name: &str, options: &ImageOptions) -> RbdResult<()> {
        let handle = self.handle()?;
        if dest_name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_dest = to_cstring(dest_name)?;
        trace!("copying image {} to {} with options", self.name, dest_name);
        check(unsafe { rbd_copy3(handle, ioctx_of(dest_ioctx), c_dest.as_ptr(), options.as_ptr()) })
    }

    /// Copy into another image that is already open.
    pub fn copy_to(&self, dest: &Image) -> RbdResult<()> {
        let handle = self.handle()?;
        let dest_handle = dest.handle()?;
        trace!("copying image {} into {}", self.name, dest.name);
        check(unsafe { rbd_copy2(handle, dest_handle) })
    }

    /// Like `copy_with_options` but snapshots come along too.
    pub fn deep_copy(&self, dest_ioctx: &dyn IoContext, dest_name: &str, options: &ImageOptions) -> RbdResult<()> {
        let handle = self.handle()?;
        if dest_name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_dest = to_cstring(dest_name)?;
        trace!("deep copying image {} to {}", self.name, dest_name);
        check(unsafe { rbd_deep_copy(handle, ioctx_of(dest_ioctx), c_dest.as_ptr(), options.as_ptr()) })
    }

    /// Copy all shared blocks from the parent so the clone stands alone.
    pub fn flatten(&self) -> RbdResult<()> {
        let handle = self.handle()?;
        trace!("flattening image {}", self.name);
        check(unsafe { rbd_flatten(handle) })
    }

    pub fn invalidate_cache(&self) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_invalidate_cache(handle) })
    }

    /// Read at the cursor and advance it. The flag is true when fewer bytes
    /// than requested were available.
    pub fn read(&mut self, buf: &mut [u8]) -> RbdResult<(usize, bool)> {
        let handle = self.handle()?;
        if buf.is_empty() {
            return Ok((0, false));
        }
        let ret = unsafe { rbd_read(handle, self.offset as u64, buf.len(), buf.as_mut_ptr() as *mut c_char) };
        let n = check_if_negative(ret as i64)? as usize;
        self.offset += n as i64;
        Ok((n, n < buf.len()))
    }

    /// Write at the cursor and advance it. A short write is reported as
    /// `PermissionDenied`.
    pub fn write(&mut self, buf: &[u8]) -> RbdResult<usize> {
        let handle = self.handle()?;
        let ret = unsafe { rbd_write(handle, self.offset as u64, buf.len(), buf.as_ptr() as *const c_char) };
        let n = check_if_negative(ret as i64)? as usize;
        self.offset += n as i64;
        if n != buf.len() {
            return Err(RbdError::PermissionDenied);
        }
        Ok(n)
    }

    /// Move the cursor. `End` is relative to the current image size.
    pub fn seek(&mut self, pos: io::SeekFrom) -> RbdResult<u64> {
        let handle = self.handle()?;
        let next = match pos {
            io::SeekFrom::Start(n) => i64::try_from(n).ok(),
            io::SeekFrom::Current(n) => self.offset.checked_add(n),
            io::SeekFrom::End(n) => {
                let mut size: u64 = 0;
                check(unsafe { rbd_get_size(handle, &mut size) })?;
                i64::try_from(size).ok().and_then(|s| s.checked_add(n))
            }
        };
        let next = match next {
            Some(next) if next >= 0 => next,
            _ => return Err(RbdError::InvalidArgument),
        };
        self.offset = next;
        Ok(next as u64)
    }

    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> RbdResult<usize> {
        let handle = self.handle()?;
        if buf.is_empty() {
            return Ok(0);
        }
        let ret = unsafe { rbd_read(handle, offset, buf.len(), buf.as_mut_ptr() as *mut c_char) };
        Ok(check_if_negative(ret as i64)? as usize)
    }

    pub fn write_at(&self, buf: &[u8], offset: u64) -> RbdResult<usize> {
        let handle = self.handle()?;
        let ret = unsafe { rbd_write(handle, offset, buf.len(), buf.as_ptr() as *const c_char) };
        let n = check_if_negative(ret as i64)? as usize;
        if n != buf.len() {
            return Err(RbdError::PermissionDenied);
        }
        Ok(n)
    }

    /// Fill `length` bytes from `offset` with copies of `pattern`. `length`
    /// has to be a multiple of the pattern length.
    pub fn write_same(&self, offset: u64, length: u64, pattern: &[u8], flags: OpFlags) -> RbdResult<u64> {
        let handle = self.handle()?;
        if pattern.is_empty() || length % pattern.len() as u64 != 0 {
            return Err(RbdError::InvalidArgument);
        }
        let ret = unsafe {
            rbd_writesame(
                handle,
                offset,
                length as size_t,
                pattern.as_ptr() as *const c_char,
                pattern.len(),
                flags.bits(),
            )
        };
        Ok(check_if_negative(ret as i64)? as u64)
    }

    /// Deallocate a range. It reads back as zeros afterwards.
    pub fn discard(&self, offset: u64, length: u64) -> RbdResult<()> {
        let handle = self.handle()?;
        check_if_negative(unsafe { rbd_discard(handle, offset, length) })?;
        Ok(())
    }

    pub fn flush(&self) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_flush(handle) })
    }

    /// The parent of a clone, or `NotFound` if the image has none.
    pub fn get_parent(&self) -> RbdResult<ParentInfo> {
        let handle = self.handle()?;
        let mut parent = rbd_linked_image_spec_t::default();
        let mut snap = rbd_snap_spec_t::default();
        check(unsafe { rbd_get_parent(handle, &mut parent, &mut snap) })?;
        let specs = scopeguard::guard((parent, snap), |(mut parent, mut snap)| unsafe {
            rbd_linked_image_spec_cleanup(&mut parent);
            rbd_snap_spec_cleanup(&mut snap);
        });
        let (ref parent, ref snap) = *specs;
        Ok(ParentInfo {
            pool_id: parent.pool_id,
            pool_name: c_string(parent.pool_name),
            pool_namespace: c_string(parent.pool_namespace),
            image_name: c_string(parent.image_name),
            image_id: c_string(parent.image_id),
            trash: parent.trash,
            snap_id: snap.id,
            snap_name: c_string(snap.name),
        })
    }

    /// Clones of this image's snapshots, as parallel pool and image name
    /// lists.
    pub fn list_children(&self) -> RbdResult<(Vec<String>, Vec<String>)> {
        let handle = self.handle()?;
        retry_sized(16, 4096, |size| {
            let mut count: size_t = size;
            let mut children = vec![rbd_linked_image_spec_t::default(); size];
            let ret = unsafe { rbd_list_children3(handle, children.as_mut_ptr(), &mut count) };
            let result = check(ret).map(|_| {
                let pools = children[..count].iter().map(|c| c_string(c.pool_name)).collect();
                let images = children[..count].iter().map(|c| c_string(c.image_name)).collect();
                unsafe {
                    rbd_linked_image_spec_list_cleanup(children.as_mut_ptr(), count);
                }
                (pools, images)
            });
            resize_on_range(result, count)
        })
    }
}

/// Remove the image `name` from the pool.
pub fn remove_image(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    if name.is_empty() {
        return Err(RbdError::NoName);
    }
    remove_image_raw(ioctx_of(ioctx), name)
}

fn remove_image_raw(io: rados_ioctx_t, name: &str) -> RbdResult<()> {
    let c_name = to_cstring(name)?;
    trace!("removing image {}", name);
    check(unsafe { rbd_remove(io, c_name.as_ptr()) })
}

/// A closed reference to `name`.
pub fn get_image<'a>(ioctx: &'a dyn IoContext, name: &str) -> Image<'a> {
    Image::new(Some(ioctx), name)
}

/// All images in the pool, by id and name.
pub fn list_images(ioctx: &dyn IoContext) -> RbdResult<Vec<ImageSpec>> {
    let io = ioctx_of(ioctx);
    retry_sized(1024, 262144, |size| {
        let mut count: size_t = size;
        let mut specs = vec![rbd_image_spec_t::default(); size];
        let ret = unsafe { rbd_list2(io, specs.as_mut_ptr(), &mut count) };
        let result = check(ret).map(|_| {
            let images = specs[..count]
                .iter()
                .map(|s| ImageSpec {
                    id: c_string(s.id),
                    name: c_string(s.name),
                })
                .collect();
            unsafe {
                rbd_image_spec_list_cleanup(specs.as_mut_ptr(), count);
            }
            images
        });
        resize_on_range(result, count)
    })
}

pub fn get_image_names(ioctx: &dyn IoContext) -> RbdResult<Vec<String>> {
    Ok(list_images(ioctx)?.into_iter().map(|spec| spec.name).collect())
}

impl Drop for Image<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.image.take() {
            warn!("image {} dropped while open, closing it", self.name);
            let ret = unsafe { rbd_close(handle) };
            if ret != 0 {
                warn!("closing image {} failed: {}", self.name, RbdError::from_code(ret));
            }
        }
    }
}

impl fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Image")
            .field("name", &self.name)
            .field("has_ioctx", &self.ioctx.is_some())
            .field("open", &self.image.is_some())
            .field("offset", &self.offset)
            .finish()
    }
}

impl io::Read for Image<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Image::read(self, buf)?.0)
    }
}

impl io::Write for Image<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Image::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(Image::flush(self)?)
    }
}

impl io::Seek for Image<'_> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        Ok(Image::seek(self, pos)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct FakeIoCtx;

    impl IoContext for FakeIoCtx {
        fn ioctx_ptr(&self) -> rados_ioctx_t {
            // never dereferenced: every test fails validation first
            8 as rados_ioctx_t
        }
    }

    pub(crate) static FAKE: FakeIoCtx = FakeIoCtx;

    pub(crate) fn fake(with_ioctx: bool) -> Option<&'static dyn IoContext> {
        if with_ioctx {
            Some(&FAKE)
        } else {
            None
        }
    }

    /// An image that claims to be open. The fake handle is dropped again
    /// without reaching librbd.
    pub(crate) fn with_fake_open<F: FnOnce(&mut Image)>(name: &str, ioctx: bool, f: F) {
        let mut image = Image::new(fake(ioctx), name);
        image.image = Some(16 as rbd_image_t);
        f(&mut image);
        image.image = None;
    }

    fn expect(res: RbdResult<()>, want: Option<&str>) {
        match (res, want) {
            (Ok(()), None) => {}
            (Err(e), Some(w)) => assert_eq!(format!("{:?}", e), w),
            (got, want) => panic!("got {:?}, want {:?}", got, want),
        }
    }

    #[test]
    fn validation_order() {
        let all = Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT | Validate::IS_OPEN;
        let closed_all = Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT | Validate::IS_NOT_OPEN;
        for &(name, ioctx) in &[("", false), ("", true), ("img", false), ("img", true)] {
            let image = Image::new(fake(ioctx), name);
            let want = if name.is_empty() {
                Some("NoName")
            } else if !ioctx {
                Some("NoIOContext")
            } else {
                Some("ImageNotOpen")
            };
            expect(image.validate(all), want);
            let want_closed = if name.is_empty() {
                Some("NoName")
            } else if !ioctx {
                Some("NoIOContext")
            } else {
                None
            };
            expect(image.validate(closed_all), want_closed);

            with_fake_open(name, ioctx, |image| {
                let want = if name.is_empty() {
                    Some("NoName")
                } else if !ioctx {
                    Some("NoIOContext")
                } else {
                    None
                };
                expect(image.validate(all), want);
                let want_closed = if name.is_empty() {
                    Some("NoName")
                } else if !ioctx {
                    Some("NoIOContext")
                } else {
                    Some("ImageIsOpen")
                };
                expect(image.validate(closed_all), want_closed);
            });
        }
    }

    #[test]
    fn remove_without_name_or_ioctx_reports_name_first() {
        let image = Image::new(None, "");
        assert!(matches!(image.remove(), Err(RbdError::NoName)));
    }

    #[test]
    fn closed_image_rejects_data_path() {
        let mut image = Image::new(fake(true), "img");
        let mut buf = [0u8; 8];
        assert!(matches!(image.read(&mut buf), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.write(&buf), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.read_at(&mut buf, 0), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.seek(io::SeekFrom::Start(3)), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.stat(), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.close(), Err(RbdError::ImageNotOpen)));
    }

    #[test]
    fn seek_rejects_negative_position() {
        with_fake_open("img", true, |image| {
            assert_eq!(image.seek(io::SeekFrom::Start(10)).unwrap(), 10);
            assert_eq!(image.seek(io::SeekFrom::Current(-4)).unwrap(), 6);
            assert!(matches!(image.seek(io::SeekFrom::Current(-7)), Err(RbdError::InvalidArgument)));
            assert_eq!(image.offset, 6);
            assert!(matches!(image.seek(io::SeekFrom::Current(i64::MAX)), Err(RbdError::InvalidArgument)));
            assert!(matches!(image.seek(io::SeekFrom::Start(u64::MAX)), Err(RbdError::InvalidArgument)));
            assert_eq!(image.offset, 6);
        });
    }

    #[test]
    fn write_same_checks_pattern_before_librbd() {
        with_fake_open("img", true, |image| {
            assert!(matches!(
                image.write_same(0, 10, b"abc", OpFlags::empty()),
                Err(RbdError::InvalidArgument)
            ));
            assert!(matches!(
                image.write_same(0, 10, b"", OpFlags::empty()),
                Err(RbdError::InvalidArgument)
            ));
        });
    }

    #[test]
    fn create_needs_name() {
        assert!(matches!(Image::create(&FAKE, "", 1 << 20, 22), Err(RbdError::NoName)));
        assert!(matches!(remove_image(&FAKE, ""), Err(RbdError::NoName)));
    }

    #[test]
    fn open_of_unnamed_reference_fails_first_on_name() {
        let mut image = Image::new(None, "");
        assert!(matches!(image.reopen(None, false), Err(RbdError::NoName)));
    }
}
