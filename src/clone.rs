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

//! Copy-on-write clones of snapshots.

use libc::c_int;

use crate::ceph::{ioctx_of, IoContext};
use crate::dlsym::LazySymbol;
use crate::error::{check, RbdError, RbdResult};
use crate::features::ImageFeatures;
use crate::helpers::to_cstring;
use crate::image::{Image, Validate};
use crate::options::ImageOptions;
use crate::rbd::*;

// Only in librbd from the squid release on.
static RBD_CLONE4: LazySymbol = LazySymbol::new("rbd_clone4");

fn check_names(parent_name: &str, child_name: &str) -> RbdResult<()> {
    if parent_name.is_empty() || child_name.is_empty() {
        return Err(RbdError::NoName);
    }
    Ok(())
}

impl<'a> Image<'a> {
    /// Clone the snapshot `snap_name` of this image into `child_name`.
    #[allow(clippy::should_implement_trait)]
    pub fn clone<'c>(
        &self,
        snap_name: &str,
        child_ioctx: &'c dyn IoContext,
        child_name: &str,
        features: ImageFeatures,
        order: i32,
    ) -> RbdResult<Image<'c>> {
        self.validate(Validate::NEEDS_NAME | Validate::NEEDS_IOCONTEXT)?;
        if snap_name.is_empty() {
            return Err(RbdError::SnapshotNoName);
        }
        if child_name.is_empty() {
            return Err(RbdError::NoName);
        }
        let c_parent = to_cstring(&self.name)?;
        let c_snap = to_cstring(snap_name)?;
        let c_child = to_cstring(child_name)?;
        let mut c_order: c_int = order;
        trace!("cloning {}@{} to {}", self.name, snap_name, child_name);
        check(unsafe {
            rbd_clone(
                self.raw_ioctx()?,
                c_parent.as_ptr(),
                c_snap.as_ptr(),
                ioctx_of(child_ioctx),
                c_child.as_ptr(),
                features.bits(),
                &mut c_order,
            )
        })?;
        Ok(Image::new(Some(child_ioctx), child_name))
    }
}

/// Clone `parent_name@parent_snap` into `child_name`, with the child's
/// layout taken from `options`.
pub fn clone_image(
    parent_ioctx: &dyn IoContext,
    parent_name: &str,
    parent_snap: &str,
    child_ioctx: &dyn IoContext,
    child_name: &str,
    options: &ImageOptions,
) -> RbdResult<()> {
    check_names(parent_name, child_name)?;
    if parent_snap.is_empty() {
        return Err(RbdError::SnapshotNoName);
    }
    let c_parent = to_cstring(parent_name)?;
    let c_snap = to_cstring(parent_snap)?;
    let c_child = to_cstring(child_name)?;
    trace!("cloning {}@{} to {}", parent_name, parent_snap, child_name);
    check(unsafe {
        rbd_clone3(
            ioctx_of(parent_ioctx),
            c_parent.as_ptr(),
            c_snap.as_ptr(),
            ioctx_of(child_ioctx),
            c_child.as_ptr(),
            options.as_ptr(),
        )
    })
}

/// Like `clone_image` but the parent snapshot is given by id, which also
/// reaches snapshots outside the user namespace. Returns `NotImplemented`
/// when the running librbd is too old.
pub fn clone_image_by_id(
    parent_ioctx: &dyn IoContext,
    parent_name: &str,
    parent_snap_id: u64,
    child_ioctx: &dyn IoContext,
    child_name: &str,
    options: &ImageOptions,
) -> RbdResult<()> {
    check_names(parent_name, child_name)?;
    let clone4 = resolve_fn!(RBD_CLONE4, rbd_clone4_fn);
    let c_parent = to_cstring(parent_name)?;
    let c_child = to_cstring(child_name)?;
    trace!("cloning {}@{} to {}", parent_name, parent_snap_id, child_name);
    check(unsafe {
        clone4(
            ioctx_of(parent_ioctx),
            c_parent.as_ptr(),
            parent_snap_id,
            ioctx_of(child_ioctx),
            c_child.as_ptr(),
            options.as_ptr(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlsym::lookup_symbol;
    use crate::image::tests::{fake, FAKE};

    #[test]
    fn clone_checks_names_first() {
        let parent = Image::new(fake(true), "parent");
        assert!(matches!(
            parent.clone("", &FAKE, "child", ImageFeatures::LAYERING, 22),
            Err(RbdError::SnapshotNoName)
        ));
        assert!(matches!(
            parent.clone("s", &FAKE, "", ImageFeatures::LAYERING, 22),
            Err(RbdError::NoName)
        ));
        let unnamed = Image::new(fake(true), "");
        assert!(matches!(
            unnamed.clone("s", &FAKE, "child", ImageFeatures::LAYERING, 22),
            Err(RbdError::NoName)
        ));
    }

    #[test]
    fn clone_by_id_probes_once() {
        // With a librbd that has the call the fake io-context would reach it.
        if lookup_symbol("rbd_clone4").is_ok() {
            return;
        }
        let opts = ImageOptions::new();
        for _ in 0..2 {
            match clone_image_by_id(&FAKE, "parent", 4, &FAKE, "child", &opts) {
                Err(RbdError::NotImplemented(Some(e))) => assert_eq!(e.symbol, "rbd_clone4"),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(RBD_CLONE4.attempts(), 1);
    }
}
