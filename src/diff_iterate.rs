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

//! Walking the extents that changed between a snapshot and the image.

use std::sync::Arc;

use libc::{c_int, c_void, size_t, ECANCELED};

use crate::callbacks::{Callback, Callbacks};
use crate::error::{check, RbdResult};
use crate::helpers::OptionalCString;
use crate::image::Image;
use crate::rbd::*;

type DiffFn = dyn FnMut(u64, u64, bool) -> i32 + Send + 'static;

static DIFF_ITERATE_CALLBACKS: Callbacks<Arc<Callback<DiffFn>>> = Callbacks::new();

extern "C" fn diff_iterate_extent(offset: u64, length: size_t, exists: c_int, arg: *mut c_void) -> c_int {
    let cb = DIFF_ITERATE_CALLBACKS.lookup(arg as usize);
    cb.invoke(-ECANCELED, |f| f(offset, length as u64, exists != 0))
}

/// Whether extents of the parent image are reported too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffIncludeParent {
    Exclude,
    Include,
}

/// With `Enable`, whole objects are reported instead of exact extents,
/// which is much faster with the fast-diff feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffWholeObject {
    Disable,
    Enable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffIterateConfig {
    /// Compare against this snapshot, `None` reports every allocated extent.
    pub snap_name: Option<String>,
    pub offset: u64,
    pub length: u64,
    pub include_parent: DiffIncludeParent,
    pub whole_object: DiffWholeObject,
}

impl DiffIterateConfig {
    /// `length` bytes from the start of the image, no snapshot, exact
    /// extents, parent excluded.
    pub fn new(length: u64) -> DiffIterateConfig {
        DiffIterateConfig {
            snap_name: None,
            offset: 0,
            length,
            include_parent: DiffIncludeParent::Exclude,
            whole_object: DiffWholeObject::Disable,
        }
    }
}

impl Image<'_> {
    /// Call `callback(offset, length, exists)` for each changed extent.
    /// `exists` is false for discarded ranges. A non-zero return stops the
    /// walk and comes back as the error code.
    pub fn diff_iterate<F>(&self, config: &DiffIterateConfig, callback: F) -> RbdResult<()>
    where
        F: FnMut(u64, u64, bool) -> i32 + Send + 'static,
    {
        let handle = self.handle()?;
        let snap = OptionalCString::new(config.snap_name.as_ref().map(String::as_str))?;
        let include_parent = (config.include_parent == DiffIncludeParent::Include) as u8;
        let whole_object = (config.whole_object == DiffWholeObject::Enable) as u8;
        trace!(
            "diff iterate on {} from {:?}, {}+{}",
            self.name(),
            config.snap_name,
            config.offset,
            config.length
        );
        let cb = Callback::new(Box::new(callback) as Box<DiffFn>);
        let ret = {
            let guard = DIFF_ITERATE_CALLBACKS.register(cb.clone());
            unsafe {
                rbd_diff_iterate2(
                    handle,
                    snap.as_ptr(),
                    config.offset,
                    config.length,
                    include_parent,
                    whole_object,
                    Some(diff_iterate_extent),
                    guard.as_arg(),
                )
            }
        };
        cb.resume_panic();
        check(ret)
    }
}
