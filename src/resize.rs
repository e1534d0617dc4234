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

use libc::{c_int, c_void};

use crate::callbacks::{dispatch_progress, with_progress, ProgressCallbacks};
use crate::error::{check, RbdResult};
use crate::image::Image;
use crate::rbd::*;

static RESIZE_CALLBACKS: ProgressCallbacks = ProgressCallbacks::new();

extern "C" fn resize_progress(offset: u64, total: u64, arg: *mut c_void) -> c_int {
    dispatch_progress(&RESIZE_CALLBACKS, offset, total, arg)
}

impl Image<'_> {
    /// Resize, reporting `(done, total)` to `progress`. Shrinking fails
    /// unless `allow_shrink` is set. A non-zero return from `progress`
    /// aborts the resize.
    pub fn resize_with_progress<F>(&self, size: u64, allow_shrink: bool, progress: F) -> RbdResult<()>
    where
        F: FnMut(u64, u64) -> i32 + Send + 'static,
    {
        let handle = self.handle()?;
        trace!("resizing {} to {} bytes", self.name(), size);
        let ret = with_progress(&RESIZE_CALLBACKS, progress, |arg| unsafe {
            rbd_resize2(handle, size, allow_shrink, Some(resize_progress), arg)
        });
        check(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RbdError;
    use crate::image::tests::fake;

    #[test]
    fn closed_image_registers_nothing() {
        let image = Image::new(fake(true), "img");
        let res = image.resize_with_progress(1 << 20, false, |_, _| 0);
        assert!(matches!(res, Err(RbdError::ImageNotOpen)));
        assert!(RESIZE_CALLBACKS.is_empty());
    }
}
