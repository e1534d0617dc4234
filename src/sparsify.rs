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

//! Releasing zeroed ranges of an image back to the cluster.

use libc::{c_int, c_void};

use crate::callbacks::{dispatch_progress, with_progress, ProgressCallbacks};
use crate::error::{check, RbdError, RbdResult};
use crate::image::Image;
use crate::rbd::*;

/// Smallest run of zeros librbd will deallocate.
pub const MIN_SPARSE_SIZE: usize = 4096;

static SPARSIFY_CALLBACKS: ProgressCallbacks = ProgressCallbacks::new();

extern "C" fn sparsify_progress(offset: u64, total: u64, arg: *mut c_void) -> c_int {
    dispatch_progress(&SPARSIFY_CALLBACKS, offset, total, arg)
}

fn check_sparse_size(sparse_size: usize) -> RbdResult<()> {
    if sparse_size < MIN_SPARSE_SIZE || !sparse_size.is_power_of_two() {
        return Err(RbdError::InvalidArgument);
    }
    Ok(())
}

fn check_sparse_fits(sparse_size: usize, image_size: u64) -> RbdResult<()> {
    if sparse_size as u64 > image_size {
        return Err(RbdError::InvalidArgument);
    }
    Ok(())
}

impl Image<'_> {
    /// Deallocate zeroed runs of at least `sparse_size` bytes, which must be
    /// a power of two between `MIN_SPARSE_SIZE` and the image size.
    pub fn sparsify(&self, sparse_size: usize) -> RbdResult<()> {
        let handle = self.handle()?;
        check_sparse_size(sparse_size)?;
        check_sparse_fits(sparse_size, self.get_size()?)?;
        trace!("sparsifying {} with {} byte runs", self.name(), sparse_size);
        check(unsafe { rbd_sparsify(handle, sparse_size) })
    }

    /// `sparsify` reporting `(done, total)` to `progress`. A non-zero return
    /// from `progress` aborts.
    pub fn sparsify_with_progress<F>(&self, sparse_size: usize, progress: F) -> RbdResult<()>
    where
        F: FnMut(u64, u64) -> i32 + Send + 'static,
    {
        let handle = self.handle()?;
        check_sparse_size(sparse_size)?;
        check_sparse_fits(sparse_size, self.get_size()?)?;
        trace!("sparsifying {} with {} byte runs", self.name(), sparse_size);
        let ret = with_progress(&SPARSIFY_CALLBACKS, progress, |arg| unsafe {
            rbd_sparsify_with_progress(handle, sparse_size, Some(sparsify_progress), arg)
        });
        check(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::{fake, with_fake_open};

    #[test]
    fn sparse_size_bounds() {
        assert!(check_sparse_size(4096).is_ok());
        assert!(check_sparse_size(1 << 20).is_ok());
        assert!(check_sparse_size(2048).is_err());
        assert!(check_sparse_size(6144).is_err());
        assert!(check_sparse_size(0).is_err());
    }

    #[test]
    fn sparse_size_within_image() {
        assert!(check_sparse_fits(4096, 1 << 22).is_ok());
        assert!(check_sparse_fits(1 << 22, 1 << 22).is_ok());
        assert!(matches!(check_sparse_fits(1 << 23, 1 << 22), Err(RbdError::InvalidArgument)));
        assert!(matches!(check_sparse_fits(4096, 0), Err(RbdError::InvalidArgument)));
    }

    #[test]
    fn bad_size_rejected_before_librbd() {
        with_fake_open("img", true, |image| {
            assert!(matches!(image.sparsify(1000), Err(RbdError::InvalidArgument)));
            assert!(matches!(
                image.sparsify_with_progress(5000, |_, _| 0),
                Err(RbdError::InvalidArgument)
            ));
        });
        assert!(SPARSIFY_CALLBACKS.is_empty());
    }

    #[test]
    fn open_checked_first() {
        let image = Image::new(fake(true), "img");
        assert!(matches!(image.sparsify(1000), Err(RbdError::ImageNotOpen)));
    }
}
