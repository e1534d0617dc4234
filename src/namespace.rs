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

use libc::{c_char, size_t};

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{split_sparse_buffer, to_cstring};
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized};

fn check_namespace(name: &str) -> RbdResult<()> {
    if name.is_empty() {
        return Err(RbdError::NoNamespaceName);
    }
    Ok(())
}

/// Create an rbd namespace inside the pool of `ioctx`.
pub fn namespace_create(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    check_namespace(name)?;
    let c_name = to_cstring(name)?;
    check(unsafe { rbd_namespace_create(ioctx_of(ioctx), c_name.as_ptr()) })
}

pub fn namespace_remove(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    check_namespace(name)?;
    let c_name = to_cstring(name)?;
    check(unsafe { rbd_namespace_remove(ioctx_of(ioctx), c_name.as_ptr()) })
}

pub fn namespace_exists(ioctx: &dyn IoContext, name: &str) -> RbdResult<bool> {
    check_namespace(name)?;
    let c_name = to_cstring(name)?;
    let mut exists = false;
    check_if_negative(unsafe { rbd_namespace_exists(ioctx_of(ioctx), c_name.as_ptr(), &mut exists) })?;
    Ok(exists)
}

pub fn namespace_list(ioctx: &dyn IoContext) -> RbdResult<Vec<String>> {
    let io = ioctx_of(ioctx);
    retry_sized(4096, 262144, |size| {
        let mut buf = vec![0u8; size];
        let mut len: size_t = size;
        let ret = unsafe { rbd_namespace_list(io, buf.as_mut_ptr() as *mut c_char, &mut len) };
        let result = check_if_negative(ret).map(|_| split_sparse_buffer(&buf[..len.min(size)]));
        resize_on_range(result, len)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::FAKE;

    #[test]
    fn empty_namespace_name() {
        assert!(matches!(namespace_create(&FAKE, ""), Err(RbdError::NoNamespaceName)));
        assert!(matches!(namespace_remove(&FAKE, ""), Err(RbdError::NoNamespaceName)));
        assert!(matches!(namespace_exists(&FAKE, ""), Err(RbdError::NoNamespaceName)));
    }
}
