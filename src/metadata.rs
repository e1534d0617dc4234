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

//! Key/value metadata, per image and per pool.

use std::collections::BTreeMap;

use libc::{c_char, size_t, ERANGE};

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, RbdError, RbdResult};
use crate::helpers::{buf_to_string, split_sparse_buffer, to_cstring};
use crate::image::Image;
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized, Hint};

/// Pair up the two NUL separated lists `rbd_metadata_list` fills in.
pub(crate) fn zip_metadata(keys: &[u8], values: &[u8]) -> RbdResult<BTreeMap<String, String>> {
    let keys = split_sparse_buffer(keys);
    // values may legitimately be empty strings, so they are split by hand
    let mut vals: Vec<String> = values
        .split(|b| *b == 0)
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .collect();
    // the buffer ends in a NUL, which leaves one extra empty piece
    vals.truncate(keys.len());
    if vals.len() != keys.len() {
        return Err(RbdError::new(format!(
            "metadata list returned {} keys but {} values",
            keys.len(),
            vals.len()
        )));
    }
    Ok(keys.into_iter().zip(vals).collect())
}

impl Image<'_> {
    pub fn get_metadata(&self, key: &str) -> RbdResult<String> {
        let handle = self.handle()?;
        let c_key = to_cstring(key)?;
        retry_sized(4096, 262144, |size| {
            let mut buf = vec![0u8; size];
            let mut len: size_t = size;
            let ret = unsafe { rbd_metadata_get(handle, c_key.as_ptr(), buf.as_mut_ptr() as *mut c_char, &mut len) };
            resize_on_range(check(ret).map(|_| buf_to_string(&buf)), len)
        })
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_key = to_cstring(key)?;
        let c_value = to_cstring(value)?;
        check(unsafe { rbd_metadata_set(handle, c_key.as_ptr(), c_value.as_ptr()) })
    }

    pub fn remove_metadata(&self, key: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_key = to_cstring(key)?;
        check(unsafe { rbd_metadata_remove(handle, c_key.as_ptr()) })
    }

    /// Every metadata entry of the image.
    pub fn list_metadata(&self) -> RbdResult<BTreeMap<String, String>> {
        let handle = self.handle()?;
        retry_sized(4096, 262144, |size| {
            let mut keys = vec![0u8; size];
            let mut values = vec![0u8; size];
            let mut keys_len: size_t = size;
            let mut values_len: size_t = size;
            let ret = unsafe {
                rbd_metadata_list(
                    handle,
                    // start from the first key, no limit
                    b"\0".as_ptr() as *const c_char,
                    0,
                    keys.as_mut_ptr() as *mut c_char,
                    &mut keys_len,
                    values.as_mut_ptr() as *mut c_char,
                    &mut values_len,
                )
            };
            if ret == -ERANGE {
                return (Err(RbdError::RangeTooSmall), Hint::Size(keys_len.max(values_len)));
            }
            let result = check(ret).and_then(|_| {
                zip_metadata(&keys[..keys_len.min(size)], &values[..values_len.min(size)])
            });
            (result, Hint::Done)
        })
    }
}

pub fn pool_metadata_get(ioctx: &dyn IoContext, key: &str) -> RbdResult<String> {
    let io = ioctx_of(ioctx);
    let c_key = to_cstring(key)?;
    retry_sized(4096, 262144, |size| {
        let mut buf = vec![0u8; size];
        let mut len: size_t = size;
        let ret = unsafe { rbd_pool_metadata_get(io, c_key.as_ptr(), buf.as_mut_ptr() as *mut c_char, &mut len) };
        resize_on_range(check(ret).map(|_| buf_to_string(&buf)), len)
    })
}

pub fn pool_metadata_set(ioctx: &dyn IoContext, key: &str, value: &str) -> RbdResult<()> {
    let c_key = to_cstring(key)?;
    let c_value = to_cstring(value)?;
    check(unsafe { rbd_pool_metadata_set(ioctx_of(ioctx), c_key.as_ptr(), c_value.as_ptr()) })
}

pub fn pool_metadata_remove(ioctx: &dyn IoContext, key: &str) -> RbdResult<()> {
    let c_key = to_cstring(key)?;
    check(unsafe { rbd_pool_metadata_remove(ioctx_of(ioctx), c_key.as_ptr()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::fake;

    #[test]
    fn zip_pairs_keys_and_values() {
        let map = zip_metadata(b"a\0conf_b\0", b"1\0\0").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "1");
        assert_eq!(map["conf_b"], "");
    }

    #[test]
    fn zip_rejects_mismatch() {
        assert!(zip_metadata(b"a\0b\0", b"1").is_err());
    }

    #[test]
    fn zip_empty() {
        assert!(zip_metadata(b"", b"").unwrap().is_empty());
    }

    #[test]
    fn metadata_needs_open_image() {
        let image = Image::new(fake(true), "img");
        assert!(matches!(image.get_metadata("k"), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.set_metadata("k", "v"), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.list_metadata(), Err(RbdError::ImageNotOpen)));
    }
}
