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

//! Advisory locks (`lock_exclusive`, `lock_shared`) and the managed
//! exclusive lock (`lock_acquire` and friends).

use std::fmt;
use std::ptr;

use libc::{c_char, c_int, size_t, ERANGE};

use crate::error::{check, RbdError, RbdResult};
use crate::helpers::{buf_to_string, c_string, split_buffer, to_cstring};
use crate::image::Image;
use crate::rbd::*;
use crate::retry::{retry_sized, Hint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Exclusive,
    Shared,
}

impl LockMode {
    fn to_raw(self) -> rbd_lock_mode_t {
        match self {
            LockMode::Exclusive => 0,
            LockMode::Shared => 1,
        }
    }

    fn from_raw(v: rbd_lock_mode_t) -> RbdResult<LockMode> {
        match v {
            0 => Ok(LockMode::Exclusive),
            1 => Ok(LockMode::Shared),
            _ => Err(RbdError::new(format!("unknown lock mode {}", v))),
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            LockMode::Exclusive => "exclusive",
            LockMode::Shared => "shared",
        })
    }
}

/// One holder of an advisory lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locker {
    pub client: String,
    pub cookie: String,
    pub addr: String,
}

/// Output of `Image::list_lockers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerList {
    pub exclusive: bool,
    pub tag: String,
    pub lockers: Vec<Locker>,
}

/// A current owner of the managed lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOwner {
    pub mode: LockMode,
    pub owner: String,
}

impl Image<'_> {
    pub fn lock_exclusive(&self, cookie: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_cookie = to_cstring(cookie)?;
        check(unsafe { rbd_lock_exclusive(handle, c_cookie.as_ptr()) })
    }

    pub fn lock_shared(&self, cookie: &str, tag: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_cookie = to_cstring(cookie)?;
        let c_tag = to_cstring(tag)?;
        check(unsafe { rbd_lock_shared(handle, c_cookie.as_ptr(), c_tag.as_ptr()) })
    }

    pub fn unlock(&self, cookie: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_cookie = to_cstring(cookie)?;
        check(unsafe { rbd_unlock(handle, c_cookie.as_ptr()) })
    }

    /// Release a lock held by another client.
    pub fn break_lock(&self, client: &str, cookie: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_client = to_cstring(client)?;
        let c_cookie = to_cstring(cookie)?;
        check(unsafe { rbd_break_lock(handle, c_client.as_ptr(), c_cookie.as_ptr()) })
    }

    pub fn list_lockers(&self) -> RbdResult<LockerList> {
        let handle = self.handle()?;
        // librbd reports every required length on -ERANGE, so the next
        // attempt sizes all four buffers to the largest one.
        retry_sized(1024, 262144, |size| {
            let mut exclusive: c_int = 0;
            let mut tag = vec![0u8; size];
            let mut clients = vec![0u8; size];
            let mut cookies = vec![0u8; size];
            let mut addrs = vec![0u8; size];
            let (mut tag_len, mut clients_len, mut cookies_len, mut addrs_len) = (size, size, size, size);
            let ret = unsafe {
                rbd_list_lockers(
                    handle,
                    &mut exclusive,
                    tag.as_mut_ptr() as *mut c_char,
                    &mut tag_len,
                    clients.as_mut_ptr() as *mut c_char,
                    &mut clients_len,
                    cookies.as_mut_ptr() as *mut c_char,
                    &mut cookies_len,
                    addrs.as_mut_ptr() as *mut c_char,
                    &mut addrs_len,
                )
            };
            if ret == -(ERANGE as isize) {
                let needed = tag_len.max(clients_len).max(cookies_len).max(addrs_len);
                return (Err(RbdError::RangeTooSmall), Hint::Size(needed));
            }
            if ret < 0 {
                return (Err(RbdError::from_code(ret as i32)), Hint::Done);
            }
            let count = ret as usize;
            let clients = split_buffer(&clients[..clients_len.min(size)]);
            let cookies = split_buffer(&cookies[..cookies_len.min(size)]);
            let addrs = split_buffer(&addrs[..addrs_len.min(size)]);
            let lockers = clients
                .into_iter()
                .zip(cookies)
                .zip(addrs)
                .take(count)
                .map(|((client, cookie), addr)| Locker { client, cookie, addr })
                .collect();
            let list = LockerList {
                exclusive: exclusive != 0,
                tag: buf_to_string(&tag),
                lockers,
            };
            (Ok(list), Hint::Done)
        })
    }

    /// Take the managed lock.
    pub fn lock_acquire(&self, mode: LockMode) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_lock_acquire(handle, mode.to_raw()) })
    }

    pub fn lock_release(&self) -> RbdResult<()> {
        let handle = self.handle()?;
        check(unsafe { rbd_lock_release(handle) })
    }

    pub fn lock_break(&self, mode: LockMode, owner: &str) -> RbdResult<()> {
        let handle = self.handle()?;
        let c_owner = to_cstring(owner)?;
        check(unsafe { rbd_lock_break(handle, mode.to_raw(), c_owner.as_ptr()) })
    }

    pub fn lock_get_owners(&self) -> RbdResult<Vec<LockOwner>> {
        let handle = self.handle()?;
        retry_sized(16, 4096, |size| {
            let mut mode: rbd_lock_mode_t = 0;
            let mut count: size_t = size;
            let mut owners: Vec<*mut c_char> = vec![ptr::null_mut(); size];
            let ret = unsafe { rbd_lock_get_owners(handle, &mut mode, owners.as_mut_ptr(), &mut count) };
            if ret == -ERANGE {
                return (Err(RbdError::RangeTooSmall), Hint::Size(count));
            }
            // no owner at all comes back as -ENOENT
            if let Err(e) = check(ret) {
                if e.is_not_found() {
                    return (Ok(Vec::new()), Hint::Done);
                }
                return (Err(e), Hint::Done);
            }
            let names: Vec<String> = owners[..count].iter().map(|p| c_string(*p)).collect();
            unsafe {
                rbd_lock_get_owners_cleanup(owners.as_mut_ptr(), count);
            }
            let result = LockMode::from_raw(mode)
                .map(|mode| names.into_iter().map(|owner| LockOwner { mode, owner }).collect());
            (result, Hint::Done)
        })
    }

    pub fn lock_is_exclusive_owner(&self) -> RbdResult<bool> {
        let handle = self.handle()?;
        let mut owner: c_int = 0;
        check(unsafe { rbd_is_exclusive_lock_owner(handle, &mut owner) })?;
        Ok(owner != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::fake;

    #[test]
    fn lock_mode_codes() {
        assert_eq!(LockMode::Shared.to_raw(), 1);
        assert_eq!(LockMode::from_raw(0).unwrap(), LockMode::Exclusive);
        assert_eq!(LockMode::Exclusive.to_string(), "exclusive");
    }

    #[test]
    fn locks_need_an_open_image() {
        let image = Image::new(fake(true), "img");
        assert!(matches!(image.lock_exclusive("c"), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.list_lockers(), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.lock_get_owners(), Err(RbdError::ImageNotOpen)));
    }
}
