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

//! Cluster connections and io-contexts.
//!
//! librbd never opens a pool itself; every pool level call takes a
//! `rados_ioctx_t`. The `IoContext` and `ClusterHandle` traits are the only
//! thing the rest of the crate needs from here, so callers that already own
//! librados handles through another crate can implement them directly.

use std::fmt;
use std::ptr;

use libc::{c_char, c_int, ERANGE};
use uuid::Uuid;

use crate::error::{check, check_if_negative, RbdError, RbdResult};
use crate::helpers::{buf_to_string, to_cstring};
use crate::rados::*;
use crate::retry::{retry_sized, Hint};

/// Anything that can hand out a pool io-context for the duration of a call.
///
/// The pointer must stay valid until the call it was passed to returns.
pub trait IoContext: Send + Sync {
    fn ioctx_ptr(&self) -> rados_ioctx_t;
}

/// Anything that can hand out a connected cluster handle.
pub trait ClusterHandle {
    fn cluster_ptr(&self) -> rados_t;
}

/// Fetch the raw io-context.
///
/// # Panics
///
/// If the provider hands out a null pointer.
pub(crate) fn ioctx_of(ioctx: &dyn IoContext) -> rados_ioctx_t {
    let p = ioctx.ioctx_ptr();
    if p.is_null() {
        panic!("IoContext provided a null rados_ioctx_t");
    }
    p
}

pub(crate) fn cluster_of(cluster: &dyn ClusterHandle) -> rados_t {
    let p = cluster.cluster_ptr();
    if p.is_null() {
        panic!("ClusterHandle provided a null rados_t");
    }
    p
}

/// The version of the librados library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadosVersion {
    pub major: i32,
    pub minor: i32,
    pub extra: i32,
}

/// A connected cluster handle. Shut down on drop.
pub struct Rados {
    cluster: rados_t,
}

unsafe impl Send for Rados {}
unsafe impl Sync for Rados {}

impl Rados {
    /// Connect as `client.<user_id>` using the settings in `config_file`.
    pub fn connect(user_id: &str, config_file: &str) -> RbdResult<Rados> {
        let conf_file = to_cstring(config_file)?;
        let rados = Rados::create(user_id)?;
        check(unsafe { rados_conf_read_file(rados.cluster, conf_file.as_ptr()) })?;
        rados.finish_connect()
    }

    /// Connect as `client.<user_id>` with individually set options, e.g.
    /// `("mon_host", "10.0.0.1")` and `("key", "...")`.
    pub fn connect_with(user_id: &str, options: &[(&str, &str)]) -> RbdResult<Rados> {
        let rados = Rados::create(user_id)?;
        for (key, value) in options {
            let c_key = to_cstring(key)?;
            let c_value = to_cstring(value)?;
            check(unsafe { rados_conf_set(rados.cluster, c_key.as_ptr(), c_value.as_ptr()) })?;
        }
        rados.finish_connect()
    }

    fn create(user_id: &str) -> RbdResult<Rados> {
        let connect_id = to_cstring(user_id)?;
        let mut cluster: rados_t = ptr::null_mut();
        check(unsafe { rados_create(&mut cluster, connect_id.as_ptr()) })?;
        Ok(Rados { cluster })
    }

    fn finish_connect(self) -> RbdResult<Rados> {
        trace!("connecting to cluster");
        check(unsafe { rados_connect(self.cluster) })?;
        debug!("connected to cluster");
        Ok(self)
    }

    /// The cluster fsid.
    pub fn fsid(&self) -> RbdResult<Uuid> {
        let fsid = retry_sized(37, 4096, |size| {
            let mut buf = vec![0u8; size];
            let ret = unsafe { rados_cluster_fsid(self.cluster, buf.as_mut_ptr() as *mut c_char, buf.len()) };
            if ret == -ERANGE {
                return (Err(RbdError::RangeTooSmall), Hint::DoubleSize);
            }
            (check_if_negative(ret).map(|_| buf_to_string(&buf)), Hint::Done)
        })?;
        Ok(Uuid::parse_str(&fsid)?)
    }

    pub fn version() -> RadosVersion {
        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        let mut extra: c_int = 0;
        unsafe {
            rados_version(&mut major, &mut minor, &mut extra);
        }
        RadosVersion { major, minor, extra }
    }
}

impl ClusterHandle for Rados {
    fn cluster_ptr(&self) -> rados_t {
        self.cluster
    }
}

impl Drop for Rados {
    fn drop(&mut self) {
        if !self.cluster.is_null() {
            unsafe {
                rados_shutdown(self.cluster);
            }
            debug!("disconnected from cluster");
        }
    }
}

impl fmt::Debug for Rados {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Rados").field("cluster", &self.cluster).finish()
    }
}

/// An io-context for one pool, optionally scoped to a namespace.
/// Destroyed on drop; it must not outlive the `Rados` it came from.
pub struct IoCtx<'r> {
    ioctx: rados_ioctx_t,
    _cluster: &'r Rados,
}

unsafe impl Send for IoCtx<'_> {}
unsafe impl Sync for IoCtx<'_> {}

impl<'r> IoCtx<'r> {
    pub fn create(rados: &'r Rados, pool_name: &str) -> RbdResult<IoCtx<'r>> {
        let pool = to_cstring(pool_name)?;
        let mut ioctx: rados_ioctx_t = ptr::null_mut();
        check(unsafe { rados_ioctx_create(rados.cluster, pool.as_ptr(), &mut ioctx) })?;
        Ok(IoCtx {
            ioctx,
            _cluster: rados,
        })
    }

    pub fn create_by_id(rados: &'r Rados, pool_id: i64) -> RbdResult<IoCtx<'r>> {
        let mut ioctx: rados_ioctx_t = ptr::null_mut();
        check(unsafe { rados_ioctx_create2(rados.cluster, pool_id, &mut ioctx) })?;
        Ok(IoCtx {
            ioctx,
            _cluster: rados,
        })
    }

    /// Restrict the io-context to `namespace`. An empty name selects the
    /// default namespace.
    pub fn set_namespace(&mut self, namespace: &str) -> RbdResult<()> {
        let ns = to_cstring(namespace)?;
        unsafe {
            rados_ioctx_set_namespace(self.ioctx, ns.as_ptr());
        }
        Ok(())
    }

    pub fn pool_id(&self) -> i64 {
        unsafe { rados_ioctx_get_id(self.ioctx) }
    }

    pub fn pool_name(&self) -> RbdResult<String> {
        retry_sized(128, 65536, |size| {
            let mut buf = vec![0u8; size];
            let ret = unsafe { rados_ioctx_get_pool_name(self.ioctx, buf.as_mut_ptr() as *mut c_char, size as u32) };
            if ret == -ERANGE {
                return (Err(RbdError::RangeTooSmall), Hint::DoubleSize);
            }
            let name = check_if_negative(ret).map(|len| {
                buf.truncate(len as usize);
                buf_to_string(&buf)
            });
            (name, Hint::Done)
        })
    }
}

impl IoContext for IoCtx<'_> {
    fn ioctx_ptr(&self) -> rados_ioctx_t {
        self.ioctx
    }
}

impl Drop for IoCtx<'_> {
    fn drop(&mut self) {
        if !self.ioctx.is_null() {
            unsafe {
                rados_ioctx_destroy(self.ioctx);
            }
        }
    }
}

impl fmt::Debug for IoCtx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("IoCtx").field("ioctx", &self.ioctx).finish()
    }
}
