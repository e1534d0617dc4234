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

// Portions from Chris Holcombe
// The MIT License (MIT)
//
// Copyright (c) 2015 Chris Holcombe
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.


//! The slice of librados that librbd needs: a cluster handle and the pool
//! io contexts every rbd call is issued against.

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, size_t};

bitflags! {
    /// Fadvise hints accepted by librbd for data path calls such as
    /// `rbd_writesame`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpFlags: i32 {
        const LIBRADOS_OP_FLAG_EXCL = 1;
        const LIBRADOS_OP_FLAG_FAILOK = 2;
        const LIBRADOS_OP_FLAG_FADVISE_RANDOM = 4;
        const LIBRADOS_OP_FLAG_FADVISE_SEQUENTIAL = 8;
        const LIBRADOS_OP_FLAG_FADVISE_WILLNEED = 16;
        const LIBRADOS_OP_FLAG_FADVISE_DONTNEED = 32;
        const LIBRADOS_OP_FLAG_FADVISE_NOCACHE = 64;
    }
}

pub type rados_t = *mut ::std::os::raw::c_void;
pub type rados_ioctx_t = *mut ::std::os::raw::c_void;

#[cfg(target_os = "linux")]
#[link(name = "rados", kind = "dylib")]
extern "C" {
    pub fn rados_version(major: *mut c_int, minor: *mut c_int, extra: *mut c_int);

    pub fn rados_create(cluster: *mut rados_t, id: *const c_char) -> c_int;

    pub fn rados_connect(cluster: rados_t) -> c_int;

    pub fn rados_shutdown(cluster: rados_t);

    pub fn rados_conf_read_file(cluster: rados_t, path: *const c_char) -> c_int;

    pub fn rados_conf_set(cluster: rados_t, option: *const c_char, value: *const c_char) -> c_int;

    pub fn rados_cluster_fsid(cluster: rados_t, buf: *mut c_char, len: size_t) -> c_int;

    pub fn rados_ioctx_create(cluster: rados_t, pool_name: *const c_char, ioctx: *mut rados_ioctx_t) -> c_int;

    pub fn rados_ioctx_create2(cluster: rados_t, pool_id: i64, ioctx: *mut rados_ioctx_t) -> c_int;

    pub fn rados_ioctx_destroy(io: rados_ioctx_t);

    pub fn rados_ioctx_get_id(io: rados_ioctx_t) -> i64;

    pub fn rados_ioctx_get_pool_name(io: rados_ioctx_t, buf: *mut c_char, maxlen: u32) -> c_int;

    pub fn rados_ioctx_set_namespace(io: rados_ioctx_t, nspace: *const c_char);
}
