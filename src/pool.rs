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

//! Pool setup and usage statistics.

use std::collections::BTreeMap;
use std::fmt;
use std::ptr;

use libc::c_int;

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, check_if_negative, RbdResult};
use crate::rbd::*;

/// The counters `pool_stats` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoolStatOption {
    Images,
    ImageProvisionedBytes,
    ImageMaxProvisionedBytes,
    ImageSnapshots,
    TrashImages,
    TrashProvisionedBytes,
    TrashMaxProvisionedBytes,
    TrashSnapshots,
}

impl PoolStatOption {
    pub const ALL: [PoolStatOption; 8] = [
        PoolStatOption::Images,
        PoolStatOption::ImageProvisionedBytes,
        PoolStatOption::ImageMaxProvisionedBytes,
        PoolStatOption::ImageSnapshots,
        PoolStatOption::TrashImages,
        PoolStatOption::TrashProvisionedBytes,
        PoolStatOption::TrashMaxProvisionedBytes,
        PoolStatOption::TrashSnapshots,
    ];

    pub fn code(self) -> c_int {
        match self {
            PoolStatOption::Images => RBD_POOL_STAT_OPTION_IMAGES,
            PoolStatOption::ImageProvisionedBytes => RBD_POOL_STAT_OPTION_IMAGE_PROVISIONED_BYTES,
            PoolStatOption::ImageMaxProvisionedBytes => RBD_POOL_STAT_OPTION_IMAGE_MAX_PROVISIONED_BYTES,
            PoolStatOption::ImageSnapshots => RBD_POOL_STAT_OPTION_IMAGE_SNAPSHOTS,
            PoolStatOption::TrashImages => RBD_POOL_STAT_OPTION_TRASH_IMAGES,
            PoolStatOption::TrashProvisionedBytes => RBD_POOL_STAT_OPTION_TRASH_PROVISIONED_BYTES,
            PoolStatOption::TrashMaxProvisionedBytes => RBD_POOL_STAT_OPTION_TRASH_MAX_PROVISIONED_BYTES,
            PoolStatOption::TrashSnapshots => RBD_POOL_STAT_OPTION_TRASH_SNAPSHOTS,
        }
    }
}

impl fmt::Display for PoolStatOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            PoolStatOption::Images => "images",
            PoolStatOption::ImageProvisionedBytes => "image_provisioned_bytes",
            PoolStatOption::ImageMaxProvisionedBytes => "image_max_provisioned_bytes",
            PoolStatOption::ImageSnapshots => "image_snapshots",
            PoolStatOption::TrashImages => "trash_images",
            PoolStatOption::TrashProvisionedBytes => "trash_provisioned_bytes",
            PoolStatOption::TrashMaxProvisionedBytes => "trash_max_provisioned_bytes",
            PoolStatOption::TrashSnapshots => "trash_snapshots",
        })
    }
}

/// Owns an `rbd_pool_stats_t`.
struct PoolStats {
    stats: rbd_pool_stats_t,
}

impl PoolStats {
    fn new() -> PoolStats {
        let mut stats: rbd_pool_stats_t = ptr::null_mut();
        unsafe {
            rbd_pool_stats_create(&mut stats);
        }
        PoolStats { stats }
    }
}

impl Drop for PoolStats {
    fn drop(&mut self) {
        unsafe {
            rbd_pool_stats_destroy(self.stats);
        }
    }
}

/// Prepare a pool for rbd use. `force` initialises even a pool that is
/// tagged for another application.
pub fn pool_init(ioctx: &dyn IoContext, force: bool) -> RbdResult<()> {
    check(unsafe { rbd_pool_init(ioctx_of(ioctx), force) })
}

/// Every counter of `PoolStatOption` for the pool.
pub fn pool_stats(ioctx: &dyn IoContext) -> RbdResult<BTreeMap<PoolStatOption, u64>> {
    let io = ioctx_of(ioctx);
    let stats = PoolStats::new();
    // librbd writes straight into these, so they must not move until the
    // stats call has returned
    let mut values = Box::new([0u64; 8]);
    for (option, value) in PoolStatOption::ALL.iter().zip(values.iter_mut()) {
        check(unsafe { rbd_pool_stats_option_add_uint64(stats.stats, option.code(), value) })?;
    }
    check_if_negative(unsafe { rbd_pool_stats_get(io, stats.stats) })?;
    Ok(PoolStatOption::ALL.iter().cloned().zip(values.iter().cloned()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_codes_follow_librbd() {
        for (i, option) in PoolStatOption::ALL.iter().enumerate() {
            assert_eq!(option.code(), i as c_int);
        }
        assert_eq!(PoolStatOption::TrashSnapshots.to_string(), "trash_snapshots");
    }
}
