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

//! Live migration of an image. `migration_prepare` links the destination to
//! the source, `migration_execute` copies the data while both stay usable,
//! and `migration_commit` (or `migration_abort`) finishes it.

use std::fmt;
use std::mem;

use libc::{c_char, c_int};

use crate::ceph::{ioctx_of, IoContext};
use crate::error::{check, RbdError, RbdResult};
use crate::helpers::{c_string, to_cstring};
use crate::options::ImageOptions;
use crate::rados::rados_ioctx_t;
use crate::rbd::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Unknown,
    Error,
    Preparing,
    Prepared,
    Executing,
    Executed,
    Committing,
    Aborting,
}

impl MigrationState {
    fn from_raw(v: rbd_image_migration_state_t) -> RbdResult<MigrationState> {
        match v {
            -1 => Ok(MigrationState::Unknown),
            0 => Ok(MigrationState::Error),
            1 => Ok(MigrationState::Preparing),
            2 => Ok(MigrationState::Prepared),
            3 => Ok(MigrationState::Executing),
            4 => Ok(MigrationState::Executed),
            5 => Ok(MigrationState::Committing),
            6 => Ok(MigrationState::Aborting),
            _ => Err(RbdError::new(format!("unknown migration state {}", v))),
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            MigrationState::Unknown => "unknown",
            MigrationState::Error => "error",
            MigrationState::Preparing => "preparing",
            MigrationState::Prepared => "prepared",
            MigrationState::Executing => "executing",
            MigrationState::Executed => "executed",
            MigrationState::Committing => "committing",
            MigrationState::Aborting => "aborting",
        })
    }
}

/// One end of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSpec {
    pub pool_id: i64,
    pub pool_namespace: String,
    pub image_name: String,
    pub image_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub source: MigrationSpec,
    pub dest: MigrationSpec,
    pub state: MigrationState,
    pub state_description: String,
}

fn image_name(name: &str) -> RbdResult<std::ffi::CString> {
    if name.is_empty() {
        return Err(RbdError::NoName);
    }
    to_cstring(name)
}

/// Start migrating `source_name` in `ioctx` to `dest_name` in `dest_ioctx`.
pub fn migration_prepare(
    ioctx: &dyn IoContext,
    source_name: &str,
    dest_ioctx: &dyn IoContext,
    dest_name: &str,
    options: &ImageOptions,
) -> RbdResult<()> {
    let c_source = image_name(source_name)?;
    let c_dest = image_name(dest_name)?;
    trace!("preparing migration of {} to {}", source_name, dest_name);
    check(unsafe {
        rbd_migration_prepare(
            ioctx_of(ioctx),
            c_source.as_ptr(),
            ioctx_of(dest_ioctx),
            c_dest.as_ptr(),
            options.as_ptr(),
        )
    })
}

/// Start importing from an external source. `source_spec` is the JSON
/// description of the source, e.g. `{"type":"raw","stream":{...}}`.
pub fn migration_prepare_import(
    source_spec: &str,
    dest_ioctx: &dyn IoContext,
    dest_name: &str,
    options: &ImageOptions,
) -> RbdResult<()> {
    let c_spec = to_cstring(source_spec)?;
    let c_dest = image_name(dest_name)?;
    trace!("preparing import into {}", dest_name);
    check(unsafe {
        rbd_migration_prepare_import(c_spec.as_ptr(), ioctx_of(dest_ioctx), c_dest.as_ptr(), options.as_ptr())
    })
}

fn migration_step(
    what: &str,
    ioctx: &dyn IoContext,
    name: &str,
    step: unsafe extern "C" fn(rados_ioctx_t, *const c_char) -> c_int,
) -> RbdResult<()> {
    let c_name = image_name(name)?;
    trace!("migration {} for {}", what, name);
    check(unsafe { step(ioctx_of(ioctx), c_name.as_ptr()) })
}

pub fn migration_execute(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    migration_step("execute", ioctx, name, rbd_migration_execute)
}

pub fn migration_commit(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    migration_step("commit", ioctx, name, rbd_migration_commit)
}

pub fn migration_abort(ioctx: &dyn IoContext, name: &str) -> RbdResult<()> {
    migration_step("abort", ioctx, name, rbd_migration_abort)
}

pub fn migration_status(ioctx: &dyn IoContext, name: &str) -> RbdResult<MigrationStatus> {
    let c_name = image_name(name)?;
    let mut status = rbd_image_migration_status_t::default();
    check(unsafe {
        rbd_migration_status(
            ioctx_of(ioctx),
            c_name.as_ptr(),
            &mut status,
            mem::size_of::<rbd_image_migration_status_t>(),
        )
    })?;
    let s = scopeguard::guard(status, |mut s| unsafe { rbd_migration_status_cleanup(&mut s) });
    Ok(MigrationStatus {
        source: MigrationSpec {
            pool_id: s.source_pool_id,
            pool_namespace: c_string(s.source_pool_namespace),
            image_name: c_string(s.source_image_name),
            image_id: c_string(s.source_image_id),
        },
        dest: MigrationSpec {
            pool_id: s.dest_pool_id,
            pool_namespace: c_string(s.dest_pool_namespace),
            image_name: c_string(s.dest_image_name),
            image_id: c_string(s.dest_image_id),
        },
        state: MigrationState::from_raw(s.state)?,
        state_description: c_string(s.state_description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::FAKE;

    #[test]
    fn states_cover_native_range() {
        assert_eq!(MigrationState::from_raw(-1).unwrap(), MigrationState::Unknown);
        assert_eq!(MigrationState::from_raw(5).unwrap().to_string(), "committing");
        assert!(MigrationState::from_raw(7).is_err());
    }

    #[test]
    fn names_required() {
        let opts = ImageOptions::new();
        assert!(matches!(migration_prepare(&FAKE, "", &FAKE, "dst", &opts), Err(RbdError::NoName)));
        assert!(matches!(migration_prepare_import("{}", &FAKE, "", &opts), Err(RbdError::NoName)));
        assert!(matches!(migration_execute(&FAKE, ""), Err(RbdError::NoName)));
        assert!(matches!(migration_status(&FAKE, ""), Err(RbdError::NoName)));
    }
}
