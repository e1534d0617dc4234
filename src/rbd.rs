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

//! Raw declarations for librbd (`rbd/librbd.h`).
//!
//! Everything here is unsafe and mirrors the C header one to one. Entry
//! points added after the oldest supported release are not declared in the
//! `extern` block; they only appear as function pointer types and are
//! resolved at run time through `dlsym`.

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_void, size_t, ssize_t, time_t, timespec};

use crate::rados::{rados_ioctx_t, rados_t};

pub type rbd_image_t = *mut c_void;
pub type rbd_image_options_t = *mut c_void;
pub type rbd_pool_stats_t = *mut c_void;
pub type rbd_encryption_options_t = *mut c_void;

pub type librbd_progress_fn_t = Option<extern "C" fn(offset: u64, total: u64, ptr: *mut c_void) -> c_int>;
pub type rbd_update_callback_t = Option<extern "C" fn(arg: *mut c_void)>;
pub type rbd_diff_iterate_cb_t =
    Option<extern "C" fn(offset: u64, length: size_t, exists: c_int, arg: *mut c_void) -> c_int>;

// C enums, all int sized.
pub type rbd_snap_namespace_type_t = c_int;
pub type rbd_trash_image_source_t = c_int;
pub type rbd_lock_mode_t = c_int;
pub type rbd_group_image_state_t = c_int;
pub type rbd_group_snap_state_t = c_int;
pub type rbd_group_snap_namespace_type_t = c_int;
pub type rbd_mirror_mode_t = c_int;
pub type rbd_mirror_image_mode_t = c_int;
pub type rbd_mirror_image_state_t = c_int;
pub type rbd_mirror_image_status_state_t = c_int;
pub type rbd_mirror_peer_direction_t = c_int;
pub type rbd_mirror_group_state_t = c_int;
pub type rbd_mirror_group_status_state_t = c_int;
pub type rbd_image_migration_state_t = c_int;
pub type rbd_encryption_format_t = c_int;
pub type rbd_encryption_algorithm_t = c_int;

pub const RBD_MAX_BLOCK_NAME_SIZE: usize = 24;
pub const RBD_MAX_IMAGE_NAME_SIZE: usize = 96;

// Image option keys
pub const RBD_IMAGE_OPTION_FORMAT: c_int = 0;
pub const RBD_IMAGE_OPTION_FEATURES: c_int = 1;
pub const RBD_IMAGE_OPTION_ORDER: c_int = 2;
pub const RBD_IMAGE_OPTION_STRIPE_UNIT: c_int = 3;
pub const RBD_IMAGE_OPTION_STRIPE_COUNT: c_int = 4;
pub const RBD_IMAGE_OPTION_JOURNAL_ORDER: c_int = 5;
pub const RBD_IMAGE_OPTION_JOURNAL_SPLAY_WIDTH: c_int = 6;
pub const RBD_IMAGE_OPTION_JOURNAL_POOL: c_int = 7;
pub const RBD_IMAGE_OPTION_FEATURES_SET: c_int = 8;
pub const RBD_IMAGE_OPTION_FEATURES_CLEAR: c_int = 9;
pub const RBD_IMAGE_OPTION_DATA_POOL: c_int = 10;
pub const RBD_IMAGE_OPTION_FLATTEN: c_int = 11;
pub const RBD_IMAGE_OPTION_CLONE_FORMAT: c_int = 12;
pub const RBD_IMAGE_OPTION_MIRROR_IMAGE_MODE: c_int = 13;

// Pool statistics
pub const RBD_POOL_STAT_OPTION_IMAGES: c_int = 0;
pub const RBD_POOL_STAT_OPTION_IMAGE_PROVISIONED_BYTES: c_int = 1;
pub const RBD_POOL_STAT_OPTION_IMAGE_MAX_PROVISIONED_BYTES: c_int = 2;
pub const RBD_POOL_STAT_OPTION_IMAGE_SNAPSHOTS: c_int = 3;
pub const RBD_POOL_STAT_OPTION_TRASH_IMAGES: c_int = 4;
pub const RBD_POOL_STAT_OPTION_TRASH_PROVISIONED_BYTES: c_int = 5;
pub const RBD_POOL_STAT_OPTION_TRASH_MAX_PROVISIONED_BYTES: c_int = 6;
pub const RBD_POOL_STAT_OPTION_TRASH_SNAPSHOTS: c_int = 7;

macro_rules! zeroed_default {
    ($($name:ident),* $(,)*) => {
        $(
            impl ::std::default::Default for $name {
                fn default() -> Self {
                    unsafe { ::std::mem::zeroed() }
                }
            }
        )*
    };
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct rbd_image_info_t {
    pub size: u64,
    pub obj_size: u64,
    pub num_objs: u64,
    pub order: c_int,
    pub block_name_prefix: [c_char; RBD_MAX_BLOCK_NAME_SIZE],
    pub parent_pool: i64,
    pub parent_name: [c_char; RBD_MAX_IMAGE_NAME_SIZE],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_snap_info_t {
    pub id: u64,
    pub size: u64,
    pub name: *const c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_image_spec_t {
    pub id: *mut c_char,
    pub name: *mut c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_linked_image_spec_t {
    pub pool_id: i64,
    pub pool_name: *mut c_char,
    pub pool_namespace: *mut c_char,
    pub image_id: *mut c_char,
    pub image_name: *mut c_char,
    pub trash: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_snap_spec_t {
    pub id: u64,
    pub namespace_type: rbd_snap_namespace_type_t,
    pub name: *mut c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_snap_group_namespace_t {
    pub group_pool: i64,
    pub group_name: *mut c_char,
    pub group_snap_name: *mut c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_trash_image_info_t {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub source: rbd_trash_image_source_t,
    pub deletion_time: time_t,
    pub deferment_end_time: time_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_image_watcher_t {
    pub addr: *mut c_char,
    pub id: i64,
    pub cookie: u64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_group_info_t {
    pub name: *mut c_char,
    pub pool: i64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_group_image_info_t {
    pub name: *mut c_char,
    pub pool: i64,
    pub state: rbd_group_image_state_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_group_snap_info_t {
    pub name: *mut c_char,
    pub state: rbd_group_snap_state_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_group_image_snap_info_t {
    pub image_name: *mut c_char,
    pub pool_id: i64,
    pub snap_id: u64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_group_snap_info2_t {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub image_snap_name: *mut c_char,
    pub state: rbd_group_snap_state_t,
    pub namespace_type: rbd_group_snap_namespace_type_t,
    pub image_snaps_count: size_t,
    pub image_snaps: *mut rbd_group_image_snap_info_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_image_info_t {
    pub global_id: *mut c_char,
    pub state: rbd_mirror_image_state_t,
    pub primary: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_image_site_status_t {
    pub mirror_uuid: *mut c_char,
    pub state: rbd_mirror_image_status_state_t,
    pub description: *mut c_char,
    pub last_update: time_t,
    pub up: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_image_global_status_t {
    pub name: *mut c_char,
    pub info: rbd_mirror_image_info_t,
    pub site_statuses_count: u32,
    pub site_statuses: *mut rbd_mirror_image_site_status_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_peer_site_t {
    pub uuid: *mut c_char,
    pub direction: rbd_mirror_peer_direction_t,
    pub site_name: *mut c_char,
    pub mirror_uuid: *mut c_char,
    pub client_name: *mut c_char,
    pub last_seen: time_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_group_info_t {
    pub global_id: *mut c_char,
    pub mirror_image_mode: rbd_mirror_image_mode_t,
    pub state: rbd_mirror_group_state_t,
    pub primary: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_group_site_status_t {
    pub mirror_uuid: *mut c_char,
    pub state: rbd_mirror_group_status_state_t,
    pub mirror_image_count: u32,
    pub mirror_image_pool_ids: *mut i64,
    pub mirror_image_global_ids: *mut *mut c_char,
    pub mirror_images: *mut rbd_mirror_image_site_status_t,
    pub description: *mut c_char,
    pub last_update: time_t,
    pub up: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_mirror_group_global_status_t {
    pub name: *mut c_char,
    pub info: rbd_mirror_group_info_t,
    pub site_statuses_count: u32,
    pub site_statuses: *mut rbd_mirror_group_site_status_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_image_migration_status_t {
    pub source_pool_id: i64,
    pub source_pool_namespace: *mut c_char,
    pub source_image_name: *mut c_char,
    pub source_image_id: *mut c_char,
    pub dest_pool_id: i64,
    pub dest_pool_namespace: *mut c_char,
    pub dest_image_name: *mut c_char,
    pub dest_image_id: *mut c_char,
    pub state: rbd_image_migration_state_t,
    pub state_description: *mut c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_encryption_luks1_format_options_t {
    pub alg: rbd_encryption_algorithm_t,
    pub passphrase: *const c_char,
    pub passphrase_size: size_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_encryption_luks2_format_options_t {
    pub alg: rbd_encryption_algorithm_t,
    pub passphrase: *const c_char,
    pub passphrase_size: size_t,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct rbd_encryption_luks_format_options_t {
    pub passphrase: *const c_char,
    pub passphrase_size: size_t,
}

zeroed_default!(
    rbd_image_info_t,
    rbd_snap_info_t,
    rbd_image_spec_t,
    rbd_linked_image_spec_t,
    rbd_snap_spec_t,
    rbd_snap_group_namespace_t,
    rbd_trash_image_info_t,
    rbd_image_watcher_t,
    rbd_group_info_t,
    rbd_group_image_info_t,
    rbd_group_snap_info_t,
    rbd_group_snap_info2_t,
    rbd_mirror_image_info_t,
    rbd_mirror_image_site_status_t,
    rbd_mirror_image_global_status_t,
    rbd_mirror_peer_site_t,
    rbd_mirror_group_info_t,
    rbd_mirror_group_global_status_t,
    rbd_image_migration_status_t,
);

// Entry points resolved at run time.
pub type rbd_clone4_fn = unsafe extern "C" fn(
    p_ioctx: rados_ioctx_t,
    p_name: *const c_char,
    p_snap_id: u64,
    c_ioctx: rados_ioctx_t,
    c_name: *const c_char,
    c_opts: rbd_image_options_t,
) -> c_int;

pub type rbd_group_snap_get_info_fn = unsafe extern "C" fn(
    group_p: rados_ioctx_t,
    group_name: *const c_char,
    snap_name: *const c_char,
    group_snap: *mut rbd_group_snap_info2_t,
) -> c_int;

pub type rbd_group_snap_get_info_cleanup_fn = unsafe extern "C" fn(group_snap: *mut rbd_group_snap_info2_t);

pub type rbd_mirror_group_enable_fn = unsafe extern "C" fn(
    p: rados_ioctx_t,
    name: *const c_char,
    mirror_image_mode: rbd_mirror_image_mode_t,
    flags: u32,
) -> c_int;

pub type rbd_mirror_group_disable_fn = unsafe extern "C" fn(p: rados_ioctx_t, name: *const c_char, force: bool) -> c_int;

pub type rbd_mirror_group_promote_fn =
    unsafe extern "C" fn(p: rados_ioctx_t, name: *const c_char, flags: u32, force: bool) -> c_int;

pub type rbd_mirror_group_demote_fn = unsafe extern "C" fn(p: rados_ioctx_t, name: *const c_char, flags: u32) -> c_int;

pub type rbd_mirror_group_resync_fn = unsafe extern "C" fn(p: rados_ioctx_t, name: *const c_char) -> c_int;

pub type rbd_mirror_group_get_info_fn = unsafe extern "C" fn(
    p: rados_ioctx_t,
    name: *const c_char,
    mirror_group_info: *mut rbd_mirror_group_info_t,
    info_size: size_t,
) -> c_int;

pub type rbd_mirror_group_get_info_cleanup_fn = unsafe extern "C" fn(mirror_group_info: *mut rbd_mirror_group_info_t);

pub type rbd_mirror_group_get_global_status_fn = unsafe extern "C" fn(
    p: rados_ioctx_t,
    name: *const c_char,
    mirror_group_status: *mut rbd_mirror_group_global_status_t,
    status_size: size_t,
) -> c_int;

pub type rbd_mirror_group_global_status_cleanup_fn =
    unsafe extern "C" fn(mirror_group_status: *mut rbd_mirror_group_global_status_t);

#[cfg(target_os = "linux")]
#[link(name = "rbd", kind = "dylib")]
extern "C" {
    pub fn rbd_version(major: *mut c_int, minor: *mut c_int, extra: *mut c_int);

    // image options
    pub fn rbd_image_options_create(opts: *mut rbd_image_options_t);
    pub fn rbd_image_options_destroy(opts: rbd_image_options_t);
    pub fn rbd_image_options_set_string(opts: rbd_image_options_t, optname: c_int, optval: *const c_char) -> c_int;
    pub fn rbd_image_options_set_uint64(opts: rbd_image_options_t, optname: c_int, optval: u64) -> c_int;
    pub fn rbd_image_options_get_string(
        opts: rbd_image_options_t,
        optname: c_int,
        optval: *mut c_char,
        maxlen: size_t,
    ) -> c_int;
    pub fn rbd_image_options_get_uint64(opts: rbd_image_options_t, optname: c_int, optval: *mut u64) -> c_int;
    pub fn rbd_image_options_is_set(opts: rbd_image_options_t, optname: c_int, is_set: *mut bool) -> c_int;
    pub fn rbd_image_options_unset(opts: rbd_image_options_t, optname: c_int) -> c_int;
    pub fn rbd_image_options_clear(opts: rbd_image_options_t);
    pub fn rbd_image_options_is_empty(opts: rbd_image_options_t) -> c_int;

    // pool level image management
    pub fn rbd_list2(io: rados_ioctx_t, images: *mut rbd_image_spec_t, max_images: *mut size_t) -> c_int;
    pub fn rbd_image_spec_list_cleanup(images: *mut rbd_image_spec_t, num_images: size_t);
    pub fn rbd_create(io: rados_ioctx_t, name: *const c_char, size: u64, order: *mut c_int) -> c_int;
    pub fn rbd_create2(io: rados_ioctx_t, name: *const c_char, size: u64, features: u64, order: *mut c_int)
        -> c_int;
    pub fn rbd_create3(
        io: rados_ioctx_t,
        name: *const c_char,
        size: u64,
        features: u64,
        order: *mut c_int,
        stripe_unit: u64,
        stripe_count: u64,
    ) -> c_int;
    pub fn rbd_create4(io: rados_ioctx_t, name: *const c_char, size: u64, opts: rbd_image_options_t) -> c_int;
    pub fn rbd_clone(
        p_ioctx: rados_ioctx_t,
        p_name: *const c_char,
        p_snapname: *const c_char,
        c_ioctx: rados_ioctx_t,
        c_name: *const c_char,
        features: u64,
        c_order: *mut c_int,
    ) -> c_int;
    pub fn rbd_clone3(
        p_ioctx: rados_ioctx_t,
        p_name: *const c_char,
        p_snapname: *const c_char,
        c_ioctx: rados_ioctx_t,
        c_name: *const c_char,
        c_opts: rbd_image_options_t,
    ) -> c_int;
    pub fn rbd_remove(io: rados_ioctx_t, name: *const c_char) -> c_int;
    pub fn rbd_rename(src_io_ctx: rados_ioctx_t, srcname: *const c_char, destname: *const c_char) -> c_int;

    // trash
    pub fn rbd_trash_move(io: rados_ioctx_t, name: *const c_char, delay: u64) -> c_int;
    pub fn rbd_trash_list(io: rados_ioctx_t, trash_entries: *mut rbd_trash_image_info_t, num_entries: *mut size_t)
        -> c_int;
    pub fn rbd_trash_list_cleanup(trash_entries: *mut rbd_trash_image_info_t, num_entries: size_t);
    pub fn rbd_trash_remove(io: rados_ioctx_t, id: *const c_char, force: bool) -> c_int;
    pub fn rbd_trash_restore(io: rados_ioctx_t, id: *const c_char, name: *const c_char) -> c_int;

    // open / close
    pub fn rbd_open(io: rados_ioctx_t, name: *const c_char, image: *mut rbd_image_t, snap_name: *const c_char)
        -> c_int;
    pub fn rbd_open_by_id(io: rados_ioctx_t, id: *const c_char, image: *mut rbd_image_t, snap_name: *const c_char)
        -> c_int;
    pub fn rbd_open_read_only(
        io: rados_ioctx_t,
        name: *const c_char,
        image: *mut rbd_image_t,
        snap_name: *const c_char,
    ) -> c_int;
    pub fn rbd_open_by_id_read_only(
        io: rados_ioctx_t,
        id: *const c_char,
        image: *mut rbd_image_t,
        snap_name: *const c_char,
    ) -> c_int;
    pub fn rbd_close(image: rbd_image_t) -> c_int;

    // image properties
    pub fn rbd_resize(image: rbd_image_t, size: u64) -> c_int;
    pub fn rbd_resize2(
        image: rbd_image_t,
        size: u64,
        allow_shrink: bool,
        cb: librbd_progress_fn_t,
        cbdata: *mut c_void,
    ) -> c_int;
    pub fn rbd_stat(image: rbd_image_t, info: *mut rbd_image_info_t, infosize: size_t) -> c_int;
    pub fn rbd_get_old_format(image: rbd_image_t, old: *mut u8) -> c_int;
    pub fn rbd_get_size(image: rbd_image_t, size: *mut u64) -> c_int;
    pub fn rbd_get_features(image: rbd_image_t, features: *mut u64) -> c_int;
    pub fn rbd_update_features(image: rbd_image_t, features: u64, enabled: u8) -> c_int;
    pub fn rbd_get_stripe_unit(image: rbd_image_t, stripe_unit: *mut u64) -> c_int;
    pub fn rbd_get_stripe_count(image: rbd_image_t, stripe_count: *mut u64) -> c_int;
    pub fn rbd_get_create_timestamp(image: rbd_image_t, timestamp: *mut timespec) -> c_int;
    pub fn rbd_get_access_timestamp(image: rbd_image_t, timestamp: *mut timespec) -> c_int;
    pub fn rbd_get_modify_timestamp(image: rbd_image_t, timestamp: *mut timespec) -> c_int;
    pub fn rbd_get_overlap(image: rbd_image_t, overlap: *mut u64) -> c_int;
    pub fn rbd_get_name(image: rbd_image_t, name: *mut c_char, name_len: *mut size_t) -> c_int;
    pub fn rbd_get_id(image: rbd_image_t, id: *mut c_char, id_len: size_t) -> c_int;
    pub fn rbd_get_parent(
        image: rbd_image_t,
        parent_image: *mut rbd_linked_image_spec_t,
        parent_snap: *mut rbd_snap_spec_t,
    ) -> c_int;
    pub fn rbd_linked_image_spec_cleanup(image: *mut rbd_linked_image_spec_t);
    pub fn rbd_snap_spec_cleanup(snap: *mut rbd_snap_spec_t);
    pub fn rbd_list_children3(
        image: rbd_image_t,
        images: *mut rbd_linked_image_spec_t,
        max_images: *mut size_t,
    ) -> c_int;
    pub fn rbd_linked_image_spec_list_cleanup(images: *mut rbd_linked_image_spec_t, num_images: size_t);
    pub fn rbd_get_group(image: rbd_image_t, group_info: *mut rbd_group_info_t, group_info_size: size_t) -> c_int;
    pub fn rbd_group_info_cleanup(group_info: *mut rbd_group_info_t, group_info_size: size_t) -> c_int;

    // copies and layering
    pub fn rbd_copy(image: rbd_image_t, dest_io_ctx: rados_ioctx_t, destname: *const c_char) -> c_int;
    pub fn rbd_copy2(src: rbd_image_t, dest: rbd_image_t) -> c_int;
    pub fn rbd_copy3(
        src: rbd_image_t,
        dest_io_ctx: rados_ioctx_t,
        destname: *const c_char,
        dest_opts: rbd_image_options_t,
    ) -> c_int;
    pub fn rbd_deep_copy(
        src: rbd_image_t,
        dest_io_ctx: rados_ioctx_t,
        destname: *const c_char,
        dest_opts: rbd_image_options_t,
    ) -> c_int;
    pub fn rbd_flatten(image: rbd_image_t) -> c_int;
    pub fn rbd_sparsify(image: rbd_image_t, sparse_size: size_t) -> c_int;
    pub fn rbd_sparsify_with_progress(
        image: rbd_image_t,
        sparse_size: size_t,
        cb: librbd_progress_fn_t,
        cbdata: *mut c_void,
    ) -> c_int;

    // snapshots
    pub fn rbd_snap_list(image: rbd_image_t, snaps: *mut rbd_snap_info_t, max_snaps: *mut c_int) -> c_int;
    pub fn rbd_snap_list_end(snaps: *mut rbd_snap_info_t);
    pub fn rbd_snap_create(image: rbd_image_t, snapname: *const c_char) -> c_int;
    pub fn rbd_snap_remove(image: rbd_image_t, snapname: *const c_char) -> c_int;
    pub fn rbd_snap_rollback(image: rbd_image_t, snapname: *const c_char) -> c_int;
    pub fn rbd_snap_rollback_with_progress(
        image: rbd_image_t,
        snapname: *const c_char,
        cb: librbd_progress_fn_t,
        cbdata: *mut c_void,
    ) -> c_int;
    pub fn rbd_snap_rename(image: rbd_image_t, snapname: *const c_char, dstsnapsname: *const c_char) -> c_int;
    pub fn rbd_snap_protect(image: rbd_image_t, snap_name: *const c_char) -> c_int;
    pub fn rbd_snap_unprotect(image: rbd_image_t, snap_name: *const c_char) -> c_int;
    pub fn rbd_snap_is_protected(image: rbd_image_t, snap_name: *const c_char, is_protected: *mut c_int) -> c_int;
    pub fn rbd_snap_set(image: rbd_image_t, snapname: *const c_char) -> c_int;
    pub fn rbd_snap_set_by_id(image: rbd_image_t, snap_id: u64) -> c_int;
    pub fn rbd_snap_get_name(image: rbd_image_t, snap_id: u64, snapname: *mut c_char, name_len: *mut size_t)
        -> c_int;
    pub fn rbd_snap_get_id(image: rbd_image_t, snapname: *const c_char, snap_id: *mut u64) -> c_int;
    pub fn rbd_snap_get_timestamp(image: rbd_image_t, snap_id: u64, timestamp: *mut timespec) -> c_int;
    pub fn rbd_snap_get_namespace_type(
        image: rbd_image_t,
        snap_id: u64,
        namespace_type: *mut rbd_snap_namespace_type_t,
    ) -> c_int;
    pub fn rbd_snap_get_group_namespace(
        image: rbd_image_t,
        snap_id: u64,
        group_snap: *mut rbd_snap_group_namespace_t,
        group_snap_size: size_t,
    ) -> c_int;
    pub fn rbd_snap_group_namespace_cleanup(
        group_snap: *mut rbd_snap_group_namespace_t,
        group_snap_size: size_t,
    ) -> c_int;
    pub fn rbd_snap_get_trash_namespace(
        image: rbd_image_t,
        snap_id: u64,
        original_name: *mut c_char,
        max_length: size_t,
    ) -> c_int;

    // data path
    pub fn rbd_diff_iterate2(
        image: rbd_image_t,
        fromsnapname: *const c_char,
        ofs: u64,
        len: u64,
        include_parent: u8,
        whole_object: u8,
        cb: rbd_diff_iterate_cb_t,
        arg: *mut c_void,
    ) -> c_int;
    pub fn rbd_read(image: rbd_image_t, ofs: u64, len: size_t, buf: *mut c_char) -> ssize_t;
    pub fn rbd_write(image: rbd_image_t, ofs: u64, len: size_t, buf: *const c_char) -> ssize_t;
    pub fn rbd_discard(image: rbd_image_t, ofs: u64, len: u64) -> c_int;
    pub fn rbd_writesame(
        image: rbd_image_t,
        ofs: u64,
        len: size_t,
        buf: *const c_char,
        data_len: size_t,
        op_flags: c_int,
    ) -> ssize_t;
    pub fn rbd_flush(image: rbd_image_t) -> c_int;
    pub fn rbd_invalidate_cache(image: rbd_image_t) -> c_int;

    // advisory and managed locks
    pub fn rbd_list_lockers(
        image: rbd_image_t,
        exclusive: *mut c_int,
        tag: *mut c_char,
        tag_len: *mut size_t,
        clients: *mut c_char,
        clients_len: *mut size_t,
        cookies: *mut c_char,
        cookies_len: *mut size_t,
        addrs: *mut c_char,
        addrs_len: *mut size_t,
    ) -> ssize_t;
    pub fn rbd_lock_exclusive(image: rbd_image_t, cookie: *const c_char) -> c_int;
    pub fn rbd_lock_shared(image: rbd_image_t, cookie: *const c_char, tag: *const c_char) -> c_int;
    pub fn rbd_unlock(image: rbd_image_t, cookie: *const c_char) -> c_int;
    pub fn rbd_break_lock(image: rbd_image_t, client: *const c_char, cookie: *const c_char) -> c_int;
    pub fn rbd_lock_acquire(image: rbd_image_t, lock_mode: rbd_lock_mode_t) -> c_int;
    pub fn rbd_lock_release(image: rbd_image_t) -> c_int;
    pub fn rbd_lock_get_owners(
        image: rbd_image_t,
        lock_mode: *mut rbd_lock_mode_t,
        lock_owners: *mut *mut c_char,
        max_lock_owners: *mut size_t,
    ) -> c_int;
    pub fn rbd_lock_get_owners_cleanup(lock_owners: *mut *mut c_char, lock_owner_count: size_t);
    pub fn rbd_lock_break(image: rbd_image_t, lock_mode: rbd_lock_mode_t, lock_owner: *const c_char) -> c_int;
    pub fn rbd_is_exclusive_lock_owner(image: rbd_image_t, is_owner: *mut c_int) -> c_int;

    // metadata
    pub fn rbd_metadata_get(image: rbd_image_t, key: *const c_char, value: *mut c_char, val_len: *mut size_t)
        -> c_int;
    pub fn rbd_metadata_set(image: rbd_image_t, key: *const c_char, value: *const c_char) -> c_int;
    pub fn rbd_metadata_remove(image: rbd_image_t, key: *const c_char) -> c_int;
    pub fn rbd_metadata_list(
        image: rbd_image_t,
        start: *const c_char,
        max: u64,
        keys: *mut c_char,
        key_len: *mut size_t,
        values: *mut c_char,
        vals_len: *mut size_t,
    ) -> c_int;

    // pool
    pub fn rbd_pool_metadata_get(
        io_ctx: rados_ioctx_t,
        key: *const c_char,
        value: *mut c_char,
        val_len: *mut size_t,
    ) -> c_int;
    pub fn rbd_pool_metadata_set(io_ctx: rados_ioctx_t, key: *const c_char, value: *const c_char) -> c_int;
    pub fn rbd_pool_metadata_remove(io_ctx: rados_ioctx_t, key: *const c_char) -> c_int;
    pub fn rbd_pool_init(io: rados_ioctx_t, force: bool) -> c_int;
    pub fn rbd_pool_stats_create(stats: *mut rbd_pool_stats_t);
    pub fn rbd_pool_stats_destroy(stats: rbd_pool_stats_t);
    pub fn rbd_pool_stats_option_add_uint64(stats: rbd_pool_stats_t, stat_option: c_int, stat_val: *mut u64)
        -> c_int;
    pub fn rbd_pool_stats_get(io: rados_ioctx_t, stats: rbd_pool_stats_t) -> c_int;

    // namespaces
    pub fn rbd_namespace_create(io: rados_ioctx_t, namespace_name: *const c_char) -> c_int;
    pub fn rbd_namespace_remove(io: rados_ioctx_t, namespace_name: *const c_char) -> c_int;
    pub fn rbd_namespace_list(io: rados_ioctx_t, namespace_names: *mut c_char, size: *mut size_t) -> c_int;
    pub fn rbd_namespace_exists(io: rados_ioctx_t, namespace_name: *const c_char, exists: *mut bool) -> c_int;

    // watchers
    pub fn rbd_watchers_list(image: rbd_image_t, watchers: *mut rbd_image_watcher_t, max_watchers: *mut size_t)
        -> c_int;
    pub fn rbd_watchers_list_cleanup(watchers: *mut rbd_image_watcher_t, num_watchers: size_t);
    pub fn rbd_update_watch(
        image: rbd_image_t,
        handle: *mut u64,
        watch_cb: rbd_update_callback_t,
        arg: *mut c_void,
    ) -> c_int;
    pub fn rbd_update_unwatch(image: rbd_image_t, handle: u64) -> c_int;

    // groups
    pub fn rbd_group_create(p: rados_ioctx_t, name: *const c_char) -> c_int;
    pub fn rbd_group_remove(p: rados_ioctx_t, name: *const c_char) -> c_int;
    pub fn rbd_group_list(p: rados_ioctx_t, names: *mut c_char, size: *mut size_t) -> c_int;
    pub fn rbd_group_rename(p: rados_ioctx_t, src_name: *const c_char, dest_name: *const c_char) -> c_int;
    pub fn rbd_group_image_add(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        image_p: rados_ioctx_t,
        image_name: *const c_char,
    ) -> c_int;
    pub fn rbd_group_image_remove(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        image_p: rados_ioctx_t,
        image_name: *const c_char,
    ) -> c_int;
    pub fn rbd_group_image_remove_by_id(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        image_p: rados_ioctx_t,
        image_id: *const c_char,
    ) -> c_int;
    pub fn rbd_group_image_list(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        images: *mut rbd_group_image_info_t,
        group_image_info_size: size_t,
        num_entries: *mut size_t,
    ) -> c_int;
    pub fn rbd_group_image_list_cleanup(
        images: *mut rbd_group_image_info_t,
        group_image_info_size: size_t,
        num_entries: size_t,
    ) -> c_int;
    pub fn rbd_group_snap_create(group_p: rados_ioctx_t, group_name: *const c_char, snap_name: *const c_char)
        -> c_int;
    pub fn rbd_group_snap_remove(group_p: rados_ioctx_t, group_name: *const c_char, snap_name: *const c_char)
        -> c_int;
    pub fn rbd_group_snap_rename(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        old_snap_name: *const c_char,
        new_snap_name: *const c_char,
    ) -> c_int;
    pub fn rbd_group_snap_list(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        snaps: *mut rbd_group_snap_info_t,
        group_snap_info_size: size_t,
        num_entries: *mut size_t,
    ) -> c_int;
    pub fn rbd_group_snap_list_cleanup(
        snaps: *mut rbd_group_snap_info_t,
        group_snap_info_size: size_t,
        num_entries: size_t,
    ) -> c_int;
    pub fn rbd_group_snap_rollback(group_p: rados_ioctx_t, group_name: *const c_char, snap_name: *const c_char)
        -> c_int;
    pub fn rbd_group_snap_rollback_with_progress(
        group_p: rados_ioctx_t,
        group_name: *const c_char,
        snap_name: *const c_char,
        cb: librbd_progress_fn_t,
        cbdata: *mut c_void,
    ) -> c_int;

    // mirroring, pool level
    pub fn rbd_mirror_site_name_get(cluster: rados_t, name: *mut c_char, max_len: *mut size_t) -> c_int;
    pub fn rbd_mirror_site_name_set(cluster: rados_t, name: *const c_char) -> c_int;
    pub fn rbd_mirror_mode_get(io_ctx: rados_ioctx_t, mirror_mode: *mut rbd_mirror_mode_t) -> c_int;
    pub fn rbd_mirror_mode_set(io_ctx: rados_ioctx_t, mirror_mode: rbd_mirror_mode_t) -> c_int;
    pub fn rbd_mirror_uuid_get(io_ctx: rados_ioctx_t, uuid: *mut c_char, max_len: *mut size_t) -> c_int;
    pub fn rbd_mirror_peer_bootstrap_create(io_ctx: rados_ioctx_t, token: *mut c_char, max_len: *mut size_t)
        -> c_int;
    pub fn rbd_mirror_peer_bootstrap_import(
        io_ctx: rados_ioctx_t,
        direction: rbd_mirror_peer_direction_t,
        token: *const c_char,
    ) -> c_int;
    pub fn rbd_mirror_peer_site_add(
        io_ctx: rados_ioctx_t,
        uuid: *mut c_char,
        uuid_max_length: size_t,
        direction: rbd_mirror_peer_direction_t,
        site_name: *const c_char,
        client_name: *const c_char,
    ) -> c_int;
    pub fn rbd_mirror_peer_site_set_name(io_ctx: rados_ioctx_t, uuid: *const c_char, site_name: *const c_char)
        -> c_int;
    pub fn rbd_mirror_peer_site_set_client_name(
        io_ctx: rados_ioctx_t,
        uuid: *const c_char,
        client_name: *const c_char,
    ) -> c_int;
    pub fn rbd_mirror_peer_site_set_direction(
        io_ctx: rados_ioctx_t,
        uuid: *const c_char,
        direction: rbd_mirror_peer_direction_t,
    ) -> c_int;
    pub fn rbd_mirror_peer_site_remove(io_ctx: rados_ioctx_t, uuid: *const c_char) -> c_int;
    pub fn rbd_mirror_peer_site_list(
        io_ctx: rados_ioctx_t,
        peers: *mut rbd_mirror_peer_site_t,
        max_peers: *mut c_int,
    ) -> c_int;
    pub fn rbd_mirror_peer_site_list_cleanup(peers: *mut rbd_mirror_peer_site_t, max_peers: c_int);
    pub fn rbd_mirror_peer_site_get_attributes(
        p: rados_ioctx_t,
        uuid: *const c_char,
        keys: *mut c_char,
        max_key_len: *mut size_t,
        values: *mut c_char,
        max_value_len: *mut size_t,
        key_value_count: *mut size_t,
    ) -> c_int;
    pub fn rbd_mirror_peer_site_set_attributes(
        p: rados_ioctx_t,
        uuid: *const c_char,
        keys: *const c_char,
        values: *const c_char,
        key_value_count: size_t,
    ) -> c_int;
    pub fn rbd_mirror_image_global_status_list(
        io_ctx: rados_ioctx_t,
        start_id: *const c_char,
        max: size_t,
        image_ids: *mut *mut c_char,
        images: *mut rbd_mirror_image_global_status_t,
        len: *mut size_t,
    ) -> c_int;
    pub fn rbd_mirror_image_global_status_list_cleanup(
        image_ids: *mut *mut c_char,
        images: *mut rbd_mirror_image_global_status_t,
        len: size_t,
    );
    pub fn rbd_mirror_image_status_summary(
        io_ctx: rados_ioctx_t,
        states: *mut rbd_mirror_image_status_state_t,
        counts: *mut c_int,
        maxlen: *mut size_t,
    ) -> c_int;
    pub fn rbd_mirror_image_info_list(
        io_ctx: rados_ioctx_t,
        mode_filter: *mut rbd_mirror_image_mode_t,
        start_id: *const c_char,
        max: size_t,
        image_ids: *mut *mut c_char,
        mode_entries: *mut rbd_mirror_image_mode_t,
        info_entries: *mut rbd_mirror_image_info_t,
        num_entries: *mut size_t,
    ) -> c_int;
    pub fn rbd_mirror_image_info_list_cleanup(
        image_ids: *mut *mut c_char,
        info_entries: *mut rbd_mirror_image_info_t,
        num_entries: size_t,
    );

    // mirroring, image level
    pub fn rbd_mirror_image_enable2(image: rbd_image_t, mode: rbd_mirror_image_mode_t) -> c_int;
    pub fn rbd_mirror_image_disable(image: rbd_image_t, force: bool) -> c_int;
    pub fn rbd_mirror_image_promote(image: rbd_image_t, force: bool) -> c_int;
    pub fn rbd_mirror_image_demote(image: rbd_image_t) -> c_int;
    pub fn rbd_mirror_image_resync(image: rbd_image_t) -> c_int;
    pub fn rbd_mirror_image_create_snapshot(image: rbd_image_t, snap_id: *mut u64) -> c_int;
    pub fn rbd_mirror_image_get_info(
        image: rbd_image_t,
        mirror_image_info: *mut rbd_mirror_image_info_t,
        info_size: size_t,
    ) -> c_int;
    pub fn rbd_mirror_image_get_info_cleanup(mirror_image_info: *mut rbd_mirror_image_info_t);
    pub fn rbd_mirror_image_get_mode(image: rbd_image_t, mode: *mut rbd_mirror_image_mode_t) -> c_int;
    pub fn rbd_mirror_image_get_global_status(
        image: rbd_image_t,
        mirror_image_global_status: *mut rbd_mirror_image_global_status_t,
        status_size: size_t,
    ) -> c_int;
    pub fn rbd_mirror_image_global_status_cleanup(mirror_image_global_status: *mut rbd_mirror_image_global_status_t);
    pub fn rbd_mirror_image_get_instance_id(image: rbd_image_t, instance_id: *mut c_char, id_max_length: *mut size_t)
        -> c_int;

    // live migration
    pub fn rbd_migration_prepare(
        ioctx: rados_ioctx_t,
        image_name: *const c_char,
        dest_ioctx: rados_ioctx_t,
        dest_image_name: *const c_char,
        opts: rbd_image_options_t,
    ) -> c_int;
    pub fn rbd_migration_prepare_import(
        source_spec: *const c_char,
        dest_ioctx: rados_ioctx_t,
        dest_image_name: *const c_char,
        opts: rbd_image_options_t,
    ) -> c_int;
    pub fn rbd_migration_execute(ioctx: rados_ioctx_t, image_name: *const c_char) -> c_int;
    pub fn rbd_migration_commit(ioctx: rados_ioctx_t, image_name: *const c_char) -> c_int;
    pub fn rbd_migration_abort(ioctx: rados_ioctx_t, image_name: *const c_char) -> c_int;
    pub fn rbd_migration_status(
        ioctx: rados_ioctx_t,
        image_name: *const c_char,
        status: *mut rbd_image_migration_status_t,
        status_size: size_t,
    ) -> c_int;
    pub fn rbd_migration_status_cleanup(status: *mut rbd_image_migration_status_t);

    // encryption
    pub fn rbd_encryption_format(
        image: rbd_image_t,
        format: rbd_encryption_format_t,
        opts: rbd_encryption_options_t,
        opts_size: size_t,
    ) -> c_int;
    pub fn rbd_encryption_load(
        image: rbd_image_t,
        format: rbd_encryption_format_t,
        opts: rbd_encryption_options_t,
        opts_size: size_t,
    ) -> c_int;
}
