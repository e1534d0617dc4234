#![allow(unused_imports)]

extern crate ceph_rbd;
extern crate libc;

use std::env;

use libc::c_void;

use ceph_rbd::rados::*;
use ceph_rbd::rbd::*;

#[test]
#[cfg(feature = "link-check")]
fn test_rbd_symbols_link() {
    // This test only checks that every function declared in rbd.rs and
    // rados.rs resolves against librbd and librados. Nothing is called.
    if env::var("TEST_RBD_LINK_CHECK").is_err() {
        return;
    }

    let symbols: Vec<*const c_void> = vec![
        rados_version as *const c_void,
        rados_create as *const c_void,
        rados_connect as *const c_void,
        rados_shutdown as *const c_void,
        rados_conf_read_file as *const c_void,
        rados_conf_set as *const c_void,
        rados_cluster_fsid as *const c_void,
        rados_ioctx_create as *const c_void,
        rados_ioctx_create2 as *const c_void,
        rados_ioctx_destroy as *const c_void,
        rados_ioctx_get_id as *const c_void,
        rados_ioctx_get_pool_name as *const c_void,
        rados_ioctx_set_namespace as *const c_void,
        rbd_version as *const c_void,
        rbd_image_options_create as *const c_void,
        rbd_image_options_destroy as *const c_void,
        rbd_image_options_set_string as *const c_void,
        rbd_image_options_set_uint64 as *const c_void,
        rbd_image_options_get_string as *const c_void,
        rbd_image_options_get_uint64 as *const c_void,
        rbd_image_options_is_set as *const c_void,
        rbd_image_options_unset as *const c_void,
        rbd_image_options_clear as *const c_void,
        rbd_image_options_is_empty as *const c_void,
        rbd_list2 as *const c_void,
        rbd_image_spec_list_cleanup as *const c_void,
        rbd_create as *const c_void,
        rbd_create2 as *const c_void,
        rbd_create3 as *const c_void,
        rbd_create4 as *const c_void,
        rbd_clone as *const c_void,
        rbd_clone3 as *const c_void,
        rbd_remove as *const c_void,
        rbd_rename as *const c_void,
        rbd_trash_move as *const c_void,
        rbd_trash_list as *const c_void,
        rbd_trash_list_cleanup as *const c_void,
        rbd_trash_remove as *const c_void,
        rbd_trash_restore as *const c_void,
        rbd_open as *const c_void,
        rbd_open_by_id as *const c_void,
        rbd_open_read_only as *const c_void,
        rbd_open_by_id_read_only as *const c_void,
        rbd_close as *const c_void,
        rbd_resize as *const c_void,
        rbd_resize2 as *const c_void,
        rbd_stat as *const c_void,
        rbd_get_old_format as *const c_void,
        rbd_get_size as *const c_void,
        rbd_get_features as *const c_void,
        rbd_update_features as *const c_void,
        rbd_get_stripe_unit as *const c_void,
        rbd_get_stripe_count as *const c_void,
        rbd_get_create_timestamp as *const c_void,
        rbd_get_access_timestamp as *const c_void,
        rbd_get_modify_timestamp as *const c_void,
        rbd_get_overlap as *const c_void,
        rbd_get_name as *const c_void,
        rbd_get_id as *const c_void,
        rbd_get_parent as *const c_void,
        rbd_linked_image_spec_cleanup as *const c_void,
        rbd_snap_spec_cleanup as *const c_void,
        rbd_list_children3 as *const c_void,
        rbd_linked_image_spec_list_cleanup as *const c_void,
        rbd_get_group as *const c_void,
        rbd_group_info_cleanup as *const c_void,
        rbd_copy as *const c_void,
        rbd_copy2 as *const c_void,
        rbd_copy3 as *const c_void,
        rbd_deep_copy as *const c_void,
        rbd_flatten as *const c_void,
        rbd_sparsify as *const c_void,
        rbd_sparsify_with_progress as *const c_void,
        rbd_snap_list as *const c_void,
        rbd_snap_list_end as *const c_void,
        rbd_snap_create as *const c_void,
        rbd_snap_remove as *const c_void,
        rbd_snap_rollback as *const c_void,
        rbd_snap_rollback_with_progress as *const c_void,
        rbd_snap_rename as *const c_void,
        rbd_snap_protect as *const c_void,
        rbd_snap_unprotect as *const c_void,
        rbd_snap_is_protected as *const c_void,
        rbd_snap_set as *const c_void,
        rbd_snap_set_by_id as *const c_void,
        rbd_snap_get_name as *const c_void,
        rbd_snap_get_id as *const c_void,
        rbd_snap_get_timestamp as *const c_void,
        rbd_snap_get_namespace_type as *const c_void,
        rbd_snap_get_group_namespace as *const c_void,
        rbd_snap_group_namespace_cleanup as *const c_void,
        rbd_snap_get_trash_namespace as *const c_void,
        rbd_diff_iterate2 as *const c_void,
        rbd_read as *const c_void,
        rbd_write as *const c_void,
        rbd_discard as *const c_void,
        rbd_writesame as *const c_void,
        rbd_flush as *const c_void,
        rbd_invalidate_cache as *const c_void,
        rbd_list_lockers as *const c_void,
        rbd_lock_exclusive as *const c_void,
        rbd_lock_shared as *const c_void,
        rbd_unlock as *const c_void,
        rbd_break_lock as *const c_void,
        rbd_lock_acquire as *const c_void,
        rbd_lock_release as *const c_void,
        rbd_lock_get_owners as *const c_void,
        rbd_lock_get_owners_cleanup as *const c_void,
        rbd_lock_break as *const c_void,
        rbd_is_exclusive_lock_owner as *const c_void,
        rbd_metadata_get as *const c_void,
        rbd_metadata_set as *const c_void,
        rbd_metadata_remove as *const c_void,
        rbd_metadata_list as *const c_void,
        rbd_pool_metadata_get as *const c_void,
        rbd_pool_metadata_set as *const c_void,
        rbd_pool_metadata_remove as *const c_void,
        rbd_pool_init as *const c_void,
        rbd_pool_stats_create as *const c_void,
        rbd_pool_stats_destroy as *const c_void,
        rbd_pool_stats_option_add_uint64 as *const c_void,
        rbd_pool_stats_get as *const c_void,
        rbd_namespace_create as *const c_void,
        rbd_namespace_remove as *const c_void,
        rbd_namespace_list as *const c_void,
        rbd_namespace_exists as *const c_void,
        rbd_watchers_list as *const c_void,
        rbd_watchers_list_cleanup as *const c_void,
        rbd_update_watch as *const c_void,
        rbd_update_unwatch as *const c_void,
        rbd_group_create as *const c_void,
        rbd_group_remove as *const c_void,
        rbd_group_list as *const c_void,
        rbd_group_rename as *const c_void,
        rbd_group_image_add as *const c_void,
        rbd_group_image_remove as *const c_void,
        rbd_group_image_remove_by_id as *const c_void,
        rbd_group_image_list as *const c_void,
        rbd_group_image_list_cleanup as *const c_void,
        rbd_group_snap_create as *const c_void,
        rbd_group_snap_remove as *const c_void,
        rbd_group_snap_rename as *const c_void,
        rbd_group_snap_list as *const c_void,
        rbd_group_snap_list_cleanup as *const c_void,
        rbd_group_snap_rollback as *const c_void,
        rbd_group_snap_rollback_with_progress as *const c_void,
        rbd_mirror_site_name_get as *const c_void,
        rbd_mirror_site_name_set as *const c_void,
        rbd_mirror_mode_get as *const c_void,
        rbd_mirror_mode_set as *const c_void,
        rbd_mirror_uuid_get as *const c_void,
        rbd_mirror_peer_bootstrap_create as *const c_void,
        rbd_mirror_peer_bootstrap_import as *const c_void,
        rbd_mirror_peer_site_add as *const c_void,
        rbd_mirror_peer_site_set_name as *const c_void,
        rbd_mirror_peer_site_set_client_name as *const c_void,
        rbd_mirror_peer_site_set_direction as *const c_void,
        rbd_mirror_peer_site_remove as *const c_void,
        rbd_mirror_peer_site_list as *const c_void,
        rbd_mirror_peer_site_list_cleanup as *const c_void,
        rbd_mirror_peer_site_get_attributes as *const c_void,
        rbd_mirror_peer_site_set_attributes as *const c_void,
        rbd_mirror_image_global_status_list as *const c_void,
        rbd_mirror_image_global_status_list_cleanup as *const c_void,
        rbd_mirror_image_status_summary as *const c_void,
        rbd_mirror_image_info_list as *const c_void,
        rbd_mirror_image_info_list_cleanup as *const c_void,
        rbd_mirror_image_enable2 as *const c_void,
        rbd_mirror_image_disable as *const c_void,
        rbd_mirror_image_promote as *const c_void,
        rbd_mirror_image_demote as *const c_void,
        rbd_mirror_image_resync as *const c_void,
        rbd_mirror_image_create_snapshot as *const c_void,
        rbd_mirror_image_get_info as *const c_void,
        rbd_mirror_image_get_info_cleanup as *const c_void,
        rbd_mirror_image_get_mode as *const c_void,
        rbd_mirror_image_get_global_status as *const c_void,
        rbd_mirror_image_global_status_cleanup as *const c_void,
        rbd_mirror_image_get_instance_id as *const c_void,
        rbd_migration_prepare as *const c_void,
        rbd_migration_prepare_import as *const c_void,
        rbd_migration_execute as *const c_void,
        rbd_migration_commit as *const c_void,
        rbd_migration_abort as *const c_void,
        rbd_migration_status as *const c_void,
        rbd_migration_status_cleanup as *const c_void,
        rbd_encryption_format as *const c_void,
        rbd_encryption_load as *const c_void,
    ];
    assert!(symbols.iter().all(|s| !s.is_null()));
}
