extern crate ceph_rbd;

use std::time::Duration;

use ceph_rbd::ceph::IoContext;
use ceph_rbd::error::RbdError;
use ceph_rbd::features::ImageFeatures;
use ceph_rbd::image::Image;
use ceph_rbd::options::ImageOptions;
use ceph_rbd::rados::rados_ioctx_t;
use ceph_rbd::{group, group_snap, namespace};

/// Hands out a pointer nothing may dereference. Every call below has to be
/// rejected before it reaches librbd.
struct Unreachable;

impl IoContext for Unreachable {
    fn ioctx_ptr(&self) -> rados_ioctx_t {
        8 as rados_ioctx_t
    }
}

static POOL: Unreachable = Unreachable;

fn pool() -> Option<&'static dyn IoContext> {
    Some(&POOL)
}

fn kind(res: Result<impl Sized, RbdError>) -> String {
    match res {
        Ok(_) => "Ok".to_string(),
        Err(e) => format!("{:?}", e),
    }
}

#[test]
fn remove_ranks_name_first() {
    let image = Image::new(None, "");
    assert_eq!(kind(image.remove()), "NoName");
    let image = Image::new(None, "img");
    assert_eq!(kind(image.remove()), "NoIOContext");
}

#[test]
fn open_only_operations_on_closed_image() {
    let mut image = Image::new(pool(), "img");
    assert_eq!(kind(image.stat()), "ImageNotOpen");
    assert_eq!(kind(image.close()), "ImageNotOpen");
    assert_eq!(kind(image.get_size()), "ImageNotOpen");
    assert_eq!(kind(image.get_id()), "ImageNotOpen");
    assert_eq!(kind(image.flatten()), "ImageNotOpen");
    assert_eq!(kind(image.list_children()), "ImageNotOpen");
    assert_eq!(kind(image.create_snapshot("s")), "ImageNotOpen");
    assert_eq!(kind(image.list_lockers()), "ImageNotOpen");
    assert_eq!(kind(image.list_watchers()), "ImageNotOpen");
    assert_eq!(kind(image.get_metadata("k")), "ImageNotOpen");
    assert_eq!(kind(image.sparsify(4096)), "ImageNotOpen");
    assert_eq!(kind(image.resize_with_progress(0, true, |_, _| 0)), "ImageNotOpen");
    assert_eq!(kind(image.update_watch(|| {})), "ImageNotOpen");
    let mut buf = [0u8; 16];
    assert_eq!(kind(image.read(&mut buf)), "ImageNotOpen");
    assert_eq!(kind(image.read_at(&mut buf, 0)), "ImageNotOpen");
}

#[test]
fn snapshot_needs_name_after_open_check() {
    let image = Image::new(pool(), "img");
    let snap = image.get_snapshot("");
    assert_eq!(kind(snap.remove()), "ImageNotOpen");
    assert_eq!(kind(snap.protect()), "ImageNotOpen");
}

#[test]
fn trash_and_clone_names() {
    let image = Image::new(pool(), "");
    assert_eq!(kind(image.trash(Duration::from_secs(0))), "NoName");
    let parent = Image::new(pool(), "parent");
    assert_eq!(
        kind(parent.clone("", &POOL, "child", ImageFeatures::LAYERING, 22)),
        "SnapshotNoName"
    );
    assert_eq!(kind(parent.clone("s", &POOL, "", ImageFeatures::LAYERING, 22)), "NoName");
}

#[test]
fn create_without_name() {
    assert_eq!(kind(Image::create(&POOL, "", 1 << 20, 22)), "NoName");
}

#[test]
fn pool_level_names() {
    assert_eq!(kind(group::group_create(&POOL, "")), "NoName");
    assert_eq!(kind(group_snap::group_snap_create(&POOL, "g", "")), "SnapshotNoName");
    assert_eq!(kind(namespace::namespace_exists(&POOL, "")), "NoNamespaceName");
    let opts = ImageOptions::new();
    assert_eq!(
        kind(ceph_rbd::clone::clone_image(&POOL, "p", "", &POOL, "c", &opts)),
        "SnapshotNoName"
    );
}
