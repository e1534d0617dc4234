//! These talk to a real cluster and only run when `CEPH_RBD_TEST_CONF`
//! points at a ceph.conf. `CEPH_RBD_TEST_POOL` and `CEPH_RBD_TEST_USER`
//! default to `rbd` and `admin`.

extern crate ceph_rbd;
extern crate tracing_subscriber;

use std::env;
use std::io::SeekFrom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ceph_rbd::ceph::{IoCtx, Rados};
use ceph_rbd::diff_iterate::DiffIterateConfig;
use ceph_rbd::error::RbdError;
use ceph_rbd::features::ImageFeatures;
use ceph_rbd::group::{group_create, group_image_add, group_image_remove, group_remove};
use ceph_rbd::group_snap::{group_snap_create, group_snap_get_info, group_snap_remove};
use ceph_rbd::image::{remove_image, Image};
use ceph_rbd::snapshot::SnapNamespaceType;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn connect() -> Option<(Rados, String)> {
    let conf = match env::var("CEPH_RBD_TEST_CONF") {
        Ok(conf) => conf,
        Err(_) => return None,
    };
    init_logging();
    let user = env::var("CEPH_RBD_TEST_USER").unwrap_or_else(|_| "admin".to_string());
    let pool = env::var("CEPH_RBD_TEST_POOL").unwrap_or_else(|_| "rbd".to_string());
    let rados = Rados::connect(&user, &conf).expect("connect to test cluster");
    Some((rados, pool))
}

/// A name no other test run is using.
fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    format!("{}-{}-{}", prefix, std::process::id(), nanos)
}

#[test]
fn open_stat_close() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let name = unique("t1");
    Image::create(&ioctx, &name, 1048576, 22).unwrap();

    let mut image = Image::open(&ioctx, &name, None).unwrap();
    assert_eq!(image.stat().unwrap().size, 1048576);
    image.close().unwrap();
    assert!(matches!(image.stat(), Err(RbdError::ImageNotOpen)));

    image.remove().unwrap();
}

#[test]
fn create_clone_list_children() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let parent_name = unique("parent");
    let child_name = unique("child");
    Image::create_with_features(&ioctx, &parent_name, 4194304, ImageFeatures::LAYERING, 22).unwrap();

    let mut parent = Image::open(&ioctx, &parent_name, None).unwrap();
    let snap = parent.create_snapshot("s").unwrap();
    snap.protect().unwrap();
    parent
        .clone("s", &ioctx, &child_name, ImageFeatures::empty(), 22)
        .unwrap();

    let (pools, images) = parent.list_children().unwrap();
    assert_eq!(pools, vec![ioctx.pool_name().unwrap()]);
    assert_eq!(images, vec![child_name.clone()]);

    remove_image(&ioctx, &child_name).unwrap();
    let snap = parent.get_snapshot("s");
    snap.unprotect().unwrap();
    snap.remove().unwrap();
    parent.close().unwrap();
    remove_image(&ioctx, &parent_name).unwrap();
}

#[test]
fn get_id_through_retry() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let name = unique("id");
    Image::create(&ioctx, &name, 1 << 20, 22).unwrap();
    let mut image = Image::open(&ioctx, &name, None).unwrap();

    let id = image.get_id().unwrap();
    assert!(!id.is_empty());
    let by_id = Image::open_by_id(&ioctx, &id, None).unwrap();
    assert_eq!(by_id.get_name().unwrap(), name);
    drop(by_id);

    image.close().unwrap();
    image.remove().unwrap();
}

#[test]
fn diff_iterate_stops_on_callback_code() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let name = unique("diff");
    let size: u64 = 16 << 20;
    Image::create(&ioctx, &name, size, 22).unwrap();
    let mut image = Image::open(&ioctx, &name, None).unwrap();

    // 1024 separate extents
    let block = [0xabu8; 512];
    for i in 0..1024u64 {
        image.write_at(&block, i * 16384).unwrap();
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let res = image.diff_iterate(&DiffIterateConfig::new(size), move |_, _, _| {
        if seen.fetch_add(1, Ordering::SeqCst) + 1 == 10 {
            7
        } else {
            0
        }
    });
    match res {
        Err(ref e) => assert_eq!(e.code(), Some(7)),
        Ok(()) => panic!("diff_iterate ignored the callback's return value"),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 10);

    image.close().unwrap();
    image.remove().unwrap();
}

#[test]
fn protect_unprotect_errors() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let name = unique("protect");
    Image::create_with_features(&ioctx, &name, 1 << 22, ImageFeatures::LAYERING, 22).unwrap();
    let mut image = Image::open(&ioctx, &name, None).unwrap();

    {
        let snap = image.create_snapshot("p").unwrap();
        assert!(!snap.is_protected().unwrap());

        let err = snap.unprotect().unwrap_err();
        assert!(!err.is_not_found());

        snap.protect().unwrap();
        assert!(snap.is_protected().unwrap());
        let err = snap.protect().unwrap_err();
        assert!(!err.is_not_found());

        snap.unprotect().unwrap();
        assert!(!snap.is_protected().unwrap());
        snap.remove().unwrap();
    }

    image.close().unwrap();
    image.remove().unwrap();
}

#[test]
fn group_snapshot_namespace() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let group = unique("grp");
    let name = unique("member");
    Image::create(&ioctx, &name, 1 << 22, 22).unwrap();
    group_create(&ioctx, &group).unwrap();
    group_image_add(&ioctx, &group, &ioctx, &name).unwrap();
    group_snap_create(&ioctx, &group, "gs").unwrap();

    // the member snapshot id is only reachable through the group snapshot info
    match group_snap_get_info(&ioctx, &group, "gs") {
        Ok(info) => {
            assert_eq!(info.snapshots.len(), 1);
            let mut image = Image::open(&ioctx, &name, None).unwrap();
            let snap_id = info.snapshots[0].snap_id;
            assert_eq!(image.get_snap_namespace_type(snap_id).unwrap(), SnapNamespaceType::Group);
            let ns = image.get_snap_group_namespace(snap_id).unwrap();
            assert_eq!(ns.group_name, group);
            assert_eq!(ns.group_snap_name, "gs");
            assert_eq!(ns.group_pool, ioctx.pool_id());
            image.close().unwrap();
        }
        Err(RbdError::NotImplemented(_)) => {}
        Err(e) => panic!("group_snap_get_info: {}", e),
    }

    group_snap_remove(&ioctx, &group, "gs").unwrap();
    group_image_remove(&ioctx, &group, &ioctx, &name).unwrap();
    group_remove(&ioctx, &group).unwrap();
    remove_image(&ioctx, &name).unwrap();
}

#[test]
fn rename_updates_name_only_on_success() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let name = unique("old");
    let taken = unique("taken");
    let new_name = unique("new");
    let mut image = Image::create(&ioctx, &name, 1 << 20, 22).unwrap();
    Image::create(&ioctx, &taken, 1 << 20, 22).unwrap();

    assert!(image.rename(&taken).is_err());
    assert_eq!(image.name(), name);

    image.rename(&new_name).unwrap();
    assert_eq!(image.name(), new_name);

    image.remove().unwrap();
    remove_image(&ioctx, &taken).unwrap();
}

#[test]
fn stream_read_matches_read_at() {
    let (rados, pool) = match connect() {
        Some(c) => c,
        None => return,
    };
    let ioctx = IoCtx::create(&rados, &pool).unwrap();
    let name = unique("stream");
    Image::create(&ioctx, &name, 1 << 20, 22).unwrap();
    let mut image = Image::open(&ioctx, &name, None).unwrap();

    let pattern: Vec<u8> = (0..256u32).map(|i| i as u8).collect();
    image.write_at(&pattern, 0).unwrap();

    let mut positional = [0u8; 50];
    let n = image.read_at(&mut positional, 100).unwrap();

    assert_eq!(image.seek(SeekFrom::Start(100)).unwrap(), 100);
    let mut streamed = [0u8; 50];
    let (m, short) = image.read(&mut streamed).unwrap();
    assert_eq!((m, short), (n, false));
    assert_eq!(&streamed[..], &positional[..]);
    assert_eq!(image.seek(SeekFrom::Current(0)).unwrap(), 100 + n as u64);

    image.close().unwrap();
    image.remove().unwrap();
}
