// Copyright 2016 LambdaStack All rights reserved.
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

//! Ceph-rbd is a safe layer over the librbd C interface, the client library
//! for RADOS Block Device images.
//!
//! Only works on Linux.
//! The documentation for librbd can be found:
//! https://docs.ceph.com/en/latest/rbd/api/librbdpy/
//!
//! librbd and librados have to be installed, with the development symlinks
//! (`librbd.so`, `librados.so`) in the linker search path. Entry points
//! added in newer Ceph releases are looked up when first used, so a crate
//! built against an older library still loads and reports
//! `RbdError::NotImplemented` for what is missing.
//!
//! ```no_run
//! use ceph_rbd::ceph::{IoCtx, Rados};
//! use ceph_rbd::image::Image;
//!
//! # fn main() -> ceph_rbd::error::RbdResult<()> {
//! let rados = Rados::connect("admin", "/etc/ceph/ceph.conf")?;
//! let ioctx = IoCtx::create(&rados, "rbd")?;
//! Image::create(&ioctx, "disk0", 1 << 30, 22)?;
//! let mut image = Image::open(&ioctx, "disk0", None)?;
//! image.write_at(b"hello", 0)?;
//! image.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Closures handed to progress, diff and watch operations never cross into
//! C. They are kept in a process wide registry and librbd only sees an
//! integer token.

#[macro_use]
extern crate bitflags;
extern crate libc;
#[macro_use]
extern crate tracing;
extern crate scopeguard;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate uuid;

#[macro_use]
mod dlsym;

mod callbacks;
mod helpers;
mod retry;

pub mod ceph;
pub mod clone;
pub mod diff_iterate;
pub mod encryption;
pub mod error;
pub mod features;
pub mod group;
pub mod group_snap;
pub mod image;
pub mod locks;
pub mod metadata;
pub mod migration;
pub mod mirror;
pub mod mirror_desc_status;
#[cfg(feature = "preview")]
pub mod mirror_group;
pub mod mirror_peer_site;
pub mod namespace;
pub mod options;
pub mod pool;
pub mod rados;
pub mod rbd;
pub mod resize;
pub mod snapshot;
pub mod sparsify;
pub mod trash;
pub mod watchers;

pub use crate::ceph::{ClusterHandle, IoContext, IoCtx, Rados};
pub use crate::error::{RbdError, RbdResult};
pub use crate::features::{FeatureSet, ImageFeatures};
pub use crate::helpers::Timespec;
pub use crate::image::{get_image, list_images, remove_image, Image, ImageInfo};
pub use crate::options::{ImageOption, ImageOptions};
