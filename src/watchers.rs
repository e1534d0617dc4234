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

//! Image watchers and header update notifications.

use std::fmt;
use std::sync::Arc;

use libc::{c_void, size_t};

use crate::callbacks::{Callback, Callbacks};
use crate::error::{check, RbdResult};
use crate::helpers::c_string;
use crate::image::Image;
use crate::rbd::*;
use crate::retry::{resize_on_range, retry_sized};

type UpdateFn = dyn FnMut() + Send + 'static;

static WATCH_CALLBACKS: Callbacks<Arc<Callback<UpdateFn>>> = Callbacks::new();

extern "C" fn update_notify(arg: *mut c_void) {
    let cb = WATCH_CALLBACKS.lookup(arg as usize);
    cb.invoke((), |f| f());
}

/// A client that has the image open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageWatcher {
    pub addr: String,
    pub id: i64,
    pub cookie: u64,
}

/// A registered update callback. It stays registered until `unwatch` is
/// called or the value is dropped.
pub struct Watch<'i, 'a> {
    image: &'i Image<'a>,
    handle: u64,
    token: usize,
    callback: Arc<Callback<UpdateFn>>,
    active: bool,
}

impl<'i, 'a> Watch<'i, 'a> {
    pub fn image(&self) -> &'i Image<'a> {
        self.image
    }

    /// Stop notifications. The callback is released even when librbd
    /// reports an error.
    pub fn unwatch(mut self) -> RbdResult<()> {
        self.release()
    }

    fn release(&mut self) -> RbdResult<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let ret = match self.image.handle() {
            Ok(handle) => check(unsafe { rbd_update_unwatch(handle, self.handle) }),
            Err(e) => Err(e),
        };
        WATCH_CALLBACKS.remove(self.token);
        debug!("update watch {} removed", self.handle);
        // a panic parked by a notification that arrived while unwatching
        self.callback.resume_panic();
        ret
    }
}

impl Drop for Watch<'_, '_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            error!("unwatch of {} failed: {}", self.handle, e);
        }
    }
}

impl fmt::Debug for Watch<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Watch")
            .field("image", &self.image.name())
            .field("handle", &self.handle)
            .field("active", &self.active)
            .finish()
    }
}

impl<'a> Image<'a> {
    pub fn list_watchers(&self) -> RbdResult<Vec<ImageWatcher>> {
        let handle = self.handle()?;
        retry_sized(16, 4096, |size| {
            let mut count: size_t = size;
            let mut watchers = vec![rbd_image_watcher_t::default(); size];
            let ret = unsafe { rbd_watchers_list(handle, watchers.as_mut_ptr(), &mut count) };
            let result = check(ret).map(|_| {
                let list = watchers[..count]
                    .iter()
                    .map(|w| ImageWatcher {
                        addr: c_string(w.addr),
                        id: w.id,
                        cookie: w.cookie,
                    })
                    .collect();
                unsafe {
                    rbd_watchers_list_cleanup(watchers.as_mut_ptr(), count);
                }
                list
            });
            resize_on_range(result, count)
        })
    }

    /// Call `callback` whenever the image header changes, e.g. on resize
    /// or snapshot creation by another client.
    pub fn update_watch<F>(&self, callback: F) -> RbdResult<Watch<'_, 'a>>
    where
        F: FnMut() + Send + 'static,
    {
        let image = self.handle()?;
        let cb = Callback::new(Box::new(callback) as Box<UpdateFn>);
        let token = WATCH_CALLBACKS.add(cb.clone());
        let mut handle: u64 = 0;
        let ret = unsafe { rbd_update_watch(image, &mut handle, Some(update_notify), token as *mut c_void) };
        if let Err(e) = check(ret) {
            WATCH_CALLBACKS.remove(token);
            return Err(e);
        }
        debug!("update watch {} registered on {}", handle, self.name());
        Ok(Watch {
            image: self,
            handle,
            token,
            callback: cb,
            active: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RbdError;
    use crate::image::tests::fake;

    #[test]
    fn watch_needs_open_image() {
        let image = Image::new(fake(true), "img");
        assert!(matches!(image.update_watch(|| {}), Err(RbdError::ImageNotOpen)));
        assert!(matches!(image.list_watchers(), Err(RbdError::ImageNotOpen)));
    }

    #[test]
    fn notify_shim_runs_closure() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = hits.clone();
        let cb = Callback::new(Box::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }) as Box<UpdateFn>);
        let guard = WATCH_CALLBACKS.register(cb);
        update_notify(guard.as_arg());
        update_notify(guard.as_arg());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
