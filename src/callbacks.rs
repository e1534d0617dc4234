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

//! Token based registry for closures that librbd calls back into.
//!
//! librbd only hands a `void *` back to a callback. Instead of pointing it
//! at Rust memory, the closure is stored here and the `void *` carries an
//! integer token. The `extern "C"` shim looks the token up and dispatches.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use libc::{c_int, c_void, ECANCELED};

/// A process wide map from token to callback.
pub struct Callbacks<T> {
    entries: Mutex<BTreeMap<usize, T>>,
    next: AtomicUsize,
}

impl<T> Callbacks<T> {
    pub const fn new() -> Callbacks<T> {
        Callbacks {
            entries: Mutex::new(BTreeMap::new()),
            next: AtomicUsize::new(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<usize, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` and return its token. Tokens are never zero and never
    /// handed out twice.
    pub fn add(&self, value: T) -> usize {
        let token = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries().insert(token, value);
        token
    }

    /// Drop the entry for `token`.
    ///
    /// # Panics
    ///
    /// If the token is not registered.
    pub fn remove(&self, token: usize) {
        if self.entries().remove(&token).is_none() {
            panic!("callback token {} is not registered", token);
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Register `value` for the lifetime of the returned guard.
    pub fn register(&self, value: T) -> CallbackGuard<'_, T> {
        CallbackGuard {
            token: self.add(value),
            registry: self,
        }
    }
}

impl<T: Clone> Callbacks<T> {
    /// # Panics
    ///
    /// If the token is not registered.
    pub fn lookup(&self, token: usize) -> T {
        match self.entries().get(&token) {
            Some(value) => value.clone(),
            None => panic!("callback token {} is not registered", token),
        }
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Callbacks::new()
    }
}

/// Removes its token from the registry when dropped, including on early
/// returns and unwinding.
pub struct CallbackGuard<'r, T> {
    token: usize,
    registry: &'r Callbacks<T>,
}

impl<T> CallbackGuard<'_, T> {
    pub fn token(&self) -> usize {
        self.token
    }

    /// The token in the form librbd passes back to the shim.
    pub(crate) fn as_arg(&self) -> *mut c_void {
        self.token as *mut c_void
    }
}

impl<T> Drop for CallbackGuard<'_, T> {
    fn drop(&mut self) {
        self.registry.remove(self.token);
    }
}

/// A user closure plus room for a panic it raised while librbd was on the
/// stack. Unwinding through C is not allowed, so the panic is parked here
/// and resumed after the native call returns.
pub(crate) struct Callback<F: ?Sized> {
    panic: Mutex<Option<Box<dyn Any + Send + 'static>>>,
    func: Mutex<Box<F>>,
}

pub(crate) type ProgressFn = dyn FnMut(u64, u64) -> i32 + Send + 'static;
pub(crate) type ProgressCallbacks = Callbacks<Arc<Callback<ProgressFn>>>;

impl<F: ?Sized> Callback<F> {
    pub(crate) fn new(func: Box<F>) -> Arc<Callback<F>> {
        Arc::new(Callback {
            panic: Mutex::new(None),
            func: Mutex::new(func),
        })
    }

    /// Run the closure. A panic is caught and stored, and `aborted` is
    /// returned to librbd instead.
    pub(crate) fn invoke<R, C>(&self, aborted: R, call: C) -> R
    where
        C: FnOnce(&mut F) -> R,
    {
        let mut func = self.func.lock().unwrap_or_else(PoisonError::into_inner);
        match panic::catch_unwind(AssertUnwindSafe(|| call(&mut **func))) {
            Ok(r) => r,
            Err(payload) => {
                error!("callback panicked while librbd was waiting on it");
                let mut slot = self.panic.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(payload);
                }
                aborted
            }
        }
    }

    /// Re-raise a panic caught during `invoke`.
    pub(crate) fn resume_panic(&self) {
        let payload = self.panic.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(payload) = payload {
            panic::resume_unwind(payload);
        }
    }
}

/// Body of every `librbd_progress_fn_t` shim: find the closure behind the
/// token and call it. A panic aborts the native operation.
pub(crate) fn dispatch_progress(registry: &ProgressCallbacks, offset: u64, total: u64, arg: *mut c_void) -> c_int {
    let cb = registry.lookup(arg as usize);
    cb.invoke(-ECANCELED, |f| f(offset, total))
}

/// Box a progress closure and run `call` with it registered in `registry`.
/// The token is gone again by the time this returns, whichever way `call`
/// exits.
pub(crate) fn with_progress<F, R>(registry: &ProgressCallbacks, callback: F, call: R) -> c_int
where
    F: FnMut(u64, u64) -> i32 + Send + 'static,
    R: FnOnce(*mut c_void) -> c_int,
{
    let cb = Callback::new(Box::new(callback) as Box<ProgressFn>);
    let ret = {
        let guard = registry.register(cb.clone());
        call(guard.as_arg())
    };
    cb.resume_panic();
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::thread;

    #[test]
    fn tokens_are_nonzero_and_unique() {
        let registry: Callbacks<u32> = Callbacks::new();
        let a = registry.add(1);
        let b = registry.add(2);
        assert_ne!(a, 0);
        assert_ne!(a, b);
        assert_eq!(registry.lookup(a), 1);
        assert_eq!(registry.lookup(b), 2);
        registry.remove(a);
        registry.remove(b);
        assert!(registry.is_empty());
    }

    #[test]
    fn tokens_are_not_reused() {
        let registry: Callbacks<()> = Callbacks::new();
        let first = registry.add(());
        registry.remove(first);
        let second = registry.add(());
        assert!(second > first);
        registry.remove(second);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn lookup_of_unknown_token_panics() {
        let registry: Callbacks<u32> = Callbacks::new();
        registry.lookup(42);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn double_remove_panics() {
        let registry: Callbacks<u32> = Callbacks::new();
        let t = registry.add(5);
        registry.remove(t);
        registry.remove(t);
    }

    #[test]
    fn guard_unregisters_on_drop() {
        let registry: Callbacks<u32> = Callbacks::new();
        {
            let guard = registry.register(9);
            assert_eq!(registry.lookup(guard.token()), 9);
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn guard_unregisters_on_unwind() {
        let registry: Callbacks<u32> = Callbacks::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = registry.register(1);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_registrations_do_not_mix() {
        static REGISTRY: Callbacks<Arc<AtomicU64>> = Callbacks::new();
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                thread::spawn(move || {
                    for _ in 0..100 {
                        let value = Arc::new(AtomicU64::new(i));
                        let guard = REGISTRY.register(value);
                        assert_eq!(REGISTRY.lookup(guard.token()).load(Ordering::SeqCst), i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(REGISTRY.is_empty());
    }

    #[test]
    fn progress_dispatch_reaches_closure() {
        let registry = ProgressCallbacks::new();
        let seen = Arc::new(AtomicU64::new(0));
        let inner = seen.clone();
        let ret = with_progress(
            &registry,
            move |offset, total| {
                inner.store(offset * 100 + total, Ordering::SeqCst);
                0
            },
            |arg| dispatch_progress(&registry, 3, 4, arg),
        );
        assert_eq!(ret, 0);
        assert_eq!(seen.load(Ordering::SeqCst), 304);
        assert!(registry.is_empty());
    }

    #[test]
    fn panicking_callback_aborts_then_resumes() {
        let registry = ProgressCallbacks::new();
        let mut native_ret = 0;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            with_progress(
                &registry,
                |_, _| panic!("callback failed"),
                |arg| {
                    native_ret = dispatch_progress(&registry, 0, 1, arg);
                    native_ret
                },
            )
        }));
        assert!(result.is_err());
        assert_eq!(native_ret, -ECANCELED);
        assert!(registry.is_empty());
    }
}
