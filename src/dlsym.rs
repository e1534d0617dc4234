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

//! Run time lookup of librbd entry points that older releases do not have.

use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use libc::{c_void, dlerror, dlsym, RTLD_DEFAULT};

use crate::error::{RbdError, RbdResult, SymbolError};

/// Find `name` among the symbols already loaded into the process.
pub(crate) fn lookup_symbol(name: &str) -> Result<*mut c_void, SymbolError> {
    let c_name = CString::new(name).map_err(|e| SymbolError {
        symbol: name.to_string(),
        message: e.to_string(),
    })?;
    unsafe {
        // clear any stale error first
        dlerror();
        let sym = dlsym(RTLD_DEFAULT, c_name.as_ptr());
        if sym.is_null() {
            let err = dlerror();
            let message = if err.is_null() {
                "symbol resolved to null".to_string()
            } else {
                CStr::from_ptr(err).to_string_lossy().into_owned()
            };
            return Err(SymbolError {
                symbol: name.to_string(),
                message,
            });
        }
        Ok(sym)
    }
}

/// A symbol that is looked up once, on first use. Both a found address and
/// a failure are cached.
pub(crate) struct LazySymbol {
    name: &'static str,
    resolved: OnceLock<Result<usize, SymbolError>>,
    attempts: AtomicUsize,
}

impl LazySymbol {
    pub(crate) const fn new(name: &'static str) -> LazySymbol {
        LazySymbol {
            name,
            resolved: OnceLock::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// The symbol's address, or `NotImplemented` carrying the lookup error.
    pub(crate) fn get(&self) -> RbdResult<*mut c_void> {
        let resolved = self.resolved.get_or_init(|| {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            match lookup_symbol(self.name) {
                Ok(sym) => {
                    debug!("resolved {}", self.name);
                    Ok(sym as usize)
                }
                Err(e) => {
                    debug!("{}", e);
                    Err(e)
                }
            }
        });
        match *resolved {
            Ok(addr) => Ok(addr as *mut c_void),
            Err(ref e) => Err(RbdError::NotImplemented(Some(e.clone()))),
        }
    }

    /// How many times a lookup was actually attempted.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

/// Resolve `$sym` and reinterpret it as the function pointer type `$ty`.
macro_rules! resolve_fn {
    ($sym:expr, $ty:ty) => {
        match $sym.get() {
            Ok(addr) => unsafe { ::std::mem::transmute::<*mut ::libc::c_void, $ty>(addr) },
            Err(e) => return Err(e),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_symbol_is_not_implemented() {
        let err = lookup_symbol("rbd_no_such_entry_point_for_tests").unwrap_err();
        assert_eq!(err.symbol, "rbd_no_such_entry_point_for_tests");
        assert!(!err.message.is_empty());
    }

    #[test]
    fn libc_symbol_resolves() {
        assert!(lookup_symbol("strlen").is_ok());
    }

    #[test]
    fn failure_is_cached() {
        static MISSING: LazySymbol = LazySymbol::new("rbd_no_such_entry_point_cached");
        for _ in 0..3 {
            match MISSING.get() {
                Err(RbdError::NotImplemented(Some(e))) => {
                    assert_eq!(e.symbol, "rbd_no_such_entry_point_cached")
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(MISSING.attempts(), 1);
    }

    #[test]
    fn success_is_cached() {
        static STRLEN: LazySymbol = LazySymbol::new("strlen");
        let first = STRLEN.get().unwrap();
        let second = STRLEN.get().unwrap();
        assert_eq!(first, second);
        assert_eq!(STRLEN.attempts(), 1);
    }
}
