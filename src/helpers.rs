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

//! Conversions between librbd's C strings and buffers and owned Rust values.

use std::ffi::{CStr, CString};
use std::ptr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use libc::{c_char, time_t, timespec};

use crate::error::RbdResult;

/// A point in time as librbd reports it (`struct timespec`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timespec {
    pub sec: i64,
    pub nsec: i64,
}

impl From<timespec> for Timespec {
    fn from(ts: timespec) -> Timespec {
        Timespec {
            sec: ts.tv_sec as i64,
            nsec: ts.tv_nsec as i64,
        }
    }
}

impl From<Timespec> for SystemTime {
    fn from(ts: Timespec) -> SystemTime {
        let nanos = Duration::from_nanos(ts.nsec.max(0) as u64);
        if ts.sec >= 0 {
            UNIX_EPOCH + Duration::from_secs(ts.sec as u64) + nanos
        } else {
            UNIX_EPOCH - Duration::from_secs(ts.sec.unsigned_abs()) + nanos
        }
    }
}

pub(crate) fn zeroed_timespec() -> timespec {
    timespec { tv_sec: 0, tv_nsec: 0 }
}

/// Seconds since the epoch, as stored in the trash and mirror status structs.
pub(crate) fn time_from_secs(t: time_t) -> SystemTime {
    SystemTime::from(Timespec {
        sec: t as i64,
        nsec: 0,
    })
}

/// Copy a C string that librbd owns. A null pointer reads as "".
pub(crate) fn c_string(p: *const c_char) -> String {
    if p.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(p).to_string_lossy().into_owned() }
}

/// Read the NUL terminated prefix of a buffer that librbd filled in.
pub(crate) fn buf_to_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

pub(crate) fn to_cstring(s: &str) -> RbdResult<CString> {
    Ok(CString::new(s)?)
}

/// Holds an optional C string so that `None` can be passed to librbd as a
/// null pointer. That is distinct from passing "".
pub(crate) struct OptionalCString(Option<CString>);

impl OptionalCString {
    pub(crate) fn new(s: Option<&str>) -> RbdResult<OptionalCString> {
        match s {
            Some(s) => Ok(OptionalCString(Some(CString::new(s)?))),
            None => Ok(OptionalCString(None)),
        }
    }

    pub(crate) fn as_ptr(&self) -> *const c_char {
        match self.0 {
            Some(ref s) => s.as_ptr(),
            None => ptr::null(),
        }
    }
}

/// Split a buffer of NUL terminated strings. The list ends at the first
/// empty string, so trailing padding is dropped.
pub(crate) fn split_buffer(buf: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    for part in buf.split(|b| *b == 0) {
        if part.is_empty() {
            break;
        }
        out.push(String::from_utf8_lossy(part).into_owned());
    }
    out
}

/// Like `split_buffer` but keeps going past empty strings, dropping them.
/// Used where librbd packs several lists into fixed size fields.
pub(crate) fn split_sparse_buffer(buf: &[u8]) -> Vec<String> {
    buf.split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

/// Pack strings back to back, each NUL terminated, as librbd expects for
/// key/value lists.
pub(crate) fn join_nul_terminated<'a, I>(items: I) -> RbdResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buf = Vec::new();
    for item in items {
        let c = CString::new(item)?;
        buf.extend_from_slice(c.as_bytes_with_nul());
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_stops_at_empty_entry() {
        let buf = b"one\0two\0\0three\0";
        assert_eq!(split_buffer(buf), vec!["one", "two"]);
    }

    #[test]
    fn sparse_split_skips_empty_entries() {
        let buf = b"one\0\0two\0\0\0three\0\0";
        assert_eq!(split_sparse_buffer(buf), vec!["one", "two", "three"]);
    }

    #[test]
    fn split_empty() {
        assert!(split_buffer(b"").is_empty());
        assert!(split_buffer(b"\0\0").is_empty());
        assert!(split_sparse_buffer(b"\0\0").is_empty());
    }

    #[test]
    fn join_then_split() {
        let packed = join_nul_terminated(vec!["k1", "key2"]).unwrap();
        assert_eq!(packed, b"k1\0key2\0".to_vec());
        assert_eq!(split_buffer(&packed), vec!["k1", "key2"]);
    }

    #[test]
    fn join_rejects_interior_nul() {
        assert!(join_nul_terminated(vec!["a\0b"]).is_err());
    }

    #[test]
    fn buffer_prefix() {
        assert_eq!(buf_to_string(b"abc\0def"), "abc");
        assert_eq!(buf_to_string(b"abc"), "abc");
    }

    #[test]
    fn null_c_string_is_empty() {
        assert_eq!(c_string(ptr::null()), "");
    }

    #[test]
    fn optional_cstring_none_is_null() {
        let none = OptionalCString::new(None).unwrap();
        assert!(none.as_ptr().is_null());
        let empty = OptionalCString::new(Some("")).unwrap();
        assert!(!empty.as_ptr().is_null());
    }

    #[test]
    fn timespec_to_system_time() {
        let t: SystemTime = Timespec { sec: 10, nsec: 5 }.into();
        assert_eq!(t.duration_since(UNIX_EPOCH).unwrap(), Duration::new(10, 5));
    }
}
