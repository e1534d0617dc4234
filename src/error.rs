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

use std::error::Error as StdError;
use std::ffi::NulError;
use std::io;
use std::str::Utf8Error;
use std::string::FromUtf8Error;
use std::fmt;

use libc::{c_char, c_int, strerror_r, EEXIST, EINVAL, ENOENT, ENOSYS, EPERM, ERANGE};
use serde_json::error::Error as SerdeJsonError;

/// Raised when an optional librbd entry point can not be found in the
/// loaded library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolError {
    pub symbol: String,
    pub message: String,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unable to resolve {}: {}", self.symbol, self.message)
    }
}

impl StdError for SymbolError {}

/// Custom error handling for the library
#[derive(Debug)]
pub enum RbdError {
    NotFound,
    AlreadyExists,
    /// The running librbd lacks the requested capability.
    NotImplemented(Option<SymbolError>),
    InvalidArgument,
    PermissionDenied,
    NoName,
    NoIOContext,
    NoNamespaceName,
    ImageNotOpen,
    ImageIsOpen,
    SnapshotNoName,
    /// The output buffer handed to librbd was too small. Consumed by the
    /// retry loops, callers should never see it.
    #[doc(hidden)]
    RangeTooSmall,
    /// Any other librbd return code together with its strerror message.
    Code { code: i32, message: String },
    Error(String),
    FromUtf8Error(FromUtf8Error),
    Utf8Error(Utf8Error),
    NulError(NulError),
    IoError(io::Error),
    SerdeError(SerdeJsonError),
    ParseError(uuid::Error),
}

pub type RbdResult<T> = Result<T, RbdError>;

impl fmt::Display for RbdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RbdError::NotFound => f.write_str("RBD image not found"),
            RbdError::AlreadyExists => f.write_str("RBD object already exists"),
            RbdError::NotImplemented(None) => f.write_str("RBD function not implemented"),
            RbdError::NotImplemented(Some(ref e)) => write!(f, "RBD function not implemented: {}", e),
            RbdError::InvalidArgument => f.write_str("RBD invalid argument"),
            RbdError::PermissionDenied => f.write_str("RBD operation not permitted"),
            RbdError::NoName => f.write_str("RBD image does not have a name"),
            RbdError::NoIOContext => f.write_str("RBD image does not have an IOContext"),
            RbdError::NoNamespaceName => f.write_str("Namespace value is missing"),
            RbdError::ImageNotOpen => f.write_str("RBD image not open"),
            RbdError::ImageIsOpen => f.write_str("RBD image is open"),
            RbdError::SnapshotNoName => f.write_str("RBD snapshot does not have a name"),
            RbdError::RangeTooSmall => f.write_str("RBD output buffer too small"),
            RbdError::Code { code, ref message } => write!(f, "rbd: ret={}, {}", code, message),
            RbdError::Error(ref e) => f.write_str(e),
            RbdError::FromUtf8Error(ref e) => e.fmt(f),
            RbdError::Utf8Error(ref e) => e.fmt(f),
            RbdError::NulError(ref e) => e.fmt(f),
            RbdError::IoError(ref e) => e.fmt(f),
            RbdError::SerdeError(ref e) => e.fmt(f),
            RbdError::ParseError(ref e) => e.fmt(f),
        }
    }
}

impl StdError for RbdError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            RbdError::NotImplemented(Some(ref e)) => Some(e),
            RbdError::FromUtf8Error(ref e) => Some(e),
            RbdError::Utf8Error(ref e) => Some(e),
            RbdError::NulError(ref e) => Some(e),
            RbdError::IoError(ref e) => Some(e),
            RbdError::SerdeError(ref e) => Some(e),
            RbdError::ParseError(ref e) => Some(e),
            _ => None,
        }
    }
}

impl RbdError {
    /// Create a new RbdError with a String message
    pub fn new(err: String) -> RbdError {
        RbdError::Error(err)
    }

    /// Translate a librbd return code. Negative errno values that have a
    /// dedicated variant map to it, everything else keeps the raw code.
    pub fn from_code(code: i32) -> RbdError {
        match code.wrapping_neg() {
            ENOENT => RbdError::NotFound,
            EEXIST => RbdError::AlreadyExists,
            ENOSYS => RbdError::NotImplemented(None),
            ERANGE => RbdError::RangeTooSmall,
            EINVAL => RbdError::InvalidArgument,
            EPERM => RbdError::PermissionDenied,
            _ => RbdError::Code {
                code,
                message: get_error(code),
            },
        }
    }

    /// The errno-style code behind this error, when there is one.
    pub fn code(&self) -> Option<i32> {
        match *self {
            RbdError::NotFound => Some(-ENOENT),
            RbdError::AlreadyExists => Some(-EEXIST),
            RbdError::NotImplemented(_) => Some(-ENOSYS),
            RbdError::RangeTooSmall => Some(-ERANGE),
            RbdError::InvalidArgument => Some(-EINVAL),
            RbdError::PermissionDenied => Some(-EPERM),
            RbdError::Code { code, .. } => Some(code),
            RbdError::IoError(ref e) => e.raw_os_error().map(|n| -n),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match *self {
            RbdError::NotFound => true,
            _ => false,
        }
    }
}

/// Look up the system message for an errno. The sign of `n` is ignored.
pub(crate) fn get_error(n: c_int) -> String {
    let mut buf = vec![0u8; 256];
    unsafe {
        strerror_r(n.wrapping_abs(), buf.as_mut_ptr() as *mut c_char, buf.len());
    }
    let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Zero is success, any other value is an error.
pub(crate) fn check(code: c_int) -> RbdResult<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(RbdError::from_code(code))
    }
}

/// For calls that return a count on success: only negative values are errors.
pub(crate) fn check_if_negative<T>(code: T) -> RbdResult<T>
where
    T: Copy + PartialOrd + Default + Into<i64>,
{
    if code < T::default() {
        Err(RbdError::from_code(code.into() as i32))
    } else {
        Ok(code)
    }
}

impl From<NulError> for RbdError {
    fn from(err: NulError) -> RbdError {
        RbdError::NulError(err)
    }
}

impl From<FromUtf8Error> for RbdError {
    fn from(err: FromUtf8Error) -> RbdError {
        RbdError::FromUtf8Error(err)
    }
}

impl From<Utf8Error> for RbdError {
    fn from(err: Utf8Error) -> RbdError {
        RbdError::Utf8Error(err)
    }
}

impl From<io::Error> for RbdError {
    fn from(err: io::Error) -> RbdError {
        RbdError::IoError(err)
    }
}

impl From<SerdeJsonError> for RbdError {
    fn from(err: SerdeJsonError) -> RbdError {
        RbdError::SerdeError(err)
    }
}

impl From<uuid::Error> for RbdError {
    fn from(err: uuid::Error) -> RbdError {
        RbdError::ParseError(err)
    }
}

impl From<RbdError> for io::Error {
    fn from(err: RbdError) -> io::Error {
        match err {
            RbdError::IoError(e) => e,
            RbdError::NotFound => io::Error::new(io::ErrorKind::NotFound, err),
            RbdError::AlreadyExists => io::Error::new(io::ErrorKind::AlreadyExists, err),
            RbdError::PermissionDenied => io::Error::new(io::ErrorKind::PermissionDenied, err),
            RbdError::InvalidArgument => io::Error::new(io::ErrorKind::InvalidInput, err),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_success() {
        assert!(check(0).is_ok());
    }

    #[test]
    fn dedicated_variants() {
        assert!(matches!(check(-ENOENT), Err(RbdError::NotFound)));
        assert!(matches!(check(-EEXIST), Err(RbdError::AlreadyExists)));
        assert!(matches!(check(-ENOSYS), Err(RbdError::NotImplemented(None))));
        assert!(matches!(check(-ERANGE), Err(RbdError::RangeTooSmall)));
        assert!(matches!(check(-EINVAL), Err(RbdError::InvalidArgument)));
        assert!(matches!(check(-EPERM), Err(RbdError::PermissionDenied)));
    }

    #[test]
    fn unclassified_code_keeps_number_and_message() {
        match check(-42) {
            Err(RbdError::Code { code, message }) => {
                assert_eq!(code, -42);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn positive_code_is_an_error() {
        let err = check(7).unwrap_err();
        assert_eq!(err.code(), Some(7));
    }

    #[test]
    fn only_negative_counts_fail() {
        assert_eq!(check_if_negative(12i64).unwrap(), 12);
        assert_eq!(check_if_negative(0i32).unwrap(), 0);
        assert!(matches!(check_if_negative(-ENOENT), Err(RbdError::NotFound)));
        assert!(matches!(check_if_negative(-5i64), Err(RbdError::Code { code: -5, .. })));
    }

    #[test]
    fn code_of_classified_errors() {
        assert_eq!(RbdError::NotFound.code(), Some(-ENOENT));
        assert_eq!(RbdError::NoName.code(), None);
    }

    #[test]
    fn not_implemented_chains_symbol_error() {
        let err = RbdError::NotImplemented(Some(SymbolError {
            symbol: "rbd_clone4".to_string(),
            message: "undefined symbol".to_string(),
        }));
        let source = err.source().expect("chained error");
        assert!(source.to_string().contains("rbd_clone4"));
    }

    #[test]
    fn message_has_no_trailing_nul() {
        let msg = get_error(-libc::EIO);
        assert!(!msg.contains('\0'));
        assert!(!msg.is_empty());
    }
}
