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

//! LUKS encryption of image data.

use std::fmt;
use std::mem;

use libc::{c_char, c_void, size_t};

use crate::error::{check, RbdError, RbdResult};
use crate::image::Image;
use crate::rbd::*;

const RBD_ENCRYPTION_FORMAT_LUKS1: rbd_encryption_format_t = 0;
const RBD_ENCRYPTION_FORMAT_LUKS2: rbd_encryption_format_t = 1;
const RBD_ENCRYPTION_FORMAT_LUKS: rbd_encryption_format_t = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    Aes128,
    Aes256,
}

impl EncryptionAlgorithm {
    fn to_raw(self) -> rbd_encryption_algorithm_t {
        match self {
            EncryptionAlgorithm::Aes128 => 0,
            EncryptionAlgorithm::Aes256 => 1,
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            EncryptionAlgorithm::Aes128 => "aes-128",
            EncryptionAlgorithm::Aes256 => "aes-256",
        })
    }
}

/// What to format an image with, or how to unlock it. The passphrase is
/// only borrowed for the duration of the call.
#[derive(Clone, Copy)]
pub enum EncryptionOptions<'p> {
    Luks1 { alg: EncryptionAlgorithm, passphrase: &'p [u8] },
    Luks2 { alg: EncryptionAlgorithm, passphrase: &'p [u8] },
    /// Either LUKS version. Only valid for `encryption_load`.
    Luks { passphrase: &'p [u8] },
}

impl fmt::Debug for EncryptionOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncryptionOptions::Luks1 { alg, .. } => f.debug_struct("Luks1").field("alg", &alg).finish(),
            EncryptionOptions::Luks2 { alg, .. } => f.debug_struct("Luks2").field("alg", &alg).finish(),
            EncryptionOptions::Luks { .. } => f.debug_struct("Luks").finish(),
        }
    }
}

/// The native option struct for one call, built on the stack.
enum RawOptions {
    Luks1(rbd_encryption_luks1_format_options_t),
    Luks2(rbd_encryption_luks2_format_options_t),
    Luks(rbd_encryption_luks_format_options_t),
}

impl RawOptions {
    fn new(opts: &EncryptionOptions) -> RawOptions {
        match *opts {
            EncryptionOptions::Luks1 { alg, passphrase } => RawOptions::Luks1(rbd_encryption_luks1_format_options_t {
                alg: alg.to_raw(),
                passphrase: passphrase.as_ptr() as *const c_char,
                passphrase_size: passphrase.len(),
            }),
            EncryptionOptions::Luks2 { alg, passphrase } => RawOptions::Luks2(rbd_encryption_luks2_format_options_t {
                alg: alg.to_raw(),
                passphrase: passphrase.as_ptr() as *const c_char,
                passphrase_size: passphrase.len(),
            }),
            EncryptionOptions::Luks { passphrase } => RawOptions::Luks(rbd_encryption_luks_format_options_t {
                passphrase: passphrase.as_ptr() as *const c_char,
                passphrase_size: passphrase.len(),
            }),
        }
    }

    /// Format tag, option pointer and option size for librbd.
    fn parts(&mut self) -> (rbd_encryption_format_t, rbd_encryption_options_t, size_t) {
        match *self {
            RawOptions::Luks1(ref mut o) => (
                RBD_ENCRYPTION_FORMAT_LUKS1,
                o as *mut _ as *mut c_void,
                mem::size_of::<rbd_encryption_luks1_format_options_t>(),
            ),
            RawOptions::Luks2(ref mut o) => (
                RBD_ENCRYPTION_FORMAT_LUKS2,
                o as *mut _ as *mut c_void,
                mem::size_of::<rbd_encryption_luks2_format_options_t>(),
            ),
            RawOptions::Luks(ref mut o) => (
                RBD_ENCRYPTION_FORMAT_LUKS,
                o as *mut _ as *mut c_void,
                mem::size_of::<rbd_encryption_luks_format_options_t>(),
            ),
        }
    }
}

impl Image<'_> {
    /// Write a LUKS header to the image. Existing data becomes unreadable.
    pub fn encryption_format(&self, opts: &EncryptionOptions) -> RbdResult<()> {
        let handle = self.handle()?;
        if let EncryptionOptions::Luks { .. } = *opts {
            return Err(RbdError::InvalidArgument);
        }
        let mut raw = RawOptions::new(opts);
        let (format, ptr, size) = raw.parts();
        trace!("formatting {} for encryption", self.name());
        check(unsafe { rbd_encryption_format(handle, format, ptr, size) })
    }

    /// Enable encrypted I/O through this open handle.
    pub fn encryption_load(&self, opts: &EncryptionOptions) -> RbdResult<()> {
        let handle = self.handle()?;
        let mut raw = RawOptions::new(opts);
        let (format, ptr, size) = raw.parts();
        check(unsafe { rbd_encryption_load(handle, format, ptr, size) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::with_fake_open;

    #[test]
    fn format_rejects_generic_luks() {
        with_fake_open("img", true, |image| {
            let opts = EncryptionOptions::Luks { passphrase: b"secret" };
            assert!(matches!(image.encryption_format(&opts), Err(RbdError::InvalidArgument)));
        });
    }

    #[test]
    fn raw_options_carry_format_tags() {
        let pass = b"pw".to_vec();
        let mut raw = RawOptions::new(&EncryptionOptions::Luks2 {
            alg: EncryptionAlgorithm::Aes256,
            passphrase: &pass,
        });
        let (format, ptr, size) = raw.parts();
        assert_eq!(format, RBD_ENCRYPTION_FORMAT_LUKS2);
        assert!(!ptr.is_null());
        assert_eq!(size, mem::size_of::<rbd_encryption_luks2_format_options_t>());
        let mut raw = RawOptions::new(&EncryptionOptions::Luks { passphrase: &pass });
        assert_eq!(raw.parts().0, RBD_ENCRYPTION_FORMAT_LUKS);
    }

    #[test]
    fn debug_hides_passphrase() {
        let opts = EncryptionOptions::Luks1 {
            alg: EncryptionAlgorithm::Aes128,
            passphrase: b"hunter2",
        };
        assert!(!format!("{:?}", opts).contains("hunter2"));
    }
}
