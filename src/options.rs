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

use std::fmt;
use std::ptr;

use libc::{c_char, c_int};

use crate::error::{check, RbdError, RbdResult};
use crate::helpers::{buf_to_string, to_cstring};
use crate::rbd::*;

/// Keys understood by an `ImageOptions` bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageOption {
    Format,
    Features,
    Order,
    StripeUnit,
    StripeCount,
    JournalOrder,
    JournalSplayWidth,
    JournalPool,
    FeaturesSet,
    FeaturesClear,
    DataPool,
    Flatten,
    CloneFormat,
    MirrorImageMode,
}

/// The value type librbd stores for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Uint64,
}

impl ImageOption {
    pub fn code(self) -> c_int {
        match self {
            ImageOption::Format => RBD_IMAGE_OPTION_FORMAT,
            ImageOption::Features => RBD_IMAGE_OPTION_FEATURES,
            ImageOption::Order => RBD_IMAGE_OPTION_ORDER,
            ImageOption::StripeUnit => RBD_IMAGE_OPTION_STRIPE_UNIT,
            ImageOption::StripeCount => RBD_IMAGE_OPTION_STRIPE_COUNT,
            ImageOption::JournalOrder => RBD_IMAGE_OPTION_JOURNAL_ORDER,
            ImageOption::JournalSplayWidth => RBD_IMAGE_OPTION_JOURNAL_SPLAY_WIDTH,
            ImageOption::JournalPool => RBD_IMAGE_OPTION_JOURNAL_POOL,
            ImageOption::FeaturesSet => RBD_IMAGE_OPTION_FEATURES_SET,
            ImageOption::FeaturesClear => RBD_IMAGE_OPTION_FEATURES_CLEAR,
            ImageOption::DataPool => RBD_IMAGE_OPTION_DATA_POOL,
            ImageOption::Flatten => RBD_IMAGE_OPTION_FLATTEN,
            ImageOption::CloneFormat => RBD_IMAGE_OPTION_CLONE_FORMAT,
            ImageOption::MirrorImageMode => RBD_IMAGE_OPTION_MIRROR_IMAGE_MODE,
        }
    }

    pub fn kind(self) -> OptionKind {
        match self {
            ImageOption::JournalPool | ImageOption::DataPool => OptionKind::String,
            _ => OptionKind::Uint64,
        }
    }
}

impl fmt::Display for ImageOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            ImageOption::Format => "format",
            ImageOption::Features => "features",
            ImageOption::Order => "order",
            ImageOption::StripeUnit => "stripe_unit",
            ImageOption::StripeCount => "stripe_count",
            ImageOption::JournalOrder => "journal_order",
            ImageOption::JournalSplayWidth => "journal_splay_width",
            ImageOption::JournalPool => "journal_pool",
            ImageOption::FeaturesSet => "features_set",
            ImageOption::FeaturesClear => "features_clear",
            ImageOption::DataPool => "data_pool",
            ImageOption::Flatten => "flatten",
            ImageOption::CloneFormat => "clone_format",
            ImageOption::MirrorImageMode => "mirror_image_mode",
        };
        f.write_str(s)
    }
}

// librbd does not report how long a string option is; every defined key
// fits comfortably.
const OPTION_STRING_MAX: usize = 4096;

/// Options used when creating, cloning, copying or migrating images.
///
/// The underlying librbd object is destroyed on drop.
pub struct ImageOptions {
    options: rbd_image_options_t,
}

impl ImageOptions {
    pub fn new() -> ImageOptions {
        let mut options: rbd_image_options_t = ptr::null_mut();
        unsafe {
            rbd_image_options_create(&mut options);
        }
        ImageOptions { options }
    }

    pub(crate) fn as_ptr(&self) -> rbd_image_options_t {
        self.options
    }

    fn expect_kind(option: ImageOption, kind: OptionKind) -> RbdResult<()> {
        if option.kind() == kind {
            Ok(())
        } else {
            Err(RbdError::InvalidArgument)
        }
    }

    pub fn set_string(&mut self, option: ImageOption, value: &str) -> RbdResult<()> {
        ImageOptions::expect_kind(option, OptionKind::String)?;
        let c_value = to_cstring(value)?;
        let ret = unsafe { rbd_image_options_set_string(self.options, option.code(), c_value.as_ptr()) };
        check(ret)
    }

    pub fn get_string(&self, option: ImageOption) -> RbdResult<String> {
        ImageOptions::expect_kind(option, OptionKind::String)?;
        let mut buf = vec![0u8; OPTION_STRING_MAX];
        let ret = unsafe {
            rbd_image_options_get_string(self.options, option.code(), buf.as_mut_ptr() as *mut c_char, buf.len())
        };
        check(ret)?;
        Ok(buf_to_string(&buf))
    }

    pub fn set_uint64(&mut self, option: ImageOption, value: u64) -> RbdResult<()> {
        ImageOptions::expect_kind(option, OptionKind::Uint64)?;
        let ret = unsafe { rbd_image_options_set_uint64(self.options, option.code(), value) };
        check(ret)
    }

    pub fn get_uint64(&self, option: ImageOption) -> RbdResult<u64> {
        ImageOptions::expect_kind(option, OptionKind::Uint64)?;
        let mut value = 0u64;
        let ret = unsafe { rbd_image_options_get_uint64(self.options, option.code(), &mut value) };
        check(ret)?;
        Ok(value)
    }

    pub fn is_set(&self, option: ImageOption) -> RbdResult<bool> {
        let mut is_set = false;
        let ret = unsafe { rbd_image_options_is_set(self.options, option.code(), &mut is_set) };
        check(ret)?;
        Ok(is_set)
    }

    pub fn unset(&mut self, option: ImageOption) -> RbdResult<()> {
        let ret = unsafe { rbd_image_options_unset(self.options, option.code()) };
        check(ret)
    }

    pub fn clear(&mut self) {
        unsafe {
            rbd_image_options_clear(self.options);
        }
    }

    pub fn is_empty(&self) -> bool {
        unsafe { rbd_image_options_is_empty(self.options) != 0 }
    }
}

impl Default for ImageOptions {
    fn default() -> Self {
        ImageOptions::new()
    }
}

impl Drop for ImageOptions {
    fn drop(&mut self) {
        if !self.options.is_null() {
            unsafe {
                rbd_image_options_destroy(self.options);
            }
        }
    }
}

impl fmt::Debug for ImageOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ImageOptions").field("options", &self.options).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_librbd() {
        assert_eq!(ImageOption::Format.code(), 0);
        assert_eq!(ImageOption::Order.code(), 2);
        assert_eq!(ImageOption::JournalPool.code(), 7);
        assert_eq!(ImageOption::DataPool.code(), 10);
        assert_eq!(ImageOption::MirrorImageMode.code(), 13);
    }

    #[test]
    fn value_kinds() {
        assert_eq!(ImageOption::DataPool.kind(), OptionKind::String);
        assert_eq!(ImageOption::JournalPool.kind(), OptionKind::String);
        assert_eq!(ImageOption::Features.kind(), OptionKind::Uint64);
        assert_eq!(ImageOption::Flatten.kind(), OptionKind::Uint64);
    }
}
