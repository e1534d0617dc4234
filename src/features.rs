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
use std::str::FromStr;

use crate::error::RbdError;

bitflags! {
    /// Image feature bits, laid out as in `rbd/features.h`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct ImageFeatures: u64 {
        const LAYERING = 1 << 0;
        const STRIPING_V2 = 1 << 1;
        const EXCLUSIVE_LOCK = 1 << 2;
        const OBJECT_MAP = 1 << 3;
        const FAST_DIFF = 1 << 4;
        const DEEP_FLATTEN = 1 << 5;
        const JOURNALING = 1 << 6;
        const DATA_POOL = 1 << 7;
        const OPERATIONS = 1 << 8;
        const MIGRATING = 1 << 9;
        const NON_PRIMARY = 1 << 10;
        const DIRTY_CACHE = 1 << 11;

        const DEFAULT = Self::LAYERING.bits()
            | Self::EXCLUSIVE_LOCK.bits()
            | Self::OBJECT_MAP.bits()
            | Self::FAST_DIFF.bits()
            | Self::DEEP_FLATTEN.bits();

        /// Clients that do not understand these can not open the image.
        const INCOMPATIBLE = Self::LAYERING.bits()
            | Self::STRIPING_V2.bits()
            | Self::DATA_POOL.bits();

        /// Clients that do not understand these can only open the image
        /// read only.
        const RW_INCOMPATIBLE = Self::INCOMPATIBLE.bits()
            | Self::EXCLUSIVE_LOCK.bits()
            | Self::OBJECT_MAP.bits()
            | Self::FAST_DIFF.bits()
            | Self::DEEP_FLATTEN.bits()
            | Self::JOURNALING.bits()
            | Self::OPERATIONS.bits()
            | Self::MIGRATING.bits()
            | Self::NON_PRIMARY.bits()
            | Self::DIRTY_CACHE.bits();

        /// Can be toggled with `update_features` after creation.
        const MUTABLE = Self::EXCLUSIVE_LOCK.bits()
            | Self::OBJECT_MAP.bits()
            | Self::FAST_DIFF.bits()
            | Self::JOURNALING.bits();

        /// Only usable while a single client holds the exclusive lock.
        const SINGLE_CLIENT = Self::EXCLUSIVE_LOCK.bits()
            | Self::OBJECT_MAP.bits()
            | Self::FAST_DIFF.bits()
            | Self::JOURNALING.bits();
    }
}

pub type FeatureSet = ImageFeatures;

const FEATURE_NAMES: [(ImageFeatures, &str); 12] = [
    (ImageFeatures::LAYERING, "layering"),
    (ImageFeatures::STRIPING_V2, "striping"),
    (ImageFeatures::EXCLUSIVE_LOCK, "exclusive-lock"),
    (ImageFeatures::OBJECT_MAP, "object-map"),
    (ImageFeatures::FAST_DIFF, "fast-diff"),
    (ImageFeatures::DEEP_FLATTEN, "deep-flatten"),
    (ImageFeatures::JOURNALING, "journaling"),
    (ImageFeatures::DATA_POOL, "data-pool"),
    (ImageFeatures::OPERATIONS, "operations"),
    (ImageFeatures::MIGRATING, "migrating"),
    (ImageFeatures::NON_PRIMARY, "non-primary"),
    (ImageFeatures::DIRTY_CACHE, "dirty-cache"),
];

impl ImageFeatures {
    /// Build a set from feature names as the rbd tool prints them. Unknown
    /// names are skipped.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> ImageFeatures {
        let mut fs = ImageFeatures::empty();
        for name in names {
            if let Some(&(bit, _)) = FEATURE_NAMES.iter().find(|(_, n)| *n == name.as_ref()) {
                fs |= bit;
            }
        }
        fs
    }

    /// Names of the single bits set, lowest bit first.
    pub fn names(&self) -> Vec<&'static str> {
        FEATURE_NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn feature_name(bit: ImageFeatures) -> Option<&'static str> {
        FEATURE_NAMES.iter().find(|(b, _)| *b == bit).map(|(_, n)| *n)
    }
}

impl fmt::Display for ImageFeatures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// Parses a comma separated list such as `layering,exclusive-lock`.
/// Unlike `from_names`, an unknown name is an error here.
impl FromStr for ImageFeatures {
    type Err = RbdError;

    fn from_str(s: &str) -> Result<ImageFeatures, RbdError> {
        let mut fs = ImageFeatures::empty();
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match FEATURE_NAMES.iter().find(|(_, n)| *n == name) {
                Some(&(bit, _)) => fs |= bit,
                None => return Err(RbdError::new(format!("unknown image feature '{}'", name))),
            }
        }
        Ok(fs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bits() {
        assert_eq!(ImageFeatures::DEFAULT.bits(), 61);
        assert_eq!(ImageFeatures::INCOMPATIBLE.bits(), 1 | 2 | 128);
    }

    #[test]
    fn names_in_bit_order() {
        let fs = ImageFeatures::FAST_DIFF | ImageFeatures::LAYERING | ImageFeatures::OBJECT_MAP;
        assert_eq!(fs.names(), vec!["layering", "object-map", "fast-diff"]);
        assert_eq!(fs.to_string(), "layering,object-map,fast-diff");
    }

    #[test]
    fn from_names_skips_unknown() {
        let fs = ImageFeatures::from_names(&["layering", "bogus", "journaling"]);
        assert_eq!(fs, ImageFeatures::LAYERING | ImageFeatures::JOURNALING);
    }

    #[test]
    fn parse_list() {
        let fs: ImageFeatures = "layering, exclusive-lock,object-map".parse().unwrap();
        assert_eq!(fs.names(), vec!["layering", "exclusive-lock", "object-map"]);
        assert!("layering,nope".parse::<ImageFeatures>().is_err());
        assert_eq!("".parse::<ImageFeatures>().unwrap(), ImageFeatures::empty());
    }

    #[test]
    fn every_bit_has_a_name() {
        for i in 0..12 {
            let bit = ImageFeatures::from_bits_truncate(1 << i);
            assert!(ImageFeatures::feature_name(bit).is_some(), "bit {}", i);
        }
    }
}
