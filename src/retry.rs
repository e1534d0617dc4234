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

//! Grow-and-retry loop for librbd calls that answer `-ERANGE` when the
//! output buffer is too small.
//!
//! The closure owns the buffer and the error; it only tells the loop how to
//! size the next attempt.

use libc::ERANGE;

use crate::error::{get_error, RbdError, RbdResult};

/// What the next attempt should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    /// Stop retrying.
    Done,
    /// Retry with exactly this size, usually what librbd reported back.
    Size(usize),
    /// Retry with twice the current size.
    DoubleSize,
}

impl Hint {
    /// Keep this hint when `cond` holds, otherwise stop.
    pub(crate) fn when(self, cond: bool) -> Hint {
        if cond {
            self
        } else {
            Hint::Done
        }
    }
}

/// Call `f` with `start`, then with whatever size it asks for, until it says
/// `Done` or the next size would be above `max`.
///
/// A `Size` that does not grow the buffer is treated as `DoubleSize`, which
/// keeps a misreporting call from spinning forever.
pub(crate) fn with_sizes<F>(start: usize, max: usize, mut f: F)
where
    F: FnMut(usize) -> Hint,
{
    let mut size = start.max(1);
    while size <= max {
        size = match f(size) {
            Hint::Done => return,
            Hint::Size(n) if n > size => n,
            Hint::Size(_) | Hint::DoubleSize => match size.checked_mul(2) {
                Some(n) => n,
                None => return,
            },
        };
    }
    trace!("retry stopped at size {} (max {})", size, max);
}

/// `with_sizes` for calls that produce a value. `f` returns its result
/// together with the hint for the next attempt and the last result wins.
/// If the ceiling is reached while still too small, the caller sees a plain
/// `-ERANGE` code rather than the internal signal.
pub(crate) fn retry_sized<T, F>(start: usize, max: usize, mut f: F) -> RbdResult<T>
where
    F: FnMut(usize) -> (RbdResult<T>, Hint),
{
    let mut last = Err(RbdError::RangeTooSmall);
    with_sizes(start, max, |size| {
        let (result, hint) = f(size);
        last = result;
        hint
    });
    match last {
        Err(RbdError::RangeTooSmall) => Err(RbdError::Code {
            code: -ERANGE,
            message: get_error(ERANGE),
        }),
        other => other,
    }
}

/// Double the buffer if `result` says it was too small, otherwise stop.
pub(crate) fn double_on_range<T>(result: RbdResult<T>) -> (RbdResult<T>, Hint) {
    let hint = Hint::DoubleSize.when(is_range(&result));
    (result, hint)
}

/// Retry with the size librbd reported if `result` says the buffer was too
/// small, otherwise stop.
pub(crate) fn resize_on_range<T>(result: RbdResult<T>, reported: usize) -> (RbdResult<T>, Hint) {
    let hint = Hint::Size(reported).when(is_range(&result));
    (result, hint)
}

pub(crate) fn is_range<T>(result: &RbdResult<T>) -> bool {
    match *result {
        Err(RbdError::RangeTooSmall) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_large_enough() {
        // a 64 byte id needs 65 bytes with its terminator
        let mut seen = Vec::new();
        with_sizes(1, 8192, |size| {
            seen.push(size);
            Hint::DoubleSize.when(size < 65)
        });
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 64, 128]);
    }

    #[test]
    fn follows_reported_size() {
        let mut seen = Vec::new();
        with_sizes(1024, 262144, |size| {
            seen.push(size);
            Hint::Size(5000).when(size < 5000)
        });
        assert_eq!(seen, vec![1024, 5000]);
    }

    #[test]
    fn stops_at_ceiling() {
        let mut seen = Vec::new();
        with_sizes(16, 100, |size| {
            seen.push(size);
            Hint::DoubleSize
        });
        assert_eq!(seen, vec![16, 32, 64]);
    }

    #[test]
    fn reported_size_above_ceiling_stops() {
        let mut calls = 0;
        with_sizes(4096, 8192, |_| {
            calls += 1;
            Hint::Size(1 << 20)
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn non_growing_size_doubles() {
        let mut seen = Vec::new();
        with_sizes(8, 64, |size| {
            seen.push(size);
            Hint::Size(4)
        });
        assert_eq!(seen, vec![8, 16, 32, 64]);
    }

    #[test]
    fn done_first_time() {
        let mut calls = 0;
        with_sizes(32, 1024, |_| {
            calls += 1;
            Hint::Done
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn retry_sized_keeps_last_result() {
        let mut sizes = Vec::new();
        let got: RbdResult<usize> = retry_sized(1, 8192, |size| {
            sizes.push(size);
            if size < 65 {
                double_on_range(Err(RbdError::RangeTooSmall))
            } else {
                double_on_range(Ok(size))
            }
        });
        assert_eq!(got.unwrap(), 128);
        assert_eq!(sizes.last(), Some(&128));
        assert!(sizes.iter().all(|s| *s < 256));
    }

    #[test]
    fn retry_sized_ceiling_is_not_the_internal_error() {
        let got: RbdResult<()> = retry_sized(16, 64, |_| double_on_range(Err(RbdError::RangeTooSmall)));
        match got {
            Err(RbdError::Code { code, .. }) => assert_eq!(code, -ERANGE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn retry_sized_passes_other_errors_through() {
        let mut calls = 0;
        let got: RbdResult<()> = retry_sized(16, 4096, |_| {
            calls += 1;
            double_on_range(Err(RbdError::NotFound))
        });
        assert!(got.unwrap_err().is_not_found());
        assert_eq!(calls, 1);
    }

    #[test]
    fn reported_size_is_followed() {
        let mut sizes = Vec::new();
        let got: RbdResult<usize> = retry_sized(4096, 262144, |size| {
            sizes.push(size);
            if size < 10000 {
                resize_on_range(Err(RbdError::RangeTooSmall), 10000)
            } else {
                resize_on_range(Ok(size), 0)
            }
        });
        assert_eq!(got.unwrap(), 10000);
        assert_eq!(sizes, vec![4096, 10000]);
    }

    #[test]
    fn call_count_bounded_by_log2() {
        // at most ceil(log2(N / S0)) + 1 extra calls before the buffer fits
        for &needed in &[3usize, 17, 100, 4097, 70000] {
            let mut calls = 0;
            let mut last = 0;
            with_sizes(1, 1 << 20, |size| {
                calls += 1;
                last = size;
                Hint::DoubleSize.when(size < needed)
            });
            let bound = (needed as f64).log2().ceil() as usize + 1;
            assert!(calls <= bound + 1, "needed {} took {} calls", needed, calls);
            assert!(last >= needed);
        }
    }
}
