// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Scan-order analysis for source and destination byte ranges that may
//! share memory.
//!
//! Converting or downscaling an image into the buffer it is read from
//! avoids a temporary copy, which on small targets is often the
//! difference between fitting in RAM or not. Whether that is possible
//! depends only on where the two ranges start and how long they are.

use crate::error::{Error, Result};
use std::fmt;

/// Direction in which pixels are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// First pixel to last pixel.
    #[default]
    Forward,
    /// Last pixel to first pixel; rows and columns both run backwards.
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// Outcome of an overlap analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Safe when scanning from the first pixel.
    Forward,
    /// Safe only when scanning from the last pixel.
    Reverse,
    /// No scan order is safe; a separate destination buffer is required.
    Forbidden,
}

impl Verdict {
    /// The scan direction to use, or `None` when the operation must not
    /// proceed in place.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Verdict::Forward => Some(Direction::Forward),
            Verdict::Reverse => Some(Direction::Reverse),
            Verdict::Forbidden => None,
        }
    }
}

/// A byte range `[start, start + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    fn first(&self) -> i128 {
        self.start as i128
    }

    /// Address of the last byte; one before `start` for an empty span.
    fn last(&self) -> i128 {
        self.start as i128 + self.len as i128 - 1
    }
}

/// Margin divisor used by [`analyze_conversion`].
pub const DEFAULT_MARGIN_DIVISOR: usize = 3;

/// Tunables for the conversion analysis.
///
/// The destination of an in-place conversion must be larger than the
/// source by at least `dst.len / margin_divisor` bytes. Raising the
/// divisor relaxes the rule, lowering it tightens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    margin_divisor: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            margin_divisor: DEFAULT_MARGIN_DIVISOR,
        }
    }
}

impl Policy {
    /// Creates a policy with a custom margin divisor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when `margin_divisor` is zero.
    pub fn new(margin_divisor: usize) -> Result<Self> {
        if margin_divisor == 0 {
            return Err(Error::InvalidParameter("margin divisor must be positive"));
        }
        Ok(Self { margin_divisor })
    }

    pub fn margin_divisor(&self) -> usize {
        self.margin_divisor
    }

    /// Classifies a format conversion from `src` into `dst`.
    ///
    /// Rules, in order:
    ///
    /// 1. `dst.len - src.len < dst.len / divisor` is forbidden.
    /// 2. `dst` ends at or before the end of `src`: forward.
    /// 3. `dst` starts at or after the start of `src`: reverse.
    /// 4. Anything else is forbidden.
    pub fn analyze_conversion(&self, src: Span, dst: Span) -> Verdict {
        let growth = dst.len as i128 - src.len as i128;
        let margin = (dst.len / self.margin_divisor) as i128;

        if growth < margin {
            Verdict::Forbidden
        } else if dst.last() <= src.last() {
            Verdict::Forward
        } else if dst.first() >= src.first() {
            Verdict::Reverse
        } else {
            Verdict::Forbidden
        }
    }
}

/// Classifies a format conversion with the default [`Policy`].
pub fn analyze_conversion(src: Span, dst: Span) -> Verdict {
    Policy::default().analyze_conversion(src, dst)
}

/// Classifies a same-format downscale from `src` into `dst`.
///
/// A destination larger than the source is forbidden. When the source
/// starts at or after the destination, or ends before it, the scan runs
/// forward. A destination that starts inside the source and runs to or
/// past its end scans in reverse.
pub fn analyze_downscale(src: Span, dst: Span) -> Verdict {
    if src.len < dst.len {
        Verdict::Forbidden
    } else if src.first() >= dst.first() || src.last() <= dst.first() {
        Verdict::Forward
    } else if src.last() > dst.first() && dst.last() >= src.last() {
        Verdict::Reverse
    } else {
        Verdict::Forbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rejects_zero_divisor() {
        assert_eq!(
            Policy::new(0),
            Err(Error::InvalidParameter("margin divisor must be positive"))
        );
        assert_eq!(Policy::new(4).map(|p| p.margin_divisor()), Ok(4));
    }

    #[test]
    fn test_empty_span_last() {
        assert_eq!(Span::new(10, 0).last(), 9);
        assert_eq!(Span::new(0, 0).last(), -1);
    }
}
