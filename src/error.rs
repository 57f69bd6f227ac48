// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::image::{PixelFormat, Rect};
use thiserror::Error;

/// Errors returned by every fallible operation in this crate.
///
/// All checks run before the destination is touched, so an `Err` always
/// means the destination buffer is exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing pixel data, a zero dimension, mismatched size or format
    /// between paired images, or a numeric argument out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// The pixel format is not handled by the requested operation.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    /// The region of interest is empty or not contained in the image.
    #[error("wrong region of interest: {0}")]
    WrongRoi(Rect),

    /// Source and destination alias in a way no scan order can handle.
    #[error("overlapping buffers cannot be processed without a temporary copy")]
    NotAllowed,

    /// A pixel buffer of the given size could not be allocated.
    #[error("out of memory allocating {0} bytes")]
    OutOfMemory(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
