// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # IPL Raster Library
//!
//! Pixel-format conversion and nearest-neighbor resampling for
//! memory-constrained imaging pipelines. Images are plain byte buffers,
//! either owned or borrowed, and every operation can run on two separate
//! buffers or, where the layouts allow it, in place inside one.
//!
//! ## Features
//!
//! - **Format Conversion**: Binary (1 bit packed), Grayscale, RGB565 and
//!   RGB888 in every direction, forward or reverse scan.
//! - **Overlap Analysis**: Decide whether a conversion or a downscale
//!   between two aliasing regions can run forward, must run in reverse, or
//!   needs a separate buffer.
//! - **Resampling**: Nearest-neighbor resize of a full image or a region
//!   of interest, plus a downscale path with explicit scan direction.
//! - **Image Descriptors**: Allocation, views, copies, fill, crop and
//!   pixel access.
//!
//! ## Example
//!
//! ```
//! use ipl::{convert, resize, Image, PixelFormat, Rect};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut src = Image::alloc(64, 48, PixelFormat::Rgb565)?;
//! src.fill(0xFF8000, None)?;
//!
//! // Convert to RGB888 then cut a 16x16 thumbnail out of the center.
//! let mut rgb = Image::alloc(64, 48, PixelFormat::Rgb888)?;
//! convert(&src, &mut rgb)?;
//!
//! let mut thumb = Image::alloc(16, 16, PixelFormat::Rgb888)?;
//! resize(&rgb, &mut thumb, Some(Rect::new(16, 8, 32, 32)))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! The crate contains no `unsafe` code. In-place operations take a single
//! `&mut [u8]` and two [`Layout`]s describing where the source and the
//! destination live inside it.

pub mod convert;
pub mod error;
pub mod image;
pub mod overlap;
pub mod pixel;
pub mod resize;

pub use convert::{convert, convert_rev, convert_with_overlap, convert_with_policy, Layout};
pub use error::{Error, Result};
pub use image::{
    checked_data_size, checked_row_stride, clone_into, color_to_value, copy_data, crop, data_size,
    row_stride, FormatSet, Image, PixelFormat, Rect,
};
pub use overlap::{analyze_conversion, analyze_downscale, Direction, Policy, Span, Verdict};
pub use resize::{downscale, downscale_with_overlap, resize};
