// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pixel accessors, color math and the scan loop shared by the codec and
//! the resampler.
//!
//! Buffers are plain byte slices laid out as follows:
//!
//! - Binary: rows padded to whole little-endian `u32` words, pixel `x` is
//!   bit `x % 32` of word `x / 32`.
//! - Grayscale: one byte per pixel.
//! - RGB565: one little-endian `u16` per pixel, red in the top five bits.
//! - RGB888: three bytes per pixel in R, G, B order.

use crate::overlap::Direction;

/// Number of 32-bit words in one row of a Binary image.
#[inline]
pub const fn binary_row_words(width: usize) -> usize {
    (width >> 5) + ((width & 31) != 0) as usize
}

#[inline]
fn binary_byte(width: usize, x: usize, y: usize) -> usize {
    (y * binary_row_words(width) + (x >> 5)) * 4 + ((x & 31) >> 3)
}

#[inline]
pub fn get_binary(data: &[u8], width: usize, x: usize, y: usize) -> bool {
    (data[binary_byte(width, x, y)] >> (x & 7)) & 1 != 0
}

#[inline]
pub fn put_binary(data: &mut [u8], width: usize, x: usize, y: usize, value: bool) {
    let byte = &mut data[binary_byte(width, x, y)];
    let mask = 1u8 << (x & 7);
    if value {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}

#[inline]
pub fn get_grayscale(data: &[u8], width: usize, x: usize, y: usize) -> u8 {
    data[y * width + x]
}

#[inline]
pub fn put_grayscale(data: &mut [u8], width: usize, x: usize, y: usize, value: u8) {
    data[y * width + x] = value;
}

#[inline]
pub fn get_rgb565(data: &[u8], width: usize, x: usize, y: usize) -> u16 {
    let i = (y * width + x) * 2;
    u16::from_le_bytes([data[i], data[i + 1]])
}

#[inline]
pub fn put_rgb565(data: &mut [u8], width: usize, x: usize, y: usize, value: u16) {
    let i = (y * width + x) * 2;
    data[i..i + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn get_rgb888(data: &[u8], width: usize, x: usize, y: usize) -> [u8; 3] {
    let i = (y * width + x) * 3;
    [data[i], data[i + 1], data[i + 2]]
}

#[inline]
pub fn put_rgb888(data: &mut [u8], width: usize, x: usize, y: usize, value: [u8; 3]) {
    let i = (y * width + x) * 3;
    data[i..i + 3].copy_from_slice(&value);
}

/// Luma of an 8-bit RGB triple. The weights sum to 128 so an achromatic
/// input maps back to itself.
#[inline]
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((38 * r as u32 + 75 * g as u32 + 15 * b as u32) >> 7) as u8
}

#[inline]
pub const fn grayscale_to_binary(value: u8) -> bool {
    value > 127
}

#[inline]
pub const fn binary_to_grayscale(value: bool) -> u8 {
    if value {
        0xFF
    } else {
        0x00
    }
}

#[inline]
pub const fn binary_to_rgb565(value: bool) -> u16 {
    if value {
        0xFFFF
    } else {
        0x0000
    }
}

/// Packs 8-bit channels into RGB565, rounding each channel to the nearest
/// representable level.
#[inline]
pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r as u32 * 31 + 127) / 255;
    let g6 = (g as u32 * 63 + 127) / 255;
    let b5 = (b as u32 * 31 + 127) / 255;
    ((r5 << 11) | (g6 << 5) | b5) as u16
}

#[inline]
pub const fn rgb565_to_rgb888(value: u16) -> [u8; 3] {
    let r5 = (value >> 11) as u32 & 0x1F;
    let g6 = (value >> 5) as u32 & 0x3F;
    let b5 = value as u32 & 0x1F;
    [
        ((r5 * 255 + 15) / 31) as u8,
        ((g6 * 255 + 31) / 63) as u8,
        ((b5 * 255 + 15) / 31) as u8,
    ]
}

#[inline]
pub const fn rgb565_to_grayscale(value: u16) -> u8 {
    let [r, g, b] = rgb565_to_rgb888(value);
    luma(r, g, b)
}

#[inline]
pub const fn grayscale_to_rgb565(value: u8) -> u16 {
    rgb888_to_rgb565(value, value, value)
}

/// Source and destination bytes of one operation.
///
/// `Aliased` keeps both regions inside one buffer so an in-place
/// conversion never needs two live references to the same memory; each
/// pixel step reborrows the source, reads, then reborrows the destination
/// and writes.
pub(crate) enum Planes<'a> {
    Disjoint {
        src: &'a [u8],
        dst: &'a mut [u8],
    },
    Aliased {
        buf: &'a mut [u8],
        src: (usize, usize),
        dst: (usize, usize),
    },
}

impl Planes<'_> {
    #[inline]
    pub(crate) fn src(&self) -> &[u8] {
        match self {
            Planes::Disjoint { src, .. } => src,
            Planes::Aliased { buf, src, .. } => &buf[src.0..src.1],
        }
    }

    #[inline]
    pub(crate) fn dst(&mut self) -> &mut [u8] {
        match self {
            Planes::Disjoint { dst, .. } => dst,
            Planes::Aliased { buf, dst, .. } => &mut buf[dst.0..dst.1],
        }
    }
}

/// Visits every destination pixel of a `width` x `height` grid in the
/// given direction, reading the source pixel that `map` selects and
/// writing it at the destination coordinate.
#[inline]
pub(crate) fn scan<T>(
    planes: &mut Planes<'_>,
    width: usize,
    height: usize,
    direction: Direction,
    map: impl Fn(usize, usize) -> (usize, usize),
    get: impl Fn(&[u8], usize, usize) -> T,
    put: impl Fn(&mut [u8], usize, usize, T),
) {
    let mut step = |x: usize, y: usize| {
        let (sx, sy) = map(x, y);
        let value = get(planes.src(), sx, sy);
        put(planes.dst(), x, y, value);
    };

    match direction {
        Direction::Forward => {
            for y in 0..height {
                for x in 0..width {
                    step(x, y);
                }
            }
        }
        Direction::Reverse => {
            for y in (0..height).rev() {
                for x in (0..width).rev() {
                    step(x, y);
                }
            }
        }
    }
}
