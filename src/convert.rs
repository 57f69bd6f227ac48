// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Pixel-format conversion between Binary, Grayscale, RGB565 and RGB888.
//!
//! Every ordered pair of formats has its own routine. Same-format pairs
//! are a plain byte copy. Conversions can run between two images or
//! between two regions of one buffer, see [`convert_with_overlap`].

use crate::{
    error::{Error, Result},
    image::{check_same_resolution, checked_data_size, data_size, row_stride, Image, PixelFormat},
    overlap::{Direction, Policy, Span},
    pixel::{self, Planes},
};
use tracing::{debug, instrument, trace};

/// Placement of an image inside a larger byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Byte offset of the first pixel.
    pub offset: usize,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Layout {
    pub const fn new(offset: usize, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            offset,
            width,
            height,
            format,
        }
    }

    /// Bytes occupied by the pixel data.
    pub const fn size(&self) -> usize {
        data_size(self.width, self.height, self.format)
    }

    pub const fn span(&self) -> Span {
        Span::new(self.offset, self.size())
    }

    fn range(&self, buf_len: usize) -> Result<(usize, usize)> {
        let end = checked_data_size(self.width, self.height, self.format)
            .and_then(|size| self.offset.checked_add(size));
        match end {
            Some(end) if end <= buf_len => Ok((self.offset, end)),
            _ => Err(Error::InvalidParameter("layout exceeds buffer")),
        }
    }

    // Absolute index of the first byte holding pixel (x, y).
    fn first_byte(&self, x: usize, y: usize) -> usize {
        let row = self.offset + y * row_stride(self.format, self.width);
        match self.format {
            PixelFormat::Binary => row + (x >> 3),
            format => row + x * pixel_bytes(format),
        }
    }

    // Absolute index of the last byte holding pixel (x, y).
    fn last_byte(&self, x: usize, y: usize) -> usize {
        match self.format {
            PixelFormat::Binary => self.first_byte(x, y),
            format => self.first_byte(x, y) + pixel_bytes(format) - 1,
        }
    }
}

const fn pixel_bytes(format: PixelFormat) -> usize {
    match format {
        PixelFormat::Binary | PixelFormat::Grayscale | PixelFormat::Bayer => 1,
        PixelFormat::Rgb565 => 2,
        PixelFormat::Rgb888 => 3,
    }
}

/// Whether an identity scan in `direction` never writes a byte that still
/// holds an unread source pixel.
///
/// The span analysis only looks at byte ranges. Binary rows pack eight
/// pixels per byte and are padded to 32-bit words, so a destination can
/// catch up with the source inside a row even when the spans allow it.
/// Destination pixels never take fewer bytes than source pixels here, so
/// along a row the gap between the write and read cursors only shrinks in
/// the scan direction. Checking the last step of each row and the step
/// across rows is enough.
fn scan_is_safe(src: &Layout, dst: &Layout, direction: Direction) -> bool {
    if src.format == dst.format {
        // memmove
        return true;
    }
    let (w, h) = (src.width as usize, src.height as usize);
    if w == 0 || h == 0 {
        return true;
    }
    match direction {
        Direction::Forward => (0..h).all(|y| {
            let in_row = w < 2 || dst.last_byte(w - 2, y) < src.first_byte(w - 1, y);
            let next_row = y + 1 == h || dst.last_byte(w - 1, y) < src.first_byte(0, y + 1);
            in_row && next_row
        }),
        Direction::Reverse => (0..h).all(|y| {
            let in_row = w < 2 || dst.first_byte(1, y) > src.last_byte(0, y);
            let prev_row = y == 0 || dst.first_byte(0, y) > src.last_byte(w - 1, y - 1);
            in_row && prev_row
        }),
    }
}

/// Byte ranges of both layouts, checked against the buffer length.
pub(crate) fn check_layouts(
    buf: &[u8],
    src: &Layout,
    dst: &Layout,
) -> Result<((usize, usize), (usize, usize))> {
    Ok((src.range(buf.len())?, dst.range(buf.len())?))
}

// Identity scan: destination pixel (x, y) reads source pixel (x, y).
#[inline]
fn pass<T>(
    planes: &mut Planes<'_>,
    width: usize,
    height: usize,
    direction: Direction,
    get: impl Fn(&[u8], usize, usize) -> T,
    put: impl Fn(&mut [u8], usize, usize, T),
) {
    pixel::scan(planes, width, height, direction, |x, y| (x, y), get, put);
}

fn binary_to_grayscale(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_binary(s, w, x, y),
        |d, x, y, v| pixel::put_grayscale(d, w, x, y, pixel::binary_to_grayscale(v)),
    );
}

fn binary_to_rgb565(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_binary(s, w, x, y),
        |d, x, y, v| pixel::put_rgb565(d, w, x, y, pixel::binary_to_rgb565(v)),
    );
}

fn binary_to_rgb888(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_binary(s, w, x, y),
        |d, x, y, v| pixel::put_rgb888(d, w, x, y, [pixel::binary_to_grayscale(v); 3]),
    );
}

fn grayscale_to_binary(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_grayscale(s, w, x, y),
        |d, x, y, v| pixel::put_binary(d, w, x, y, pixel::grayscale_to_binary(v)),
    );
}

fn grayscale_to_rgb565(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_grayscale(s, w, x, y),
        |d, x, y, v| pixel::put_rgb565(d, w, x, y, pixel::grayscale_to_rgb565(v)),
    );
}

fn grayscale_to_rgb888(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_grayscale(s, w, x, y),
        |d, x, y, v| pixel::put_rgb888(d, w, x, y, [v; 3]),
    );
}

fn rgb565_to_binary(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_rgb565(s, w, x, y),
        |d, x, y, v| {
            let luma = pixel::rgb565_to_grayscale(v);
            pixel::put_binary(d, w, x, y, pixel::grayscale_to_binary(luma))
        },
    );
}

fn rgb565_to_grayscale(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_rgb565(s, w, x, y),
        |d, x, y, v| pixel::put_grayscale(d, w, x, y, pixel::rgb565_to_grayscale(v)),
    );
}

fn rgb565_to_rgb888(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_rgb565(s, w, x, y),
        |d, x, y, v| pixel::put_rgb888(d, w, x, y, pixel::rgb565_to_rgb888(v)),
    );
}

fn rgb888_to_binary(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_rgb888(s, w, x, y),
        |d, x, y, [r, g, b]: [u8; 3]| {
            let luma = pixel::luma(r, g, b);
            pixel::put_binary(d, w, x, y, pixel::grayscale_to_binary(luma))
        },
    );
}

fn rgb888_to_grayscale(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_rgb888(s, w, x, y),
        |d, x, y, [r, g, b]: [u8; 3]| pixel::put_grayscale(d, w, x, y, pixel::luma(r, g, b)),
    );
}

fn rgb888_to_rgb565(planes: &mut Planes<'_>, w: usize, h: usize, direction: Direction) {
    pass(
        planes,
        w,
        h,
        direction,
        |s, x, y| pixel::get_rgb888(s, w, x, y),
        |d, x, y, [r, g, b]: [u8; 3]| {
            pixel::put_rgb565(d, w, x, y, pixel::rgb888_to_rgb565(r, g, b))
        },
    );
}

// Same format on both sides. The aliased copy is a memmove so the scan
// direction does not matter.
fn copy_bytes(planes: &mut Planes<'_>) {
    match planes {
        Planes::Disjoint { src, dst } => dst.copy_from_slice(src),
        Planes::Aliased { buf, src, dst } => buf.copy_within(src.0..src.1, dst.0),
    }
}

fn dispatch(
    planes: &mut Planes<'_>,
    from: PixelFormat,
    to: PixelFormat,
    width: u32,
    height: u32,
    direction: Direction,
) -> Result<()> {
    use PixelFormat::*;

    let (w, h) = (width as usize, height as usize);
    trace!(%from, %to, width, height, %direction, "convert");
    match (from, to) {
        (Bayer, _) => return Err(Error::UnsupportedFormat(from)),
        (_, Bayer) => return Err(Error::UnsupportedFormat(to)),
        (Binary, Binary) | (Grayscale, Grayscale) | (Rgb565, Rgb565) | (Rgb888, Rgb888) => {
            copy_bytes(planes)
        }
        (Binary, Grayscale) => binary_to_grayscale(planes, w, h, direction),
        (Binary, Rgb565) => binary_to_rgb565(planes, w, h, direction),
        (Binary, Rgb888) => binary_to_rgb888(planes, w, h, direction),
        (Grayscale, Binary) => grayscale_to_binary(planes, w, h, direction),
        (Grayscale, Rgb565) => grayscale_to_rgb565(planes, w, h, direction),
        (Grayscale, Rgb888) => grayscale_to_rgb888(planes, w, h, direction),
        (Rgb565, Binary) => rgb565_to_binary(planes, w, h, direction),
        (Rgb565, Grayscale) => rgb565_to_grayscale(planes, w, h, direction),
        (Rgb565, Rgb888) => rgb565_to_rgb888(planes, w, h, direction),
        (Rgb888, Binary) => rgb888_to_binary(planes, w, h, direction),
        (Rgb888, Grayscale) => rgb888_to_grayscale(planes, w, h, direction),
        (Rgb888, Rgb565) => rgb888_to_rgb565(planes, w, h, direction),
    }
    Ok(())
}

/// Converts `src` into the format of `dst`, scanning forward.
///
/// # Errors
///
/// See [`convert_rev`].
///
/// # Example
///
/// ```
/// use ipl::{convert::convert, image::{Image, PixelFormat}};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gray = [0x00, 0x80, 0xFF, 0x40];
/// let src = Image::new_shared(2, 2, PixelFormat::Grayscale, &gray)?;
/// let mut dst = Image::alloc(2, 2, PixelFormat::Rgb888)?;
///
/// convert(&src, &mut dst)?;
/// assert_eq!(dst.get_pixel(1, 0)?, 0x808080);
/// # Ok(())
/// # }
/// ```
pub fn convert(src: &Image<'_>, dst: &mut Image<'_>) -> Result<()> {
    convert_rev(src, dst, Direction::Forward)
}

/// Converts `src` into the format of `dst`, visiting pixels in
/// `direction`. Exactly [`Image::size`] bytes of `dst` are written.
///
/// # Errors
///
/// - `InvalidParameter`: either image has no data, `dst` is read-only or
///   the resolutions differ.
/// - `UnsupportedFormat`: either format is Bayer.
#[instrument(level = "trace", skip_all, fields(src = %src, dst = %dst, %direction))]
pub fn convert_rev(src: &Image<'_>, dst: &mut Image<'_>, direction: Direction) -> Result<()> {
    let data = src.data()?;
    dst.data_mut()?;
    check_same_resolution(src, dst)?;

    let (from, to, width, height) = (src.format(), dst.format(), src.width(), src.height());
    let mut planes = Planes::Disjoint {
        src: data,
        dst: dst.data_mut()?,
    };
    dispatch(&mut planes, from, to, width, height, direction)
}

/// Converts an image into another region of the same buffer with the
/// default [`Policy`]. Returns the scan direction that was used.
///
/// # Errors
///
/// See [`convert_with_policy`].
///
/// # Example
///
/// ```
/// use ipl::{convert::{convert_with_overlap, Layout}, image::PixelFormat, Direction};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // 4 gray pixels staged at the tail, expanded to RGB888 at the head.
/// let mut buf = [0u8; 12];
/// buf[8..].copy_from_slice(&[10, 20, 30, 40]);
/// let src = Layout::new(8, 4, 1, PixelFormat::Grayscale);
/// let dst = Layout::new(0, 4, 1, PixelFormat::Rgb888);
///
/// assert_eq!(convert_with_overlap(&mut buf, &src, &dst)?, Direction::Forward);
/// assert_eq!(buf, [10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40]);
/// # Ok(())
/// # }
/// ```
pub fn convert_with_overlap(buf: &mut [u8], src: &Layout, dst: &Layout) -> Result<Direction> {
    convert_with_policy(buf, src, dst, &Policy::default())
}

/// Converts an image into another region of the same buffer, picking the
/// scan direction from [`Policy::analyze_conversion`].
///
/// # Errors
///
/// - `InvalidParameter`: a layout leaves `buf`, both start at the same
///   offset or the resolutions differ.
/// - `UnsupportedFormat`: either format is Bayer.
/// - `NotAllowed`: the analysis forbids an in-place conversion, or the
///   chosen scan would overwrite source pixels before reading them. The
///   latter happens with Binary sources whose destination starts too
///   close behind them.
#[instrument(level = "trace", skip(buf))]
pub fn convert_with_policy(
    buf: &mut [u8],
    src: &Layout,
    dst: &Layout,
    policy: &Policy,
) -> Result<Direction> {
    let (src_range, dst_range) = check_layouts(buf, src, dst)?;
    if src.offset == dst.offset {
        return Err(Error::InvalidParameter("source and destination share an offset"));
    }
    if src.width != dst.width || src.height != dst.height {
        return Err(Error::InvalidParameter("images differ in resolution"));
    }
    for format in [src.format, dst.format] {
        if format == PixelFormat::Bayer {
            return Err(Error::UnsupportedFormat(format));
        }
    }

    let verdict = policy.analyze_conversion(src.span(), dst.span());
    let Some(direction) = verdict.direction() else {
        debug!(?verdict, src = ?src.span(), dst = ?dst.span(), "conversion refused");
        return Err(Error::NotAllowed);
    };
    if !scan_is_safe(src, dst, direction) {
        debug!(%direction, ?src, ?dst, "scan would overwrite unread source pixels");
        return Err(Error::NotAllowed);
    }
    debug!(%direction, "convert with overlap");

    let mut planes = Planes::Aliased {
        buf,
        src: src_range,
        dst: dst_range,
    };
    dispatch(
        &mut planes,
        src.format,
        dst.format,
        src.width,
        src.height,
        direction,
    )?;
    Ok(direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_range() {
        let layout = Layout::new(4, 3, 2, PixelFormat::Rgb565);
        assert_eq!(layout.size(), 12);
        assert_eq!(layout.range(16), Ok((4, 16)));
        assert!(layout.range(15).is_err());
        assert!(Layout::new(usize::MAX, 1, 1, PixelFormat::Grayscale)
            .range(usize::MAX)
            .is_err());
    }

    #[test]
    fn test_copy_bytes_aliased() {
        let mut buf = [1, 2, 3, 4, 0, 0];
        let mut planes = Planes::Aliased {
            buf: &mut buf,
            src: (0, 4),
            dst: (2, 6),
        };
        copy_bytes(&mut planes);
        assert_eq!(buf, [1, 2, 1, 2, 3, 4]);
    }

    #[test]
    fn test_scan_is_safe_binary_padding() {
        // 33x3 binary: 8 bytes per row, 24 in total.
        let src = Layout::new(75, 33, 3, PixelFormat::Binary);
        let dst = Layout::new(0, 33, 3, PixelFormat::Grayscale);
        assert!(!scan_is_safe(&src, &dst, Direction::Forward));

        // Same image with 8 spare bytes between the write and read cursors.
        let src = Layout::new(83, 33, 3, PixelFormat::Binary);
        assert!(scan_is_safe(&src, &dst, Direction::Forward));

        let src = Layout::new(224, 64, 4, PixelFormat::Binary);
        let dst = Layout::new(0, 64, 4, PixelFormat::Grayscale);
        assert!(scan_is_safe(&src, &dst, Direction::Forward));
    }

    #[test]
    fn test_scan_is_safe_reverse() {
        // Wider destination pixels starting behind the source outrun it.
        let src = Layout::new(0, 33, 3, PixelFormat::Binary);
        let dst = Layout::new(1, 33, 3, PixelFormat::Rgb888);
        assert!(scan_is_safe(&src, &dst, Direction::Reverse));

        // The same pair scanned forward clobbers the second source byte.
        assert!(!scan_is_safe(&src, &dst, Direction::Forward));

        let src = Layout::new(0, 5, 2, PixelFormat::Grayscale);
        let dst = Layout::new(0, 5, 2, PixelFormat::Rgb565);
        assert!(scan_is_safe(&src, &dst, Direction::Reverse));
        assert!(scan_is_safe(&src, &src, Direction::Forward));
    }
}
