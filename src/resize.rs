// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Nearest-neighbor resampling.
//!
//! Destination pixel `(x, y)` takes the source pixel at
//! `(floor(x * w_ratio) + roi.x, floor(y * h_ratio) + roi.y)` where the
//! ratios are the ROI size over the destination size. Enlarging repeats
//! pixels towards the top-left, shrinking drops pixels without averaging.

use crate::{
    convert::{check_layouts, Layout},
    error::{Error, Result},
    image::{
        check_format, check_roi, check_same_format, Bounds, FormatSet, Image, PixelFormat, Rect,
    },
    overlap::{self, Direction},
    pixel::{self, Planes},
};
use tracing::{debug, instrument};

/// Fixed sampling ratios from a destination grid onto a source region.
#[derive(Debug, Clone, Copy)]
struct Grid {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    w_ratio: f32,
    h_ratio: f32,
}

impl Grid {
    fn new(area: Bounds, dst_width: u32, dst_height: u32) -> Self {
        Self {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height,
            w_ratio: area.width as f32 / dst_width as f32,
            h_ratio: area.height as f32 / dst_height as f32,
        }
    }

    /// Source coordinate for a destination coordinate. The floor is
    /// clamped to the region so float rounding can never step outside it.
    #[inline]
    fn map(&self, x: usize, y: usize) -> (usize, usize) {
        let sx = ((x as f32 * self.w_ratio) as usize).min(self.width - 1);
        let sy = ((y as f32 * self.h_ratio) as usize).min(self.height - 1);
        (self.x + sx, self.y + sy)
    }
}

/// Copies pixels of one format from `src` (rows of `src_width`) into a
/// `dst_width` x `dst_height` destination, sampling where `map` points.
pub(crate) fn sample(
    planes: &mut Planes<'_>,
    format: PixelFormat,
    src_width: usize,
    dst_width: usize,
    dst_height: usize,
    direction: Direction,
    map: impl Fn(usize, usize) -> (usize, usize),
) -> Result<()> {
    let (sw, dw) = (src_width, dst_width);
    match format {
        PixelFormat::Binary => pixel::scan(
            planes,
            dw,
            dst_height,
            direction,
            map,
            |s, x, y| pixel::get_binary(s, sw, x, y),
            |d, x, y, v| pixel::put_binary(d, dw, x, y, v),
        ),
        PixelFormat::Grayscale => pixel::scan(
            planes,
            dw,
            dst_height,
            direction,
            map,
            |s, x, y| pixel::get_grayscale(s, sw, x, y),
            |d, x, y, v| pixel::put_grayscale(d, dw, x, y, v),
        ),
        PixelFormat::Rgb565 => pixel::scan(
            planes,
            dw,
            dst_height,
            direction,
            map,
            |s, x, y| pixel::get_rgb565(s, sw, x, y),
            |d, x, y, v| pixel::put_rgb565(d, dw, x, y, v),
        ),
        PixelFormat::Rgb888 => pixel::scan(
            planes,
            dw,
            dst_height,
            direction,
            map,
            |s, x, y| pixel::get_rgb888(s, sw, x, y),
            |d, x, y, v| pixel::put_rgb888(d, dw, x, y, v),
        ),
        PixelFormat::Bayer => return Err(Error::UnsupportedFormat(format)),
    }
    Ok(())
}

fn check_pair(src: &Image<'_>, dst: &mut Image<'_>) -> Result<()> {
    src.data()?;
    dst.data_mut()?;
    check_format(src, FormatSet::ALL)?;
    check_same_format(src, dst)?;
    if dst.width() < 1 || dst.height() < 1 {
        return Err(Error::InvalidParameter("destination must be at least 1x1"));
    }
    Ok(())
}

/// Resizes `src`, or its `roi`, to the size of `dst` with nearest-neighbor
/// sampling.
///
/// # Errors
///
/// - `InvalidParameter`: missing data, read-only `dst`, differing formats
///   or an empty destination.
/// - `UnsupportedFormat`: Bayer input.
/// - `WrongRoi`: `roi` is empty or not inside `src`.
///
/// `dst` is not touched when an error is returned.
///
/// # Example
///
/// ```
/// use ipl::{image::{Image, PixelFormat}, resize::resize};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pixels: Vec<u8> = (0..16).collect();
/// let src = Image::new_shared(4, 4, PixelFormat::Grayscale, &pixels)?;
/// let mut dst = Image::alloc(2, 2, PixelFormat::Grayscale)?;
///
/// resize(&src, &mut dst, None)?;
/// assert_eq!(dst.as_slice(), Some(&[0, 2, 8, 10][..]));
/// # Ok(())
/// # }
/// ```
#[instrument(level = "trace", skip_all, fields(src = %src, dst = %dst))]
pub fn resize(src: &Image<'_>, dst: &mut Image<'_>, roi: Option<Rect>) -> Result<()> {
    check_pair(src, dst)?;
    let area = match roi {
        Some(roi) => check_roi(src, &roi)?,
        None => Bounds::full(src),
    };
    if area.is_empty() {
        // 0xN source, nothing to sample from
        return Err(Error::WrongRoi(area.to_rect()));
    }

    let grid = Grid::new(area, dst.width(), dst.height());
    let (format, src_w, dst_w, dst_h) = (
        src.format(),
        src.width() as usize,
        dst.width() as usize,
        dst.height() as usize,
    );
    let mut planes = Planes::Disjoint {
        src: src.data()?,
        dst: dst.data_mut()?,
    };
    sample(
        &mut planes,
        format,
        src_w,
        dst_w,
        dst_h,
        Direction::Forward,
        |x, y| grid.map(x, y),
    )
}

/// Downscales the whole of `src` into `dst`, visiting pixels in
/// `direction`.
///
/// Intended for `dst` no larger than `src`; that is not re-checked. On
/// separate buffers both directions give the same result.
///
/// # Errors
///
/// Same as [`resize`] without the ROI checks.
#[instrument(level = "trace", skip_all, fields(src = %src, dst = %dst, %direction))]
pub fn downscale(src: &Image<'_>, dst: &mut Image<'_>, direction: Direction) -> Result<()> {
    check_pair(src, dst)?;
    let area = Bounds::full(src);
    if area.is_empty() {
        return Err(Error::WrongRoi(area.to_rect()));
    }

    let grid = Grid::new(area, dst.width(), dst.height());
    let (format, src_w, dst_w, dst_h) = (
        src.format(),
        src.width() as usize,
        dst.width() as usize,
        dst.height() as usize,
    );
    let mut planes = Planes::Disjoint {
        src: src.data()?,
        dst: dst.data_mut()?,
    };
    sample(
        &mut planes,
        format,
        src_w,
        dst_w,
        dst_h,
        direction,
        |x, y| grid.map(x, y),
    )
}

/// Downscales an image into another region of the same buffer, picking
/// the scan direction from [`overlap::analyze_downscale`].
///
/// Returns the direction that was used.
///
/// # Errors
///
/// - `InvalidParameter`: a layout leaves `buf`, the formats differ or the
///   destination is empty.
/// - `UnsupportedFormat`: Bayer input.
/// - `NotAllowed`: no scan order is safe for these spans.
#[instrument(level = "trace", skip(buf))]
pub fn downscale_with_overlap(buf: &mut [u8], src: &Layout, dst: &Layout) -> Result<Direction> {
    let (src_range, dst_range) = check_layouts(buf, src, dst)?;
    if src.format == PixelFormat::Bayer {
        return Err(Error::UnsupportedFormat(src.format));
    }
    if src.format != dst.format {
        return Err(Error::InvalidParameter("images differ in format"));
    }
    if dst.width < 1 || dst.height < 1 {
        return Err(Error::InvalidParameter("destination must be at least 1x1"));
    }
    let area = Bounds::whole(src.width, src.height);
    if area.is_empty() {
        return Err(Error::WrongRoi(area.to_rect()));
    }

    let verdict = overlap::analyze_downscale(src.span(), dst.span());
    let Some(direction) = verdict.direction() else {
        debug!(?verdict, "downscale refused");
        return Err(Error::NotAllowed);
    };
    debug!(%direction, "downscale with overlap");

    let grid = Grid::new(area, dst.width, dst.height);
    let mut planes = Planes::Aliased {
        buf,
        src: src_range,
        dst: dst_range,
    };
    sample(
        &mut planes,
        src.format,
        src.width as usize,
        dst.width as usize,
        dst.height as usize,
        direction,
        |x, y| grid.map(x, y),
    )?;
    Ok(direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_floor_mapping() {
        let grid = Grid::new(Bounds::whole(4, 4), 2, 2);
        assert_eq!(grid.map(0, 0), (0, 0));
        assert_eq!(grid.map(1, 0), (2, 0));
        assert_eq!(grid.map(0, 1), (0, 2));
        assert_eq!(grid.map(1, 1), (2, 2));
    }

    #[test]
    fn test_grid_enlarge_biases_top_left() {
        let area = Bounds {
            x: 1,
            y: 2,
            width: 2,
            height: 1,
        };
        let grid = Grid::new(area, 4, 3);
        let xs: Vec<usize> = (0..4).map(|x| grid.map(x, 0).0).collect();
        let ys: Vec<usize> = (0..3).map(|y| grid.map(0, y).1).collect();
        assert_eq!(xs, [1, 1, 2, 2]);
        assert_eq!(ys, [2, 2, 2]);
    }
}
