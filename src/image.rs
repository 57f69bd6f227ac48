// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    error::{Error, Result},
    overlap::Direction,
    pixel::{self, Planes},
};
use core::fmt;
use std::{ops::BitOr, str::FromStr};
use tracing::{debug, instrument};

/// Raster pixel formats.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 bit per pixel, rows padded to 32-bit words
    Binary,
    /// 8-bit luma
    Grayscale,
    /// 16-bit packed 5-6-5 RGB
    Rgb565,
    /// 24-bit RGB (8 bits per channel, R first)
    Rgb888,
    /// 8-bit raw sensor data; sized but not processed
    Bayer,
}

impl PixelFormat {
    /// The bit this format occupies in a [`FormatSet`], `None` for formats
    /// no operation accepts.
    const fn flag(self) -> Option<u8> {
        match self {
            PixelFormat::Binary => Some(1),
            PixelFormat::Grayscale => Some(2),
            PixelFormat::Rgb565 => Some(4),
            PixelFormat::Rgb888 => Some(8),
            PixelFormat::Bayer => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PixelFormat::Binary => "binary",
            PixelFormat::Grayscale => "grayscale",
            PixelFormat::Rgb565 => "rgb565",
            PixelFormat::Rgb888 => "rgb888",
            PixelFormat::Bayer => "bayer",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(PixelFormat::Binary),
            "grayscale" | "gray" | "y8" => Ok(PixelFormat::Grayscale),
            "rgb565" => Ok(PixelFormat::Rgb565),
            "rgb888" => Ok(PixelFormat::Rgb888),
            "bayer" => Ok(PixelFormat::Bayer),
            _ => Err(Error::InvalidParameter("unknown pixel format")),
        }
    }
}

/// A set of pixel formats an operation accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct FormatSet(u8);

impl FormatSet {
    pub const BINARY: FormatSet = FormatSet(1);
    pub const GRAYSCALE: FormatSet = FormatSet(2);
    pub const RGB565: FormatSet = FormatSet(4);
    pub const RGB888: FormatSet = FormatSet(8);
    pub const ALL: FormatSet = FormatSet(1 | 2 | 4 | 8);
    pub const RGB: FormatSet = FormatSet(4 | 8);
    pub const NOT_RGB: FormatSet = FormatSet(1 | 2);
    pub const NOT_RGB888: FormatSet = FormatSet(1 | 2 | 4);

    pub const fn contains(self, format: PixelFormat) -> bool {
        match format.flag() {
            Some(bit) => self.0 & bit != 0,
            None => false,
        }
    }
}

impl BitOr for FormatSet {
    type Output = FormatSet;

    fn bitor(self, rhs: Self) -> Self {
        FormatSet(self.0 | rhs.0)
    }
}

/// Bytes in one row of an image of the given format, `None` when the
/// count does not fit in `usize`.
pub const fn checked_row_stride(format: PixelFormat, width: u32) -> Option<usize> {
    let width = width as usize;
    match format {
        PixelFormat::Binary => pixel::binary_row_words(width).checked_mul(4),
        PixelFormat::Grayscale | PixelFormat::Bayer => Some(width),
        PixelFormat::Rgb565 => width.checked_mul(2),
        PixelFormat::Rgb888 => width.checked_mul(3),
    }
}

/// Bytes needed to hold a `width` x `height` image of the given format,
/// `None` when the count does not fit in `usize`.
pub const fn checked_data_size(width: u32, height: u32, format: PixelFormat) -> Option<usize> {
    match checked_row_stride(format, width) {
        Some(stride) => stride.checked_mul(height as usize),
        None => None,
    }
}

/// Bytes in one row of an image of the given format, saturating at
/// `usize::MAX`.
pub const fn row_stride(format: PixelFormat, width: u32) -> usize {
    match checked_row_stride(format, width) {
        Some(stride) => stride,
        None => usize::MAX,
    }
}

/// Bytes needed to hold a `width` x `height` image of the given format,
/// saturating at `usize::MAX`.
pub const fn data_size(width: u32, height: u32, format: PixelFormat) -> usize {
    match checked_data_size(width, height, format) {
        Some(size) => size,
        None => usize::MAX,
    }
}

fn checked_size(width: u32, height: u32, format: PixelFormat) -> Result<usize> {
    checked_data_size(width, height, format)
        .ok_or(Error::InvalidParameter("image size overflows usize"))
}

/// Converts a dimension to `i32`, saturating at `i32::MAX`.
pub(crate) fn saturate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// Exclusive end coordinate; never overflows.
const fn end(start: i32, len: i32) -> i64 {
    start as i64 + len as i64
}

const fn clamp(value: i64) -> i32 {
    if value > i32::MAX as i64 {
        i32::MAX
    } else if value < i32::MIN as i64 {
        i32::MIN
    } else {
        value as i32
    }
}

/// Rectangle for crop and region-of-interest operations.
///
/// Defines a rectangular region within an image for cropping,
/// resizing, or region-of-interest operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: i32,
    /// Y coordinate of top-left corner
    pub y: i32,
    /// Width of the rectangle in pixels
    pub width: i32,
    /// Height of the rectangle in pixels
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// True when width or height is not positive.
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when `other` lies entirely inside `self`.
    pub const fn contains(&self, other: &Rect) -> bool {
        self.x <= other.x
            && end(other.x, other.width) <= end(self.x, self.width)
            && self.y <= other.y
            && end(other.y, other.height) <= end(self.y, self.height)
    }

    /// True when the two rectangles share at least one pixel.
    pub const fn overlaps(&self, other: &Rect) -> bool {
        (self.x as i64) < end(other.x, other.width)
            && (other.x as i64) < end(self.x, self.width)
            && (self.y as i64) < end(other.y, other.height)
            && (other.y as i64) < end(self.y, self.height)
    }

    /// Smallest rectangle covering both. The size saturates at
    /// `i32::MAX`.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = end(self.x, self.width).max(end(other.x, other.width));
        let bottom = end(self.y, self.height).max(end(other.y, other.height));
        Rect::new(
            left,
            top,
            clamp(right - left as i64),
            clamp(bottom - top as i64),
        )
    }

    /// Common area of both; empty when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = end(self.x, self.width).min(end(other.x, other.width));
        let bottom = end(self.y, self.height).min(end(other.y, other.height));
        Rect::new(
            left,
            top,
            clamp(right - left as i64),
            clamp(bottom - top as i64),
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

enum Data<'a> {
    Empty,
    Owned(Vec<u8>),
    View(&'a mut [u8]),
    Shared(&'a [u8]),
}

/// Image descriptor over a contiguous pixel buffer.
///
/// The pixel data is either owned by the image (allocated through
/// [`Image::alloc`] and freed on [`Image::release`] or drop), borrowed
/// mutably from the caller ([`Image::new_view`]), borrowed read-only
/// ([`Image::new_shared`], [`Image::copy`]) or absent. Views are never
/// freed by the image. A present buffer is always exactly
/// [`data_size`] bytes long.
///
/// # Example
///
/// ```
/// use ipl::image::{Image, PixelFormat};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::alloc(320, 240, PixelFormat::Rgb565)?;
///
/// assert_eq!(img.width(), 320);
/// assert_eq!(img.height(), 240);
/// assert_eq!(img.format(), PixelFormat::Rgb565);
/// assert_eq!(img.size(), 320 * 240 * 2);
/// # Ok(())
/// # }
/// ```
pub struct Image<'a> {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Data<'a>,
}

fn alloc_bytes(size: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size).map_err(|_| Error::OutOfMemory(size))?;
    data.resize(size, 0);
    debug!("allocated {} bytes of pixel data", size);
    Ok(data)
}

impl<'a> Image<'a> {
    /// Describes an image with no pixel data.
    pub fn empty(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: Data::Empty,
        }
    }

    /// Wraps a caller-owned buffer for reading and writing.
    ///
    /// The buffer is trimmed to [`data_size`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `data` is shorter than the image or
    /// the image size overflows `usize`.
    pub fn new_view(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: &'a mut [u8],
    ) -> Result<Self> {
        let size = checked_size(width, height, format)?;
        if data.len() < size {
            return Err(Error::InvalidParameter("buffer smaller than image"));
        }
        Ok(Self {
            width,
            height,
            format,
            data: Data::View(&mut data[..size]),
        })
    }

    /// Wraps a caller-owned buffer for reading only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `data` is shorter than the image or
    /// the image size overflows `usize`.
    pub fn new_shared(width: u32, height: u32, format: PixelFormat, data: &'a [u8]) -> Result<Self> {
        let size = checked_size(width, height, format)?;
        if data.len() < size {
            return Err(Error::InvalidParameter("buffer smaller than image"));
        }
        Ok(Self {
            width,
            height,
            format,
            data: Data::Shared(&data[..size]),
        })
    }

    /// Allocates a zeroed pixel buffer owned by the new image.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the image size overflows `usize` and
    /// `OutOfMemory` if the buffer cannot be reserved.
    pub fn alloc(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let data = alloc_bytes(checked_size(width, height, format)?)?;
        Ok(Self {
            width,
            height,
            format,
            data: Data::Owned(data),
        })
    }

    /// Allocates an owned image with the size and format of `src`. No
    /// pixels are copied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `src` has no data and `OutOfMemory`
    /// if the buffer cannot be reserved.
    pub fn alloc_like(src: &Image<'_>) -> Result<Self> {
        src.data()?;
        Self::alloc(src.width, src.height, src.format)
    }

    /// Frees owned data, detaches borrowed data and resets the descriptor
    /// to an empty 0x0 image. The format is kept so the descriptor can be
    /// reallocated with [`clone_into`]. Calling it again is a no-op.
    pub fn release(&mut self) {
        if matches!(self.data, Data::Owned(_)) {
            debug!("released {} bytes of pixel data", self.size());
        }
        self.width = 0;
        self.height = 0;
        self.data = Data::Empty;
    }

    /// A read-only view sharing this image's pixel data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the image has no data.
    pub fn copy(&self) -> Result<Image<'_>> {
        let data = self.data()?;
        Ok(Image {
            width: self.width,
            height: self.height,
            format: self.format,
            data: Data::Shared(data),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Size in bytes of the pixel data for this image's geometry.
    pub fn size(&self) -> usize {
        data_size(self.width, self.height, self.format)
    }

    /// The full image rectangle `(0, 0, width, height)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a dimension exceeds `i32::MAX`.
    pub fn rect(&self) -> Result<Rect> {
        let (Ok(width), Ok(height)) = (i32::try_from(self.width), i32::try_from(self.height))
        else {
            return Err(Error::InvalidParameter("image too large for a rectangle"));
        };
        Ok(Rect::new(0, 0, width, height))
    }

    /// True when the image has pixel data.
    pub fn is_valid(&self) -> bool {
        !matches!(self.data, Data::Empty)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.data, Data::Owned(_))
    }

    pub fn is_format_supported(&self, formats: FormatSet) -> bool {
        formats.contains(self.format)
    }

    pub fn as_slice(&self) -> Option<&[u8]> {
        self.data().ok()
    }

    /// Mutable pixel data; `None` for empty and read-only images.
    pub fn as_slice_mut(&mut self) -> Option<&mut [u8]> {
        self.data_mut().ok()
    }

    pub(crate) fn data(&self) -> Result<&[u8]> {
        match &self.data {
            Data::Empty => Err(Error::InvalidParameter("image has no pixel data")),
            Data::Owned(data) => Ok(data),
            Data::View(data) => Ok(data),
            Data::Shared(data) => Ok(data),
        }
    }

    pub(crate) fn data_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.data {
            Data::Empty => Err(Error::InvalidParameter("image has no pixel data")),
            Data::Owned(data) => Ok(data),
            Data::View(data) => Ok(data),
            Data::Shared(_) => Err(Error::InvalidParameter("image is read-only")),
        }
    }

    /// Sets every byte of the pixel data to zero.
    pub fn zero(&mut self) -> Result<()> {
        check_format(self, FormatSet::ALL)?;
        self.data_mut()?.fill(0);
        Ok(())
    }

    /// Fills the image, or the `roi` part of it, with a `0xRRGGBB` color
    /// mapped to the image format.
    ///
    /// # Errors
    ///
    /// Returns `WrongRoi` if `roi` is empty or not inside the image.
    pub fn fill(&mut self, color: u32, roi: Option<Rect>) -> Result<()> {
        check_format(self, FormatSet::ALL)?;
        self.data_mut()?;
        let area = match roi {
            Some(roi) => check_roi(self, &roi)?,
            None => Bounds::full(self),
        };

        let value = color_to_value(self.format, color);
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                self.put(x, y, value)?;
            }
        }
        Ok(())
    }

    /// Reads one pixel in the format's native encoding: 0/1 for Binary,
    /// the byte for Grayscale, the packed word for RGB565 and `0xRRGGBB`
    /// for RGB888.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<u32> {
        check_format(self, FormatSet::ALL)?;
        let data = self.data()?;
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidParameter("pixel outside image"));
        }

        let (w, x, y) = (self.width as usize, x as usize, y as usize);
        let value = match self.format {
            PixelFormat::Binary => pixel::get_binary(data, w, x, y) as u32,
            PixelFormat::Grayscale => pixel::get_grayscale(data, w, x, y) as u32,
            PixelFormat::Rgb565 => pixel::get_rgb565(data, w, x, y) as u32,
            PixelFormat::Rgb888 => {
                let [r, g, b] = pixel::get_rgb888(data, w, x, y);
                (r as u32) << 16 | (g as u32) << 8 | b as u32
            }
            PixelFormat::Bayer => return Err(Error::UnsupportedFormat(self.format)),
        };
        Ok(value)
    }

    /// Writes one pixel given in the format's native encoding, see
    /// [`Image::get_pixel`].
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) -> Result<()> {
        check_format(self, FormatSet::ALL)?;
        self.data_mut()?;
        if x >= self.width || y >= self.height {
            return Err(Error::InvalidParameter("pixel outside image"));
        }
        self.put(x as usize, y as usize, value)
    }

    fn put(&mut self, x: usize, y: usize, value: u32) -> Result<()> {
        let w = self.width as usize;
        let format = self.format;
        let data = self.data_mut()?;
        match format {
            PixelFormat::Binary => pixel::put_binary(data, w, x, y, value != 0),
            PixelFormat::Grayscale => pixel::put_grayscale(data, w, x, y, value as u8),
            PixelFormat::Rgb565 => pixel::put_rgb565(data, w, x, y, value as u16),
            PixelFormat::Rgb888 => pixel::put_rgb888(
                data,
                w,
                x,
                y,
                [(value >> 16) as u8, (value >> 8) as u8, value as u8],
            ),
            PixelFormat::Bayer => return Err(Error::UnsupportedFormat(format)),
        }
        Ok(())
    }
}

impl fmt::Display for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.data {
            Data::Empty => "empty",
            Data::Owned(_) => "owned",
            Data::View(_) => "view",
            Data::Shared(_) => "shared",
        };
        write!(f, "{}x{} {} {}", self.width, self.height, self.format, kind)
    }
}

impl fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("data", &self.as_slice().map(<[u8]>::len))
            .finish()
    }
}

/// Maps a `0xRRGGBB` color to the native pixel value of `format`.
pub fn color_to_value(format: PixelFormat, color: u32) -> u32 {
    let (r, g, b) = ((color >> 16) as u8, (color >> 8) as u8, color as u8);
    match format {
        PixelFormat::Binary => pixel::grayscale_to_binary(pixel::luma(r, g, b)) as u32,
        PixelFormat::Grayscale => pixel::luma(r, g, b) as u32,
        PixelFormat::Rgb565 => pixel::rgb888_to_rgb565(r, g, b) as u32,
        PixelFormat::Rgb888 => color & 0x00FF_FFFF,
        PixelFormat::Bayer => 0,
    }
}

pub(crate) fn check_format(img: &Image<'_>, formats: FormatSet) -> Result<()> {
    if img.is_format_supported(formats) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(img.format))
    }
}

pub(crate) fn check_same_resolution(a: &Image<'_>, b: &Image<'_>) -> Result<()> {
    if a.width != b.width || a.height != b.height {
        return Err(Error::InvalidParameter("images differ in resolution"));
    }
    Ok(())
}

pub(crate) fn check_same_format(a: &Image<'_>, b: &Image<'_>) -> Result<()> {
    if a.format != b.format {
        return Err(Error::InvalidParameter("images differ in format"));
    }
    Ok(())
}

/// A pixel region already checked against an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    /// The whole of a `width` x `height` image.
    pub(crate) fn whole(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: width as usize,
            height: height as usize,
        }
    }

    pub(crate) fn full(img: &Image<'_>) -> Self {
        Self::whole(img.width, img.height)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The region as a [`Rect`], saturating at `i32::MAX`.
    pub(crate) fn to_rect(self) -> Rect {
        let fit = |v: usize| i32::try_from(v).unwrap_or(i32::MAX);
        Rect::new(fit(self.x), fit(self.y), fit(self.width), fit(self.height))
    }
}

/// A region of interest must have positive dimensions and lie inside the
/// image.
pub(crate) fn check_roi(img: &Image<'_>, roi: &Rect) -> Result<Bounds> {
    let inside =
        |start: i32, len: i32, extent: u32| start >= 0 && end(start, len) <= extent as i64;
    if roi.is_empty()
        || !inside(roi.x, roi.width, img.width)
        || !inside(roi.y, roi.height, img.height)
    {
        return Err(Error::WrongRoi(*roi));
    }
    Ok(Bounds {
        x: roi.x as usize,
        y: roi.y as usize,
        width: roi.width as usize,
        height: roi.height as usize,
    })
}

/// Copies the pixel data of `src` into the existing buffer of `dst`.
///
/// # Errors
///
/// Returns `InvalidParameter` if either image has no data, `dst` is
/// read-only, or the two differ in resolution or format.
pub fn copy_data(src: &Image<'_>, dst: &mut Image<'_>) -> Result<()> {
    let data = src.data()?;
    dst.data()?;
    check_same_resolution(src, dst)?;
    check_same_format(src, dst)?;
    dst.data_mut()?.copy_from_slice(data);
    Ok(())
}

/// Copies `src` into `dst`, allocating an owned buffer for `dst` when it
/// has none.
///
/// # Errors
///
/// Returns `InvalidParameter` if `src` has no data or `dst` has data of a
/// different resolution or format, and `OutOfMemory` if the allocation
/// fails (`dst` is left untouched).
pub fn clone_into(src: &Image<'_>, dst: &mut Image<'_>) -> Result<()> {
    let data = src.data()?;
    if dst.is_valid() {
        check_same_resolution(src, dst)?;
        check_same_format(src, dst)?;
        dst.data_mut()?.copy_from_slice(data);
    } else {
        let mut owned = alloc_bytes(data.len())?;
        owned.copy_from_slice(data);
        dst.width = src.width;
        dst.height = src.height;
        dst.format = src.format;
        dst.data = Data::Owned(owned);
    }
    Ok(())
}

/// Copies the `dst.width` x `dst.height` region at `(x, y)` of `src` into
/// `dst`.
///
/// # Errors
///
/// Returns `InvalidParameter` for missing data, differing formats or an
/// empty destination, `UnsupportedFormat` for Bayer and `WrongRoi` when
/// the region leaves the source.
#[instrument(level = "trace", skip(src, dst), fields(src = %src, dst = %dst))]
pub fn crop(src: &Image<'_>, dst: &mut Image<'_>, x: u32, y: u32) -> Result<()> {
    let data = src.data()?;
    dst.data_mut()?;
    check_format(src, FormatSet::ALL)?;
    check_same_format(src, dst)?;
    if dst.width < 1 || dst.height < 1 {
        return Err(Error::InvalidParameter("destination must be at least 1x1"));
    }
    let fits = |origin: u32, len: u32, extent: u32| origin as u64 + len as u64 <= extent as u64;
    if !fits(x, dst.width, src.width) || !fits(y, dst.height, src.height) {
        let roi = Rect::new(saturate(x), saturate(y), saturate(dst.width), saturate(dst.height));
        return Err(Error::WrongRoi(roi));
    }

    let (src_w, dst_w, dst_h) = (
        src.width as usize,
        dst.width as usize,
        dst.height as usize,
    );
    let (ox, oy) = (x as usize, y as usize);
    let format = src.format;
    let mut planes = Planes::Disjoint {
        src: data,
        dst: dst.data_mut()?,
    };
    crate::resize::sample(
        &mut planes,
        format,
        src_w,
        dst_w,
        dst_h,
        Direction::Forward,
        |x, y| (x + ox, y + oy),
    )
}
