// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use ipl::{
    convert, convert_rev, convert_with_overlap, convert_with_policy, data_size, Direction, Error,
    Image, Layout, PixelFormat, Policy,
};
use std::error::Error as StdError;

const FORMATS: [PixelFormat; 4] = [
    PixelFormat::Binary,
    PixelFormat::Grayscale,
    PixelFormat::Rgb565,
    PixelFormat::Rgb888,
];

/// Deterministic pseudo-random bytes.
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn binary_pattern(width: u32, height: u32) -> Result<Image<'static>, Box<dyn StdError>> {
    let mut img = Image::alloc(width, height, PixelFormat::Binary)?;
    for y in 0..height {
        for x in 0..width {
            img.set_pixel(x, y, u32::from((x * 7 + y * 3) % 5 < 2))?;
        }
    }
    Ok(img)
}

fn converted(src: &Image<'_>, to: PixelFormat) -> Result<Vec<u8>, Box<dyn StdError>> {
    let mut dst = Image::alloc(src.width(), src.height(), to)?;
    convert(src, &mut dst)?;
    Ok(dst.as_slice().unwrap_or_default().to_vec())
}

#[test]
fn test_binary_round_trip() -> Result<(), Box<dyn StdError>> {
    let src = binary_pattern(37, 3)?;

    for format in FORMATS {
        let mut mid = Image::alloc(37, 3, format)?;
        convert(&src, &mut mid)?;
        let mut back = Image::alloc(37, 3, PixelFormat::Binary)?;
        convert(&mid, &mut back)?;
        assert_eq!(back.as_slice(), src.as_slice(), "via {format}");
    }

    Ok(())
}

#[test]
fn test_grayscale_rgb888_round_trip() -> Result<(), Box<dyn StdError>> {
    let data: Vec<u8> = (0..=255).collect();
    let src = Image::new_shared(16, 16, PixelFormat::Grayscale, &data)?;

    let rgb = converted(&src, PixelFormat::Rgb888)?;
    let rgb = Image::new_shared(16, 16, PixelFormat::Rgb888, &rgb)?;
    assert_eq!(rgb.get_pixel(1, 8)?, 0x818181);

    assert_eq!(converted(&rgb, PixelFormat::Grayscale)?, data);
    Ok(())
}

#[test]
fn test_rgb565_rgb888_round_trip() -> Result<(), Box<dyn StdError>> {
    // Every 16-bit value once.
    let data: Vec<u8> = (0..=u16::MAX).flat_map(u16::to_le_bytes).collect();
    let src = Image::new_shared(256, 256, PixelFormat::Rgb565, &data)?;

    let rgb = converted(&src, PixelFormat::Rgb888)?;
    let rgb = Image::new_shared(256, 256, PixelFormat::Rgb888, &rgb)?;
    assert_eq!(converted(&rgb, PixelFormat::Rgb565)?, data);

    Ok(())
}

#[test]
fn test_rgb888_rgb565_round_trip_error() -> Result<(), Box<dyn StdError>> {
    // Every value of R and G, B varying with both.
    let mut data = Vec::with_capacity(256 * 256 * 3);
    for y in 0..256u32 {
        for x in 0..256u32 {
            data.extend_from_slice(&[x as u8, y as u8, (x + y) as u8]);
        }
    }
    let src = Image::new_shared(256, 256, PixelFormat::Rgb888, &data)?;

    let packed = converted(&src, PixelFormat::Rgb565)?;
    let packed = Image::new_shared(256, 256, PixelFormat::Rgb565, &packed)?;
    let back = converted(&packed, PixelFormat::Rgb888)?;

    for (i, (a, b)) in data.iter().zip(&back).enumerate() {
        assert!(a.abs_diff(*b) <= 4, "byte {i}: {a} vs {b}");
    }

    Ok(())
}

#[test]
fn test_channel_order() -> Result<(), Box<dyn StdError>> {
    let rgb = [0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF];
    let src = Image::new_shared(3, 1, PixelFormat::Rgb888, &rgb)?;
    let packed = converted(&src, PixelFormat::Rgb565)?;
    assert_eq!(packed, [0x00, 0xF8, 0xE0, 0x07, 0x1F, 0x00]);

    let src = Image::new_shared(3, 1, PixelFormat::Rgb565, &packed)?;
    assert_eq!(converted(&src, PixelFormat::Rgb888)?, rgb);
    assert_eq!(converted(&src, PixelFormat::Grayscale)?, [75, 149, 29]);

    Ok(())
}

#[test]
fn test_thresholds() -> Result<(), Box<dyn StdError>> {
    let gray = [0, 127, 128, 255];
    let src = Image::new_shared(4, 1, PixelFormat::Grayscale, &gray)?;
    assert_eq!(converted(&src, PixelFormat::Binary)?, [0b1100, 0, 0, 0]);

    // Pure red has a luma of 75 and stays black, white sets the bit.
    let rgb = [0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF];
    let src = Image::new_shared(2, 1, PixelFormat::Rgb888, &rgb)?;
    assert_eq!(converted(&src, PixelFormat::Binary)?, [0b10, 0, 0, 0]);

    Ok(())
}

#[test]
fn test_binary_lsb_first() -> Result<(), Box<dyn StdError>> {
    let word = 0xAAAAAAAAu32.to_le_bytes();
    let src = Image::new_shared(32, 1, PixelFormat::Binary, &word)?;

    let gray = converted(&src, PixelFormat::Grayscale)?;
    for (x, value) in gray.iter().enumerate() {
        let expected = if x % 2 == 0 { 0x00 } else { 0xFF };
        assert_eq!(*value, expected, "x {x}");
    }

    let rgb565 = converted(&src, PixelFormat::Rgb565)?;
    assert_eq!(&rgb565[..4], &[0x00, 0x00, 0xFF, 0xFF]);
    Ok(())
}

#[test]
fn test_writes_exactly_data_size() -> Result<(), Box<dyn StdError>> {
    const SENTINEL: u8 = 0xA5;
    let (width, height) = (35, 3);

    for from in FORMATS {
        let data = vec![0u8; data_size(width, height, from)];
        let src = Image::new_shared(width, height, from, &data)?;

        for to in FORMATS {
            let size = data_size(width, height, to);
            let mut buf = vec![SENTINEL; size + 16];
            let mut dst = Image::new_view(width, height, to, &mut buf)?;
            convert(&src, &mut dst)?;
            drop(dst);

            assert!(
                buf[size..].iter().all(|&b| b == SENTINEL),
                "{from} -> {to} wrote past {size} bytes"
            );
            if to != PixelFormat::Binary {
                assert!(
                    buf[..size].iter().all(|&b| b == 0),
                    "{from} -> {to} left bytes unwritten"
                );
            }
        }
    }

    Ok(())
}

#[test]
fn test_reverse_matches_forward() -> Result<(), Box<dyn StdError>> {
    let (width, height) = (19, 7);

    for from in FORMATS {
        let data = noise(data_size(width, height, from), 7);
        let src = Image::new_shared(width, height, from, &data)?;

        for to in FORMATS {
            let mut forward = Image::alloc(width, height, to)?;
            let mut reverse = Image::alloc(width, height, to)?;
            convert_rev(&src, &mut forward, Direction::Forward)?;
            convert_rev(&src, &mut reverse, Direction::Reverse)?;
            assert_eq!(forward.as_slice(), reverse.as_slice(), "{from} -> {to}");
        }
    }

    Ok(())
}

#[test]
fn test_preconditions() -> Result<(), Box<dyn StdError>> {
    let data = [1u8; 16];
    let src = Image::new_shared(4, 4, PixelFormat::Grayscale, &data)?;

    let mut small = Image::alloc(4, 3, PixelFormat::Rgb888)?;
    assert_eq!(
        convert(&src, &mut small),
        Err(Error::InvalidParameter("images differ in resolution"))
    );
    assert!(small.as_slice().is_some_and(|d| d.iter().all(|&b| b == 0)));

    let mut bayer = Image::alloc(4, 4, PixelFormat::Bayer)?;
    assert_eq!(
        convert(&src, &mut bayer),
        Err(Error::UnsupportedFormat(PixelFormat::Bayer))
    );

    let empty = Image::empty(4, 4, PixelFormat::Grayscale);
    let mut dst = Image::alloc(4, 4, PixelFormat::Grayscale)?;
    assert!(matches!(
        convert(&empty, &mut dst),
        Err(Error::InvalidParameter(_))
    ));

    let mut read_only = src.copy()?;
    assert_eq!(
        convert(&src, &mut read_only),
        Err(Error::InvalidParameter("image is read-only"))
    );

    Ok(())
}

#[test]
fn test_in_place_expansion_matches_disjoint() -> Result<(), Box<dyn StdError>> {
    let pairs = [
        (PixelFormat::Grayscale, PixelFormat::Rgb565, 35),
        (PixelFormat::Grayscale, PixelFormat::Rgb888, 35),
        (PixelFormat::Rgb565, PixelFormat::Rgb888, 35),
        (PixelFormat::Binary, PixelFormat::Grayscale, 64),
        (PixelFormat::Binary, PixelFormat::Rgb565, 64),
        (PixelFormat::Binary, PixelFormat::Rgb888, 64),
    ];
    let height = 4;

    for (from, to, width) in pairs {
        let data = noise(data_size(width, height, from), width);
        let src = Image::new_shared(width, height, from, &data)?;
        let expected = converted(&src, to)?;

        let src_size = data_size(width, height, from);
        let dst_size = data_size(width, height, to);
        let mut buf = vec![0u8; dst_size];
        buf[dst_size - src_size..].copy_from_slice(&data);

        let direction = convert_with_overlap(
            &mut buf,
            &Layout::new(dst_size - src_size, width, height, from),
            &Layout::new(0, width, height, to),
        )?;
        assert_eq!(direction, Direction::Forward);
        assert_eq!(buf, expected, "{from} -> {to}");
    }

    Ok(())
}

#[test]
fn test_in_place_binary_row_padding() -> Result<(), Box<dyn StdError>> {
    // 33 pixels pack into 5 bytes but rows are padded to 8, so the write
    // cursor catches up with the read cursor before the spans would say.
    let (width, height) = (33, 3);
    let src_size = data_size(width, height, PixelFormat::Binary);
    let data = noise(src_size, width);
    let src = Image::new_shared(width, height, PixelFormat::Binary, &data)?;

    for to in [
        PixelFormat::Grayscale,
        PixelFormat::Rgb565,
        PixelFormat::Rgb888,
    ] {
        let expected = converted(&src, to)?;
        let dst_size = data_size(width, height, to);
        let dst = Layout::new(0, width, height, to);

        let mut buf = vec![0u8; dst_size];
        buf[dst_size - src_size..].copy_from_slice(&data);
        let before = buf.clone();
        assert_eq!(
            convert_with_overlap(
                &mut buf,
                &Layout::new(dst_size - src_size, width, height, PixelFormat::Binary),
                &dst,
            ),
            Err(Error::NotAllowed),
            "{to}"
        );
        assert_eq!(buf, before, "{to}");

        // One padded row of slack keeps the writes behind the reads.
        let total = dst_size + 8;
        let mut buf = vec![0u8; total];
        buf[total - src_size..].copy_from_slice(&data);
        let direction = convert_with_overlap(
            &mut buf,
            &Layout::new(total - src_size, width, height, PixelFormat::Binary),
            &dst,
        )?;
        assert_eq!(direction, Direction::Forward);
        assert_eq!(buf[..dst_size], expected[..], "{to}");
    }

    Ok(())
}

#[test]
fn test_in_place_reverse() -> Result<(), Box<dyn StdError>> {
    let mut buf = [10, 20, 30, 40, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let src = Layout::new(0, 4, 1, PixelFormat::Grayscale);
    let dst = Layout::new(2, 4, 1, PixelFormat::Rgb888);

    assert_eq!(convert_with_overlap(&mut buf, &src, &dst)?, Direction::Reverse);
    assert_eq!(buf[2..], [10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40]);
    Ok(())
}

#[test]
fn test_in_place_refused() -> Result<(), Box<dyn StdError>> {
    // Shrinking RGB888 to grayscale never leaves enough margin.
    let mut buf: Vec<u8> = (0..16).collect();
    let before = buf.clone();
    let src = Layout::new(0, 2, 2, PixelFormat::Rgb888);
    let dst = Layout::new(12, 2, 2, PixelFormat::Grayscale);
    assert_eq!(
        convert_with_overlap(&mut buf, &src, &dst),
        Err(Error::NotAllowed)
    );
    assert_eq!(buf, before);

    let same = Layout::new(0, 2, 2, PixelFormat::Rgb565);
    assert!(matches!(
        convert_with_overlap(&mut buf, &src, &same),
        Err(Error::InvalidParameter(_))
    ));

    let outside = Layout::new(8, 2, 2, PixelFormat::Rgb888);
    assert_eq!(
        convert_with_overlap(&mut buf, &dst, &outside),
        Err(Error::InvalidParameter("layout exceeds buffer"))
    );

    let wider = Layout::new(12, 4, 1, PixelFormat::Grayscale);
    assert_eq!(
        convert_with_overlap(&mut buf, &src, &wider),
        Err(Error::InvalidParameter("images differ in resolution"))
    );

    let bayer = Layout::new(12, 2, 2, PixelFormat::Bayer);
    assert_eq!(
        convert_with_overlap(&mut buf, &src, &bayer),
        Err(Error::UnsupportedFormat(PixelFormat::Bayer))
    );
    assert_eq!(buf, before);

    Ok(())
}

#[test]
fn test_in_place_policy() -> Result<(), Box<dyn StdError>> {
    // 12 gray bytes at the tail of a 24 byte RGB565 destination.
    let mut buf = vec![0u8; 24];
    buf[12..].copy_from_slice(&[200; 12]);
    let src = Layout::new(12, 4, 3, PixelFormat::Grayscale);
    let dst = Layout::new(0, 4, 3, PixelFormat::Rgb565);

    // Growth 12 is below 24 / 1.
    assert_eq!(
        convert_with_policy(&mut buf, &src, &dst, &Policy::new(1)?),
        Err(Error::NotAllowed)
    );
    assert_eq!(
        convert_with_policy(&mut buf, &src, &dst, &Policy::new(2)?),
        Ok(Direction::Forward)
    );
    let gray = Image::new_shared(1, 1, PixelFormat::Grayscale, &[200])?;
    let pixel = converted(&gray, PixelFormat::Rgb565)?;
    assert!(buf.chunks(2).all(|c| c == pixel));

    Ok(())
}
