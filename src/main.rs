// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::{dims, rect, Args, Command, FormatSetting};
use clap::Parser;
use ipl::{
    checked_data_size, checked_row_stride, convert, convert_with_overlap, data_size, downscale,
    resize, Direction, Image, Layout, PixelFormat,
};
use serde_json::json;
use std::{error::Error, fs, path::Path, time::Instant};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod args;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args);

    match args.command {
        Command::Info { size, format } => info_cmd(&size, format),
        Command::Convert {
            input,
            output,
            size,
            from,
            to,
            in_place,
        } => convert_cmd(&input, &output, &size, from, to, in_place),
        Command::Resize {
            input,
            output,
            size,
            format,
            to,
            roi,
        } => resize_cmd(&input, &output, &size, format, &to, roi.as_deref()),
        Command::Downscale {
            input,
            output,
            size,
            format,
            to,
            reverse,
        } => {
            let direction = if reverse {
                Direction::Reverse
            } else {
                Direction::Forward
            };
            downscale_cmd(&input, &output, &size, format, &to, direction)
        }
    }
}

fn init_tracing(args: &Args) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let journald = if args.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer),
            Err(e) => {
                eprintln!("journald unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default())
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(journald)
        .with(tracy)
        .init();
}

fn read_image(
    path: &Path,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let expected = checked_data_size(width, height, format)
        .ok_or_else(|| format!("a {width}x{height} {format} image does not fit in memory"))?;
    let data = fs::read(path)?;
    if data.len() < expected {
        return Err(format!(
            "{} holds {} bytes but a {width}x{height} {format} image needs {expected}",
            path.display(),
            data.len(),
        )
        .into());
    }
    if data.len() > expected {
        warn!(
            "{} has {} trailing bytes, ignoring them",
            path.display(),
            data.len() - expected
        );
    }
    Ok(data)
}

fn write_image(path: &Path, data: &[u8]) -> Result<(), Box<dyn Error>> {
    fs::write(path, data)?;
    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

fn info_cmd(size: &[u32], format: FormatSetting) -> Result<(), Box<dyn Error>> {
    let (width, height) = dims(size);
    let format = PixelFormat::from(format);
    let info = json!({
        "width": width,
        "height": height,
        "format": format.to_string(),
        "size": checked_data_size(width, height, format),
        "stride": checked_row_stride(format, width),
    });
    println!("{info}");
    Ok(())
}

fn convert_cmd(
    input: &Path,
    output: &Path,
    size: &[u32],
    from: FormatSetting,
    to: FormatSetting,
    in_place: bool,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = dims(size);
    let (from, to) = (PixelFormat::from(from), PixelFormat::from(to));
    let data = read_image(input, width, height, from)?;
    let now = Instant::now();

    if in_place {
        // Source staged at the tail, destination written from the head.
        // read_image already checked that the source size fits.
        let src_size = data_size(width, height, from);
        let dst_size = checked_data_size(width, height, to)
            .ok_or_else(|| format!("a {width}x{height} {to} image does not fit in memory"))?;
        let total = src_size.max(dst_size);
        let mut buf = vec![0u8; total];
        buf[total - src_size..].copy_from_slice(&data[..src_size]);

        let src = Layout::new(total - src_size, width, height, from);
        let dst = Layout::new(0, width, height, to);
        let direction = convert_with_overlap(&mut buf, &src, &dst)?;
        info!(
            "converted {width}x{height} {from} to {to} in place ({direction}) in {:?}",
            now.elapsed()
        );
        return write_image(output, &buf[..dst_size]);
    }

    let src = Image::new_shared(width, height, from, &data)?;
    let mut dst = Image::alloc(width, height, to)?;
    convert(&src, &mut dst)?;
    info!(
        "converted {width}x{height} {from} to {to} in {:?}",
        now.elapsed()
    );
    write_image(output, dst.as_slice().unwrap_or_default())
}

fn resize_cmd(
    input: &Path,
    output: &Path,
    size: &[u32],
    format: FormatSetting,
    to: &[u32],
    roi: Option<&[i32]>,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = dims(size);
    let (dst_width, dst_height) = dims(to);
    let format = PixelFormat::from(format);
    let data = read_image(input, width, height, format)?;

    let src = Image::new_shared(width, height, format, &data)?;
    let mut dst = Image::alloc(dst_width, dst_height, format)?;
    let roi = roi.map(rect);
    let now = Instant::now();
    resize(&src, &mut dst, roi)?;
    info!(
        "resized {} to {} (roi {}) in {:?}",
        src,
        dst,
        roi.map_or_else(|| "full".to_owned(), |roi| roi.to_string()),
        now.elapsed()
    );
    write_image(output, dst.as_slice().unwrap_or_default())
}

fn downscale_cmd(
    input: &Path,
    output: &Path,
    size: &[u32],
    format: FormatSetting,
    to: &[u32],
    direction: Direction,
) -> Result<(), Box<dyn Error>> {
    let (width, height) = dims(size);
    let (dst_width, dst_height) = dims(to);
    let format = PixelFormat::from(format);
    let data = read_image(input, width, height, format)?;

    let src = Image::new_shared(width, height, format, &data)?;
    let mut dst = Image::alloc(dst_width, dst_height, format)?;
    let now = Instant::now();
    downscale(&src, &mut dst, direction)?;
    info!(
        "downscaled {} to {} ({direction}) in {:?}",
        src,
        dst,
        now.elapsed()
    );
    write_image(output, dst.as_slice().unwrap_or_default())
}
