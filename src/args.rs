// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use ipl::{PixelFormat, Rect};
use std::path::PathBuf;

/// Pixel formats accepted on the command line.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum FormatSetting {
    /// 1 bit per pixel, rows padded to 32-bit words
    Binary,
    /// 8-bit luma
    Grayscale,
    /// 16-bit packed 5-6-5 RGB, little-endian
    Rgb565,
    /// 24-bit RGB, R first
    Rgb888,
    /// 8-bit raw sensor data
    Bayer,
}

impl From<FormatSetting> for PixelFormat {
    fn from(setting: FormatSetting) -> Self {
        match setting {
            FormatSetting::Binary => PixelFormat::Binary,
            FormatSetting::Grayscale => PixelFormat::Grayscale,
            FormatSetting::Rgb565 => PixelFormat::Rgb565,
            FormatSetting::Rgb888 => PixelFormat::Rgb888,
            FormatSetting::Bayer => PixelFormat::Bayer,
        }
    }
}

/// Command-line arguments for the IPL raw image tool.
///
/// Images are read from and written to headerless files holding exactly
/// the pixel data of one image. Global options can also be set through
/// environment variables.
///
/// # Example
///
/// ```bash
/// # Expand a 320x240 RGB565 frame to RGB888 inside one buffer
/// ipl convert frame.565 frame.888 --size 320 240 --from rgb565 --to rgb888 --in-place
///
/// # Thumbnail the center of a grayscale frame
/// export VERBOSE=true
/// ipl resize frame.y8 thumb.y8 --size 320 240 --format grayscale --to 80 60 --roi 80 60 160 120
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, env = "VERBOSE", global = true)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY", global = true)]
    pub tracy: bool,

    /// Send logs to the systemd journal
    #[arg(long, env = "JOURNALD", global = true)]
    pub journald: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the memory layout of an image as JSON
    Info {
        /// Image resolution in pixels (width height)
        #[arg(long, value_delimiter = ' ', num_args = 2)]
        size: Vec<u32>,

        /// Pixel format
        #[arg(long, value_enum)]
        format: FormatSetting,
    },

    /// Convert a raw image to another pixel format
    Convert {
        /// Input raw pixel file
        input: PathBuf,

        /// Output raw pixel file
        output: PathBuf,

        /// Image resolution in pixels (width height)
        #[arg(long, value_delimiter = ' ', num_args = 2)]
        size: Vec<u32>,

        /// Input pixel format
        #[arg(long, value_enum)]
        from: FormatSetting,

        /// Output pixel format
        #[arg(long, value_enum)]
        to: FormatSetting,

        /// Convert inside a single buffer sized for the larger image
        #[arg(long)]
        in_place: bool,
    },

    /// Resize a raw image, optionally from a region of interest
    Resize {
        /// Input raw pixel file
        input: PathBuf,

        /// Output raw pixel file
        output: PathBuf,

        /// Input resolution in pixels (width height)
        #[arg(long, value_delimiter = ' ', num_args = 2)]
        size: Vec<u32>,

        /// Pixel format of both images
        #[arg(long, value_enum)]
        format: FormatSetting,

        /// Output resolution in pixels (width height)
        #[arg(long, value_delimiter = ' ', num_args = 2)]
        to: Vec<u32>,

        /// Source region of interest (x y width height)
        #[arg(long, value_delimiter = ' ', num_args = 4)]
        roi: Option<Vec<i32>>,
    },

    /// Downscale a whole raw image
    Downscale {
        /// Input raw pixel file
        input: PathBuf,

        /// Output raw pixel file
        output: PathBuf,

        /// Input resolution in pixels (width height)
        #[arg(long, value_delimiter = ' ', num_args = 2)]
        size: Vec<u32>,

        /// Pixel format of both images
        #[arg(long, value_enum)]
        format: FormatSetting,

        /// Output resolution in pixels (width height)
        #[arg(long, value_delimiter = ' ', num_args = 2)]
        to: Vec<u32>,

        /// Visit pixels from last to first
        #[arg(long)]
        reverse: bool,
    },
}

/// Splits a `num_args = 2` size argument into width and height.
pub fn dims(size: &[u32]) -> (u32, u32) {
    match size {
        [width, height, ..] => (*width, *height),
        _ => (0, 0),
    }
}

/// Builds a rectangle from a `num_args = 4` ROI argument.
pub fn rect(roi: &[i32]) -> Rect {
    match roi {
        [x, y, width, height, ..] => Rect::new(*x, *y, *width, *height),
        _ => Rect::default(),
    }
}
