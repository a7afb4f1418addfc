//! Main Program for Pixelsort
//! Run with `--help` for more instruction

// Copyright (C) 2023 Dheatly23
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::path::PathBuf;

use anyhow::{Context, Error};
use clap::Parser;
use log::{info, warn};
use ndarray::prelude::*;
use pixelsort::io::{load_mask, load_picture};
use pixelsort::{ConfigBuilder, Direction, KeyFunction, MaskMode};

#[derive(Parser, Debug)]
#[command(author, version)]
struct Args {
    /// Input file
    input: PathBuf,

    /// Sort direction ('v' sorts columns, 'h' sorts rows)
    direction: Direction,

    /// Mask file (greyscale, same size as input)
    #[arg(short = 'm', long)]
    mask: Option<PathBuf>,

    /// Sort key (channel:N, luminance, sum or hue)
    #[arg(short = 'k', long, default_value = "channel:0")]
    key: KeyFunction,

    /// How the mask restricts sorting (ignore, select:T or spans:T)
    #[arg(long, default_value = "ignore")]
    mask_mode: MaskMode,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Sort on the main thread only
    #[arg(long)]
    sequential: bool,

    /// Output file
    #[arg(short = 'o', long)]
    output: PathBuf,
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()?;
    }

    let config = ConfigBuilder::new()
        .direction(args.direction)
        .mask_mode(args.mask_mode)
        .parallel(!args.sequential)
        .build();

    let mut picture = load_picture(&args.input)
        .with_context(|| format!("Loading {}", args.input.display()))?;
    let (height, width) = picture.dim();
    info!(
        "Sorting {}x{} image ({} channels), {:?} by {:?}",
        width,
        height,
        picture.channels(),
        config.direction,
        args.key,
    );

    let mask = if let Some(p) = &args.mask {
        if config.mask_mode == MaskMode::Ignore {
            warn!("Mask has no effect with --mask-mode ignore");
        }
        load_mask(p).with_context(|| format!("Loading mask {}", p.display()))?
    } else {
        <Array2<u8>>::from_elem((height, width), 255)
    };

    picture.sort(mask.view(), &config, &args.key)?;

    picture
        .save(&args.output)
        .with_context(|| format!("Saving {}", args.output.display()))?;

    Ok(())
}
