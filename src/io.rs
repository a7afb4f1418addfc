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

//! Image loading and saving.
//!
//! Decoding needs no global setup, the codecs are picked per file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageBuffer, ImageError};
use log::debug;
use ndarray::prelude::*;
use ndarray::ShapeError;
use thiserror::Error;

use crate::error::SortError;
use crate::key::SortKey;
use crate::sort::{pixelsort_inplace, Config};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot open image: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot decode image: {0}")]
    Decode(#[from] ImageError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Cannot encode image: {0}")]
    Encode(#[from] ImageError),

    #[error("No image layout with {0} channel(s)")]
    Layout(usize),
}

/// Decoded pixels, shape `(height, width, channels)`.
///
/// Channels are L, LA, RGB or RGBA, in that order.
#[derive(Debug, Clone, PartialEq)]
pub enum Picture {
    Eight(Array3<u8>),
    Sixteen(Array3<u16>),
}

fn to_array<T>(
    width: u32,
    height: u32,
    channels: usize,
    raw: Vec<T>,
) -> Result<Array3<T>, ShapeError> {
    Array3::from_shape_vec((height as usize, width as usize, channels), raw)
}

fn decode(path: &Path) -> Result<DynamicImage, LoadError> {
    Ok(ImageReader::new(BufReader::new(File::open(path)?))
        .with_guessed_format()?
        .decode()?)
}

impl Picture {
    /// Height and width.
    pub fn dim(&self) -> (usize, usize) {
        let (h, w, _) = match self {
            Self::Eight(a) => a.dim(),
            Self::Sixteen(a) => a.dim(),
        };
        (h, w)
    }

    pub fn channels(&self) -> usize {
        match self {
            Self::Eight(a) => a.len_of(Axis(2)),
            Self::Sixteen(a) => a.len_of(Axis(2)),
        }
    }

    /// Sorts the picture in place. See [`pixelsort_inplace`].
    pub fn sort<K>(
        &mut self,
        mask: ArrayView2<'_, u8>,
        config: &Config,
        key: &K,
    ) -> Result<(), SortError>
    where
        K: SortKey<u8> + SortKey<u16> + ?Sized,
    {
        match self {
            Self::Eight(a) => pixelsort_inplace(a.view_mut(), mask, config, key),
            Self::Sixteen(a) => pixelsort_inplace(a.view_mut(), mask, config, key),
        }
    }

    fn into_dynamic(self) -> Result<DynamicImage, SaveError> {
        let im = match self {
            Self::Eight(a) => {
                let (h, w, c) = a.dim();
                let (w, h) = (w as u32, h as u32);
                let raw: Vec<u8> = a.iter().copied().collect();
                match c {
                    1 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
                    2 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageLumaA8),
                    3 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
                    4 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
                    _ => None,
                }
                .ok_or(SaveError::Layout(c))?
            }
            Self::Sixteen(a) => {
                let (h, w, c) = a.dim();
                let (w, h) = (w as u32, h as u32);
                let raw: Vec<u16> = a.iter().copied().collect();
                match c {
                    1 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageLuma16),
                    2 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageLumaA16),
                    3 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageRgb16),
                    4 => ImageBuffer::from_raw(w, h, raw).map(DynamicImage::ImageRgba16),
                    _ => None,
                }
                .ok_or(SaveError::Layout(c))?
            }
        };
        Ok(im)
    }

    /// Writes the picture, format chosen by file extension.
    pub fn save(self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        self.into_dynamic()?.save(path)?;
        Ok(())
    }
}

/// Loads an image, keeping its channel layout and bit depth.
///
/// Float images become 16-bit, anything else unusual becomes RGBA8.
pub fn load_picture(path: impl AsRef<Path>) -> Result<Picture, LoadError> {
    let im = decode(path.as_ref())?;
    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.as_ref().display(),
        im.width(),
        im.height(),
        im.color(),
    );

    let (w, h) = (im.width(), im.height());
    Ok(match im {
        DynamicImage::ImageLuma8(b) => Picture::Eight(to_array(w, h, 1, b.into_raw())?),
        DynamicImage::ImageLumaA8(b) => Picture::Eight(to_array(w, h, 2, b.into_raw())?),
        DynamicImage::ImageRgb8(b) => Picture::Eight(to_array(w, h, 3, b.into_raw())?),
        DynamicImage::ImageRgba8(b) => Picture::Eight(to_array(w, h, 4, b.into_raw())?),
        DynamicImage::ImageLuma16(b) => Picture::Sixteen(to_array(w, h, 1, b.into_raw())?),
        DynamicImage::ImageLumaA16(b) => Picture::Sixteen(to_array(w, h, 2, b.into_raw())?),
        DynamicImage::ImageRgb16(b) => Picture::Sixteen(to_array(w, h, 3, b.into_raw())?),
        DynamicImage::ImageRgba16(b) => Picture::Sixteen(to_array(w, h, 4, b.into_raw())?),
        im @ DynamicImage::ImageRgb32F(_) => {
            Picture::Sixteen(to_array(w, h, 3, im.into_rgb16().into_raw())?)
        }
        im @ DynamicImage::ImageRgba32F(_) => {
            Picture::Sixteen(to_array(w, h, 4, im.into_rgba16().into_raw())?)
        }
        im => Picture::Eight(to_array(w, h, 4, im.into_rgba8().into_raw())?),
    })
}

/// Loads a mask as 8-bit greyscale, shape `(height, width)`.
pub fn load_mask(path: impl AsRef<Path>) -> Result<Array2<u8>, LoadError> {
    let mi = decode(path.as_ref())?.into_luma8();
    let (w, h) = (mi.width() as usize, mi.height() as usize);
    Ok(Array2::from_shape_vec((h, w), mi.into_raw())?)
}
