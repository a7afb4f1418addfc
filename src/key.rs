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

//! Per-pixel sort keys.

use std::str::FromStr;

use ndarray::prelude::*;

use crate::error::SortError;

/// Something that maps a pixel (one lane along the channel axis) to an
/// orderable key.
///
/// Any `Fn(ArrayView1<A>) -> K` closure is a `SortKey`, so a custom order
/// does not need a new type.
pub trait SortKey<A>: Sync {
    type Key: Ord;

    fn key(&self, pixel: ArrayView1<'_, A>) -> Self::Key;

    /// Whether the key can be computed for pixels with `channels` channels.
    fn supports(&self, _channels: usize) -> bool {
        true
    }
}

impl<A, K, F> SortKey<A> for F
where
    F: Fn(ArrayView1<'_, A>) -> K + Sync,
    K: Ord,
{
    type Key = K;

    fn key(&self, pixel: ArrayView1<'_, A>) -> K {
        self(pixel)
    }
}

/// Built-in keys selectable from the command line.
///
/// Keys are computed in `u64`, wide enough for any `u32` channel.
///
/// Channels are read in whatever order the loader produced them,
/// they are never swapped around here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFunction {
    /// Value of a single channel.
    Channel(usize),
    /// Rec. 601 weighted sum of the first three channels, scaled by 1000.
    Luminance,
    /// Sum of every channel.
    Sum,
    /// HSV hue of the first three channels, in hundredths of a degree.
    Hue,
}

impl Default for KeyFunction {
    fn default() -> Self {
        Self::Channel(0)
    }
}

impl<A> SortKey<A> for KeyFunction
where
    A: Copy + Into<u32>,
{
    type Key = u64;

    fn key(&self, pixel: ArrayView1<'_, A>) -> u64 {
        let c = |i: usize| -> u64 { u64::from(Into::<u32>::into(pixel[i])) };

        match *self {
            Self::Channel(i) => c(i),
            Self::Luminance if pixel.len() >= 3 => 299 * c(0) + 587 * c(1) + 114 * c(2),
            Self::Luminance => 1000 * c(0),
            Self::Sum => pixel.iter().map(|&v| u64::from(Into::<u32>::into(v))).sum(),
            Self::Hue if pixel.len() >= 3 => hue(c(0), c(1), c(2)),
            Self::Hue => 0,
        }
    }

    fn supports(&self, channels: usize) -> bool {
        match *self {
            Self::Channel(i) => i < channels,
            _ => channels > 0,
        }
    }
}

fn hue(r: u64, g: u64, b: u64) -> u64 {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let delta = max - r.min(g).min(b);
    if delta == 0.0 {
        return 0;
    }

    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (h * 6000.0).round() as u64 % 36000
}

impl FromStr for KeyFunction {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let channel = lower
            .strip_prefix("channel:")
            .or_else(|| lower.strip_prefix('c'));

        match (lower.as_str(), channel) {
            ("luminance" | "luma", _) => Ok(Self::Luminance),
            ("sum", _) => Ok(Self::Sum),
            ("hue", _) => Ok(Self::Hue),
            (_, Some(n)) => n
                .parse()
                .map(Self::Channel)
                .map_err(|_| SortError::InvalidKey(s.to_owned())),
            _ => Err(SortError::InvalidKey(s.to_owned())),
        }
    }
}
