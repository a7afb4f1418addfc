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

use thiserror::Error;

/// Errors raised by the sorting core.
///
/// Every variant is detected before the grid is written to, so a failed
/// call never leaves a partially sorted grid behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error(
        "Array shape mismatch with mask ([{} {}] != [{} {}])",
        .grid.0, .grid.1, .mask.0, .mask.1
    )]
    DimensionMismatch {
        grid: (usize, usize),
        mask: (usize, usize),
    },

    #[error("Invalid direction {0:?}. Use 'v' for vertical or 'h' for horizontal.")]
    InvalidAxis(String),

    #[error("Invalid sort key {0:?}. Use channel:N, luminance, sum or hue.")]
    InvalidKey(String),

    #[error("Invalid mask mode {0:?}. Use ignore, select:T or spans:T.")]
    InvalidMaskMode(String),

    #[error("Sort key cannot be computed for pixels with {channels} channel(s)")]
    UnsupportedKey { channels: usize },
}
