//! Library to pixel-sort image/array.
//!
//! The main function is [pixelsort].
//! It sorts every row or every column of an array of pixels, such that:
//!
//! * No pixel is duplicated, removed or altered.
//! * Along each line, keys produced by a [SortKey] ascend.
//! * Equal keys keep their original order.
//! * Lines are independent of each other, and sorted in parallel.
//!
//! The mask is shape-checked, and ignored unless a [MaskMode]
//! other than [MaskMode::Ignore] asks for it.

// Copyright (C) 2023 Dheatly23
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//

mod error;
pub mod io;
mod key;
mod sort;

#[doc(inline)]
pub use crate::error::SortError;
#[doc(inline)]
pub use crate::key::{KeyFunction, SortKey};
#[doc(inline)]
pub use crate::sort::{
    pixelsort, pixelsort_inplace, Config, ConfigBuilder, Direction, MaskMode,
};
