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

use std::str::FromStr;

use log::debug;
use ndarray::prelude::*;
use ndarray::Zip;

use crate::error::SortError;
use crate::key::SortKey;

/// Which lines of the grid get sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Sort every row.
    #[default]
    Horizontal,
    /// Sort every column.
    Vertical,
}

impl Direction {
    /// Grid axis to iterate over. Each subview along it is one line.
    fn axis(self) -> Axis {
        match self {
            Self::Horizontal => Axis(0),
            Self::Vertical => Axis(1),
        }
    }
}

impl FromStr for Direction {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" | "row" => Ok(Self::Horizontal),
            "v" | "vertical" | "column" => Ok(Self::Vertical),
            _ => Err(SortError::InvalidAxis(s.to_owned())),
        }
    }
}

/// How the mask restricts which pixels move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// Mask is shape-checked but otherwise unused.
    #[default]
    Ignore,
    /// Only pixels with mask value above the threshold are sorted,
    /// into the positions they came from. Everything else stays put.
    Select(u8),
    /// Like [`MaskMode::Select`], but each contiguous run of selected
    /// pixels is sorted on its own.
    Spans(u8),
}

impl FromStr for MaskMode {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let err = || SortError::InvalidMaskMode(s.to_owned());

        if lower == "ignore" {
            return Ok(Self::Ignore);
        }
        let (mode, threshold) = lower.split_once(':').ok_or_else(err)?;
        let threshold = threshold.parse().map_err(|_| err())?;
        match mode {
            "select" => Ok(Self::Select(threshold)),
            "spans" => Ok(Self::Spans(threshold)),
            _ => Err(err()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub direction: Direction,
    pub mask_mode: MaskMode,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    direction: Direction,
    mask_mode: MaskMode,
    parallel: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            direction: Direction::default(),
            mask_mode: MaskMode::default(),
            parallel: true,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn mask_mode(mut self, mask_mode: MaskMode) -> Self {
        self.mask_mode = mask_mode;
        self
    }

    /// Sort lines on the rayon pool (default), or one after another.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> Config {
        Config {
            direction: self.direction,
            mask_mode: self.mask_mode,
            parallel: self.parallel,
        }
    }
}

fn check<A, K>(
    grid: ArrayView3<'_, A>,
    mask: ArrayView2<'_, u8>,
    key: &K,
) -> Result<(), SortError>
where
    K: SortKey<A> + ?Sized,
{
    let (rows, cols, channels) = grid.dim();
    if (rows, cols) != mask.dim() {
        return Err(SortError::DimensionMismatch {
            grid: (rows, cols),
            mask: mask.dim(),
        });
    }
    if rows * cols != 0 && !key.supports(channels) {
        return Err(SortError::UnsupportedKey { channels });
    }
    Ok(())
}

/// Sorts the pixels of `positions` (ascending along the line) by key,
/// writing them back into those same positions.
///
/// `src` is an untouched copy of the line, `keys` the key of every pixel in it.
fn sort_positions<A, T>(
    line: &mut ArrayViewMut2<'_, A>,
    src: &Array2<A>,
    keys: &[T],
    positions: &[usize],
) where
    A: Clone,
    T: Ord,
{
    let mut order = positions.to_vec();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    for (&dst, &from) in positions.iter().zip(&order) {
        if dst != from {
            line.index_axis_mut(Axis(0), dst)
                .assign(&src.index_axis(Axis(0), from));
        }
    }
}

fn sort_line<A, K>(
    mut line: ArrayViewMut2<'_, A>,
    mask: ArrayView1<'_, u8>,
    mode: MaskMode,
    key: &K,
) where
    A: Clone,
    K: SortKey<A> + ?Sized,
{
    let len = line.len_of(Axis(0));
    let positions: Vec<usize> = match mode {
        MaskMode::Ignore => (0..len).collect(),
        MaskMode::Select(t) | MaskMode::Spans(t) => {
            (0..len).filter(|&i| mask[i] > t).collect()
        }
    };
    if positions.len() < 2 {
        return;
    }

    let keys: Vec<_> = line.outer_iter().map(|px| key.key(px)).collect();
    let src = line.to_owned();

    if let MaskMode::Spans(_) = mode {
        let mut start = 0;
        for i in 1..=positions.len() {
            if i == positions.len() || positions[i] != positions[i - 1] + 1 {
                sort_positions(&mut line, &src, &keys, &positions[start..i]);
                start = i;
            }
        }
    } else {
        sort_positions(&mut line, &src, &keys, &positions);
    }
}

fn sort_lines<A, K>(
    mut grid: ArrayViewMut3<'_, A>,
    mask: ArrayView2<'_, u8>,
    config: &Config,
    key: &K,
) where
    A: Clone + Send + Sync,
    K: SortKey<A> + ?Sized,
{
    let axis = config.direction.axis();
    let mode = config.mask_mode;
    debug!(
        "pixelsort: {:?} over {} lines of {} pixels (mask {:?}, parallel {})",
        config.direction,
        grid.len_of(axis),
        grid.len_of(Axis(1 - axis.index())),
        mode,
        config.parallel,
    );

    let zip = Zip::from(grid.axis_iter_mut(axis)).and(mask.axis_iter(axis));
    if config.parallel {
        zip.par_for_each(|line, m| sort_line(line, m, mode, key));
    } else {
        zip.for_each(|line, m| sort_line(line, m, mode, key));
    }
}

/// Pixel sorting, in place.
///
/// Parameters:
/// * `grid` : Pixel array of shape `(rows, cols, channels)`.
/// * `mask` : Mask array of shape `(rows, cols)`.
/// * `config` : Direction, mask mode and parallelism.
/// * `key` : Per-pixel sort key.
///
/// Every line is reordered so keys ascend along it. Equal keys keep
/// their original relative order, so sorting twice changes nothing.
/// Pixels are only moved, never altered. On error the grid is untouched.
pub fn pixelsort_inplace<A, K>(
    grid: ArrayViewMut3<'_, A>,
    mask: ArrayView2<'_, u8>,
    config: &Config,
    key: &K,
) -> Result<(), SortError>
where
    A: Clone + Send + Sync,
    K: SortKey<A> + ?Sized,
{
    check(grid.view(), mask, key)?;
    sort_lines(grid, mask, config, key);
    Ok(())
}

/// Pixel sorting into a new array. See [`pixelsort_inplace`].
pub fn pixelsort<A, K>(
    grid: ArrayView3<'_, A>,
    mask: ArrayView2<'_, u8>,
    config: &Config,
    key: &K,
) -> Result<Array3<A>, SortError>
where
    A: Clone + Send + Sync,
    K: SortKey<A> + ?Sized,
{
    check(grid, mask, key)?;

    let mut out = grid.to_owned();
    sort_lines(out.view_mut(), mask, config, key);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyFunction;

    /// Grid whose pixels are `[v, r, c]`, so every pixel is unique and
    /// remembers where it started.
    fn grid(values: &[&[u8]]) -> Array3<u8> {
        let rows = values.len();
        let cols = values.first().map_or(0, |r| r.len());
        Array3::from_shape_fn((rows, cols, 3), |(r, c, ch)| match ch {
            0 => values[r][c],
            1 => r as u8,
            _ => c as u8,
        })
    }

    fn channel0(arr: &Array3<u8>) -> Array2<u8> {
        arr.index_axis(Axis(2), 0).to_owned()
    }

    fn run(arr: &Array3<u8>, mask: &Array2<u8>, config: Config) -> Result<Array3<u8>, SortError> {
        pixelsort(arr.view(), mask.view(), &config, &KeyFunction::default())
    }

    fn full_mask(arr: &Array3<u8>) -> Array2<u8> {
        Array2::from_elem((arr.dim().0, arr.dim().1), 255)
    }

    fn dir(direction: Direction) -> Config {
        ConfigBuilder::new().direction(direction).build()
    }

    #[test]
    fn single_row() {
        let arr = grid(&[&[5, 1, 3]]);
        let out = run(&arr, &full_mask(&arr), dir(Direction::Horizontal)).unwrap();
        assert_eq!(channel0(&out), array![[1, 3, 5]]);
        assert_eq!(out.slice(s![0, 0, ..]), aview1(&[1u8, 0, 1]));
    }

    #[test]
    fn single_column() {
        let arr = grid(&[&[5], &[1], &[3]]);
        let out = run(&arr, &full_mask(&arr), dir(Direction::Vertical)).unwrap();
        assert_eq!(channel0(&out), array![[1], [3], [5]]);
    }

    #[test]
    fn columns_are_independent() {
        let arr = grid(&[&[9, 2], &[1, 8]]);
        let out = run(&arr, &full_mask(&arr), dir(Direction::Vertical)).unwrap();
        assert_eq!(channel0(&out), array![[1, 2], [9, 8]]);

        let out = run(&arr, &full_mask(&arr), dir(Direction::Horizontal)).unwrap();
        assert_eq!(channel0(&out), array![[2, 9], [1, 8]]);
    }

    #[test]
    fn mask_mismatch() {
        let arr = grid(&[&[9, 2], &[1, 8]]);
        let mask = Array2::zeros((3, 3));
        assert_eq!(
            run(&arr, &mask, Config::default()),
            Err(SortError::DimensionMismatch {
                grid: (2, 2),
                mask: (3, 3)
            })
        );
    }

    #[test]
    fn failed_sort_leaves_grid_alone() {
        let mut arr = grid(&[&[3, 2, 1]]);
        let before = arr.clone();
        let res = pixelsort_inplace(
            arr.view_mut(),
            Array2::zeros((1, 3)).view(),
            &Config::default(),
            &KeyFunction::Channel(3),
        );
        assert_eq!(res, Err(SortError::UnsupportedKey { channels: 3 }));
        assert_eq!(arr, before);
    }

    #[test]
    fn empty_grids() {
        for shape in [(0, 0), (0, 4), (4, 0)] {
            let arr = Array3::<u8>::zeros((shape.0, shape.1, 3));
            let mask = Array2::zeros(shape);
            for d in [Direction::Horizontal, Direction::Vertical] {
                assert_eq!(run(&arr, &mask, dir(d)).unwrap(), arr);
            }
        }
    }

    #[test]
    fn ties_are_stable() {
        let arr = grid(&[&[4, 2, 4, 2, 1]]);
        let out = run(&arr, &full_mask(&arr), Config::default()).unwrap();
        let cols: Vec<u8> = out.slice(s![0, .., 2]).to_vec();
        assert_eq!(cols, [4, 1, 3, 0, 2]);
    }

    #[test]
    fn resort_is_noop() {
        let arr = grid(&[&[4, 2, 4, 2, 1], &[0, 9, 9, 3, 3]]);
        let once = run(&arr, &full_mask(&arr), Config::default()).unwrap();
        let twice = run(&once, &full_mask(&arr), Config::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn mask_ignored_by_default() {
        let arr = grid(&[&[5, 1, 3]]);
        let out = run(&arr, &Array2::zeros((1, 3)), Config::default()).unwrap();
        assert_eq!(channel0(&out), array![[1, 3, 5]]);
    }

    #[test]
    fn mask_select() {
        let arr = grid(&[&[9, 7, 5, 3, 1]]);
        let mask = array![[255, 0, 255, 0, 255]];
        let config = ConfigBuilder::new().mask_mode(MaskMode::Select(127)).build();
        let out = run(&arr, &mask, config).unwrap();
        assert_eq!(channel0(&out), array![[1, 7, 5, 3, 9]]);
    }

    #[test]
    fn mask_spans() {
        let arr = grid(&[&[9, 7, 5, 3, 1, 6, 4]]);
        let mask = array![[200, 200, 0, 200, 200, 200, 0]];
        let config = ConfigBuilder::new().mask_mode(MaskMode::Spans(127)).build();
        let out = run(&arr, &mask, config).unwrap();
        assert_eq!(channel0(&out), array![[7, 9, 5, 1, 3, 6, 4]]);
    }

    #[test]
    fn sequential_matches_parallel() {
        let arr = Array3::from_shape_fn((7, 11, 3), |(r, c, ch)| {
            ((r * 31 + c * 17 + ch * 5) % 23) as u8
        });
        let mask = full_mask(&arr);
        for d in [Direction::Horizontal, Direction::Vertical] {
            let par = ConfigBuilder::new().direction(d).build();
            let seq = ConfigBuilder::new().direction(d).parallel(false).build();
            assert_eq!(run(&arr, &mask, par).unwrap(), run(&arr, &mask, seq).unwrap());
        }
    }

    #[test]
    fn wide_pixels_do_not_wrap() {
        let arr = array![[[u32::MAX, 1u32], [10, 10]]];
        let mask = Array2::from_elem((1, 2), 255);
        for key in [KeyFunction::Sum, KeyFunction::Luminance] {
            let out = pixelsort(arr.view(), mask.view(), &Config::default(), &key).unwrap();
            assert_eq!(out, array![[[10u32, 10], [u32::MAX, 1]]], "{key:?}");
        }
    }

    #[test]
    fn parse_direction() {
        assert_eq!("v".parse(), Ok(Direction::Vertical));
        assert_eq!("V".parse(), Ok(Direction::Vertical));
        assert_eq!("h".parse(), Ok(Direction::Horizontal));
        assert_eq!("Horizontal".parse(), Ok(Direction::Horizontal));
        assert_eq!(
            "x".parse::<Direction>(),
            Err(SortError::InvalidAxis("x".into()))
        );
    }

    #[test]
    fn parse_mask_mode() {
        assert_eq!("ignore".parse(), Ok(MaskMode::Ignore));
        assert_eq!("select:10".parse(), Ok(MaskMode::Select(10)));
        assert_eq!("Spans:200".parse(), Ok(MaskMode::Spans(200)));
        assert!("spans".parse::<MaskMode>().is_err());
        assert!("spans:300".parse::<MaskMode>().is_err());
        assert!("blur:3".parse::<MaskMode>().is_err());
    }
}
