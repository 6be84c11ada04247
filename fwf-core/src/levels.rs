//! Vertical level search
//!
//! Selecting the ocean levels that cover a depth window relies on two searches
//! over level bounds. Both return `None` when no level qualifies; callers turn
//! that into [`FWFError::LevelNotFound`] rather than falling back to an
//! arbitrary level.

use crate::errors::{FWFError, FWFResult};
use crate::grid::LevelBounds;
use crate::sector::DepthWindow;
use crate::series::FloatValue;
use ndarray::{Array1, ArrayView1};
use std::ops::RangeInclusive;

/// Index of the smallest value that is still `>= target`
///
/// Ties resolve to the first matching index. Returns `None` if every value
/// lies below `target`.
///
/// ```rust
/// use fwf_core::levels::nearest_above;
/// use ndarray::array;
///
/// let levels = array![50.0, 150.0, 250.0, 350.0];
/// assert_eq!(nearest_above(levels.view(), 140.0), Some(1));
/// assert_eq!(nearest_above(levels.view(), 400.0), None);
/// ```
pub fn nearest_above(levels: ArrayView1<FloatValue>, target: FloatValue) -> Option<usize> {
    levels
        .iter()
        .enumerate()
        .filter(|&(_, &v)| !v.is_nan() && v >= target)
        .min_by(|(_, a), (_, b)| (**a - target).total_cmp(&(**b - target)))
        .map(|(i, _)| i)
}

/// Index of the largest value that is still `<= target`
///
/// Ties resolve to the first matching index. Returns `None` if every value
/// lies above `target`.
///
/// ```rust
/// use fwf_core::levels::nearest_below;
/// use ndarray::array;
///
/// let levels = array![50.0, 150.0, 250.0, 350.0];
/// assert_eq!(nearest_below(levels.view(), 140.0), Some(0));
/// assert_eq!(nearest_below(levels.view(), 10.0), None);
/// ```
pub fn nearest_below(levels: ArrayView1<FloatValue>, target: FloatValue) -> Option<usize> {
    levels
        .iter()
        .enumerate()
        .filter(|&(_, &v)| !v.is_nan() && v <= target)
        .min_by(|(_, a), (_, b)| (target - **a).total_cmp(&(target - **b)))
        .map(|(i, _)| i)
}

/// Contiguous run of levels covering a depth window, with the thickness of
/// each level that falls inside the window
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSelection {
    first: usize,
    thickness: Array1<FloatValue>,
}

impl LevelSelection {
    /// Select the minimal run of levels whose bounds cover `window`
    ///
    /// The first level is the one whose upper bound is the nearest at or above
    /// the window top, the last level the one whose lower bound is the nearest at
    /// or below the window bottom. Bounds outside the window are clamped onto
    /// it, so partially covered levels are weighted by the covered thickness.
    pub fn covering(bounds: &LevelBounds, window: DepthWindow) -> FWFResult<Self> {
        let first =
            nearest_below(bounds.upper(), window.top).ok_or(FWFError::LevelNotFound {
                relation: "at or above",
                target: window.top,
            })?;
        let last =
            nearest_above(bounds.lower(), window.bottom).ok_or(FWFError::LevelNotFound {
                relation: "at or below",
                target: window.bottom,
            })?;

        if last < first {
            return Err(FWFError::Configuration(format!(
                "level bounds are not ordered by depth (level {} covers {} m, level {} covers {} m)",
                first, window.top, last, window.bottom
            )));
        }

        let thickness = (first..=last)
            .map(|k| window.clamp(bounds.lower()[k]) - window.clamp(bounds.upper()[k]))
            .collect();

        Ok(Self { first, thickness })
    }

    pub fn levels(&self) -> RangeInclusive<usize> {
        self.first..=self.first + self.thickness.len() - 1
    }

    /// Thickness inside the window of each selected level (m)
    pub fn thickness(&self) -> ArrayView1<FloatValue> {
        self.thickness.view()
    }

    /// Pair each selected level index with its thickness
    pub fn iter(&self) -> impl Iterator<Item = (usize, FloatValue)> + '_ {
        self.levels().zip(self.thickness.iter().copied())
    }
}
