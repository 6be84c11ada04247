//! Ocean model grid
//!
//! Fields are stored as `ndarray` arrays with the horizontal dimensions last,
//! `(j, i)` for 2-D and `(lev, j, i)` for 3-D fields. Missing values (land
//! cells, `_FillValue`) are stored as NaN once a field has been loaded.

use crate::errors::{FWFError, FWFResult};
use crate::sector::Sector;
use crate::series::FloatValue;
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// Check if a value is valid (finite and not a fill value).
#[inline]
pub fn is_valid(v: FloatValue) -> bool {
    v.is_finite() && v.abs() < 1.0e+30
}

/// Shape check shared by every gridded input
pub fn check_shape(what: &str, expected: &[usize], found: &[usize]) -> FWFResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(FWFError::ShapeMismatch {
            what: what.to_string(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}

/// Horizontal cell coordinates and areas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizontalGrid {
    latitude: Array2<FloatValue>,
    longitude: Array2<FloatValue>,
    /// unit: m^2
    cell_area: Array2<FloatValue>,
}

impl HorizontalGrid {
    /// Create a grid from cell-centre coordinates (degrees) and cell areas (m^2)
    ///
    /// All three arrays must share the same `(j, i)` shape.
    pub fn new(
        latitude: Array2<FloatValue>,
        longitude: Array2<FloatValue>,
        cell_area: Array2<FloatValue>,
    ) -> FWFResult<Self> {
        check_shape("longitude", latitude.shape(), longitude.shape())?;
        check_shape("cell area", latitude.shape(), cell_area.shape())?;

        Ok(Self {
            latitude,
            longitude,
            cell_area,
        })
    }

    /// Shape of the horizontal grid as `(j, i)`
    pub fn shape(&self) -> (usize, usize) {
        self.latitude.dim()
    }

    pub fn latitude(&self) -> ArrayView2<FloatValue> {
        self.latitude.view()
    }

    pub fn longitude(&self) -> ArrayView2<FloatValue> {
        self.longitude.view()
    }

    pub fn cell_area(&self) -> ArrayView2<FloatValue> {
        self.cell_area.view()
    }

    /// Cell areas usable as weights: missing areas become zero
    pub fn area_weights(&self) -> Array2<FloatValue> {
        self.cell_area
            .mapv(|a| if is_valid(a) && a > 0.0 { a } else { 0.0 })
    }

    /// Horizontal selection mask of a sector
    pub fn sector_mask(&self, sector: Sector) -> Array2<bool> {
        Zip::from(&self.latitude)
            .and(&self.longitude)
            .map_collect(|&lat, &lon| sector.contains(lat, lon))
    }
}

/// Upper and lower depth bounds (m, positive down) of every vertical level
///
/// Stored as an `(n_levels, 2)` array; column 0 holds the shallow bound,
/// column 1 the deep bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBounds(Array2<FloatValue>);

impl LevelBounds {
    pub fn new(bounds: Array2<FloatValue>) -> FWFResult<Self> {
        if bounds.ncols() != 2 || bounds.nrows() == 0 {
            return Err(FWFError::ShapeMismatch {
                what: "level bounds".to_string(),
                expected: vec![bounds.nrows().max(1), 2],
                found: bounds.shape().to_vec(),
            });
        }
        if let Some(level) = bounds
            .rows()
            .into_iter()
            .position(|row| row[0] > row[1])
        {
            return Err(FWFError::Configuration(format!(
                "level {} has its upper bound below its lower bound",
                level
            )));
        }

        Ok(Self(bounds))
    }

    /// Build level bounds from `(upper, lower)` pairs
    pub fn from_pairs(pairs: &[(FloatValue, FloatValue)]) -> FWFResult<Self> {
        let flat: Vec<FloatValue> = pairs.iter().flat_map(|&(u, l)| [u, l]).collect();
        let bounds = Array2::from_shape_vec((pairs.len(), 2), flat)
            .map_err(|e| FWFError::Configuration(e.to_string()))?;
        Self::new(bounds)
    }

    pub fn len(&self) -> usize {
        self.0.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.0.nrows() == 0
    }

    /// Shallow bound of each level
    pub fn upper(&self) -> ArrayView1<FloatValue> {
        self.0.column(0)
    }

    /// Deep bound of each level
    pub fn lower(&self) -> ArrayView1<FloatValue> {
        self.0.column(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid() -> HorizontalGrid {
        HorizontalGrid::new(
            array![[-78.0, -78.0], [-68.0, -60.0]],
            array![[180.0, 300.0], [10.0, 10.0]],
            array![[1.0, 2.0], [FloatValue::NAN, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn shapes_must_agree() {
        let err = HorizontalGrid::new(
            Array2::zeros((2, 2)),
            Array2::zeros((2, 3)),
            Array2::zeros((2, 2)),
        )
        .unwrap_err();
        assert!(matches!(err, FWFError::ShapeMismatch { .. }));
    }

    #[test]
    fn missing_areas_become_zero_weights() {
        let weights = grid().area_weights();
        assert_eq!(weights, array![[1.0, 2.0], [0.0, 4.0]]);
    }

    #[test]
    fn sector_masks() {
        let g = grid();
        assert_eq!(
            g.sector_mask(Sector::Ross),
            array![[true, false], [false, false]]
        );
        assert_eq!(
            g.sector_mask(Sector::Wedd),
            array![[false, true], [false, false]]
        );
        assert_eq!(
            g.sector_mask(Sector::Eais),
            array![[false, false], [true, false]]
        );
    }

    #[test]
    fn fill_values_are_invalid() {
        assert!(!is_valid(9.96920996838687e+36));
        assert!(!is_valid(FloatValue::NAN));
        assert!(is_valid(-1.5));
    }

    #[test]
    fn level_bounds_validation() {
        let bounds = LevelBounds::from_pairs(&[(0.0, 10.0), (10.0, 25.0)]).unwrap();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds.lower()[1], 25.0);
        assert!(LevelBounds::from_pairs(&[(10.0, 0.0)]).is_err());
        assert!(LevelBounds::new(Array2::zeros((3, 3))).is_err());
    }
}
