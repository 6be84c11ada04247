//! Sector aggregation of ocean temperatures
//!
//! A sector temperature is the volume-weighted mean of the ocean temperature
//! inside the sector's horizontal mask and depth window. It is computed in two
//! stages: an area-weighted mean on every vertical level, followed by a
//! thickness-weighted mean over the levels covering the depth window.
//!
//! Missing values (NaN) never contribute to a mean, and neither do cells with
//! a zero or missing area.

use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::grid::{is_valid, HorizontalGrid, LevelBounds};
use fwf_core::levels::LevelSelection;
use fwf_core::sector::{DepthSelection, Sector, SectorValues};
use fwf_core::series::FloatValue;
use log::debug;
use ndarray::{Array3, ArrayView2, ArrayView3, ArrayView4, Axis, Zip};

/// Time mean of a `(time, lev, j, i)` field
///
/// Missing values are skipped per cell; a cell missing at every time stays
/// missing.
pub fn annual_mean(field: ArrayView4<FloatValue>) -> Array3<FloatValue> {
    field.map_axis(Axis(0), |samples| {
        let (sum, count) = samples
            .iter()
            .filter(|v| is_valid(**v))
            .fold((0.0 as FloatValue, 0usize), |(s, n), v| (s + v, n + 1));
        if count == 0 {
            FloatValue::NAN
        } else {
            sum / count as FloatValue
        }
    })
}

/// Weighted mean of `values` over the selected cells, `None` when no cell
/// with a positive weight and a valid value is selected
fn masked_mean(
    values: ArrayView2<FloatValue>,
    weights: ArrayView2<FloatValue>,
    mask: ArrayView2<bool>,
) -> Option<FloatValue> {
    let (sum, total_weight) = Zip::from(values).and(weights).and(mask).fold(
        (0.0, 0.0),
        |(sum, total), &v, &w, &selected| {
            if selected && w > 0.0 && is_valid(v) {
                (sum + w * v, total + w)
            } else {
                (sum, total)
            }
        },
    );

    if total_weight > 0.0 {
        Some(sum / total_weight)
    } else {
        None
    }
}

fn check_horizontal(what: &str, grid: &HorizontalGrid, found: &[usize]) -> FWFResult<()> {
    let (nj, ni) = grid.shape();
    if found == [nj, ni] {
        Ok(())
    } else {
        Err(FWFError::ShapeMismatch {
            what: what.to_string(),
            expected: vec![nj, ni],
            found: found.to_vec(),
        })
    }
}

/// Area-weighted mean of a 2-D `(j, i)` field over a sector
pub fn area_weighted_mean(
    field: ArrayView2<FloatValue>,
    grid: &HorizontalGrid,
    sector: Sector,
) -> FWFResult<FloatValue> {
    check_horizontal("temperature field", grid, field.shape())?;

    let weights = grid.area_weights();
    let mask = grid.sector_mask(sector);
    masked_mean(field, weights.view(), mask.view())
        .ok_or_else(|| FWFError::EmptySelection(format!("the {} sector", sector.long_name())))
}

/// Area-weighted mean of every level of a 3-D `(lev, j, i)` field over a sector
///
/// Levels without any valid ocean cell inside the sector are `None`.
pub fn area_weighted_profile(
    field: ArrayView3<FloatValue>,
    grid: &HorizontalGrid,
    sector: Sector,
) -> FWFResult<Vec<Option<FloatValue>>> {
    check_horizontal("temperature field", grid, &field.shape()[1..])?;

    let weights = grid.area_weights();
    let mask = grid.sector_mask(sector);
    Ok(field
        .outer_iter()
        .map(|level| masked_mean(level, weights.view(), mask.view()))
        .collect())
}

/// Thickness-weighted mean of a level profile over a depth window
///
/// Levels without a value are left out of both the sum and the total weight.
pub fn lev_weighted_mean(
    profile: &[Option<FloatValue>],
    bounds: &LevelBounds,
    depth: DepthSelection,
) -> FWFResult<FloatValue> {
    if profile.len() != bounds.len() {
        return Err(FWFError::ShapeMismatch {
            what: "level profile".to_string(),
            expected: vec![bounds.len()],
            found: vec![profile.len()],
        });
    }

    let window = depth.window()?;
    let selection = LevelSelection::covering(bounds, window)?;

    let (sum, total_weight) = selection
        .iter()
        .filter_map(|(k, thickness)| profile[k].map(|v| (v, thickness)))
        .filter(|(_, thickness)| *thickness > 0.0)
        .fold((0.0, 0.0), |(sum, total), (v, dz)| (sum + v * dz, total + dz));

    if total_weight > 0.0 {
        Ok(sum / total_weight)
    } else {
        Err(FWFError::EmptySelection(format!(
            "the levels between {} m and {} m",
            window.top, window.bottom
        )))
    }
}

fn sector_temperatures_by(
    field: ArrayView3<FloatValue>,
    grid: &HorizontalGrid,
    bounds: &LevelBounds,
    depth: impl Fn(Sector) -> DepthSelection,
) -> FWFResult<SectorValues> {
    let mut temperatures = SectorValues::zeros();
    for sector in Sector::ALL {
        let profile = area_weighted_profile(field, grid, sector)?;
        temperatures[sector] = lev_weighted_mean(&profile, bounds, depth(sector))?;
        debug!(
            "Volume weighted mean temperature of {}: {:.4} degC",
            sector, temperatures[sector]
        );
    }
    Ok(temperatures)
}

/// Volume-weighted temperature of every sector around its shelf depth
///
/// `field` is a `(lev, j, i)` temperature field on `grid`, with `bounds`
/// describing its vertical levels.
pub fn sector_temperatures(
    field: ArrayView3<FloatValue>,
    grid: &HorizontalGrid,
    bounds: &LevelBounds,
) -> FWFResult<SectorValues> {
    sector_temperatures_by(field, grid, bounds, DepthSelection::Sector)
}

/// Volume-weighted temperature of every sector over one shared depth window
pub fn sector_temperatures_at_depth(
    field: ArrayView3<FloatValue>,
    grid: &HorizontalGrid,
    bounds: &LevelBounds,
    depth: u32,
) -> FWFResult<SectorValues> {
    // Resolve once so an unsupported depth fails before any reduction
    DepthSelection::Explicit(depth).window()?;
    sector_temperatures_by(field, grid, bounds, |_| DepthSelection::Explicit(depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, Array3, Array4};

    /// 2 x 2 grid entirely inside the Ross sector
    fn ross_grid(areas: Array2<FloatValue>) -> HorizontalGrid {
        HorizontalGrid::new(
            Array2::from_elem((2, 2), -78.0),
            array![[160.0, 170.0], [180.0, 190.0]],
            areas,
        )
        .unwrap()
    }

    #[test]
    fn constant_field_gives_constant_mean() {
        // Two cells of uneven area in every sector
        let grid = HorizontalGrid::new(
            array![
                [-70.0, -75.0, -72.0, -78.0, -67.0],
                [-68.0, -80.0, -74.0, -80.0, -68.0]
            ],
            array![
                [10.0, 320.0, 250.0, 180.0, 300.0],
                [100.0, 330.0, 230.0, 200.0, 305.0]
            ],
            array![[1.0, 5.0, 0.5, 100.0, 3.0], [7.0, 0.1, 20.0, 2.0, 9.0]],
        )
        .unwrap();
        let field = Array2::from_elem((2, 5), -1.25);

        for sector in Sector::ALL {
            assert_eq!(
                grid.sector_mask(sector).iter().filter(|&&m| m).count(),
                2,
                "{}",
                sector
            );
            assert_relative_eq!(
                area_weighted_mean(field.view(), &grid, sector).unwrap(),
                -1.25
            );
        }
    }

    #[test]
    fn cells_are_weighted_by_area() {
        let grid = ross_grid(array![[1.0, 3.0], [0.0, FloatValue::NAN]]);
        let field = array![[0.0, 4.0], [100.0, 100.0]];
        assert_relative_eq!(
            area_weighted_mean(field.view(), &grid, Sector::Ross).unwrap(),
            3.0
        );
    }

    #[test]
    fn missing_values_do_not_bias_the_mean() {
        let grid = ross_grid(Array2::ones((2, 2)));
        let field = array![[1.0, FloatValue::NAN], [3.0, 1.0e36]];
        assert_relative_eq!(
            area_weighted_mean(field.view(), &grid, Sector::Ross).unwrap(),
            2.0
        );
    }

    #[test]
    fn zero_weights_are_flagged() {
        let grid = ross_grid(Array2::zeros((2, 2)));
        let field = Array2::ones((2, 2));
        assert!(matches!(
            area_weighted_mean(field.view(), &grid, Sector::Ross),
            Err(FWFError::EmptySelection(_))
        ));
    }

    #[test]
    fn sector_without_cells_is_flagged() {
        let grid = ross_grid(Array2::ones((2, 2)));
        let field = Array2::ones((2, 2));
        assert!(matches!(
            area_weighted_mean(field.view(), &grid, Sector::Wedd),
            Err(FWFError::EmptySelection(_))
        ));
    }

    #[test]
    fn field_shape_must_match_grid() {
        let grid = ross_grid(Array2::ones((2, 2)));
        let field = Array2::ones((3, 2));
        assert!(matches!(
            area_weighted_mean(field.view(), &grid, Sector::Ross),
            Err(FWFError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn profile_marks_empty_levels() {
        let grid = ross_grid(Array2::ones((2, 2)));
        let mut field = Array3::from_elem((3, 2, 2), 2.0);
        field.index_axis_mut(Axis(0), 2).fill(FloatValue::NAN);

        let profile = area_weighted_profile(field.view(), &grid, Sector::Ross).unwrap();
        assert_eq!(profile, vec![Some(2.0), Some(2.0), None]);
    }

    fn bounds() -> LevelBounds {
        LevelBounds::from_pairs(&[
            (0.0, 100.0),
            (100.0, 250.0),
            (250.0, 300.0),
            (300.0, 350.0),
            (350.0, 500.0),
        ])
        .unwrap()
    }

    #[test]
    fn levels_are_weighted_by_covered_thickness() {
        // Ross window: 262 - 362 m -> 38 m of level 2, 50 m of level 3, 12 m of level 4
        let profile = [Some(0.0), Some(0.0), Some(1.0), Some(2.0), Some(3.0)];
        let mean = lev_weighted_mean(&profile, &bounds(), DepthSelection::Sector(Sector::Ross))
            .unwrap();
        assert_relative_eq!(mean, (38.0 + 100.0 + 36.0) / 100.0);
    }

    #[test]
    fn undefined_levels_are_left_out() {
        let profile = [None, None, Some(1.0), Some(2.0), None];
        let mean = lev_weighted_mean(&profile, &bounds(), DepthSelection::Sector(Sector::Ross))
            .unwrap();
        assert_relative_eq!(mean, (38.0 + 100.0) / 88.0);

        let profile = [Some(1.0), Some(1.0), None, None, None];
        assert!(matches!(
            lev_weighted_mean(&profile, &bounds(), DepthSelection::Sector(Sector::Ross)),
            Err(FWFError::EmptySelection(_))
        ));
    }

    #[test]
    fn window_outside_the_grid_is_a_geometry_error() {
        let profile = [Some(1.0); 5];
        assert!(matches!(
            lev_weighted_mean(&profile, &bounds(), DepthSelection::Explicit(900)),
            Err(FWFError::LevelNotFound { .. })
        ));
        assert!(matches!(
            lev_weighted_mean(&profile, &bounds(), DepthSelection::Explicit(123)),
            Err(FWFError::Configuration(_))
        ));
    }

    #[test]
    fn annual_mean_skips_missing_months() {
        let mut field = Array4::from_elem((3, 1, 1, 2), 1.0);
        field[[0, 0, 0, 0]] = 4.0;
        field[[1, 0, 0, 0]] = FloatValue::NAN;
        for t in 0..3 {
            field[[t, 0, 0, 1]] = FloatValue::NAN;
        }

        let mean = annual_mean(field.view());
        assert_eq!(mean.dim(), (1, 1, 2));
        assert_relative_eq!(mean[[0, 0, 0]], 2.5);
        assert!(mean[[0, 0, 1]].is_nan());
    }
}
