//! In-memory ocean fields handed to the coupler
//!
//! These are decoupled from any file format so the yearly pipeline can be
//! driven from NetCDF files (see the `io` module) or from fields built in
//! tests.

use fwf_components::aggregation::annual_mean;
use fwf_core::constants::DAYS_PER_YEAR;
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::grid::{check_shape, HorizontalGrid, LevelBounds};
use fwf_core::series::FloatValue;
use ndarray::{Array2, Array3, ArrayView4};
use serde::{Deserialize, Serialize};

/// Time coordinate of a model output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub values: Vec<FloatValue>,
    /// CF units string, e.g. `seconds since 1850-01-01 00:00:00`
    pub units: String,
}

impl TimeAxis {
    pub fn new(values: Vec<FloatValue>, units: &str) -> Self {
        Self {
            values,
            units: units.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Length of one day in the units of this axis
    fn day_length(&self) -> FWFResult<FloatValue> {
        let step = self
            .units
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match step.as_str() {
            "seconds" | "second" | "s" => Ok(86400.0),
            "minutes" | "minute" => Ok(1440.0),
            "hours" | "hour" | "h" => Ok(24.0),
            "days" | "day" | "d" => Ok(1.0),
            _ => Err(FWFError::Configuration(format!(
                "unsupported time units '{}'",
                self.units
            ))),
        }
    }

    /// The same axis one (365 day) year later
    pub fn shifted_by_year(&self) -> FWFResult<Self> {
        let offset = DAYS_PER_YEAR * self.day_length()?;
        Ok(Self {
            values: self.values.iter().map(|t| t + offset).collect(),
            units: self.units.clone(),
        })
    }
}

/// One year of ocean model output, reduced to its annual mean
#[derive(Debug, Clone, PartialEq)]
pub struct OceanYear {
    /// Annual mean potential temperature `(lev, j, i)` in degC, NaN where missing
    pub temperature: Array3<FloatValue>,
    pub level_bounds: LevelBounds,
    /// Time axis of the monthly output the mean was taken over
    pub time: TimeAxis,
}

impl OceanYear {
    pub fn new(
        temperature: Array3<FloatValue>,
        level_bounds: LevelBounds,
        time: TimeAxis,
    ) -> FWFResult<Self> {
        if temperature.dim().0 != level_bounds.len() {
            return Err(FWFError::ShapeMismatch {
                what: "temperature levels".to_string(),
                expected: vec![level_bounds.len()],
                found: vec![temperature.dim().0],
            });
        }
        Ok(Self {
            temperature,
            level_bounds,
            time,
        })
    }

    /// Average a `(time, lev, j, i)` monthly field
    pub fn from_monthly(
        monthly: ArrayView4<FloatValue>,
        level_bounds: LevelBounds,
        time: TimeAxis,
    ) -> FWFResult<Self> {
        if monthly.dim().0 != time.len() {
            return Err(FWFError::ShapeMismatch {
                what: "temperature time steps".to_string(),
                expected: vec![time.len()],
                found: vec![monthly.dim().0],
            });
        }
        Self::new(annual_mean(monthly), level_bounds, time)
    }
}

/// Grid and masks that stay fixed over an experiment
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFields {
    pub grid: HorizontalGrid,
    /// Cells receiving the basal melt flux
    pub basal_melt_mask: Array2<FloatValue>,
    /// Cells receiving the calving flux
    pub calving_mask: Array2<FloatValue>,
}

impl StaticFields {
    pub fn new(
        grid: HorizontalGrid,
        basal_melt_mask: Array2<FloatValue>,
        calving_mask: Array2<FloatValue>,
    ) -> FWFResult<Self> {
        let (nj, ni) = grid.shape();
        check_shape("basal melt mask", &[nj, ni], basal_melt_mask.shape())?;
        check_shape("calving mask", &[nj, ni], calving_mask.shape())?;
        Ok(Self {
            grid,
            basal_melt_mask,
            calving_mask,
        })
    }

    /// Check that an ocean field lives on this grid
    pub fn check_ocean(&self, ocean: &OceanYear) -> FWFResult<()> {
        let (nj, ni) = self.grid.shape();
        let (nlev, _, _) = ocean.temperature.dim();
        check_shape(
            "temperature field",
            &[nlev, nj, ni],
            ocean.temperature.shape(),
        )
    }
}
