//! Backward running mean of sector temperatures
//!
//! Year-to-year variability of the sector temperatures (the Ross Sea in
//! particular) is large enough to produce spurious forcing pulses, so the melt
//! law is driven by a backward running mean. Until the experiment has run for a
//! full averaging period, the missing years are filled with the baseline
//! temperatures.

use crate::parameters::RunningMeanParameters;
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::sector::SectorValues;
use fwf_core::series::{FloatValue, SectorSeries, Year};
use log::debug;

/// Mean of the `period` years ending at `year`
///
/// With `n = year + 1 - year_min` experiment years available, the mean is
/// taken over the last `period` years of `series` when `n >= period`, and over
/// `period - n` copies of `baseline` followed by all `n` experiment years
/// otherwise. Every required year must be present in `series`.
///
/// ```rust
/// use fwf_components::running_mean::running_mean_backward;
/// use fwf_core::sector::SectorValues;
/// use fwf_core::series::SectorSeries;
///
/// let mut series = SectorSeries::new();
/// series.append(1850, SectorValues::splat(1.0)).unwrap();
/// series.append(1851, SectorValues::splat(3.0)).unwrap();
///
/// // two experiment years and two baseline years
/// let mean = running_mean_backward(&series, &SectorValues::zeros(), 1851, 1850, 4).unwrap();
/// assert_eq!(mean, SectorValues::splat(1.0));
/// ```
pub fn running_mean_backward(
    series: &SectorSeries,
    baseline: &SectorValues,
    year: Year,
    year_min: Year,
    period: usize,
) -> FWFResult<SectorValues> {
    if period == 0 {
        return Err(FWFError::Configuration(
            "running mean period must be at least one year".to_string(),
        ));
    }
    if year < year_min {
        return Err(FWFError::Configuration(format!(
            "year {} lies before the experiment start {}",
            year, year_min
        )));
    }

    let available = (year - year_min) as usize + 1;
    let from_series = available.min(period);
    let padding = period - from_series;
    let first = year + 1 - from_series as Year;

    let rows = series.span(first, year, "sector temperature series")?;
    if padding > 0 {
        debug!(
            "Running mean of {}: {} baseline years and {} experiment years",
            year, padding, from_series
        );
    }

    let mut sum = baseline.map(|v| v * padding as FloatValue);
    for row in &rows {
        for (sector, v) in row.iter() {
            sum[sector] += v;
        }
    }
    Ok(sum.map(|v| v / period as FloatValue))
}

/// Running-mean tracker configured with a period and a baseline reference year
#[derive(Debug, Clone)]
pub struct RunningMean {
    parameters: RunningMeanParameters,
}

impl RunningMean {
    pub fn from_parameters(parameters: RunningMeanParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &RunningMeanParameters {
        &self.parameters
    }

    /// Baseline row used for padding and as the melt reference temperature
    pub fn reference(&self, baseline: &SectorSeries) -> FWFResult<SectorValues> {
        baseline.require(self.parameters.reference_year, "baseline temperature series")
    }

    /// Running mean of `year`, padded with the reference row of `baseline`
    pub fn backward(
        &self,
        series: &SectorSeries,
        baseline: &SectorSeries,
        year: Year,
        year_min: Year,
    ) -> FWFResult<SectorValues> {
        let reference = self.reference(baseline)?;
        running_mean_backward(series, &reference, year, year_min, self.parameters.period)
    }
}
