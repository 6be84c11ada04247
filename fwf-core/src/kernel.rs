//! Linear response kernels
//!
//! Each sector owns a response function giving the total freshwater forcing
//! (Gt/yr) that a unit basal melt anomaly (m/yr) causes at every lag. The
//! functions are stored one coefficient per line, one file per sector, and are
//! selected by the ice-sheet model and basal-melt scenario they were derived
//! from.

use crate::errors::{FWFError, FWFResult};
use crate::sector::{Sector, SectorValues};
use crate::series::FloatValue;
use log::debug;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of lags (years) in every response function file
pub const KERNEL_LENGTH: usize = 200;

/// Response coefficients of all sectors, shape `(lag, sector)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseKernels {
    coefficients: Array2<FloatValue>,
}

impl ResponseKernels {
    pub fn from_coefficients(coefficients: Array2<FloatValue>) -> FWFResult<Self> {
        if coefficients.ncols() != Sector::COUNT || coefficients.nrows() == 0 {
            return Err(FWFError::ShapeMismatch {
                what: "response kernels".to_string(),
                expected: vec![coefficients.nrows().max(1), Sector::COUNT],
                found: coefficients.shape().to_vec(),
            });
        }
        Ok(Self { coefficients })
    }

    /// Same constant coefficient at every lag for every sector
    pub fn uniform(length: usize, value: FloatValue) -> Self {
        Self {
            coefficients: Array2::from_elem((length, Sector::COUNT), value),
        }
    }

    /// Number of lags
    pub fn len(&self) -> usize {
        self.coefficients.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.nrows() == 0
    }

    pub fn coefficients(&self) -> ArrayView2<FloatValue> {
        self.coefficients.view()
    }

    /// Scale every sector's kernel by that sector's melt anomaly
    ///
    /// Returns the `(lag, sector)` forcing contribution of one year.
    pub fn response(&self, anomaly: &SectorValues) -> Array2<FloatValue> {
        let mut contribution = self.coefficients.clone();
        for (sector, mut column) in Sector::ALL.into_iter().zip(contribution.axis_iter_mut(Axis(1))) {
            column *= anomaly[sector];
        }
        contribution
    }

    /// File name of a sector's response function
    pub fn file_name(ice_sheet_model: &str, basal_melt_scenario: &str, sector: Sector) -> String {
        format!(
            "RF_{}_BM{}_{}.dat",
            ice_sheet_model,
            basal_melt_scenario,
            sector.response_region()
        )
    }

    /// Load the response functions of all sectors from `dir`
    ///
    /// Every file must hold exactly `expected_length` coefficients.
    pub fn load(
        dir: &Path,
        ice_sheet_model: &str,
        basal_melt_scenario: &str,
        expected_length: usize,
    ) -> FWFResult<Self> {
        let mut coefficients = Array2::zeros((expected_length, Sector::COUNT));

        for sector in Sector::ALL {
            let path: PathBuf =
                dir.join(Self::file_name(ice_sheet_model, basal_melt_scenario, sector));
            let content = fs::read_to_string(&path).map_err(|e| FWFError::io(&path, e))?;
            let values = parse_kernel(&content, &path)?;

            if values.len() != expected_length {
                return Err(FWFError::KernelLength {
                    path,
                    found: values.len(),
                    expected: expected_length,
                });
            }
            debug!(
                "Loaded {} response coefficients for {} from {}",
                values.len(),
                sector,
                path.display()
            );

            coefficients
                .column_mut(usize::from(sector))
                .assign(&Array1::from(values));
        }

        Ok(Self { coefficients })
    }
}

/// Parse one coefficient per line; blank lines are skipped
fn parse_kernel(content: &str, path: &Path) -> FWFResult<Vec<FloatValue>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim()
                .parse::<FloatValue>()
                .map_err(|e| FWFError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: format!("invalid coefficient '{}': {}", line.trim(), e),
                })
        })
        .collect()
}
