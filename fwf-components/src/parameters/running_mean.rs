//! Running-mean parameters

use fwf_core::series::Year;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunningMeanParameters {
    /// Length of the backward averaging window (years).
    ///
    /// Default: 30
    pub period: usize,

    /// Year of the baseline table used both to pad the window and as the
    /// reference temperature of the melt anomaly.
    ///
    /// Default: 1850
    pub reference_year: Year,
}

impl Default for RunningMeanParameters {
    fn default() -> Self {
        Self {
            period: 30,
            reference_year: 1850,
        }
    }
}
