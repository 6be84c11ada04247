//! Basal melt parameters

use fwf_core::series::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters of the quadratic basal melt law
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasalMeltParameters {
    /// Heat exchange velocity calibration factor (dimensionless)
    ///
    /// Default: 0.08 * 0.65
    pub gamma: FloatValue,
}

impl Default for BasalMeltParameters {
    fn default() -> Self {
        Self { gamma: 0.08 * 0.65 }
    }
}
