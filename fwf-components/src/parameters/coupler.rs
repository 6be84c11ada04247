//! Complete coupler configuration

use super::{BasalMeltParameters, DistributionParameters, ResponseParameters, RunningMeanParameters};
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::series::FloatValue;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every tunable of a coupled experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplerParameters {
    pub basal_melt: BasalMeltParameters,
    pub response: ResponseParameters,
    pub running_mean: RunningMeanParameters,
    pub distribution: DistributionParameters,

    /// Antarctic freshwater forcing of the first experiment year (Gt/yr).
    ///
    /// Anomalies are added on top of this value.
    /// Default: 3315 Gt/yr
    pub baseline_total_forcing: FloatValue,
}

impl Default for CouplerParameters {
    fn default() -> Self {
        Self {
            basal_melt: BasalMeltParameters::default(),
            response: ResponseParameters::default(),
            running_mean: RunningMeanParameters::default(),
            distribution: DistributionParameters::default(),
            baseline_total_forcing: 3315.0,
        }
    }
}

impl CouplerParameters {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> FWFResult<Self> {
        let parameters: Self = toml::from_str(content)
            .map_err(|e| FWFError::Configuration(format!("invalid parameters: {}", e)))?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn from_toml_file(path: &Path) -> FWFResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| FWFError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            FWFError::Configuration(msg) => {
                FWFError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Check the parameters for values the components cannot work with
    pub fn validate(&self) -> FWFResult<()> {
        let invalid = |msg: String| Err(FWFError::Configuration(msg));

        let gamma = self.basal_melt.gamma;
        if !(gamma.is_finite() && gamma >= 0.0) {
            return invalid(format!("gamma must be a non-negative number, got {}", gamma));
        }
        if self.running_mean.period == 0 {
            return invalid("running mean period must be at least one year".to_string());
        }
        if self.response.kernel_length == 0 {
            return invalid("kernel length must be at least one year".to_string());
        }
        if self.response.ice_sheet_model.is_empty() || self.response.basal_melt_scenario.is_empty()
        {
            return invalid("ice sheet model and basal melt scenario must be named".to_string());
        }

        let d = &self.distribution;
        for (name, fraction) in [
            ("calving_fraction", d.calving_fraction),
            ("basal_melt_fraction", d.basal_melt_fraction),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return invalid(format!("{} must lie in [0, 1], got {}", name, fraction));
            }
        }
        if (d.calving_fraction + d.basal_melt_fraction - 1.0).abs() > 1e-9 {
            return invalid(format!(
                "calving and basal melt fractions must sum to one, got {} + {}",
                d.calving_fraction, d.basal_melt_fraction
            ));
        }
        if !(d.shallow_depth >= 0.0 && d.shallow_depth < d.deep_depth) {
            return invalid(format!(
                "basal melt depths must satisfy 0 <= shallow < deep, got {} and {}",
                d.shallow_depth, d.deep_depth
            ));
        }
        if !self.baseline_total_forcing.is_finite() {
            return invalid("baseline total forcing must be finite".to_string());
        }

        Ok(())
    }
}
