//! Quadratic basal melt
//!
//! Basal melt below an ice shelf is parameterised as quadratic in the thermal
//! forcing (the difference between ocean temperature and the freezing point):
//!
//! $$ m(T) = (T - T_f) \cdot |T - T_f| \cdot \mu $$
//!
//! with the melt sensitivity
//!
//! $$ \mu = \gamma \cdot 10^5 \cdot \left( \frac{\rho_{sw} c_{po}}{\rho_i L_i} \right)^2 $$
//!
//! The sign is kept, so temperatures below the freezing point give negative
//! melt. The coupler only uses anomalies relative to a reference temperature.

use crate::parameters::BasalMeltParameters;
use fwf_core::constants::{C_PO, LATENT_HEAT_ICE, RHO_ICE, RHO_SEAWATER, T_FREEZING};
use fwf_core::sector::SectorValues;
use fwf_core::series::FloatValue;
use log::debug;

/// Melt sensitivity for a calibration factor `gamma` (m/yr/K^2)
pub fn melt_sensitivity(gamma: FloatValue) -> FloatValue {
    let c_lin = (RHO_SEAWATER * C_PO) / (RHO_ICE * LATENT_HEAT_ICE);
    gamma * 1.0e5 * c_lin * c_lin
}

/// Basal melt rate (m/yr) for an ocean temperature (degC)
pub fn melt_rate(temperature: FloatValue, gamma: FloatValue) -> FloatValue {
    let thermal_forcing = temperature - T_FREEZING;
    thermal_forcing * thermal_forcing.abs() * melt_sensitivity(gamma)
}

/// Melt anomaly of every sector relative to its reference temperature
pub fn basal_melt_anomalies(
    reference: &SectorValues,
    current: &SectorValues,
    gamma: FloatValue,
) -> SectorValues {
    SectorValues::from_fn(|s| melt_rate(current[s], gamma) - melt_rate(reference[s], gamma))
}

/// Basal melt component
///
/// Wraps the melt law with a fixed calibration.
#[derive(Debug, Clone)]
pub struct BasalMelt {
    parameters: BasalMeltParameters,
}

impl BasalMelt {
    pub fn from_parameters(parameters: BasalMeltParameters) -> Self {
        debug!(
            "Using basal melt sensitivity: {} m yr-1 K-2",
            melt_sensitivity(parameters.gamma)
        );
        Self { parameters }
    }

    pub fn sensitivity(&self) -> FloatValue {
        melt_sensitivity(self.parameters.gamma)
    }

    pub fn melt_rate(&self, temperature: FloatValue) -> FloatValue {
        melt_rate(temperature, self.parameters.gamma)
    }

    pub fn anomalies(&self, reference: &SectorValues, current: &SectorValues) -> SectorValues {
        basal_melt_anomalies(reference, current, self.parameters.gamma)
    }
}
