//! Physical constants and unit conversions (SI units)
//!
//! The ice-shelf melt parameters follow Favier et al. (2019).

use crate::series::FloatValue;

/// Ice density (kg m^-3)
pub const RHO_ICE: FloatValue = 917.0;

/// Sea water density (kg m^-3)
pub const RHO_SEAWATER: FloatValue = 1028.0;

/// Specific heat capacity of the ocean mixed layer (J kg^-1 K^-1)
pub const C_PO: FloatValue = 3974.0;

/// Latent heat of fusion of ice (J kg^-1)
pub const LATENT_HEAT_ICE: FloatValue = 3.34e5;

/// Freezing/melting point temperature at the ice-ocean interface (°C)
pub const T_FREEZING: FloatValue = -1.6;

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: FloatValue = 3600.0 * 24.0 * 365.0;

/// Days the ocean time axis is shifted by to reach the next simulation year
pub const DAYS_PER_YEAR: FloatValue = 365.0;

/// Kilograms in a gigatonne
pub const KG_PER_GT: FloatValue = 1e12;
