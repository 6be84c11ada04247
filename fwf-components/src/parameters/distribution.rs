//! Flux distribution parameters

use fwf_core::series::FloatValue;
use serde::{Deserialize, Serialize};

/// Split of the total forcing and vertical extent of basal melt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionParameters {
    /// Share of the total forcing released as icebergs.
    ///
    /// Default: 0.45 (observed Antarctic mass loss partitioning)
    pub calving_fraction: FloatValue,

    /// Share of the total forcing released as basal melt.
    ///
    /// Default: 0.55
    pub basal_melt_fraction: FloatValue,

    /// Shallowest depth of the basal melt injection (m).
    ///
    /// Default: 200 m
    pub shallow_depth: FloatValue,

    /// Deepest depth of the basal melt injection (m).
    ///
    /// Default: 700 m
    pub deep_depth: FloatValue,
}

impl Default for DistributionParameters {
    fn default() -> Self {
        Self {
            calving_fraction: 0.45,
            basal_melt_fraction: 0.55,
            shallow_depth: 200.0,
            deep_depth: 700.0,
        }
    }
}
