//! Linear response function parameters

use fwf_core::kernel::KERNEL_LENGTH;
use serde::{Deserialize, Serialize};

/// Selects the set of response kernels
///
/// Kernels were derived from one ice-sheet model forced with one basal melt
/// scenario; both are part of the kernel file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseParameters {
    /// Ice-sheet model the kernels were derived from.
    ///
    /// Default: "IMAU_VUB"
    pub ice_sheet_model: String,

    /// Basal melt scenario code of the kernels.
    ///
    /// Default: "08"
    pub basal_melt_scenario: String,

    /// Number of coefficients expected in every kernel file (years).
    ///
    /// Default: 200
    pub kernel_length: usize,
}

impl Default for ResponseParameters {
    fn default() -> Self {
        Self {
            ice_sheet_model: "IMAU_VUB".to_string(),
            basal_melt_scenario: "08".to_string(),
            kernel_length: KERNEL_LENGTH,
        }
    }
}
