//! Coupler parameters
//!
//! Every parameter struct carries the defaults of the reference configuration,
//! so a configuration file only needs to list the values it changes.
//!
//! ```toml
//! baseline_total_forcing = 3315.0
//!
//! [basal_melt]
//! gamma = 0.052
//!
//! [response]
//! ice_sheet_model = "IMAU_VUB"
//! basal_melt_scenario = "08"
//!
//! [running_mean]
//! period = 30
//! ```

mod basal_melt;
mod coupler;
mod distribution;
mod response;
mod running_mean;

pub use basal_melt::BasalMeltParameters;
pub use coupler::CouplerParameters;
pub use distribution::DistributionParameters;
pub use response::ResponseParameters;
pub use running_mean::RunningMeanParameters;
