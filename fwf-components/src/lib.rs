//! Physics components of the Antarctic freshwater-forcing coupler
//!
//! Each module covers one step of the yearly chain that turns ocean
//! temperatures into a freshwater flux:
//!
//! 1. [`aggregation`]: reduce a temperature field to one value per sector
//! 2. [`running_mean`]: smooth the sector temperatures over the past years
//! 3. [`basal_melt`]: translate temperatures into basal melt anomalies
//! 4. [`response`]: apply the anomalies through the linear response kernels
//! 5. [`distribution`]: spread the total forcing over the ocean grid
//!
//! The components are pure functions of their inputs. Loading and storing the
//! experiment state is left to the caller.

pub mod aggregation;
pub mod basal_melt;
pub mod distribution;
pub mod parameters;
pub mod response;
pub mod running_mean;
