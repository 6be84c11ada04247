//! Antarctic freshwater forcing for coupled climate model runs
//!
//! Once per simulation year the coupler reduces the ocean model's subsurface
//! temperatures to five Antarctic sectors, turns their (smoothed) warming into
//! basal melt anomalies, propagates those through the ice-sheet response
//! kernels and maps the resulting freshwater forcing onto the ocean grid for
//! the following year.
//!
//! The physics lives in [`fwf_components`], the shared types and persisted
//! state in [`fwf_core`]. This crate drives a whole experiment: it lays out the
//! experiment's files ([`paths`]), runs each year ([`coupler`]) and, with the
//! `netcdf` feature, reads and writes the ocean model's files.

pub mod coupler;
pub mod fields;
#[cfg(feature = "netcdf")]
pub mod io;
pub mod paths;

pub use fwf_components;
pub use fwf_core;
