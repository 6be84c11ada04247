//! Core types for the Antarctic freshwater-forcing coupler
//!
//! This crate holds everything the physics components share: the error type,
//! physical constants, the five Antarctic ocean sectors, gridded fields,
//! the yearly sector tables and the future-forcing ledger that carries state
//! from one simulation year to the next.

pub mod constants;
pub mod errors;
pub mod grid;
pub mod kernel;
pub mod ledger;
pub mod levels;
pub mod sector;
pub mod series;
pub mod table;
