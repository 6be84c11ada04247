//! Spatial distribution of the freshwater forcing
//!
//! The total Antarctic forcing (Gt/yr) is split into a basal melt and a
//! calving part. Each part is spread uniformly, as a mass flux in
//! kg m^-2 s^-1, over the ocean cells of its own mask.

use crate::parameters::DistributionParameters;
use fwf_core::constants::{KG_PER_GT, SECONDS_PER_YEAR};
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::grid::{check_shape, is_valid, LevelBounds};
use fwf_core::levels::{nearest_above, nearest_below};
use fwf_core::series::FloatValue;
use log::info;
use ndarray::{Array2, ArrayView2, Zip};

/// Mask cells are selected where the mask value is a valid positive number
fn is_selected(mask_value: FloatValue) -> bool {
    is_valid(mask_value) && mask_value > 0.0
}

/// Total area (m^2) of the cells selected by `mask`
pub fn masked_area(mask: ArrayView2<FloatValue>, areas: ArrayView2<FloatValue>) -> FWFResult<FloatValue> {
    check_shape("mask", areas.shape(), mask.shape())?;
    Ok(Zip::from(mask).and(areas).fold(0.0, |acc, &m, &a| {
        if is_selected(m) && is_valid(a) && a > 0.0 {
            acc + a
        } else {
            acc
        }
    }))
}

/// Spread `amount` (Gt/yr) uniformly over the cells of `mask`
///
/// Returns the flux in kg m^-2 s^-1. Cells outside the mask are zero.
pub fn uniform_flux(
    amount: FloatValue,
    mask: ArrayView2<FloatValue>,
    areas: ArrayView2<FloatValue>,
    what: &str,
) -> FWFResult<Array2<FloatValue>> {
    let area = masked_area(mask, areas)?;
    if area <= 0.0 {
        return Err(FWFError::EmptySelection(format!("the {} mask", what)));
    }
    info!("{} area: {} m^2", what, area);

    let flux = amount * KG_PER_GT / SECONDS_PER_YEAR / area;
    Ok(mask.mapv(|m| if is_selected(m) { flux } else { 0.0 }))
}

/// Basal melt and calving flux fields (kg m^-2 s^-1)
#[derive(Debug, Clone, PartialEq)]
pub struct FluxFields {
    pub basal_melt: Array2<FloatValue>,
    pub calving: Array2<FloatValue>,
}

/// Depth fields bounding the vertical extent of the basal melt injection (m)
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfDepths {
    /// Upper bound of the shallowest injection level, in every basal melt cell
    pub shallow: Array2<FloatValue>,
    /// Lower bound of the deepest injection level, in every basal melt cell
    pub deep: Array2<FloatValue>,
}

/// Flux mapper configured with a basal melt / calving split
#[derive(Debug, Clone)]
pub struct FluxMapper {
    parameters: DistributionParameters,
}

impl Default for FluxMapper {
    fn default() -> Self {
        Self::from_parameters(DistributionParameters::default())
    }
}

impl FluxMapper {
    pub fn from_parameters(parameters: DistributionParameters) -> Self {
        Self { parameters }
    }

    /// Split `total_forcing` (Gt/yr) and spread both parts over their masks
    pub fn distribute(
        &self,
        total_forcing: FloatValue,
        basal_melt_mask: ArrayView2<FloatValue>,
        calving_mask: ArrayView2<FloatValue>,
        areas: ArrayView2<FloatValue>,
    ) -> FWFResult<FluxFields> {
        let basal_melt = uniform_flux(
            self.parameters.basal_melt_fraction * total_forcing,
            basal_melt_mask,
            areas,
            "basal melt",
        )?;
        let calving = uniform_flux(
            self.parameters.calving_fraction * total_forcing,
            calving_mask,
            areas,
            "calving",
        )?;
        Ok(FluxFields {
            basal_melt,
            calving,
        })
    }

    /// Depth fields for the configured shallow and deep injection depths
    pub fn shelf_depths(
        &self,
        basal_melt_mask: ArrayView2<FloatValue>,
        bounds: &LevelBounds,
    ) -> FWFResult<ShelfDepths> {
        shelf_depth_fields(
            basal_melt_mask,
            bounds,
            self.parameters.shallow_depth,
            self.parameters.deep_depth,
        )
    }
}

/// Distribute `total_forcing` (Gt/yr) with the observed 55 % basal melt and
/// 45 % calving split
pub fn distribute(
    total_forcing: FloatValue,
    basal_melt_mask: ArrayView2<FloatValue>,
    calving_mask: ArrayView2<FloatValue>,
    areas: ArrayView2<FloatValue>,
) -> FWFResult<FluxFields> {
    FluxMapper::default().distribute(total_forcing, basal_melt_mask, calving_mask, areas)
}

/// Snap the basal melt depth range onto the vertical grid
///
/// The shallow edge is the smallest upper level bound that is not shallower
/// than `shallow`, the deep edge the largest lower level bound that is not
/// deeper than `deep`. Both are written into every basal melt cell; all other
/// cells are zero.
pub fn shelf_depth_fields(
    basal_melt_mask: ArrayView2<FloatValue>,
    bounds: &LevelBounds,
    shallow: FloatValue,
    deep: FloatValue,
) -> FWFResult<ShelfDepths> {
    let upper = bounds.upper();
    let lower = bounds.lower();

    let top = nearest_above(upper, shallow).ok_or(FWFError::LevelNotFound {
        relation: "at or below",
        target: shallow,
    })?;
    let bottom = nearest_below(lower, deep).ok_or(FWFError::LevelNotFound {
        relation: "at or above",
        target: deep,
    })?;

    let shallow_edge = upper[top];
    let deep_edge = lower[bottom];
    info!(
        "Basal melt injected between {} m (upper bound of level {}) and {} m (lower bound of level {})",
        shallow_edge, top, deep_edge, bottom
    );

    let fill = |depth: FloatValue| basal_melt_mask.mapv(|m| if is_selected(m) { depth } else { 0.0 });
    Ok(ShelfDepths {
        shallow: fill(shallow_edge),
        deep: fill(deep_edge),
    })
}
