//! Impulse-response accumulation of basal melt anomalies
//!
//! A melt anomaly in year `t` changes the ice-sheet discharge over the
//! following decades. That response is linear in the anomaly, so the forcing of
//! every future year is the superposition of the kernels of all past anomalies:
//!
//! $$ F(t) = \sum_{\tau \le t} K(t - \tau) \cdot \Delta m(\tau) $$
//!
//! The sum is built up incrementally in a [`ForcingLedger`], one year per
//! invocation.

use crate::parameters::ResponseParameters;
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::kernel::ResponseKernels;
use fwf_core::ledger::ForcingLedger;
use fwf_core::sector::SectorValues;
use fwf_core::series::FloatValue;
use log::debug;
use std::path::Path;

/// Apply the melt anomaly of experiment year `t`
///
/// The kernels scaled by `anomaly` are superposed onto `ledger` from offset `t`
/// onwards, dropping lags beyond the experiment horizon. Returns the forcing
/// anomaly (Gt/yr) of year `t`, the ledger's forward difference at `t`, along
/// with the updated ledger.
///
/// `ledger` must be [`ForcingLedger::zeros`] at `t = 0` and the ledger
/// returned for `t - 1` afterwards; any other `t` is rejected.
pub fn apply_anomaly(
    t: usize,
    anomaly: &SectorValues,
    kernels: &ResponseKernels,
    mut ledger: ForcingLedger,
) -> FWFResult<(SectorValues, ForcingLedger)> {
    let contribution = kernels.response(anomaly);
    let rows = ledger.superpose(t, contribution.view())?;
    debug!(
        "Superposed {} of {} response lags at experiment year {}",
        rows,
        kernels.len(),
        t
    );

    let forcing = ledger.forward_difference(t).ok_or_else(|| {
        FWFError::StateConsistency(format!("ledger has no row for experiment year {}", t))
    })?;
    Ok((forcing, ledger))
}

/// Total Antarctic freshwater forcing (Gt/yr): the baseline plus the forcing
/// anomalies of all sectors
pub fn total_forcing(forcing_anomaly: &SectorValues, baseline_total: FloatValue) -> FloatValue {
    forcing_anomaly.sum() + baseline_total
}

/// Impulse-response accumulator configured with a set of response kernels
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    kernels: ResponseKernels,
}

impl ImpulseResponse {
    pub fn new(kernels: ResponseKernels) -> Self {
        Self { kernels }
    }

    /// Load the kernels selected by `parameters` from `dir`
    pub fn from_parameters(parameters: &ResponseParameters, dir: &Path) -> FWFResult<Self> {
        let kernels = ResponseKernels::load(
            dir,
            &parameters.ice_sheet_model,
            &parameters.basal_melt_scenario,
            parameters.kernel_length,
        )?;
        Ok(Self::new(kernels))
    }

    pub fn kernels(&self) -> &ResponseKernels {
        &self.kernels
    }

    pub fn apply(
        &self,
        t: usize,
        anomaly: &SectorValues,
        ledger: ForcingLedger,
    ) -> FWFResult<(SectorValues, ForcingLedger)> {
        apply_anomaly(t, anomaly, &self.kernels, ledger)
    }
}
