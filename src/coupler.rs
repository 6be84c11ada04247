//! Yearly coupling driver
//!
//! Every simulation year of an experiment runs one [`Coupler::step`] in a
//! fresh process. The step reads the state left behind by the previous year
//! (sector tables and the forcing ledger), extends it with the current year
//! and writes it back. Nothing is written until every part of the year has
//! been computed.
//!
//! The ledger is written last and commits the year. Table rows of years the
//! ledger has not committed are left over from an interrupted attempt and are
//! discarded when the year is run again.

use crate::fields::{OceanYear, StaticFields, TimeAxis};
use crate::paths::ExperimentPaths;
use fwf_components::aggregation::sector_temperatures;
use fwf_components::basal_melt::BasalMelt;
use fwf_components::distribution::{FluxFields, FluxMapper, ShelfDepths};
use fwf_components::parameters::CouplerParameters;
use fwf_components::response::{total_forcing, ImpulseResponse};
use fwf_components::running_mean::RunningMean;
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::grid::LevelBounds;
use fwf_core::ledger::ForcingLedger;
use fwf_core::sector::SectorValues;
use fwf_core::series::{FloatValue, ScalarSeries, SectorSeries, Series, Year};
use fwf_core::table::TableRow;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Sector temperatures of one year, raw and smoothed
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureUpdate {
    pub year: Year,
    pub temperatures: SectorValues,
    pub running_mean: SectorValues,
}

/// Everything computed for one simulation year
#[derive(Debug, Clone, PartialEq)]
pub struct YearOutcome {
    pub year: Year,
    pub temperatures: SectorValues,
    pub running_mean: SectorValues,
    /// m/yr
    pub melt_anomaly: SectorValues,
    /// Gt/yr
    pub forcing_anomaly: SectorValues,
    /// Gt/yr
    pub total_forcing: FloatValue,
    pub fluxes: FluxFields,
    /// Time axis of the following year, on which the fluxes are applied
    pub time: TimeAxis,
}

/// Forcing of the first experiment year
#[derive(Debug, Clone, PartialEq)]
pub struct InitialForcing {
    pub fluxes: FluxFields,
    pub shelf_depths: ShelfDepths,
}

/// Tables of one experiment as held in memory during a step
struct ExperimentState {
    temperatures: SectorSeries,
    running_mean: SectorSeries,
}

impl ExperimentState {
    fn discard_from(&mut self, year: Year) -> usize {
        self.temperatures.discard_from(year) + self.running_mean.discard_from(year)
    }
}

#[derive(Debug, Clone)]
pub struct Coupler {
    parameters: CouplerParameters,
    paths: ExperimentPaths,
    statics: StaticFields,
    tracker: RunningMean,
    melt: BasalMelt,
    mapper: FluxMapper,
}

impl Coupler {
    pub fn new(
        parameters: CouplerParameters,
        paths: ExperimentPaths,
        statics: StaticFields,
    ) -> FWFResult<Self> {
        parameters.validate()?;

        Ok(Self {
            tracker: RunningMean::from_parameters(parameters.running_mean.clone()),
            melt: BasalMelt::from_parameters(parameters.basal_melt.clone()),
            mapper: FluxMapper::from_parameters(parameters.distribution.clone()),
            parameters,
            paths,
            statics,
        })
    }

    pub fn parameters(&self) -> &CouplerParameters {
        &self.parameters
    }

    pub fn paths(&self) -> &ExperimentPaths {
        &self.paths
    }

    /// Forcing applied in the first experiment year, before any ocean output
    /// exists: the baseline total forcing, and the depth range of the basal
    /// melt injection
    pub fn initialise(&self, level_bounds: &LevelBounds) -> FWFResult<InitialForcing> {
        let total = self.parameters.baseline_total_forcing;
        info!("Initial total freshwater forcing: {} Gt/yr", total);

        let fluxes = self.distribute(total)?;
        let shelf_depths = self
            .mapper
            .shelf_depths(self.statics.basal_melt_mask.view(), level_bounds)?;

        Ok(InitialForcing {
            fluxes,
            shelf_depths,
        })
    }

    /// Run the full pipeline for `year` and persist the experiment state
    pub fn step(&self, year: Year, ocean: &OceanYear) -> FWFResult<YearOutcome> {
        self.step_with(year, ocean, |_| Ok(()))
    }

    /// Like [`Coupler::step`], calling `before_commit` once the tables are
    /// written and before the ledger commits the year
    ///
    /// An error from `before_commit` leaves the year uncommitted, so it can
    /// be run again.
    pub fn step_with<F>(
        &self,
        year: Year,
        ocean: &OceanYear,
        before_commit: F,
    ) -> FWFResult<YearOutcome>
    where
        F: FnOnce(&YearOutcome) -> FWFResult<()>,
    {
        let t = self.paths.offset(year)?;
        self.statics.check_ocean(ocean)?;
        let time = ocean.time.shifted_by_year()?;

        let response =
            ImpulseResponse::from_parameters(&self.parameters.response, &self.paths.kernel_dir())?;
        let baseline = SectorSeries::read(&self.paths.baseline_temperature_table())?;

        let ledger = self.load_ledger(t)?;
        let first_year = year == self.paths.year_min();
        let mut state = self.load_state(first_year)?;
        let mut melt_anomalies: SectorSeries =
            self.load_series(&self.paths.basal_melt_table(), first_year)?;
        let mut forcing_anomalies: SectorSeries =
            self.load_series(&self.paths.forcing_anomaly_table(), first_year)?;
        let mut totals: ScalarSeries =
            self.load_series(&self.paths.total_forcing_table(), first_year)?;

        let discarded = state.discard_from(year)
            + melt_anomalies.discard_from(year)
            + forcing_anomalies.discard_from(year)
            + totals.discard_from(year);
        if discarded > 0 {
            warn!(
                "Discarding {} uncommitted table rows from {} onwards",
                discarded, year
            );
        }

        let update = self.update_temperatures(year, ocean, &baseline, &mut state)?;

        let reference = self.tracker.reference(&baseline)?;
        let melt_anomaly = self.melt.anomalies(&reference, &update.running_mean);
        melt_anomalies.append(year, melt_anomaly)?;

        let (forcing_anomaly, ledger) = response.apply(t, &melt_anomaly, ledger)?;
        forcing_anomalies.append(year, forcing_anomaly)?;

        let total = total_forcing(&forcing_anomaly, self.parameters.baseline_total_forcing);
        totals.append(year, total)?;
        info!("Total freshwater forcing for {}: {} Gt/yr", year + 1, total);

        let outcome = YearOutcome {
            year,
            temperatures: update.temperatures,
            running_mean: update.running_mean,
            melt_anomaly,
            forcing_anomaly,
            total_forcing: total,
            fluxes: self.distribute(total)?,
            time,
        };

        self.prepare_output_dir()?;
        self.store_state(&state)?;
        melt_anomalies.write(&self.paths.basal_melt_table())?;
        forcing_anomalies.write(&self.paths.forcing_anomaly_table())?;
        totals.write(&self.paths.total_forcing_table())?;
        before_commit(&outcome)?;
        ledger.write(&self.paths.ledger_file())?;

        Ok(outcome)
    }

    /// Track the sector temperatures of `year` without computing any forcing
    ///
    /// Used by experiments that prescribe their freshwater forcing.
    pub fn prescribed(&self, year: Year, ocean: &OceanYear) -> FWFResult<TemperatureUpdate> {
        self.paths.offset(year)?;
        self.statics.check_ocean(ocean)?;
        let baseline = SectorSeries::read(&self.paths.baseline_temperature_table())?;

        let mut state = self.load_state(year == self.paths.year_min())?;
        // The running-mean table is written last and commits a year here
        let committed = state
            .running_mean
            .last_year()
            .map_or(self.paths.year_min(), |last| last + 1);
        let discarded = state.temperatures.discard_from(committed);
        if discarded > 0 {
            warn!(
                "Discarding {} uncommitted temperature rows from {} onwards",
                discarded, committed
            );
        }
        let update = self.update_temperatures(year, ocean, &baseline, &mut state)?;

        self.prepare_output_dir()?;
        self.store_state(&state)?;
        Ok(update)
    }

    fn update_temperatures(
        &self,
        year: Year,
        ocean: &OceanYear,
        baseline: &SectorSeries,
        state: &mut ExperimentState,
    ) -> FWFResult<TemperatureUpdate> {
        let temperatures = sector_temperatures(
            ocean.temperature.view(),
            &self.statics.grid,
            &ocean.level_bounds,
        )?;
        for (sector, value) in temperatures.iter() {
            debug!("{} temperature in {}: {} degC", sector.long_name(), year, value);
        }
        state.temperatures.append(year, temperatures)?;

        let running_mean =
            self.tracker
                .backward(&state.temperatures, baseline, year, self.paths.year_min())?;
        state.running_mean.append(year, running_mean)?;

        Ok(TemperatureUpdate {
            year,
            temperatures,
            running_mean,
        })
    }

    fn distribute(&self, total: FloatValue) -> FWFResult<FluxFields> {
        self.mapper.distribute(
            total,
            self.statics.basal_melt_mask.view(),
            self.statics.calving_mask.view(),
            self.statics.grid.cell_area(),
        )
    }

    fn load_state(&self, first_year: bool) -> FWFResult<ExperimentState> {
        Ok(ExperimentState {
            temperatures: self.load_series(&self.paths.temperature_table(), first_year)?,
            running_mean: self.load_series(
                &self
                    .paths
                    .running_mean_table(self.parameters.running_mean.period),
                first_year,
            )?,
        })
    }

    fn store_state(&self, state: &ExperimentState) -> FWFResult<()> {
        state.temperatures.write(&self.paths.temperature_table())?;
        state.running_mean.write(
            &self
                .paths
                .running_mean_table(self.parameters.running_mean.period),
        )
    }

    /// Tables start empty in the first year and are read back afterwards
    fn load_series<T: TableRow>(&self, path: &Path, first_year: bool) -> FWFResult<Series<T>> {
        if first_year {
            if path.exists() {
                warn!("Replacing {} from an earlier run", path.display());
            }
            Ok(Series::new())
        } else {
            Series::read(path)
        }
    }

    fn load_ledger(&self, t: usize) -> FWFResult<ForcingLedger> {
        let length = self.paths.experiment_length();
        if t == 0 {
            return Ok(ForcingLedger::zeros(length));
        }

        let path = self.paths.ledger_file();
        let ledger = ForcingLedger::read(&path)?;
        ledger.check_length(length)?;
        ledger.check_next(t)?;
        Ok(ledger)
    }

    fn prepare_output_dir(&self) -> FWFResult<()> {
        let dir = self.paths.output_dir();
        fs::create_dir_all(&dir).map_err(|e| FWFError::io(dir, e))
    }
}
