//! Multi-year runs of the coupler against a temporary experiment directory.
//!
//! Every test lays out kernel files and a baseline table the way an
//! experiment's start directory does, then drives the coupler one year at a
//! time as the yearly invocations of a real run would.

use approx::assert_relative_eq;
use fwf::coupler::Coupler;
use fwf::fields::{OceanYear, StaticFields, TimeAxis};
use fwf::paths::ExperimentPaths;
use fwf_components::parameters::CouplerParameters;
use fwf_core::constants::{KG_PER_GT, SECONDS_PER_YEAR};
use fwf_core::errors::FWFError;
use fwf_core::grid::{HorizontalGrid, LevelBounds};
use fwf_core::kernel::{ResponseKernels, KERNEL_LENGTH};
use fwf_core::ledger::ForcingLedger;
use fwf_core::sector::{Sector, SectorValues};
use fwf_core::series::{FloatValue, ScalarSeries, SectorSeries, Year};
use ndarray::{array, Array2, Array3, Axis};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BASELINE: [FloatValue; 5] = [-1.0, -1.8, 0.5, -1.9, 0.2];

/// One ocean column per sector, in column order
fn statics() -> StaticFields {
    let grid = HorizontalGrid::new(
        array![[-70.0, -75.0, -72.0, -78.0, -67.0]],
        array![[10.0, 320.0, 250.0, 180.0, 300.0]],
        Array2::from_elem((1, 5), 1.0e10),
    )
    .unwrap();
    StaticFields::new(
        grid,
        array![[1.0, 1.0, 0.0, 0.0, 0.0]],
        array![[0.0, 0.0, 1.0, 1.0, 1.0]],
    )
    .unwrap()
}

fn bounds() -> LevelBounds {
    let pairs: Vec<(FloatValue, FloatValue)> = (0..12)
        .map(|k| (k as FloatValue * 100.0, (k + 1) as FloatValue * 100.0))
        .collect();
    LevelBounds::from_pairs(&pairs).unwrap()
}

/// Ocean year with a depth-constant temperature in every sector column
fn ocean(temperatures: SectorValues) -> OceanYear {
    let mut field = Array3::zeros((12, 1, 5));
    for sector in Sector::ALL {
        field
            .index_axis_mut(Axis(2), usize::from(sector))
            .fill(temperatures[sector]);
    }
    let time = TimeAxis::new(
        (0..12).map(|m| m as FloatValue * 2_628_000.0).collect(),
        "seconds since 1850-01-01 00:00:00",
    );
    OceanYear::new(field, bounds(), time).unwrap()
}

/// Start directory with unit kernels and the baseline table
fn experiment(year_min: Year, year_max: Year) -> (TempDir, ExperimentPaths) {
    let dir = tempfile::tempdir().unwrap();
    let paths =
        ExperimentPaths::new(dir.path(), dir.path().join("run"), "test", year_min, year_max).unwrap();

    let kernel_dir = paths.kernel_dir();
    fs::create_dir_all(&kernel_dir).unwrap();
    let kernel = "1.0\n".repeat(KERNEL_LENGTH);
    for sector in Sector::ALL {
        fs::write(
            kernel_dir.join(ResponseKernels::file_name("IMAU_VUB", "08", sector)),
            &kernel,
        )
        .unwrap();
    }

    fs::create_dir_all(paths.input_dir()).unwrap();
    SectorSeries::from_rows(vec![(1850, SectorValues::new(BASELINE))])
        .unwrap()
        .write(&paths.baseline_temperature_table())
        .unwrap();

    (dir, paths)
}

fn coupler(paths: &ExperimentPaths, period: usize) -> Coupler {
    let mut parameters = CouplerParameters::default();
    parameters.running_mean.period = period;
    Coupler::new(parameters, paths.clone(), statics()).unwrap()
}

/// Occupy the temporary sibling of `path` so the next write to it fails
fn block_write(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap().to_os_string();
    name.push(".tmp");
    let blocker = path.with_file_name(name);
    fs::create_dir_all(&blocker).unwrap();
    blocker
}

fn recovered_total(flux: &Array2<FloatValue>) -> FloatValue {
    flux.iter().sum::<FloatValue>() * 1.0e10 * SECONDS_PER_YEAR / KG_PER_GT
}

#[test]
fn steady_climate_keeps_the_baseline_forcing() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 30);

    for year in 1850..1855 {
        let outcome = coupler.step(year, &ocean(SectorValues::new(BASELINE))).unwrap();
        assert_eq!(outcome.year, year);
        assert_relative_eq!(outcome.total_forcing, 3315.0, epsilon = 1e-9);
        assert_relative_eq!(
            recovered_total(&outcome.fluxes.basal_melt),
            0.55 * 3315.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            recovered_total(&outcome.fluxes.calving),
            0.45 * 3315.0,
            max_relative = 1e-12
        );
    }

    let totals = ScalarSeries::read(&paths.total_forcing_table()).unwrap();
    assert_eq!(totals.first_year(), Some(1850));
    assert_eq!(totals.last_year(), Some(1854));

    let ledger = ForcingLedger::read(&paths.ledger_file()).unwrap();
    assert_eq!(ledger.length(), 10);
    assert_eq!(ledger.applied(), 5);
}

#[test]
fn warming_feeds_through_the_persisted_ledger() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 1);

    let mut anomalies = Vec::new();
    for (i, year) in (1850..1853).enumerate() {
        let warming = (i + 1) as FloatValue * 0.5;
        let outcome = coupler
            .step(year, &ocean(SectorValues::new(BASELINE).map(|t| t + warming)))
            .unwrap();

        // Unit kernels: the forcing of a year is the melt anomaly of that year
        for sector in Sector::ALL {
            assert!(outcome.melt_anomaly[sector] > 0.0);
            assert_relative_eq!(
                outcome.forcing_anomaly[sector],
                outcome.melt_anomaly[sector],
                max_relative = 1e-9
            );
        }
        assert_relative_eq!(
            outcome.total_forcing,
            3315.0 + outcome.melt_anomaly.sum(),
            max_relative = 1e-12
        );
        anomalies.push(outcome.melt_anomaly);
    }

    // Every future row holds the sum of all anomalies applied so far
    let ledger = ForcingLedger::read(&paths.ledger_file()).unwrap();
    let row = ledger.row(9).unwrap();
    for sector in Sector::ALL {
        let expected: FloatValue = anomalies.iter().map(|a| a[sector]).sum();
        assert_relative_eq!(row[sector], expected, max_relative = 1e-9);
    }

    let melt = SectorSeries::read(&paths.basal_melt_table()).unwrap();
    assert_eq!(melt.len(), 3);
    assert_eq!(melt.require(1852, "melt").unwrap(), anomalies[2]);
}

#[test]
fn forcing_is_applied_on_the_next_year() {
    let (_dir, paths) = experiment(1850, 1851);
    let coupler = coupler(&paths, 30);

    let outcome = coupler.step(1850, &ocean(SectorValues::new(BASELINE))).unwrap();
    assert_eq!(outcome.time.values[0], 31_536_000.0);
    assert_eq!(outcome.time.values.len(), 12);
}

#[test]
fn repeated_and_skipped_years_are_rejected() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 30);
    let fields = ocean(SectorValues::new(BASELINE));

    coupler.step(1850, &fields).unwrap();
    coupler.step(1851, &fields).unwrap();

    assert!(matches!(
        coupler.step(1851, &fields),
        Err(FWFError::StateConsistency(_))
    ));
    assert!(matches!(
        coupler.step(1853, &fields),
        Err(FWFError::StateConsistency(_))
    ));

    // The failed years left the state untouched
    assert_eq!(ForcingLedger::read(&paths.ledger_file()).unwrap().applied(), 2);
    coupler.step(1852, &fields).unwrap();
}

#[test]
fn year_interrupted_before_the_ledger_commit_can_be_rerun() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 1);
    let warm = ocean(SectorValues::new(BASELINE).map(|t| t + 1.0));

    coupler.step(1850, &warm).unwrap();
    let blocker = block_write(&paths.ledger_file());
    assert!(matches!(coupler.step(1851, &warm), Err(FWFError::Io { .. })));
    // Tables already hold 1851, the ledger does not
    assert_eq!(
        SectorSeries::read(&paths.temperature_table()).unwrap().last_year(),
        Some(1851)
    );
    assert_eq!(ForcingLedger::read(&paths.ledger_file()).unwrap().applied(), 1);

    fs::remove_dir(&blocker).unwrap();
    let outcome = coupler.step(1851, &warm).unwrap();
    coupler.step(1852, &warm).unwrap();

    for table in [
        paths.temperature_table(),
        paths.running_mean_table(1),
        paths.basal_melt_table(),
        paths.forcing_anomaly_table(),
    ] {
        let series = SectorSeries::read(&table).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_year(), Some(1852));
    }
    let totals = ScalarSeries::read(&paths.total_forcing_table()).unwrap();
    assert_relative_eq!(
        totals.require(1851, "totals").unwrap(),
        outcome.total_forcing,
        max_relative = 1e-12
    );

    let ledger = ForcingLedger::read(&paths.ledger_file()).unwrap();
    assert_eq!(ledger.applied(), 3);
    for sector in Sector::ALL {
        // Unit kernels: three applied anomalies, none counted twice
        assert_relative_eq!(
            ledger.row(9).unwrap()[sector],
            3.0 * outcome.melt_anomaly[sector],
            max_relative = 1e-9
        );
    }
}

#[test]
fn failed_output_hook_leaves_the_year_uncommitted() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 30);
    let fields = ocean(SectorValues::new(BASELINE));

    coupler.step(1850, &fields).unwrap();
    let err = coupler
        .step_with(1851, &fields, |_| {
            Err(FWFError::Configuration("forcing file not written".to_string()))
        })
        .unwrap_err();
    assert!(matches!(err, FWFError::Configuration(_)));
    assert_eq!(ForcingLedger::read(&paths.ledger_file()).unwrap().applied(), 1);

    let mut seen = None;
    coupler
        .step_with(1851, &fields, |outcome| {
            seen = Some(outcome.year);
            Ok(())
        })
        .unwrap();
    assert_eq!(seen, Some(1851));
    assert_eq!(ForcingLedger::read(&paths.ledger_file()).unwrap().applied(), 2);
}

#[test]
fn years_outside_the_experiment_fail_before_any_io() {
    let (_dir, paths) = experiment(1850, 1852);
    let coupler = coupler(&paths, 30);
    let fields = ocean(SectorValues::new(BASELINE));

    assert!(matches!(
        coupler.step(1853, &fields),
        Err(FWFError::Configuration(_))
    ));
    assert!(!paths.output_dir().exists());
}

#[test]
fn restarting_at_the_first_year_recreates_the_tables() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 30);
    let fields = ocean(SectorValues::new(BASELINE));

    for year in 1850..1853 {
        coupler.step(year, &fields).unwrap();
    }
    coupler.step(1850, &fields).unwrap();

    assert_eq!(SectorSeries::read(&paths.temperature_table()).unwrap().len(), 1);
    assert_eq!(ForcingLedger::read(&paths.ledger_file()).unwrap().applied(), 1);
}

#[test]
fn missing_kernels_are_reported_with_their_path() {
    let (_dir, paths) = experiment(1850, 1859);
    let missing = paths
        .kernel_dir()
        .join(ResponseKernels::file_name("IMAU_VUB", "08", Sector::Ross));
    fs::remove_file(&missing).unwrap();

    let err = coupler(&paths, 30)
        .step(1850, &ocean(SectorValues::new(BASELINE)))
        .unwrap_err();
    match err {
        FWFError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn prescribed_runs_only_track_temperatures() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 2);

    let first = coupler
        .prescribed(1850, &ocean(SectorValues::new(BASELINE).map(|t| t + 1.0)))
        .unwrap();
    for sector in Sector::ALL {
        assert_relative_eq!(
            first.running_mean[sector],
            BASELINE[usize::from(sector)] + 0.5,
            max_relative = 1e-12
        );
    }
    coupler
        .prescribed(1851, &ocean(SectorValues::new(BASELINE)))
        .unwrap();

    let running_mean = SectorSeries::read(&paths.running_mean_table(2)).unwrap();
    assert_eq!(running_mean.len(), 2);
    assert!(paths.temperature_table().exists());
    assert!(!paths.ledger_file().exists());
    assert!(!paths.total_forcing_table().exists());
}

#[test]
fn prescribed_year_interrupted_before_the_running_mean_can_be_rerun() {
    let (_dir, paths) = experiment(1850, 1859);
    let coupler = coupler(&paths, 2);
    let fields = ocean(SectorValues::new(BASELINE));

    coupler.prescribed(1850, &fields).unwrap();
    let blocker = block_write(&paths.running_mean_table(2));
    assert!(coupler.prescribed(1851, &fields).is_err());
    assert_eq!(SectorSeries::read(&paths.temperature_table()).unwrap().len(), 2);

    fs::remove_dir(&blocker).unwrap();
    coupler.prescribed(1851, &fields).unwrap();
    assert_eq!(SectorSeries::read(&paths.temperature_table()).unwrap().len(), 2);
    assert_eq!(SectorSeries::read(&paths.running_mean_table(2)).unwrap().len(), 2);

    // A committed year is still a repeat
    assert!(matches!(
        coupler.prescribed(1851, &fields),
        Err(FWFError::StateConsistency(_))
    ));
}

#[test]
fn initial_forcing_uses_the_baseline_total() {
    let (_dir, paths) = experiment(1850, 1859);
    let initial = coupler(&paths, 30).initialise(&bounds()).unwrap();

    assert_relative_eq!(
        recovered_total(&initial.fluxes.basal_melt) + recovered_total(&initial.fluxes.calving),
        3315.0,
        max_relative = 1e-12
    );
    assert_eq!(initial.shelf_depths.shallow, array![[200.0, 200.0, 0.0, 0.0, 0.0]]);
    assert_eq!(initial.shelf_depths.deep, array![[700.0, 700.0, 0.0, 0.0, 0.0]]);
    assert!(!paths.output_dir().exists());
}
