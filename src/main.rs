//! Freshwater forcing coupler
//!
//! Run once per simulation year, between two legs of the ocean model.
//!
//! # Usage
//!
//! ```bash
//! # before the first leg
//! fwf initialise --year-min 1850 --year-max 2100 --exp-name hist \
//!   --start-dir /runtime --run-dir /scratch/hist --year 1850 --leg 1
//! # after every leg
//! fwf step --year-min 1850 --year-max 2100 --exp-name hist \
//!   --start-dir /runtime --run-dir /scratch/hist --year 1850 --leg 1
//! ```

use clap::{Args, Parser, Subcommand};
use fwf::coupler::Coupler;
use fwf::fields::StaticFields;
use fwf::io;
use fwf::paths::ExperimentPaths;
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::series::Year;
use fwf_components::parameters::CouplerParameters;
use log::{error, info};
use std::fs;
use std::path::PathBuf;

/// Antarctic freshwater forcing for coupled ocean model runs
#[derive(Parser, Debug)]
#[command(name = "fwf")]
#[command(about = "Compute Antarctic freshwater forcing from ocean temperatures")]
struct Cli {
    /// TOML file overriding the default parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the forcing of the first year and the basal melt depth files
    Initialise(RunArgs),
    /// Compute the forcing of the next year from the ocean output of a year
    Step(RunArgs),
    /// Only track sector temperatures, for prescribed forcing experiments
    Prescribed(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// First year of the experiment
    #[arg(long)]
    year_min: Year,

    /// Last year of the experiment
    #[arg(long)]
    year_max: Year,

    /// Experiment name
    #[arg(long)]
    exp_name: String,

    /// Directory holding `fwf/interactive`
    #[arg(long)]
    start_dir: PathBuf,

    /// Run directory of the experiment
    #[arg(long)]
    run_dir: PathBuf,

    /// Simulation year whose ocean output is read
    #[arg(long)]
    year: Year,

    /// Leg number that produced the ocean output
    #[arg(long)]
    leg: u32,
}

impl RunArgs {
    fn paths(&self) -> FWFResult<ExperimentPaths> {
        ExperimentPaths::new(
            &self.start_dir,
            &self.run_dir,
            &self.exp_name,
            self.year_min,
            self.year_max,
        )
    }
}

fn load_parameters(config: Option<&PathBuf>) -> FWFResult<CouplerParameters> {
    match config {
        Some(path) => CouplerParameters::from_toml_file(path),
        None => Ok(CouplerParameters::default()),
    }
}

fn coupler(parameters: CouplerParameters, args: &RunArgs) -> FWFResult<Coupler> {
    let paths = args.paths()?;
    // Validate before touching any file
    parameters.validate()?;
    paths.offset(args.year)?;

    let statics = StaticFields::new(
        io::read_grid(&paths.area_file())?,
        io::read_mask(&paths.basal_melt_mask_file(), "basal_melt_mask")?,
        io::read_mask(&paths.calving_mask_file(), "calving_mask")?,
    )?;
    Coupler::new(parameters, paths, statics)
}

fn run(cli: Cli) -> FWFResult<()> {
    let parameters = load_parameters(cli.config.as_ref())?;

    match cli.command {
        Command::Initialise(args) => {
            let coupler = coupler(parameters, &args)?;
            let paths = coupler.paths();
            let ocean_file = paths.ocean_output_file(args.year, args.leg);
            let (level_bounds, time) = io::read_levels_and_time(&ocean_file)?;

            let initial = coupler.initialise(&level_bounds)?;
            let output_dir = paths.output_dir();
            fs::create_dir_all(&output_dir).map_err(|e| FWFError::io(&output_dir, e))?;
            io::write_forcing(
                &paths.forcing_file(paths.year_min()),
                &initial.fluxes,
                &time,
            )?;
            let (shallow, deep) = paths.shelf_depth_files();
            io::write_shelf_depth(&shallow, initial.shelf_depths.shallow.view(), &time)?;
            io::write_shelf_depth(&deep, initial.shelf_depths.deep.view(), &time)?;
        }
        Command::Step(args) => {
            let coupler = coupler(parameters, &args)?;
            let paths = coupler.paths();
            let ocean = io::read_ocean_year(&paths.ocean_output_file(args.year, args.leg))?;

            // The forcing file is part of the year, so it is written before the commit
            let outcome = coupler.step_with(args.year, &ocean, |outcome| {
                io::write_forcing(
                    &paths.forcing_file(args.year + 1),
                    &outcome.fluxes,
                    &outcome.time,
                )
            })?;
            info!(
                "Year {} done: total forcing {} Gt/yr",
                outcome.year, outcome.total_forcing
            );
        }
        Command::Prescribed(args) => {
            let coupler = coupler(parameters, &args)?;
            let paths = coupler.paths();
            let ocean = io::read_ocean_year(&paths.ocean_output_file(args.year, args.leg))?;

            let update = coupler.prescribed(args.year, &ocean)?;
            info!("Year {} done: {:?}", update.year, update.running_mean);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
