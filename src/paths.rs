//! File layout of a coupled experiment
//!
//! ```text
//! {start_dir}/fwf/interactive/
//! ├── input/                      static grid, masks and baseline temperatures
//! ├── RFunctions/TotalFW/         response kernels
//! └── forcing_files/{exp_name}/   state tables, ledger and forcing files
//! {run_dir}/output/nemo/{leg}/    ocean model output of each leg
//! ```

use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::series::Year;
use std::path::PathBuf;

/// Paths of every file read or written during an experiment
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentPaths {
    start_dir: PathBuf,
    run_dir: PathBuf,
    exp_name: String,
    year_min: Year,
    year_max: Year,
}

impl ExperimentPaths {
    pub fn new(
        start_dir: impl Into<PathBuf>,
        run_dir: impl Into<PathBuf>,
        exp_name: &str,
        year_min: Year,
        year_max: Year,
    ) -> FWFResult<Self> {
        if exp_name.is_empty() || exp_name.contains(['/', '\\']) {
            return Err(FWFError::Configuration(format!(
                "invalid experiment name '{}'",
                exp_name
            )));
        }
        if year_max < year_min {
            return Err(FWFError::Configuration(format!(
                "last year {} lies before the first year {}",
                year_max, year_min
            )));
        }

        Ok(Self {
            start_dir: start_dir.into(),
            run_dir: run_dir.into(),
            exp_name: exp_name.to_string(),
            year_min,
            year_max,
        })
    }

    pub fn exp_name(&self) -> &str {
        &self.exp_name
    }

    pub fn year_min(&self) -> Year {
        self.year_min
    }

    pub fn year_max(&self) -> Year {
        self.year_max
    }

    /// Number of simulation years in the experiment
    pub fn experiment_length(&self) -> usize {
        (self.year_max - self.year_min) as usize + 1
    }

    /// Offset of `year` from the first experiment year
    pub fn offset(&self, year: Year) -> FWFResult<usize> {
        if year < self.year_min || year > self.year_max {
            return Err(FWFError::Configuration(format!(
                "year {} lies outside the experiment {}-{}",
                year, self.year_min, self.year_max
            )));
        }
        Ok((year - self.year_min) as usize)
    }

    fn interactive_dir(&self) -> PathBuf {
        self.start_dir.join("fwf").join("interactive")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.interactive_dir().join("input")
    }

    /// Directory holding the per-sector response kernel files
    pub fn kernel_dir(&self) -> PathBuf {
        self.interactive_dir().join("RFunctions").join("TotalFW")
    }

    /// Directory of the experiment's state tables and forcing files
    pub fn output_dir(&self) -> PathBuf {
        self.interactive_dir()
            .join("forcing_files")
            .join(&self.exp_name)
    }

    pub fn area_file(&self) -> PathBuf {
        self.input_dir()
            .join("areacello_Ofx_EC-Earth3_historical_r1i1p1f1_gn.nc")
    }

    pub fn basal_melt_mask_file(&self) -> PathBuf {
        self.input_dir().join("basal_melt_mask_ORCA1_ocean.nc")
    }

    pub fn calving_mask_file(&self) -> PathBuf {
        self.input_dir().join("calving_mask_ORCA1_ocean.nc")
    }

    /// Sector temperatures of the pre-industrial control climate
    pub fn baseline_temperature_table(&self) -> PathBuf {
        self.input_dir().join("OceanSectorThetao_piControl.csv")
    }

    /// Monthly 3-D ocean output of `year`, produced by leg `leg`
    pub fn ocean_output_file(&self, year: Year, leg: u32) -> PathBuf {
        self.run_dir
            .join("output")
            .join("nemo")
            .join(format!("{:03}", leg))
            .join(format!(
                "{}_1m_{}0101_{}1231_opa_grid_T_3D.nc",
                self.exp_name, year, year
            ))
    }

    /// Forcing file applied by the ocean model in `year`
    pub fn forcing_file(&self, year: Year) -> PathBuf {
        self.output_dir().join(format!("FWF_LRF_y{}.nc", year))
    }

    /// Upper and lower basal melt depth files
    pub fn shelf_depth_files(&self) -> (PathBuf, PathBuf) {
        let dir = self.output_dir();
        (
            dir.join("basal_melt_depth1.nc"),
            dir.join("basal_melt_depth2.nc"),
        )
    }

    fn table(&self, name: &str) -> PathBuf {
        self.output_dir().join(format!(
            "{}_{}_{}_{}.csv",
            name, self.exp_name, self.year_min, self.year_max
        ))
    }

    pub fn temperature_table(&self) -> PathBuf {
        self.table("OceanSectorThetao")
    }

    pub fn running_mean_table(&self, period: usize) -> PathBuf {
        self.table(&format!("OceanSectorThetao_{}yRM", period))
    }

    pub fn basal_melt_table(&self) -> PathBuf {
        self.table("BasalMeltAnomaly")
    }

    pub fn forcing_anomaly_table(&self) -> PathBuf {
        self.table("FreshwaterForcingAnomaly")
    }

    pub fn total_forcing_table(&self) -> PathBuf {
        self.table("TotalFreshwaterForcing")
    }

    /// Future-forcing ledger carried between yearly invocations
    pub fn ledger_file(&self) -> PathBuf {
        self.output_dir().join(format!(
            "CumulativeFreshwaterForcingAnomaly_{}_Future.csv",
            self.exp_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn paths() -> ExperimentPaths {
        ExperimentPaths::new("/runtime/classic", "/scratch/run", "hist", 1850, 2100).unwrap()
    }

    #[test]
    fn experiment_length_and_offsets() {
        let p = paths();
        assert_eq!(p.experiment_length(), 251);
        assert_eq!(p.offset(1850).unwrap(), 0);
        assert_eq!(p.offset(2100).unwrap(), 250);
        assert!(matches!(p.offset(2101), Err(FWFError::Configuration(_))));
        assert!(p.offset(1849).is_err());
    }

    #[test]
    fn invalid_experiments() {
        assert!(ExperimentPaths::new("/a", "/b", "hist", 1900, 1850).is_err());
        assert!(ExperimentPaths::new("/a", "/b", "", 1850, 1900).is_err());
        assert!(ExperimentPaths::new("/a", "/b", "x/y", 1850, 1900).is_err());
        assert_eq!(
            ExperimentPaths::new("/a", "/b", "hist", 1850, 1850)
                .unwrap()
                .experiment_length(),
            1
        );
    }

    #[test]
    fn state_file_names() {
        let p = paths();
        let out = Path::new("/runtime/classic/fwf/interactive/forcing_files/hist");
        assert_eq!(
            p.temperature_table(),
            out.join("OceanSectorThetao_hist_1850_2100.csv")
        );
        assert_eq!(
            p.running_mean_table(30),
            out.join("OceanSectorThetao_30yRM_hist_1850_2100.csv")
        );
        assert_eq!(
            p.ledger_file(),
            out.join("CumulativeFreshwaterForcingAnomaly_hist_Future.csv")
        );
        assert_eq!(p.forcing_file(1851), out.join("FWF_LRF_y1851.nc"));
    }

    #[test]
    fn input_file_names() {
        let p = paths();
        assert_eq!(
            p.ocean_output_file(1855, 6),
            Path::new("/scratch/run/output/nemo/006/hist_1m_18550101_18551231_opa_grid_T_3D.nc")
        );
        assert_eq!(
            p.kernel_dir(),
            Path::new("/runtime/classic/fwf/interactive/RFunctions/TotalFW")
        );
    }
}
