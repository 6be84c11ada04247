//! NetCDF input and output of the ocean model
//!
//! Reads the NEMO output and the static ORCA fields the coupler needs, and
//! writes the forcing files picked up by the next integration leg:
//!
//! - `thetao (time_counter, olevel, y, x)`, `olevel_bounds (olevel, 2)` and
//!   `time_counter` from the monthly 3-D output
//! - `areacello (y, x)` with `latitude`/`longitude` from the area file
//! - one named mask variable `(y, x)` per mask file
//!
//! Forcing files hold `sorunoff_f` (basal melt) and `socalving_f` (calving) in
//! kg m^-2 s^-1 on an unlimited `time_counter` dimension. Files are written to
//! a temporary sibling first and renamed into place.

use crate::fields::{OceanYear, TimeAxis};
use fwf_components::distribution::FluxFields;
use fwf_core::errors::{FWFError, FWFResult};
use fwf_core::grid::{is_valid, HorizontalGrid, LevelBounds};
use fwf_core::series::FloatValue;
use log::{debug, info};
use ndarray::{Array2, Array4, ArrayView2};
use std::fs;
use std::path::{Path, PathBuf};

const FLUX_UNITS: &str = "kg/m^2/s";

fn netcdf_error(path: &Path) -> impl Fn(netcdf::Error) -> FWFError + '_ {
    move |e| FWFError::NetCDF(format!("{}: {}", path.display(), e))
}

fn missing_variable(path: &Path, name: &str) -> FWFError {
    FWFError::NetCDF(format!("{}: missing variable {}", path.display(), name))
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<FloatValue> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as FloatValue),
            _ => None,
        })
}

fn text_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// Values of a variable with packing undone and fill values replaced by NaN
fn read_values(
    file: &netcdf::File,
    path: &Path,
    name: &str,
) -> FWFResult<(Vec<usize>, Vec<FloatValue>)> {
    let var = file
        .variable(name)
        .ok_or_else(|| missing_variable(path, name))?;
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

    let scale = numeric_attribute(&var, "scale_factor").unwrap_or(1.0);
    let offset = numeric_attribute(&var, "add_offset").unwrap_or(0.0);
    let fill = numeric_attribute(&var, "_FillValue")
        .or_else(|| numeric_attribute(&var, "missing_value"));

    let raw: Vec<FloatValue> = var.get_values(..).map_err(netcdf_error(path))?;
    let values = raw
        .into_iter()
        .map(|v| {
            if !is_valid(v) || fill.is_some_and(|f| v == f) {
                FloatValue::NAN
            } else {
                v * scale + offset
            }
        })
        .collect();
    Ok((shape, values))
}

fn read_array2(file: &netcdf::File, path: &Path, name: &str) -> FWFResult<Array2<FloatValue>> {
    let (shape, values) = read_values(file, path, name)?;
    // Singleton leading dimensions (e.g. a time axis of length one) are dropped
    let dims: Vec<usize> = match shape.len() {
        2 => shape.clone(),
        n if n > 2 && shape[..n - 2].iter().all(|&d| d == 1) => shape[n - 2..].to_vec(),
        _ => {
            return Err(FWFError::ShapeMismatch {
                what: format!("{} in {}", name, path.display()),
                expected: vec![0, 0],
                found: shape,
            })
        }
    };
    Array2::from_shape_vec((dims[0], dims[1]), values)
        .map_err(|e| FWFError::NetCDF(format!("{}: {}", path.display(), e)))
}

fn read_time(file: &netcdf::File, path: &Path) -> FWFResult<TimeAxis> {
    let var = file
        .variable("time_counter")
        .ok_or_else(|| missing_variable(path, "time_counter"))?;
    let values: Vec<FloatValue> = var.get_values(..).map_err(netcdf_error(path))?;
    let units = text_attribute(&var, "units").ok_or_else(|| {
        FWFError::NetCDF(format!("{}: time_counter has no units", path.display()))
    })?;
    Ok(TimeAxis { values, units })
}

fn read_bounds(file: &netcdf::File, path: &Path) -> FWFResult<LevelBounds> {
    let bounds = read_array2(file, path, "olevel_bounds")?;
    LevelBounds::new(bounds)
}

/// Vertical level bounds and time axis of a 3-D output file
pub fn read_levels_and_time(path: &Path) -> FWFResult<(LevelBounds, TimeAxis)> {
    let file = netcdf::open(path).map_err(netcdf_error(path))?;
    Ok((read_bounds(&file, path)?, read_time(&file, path)?))
}

/// Annual mean temperature of one year of monthly output
pub fn read_ocean_year(path: &Path) -> FWFResult<OceanYear> {
    info!("Reading ocean temperatures from {}", path.display());
    let file = netcdf::open(path).map_err(netcdf_error(path))?;

    let (shape, values) = read_values(&file, path, "thetao")?;
    let monthly = match shape[..] {
        [nt, nlev, nj, ni] => Array4::from_shape_vec((nt, nlev, nj, ni), values)
            .map_err(|e| FWFError::NetCDF(format!("{}: {}", path.display(), e)))?,
        _ => {
            return Err(FWFError::ShapeMismatch {
                what: format!("thetao in {}", path.display()),
                expected: vec![0, 0, 0, 0],
                found: shape.clone(),
            })
        }
    };
    debug!("thetao shape: {:?}", monthly.shape());

    OceanYear::from_monthly(
        monthly.view(),
        read_bounds(&file, path)?,
        read_time(&file, path)?,
    )
}

/// Cell areas and coordinates of the ocean grid
///
/// Coordinates are taken as given when two-dimensional and broadcast when
/// stored as 1-D `latitude(y)` and `longitude(x)` axes.
pub fn read_grid(path: &Path) -> FWFResult<HorizontalGrid> {
    let file = netcdf::open(path).map_err(netcdf_error(path))?;
    let areas = read_array2(&file, path, "areacello")?;
    let (nj, ni) = areas.dim();

    let coordinate = |name: &str,
                      axis_len: usize,
                      along_rows: bool|
     -> FWFResult<Array2<FloatValue>> {
        let (shape, values) = read_values(&file, path, name)?;
        match shape[..] {
            [n] if n == axis_len => Ok(Array2::from_shape_fn((nj, ni), |(j, i)| {
                if along_rows {
                    values[j]
                } else {
                    values[i]
                }
            })),
            [a, b] if (a, b) == (nj, ni) => Array2::from_shape_vec((a, b), values)
                .map_err(|e| FWFError::NetCDF(format!("{}: {}", path.display(), e))),
            _ => Err(FWFError::ShapeMismatch {
                what: format!("{} in {}", name, path.display()),
                expected: vec![nj, ni],
                found: shape.clone(),
            }),
        }
    };

    let latitude = coordinate("latitude", nj, true)?;
    let longitude = coordinate("longitude", ni, false)?;
    HorizontalGrid::new(latitude, longitude, areas)
}

/// A 2-D mask variable; missing values are kept as NaN (not selected)
pub fn read_mask(path: &Path, variable: &str) -> FWFResult<Array2<FloatValue>> {
    let file = netcdf::open(path).map_err(netcdf_error(path))?;
    read_array2(&file, path, variable)
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `fields` for every step of `time` into a new NetCDF file at `path`
fn write_fields(
    path: &Path,
    time: &TimeAxis,
    fields: &[(&str, &str, &str, ArrayView2<FloatValue>)],
) -> FWFResult<()> {
    let tmp = temporary_path(path);
    {
        let mut file = netcdf::create(&tmp).map_err(netcdf_error(&tmp))?;
        let (nj, ni) = fields.first().map(|f| f.3.dim()).unwrap_or((0, 0));

        file.add_unlimited_dimension("time_counter")
            .map_err(netcdf_error(&tmp))?;
        file.add_dimension("y", nj).map_err(netcdf_error(&tmp))?;
        file.add_dimension("x", ni).map_err(netcdf_error(&tmp))?;

        {
            let mut time_var = file
                .add_variable::<f64>("time_counter", &["time_counter"])
                .map_err(netcdf_error(&tmp))?;
            time_var
                .put_attribute("units", time.units.as_str())
                .map_err(netcdf_error(&tmp))?;
            for (t_idx, value) in time.values.iter().enumerate() {
                time_var
                    .put_value(*value, [t_idx])
                    .map_err(netcdf_error(&tmp))?;
            }
        }

        for (name, long_name, units, values) in fields {
            // Missing cells become zero so the ocean model never sees NaN
            let data: Vec<f64> = values
                .iter()
                .map(|&v| if v.is_finite() { v } else { 0.0 })
                .collect();

            let mut var = file
                .add_variable::<f64>(name, &["time_counter", "y", "x"])
                .map_err(netcdf_error(&tmp))?;
            var.put_attribute("long_name", *long_name)
                .map_err(netcdf_error(&tmp))?;
            var.put_attribute("units", *units)
                .map_err(netcdf_error(&tmp))?;
            for t_idx in 0..time.len() {
                var.put_values(&data, (t_idx, .., ..))
                    .map_err(netcdf_error(&tmp))?;
            }
        }

        file.add_attribute("Conventions", "CF-1.8")
            .map_err(netcdf_error(&tmp))?;
    }

    fs::rename(&tmp, path).map_err(|e| FWFError::io(path, e))
}

/// Write the basal melt and calving fluxes, constant over every step of `time`
pub fn write_forcing(path: &Path, fluxes: &FluxFields, time: &TimeAxis) -> FWFResult<()> {
    info!("Writing freshwater forcing to {}", path.display());
    write_fields(
        path,
        time,
        &[
            (
                "sorunoff_f",
                "basal melt flux",
                FLUX_UNITS,
                fluxes.basal_melt.view(),
            ),
            ("socalving_f", "calving flux", FLUX_UNITS, fluxes.calving.view()),
        ],
    )
}

/// Write one basal melt depth field (m) on a single time step
pub fn write_shelf_depth(
    path: &Path,
    depth: ArrayView2<FloatValue>,
    time: &TimeAxis,
) -> FWFResult<()> {
    info!("Writing basal melt depth to {}", path.display());
    let first = TimeAxis {
        values: time.values.iter().take(1).copied().collect(),
        units: time.units.clone(),
    };
    write_fields(path, &first, &[("bmdepth", "basal melt depth", "m", depth)])
}
