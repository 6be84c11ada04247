//! Antarctic ocean sectors
//!
//! Ocean temperatures are aggregated over five fixed coastal sectors, each of
//! which has its own linear response function:
//!
//! - [`Sector::Eais`]: East Antarctica
//! - [`Sector::Wedd`]: Weddell Sea
//! - [`Sector::Amun`]: Amundsen Sea
//! - [`Sector::Ross`]: Ross Sea
//! - [`Sector::Apen`]: Antarctic Peninsula
//!
//! Every sector has a horizontal selection predicate (latitude/longitude boxes)
//! and a nominal ice-shelf base depth. The temperature that drives basal melt is
//! taken over a depth window centred on that shelf depth.
//!
//! # Examples
//!
//! ```rust
//! use fwf_core::sector::{DepthSelection, Sector, SectorValues};
//!
//! let sector: Sector = "ross".parse().unwrap();
//! assert!(sector.contains(-78.0, 180.0));
//!
//! let window = DepthSelection::Sector(sector).window().unwrap();
//! assert_eq!((window.top, window.bottom), (262.0, 362.0));
//!
//! let row = SectorValues::new([1.0, 2.0, 3.0, 4.0, 5.0]);
//! assert_eq!(row[Sector::Ross], 4.0);
//! assert_eq!(row.sum(), 15.0);
//! ```

use crate::errors::{FWFError, FWFResult};
use crate::series::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the five Antarctic coastal ocean sectors
///
/// The discriminant is the column position used in every sector table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    /// East Antarctica
    Eais = 0,
    /// Weddell Sea
    Wedd = 1,
    /// Amundsen Sea
    Amun = 2,
    /// Ross Sea
    Ross = 3,
    /// Antarctic Peninsula
    Apen = 4,
}

impl Sector {
    /// Number of sectors
    pub const COUNT: usize = 5;

    /// All sectors in column order
    pub const ALL: [Sector; Sector::COUNT] = [
        Sector::Eais,
        Sector::Wedd,
        Sector::Amun,
        Sector::Ross,
        Sector::Apen,
    ];

    /// Short name used in table headers and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Sector::Eais => "eais",
            Sector::Wedd => "wedd",
            Sector::Amun => "amun",
            Sector::Ross => "ross",
            Sector::Apen => "apen",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            Sector::Eais => "East Antarctica",
            Sector::Wedd => "Weddell Sea",
            Sector::Amun => "Amundsen Sea",
            Sector::Ross => "Ross Sea",
            Sector::Apen => "Antarctic Peninsula",
        }
    }

    /// Nominal depth of the ice-shelf base (m)
    pub fn shelf_depth(&self) -> FloatValue {
        match self {
            Sector::Eais => 369.0,
            Sector::Wedd => 420.0,
            Sector::Amun => 305.0,
            Sector::Ross => 312.0,
            Sector::Apen => 420.0,
        }
    }

    /// Region code of the sector's linear response function files
    pub fn response_region(&self) -> &'static str {
        match self {
            Sector::Eais => "R1",
            Sector::Ross => "R2",
            Sector::Amun => "R3",
            Sector::Wedd => "R4",
            Sector::Apen => "R5",
        }
    }

    /// Test whether a cell centre lies inside the sector
    ///
    /// Longitudes may be given in any convention; they are wrapped onto
    /// `[0, 360)` before the sector boxes are tested. Cells with missing
    /// coordinates are never selected.
    pub fn contains(&self, latitude: FloatValue, longitude: FloatValue) -> bool {
        let lat = latitude;
        let lon = longitude.rem_euclid(360.0);

        match self {
            Sector::Eais => lat > -76.0 && lat < -65.0 && (lon < 173.0 || lon > 350.0),
            Sector::Wedd => lat < -72.0 && lon > 295.0 && lon < 350.0,
            Sector::Amun => lat < -70.0 && lon > 210.0 && lon < 295.0,
            Sector::Ross => lat < -76.0 && lon > 150.0 && lon < 210.0,
            Sector::Apen => {
                (lat > -70.0 && lat < -65.0 && lon > 294.0 && lon < 310.0)
                    || (lat > -75.0 && lat < -70.0 && lon > 285.0 && lon < 295.0)
            }
        }
    }
}

impl From<Sector> for usize {
    fn from(s: Sector) -> usize {
        s as usize
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sector {
    type Err = FWFError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Sector::ALL
            .into_iter()
            .find(|sector| sector.name() == name)
            .ok_or_else(|| {
                FWFError::Configuration(format!(
                    "unknown sector '{}', expected one of eais, wedd, amun, ross, apen",
                    s
                ))
            })
    }
}

/// Vertical extent (m, positive down) over which temperatures are averaged
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthWindow {
    /// Shallow edge
    pub top: FloatValue,
    /// Deep edge
    pub bottom: FloatValue,
}

impl DepthWindow {
    /// Window of `2 * half_width` centred on `depth`
    pub fn centred(depth: FloatValue, half_width: FloatValue) -> Self {
        Self {
            top: depth - half_width,
            bottom: depth + half_width,
        }
    }

    pub fn thickness(&self) -> FloatValue {
        self.bottom - self.top
    }

    /// Clamp a depth onto the window
    pub fn clamp(&self, depth: FloatValue) -> FloatValue {
        depth.max(self.top).min(self.bottom)
    }
}

/// How the depth window of a temperature reduction is chosen
///
/// Resolved into a [`DepthWindow`] before any level search takes place.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DepthSelection {
    /// 100 m slab centred on the sector's shelf depth
    Sector(Sector),
    /// Depth shared by every sector (m)
    ///
    /// Only 550 m (400-700 m) and 900 m (800-1000 m) are defined.
    Explicit(u32),
}

impl DepthSelection {
    pub fn window(&self) -> FWFResult<DepthWindow> {
        match *self {
            DepthSelection::Sector(sector) => Ok(DepthWindow::centred(sector.shelf_depth(), 50.0)),
            DepthSelection::Explicit(550) => Ok(DepthWindow::centred(550.0, 150.0)),
            DepthSelection::Explicit(900) => Ok(DepthWindow::centred(900.0, 100.0)),
            DepthSelection::Explicit(depth) => Err(FWFError::Configuration(format!(
                "no depth window defined for an explicit depth of {} m (supported: 550, 900)",
                depth
            ))),
        }
    }
}

/// One value per sector, in column order
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorValues([FloatValue; Sector::COUNT]);

impl SectorValues {
    pub fn new(values: [FloatValue; Sector::COUNT]) -> Self {
        Self(values)
    }

    pub fn zeros() -> Self {
        Self([0.0; Sector::COUNT])
    }

    /// Same value in every sector
    pub fn splat(value: FloatValue) -> Self {
        Self([value; Sector::COUNT])
    }

    /// Build a row by evaluating `f` for every sector
    pub fn from_fn(mut f: impl FnMut(Sector) -> FloatValue) -> Self {
        let mut values = [0.0; Sector::COUNT];
        for sector in Sector::ALL {
            values[usize::from(sector)] = f(sector);
        }
        Self(values)
    }

    /// Build a row from a slice holding exactly one value per sector
    pub fn from_slice(values: &[FloatValue]) -> Option<Self> {
        <[FloatValue; Sector::COUNT]>::try_from(values)
            .ok()
            .map(Self)
    }

    pub fn as_array(&self) -> &[FloatValue; Sector::COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sector, FloatValue)> + '_ {
        Sector::ALL.into_iter().map(move |s| (s, self[s]))
    }

    pub fn sum(&self) -> FloatValue {
        self.0.iter().sum()
    }

    pub fn map(self, f: impl Fn(FloatValue) -> FloatValue) -> Self {
        Self(self.0.map(f))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl Index<Sector> for SectorValues {
    type Output = FloatValue;

    fn index(&self, sector: Sector) -> &FloatValue {
        &self.0[usize::from(sector)]
    }
}

impl IndexMut<Sector> for SectorValues {
    fn index_mut(&mut self, sector: Sector) -> &mut FloatValue {
        &mut self.0[usize::from(sector)]
    }
}
