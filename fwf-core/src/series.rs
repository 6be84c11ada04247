//! Yearly series
//!
//! A [`Series`] maps simulation years to one row of values. Series produced by
//! the coupler are append-only: every invocation adds exactly the row of the
//! year it processes, and the years of a series are contiguous.

use crate::errors::{FWFError, FWFResult};
use crate::sector::{Sector, SectorValues};
use crate::table::{Table, TableRow};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub type FloatValue = f64;
pub type Year = i32;

/// Series of per-sector values (temperatures, melt anomalies, forcing anomalies)
pub type SectorSeries = Series<SectorValues>;

/// Series of scalar values (total freshwater forcing)
pub type ScalarSeries = Series<FloatValue>;

impl TableRow for SectorValues {
    fn column_names() -> Vec<String> {
        Sector::ALL.iter().map(|s| s.name().to_string()).collect()
    }

    fn to_fields(&self) -> Vec<FloatValue> {
        self.as_array().to_vec()
    }

    fn from_fields(fields: &[FloatValue]) -> Option<Self> {
        SectorValues::from_slice(fields)
    }
}

/// Year-indexed rows with strictly increasing years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    rows: Vec<(Year, T)>,
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Series<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a series from rows whose years are strictly increasing
    ///
    /// Gaps are allowed here (e.g. a baseline table holding a few reference
    /// years); [`Series::append`] is what enforces contiguity.
    pub fn from_rows(rows: Vec<(Year, T)>) -> FWFResult<Self> {
        if let Some(w) = rows.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(FWFError::StateConsistency(format!(
                "series years must be strictly increasing, found {} after {}",
                w[1].0, w[0].0
            )));
        }
        Ok(Self { rows })
    }

    /// Append the row of the year following the last stored year
    pub fn append(&mut self, year: Year, value: T) -> FWFResult<()> {
        if let Some(last) = self.last_year() {
            if year != last + 1 {
                return Err(FWFError::StateConsistency(format!(
                    "cannot append year {} to a series ending in {} (expected {})",
                    year,
                    last,
                    last + 1
                )));
            }
        }
        self.rows.push((year, value));
        Ok(())
    }

    /// Drop every row of `year` or later, returning how many were dropped
    pub fn discard_from(&mut self, year: Year) -> usize {
        let before = self.rows.len();
        self.rows.retain(|(y, _)| *y < year);
        before - self.rows.len()
    }

    pub fn get(&self, year: Year) -> Option<&T> {
        self.rows
            .binary_search_by_key(&year, |(y, _)| *y)
            .ok()
            .map(|i| &self.rows[i].1)
    }

    pub fn first_year(&self) -> Option<Year> {
        self.rows.first().map(|(y, _)| *y)
    }

    pub fn last_year(&self) -> Option<Year> {
        self.rows.last().map(|(y, _)| *y)
    }

    pub fn latest(&self) -> Option<&T> {
        self.rows.last().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Year, &T)> {
        self.rows.iter().map(|(y, v)| (*y, v))
    }
}

impl<T: Copy> Series<T> {
    /// Value of `year`, or a consistency error naming the series
    pub fn require(&self, year: Year, what: &str) -> FWFResult<T> {
        self.get(year).copied().ok_or_else(|| {
            FWFError::StateConsistency(format!("{} has no entry for year {}", what, year))
        })
    }

    /// Values of every year in `first..=last`, all of which must be present
    pub fn span(&self, first: Year, last: Year, what: &str) -> FWFResult<Vec<T>> {
        (first..=last).map(|year| self.require(year, what)).collect()
    }
}

impl<T: TableRow> Series<T> {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new("year", T::column_names());
        for (year, value) in &self.rows {
            table.push_row(i64::from(*year), value.to_fields());
        }
        table
    }

    /// Convert a parsed table, selecting the row columns by name
    pub fn from_table(table: &Table, path: &Path) -> FWFResult<Self> {
        let positions = table.column_positions(&T::column_names(), path)?;

        let rows = table
            .rows()
            .iter()
            .map(|(index, fields)| -> FWFResult<(Year, T)> {
                let year = Year::try_from(*index).map_err(|_| {
                    FWFError::StateConsistency(format!(
                        "year {} in {} is out of range",
                        index,
                        path.display()
                    ))
                })?;
                let selected: Vec<FloatValue> = positions.iter().map(|&p| fields[p]).collect();
                let value = T::from_fields(&selected).ok_or_else(|| {
                    FWFError::StateConsistency(format!(
                        "row {} in {} does not match the expected columns",
                        year,
                        path.display()
                    ))
                })?;
                Ok((year, value))
            })
            .collect::<FWFResult<Vec<_>>>()?;

        Self::from_rows(rows)
    }

    pub fn read(path: &Path) -> FWFResult<Self> {
        let table = Table::read(path)?;
        Self::from_table(&table, path)
    }

    pub fn write(&self, path: &Path) -> FWFResult<()> {
        self.to_table().write(path)
    }
}
