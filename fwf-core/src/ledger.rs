//! Future-forcing ledger
//!
//! The ledger carries the freshwater forcing that past melt anomalies will
//! cause in every remaining year of the experiment. It is the only piece of
//! state whose lifetime spans the whole experiment: it is created once (all
//! zeros) in the first year, then loaded, extended and stored again by every
//! yearly invocation.
//!
//! Row `t` holds the cumulative forcing (Gt) projected for experiment year `t`,
//! one column per sector. The forcing of year `t` itself is the forward
//! difference `row(t) - row(t - 1)`.

use crate::errors::{FWFError, FWFResult};
use crate::grid::check_shape;
use crate::sector::{Sector, SectorValues};
use crate::series::FloatValue;
use crate::table::{Table, TableRow};
use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingLedger {
    /// Cumulative projected forcing, shape `(experiment length, sectors)`
    values: Array2<FloatValue>,
    /// Number of experiment years already superposed onto the ledger
    applied: usize,
}

impl ForcingLedger {
    /// Empty ledger for an experiment of `length` years
    pub fn zeros(length: usize) -> Self {
        Self {
            values: Array2::zeros((length, Sector::COUNT)),
            applied: 0,
        }
    }

    /// Experiment length in years
    pub fn length(&self) -> usize {
        self.values.nrows()
    }

    /// Number of years applied so far, which is also the next year to apply
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn values(&self) -> ArrayView2<FloatValue> {
        self.values.view()
    }

    pub fn row(&self, offset: usize) -> Option<SectorValues> {
        if offset >= self.length() {
            return None;
        }
        SectorValues::from_slice(self.values.row(offset).as_slice()?)
    }

    /// Year-over-year increment of the ledger at `offset`
    ///
    /// The row before the first year is taken to be zero.
    pub fn forward_difference(&self, offset: usize) -> Option<SectorValues> {
        let current = self.row(offset)?;
        let previous = match offset {
            0 => SectorValues::zeros(),
            _ => self.row(offset - 1)?,
        };
        Some(SectorValues::from_fn(|s| current[s] - previous[s]))
    }

    /// Check that `t` is the next experiment year to apply
    ///
    /// Years are applied exactly once each, in increasing order and without
    /// gaps.
    pub fn check_next(&self, t: usize) -> FWFResult<()> {
        if t >= self.length() {
            return Err(FWFError::StateConsistency(format!(
                "experiment year {} lies beyond the ledger horizon of {} years",
                t,
                self.length()
            )));
        }
        if t != self.applied {
            return Err(FWFError::StateConsistency(format!(
                "ledger has {} years applied, cannot apply experiment year {} (expected {})",
                self.applied, t, self.applied
            )));
        }
        Ok(())
    }

    /// Check that the ledger belongs to an experiment of `length` years
    pub fn check_length(&self, length: usize) -> FWFResult<()> {
        check_shape(
            "forcing ledger",
            &[length, Sector::COUNT],
            self.values.shape(),
        )
    }

    /// Add `contribution` (lag x sector) onto the rows starting at year `t`
    ///
    /// Lags that would reach past the end of the experiment are discarded.
    /// Returns the number of ledger rows that were updated.
    pub fn superpose(&mut self, t: usize, contribution: ArrayView2<FloatValue>) -> FWFResult<usize> {
        self.check_next(t)?;
        if contribution.ncols() != Sector::COUNT {
            return Err(FWFError::ShapeMismatch {
                what: "ledger contribution".to_string(),
                expected: vec![contribution.nrows(), Sector::COUNT],
                found: contribution.shape().to_vec(),
            });
        }

        let rows = contribution.nrows().min(self.length() - t);
        let mut target = self.values.slice_mut(s![t..t + rows, ..]);
        target += &contribution.slice(s![..rows, ..]);

        self.applied += 1;
        Ok(rows)
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("offset", SectorValues::column_names())
            .with_metadata("applied", self.applied)
            .with_metadata("length", self.length());
        for (offset, row) in self.values.rows().into_iter().enumerate() {
            table.push_row(offset as i64, row.to_vec());
        }
        table
    }

    pub fn from_table(table: &Table, path: &Path) -> FWFResult<Self> {
        let metadata_usize = |key: &str| -> FWFResult<usize> {
            table
                .metadata(key)
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| {
                    FWFError::StateConsistency(format!(
                        "ledger {} has no valid '{}' entry",
                        path.display(),
                        key
                    ))
                })
        };
        let applied = metadata_usize("applied")?;
        let length = metadata_usize("length")?;

        let positions = table.column_positions(&SectorValues::column_names(), path)?;
        let rows = table.rows();
        if rows.len() != length {
            return Err(FWFError::StateConsistency(format!(
                "ledger {} declares {} years but holds {} rows",
                path.display(),
                length,
                rows.len()
            )));
        }
        if applied > length {
            return Err(FWFError::StateConsistency(format!(
                "ledger {} claims {} applied years for an experiment of {} years",
                path.display(),
                applied,
                length
            )));
        }

        let mut values = Array2::zeros((length, Sector::COUNT));
        for (expected, (offset, fields)) in rows.iter().enumerate() {
            if *offset != expected as i64 {
                return Err(FWFError::StateConsistency(format!(
                    "ledger {} has offset {} where {} was expected",
                    path.display(),
                    offset,
                    expected
                )));
            }
            for (column, &p) in positions.iter().enumerate() {
                values[[expected, column]] = fields[p];
            }
        }

        Ok(Self { values, applied })
    }

    pub fn read(path: &Path) -> FWFResult<Self> {
        let table = Table::read(path)?;
        Self::from_table(&table, path)
    }

    pub fn write(&self, path: &Path) -> FWFResult<()> {
        self.to_table().write(path)
    }
}
