//! Financial statement tables and the per-ticker yearly row builder.
//!
//! A `FinancialStatementTable` is the provider's view: line items as rows,
//! fiscal-period end dates as columns. `build_yearly_rows` flattens it into one
//! `YearlyRow` per calendar year for the ratio derivation in `crate::ratios`.

pub mod cache;
pub mod provider;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const NET_INCOME: &str = "Net Income";
pub const GROSS_PROFIT: &str = "Gross Profit";
pub const OPERATING_INCOME: &str = "Operating Income";

/// Time-indexed table of statement line items for one ticker.
///
/// `values[row][col]` is the cell for `line_items[row]` at `periods[col]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialStatementTable {
    line_items: Vec<String>,
    periods: Vec<NaiveDate>,
    values: Vec<Vec<Option<f64>>>,
}

impl FinancialStatementTable {
    pub fn new(periods: Vec<NaiveDate>) -> Self {
        Self {
            line_items: Vec::new(),
            periods,
            values: Vec::new(),
        }
    }

    /// Add (or replace) a line item row. Cells beyond the column count are
    /// dropped; missing trailing cells are `None`.
    pub fn with_row(mut self, label: impl Into<String>, cells: Vec<Option<f64>>) -> Self {
        self.set_row(label, cells);
        self
    }

    pub fn set_row(&mut self, label: impl Into<String>, mut cells: Vec<Option<f64>>) {
        let label = label.into();
        cells.resize(self.periods.len(), None);
        match self.line_items.iter().position(|l| *l == label) {
            Some(idx) => self.values[idx] = cells,
            None => {
                self.line_items.push(label);
                self.values.push(cells);
            }
        }
    }

    pub fn line_items(&self) -> &[String] {
        &self.line_items
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Cell for `label` in column `col`; `None` when the label is not a row of
    /// this table or the cell is empty.
    pub fn cell(&self, label: &str, col: usize) -> Option<f64> {
        let row = self.line_items.iter().position(|l| l == label)?;
        self.values.get(row)?.get(col).copied().flatten()
    }
}

/// One fiscal year of the line items the ratios need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: i32,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
}

impl YearlyRow {
    fn empty(year: i32) -> Self {
        Self {
            year,
            total_revenue: None,
            net_income: None,
            gross_profit: None,
            operating_income: None,
        }
    }
}

/// "Is this null": absent, or a NaN the provider handed through.
#[inline]
pub fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}

/// Flatten a statement table into yearly rows, in column order.
///
/// `None` (the lookup failed) yields no rows. Columns sharing a calendar year
/// collapse into one row: the later column's cells replace the earlier ones,
/// the row keeps its first position.
pub fn build_yearly_rows(table: Option<&FinancialStatementTable>) -> Vec<YearlyRow> {
    let Some(table) = table else {
        return Vec::new();
    };

    let mut rows: Vec<YearlyRow> = Vec::with_capacity(table.periods.len());
    for (col, period) in table.periods.iter().enumerate() {
        let year = period.year();
        let mut row = YearlyRow::empty(year);
        for label in &table.line_items {
            let v = table.cell(label, col);
            match label.as_str() {
                TOTAL_REVENUE => row.total_revenue = v,
                NET_INCOME => row.net_income = v,
                GROSS_PROFIT => row.gross_profit = v,
                OPERATING_INCOME => row.operating_income = v,
                _ => {}
            }
        }

        match rows.iter_mut().find(|r| r.year == year) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }
    rows
}
