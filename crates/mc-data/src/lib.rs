#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Datetime layout used by master files (`2024-01-31 09:15:00`).
pub const MASTER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("record has no 'id' column")]
    MissingIdColumn,
    #[error("column '{column}' does not exist")]
    MissingColumn { column: String },
    #[error("column '{column}' value '{value}' is not a valid integer")]
    InvalidInt { column: String, value: String },
    #[error("column '{column}' value '{value}' is not a valid float")]
    InvalidFloat { column: String, value: String },
    #[error("column '{column}' value '{value}' does not match datetime format '{format}'")]
    InvalidDateTime {
        column: String,
        value: String,
        format: String,
    },
    #[error("comparison literal '{value}' is not a valid {expected}")]
    InvalidLiteral { value: String, expected: String },
    #[error("no row with primary key {pk}")]
    RowNotFound { pk: i64 },
}

/// One master record: an immutable mapping from column name to the raw
/// string read from the source file. The `id` column is mandatory and is
/// the primary key. Typed accessors parse on every call and never cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRow {
    values: BTreeMap<String, String>,
}

impl MasterRow {
    pub fn new(values: BTreeMap<String, String>) -> Result<Self, DataError> {
        if !values.contains_key("id") {
            return Err(DataError::MissingIdColumn);
        }
        Ok(Self { values })
    }

    /// Primary key, parsed from the `id` column.
    pub fn pk(&self) -> Result<i64, DataError> {
        self.column_i64("id")
    }

    pub fn get(&self, column: &str) -> Result<&str, DataError> {
        self.values
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| DataError::MissingColumn {
                column: column.to_owned(),
            })
    }

    pub fn column_i64(&self, column: &str) -> Result<i64, DataError> {
        let raw = self.get(column)?;
        raw.parse::<i64>().map_err(|_| DataError::InvalidInt {
            column: column.to_owned(),
            value: raw.to_owned(),
        })
    }

    pub fn column_f64(&self, column: &str) -> Result<f64, DataError> {
        let raw = self.get(column)?;
        raw.parse::<f64>().map_err(|_| DataError::InvalidFloat {
            column: column.to_owned(),
            value: raw.to_owned(),
        })
    }

    pub fn column_datetime(&self, column: &str, format: &str) -> Result<NaiveDateTime, DataError> {
        let raw = self.get(column)?;
        NaiveDateTime::parse_from_str(raw, format).map_err(|_| DataError::InvalidDateTime {
            column: column.to_owned(),
            value: raw.to_owned(),
            format: format.to_owned(),
        })
    }

    #[must_use]
    pub fn columns(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

/// Value-comparison capability bound to one typed literal. The three
/// predicates compare the literal against the named column of a row using
/// the column's typed accessor.
pub trait ValueComparator {
    /// literal == row value
    fn eq_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError>;
    /// literal > row value
    fn literal_gt_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError>;
    /// literal < row value
    fn literal_lt_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntComparator {
    value: i64,
}

impl IntComparator {
    pub fn new(literal: &str) -> Result<Self, DataError> {
        let value = literal
            .parse::<i64>()
            .map_err(|_| DataError::InvalidLiteral {
                value: literal.to_owned(),
                expected: "integer".to_owned(),
            })?;
        Ok(Self { value })
    }

    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self { value }
    }
}

impl ValueComparator for IntComparator {
    fn eq_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError> {
        Ok(row.column_i64(column)? == self.value)
    }

    fn literal_gt_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError> {
        Ok(self.value > row.column_i64(column)?)
    }

    fn literal_lt_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError> {
        Ok(self.value < row.column_i64(column)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatComparator {
    value: f64,
}

impl FloatComparator {
    pub fn new(literal: &str) -> Result<Self, DataError> {
        let value = literal
            .parse::<f64>()
            .map_err(|_| DataError::InvalidLiteral {
                value: literal.to_owned(),
                expected: "float".to_owned(),
            })?;
        Ok(Self { value })
    }

    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        Self { value }
    }
}

impl ValueComparator for FloatComparator {
    fn eq_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError> {
        Ok(row.column_f64(column)? == self.value)
    }

    fn literal_gt_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError> {
        Ok(self.value > row.column_f64(column)?)
    }

    fn literal_lt_row(&self, row: &MasterRow, column: &str) -> Result<bool, DataError> {
        Ok(self.value < row.column_f64(column)?)
    }
}

/// One master file held in memory: rows keyed by primary key, mutated in
/// place by the removal operations. Filters only ever narrow the row set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterTable {
    name: String,
    rows: BTreeMap<i64, MasterRow>,
}

impl MasterTable {
    /// Build a table from raw records. A duplicate primary key keeps the
    /// later record.
    pub fn from_records<I>(name: impl Into<String>, records: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = BTreeMap<String, String>>,
    {
        let mut rows = BTreeMap::new();
        for record in records {
            let row = MasterRow::new(record)?;
            rows.insert(row.pk()?, row);
        }
        Ok(Self {
            name: name.into(),
            rows,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read-only view over the live rows, in primary-key order.
    pub fn rows(&self) -> impl Iterator<Item = &MasterRow> {
        self.rows.values()
    }

    pub fn find_by_pk(&self, pk: i64) -> Result<&MasterRow, DataError> {
        self.rows.get(&pk).ok_or(DataError::RowNotFound { pk })
    }

    pub fn remove_by_pk(&mut self, pk: i64) -> Result<(), DataError> {
        self.rows
            .remove(&pk)
            .map(|_| ())
            .ok_or(DataError::RowNotFound { pk })
    }

    /// Two-phase removal: collect the primary keys to drop, then delete by
    /// key. Scanning never overlaps with mutation.
    fn remove_where<F>(&mut self, predicate: F) -> Result<(), DataError>
    where
        F: Fn(&MasterRow) -> Result<bool, DataError>,
    {
        let mut remove_pks = Vec::new();
        for row in self.rows.values() {
            if predicate(row)? {
                remove_pks.push(row.pk()?);
            }
        }
        for pk in remove_pks {
            self.remove_by_pk(pk)?;
        }
        Ok(())
    }

    /// Drop every row whose `column` value equals the comparator literal.
    pub fn remove_eq(
        &mut self,
        column: &str,
        comparator: &dyn ValueComparator,
    ) -> Result<(), DataError> {
        self.remove_where(|row| comparator.eq_row(row, column))
    }

    /// Drop every row whose `column` value differs from the literal.
    pub fn remove_not_eq(
        &mut self,
        column: &str,
        comparator: &dyn ValueComparator,
    ) -> Result<(), DataError> {
        self.remove_where(|row| Ok(!comparator.eq_row(row, column)?))
    }

    /// Drop every row whose `column` value is strictly greater than the
    /// literal.
    pub fn remove_gt(
        &mut self,
        column: &str,
        comparator: &dyn ValueComparator,
    ) -> Result<(), DataError> {
        self.remove_where(|row| comparator.literal_lt_row(row, column))
    }

    /// Drop every row whose `column` value is strictly less than the
    /// literal.
    pub fn remove_lt(
        &mut self,
        column: &str,
        comparator: &dyn ValueComparator,
    ) -> Result<(), DataError> {
        self.remove_where(|row| comparator.literal_gt_row(row, column))
    }

    /// Drop every row whose `column` value is greater than or equal to the
    /// literal. Composed as `remove_eq` followed by `remove_gt`; the two
    /// passes drop disjoint row sets.
    pub fn remove_ge(
        &mut self,
        column: &str,
        comparator: &dyn ValueComparator,
    ) -> Result<(), DataError> {
        self.remove_eq(column, comparator)?;
        self.remove_gt(column, comparator)
    }

    /// Drop every row whose `column` value is less than or equal to the
    /// literal. Composed as `remove_eq` followed by `remove_lt`.
    pub fn remove_le(
        &mut self,
        column: &str,
        comparator: &dyn ValueComparator,
    ) -> Result<(), DataError> {
        self.remove_eq(column, comparator)?;
        self.remove_lt(column, comparator)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Timelike;

    use super::{
        DataError, FloatComparator, IntComparator, MASTER_DATETIME_FORMAT, MasterRow, MasterTable,
    };

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn int_table(values: &[(i64, i64)]) -> MasterTable {
        let records = values
            .iter()
            .map(|(id, x)| record(&[("id", id.to_string().as_str()), ("x", x.to_string().as_str())]))
            .collect::<Vec<_>>();
        MasterTable::from_records("numbers", records).expect("table")
    }

    #[test]
    fn row_requires_id_column() {
        let err = MasterRow::new(record(&[("name", "a")])).expect_err("must fail");
        assert_eq!(err, DataError::MissingIdColumn);
    }

    #[test]
    fn row_pk_rejects_non_numeric_id() {
        let row = MasterRow::new(record(&[("id", "abc")])).expect("row");
        let err = row.pk().expect_err("must fail");
        assert!(matches!(err, DataError::InvalidInt { .. }));
    }

    #[test]
    fn typed_accessors_parse_on_demand() {
        let row = MasterRow::new(record(&[
            ("id", "1"),
            ("score", "3.5"),
            ("start_data", "2024-01-31 09:15:30"),
        ]))
        .expect("row");

        assert_eq!(row.column_i64("id").expect("int"), 1);
        assert_eq!(row.column_f64("score").expect("float"), 3.5);
        let dt = row
            .column_datetime("start_data", MASTER_DATETIME_FORMAT)
            .expect("datetime");
        assert_eq!(dt.second(), 30);

        let err = row.column_i64("score").expect_err("must fail");
        assert!(matches!(err, DataError::InvalidInt { .. }));
        let err = row.get("missing").expect_err("must fail");
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }

    #[test]
    fn table_construction_fails_before_any_rule_runs() {
        let records = vec![record(&[("id", "1")]), record(&[("name", "no id")])];
        let err = MasterTable::from_records("bad", records).expect_err("must fail");
        assert_eq!(err, DataError::MissingIdColumn);
    }

    #[test]
    fn duplicate_pk_keeps_the_later_record() {
        let records = vec![
            record(&[("id", "1"), ("x", "10")]),
            record(&[("id", "1"), ("x", "20")]),
        ];
        let table = MasterTable::from_records("dup", records).expect("table");
        assert_eq!(table.count(), 1);
        assert_eq!(
            table.find_by_pk(1).expect("row").column_i64("x").expect("x"),
            20
        );
    }

    #[test]
    fn find_by_pk_reports_absent_key() {
        let table = int_table(&[(1, 3)]);
        let err = table.find_by_pk(9).expect_err("must fail");
        assert_eq!(err, DataError::RowNotFound { pk: 9 });
    }

    #[test]
    fn remove_eq_drops_matching_rows_only() {
        let mut table = int_table(&[(1, 3), (2, 6), (3, 6), (4, 9)]);
        table
            .remove_eq("x", &IntComparator::new("6").expect("cmp"))
            .expect("remove");
        let survivors = table
            .rows()
            .map(|row| row.column_i64("x").expect("x"))
            .collect::<Vec<_>>();
        assert_eq!(survivors, vec![3, 9]);
    }

    #[test]
    fn remove_not_eq_keeps_only_equal_rows() {
        let mut table = int_table(&[(1, 3), (2, 6), (3, 9)]);
        table
            .remove_not_eq("x", &IntComparator::new("6").expect("cmp"))
            .expect("remove");
        assert_eq!(table.count(), 1);
        assert!(table.find_by_pk(2).is_ok());
    }

    #[test]
    fn remove_gt_drops_rows_above_the_literal() {
        let mut table = int_table(&[(1, 3), (2, 6), (3, 9)]);
        table
            .remove_gt("x", &IntComparator::new("5").expect("cmp"))
            .expect("remove");
        let survivors = table.rows().map(|row| row.pk().expect("pk")).collect::<Vec<_>>();
        assert_eq!(survivors, vec![1]);
    }

    #[test]
    fn remove_lt_drops_rows_below_the_literal() {
        let mut table = int_table(&[(1, 3), (2, 6), (3, 9)]);
        table
            .remove_lt("x", &IntComparator::new("5").expect("cmp"))
            .expect("remove");
        let survivors = table.rows().map(|row| row.pk().expect("pk")).collect::<Vec<_>>();
        assert_eq!(survivors, vec![2, 3]);
    }

    #[test]
    fn remove_ge_keeps_only_rows_below_the_literal() {
        let mut table = int_table(&[(1, 3), (2, 6), (3, 6), (4, 9)]);
        table
            .remove_ge("x", &IntComparator::new("6").expect("cmp"))
            .expect("remove");
        let survivors = table.rows().map(|row| row.pk().expect("pk")).collect::<Vec<_>>();
        assert_eq!(survivors, vec![1]);
    }

    #[test]
    fn remove_le_keeps_only_rows_above_the_literal() {
        let mut table = int_table(&[(1, 3), (2, 6), (3, 6), (4, 9)]);
        table
            .remove_le("x", &IntComparator::new("6").expect("cmp"))
            .expect("remove");
        let survivors = table.rows().map(|row| row.pk().expect("pk")).collect::<Vec<_>>();
        assert_eq!(survivors, vec![4]);
    }

    #[test]
    fn removal_propagates_parse_failures() {
        let records = vec![record(&[("id", "1"), ("x", "not-a-number")])];
        let mut table = MasterTable::from_records("bad", records).expect("table");
        let err = table
            .remove_eq("x", &IntComparator::new("1").expect("cmp"))
            .expect_err("must fail");
        assert!(matches!(err, DataError::InvalidInt { .. }));
    }

    #[test]
    fn float_comparator_matches_int_comparator_shape() {
        let records = vec![
            record(&[("id", "1"), ("rate", "0.5")]),
            record(&[("id", "2"), ("rate", "1.5")]),
            record(&[("id", "3"), ("rate", "2.5")]),
        ];
        let mut table = MasterTable::from_records("rates", records).expect("table");
        table
            .remove_gt("rate", &FloatComparator::new("1.5").expect("cmp"))
            .expect("remove");
        let survivors = table.rows().map(|row| row.pk().expect("pk")).collect::<Vec<_>>();
        assert_eq!(survivors, vec![1, 2]);
    }

    #[test]
    fn comparator_literal_must_parse() {
        let err = IntComparator::new("abc").expect_err("must fail");
        assert!(matches!(err, DataError::InvalidLiteral { .. }));
        let err = FloatComparator::new("abc").expect_err("must fail");
        assert!(matches!(err, DataError::InvalidLiteral { .. }));
    }
}
