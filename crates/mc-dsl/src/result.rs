use mc_data::MasterRow;
use serde::{Deserialize, Serialize};

/// Validation outcome reported per master row set: the offending rows plus
/// enough naming to render a report line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsResult {
    pub is_err: bool,
    pub master_name: String,
    pub validator_name: String,
    pub err_msg: String,
    pub err_rows: Vec<MasterRow>,
}

/// Closed set of validation outcome shapes. `Rows` is the only variant
/// today; the enum is the extension point for outcome kinds that report
/// something other than offending rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ValidationResult {
    Rows(RowsResult),
}

impl ValidationResult {
    /// The not-yet-validated outcome a context starts with.
    #[must_use]
    pub fn empty() -> Self {
        Self::Rows(RowsResult::default())
    }

    #[must_use]
    pub fn is_err(&self) -> bool {
        match self {
            Self::Rows(rows) => rows.is_err,
        }
    }

    /// Report line for a failed validation; empty when the validation
    /// passed.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Rows(rows) => {
                if !rows.is_err {
                    return String::new();
                }
                format!(
                    "master=<{}> validation=<{}> error_message=<{}> error_master_data=<{:?}>",
                    rows.master_name, rows.validator_name, rows.err_msg, rows.err_rows
                )
            }
        }
    }

    /// The offending rows, in primary-key order as collected.
    #[must_use]
    pub fn error_rows(&self) -> &[MasterRow] {
        match self {
            Self::Rows(rows) => &rows.err_rows,
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::empty()
    }
}
