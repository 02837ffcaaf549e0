#![forbid(unsafe_code)]

//! Umbrella crate: one `use mastercheck::*` away from the whole engine.
//!
//! A master is a CSV file loaded into a [`MasterTable`]; a rule file holds
//! one DSL line per rule, each a chain of filters ending in a validation:
//!
//! ```text
//! equal_filter(kind, 1) > count_validation(10)
//! ```
//!
//! Filters narrow the row set in place; the validation inspects what
//! remains and reports a [`ValidationResult`].

pub use mc_command::{builtin_registry, register_builtins};
pub use mc_data::{
    DataError, FloatComparator, IntComparator, MASTER_DATETIME_FORMAT, MasterRow, MasterTable,
    ValueComparator,
};
pub use mc_dsl::{
    Command, CommandError, CommandKind, CommandRegistry, Context, DslError, FilterFn, RowsResult,
    RuleNode, ValidationFn, ValidationResult, tokenize,
};
pub use mc_io::{IoError, read_csv, read_csv_dir, read_rule_lines};
pub use mc_runner::{RunError, run_rule, run_rules, validate_all, validate_master};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{MasterTable, builtin_registry, run_rule};

    #[test]
    fn the_public_surface_runs_a_rule() {
        let mut record = BTreeMap::new();
        record.insert("id".to_owned(), "1".to_owned());
        let table = MasterTable::from_records("smoke", vec![record]).expect("table");

        let registry = builtin_registry();
        let (_, result) = run_rule(table, &registry, "count_validation(1)").expect("run");
        assert!(!result.is_err());
    }
}
