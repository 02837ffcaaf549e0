#![forbid(unsafe_code)]

//! Built-in commands for the rule DSL. Each command conforms to the
//! filter or validation contract from [`mc_dsl`] and is registered under
//! the exact name the grammar matches, suffix included.

use chrono::Timelike;
use mc_data::{IntComparator, MASTER_DATETIME_FORMAT, MasterTable};
use mc_dsl::{CommandError, CommandRegistry, RowsResult, ValidationResult};

/// A registry populated with every built-in command.
#[must_use]
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    registry
}

/// Add the built-in commands to an existing registry. Host code that
/// carries its own commands can layer them on top.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register_filter("equal_filter", equal_filter);
    registry.register_validation("count_validation", count_validation);
    registry.register_validation("time_0sec_validation", time_0sec_validation);
}

/// `equal_filter(column, value)` — keep only the rows whose `column`
/// equals the integer `value`.
pub fn equal_filter(mut table: MasterTable, args: &[String]) -> Result<MasterTable, CommandError> {
    let [column, value] = args else {
        return Err(CommandError::InvalidArgument(format!(
            "equal_filter expects (column, value) but got {} argument(s)",
            args.len()
        )));
    };
    table.remove_not_eq(column, &IntComparator::new(value)?)?;
    Ok(table)
}

/// `count_validation(min_count)` — fails when fewer than `min_count` rows
/// remain. Count-based, so the outcome carries no offending rows.
pub fn count_validation(
    table: &MasterTable,
    args: &[String],
) -> Result<ValidationResult, CommandError> {
    let [min_count] = args else {
        return Err(CommandError::InvalidArgument(format!(
            "count_validation expects (min_count) but got {} argument(s)",
            args.len()
        )));
    };
    let min: usize = min_count.parse().map_err(|_| {
        CommandError::InvalidArgument(format!(
            "count_validation argument '{min_count}' is not a valid count"
        ))
    })?;

    Ok(ValidationResult::Rows(RowsResult {
        is_err: table.count() < min,
        master_name: table.name().to_owned(),
        validator_name: "count_validation".to_owned(),
        err_msg: format!(
            "{min_count}件以上のレコードがありません。{}件",
            table.count()
        ),
        err_rows: Vec::new(),
    }))
}

/// `time_0sec_validation()` — every `start_data` datetime must land on a
/// whole minute; rows with nonzero seconds are offending.
pub fn time_0sec_validation(
    table: &MasterTable,
    args: &[String],
) -> Result<ValidationResult, CommandError> {
    if !args.is_empty() {
        return Err(CommandError::InvalidArgument(format!(
            "time_0sec_validation expects no arguments but got {}",
            args.len()
        )));
    }

    let mut err_rows = Vec::new();
    for row in table.rows() {
        let dt = row.column_datetime("start_data", MASTER_DATETIME_FORMAT)?;
        if dt.second() != 0 {
            err_rows.push(row.clone());
        }
    }

    Ok(ValidationResult::Rows(RowsResult {
        is_err: !err_rows.is_empty(),
        master_name: table.name().to_owned(),
        validator_name: "time_0sec_validation".to_owned(),
        err_msg: "start_dataの秒が0秒になっていません。".to_owned(),
        err_rows,
    }))
}
