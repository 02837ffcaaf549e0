#![forbid(unsafe_code)]

//! Runs rule files against loaded masters. One rule line is tokenize →
//! parse → execute; lines of one rule file run strictly in order against
//! the same table, so rows removed by an earlier line stay removed for the
//! later ones. Any failure aborts the run with no partial result list.

use std::path::Path;

use mc_data::MasterTable;
use mc_dsl::{CommandRegistry, Context, DslError, RuleNode, ValidationResult, tokenize};
use mc_io::IoError;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("rule '{line}' for master '{master}' failed")]
    Rule {
        master: String,
        line: String,
        #[source]
        source: DslError,
    },
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Tokenize, parse, and execute one rule line against `table`. Returns the
/// table the rule left behind together with the validation outcome.
pub fn run_rule(
    table: MasterTable,
    registry: &CommandRegistry,
    line: &str,
) -> Result<(MasterTable, ValidationResult), DslError> {
    let tokens = tokenize(line)?;
    let mut context = Context::new(table, tokens, registry);
    let rule = RuleNode::parse(&mut context)?;
    debug!(master = context.master_name(), rule = %rule, "executing rule");
    rule.execute(&mut context)?;
    Ok(context.into_parts())
}

/// Run rule lines in order. The table is threaded from line to line, so
/// each line sees the cumulative result of the previous ones.
pub fn run_rules(
    mut table: MasterTable,
    registry: &CommandRegistry,
    lines: &[String],
) -> Result<(MasterTable, Vec<ValidationResult>), RunError> {
    let mut results = Vec::with_capacity(lines.len());
    for line in lines {
        let master = table.name().to_owned();
        let (next, result) =
            run_rule(table, registry, line).map_err(|source| RunError::Rule {
                master,
                line: line.clone(),
                source,
            })?;
        results.push(result);
        table = next;
    }
    Ok((table, results))
}

/// Run the rule file matching `table`'s master name.
pub fn validate_master(
    table: MasterTable,
    registry: &CommandRegistry,
    rules_dir: &Path,
) -> Result<(MasterTable, Vec<ValidationResult>), RunError> {
    let lines = mc_io::read_rule_lines(rules_dir, table.name())?;
    run_rules(table, registry, &lines)
}

/// Load every master under `csv_dir` and run its rule file. Masters are
/// independent and processed sequentially; results come back in master
/// order, then line order.
pub fn validate_all(
    csv_dir: &Path,
    rules_dir: &Path,
    registry: &CommandRegistry,
) -> Result<Vec<ValidationResult>, RunError> {
    let mut results = Vec::new();
    for table in mc_io::read_csv_dir(csv_dir)? {
        debug!(master = table.name(), rows = table.count(), "validating master");
        let (_, master_results) = validate_master(table, registry, rules_dir)?;
        results.extend(master_results);
    }
    Ok(results)
}
