use std::fmt;

use mc_data::MasterTable;
use tracing::error;

use crate::DslError;
use crate::registry::{CommandKind, CommandRegistry};
use crate::result::ValidationResult;

const FILTER_SUFFIX: &str = "filter";
const VALIDATION_SUFFIX: &str = "validation";

fn is_filter_head(token: &str) -> bool {
    token.len() > FILTER_SUFFIX.len() && token.ends_with(FILTER_SUFFIX)
}

fn is_validation_head(token: &str) -> bool {
    token.len() > VALIDATION_SUFFIX.len() && token.ends_with(VALIDATION_SUFFIX)
}

/// Single-owner mutable cursor shared by the parser and the interpreter:
/// the token stream with a one-token lookahead, the live table the filters
/// narrow, and the accumulated validation outcome.
#[derive(Debug)]
pub struct Context<'reg> {
    tokens: Vec<String>,
    pos: usize,
    registry: &'reg CommandRegistry,
    table: MasterTable,
    master_name: String,
    result: ValidationResult,
}

impl<'reg> Context<'reg> {
    #[must_use]
    pub fn new(table: MasterTable, tokens: Vec<String>, registry: &'reg CommandRegistry) -> Self {
        let master_name = table.name().to_owned();
        Self {
            tokens,
            pos: 0,
            registry,
            table,
            master_name,
            result: ValidationResult::empty(),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    /// Advance the cursor and return the new current token.
    pub fn next_token(&mut self) -> Option<&str> {
        self.pos += 1;
        self.current()
    }

    /// Assert the current token equals `expected`, then advance past it.
    pub fn skip_token(&mut self, expected: &str) -> Result<(), DslError> {
        match self.current() {
            Some(token) if token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(DslError::UnexpectedToken {
                expected: expected.to_owned(),
                found: token.to_owned(),
            }),
            None => Err(DslError::UnexpectedEnd),
        }
    }

    /// Whether any token remains under the cursor.
    #[must_use]
    pub fn is_parsable(&self) -> bool {
        self.pos < self.tokens.len()
    }

    #[must_use]
    pub fn master_name(&self) -> &str {
        &self.master_name
    }

    #[must_use]
    pub fn table(&self) -> &MasterTable {
        &self.table
    }

    #[must_use]
    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    /// Tear down the context after execution, yielding the (possibly
    /// narrowed) table and the final outcome.
    #[must_use]
    pub fn into_parts(self) -> (MasterTable, ValidationResult) {
        (self.table, self.result)
    }
}

/// `ArgValue ::= any token not equal to "," or ")"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgValueNode {
    value: String,
}

impl ArgValueNode {
    fn parse(c: &mut Context<'_>) -> Result<Self, DslError> {
        match c.current() {
            Some(token @ ("," | ")")) => Err(DslError::InvalidArgValue {
                found: token.to_owned(),
            }),
            Some(token) => {
                let value = token.to_owned();
                c.next_token();
                Ok(Self { value })
            }
            None => Err(DslError::UnexpectedEnd),
        }
    }

    /// The raw token text, un-coerced; type coercion belongs to the
    /// command.
    #[must_use]
    pub fn execute(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ArgValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// `Args ::= "(" ( ArgValue ("," ArgValue)* )? ")"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgsNode {
    values: Vec<ArgValueNode>,
}

impl ArgsNode {
    fn parse(c: &mut Context<'_>) -> Result<Self, DslError> {
        c.skip_token("(")?;

        let mut values = Vec::new();
        if c.current() == Some(")") {
            c.next_token();
            return Ok(Self { values });
        }

        loop {
            values.push(ArgValueNode::parse(c)?);
            match c.current() {
                Some(",") => {
                    c.next_token();
                }
                Some(")") => {
                    c.next_token();
                    return Ok(Self { values });
                }
                Some(token) => {
                    return Err(DslError::MalformedArgs {
                        found: token.to_owned(),
                    });
                }
                None => return Err(DslError::UnexpectedEnd),
            }
        }
    }

    #[must_use]
    pub fn execute(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| value.execute().to_owned())
            .collect()
    }
}

impl fmt::Display for ArgsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({rendered})")
    }
}

/// `Filter ::= Ident"filter" Args` — the whole head token, suffix
/// included, is the command name used for registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNode {
    name: String,
    args: ArgsNode,
}

impl FilterNode {
    fn parse(c: &mut Context<'_>) -> Result<Self, DslError> {
        let name = match c.current() {
            Some(token) if is_filter_head(token) => token.to_owned(),
            Some(token) => {
                return Err(DslError::BadCommandHead {
                    kind: CommandKind::Filter,
                    found: token.to_owned(),
                });
            }
            None => return Err(DslError::UnexpectedEnd),
        };
        // Resolve at parse time so a dangling name fails before anything
        // runs.
        c.registry.filter(&name)?;
        c.next_token();

        let args = ArgsNode::parse(c)?;
        Ok(Self { name, args })
    }

    fn execute(&self, c: &mut Context<'_>) -> Result<(), DslError> {
        let args = self.args.execute();
        let command = c.registry.filter(&self.name)?;
        let table = std::mem::take(&mut c.table);
        match command(table, &args) {
            Ok(table) => {
                c.table = table;
                Ok(())
            }
            Err(source) => {
                error!(command = self.name.as_str(), ?args, "filter command failed");
                Err(DslError::Command {
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.args)
    }
}

/// `Validation ::= Ident"validation" Args`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationNode {
    name: String,
    args: ArgsNode,
}

impl ValidationNode {
    fn parse(c: &mut Context<'_>) -> Result<Self, DslError> {
        let name = match c.current() {
            Some(token) if is_validation_head(token) => token.to_owned(),
            Some(token) => {
                return Err(DslError::BadCommandHead {
                    kind: CommandKind::Validation,
                    found: token.to_owned(),
                });
            }
            None => return Err(DslError::UnexpectedEnd),
        };
        c.registry.validation(&name)?;
        c.next_token();

        let args = ArgsNode::parse(c)?;
        Ok(Self { name, args })
    }

    fn execute(&self, c: &mut Context<'_>) -> Result<(), DslError> {
        let args = self.args.execute();
        let command = c.registry.validation(&self.name)?;
        match command(&c.table, &args) {
            Ok(result) => {
                c.result = result;
                Ok(())
            }
            Err(source) => {
                error!(
                    command = self.name.as_str(),
                    ?args,
                    "validation command failed"
                );
                Err(DslError::Command {
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }
}

impl fmt::Display for ValidationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.args)
    }
}

/// `Validator ::= (Filter ">")* Validation` — the root of one rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleNode {
    filters: Vec<FilterNode>,
    validation: ValidationNode,
}

impl RuleNode {
    pub fn parse(c: &mut Context<'_>) -> Result<Self, DslError> {
        if !c.is_parsable() {
            return Err(DslError::UnexpectedEnd);
        }

        let mut filters = Vec::new();
        while c.current().is_some_and(is_filter_head) {
            filters.push(FilterNode::parse(c)?);
            c.skip_token(">")?;
        }

        let validation = ValidationNode::parse(c)?;

        if let Some(found) = c.current() {
            return Err(DslError::TrailingToken {
                found: found.to_owned(),
            });
        }

        Ok(Self {
            filters,
            validation,
        })
    }

    /// Run the filters left to right, each receiving the table the
    /// previous one produced, then run the validation on what remains.
    pub fn execute(&self, c: &mut Context<'_>) -> Result<(), DslError> {
        for filter in &self.filters {
            filter.execute(c)?;
        }
        self.validation.execute(c)
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for filter in &self.filters {
            write!(f, "{filter} > ")?;
        }
        write!(f, "{}", self.validation)
    }
}
