use std::collections::BTreeMap;
use std::fmt;

use mc_data::{DataError, MasterTable};
use thiserror::Error;

use crate::{DslError, ValidationResult};

/// Failure raised inside a command body. Propagated unmodified through the
/// engine (wrapped only to carry the command name).
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("{0}")]
    InvalidArgument(String),
}

/// Filter contract: take the live table by value, narrow it, and return the
/// table the chain continues with. The return value is authoritative — a
/// command may hand back the same table mutated or a freshly built one.
pub type FilterFn =
    Box<dyn Fn(MasterTable, &[String]) -> Result<MasterTable, CommandError> + Send + Sync>;

/// Validation contract: inspect the remaining rows and report the outcome.
pub type ValidationFn =
    Box<dyn Fn(&MasterTable, &[String]) -> Result<ValidationResult, CommandError> + Send + Sync>;

pub enum Command {
    Filter(FilterFn),
    Validation(ValidationFn),
}

impl Command {
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Filter(_) => CommandKind::Filter,
            Self::Validation(_) => CommandKind::Validation,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Command").field(&self.kind()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Filter,
    Validation,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter => f.write_str("filter"),
            Self::Validation => f.write_str("validation"),
        }
    }
}

/// Explicit capability table mapping command names to callables. Populated
/// at startup by the host and injected into the engine; lookup is by the
/// exact token the grammar matched, suffix included.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    pub fn register_filter<F>(&mut self, name: impl Into<String>, command: F)
    where
        F: Fn(MasterTable, &[String]) -> Result<MasterTable, CommandError> + Send + Sync + 'static,
    {
        self.commands
            .insert(name.into(), Command::Filter(Box::new(command)));
    }

    pub fn register_validation<F>(&mut self, name: impl Into<String>, command: F)
    where
        F: Fn(&MasterTable, &[String]) -> Result<ValidationResult, CommandError>
            + Send
            + Sync
            + 'static,
    {
        self.commands
            .insert(name.into(), Command::Validation(Box::new(command)));
    }

    pub fn get(&self, name: &str) -> Result<&Command, DslError> {
        self.commands
            .get(name)
            .ok_or_else(|| DslError::CommandNotFound {
                name: name.to_owned(),
            })
    }

    /// Resolve `name` to a filter command; a name bound to a validation is
    /// a kind mismatch, distinct from an unknown name.
    pub fn filter(&self, name: &str) -> Result<&FilterFn, DslError> {
        match self.get(name)? {
            Command::Filter(command) => Ok(command),
            other => Err(DslError::CommandKindMismatch {
                name: name.to_owned(),
                expected: CommandKind::Filter,
                actual: other.kind(),
            }),
        }
    }

    pub fn validation(&self, name: &str) -> Result<&ValidationFn, DslError> {
        match self.get(name)? {
            Command::Validation(command) => Ok(command),
            other => Err(DslError::CommandKindMismatch {
                name: name.to_owned(),
                expected: CommandKind::Validation,
                actual: other.kind(),
            }),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandKind, CommandRegistry};
    use crate::{DslError, ValidationResult};

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register_filter("noop_filter", |table, _args| Ok(table));
        registry.register_validation("ok_validation", |_table, _args| {
            Ok(ValidationResult::empty())
        });
        registry
    }

    #[test]
    fn unknown_name_is_command_not_found() {
        let err = registry().get("missing_filter").expect_err("must fail");
        assert!(matches!(err, DslError::CommandNotFound { name } if name == "missing_filter"));
    }

    #[test]
    fn kind_mismatch_is_distinct_from_unknown_name() {
        let err = registry().filter("ok_validation").err().expect("must fail");
        assert!(matches!(
            err,
            DslError::CommandKindMismatch {
                expected: CommandKind::Filter,
                actual: CommandKind::Validation,
                ..
            }
        ));
    }

    #[test]
    fn lookup_resolves_registered_commands() {
        let registry = registry();
        assert!(registry.filter("noop_filter").is_ok());
        assert!(registry.validation("ok_validation").is_ok());
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["noop_filter", "ok_validation"]
        );
    }
}
