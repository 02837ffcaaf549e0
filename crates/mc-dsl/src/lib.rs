#![forbid(unsafe_code)]

//! Rule DSL engine: one line of rule text is tokenized, parsed into a small
//! node tree by recursive descent, and executed against a live
//! [`mc_data::MasterTable`]. A rule is a chain of filter commands narrowing
//! the row set, terminated by exactly one validation command that produces a
//! [`ValidationResult`].

mod lexer;
mod parse;
mod registry;
mod result;

use thiserror::Error;

pub use crate::lexer::{invalid_tokens, tokenize};
pub use crate::parse::{ArgValueNode, ArgsNode, Context, FilterNode, RuleNode, ValidationNode};
pub use crate::registry::{
    Command, CommandError, CommandKind, CommandRegistry, FilterFn, ValidationFn,
};
pub use crate::result::{RowsResult, ValidationResult};

#[derive(Debug, Error)]
pub enum DslError {
    #[error("rule line is empty")]
    EmptyInput,
    #[error("unterminated quote in rule line")]
    UnterminatedQuote,
    #[error("rule line contains invalid tokens: {tokens:?}")]
    InvalidTokens { tokens: Vec<String> },
    #[error("expected token '{expected}' but found '{found}'")]
    UnexpectedToken { expected: String, found: String },
    #[error("rule line ended before parsing finished")]
    UnexpectedEnd,
    #[error("token '{found}' is not a {kind} command name")]
    BadCommandHead { kind: CommandKind, found: String },
    #[error("token '{found}' cannot be used as an argument value")]
    InvalidArgValue { found: String },
    #[error("expected ',' or ')' in argument list but found '{found}'")]
    MalformedArgs { found: String },
    #[error("unexpected trailing token '{found}' after the validation")]
    TrailingToken { found: String },
    #[error("no command registered under '{name}'")]
    CommandNotFound { name: String },
    #[error("command '{name}' is registered as a {actual} command, not a {expected} command")]
    CommandKindMismatch {
        name: String,
        expected: CommandKind,
        actual: CommandKind,
    },
    #[error("command '{name}' failed")]
    Command {
        name: String,
        #[source]
        source: CommandError,
    },
}
