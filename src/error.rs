//! Integrity errors raised by the definition model.
//!
//! These indicate a scanner bug rather than bad input: unrecognised source
//! text is never an error, it is simply not turned into a definition.

use thiserror::Error;

/// Errors that can occur while building the scope graph or the type graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error(
        "definition {child} ({child_start}-{child_end}) cannot be nested within {parent} ({parent_start}-{parent_end})"
    )]
    SpanEscapesContainer {
        child: String,
        child_start: usize,
        child_end: usize,
        parent: String,
        parent_start: usize,
        parent_end: usize,
    },
    #[error("definition {child} is already nested within {parent}")]
    AlreadyNested { child: String, parent: String },
    #[error("definition {name} cannot be nested within itself")]
    SelfNesting { name: String },
    #[error("type definition {name} was added to the tree builder more than once")]
    DuplicateType { name: String },
}

/// Convenience alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
