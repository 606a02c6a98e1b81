//! Rewriter construction and request handling.

mod builder;
pub mod prompt;
mod rewriter;

pub use builder::{DEFAULT_TEMPERATURE, Escriba, EscribaBuilder};
pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate};
pub use rewriter::{
    EMPTY_DRAFT_MARKER, EXHAUSTED_MARKER, Origin, Rewrite, Rewriter, UNCONFIGURED_MARKER,
};
