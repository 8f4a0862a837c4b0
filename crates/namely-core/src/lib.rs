//! Name recovery for minified JavaScript.
//!
//! The pipeline parses a minified file, resolves its lexical scopes, extracts
//! a context window around every renameable identifier occurrence, and asks a
//! prediction oracle for natural replacement names. Predictions are committed
//! best-first under a safety predicate that guarantees the rewritten program
//! binds every reference to the same declaration as the original.

pub mod aggregate;
pub mod error;
pub mod extract;
pub mod oracle;
pub mod pipeline;
pub mod rename;
pub mod resolve;
pub mod scope;

pub use aggregate::{Aggregate, ContextRecord};
pub use error::{Error, Result};
pub use extract::{extract, Window, DEFAULT_WIDTH};
pub use oracle::{Candidate, OracleClient, OracleResponse};
pub use pipeline::{extract_file, extract_source, recover_file, recover_source, Recovered};
pub use rename::{assign_names, rewrite_plan, QueryVar};
pub use resolve::{resolve, Occurrence, Resolution};
pub use scope::{BindingKind, RenameOptions, Scope, ScopeId, ScopeTree, ROOT_SCOPE};
