//! namely-parser: JavaScript parser, token stream, and code generator.
//!
//! # Design Principles
//!
//! 1. **Everything is an Expression, Identifier, or Statement**
//!    - Expressions: `foo(1)`, `a + b`, `x.y`
//!    - Identifiers carry their source spans
//!    - Statements: `var a = 1;`, `if (x) {}`, `return x;`
//!
//! 2. **Lexing on-demand**
//!    - Lexer is called during parsing, not upfront
//!    - Enables context-sensitive tokenization (regex vs division)
//!    - `tokenize` drains the same lexer into a `Vec` for consumers that walk
//!      the raw stream
//!
//! 3. **Span-keyed occurrences**
//!    - Identifier spans link AST nodes, token positions, and scope analysis
//!      without back-pointers; the code generator rewrites occurrences from a
//!      span-keyed rename map
//!
//! # Example
//!
//! ```ignore
//! use namely_parser::{parse, Codegen};
//!
//! let ast = parse("var x = 1 + 2;")?;
//! let out = Codegen::new(&ast).generate();
//! ```

mod ast;
mod codegen;
mod lexer;
mod parser;
mod span;
mod token;

// Re-exports
pub use ast::*;
pub use codegen::Codegen;
pub use lexer::{tokenize, Lexer};
pub use parser::{ParseError, Parser};
pub use span::Span;
pub use token::{Token, TokenKind};

/// Parse JavaScript source code into an AST.
pub fn parse(source: &str) -> Result<Ast, ParseError> {
    Parser::new(source).parse()
}
