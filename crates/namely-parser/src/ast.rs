//! AST node types for the JavaScript subset.
//!
//! Design principle: everything is an Expression, an Identifier, or a
//! Statement. Identifier leaves carry their spans, which is how the scope
//! resolver keys occurrences without mutating the tree.

use crate::span::Span;

/// The root AST for a parsed program.
#[derive(Debug, Clone)]
pub struct Ast {
    /// All statements in the program.
    pub stmts: Vec<Stmt>,
    /// Source code (kept for token text lookups and diagnostics).
    pub source: String,
}

impl Ast {
    pub fn new(stmts: Vec<Stmt>, source: String) -> Self {
        Self { stmts, source }
    }

    /// Whether the program opens with a `"use strict"` directive.
    ///
    /// Directives are the leading expression statements whose expression is a
    /// string literal.
    pub fn has_use_strict_directive(&self) -> bool {
        for stmt in &self.stmts {
            match &stmt.kind {
                StmtKind::Expr(expr) => match &expr.kind {
                    ExprKind::Str(s) => {
                        if s == "use strict" {
                            return true;
                        }
                    }
                    _ => return false,
                },
                _ => return false,
            }
        }
        false
    }
}

/// An identifier leaf with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // === Literals ===
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Regex { pattern: String, flags: String },
    Template(String),

    // === Identifiers ===
    /// Identifier reference
    Ident(Ident),
    /// `this` keyword
    This,

    // === Compound ===
    /// Array literal: `[a, b, c]` (holes allowed)
    Array(Vec<Option<Expr>>),
    /// Object literal: `{a: 1, b: 2}`
    Object(Vec<Property>),
    /// Function expression: `function f() {}`
    Function(Box<Function>),
    /// Arrow function: `(a) => a`
    Arrow(Box<ArrowFunction>),

    // === Operations ===
    Unary { op: UnaryOp, arg: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Assign { op: AssignOp, left: Box<Expr>, right: Box<Expr> },
    Update { op: UpdateOp, prefix: bool, arg: Box<Expr> },
    Conditional { test: Box<Expr>, consequent: Box<Expr>, alternate: Box<Expr> },
    Sequence(Vec<Expr>),

    // === Member access ===
    /// `a.b` or `a[b]` — non-computed property names are plain strings and
    /// never participate in scope analysis.
    Member { object: Box<Expr>, property: MemberProp },

    // === Calls ===
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { callee: Box<Expr>, args: Vec<Expr> },
}

/// Member access property.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    /// `a.b` — a fixed name, not an identifier occurrence.
    Ident(String),
    /// `a[expr]`
    Computed(Box<Expr>),
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Variable declaration: `var x = 1, y`
    Var { kind: VarKind, decls: Vec<VarDeclarator> },
    /// Function declaration: `function foo() {}`
    Function(Box<Function>),

    Block(Vec<Stmt>),
    If { test: Expr, consequent: Box<Stmt>, alternate: Option<Box<Stmt>> },
    Switch { discriminant: Expr, cases: Vec<SwitchCase> },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn { left: ForInit, right: Expr, body: Box<Stmt> },
    ForOf { left: ForInit, right: Expr, body: Box<Stmt> },
    While { test: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, test: Expr },
    Break { label: Option<String> },
    Continue { label: Option<String> },
    Return { arg: Option<Expr> },
    Throw { arg: Expr },
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
    /// Labels are fixed names, never identifier occurrences.
    Labeled { label: String, body: Box<Stmt> },
    With { object: Expr, body: Box<Stmt> },

    Expr(Expr),
    Empty,
    Debugger,
}

// =============================================================================
// Supporting types
// =============================================================================

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    UShr,
    And,
    Or,
    In,
    Instanceof,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    BitOrAssign,
    BitXorAssign,
    BitAndAssign,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// Variable declarator: one `name = init` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Object literal property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub kind: PropertyKind,
    pub shorthand: bool,
    pub span: Span,
}

/// Property key. Non-computed keys are fixed names, never occurrences.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(String),
    Str(String),
    Number(f64),
    Computed(Box<Expr>),
}

/// Property kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

/// Switch case (`test` is None for `default`).
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub consequent: Vec<Stmt>,
    pub span: Span,
}

/// Catch clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// For loop initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var { kind: VarKind, decls: Vec<VarDeclarator> },
    Expr(Expr),
}

/// Function node (declarations, expressions, accessors).
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Arrow function node.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Ident>,
    pub body: ArrowBody,
    pub span: Span,
}

/// Arrow function body.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}
