//! JavaScript code generator.
//!
//! Converts an AST back to JavaScript source. Renames are applied during
//! emission from a span-keyed map, so two occurrences of the same original
//! name can receive different replacements when they resolve to different
//! variables.

use crate::ast::*;
use crate::span::Span;
use std::collections::HashMap;

/// The code generator.
pub struct Codegen<'a> {
    ast: &'a Ast,
    /// Output buffer.
    output: String,
    /// Current indentation level.
    indent_level: usize,
    /// Replacement names keyed by identifier occurrence span.
    renames: HashMap<Span, String>,
}

impl<'a> Codegen<'a> {
    /// Create a new code generator.
    pub fn new(ast: &'a Ast) -> Self {
        Self::with_renames(ast, HashMap::new())
    }

    /// Create a code generator that rewrites identifier occurrences.
    pub fn with_renames(ast: &'a Ast, renames: HashMap<Span, String>) -> Self {
        Self {
            ast,
            output: String::new(),
            indent_level: 0,
            renames,
        }
    }

    /// Generate JavaScript source code.
    pub fn generate(mut self) -> String {
        for stmt in &self.ast.stmts {
            self.emit_stmt(stmt);
            self.emit_newline();
        }
        self.output
    }

    fn ident_text<'b>(&'b self, ident: &'b Ident) -> &'b str {
        match self.renames.get(&ident.span) {
            Some(name) => name.as_str(),
            None => ident.name.as_str(),
        }
    }

    // =========================================================================
    // Output helpers
    // =========================================================================

    fn emit(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn emit_newline(&mut self) {
        self.output.push('\n');
        for _ in 0..self.indent_level {
            self.output.push_str("  ");
        }
    }

    fn emit_ident(&mut self, ident: &Ident) {
        let text = match self.renames.get(&ident.span) {
            Some(name) => name.clone(),
            None => ident.name.clone(),
        };
        self.emit(&text);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var { kind, decls } => {
                self.emit_var_decl(*kind, decls);
                self.emit(";");
            }
            StmtKind::Function(func) => {
                self.emit_function(func);
            }
            StmtKind::Block(stmts) => {
                self.emit_block(stmts);
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.emit("if (");
                self.emit_expr(test);
                self.emit(") ");
                self.emit_stmt_as_body(consequent);
                if let Some(alt) = alternate {
                    self.emit(" else ");
                    self.emit_stmt_as_body(alt);
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.emit("switch (");
                self.emit_expr(discriminant);
                self.emit(") {");
                self.indent_level += 1;
                for case in cases {
                    self.emit_newline();
                    match &case.test {
                        Some(test) => {
                            self.emit("case ");
                            self.emit_expr(test);
                            self.emit(":");
                        }
                        None => self.emit("default:"),
                    }
                    self.indent_level += 1;
                    for stmt in &case.consequent {
                        self.emit_newline();
                        self.emit_stmt(stmt);
                    }
                    self.indent_level -= 1;
                }
                self.indent_level -= 1;
                self.emit_newline();
                self.emit("}");
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.emit("for (");
                if let Some(init) = init {
                    self.emit_for_init(init);
                }
                self.emit("; ");
                if let Some(test) = test {
                    self.emit_expr(test);
                }
                self.emit("; ");
                if let Some(update) = update {
                    self.emit_expr(update);
                }
                self.emit(") ");
                self.emit_stmt_as_body(body);
            }
            StmtKind::ForIn { left, right, body } => {
                self.emit("for (");
                self.emit_for_init(left);
                self.emit(" in ");
                self.emit_expr(right);
                self.emit(") ");
                self.emit_stmt_as_body(body);
            }
            StmtKind::ForOf { left, right, body } => {
                self.emit("for (");
                self.emit_for_init(left);
                self.emit(" of ");
                self.emit_expr(right);
                self.emit(") ");
                self.emit_stmt_as_body(body);
            }
            StmtKind::While { test, body } => {
                self.emit("while (");
                self.emit_expr(test);
                self.emit(") ");
                self.emit_stmt_as_body(body);
            }
            StmtKind::DoWhile { body, test } => {
                self.emit("do ");
                self.emit_stmt_as_body(body);
                self.emit(" while (");
                self.emit_expr(test);
                self.emit(");");
            }
            StmtKind::Break { label } => {
                self.emit("break");
                if let Some(label) = label {
                    self.emit(" ");
                    self.emit(label);
                }
                self.emit(";");
            }
            StmtKind::Continue { label } => {
                self.emit("continue");
                if let Some(label) = label {
                    self.emit(" ");
                    self.emit(label);
                }
                self.emit(";");
            }
            StmtKind::Return { arg } => {
                self.emit("return");
                if let Some(arg) = arg {
                    self.emit(" ");
                    self.emit_expr(arg);
                }
                self.emit(";");
            }
            StmtKind::Throw { arg } => {
                self.emit("throw ");
                self.emit_expr(arg);
                self.emit(";");
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.emit("try ");
                self.emit_block(block);
                if let Some(handler) = handler {
                    self.emit(" catch ");
                    if let Some(param) = &handler.param {
                        self.emit("(");
                        self.emit_ident(param);
                        self.emit(") ");
                    }
                    self.emit_block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.emit(" finally ");
                    self.emit_block(finalizer);
                }
            }
            StmtKind::Labeled { label, body } => {
                self.emit(label);
                self.emit(": ");
                self.emit_stmt(body);
            }
            StmtKind::With { object, body } => {
                self.emit("with (");
                self.emit_expr(object);
                self.emit(") ");
                self.emit_stmt_as_body(body);
            }
            StmtKind::Expr(expr) => {
                // Leading `function` or `{` would reparse as a declaration or
                // block, so those expression statements need parens.
                if starts_with_function_or_brace(expr) {
                    self.emit("(");
                    self.emit_expr(expr);
                    self.emit(")");
                } else {
                    self.emit_expr(expr);
                }
                self.emit(";");
            }
            StmtKind::Empty => self.emit(";"),
            StmtKind::Debugger => self.emit("debugger;"),
        }
    }

    /// Loop and branch bodies: blocks stay inline, other statements too.
    fn emit_stmt_as_body(&mut self, stmt: &Stmt) {
        self.emit_stmt(stmt);
    }

    fn emit_block(&mut self, stmts: &[Stmt]) {
        if stmts.is_empty() {
            self.emit("{}");
            return;
        }
        self.emit("{");
        self.indent_level += 1;
        for stmt in stmts {
            self.emit_newline();
            self.emit_stmt(stmt);
        }
        self.indent_level -= 1;
        self.emit_newline();
        self.emit("}");
    }

    fn emit_var_decl(&mut self, kind: VarKind, decls: &[VarDeclarator]) {
        self.emit(kind.as_str());
        self.emit(" ");
        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.emit_ident(&decl.name);
            if let Some(init) = &decl.init {
                self.emit(" = ");
                self.emit_expr_prec(init, PREC_ASSIGN);
            }
        }
    }

    fn emit_for_init(&mut self, init: &ForInit) {
        match init {
            ForInit::Var { kind, decls } => self.emit_var_decl(*kind, decls),
            ForInit::Expr(expr) => self.emit_expr(expr),
        }
    }

    fn emit_function(&mut self, func: &Function) {
        self.emit("function");
        if let Some(name) = &func.name {
            self.emit(" ");
            self.emit_ident(name);
        }
        self.emit_params(&func.params);
        self.emit(" ");
        self.emit_block(&func.body);
    }

    fn emit_params(&mut self, params: &[Ident]) {
        self.emit("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.emit_ident(param);
        }
        self.emit(")");
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn emit_expr(&mut self, expr: &Expr) {
        self.emit_expr_prec(expr, PREC_SEQUENCE);
    }

    /// Emit with parens when the expression binds looser than the context.
    fn emit_expr_prec(&mut self, expr: &Expr, min_prec: u8) {
        let prec = expr_precedence(expr);
        if prec < min_prec {
            self.emit("(");
            self.emit_expr_inner(expr);
            self.emit(")");
        } else {
            self.emit_expr_inner(expr);
        }
    }

    fn emit_expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Null => self.emit("null"),
            ExprKind::Bool(true) => self.emit("true"),
            ExprKind::Bool(false) => self.emit("false"),
            ExprKind::Number(value) => {
                let text = format_number(*value);
                self.emit(&text);
            }
            ExprKind::Str(value) => {
                let quoted = quote_string(value);
                self.emit(&quoted);
            }
            ExprKind::Regex { pattern, flags } => {
                let text = format!("/{pattern}/{flags}");
                self.emit(&text);
            }
            ExprKind::Template(value) => {
                let escaped = value.replace('\\', "\\\\").replace('`', "\\`");
                self.emit("`");
                self.emit(&escaped);
                self.emit("`");
            }
            ExprKind::Ident(ident) => self.emit_ident(ident),
            ExprKind::This => self.emit("this"),
            ExprKind::Array(elements) => {
                self.emit("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.emit(", ");
                    }
                    if let Some(element) = element {
                        self.emit_expr_prec(element, PREC_ASSIGN);
                    }
                }
                self.emit("]");
            }
            ExprKind::Object(props) => {
                if props.is_empty() {
                    self.emit("{}");
                    return;
                }
                self.emit("{ ");
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.emit(", ");
                    }
                    self.emit_property(prop);
                }
                self.emit(" }");
            }
            ExprKind::Function(func) => self.emit_function(func),
            ExprKind::Arrow(arrow) => {
                self.emit_params(&arrow.params);
                self.emit(" => ");
                match &arrow.body {
                    ArrowBody::Expr(expr) => {
                        // `=> {…}` would parse as a block body.
                        if starts_with_function_or_brace(expr)
                            || matches!(expr.kind, ExprKind::Object(_))
                        {
                            self.emit("(");
                            self.emit_expr_prec(expr, PREC_ASSIGN);
                            self.emit(")");
                        } else {
                            self.emit_expr_prec(expr, PREC_ASSIGN);
                        }
                    }
                    ArrowBody::Block(stmts) => self.emit_block(stmts),
                }
            }
            ExprKind::Unary { op, arg } => {
                let text = unary_op_text(*op);
                self.emit(text);
                if text.chars().next().map(char::is_alphabetic).unwrap_or(false) {
                    self.emit(" ");
                } else if needs_space_between_unary(text, arg) {
                    self.emit(" ");
                }
                self.emit_expr_prec(arg, PREC_UNARY);
            }
            ExprKind::Binary { op, left, right } => {
                let prec = binary_op_precedence(*op);
                self.emit_expr_prec(left, prec);
                self.emit(" ");
                self.emit(binary_op_text(*op));
                self.emit(" ");
                self.emit_expr_prec(right, prec + 1);
            }
            ExprKind::Assign { op, left, right } => {
                self.emit_expr_prec(left, PREC_UNARY);
                self.emit(" ");
                self.emit(assign_op_text(*op));
                self.emit(" ");
                self.emit_expr_prec(right, PREC_ASSIGN);
            }
            ExprKind::Update { op, prefix, arg } => {
                let text = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    self.emit(text);
                    self.emit_expr_prec(arg, PREC_UNARY);
                } else {
                    self.emit_expr_prec(arg, PREC_POSTFIX);
                    self.emit(text);
                }
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.emit_expr_prec(test, PREC_CONDITIONAL + 1);
                self.emit(" ? ");
                self.emit_expr_prec(consequent, PREC_ASSIGN);
                self.emit(" : ");
                self.emit_expr_prec(alternate, PREC_ASSIGN);
            }
            ExprKind::Sequence(exprs) => {
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.emit(", ");
                    }
                    self.emit_expr_prec(expr, PREC_ASSIGN);
                }
            }
            ExprKind::Member { object, property } => {
                // Parenthesize number literals: `1.toString()` is invalid.
                if matches!(object.kind, ExprKind::Number(_)) {
                    self.emit("(");
                    self.emit_expr_inner(object);
                    self.emit(")");
                } else {
                    self.emit_expr_prec(object, PREC_MEMBER);
                }
                match property {
                    MemberProp::Ident(name) => {
                        self.emit(".");
                        self.emit(name);
                    }
                    MemberProp::Computed(index) => {
                        self.emit("[");
                        self.emit_expr(index);
                        self.emit("]");
                    }
                }
            }
            ExprKind::Call { callee, args } => {
                self.emit_expr_prec(callee, PREC_MEMBER);
                self.emit_args(args);
            }
            ExprKind::New { callee, args } => {
                self.emit("new ");
                self.emit_expr_prec(callee, PREC_MEMBER);
                self.emit_args(args);
            }
        }
    }

    fn emit_args(&mut self, args: &[Expr]) {
        self.emit("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.emit_expr_prec(arg, PREC_ASSIGN);
        }
        self.emit(")");
    }

    fn emit_property(&mut self, prop: &Property) {
        match prop.kind {
            PropertyKind::Get | PropertyKind::Set => {
                self.emit(if matches!(prop.kind, PropertyKind::Get) {
                    "get "
                } else {
                    "set "
                });
                self.emit_property_key(&prop.key);
                if let ExprKind::Function(func) = &prop.value.kind {
                    self.emit_params(&func.params);
                    self.emit(" ");
                    self.emit_block(&func.body);
                }
                return;
            }
            PropertyKind::Init => {}
        }

        // Shorthand survives only while the value still matches the key;
        // a renamed value forces the expanded `key: value` form.
        if prop.shorthand {
            if let (PropertyKey::Ident(key), ExprKind::Ident(ident)) =
                (&prop.key, &prop.value.kind)
            {
                let value_text = self.ident_text(ident).to_string();
                if *key == value_text {
                    self.emit(&value_text);
                    return;
                }
                self.emit(key);
                self.emit(": ");
                self.emit(&value_text);
                return;
            }
        }

        self.emit_property_key(&prop.key);
        self.emit(": ");
        self.emit_expr_prec(&prop.value, PREC_ASSIGN);
    }

    fn emit_property_key(&mut self, key: &PropertyKey) {
        match key {
            PropertyKey::Ident(name) => self.emit(name),
            PropertyKey::Str(value) => {
                let quoted = quote_string(value);
                self.emit(&quoted);
            }
            PropertyKey::Number(value) => {
                let text = format_number(*value);
                self.emit(&text);
            }
            PropertyKey::Computed(expr) => {
                self.emit("[");
                self.emit_expr_prec(expr, PREC_ASSIGN);
                self.emit("]");
            }
        }
    }
}

// =============================================================================
// Precedence
// =============================================================================

const PREC_SEQUENCE: u8 = 0;
const PREC_ASSIGN: u8 = 1;
const PREC_CONDITIONAL: u8 = 2;
// Binary operators occupy 2..=11 (see `binary_op_precedence`).
const PREC_UNARY: u8 = 12;
const PREC_POSTFIX: u8 = 13;
const PREC_MEMBER: u8 = 14;
const PREC_PRIMARY: u8 = 15;

fn expr_precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) => PREC_SEQUENCE,
        ExprKind::Assign { .. } | ExprKind::Arrow(_) => PREC_ASSIGN,
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Binary { op, .. } => binary_op_precedence(*op),
        ExprKind::Unary { .. } => PREC_UNARY,
        ExprKind::Update { prefix, .. } => {
            if *prefix {
                PREC_UNARY
            } else {
                PREC_POSTFIX
            }
        }
        ExprKind::Member { .. } | ExprKind::Call { .. } | ExprKind::New { .. } => PREC_MEMBER,
        _ => PREC_PRIMARY,
    }
}

fn binary_op_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 2,
        BinaryOp::And => 3,
        BinaryOp::BitOr => 4,
        BinaryOp::BitXor => 5,
        BinaryOp::BitAnd => 6,
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 7,
        BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::In
        | BinaryOp::Instanceof => 8,
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 9,
        BinaryOp::Add | BinaryOp::Sub => 10,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 11,
    }
}

fn binary_op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::StrictEq => "===",
        BinaryOp::StrictNotEq => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::BitAnd => "&",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::UShr => ">>>",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::In => "in",
        BinaryOp::Instanceof => "instanceof",
    }
}

fn unary_op_text(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Minus => "-",
        UnaryOp::Plus => "+",
        UnaryOp::Not => "!",
        UnaryOp::BitNot => "~",
        UnaryOp::Typeof => "typeof",
        UnaryOp::Void => "void",
        UnaryOp::Delete => "delete",
    }
}

fn assign_op_text(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::ShlAssign => "<<=",
        AssignOp::ShrAssign => ">>=",
        AssignOp::UShrAssign => ">>>=",
        AssignOp::BitOrAssign => "|=",
        AssignOp::BitXorAssign => "^=",
        AssignOp::BitAndAssign => "&=",
    }
}

/// `-(-x)` and `-(--x)` must not fuse into `--x` / `---x`.
fn needs_space_between_unary(op_text: &str, arg: &Expr) -> bool {
    match (&arg.kind, op_text) {
        (ExprKind::Unary { op: UnaryOp::Minus, .. }, "-") => true,
        (ExprKind::Unary { op: UnaryOp::Plus, .. }, "+") => true,
        (ExprKind::Update { op: UpdateOp::Decrement, prefix: true, .. }, "-") => true,
        (ExprKind::Update { op: UpdateOp::Increment, prefix: true, .. }, "+") => true,
        _ => false,
    }
}

fn starts_with_function_or_brace(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(_) | ExprKind::Object(_) => true,
        ExprKind::Member { object, .. } => starts_with_function_or_brace(object),
        ExprKind::Call { callee, .. } => starts_with_function_or_brace(callee),
        ExprKind::Binary { left, .. } => starts_with_function_or_brace(left),
        ExprKind::Assign { left, .. } => starts_with_function_or_brace(left),
        ExprKind::Conditional { test, .. } => starts_with_function_or_brace(test),
        ExprKind::Sequence(exprs) => exprs
            .first()
            .map(starts_with_function_or_brace)
            .unwrap_or(false),
        ExprKind::Update { prefix: false, arg, .. } => starts_with_function_or_brace(arg),
        _ => false,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn roundtrip(source: &str) -> String {
        let ast = Parser::new(source).parse().unwrap();
        Codegen::new(&ast).generate()
    }

    fn reparses(source: &str) {
        let out = roundtrip(source);
        let again = Parser::new(&out).parse();
        assert!(again.is_ok(), "regenerated source failed to parse: {out}");
    }

    #[test]
    fn test_emit_var_decl() {
        assert_eq!(roundtrip("var a=1,b;"), "var a = 1, b;\n");
    }

    #[test]
    fn test_emit_function() {
        let out = roundtrip("function f(a){return a+1;}");
        assert_eq!(out, "function f(a) {\n  return a + 1;\n}\n");
    }

    #[test]
    fn test_precedence_parens_preserved() {
        assert_eq!(roundtrip("x=(1+2)*3;"), "x = (1 + 2) * 3;\n");
        assert_eq!(roundtrip("x=1+2*3;"), "x = 1 + 2 * 3;\n");
    }

    #[test]
    fn test_iife_parenthesized() {
        let out = roundtrip("(function(){})();");
        assert_eq!(out, "(function() {}());\n");
    }

    #[test]
    fn test_renames_applied_by_span() {
        let source = "var a = 1; function f(a) { return a; } f(a);";
        let ast = Parser::new(source).parse().unwrap();
        // Rename only the parameter and its use, not the outer `a`.
        let mut renames = HashMap::new();
        for stmt in &ast.stmts {
            if let StmtKind::Function(func) = &stmt.kind {
                renames.insert(func.params[0].span, "count".to_string());
                if let StmtKind::Return { arg: Some(arg) } = &func.body[0].kind {
                    if let ExprKind::Ident(ident) = &arg.kind {
                        renames.insert(ident.span, "count".to_string());
                    }
                }
            }
        }
        let out = Codegen::with_renames(&ast, renames).generate();
        assert!(out.contains("function f(count)"), "{out}");
        assert!(out.contains("return count;"), "{out}");
        assert!(out.contains("var a = 1;"), "{out}");
        assert!(out.contains("f(a);"), "{out}");
    }

    #[test]
    fn test_shorthand_expands_on_rename() {
        let source = "var a = 1; var o = {a};";
        let ast = Parser::new(source).parse().unwrap();
        let mut renames = HashMap::new();
        for stmt in &ast.stmts {
            if let StmtKind::Var { decls, .. } = &stmt.kind {
                if decls[0].name.name == "o" {
                    if let Some(init) = &decls[0].init {
                        if let ExprKind::Object(props) = &init.kind {
                            if let ExprKind::Ident(ident) = &props[0].value.kind {
                                renames.insert(ident.span, "count".to_string());
                            }
                        }
                    }
                }
            }
        }
        let out = Codegen::with_renames(&ast, renames).generate();
        assert!(out.contains("{ a: count }"), "{out}");
    }

    #[test]
    fn test_roundtrip_reparses() {
        reparses("for(var i=0;i<10;i++){console.log(i%2?'odd':'even');}");
        reparses("try{f();}catch(e){g(e);}finally{h();}");
        reparses("var f=(a,b)=>a+b;var g=x=>{return x;};");
        reparses("switch(x){case 1:f();break;default:g();}");
        reparses("var o={a:1,'b':2,c,get d(){return 1;}};");
        reparses("a=-(-b);c=-(--d);");
        reparses("x=/ab+c/g.test(s)?1:2;");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(255.0), "255");
    }
}
