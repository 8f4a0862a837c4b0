//! Scope resolution over a parsed program.
//!
//! Two passes. The first builds the scope tree, registers every binding, and
//! collects identifier occurrences with the scope they appear in. The second
//! resolves each occurrence upward through the parent chain — running it only
//! after all bindings exist is what makes forward references (hoisted
//! functions, vars used before declaration) resolve correctly. Resolution
//! never fails for a name: unresolved names degrade to implicit globals.
//!
//! Suppressed positions (non-computed member properties, non-computed object
//! keys, labels) are plain strings in the AST, not identifier nodes, so they
//! never reach the resolver.

use namely_parser::{
    ArrowBody, Ast, CatchClause, Expr, ExprKind, ForInit, Function, Ident, Property, PropertyKey,
    Span, Stmt, StmtKind,
};

use crate::scope::{BindingKind, ScopeId, ScopeTree, ROOT_SCOPE};

/// One identifier occurrence, keyed by its source span.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub name: String,
    pub span: Span,
    /// Scope the occurrence appears in.
    pub referencing_scope: ScopeId,
    /// Scope the occurrence resolved to (`ROOT_SCOPE` for globals).
    pub scope_id: ScopeId,
}

/// Output of resolution: the scope tree plus all occurrences in source order.
#[derive(Debug)]
pub struct Resolution {
    pub scopes: ScopeTree,
    pub occurrences: Vec<Occurrence>,
}

/// Resolve the lexical scoping of a program.
pub fn resolve(ast: &Ast) -> Resolution {
    let mut resolver = Resolver {
        tree: ScopeTree::new(),
        current: ROOT_SCOPE,
        occurrences: Vec::new(),
    };
    resolver.tree.strict = ast.has_use_strict_directive();
    resolver.visit_stmts(&ast.stmts);
    resolver.finish()
}

struct Resolver {
    tree: ScopeTree,
    current: ScopeId,
    occurrences: Vec<Occurrence>,
}

impl Resolver {
    /// Second pass: resolve every collected occurrence against the completed
    /// binding tables.
    fn finish(mut self) -> Resolution {
        for occ in &mut self.occurrences {
            let resolved = match self.tree.lookup(occ.referencing_scope, &occ.name) {
                Some(scope) => scope,
                None => {
                    self.tree.declare_implicit_global(&occ.name);
                    ROOT_SCOPE
                }
            };
            occ.scope_id = resolved;
            self.tree.record_use(resolved, &occ.name, occ.referencing_scope);
        }
        Resolution {
            scopes: self.tree,
            occurrences: self.occurrences,
        }
    }

    fn record(&mut self, ident: &Ident, scope: ScopeId) {
        if ident.name == "eval" {
            self.tree.mark_eval(scope);
        } else if ident.name == "arguments" {
            self.tree.mark_arguments(scope);
        }
        self.occurrences.push(Occurrence {
            name: ident.name.clone(),
            span: ident.span,
            referencing_scope: scope,
            scope_id: ROOT_SCOPE,
        });
    }

    fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var { decls, .. } => {
                for decl in decls {
                    self.tree
                        .declare(self.current, &decl.name.name, BindingKind::LexicalVar);
                    self.record(&decl.name, self.current);
                    if let Some(init) = &decl.init {
                        self.visit_expr(init);
                    }
                }
            }
            StmtKind::Function(func) => self.visit_function_decl(func),
            StmtKind::Block(stmts) => self.visit_stmts(stmts),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.visit_expr(test);
                self.visit_stmt(consequent);
                if let Some(alt) = alternate {
                    self.visit_stmt(alt);
                }
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.visit_expr(discriminant);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    self.visit_stmts(&case.consequent);
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.visit_for_init(init);
                }
                if let Some(test) = test {
                    self.visit_expr(test);
                }
                if let Some(update) = update {
                    self.visit_expr(update);
                }
                self.visit_stmt(body);
            }
            StmtKind::ForIn { left, right, body } | StmtKind::ForOf { left, right, body } => {
                self.visit_for_init(left);
                self.visit_expr(right);
                self.visit_stmt(body);
            }
            StmtKind::While { test, body } => {
                self.visit_expr(test);
                self.visit_stmt(body);
            }
            StmtKind::DoWhile { body, test } => {
                self.visit_stmt(body);
                self.visit_expr(test);
            }
            StmtKind::Return { arg } => {
                if let Some(arg) = arg {
                    self.visit_expr(arg);
                }
            }
            StmtKind::Throw { arg } => self.visit_expr(arg),
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.visit_stmts(block);
                if let Some(handler) = handler {
                    self.visit_catch(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.visit_stmts(finalizer);
                }
            }
            // The label itself is a plain string, never an occurrence.
            StmtKind::Labeled { body, .. } => self.visit_stmt(body),
            StmtKind::With { object, body } => {
                self.visit_expr(object);
                self.visit_stmt(body);
            }
            StmtKind::Expr(expr) => self.visit_expr(expr),
            StmtKind::Break { .. }
            | StmtKind::Continue { .. }
            | StmtKind::Empty
            | StmtKind::Debugger => {}
        }
    }

    fn visit_for_init(&mut self, init: &ForInit) {
        match init {
            ForInit::Var { decls, .. } => {
                for decl in decls {
                    self.tree
                        .declare(self.current, &decl.name.name, BindingKind::LexicalVar);
                    self.record(&decl.name, self.current);
                    if let Some(init) = &decl.init {
                        self.visit_expr(init);
                    }
                }
            }
            ForInit::Expr(expr) => self.visit_expr(expr),
        }
    }

    /// Function declaration: the name hoists into the enclosing scope; the
    /// parameters and body get a fresh scope.
    fn visit_function_decl(&mut self, func: &Function) {
        if let Some(name) = &func.name {
            self.tree
                .declare(self.current, &name.name, BindingKind::FunctionHoisted);
            self.record(name, self.current);
        }
        self.visit_function_body(func);
    }

    /// Function expression: a named one gets an intermediate scope holding
    /// only the self-name, so the name is visible for recursion without
    /// leaking into the enclosing scope.
    fn visit_function_expr(&mut self, func: &Function) {
        match &func.name {
            Some(name) => {
                let wrapper = self.tree.push_scope(self.current, false);
                self.tree
                    .declare(wrapper, &name.name, BindingKind::LambdaSelf);
                self.record(name, wrapper);
                let saved = self.current;
                self.current = wrapper;
                self.visit_function_body(func);
                self.current = saved;
            }
            None => self.visit_function_body(func),
        }
    }

    fn visit_function_body(&mut self, func: &Function) {
        let scope = self.tree.push_scope(self.current, false);
        for param in &func.params {
            self.tree
                .declare(scope, &param.name, BindingKind::Parameter);
            self.record(param, scope);
        }
        let saved = self.current;
        self.current = scope;
        self.visit_stmts(&func.body);
        self.current = saved;
    }

    fn visit_catch(&mut self, handler: &CatchClause) {
        let scope = self.tree.push_scope(self.current, true);
        if let Some(param) = &handler.param {
            self.tree
                .declare(scope, &param.name, BindingKind::CatchParam);
            self.record(param, scope);
        }
        let saved = self.current;
        self.current = scope;
        self.visit_stmts(&handler.body);
        self.current = saved;
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(ident) => self.record(ident, self.current),
            ExprKind::Function(func) => self.visit_function_expr(func),
            ExprKind::Arrow(arrow) => {
                let scope = self.tree.push_scope(self.current, false);
                for param in &arrow.params {
                    self.tree
                        .declare(scope, &param.name, BindingKind::Parameter);
                    self.record(param, scope);
                }
                let saved = self.current;
                self.current = scope;
                match &arrow.body {
                    ArrowBody::Expr(expr) => self.visit_expr(expr),
                    ArrowBody::Block(stmts) => self.visit_stmts(stmts),
                }
                self.current = saved;
            }
            ExprKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.visit_expr(element);
                }
            }
            ExprKind::Object(props) => {
                for prop in props {
                    self.visit_property(prop);
                }
            }
            ExprKind::Unary { arg, .. } => self.visit_expr(arg),
            ExprKind::Binary { left, right, .. } | ExprKind::Assign { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            ExprKind::Update { arg, .. } => self.visit_expr(arg),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.visit_expr(test);
                self.visit_expr(consequent);
                self.visit_expr(alternate);
            }
            ExprKind::Sequence(exprs) => {
                for expr in exprs {
                    self.visit_expr(expr);
                }
            }
            ExprKind::Member { object, property } => {
                self.visit_expr(object);
                // Non-computed property names are suppressed by construction.
                if let namely_parser::MemberProp::Computed(index) = property {
                    self.visit_expr(index);
                }
            }
            ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
                self.visit_expr(callee);
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::Null
            | ExprKind::Bool(_)
            | ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Regex { .. }
            | ExprKind::Template(_)
            | ExprKind::This => {}
        }
    }

    fn visit_property(&mut self, prop: &Property) {
        // Non-computed keys are suppressed; computed keys are expressions.
        if let PropertyKey::Computed(expr) = &prop.key {
            self.visit_expr(expr);
        }
        self.visit_expr(&prop.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::BindingKind;
    use namely_parser::parse;

    fn resolve_src(source: &str) -> Resolution {
        resolve(&parse(source).unwrap())
    }

    fn occurrence<'a>(res: &'a Resolution, name: &str) -> &'a Occurrence {
        res.occurrences
            .iter()
            .find(|o| o.name == name)
            .unwrap_or_else(|| panic!("no occurrence of {name}"))
    }

    #[test]
    fn test_scope_ids_preorder() {
        let res = resolve_src("function a(){ function b(){} } function c(){}");
        // root=0, a's body=1, b's body=2, c's body=3
        assert_eq!(res.scopes.len(), 4);
        for scope in res.scopes.iter() {
            if let Some(parent) = scope.parent {
                assert!(scope.id > parent);
            }
            for &child in &scope.children {
                assert!(child > scope.id);
            }
        }
    }

    #[test]
    fn test_function_name_hoists_to_enclosing() {
        let res = resolve_src("function f(a, b) { return a + b; }");
        assert_eq!(
            res.scopes.get(0).bindings.get("f"),
            Some(&BindingKind::FunctionHoisted)
        );
        assert_eq!(
            res.scopes.get(1).bindings.get("a"),
            Some(&BindingKind::Parameter)
        );
        // The `a` in the body resolves to the function scope.
        let body_a = res
            .occurrences
            .iter()
            .filter(|o| o.name == "a")
            .last()
            .unwrap();
        assert_eq!(body_a.scope_id, 1);
    }

    #[test]
    fn test_forward_reference_to_hoisted_function() {
        let res = resolve_src("g(); function g() {}");
        let call = &res.occurrences[0];
        assert_eq!(call.name, "g");
        assert_eq!(call.scope_id, 0);
        assert_eq!(
            res.scopes.get(0).bindings.get("g"),
            Some(&BindingKind::FunctionHoisted)
        );
    }

    #[test]
    fn test_var_used_before_declaration() {
        let res = resolve_src("function f() { x = 1; var x; }");
        let use_x = occurrence(&res, "x");
        assert_eq!(use_x.scope_id, 1);
        assert_ne!(
            res.scopes.get(1).bindings.get("x"),
            Some(&BindingKind::ImplicitGlobal)
        );
    }

    #[test]
    fn test_implicit_global() {
        let res = resolve_src("function f() { console.log(1); }");
        let console = occurrence(&res, "console");
        assert_eq!(console.scope_id, 0);
        assert_eq!(
            res.scopes.get(0).bindings.get("console"),
            Some(&BindingKind::ImplicitGlobal)
        );
        // `log` is a non-computed property: no occurrence at all.
        assert!(res.occurrences.iter().all(|o| o.name != "log"));
    }

    #[test]
    fn test_named_function_expression_intermediate_scope() {
        let res = resolve_src("var r = function walk(n) { return walk(n - 1); };");
        // root=0, wrapper=1, body=2
        assert_eq!(res.scopes.len(), 3);
        assert_eq!(
            res.scopes.get(1).bindings.get("walk"),
            Some(&BindingKind::LambdaSelf)
        );
        // The self-name never leaks to the enclosing scope.
        assert!(!res.scopes.get(0).bindings.contains_key("walk"));
        let recursive_use = res
            .occurrences
            .iter()
            .filter(|o| o.name == "walk")
            .last()
            .unwrap();
        assert_eq!(recursive_use.scope_id, 1);
    }

    #[test]
    fn test_var_in_catch_hoists_past_catch_scope() {
        let res = resolve_src("function f() { try { g(); } catch (e) { var x = e; } }");
        let func_scope = 1;
        let catch_scope = 2;
        assert!(res.scopes.get(catch_scope).is_catch);
        assert_eq!(
            res.scopes.get(catch_scope).bindings.get("e"),
            Some(&BindingKind::CatchParam)
        );
        assert_eq!(
            res.scopes.get(func_scope).bindings.get("x"),
            Some(&BindingKind::LexicalVar)
        );
        let use_e = res
            .occurrences
            .iter()
            .filter(|o| o.name == "e")
            .last()
            .unwrap();
        assert_eq!(use_e.scope_id, catch_scope);
    }

    #[test]
    fn test_parameter_not_downgraded_by_var() {
        let res = resolve_src("function f(a) { var a; return a; }");
        assert_eq!(
            res.scopes.get(1).bindings.get("a"),
            Some(&BindingKind::Parameter)
        );
    }

    #[test]
    fn test_sticky_arguments_flag() {
        let res = resolve_src("function f() { function g() { return arguments[0]; } }");
        let g_scope = 2;
        assert!(res.scopes.get(g_scope).uses_arguments);
        assert!(res.scopes.get(1).uses_arguments);
        assert!(res.scopes.get(0).uses_arguments);
    }

    #[test]
    fn test_strict_directive_detected() {
        assert!(resolve_src("'use strict'; var a;").scopes.strict);
        assert!(!resolve_src("var a;").scopes.strict);
    }

    #[test]
    fn test_no_dangling_resolution() {
        let res = resolve_src(
            "function f(a) { var o = {k: a, [a]: 1}; o.prop = a; outer: for (var i in o) { break outer; } }",
        );
        // Every occurrence resolved; keys/properties/labels never occur.
        for occ in &res.occurrences {
            assert!(res.scopes.lookup(occ.referencing_scope, &occ.name).is_some()
                || occ.scope_id == 0);
            assert_ne!(occ.name, "k");
            assert_ne!(occ.name, "prop");
            assert_ne!(occ.name, "outer");
        }
    }

    #[test]
    fn test_shorthand_value_is_occurrence() {
        let res = resolve_src("function f(a) { return {a}; }");
        let uses: Vec<_> = res.occurrences.iter().filter(|o| o.name == "a").collect();
        // param binding + shorthand value
        assert_eq!(uses.len(), 2);
        assert!(uses.iter().all(|o| o.scope_id == 1));
    }

    #[test]
    fn test_let_const_function_scoped() {
        let res = resolve_src("function f() { { let x = 1; } return x; }");
        assert_eq!(
            res.scopes.get(1).bindings.get("x"),
            Some(&BindingKind::LexicalVar)
        );
        let last_x = res
            .occurrences
            .iter()
            .filter(|o| o.name == "x")
            .last()
            .unwrap();
        assert_eq!(last_x.scope_id, 1);
    }
}
