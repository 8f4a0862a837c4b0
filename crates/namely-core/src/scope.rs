//! Scope tree and rename-safety bookkeeping.
//!
//! The tree is an arena of scope records indexed by id. Children hold the
//! parent's index rather than an owning reference, so upward walks are cheap
//! and there are no cycles. Ids are assigned in traversal pre-order: a child's
//! id is always greater than its parent's, and the parent chain from any scope
//! is its unique lexical enclosing chain.

use std::collections::{BTreeSet, HashMap, HashSet};

pub type ScopeId = usize;

/// The root scope. Names resolving here are globals and never renamed.
pub const ROOT_SCOPE: ScopeId = 0;

/// How a name was introduced into its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Function or arrow parameter.
    Parameter,
    /// Function declaration name, hoisted into the enclosing scope.
    FunctionHoisted,
    /// `var`/`let`/`const` declaration (function-scoped for analysis).
    LexicalVar,
    /// Named function expression's self-name, held in its own wrapper scope.
    LambdaSelf,
    /// Caught exception name.
    CatchParam,
    /// Name with no declaration anywhere; registered in the root scope.
    ImplicitGlobal,
}

/// One lexical binding context.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub bindings: HashMap<String, BindingKind>,
    pub is_catch: bool,
    /// Sticky: set on this scope and every ancestor when `eval` is referenced.
    pub uses_eval: bool,
    /// Sticky: set on this scope and every ancestor when `arguments` is referenced.
    pub uses_arguments: bool,

    /// For each name bound here, the scopes (self included) that referenced it.
    used_in_scope: HashMap<String, BTreeSet<ScopeId>>,
    /// Names visible in this scope (root-resolved originals, or committed new
    /// names) mapped to the id of the scope that owns them.
    resolved_origin: HashMap<String, ScopeId>,
    /// Committed renames: old name (or self-name key) to new name.
    assigned_new_names: HashMap<String, String>,
    /// New names already committed in this scope.
    reserved_new_names: HashSet<String>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>, is_catch: bool) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            bindings: HashMap::new(),
            is_catch,
            uses_eval: false,
            uses_arguments: false,
            used_in_scope: HashMap::new(),
            resolved_origin: HashMap::new(),
            assigned_new_names: HashMap::new(),
            reserved_new_names: HashSet::new(),
        }
    }
}

/// Options for the rename-safety predicate.
#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    /// The chain walk of rule 3 stops below the target scope by default. When
    /// set, the target scope's own committed names are checked as well.
    pub strict_chain_boundary: bool,
}

/// Arena of scopes plus the usage index the safety predicate consults.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    /// Whether the program opened with a `"use strict"` directive.
    pub strict: bool,
}

impl ScopeTree {
    /// Create a tree containing only the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ROOT_SCOPE, None, false)],
            strict: false,
        }
    }

    /// Create a child scope. Calling this during a pre-order traversal yields
    /// pre-order ids.
    pub fn push_scope(&mut self, parent: ScopeId, is_catch: bool) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(id, Some(parent), is_catch));
        self.scopes[parent].children.push(id);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Register a binding. Non-catch declarations walk up out of catch scopes
    /// first (function-level var semantics). An existing `Parameter` binding
    /// is never overwritten by a later registration.
    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: BindingKind) {
        let mut target = scope;
        if kind != BindingKind::CatchParam {
            while self.scopes[target].is_catch {
                match self.scopes[target].parent {
                    Some(parent) => target = parent,
                    None => break,
                }
            }
        }
        let bindings = &mut self.scopes[target].bindings;
        if bindings.get(name) != Some(&BindingKind::Parameter) {
            bindings.insert(name.to_string(), kind);
        }
    }

    /// Register a name the resolver could not find anywhere; it becomes an
    /// implicit global in the root scope. Existing root bindings are kept.
    pub fn declare_implicit_global(&mut self, name: &str) {
        self.scopes[ROOT_SCOPE]
            .bindings
            .entry(name.to_string())
            .or_insert(BindingKind::ImplicitGlobal);
    }

    /// Walk the parent chain from `from` looking for a binding of `name`.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.scopes[id].bindings.contains_key(name) {
                return Some(id);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    /// Sticky `eval` flag: set on `from` and every ancestor.
    pub fn mark_eval(&mut self, from: ScopeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            self.scopes[id].uses_eval = true;
            current = self.scopes[id].parent;
        }
    }

    /// Sticky `arguments` flag: set on `from` and every ancestor.
    pub fn mark_arguments(&mut self, from: ScopeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            self.scopes[id].uses_arguments = true;
            current = self.scopes[id].parent;
        }
    }

    /// Record a resolved reference into the usage index. Root-resolved names
    /// additionally mark the referencing scope as seeing a global of that name.
    pub fn record_use(&mut self, resolved: ScopeId, name: &str, referencing: ScopeId) {
        self.scopes[resolved]
            .used_in_scope
            .entry(name.to_string())
            .or_default()
            .insert(referencing);
        if resolved == ROOT_SCOPE {
            self.scopes[referencing]
                .resolved_origin
                .insert(name.to_string(), ROOT_SCOPE);
        }
    }

    /// The scopes that referenced `name` bound at `scope`.
    pub fn uses_of(&self, scope: ScopeId, name: &str) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes[scope]
            .used_in_scope
            .get(name)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Key under which a binding's rename is stored. Function-expression
    /// self-names live in a distinguished namespace so a function's own name
    /// and a same-named outer variable never collide in the lookup.
    fn rename_key(&self, scope: ScopeId, name: &str) -> String {
        match self.scopes[scope].bindings.get(name) {
            Some(BindingKind::LambdaSelf) => format!("$FUNC${name}"),
            _ => name.to_string(),
        }
    }

    /// The committed replacement for `name` bound at `scope`, if any.
    pub fn committed_name(&self, scope: ScopeId, name: &str) -> Option<&str> {
        let key = self.rename_key(scope, name);
        self.scopes[scope]
            .assigned_new_names
            .get(&key)
            .map(String::as_str)
    }

    /// The rename-safety predicate. Returns false when committing
    /// `original -> new_name` at `scope` could change what any identifier in
    /// the program resolves to.
    pub fn can_assign(
        &self,
        scope: ScopeId,
        new_name: &str,
        original: &str,
        options: &RenameOptions,
    ) -> bool {
        // Rule 1: `arguments` is unassignable under strict-mode semantics.
        if self.strict && new_name == "arguments" {
            return false;
        }

        // Rule 2: sweep every scope at or below the declaring scope for a
        // live occurrence of `new_name` — an untouched original binding, a
        // global reference, or a name another variable already committed to.
        let declaring = self.lookup(scope, original).unwrap_or(scope);
        if self.name_live_below(declaring, new_name, original) {
            return false;
        }

        // Rule 3: for every scope that referenced `original`, walk up toward
        // `scope`; a committed `new_name` on the way means a different
        // variable already claimed that text along a chain where both stay
        // visible.
        if let Some(uses) = self.scopes[declaring].used_in_scope.get(original) {
            for &use_scope in uses {
                if use_scope == scope {
                    continue;
                }
                let mut current = use_scope;
                while current != scope {
                    if self.scopes[current].reserved_new_names.contains(new_name) {
                        return false;
                    }
                    match self.scopes[current].parent {
                        Some(parent) => current = parent,
                        None => break,
                    }
                }
            }
        }
        if options.strict_chain_boundary
            && self.scopes[scope].reserved_new_names.contains(new_name)
        {
            return false;
        }

        true
    }

    /// Recursive descendant sweep for rule 2.
    ///
    /// The binding check is skipped when keeping the original name: bindings
    /// of that name below were already legally shadowing before any rename.
    fn name_live_below(&self, scope: ScopeId, new_name: &str, original: &str) -> bool {
        let s = &self.scopes[scope];
        if s.resolved_origin.contains_key(new_name) {
            return true;
        }
        if new_name != original && s.bindings.contains_key(new_name) {
            let key = self.rename_key(scope, new_name);
            if !s.assigned_new_names.contains_key(&key) {
                return true;
            }
        }
        s.children
            .iter()
            .any(|&child| self.name_live_below(child, new_name, original))
    }

    /// Commit a rename and propagate the new name into every scope that
    /// referenced the original, so later `can_assign` checks see it.
    pub fn commit_rename(&mut self, scope: ScopeId, original: &str, new_name: &str) {
        let key = self.rename_key(scope, original);
        self.scopes[scope]
            .assigned_new_names
            .insert(key, new_name.to_string());
        self.scopes[scope]
            .reserved_new_names
            .insert(new_name.to_string());

        let uses: Vec<ScopeId> = self
            .scopes[scope]
            .used_in_scope
            .get(original)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for use_scope in uses {
            self.scopes[use_scope]
                .resolved_origin
                .insert(new_name.to_string(), scope);
        }
        self.scopes[scope]
            .resolved_origin
            .insert(new_name.to_string(), scope);
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
