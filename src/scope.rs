//! Scope-aware free-identifier collection.
//!
//! [`FreeVarScanner`] walks any subtree with an explicit stack of lexical
//! scopes and records every identifier referenced as a value but not bound in
//! an enclosing scope. Type-only constructs contribute nothing; value-bearing
//! TS wrappers (`as`, `satisfies`, non-null, instantiation) contribute the
//! references of their inner expression through normal traversal.

use rustc_hash::FxHashSet;
use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

/// Collects the names introduced by a binding pattern, without touching the
/// pattern's value expressions.
pub fn pat_names(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(binding) => out.push(binding.id.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pat_names(elem, out);
            }
        }
        Pat::Rest(rest) => pat_names(&rest.arg, out),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(assign.key.id.sym.to_string()),
                    ObjectPatProp::Rest(rest) => pat_names(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => pat_names(&assign.left, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

/// Runs the scanner over `node` with `seed` as the outermost scope and
/// returns every free name, in no particular order.
pub fn collect_free<N>(node: &N, seed: FxHashSet<String>) -> FxHashSet<String>
where
    N: VisitWith<FreeVarScanner>,
{
    let mut scanner = FreeVarScanner::with_scope(seed);
    node.visit_with(&mut scanner);
    scanner.into_free()
}

pub struct FreeVarScanner {
    scopes: Vec<FxHashSet<String>>,
    free: FxHashSet<String>,
}

impl FreeVarScanner {
    pub fn with_scope(seed: FxHashSet<String>) -> Self {
        Self {
            scopes: vec![seed],
            free: FxHashSet::default(),
        }
    }

    pub fn into_free(self) -> FxHashSet<String> {
        self.free
    }

    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn reference(&mut self, name: &str) {
        if !self.is_bound(name) {
            self.free.insert(name.to_string());
        }
    }

    fn declare(&mut self, name: &str) {
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name.to_string());
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares the pattern's names in the innermost scope and analyzes its
    /// value expressions (defaults, computed keys). Processed left to right
    /// so later defaults see earlier bindings.
    fn bind_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(binding) => self.declare(binding.id.sym.as_ref()),
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.bind_pat(elem);
                }
            }
            Pat::Rest(rest) => self.bind_pat(&rest.arg),
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            if let PropName::Computed(computed) = &kv.key {
                                computed.expr.visit_with(self);
                            }
                            self.bind_pat(&kv.value);
                        }
                        ObjectPatProp::Assign(assign) => {
                            if let Some(default) = &assign.value {
                                default.visit_with(self);
                            }
                            self.declare(assign.key.id.sym.as_ref());
                        }
                        ObjectPatProp::Rest(rest) => self.bind_pat(&rest.arg),
                    }
                }
            }
            Pat::Assign(assign) => {
                assign.right.visit_with(self);
                self.bind_pat(&assign.left);
            }
            // Assignment-target position: a reference, not a declaration.
            Pat::Expr(expr) => expr.visit_with(self),
            Pat::Invalid(_) => {}
        }
    }

    /// Seeds a scope with the names a statement list declares, so in-block
    /// use-before-declaration does not leak as a free name.
    fn seed_hoisted(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Decl(decl) = stmt {
                self.seed_decl(decl);
            }
        }
    }

    fn seed_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Fn(f) => self.declare(f.ident.sym.as_ref()),
            Decl::Class(c) => self.declare(c.ident.sym.as_ref()),
            Decl::Var(var) => {
                let mut names = Vec::new();
                for declarator in &var.decls {
                    pat_names(&declarator.name, &mut names);
                }
                for name in names {
                    self.declare(&name);
                }
            }
            Decl::TsEnum(e) => self.declare(e.id.sym.as_ref()),
            _ => {}
        }
    }

    fn jsx_name(&mut self, name: &JSXElementName) {
        match name {
            // Lowercase tags are intrinsic elements, not value references.
            JSXElementName::Ident(ident) => {
                let is_component = ident
                    .sym
                    .chars()
                    .next()
                    .map(|c| !c.is_ascii_lowercase())
                    .unwrap_or(false);
                if is_component {
                    self.reference(ident.sym.as_ref());
                }
            }
            JSXElementName::JSXMemberExpr(member) => {
                let mut obj = &member.obj;
                while let JSXObject::JSXMemberExpr(inner) = obj {
                    obj = &inner.obj;
                }
                if let JSXObject::Ident(root) = obj {
                    self.reference(root.sym.as_ref());
                }
            }
            JSXElementName::JSXNamespacedName(_) => {}
        }
    }
}

impl Visit for FreeVarScanner {
    fn visit_ident(&mut self, n: &Ident) {
        self.reference(n.sym.as_ref());
    }

    // ---- positions where an identifier is not a value reference ----

    fn visit_member_expr(&mut self, n: &MemberExpr) {
        n.obj.visit_with(self);
        if let MemberProp::Computed(computed) = &n.prop {
            computed.expr.visit_with(self);
        }
    }

    fn visit_labeled_stmt(&mut self, n: &LabeledStmt) {
        n.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_import_decl(&mut self, _: &ImportDecl) {}

    fn visit_export_specifier(&mut self, _: &ExportSpecifier) {}

    // ---- type-only constructs contribute nothing ----

    fn visit_ts_type(&mut self, _: &TsType) {}

    fn visit_ts_type_ann(&mut self, _: &TsTypeAnn) {}

    fn visit_ts_type_param_decl(&mut self, _: &TsTypeParamDecl) {}

    fn visit_ts_type_param_instantiation(&mut self, _: &TsTypeParamInstantiation) {}

    fn visit_ts_interface_decl(&mut self, _: &TsInterfaceDecl) {}

    fn visit_ts_type_alias_decl(&mut self, _: &TsTypeAliasDecl) {}

    fn visit_ts_expr_with_type_args(&mut self, _: &TsExprWithTypeArgs) {}

    fn visit_ts_import_equals_decl(&mut self, _: &TsImportEqualsDecl) {}

    fn visit_ts_module_decl(&mut self, _: &TsModuleDecl) {}

    // ---- scope-introducing constructs ----

    fn visit_module(&mut self, n: &Module) {
        self.push_scope();
        for item in &n.body {
            match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => self.seed_decl(decl),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    self.seed_decl(&export.decl)
                }
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    for spec in &import.specifiers {
                        match spec {
                            ImportSpecifier::Named(named) => self.declare(named.local.sym.as_ref()),
                            ImportSpecifier::Default(default) => {
                                self.declare(default.local.sym.as_ref())
                            }
                            ImportSpecifier::Namespace(ns) => self.declare(ns.local.sym.as_ref()),
                        }
                    }
                }
                _ => {}
            }
        }
        n.body.visit_with(self);
        self.pop_scope();
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.push_scope();
        self.seed_hoisted(&n.stmts);
        n.stmts.visit_with(self);
        self.pop_scope();
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        self.push_scope();
        if let Some(param) = &n.param {
            self.bind_pat(param);
        }
        n.body.visit_with(self);
        self.pop_scope();
    }

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        // Names were hoisted into the enclosing scope already; this pass adds
        // loop-head declarators and analyzes defaults and the initializer.
        self.bind_pat(&n.name);
        if let Some(init) = &n.init {
            init.visit_with(self);
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.push_scope();
        self.declare(n.ident.sym.as_ref());
        n.function.visit_with(self);
        self.pop_scope();
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        self.push_scope();
        if let Some(ident) = &n.ident {
            self.declare(ident.sym.as_ref());
        }
        n.function.visit_with(self);
        self.pop_scope();
    }

    fn visit_function(&mut self, n: &Function) {
        n.decorators.visit_with(self);
        self.push_scope();
        for param in &n.params {
            param.decorators.visit_with(self);
            self.bind_pat(&param.pat);
        }
        if let Some(body) = &n.body {
            body.visit_with(self);
        }
        self.pop_scope();
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.push_scope();
        for pat in &n.params {
            self.bind_pat(pat);
        }
        match &*n.body {
            BlockStmtOrExpr::BlockStmt(block) => block.visit_with(self),
            BlockStmtOrExpr::Expr(expr) => expr.visit_with(self),
        }
        self.pop_scope();
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        self.push_scope();
        for param in &n.params {
            match param {
                ParamOrTsParamProp::Param(param) => self.bind_pat(&param.pat),
                ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                    TsParamPropParam::Ident(binding) => self.declare(binding.id.sym.as_ref()),
                    TsParamPropParam::Assign(assign) => {
                        assign.right.visit_with(self);
                        self.bind_pat(&assign.left);
                    }
                },
            }
        }
        if let Some(body) = &n.body {
            body.visit_with(self);
        }
        self.pop_scope();
    }

    fn visit_setter_prop(&mut self, n: &SetterProp) {
        if let PropName::Computed(computed) = &n.key {
            computed.expr.visit_with(self);
        }
        self.push_scope();
        self.bind_pat(&n.param);
        if let Some(body) = &n.body {
            body.visit_with(self);
        }
        self.pop_scope();
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.push_scope();
        self.declare(n.ident.sym.as_ref());
        n.class.visit_with(self);
        self.pop_scope();
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        self.push_scope();
        if let Some(ident) = &n.ident {
            self.declare(ident.sym.as_ref());
        }
        n.class.visit_with(self);
        self.pop_scope();
    }

    fn visit_ts_enum_decl(&mut self, n: &TsEnumDecl) {
        self.push_scope();
        self.declare(n.id.sym.as_ref());
        // Members see the enum name and each other.
        for member in &n.members {
            if let TsEnumMemberId::Ident(ident) = &member.id {
                self.declare(ident.sym.as_ref());
            }
        }
        for member in &n.members {
            if let Some(init) = &member.init {
                init.visit_with(self);
            }
        }
        self.pop_scope();
    }

    // ---- JSX names ----

    fn visit_jsx_opening_element(&mut self, n: &JSXOpeningElement) {
        self.jsx_name(&n.name);
        n.attrs.visit_with(self);
    }

    fn visit_jsx_closing_element(&mut self, _: &JSXClosingElement) {}
}
