//! Handler discovery and the module-level safety checks.

use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::common::{Span, Spanned};
use swc_core::ecma::{
    ast::*,
    visit::{Visit, VisitWith},
};

use crate::errors::TransformError;
use crate::offsets::SourceSpans;
use crate::scope::pat_names;

/// Syntactic form of a handler, which decides the replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerForm {
    /// Arrow or function expression in any expression position.
    Expression,
    /// `function Name() {}` in statement position.
    BareDecl { name: String },
    /// `export function Name() {}`.
    ExportedDecl { name: String },
    /// `export default function Name() {}`.
    DefaultDeclNamed { name: String },
    /// `export default function () {}`.
    DefaultDeclAnon,
}

#[derive(Debug, Clone)]
pub enum HandlerFunc {
    Arrow(ArrowExpr),
    Fn {
        ident: Option<Ident>,
        function: Box<Function>,
    },
}

#[derive(Debug, Clone)]
pub struct FoundHandler {
    pub func: HandlerFunc,
    pub form: HandlerForm,
    /// Range to replace; covers the `export` wrapper for declaration forms.
    pub replace_span: Span,
}

impl FoundHandler {
    pub fn func_span(&self) -> Span {
        match &self.func {
            HandlerFunc::Arrow(arrow) => arrow.span,
            HandlerFunc::Fn { function, .. } => function.span,
        }
    }

    /// Name hoisted into module scope, for declaration forms only.
    pub fn hoisted_name(&self) -> Option<&str> {
        match &self.form {
            HandlerForm::BareDecl { name }
            | HandlerForm::ExportedDecl { name }
            | HandlerForm::DefaultDeclNamed { name } => Some(name),
            _ => None,
        }
    }
}

pub fn body_starts_with_use_client(stmts: &[Stmt]) -> bool {
    match stmts.first() {
        Some(Stmt::Expr(stmt)) => match &*stmt.expr {
            Expr::Lit(Lit::Str(s)) => s.value.as_ref() == "use client",
            _ => false,
        },
        _ => false,
    }
}

fn is_client_function(function: &Function) -> bool {
    if function.is_generator {
        return false;
    }
    match &function.body {
        Some(body) => body_starts_with_use_client(&body.stmts),
        None => false,
    }
}

fn is_client_arrow(arrow: &ArrowExpr) -> bool {
    match &*arrow.body {
        BlockStmtOrExpr::BlockStmt(block) => body_starts_with_use_client(&block.stmts),
        BlockStmtOrExpr::Expr(_) => false,
    }
}

fn span_key(span: Span) -> (u32, u32) {
    (span.lo.0, span.hi.0)
}

/// Collects every handler in source order. A matched handler's body is not
/// searched further, so handler ranges never nest.
pub fn find_handlers(module: &Module) -> Vec<FoundHandler> {
    let mut decl_forms: FxHashMap<(u32, u32), (HandlerForm, Span)> = FxHashMap::default();
    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Fn(f))) => {
                decl_forms.insert(
                    span_key(f.function.span),
                    (
                        HandlerForm::BareDecl {
                            name: f.ident.sym.to_string(),
                        },
                        f.span(),
                    ),
                );
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                if let Decl::Fn(f) = &export.decl {
                    decl_forms.insert(
                        span_key(f.function.span),
                        (
                            HandlerForm::ExportedDecl {
                                name: f.ident.sym.to_string(),
                            },
                            export.span,
                        ),
                    );
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                if let DefaultDecl::Fn(f) = &export.decl {
                    let form = match &f.ident {
                        Some(ident) => HandlerForm::DefaultDeclNamed {
                            name: ident.sym.to_string(),
                        },
                        None => HandlerForm::DefaultDeclAnon,
                    };
                    decl_forms.insert(span_key(f.function.span), (form, export.span));
                }
            }
            _ => {}
        }
    }

    let mut finder = HandlerFinder {
        decl_forms,
        handlers: Vec::new(),
        seen: FxHashSet::default(),
    };
    module.visit_with(&mut finder);
    finder.handlers.sort_by_key(|h| h.replace_span.lo.0);
    finder.handlers
}

struct HandlerFinder {
    decl_forms: FxHashMap<(u32, u32), (HandlerForm, Span)>,
    handlers: Vec<FoundHandler>,
    seen: FxHashSet<(u32, u32)>,
}

impl HandlerFinder {
    /// Returns true when the node was taken as a handler (no further descent).
    fn take_fn(&mut self, ident: Option<&Ident>, function: &Function, fallback: Span) -> bool {
        if !is_client_function(function) {
            return false;
        }
        let key = span_key(function.span);
        if !self.seen.insert(key) {
            return true;
        }
        let (form, replace_span) = self
            .decl_forms
            .get(&key)
            .cloned()
            .unwrap_or_else(|| match ident {
                Some(ident) => (
                    HandlerForm::BareDecl {
                        name: ident.sym.to_string(),
                    },
                    fallback,
                ),
                None => (HandlerForm::Expression, fallback),
            });
        self.handlers.push(FoundHandler {
            func: HandlerFunc::Fn {
                ident: ident.cloned(),
                function: Box::new(function.clone()),
            },
            form,
            replace_span,
        });
        true
    }
}

impl Visit for HandlerFinder {
    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        if is_client_arrow(n) {
            if self.seen.insert(span_key(n.span)) {
                self.handlers.push(FoundHandler {
                    func: HandlerFunc::Arrow(n.clone()),
                    form: HandlerForm::Expression,
                    replace_span: n.span,
                });
            }
            return;
        }
        n.visit_children_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        // An expression-position function; the map reroutes the `export
        // default function` shape to its declaration form.
        let taken = if self.decl_forms.contains_key(&span_key(n.function.span)) {
            self.take_fn(n.ident.as_ref(), &n.function, n.span())
        } else if is_client_function(&n.function) {
            let key = span_key(n.function.span);
            if self.seen.insert(key) {
                self.handlers.push(FoundHandler {
                    func: HandlerFunc::Fn {
                        ident: n.ident.clone(),
                        function: n.function.clone(),
                    },
                    form: HandlerForm::Expression,
                    replace_span: n.span(),
                });
            }
            true
        } else {
            false
        };
        if !taken {
            n.visit_children_with(self);
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        if !self.take_fn(Some(&n.ident), &n.function, n.span()) {
            n.visit_children_with(self);
        }
    }
}

/// Rejects any non-type-only import with zero specifiers: a globally ordered
/// effect that can neither be hoisted into nor erased from a client module.
pub fn check_side_effect_imports(
    module: &Module,
    src: &str,
    spans: &SourceSpans,
    id: &str,
) -> Result<(), TransformError> {
    for item in &module.body {
        if let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item {
            if import.specifiers.is_empty() && !import.type_only {
                let statement = spans
                    .range(import.span)
                    .map(|range| src[range].to_string())
                    .unwrap_or_else(|| format!("import \"{}\";", import.src.value));
                return Err(TransformError::SideEffectImport {
                    id: id.to_string(),
                    statement,
                });
            }
        }
    }
    Ok(())
}

/// Rejects call / `new` / tagged-template use of a name that extraction will
/// rebind to a URL string. Occurrences under a shadowing binder and inside
/// the handler itself are fine.
pub fn check_callable_misuse(
    module: &Module,
    handlers: &[FoundHandler],
    id: &str,
) -> Result<(), TransformError> {
    for handler in handlers {
        let name = match handler.hoisted_name() {
            Some(name) => name,
            None => continue,
        };
        let mut finder = CallableUseFinder {
            name,
            skip: handler.replace_span,
            shadowed: 0,
            found: None,
        };
        module.visit_with(&mut finder);
        if let Some(use_kind) = finder.found {
            return Err(TransformError::UnsafeCallable {
                id: id.to_string(),
                name: name.to_string(),
                use_kind,
            });
        }
    }
    Ok(())
}

struct CallableUseFinder<'a> {
    name: &'a str,
    skip: Span,
    shadowed: usize,
    found: Option<&'static str>,
}

impl CallableUseFinder<'_> {
    fn in_skip(&self, span: Span) -> bool {
        span.lo.0 >= self.skip.lo.0 && span.hi.0 <= self.skip.hi.0
    }

    fn pat_binds(&self, pat: &Pat) -> bool {
        let mut names = Vec::new();
        pat_names(pat, &mut names);
        names.iter().any(|n| n == self.name)
    }

    fn stmts_bind(&self, stmts: &[Stmt]) -> bool {
        stmts.iter().any(|stmt| match stmt {
            Stmt::Decl(Decl::Fn(f)) => f.ident.sym.as_ref() == self.name,
            Stmt::Decl(Decl::Class(c)) => c.ident.sym.as_ref() == self.name,
            Stmt::Decl(Decl::Var(var)) => var.decls.iter().any(|d| self.pat_binds(&d.name)),
            Stmt::Decl(Decl::TsEnum(e)) => e.id.sym.as_ref() == self.name,
            _ => false,
        })
    }

    fn scoped(&mut self, shadow: bool, f: impl FnOnce(&mut Self)) {
        if shadow {
            self.shadowed += 1;
        }
        f(self);
        if shadow {
            self.shadowed -= 1;
        }
    }

    fn is_target(&self, expr: &Expr) -> bool {
        if self.shadowed > 0 {
            return false;
        }
        matches!(expr, Expr::Ident(ident) if ident.sym.as_ref() == self.name)
    }
}

impl Visit for CallableUseFinder<'_> {
    fn visit_call_expr(&mut self, n: &CallExpr) {
        if self.found.is_some() {
            return;
        }
        if let Callee::Expr(callee) = &n.callee {
            if self.is_target(callee) {
                self.found = Some("call target");
                return;
            }
        }
        n.visit_children_with(self);
    }

    fn visit_new_expr(&mut self, n: &NewExpr) {
        if self.found.is_some() {
            return;
        }
        if self.is_target(&n.callee) {
            self.found = Some("constructor target");
            return;
        }
        n.visit_children_with(self);
    }

    fn visit_tagged_tpl(&mut self, n: &TaggedTpl) {
        if self.found.is_some() {
            return;
        }
        if self.is_target(&n.tag) {
            self.found = Some("tagged-template target");
            return;
        }
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, n: &Function) {
        if self.in_skip(n.span) {
            return;
        }
        let shadow = n.params.iter().any(|p| self.pat_binds(&p.pat));
        self.scoped(shadow, |s| n.visit_children_with(s));
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        if self.in_skip(n.span) {
            return;
        }
        let shadow = n.params.iter().any(|p| self.pat_binds(p));
        self.scoped(shadow, |s| n.visit_children_with(s));
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        let shadow = n
            .ident
            .as_ref()
            .map(|i| i.sym.as_ref() == self.name)
            .unwrap_or(false);
        self.scoped(shadow, |s| n.visit_children_with(s));
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        let shadow = n
            .ident
            .as_ref()
            .map(|i| i.sym.as_ref() == self.name)
            .unwrap_or(false);
        self.scoped(shadow, |s| n.visit_children_with(s));
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        let shadow = self.stmts_bind(&n.stmts);
        self.scoped(shadow, |s| n.visit_children_with(s));
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        let shadow = n.param.as_ref().map(|p| self.pat_binds(p)).unwrap_or(false);
        self.scoped(shadow, |s| n.visit_children_with(s));
    }
}
