//! Per-module import and top-level declaration indexes.
//!
//! Both tables keep verbatim source slices: the synthesized client module
//! re-emits the original statements rather than reprinting them, which
//! preserves side effects within an import statement and every formatting
//! detail of a carried declaration.

use rustc_hash::{FxHashMap, FxHashSet};
use swc_core::common::Spanned;
use swc_core::ecma::ast::*;

use crate::offsets::{include_trailing_semi, SourceSpans};
use crate::scope::{collect_free, pat_names};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Default,
    Named,
    Namespace,
}

#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub kind: ImportKind,
    /// Verbatim slice of the whole import statement.
    pub statement: String,
    /// Source order of the statement, for stable output ordering.
    pub order: usize,
}

/// Value-bringing import bindings, keyed by local name. Type-only imports and
/// type-only specifiers never appear.
#[derive(Default)]
pub struct ImportTable {
    by_local: FxHashMap<String, ImportEntry>,
}

impl ImportTable {
    pub fn build(module: &Module, src: &str, spans: &SourceSpans) -> Self {
        let mut table = Self::default();
        for (order, item) in module.body.iter().enumerate() {
            let import = match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import,
                _ => continue,
            };
            if import.type_only || import.specifiers.is_empty() {
                continue;
            }
            let range = match spans.range(import.span) {
                Some(range) => range,
                None => continue,
            };
            let end = include_trailing_semi(src, range.end);
            let statement = &src[range.start..end];

            for spec in &import.specifiers {
                let (local, kind) = match spec {
                    ImportSpecifier::Named(named) if !named.is_type_only => {
                        (&named.local, ImportKind::Named)
                    }
                    ImportSpecifier::Named(_) => continue,
                    ImportSpecifier::Default(default) => (&default.local, ImportKind::Default),
                    ImportSpecifier::Namespace(ns) => (&ns.local, ImportKind::Namespace),
                };
                table.by_local.insert(
                    local.sym.to_string(),
                    ImportEntry {
                        kind,
                        statement: statement.to_string(),
                        order,
                    },
                );
            }
        }
        table
    }

    pub fn get(&self, local: &str) -> Option<&ImportEntry> {
        self.by_local.get(local)
    }

    pub fn len(&self) -> usize {
        self.by_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_local.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DeclEntry {
    /// Verbatim slice of the declaration, export wrapper excluded.
    pub source: String,
    /// Names this declaration introduces.
    pub declared: FxHashSet<String>,
    /// Free names used inside the declaration, its own bindings excluded.
    pub deps: FxHashSet<String>,
    pub order: usize,
}

/// Top-level value declarations keyed by every name they introduce. One
/// declaration may sit under several keys (destructuring).
#[derive(Default)]
pub struct DeclTable {
    entries: Vec<DeclEntry>,
    by_name: FxHashMap<String, usize>,
}

impl DeclTable {
    pub fn build(module: &Module, src: &str, spans: &SourceSpans) -> Self {
        let mut table = Self::default();
        for (order, item) in module.body.iter().enumerate() {
            match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => table.add_decl(decl, src, spans, order),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    table.add_decl(&export.decl, src, spans, order)
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                    table.add_default_decl(&export.decl, src, spans, order)
                }
                _ => {}
            }
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<(usize, &DeclEntry)> {
        let index = *self.by_name.get(name)?;
        Some((index, &self.entries[index]))
    }

    pub fn entry(&self, index: usize) -> &DeclEntry {
        &self.entries[index]
    }

    fn add_decl(&mut self, decl: &Decl, src: &str, spans: &SourceSpans, order: usize) {
        let mut declared: Vec<String> = Vec::new();
        match decl {
            Decl::Fn(f) if !f.declare => declared.push(f.ident.sym.to_string()),
            Decl::Class(c) if !c.declare => declared.push(c.ident.sym.to_string()),
            Decl::Var(var) if !var.declare => {
                for declarator in &var.decls {
                    pat_names(&declarator.name, &mut declared);
                }
            }
            Decl::TsEnum(e) if !e.declare => declared.push(e.id.sym.to_string()),
            _ => return,
        }
        if declared.is_empty() {
            return;
        }

        let range = match spans.range(decl.span()) {
            Some(range) => range,
            None => return,
        };
        let end = include_trailing_semi(src, range.end);
        let seed: FxHashSet<String> = declared.iter().cloned().collect();
        let deps = collect_free(decl, seed.clone());

        self.insert(declared, seed, deps, src[range.start..end].to_string(), order);
    }

    fn add_default_decl(
        &mut self,
        decl: &DefaultDecl,
        src: &str,
        spans: &SourceSpans,
        order: usize,
    ) {
        let (name, deps, span) = match decl {
            DefaultDecl::Fn(f) => match &f.ident {
                Some(ident) => {
                    let mut seed = FxHashSet::default();
                    seed.insert(ident.sym.to_string());
                    (ident.sym.to_string(), collect_free(f, seed), f.span())
                }
                None => return,
            },
            DefaultDecl::Class(c) => match &c.ident {
                Some(ident) => {
                    let mut seed = FxHashSet::default();
                    seed.insert(ident.sym.to_string());
                    (ident.sym.to_string(), collect_free(c, seed), c.span())
                }
                None => return,
            },
            DefaultDecl::TsInterfaceDecl(_) => return,
        };
        let range = match spans.range(span) {
            Some(range) => range,
            None => return,
        };
        let mut declared = FxHashSet::default();
        declared.insert(name.clone());
        self.insert(
            vec![name],
            declared,
            deps,
            src[range.clone()].to_string(),
            order,
        );
    }

    fn insert(
        &mut self,
        names: Vec<String>,
        declared: FxHashSet<String>,
        deps: FxHashSet<String>,
        source: String,
        order: usize,
    ) {
        let index = self.entries.len();
        self.entries.push(DeclEntry {
            source,
            declared,
            deps,
            order,
        });
        for name in names {
            self.by_name.insert(name, index);
        }
    }
}
