//! Client-module synthesis for one handler.
//!
//! The handler itself is reprinted (directive stripped, declarations
//! reshaped to expressions) while everything it drags along, imports and
//! top-level declarations, is carried verbatim from the original source.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rustc_hash::FxHashSet;
use swc_core::common::{
    comments::{Comments, SingleThreadedComments},
    sync::Lrc,
    SourceMap, DUMMY_SP,
};
use swc_core::ecma::ast::*;
use swc_core::ecma::codegen::{self, text_writer::JsWriter, Emitter, Node};

use crate::handlers::{body_starts_with_use_client, FoundHandler, HandlerFunc};
use crate::scope::collect_free;
use crate::tables::{DeclTable, ImportTable};

pub struct SynthesizedModule {
    pub code: String,
    /// Free names with no import, declaration, or global behind them; the
    /// policy engine decides what happens to these.
    pub unresolved: Vec<String>,
}

pub fn synthesize(
    handler: &FoundHandler,
    imports: &ImportTable,
    decls: &DeclTable,
    globals: &FxHashSet<String>,
    cm: Lrc<SourceMap>,
    comments: &SingleThreadedComments,
) -> Result<SynthesizedModule, String> {
    let free = match &handler.func {
        HandlerFunc::Arrow(arrow) => collect_free(arrow, FxHashSet::default()),
        HandlerFunc::Fn { ident, function } => {
            let mut seed = FxHashSet::default();
            if let Some(ident) = ident {
                seed.insert(ident.sym.to_string());
            }
            collect_free(function.as_ref(), seed)
        }
    };

    // Transitive closure over the tables. Imports are terminal; declarations
    // enqueue their own deps, each declaration included once.
    let mut queue: VecDeque<String> = free
        .iter()
        .filter(|name| !globals.contains(*name))
        .cloned()
        .collect();
    let mut seen: FxHashSet<String> = queue.iter().cloned().collect();
    let mut needed_imports: BTreeMap<usize, String> = BTreeMap::new();
    let mut needed_decls: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut unresolved: Vec<String> = Vec::new();

    while let Some(name) = queue.pop_front() {
        if let Some(entry) = imports.get(&name) {
            needed_imports.insert(entry.order, entry.statement.clone());
        } else if let Some((index, entry)) = decls.get(&name) {
            if needed_decls.insert((entry.order, index)) {
                for dep in &entry.deps {
                    if !globals.contains(dep) && seen.insert(dep.clone()) {
                        queue.push_back(dep.clone());
                    }
                }
            }
        } else {
            unresolved.push(name);
        }
    }
    unresolved.sort();
    unresolved.dedup();

    let printed = print_default_export(handler, cm, comments)?;

    let mut out = String::new();
    out.push_str("\"use client\";\n\n");
    if !needed_imports.is_empty() {
        for statement in needed_imports.values() {
            out.push_str(statement.trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    for (_, index) in &needed_decls {
        out.push_str(decls.entry(*index).source.trim_end());
        out.push_str("\n\n");
    }
    out.push_str(printed.trim_end());
    out.push('\n');

    Ok(SynthesizedModule {
        code: out,
        unresolved,
    })
}

fn strip_directive(body: &mut BlockStmt) {
    if body_starts_with_use_client(&body.stmts) {
        body.stmts.remove(0);
    }
}

/// Prints the handler as the default export of a synthetic module. Function
/// declarations are reshaped into (named) function expressions; TS syntax
/// and JSX survive the printer.
fn print_default_export(
    handler: &FoundHandler,
    cm: Lrc<SourceMap>,
    comments: &SingleThreadedComments,
) -> Result<String, String> {
    let item = match &handler.func {
        HandlerFunc::Arrow(arrow) => {
            let mut arrow = arrow.clone();
            if let BlockStmtOrExpr::BlockStmt(block) = &mut *arrow.body {
                strip_directive(block);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(ExportDefaultExpr {
                span: DUMMY_SP,
                expr: Box::new(Expr::Arrow(arrow)),
            }))
        }
        HandlerFunc::Fn { ident, function } => {
            let mut function = function.clone();
            if let Some(body) = &mut function.body {
                strip_directive(body);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                span: DUMMY_SP,
                decl: DefaultDecl::Fn(FnExpr {
                    ident: ident.clone(),
                    function,
                }),
            }))
        }
    };

    let module = Module {
        span: DUMMY_SP,
        body: vec![item],
        shebang: None,
    };

    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: codegen::Config::default(),
            cm: cm.clone(),
            comments: Some(comments as &dyn Comments),
            wr: JsWriter::new(cm, "\n", &mut buf, None),
        };
        module.emit_with(&mut emitter).map_err(|err| err.to_string())?;
    }
    String::from_utf8(buf).map_err(|err| err.to_string())
}
