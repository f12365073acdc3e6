//! Directive-driven code splitting for a server/client module graph.
//!
//! The plugin scans otherwise-server modules for inline functions whose body
//! opens with a `"use client"` directive, lifts each one into a standalone
//! client module carrying exactly the imports and top-level declarations it
//! transitively needs, asks the host bundler to emit a chunk for it, and
//! splices a `new URL(import.meta.<RefToken>).pathname` expression where the
//! handler used to be.
//!
//! The host bundler stays behind the [`Host`] trait; the plugin exposes the
//! usual three hooks plus a build-start lifecycle:
//!
//! - [`UseClientPlugin::transform`] rewrites one module and emits its chunks.
//! - [`UseClientPlugin::resolve_id`] routes imports originating from
//!   synthesized inline modules.
//! - [`UseClientPlugin::load`] serves the synthesized module text.
//! - [`UseClientPlugin::build_start`] clears the per-instance registry.

pub mod errors;
pub mod globals;
pub mod handlers;
pub mod host;
pub mod naming;
pub mod offsets;
pub mod parse;
pub mod rewrite;
pub mod scope;
pub mod synth;
pub mod tables;

use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Deserialize;

pub use crate::errors::{ConfigError, TransformError, UnresolvedPolicy};
pub use crate::host::{EmittedChunkRequest, Host, RefToken, ResolvedId};

use crate::globals::DEFAULT_GLOBALS;
use crate::handlers::HandlerForm;
use crate::offsets::SourceSpans;
use crate::rewrite::Replacement;

const DEFAULT_INCLUDE: &str = r"\.[cm]?[jt]sx?$";

pub type DebugLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Plugin configuration, deserialized from the host's JSON config.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginOptions {
    /// Additional include patterns, combined with the default
    /// `\.[cm]?[jt]sx?$` filter.
    pub include: Vec<String>,
    /// Additional exclude patterns, combined with the default
    /// `node_modules` exclusion.
    pub exclude: Vec<String>,
    pub debug: bool,
    /// Defaults to `warn`, or `error` when `strict` is set.
    pub unresolved: Option<UnresolvedPolicy>,
    pub strict: bool,
    /// Overrides the curated globals list wholesale.
    pub globals: Option<Vec<String>>,
}

/// Rewritten module text plus the chunks emitted while producing it.
#[derive(Debug)]
pub struct TransformOutput {
    pub code: String,
    /// No source map is produced for the rewritten server module.
    pub map: Option<String>,
    pub chunks: Vec<EmittedChunk>,
}

#[derive(Debug, Clone)]
pub struct EmittedChunk {
    pub id: String,
    pub file_name: String,
    pub token: RefToken,
}

#[derive(Debug)]
pub struct LoadOutput {
    pub code: String,
    pub map: Option<String>,
    pub module_type: &'static str,
}

pub struct UseClientPlugin {
    default_include: Regex,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    debug: bool,
    logger: Option<DebugLogger>,
    unresolved: UnresolvedPolicy,
    strict: bool,
    globals: FxHashSet<String>,
    // Per instance, never process-global: instances must coexist, and the
    // load hook of one must miss entries stored by another.
    registry: DashMap<String, String>,
}

impl UseClientPlugin {
    pub fn new(options: PluginOptions) -> Result<Self, ConfigError> {
        let include = options
            .include
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = options
            .exclude
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let unresolved = options.unresolved.unwrap_or(if options.strict {
            UnresolvedPolicy::Error
        } else {
            UnresolvedPolicy::Warn
        });
        let globals = match options.globals {
            Some(list) => list.into_iter().collect(),
            None => DEFAULT_GLOBALS.iter().map(|s| s.to_string()).collect(),
        };
        Ok(Self {
            default_include: Regex::new(DEFAULT_INCLUDE)?,
            include,
            exclude,
            debug: options.debug,
            logger: None,
            unresolved,
            strict: options.strict,
            globals,
            registry: DashMap::new(),
        })
    }

    pub fn from_json_config(config: &str) -> Result<Self, ConfigError> {
        Self::new(serde_json::from_str(config)?)
    }

    /// Routes `debug` output through a custom callback instead of `tracing`.
    pub fn set_logger(&mut self, logger: DebugLogger) {
        self.logger = Some(logger);
    }

    /// Build lifecycle: clears the registry so entries from a cancelled or
    /// finished build never leak into the next one.
    pub fn build_start(&self) {
        self.registry.clear();
    }

    fn debug_log(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger(message);
        }
        if self.debug {
            tracing::debug!("{message}");
        }
    }

    fn should_transform(&self, id: &str) -> bool {
        let canonical = naming::canonicalize_slashes(id);
        let included = self.default_include.is_match(&canonical)
            || self.include.iter().any(|re| re.is_match(&canonical));
        if !included || canonical.contains("/node_modules/") {
            return false;
        }
        !self.exclude.iter().any(|re| re.is_match(&canonical))
    }

    fn fatal(&self, host: &dyn Host, err: TransformError) -> TransformError {
        host.error(&err.to_string());
        err
    }

    /// The transform hook. Returns `Ok(None)` when the module is left
    /// untouched; fatal findings are reported through `host.error` and
    /// returned as `Err` so the host's hook promise rejects too.
    #[tracing::instrument(level = "trace", skip_all, fields(module = %id))]
    pub fn transform(
        &self,
        host: &dyn Host,
        code: &str,
        id: &str,
    ) -> Result<Option<TransformOutput>, TransformError> {
        if naming::is_inline_id(id) || !self.should_transform(id) {
            return Ok(None);
        }
        // A module without the substring cannot contain a handler.
        if !code.contains("use client") {
            return Ok(None);
        }

        let parsed = match parse::parse_tsx(id, code) {
            Ok(parsed) => parsed,
            Err(message) => {
                let err = TransformError::Parse {
                    id: id.to_string(),
                    message,
                };
                if self.strict {
                    return Err(self.fatal(host, err));
                }
                host.warn(&err.to_string());
                return Ok(None);
            }
        };

        let found = handlers::find_handlers(&parsed.module);
        if found.is_empty() {
            return Ok(None);
        }

        let spans = SourceSpans::new(code, parsed.module.span.lo.0);
        handlers::check_side_effect_imports(&parsed.module, code, &spans, id)
            .map_err(|err| self.fatal(host, err))?;
        handlers::check_callable_misuse(&parsed.module, &found, id)
            .map_err(|err| self.fatal(host, err))?;

        host.add_watch_file(id);

        let imports = tables::ImportTable::build(&parsed.module, code, &spans);
        let decls = tables::DeclTable::build(&parsed.module, code, &spans);

        let mut replacements: Vec<Replacement> = Vec::new();
        let mut chunks: Vec<EmittedChunk> = Vec::new();

        for handler in &found {
            let range = match spans.range(handler.replace_span) {
                Some(range) => range,
                None => {
                    self.debug_log(&format!(
                        "[use-client] {id}: handler span is unusable, skipping"
                    ));
                    continue;
                }
            };
            let start = match handler.form {
                HandlerForm::Expression => offsets::widen_parens(code, range.start),
                _ => range.start,
            };
            let end = match handler.form {
                // Declaration forms re-form a `;`-terminated statement, so
                // the old terminator comes out with the handler.
                HandlerForm::BareDecl { .. }
                | HandlerForm::ExportedDecl { .. }
                | HandlerForm::DefaultDeclNamed { .. } => {
                    offsets::trim_statement_end(code, range.end)
                }
                HandlerForm::Expression | HandlerForm::DefaultDeclAnon => range.end,
            };
            let probe = Replacement {
                start,
                end,
                text: String::new(),
            };
            if !probe.in_bounds(code.len()) || replacements.iter().any(|r| r.overlaps(&probe)) {
                self.debug_log(&format!(
                    "[use-client] {id}: replacement range {start}..{end} is invalid, skipping"
                ));
                continue;
            }

            let handler_start = spans
                .range(handler.func_span())
                .map(|r| r.start)
                .unwrap_or(start);

            let synthesized = synth::synthesize(
                handler,
                &imports,
                &decls,
                &self.globals,
                parsed.cm.clone(),
                &parsed.comments,
            )
            .map_err(|message| {
                self.fatal(
                    host,
                    TransformError::Print {
                        id: id.to_string(),
                        message,
                    },
                )
            })?;

            if !synthesized.unresolved.is_empty() {
                let err = TransformError::UnresolvedReference {
                    id: id.to_string(),
                    names: synthesized.unresolved.clone(),
                };
                match self.unresolved {
                    UnresolvedPolicy::Error => return Err(self.fatal(host, err)),
                    UnresolvedPolicy::Warn => host.warn(&err.to_string()),
                    UnresolvedPolicy::Ignore => {}
                }
            }

            let chunk_name = naming::chunk_name(code, handler_start, id);
            let inline_id = naming::inline_module_id(id, &chunk_name);
            self.registry.insert(inline_id.clone(), synthesized.code);

            let file_name = naming::asset_file_name(&chunk_name);
            let token = host.emit_chunk(EmittedChunkRequest {
                id: inline_id.clone(),
                file_name: file_name.clone(),
                module_side_effects: false,
            });
            self.debug_log(&format!(
                "[use-client] {id}: emitted {file_name} for handler at {handler_start}"
            ));

            replacements.push(Replacement {
                start,
                end,
                text: rewrite::replacement_text(&handler.form, token.as_str()),
            });
            chunks.push(EmittedChunk {
                id: inline_id,
                file_name,
                token,
            });
        }

        if replacements.is_empty() {
            return Ok(None);
        }
        Ok(Some(TransformOutput {
            code: rewrite::apply(code, replacements),
            map: None,
            chunks,
        }))
    }

    /// The resolve hook. Inline ids resolve to themselves; imports that
    /// originate from an inline module are delegated to the host's resolver
    /// rooted at the synthesized path, falling back to relative/absolute ids
    /// as-is.
    pub fn resolve_id(
        &self,
        host: &dyn Host,
        id: &str,
        importer: Option<&str>,
    ) -> Option<ResolvedId> {
        if naming::is_inline_id(id) {
            return Some(ResolvedId {
                id: id.to_string(),
                external: false,
            });
        }
        let importer = importer?;
        if !naming::is_inline_id(importer) {
            return None;
        }
        let importer_path = naming::inline_path(importer)?;
        if let Some(resolved) = host.resolve_external(id, importer_path, true) {
            return Some(resolved);
        }
        if id.starts_with('.') || id.starts_with('/') {
            return Some(ResolvedId {
                id: id.to_string(),
                external: false,
            });
        }
        None
    }

    /// The load hook. Serves synthesized module text for inline ids and
    /// declines everything else.
    pub fn load(&self, id: &str) -> Option<LoadOutput> {
        if !naming::is_inline_id(id) {
            return None;
        }
        let code = self.registry.get(id)?.value().clone();
        Some(LoadOutput {
            code,
            map: None,
            module_type: "tsx",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockHost {
        chunks: Mutex<Vec<EmittedChunkRequest>>,
        warnings: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
        watched: Mutex<Vec<String>>,
        resolvable: bool,
    }

    impl Host for MockHost {
        fn emit_chunk(&self, chunk: EmittedChunkRequest) -> RefToken {
            let mut chunks = self.chunks.lock().unwrap();
            let token = RefToken(format!("ASSET_REF_{}", chunks.len()));
            chunks.push(chunk);
            token
        }

        fn add_watch_file(&self, path: &str) {
            self.watched.lock().unwrap().push(path.to_string());
        }

        fn resolve_external(&self, id: &str, importer: &str, _skip_self: bool) -> Option<ResolvedId> {
            self.resolvable.then(|| ResolvedId {
                id: format!("{importer}::{id}"),
                external: false,
            })
        }

        fn warn(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    fn plugin() -> UseClientPlugin {
        UseClientPlugin::new(PluginOptions::default()).unwrap()
    }

    fn run(src: &str) -> (UseClientPlugin, MockHost, Option<TransformOutput>) {
        let plugin = plugin();
        let host = MockHost::default();
        let output = plugin.transform(&host, src, "/app/form.tsx").unwrap();
        (plugin, host, output)
    }

    #[test]
    fn modules_without_the_directive_are_untouched() {
        let (_, host, output) = run("export const a = () => 1;\n");
        assert!(output.is_none());
        assert!(host.chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn non_leading_directives_do_not_match() {
        let (_, _, output) = run(concat!(
            "\"use client\";\n",
            "const a = () => { start(); \"use client\"; };\n",
            "const b = () => \"use client\";\n",
        ));
        assert!(output.is_none());
    }

    #[test]
    fn basic_extraction_rewrites_and_emits() {
        let (plugin, host, output) =
            run("export const h = () => { \"use client\"; return 1; };\n");
        let output = output.unwrap();

        assert!(output
            .code
            .contains("export const h = new URL(import.meta.ASSET_REF_0).pathname;"));
        assert!(!output.code.contains("use client"));

        let requests = host.chunks.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].module_side_effects);
        assert!(requests[0].file_name.starts_with("assets/form."));
        assert!(requests[0].file_name.ends_with(".client.js"));

        let loaded = plugin.load(&output.chunks[0].id).unwrap();
        assert_eq!(loaded.module_type, "tsx");
        assert!(loaded.code.starts_with("\"use client\";\n"));
        assert!(loaded.code.contains("export default"));
        assert!(loaded.code.contains("return 1"));
    }

    #[test]
    fn closure_reaches_the_chunk_and_the_server_keeps_its_imports() {
        let (plugin, _, output) = run(concat!(
            "import { submit } from \"./c.ts\";\n",
            "const label = \"x\";\n",
            "export const h = () => { \"use client\"; submit(label); };\n",
        ));
        let output = output.unwrap();
        // Import table leaves the originals untouched.
        assert!(output.code.contains("import { submit } from \"./c.ts\";"));

        let chunk = plugin.load(&output.chunks[0].id).unwrap().code;
        assert!(chunk.contains("import { submit } from \"./c.ts\";"));
        assert!(chunk.contains("const label = \"x\";"));
    }

    #[test]
    fn unsafe_callable_use_is_fatal() {
        let plugin = plugin();
        let host = MockHost::default();
        let err = plugin
            .transform(
                &host,
                "function top() { \"use client\"; return 1; }\ntop();\n",
                "/app/form.tsx",
            )
            .unwrap_err();
        assert!(err.to_string().contains("`top`"));
        assert!(!host.errors.lock().unwrap().is_empty());
        assert!(host.chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn shadowed_callable_use_extracts_fine() {
        let (_, _, output) = run(concat!(
            "function top() { \"use client\"; return 1; }\n",
            "function invoke(top) { return top(); }\n",
        ));
        let output = output.unwrap();
        assert!(output
            .code
            .starts_with("const top = new URL(import.meta.ASSET_REF_0).pathname;"));
    }

    #[test]
    fn side_effect_imports_are_fatal() {
        let plugin = plugin();
        let host = MockHost::default();
        let err = plugin
            .transform(
                &host,
                "import \"./reset.css\";\nconst h = () => { \"use client\"; return 1; };\n",
                "/app/form.tsx",
            )
            .unwrap_err();
        assert!(err.to_string().contains("side-effect imports"));
        assert!(host.chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn chunk_names_are_content_addressed() {
        let src = "export const h = () => { \"use client\"; return 1; };\n";
        let (_, host_a, _) = run(src);
        let (_, host_b, _) = run(src);
        let name_a = host_a.chunks.lock().unwrap()[0].file_name.clone();
        let name_b = host_b.chunks.lock().unwrap()[0].file_name.clone();
        assert_eq!(name_a, name_b);

        let plugin = plugin();
        let host_c = MockHost::default();
        plugin.transform(&host_c, src, "/app/other.tsx").unwrap();
        let name_c = host_c.chunks.lock().unwrap()[0].file_name.clone();
        assert_ne!(name_a, name_c);
    }

    #[test]
    fn multibyte_text_before_the_handler_keeps_spans_aligned() {
        let (_, _, output) = run(concat!(
            "const label = \"café ☕ déjà vu\";\n",
            "export const h = () => { \"use client\"; return label; };\n",
        ));
        let output = output.unwrap();
        assert!(output.code.contains("const label = \"café ☕ déjà vu\";"));
        assert!(output
            .code
            .contains("export const h = new URL(import.meta.ASSET_REF_0).pathname;"));
        assert!(parse::parse_tsx("/app/form.tsx", &output.code).is_ok());
    }

    #[test]
    fn the_transform_is_idempotent() {
        let (_, _, output) = run(concat!(
            "const label = \"x\";\n",
            "export const h = () => { \"use client\"; return label; };\n",
        ));
        let rewritten = output.unwrap().code;
        let plugin = plugin();
        let host = MockHost::default();
        let second = plugin.transform(&host, &rewritten, "/app/form.tsx").unwrap();
        assert!(second.is_none());
        assert!(host.chunks.lock().unwrap().is_empty());
    }

    #[test]
    fn declaration_forms_rewrite_to_complete_statements() {
        let (_, _, output) = run("function top() { \"use client\"; return 1; }\n");
        assert!(output
            .unwrap()
            .code
            .starts_with("const top = new URL(import.meta.ASSET_REF_0).pathname;"));

        let (_, _, output) = run("export function top() { \"use client\"; return 1; }\n");
        assert!(output
            .unwrap()
            .code
            .starts_with("export const top = new URL(import.meta.ASSET_REF_0).pathname;"));

        let (_, _, output) = run("export default function Top() { \"use client\"; return 1; }\n");
        let code = output.unwrap().code;
        assert!(code.contains(
            "const Top = new URL(import.meta.ASSET_REF_0).pathname; export default Top;"
        ));

        let (_, _, output) = run("export default function () { \"use client\"; return 1; }\n");
        assert!(output
            .unwrap()
            .code
            .starts_with("export default new URL(import.meta.ASSET_REF_0).pathname"));
    }

    #[test]
    fn trailing_call_arguments_survive_extraction() {
        let (_, _, output) = run(concat!(
            "function wrap(f: () => number, n: number) { return n; }\n",
            "const extra = 5;\n",
            "const v = wrap(() => { \"use client\"; return 1; }, extra);\n",
        ));
        let code = output.unwrap().code;
        assert!(code.contains("wrap(new URL(import.meta.ASSET_REF_0).pathname, extra);"));
    }

    #[test]
    fn consecutive_handlers_keep_their_separator() {
        let (_, _, output) = run(concat!(
            "export const a = () => { \"use client\"; return 1; };\n",
            "export const b = () => { \"use client\"; return 2; };\n",
        ));
        let code = output.unwrap().code;
        assert!(code.contains("export const a = new URL(import.meta.ASSET_REF_0).pathname;"));
        assert!(code.contains("export const b = new URL(import.meta.ASSET_REF_1).pathname;"));
        assert!(parse::parse_tsx("/app/form.tsx", &code).is_ok());
    }

    #[test]
    fn type_only_imports_raise_no_unresolved_warnings() {
        let (_, host, output) = run(concat!(
            "import type { Payload } from \"./types\";\n",
            "export const h = (p: Payload) => { \"use client\"; return p; };\n",
        ));
        assert!(output.is_some());
        assert!(host.warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn parse_failures_warn_by_default_and_abort_under_strict() {
        let src = "const x = \"use client\"; function (broken\n";
        let (_, host, output) = run(src);
        assert!(output.is_none());
        assert!(!host.warnings.lock().unwrap().is_empty());

        let strict = UseClientPlugin::new(PluginOptions {
            strict: true,
            ..Default::default()
        })
        .unwrap();
        let host = MockHost::default();
        let err = strict.transform(&host, src, "/app/form.tsx").unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
        assert!(!host.errors.lock().unwrap().is_empty());
    }

    #[test]
    fn unresolved_policy_error_and_ignore() {
        let src = "export const h = () => { \"use client\"; missing(); };\n";

        let strict = UseClientPlugin::new(PluginOptions {
            strict: true,
            ..Default::default()
        })
        .unwrap();
        let host = MockHost::default();
        let err = strict.transform(&host, src, "/app/form.tsx").unwrap_err();
        assert!(err.to_string().contains("missing"));

        let lax = UseClientPlugin::new(PluginOptions {
            unresolved: Some(UnresolvedPolicy::Ignore),
            ..Default::default()
        })
        .unwrap();
        let host = MockHost::default();
        let output = lax.transform(&host, src, "/app/form.tsx").unwrap();
        assert!(output.is_some());
        assert!(host.warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn plugin_instances_are_isolated() {
        let (plugin_a, _, output) =
            run("export const h = () => { \"use client\"; return 1; };\n");
        let inline_id = output.unwrap().chunks[0].id.clone();

        let plugin_b = plugin();
        assert!(plugin_b.load(&inline_id).is_none());
        assert!(plugin_a.load(&inline_id).is_some());
    }

    #[test]
    fn build_start_clears_the_registry() {
        let (plugin, _, output) =
            run("export const h = () => { \"use client\"; return 1; };\n");
        let inline_id = output.unwrap().chunks[0].id.clone();
        assert!(plugin.load(&inline_id).is_some());
        plugin.build_start();
        assert!(plugin.load(&inline_id).is_none());
    }

    #[test]
    fn the_source_module_is_watched() {
        let (_, host, _) = run("export const h = () => { \"use client\"; return 1; };\n");
        assert_eq!(host.watched.lock().unwrap().as_slice(), ["/app/form.tsx"]);
    }

    #[test]
    fn filters_skip_foreign_and_vendored_files() {
        let plugin = plugin();
        let host = MockHost::default();
        let src = "export const h = () => { \"use client\"; return 1; };\n";
        assert!(plugin
            .transform(&host, src, "/app/styles.css")
            .unwrap()
            .is_none());
        assert!(plugin
            .transform(&host, src, "/app/node_modules/lib/index.tsx")
            .unwrap()
            .is_none());
        assert!(plugin.transform(&host, src, "/app/page.mts").unwrap().is_some());
    }

    #[test]
    fn custom_exclude_patterns_extend_the_defaults() {
        let plugin = UseClientPlugin::new(PluginOptions {
            exclude: vec!["generated".into()],
            ..Default::default()
        })
        .unwrap();
        let host = MockHost::default();
        let src = "export const h = () => { \"use client\"; return 1; };\n";
        assert!(plugin
            .transform(&host, src, "/app/generated/form.tsx")
            .unwrap()
            .is_none());
    }

    #[test]
    fn resolve_id_routes_inline_imports() {
        let (plugin, _, output) =
            run("export const h = () => { \"use client\"; return 1; };\n");
        let inline_id = output.unwrap().chunks[0].id.clone();

        let host = MockHost::default();
        // Inline ids resolve to themselves.
        assert_eq!(
            plugin.resolve_id(&host, &inline_id, None).unwrap().id,
            inline_id
        );
        // Imports from an inline module delegate to the host resolver.
        let resolving = MockHost {
            resolvable: true,
            ..Default::default()
        };
        let resolved = plugin
            .resolve_id(&resolving, "./c.ts", Some(&inline_id))
            .unwrap();
        assert!(resolved.id.ends_with("::./c.ts"));
        assert!(resolved.id.starts_with("/app/"));
        // Without host help, relative ids pass through as-is.
        assert_eq!(
            plugin.resolve_id(&host, "./c.ts", Some(&inline_id)).unwrap().id,
            "./c.ts"
        );
        // Ordinary imports from ordinary modules are declined.
        assert!(plugin
            .resolve_id(&host, "./c.ts", Some("/app/form.tsx"))
            .is_none());
    }

    #[test]
    fn jsx_bodies_round_trip_with_their_component_imports() {
        let (plugin, _, output) = run(concat!(
            "import { Button } from \"./ui\";\n",
            "export const h = () => { \"use client\"; return <Button label={text} />; };\n",
            "const text = \"go\";\n",
        ));
        let output = output.unwrap();
        let chunk = plugin.load(&output.chunks[0].id).unwrap().code;
        assert!(chunk.contains("import { Button } from \"./ui\";"));
        assert!(chunk.contains("const text = \"go\";"));
        assert!(chunk.contains("<Button"));
    }

    #[test]
    fn namespace_imports_are_carried_whole() {
        let (plugin, _, output) = run(concat!(
            "import * as api from \"./api\";\n",
            "export const h = () => { \"use client\"; return api.send(); };\n",
        ));
        let output = output.unwrap();
        let chunk = plugin.load(&output.chunks[0].id).unwrap().code;
        assert!(chunk.contains("import * as api from \"./api\";"));
    }

    #[test]
    fn enums_participate_in_the_closure() {
        let (plugin, _, output) = run(concat!(
            "enum Mode { Fast, Slow }\n",
            "export const h = () => { \"use client\"; return Mode.Fast; };\n",
        ));
        let output = output.unwrap();
        let chunk = plugin.load(&output.chunks[0].id).unwrap().code;
        assert!(chunk.contains("enum Mode { Fast, Slow }"));
    }

    #[test]
    fn handlers_nested_in_methods_and_callbacks_are_found() {
        let (_, host, output) = run(concat!(
            "export const routes = {\n",
            "  submit() {\n",
            "    return register(() => { \"use client\"; return 1; });\n",
            "  },\n",
            "};\n",
            "function register(f: () => number) { return f; }\n",
        ));
        assert!(output.is_some());
        assert_eq!(host.chunks.lock().unwrap().len(), 1);
    }

    #[test]
    fn each_handler_gets_its_own_closure_copy() {
        let (plugin, host, output) = run(concat!(
            "const label = \"x\";\n",
            "export const a = () => { \"use client\"; return label; };\n",
            "export const b = () => { \"use client\"; return label + \"!\"; };\n",
        ));
        let output = output.unwrap();
        assert_eq!(host.chunks.lock().unwrap().len(), 2);
        assert_eq!(output.chunks.len(), 2);
        for chunk in &output.chunks {
            let code = plugin.load(&chunk.id).unwrap().code;
            assert!(code.contains("const label = \"x\";"));
        }
        assert_ne!(output.chunks[0].id, output.chunks[1].id);
    }

    #[test]
    fn platform_globals_need_no_imports() {
        let (_, host, output) = run(concat!(
            "export const h = () => { \"use client\"; ",
            "console.log(navigator.userAgent); ",
            "return fetch(new URL(\"/api\", location.href), { signal: undefined }); };\n",
        ));
        assert!(output.is_some());
        assert!(host.warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn globals_override_replaces_the_default_set() {
        let plugin = UseClientPlugin::new(PluginOptions {
            globals: Some(vec!["myRuntime".into()]),
            unresolved: Some(UnresolvedPolicy::Error),
            ..Default::default()
        })
        .unwrap();
        let host = MockHost::default();
        // The override resolves its own names and drops the defaults.
        assert!(plugin
            .transform(
                &host,
                "export const h = () => { \"use client\"; return myRuntime(); };\n",
                "/app/form.tsx",
            )
            .unwrap()
            .is_some());
        assert!(plugin
            .transform(
                &host,
                "export const h = () => { \"use client\"; return fetch(\"/x\"); };\n",
                "/app/form.tsx",
            )
            .is_err());
    }

    #[test]
    fn load_declines_non_inline_ids() {
        let (plugin, _, _) = run("export const h = () => { \"use client\"; return 1; };\n");
        assert!(plugin.load("/app/form.tsx").is_none());
    }

    #[test]
    fn config_json_round_trips_and_rejects_unknown_fields() {
        let plugin = UseClientPlugin::from_json_config(
            "{\"strict\": true, \"unresolved\": \"ignore\", \"exclude\": [\"vendor\"]}",
        )
        .unwrap();
        assert_eq!(plugin.unresolved, UnresolvedPolicy::Ignore);
        assert!(plugin.strict);
        assert!(UseClientPlugin::from_json_config("{\"bogus\": 1}").is_err());
    }

    #[test]
    fn custom_loggers_receive_debug_output() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        let mut plugin = plugin();
        plugin.set_logger(Arc::new(move |msg| sink.lock().unwrap().push(msg.to_string())));
        let host = MockHost::default();
        plugin
            .transform(
                &host,
                "export const h = () => { \"use client\"; return 1; };\n",
                "/app/form.tsx",
            )
            .unwrap();
        assert!(seen.lock().unwrap().iter().any(|m| m.contains("emitted")));
    }
}
