//! The narrow host-bundler interface the transform consumes.
//!
//! The plugin never talks to the bundler directly; everything it needs from
//! the host is behind this trait so the pipeline stays testable and the
//! bundler glue stays out of the core.

/// Request to register a new bundle entry whose source will later be served
/// through the plugin's load hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedChunkRequest {
    /// Virtual module id (see [`crate::naming::INLINE_PREFIX`]).
    pub id: String,
    /// Proposed output file name, e.g. `assets/form.1a2b3c4d5e6f.client.js`.
    pub file_name: String,
    /// Always `false` for synthesized client modules.
    pub module_side_effects: bool,
}

/// Host-issued placeholder that the bundler substitutes with the final asset
/// URL at emit time. The plugin splices the literal token, never a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefToken(pub String);

impl RefToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub id: String,
    pub external: bool,
}

pub trait Host {
    /// Register a bundle entry for an inline module and return the reference
    /// token to splice into the rewritten source.
    fn emit_chunk(&self, chunk: EmittedChunkRequest) -> RefToken;

    /// Register a file dependency so edits retrigger the transform.
    fn add_watch_file(&self, path: &str);

    /// Resolve `id` as if imported from `importer`, optionally skipping this
    /// plugin's own resolve hook.
    fn resolve_external(&self, id: &str, importer: &str, skip_self: bool) -> Option<ResolvedId>;

    /// Diagnostic channel for non-fatal findings.
    fn warn(&self, message: &str);

    /// Diagnostic channel for fatal findings. The host may throw; the plugin
    /// additionally returns the error so the hook promise rejects.
    fn error(&self, message: &str);
}
