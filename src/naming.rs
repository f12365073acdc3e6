//! Content-addressed chunk names and the virtual module id scheme.

use sha1::{Digest, Sha1};

/// Reserved marker prefixing every inline module id. The leading NUL keeps
/// the id space disjoint from real paths and routes load requests back into
/// the plugin's registry.
pub const INLINE_PREFIX: &str = "\0use-client:";

/// Extension of the synthesized client modules.
pub const CLIENT_EXT: &str = "tsx";

fn short_hash(parts: &[&[u8]]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())[..12].to_string()
}

/// 12-hex digest of the whole source text.
pub fn file_hash(source: &str) -> String {
    short_hash(&[source.as_bytes()])
}

/// 12-hex digest binding the source content, the handler position, and the
/// module path. The path keeps byte-identical handlers in different files
/// apart; the file hash makes any edit change the name.
pub fn chunk_hash(source: &str, handler_start: usize, canonical_id: &str) -> String {
    let file = file_hash(source);
    short_hash(&[
        file.as_bytes(),
        handler_start.to_string().as_bytes(),
        canonical_id.as_bytes(),
    ])
}

/// Forward-slashed form of a module id.
pub fn canonicalize_slashes(id: &str) -> String {
    id.replace('\\', "/")
}

/// Basename of `id` with the extension stripped and every run of characters
/// outside `[A-Za-z0-9_-]` collapsed to a single `_`.
pub fn sanitized_basename(id: &str) -> String {
    let canonical = canonicalize_slashes(id);
    let base = canonical.rsplit('/').next().unwrap_or(&canonical);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };

    let mut out = String::with_capacity(stem.len());
    let mut in_run = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// `<sanitizedBasename>.<12-hex>.client.<ext>` for one handler.
pub fn chunk_name(source: &str, handler_start: usize, id: &str) -> String {
    format!(
        "{}.{}.client.{}",
        sanitized_basename(id),
        chunk_hash(source, handler_start, &canonicalize_slashes(id)),
        CLIENT_EXT
    )
}

/// Virtual id for an inline module: the reserved prefix plus an
/// absolute-looking synthesized path next to the source module.
pub fn inline_module_id(source_id: &str, chunk_name: &str) -> String {
    let canonical = canonicalize_slashes(source_id);
    let dir = canonical.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    format!("{INLINE_PREFIX}{dir}/{chunk_name}")
}

pub fn is_inline_id(id: &str) -> bool {
    id.starts_with(INLINE_PREFIX)
}

/// Synthesized path behind an inline id, with the prefix and any query
/// string stripped.
pub fn inline_path(id: &str) -> Option<&str> {
    let rest = id.strip_prefix(INLINE_PREFIX)?;
    Some(rest.split('?').next().unwrap_or(rest))
}

/// Proposed output name for the emitted chunk: the chunk name with a JS
/// extension, under `assets/`.
pub fn asset_file_name(chunk_name: &str) -> String {
    let stem = chunk_name
        .strip_suffix(CLIENT_EXT)
        .map(|s| s.trim_end_matches('.'))
        .unwrap_or(chunk_name);
    format!("assets/{stem}.js")
}
