//! Error taxonomy and the unresolved-reference policy knob.

use serde::Deserialize;
use thiserror::Error;

/// What to do when a handler references names with no import or top-level
/// declaration. `Ignore` is an explicit escape hatch: the synthesized client
/// module simply lacks those names and fails at client load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    Error,
    Warn,
    Ignore,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("[use-client] {id}: failed to parse module: {message}")]
    Parse { id: String, message: String },

    #[error(
        "[use-client] {id}: side-effect imports cannot be carried into an extracted client \
         module: `{statement}`"
    )]
    SideEffectImport { id: String, statement: String },

    #[error(
        "[use-client] {id}: `{name}` is extracted to a client asset URL but is still used as a \
         {use_kind}; that use would become a runtime error"
    )]
    UnsafeCallable {
        id: String,
        name: String,
        use_kind: &'static str,
    },

    #[error(
        "[use-client] {id}: client handler references names with no import or top-level \
         declaration: {}",
        .names.join(", ")
    )]
    UnresolvedReference { id: String, names: Vec<String> },

    #[error("[use-client] {id}: printer could not re-emit handler: {message}")]
    Print { id: String, message: String },
}

/// Failures while building a plugin instance from host-provided JSON config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[use-client] invalid plugin configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("[use-client] invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_stable_tag_and_module_id() {
        let err = TransformError::SideEffectImport {
            id: "/app/form.tsx".into(),
            statement: "import \"./reset.css\";".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("[use-client] /app/form.tsx"));
        assert!(text.contains("side-effect imports"));
        assert!(text.contains("./reset.css"));
    }

    #[test]
    fn unresolved_message_lists_every_name() {
        let err = TransformError::UnresolvedReference {
            id: "/app/form.tsx".into(),
            names: vec!["helper".into(), "other".into()],
        };
        assert!(err.to_string().contains("helper, other"));
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let policy: UnresolvedPolicy = serde_json::from_str("\"ignore\"").unwrap();
        assert_eq!(policy, UnresolvedPolicy::Ignore);
    }
}
