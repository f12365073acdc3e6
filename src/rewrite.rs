//! Planned source replacements, applied right to left.

use crate::handlers::HandlerForm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Replacement {
    pub fn in_bounds(&self, len: usize) -> bool {
        self.start < self.end && self.end <= len
    }

    pub fn overlaps(&self, other: &Replacement) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The runtime expression a handler is rewritten to. The host expands the
/// token into the final asset path constant after bundling.
pub fn url_expr(token: &str) -> String {
    format!("new URL(import.meta.{token}).pathname")
}

/// Replacement text per handler form. Declaration forms re-form a complete
/// statement so the surrounding module stays well-formed.
pub fn replacement_text(form: &HandlerForm, token: &str) -> String {
    let url = url_expr(token);
    match form {
        HandlerForm::Expression => url,
        HandlerForm::BareDecl { name } => format!("const {name} = {url};"),
        HandlerForm::ExportedDecl { name } => format!("export const {name} = {url};"),
        HandlerForm::DefaultDeclNamed { name } => {
            format!("const {name} = {url}; export default {name};")
        }
        HandlerForm::DefaultDeclAnon => format!("export default {url}"),
    }
}

/// Splices the replacements into `source`. Ranges never overlap, so applying
/// in order of decreasing start keeps earlier indices valid.
pub fn apply(source: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = source.to_string();
    for replacement in &replacements {
        out.replace_range(replacement.start..replacement.end, &replacement.text);
    }
    out
}
