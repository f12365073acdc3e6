//! TS+JSX parsing for a single module.

use swc_core::{
    common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap, GLOBALS},
    ecma::{
        ast::{EsVersion, Module},
        parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax},
    },
};

/// One parsed module plus everything the printer needs later.
pub struct ParsedModule {
    pub cm: Lrc<SourceMap>,
    pub comments: SingleThreadedComments,
    pub module: Module,
}

impl std::fmt::Debug for ParsedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedModule").finish_non_exhaustive()
    }
}

/// Parses `code` as a TSX module. On failure returns the parser's message;
/// the caller decides whether that is fatal (strict) or a warning.
pub fn parse_tsx(id: &str, code: &str) -> Result<ParsedModule, String> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(id.to_string()).into(), code.to_string());
    let comments = SingleThreadedComments::default();

    let parsed = GLOBALS.set(&Default::default(), || {
        let lexer = Lexer::new(
            Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
            EsVersion::Es2022,
            StringInput::from(&*fm),
            Some(&comments),
        );
        let mut parser = Parser::new_from(lexer);
        let module = parser.parse_module().map_err(|e| e.kind().msg().to_string())?;
        if let Some(err) = parser.take_errors().into_iter().next() {
            return Err(err.kind().msg().to_string());
        }
        Ok(module)
    })?;

    Ok(ParsedModule {
        cm,
        comments,
        module: parsed,
    })
}
