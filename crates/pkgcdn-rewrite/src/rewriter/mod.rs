//! Specifier rewriting for JavaScript and HTML files
//!
//! Only the characters inside rewritten string literals change; everything
//! else, including whitespace and line structure, is copied through.

use std::collections::BTreeMap;

use crate::html::module_script_bodies;
use crate::lexer::tokenize;
use crate::specifier::{find_specifiers, rewrite_specifier};
use crate::RewriteResult;

/// Rewrites bare specifiers into absolute URLs under `origin`
#[derive(Debug, Clone)]
pub struct ModuleRewriter {
    origin: String,
}

impl ModuleRewriter {
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    /// Rewrite every module specifier in a JavaScript source
    pub fn rewrite_javascript(&self, source: &str, dependencies: &BTreeMap<String, String>) -> RewriteResult<String> {
        let tokens = tokenize(source)?;
        let mut output = String::with_capacity(source.len() + 64);
        let mut copied = 0;

        for index in find_specifiers(source, &tokens) {
            let literal = tokens[index];
            let quote = &source[literal.start..literal.start + 1];
            let value = &source[literal.start + 1..literal.end - 1];

            // Escaped specifiers are rare enough to leave untouched
            if value.contains('\\') {
                continue;
            }

            if let Some(rewritten) = rewrite_specifier(value, &self.origin, dependencies) {
                output.push_str(&source[copied..literal.start + 1]);
                output.push_str(&escape(&rewritten, quote));
                copied = literal.end - 1;
            }
        }

        output.push_str(&source[copied..]);
        Ok(output)
    }

    /// Rewrite the body of every inline `<script type="module">`
    pub fn rewrite_html(&self, html: &str, dependencies: &BTreeMap<String, String>) -> RewriteResult<String> {
        let mut output = String::with_capacity(html.len() + 64);
        let mut copied = 0;

        for body in module_script_bodies(html) {
            output.push_str(&html[copied..body.start]);
            output.push_str(&self.rewrite_javascript(&html[body.clone()], dependencies)?);
            copied = body.end;
        }

        output.push_str(&html[copied..]);
        Ok(output)
    }
}

fn escape(value: &str, quote: &str) -> String {
    value.replace('\\', "\\\\").replace(quote, &format!("\\{}", quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgcdn_core::error::CdnError;

    fn deps() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("left-pad".to_string(), "1.3.0".to_string()),
            ("@scope/ui".to_string(), "^2.0.0".to_string()),
        ])
    }

    fn rewriter() -> ModuleRewriter {
        ModuleRewriter::new("https://cdn.example")
    }

    #[test]
    fn test_bare_import() {
        let out = rewriter()
            .rewrite_javascript(r#"import x from "left-pad""#, &deps())
            .unwrap();
        assert_eq!(out, r#"import x from "https://cdn.example/left-pad@1.3.0?module""#);
    }

    #[test]
    fn test_relative_import() {
        let out = rewriter()
            .rewrite_javascript("import util from './util.js';", &deps())
            .unwrap();
        assert_eq!(out, "import util from './util.js?module';");
    }

    #[test]
    fn test_mixed_module_preserves_layout() {
        let source = "/* header */\nimport a from \"left-pad\";\n\nexport * from '@scope/ui/button';\nconst lazy = () => import(\"./lazy.js\");\nfetch(\"https://api.test/data\");\nimport cdn from \"https://esm.test/x.js\";\n";
        let expected = "/* header */\nimport a from \"https://cdn.example/left-pad@1.3.0?module\";\n\nexport * from 'https://cdn.example/@scope/ui@^2.0.0/button?module';\nconst lazy = () => import(\"./lazy.js?module\");\nfetch(\"https://api.test/data\");\nimport cdn from \"https://esm.test/x.js\";\n";
        assert_eq!(rewriter().rewrite_javascript(source, &deps()).unwrap(), expected);
    }

    #[test]
    fn test_minified_stays_on_one_line() {
        let source = r#"import{a}from"left-pad";export{b}from"./b.js";a(b)"#;
        let out = rewriter().rewrite_javascript(source, &deps()).unwrap();
        assert_eq!(
            out,
            r#"import{a}from"https://cdn.example/left-pad@1.3.0?module";export{b}from"./b.js?module";a(b)"#
        );
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_missing_dependency_falls_back_to_latest() {
        let out = rewriter()
            .rewrite_javascript("import 'unknown-pkg/polyfill';", &BTreeMap::new())
            .unwrap();
        assert_eq!(out, "import 'https://cdn.example/unknown-pkg@latest/polyfill?module';");
    }

    #[test]
    fn test_origin_trailing_slash() {
        let out = ModuleRewriter::new("https://cdn.example/")
            .rewrite_javascript("import x from \"left-pad\"", &deps())
            .unwrap();
        assert_eq!(out, r#"import x from "https://cdn.example/left-pad@1.3.0?module""#);
    }

    #[test]
    fn test_syntax_error_reports_frame() {
        let err = rewriter()
            .rewrite_javascript("import a from 'left-pad';\nconst s = 'broken\n", &deps())
            .unwrap_err();
        match err {
            CdnError::ModuleRewrite { kind, message, code_frame } => {
                assert_eq!(kind, "SyntaxError");
                assert!(message.starts_with("Unterminated string constant"));
                assert!(code_frame.contains("> 2 |"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_regex_after_block_with_quote() {
        let source = "if (x) {}\n/re'/.test(s);\nimport a from 'left-pad';\n";
        let out = rewriter().rewrite_javascript(source, &deps()).unwrap();
        assert_eq!(
            out,
            "if (x) {}\n/re'/.test(s);\nimport a from 'https://cdn.example/left-pad@1.3.0?module';\n"
        );
    }

    #[test]
    fn test_html_module_scripts() {
        let html = "<!doctype html>\n<script type=\"module\">\n  import pad from 'left-pad';\n</script>\n<script>\n  import x from 'left-pad';\n</script>\n";
        let expected = "<!doctype html>\n<script type=\"module\">\n  import pad from 'https://cdn.example/left-pad@1.3.0?module';\n</script>\n<script>\n  import x from 'left-pad';\n</script>\n";
        assert_eq!(rewriter().rewrite_html(html, &deps()).unwrap(), expected);
    }

    #[test]
    fn test_html_syntax_error_propagates() {
        let html = "<script type=\"module\">const s = `unterminated</script>";
        assert!(rewriter().rewrite_html(html, &deps()).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn code_without_modules_is_unchanged(source in "[a-z0-9 =+;(){}\n]{0,200}") {
                prop_assume!(!source.contains("import") && !source.contains("export"));
                let out = rewriter().rewrite_javascript(&source, &BTreeMap::new()).unwrap();
                prop_assert_eq!(out, source);
            }

            #[test]
            fn declared_dependencies_are_pinned(
                name in "[a-z][a-z0-9-]{0,12}",
                version in "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}",
            ) {
                let deps = BTreeMap::from([(name.clone(), version.clone())]);
                let out = rewriter()
                    .rewrite_javascript(&format!("import m from '{}';", name), &deps)
                    .unwrap();
                prop_assert_eq!(
                    out,
                    format!("import m from 'https://cdn.example/{}@{}?module';", name, version)
                );
            }
        }
    }
}
