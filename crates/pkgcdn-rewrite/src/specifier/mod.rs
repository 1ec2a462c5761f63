//! Locating and rewriting module specifiers
//!
//! Four syntactic positions carry a specifier string:
//!
//! - `import x from "spec"` and `import "spec"`
//! - `export * from "spec"` (with or without `as ns`)
//! - `export { a, b } from "spec"` and `export v from "spec"`
//! - `import("spec")`

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::lexer::{Token, TokenKind};

/// `name` or `@scope/name`, then an optional `/sub/path`
static BARE_SPECIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:@[^/]+/)?[^/]+)(/.*)?$").expect("bare specifier pattern"));

/// Indices of the string tokens that hold module specifiers
pub fn find_specifiers(source: &str, tokens: &[Token]) -> Vec<usize> {
    let mut found = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Ident {
            continue;
        }
        // `foo.import(...)` and `a?.export` are member accesses
        if i > 0 && tokens[i - 1].is_punct(source, ".") {
            continue;
        }

        let next = tokens.get(i + 1);
        match token.text(source) {
            "import" => match next {
                Some(open) if open.is_punct(source, "(") => {
                    if tokens.get(i + 2).is_some_and(|t| t.kind == TokenKind::Str) {
                        found.push(i + 2);
                    }
                }
                // import.meta
                Some(dot) if dot.is_punct(source, ".") => {}
                Some(spec) if spec.kind == TokenKind::Str => found.push(i + 1),
                Some(_) => found.extend(from_clause(source, tokens, i + 1)),
                None => {}
            },
            "export" => found.extend(from_clause(source, tokens, i + 1)),
            _ => {}
        }
    }

    found
}

/// Scan an import/export clause starting at `start` for `from "spec"`.
/// Gives up at the first token that cannot be part of a clause.
fn from_clause(source: &str, tokens: &[Token], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;

    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Ident => {
                let followed_by_string = tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Str);
                if depth == 0 && i > start && token.text(source) == "from" && followed_by_string {
                    return Some(i + 1);
                }
            }
            TokenKind::Punct => match token.text(source) {
                "{" => depth += 1,
                "}" if depth > 0 => depth -= 1,
                "," | "*" => {}
                _ => return None,
            },
            // `export { "string name" as x } from "spec"`
            TokenKind::Str if depth > 0 => {}
            _ => return None,
        }
        i += 1;
    }

    None
}

/// Bare specifiers name a package rather than a path
pub fn is_bare(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/')
}

/// Full URLs and protocol-relative `//host/...` are left alone
pub fn is_absolute_url(specifier: &str) -> bool {
    specifier.starts_with("//") || url::Url::parse(specifier).is_ok()
}

/// Split a bare specifier into package name and subpath (`""` or `/...`)
pub fn split_bare(specifier: &str) -> Option<(&str, &str)> {
    let captures = BARE_SPECIFIER.captures(specifier)?;
    let name = captures.get(1)?.as_str();
    let file = captures.get(2).map_or("", |m| m.as_str());
    Some((name, file))
}

/// Rewritten form of one specifier, or `None` to keep it as is.
///
/// Bare specifiers become `{origin}/{name}@{version}{file}?module` using the
/// version from `dependencies` (or `latest`); relative and root paths get
/// `?module` appended.
pub fn rewrite_specifier(specifier: &str, origin: &str, dependencies: &BTreeMap<String, String>) -> Option<String> {
    if specifier.is_empty() || is_absolute_url(specifier) {
        return None;
    }

    if !is_bare(specifier) {
        return Some(format!("{}?module", specifier));
    }

    let (name, file) = split_bare(specifier)?;
    let version = match dependencies.get(name) {
        Some(version) => version.as_str(),
        None => {
            warn!(
                package = name,
                "Missing version info for package \"{}\" in dependencies; falling back to \"latest\"", name
            );
            "latest"
        }
    };

    Some(format!("{}/{}@{}{}?module", origin, name, version, file))
}
