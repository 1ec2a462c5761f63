//! `<script type="module">` extraction for HTML documents

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script element pattern"));

static MODULE_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)type\s*=\s*(?:"module"|'module'|module(?:\s|/|$))"#).expect("module type pattern")
});

/// Byte ranges of the bodies of every inline module script, in document order
pub fn module_script_bodies(html: &str) -> Vec<Range<usize>> {
    SCRIPT_ELEMENT
        .captures_iter(html)
        .filter(|captures| captures.get(1).is_some_and(|attrs| MODULE_TYPE.is_match(attrs.as_str())))
        .filter_map(|captures| captures.get(2))
        .map(|body| body.range())
        .collect()
}
