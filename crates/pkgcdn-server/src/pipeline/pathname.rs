//! `/{[@scope/]name}[@version]{/filename}` request paths

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

use pkgcdn_core::types::PackageSpec;
use pkgcdn_core::utils::collapse_slashes;

use crate::query::Query;

static PACKAGE_PATHNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/((?:@[^/@]+/)?[^/@]+)(?:@([^/]+))?(/.*)?$").expect("package pathname pattern")
});

/// Decode and split a request path. `None` when the path is not valid
/// percent-encoded UTF-8 or does not name a package.
pub fn parse_pathname(pathname: &str) -> Option<PackageSpec> {
    let decoded = decode_strict(pathname)?;
    let captures = PACKAGE_PATHNAME.captures(&decoded)?;

    let name = captures.get(1)?.as_str();
    let version = captures.get(2).map_or("latest", |m| m.as_str());
    let filename = captures.get(3).map_or(String::new(), |m| collapse_slashes(m.as_str()));

    Some(PackageSpec::new(name, version, filename))
}

/// Percent-decode, rejecting malformed escapes and invalid UTF-8
fn decode_strict(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
        }
    }
    percent_decode_str(input).decode_utf8().ok().map(|s| s.into_owned())
}

/// `/name[@version][filename][?query]`
pub fn package_url(name: &str, version: Option<&str>, filename: &str, query: &Query) -> String {
    let mut url = format!("/{}", name);
    if let Some(version) = version {
        url.push('@');
        url.push_str(version);
    }
    url.push_str(filename);
    url.push_str(&query.to_search());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(pathname: &str) -> Option<(String, String, String)> {
        parse_pathname(pathname).map(|spec| (spec.name, spec.requested, spec.filename))
    }

    fn owned(name: &str, version: &str, filename: &str) -> Option<(String, String, String)> {
        Some((name.to_string(), version.to_string(), filename.to_string()))
    }

    #[test]
    fn test_plain_package() {
        assert_eq!(parts("/react"), owned("react", "latest", ""));
        assert_eq!(parts("/react@16.8.0"), owned("react", "16.8.0", ""));
        assert_eq!(parts("/react@16.8.0/index.js"), owned("react", "16.8.0", "/index.js"));
        assert_eq!(parts("/react/umd/"), owned("react", "latest", "/umd/"));
    }

    #[test]
    fn test_scoped_package() {
        assert_eq!(parts("/@scope/pkg"), owned("@scope/pkg", "latest", ""));
        assert_eq!(parts("/@scope/pkg@^2.0.0/dist/"), owned("@scope/pkg", "^2.0.0", "/dist/"));
        assert_eq!(parts("/@scope%2Fpkg@1.0.0"), owned("@scope/pkg", "1.0.0", ""));
    }

    #[test]
    fn test_decoding_and_slashes() {
        assert_eq!(parts("/pkg@%5E1.0.0//lib///a.js"), owned("pkg", "^1.0.0", "/lib/a.js"));
        assert_eq!(parts("/pkg@1.0.0/with%20space.js"), owned("pkg", "1.0.0", "/with space.js"));
    }

    #[test]
    fn test_invalid_pathnames() {
        assert_eq!(parts("/"), None);
        assert_eq!(parts("/@scope"), None);
        assert_eq!(parts("/pkg@"), None);
        assert_eq!(parts("/pkg%zz"), None);
        assert_eq!(parts("/pkg%E0%A4%A"), None);
        assert_eq!(parts("/pkg%FF"), None);
    }

    #[test]
    fn test_package_url() {
        let query = Query::parse(Some("module"));
        assert_eq!(package_url("react", Some("16.8.0"), "/index.js", &query), "/react@16.8.0/index.js?module");
        assert_eq!(package_url("react", None, "", &Query::default()), "/react");
    }
}
