//! Entry-point selection for bare package URLs
//!
//! A request with no file path is redirected to the file the package's
//! manifest designates. Module requests only accept ES module entries.

use pkgcdn_core::types::PackageConfig;

/// Outcome of entry-point selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// Rooted file path, always starting with exactly one `/`
    File(String),
    /// A module request for a package without an ES module entry
    MissingModule,
}

/// Pick the entry file of a package.
///
/// Module requests use `module`, then `jsnext:main`; a package declaring
/// `"type": "module"` falls back to `main` or `/index.js`, and a `main`
/// ending in `.mjs` is accepted as is. Other requests use `unpkg`, then
/// `browser` (string form only), then `main`, then `/index.js`.
pub fn select_entry_point(config: &PackageConfig, module: bool) -> EntryPoint {
    let selected = if module {
        config
            .module()
            .or_else(|| config.jsnext_main())
            .map(String::from)
            .or_else(|| {
                if config.is_module_type() {
                    Some(config.main().unwrap_or("/index.js").to_string())
                } else {
                    config
                        .main()
                        .filter(|main| main.ends_with(".mjs"))
                        .map(String::from)
                }
            })
    } else {
        Some(
            config
                .unpkg()
                .or_else(|| config.browser())
                .or_else(|| config.main())
                .unwrap_or("/index.js")
                .to_string(),
        )
    };

    match selected {
        Some(filename) => EntryPoint::File(normalize_entry_filename(&filename)),
        None => EntryPoint::MissingModule,
    }
}

/// `lib/index.js`, `./lib/index.js` and `//lib/index.js` all become `/lib/index.js`
fn normalize_entry_filename(filename: &str) -> String {
    let mut rest = filename;
    loop {
        let trimmed = rest.trim_start_matches('/');
        match trimmed.strip_prefix("./") {
            Some(stripped) => rest = stripped,
            None => {
                rest = trimmed;
                break;
            }
        }
    }
    format!("/{}", rest)
}
