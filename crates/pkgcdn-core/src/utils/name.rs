//! npm package name validation.
//!
//! Only the rules that make a name unusable are enforced; npm's warnings
//! (uppercase letters, length, builtin module names) are accepted.

use crate::error::{CdnError, CdnResult};

const BLACKLISTED: &[&str] = &["node_modules", "favicon.ico"];

/// Whether a name looks like a 32 character hex digest
pub fn is_hash(name: &str) -> bool {
    name.len() == 32 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Characters `encodeURIComponent` leaves untouched
fn is_url_safe(segment: &str) -> bool {
    segment
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b))
}

/// Scoped names are URL-safe when both halves are
fn is_url_friendly(name: &str) -> bool {
    if is_url_safe(name) {
        return true;
    }
    let Some(rest) = name.strip_prefix('@') else {
        return false;
    };
    match rest.split_once('/') {
        Some((scope, package)) => {
            !scope.is_empty()
                && !package.is_empty()
                && !package.contains('/')
                && is_url_safe(scope)
                && is_url_safe(package)
        }
        None => false,
    }
}

/// Collect the reasons a name cannot be used
pub fn name_errors(name: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push("name length must be greater than zero".to_string());
    }
    if name.starts_with('.') {
        errors.push("name cannot start with a period".to_string());
    }
    if name.starts_with('_') {
        errors.push("name cannot start with an underscore".to_string());
    }
    if name.trim() != name {
        errors.push("name cannot contain leading or trailing spaces".to_string());
    }
    for blacklisted in BLACKLISTED {
        if name.eq_ignore_ascii_case(blacklisted) {
            errors.push(format!("{} is a blacklisted name", blacklisted));
        }
    }
    if !name.is_empty() && !is_url_friendly(name) {
        errors.push("name can only contain URL-friendly characters".to_string());
    }

    errors
}

/// Reject hash-like names and names npm would refuse
pub fn validate_package_name(name: &str) -> CdnResult<()> {
    if is_hash(name) {
        return Err(CdnError::InvalidPackageName {
            name: name.to_string(),
            reason: "cannot be a hash".to_string(),
        });
    }

    let errors = name_errors(name);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CdnError::InvalidPackageName {
            name: name.to_string(),
            reason: errors.join(", "),
        })
    }
}
