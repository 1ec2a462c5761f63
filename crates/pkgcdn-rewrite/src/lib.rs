//! ES module delivery for pkgcdn
//!
//! Browsers cannot resolve bare specifiers like `"react"`. Files served with
//! `?module` have theirs rewritten to absolute CDN URLs pinned to the versions
//! the owning package declares, and relative specifiers marked with
//! `?module` so the follow-up fetches are rewritten too.

pub mod frame;
pub mod html;
pub mod lexer;
pub mod rewriter;
pub mod specifier;

// Re-export main types
pub use frame::code_frame;
pub use rewriter::ModuleRewriter;
pub use specifier::rewrite_specifier;

use pkgcdn_core::error::CdnError;

/// Result type for rewriting operations
pub type RewriteResult<T> = Result<T, CdnError>;
