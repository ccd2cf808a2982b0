//! Selector resolution.
//!
//! A selector is untrusted client input. Resolution is two explicit steps:
//! [`resolve`] joins the selector onto the root and canonicalizes the result
//! (following `..` and symlinks), then [`is_contained`] checks the canonical
//! path still lies under the canonical root. Nothing is served unless both
//! steps succeed.

use std::path::{Component, Path, PathBuf};

use log::debug;
use tokio::fs;

use crate::utils::Result;

/// Split a raw request line into the selector and the optional Gopher+ or
/// search suffix that follows the first TAB.
pub fn split_request(line: &str) -> (&str, Option<&str>) {
    match line.split_once('\t') {
        Some((selector, rest)) => (selector, Some(rest)),
        None => (line, None),
    }
}

/// Strip the leading `/` characters of a selector, leaving a root-relative path.
pub fn relative(selector: &str) -> &str {
    selector.trim_start_matches('/')
}

/// Join a selector onto `root` and canonicalize the result.
///
/// `root` must already be canonical. The returned path may lie outside `root`;
/// callers check it with [`is_contained`] before serving anything.
pub async fn resolve(root: &Path, selector: &str) -> Result<PathBuf> {
    let joined = root.join(relative(selector));
    let resolved = fs::canonicalize(&joined).await?;
    debug!("resolved {:?} -> {:?}", selector, resolved);
    Ok(resolved)
}

/// Whether a canonical path lies at or below the canonical `root`.
pub fn is_contained(root: &Path, resolved: &Path) -> bool {
    resolved.starts_with(root)
        && !resolved
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir))
}

/// Resolve a selector, returning the path only if it stays inside `root`.
pub async fn resolve_contained(root: &Path, selector: &str) -> Option<PathBuf> {
    match resolve(root, selector).await {
        Ok(path) if is_contained(root, &path) => Some(path),
        Ok(path) => {
            debug!("selector {:?} escapes the root via {:?}", selector, path);
            None
        }
        Err(e) => {
            debug!("selector {:?} does not resolve: {}", selector, e);
            None
        }
    }
}

/// Render a contained path as the selector a client sends to fetch it:
/// `/` followed by the `/`-joined path relative to `root`.
pub fn to_selector(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut selector = String::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => {
                selector.push('/');
                selector.push_str(&name.to_string_lossy());
            }
            _ => return None,
        }
    }
    if selector.is_empty() {
        selector.push('/');
    }
    Some(selector)
}
