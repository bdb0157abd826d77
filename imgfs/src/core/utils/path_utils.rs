// SPDX-License-Identifier: MIT

//! Path helpers. Paths inside a volume are `/`-separated and absolute.

/// Converts `\` separators to `/`.
pub fn path_to_unified_str(path_str: &str) -> String {
    path_str.replace('\\', "/")
}

/// Joins two path components with a single `/`.
pub fn join_paths(base: &str, part: &str) -> String {
    let mut out = String::new();
    out.push_str(base.trim_end_matches('/'));
    out.push('/');
    out.push_str(part.trim_start_matches('/'));
    out
}

/// Non-empty components of `path`.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

/// Splits `path` into its parent and the final component.
///
/// Returns `None` for the root or an empty path.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('/') {
        Some((parent, name)) if parent.is_empty() => Some(("/", name)),
        Some((parent, name)) => Some((parent, name)),
        None => Some(("/", trimmed)),
    }
}

#[inline]
pub fn is_root(path: &str) -> bool {
    path.chars().all(|c| c == '/')
}
