//! Sandboxed path resolution.

use std::path::{Component, Path, PathBuf};

use super::ServeError;

/// Resolves a requested URL path against the sandbox root.
///
/// The path is joined onto the root and normalized lexically: `.` segments
/// are dropped and `..` segments pop the previous one. Any path that would
/// land outside the root, including via an embedded absolute component,
/// is rejected with [`ServeError::PathEscape`].
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, ServeError> {
    let mut resolved = root.to_path_buf();

    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(root) {
                    return Err(ServeError::PathEscape);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(ServeError::PathEscape),
        }
    }

    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        Err(ServeError::PathEscape)
    }
}
