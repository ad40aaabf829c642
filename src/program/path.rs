//! Confinement of program paths to the installation directory.

use std::path::{Component, Path, PathBuf};

use crate::error::Abort;

/// Lexically normalize `arg` as a path relative to the installation root.
///
/// `.` segments are dropped and `..` segments cancel the preceding segment.
/// No filesystem access is made. The result is rejected when it is absolute,
/// when a `..` would climb above the root, or when nothing is left (the root
/// itself is never a valid target).
pub fn confine(arg: &str) -> Result<PathBuf, Abort> {
    let unsafe_path = || Abort::UnsafePath(arg.to_string());
    let mut out = PathBuf::new();

    for component in Path::new(arg).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return Err(unsafe_path()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(unsafe_path());
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }

    if out.as_os_str().is_empty() {
        return Err(unsafe_path());
    }

    Ok(out)
}

/// [`confine`] `arg` and join it onto `root`.
pub fn resolve(root: &Path, arg: &str) -> Result<PathBuf, Abort> {
    confine(arg).map(|relative| root.join(relative))
}
