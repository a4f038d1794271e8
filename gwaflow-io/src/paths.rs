//! Path canonicalization.
//!
//! Submitted jobs run in whatever working directory the scheduler picks,
//! so every path handed to an external program must be absolute with
//! symlinks resolved. Outputs usually do not exist yet, so this resolves
//! the deepest existing ancestor and appends the rest, like `realpath`.

use std::path::{Component, Path, PathBuf};

use crate::error::{InputError, Result};

/// Canonicalize a path that may not exist yet.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| InputError::unreadable(".", e))?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail: Vec<Component> = Vec::new();
    loop {
        match std::fs::canonicalize(existing) {
            Ok(resolved) => return Ok(rejoin(resolved, tail.into_iter().rev())),
            Err(e) => match (existing.parent(), existing.components().next_back()) {
                (Some(parent), Some(last)) => {
                    tail.push(last);
                    existing = parent;
                }
                _ => return Err(InputError::unreadable(path, e)),
            },
        }
    }
}

/// Append components lexically, resolving `..` and `.` against the base.
fn rejoin<'a>(mut base: PathBuf, rest: impl Iterator<Item = Component<'a>>) -> PathBuf {
    for comp in rest {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                base.pop();
            }
            other => base.push(other.as_os_str()),
        }
    }
    base
}

/// Canonicalize an optional path.
pub fn canonicalize_opt(path: Option<&Path>) -> Result<Option<PathBuf>> {
    path.map(canonicalize).transpose()
}

/// `mkdir -p` for a driver's output directory. Idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| InputError::unreadable(path, e))
}
