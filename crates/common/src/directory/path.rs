//! Absolute, `/`-separated pod paths.

use crate::error::FdpError;

pub const ROOT: &str = "/";

/// Validate and normalize a path.
///
/// Paths must be absolute and may not contain empty, `.` or `..`
/// segments. A single trailing `/` is dropped.
pub fn normalize(path: &str) -> Result<String, FdpError> {
    let invalid = |reason: &str| FdpError::InvalidPath(format!("{}: {}", path, reason));

    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| invalid("not absolute"))?;
    if rest.is_empty() {
        return Ok(ROOT.to_string());
    }
    let rest = rest.strip_suffix('/').unwrap_or(rest);

    let mut normalized = String::with_capacity(path.len());
    for segment in rest.split('/') {
        match segment {
            "" => return Err(invalid("empty segment")),
            "." | ".." => return Err(invalid("relative segment")),
            _ => {
                normalized.push('/');
                normalized.push_str(segment);
            }
        }
    }
    Ok(normalized)
}

/// Parent of a normalized path, `None` for the root
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of a normalized path; the root's name is `/`
pub fn name(path: &str) -> &str {
    if path == ROOT {
        return ROOT;
    }
    path.rsplit('/').next().unwrap_or(path)
}
