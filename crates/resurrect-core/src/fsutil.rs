//! Filesystem and path helpers shared by persistence and extraction.

use std::io;
use std::path::Path;

/// Create a directory (and its parents) if missing.
///
/// Freshly created directories are restricted to the owner on unix, since
/// saved state can contain scrollback text.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o700);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

/// Create the parent directory of a file path if missing.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Normalize a working-directory string reported by the host.
///
/// Strips a `file://` URI wrapper (with or without a host component) and
/// reduces a mingw-style `/C:/...` prefix to `C:/...`.
#[must_use]
pub fn normalize_cwd(cwd: &str) -> String {
    let path = if let Some(rest) = cwd.strip_prefix("file://") {
        if rest.starts_with('/') {
            rest.to_string()
        } else if let Some(slash_pos) = rest.find('/') {
            // file://hostname/path
            rest[slash_pos..].to_string()
        } else {
            rest.to_string()
        }
    } else {
        cwd.to_string()
    };

    strip_windows_prefix(&path)
}

/// Reduce `/C:`-style prefixes (a slash, a drive letter, a colon) to `C:`.
fn strip_windows_prefix(path: &str) -> String {
    let bytes = path.as_bytes();
    if bytes.len() >= 3
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && bytes[2] == b':'
    {
        path[1..].to_string()
    } else {
        path.to_string()
    }
}
