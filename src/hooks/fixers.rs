//! Builtin hook fixers
//!
//! In-process versions of the usual trailing-whitespace and
//! end-of-file hooks: they rewrite the file in place and report whether
//! anything changed, so the runner can block the commit until the fix
//! is staged.

use std::io;
use std::path::Path;

/// Strip trailing spaces and tabs from every line.
///
/// Returns whether the file was modified. Files that are not valid
/// UTF-8 are left alone.
pub fn fix_trailing_whitespace(path: &Path) -> io::Result<bool> {
    let bytes = std::fs::read(path)?;
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => return Ok(false),
    };

    let mut fixed = String::with_capacity(content.len());
    let mut first = true;
    for line in content.split('\n') {
        if !first {
            fixed.push('\n');
        }
        first = false;

        // Preserve CRLF endings while trimming the payload
        let (body, cr) = match line.strip_suffix('\r') {
            Some(body) => (body, "\r"),
            None => (line, ""),
        };
        fixed.push_str(body.trim_end_matches([' ', '\t']));
        fixed.push_str(cr);
    }

    if fixed == content {
        return Ok(false);
    }
    std::fs::write(path, fixed)?;
    Ok(true)
}

/// Make the file end with exactly one newline.
///
/// Returns whether the file was modified. Empty files are left alone.
pub fn fix_end_of_file(path: &Path) -> io::Result<bool> {
    let bytes = std::fs::read(path)?;
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => return Ok(false),
    };
    if content.is_empty() {
        return Ok(false);
    }

    let trimmed = content.trim_end_matches(['\n', '\r']);
    let fixed = if trimmed.is_empty() {
        // A file of nothing but newlines collapses to empty
        String::new()
    } else {
        format!("{}\n", trimmed)
    };

    if fixed == content {
        return Ok(false);
    }
    std::fs::write(path, fixed)?;
    Ok(true)
}
