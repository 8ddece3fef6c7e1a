use crate::TransferError;

/// Reduces a client-supplied file name to its final path segment.
///
/// Both `/` and `\` count as separators, so directory components, `..`
/// segments and absolute prefixes (`/etc/`, `C:\`) are all discarded.
/// Trailing separators are ignored, as `basename` does (`a/b/` is `b`).
/// Rejects names whose final segment is empty, whitespace-only, `.`, `..`
/// or contains a NUL byte.
pub fn sanitize_file_name(raw: &str) -> Result<String, TransferError> {
    let name = raw
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if name.trim().is_empty() {
        return Err(TransferError::InvalidFileName(format!(
            "no file name left after stripping directories: {raw:?}"
        )));
    }

    if name == "." || name == ".." {
        return Err(TransferError::InvalidFileName(format!(
            "relative directory reference not allowed: {raw:?}"
        )));
    }

    if name.contains('\0') {
        return Err(TransferError::InvalidFileName(format!(
            "NUL byte not allowed: {raw:?}"
        )));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_parent_dir_traversal() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
    }

    #[test]
    fn strips_nested_directories() {
        assert_eq!(sanitize_file_name("a/b/c.bin").unwrap(), "c.bin");
    }

    #[test]
    fn strips_absolute_unix_path() {
        assert_eq!(sanitize_file_name("/tmp/malicious").unwrap(), "malicious");
    }

    #[test]
    fn strips_windows_path() {
        assert_eq!(sanitize_file_name("C:\\Windows\\evil.dll").unwrap(), "evil.dll");
        assert_eq!(sanitize_file_name("..\\..\\boot.ini").unwrap(), "boot.ini");
    }

    #[test]
    fn keeps_simple_filename() {
        assert_eq!(sanitize_file_name("game.iso").unwrap(), "game.iso");
        assert_eq!(sanitize_file_name(".bashrc").unwrap(), ".bashrc");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("  ").is_err());
    }

    #[test]
    fn trailing_separators_are_ignored() {
        assert_eq!(sanitize_file_name("a/b/").unwrap(), "b");
        assert_eq!(sanitize_file_name("dir/").unwrap(), "dir");
        assert_eq!(sanitize_file_name("x\\y\\\\").unwrap(), "y");
    }

    #[test]
    fn rejects_separators_only() {
        assert!(sanitize_file_name("/").is_err());
        assert!(sanitize_file_name("//\\").is_err());
        assert!(sanitize_file_name("a/../").is_err());
    }

    #[test]
    fn rejects_dot_segments() {
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("a/..").is_err());
        assert!(sanitize_file_name("./.").is_err());
    }

    #[test]
    fn rejects_nul_byte() {
        assert!(sanitize_file_name("evil\0.bin").is_err());
    }

    #[test]
    fn never_contains_separator() {
        for raw in ["../../x", "a/b\\c", "\\\\server\\share\\f", "./y"] {
            let name = sanitize_file_name(raw).unwrap();
            assert!(!name.contains('/') && !name.contains('\\'), "{raw} -> {name}");
        }
    }
}
