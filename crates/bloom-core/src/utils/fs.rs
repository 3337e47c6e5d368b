use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Canonical path separator used by every path the kernel hands out.
pub const DS: char = '/';

/// Normalize a path string lexically.
///
/// Backslashes become `/`, repeated separators collapse, `.` segments are
/// dropped and `..` segments pop their parent. A leading `/` is preserved and
/// a trailing one is removed. Nothing touches the filesystem.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with(DS);

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split(DS) {
        match segment {
            "" | "." => {}
            ".." => {
                // Relative paths keep leading `..` segments, absolute ones cannot climb above root
                match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    _ if !absolute => segments.push(".."),
                    _ => {}
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join `sub` onto `base` and normalize the result.
///
/// An empty or absent `sub` yields the normalized base.
pub fn join_path(base: &Path, sub: Option<&str>) -> PathBuf {
    let base = base.to_string_lossy();
    match sub {
        Some(sub) if !sub.is_empty() => {
            PathBuf::from(normalize_path(&format!("{}{}{}", base, DS, sub)))
        }
        _ => PathBuf::from(normalize_path(&base)),
    }
}

/// List the regular files directly inside `dir` whose extension is one of `extensions`.
///
/// Results are sorted by file name. A missing directory yields an empty list.
pub fn files_with_extensions<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut result = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry_path = entry?.path();
        if !entry_path.is_file() {
            continue;
        }
        let matches = entry_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| extensions.iter().any(|wanted| *wanted == ext));
        if matches {
            result.push(entry_path);
        }
    }

    result.sort();
    Ok(result)
}
