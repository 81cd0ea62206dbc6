//! Helpers for the forward-slash, `srcDir`-relative paths stored in the config.

use std::path::{Path, PathBuf};

/// Lower-cased project name with every non-alphanumeric replaced by `_`.
pub fn project_dir_name(project_name: &str) -> String {
    let name: String = project_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "project".to_owned()
    } else {
        name
    }
}

/// Join config path segments with `/`, dropping `.` and empty parts.
pub fn join(parts: &[&str]) -> String {
    normalize(&parts.join("/"))
}

/// Collapse `.`/empty segments and resolve `..` against earlier segments.
pub fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

/// Absolute location of a config-relative path.
pub fn resolve(src_root: &Path, relative: &str) -> PathBuf {
    src_root.join(normalize(relative))
}

/// Module specifier that imports `to_file` from `from_file`.
///
/// Both paths are relative to the same root. The result always starts with
/// `./` or `../`.
pub fn relative_import(from_file: &str, to_file: &str) -> String {
    let from = normalize(from_file);
    let to = normalize(to_file);
    let from_dir: Vec<&str> = {
        let mut parts: Vec<&str> = from.split('/').filter(|p| !p.is_empty()).collect();
        parts.pop();
        parts
    };
    let to_parts: Vec<&str> = to.split('/').filter(|p| !p.is_empty()).collect();

    let common = from_dir
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = Vec::new();
    segments.extend(std::iter::repeat("..").take(from_dir.len() - common));
    segments.extend(&to_parts[common..]);

    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Script extensions are dropped from import specifiers.
pub fn strip_script_extension(path: &str) -> &str {
    for ext in [".tsx", ".ts", ".jsx", ".js"] {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}
