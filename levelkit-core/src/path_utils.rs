//! Save file name utilities
//!
//! Level names come from designers and may contain anything. Save files live
//! flat in one directory, so names are sanitized before they touch the disk.

use std::path::Path;

/// Extension of level documents
pub const SAVE_EXTENSION: &str = "json";

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert a path to a normalized display string
#[inline]
pub fn path_to_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// Sanitize a file name for every platform.
///
/// Path separators are replaced too, so the result never leaves its
/// directory.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Append `.{extension}` unless `name` already ends with it (any case)
pub fn ensure_extension(name: &str, extension: &str) -> String {
    let has_extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));

    if has_extension {
        name.to_string()
    } else {
        format!("{}.{}", name, extension)
    }
}

/// File name for a save called `name`, or `None` if nothing usable remains
pub fn save_file_name(name: &str) -> Option<String> {
    let sanitized = sanitize_filename(name.trim());
    let stem = sanitized.trim_end_matches('.').trim();
    if stem.is_empty() || stem.chars().all(|c| c == '.' || c == '_') {
        return None;
    }
    Some(ensure_extension(stem, SAVE_EXTENSION))
}

/// Level name shown for a save file: the file name without `.json`
pub fn save_display_name(file_name: &str) -> &str {
    let path = Path::new(file_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case(SAVE_EXTENSION) => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name),
        _ => file_name,
    }
}
