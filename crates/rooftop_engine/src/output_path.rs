use crate::RenderError;

/// Turns a user-supplied output path into a safe, relative, `/`-separated
/// asset path.
///
/// Absolute paths and `..` segments are rejected; characters that are not
/// portable in file names become `_`, and reserved Windows device names get a
/// trailing `_` on their stem.
pub fn sanitize_output_path(raw: &str) -> Result<String, RenderError> {
    let invalid = |reason| RenderError::InvalidOutputPath {
        path: raw.to_string(),
        reason,
    };

    let unified = raw.trim().replace('\\', "/");
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(invalid("absolute paths are not allowed"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid("parent directory segments are not allowed")),
            other => segments.push(sanitize_segment(other)),
        }
    }
    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments.join("/"))
}

fn sanitize_segment(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_end_matches([' ', '.']);
    if cleaned.is_empty() {
        return "_".to_string();
    }

    let (stem, ext) = match cleaned.find('.') {
        Some(idx) => cleaned.split_at(idx),
        None => (cleaned, ""),
    };
    if is_reserved_windows_name(stem) {
        format!("{stem}_{ext}")
    } else {
        cleaned.to_string()
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn is_forbidden(c: char) -> bool {
    matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}')
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
