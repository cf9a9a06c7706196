//! # Fragment Paths
//!
//! Validation engines locate failures with JSON pointers (`/aaa/0/bbb`,
//! sometimes written with a leading `#`). Reports use dotted paths
//! (`aaa.0.bbb`). This module converts between the two.

/// Convert a JSON-pointer fragment into a dotted path.
///
/// A leading run of `#` and `/` is stripped, pointer escapes (`~1`, `~0`)
/// are decoded, and the remaining segments are joined with `.`. The record
/// root (`""`, `"#"`, `"#/"`) maps to the empty path.
pub fn fragment_to_path(fragment: &str) -> String {
    pointer_segments(fragment).join(".")
}

/// Split a JSON-pointer fragment into decoded segments.
///
/// The record root yields no segments.
pub fn pointer_segments(fragment: &str) -> Vec<String> {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let body = body.trim_start_matches('/');
    if body.is_empty() {
        return Vec::new();
    }
    body.split('/').map(unescape_pointer_segment).collect()
}

/// Append a property name to a dotted path.
pub fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// Escape a single segment for inclusion in a JSON pointer.
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
