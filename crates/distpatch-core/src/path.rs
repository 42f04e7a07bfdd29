//! Helpers for slash-separated distribution paths.
//!
//! Archive entry names carry the distribution's top-level directory
//! (`wso2am-2.1.0/bin/start.sh`). Everything else in distpatch works with
//! the *relative* path inside that directory (`bin/start.sh`), which never
//! has a leading or trailing slash.

/// Split an archive entry name into its top-level segment and the
/// relative path inside it.
///
/// A trailing `/` (directory entries) is dropped first. When the name has
/// no slash the whole name is the top-level segment and the relative path
/// is empty.
pub fn split_top_level(entry_name: &str) -> (&str, &str) {
    let trimmed = entry_name.trim_end_matches('/');
    match trimmed.split_once('/') {
        Some((top, rest)) => (top, rest),
        None => (trimmed, ""),
    }
}

/// Relative path of an archive entry, excluding the top-level directory.
pub fn relative_path(entry_name: &str) -> &str {
    split_top_level(entry_name).1
}

/// Normalize a relative path for lookups: trailing slashes are ignored.
pub fn normalize(relative_path: &str) -> &str {
    relative_path.trim_end_matches('/')
}

/// Iterate over the segments of a relative path.
pub fn segments(relative_path: &str) -> impl Iterator<Item = &str> {
    normalize(relative_path).split('/').filter(|s| !s.is_empty())
}

/// Join a parent relative path and a child segment.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Check whether `ancestor` is a strict ancestor directory of `path`.
///
/// The test is segment-aware: `lib/a` is an ancestor of `lib/a/b.jar`
/// but not of `lib/ab.jar`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    let ancestor = normalize(ancestor);
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Number of segments in a relative path.
pub fn depth(relative_path: &str) -> u32 {
    segments(relative_path).count() as u32
}
