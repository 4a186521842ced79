//! RFC 6901 JSON Pointer helpers.
//!
//! The root document is addressed by the empty pointer `""`. Each segment is
//! escaped (`~` → `~0`, `/` → `~1`) and prefixed with `/`.

use std::borrow::Cow;

/// Escape a single reference token.
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Reverse [`escape_pointer_segment`]. `~1` is decoded before `~0` so that
/// `~01` comes back as `~1`, not `/`.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Append one escaped segment to `pointer` in place.
pub fn push_segment(pointer: &mut String, segment: &str) {
    pointer.push('/');
    pointer.push_str(&escape_pointer_segment(segment));
}

/// Return `parent` extended by one segment.
pub fn join_pointer(parent: &str, segment: &str) -> String {
    let mut pointer = String::with_capacity(parent.len() + segment.len() + 1);
    pointer.push_str(parent);
    push_segment(&mut pointer, segment);
    pointer
}

/// Split a pointer into its unescaped segments. The root pointer yields none.
pub fn split_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .strip_prefix('/')
        .unwrap_or(pointer)
        .split('/')
        .map(|segment| unescape_pointer_segment(segment).into_owned())
        .collect()
}
