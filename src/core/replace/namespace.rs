use super::{boundary_after, boundary_before, char_width};

/// Prefix every boundary-delimited occurrence of `search_namespace` with
/// `dep_namespace`.
///
/// The rename is an insertion: the matched namespace text and the
/// boundary bytes around it are preserved verbatim. An occurrence that is
/// already immediately preceded by `dep_namespace` is left alone, which
/// makes the rewrite idempotent (running it twice yields the same text
/// as running it once).
///
/// Namespace mode contributes nothing to the rename ledger: the
/// identifier itself does not change, so downstream files referencing the
/// fully-qualified path stay matchable by the same prefix insertion.
pub fn replace_namespace(content: &str, search_namespace: &str, dep_namespace: &str) -> String {
    if content.is_empty() || search_namespace.is_empty() || dep_namespace.is_empty() {
        return content.to_string();
    }

    let bytes = content.as_bytes();
    let mut out = String::new();
    let mut last = 0;
    let mut start = 0;
    let mut changed = false;

    while let Some(found) = content[start..].find(search_namespace) {
        let pos = start + found;
        let end = pos + search_namespace.len();

        let already_prefixed = content[..pos].ends_with(dep_namespace);

        if boundary_before(bytes, pos) && boundary_after(bytes, end) && !already_prefixed {
            out.push_str(&content[last..pos]);
            out.push_str(dep_namespace);
            last = pos;
            changed = true;
        }

        // Advance past the occurrence's first character (which may be
        // multi-byte) so the next scan starts on a char boundary.
        start = pos + char_width(content, pos);
    }

    if !changed {
        return content.to_string();
    }

    out.push_str(&content[last..]);
    out
}
