//! Symbol replacement — boundary-aware lexical rewriting of PHP source.
//!
//! Two modes, one per autoload strategy:
//! 1. Namespace: occurrences of a namespace path gain a prefix in place
//! 2. Classmap: known global symbols are renamed outright, and every
//!    rename performed is recorded for later propagation
//!
//! Matching is a byte-level scan, not a parser: an occurrence counts only
//! when delimited by non-identifier bytes on both sides, so a symbol is
//! never rewritten inside a longer identifier.

mod classmap;
mod namespace;

pub use classmap::replace_classmap;
pub use namespace::replace_namespace;

pub(crate) use classmap::replace_symbol;

/// PHP identifier bytes: ASCII alphanumerics, underscore, and the
/// extended upper byte range PHP permits in identifiers.
pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x7f
}

/// Left boundary: start of content, or a non-identifier byte before `pos`.
pub(crate) fn boundary_before(bytes: &[u8], pos: usize) -> bool {
    pos == 0 || !is_ident_byte(bytes[pos - 1])
}

/// Right boundary: end of content, or a non-identifier byte at `end`.
pub(crate) fn boundary_after(bytes: &[u8], end: usize) -> bool {
    end >= bytes.len() || !is_ident_byte(bytes[end])
}

/// Byte width of the character starting at `pos`, for stepping the scan
/// without splitting a multi-byte character.
pub(crate) fn char_width(content: &str, pos: usize) -> usize {
    content[pos..].chars().next().map_or(1, |c| c.len_utf8())
}

/// True when the occurrence's line, from its start up to `pos`, contains a
/// file-inclusion keyword. Arguments to `include`/`require` name files,
/// not symbols, and must never be renamed. The scan is textual and
/// case-sensitive; a legitimate symbol use after one of these words on
/// the same line is also skipped (accepted false negative).
pub(crate) fn inside_include_statement(content: &str, pos: usize) -> bool {
    let line_start = content[..pos].rfind('\n').map_or(0, |i| i + 1);
    let window = &content[line_start..pos];
    window.contains("include") || window.contains("require")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_bytes_cover_extended_range() {
        assert!(is_ident_byte(b'a'));
        assert!(is_ident_byte(b'Z'));
        assert!(is_ident_byte(b'0'));
        assert!(is_ident_byte(b'_'));
        assert!(is_ident_byte(0x7f));
        assert!(is_ident_byte(0xff));
        assert!(!is_ident_byte(b'\\'));
        assert!(!is_ident_byte(b' '));
        assert!(!is_ident_byte(b'('));
    }

    #[test]
    fn include_window_is_line_scoped() {
        let content = "require 'a.php';\nnew Foo();\n";
        let pos = content.find("Foo").unwrap();
        assert!(!inside_include_statement(content, pos));

        let content = "require __DIR__ . '/Foo.php';\n";
        let pos = content.find("Foo").unwrap();
        assert!(inside_include_statement(content, pos));
    }
}
