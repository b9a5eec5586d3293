use super::{boundary_after, boundary_before, inside_include_statement};

/// Rename every boundary-delimited occurrence of each classmap symbol to
/// `classmap_prefix + symbol`, returning the rewritten text and the list
/// of renames actually performed, in application order.
///
/// Symbols are applied one at a time, each pass operating on the output
/// of the previous pass, never via a composite pattern. Callers supply
/// the symbols in a deterministic order (longest first); together with
/// the boundary rules this guarantees that renaming one symbol cannot
/// corrupt the match window of another and that results are reproducible
/// across runs.
pub fn replace_classmap(
    content: &str,
    symbols: &[String],
    classmap_prefix: &str,
) -> (String, Vec<(String, String)>) {
    let mut current = content.to_string();
    let mut renames = Vec::new();

    for symbol in symbols {
        let replacement = format!("{}{}", classmap_prefix, symbol);
        let (next, replaced) = replace_symbol(&current, symbol, &replacement);
        if replaced {
            renames.push((symbol.clone(), replacement));
        }
        current = next;
    }

    (current, renames)
}

/// Rewrite boundary-delimited occurrences of one literal `symbol` to
/// `replacement`, leaving occurrences on include/require lines untouched.
///
/// Shared by classmap replacement and ledger replay: replay matches the
/// exact original symbols already renamed elsewhere, one pair at a time.
/// Returns the rewritten text and whether anything was replaced; with no
/// match the input comes back unchanged.
pub(crate) fn replace_symbol(content: &str, symbol: &str, replacement: &str) -> (String, bool) {
    if content.is_empty() || symbol.is_empty() {
        return (content.to_string(), false);
    }

    let bytes = content.as_bytes();
    let mut out = String::new();
    let mut last = 0;
    let mut start = 0;
    let mut replaced = false;

    while let Some(found) = content[start..].find(symbol) {
        let pos = start + found;
        let end = pos + symbol.len();

        if boundary_before(bytes, pos)
            && boundary_after(bytes, end)
            && !inside_include_statement(content, pos)
        {
            out.push_str(&content[last..pos]);
            out.push_str(replacement);
            last = end;
            start = end;
            replaced = true;
        } else {
            start = pos + super::char_width(content, pos);
        }
    }

    if !replaced {
        return (content.to_string(), false);
    }

    out.push_str(&content[last..]);
    (out, replaced)
}
