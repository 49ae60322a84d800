//! Display-name normalization for stored files and their chunk objects.
//!
//! The stored name and every derived chunk object name share one scheme:
//! diacritics folded to ASCII, anything outside `[A-Za-z0-9 -]` dropped,
//! whitespace runs collapsed to single hyphens, base lowercased, and the
//! original extension (text after the last dot) carried over verbatim.

/// ASCII folds for accented Latin characters. Unmapped characters fall through
/// to the character filter below and are simply dropped.
const FOLDS: &[(&str, &str)] = &[
    ("àáâãäåāăąạảấầẩẫậắằẳẵặ", "a"),
    ("ÀÁÂÃÄÅĀĂĄẠẢẤẦẨẪẬẮẰẲẴẶ", "A"),
    ("èéêëēĕėęěẹẻẽếềểễệ", "e"),
    ("ÈÉÊËĒĔĖĘĚẸẺẼẾỀỂỄỆ", "E"),
    ("ìíîïĩīĭįịỉ", "i"),
    ("ÌÍÎÏĨĪĬĮỊỈ", "I"),
    ("òóôõöøōŏőọỏốồổỗộớờởỡợ", "o"),
    ("ÒÓÔÕÖØŌŎŐỌỎỐỒỔỖỘỚỜỞỠỢ", "O"),
    ("ùúûüũūŭůűųụủứừửữự", "u"),
    ("ÙÚÛÜŨŪŬŮŰŲỤỦỨỪỬỮỰ", "U"),
    ("ýÿỳỵỷỹ", "y"),
    ("ÝŸỲỴỶỸ", "Y"),
    ("ñńņňǹ", "n"),
    ("ÑŃŅŇǸ", "N"),
    ("çćĉċč", "c"),
    ("ÇĆĈĊČ", "C"),
    ("śŝşš", "s"),
    ("ŚŜŞŠ", "S"),
    ("žźż", "z"),
    ("ŽŹŻ", "Z"),
    ("đď", "d"),
    ("ĐĎ", "D"),
    ("ţťŧ", "t"),
    ("ŢŤŦ", "T"),
    ("ĝğġģ", "g"),
    ("ĜĞĠĢ", "G"),
    ("ŕŗř", "r"),
    ("ŔŖŘ", "R"),
    ("ĺļľŀł", "l"),
    ("ĹĻĽĿŁ", "L"),
    ("æ", "ae"),
    ("Æ", "AE"),
    ("œ", "oe"),
    ("Œ", "OE"),
    ("ß", "ss"),
];

fn fold_char(c: char) -> Option<&'static str> {
    FOLDS
        .iter()
        .find(|(set, _)| set.contains(c))
        .map(|(_, replacement)| *replacement)
}

/// Split a filename into (base, extension). The extension is everything after
/// the last dot; a dot-less name yields an empty extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => (name, ""),
    }
}

fn normalize_base(base: &str) -> String {
    let mut folded = String::with_capacity(base.len());
    for c in base.chars() {
        match fold_char(c) {
            Some(s) => folded.push_str(s),
            None => folded.push(c),
        }
    }

    let mut out = String::with_capacity(folded.len());
    let mut in_whitespace = false;
    for c in folded.chars() {
        if c.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            continue;
        }
        if in_whitespace {
            out.push('-');
            in_whitespace = false;
        }
        out.push(c.to_ascii_lowercase());
    }
    if in_whitespace {
        out.push('-');
    }
    out
}

/// Normalize a caller-supplied display name. The extension keeps its original
/// casing; only the base is kebab-cased.
pub fn format_file_name(original: &str) -> String {
    let (base, ext) = split_extension(original);
    let normalized = normalize_base(base);
    if ext.is_empty() {
        normalized
    } else {
        format!("{}.{}", normalized, ext)
    }
}

/// Remote object name for one chunk: `<normalized base>-<index>.<ext>`,
/// without the dot when the original name had no extension.
pub fn chunk_object_name(original: &str, chunk_index: u64) -> String {
    let (base, ext) = split_extension(original);
    let normalized = normalize_base(base);
    if ext.is_empty() {
        format!("{}-{}", normalized, chunk_index)
    } else {
        format!("{}-{}.{}", normalized, chunk_index, ext)
    }
}
