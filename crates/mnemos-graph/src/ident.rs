// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic entity-id minting.
//!
//! Ids are derived from a normalized form of the entity name: lower-cased,
//! accents folded to ASCII, non-alphanumeric runs collapsed to `_`. On
//! collision with a different entity a numeric suffix is appended. Once
//! minted an id is never regenerated.

/// Normalizes a display name into an id slug.
pub fn slug(name: &str) -> String {
    fn push(c: char, out: &mut String, last_was_sep: &mut bool) {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            out.push(lower);
            *last_was_sep = false;
        } else if !*last_was_sep {
            out.push('_');
            *last_was_sep = true;
        }
    }

    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        match fold_accent(c) {
            Some(folded) => {
                for f in folded.chars() {
                    push(f, &mut out, &mut last_was_sep);
                }
            }
            None => push(c, &mut out, &mut last_was_sep),
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        "entity".to_string()
    } else {
        out
    }
}

/// Mints an id for `name` that is not yet present according to `taken`.
pub fn mint_id(name: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = slug(name);
    if !taken(&base) {
        return base;
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Folds common accented Latin characters to their ASCII base.
/// Returns `None` for characters outside the table.
fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => "a",
        'À' | 'Â' | 'Ä' | 'Á' | 'Ã' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'î' | 'ï' | 'í' | 'ì' => "i",
        'Î' | 'Ï' | 'Í' | 'Ì' => "I",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
        'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => "O",
        'û' | 'ü' | 'ú' | 'ù' => "u",
        'Û' | 'Ü' | 'Ú' | 'Ù' => "U",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'œ' => "oe",
        'Œ' => "OE",
        'æ' => "ae",
        'Æ' => "AE",
        _ => return None,
    };
    Some(folded)
}
