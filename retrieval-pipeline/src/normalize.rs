//! Language-aware text canonicalization shared by indexing and querying.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const ALEF: char = 'ا';
const YA: char = 'ي';
const HAMZA: char = 'ء';

// Word characters, whitespace and the Arabic blocks survive; everything else becomes a space.
static DISALLOWED: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"[^\w\s\x{0600}-\x{06FF}\x{0750}-\x{077F}\x{08A0}-\x{08FF}\x{FB50}-\x{FDFF}\x{FE70}-\x{FEFF}]",
    )
    .ok()
});

/// Folds letter variants, strips tashkeel and punctuation, and collapses whitespace.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let folded: String = text
        .nfc()
        .map(fold_letter)
        .filter(|c| !is_tashkeel(*c))
        .collect();

    let cleaned = match DISALLOWED.as_ref() {
        Some(re) => re.replace_all(&folded, " ").into_owned(),
        None => folded,
    };

    collapse_whitespace(&cleaned)
}

/// Maps alef, ya and waw-hamza variants to their canonical forms. Ya-hamza is kept.
pub const fn fold_letter(c: char) -> char {
    match c {
        'أ' | 'إ' | 'آ' | 'ٱ' => ALEF,
        'ى' => YA,
        'ؤ' => HAMZA,
        other => other,
    }
}

/// Arabic harakat, tanween, shadda, sukun and the superscript alef.
pub const fn is_tashkeel(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{0652}' | '\u{0670}')
}

/// True when the text contains at least one letter from the Arabic blocks.
pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c,
            '\u{0600}'..='\u{06FF}'
                | '\u{0750}'..='\u{077F}'
                | '\u{08A0}'..='\u{08FF}'
                | '\u{FB50}'..='\u{FDFF}'
                | '\u{FE70}'..='\u{FEFF}'
        ) && c.is_alphabetic()
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
