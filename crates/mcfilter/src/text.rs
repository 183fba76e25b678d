//! Case folding.
//!
//! Two folds exist and they are deliberately not unified:
//!
//! - **Invariant** folding lowercases one character at a time with the Unicode
//!   default mapping. Exact equality uses it.
//! - **Cultural** folding lowercases the whole string under a [`Locale`], so
//!   context-dependent rules (final sigma) and locale rules (Turkic dotted and
//!   dotless I) apply. Substring search uses it.
//!
//! The two agree on almost all input; where they differ, equality and
//! substring tests can disagree on the same pair of strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    Default,
    /// Turkish and Azerbaijani: `I` folds to `ı`, `İ` folds to `i`.
    Turkic,
}

impl Locale {
    /// Resolve a BCP-47 style tag such as `"en-US"` or `"tr_TR"`.
    pub fn from_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "tr" | "az" => Locale::Turkic,
            _ => Locale::Default,
        }
    }
}

/// Equality under invariant case folding.
pub fn eq_invariant(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Lowercase `s` under `locale`.
pub fn fold_cultural(s: &str, locale: Locale) -> String {
    match locale {
        Locale::Default => s.to_lowercase(),
        Locale::Turkic => s
            .chars()
            .map(|c| match c {
                'I' => 'ı',
                'İ' => 'i',
                other => other,
            })
            .collect::<String>()
            .to_lowercase(),
    }
}

/// Substring search, culture-sensitive when `case_insensitive` is set.
pub fn contains(haystack: &str, needle: &str, case_insensitive: bool, locale: Locale) -> bool {
    if case_insensitive {
        fold_cultural(haystack, locale).contains(&fold_cultural(needle, locale))
    } else {
        haystack.contains(needle)
    }
}

/// Exact comparison, invariant-folded when `case_insensitive` is set.
pub fn equals(a: &str, b: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        eq_invariant(a, b)
    } else {
        a == b
    }
}
