//! String pre-processing for text matching and string ordering
//!
//! Transformations apply in a fixed order: diacritic folding first, then
//! case folding. The order is observable — `İ` decomposes to `I` plus a
//! combining dot that folding removes, so folding before lowercasing yields
//! a different result than the reverse.

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

use crate::eval::EvalOptions;

/// Apply the configured transformations to one side of a text operation.
pub(crate) fn process<'a>(s: &'a str, options: &EvalOptions) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(s);
    if options.fold_diacritics {
        out = Cow::Owned(fold_diacritics(&out));
    }
    if options.ignore_case {
        out = Cow::Owned(lowercase(&out, options.locale.as_deref()));
    }
    out
}

/// Canonical decomposition, then drop the combining-diacritical-marks block
/// (U+0300..U+036F).
pub(crate) fn fold_diacritics(s: &str) -> String {
    s.nfd()
        .filter(|c| !matches!(*c, '\u{0300}'..='\u{036f}'))
        .collect()
}

/// Locale-aware lowercase. Locales whose primary subtag is `tr` or `az`
/// apply the dotted/dotless-I rules; everything else uses the Unicode
/// default mapping.
pub(crate) fn lowercase(s: &str, locale: Option<&str>) -> String {
    match locale.map(primary_subtag) {
        Some(tag) if tag.eq_ignore_ascii_case("tr") || tag.eq_ignore_ascii_case("az") => {
            turkish_lowercase(s)
        }
        _ => s.to_lowercase(),
    }
}

fn primary_subtag(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

fn turkish_lowercase(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            _ => out.extend(ch.to_lowercase()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(fold: bool, case: bool, locale: Option<&str>) -> EvalOptions {
        EvalOptions {
            ignore_case: case,
            fold_diacritics: fold,
            locale: locale.map(str::to_string),
        }
    }

    #[test]
    fn diacritic_folding_strips_combining_marks() {
        assert_eq!(fold_diacritics("Café au lait"), "Cafe au lait");
        assert_eq!(fold_diacritics("naïve"), "naive");
        // Already-decomposed input folds the same way
        assert_eq!(fold_diacritics("Cafe\u{0301}"), "Cafe");
    }

    #[test]
    fn default_lowercase_is_locale_independent() {
        assert_eq!(lowercase("CAFETERIA", None), "cafeteria");
        assert_eq!(lowercase("Straße", None), "straße");
    }

    #[test]
    fn turkish_locale_maps_dotted_and_dotless_i() {
        assert_eq!(lowercase("DIŞ", Some("tr")), "dış");
        assert_eq!(lowercase("İstanbul", Some("tr-TR")), "istanbul");
        assert_eq!(lowercase("I", Some("az_AZ")), "ı");
        // Other locales keep the default mapping
        assert_eq!(lowercase("I", Some("en-US")), "i");
    }

    #[test]
    fn fold_then_case_is_the_fixed_order() {
        // İ folds to plain I (the combining dot above is dropped), which the
        // Turkish mapping then lowercases to dotless ı. Casing first would
        // produce a dotted i instead.
        let folded_first = process("İ", &opts(true, true, Some("tr")));
        assert_eq!(folded_first.as_ref(), "ı");

        let cased_only = process("İ", &opts(false, true, Some("tr")));
        assert_eq!(cased_only.as_ref(), "i");
    }

    #[test]
    fn no_options_borrows_the_input() {
        let processed = process("Café", &opts(false, false, None));
        assert!(matches!(processed, Cow::Borrowed(_)));
        assert_eq!(processed.as_ref(), "Café");
    }
}
