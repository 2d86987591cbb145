//! Search-key folding shared by ingestion and every lookup path.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds text to its lookup key: NFKD decomposition, combining marks removed,
/// anything left outside ASCII dropped, then lower-cased.
///
/// "Beyoncé" → "beyonce", "Łódź" → "odz".
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .filter(|ch| ch.is_ascii())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Turns a caller-supplied path token into a lookup key.
///
/// Percent escapes are decoded first; a token whose escapes do not decode to
/// UTF-8 is folded as-is.
pub fn normalize_token(raw: &str) -> String {
    let decoded = match urlencoding::decode(raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.to_string(),
    };
    normalize(&decoded).trim().to_string()
}

/// Splits a comma-separated tag column into trimmed items.
/// An empty column yields no items.
pub fn split_multi(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(|item| item.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize, normalize_token, split_multi};

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(normalize("Beyoncé"), "beyonce");
        assert_eq!(normalize("Motörhead"), "motorhead");
        assert_eq!(normalize("FRANÇAIS"), "francais");
    }

    #[test]
    fn drops_characters_without_ascii_form() {
        assert_eq!(normalize("кино"), "");
        assert_eq!(normalize("Sigur Rós 日本"), "sigur ros ");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn compatibility_forms_decompose() {
        assert_eq!(normalize("ﬁ"), "fi");
        assert_eq!(normalize("Ⅳ"), "iv");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Beyoncé", "  Ça Va ", "Łódź", "ﬁesta", "K-Pop", "", "日本語", "C#m"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn token_is_decoded_and_trimmed() {
        assert_eq!(normalize_token("frANCE"), "france");
        assert_eq!(normalize_token("United%20Kingdom"), "united kingdom");
        assert_eq!(normalize_token("%20Qu%C3%A9bec%20"), "quebec");
        assert_eq!(normalize_token("C%23"), "c#");
    }

    #[test]
    fn undecodable_token_is_folded_raw() {
        assert_eq!(normalize_token("%FF%FEabc"), "%ff%feabc");
    }

    #[test]
    fn split_multi_trims_items() {
        assert_eq!(split_multi("France, Canada ,Belgium"), vec!["France", "Canada", "Belgium"]);
        assert_eq!(split_multi("Pop"), vec!["Pop"]);
        assert!(split_multi("").is_empty());
    }
}
