//! Name normalization used as the exact-match key for venues and artists.
//!
//! The same function produces the `name_key` column written at insert time
//! and the lookup key computed for incoming references, so the two sides can
//! never drift apart.

/// Normalize a display name into its match key.
///
/// Case-folds, removes punctuation and symbols, and collapses runs of
/// whitespace into a single space. Alphanumeric characters from any script
/// are kept.
///
/// ```
/// use gigboard_core::normalize::normalize_name;
///
/// assert_eq!(normalize_name("  The  Rebel Lounge! "), "the rebel lounge");
/// assert_eq!(normalize_name("Rogue's Gallery"), "rogues gallery");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else if ch.is_whitespace() {
            pending_space = true;
        }
    }

    out
}

/// Key under which a venue or artist name is stored and looked up.
///
/// This is [`normalize_name`], except that a name made only of punctuation or
/// symbols (the band "!!!") keeps those characters, case-folded and with
/// whitespace collapsed. Such keys contain no alphanumerics, so they never
/// collide with a normalized key.
///
/// ```
/// use gigboard_core::normalize::match_key;
///
/// assert_eq!(match_key("Valley Bar!"), "valley bar");
/// assert_eq!(match_key(" !!! "), "!!!");
/// ```
pub fn match_key(raw: &str) -> String {
    let key = normalize_name(raw);
    if !key.is_empty() {
        return key;
    }
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compare two free-text location fields (city or state) by match key.
pub fn same_place(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize_name("Valley Bar"), "valley bar");
        assert_eq!(normalize_name("  VALLEY BAR  "), "valley bar");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize_name("Crescent \t  Ballroom"), "crescent ballroom");
        assert_eq!(normalize_name("Crescent\nBallroom"), "crescent ballroom");
    }

    #[test]
    fn strips_punctuation_without_inserting_spaces() {
        assert_eq!(normalize_name("Dream 99!"), "dream 99");
        assert_eq!(normalize_name("AC/DC"), "acdc");
        assert_eq!(normalize_name("Lo-Fi"), "lofi");
        assert_eq!(normalize_name("!!!"), "");
    }

    #[test]
    fn punctuation_between_words_keeps_single_space() {
        assert_eq!(normalize_name("Loomer - Live"), "loomer live");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(normalize_name("Sigur Rós"), "sigur rós");
        assert_eq!(normalize_name("MÖTLEY CRÜE"), "mötley crüe");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn match_key_keeps_symbol_only_names() {
        assert_eq!(match_key("!!!"), "!!!");
        assert_eq!(match_key("?  ?"), "? ?");
        assert_ne!(match_key("!!!"), match_key("???"));
        assert_eq!(match_key("Chk Chk Chk!"), "chk chk chk");
        assert_eq!(match_key("   "), "");
    }

    #[test]
    fn same_place_ignores_case_and_spacing() {
        assert!(same_place("Phoenix", " phoenix "));
        assert!(same_place("AZ", "az"));
        assert!(!same_place("Tempe", "Phoenix"));
    }
}
