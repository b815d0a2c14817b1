use unicode_normalization::UnicodeNormalization;

/// Alef through Tav, final forms included.
pub fn is_base_letter(c: char) -> bool {
    ('\u{05D0}'..='\u{05EA}').contains(&c)
}

/// Cantillation marks and vowel points (nikud). Maqaf, paseq, sof pasuq and
/// nun hafukha live in the same block but are punctuation.
pub fn is_hebrew_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0591}'..='\u{05BD}'
            | '\u{05BF}'
            | '\u{05C1}'
            | '\u{05C2}'
            | '\u{05C4}'
            | '\u{05C5}'
            | '\u{05C7}'
            | '\u{FB1E}'
    )
}

/// Yiddish digraphs and alphabetic presentation forms. These count as letters
/// when segmenting and are expanded before comparison.
pub fn is_letter_variant(c: char) -> bool {
    matches!(c, '\u{05F0}'..='\u{05F2}' | '\u{FB1D}' | '\u{FB1F}'..='\u{FB28}' | '\u{FB2A}'..='\u{FB4F}')
}

pub fn is_hebrew_letter(c: char) -> bool {
    is_base_letter(c) || is_letter_variant(c)
}

// Digraphs have no Unicode decomposition, so they are spelled out by hand.
// U+FB1F decomposes to U+05F2, so this runs on the decomposed text.
fn expand_digraph(c: char) -> Option<[char; 2]> {
    match c {
        '\u{05F0}' => Some(['\u{05D5}', '\u{05D5}']),
        '\u{05F1}' => Some(['\u{05D5}', '\u{05D9}']),
        '\u{05F2}' => Some(['\u{05D9}', '\u{05D9}']),
        _ => None,
    }
}

/// Canonical comparison form of a word: presentation forms and ligatures are
/// decomposed, then every code point that is not a base letter is dropped
/// (points, cantillation, punctuation, digits, Latin, whitespace, joiners).
///
/// Total and idempotent; `normalize("")` is `""`.
pub fn normalize(word: &str) -> String {
    let mut normalized = String::with_capacity(word.len());
    for c in word.nfkd() {
        match expand_digraph(c) {
            Some(letters) => normalized.extend(letters),
            None if is_base_letter(c) => normalized.push(c),
            None => {}
        }
    }
    normalized
}

pub trait NormalizeHebrew {
    fn normalize_hebrew(&self) -> String;
}

impl NormalizeHebrew for str {
    fn normalize_hebrew(&self) -> String {
        normalize(self)
    }
}

impl NormalizeHebrew for String {
    fn normalize_hebrew(&self) -> String {
        normalize(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_nikud_and_cantillation() {
        assert_eq!(normalize("בּוֹקֶר"), "בוקר");
        assert_eq!(normalize("שָׁלוֹם"), "שלום");
        // etnahta
        assert_eq!(normalize("אֶ\u{0591}רֶץ"), "ארץ");
    }

    #[test]
    fn drops_everything_outside_the_alphabet() {
        assert_eq!(normalize("  שלום, world! 42 "), "שלום");
        assert_eq!(normalize("בית\u{05BE}ספר"), "ביתספר");
        assert_eq!(normalize("abc 123 ?!"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn expands_presentation_forms_and_ligatures() {
        // shin with shin dot, vav with holam, alef-lamed ligature
        assert_eq!(normalize("\u{FB2A}\u{FB4B}\u{05DD}"), "שום");
        assert_eq!(normalize("\u{FB4F}"), "אל");
        assert_eq!(normalize("\u{05F0}\u{05F1}\u{05F2}"), "וווייי");
        // yod-yod-patah decomposes to the yod-yod digraph plus a point
        assert_eq!(normalize("\u{FB1F}"), "יי");
        assert_eq!(normalize("\u{FB1F}\u{05DF}"), "\u{05D9}\u{05D9}\u{05DF}");
    }

    #[test]
    fn keeps_final_forms() {
        assert_eq!(normalize("מֶלֶךְ"), "מלך");
        assert_eq!(normalize("ץףןםך"), "ץףןםך");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples =
            ["בּוֹקֶר טוֹב!", "\u{FB2A}\u{FB4F}", "mixed עִבְרִית text", "\u{FB1F}", "\u{05B4}\u{05B4}", "", "123"];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
            assert!(once.chars().all(is_base_letter));
        }
    }

    #[test]
    fn trait_forwards_to_normalize() {
        assert_eq!("תּוֹדָה".normalize_hebrew(), "תודה");
        assert_eq!(String::from("תּוֹדָה").normalize_hebrew(), "תודה");
    }
}
