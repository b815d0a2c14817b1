use super::{
    normalizer::{
        is_hebrew_letter,
        is_hebrew_mark,
    },
    token::{
        Token,
        TokenClass,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharKind {
    Letter,
    Mark,
    Latin,
    Digit,
    Space,
    Punct,
    Other,
}

impl CharKind {
    fn of(c: char) -> Self {
        if is_hebrew_letter(c) {
            CharKind::Letter
        } else if is_hebrew_mark(c) || c == '\u{200D}' {
            CharKind::Mark
        } else if c.is_ascii_alphabetic() || (('\u{00C0}'..='\u{024F}').contains(&c) && c.is_alphabetic()) {
            CharKind::Latin
        } else if c.is_ascii_digit() {
            CharKind::Digit
        } else if c.is_whitespace() {
            CharKind::Space
        } else if is_punctuation(c) {
            CharKind::Punct
        } else {
            CharKind::Other
        }
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '\u{05BE}' // maqaf
                | '\u{05C0}'
                | '\u{05C3}'
                | '\u{05C6}'
                | '\u{05F3}' // geresh
                | '\u{05F4}' // gershayim
                | '\u{00A1}'
                | '\u{00AB}'
                | '\u{00BB}'
                | '\u{00BF}'
                | '\u{2010}'..='\u{2027}'
                | '\u{2030}'..='\u{205E}'
        )
}

fn is_geresh(c: char) -> bool {
    c == '\'' || c == '\u{05F3}'
}

// ג׳ ז׳ צ׳ ת׳ ד׳ ט׳ spell foreign sounds, so the geresh belongs to the word.
fn takes_geresh(c: char) -> bool {
    matches!(c, 'ג' | 'ז' | 'צ' | 'ת' | 'ד' | 'ט')
}

/// Lazy left-to-right scan over `text`. Cloning the iterator restarts nothing
/// but gives an independent cursor; calling [`tokenize`] again starts over.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.text[self.pos..];
        let first = rest.chars().next()?;
        let start_kind = CharKind::of(first);

        let mut end = first.len_utf8();
        let mut has_letter = start_kind == CharKind::Letter;
        let mut prev = first;

        if start_kind != CharKind::Punct {
            for c in rest[end..].chars() {
                let kind = CharKind::of(c);
                let joins = match start_kind {
                    CharKind::Letter | CharKind::Mark => match kind {
                        CharKind::Letter | CharKind::Mark => true,
                        CharKind::Punct => is_geresh(c) && takes_geresh(prev),
                        _ => false,
                    },
                    _ => kind == start_kind,
                };
                if !joins {
                    break;
                }
                has_letter |= kind == CharKind::Letter;
                prev = c;
                end += c.len_utf8();
            }
        }

        let class = match start_kind {
            CharKind::Letter | CharKind::Mark if has_letter => TokenClass::Word,
            CharKind::Letter | CharKind::Mark => TokenClass::Other,
            CharKind::Latin => TokenClass::Latin,
            CharKind::Digit => TokenClass::Number,
            CharKind::Space => TokenClass::Whitespace,
            CharKind::Punct => TokenClass::Punctuation,
            CharKind::Other => TokenClass::Other,
        };

        self.pos += end;
        Some(Token::new(class, &rest[..end]))
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

/// Splits `text` into classified tokens. Concatenating every token's text
/// gives back `text` exactly.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens { text, pos: 0 }
}

/// Surface forms of the word-class tokens only.
pub fn hebrew_words(text: &str) -> impl Iterator<Item = &str> + '_ {
    tokenize(text).filter(Token::is_word).map(|token| token.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(text: &str) -> Vec<(TokenClass, &str)> {
        tokenize(text).map(|t| (t.class, t.text)).collect()
    }

    #[test]
    fn splits_a_greeting() {
        assert_eq!(
            classes("בּוֹקֶר טוֹב! איך?"),
            vec![
                (TokenClass::Word, "בּוֹקֶר"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Word, "טוֹב"),
                (TokenClass::Punctuation, "!"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Word, "איך"),
                (TokenClass::Punctuation, "?"),
            ]
        );
    }

    #[test]
    fn separates_latin_digits_and_foreign_scripts() {
        assert_eq!(
            classes("Lesson 12: שיעור Урок"),
            vec![
                (TokenClass::Latin, "Lesson"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Number, "12"),
                (TokenClass::Punctuation, ":"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Word, "שיעור"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Other, "Урок"),
            ]
        );
    }

    #[test]
    fn maqaf_splits_words_and_punctuation_is_per_character() {
        assert_eq!(
            classes("בית\u{05BE}ספר..."),
            vec![
                (TokenClass::Word, "בית"),
                (TokenClass::Punctuation, "\u{05BE}"),
                (TokenClass::Word, "ספר"),
                (TokenClass::Punctuation, "."),
                (TokenClass::Punctuation, "."),
                (TokenClass::Punctuation, "."),
            ]
        );
    }

    #[test]
    fn geresh_stays_inside_borrowed_sounds() {
        assert_eq!(hebrew_words("צ'יפס וג׳ירפה").collect::<Vec<_>>(), vec!["צ'יפס", "וג׳ירפה"]);
        // a quote after other letters is punctuation
        assert_eq!(classes("'שלום'").len(), 3);
    }

    #[test]
    fn orphan_marks_never_panic_or_vanish() {
        // leading point attaches to the following letters
        assert_eq!(classes("\u{05B4}בא"), vec![(TokenClass::Word, "\u{05B4}בא")]);
        // a point with no letter at all is its own token
        assert_eq!(
            classes("a \u{05B4} b"),
            vec![
                (TokenClass::Latin, "a"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Other, "\u{05B4}"),
                (TokenClass::Whitespace, " "),
                (TokenClass::Latin, "b"),
            ]
        );
    }

    #[test]
    fn tokens_reconstruct_the_input() {
        let samples = [
            "",
            "   ",
            "שָׁלוֹם, עוֹלָם! 3.14 ok\u{05C3}",
            "\u{FB2A}\u{FB4F} ☃ 漢字 \u{05B0}",
            "ג'\u{200D}ט",
        ];
        for sample in samples {
            let rebuilt: String = tokenize(sample).map(|t| t.text).collect();
            assert_eq!(rebuilt, sample);
        }
    }

    #[test]
    fn empty_input_yields_nothing_and_iteration_restarts() {
        assert_eq!(tokenize("").count(), 0);

        let tokens = tokenize("אחת שתיים");
        let first_pass: Vec<_> = tokens.clone().collect();
        let second_pass: Vec<_> = tokens.collect();
        assert_eq!(first_pass, second_pass);
        assert_eq!(first_pass.len(), 3);
    }
}
