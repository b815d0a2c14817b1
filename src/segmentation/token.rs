use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Hebrew letters and their points/cantillation
    Word,
    Latin,
    Number,
    /// One punctuation character per token
    Punctuation,
    Whitespace,
    /// Foreign scripts, symbols, stray marks
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub class: TokenClass,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(class: TokenClass, text: &'a str) -> Self {
        Self { class, text }
    }

    pub fn is_word(&self) -> bool {
        self.class == TokenClass::Word
    }
}
