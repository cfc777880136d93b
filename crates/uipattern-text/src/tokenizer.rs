//! Identifier-aware tokenizer shared by indexing and querying.
//!
//! Component vocabularies mix prose with code identifiers (`onClick`,
//! `aria-label`, `is_active`), so camelCase humps and `_`/`-` are word
//! boundaries here.

use std::sync::LazyLock;

use regex::Regex;
use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

/// Name under which [`PatternTokenizer`] is registered on the index.
pub const TOKENIZER_NAME: &str = "pattern";

static CAMEL_HUMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("camel hump regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]+").expect("separator regex"));
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word regex"));

/// Split `text` into lower-cased word tokens.
///
/// `"onClick-aria_label"` becomes `["on", "click", "aria", "label"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    let split_humps = CAMEL_HUMP.replace_all(text, "$1 $2");
    let spaced = SEPARATORS.replace_all(&split_humps, " ");
    WORD.find_iter(&spaced).map(|m| m.as_str().to_lowercase()).collect()
}

/// Tantivy adapter around [`tokenize`] so documents are indexed with exactly
/// the terms queries are built from.
#[derive(Clone, Default)]
pub struct PatternTokenizer {
    token: Token,
}

pub struct PatternTokenStream<'a> {
    terms: std::vec::IntoIter<String>,
    token: &'a mut Token,
}

impl Tokenizer for PatternTokenizer {
    type TokenStream<'a> = PatternTokenStream<'a>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> PatternTokenStream<'a> {
        self.token.reset();
        PatternTokenStream { terms: tokenize(text).into_iter(), token: &mut self.token }
    }
}

impl TokenStream for PatternTokenStream<'_> {
    fn advance(&mut self) -> bool {
        match self.terms.next() {
            Some(term) => {
                self.token.position = self.token.position.wrapping_add(1);
                self.token.text = term;
                true
            }
            None => false,
        }
    }

    fn token(&self) -> &Token {
        self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        self.token
    }
}
