use std::collections::HashMap;

use nom::{
    IResult,
    Parser,
    bytes::complete::{take_till, take_while},
};
use once_cell::sync::Lazy;

/// Kinds of token the selector lexer produces. The literal text travels
/// beside the token, never inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Error,
    EndOfString,
    ClosedPar,
    Comma,
    DoesNotExist,
    DoubleEquals,
    Equals,
    GreaterThan,
    Identifier,
    In,
    LessThan,
    NotEquals,
    NotIn,
    OpenPar,
}

/// Literal -> token table for keywords and symbol runs.
pub static STRING_TO_TOKEN: Lazy<HashMap<&'static str, Token>> = Lazy::new(|| {
    HashMap::from([
        (")", Token::ClosedPar),
        (",", Token::Comma),
        ("!", Token::DoesNotExist),
        ("==", Token::DoubleEquals),
        ("=", Token::Equals),
        (">", Token::GreaterThan),
        ("in", Token::In),
        ("<", Token::LessThan),
        ("!=", Token::NotEquals),
        ("notin", Token::NotIn),
        ("(", Token::OpenPar),
    ])
});

const SPECIAL_SYMBOLS: [char; 7] = ['=', '!', '(', ')', ',', '>', '<'];

pub fn is_special_symbol(c: char) -> bool {
    SPECIAL_SYMBOLS.contains(&c)
}

fn ends_identifier(c: char) -> bool {
    c.is_whitespace() || is_special_symbol(c)
}

/// Whether `text` lexes as a single identifier (or nothing, when empty).
pub fn is_identifier(text: &str) -> bool {
    !text.chars().any(ends_identifier)
}

/// Hand-rolled scanner over selector text with single character pushback.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.pos..]
    }

    /// Next character, or `None` once the input is exhausted.
    pub fn read(&mut self) -> Option<char> {
        let ch = self.rest().chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Push the last read character back.
    pub fn unread(&mut self) {
        if let Some(ch) = self.input[..self.pos].chars().next_back() {
            self.pos -= ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        let spaces: IResult<&str, &str> = take_while(char::is_whitespace).parse(self.rest());
        if let Ok((_, skipped)) = spaces {
            self.pos += skipped.len();
        }
    }

    fn scan_id_or_keyword(&mut self) -> (Token, &'a str) {
        let word: IResult<&str, &str> = take_till(ends_identifier).parse(self.rest());
        let word = match word {
            Ok((_, word)) => word,
            Err(_) => "",
        };
        self.pos += word.len();

        let token = STRING_TO_TOKEN
            .get(word)
            .copied()
            .unwrap_or(Token::Identifier);
        (token, word)
    }

    /// Greedy longest match of a symbol run against the token table. Once a
    /// prefix has matched, the first character that breaks the match is
    /// pushed back and the last confirmed token is returned.
    fn scan_special_symbol(&mut self) -> (Token, &'a str) {
        let input = self.input;
        let start = self.pos;
        let mut last = None;

        while let Some(ch) = self.read() {
            if !is_special_symbol(ch) {
                self.unread();
                break;
            }

            let buffer = &input[start..self.pos];
            if let Some(&token) = STRING_TO_TOKEN.get(buffer) {
                last = Some((token, buffer));
                continue;
            }

            if last.is_some() {
                self.unread();
                break;
            }
        }

        last.unwrap_or((Token::Error, &input[start..self.pos]))
    }

    /// Produce the next token and its literal. `EndOfString` comes back with
    /// an empty literal; an unrecognised symbol run comes back as `Error`
    /// with the run as its literal.
    pub fn lex(&mut self) -> (Token, &'a str) {
        self.skip_whitespace();
        match self.read() {
            None => (Token::EndOfString, ""),
            Some(ch) => {
                self.unread();
                if is_special_symbol(ch) {
                    self.scan_special_symbol()
                } else {
                    self.scan_id_or_keyword()
                }
            }
        }
    }
}
