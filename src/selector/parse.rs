use std::collections::BTreeSet;

use log::trace;
use once_cell::sync::Lazy;

use crate::{
    error::{Result, SelectorSyntaxError, unexpected},
    selector::{
        lexer::{Lexer, Token},
        requirement::{Operator, Requirement},
    },
};

/// How `in` and `notin` are read at a given point: as operators, or as
/// plain identifiers when a key or value is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserContext {
    KeyAndOperator,
    Values,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScannedItem<'a> {
    token: Token,
    literal: &'a str,
}

static BINARY_OPERATORS: Lazy<String> = Lazy::new(|| Operator::join(&Operator::BINARY));

/// Recursive descent over a fully scanned token buffer.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    scanned: Vec<ScannedItem<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            scanned: Vec::new(),
            position: 0,
        }
    }

    /// Lex the whole input into the token buffer, stopping at the end of
    /// the string or the first symbol run the lexer cannot place.
    fn scan(&mut self) -> Result<()> {
        loop {
            let (token, literal) = self.lexer.lex();
            if token == Token::Error {
                return Err(SelectorSyntaxError::UnknownSymbol {
                    literal: literal.to_string(),
                });
            }
            self.scanned.push(ScannedItem { token, literal });
            if token == Token::EndOfString {
                break;
            }
        }
        trace!("scanned selector tokens: {:?}", self.scanned);
        Ok(())
    }

    // Reads past the end keep returning the final EndOfString.
    fn item(&self) -> (Token, &'a str) {
        match self.scanned.get(self.position).or(self.scanned.last()) {
            Some(item) => (item.token, item.literal),
            None => (Token::EndOfString, ""),
        }
    }

    fn in_context(token: Token, context: ParserContext) -> Token {
        match (context, token) {
            (ParserContext::Values, Token::In | Token::NotIn) => Token::Identifier,
            _ => token,
        }
    }

    pub(crate) fn lookahead(&self, context: ParserContext) -> (Token, &'a str) {
        let (token, literal) = self.item();
        (Self::in_context(token, context), literal)
    }

    pub(crate) fn consume(&mut self, context: ParserContext) -> (Token, &'a str) {
        let (token, literal) = self.item();
        self.position += 1;
        (Self::in_context(token, context), literal)
    }

    /// Parse the input into its requirements, in textual order.
    pub fn parse(mut self) -> Result<Vec<Requirement>> {
        self.scan()?;

        let mut requirements = Vec::new();
        loop {
            let (token, literal) = self.lookahead(ParserContext::Values);
            match token {
                Token::Identifier | Token::DoesNotExist => {
                    let requirement = self
                        .parse_requirement()
                        .map_err(|e| SelectorSyntaxError::Requirement(Box::new(e)))?;
                    requirements.push(requirement);

                    let (token, literal) = self.consume(ParserContext::Values);
                    match token {
                        Token::EndOfString => return Ok(requirements),
                        Token::Comma => {
                            let (next, literal) = self.lookahead(ParserContext::Values);
                            if next != Token::Identifier && next != Token::DoesNotExist {
                                return Err(unexpected(literal, "identifier after ','"));
                            }
                        }
                        _ => return Err(unexpected(literal, "',' or 'end of string'")),
                    }
                }
                Token::EndOfString => return Ok(requirements),
                _ => {
                    return Err(unexpected(
                        literal,
                        "'!', identifier, or 'end of string'",
                    ));
                }
            }
        }
    }

    fn parse_requirement(&mut self) -> Result<Requirement> {
        let (key, operator) = self.parse_key_and_infer_operator()?;
        if let Some(operator) = operator {
            return Requirement::new(key, operator, BTreeSet::<String>::new());
        }

        let operator = self.parse_operator()?;
        let values = match operator {
            Operator::In | Operator::NotIn => self.parse_values()?,
            Operator::Equals
            | Operator::DoubleEquals
            | Operator::NotEquals
            | Operator::GreaterThan
            | Operator::LessThan => self.parse_exact_value()?,
            Operator::Exists | Operator::DoesNotExist => {
                return Err(unexpected(operator.as_str(), BINARY_OPERATORS.as_str()));
            }
        };
        Requirement::new(key, operator, values)
    }

    /// Key, plus the operator when the key alone decides it: `!key` is
    /// does-not-exist, a bare key followed by `,` or the end is exists.
    fn parse_key_and_infer_operator(&mut self) -> Result<(&'a str, Option<Operator>)> {
        let mut operator = None;
        let (mut token, mut literal) = self.consume(ParserContext::Values);
        if token == Token::DoesNotExist {
            operator = Some(Operator::DoesNotExist);
            (token, literal) = self.consume(ParserContext::Values);
        }

        if token != Token::Identifier {
            return Err(unexpected(literal, "identifier"));
        }

        let (next, _) = self.lookahead(ParserContext::Values);
        if matches!(next, Token::EndOfString | Token::Comma) && operator.is_none() {
            operator = Some(Operator::Exists);
        }
        Ok((literal, operator))
    }

    fn parse_operator(&mut self) -> Result<Operator> {
        let (token, literal) = self.consume(ParserContext::KeyAndOperator);
        match token {
            Token::In => Ok(Operator::In),
            Token::Equals => Ok(Operator::Equals),
            Token::DoubleEquals => Ok(Operator::DoubleEquals),
            Token::GreaterThan => Ok(Operator::GreaterThan),
            Token::LessThan => Ok(Operator::LessThan),
            Token::NotIn => Ok(Operator::NotIn),
            Token::NotEquals => Ok(Operator::NotEquals),
            _ => Err(unexpected(literal, BINARY_OPERATORS.as_str())),
        }
    }

    /// `( ... )` after `in`/`notin`. `()` reads as the single empty value.
    fn parse_values(&mut self) -> Result<BTreeSet<String>> {
        let (token, literal) = self.consume(ParserContext::Values);
        if token != Token::OpenPar {
            return Err(unexpected(literal, "'('"));
        }

        let (token, literal) = self.lookahead(ParserContext::Values);
        match token {
            Token::Identifier | Token::Comma => {
                let values = self.parse_identifiers_list()?;
                let (token, literal) = self.consume(ParserContext::Values);
                if token != Token::ClosedPar {
                    return Err(unexpected(literal, "')'"));
                }
                Ok(values)
            }
            Token::ClosedPar => {
                self.consume(ParserContext::Values);
                Ok(BTreeSet::from([String::new()]))
            }
            _ => Err(unexpected(literal, "',', ')', or identifier")),
        }
    }

    /// Comma separated identifiers up to, not including, the closing
    /// parenthesis. Empty slots (`(,a`, `a,,b`, `a,)`) add the empty string.
    fn parse_identifiers_list(&mut self) -> Result<BTreeSet<String>> {
        let mut values = BTreeSet::new();
        loop {
            let (token, literal) = self.consume(ParserContext::Values);
            match token {
                Token::Identifier => {
                    values.insert(literal.to_string());
                    let (next, literal) = self.lookahead(ParserContext::Values);
                    match next {
                        Token::Comma => continue,
                        Token::ClosedPar => return Ok(values),
                        _ => return Err(unexpected(literal, "',' or ')'")),
                    }
                }
                Token::Comma => {
                    if values.is_empty() {
                        values.insert(String::new());
                    }
                    let (next, _) = self.lookahead(ParserContext::Values);
                    match next {
                        Token::ClosedPar => {
                            values.insert(String::new());
                            return Ok(values);
                        }
                        Token::Comma => {
                            self.consume(ParserContext::Values);
                            values.insert(String::new());
                        }
                        _ => {}
                    }
                }
                _ => return Err(unexpected(literal, "',', or identifier")),
            }
        }
    }

    /// The single value after `=`, `==`, `!=`, `>` or `<`; empty when the
    /// requirement ends right after the operator.
    fn parse_exact_value(&mut self) -> Result<BTreeSet<String>> {
        let (token, _) = self.lookahead(ParserContext::Values);
        if matches!(token, Token::EndOfString | Token::Comma) {
            return Ok(BTreeSet::from([String::new()]));
        }

        let (token, literal) = self.consume(ParserContext::Values);
        if token == Token::Identifier {
            Ok(BTreeSet::from([literal.to_string()]))
        } else {
            Err(unexpected(literal, "identifier"))
        }
    }
}

/// Parse selector text into its requirements, unsorted.
pub fn parse(input: &str) -> Result<Vec<Requirement>> {
    Parser::new(input).parse()
}
