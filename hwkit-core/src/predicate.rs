// SPDX-License-Identifier: GPL-3.0-only

//! Device predicates such as
//! `[ IS StorageVolume AND StorageVolume.usage == 'FileSystem' ]`.

use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use hwkit_contracts::{HwError, HwErrorKind};
use hwkit_types::{DeviceInterfaceType, PropertyValue};

use crate::device::DeviceNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid predicate at offset {position}: {message}")]
pub struct PredicateError {
    pub position: usize,
    pub message: String,
}

impl From<PredicateError> for HwError {
    fn from(e: PredicateError) -> Self {
        HwError::new(HwErrorKind::InvalidInput, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Equals,
    /// `&`
    Mask,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Is(DeviceInterfaceType),
    Property {
        interface: DeviceInterfaceType,
        property: String,
        comparison: Comparison,
        value: PropertyValue,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn matches(&self, device: &DeviceNode) -> bool {
        match self {
            Self::Is(interface) => device.supports(*interface),
            Self::And(left, right) => left.matches(device) && right.matches(device),
            Self::Or(left, right) => left.matches(device) || right.matches(device),
            Self::Property {
                interface,
                property,
                comparison,
                value,
            } => {
                let Some(view) = device.interface(*interface) else {
                    return false;
                };
                let report = match view.report() {
                    Ok(report) => report,
                    Err(e) => {
                        debug!("Cannot evaluate {interface}.{property} on {}: {e}", device.udi());
                        return false;
                    }
                };
                report
                    .get(property)
                    .is_some_and(|actual| compare(actual, *comparison, value))
            }
        }
    }
}

fn compare(actual: &PropertyValue, comparison: Comparison, expected: &PropertyValue) -> bool {
    match comparison {
        Comparison::Equals => equals(actual, expected),
        Comparison::Mask => mask(actual, expected),
    }
}

fn equals(actual: &PropertyValue, expected: &PropertyValue) -> bool {
    use PropertyValue::*;

    match (actual, expected) {
        (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
        (List(a), List(b)) => a.len() == b.len() && a.iter().all(|item| b.contains(item)),
        (a, b) => a == b,
    }
}

fn mask(actual: &PropertyValue, expected: &PropertyValue) -> bool {
    use PropertyValue::*;

    match (actual, expected) {
        (Int(a), Int(b)) => a & b != 0,
        (List(items), List(wanted)) => wanted.iter().any(|w| items.contains(w)),
        (List(items), wanted @ String(_)) => items.contains(wanted),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Int(i64),
    Float(f64),
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Dot,
    Equals,
    Ampersand,
}

fn error(position: usize, message: impl Into<String>) -> PredicateError {
    PredicateError {
        position,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, PredicateError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '[' => Token::OpenBracket,
            ']' => Token::CloseBracket,
            '{' => Token::OpenBrace,
            '}' => Token::CloseBrace,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '&' => Token::Ampersand,
            '=' => match chars.next() {
                Some((_, '=')) => Token::Equals,
                _ => return Err(error(pos, "expected '=='")),
            },
            '\'' => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, c)) => value.push(c),
                        None => return Err(error(pos, "unterminated string")),
                    }
                }
                Token::Str(value)
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::from(c);
                while let Some((_, next)) = chars.peek() {
                    if next.is_ascii_digit() || *next == '.' {
                        number.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if number.contains('.') {
                    let value = number
                        .parse()
                        .map_err(|_| error(pos, format!("invalid number '{number}'")))?;
                    Token::Float(value)
                } else {
                    let value = number
                        .parse()
                        .map_err(|_| error(pos, format!("invalid number '{number}'")))?;
                    Token::Int(value)
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut word = String::from(c);
                while let Some((_, next)) = chars.peek() {
                    if next.is_alphanumeric() || *next == '_' {
                        word.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Word(word)
            }
            other => return Err(error(pos, format!("unexpected character '{other}'"))),
        };
        tokens.push((pos, token));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    index: usize,
    end: usize,
}

impl Parser {
    fn position(&self) -> usize {
        self.tokens
            .get(self.index)
            .map(|(pos, _)| *pos)
            .unwrap_or(self.end)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(_, t)| t.clone());
        self.index += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(_, t)| t)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), PredicateError> {
        let position = self.position();
        match self.next() {
            Some(token) if token == expected => Ok(()),
            _ => Err(error(position, format!("expected {what}"))),
        }
    }

    fn word(&mut self, what: &str) -> Result<String, PredicateError> {
        let position = self.position();
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            _ => Err(error(position, format!("expected {what}"))),
        }
    }

    fn interface(&mut self) -> Result<DeviceInterfaceType, PredicateError> {
        let position = self.position();
        let name = self.word("an interface name")?;
        DeviceInterfaceType::from_name(&name)
            .ok_or_else(|| error(position, format!("unknown interface '{name}'")))
    }

    fn predicate(&mut self) -> Result<Predicate, PredicateError> {
        if self.peek() == Some(&Token::OpenBracket) {
            self.next();
            let left = self.predicate()?;
            let position = self.position();
            let operator = self.word("AND or OR")?;
            let right = self.predicate()?;
            self.expect(Token::CloseBracket, "']'")?;

            return match operator.to_ascii_uppercase().as_str() {
                "AND" => Ok(Predicate::And(Box::new(left), Box::new(right))),
                "OR" => Ok(Predicate::Or(Box::new(left), Box::new(right))),
                _ => Err(error(position, format!("expected AND or OR, found '{operator}'"))),
            };
        }

        if matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case("IS")) {
            self.next();
            return Ok(Predicate::Is(self.interface()?));
        }

        let interface = self.interface()?;
        self.expect(Token::Dot, "'.'")?;
        let property = self.word("a property name")?;
        let position = self.position();
        let comparison = match self.next() {
            Some(Token::Equals) => Comparison::Equals,
            Some(Token::Ampersand) => Comparison::Mask,
            _ => return Err(error(position, "expected '==' or '&'")),
        };
        let value = self.value()?;

        Ok(Predicate::Property {
            interface,
            property,
            comparison,
            value,
        })
    }

    fn value(&mut self) -> Result<PropertyValue, PredicateError> {
        let position = self.position();
        match self.next() {
            Some(Token::Str(s)) => Ok(PropertyValue::String(s)),
            Some(Token::Int(i)) => Ok(PropertyValue::Int(i)),
            Some(Token::Float(f)) => Ok(PropertyValue::Float(f)),
            Some(Token::Word(w)) if w == "true" => Ok(PropertyValue::Bool(true)),
            Some(Token::Word(w)) if w == "false" => Ok(PropertyValue::Bool(false)),
            Some(Token::OpenBrace) => {
                let mut items = Vec::new();
                if self.peek() == Some(&Token::CloseBrace) {
                    self.next();
                    return Ok(PropertyValue::List(items));
                }
                loop {
                    items.push(self.value()?);
                    let position = self.position();
                    match self.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::CloseBrace) => break,
                        _ => return Err(error(position, "expected ',' or '}'")),
                    }
                }
                Ok(PropertyValue::List(items))
            }
            _ => Err(error(position, "expected a value")),
        }
    }
}

impl FromStr for Predicate {
    type Err = PredicateError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            tokens: tokenize(input)?,
            index: 0,
            end: input.len(),
        };
        let predicate = parser.predicate()?;
        if parser.peek().is_some() {
            return Err(error(parser.position(), "trailing input"));
        }
        Ok(predicate)
    }
}
