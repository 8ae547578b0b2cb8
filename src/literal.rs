//! Python-style mapping literals.
//!
//! Ground truth travels through the harness as the text of a dict literal,
//! e.g. `{'lat': 48.8566, 'long': 2.3522, 'city': 'Paris', 'country': 'France'}`.
//! This module parses that flat form and renders it back.

use crate::error::{GeoBenchError, Result};
use crate::geo::GroundTruth;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar value inside a mapping literal.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
}

impl LiteralValue {
    /// Numeric view of the value. Numeric strings are accepted as well.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Int(i) => Some(*i as f64),
            LiteralValue::Float(f) => Some(*f),
            LiteralValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String view of the value, `None` for non-strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(s) => f.write_str(&python_str_repr(s)),
            LiteralValue::Int(i) => write!(f, "{}", i),
            LiteralValue::Float(x) => f.write_str(&python_float_repr(*x)),
            LiteralValue::Bool(true) => f.write_str("True"),
            LiteralValue::Bool(false) => f.write_str("False"),
            LiteralValue::None => f.write_str("None"),
        }
    }
}

/// Parse a flat mapping literal with string keys and scalar values.
pub fn parse_mapping(text: &str) -> Result<BTreeMap<String, LiteralValue>> {
    let mut parser = Parser { src: text, pos: 0 };
    let map = parser.mapping()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(map)
}

/// Render ground truth in the literal form the dataset loader emits.
pub fn to_python_repr(truth: &GroundTruth) -> String {
    format!(
        "{{'lat': {}, 'long': {}, 'city': {}, 'country': {}}}",
        python_float_repr(truth.coordinate.lat),
        python_float_repr(truth.coordinate.lon),
        python_str_repr(&truth.city),
        python_str_repr(&truth.country)
    )
}

/// Render unparsed dataset fields verbatim as strings.
///
/// Used for rows whose coordinates are unusable; the scorer then reports
/// the target as invalid for that one sample.
pub fn raw_fields_repr(lat: &str, long: &str, city: &str, country: &str) -> String {
    format!(
        "{{'lat': {}, 'long': {}, 'city': {}, 'country': {}}}",
        python_str_repr(lat),
        python_str_repr(long),
        python_str_repr(city),
        python_str_repr(country)
    )
}

fn python_float_repr(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// Single quotes unless the string contains one and no double quote.
fn python_str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> GeoBenchError {
        GeoBenchError::Literal {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", want, c))),
            None => Err(self.error(format!("expected '{}', found end of input", want))),
        }
    }

    fn mapping(&mut self) -> Result<BTreeMap<String, LiteralValue>> {
        let mut map = BTreeMap::new();
        self.expect('{')?;
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(map);
            }

            let key = match self.peek() {
                Some('\'') | Some('"') => self.string()?,
                _ => return Err(self.error("expected a quoted key")),
            };
            self.expect(':')?;
            self.skip_ws();
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(map),
                Some(c) => return Err(self.error(format!("expected ',' or '}}', found '{}'", c))),
                None => return Err(self.error("unterminated mapping")),
            }
        }
    }

    fn value(&mut self) -> Result<LiteralValue> {
        match self.peek() {
            Some('\'') | Some('"') => Ok(LiteralValue::Str(self.string()?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                    self.bump();
                }
                match &self.src[start..self.pos] {
                    "True" => Ok(LiteralValue::Bool(true)),
                    "False" => Ok(LiteralValue::Bool(false)),
                    "None" => Ok(LiteralValue::None),
                    other => Err(GeoBenchError::Literal {
                        offset: start,
                        message: format!("unsupported name '{}'", other),
                    }),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    fn number(&mut self) -> Result<LiteralValue> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let raw = &self.src[start..self.pos];
        if let Ok(i) = raw.parse::<i64>() {
            return Ok(LiteralValue::Int(i));
        }
        raw.parse::<f64>()
            .map(LiteralValue::Float)
            .map_err(|_| GeoBenchError::Literal {
                offset: start,
                message: format!("invalid number '{}'", raw),
            })
    }

    fn string(&mut self) -> Result<String> {
        let quote = self.bump().ok_or_else(|| self.error("expected a string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }
}
