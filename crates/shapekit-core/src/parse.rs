//! Parser for the canonical type-declaration syntax.
//!
//! Accepts exactly the grammar the stringifier emits, so any rendered
//! descriptor parses back. Precedence, loosest first: union `|`,
//! intersection `&`, then prefix `?` and the atoms (`array<...>`,
//! `array{...}`, names, parenthesized groups).

use crate::ast::{KeyLiteral, ScalarKind, ShapeField, TypeExpr};
use std::fmt;

/// Syntax error with a byte offset into the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse a type declaration into the compiler's input tree.
pub fn parse(input: &str) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    parser.skip_ws();
    let expr = parser.union()?;
    parser.skip_ws();
    if parser.pos < parser.input.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> ParseError {
        ParseError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), ParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c as char)))
        }
    }

    fn union(&mut self) -> Result<TypeExpr, ParseError> {
        let mut members = vec![self.intersection()?];
        loop {
            self.skip_ws();
            if !self.eat(b'|') {
                break;
            }
            self.skip_ws();
            members.push(self.intersection()?);
        }
        Ok(if members.len() == 1 {
            members.pop().ok_or_else(|| self.error("empty union"))?
        } else {
            TypeExpr::Union(members)
        })
    }

    fn intersection(&mut self) -> Result<TypeExpr, ParseError> {
        let mut members = vec![self.prefix()?];
        loop {
            self.skip_ws();
            if !self.eat(b'&') {
                break;
            }
            self.skip_ws();
            members.push(self.prefix()?);
        }
        Ok(if members.len() == 1 {
            members.pop().ok_or_else(|| self.error("empty intersection"))?
        } else {
            TypeExpr::Intersection(members)
        })
    }

    fn prefix(&mut self) -> Result<TypeExpr, ParseError> {
        if self.eat(b'?') {
            self.skip_ws();
            let inner = self.prefix()?;
            return Ok(TypeExpr::Nullable(Box::new(inner)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<TypeExpr, ParseError> {
        self.skip_ws();
        if self.eat(b'(') {
            self.skip_ws();
            let inner = self.union()?;
            self.skip_ws();
            self.expect(b')')?;
            return Ok(inner);
        }
        let name = self.ident()?;
        if name == "array" {
            self.skip_ws();
            match self.peek() {
                Some(b'<') => return self.array_of(),
                Some(b'{') => return self.shape(),
                _ => {}
            }
        }
        Ok(match ScalarKind::from_name(&name) {
            Some(kind) => TypeExpr::Scalar(kind),
            None => TypeExpr::Name(name),
        })
    }

    fn array_of(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect(b'<')?;
        self.skip_ws();
        let first = self.union()?;
        self.skip_ws();
        let expr = if self.eat(b',') {
            self.skip_ws();
            let element = self.union()?;
            TypeExpr::keyed_array_of(first, element)
        } else {
            TypeExpr::array_of(first)
        };
        self.skip_ws();
        self.expect(b'>')?;
        Ok(expr)
    }

    fn shape(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect(b'{')?;
        let mut fields = Vec::new();
        self.skip_ws();
        if !self.eat(b'}') {
            loop {
                self.skip_ws();
                let key = self.shape_key()?;
                self.skip_ws();
                let optional = self.eat(b'?');
                self.skip_ws();
                self.expect(b':')?;
                self.skip_ws();
                let ty = self.union()?;
                fields.push(ShapeField { key, ty, optional });
                self.skip_ws();
                if self.eat(b',') {
                    continue;
                }
                self.expect(b'}')?;
                break;
            }
        }
        let closed = self.eat(b'!');
        Ok(TypeExpr::Shape {
            fields,
            closed,
            extends: None,
        })
    }

    fn shape_key(&mut self) -> Result<KeyLiteral, ParseError> {
        match self.peek() {
            Some(b'\'') => self.quoted_key(),
            Some(b'-') | Some(b'0'..=b'9') => self.int_key(),
            _ => Ok(KeyLiteral::Str(self.ident()?)),
        }
    }

    fn quoted_key(&mut self) -> Result<KeyLiteral, ParseError> {
        self.expect(b'\'')?;
        let mut out = Vec::new();
        loop {
            match self.bump() {
                Some(b'\'') => break,
                Some(b'\\') => match self.bump() {
                    Some(c @ (b'\'' | b'\\')) => out.push(c),
                    _ => return Err(self.error("bad escape in quoted key")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated quoted key")),
            }
        }
        String::from_utf8(out)
            .map(KeyLiteral::Str)
            .map_err(|_| self.error("quoted key is not valid UTF-8"))
    }

    fn int_key(&mut self) -> Result<KeyLiteral, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("invalid integer key"))?;
        text.parse::<i64>()
            .map(KeyLiteral::Int)
            .map_err(|_| self.error("integer key out of range"))
    }

    fn ident(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == b'_' || c == b'\\' => {}
            _ => return Err(self.error("expected a type name")),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'\\' {
                self.pos += 1;
            } else {
                break;
            }
        }
        // Names are ASCII identifiers (with `\` for namespaced classes),
        // so this slice is valid UTF-8.
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }
}
