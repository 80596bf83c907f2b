//! # Path Expressions
//!
//! Parses the dotted/bracket path syntax used by field specs into a
//! sequence of typed steps:
//!
//! ```text
//! $.certificate.subtitle        -> [Field("certificate"), Field("subtitle")]
//! $.assertion.evidence[0]       -> [Field("assertion"), Field("evidence"), Index(0)]
//! $['image:signature']          -> [Field("image:signature")]
//! badge.name                    -> [Field("badge"), Field("name")]
//! ```
//!
//! Only literal steps are representable. Wildcards, filters, slices and
//! descendant segments are rejected here; those are the business of the
//! full query evaluator behind [`QueryMatcher`](crate::inject::QueryMatcher).
//!
//! Dotted names are looser than RFC 9535 shorthand: any character other
//! than `.` and `[` is accepted, so keys such as `image:signature` or
//! `attribute-signed` can be addressed without brackets.

use std::fmt;

use crate::error::PathError;

/// One literal step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Object member access by name.
    Field(String),
    /// Array element access by position.
    Index(usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) if is_shorthand_name(name) => write!(f, ".{name}"),
            Self::Field(name) => {
                write!(f, "['")?;
                for c in name.chars() {
                    match c {
                        '\'' => write!(f, "\\'")?,
                        '\\' => write!(f, "\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "']")
            }
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

fn is_shorthand_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A parsed, root-relative path made of literal steps only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    steps: Vec<PathStep>,
}

impl PathExpression {
    /// Parse a path expression.
    ///
    /// The leading `$` is optional. An expression consisting of `$` alone
    /// addresses the document root and has no steps.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] for malformed input and for any
    /// non-literal selector (wildcard, filter, slice, descendant, negative
    /// index).
    pub fn parse(input: &str) -> Result<Self, PathError> {
        PathParser::new(input).parse()
    }

    /// Build an expression from already-literal steps.
    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// The literal steps, outermost first.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns `true` for the bare root expression `$`.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Return the field names if every step is an object member access.
    ///
    /// `original` is only used for the error message.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invalid`] if any step is an array index.
    pub fn field_chain(&self, original: &str) -> Result<Vec<&str>, PathError> {
        self.steps
            .iter()
            .map(|step| match step {
                PathStep::Field(name) => Ok(name.as_str()),
                PathStep::Index(index) => Err(PathError::invalid(
                    original,
                    format!("array index [{index}] cannot be created; only field chains are supported"),
                )),
            })
            .collect()
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Cursor-based parser over the characters of one expression.
struct PathParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<PathExpression, PathError> {
        let trimmed_len = self.input.trim().len();
        if trimmed_len == 0 {
            return Err(self.error("empty path"));
        }
        if trimmed_len != self.input.len() {
            return Err(self.error("leading or trailing whitespace"));
        }

        let mut steps = Vec::new();
        if self.peek() == Some('$') {
            self.advance();
        } else {
            // `a.b` is shorthand for `$.a.b`.
            steps.push(PathStep::Field(self.parse_name()?));
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.advance();
                    match self.peek() {
                        Some('.') => return Err(self.error("descendant segments are not literal")),
                        Some('*') => return Err(self.error("wildcards are not literal")),
                        _ => steps.push(PathStep::Field(self.parse_name()?)),
                    }
                }
                '[' => {
                    self.advance();
                    steps.push(self.parse_bracket()?);
                }
                other => return Err(self.error(format!("unexpected character `{other}`"))),
            }
        }

        Ok(PathExpression { steps })
    }

    fn parse_name(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            return Err(self.error("empty field name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_bracket(&mut self) -> Result<PathStep, PathError> {
        self.skip_whitespace();
        let step = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.advance();
                PathStep::Field(self.parse_quoted(quote)?)
            }
            Some(c) if c.is_ascii_digit() => PathStep::Index(self.parse_index()?),
            Some('*') => return Err(self.error("wildcards are not literal")),
            Some('?') => return Err(self.error("filter selectors are not literal")),
            Some('-') => return Err(self.error("negative indices are not literal")),
            Some(':') => return Err(self.error("slices are not literal")),
            Some(other) => return Err(self.error(format!("unexpected character `{other}` in brackets"))),
            None => return Err(self.error("unclosed bracket")),
        };
        self.skip_whitespace();
        match self.peek() {
            Some(']') => {
                self.advance();
                Ok(step)
            }
            Some(',') => Err(self.error("union selectors are not literal")),
            Some(':') => Err(self.error("slices are not literal")),
            _ => Err(self.error("expected `]`")),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, PathError> {
        let mut name = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some(escaped @ ('\\' | '\'' | '"')) => name.push(escaped),
                    Some(other) => return Err(self.error(format!("unsupported escape `\\{other}`"))),
                    None => return Err(self.error("unclosed string")),
                },
                Some(c) if c == quote => return Ok(name),
                Some(c) => name.push(c),
                None => return Err(self.error("unclosed string")),
            }
        }
    }

    fn parse_index(&mut self) -> Result<usize, PathError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(self.error(format!("index `{digits}` has a leading zero")));
        }
        digits
            .parse()
            .map_err(|_| self.error(format!("index `{digits}` is out of range")))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn error(&self, reason: impl Into<String>) -> PathError {
        PathError::invalid(self.input, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> PathStep {
        PathStep::Field(name.to_string())
    }

    #[test]
    fn parses_dotted_chain() {
        let expr = PathExpression::parse("$.certificate.subtitle").unwrap();
        assert_eq!(expr.steps(), &[field("certificate"), field("subtitle")]);
    }

    #[test]
    fn parses_index_steps() {
        let expr = PathExpression::parse("$.assertion.evidence[0]").unwrap();
        assert_eq!(
            expr.steps(),
            &[field("assertion"), field("evidence"), PathStep::Index(0)]
        );
    }

    #[test]
    fn parses_bracketed_names() {
        let expr = PathExpression::parse("$['image:signature'][\"a.b\"]").unwrap();
        assert_eq!(expr.steps(), &[field("image:signature"), field("a.b")]);
    }

    #[test]
    fn dotted_names_accept_colons_and_dashes() {
        let expr = PathExpression::parse("$.assertion.image:signature").unwrap();
        assert_eq!(expr.steps(), &[field("assertion"), field("image:signature")]);
        let expr = PathExpression::parse("$.verify.attribute-signed").unwrap();
        assert_eq!(expr.steps(), &[field("verify"), field("attribute-signed")]);
    }

    #[test]
    fn root_marker_is_optional() {
        assert_eq!(
            PathExpression::parse("badge.name").unwrap(),
            PathExpression::parse("$.badge.name").unwrap()
        );
    }

    #[test]
    fn bare_root_has_no_steps() {
        assert!(PathExpression::parse("$").unwrap().is_root());
    }

    #[test]
    fn rejects_non_literal_selectors() {
        for path in [
            "$.badge.*",
            "$..name",
            "$.items[*]",
            "$.items[?@.a == 1]",
            "$.items[-1]",
            "$.items[0:2]",
            "$.items[0,1]",
        ] {
            assert!(
                matches!(PathExpression::parse(path), Err(PathError::Invalid { .. })),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for path in ["", "$.", "$.a..", "$[", "$['open", "$.a[01]", "$x", " $.a"] {
            assert!(PathExpression::parse(path).is_err(), "{path} should be rejected");
        }
    }

    #[test]
    fn field_chain_rejects_indices() {
        let expr = PathExpression::parse("$.a[2].b").unwrap();
        let err = expr.field_chain("$.a[2].b").unwrap_err();
        assert!(matches!(err, PathError::Invalid { .. }));

        let expr = PathExpression::parse("$.a.b").unwrap();
        assert_eq!(expr.field_chain("$.a.b").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn display_normalizes() {
        let expr = PathExpression::parse("a['b c'][3].image:signature").unwrap();
        assert_eq!(expr.to_string(), "$.a['b c'][3]['image:signature']");
    }
}
