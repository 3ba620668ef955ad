//! Token scanners for path templates, route names and URL paths.
//!
//! # Responsibilities
//! - Compile `/users/:id/posts` into an ordered token sequence
//! - Validate route names
//! - Split a concrete URL into literal tokens plus an optional query
//!
//! # Design Decisions
//! - Hand-written single-pass scanners, O(n), no regex and no backtracking
//! - Repeated slashes coalesce; a trailing slash is insignificant
//! - Errors carry the byte offset of the offending character

use std::fmt;
use std::str::FromStr;

use super::error::ParseError;
use super::params::Params;
use super::query::decode_query;

/// Characters allowed inside a path token besides ASCII letters and digits.
const TOKEN_PUNCTUATION: &[char] = &[
    '!', '$', '&', '\'', '(', ')', '*', '+', ',', '-', '.', ';', '=', '@', '_', '~',
];

pub(crate) fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || TOKEN_PUNCTUATION.contains(&ch)
}

/// One `/`-delimited segment of a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Static(String),
    Param(String),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    tokens: Vec<Token>,
    params: Vec<String>,
}

/// Scanner position relative to the current token.
#[derive(Clone, Copy)]
enum Scan {
    AfterSlash,
    Static { start: usize },
    Param { start: usize },
}

impl PathTemplate {
    /// Parse a template such as `/some/path/:param`.
    pub fn parse(template: &str) -> Result<Self, ParseError> {
        if template.is_empty() {
            return Err(ParseError::EmptyPath);
        }
        if !template.starts_with('/') {
            return Err(ParseError::MissingLeadingSlash);
        }

        let mut compiled = PathTemplate {
            source: template.to_string(),
            tokens: Vec::new(),
            params: Vec::new(),
        };
        let mut scan = Scan::AfterSlash;

        for (offset, ch) in template.char_indices().skip(1) {
            scan = match (scan, ch) {
                (Scan::AfterSlash, '/') => Scan::AfterSlash,
                (Scan::AfterSlash, ':') => Scan::Param { start: offset + 1 },
                (Scan::AfterSlash, c) if is_token_char(c) => Scan::Static { start: offset },
                (Scan::Static { start }, '/') => {
                    compiled.push_static(&template[start..offset]);
                    Scan::AfterSlash
                }
                (Scan::Param { start }, '/') => {
                    compiled.push_param(&template[start..offset], start - 1)?;
                    Scan::AfterSlash
                }
                (current, c) if is_token_char(c) => current,
                (_, c) => return Err(ParseError::UnexpectedChar { ch: c, offset }),
            };
        }

        match scan {
            Scan::AfterSlash => {}
            Scan::Static { start } => compiled.push_static(&template[start..]),
            Scan::Param { start } => compiled.push_param(&template[start..], start - 1)?,
        }
        Ok(compiled)
    }

    fn push_static(&mut self, text: &str) {
        self.tokens.push(Token::Static(text.to_string()));
    }

    fn push_param(&mut self, name: &str, marker: usize) -> Result<(), ParseError> {
        if name.is_empty() {
            return Err(ParseError::MissingParamName { offset: marker });
        }
        if self.params.iter().any(|p| p == name) {
            return Err(ParseError::RedeclaredParam {
                name: name.to_string(),
                offset: marker,
            });
        }
        self.params.push(name.to_string());
        self.tokens.push(Token::Param(name.to_string()));
        Ok(())
    }

    /// The text the template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parameter names in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// True for the template without tokens (`/`).
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Key that is equal for templates collapsing onto the same trie node;
    /// parameter names are erased.
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for token in &self.tokens {
            shape.push('/');
            match token {
                Token::Static(text) => shape.push_str(text),
                Token::Param(_) => shape.push(':'),
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }
}

impl FromStr for PathTemplate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Validate a route name: a letter followed by letters, digits, `-`, `.` or `_`.
pub fn validate_route_name(name: &str) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(ParseError::EmptyRouteName)?;

    let invalid = |ch| ParseError::InvalidRouteName {
        ch,
        name: name.to_string(),
    };
    if !first.is_ascii_alphabetic() {
        return Err(invalid(first));
    }
    match chars.find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))) {
        Some(ch) => Err(invalid(ch)),
        None => Ok(()),
    }
}

/// A scanned concrete URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlPath {
    pub tokens: Vec<String>,
    pub query: Option<Params>,
}

/// Scan a URL path such as `/users/42?tab=info#bio`.
///
/// Token accumulation stops at `?` or `#`. The query runs from `?` to the
/// fragment (if any) and is decoded leniently, see [`decode_query`].
pub fn parse_url_path(url: &str) -> Result<UrlPath, ParseError> {
    if url.is_empty() {
        return Err(ParseError::EmptyPath);
    }
    if !url.starts_with('/') {
        return Err(ParseError::MissingLeadingSlash);
    }

    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut path_end = url.len();

    for (offset, ch) in url.char_indices().skip(1) {
        match ch {
            '/' => {
                if let Some(start) = token_start.take() {
                    tokens.push(url[start..offset].to_string());
                }
            }
            '?' | '#' => {
                path_end = offset;
                break;
            }
            c if is_token_char(c) => {
                token_start.get_or_insert(offset);
            }
            c => return Err(ParseError::UnexpectedChar { ch: c, offset }),
        }
    }
    if let Some(start) = token_start {
        tokens.push(url[start..path_end].to_string());
    }

    let rest = &url[path_end..];
    let query = match rest.strip_prefix('?') {
        Some(_) => {
            let without_fragment = rest.split_once('#').map_or(rest, |(q, _)| q);
            decode_query(without_fragment)
        }
        None => None,
    };

    Ok(UrlPath { tokens, query })
}
