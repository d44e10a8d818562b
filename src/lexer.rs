//! # mcdoc Lexer (Tokenizer)
//!
//! This module provides the `Lexer` for mcdoc source text. The lexer is the
//! first stage of the pipeline: it converts a raw source string into a
//! sequence of discrete [`Token`]s.
//!
//! ## Architectural Overview
//!
//! The `Lexer` is a hand-written, stateful scanner that walks the input
//! character by character using longest-match tokenization. It recognizes:
//!
//! - **Literals:** identifiers, strings, integers, floats and typed numbers
//!   (`1b`, `2.5f`, ...).
//! - **Resource locations:** `namespace:path/segments`, told apart from
//!   plain identifiers by the `:` inside the token.
//! - **Keywords:** `struct`, `enum`, `type`, `use`, `dispatch`, the
//!   primitive type names, and so on (see [`Keyword`]).
//! - **Punctuation:** `::`, the four range operators (`..`, `..<`, `<..`,
//!   `<..<`), `...`, `?`, `@`, `#`, `=`, `|`, and all brackets.
//! - **Whitespace and comments:** produced as tokens so that later tools can
//!   preserve them; the [`Parser`](crate::parser::Parser) filters them out.
//!   Doc comments (`///`) are kept as their own token type because they
//!   attach to the following form.
//!
//! Each `Token` records its start and end byte position in the source, which
//! is what the diagnostics point at.
//!
//! Lexical errors (unterminated strings, invalid escapes, numbers that do
//! not fit their suffix kind, stray doc comments) do not stop the scan; they
//! are collected on the lexer and surfaced as diagnostics by the loader.
use crate::ast::{NumberValue, NumericKind, ResourceLocation, TypedNumber};
use crate::error::LexError;

/// The reserved words of the language. Using one as a declaration name is
/// diagnosed by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Any,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Struct,
    Enum,
    Type,
    Use,
    Inject,
    Dispatch,
    To,
    Super,
    As,
    True,
    False,
    Unsafe,
}

impl Keyword {
    #[must_use]
    pub fn from_str(word: &str) -> Option<Keyword> {
        Some(match word {
            "any" => Keyword::Any,
            "boolean" => Keyword::Boolean,
            "byte" => Keyword::Byte,
            "short" => Keyword::Short,
            "int" => Keyword::Int,
            "long" => Keyword::Long,
            "float" => Keyword::Float,
            "double" => Keyword::Double,
            "string" => Keyword::String,
            "struct" => Keyword::Struct,
            "enum" => Keyword::Enum,
            "type" => Keyword::Type,
            "use" => Keyword::Use,
            "inject" => Keyword::Inject,
            "dispatch" => Keyword::Dispatch,
            "to" => Keyword::To,
            "super" => Keyword::Super,
            "as" => Keyword::As,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "unsafe" => Keyword::Unsafe,
            _ => return None,
        })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Any => "any",
            Keyword::Boolean => "boolean",
            Keyword::Byte => "byte",
            Keyword::Short => "short",
            Keyword::Int => "int",
            Keyword::Long => "long",
            Keyword::Float => "float",
            Keyword::Double => "double",
            Keyword::String => "string",
            Keyword::Struct => "struct",
            Keyword::Enum => "enum",
            Keyword::Type => "type",
            Keyword::Use => "use",
            Keyword::Inject => "inject",
            Keyword::Dispatch => "dispatch",
            Keyword::To => "to",
            Keyword::Super => "super",
            Keyword::As => "as",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Unsafe => "unsafe",
        }
    }
}

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// End of the input file.
    Eof,
    /// One or more whitespace characters.
    Whitespace,
    /// A `//` line comment (content, trimmed).
    Comment(String),
    /// A `///` doc comment (content, trimmed). Attaches to the next form
    /// that accepts a prelim.
    DocComment(String),
    /// A token that could not be recognized.
    Unknown,

    // == Literals ==
    /// A plain identifier.
    Identifier(String),
    /// A reserved word.
    Keyword(Keyword),
    /// A `%`-prefixed key such as `%fallback` or `%parent`.
    Special(String),
    /// A `namespace:path` resource location.
    Resource(ResourceLocation),
    /// A string literal with the escapes already processed.
    String(String),
    /// An unsuffixed integer literal.
    Integer(i64),
    /// An unsuffixed float literal (has a `.` or an exponent).
    Float(f64),
    /// A number literal with a kind suffix, e.g. `1b` or `2.5f`.
    TypedNumber(TypedNumber),

    // == Punctuation & Operators ==
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `::` (path separator)
    DoubleColon,
    /// `=`
    Equals,
    /// `|`
    Pipe,
    /// `?` (optional field marker)
    Question,
    /// `@` (range introducer)
    At,
    /// `#` (attribute prefix)
    Hash,
    /// `.` (accessor key separator)
    Dot,
    /// `..` (inclusive range)
    DotDot,
    /// `..<` (exclusive upper end)
    DotDotLt,
    /// `<..` (exclusive lower end)
    LtDotDot,
    /// `<..<` (exclusive at both ends)
    LtDotDotLt,
    /// `...` (struct spread)
    Spread,
}

/// A single lexical token, with its byte span in the source text.
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    /// 0-based starting byte position.
    pub pos_start: usize,
    /// 0-based ending byte position (exclusive).
    pub pos_end: usize,
}

impl Token {
    #[must_use]
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    /// Only whitespace has been seen since the last newline. Doc comments
    /// must start their line.
    line_start: bool,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            line_start: true,
            errors: Vec::new(),
        }
    }

    /// Tokenizes the entire input up to and including the final
    /// [`TokenType::Eof`] token.
    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.ttype == TokenType::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// The lexical errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Scans and returns the next [`Token`]. At the end of the input it
    /// repeatedly returns [`TokenType::Eof`].
    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;
        let at_line_start = self.line_start;

        let ttype = if let Some(char) = self.advance() {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                '[' => TokenType::LBracket,
                ']' => TokenType::RBracket,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                '>' => TokenType::Gt,
                ',' => TokenType::Comma,
                '=' => TokenType::Equals,
                '|' => TokenType::Pipe,
                '?' => TokenType::Question,
                '@' => TokenType::At,
                '#' => TokenType::Hash,

                '<' => {
                    if self.rest().starts_with("..") {
                        self.advance();
                        self.advance();
                        if self.peek() == Some(&'<') {
                            self.advance();
                            TokenType::LtDotDotLt
                        } else {
                            TokenType::LtDotDot
                        }
                    } else {
                        TokenType::Lt
                    }
                }
                ':' => {
                    if self.peek() == Some(&':') {
                        self.advance();
                        TokenType::DoubleColon
                    } else {
                        TokenType::Colon
                    }
                }
                '.' => {
                    if self.peek() == Some(&'.') {
                        self.advance();
                        match self.peek() {
                            Some('.') => {
                                self.advance();
                                TokenType::Spread
                            }
                            Some('<') => {
                                self.advance();
                                TokenType::DotDotLt
                            }
                            _ => TokenType::DotDot,
                        }
                    } else {
                        TokenType::Dot
                    }
                }
                '%' => self.read_special(),
                '/' => {
                    if self.peek() == Some(&'/') {
                        self.read_comment(at_line_start, start_pos)
                    } else {
                        TokenType::Unknown
                    }
                }
                '"' => self.read_string(start_pos),
                c if c.is_whitespace() => self.read_whitespace(c),
                c if c.is_ascii_alphabetic() || c == '_' => self.read_word(c),
                c if c.is_ascii_digit()
                    || (c == '-' && self.peek().is_some_and(char::is_ascii_digit)) =>
                {
                    self.read_number(c, start_pos)
                }

                _ => TokenType::Unknown,
            }
        } else {
            TokenType::Eof
        };

        if !matches!(ttype, TokenType::Whitespace | TokenType::Eof) {
            self.line_start = false;
        }

        Token::new(ttype, start_pos, self.position)
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// The not-yet-consumed remainder of the input, for the few places that
    /// need more than one character of lookahead.
    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn read_whitespace(&mut self, first: char) -> TokenType {
        let mut saw_newline = first == '\n';
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                if *c == '\n' {
                    saw_newline = true;
                }
                self.advance();
            } else {
                break;
            }
        }
        if saw_newline {
            self.line_start = true;
        }
        TokenType::Whitespace
    }

    fn read_comment(&mut self, at_line_start: bool, start_pos: usize) -> TokenType {
        self.advance(); // Consume the second '/'
        let is_doc = self.peek() == Some(&'/');
        if is_doc {
            self.advance();
        }
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if *c == '\n' {
                break;
            }
            text.push(*c);
            self.advance();
        }
        let text = text.trim().to_string();
        if is_doc {
            if !at_line_start {
                self.errors.push(LexError::StrayDocComment {
                    span: (start_pos, self.position - start_pos).into(),
                });
                return TokenType::Comment(text);
            }
            TokenType::DocComment(text)
        } else {
            TokenType::Comment(text)
        }
    }

    fn read_string(&mut self, start_pos: usize) -> TokenType {
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return TokenType::String(value);
                }
                Some('\\') => {
                    self.advance();
                    let escape_pos = self.position;
                    match self.advance() {
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('b') => value.push('\u{0008}'),
                        Some('f') => value.push('\u{000C}'),
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some(other) => {
                            self.errors.push(LexError::InvalidEscape {
                                escape: other,
                                span: (escape_pos - 1, 1 + other.len_utf8()).into(),
                            });
                            value.push(other);
                        }
                        None => {
                            self.errors.push(LexError::UnterminatedString {
                                span: (start_pos, 1).into(),
                            });
                            return TokenType::Unknown;
                        }
                    }
                }
                Some(c) => {
                    value.push(*c);
                    self.advance();
                }
                None => {
                    self.errors.push(LexError::UnterminatedString {
                        span: (start_pos, 1).into(),
                    });
                    return TokenType::Unknown;
                }
            }
        }
    }

    fn read_special(&mut self) -> TokenType {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || *c == '_' {
                name.push(*c);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            TokenType::Unknown
        } else {
            TokenType::Special(name)
        }
    }

    fn is_resource_path_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/')
    }

    fn read_word(&mut self, first_char: char) -> TokenType {
        let mut word = String::new();
        word.push(first_char);

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || *c == '_' {
                word.push(*c);
                self.advance();
            } else {
                break;
            }
        }

        // A lone `:` inside the token turns an identifier into a resource
        // location; `::` stays a path separator.
        if self.peek() == Some(&':') {
            let mut lookahead = self.rest().chars();
            lookahead.next();
            if lookahead.next().is_some_and(Self::is_resource_path_char) {
                self.advance(); // the ':'
                let mut path = String::new();
                while let Some(c) = self.peek() {
                    if Self::is_resource_path_char(*c) {
                        path.push(*c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                return TokenType::Resource(ResourceLocation {
                    namespace: word,
                    path,
                });
            }
        }

        match Keyword::from_str(&word) {
            Some(keyword) => TokenType::Keyword(keyword),
            None => TokenType::Identifier(word),
        }
    }

    fn read_number(&mut self, first_char: char, start_pos: usize) -> TokenType {
        let mut number_str = String::new();
        number_str.push(first_char);
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                number_str.push(*c);
                self.advance();
            } else {
                break;
            }
        }

        // `1..5` must leave the range operator alone; a decimal point needs
        // a digit after it.
        if self.peek() == Some(&'.') {
            let mut lookahead = self.rest().chars();
            lookahead.next();
            if lookahead.next().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                number_str.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        number_str.push(*c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = self.rest().chars();
            lookahead.next();
            let after_e = lookahead.next();
            let after_sign = lookahead.next();
            let exponent_follows = match after_e {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => after_sign.is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                if let Some(e) = self.advance() {
                    number_str.push(e);
                }
                if matches!(self.peek(), Some('+' | '-')) {
                    if let Some(sign) = self.advance() {
                        number_str.push(sign);
                    }
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        number_str.push(*c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        // A suffix is a single letter glued to the literal; case-insensitive.
        let suffix = match self.peek().copied() {
            Some(c) if c.is_ascii_alphabetic() => {
                let mut lookahead = self.rest().chars();
                lookahead.next();
                let next_is_word = lookahead
                    .next()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                if next_is_word {
                    None
                } else {
                    match c.to_ascii_lowercase() {
                        'b' => Some(NumericKind::Byte),
                        's' => Some(NumericKind::Short),
                        'l' => Some(NumericKind::Long),
                        'f' => Some(NumericKind::Float),
                        'd' => Some(NumericKind::Double),
                        _ => None,
                    }
                }
            }
            _ => None,
        };
        if suffix.is_some() {
            self.advance();
        }

        let tok_span = (start_pos, self.position - start_pos);
        match suffix {
            Some(kind) if kind.is_integer() => {
                if is_float {
                    return TokenType::Unknown;
                }
                match number_str.parse::<i64>() {
                    Ok(value) => {
                        let (lo, hi) = kind
                            .integer_bounds()
                            .unwrap_or((i64::MIN, i64::MAX));
                        if value < lo || value > hi {
                            self.errors.push(LexError::NumberOutOfRange {
                                literal: number_str,
                                kind: kind.as_str(),
                                span: tok_span.into(),
                            });
                            return TokenType::Unknown;
                        }
                        TokenType::TypedNumber(TypedNumber {
                            value: NumberValue::Int(value),
                            kind,
                        })
                    }
                    Err(_) => {
                        self.errors.push(LexError::NumberOutOfRange {
                            literal: number_str,
                            kind: kind.as_str(),
                            span: tok_span.into(),
                        });
                        TokenType::Unknown
                    }
                }
            }
            Some(kind) => match number_str.parse::<f64>() {
                Ok(value) => TokenType::TypedNumber(TypedNumber {
                    value: NumberValue::Float(value),
                    kind,
                }),
                Err(_) => TokenType::Unknown,
            },
            None if is_float => match number_str.parse::<f64>() {
                Ok(value) => TokenType::Float(value),
                Err(_) => TokenType::Unknown,
            },
            None => match number_str.parse::<i64>() {
                Ok(value) => TokenType::Integer(value),
                Err(_) => {
                    self.errors.push(LexError::NumberOutOfRange {
                        literal: number_str,
                        kind: NumericKind::Long.as_str(),
                        span: tok_span.into(),
                    });
                    TokenType::Unknown
                }
            },
        }
    }
}
