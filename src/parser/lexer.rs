//! Lexer
//!
//! The lexer turns a byte slice into a flat sequence of tagged byte
//! ranges. It is a deterministic scanner with one byte of lookahead
//! (two for `<>{`): no allocation beyond the token vector, no errors.
//! Tokens keep `[start, end)` offsets into the source; the parser
//! slices text back out on demand.
//!
//! Quoting, comments, and compound operators follow rc's rules:
//! - `''` inside a quoted word is an embedded quote, not a terminator
//! - a comment runs to the next newline and swallows it
//! - `&& || << <{ <>{ >> >{ `{` are matched greedily

use std::collections::HashMap;

/// Token tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,

    Whitespace,
    Comment,
    Newline,

    Word,
    QuotedWord,

    /// `$name`
    Variable,
    /// `$#name`
    VariableCount,
    /// `$"name`
    VariableString,

    Caret,      // ^
    Amp,        // &
    AndAnd,     // &&
    Pipe,       // |
    OrOr,       // ||
    Semicolon,  // ;

    Backtick,      // `
    BacktickBrace, // `{

    LBrace, // {
    RBrace, // }
    LParen, // (
    RParen, // )

    Less,          // <
    DLess,         // <<
    LessBrace,     // <{
    LessGreatBrace, // <>{
    Great,         // >
    DGreat,        // >>
    GreatBrace,    // >{

    Equal, // =
    Tilde, // ~
    Bang,  // !
    At,    // @

    // Reserved words, reclassified from bare words
    Fn,
    If,
    Else,
    For,
    In,
    While,
    Switch,
    Case,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Whitespace => "WHITESPACE",
            Self::Comment => "COMMENT",
            Self::Newline => "NEWLINE",
            Self::Word => "WORD",
            Self::QuotedWord => "QUOTED_WORD",
            Self::Variable => "$",
            Self::VariableCount => "$#",
            Self::VariableString => "$\"",
            Self::Caret => "^",
            Self::Amp => "&",
            Self::AndAnd => "&&",
            Self::Pipe => "|",
            Self::OrOr => "||",
            Self::Semicolon => ";",
            Self::Backtick => "`",
            Self::BacktickBrace => "`{",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Less => "<",
            Self::DLess => "<<",
            Self::LessBrace => "<{",
            Self::LessGreatBrace => "<>{",
            Self::Great => ">",
            Self::DGreat => ">>",
            Self::GreatBrace => ">{",
            Self::Equal => "=",
            Self::Tilde => "~",
            Self::Bang => "!",
            Self::At => "@",
            Self::Fn => "fn",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::While => "while",
            Self::Switch => "switch",
            Self::Case => "case",
        }
    }
}

/// A tag plus a half-open byte range into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// Slice this token's text back out of the source.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

lazy_static::lazy_static! {
    /// Reserved words, applied only after a bare word token is formed.
    static ref RESERVED_WORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("case", TokenKind::Case);
        m.insert("else", TokenKind::Else);
        m.insert("fn", TokenKind::Fn);
        m.insert("for", TokenKind::For);
        m.insert("if", TokenKind::If);
        m.insert("in", TokenKind::In);
        m.insert("switch", TokenKind::Switch);
        m.insert("while", TokenKind::While);
        m
    };
}

/// Bytes that terminate a word run.
fn is_word_byte(b: u8) -> bool {
    !matches!(
        b,
        b' ' | b'\t'
            | b'\r'
            | b'\n'
            | b'#'
            | b';'
            | b'&'
            | b'|'
            | b'^'
            | b'$'
            | b'`'
            | b'\''
            | b'{'
            | b'}'
            | b'('
            | b')'
            | b'<'
            | b'>'
            | b'='
            | b'~'
            | b'!'
            | b'@'
    )
}

/// Bytes allowed in a variable name.
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'*'
}

/// The scanner. Construct with the source, consume with [`Lexer::tokenize`].
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the entire input, ending with a sentinel EOF token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while self.pos < self.input.len() {
            tokens.push(self.next_token());
        }
        tokens.push(Token::new(TokenKind::Eof, self.pos, self.pos));
        tokens
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, start, self.pos)
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.input[self.pos];

        match b {
            b' ' | b'\t' | b'\r' => {
                while matches!(self.current(), Some(b' ' | b'\t' | b'\r')) {
                    self.pos += 1;
                }
                self.token(TokenKind::Whitespace, start)
            }
            b'\n' => {
                self.pos += 1;
                self.token(TokenKind::Newline, start)
            }
            b'#' => self.read_comment(start),
            b'\'' => self.read_quoted_word(start),
            b'$' => self.read_variable(start),
            b'^' => self.single(TokenKind::Caret, start),
            b';' => self.single(TokenKind::Semicolon, start),
            b'=' => self.single(TokenKind::Equal, start),
            b'~' => self.single(TokenKind::Tilde, start),
            b'!' => self.single(TokenKind::Bang, start),
            b'@' => self.single(TokenKind::At, start),
            b'{' => self.single(TokenKind::LBrace, start),
            b'}' => self.single(TokenKind::RBrace, start),
            b'(' => self.single(TokenKind::LParen, start),
            b')' => self.single(TokenKind::RParen, start),
            b'&' => {
                if self.peek(1) == Some(b'&') {
                    self.pos += 2;
                    self.token(TokenKind::AndAnd, start)
                } else {
                    self.single(TokenKind::Amp, start)
                }
            }
            b'|' => {
                if self.peek(1) == Some(b'|') {
                    self.pos += 2;
                    self.token(TokenKind::OrOr, start)
                } else {
                    self.single(TokenKind::Pipe, start)
                }
            }
            b'`' => {
                if self.peek(1) == Some(b'{') {
                    self.pos += 2;
                    self.token(TokenKind::BacktickBrace, start)
                } else {
                    self.single(TokenKind::Backtick, start)
                }
            }
            b'<' => {
                if self.peek(1) == Some(b'>') && self.peek(2) == Some(b'{') {
                    self.pos += 3;
                    self.token(TokenKind::LessGreatBrace, start)
                } else if self.peek(1) == Some(b'<') {
                    self.pos += 2;
                    self.token(TokenKind::DLess, start)
                } else if self.peek(1) == Some(b'{') {
                    self.pos += 2;
                    self.token(TokenKind::LessBrace, start)
                } else {
                    self.single(TokenKind::Less, start)
                }
            }
            b'>' => {
                if self.peek(1) == Some(b'>') {
                    self.pos += 2;
                    self.token(TokenKind::DGreat, start)
                } else if self.peek(1) == Some(b'{') {
                    self.pos += 2;
                    self.token(TokenKind::GreatBrace, start)
                } else {
                    self.single(TokenKind::Great, start)
                }
            }
            _ => self.read_word(start),
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.pos += 1;
        self.token(kind, start)
    }

    /// `#` through the next newline (exclusive). The newline itself is
    /// consumed and not re-emitted, leaving a one-byte gap in coverage.
    fn read_comment(&mut self, start: usize) -> Token {
        while let Some(b) = self.current() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let end = self.pos;
        if self.current() == Some(b'\n') {
            self.pos += 1;
        }
        Token::new(TokenKind::Comment, start, end)
    }

    /// A quoted word keeps its surrounding quotes; `''` is an embedded
    /// quote. An unterminated quote runs to end of input.
    fn read_quoted_word(&mut self, start: usize) -> Token {
        self.pos += 1;
        while let Some(b) = self.current() {
            if b == b'\'' {
                if self.peek(1) == Some(b'\'') {
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                break;
            }
            self.pos += 1;
        }
        self.token(TokenKind::QuotedWord, start)
    }

    /// `$name`, `$#name`, or `$"name`. A lone `$` at end of input (or
    /// before a non-name byte) yields a zero-length name.
    fn read_variable(&mut self, start: usize) -> Token {
        self.pos += 1;
        let kind = match self.current() {
            Some(b'#') => {
                self.pos += 1;
                TokenKind::VariableCount
            }
            Some(b'"') => {
                self.pos += 1;
                TokenKind::VariableString
            }
            _ => TokenKind::Variable,
        };
        while matches!(self.current(), Some(b) if is_name_byte(b)) {
            self.pos += 1;
        }
        self.token(kind, start)
    }

    fn read_word(&mut self, start: usize) -> Token {
        while matches!(self.current(), Some(b) if is_word_byte(b)) {
            self.pos += 1;
        }
        let token = self.token(TokenKind::Word, start);
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        if let Some(&kind) = RESERVED_WORDS.get(text) {
            return Token::new(kind, start, self.pos);
        }
        token
    }
}
