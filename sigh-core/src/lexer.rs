//! Lexer for Sigh.

use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Kind of a token produced by the lexer.
///
/// `true`, `false` and `null` are plain identifiers: they are resolved in
/// the root scope like any other name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // Punctuation
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]
    Comma,      // ,
    Colon,      // :
    Dot,        // .
    Dollar,     // $
    At,         // @

    // Operators
    Star,         // *
    Slash,        // /
    Percent,      // %
    Plus,         // +
    Minus,        // -
    Equal,        // =
    EqualEqual,   // ==
    BangEqual,    // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    AmpAmp,       // &&
    BarBar,       // ||
    Bang,         // !

    // Keywords
    Var,
    Fun,
    Struct,
    If,
    Else,
    While,
    Return,
}

impl TokenKind {
    /// Human-readable description used in parse errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Ident => "identifier",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::Dollar => "'$'",
            TokenKind::At => "'@'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::BangEqual => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::BarBar => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Var => "'var'",
            TokenKind::Fun => "'fun'",
            TokenKind::Struct => "'struct'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::Return => "'return'",
        }
    }
}

/// A single token with its kind and span.
///
/// `text_start` / `text_end` are byte offsets of the token text. For string
/// literals they delimit the raw content between the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text_start: u32,
    pub text_end: u32,
}

impl Token {
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.text_start as usize..self.text_end as usize]
    }
}

/// Result of lexing a source file.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex a source string into tokens.
///
/// The returned tokens refer to slices of `source` via byte offsets; the
/// caller keeps `source` alive as long as those tokens are needed.
pub fn lex(source: &str) -> LexResult {
    let mut lexer = Lexer {
        source,
        chars: source.as_bytes(),
        len: source.len(),
        index: 0,
        diagnostics: Vec::new(),
    };
    lexer.run()
}

struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    len: usize,
    index: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> LexResult {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.consume_char();
                continue;
            }
            if ch == b'/' && self.peek_next() == Some(b'/') {
                self.skip_line_comment();
                continue;
            }

            let start = self.index as u32;
            let token = match ch {
                b'(' => self.single(TokenKind::LParen, start),
                b')' => self.single(TokenKind::RParen, start),
                b'{' => self.single(TokenKind::LBrace, start),
                b'}' => self.single(TokenKind::RBrace, start),
                b'[' => self.single(TokenKind::LBracket, start),
                b']' => self.single(TokenKind::RBracket, start),
                b',' => self.single(TokenKind::Comma, start),
                b':' => self.single(TokenKind::Colon, start),
                b'.' => self.single(TokenKind::Dot, start),
                b'$' => self.single(TokenKind::Dollar, start),
                b'@' => self.single(TokenKind::At, start),
                b'*' => self.single(TokenKind::Star, start),
                b'/' => self.single(TokenKind::Slash, start),
                b'%' => self.single(TokenKind::Percent, start),
                b'+' => self.single(TokenKind::Plus, start),
                b'-' => self.single(TokenKind::Minus, start),
                b'=' => self.with_equal(TokenKind::Equal, TokenKind::EqualEqual, start),
                b'!' => self.with_equal(TokenKind::Bang, TokenKind::BangEqual, start),
                b'<' => self.with_equal(TokenKind::Less, TokenKind::LessEqual, start),
                b'>' => self.with_equal(TokenKind::Greater, TokenKind::GreaterEqual, start),
                b'&' => self.doubled(b'&', TokenKind::AmpAmp, start),
                b'|' => self.doubled(b'|', TokenKind::BarBar, start),
                b'"' => self.lex_string(start),
                b'0'..=b'9' => self.lex_number(start),
                _ => {
                    if is_ident_start(ch) {
                        self.lex_ident_or_keyword(start)
                    } else {
                        self.consume_utf8_char();
                        self.unexpected_char(start)
                    }
                }
            };

            if let Some(tok) = token {
                tokens.push(tok);
            }
        }

        // EOF token at end
        let eof = self.len as u32;
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(eof, eof),
            text_start: eof,
            text_end: eof,
        });

        log::debug!(
            "lexed {} token(s) with {} diagnostic(s)",
            tokens.len(),
            self.diagnostics.len()
        );

        LexResult {
            tokens,
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Option<Token> {
        self.consume_char();
        self.simple_token(kind, start)
    }

    /// `x` or `x=`.
    fn with_equal(&mut self, alone: TokenKind, equal: TokenKind, start: u32) -> Option<Token> {
        self.consume_char();
        if self.peek_char() == Some(b'=') {
            self.consume_char();
            self.simple_token(equal, start)
        } else {
            self.simple_token(alone, start)
        }
    }

    /// `&&` and `||`; a lone `&` or `|` is not a token.
    fn doubled(&mut self, ch: u8, kind: TokenKind, start: u32) -> Option<Token> {
        self.consume_char();
        if self.peek_char() == Some(ch) {
            self.consume_char();
            self.simple_token(kind, start)
        } else {
            self.unexpected_char(start)
        }
    }

    fn simple_token(&self, kind: TokenKind, start: u32) -> Option<Token> {
        let end = self.index as u32;
        Some(Token {
            kind,
            span: Span::new(start, end),
            text_start: start,
            text_end: end,
        })
    }

    fn unexpected_char(&mut self, start: u32) -> Option<Token> {
        let end = self.index as u32;
        let text = &self.source[start as usize..end as usize];
        let diag = Diagnostic::error(format!("unexpected character '{text}'"), Span::new(start, end))
            .with_code("E0001");
        self.diagnostics.push(diag);
        None
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == b'\n' {
                break;
            }
            self.consume_char();
        }
    }

    fn lex_string(&mut self, start: u32) -> Option<Token> {
        // Consume the opening quote
        self.consume_char();

        let content_start = self.index;
        while let Some(ch) = self.peek_char() {
            match ch {
                b'"' => {
                    let content_end = self.index;
                    self.consume_char(); // closing quote
                    return Some(Token {
                        kind: TokenKind::StringLiteral,
                        span: Span::new(start, self.index as u32),
                        text_start: content_start as u32,
                        text_end: content_end as u32,
                    });
                }
                b'\\' => {
                    let escape_start = self.index as u32;
                    self.consume_char();
                    match self.peek_char() {
                        Some(b'\\' | b'n' | b'r' | b't' | b'"') => self.consume_char(),
                        Some(_) => {
                            self.consume_utf8_char();
                            let span = Span::new(escape_start, self.index as u32);
                            self.diagnostics.push(
                                Diagnostic::error("invalid escape sequence", span)
                                    .with_code("E0003"),
                            );
                        }
                        None => {}
                    }
                }
                _ => self.consume_char(),
            }
        }

        // Unterminated string
        let span = Span::new(start, self.index as u32);
        let diag = Diagnostic::error("unterminated string literal", span).with_code("E0002");
        self.diagnostics.push(diag);
        None
    }

    fn lex_number(&mut self, start: u32) -> Option<Token> {
        // integer or float: digits [ '.' digits ]?
        self.consume_digits();

        let mut is_float = false;
        if self.peek_char() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.consume_char(); // '.'
            self.consume_digits();
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.simple_token(kind, start)
    }

    fn consume_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char();
        }
    }

    fn lex_ident_or_keyword(&mut self, start: u32) -> Option<Token> {
        while self.peek_char().is_some_and(is_ident_continue) {
            self.consume_char();
        }

        let end = self.index as u32;
        let kind = match &self.source[start as usize..end as usize] {
            "var" => TokenKind::Var,
            "fun" => TokenKind::Fun,
            "struct" => TokenKind::Struct,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            _ => TokenKind::Ident,
        };
        self.simple_token(kind, start)
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        if self.index < self.len {
            self.index += 1;
        }
    }

    /// Consume a whole UTF-8 scalar so that spans stay on char boundaries.
    fn consume_utf8_char(&mut self) {
        let width = self.source[self.index..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.index = (self.index + width).min(self.len);
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r' | b';')
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

/// Decode the escapes of a string literal's raw content.
///
/// Invalid escapes were already reported by the lexer; they are kept as-is.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
