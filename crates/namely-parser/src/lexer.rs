//! Lexer (tokenizer) for the JavaScript subset.
//!
//! The lexer converts source text into a stream of tokens. The parser pulls
//! tokens on demand, which keeps regex-vs-division disambiguation
//! context-sensitive; `tokenize` drains the same machinery into a `Vec` for
//! consumers that need the whole stream (the context extractor does).

use crate::span::Span;
use crate::token::{keyword_from_str, Token, TokenKind};

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    /// Source code as bytes (for fast indexing).
    source: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// Whether the previous token allows a regex to follow.
    allow_regex: bool,
    /// Whether a newline was crossed before the current token.
    saw_newline: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            token_start: 0,
            allow_regex: true,
            saw_newline: false,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        self.saw_newline = false;
        self.skip_whitespace_and_comments();
        self.token_start = self.pos;

        if self.is_eof() {
            return self.make_token(TokenKind::Eof);
        }

        let ch = self.current();
        let kind = match ch {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => self.scan_identifier(),
            b'0'..=b'9' => self.scan_number(),
            b'"' | b'\'' => self.scan_string(ch),
            b'`' => self.scan_template(),

            b'(' => { self.advance(); TokenKind::LParen }
            b')' => { self.advance(); TokenKind::RParen }
            b'{' => { self.advance(); TokenKind::LBrace }
            b'}' => { self.advance(); TokenKind::RBrace }
            b'[' => { self.advance(); TokenKind::LBracket }
            b']' => { self.advance(); TokenKind::RBracket }
            b';' => { self.advance(); TokenKind::Semicolon }
            b',' => { self.advance(); TokenKind::Comma }
            b':' => { self.advance(); TokenKind::Colon }
            b'~' => { self.advance(); TokenKind::Tilde }
            b'?' => { self.advance(); TokenKind::Question }

            b'.' => self.scan_dot(),
            b'+' => self.scan_plus(),
            b'-' => self.scan_minus(),
            b'*' => self.scan_star(),
            b'/' => self.scan_slash(),
            b'%' => self.scan_percent(),
            b'=' => self.scan_equals(),
            b'!' => self.scan_bang(),
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'&' => self.scan_ampersand(),
            b'|' => self.scan_pipe(),
            b'^' => self.scan_caret(),

            _ => {
                self.advance();
                TokenKind::Invalid
            }
        };

        // A regex may follow any token that cannot end an expression.
        self.allow_regex = !matches!(
            kind,
            TokenKind::Identifier(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::Regex { .. }
                | TokenKind::TemplateNoSub(_)
                | TokenKind::This
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        );

        self.make_token(kind)
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token {
        let saved_pos = self.pos;
        let saved_start = self.token_start;
        let saved_regex = self.allow_regex;
        let saved_newline = self.saw_newline;

        let token = self.next_token();

        self.pos = saved_pos;
        self.token_start = saved_start;
        self.allow_regex = saved_regex;
        self.saw_newline = saved_newline;

        token
    }

    // === Helper methods ===

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_char(&self) -> u8 {
        self.source.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            Span::new(self.token_start as u32, self.pos as u32),
            self.saw_newline,
        )
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        // Tokens only span ASCII-delimited boundaries
        unsafe { std::str::from_utf8_unchecked(&self.source[start..end]) }
    }

    fn token_slice(&self) -> &'a str {
        self.slice(self.token_start, self.pos)
    }

    // === Whitespace and comments ===

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current() {
                b'\n' => {
                    self.saw_newline = true;
                    self.advance();
                }
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                b'/' if self.peek_char() == b'/' => {
                    self.skip_line_comment();
                }
                b'/' if self.peek_char() == b'*' => {
                    self.skip_block_comment();
                }
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance_n(2);
        while !self.is_eof() && self.current() != b'\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance_n(2);
        while !self.is_eof() {
            if self.current() == b'\n' {
                self.saw_newline = true;
            }
            if self.current() == b'*' && self.peek_char() == b'/' {
                self.advance_n(2);
                return;
            }
            self.advance();
        }
    }

    // === Token scanning ===

    fn scan_identifier(&mut self) -> TokenKind {
        while !self.is_eof() {
            match self.current() {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$' => {
                    self.advance();
                }
                _ => break,
            }
        }

        let ident = self.token_slice();
        keyword_from_str(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;

        if self.current() == b'0' && matches!(self.peek_char(), b'x' | b'X') {
            self.advance_n(2);
            while self.current().is_ascii_hexdigit() {
                self.advance();
            }
            let hex = self.slice(start + 2, self.pos);
            let value = u64::from_str_radix(hex, 16).unwrap_or(0) as f64;
            return TokenKind::Number(value);
        }

        while self.current().is_ascii_digit() {
            self.advance();
        }
        if self.current() == b'.' && self.peek_char().is_ascii_digit() {
            self.advance();
            while self.current().is_ascii_digit() {
                self.advance();
            }
        }
        if matches!(self.current(), b'e' | b'E') {
            self.advance();
            if matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            while self.current().is_ascii_digit() {
                self.advance();
            }
        }

        TokenKind::Number(self.slice(start, self.pos).parse().unwrap_or(f64::NAN))
    }

    fn scan_string(&mut self, quote: u8) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();
        while !self.is_eof() && self.current() != quote {
            if self.current() == b'\\' {
                self.advance();
                if !self.is_eof() {
                    value.push(self.scan_escape_sequence());
                }
            } else {
                value.push(self.current() as char);
                self.advance();
            }
        }
        if self.current() == quote {
            self.advance();
        }
        TokenKind::String(value)
    }

    fn scan_escape_sequence(&mut self) -> char {
        let ch = self.current();
        self.advance();
        match ch {
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'0' => '\0',
            b'x' => self.scan_hex_escape(2),
            b'u' => self.scan_hex_escape(4),
            _ => ch as char,
        }
    }

    fn scan_hex_escape(&mut self, len: usize) -> char {
        let mut value = 0u32;
        for _ in 0..len {
            if let Some(digit) = (self.current() as char).to_digit(16) {
                value = value * 16 + digit;
                self.advance();
            } else {
                break;
            }
        }
        char::from_u32(value).unwrap_or('\u{FFFD}')
    }

    fn scan_template(&mut self) -> TokenKind {
        self.advance(); // opening backtick
        let mut value = String::new();
        while !self.is_eof() {
            match self.current() {
                b'`' => {
                    self.advance();
                    return TokenKind::TemplateNoSub(value);
                }
                b'\\' => {
                    self.advance();
                    if !self.is_eof() {
                        value.push(self.scan_escape_sequence());
                    }
                }
                _ => {
                    value.push(self.current() as char);
                    self.advance();
                }
            }
        }
        TokenKind::Invalid
    }

    fn scan_regex(&mut self) -> TokenKind {
        self.advance(); // opening /
        let pattern_start = self.pos;

        let mut in_class = false;
        while !self.is_eof() {
            match self.current() {
                b'/' if !in_class => break,
                b'[' => {
                    in_class = true;
                    self.advance();
                }
                b']' => {
                    in_class = false;
                    self.advance();
                }
                b'\\' => {
                    self.advance();
                    if !self.is_eof() {
                        self.advance();
                    }
                }
                b'\n' | b'\r' => break, // newline in regex is invalid
                _ => self.advance(),
            }
        }

        let pattern = self.slice(pattern_start, self.pos).to_string();
        if self.current() != b'/' {
            return TokenKind::Invalid;
        }
        self.advance(); // closing /

        let flags_start = self.pos;
        while matches!(self.current(), b'g' | b'i' | b'm' | b's' | b'u' | b'y') {
            self.advance();
        }
        let flags = self.slice(flags_start, self.pos).to_string();

        TokenKind::Regex { pattern, flags }
    }

    // === Multi-character operators ===

    fn scan_dot(&mut self) -> TokenKind {
        self.advance();
        if self.current().is_ascii_digit() {
            self.pos -= 1; // back up to rescan as a number
            self.scan_number()
        } else {
            TokenKind::Dot
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'+' => { self.advance(); TokenKind::PlusPlus }
            b'=' => { self.advance(); TokenKind::PlusEq }
            _ => TokenKind::Plus,
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'-' => { self.advance(); TokenKind::MinusMinus }
            b'=' => { self.advance(); TokenKind::MinusEq }
            _ => TokenKind::Minus,
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::StarEq
        } else {
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' if !self.allow_regex => { self.advance(); TokenKind::SlashEq }
            _ if self.allow_regex => {
                self.pos -= 1; // back up
                self.scan_regex()
            }
            _ => TokenKind::Slash,
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::EqEqEq
                } else {
                    TokenKind::EqEq
                }
            }
            b'>' => { self.advance(); TokenKind::Arrow }
            _ => TokenKind::Eq,
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::BangEqEq
                } else {
                    TokenKind::BangEq
                }
            }
            _ => TokenKind::Bang,
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'<' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::LtLtEq
                } else {
                    TokenKind::LtLt
                }
            }
            b'=' => { self.advance(); TokenKind::LtEq }
            _ => TokenKind::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'>' => {
                self.advance();
                match self.current() {
                    b'>' => {
                        self.advance();
                        if self.current() == b'=' {
                            self.advance();
                            TokenKind::GtGtGtEq
                        } else {
                            TokenKind::GtGtGt
                        }
                    }
                    b'=' => { self.advance(); TokenKind::GtGtEq }
                    _ => TokenKind::GtGt,
                }
            }
            b'=' => { self.advance(); TokenKind::GtEq }
            _ => TokenKind::Gt,
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'&' => { self.advance(); TokenKind::AmpAmp }
            b'=' => { self.advance(); TokenKind::AmpEq }
            _ => TokenKind::Amp,
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'|' => { self.advance(); TokenKind::PipePipe }
            b'=' => { self.advance(); TokenKind::PipeEq }
            _ => TokenKind::Pipe,
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }
}

/// Tokenize an entire source file into a vector (EOF excluded).
///
/// This is the stream the context extractor walks; spans key each token back
/// to the identifier occurrences the resolver collected.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            kinds("var foo _bar $baz"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("foo".into()),
                TokenKind::Identifier("_bar".into()),
                TokenKind::Identifier("$baz".into()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.14 0xff .5"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.14),
                TokenKind::Number(255.0),
                TokenKind::Number(0.5),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#""hello" 'world'"#),
            vec![
                TokenKind::String("hello".into()),
                TokenKind::String("world".into()),
            ]
        );
    }

    #[test]
    fn test_regex_vs_division() {
        assert_eq!(
            kinds("a / b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Slash,
                TokenKind::Identifier("b".into()),
            ]
        );
        assert_eq!(
            kinds("x = /ab+c/g"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Eq,
                TokenKind::Regex { pattern: "ab+c".into(), flags: "g".into() },
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("a // line\nb /* block */ c"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Identifier("c".into()),
            ]
        );
    }

    #[test]
    fn test_newline_tracking() {
        let tokens = tokenize("a\nb c");
        assert!(!tokens[0].had_newline_before);
        assert!(tokens[1].had_newline_before);
        assert!(!tokens[2].had_newline_before);
    }

    #[test]
    fn test_token_spans_slice_source() {
        let source = "foo.bar(1)";
        let tokens = tokenize(source);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(texts, vec!["foo", ".", "bar", "(", "1", ")"]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== === != !== && || => ..."),
            vec![
                TokenKind::EqEq,
                TokenKind::EqEqEq,
                TokenKind::BangEq,
                TokenKind::BangEqEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Arrow,
                TokenKind::Dot,
                TokenKind::Dot,
                TokenKind::Dot,
            ]
        );
    }
}
