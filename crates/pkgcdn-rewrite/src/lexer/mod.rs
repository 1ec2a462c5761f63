//! A restricted JavaScript tokenizer
//!
//! Produces just enough structure to find module specifiers reliably:
//! comments are skipped, and string, template and regular expression
//! literals become opaque tokens so that nothing inside them is mistaken for
//! an `import` or `export`. Operators are emitted one character at a time
//! (except `++` and `--`), which is all the specifier search needs.

use crate::frame::{code_frame, line_col};
use pkgcdn_core::error::CdnError;

/// Kind of a significant token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Punct,
    /// Single- or double-quoted string, quotes included
    Str,
    /// A template literal chunk: head, middle or tail
    Template,
    Regex,
    Number,
}

/// A token as a byte range into the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    pub fn is_punct(&self, source: &str, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(source) == punct
    }
}

/// Keywords after which a `/` starts a regular expression
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "await", "case", "delete", "do", "else", "extends", "in", "instanceof", "new", "of", "return",
    "throw", "typeof", "void", "yield",
];

/// Keywords directly followed by a block statement
const BLOCK_KEYWORDS: &[&str] = &["do", "else", "finally", "try"];

/// What an open `{` belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    /// Statement block, function or class body
    Block,
    /// Object literal or destructuring pattern
    Expression,
    /// Template substitution `${`
    Template,
}

/// Tokenize `source`, failing with a positioned `SyntaxError` on unterminated
/// literals or comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CdnError> {
    Lexer::new(source).run()
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    tokens: Vec<Token>,
    /// One element per open `{` or `${`
    braces: Vec<Brace>,
    /// Whether the most recent `}` closed a block, after which `/` starts a regex
    closed_block: bool,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            braces: Vec::new(),
            closed_block: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, CdnError> {
        if self.bytes.starts_with(b"#!") {
            self.skip_line();
        }

        while let Some(byte) = self.peek(0) {
            let start = self.pos;
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if self.regex_allowed() => self.regex(start)?,
                b'\'' | b'"' => self.string(start, byte)?,
                b'`' => {
                    self.pos += 1;
                    self.template(start)?;
                }
                b'{' => {
                    let brace = if self.opens_block() { Brace::Block } else { Brace::Expression };
                    self.braces.push(brace);
                    self.punct(start, 1);
                }
                b'}' => match self.braces.pop() {
                    Some(Brace::Template) => {
                        self.pos += 1;
                        self.template(start)?;
                    }
                    brace => {
                        self.closed_block = brace != Some(Brace::Expression);
                        self.punct(start, 1);
                    }
                },
                b'+' | b'-' if self.peek(1) == Some(byte) => self.punct(start, 2),
                b'0'..=b'9' => {
                    while self.peek(0).is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.') {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Number, start);
                }
                b if is_ident_start(b) => {
                    while self.peek(0).is_some_and(is_ident_part) {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Ident, start);
                }
                _ => self.punct(start, 1),
            }
        }

        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
        });
    }

    fn punct(&mut self, start: usize, len: usize) {
        self.pos += len;
        self.push(TokenKind::Punct, start);
    }

    fn skip_line(&mut self) {
        while let Some(byte) = self.peek(0) {
            if byte == b'\n' || byte == b'\r' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), CdnError> {
        let start = self.pos;
        match self.source[start + 2..].find("*/") {
            Some(offset) => {
                self.pos = start + 2 + offset + 2;
                Ok(())
            }
            None => Err(self.error("Unterminated comment", start)),
        }
    }

    fn string(&mut self, start: usize, quote: u8) -> Result<(), CdnError> {
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') | Some(b'\r') => {
                    return Err(self.error("Unterminated string constant", start));
                }
                Some(b'\\') => self.pos += 2,
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::Str, start);
        Ok(())
    }

    /// Scan a template chunk; the opening `` ` `` or `}` is already consumed
    fn template(&mut self, start: usize) -> Result<(), CdnError> {
        loop {
            match self.peek(0) {
                None => return Err(self.error("Unterminated template", start)),
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    break;
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.braces.push(Brace::Template);
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::Template, start);
        Ok(())
    }

    fn regex(&mut self, start: usize) -> Result<(), CdnError> {
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.peek(0) {
                None | Some(b'\n') | Some(b'\r') => {
                    return Err(self.error("Unterminated regular expression", start));
                }
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        while self.peek(0).is_some_and(is_ident_part) {
            self.pos += 1;
        }
        self.push(TokenKind::Regex, start);
        Ok(())
    }

    /// Whether a `/` here begins a regular expression rather than a division
    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        match prev.kind {
            TokenKind::Str | TokenKind::Template | TokenKind::Regex | TokenKind::Number => false,
            TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&prev.text(self.source)),
            TokenKind::Punct => match prev.text(self.source) {
                "}" => self.closed_block,
                ")" | "]" | "++" | "--" => false,
                _ => true,
            },
        }
    }

    /// Whether a `{` here opens a block rather than an object literal.
    /// Function expressions are treated as blocks too.
    fn opens_block(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        let text = prev.text(self.source);
        match prev.kind {
            TokenKind::Ident => {
                BLOCK_KEYWORDS.contains(&text) || !REGEX_PREFIX_KEYWORDS.contains(&text)
            }
            TokenKind::Punct => match text {
                ")" | ";" | "{" | "}" => true,
                ">" => self.follows_arrow(prev),
                _ => false,
            },
            TokenKind::Str | TokenKind::Template | TokenKind::Regex | TokenKind::Number => false,
        }
    }

    /// Whether `gt` is the `>` of an adjacent `=>`
    fn follows_arrow(&self, gt: &Token) -> bool {
        match self.tokens.len().checked_sub(2) {
            Some(index) => {
                let eq = &self.tokens[index];
                eq.end == gt.start && eq.is_punct(self.source, "=")
            }
            None => false,
        }
    }

    fn error(&self, message: &str, offset: usize) -> CdnError {
        let (line, column) = line_col(self.source, offset);
        CdnError::ModuleRewrite {
            kind: "SyntaxError".to_string(),
            message: format!("{} ({}:{})", message, line, column),
            code_frame: code_frame(self.source, line, column),
        }
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn is_ident_part(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}
