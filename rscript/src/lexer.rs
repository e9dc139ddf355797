// The lexer turns script text into a flat list of tokens, each with the
// span it came from. Whitespace and comments never become tokens

use crate::{Span, Token, TokenType};

#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnterminatedString(Span),
    UnterminatedComment(Span),
    UnexpectedCharacter(char, Span),
    InvalidNumber(String, Span),
}
impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use LexError::*;
        match self {
            UnterminatedString(span) => {
                write!(f, "[ERROR] unterminated string literal at {}", span)
            }
            UnterminatedComment(span) => write!(f, "[ERROR] unterminated comment at {}", span),
            UnexpectedCharacter(c, span) => write!(
                f,
                "[ERROR] lexer doesn't know what to do with character {:?} at {}",
                c, span
            ),
            InvalidNumber(text, span) => write!(f, "[ERROR] invalid number {} at {}", text, span),
        }
    }
}
impl std::error::Error for LexError {}

// Rules: A-Z,a-z,_,$
fn is_id_1st(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

// same as above, plus 0-9
fn is_id(c: char) -> bool {
    is_id_1st(c) || c.is_ascii_digit()
}

enum NextSymbolType {
    None,
    SymbolOrId(char),
    Space,
    Digit(char),
    Quote(char),
    Slash,
    Punct(char),
}

#[derive(Debug)]
struct Lexer {
    tokens: Vec<Token>,
    rchars: Vec<char>,
    line: usize,
    col: usize,
}

impl Lexer {
    fn new(source: &str) -> Lexer {
        Lexer {
            tokens: Vec::new(),
            rchars: source.chars().rev().collect(),
            line: 1,
            col: 1,
        }
    }

    /// the location of the next char to be popped
    fn here(&self) -> Span {
        Span::at(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.rchars.last().copied()
    }

    fn peek2(&self) -> Option<char> {
        let len = self.rchars.len();
        if len < 2 {
            None
        } else {
            Some(self.rchars[len - 2])
        }
    }

    fn pop(&mut self) -> Option<char> {
        let c = self.rchars.pop()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// only pops if the next char is `what`
    fn eat(&mut self, what: char) -> bool {
        if self.peek() == Some(what) {
            self.pop();
            true
        } else {
            false
        }
    }

    fn next_symbol_type(&mut self) -> NextSymbolType {
        use NextSymbolType::*;

        // None is ours here, not Option's
        let c = match self.pop() {
            Some(c) => c,
            Option::None => return None,
        };

        if is_id_1st(c) {
            SymbolOrId(c)
        } else if c.is_whitespace() {
            Space
        } else if c.is_ascii_digit() {
            Digit(c)
        } else if c == '"' || c == '\'' {
            Quote(c)
        } else if c == '/' {
            Slash
        } else {
            Punct(c)
        }
    }

    fn identifier(&mut self, first: char) -> TokenType {
        let mut text = first.to_string();
        while let Some(x) = self.peek() {
            if !is_id(x) {
                break;
            }
            text.push(x);
            self.pop();
        }
        match TokenType::keyword(&text) {
            Some(keyword) => keyword,
            None => TokenType::Identifier(text),
        }
    }

    fn number(&mut self, first: char, span: Span) -> Result<TokenType, LexError> {
        let mut text = first.to_string();
        let mut seen_dot = false;
        loop {
            match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    text.push(d);
                    self.pop();
                }
                // a dot only belongs to the number if a digit follows, so
                // `1.toString` style member access still lexes
                Some('.') if !seen_dot && self.peek2().map_or(false, |d| d.is_ascii_digit()) => {
                    seen_dot = true;
                    text.push('.');
                    self.pop();
                }
                _ => break,
            }
        }
        match text.parse() {
            Ok(number) => Ok(TokenType::NumberLit(number)),
            Err(_) => Err(LexError::InvalidNumber(text, span)),
        }
    }

    fn string(&mut self, quote: char, span: Span) -> Result<TokenType, LexError> {
        let mut text = String::new();
        loop {
            // Pop immediately because don't include literal quote anyway
            match self.pop() {
                Some(c) if c == quote => break Ok(TokenType::StringLit(text)),
                Some('\\') => match self.pop() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some(other) => text.push(other),
                    None => break Err(LexError::UnterminatedString(span)),
                },
                Some('\n') | None => break Err(LexError::UnterminatedString(span)),
                Some(c) => text.push(c),
            }
        }
    }

    /// called after a slash. Returns None when it was a comment
    fn slash(&mut self, span: Span) -> Result<Option<TokenType>, LexError> {
        if self.eat('/') {
            while self.peek().is_some() && self.peek() != Some('\n') {
                self.pop();
            }
            Ok(None)
        } else if self.eat('*') {
            loop {
                match self.pop() {
                    Some('*') if self.eat('/') => break Ok(None),
                    Some(_) => (),
                    None => break Err(LexError::UnterminatedComment(span)),
                }
            }
        } else if self.eat('=') {
            Ok(Some(TokenType::OpAssign(Box::new(TokenType::Divide))))
        } else {
            Ok(Some(TokenType::Divide))
        }
    }

    fn punct(&mut self, c: char, span: Span) -> Result<TokenType, LexError> {
        use TokenType::*;
        let op_assign = |lexer: &mut Lexer, op: TokenType| {
            if lexer.eat('=') {
                OpAssign(Box::new(op))
            } else {
                op
            }
        };
        Ok(match c {
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            ',' => Comma,
            '.' => Dot,
            ':' => Colon,
            ';' => Semicolon,
            '+' => op_assign(self, Plus),
            '-' => op_assign(self, Minus),
            '*' => op_assign(self, Times),
            '%' => Mod,
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        StrictEqual
                    } else {
                        Equal
                    }
                } else {
                    Assignment
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        StrictNotEqual
                    } else {
                        NotEqual
                    }
                } else {
                    Not
                }
            }
            '<' => {
                if self.eat('=') {
                    LessEqual
                } else {
                    Less
                }
            }
            '>' => {
                if self.eat('=') {
                    GreaterEqual
                } else {
                    Greater
                }
            }
            '&' if self.eat('&') => And,
            '|' if self.eat('|') => Or,
            _ => return Err(LexError::UnexpectedCharacter(c, span)),
        })
    }
}

pub fn lex(text: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(text);
    loop {
        let lo = lexer.here();
        let kind = match lexer.next_symbol_type() {
            NextSymbolType::None => {
                // This is the end of the file, which is OK, as we are not in the middle
                // of matching a token
                break;
            }
            NextSymbolType::Space => continue,
            NextSymbolType::SymbolOrId(c) => lexer.identifier(c),
            NextSymbolType::Digit(c) => lexer.number(c, lo)?,
            NextSymbolType::Quote(q) => lexer.string(q, lo)?,
            NextSymbolType::Slash => match lexer.slash(lo)? {
                Some(kind) => kind,
                None => continue,
            },
            NextSymbolType::Punct(c) => lexer.punct(c, lo)?,
        };
        // hi is the last char of the token, not the one after
        let hi = (lexer.line, lexer.col.saturating_sub(1).max(1));
        lexer.tokens.push(Token { kind, span: Span { lo: lo.lo, hi } });
    }
    Ok(lexer.tokens)
}
