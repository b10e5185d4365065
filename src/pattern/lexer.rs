//! Tokenizer for STIX 2.1 pattern text.

use super::PatternError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    /// Single-quoted string literal.
    Str,
    /// Typed literal such as `t'2020-01-01T00:00:00Z'`, `h'dead'`, `b'AAAA'`.
    TypedLit,
    Int,
    Float,
    Bool,
    /// An object path such as `file:hashes.'SHA-256'`, or a bare identifier.
    Path(String),
    Keyword(Keyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Keyword {
    And,
    Or,
    Not,
    In,
    Like,
    Matches,
    IsSubset,
    IsSuperset,
    Exists,
    FollowedBy,
    Within,
    Repeats,
    Times,
    Start,
    Stop,
    Seconds,
}

/// A token together with its byte span in the source text.
#[derive(Debug, Clone)]
pub(super) struct Lexed {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

pub(super) fn tokenize(src: &str) -> Result<Vec<Lexed>, PatternError> {
    let mut cur = Cursor { src, pos: 0 };
    let mut out = Vec::new();

    while let Some(c) = cur.peek() {
        let start = cur.pos;
        let token = match c {
            c if c.is_whitespace() => {
                cur.bump();
                continue;
            }
            '[' => {
                cur.bump();
                Token::LBracket
            }
            ']' => {
                cur.bump();
                Token::RBracket
            }
            '(' => {
                cur.bump();
                Token::LParen
            }
            ')' => {
                cur.bump();
                Token::RParen
            }
            ',' => {
                cur.bump();
                Token::Comma
            }
            '=' => {
                cur.bump();
                Token::Eq
            }
            '!' => {
                cur.bump();
                if cur.peek() == Some('=') {
                    cur.bump();
                    Token::Neq
                } else {
                    return Err(PatternError::UnexpectedChar { ch: '!', pos: start });
                }
            }
            '<' => {
                cur.bump();
                if cur.peek() == Some('=') {
                    cur.bump();
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                cur.bump();
                if cur.peek() == Some('=') {
                    cur.bump();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '\'' => {
                lex_string(&mut cur)?;
                Token::Str
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => lex_number(&mut cur),
            c if c.is_alphabetic() || c == '_' => {
                if matches!(c, 't' | 'h' | 'b') && cur.peek2() == Some('\'') {
                    cur.bump();
                    lex_string(&mut cur)?;
                    Token::TypedLit
                } else {
                    lex_word(&mut cur, src, start)?
                }
            }
            other => {
                return Err(PatternError::UnexpectedChar {
                    ch: other,
                    pos: start,
                })
            }
        };
        out.push(Lexed {
            token,
            start,
            end: cur.pos,
        });
    }

    Ok(out)
}

/// Consume a string literal starting at the opening quote. Backslash escapes
/// the following character.
fn lex_string(cur: &mut Cursor) -> Result<(), PatternError> {
    let start = cur.pos;
    cur.bump();
    while let Some(c) = cur.bump() {
        match c {
            '\\' => {
                cur.bump();
            }
            '\'' => return Ok(()),
            _ => {}
        }
    }
    Err(PatternError::UnterminatedString(start))
}

fn lex_number(cur: &mut Cursor) -> Token {
    if matches!(cur.peek(), Some('-') | Some('+')) {
        cur.bump();
    }
    let mut is_float = false;
    while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
        cur.bump();
    }
    if cur.peek() == Some('.') && matches!(cur.peek2(), Some(c) if c.is_ascii_digit()) {
        is_float = true;
        cur.bump();
        while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
            cur.bump();
        }
    }
    if matches!(cur.peek(), Some('e') | Some('E')) {
        is_float = true;
        cur.bump();
        if matches!(cur.peek(), Some('-') | Some('+')) {
            cur.bump();
        }
        while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
            cur.bump();
        }
    }
    if is_float {
        Token::Float
    } else {
        Token::Int
    }
}

/// Consume an identifier-like run: a keyword, a boolean, or an object path.
fn lex_word(cur: &mut Cursor, src: &str, start: usize) -> Result<Token, PatternError> {
    while matches!(cur.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-') {
        cur.bump();
    }
    if cur.peek() == Some(':') {
        lex_path_rest(cur)?;
        return Ok(Token::Path(src[start..cur.pos].to_string()));
    }
    let word = &src[start..cur.pos];
    Ok(match word {
        "AND" => Token::Keyword(Keyword::And),
        "OR" => Token::Keyword(Keyword::Or),
        "NOT" => Token::Keyword(Keyword::Not),
        "IN" => Token::Keyword(Keyword::In),
        "LIKE" => Token::Keyword(Keyword::Like),
        "MATCHES" => Token::Keyword(Keyword::Matches),
        "ISSUBSET" => Token::Keyword(Keyword::IsSubset),
        "ISSUPERSET" => Token::Keyword(Keyword::IsSuperset),
        "EXISTS" => Token::Keyword(Keyword::Exists),
        "FOLLOWEDBY" => Token::Keyword(Keyword::FollowedBy),
        "WITHIN" => Token::Keyword(Keyword::Within),
        "REPEATS" => Token::Keyword(Keyword::Repeats),
        "TIMES" => Token::Keyword(Keyword::Times),
        "START" => Token::Keyword(Keyword::Start),
        "STOP" => Token::Keyword(Keyword::Stop),
        "SECONDS" => Token::Keyword(Keyword::Seconds),
        "true" | "false" => Token::Bool,
        _ => Token::Path(word.to_string()),
    })
}

/// Consume the remainder of an object path, starting at the `:` after the
/// object type. Handles dotted keys, quoted key components
/// (`file:hashes.'SHA-256'`), and list selectors (`a:b[0]`, `a:b[*]`).
fn lex_path_rest(cur: &mut Cursor) -> Result<(), PatternError> {
    let mut prev = ':';
    loop {
        match cur.peek() {
            Some(c) if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') => {
                cur.bump();
                prev = c;
            }
            Some('\'') if prev == '.' => {
                lex_string(cur)?;
                prev = '\'';
            }
            Some('[') => {
                cur.bump();
                while matches!(cur.peek(), Some(c) if c.is_ascii_digit() || c == '*') {
                    cur.bump();
                }
                match cur.peek() {
                    Some(']') => {
                        cur.bump();
                        prev = ']';
                    }
                    other => {
                        return Err(PatternError::UnexpectedChar {
                            ch: other.unwrap_or(' '),
                            pos: cur.pos,
                        })
                    }
                }
            }
            _ => break,
        }
    }
    Ok(())
}
