//! Recursive-descent parser over the pattern token stream.
//!
//! Precedence follows the published grammar: `FOLLOWEDBY` binds loosest,
//! then `OR`, then `AND`, at both the observation and comparison levels.

use super::lexer::{tokenize, Keyword, Lexed, Token};
use super::{Comparison, ComparisonOp, Node, PatternError};

pub(super) fn parse(src: &str) -> Result<Node, PatternError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let root = parser.observation_expressions()?;
    if let Some(lexed) = parser.tokens.get(parser.pos) {
        return Err(PatternError::TrailingInput(lexed.start));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Lexed>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|l| &l.token)
    }

    fn peek_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.peek_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> PatternError {
        match self.tokens.get(self.pos) {
            Some(lexed) => PatternError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.src[lexed.start..lexed.end].to_string(),
                pos: lexed.start,
            },
            None => PatternError::UnexpectedEnd,
        }
    }

    /// Byte offset of the current token, or an error at end of input.
    fn current_start(&self) -> Result<usize, PatternError> {
        self.tokens
            .get(self.pos)
            .map(|l| l.start)
            .ok_or(PatternError::UnexpectedEnd)
    }

    /// Byte offset just past the most recently consumed token.
    fn previous_end(&self) -> usize {
        self.tokens[self.pos - 1].end
    }

    // -- observation level --

    fn observation_expressions(&mut self) -> Result<Node, PatternError> {
        let first = self.observation_or()?;
        if !self.peek_keyword(Keyword::FollowedBy) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat_keyword(Keyword::FollowedBy) {
            parts.push(self.observation_or()?);
        }
        Ok(Node::FollowedBy(parts))
    }

    fn observation_or(&mut self) -> Result<Node, PatternError> {
        let mut node = self.observation_and()?;
        while self.eat_keyword(Keyword::Or) {
            let rhs = self.observation_and()?;
            node = Node::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn observation_and(&mut self) -> Result<Node, PatternError> {
        let mut node = self.observation()?;
        while self.eat_keyword(Keyword::And) {
            let rhs = self.observation()?;
            node = Node::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn observation(&mut self) -> Result<Node, PatternError> {
        let node = match self.peek() {
            Some(Token::LBracket) => {
                self.pos += 1;
                let expr = self.comparison_or()?;
                self.expect(&Token::RBracket, "']'")?;
                Node::Observation {
                    expr: Box::new(expr),
                    qualifiers: Vec::new(),
                }
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.observation_expressions()?;
                self.expect(&Token::RParen, "')'")?;
                inner
            }
            _ => return Err(self.unexpected("'[' or '('")),
        };
        self.with_qualifiers(node)
    }

    /// Parse any trailing qualifiers and attach them to the node as raw text.
    fn with_qualifiers(&mut self, node: Node) -> Result<Node, PatternError> {
        let mut collected = Vec::new();
        loop {
            let start = match self.tokens.get(self.pos) {
                Some(lexed) => lexed.start,
                None => break,
            };
            match self.peek() {
                Some(Token::Keyword(Keyword::Within)) => {
                    self.pos += 1;
                    self.expect_number()?;
                    self.expect_keyword(Keyword::Seconds, "SECONDS")?;
                }
                Some(Token::Keyword(Keyword::Repeats)) => {
                    self.pos += 1;
                    self.expect_number()?;
                    self.expect_keyword(Keyword::Times, "TIMES")?;
                }
                Some(Token::Keyword(Keyword::Start)) => {
                    self.pos += 1;
                    self.expect(&Token::TypedLit, "timestamp literal")?;
                    self.expect_keyword(Keyword::Stop, "STOP")?;
                    self.expect(&Token::TypedLit, "timestamp literal")?;
                }
                _ => break,
            }
            collected.push(self.src[start..self.previous_end()].to_string());
        }
        if collected.is_empty() {
            return Ok(node);
        }
        match node {
            Node::Observation {
                expr,
                mut qualifiers,
            } => {
                qualifiers.extend(collected);
                Ok(Node::Observation { expr, qualifiers })
            }
            other => Ok(Node::Observation {
                expr: Box::new(other),
                qualifiers: collected,
            }),
        }
    }

    // -- comparison level --

    fn comparison_or(&mut self) -> Result<Node, PatternError> {
        let mut node = self.comparison_and()?;
        while self.eat_keyword(Keyword::Or) {
            let rhs = self.comparison_and()?;
            node = Node::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn comparison_and(&mut self) -> Result<Node, PatternError> {
        let mut node = self.prop_test()?;
        while self.eat_keyword(Keyword::And) {
            let rhs = self.prop_test()?;
            node = Node::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn prop_test(&mut self) -> Result<Node, PatternError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.comparison_or()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            Some(Token::Keyword(Keyword::Exists)) => {
                let start = self.current_start()?;
                self.pos += 1;
                let object_path = self.expect_path()?;
                return Ok(Node::Comparison(Comparison {
                    object_path,
                    op: ComparisonOp::Exists,
                    negated: false,
                    text: self.src[start..self.previous_end()].to_string(),
                }));
            }
            _ => {}
        }

        let start = self.current_start()?;
        let object_path = self.expect_path()?;
        let negated = self.eat_keyword(Keyword::Not);
        let op = match self.peek() {
            Some(Token::Eq) => {
                self.pos += 1;
                self.expect_primitive()?;
                ComparisonOp::Equal
            }
            Some(Token::Neq) => {
                self.pos += 1;
                self.expect_primitive()?;
                ComparisonOp::NotEqual
            }
            Some(Token::Lt) => {
                self.pos += 1;
                self.expect_primitive()?;
                ComparisonOp::Less
            }
            Some(Token::Le) => {
                self.pos += 1;
                self.expect_primitive()?;
                ComparisonOp::LessEqual
            }
            Some(Token::Gt) => {
                self.pos += 1;
                self.expect_primitive()?;
                ComparisonOp::Greater
            }
            Some(Token::Ge) => {
                self.pos += 1;
                self.expect_primitive()?;
                ComparisonOp::GreaterEqual
            }
            Some(Token::Keyword(Keyword::In)) => {
                self.pos += 1;
                self.set_literal()?;
                ComparisonOp::In
            }
            Some(Token::Keyword(Keyword::Like)) => {
                self.pos += 1;
                self.expect(&Token::Str, "string literal")?;
                ComparisonOp::Like
            }
            Some(Token::Keyword(Keyword::Matches)) => {
                self.pos += 1;
                self.expect(&Token::Str, "string literal")?;
                ComparisonOp::Matches
            }
            Some(Token::Keyword(Keyword::IsSubset)) => {
                self.pos += 1;
                self.expect(&Token::Str, "string literal")?;
                ComparisonOp::IsSubset
            }
            Some(Token::Keyword(Keyword::IsSuperset)) => {
                self.pos += 1;
                self.expect(&Token::Str, "string literal")?;
                ComparisonOp::IsSuperset
            }
            _ => return Err(self.unexpected("comparison operator")),
        };

        Ok(Node::Comparison(Comparison {
            object_path,
            op,
            negated,
            text: self.src[start..self.previous_end()].to_string(),
        }))
    }

    fn set_literal(&mut self) -> Result<(), PatternError> {
        self.expect(&Token::LParen, "'('")?;
        self.expect_primitive()?;
        while matches!(self.peek(), Some(Token::Comma)) {
            self.pos += 1;
            self.expect_primitive()?;
        }
        self.expect(&Token::RParen, "')'")?;
        Ok(())
    }

    // -- token expectations --

    fn expect(&mut self, token: &Token, expected: &str) -> Result<(), PatternError> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, expected: &str) -> Result<(), PatternError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_number(&mut self) -> Result<(), PatternError> {
        match self.peek() {
            Some(Token::Int) | Some(Token::Float) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.unexpected("number")),
        }
    }

    fn expect_path(&mut self) -> Result<String, PatternError> {
        if let Some(Token::Path(path)) = self.peek() {
            let path = path.clone();
            self.pos += 1;
            Ok(path)
        } else {
            Err(self.unexpected("object path"))
        }
    }

    fn expect_primitive(&mut self) -> Result<(), PatternError> {
        match self.peek() {
            Some(Token::Str)
            | Some(Token::TypedLit)
            | Some(Token::Int)
            | Some(Token::Float)
            | Some(Token::Bool) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.unexpected("literal value")),
        }
    }
}
