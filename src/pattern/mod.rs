//! STIX 2.1 pattern grammar.
//!
//! This module provides:
//! - A tokenizer and recursive-descent parser for STIX 2.1 pattern text
//! - A syntax tree preserving each property test's raw source slice
//! - A listener-driven tree walk dispatching per-operator callbacks
//! - [`ObservationExtractor`], a listener that folds the walk into a flat
//!   ordered list of `(path, value)` observation pairs

mod lexer;
mod parser;


use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),

    #[error("unexpected character {ch:?} at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("expected {expected}, found {found:?} at byte {pos}")]
    UnexpectedToken {
        expected: String,
        found: String,
        pos: usize,
    },

    #[error("unexpected end of pattern")]
    UnexpectedEnd,

    #[error("trailing input at byte {0}")]
    TrailingInput(usize),
}

// ---------------------------------------------------------------------------
// Syntax tree
// ---------------------------------------------------------------------------

/// Comparison operator of a property test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    Like,
    Matches,
    IsSubset,
    IsSuperset,
    Exists,
}

/// A single property test, e.g. `ipv4-addr:value = '1.2.3.4'`.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// The object path on the left-hand side.
    pub object_path: String,
    pub op: ComparisonOp,
    /// True for `NOT`-prefixed operators (`a:b NOT IN (..)`).
    pub negated: bool,
    /// Raw source slice this property test was parsed from.
    pub text: String,
}

/// A node of the parsed pattern.
#[derive(Debug, Clone)]
pub enum Node {
    /// `a FOLLOWEDBY b FOLLOWEDBY c`, in source order.
    FollowedBy(Vec<Node>),
    Or(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    /// A bracketed observation expression (or a parenthesized group) with
    /// its trailing qualifiers (`WITHIN .. SECONDS`, `REPEATS .. TIMES`,
    /// `START .. STOP ..`) kept as raw text.
    Observation {
        expr: Box<Node>,
        qualifiers: Vec<String>,
    },
    Comparison(Comparison),
}

/// A parsed STIX 2.1 pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    root: Node,
}

impl Pattern {
    /// Parse raw pattern text.
    pub fn parse(input: &str) -> Result<Self, PatternError> {
        parser::parse(input).map(|root| Self { root })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Walk the tree in source order, dispatching each property test to the
    /// listener callback matching its operator.
    pub fn walk<L: PatternListener>(&self, listener: &mut L) {
        walk_node(&self.root, listener);
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Per-node-kind callbacks dispatched during [`Pattern::walk`].
///
/// All callbacks default to no-ops; implementors override only the property
/// tests they care about.
pub trait PatternListener {
    /// Plain equality tests (`path = 'value'`).
    fn on_equality(&mut self, _cmp: &Comparison) {}

    /// Non-negated set membership tests (`path IN ('a', 'b')`).
    fn on_set(&mut self, _cmp: &Comparison) {}

    /// Every other property test.
    fn on_other(&mut self, _cmp: &Comparison) {}
}

fn walk_node<L: PatternListener>(node: &Node, listener: &mut L) {
    match node {
        Node::FollowedBy(parts) => {
            for part in parts {
                walk_node(part, listener);
            }
        }
        Node::Or(lhs, rhs) | Node::And(lhs, rhs) => {
            walk_node(lhs, listener);
            walk_node(rhs, listener);
        }
        Node::Observation { expr, .. } => walk_node(expr, listener),
        Node::Comparison(cmp) => match cmp.op {
            ComparisonOp::Equal if !cmp.negated => listener.on_equality(cmp),
            ComparisonOp::In if !cmp.negated => listener.on_set(cmp),
            _ => listener.on_other(cmp),
        },
    }
}

// ---------------------------------------------------------------------------
// Observation extraction
// ---------------------------------------------------------------------------

/// A flat `(path, value)` pair extracted from a pattern, quotes stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// STIX object path, e.g. `ipv4-addr:value` or `file:hashes.MD5`.
    pub path: String,
    /// The literal right-hand-side token with surrounding quotes removed.
    pub value: String,
}

/// Listener folding a pattern walk into an ordered observation list.
///
/// The accumulator is exclusively owned; consume it with
/// [`ObservationExtractor::into_observations`] after the walk. Walking the
/// same pattern into two fresh extractors yields identical lists.
#[derive(Debug, Default)]
pub struct ObservationExtractor {
    observations: Vec<Observation>,
}

impl ObservationExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }
}

impl PatternListener for ObservationExtractor {
    fn on_equality(&mut self, cmp: &Comparison) {
        let Some(eq) = cmp.text.find('=') else { return };
        let path = cmp.text[..eq].trim();
        let value = strip_ends(cmp.text[eq + 1..].trim());
        self.observations.push(Observation {
            path: path.to_string(),
            value: value.to_string(),
        });
    }

    fn on_set(&mut self, cmp: &Comparison) {
        let Some((path, values)) = cmp.text.split_once("IN") else {
            return;
        };
        let path = path.trim();
        // Strip the surrounding parens, then split on commas.
        for value in strip_ends(values.trim()).split(',') {
            self.observations.push(Observation {
                path: path.to_string(),
                value: strip_ends(value.trim()).to_string(),
            });
        }
    }
}

/// Drop the first and last character (the quote or paren delimiters).
fn strip_ends(s: &str) -> &str {
    let mut chars = s.chars();
    if chars.next().is_none() {
        return "";
    }
    if chars.next_back().is_none() {
        return "";
    }
    chars.as_str()
}
