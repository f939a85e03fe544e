// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cell-level visibility labels and the authorization gate.
//!
//! A [`Visibility`] is a boolean expression over authorization labels, written
//! in the column-visibility language of sorted-key stores:
//!
//! - a label is `[A-Za-z0-9_\-.:/]+` or a double-quoted string (`\"` and `\\`
//!   escapes),
//! - `&` and `|` combine terms, parentheses group them,
//! - one nesting level may not mix `&` and `|`,
//! - the empty expression is readable by everyone,
//! - parentheses nest at most [`MAX_NESTING`] deep.
//!
//! The read path never surfaces a parse failure: an expression the gate cannot
//! parse is simply unreadable.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Security expression attached to a stored cell.
#[repr(transparent)]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visibility(String);

impl Visibility {
    /// Wraps an expression string without validating it.
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// The empty visibility, readable by every caller.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns the raw expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the empty (public) expression.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the expression.
    ///
    /// # Errors
    ///
    /// Returns a [`VisibilityError`] describing the first syntax problem.
    pub fn parse(&self) -> Result<VisibilityExpr, VisibilityError> {
        VisibilityExpr::parse(&self.0)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Visibility {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Deepest parenthesis nesting the parser accepts.
pub const MAX_NESTING: usize = 64;

/// Syntax errors in a visibility expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisibilityError {
    /// Input ended where a term was expected.
    #[error("unexpected end of expression at offset {offset}")]
    UnexpectedEnd {
        /// Byte offset of the end of input.
        offset: usize,
    },
    /// A byte that cannot start or continue a term.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset of the character.
        offset: usize,
    },
    /// `&` and `|` appear at the same nesting level without parentheses.
    #[error("mixed '&' and '|' without parentheses at offset {offset}")]
    MixedOperators {
        /// Byte offset of the second operator kind.
        offset: usize,
    },
    /// A `(` without its `)` or a stray `)`.
    #[error("unbalanced parentheses at offset {offset}")]
    Unbalanced {
        /// Byte offset where the imbalance was detected.
        offset: usize,
    },
    /// Parentheses nest deeper than [`MAX_NESTING`].
    #[error("parentheses nested deeper than {MAX_NESTING} at offset {offset}")]
    TooDeep {
        /// Byte offset of the first `(` past the limit.
        offset: usize,
    },
    /// A quoted label was never closed or has a bad escape.
    #[error("malformed quoted label at offset {offset}")]
    BadQuote {
        /// Byte offset of the opening quote.
        offset: usize,
    },
}

/// Parsed visibility expression tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisibilityExpr {
    /// The empty expression.
    Always,
    /// A single authorization label.
    Label(String),
    /// All children must hold.
    And(Vec<VisibilityExpr>),
    /// At least one child must hold.
    Or(Vec<VisibilityExpr>),
}

impl VisibilityExpr {
    /// Parses `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`VisibilityError`] for malformed input.
    pub fn parse(source: &str) -> Result<Self, VisibilityError> {
        if source.is_empty() {
            return Ok(Self::Always);
        }
        let mut parser = Parser {
            src: source.as_bytes(),
            pos: 0,
            depth: 0,
        };
        let expr = parser.expr()?;
        if parser.pos != parser.src.len() {
            return Err(VisibilityError::Unbalanced { offset: parser.pos });
        }
        Ok(expr)
    }

    /// Evaluates the tree against a label predicate.
    pub fn evaluate(&self, has_label: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Always => true,
            Self::Label(label) => has_label(label),
            Self::And(children) => children.iter().all(|c| c.evaluate(has_label)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(has_label)),
        }
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
}

const fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':' | b'/')
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn unexpected(&self, b: u8) -> VisibilityError {
        VisibilityError::UnexpectedChar {
            found: char::from(b),
            offset: self.pos,
        }
    }

    fn expr(&mut self) -> Result<VisibilityExpr, VisibilityError> {
        let mut terms = vec![self.term()?];
        let mut op: Option<u8> = None;
        while let Some(b) = self.peek() {
            match b {
                b'&' | b'|' => {
                    if op.is_some_and(|prev| prev != b) {
                        return Err(VisibilityError::MixedOperators { offset: self.pos });
                    }
                    op = Some(b);
                    self.pos += 1;
                    terms.push(self.term()?);
                }
                b')' => break,
                other => return Err(self.unexpected(other)),
            }
        }
        Ok(match op {
            Some(b'&') => VisibilityExpr::And(terms),
            Some(_) => VisibilityExpr::Or(terms),
            None => terms.pop().unwrap_or(VisibilityExpr::Always),
        })
    }

    fn term(&mut self) -> Result<VisibilityExpr, VisibilityError> {
        match self.peek() {
            None => Err(VisibilityError::UnexpectedEnd { offset: self.pos }),
            Some(b'(') => {
                let open = self.pos;
                if self.depth == MAX_NESTING {
                    return Err(VisibilityError::TooDeep { offset: open });
                }
                self.depth += 1;
                self.pos += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                if self.peek() != Some(b')') {
                    return Err(VisibilityError::Unbalanced { offset: open });
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(b'"') => self.quoted(),
            Some(b) if is_label_byte(b) => {
                let start = self.pos;
                while self.peek().is_some_and(is_label_byte) {
                    self.pos += 1;
                }
                let label = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                Ok(VisibilityExpr::Label(label))
            }
            Some(b) => Err(self.unexpected(b)),
        }
    }

    fn quoted(&mut self) -> Result<VisibilityExpr, VisibilityError> {
        let open = self.pos;
        self.pos += 1;
        let mut label = Vec::new();
        loop {
            match self.peek() {
                None => return Err(VisibilityError::BadQuote { offset: open }),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(escaped @ (b'"' | b'\\')) => label.push(escaped),
                        _ => return Err(VisibilityError::BadQuote { offset: open }),
                    }
                    self.pos += 1;
                }
                Some(b) => {
                    label.push(b);
                    self.pos += 1;
                }
            }
        }
        if label.is_empty() {
            return Err(VisibilityError::BadQuote { offset: open });
        }
        let label = String::from_utf8(label).map_err(|_| VisibilityError::BadQuote { offset: open })?;
        Ok(VisibilityExpr::Label(label))
    }
}

/// Pure read-permission predicate consulted before any cell is accumulated.
///
/// Implementations must be deterministic and side-effect free; the same gate
/// may be shared read-only by decoders running on several threads.
pub trait AuthorizationGate {
    /// Returns true when the caller may read data labelled `visibility`.
    fn can_read(&self, visibility: &Visibility) -> bool;
}

impl<F> AuthorizationGate for F
where
    F: Fn(&Visibility) -> bool,
{
    fn can_read(&self, visibility: &Visibility) -> bool {
        self(visibility)
    }
}

/// The set of labels a caller holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorizations(BTreeSet<String>);

impl Authorizations {
    /// Authorizations holding exactly `labels`.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    /// No labels: only public cells are readable.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a comma-separated label list (`"A,B, C"`); blanks are ignored.
    #[must_use]
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    /// Returns true if the caller holds `label`.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    /// Iterates the held labels in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl AuthorizationGate for Authorizations {
    fn can_read(&self, visibility: &Visibility) -> bool {
        if visibility.is_empty() {
            return true;
        }
        visibility
            .parse()
            .is_ok_and(|expr| expr.evaluate(&|label| self.contains(label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readable(auths: &[&str], vis: &str) -> bool {
        Authorizations::new(auths.iter().copied()).can_read(&Visibility::from(vis))
    }

    #[test]
    fn empty_visibility_is_public() {
        assert!(readable(&[], ""));
    }

    #[test]
    fn single_label_requires_the_label() {
        assert!(readable(&["A"], "A"));
        assert!(!readable(&["B"], "A"));
    }

    #[test]
    fn and_or_and_grouping() {
        assert!(readable(&["A", "B"], "A&B"));
        assert!(!readable(&["A"], "A&B"));
        assert!(readable(&["B"], "A|B"));
        assert!(readable(&["A", "C"], "A&(B|C)"));
        assert!(!readable(&["B", "C"], "A&(B|C)"));
        assert!(readable(&["HR"], "(ADMIN|HR)&(HR)"));
    }

    #[test]
    fn quoted_labels_support_escapes() {
        assert!(readable(&["a b"], "\"a b\""));
        assert!(readable(&["x\"y"], "\"x\\\"y\""));
        assert!(matches!(
            VisibilityExpr::parse("\"open"),
            Err(VisibilityError::BadQuote { offset: 0 })
        ));
    }

    #[test]
    fn mixed_operators_without_parens_are_rejected() {
        assert!(matches!(
            VisibilityExpr::parse("A&B|C"),
            Err(VisibilityError::MixedOperators { offset: 3 })
        ));
    }

    #[test]
    fn malformed_expressions_are_unreadable_not_errors() {
        for bad in ["A&", "(A", "A)", "&", "()", "A B", "A||B"] {
            assert!(VisibilityExpr::parse(bad).is_err(), "{bad} should not parse");
            assert!(!readable(&["A", "B"], bad), "{bad} must not be readable");
        }
    }

    #[test]
    fn nesting_is_capped() {
        let nested = |n: usize| format!("{}A{}", "(".repeat(n), ")".repeat(n));
        assert!(readable(&["A"], &nested(MAX_NESTING)));
        assert!(matches!(
            VisibilityExpr::parse(&nested(MAX_NESTING + 1)),
            Err(VisibilityError::TooDeep { offset }) if offset == MAX_NESTING
        ));
        assert!(!readable(&["A"], &nested(20_000)));
    }

    #[test]
    fn closures_are_gates() {
        let only_a = |v: &Visibility| v.as_str() == "A";
        assert!(only_a.can_read(&Visibility::from("A")));
        assert!(!only_a.can_read(&Visibility::from("B")));
    }

    #[test]
    fn csv_authorizations_ignore_blanks() {
        let auths = Authorizations::from_csv("A, B,,C ");
        assert_eq!(auths.iter().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }
}
