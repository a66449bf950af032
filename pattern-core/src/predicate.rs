//! Search predicates handed to the persistence collaborator.
//!
//! The resolver never talks to a concrete query language; it composes
//! [`Predicate`] values and leaves translation to the `RecordSearch`
//! implementation. Related-field clauses use dotted paths
//! (`country_id.code`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A search predicate over records of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every record
    True,
    /// Field equality, field may be a dotted related path
    Eq(String, Value),
    /// Conjunction of predicates
    And(Vec<Predicate>),
}

impl Predicate {
    /// Equality clause
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    /// Combine two predicates with logical AND, flattening nested
    /// conjunctions and dropping trivial terms
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        let mut clauses = Vec::new();
        Self::push_clauses(&mut clauses, self);
        Self::push_clauses(&mut clauses, other);
        match clauses.len() {
            0 => Self::True,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        }
    }

    /// AND-combine an iterator of predicates
    #[must_use]
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        predicates
            .into_iter()
            .fold(Self::True, |acc, p| acc.and(p))
    }

    /// Whether this predicate matches unconditionally
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        match self {
            Self::True => true,
            Self::Eq(..) => false,
            Self::And(clauses) => clauses.iter().all(Self::is_trivial),
        }
    }

    fn push_clauses(clauses: &mut Vec<Predicate>, predicate: Predicate) {
        match predicate {
            Self::True => {}
            Self::And(inner) => {
                for clause in inner {
                    Self::push_clauses(clauses, clause);
                }
            }
            eq @ Self::Eq(..) => clauses.push(eq),
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::True
    }
}
