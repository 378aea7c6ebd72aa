use serde_json::Value;

use crate::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// The record exists.
    Exists,
    Equals { attribute: String, value: Value },
    /// Also satisfied when the attribute is missing from an existing record.
    NotEquals { attribute: String, value: Value },
    /// The record exists but does not carry `attribute`.
    Missing { attribute: String },
}

impl Clause {
    fn holds(&self, record: &Record) -> bool {
        match self {
            Clause::Exists => true,
            Clause::Equals { attribute, value } => record.get(attribute) == Some(value),
            Clause::NotEquals { attribute, value } => record.get(attribute) != Some(value),
            Clause::Missing { attribute } => !record.contains(attribute),
        }
    }
}

/// Precondition on the live record, checked atomically with the write it guards.
///
/// A conjunction of clauses. Against an absent record every non-empty
/// condition fails, so "no such record" and "record in another state" are
/// indistinguishable to the writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    clauses: Vec<Clause>,
}

impl Condition {
    #[must_use]
    pub fn exists() -> Self {
        Self {
            clauses: vec![Clause::Exists],
        }
    }

    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_equals(attribute, value)
    }

    pub fn and_equals(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Equals {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    pub fn and_not_equals(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::NotEquals {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    pub fn and_missing(mut self, attribute: impl Into<String>) -> Self {
        self.clauses.push(Clause::Missing {
            attribute: attribute.into(),
        });
        self
    }

    #[must_use]
    pub fn evaluate(&self, current: Option<&Record>) -> bool {
        match current {
            Some(record) => self.clauses.iter().all(|clause| clause.holds(record)),
            None => self.clauses.is_empty(),
        }
    }
}

/// Shared by the backends: `None` always passes.
pub(crate) fn satisfied(condition: Option<&Condition>, current: Option<&Record>) -> bool {
    condition.is_none_or(|condition| condition.evaluate(current))
}
