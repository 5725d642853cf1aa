//! Builder methods for creating Condition instances.

use super::Condition;
use serde_json::Value;

impl Condition {
    /// Creates an exact-match condition.
    #[must_use]
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an any-of condition.
    #[must_use]
    pub fn terms<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a prefix condition.
    #[must_use]
    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a substring condition.
    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a greater-than-or-equal condition.
    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gt: None,
            gte: Some(value.into()),
            lt: None,
            lte: None,
        }
    }

    /// Creates a less-than condition.
    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gt: None,
            gte: None,
            lt: Some(value.into()),
            lte: None,
        }
    }

    /// Creates an exists condition.
    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists { field: field.into() }
    }

    /// Creates an AND condition. An empty list matches everything.
    #[must_use]
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::And { conditions }
    }

    /// Creates an OR condition. An empty list matches nothing.
    #[must_use]
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::Or { conditions }
    }

    /// Creates a NOT condition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }
}
