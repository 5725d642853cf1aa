//! Filters over stored suggestion documents.
//!
//! Conditions are evaluated against JSON documents. Field paths use dot
//! notation; a numeric segment indexes into an array (`readings.0` is the
//! reading set of the first word). When the resolved value is an array,
//! leaf conditions match if any element matches.
//!
//! ## Usage
//!
//! ```rust
//! use suggest_core::store::Condition;
//! use serde_json::json;
//!
//! let filter = Condition::and(vec![
//!     Condition::prefix("readings.0", "jav"),
//!     Condition::term("roles", "_default"),
//! ]);
//!
//! let doc = json!({"readings": [["java"]], "roles": ["_default"]});
//! assert!(filter.matches(&doc));
//! ```

mod builders;
mod matching;


use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) use matching::{compare_values, get_field};

/// A condition over a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Matches every document.
    MatchAll,
    /// Exact value match.
    Term {
        /// Field path
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Matches any of the given values.
    Terms {
        /// Field path
        field: String,
        /// Accepted values
        values: Vec<Value>,
    },
    /// String prefix match.
    Prefix {
        /// Field path
        field: String,
        /// Required prefix
        value: String,
    },
    /// Substring match on string values.
    Contains {
        /// Field path
        field: String,
        /// Substring to search for
        value: String,
    },
    /// Bounded comparison; absent bounds are open.
    Range {
        /// Field path
        field: String,
        /// Exclusive lower bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gt: Option<Value>,
        /// Inclusive lower bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        /// Exclusive upper bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lt: Option<Value>,
        /// Inclusive upper bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },
    /// Field is present and not null.
    Exists {
        /// Field path
        field: String,
    },
    /// All conditions match.
    And {
        /// Conditions to AND together
        conditions: Vec<Condition>,
    },
    /// At least one condition matches.
    Or {
        /// Conditions to OR together
        conditions: Vec<Condition>,
    },
    /// Negation.
    Not {
        /// Condition to negate
        condition: Box<Condition>,
    },
}

impl Default for Condition {
    fn default() -> Self {
        Self::MatchAll
    }
}
