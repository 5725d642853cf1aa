//! Term extraction from structured query strings.
//!
//! Only simple clauses are understood: bare terms, `field:term`, quoted
//! phrases, joined by whitespace or `AND`. Any other construct makes the
//! whole string unsupported and nothing is extracted.
//!
//! ## Usage
//!
//! ```rust
//! use suggest_core::query::QueryStringParser;
//!
//! let parser = QueryStringParser::new("content");
//! let terms = parser.extract("fess AND title:suggest");
//!
//! assert_eq!(terms["content"], vec!["fess"]);
//! assert_eq!(terms["title"], vec!["suggest"]);
//! assert!(parser.extract("fess OR suggest").is_empty());
//! ```


use indexmap::IndexMap;
use pest::iterators::Pair;
use pest::Parser as PestParser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "query/grammar.pest"]
pub(crate) struct QueryGrammar;

/// Terms per field, in first-seen order.
pub type FieldTerms = IndexMap<String, Vec<String>>;

/// Extracts search terms from query strings.
#[derive(Debug, Clone)]
pub struct QueryStringParser {
    default_field: String,
}

impl QueryStringParser {
    /// Creates a parser assigning unqualified terms to `default_field`.
    pub fn new(default_field: impl Into<String>) -> Self {
        Self {
            default_field: default_field.into(),
        }
    }

    /// Field receiving unqualified terms.
    #[must_use]
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Extracts terms grouped by field. Phrases contribute one term per
    /// word. Unsupported query strings yield an empty map.
    #[must_use]
    pub fn extract(&self, query: &str) -> FieldTerms {
        let mut terms = FieldTerms::new();
        let query_pair = match QueryGrammar::parse(Rule::query, query) {
            Ok(mut pairs) => match pairs.next() {
                Some(pair) => pair,
                None => return terms,
            },
            Err(e) => {
                tracing::debug!(query, error = %e, "unsupported query string");
                return terms;
            }
        };

        for clause in query_pair.into_inner().filter(|p| p.as_rule() == Rule::clause) {
            let Some(inner) = clause.into_inner().next() else {
                continue;
            };
            match inner.as_rule() {
                Rule::fielded => {
                    let mut parts = inner.into_inner();
                    let (Some(field), Some(value)) = (parts.next(), parts.next()) else {
                        continue;
                    };
                    push_words(&mut terms, field.as_str(), &value);
                }
                _ => push_words(&mut terms, &self.default_field, &inner),
            }
        }
        terms
    }

    /// Extracts the terms of one field.
    #[must_use]
    pub fn extract_field(&self, query: &str, field: &str) -> Vec<String> {
        self.extract(query).swap_remove(field).unwrap_or_default()
    }
}

fn push_words(terms: &mut FieldTerms, field: &str, value: &Pair<'_, Rule>) {
    let text = match value.as_rule() {
        Rule::phrase => value.clone().into_inner().next().map_or("", |p| p.as_str()),
        _ => value.as_str(),
    };
    let words = text.split_whitespace().map(str::to_string);
    terms.entry(field.to_string()).or_default().extend(words);
}
