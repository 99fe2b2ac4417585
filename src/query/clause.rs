//! Filter clauses for trait-state queries
//!
//! Clauses form a recursive expression tree over state fields. They are
//! built once by the caller, never mutated, and serialized into the
//! query-language JSON when a request is dispatched.

use serde_json::{json, Map, Value};

/// A filter clause over trait-state fields
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field equals a string, number or boolean value
    Equals {
        /// State field name
        field: String,
        /// Value to compare against
        value: Value,
    },

    /// Field does not equal a value
    NotEquals {
        /// State field name
        field: String,
        /// Value to compare against
        value: Value,
    },

    /// Field lies within numeric limits. At least one limit must be set;
    /// the half-bounded constructors below fix the inclusion defaults.
    Range {
        /// State field name
        field: String,
        /// Lower bound, if any
        lower_limit: Option<f64>,
        /// Whether the lower bound itself matches
        lower_included: Option<bool>,
        /// Upper bound, if any
        upper_limit: Option<f64>,
        /// Whether the upper bound itself matches
        upper_included: Option<bool>,
    },

    /// Matches every record
    All,

    /// All child clauses must match; children keep construction order
    And(Vec<Clause>),

    /// Any child clause may match; children keep construction order
    Or(Vec<Clause>),
}

impl Clause {
    /// `field == value`
    pub fn equals<F: Into<String>, V: Into<Value>>(field: F, value: V) -> Self {
        Clause::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field != value`
    pub fn not_equals<F: Into<String>, V: Into<Value>>(field: F, value: V) -> Self {
        Clause::NotEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Matches every record
    pub fn all() -> Self {
        Clause::All
    }

    /// `field > limit`
    pub fn greater_than<F: Into<String>>(field: F, limit: f64) -> Self {
        Clause::Range {
            field: field.into(),
            lower_limit: Some(limit),
            lower_included: Some(false),
            upper_limit: None,
            upper_included: None,
        }
    }

    /// `field >= limit`
    pub fn greater_than_or_equals<F: Into<String>>(field: F, limit: f64) -> Self {
        Clause::Range {
            field: field.into(),
            lower_limit: Some(limit),
            lower_included: Some(true),
            upper_limit: None,
            upper_included: None,
        }
    }

    /// `field < limit`
    pub fn less_than<F: Into<String>>(field: F, limit: f64) -> Self {
        Clause::Range {
            field: field.into(),
            lower_limit: None,
            lower_included: None,
            upper_limit: Some(limit),
            upper_included: Some(false),
        }
    }

    /// `field <= limit`
    pub fn less_than_or_equals<F: Into<String>>(field: F, limit: f64) -> Self {
        Clause::Range {
            field: field.into(),
            lower_limit: None,
            lower_included: None,
            upper_limit: Some(limit),
            upper_included: Some(true),
        }
    }

    /// Fully bounded range with explicit inclusion flags
    pub fn range<F: Into<String>>(
        field: F,
        lower_limit: f64,
        lower_included: bool,
        upper_limit: f64,
        upper_included: bool,
    ) -> Self {
        Clause::Range {
            field: field.into(),
            lower_limit: Some(lower_limit),
            lower_included: Some(lower_included),
            upper_limit: Some(upper_limit),
            upper_included: Some(upper_included),
        }
    }

    /// Conjunction of child clauses
    pub fn and(clauses: Vec<Clause>) -> Self {
        Clause::And(clauses)
    }

    /// Disjunction of child clauses
    pub fn or(clauses: Vec<Clause>) -> Self {
        Clause::Or(clauses)
    }

    /// Serialize into the wire query language.
    ///
    /// NotEquals uses the negation wrapper `{"type":"not","clause":{eq...}}`
    /// as its canonical form. Child order of And/Or is preserved exactly.
    pub fn to_query_json(&self) -> Value {
        match self {
            Clause::Equals { field, value } => json!({
                "type": "eq",
                "field": field,
                "value": value,
            }),
            Clause::NotEquals { field, value } => json!({
                "type": "not",
                "clause": {
                    "type": "eq",
                    "field": field,
                    "value": value,
                },
            }),
            Clause::Range {
                field,
                lower_limit,
                lower_included,
                upper_limit,
                upper_included,
            } => {
                let mut obj = Map::new();
                obj.insert("type".into(), json!("range"));
                obj.insert("field".into(), json!(field));
                if let Some(limit) = upper_limit {
                    obj.insert("upperLimit".into(), json!(limit));
                }
                if let Some(included) = upper_included {
                    obj.insert("upperIncluded".into(), json!(included));
                }
                if let Some(limit) = lower_limit {
                    obj.insert("lowerLimit".into(), json!(limit));
                }
                if let Some(included) = lower_included {
                    obj.insert("lowerIncluded".into(), json!(included));
                }
                Value::Object(obj)
            }
            Clause::All => json!({"type": "all"}),
            Clause::And(clauses) => json!({
                "type": "and",
                "clauses": clauses.iter().map(Clause::to_query_json).collect::<Vec<_>>(),
            }),
            Clause::Or(clauses) => json!({
                "type": "or",
                "clauses": clauses.iter().map(Clause::to_query_json).collect::<Vec<_>>(),
            }),
        }
    }
}
