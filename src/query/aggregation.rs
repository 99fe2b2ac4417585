//! Aggregation descriptors for grouped trait-state queries

use crate::error::{Result, ThingIfError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Aggregation function applied to each time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationType {
    Count,
    Sum,
    Max,
    Min,
    Mean,
}

impl AggregationType {
    /// Server-internal result key the bucket value is published under
    pub fn result_key(&self) -> &'static str {
        match self {
            AggregationType::Count => "count",
            AggregationType::Sum => "sum",
            AggregationType::Max => "max",
            AggregationType::Min => "min",
            AggregationType::Mean => "mean",
        }
    }

    /// Whether this function computes arithmetic over field values
    pub fn is_arithmetic(&self) -> bool {
        !matches!(self, AggregationType::Count)
    }
}

/// Declared type of the aggregated state field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Integer,
    Decimal,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// Whether the field type supports arithmetic aggregation
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Decimal)
    }
}

/// A single aggregation operation: function x field x declared field type.
///
/// SUM, MAX, MIN and MEAN require a numeric field type; COUNT accepts any.
/// The constraint is checked before dispatch, never sent over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Aggregation function
    pub aggregation_type: AggregationType,
    /// State field the function runs over
    pub field: String,
    /// Declared type of the field
    pub field_type: FieldType,
}

impl Aggregation {
    /// Create an aggregation descriptor
    pub fn new<S: Into<String>>(
        aggregation_type: AggregationType,
        field: S,
        field_type: FieldType,
    ) -> Self {
        Self {
            aggregation_type,
            field: field.into(),
            field_type,
        }
    }

    /// COUNT over any field
    pub fn count<S: Into<String>>(field: S, field_type: FieldType) -> Self {
        Self::new(AggregationType::Count, field, field_type)
    }

    /// SUM over a numeric field
    pub fn sum<S: Into<String>>(field: S, field_type: FieldType) -> Self {
        Self::new(AggregationType::Sum, field, field_type)
    }

    /// MAX over a numeric field
    pub fn max<S: Into<String>>(field: S, field_type: FieldType) -> Self {
        Self::new(AggregationType::Max, field, field_type)
    }

    /// MIN over a numeric field
    pub fn min<S: Into<String>>(field: S, field_type: FieldType) -> Self {
        Self::new(AggregationType::Min, field, field_type)
    }

    /// MEAN over a numeric field
    pub fn mean<S: Into<String>>(field: S, field_type: FieldType) -> Self {
        Self::new(AggregationType::Mean, field, field_type)
    }

    /// Validate the descriptor. The first failing rule wins.
    pub fn validate(&self) -> Result<()> {
        if self.field.is_empty() {
            return Err(ThingIfError::argument("aggregation field is empty"));
        }
        if self.aggregation_type.is_arithmetic() && !self.field_type.is_numeric() {
            return Err(ThingIfError::argument(format!(
                "aggregation type {} requires field type INTEGER or DECIMAL",
                self.aggregation_type.result_key().to_uppercase()
            )));
        }
        Ok(())
    }

    /// Serialize into the wire aggregation object
    pub fn to_query_json(&self) -> Value {
        json!({
            "type": self.aggregation_type,
            "putAggregationInto": self.aggregation_type.result_key(),
            "field": self.field,
            "fieldType": self.field_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_requires_numeric_field() {
        assert!(Aggregation::max("f", FieldType::Boolean).validate().is_err());
        assert!(Aggregation::sum("f", FieldType::Object).validate().is_err());
        assert!(Aggregation::mean("f", FieldType::Array).validate().is_err());
        assert!(Aggregation::min("f", FieldType::Integer).validate().is_ok());
        assert!(Aggregation::mean("f", FieldType::Decimal).validate().is_ok());
    }

    #[test]
    fn test_count_accepts_any_field_type() {
        assert!(Aggregation::count("f", FieldType::Boolean).validate().is_ok());
        assert!(Aggregation::count("f", FieldType::Object).validate().is_ok());
        assert!(Aggregation::count("f", FieldType::Array).validate().is_ok());
    }

    #[test]
    fn test_empty_field_wins_over_type_constraint() {
        let err = Aggregation::max("", FieldType::Boolean).validate().unwrap_err();
        assert!(format!("{err}").contains("field is empty"));
    }

    #[test]
    fn test_wire_shape() {
        let agg = Aggregation::max("temperature", FieldType::Integer);
        assert_eq!(
            agg.to_query_json(),
            json!({
                "type": "MAX",
                "putAggregationInto": "max",
                "field": "temperature",
                "fieldType": "INTEGER",
            })
        );
    }

    #[test]
    fn test_result_keys_are_lower_cased() {
        assert_eq!(AggregationType::Count.result_key(), "count");
        assert_eq!(AggregationType::Mean.result_key(), "mean");
        assert_eq!(AggregationType::Sum.result_key(), "sum");
    }
}
