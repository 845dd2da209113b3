//! The typing predicate and the single coercion it allows.

use crate::types::SemanticType;
use crate::value::Value;

/// Error returned when a candidate value does not satisfy a column's type.
#[derive(Debug, thiserror::Error)]
#[error("value of kind {kind} does not satisfy column type {expected}")]
pub struct InvalidValue {
    /// The column's declared type.
    pub expected: SemanticType,
    /// Variant name of the offending value.
    pub kind: &'static str,
}

/// Decides whether `value` may be stored in a column of type `ty`.
///
/// The predicate is strict: booleans are not integers, floats are not
/// integers, strings are never numbers, and list elements must all satisfy
/// the element type. The only widening accepted is integer-where-float,
/// scalar and element-wise. `Null` satisfies every type.
pub fn check_value(value: &Value, ty: SemanticType) -> bool {
    match (value, ty) {
        (Value::Null, _) => true,
        (Value::Boolean(_), SemanticType::Boolean) => true,
        (Value::Integer(_), SemanticType::Integer | SemanticType::Float) => true,
        (Value::Float(_), SemanticType::Float) => true,
        (Value::String(_), SemanticType::String) => true,
        (Value::Date(_), SemanticType::Date) => true,
        (Value::Time(_), SemanticType::Time) => true,
        (Value::DateTime(_), SemanticType::DateTime) => true,
        (Value::ListBoolean(_), SemanticType::ListBoolean) => true,
        (Value::ListInteger(_), SemanticType::ListInteger | SemanticType::ListFloat) => true,
        (Value::ListFloat(_), SemanticType::ListFloat) => true,
        (Value::ListString(_), SemanticType::ListString) => true,
        (Value::ListDate(_), SemanticType::ListDate) => true,
        (Value::ListTime(_), SemanticType::ListTime) => true,
        (Value::ListDateTime(_), SemanticType::ListDateTime) => true,
        _ => false,
    }
}

/// Validates `value` against `ty` and applies the integer-to-float widening.
///
/// After a successful coercion the value's variant matches the column type
/// exactly (or is `Null`), which keeps stored cells homogeneous per column.
pub fn coerce(value: Value, ty: SemanticType) -> Result<Value, InvalidValue> {
    if !check_value(&value, ty) {
        return Err(InvalidValue {
            expected: ty,
            kind: value.kind(),
        });
    }
    Ok(match (value, ty) {
        (Value::Integer(i), SemanticType::Float) => Value::Float(i as f64),
        (Value::ListInteger(items), SemanticType::ListFloat) => {
            Value::ListFloat(items.into_iter().map(|i| i as f64).collect())
        }
        (value, _) => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_and_integers_do_not_mix() {
        assert!(check_value(
            &Value::from("string"),
            SemanticType::String
        ));
        assert!(!check_value(&Value::Integer(1), SemanticType::String));
        assert!(!check_value(
            &Value::from("35"),
            SemanticType::Integer
        ));
    }

    #[test]
    fn null_satisfies_every_type() {
        for ty in SemanticType::ALL {
            assert!(check_value(&Value::Null, ty));
        }
    }

    #[test]
    fn integers_widen_to_float() {
        assert!(check_value(&Value::Integer(1), SemanticType::Float));
        assert_eq!(
            coerce(Value::Integer(1), SemanticType::Float).unwrap(),
            Value::Float(1.0)
        );
        assert_eq!(
            coerce(Value::ListInteger(vec![1, 2]), SemanticType::ListFloat).unwrap(),
            Value::ListFloat(vec![1.0, 2.0])
        );
    }

    #[test]
    fn floats_are_not_integers() {
        assert!(!check_value(&Value::Float(35.8), SemanticType::Integer));
        assert!(coerce(Value::Float(35.8), SemanticType::Integer).is_err());
    }

    #[test]
    fn booleans_are_not_integers() {
        assert!(!check_value(&Value::Boolean(true), SemanticType::Integer));
        assert!(!check_value(&Value::Integer(1), SemanticType::Boolean));
    }

    #[test]
    fn scalar_is_not_a_list() {
        assert!(!check_value(&Value::Float(1.5), SemanticType::ListFloat));
        assert!(check_value(
            &Value::ListFloat(vec![1.5]),
            SemanticType::ListFloat
        ));
    }

    #[test]
    fn list_element_typing_is_strict() {
        // A mixed list cannot even be constructed; the closest runtime case
        // is a list of the wrong element type.
        assert!(!check_value(
            &Value::from(vec!["test"]),
            SemanticType::ListFloat
        ));
        assert!(!check_value(
            &Value::ListFloat(vec![1.5]),
            SemanticType::ListInteger
        ));
    }
}
