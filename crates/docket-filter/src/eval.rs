//! In-memory evaluation of filter expressions against decoded documents.
//!
//! This is the reference semantics: comparisons involving null are false,
//! comparisons between disagreeing types are false (never an error), list
//! ordering is lexicographic element by element, and an unknown column makes
//! every comparison it appears in false.

use std::cmp::Ordering;

use docket_core::{Document, Value};

use crate::ast::{CmpOp, Expr};

/// Returns `true` when the document satisfies the filter expression.
pub fn matches(expr: &Expr, doc: &Document) -> bool {
    match expr {
        Expr::And(a, b) => matches(a, doc) && matches(b, doc),
        Expr::Or(a, b) => matches(a, doc) || matches(b, doc),
        Expr::Not(inner) => !matches(inner, doc),
        Expr::Cmp { op, left, right } => match (operand(left, doc), operand(right, doc)) {
            (Some(l), Some(r)) => eval_cmp(*op, &l, &r),
            _ => false,
        },
        // A bare operand is truthy only when it evaluates to boolean true.
        other => matches!(
            operand(other, doc),
            Some(Operand::Single(Value::Boolean(true)))
        ),
    }
}

/// An evaluated operand: a single value, or a bracketed list of operands
/// (which may be of mixed types).
enum Operand {
    Single(Value),
    Many(Vec<Operand>),
}

fn operand(expr: &Expr, doc: &Document) -> Option<Operand> {
    match expr {
        Expr::Literal(v) => Some(Operand::Single(v.clone())),
        Expr::Column(name) => doc.get(name).cloned().map(Operand::Single),
        Expr::List(items) => items
            .iter()
            .map(|item| operand(item, doc))
            .collect::<Option<Vec<_>>>()
            .map(Operand::Many),
        // Parenthesized boolean expressions may appear in operand position.
        other => Some(Operand::Single(Value::Boolean(matches(other, doc)))),
    }
}

fn eval_cmp(op: CmpOp, left: &Operand, right: &Operand) -> bool {
    match op {
        CmpOp::In => eval_in(left, right),
        CmpOp::Contains => eval_contains(left, right),
        _ => eval_order(op, left, right),
    }
}

fn eval_order(op: CmpOp, left: &Operand, right: &Operand) -> bool {
    let ordering = match (elements(left), elements(right)) {
        (Some(a), Some(b)) => lexicographic_cmp(&a, &b),
        (None, None) => match (left, right) {
            (Operand::Single(a), Operand::Single(b)) => compare_values(a, b),
            _ => None,
        },
        // A list never compares against a scalar.
        _ => None,
    };
    ordering.is_some_and(|o| op_holds(op, o))
}

fn eval_in(needle: &Operand, haystack: &Operand) -> bool {
    let Some(members) = elements(haystack) else {
        return false;
    };
    let Operand::Single(needle) = needle else {
        return false;
    };
    if needle.is_null() {
        return false;
    }
    members
        .iter()
        .any(|m| compare_values(needle, m) == Some(Ordering::Equal))
}

fn eval_contains(container: &Operand, item: &Operand) -> bool {
    let Operand::Single(item) = item else {
        return false;
    };
    if let (Operand::Single(Value::String(s)), Value::String(sub)) = (container, item) {
        return s.contains(sub.as_str());
    }
    match elements(container) {
        Some(elems) => {
            !item.is_null()
                && elems
                    .iter()
                    .any(|e| compare_values(e, item) == Some(Ordering::Equal))
        }
        None => false,
    }
}

fn op_holds(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::In | CmpOp::Contains => false,
    }
}

/// Views an operand as a sequence of values, when it is list-like.
fn elements(operand: &Operand) -> Option<Vec<Value>> {
    match operand {
        Operand::Single(v) => list_elements(v),
        Operand::Many(items) => items
            .iter()
            .map(|item| match item {
                Operand::Single(v) => Some(v.clone()),
                Operand::Many(_) => None,
            })
            .collect(),
    }
}

/// Explodes a typed list value into scalar values; `None` for scalars.
pub fn list_elements(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::ListBoolean(items) => Some(items.iter().copied().map(Value::Boolean).collect()),
        Value::ListInteger(items) => Some(items.iter().copied().map(Value::Integer).collect()),
        Value::ListFloat(items) => Some(items.iter().copied().map(Value::Float).collect()),
        Value::ListString(items) => Some(items.iter().cloned().map(Value::String).collect()),
        Value::ListDate(items) => Some(items.iter().copied().map(Value::Date).collect()),
        Value::ListTime(items) => Some(items.iter().copied().map(Value::Time).collect()),
        Value::ListDateTime(items) => Some(items.iter().copied().map(Value::DateTime).collect()),
        _ => None,
    }
}

/// Type-aware three-way comparison.
///
/// `None` means the two values do not compare: one of them is null, or their
/// types disagree. Integers and floats compare numerically; everything else
/// requires matching types.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        _ => match (list_elements(a), list_elements(b)) {
            (Some(x), Some(y)) => lexicographic_cmp(&x, &y),
            _ => None,
        },
    }
}

fn lexicographic_cmp(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b) {
        match compare_values(x, y)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }
    Some(a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn doc() -> Document {
        let mut doc = Document::new("/bcd.dcm");
        doc.insert("format", Value::from("DICOM"));
        doc.insert("strings", Value::from(vec!["b", "c", "d"]));
        doc.insert("BandWidth", Value::Integer(50_000));
        doc.insert("empty", Value::Null);
        doc
    }

    fn eval(filter: &str) -> bool {
        matches(&parse(filter).unwrap(), &doc())
    }

    #[test]
    fn scalar_comparisons() {
        assert!(eval(r#"format == "DICOM""#));
        assert!(!eval(r#"format == "NIFTI""#));
        assert!(eval(r#"format != "NIFTI""#));
        assert!(eval("BandWidth < 50001"));
        assert!(eval("BandWidth <= 50000"));
        assert!(!eval("BandWidth > 50000"));
    }

    #[test]
    fn type_disagreement_is_false_not_an_error() {
        assert!(!eval(r#"BandWidth == "50000""#));
        assert!(!eval(r#"BandWidth != "50000""#));
        assert!(!eval(r#"format < 3"#));
    }

    #[test]
    fn null_collapses_comparisons_to_false() {
        assert!(!eval(r#"empty == "x""#));
        assert!(!eval(r#"empty != "x""#));
        assert!(!eval("empty == null"));
        // NOT of a null comparison is true.
        assert!(eval(r#"NOT empty == "x""#));
    }

    #[test]
    fn unknown_columns_never_match() {
        assert!(!eval(r#"missing == "x""#));
        assert!(!eval(r#""x" IN missing"#));
    }

    #[test]
    fn membership() {
        assert!(eval(r#""b" IN strings"#));
        assert!(!eval(r#""z" IN strings"#));
        assert!(eval(r#"format IN ["DICOM", "NIFTI"]"#));
        assert!(!eval("format IN [true, false, null]"));
        assert!(!eval("empty IN [null]"));
    }

    #[test]
    fn containment() {
        assert!(eval(r#"format CONTAINS "ICO""#));
        assert!(!eval(r#"format CONTAINS "ico""#));
        assert!(eval(r#"strings CONTAINS "c""#));
        assert!(!eval(r#"strings CONTAINS "z""#));
    }

    #[test]
    fn list_ordering_is_lexicographic() {
        assert!(eval(r#"strings == ["b", "c", "d"]"#));
        assert!(eval(r#"strings > ["b", "c", "a"]"#));
        assert!(eval(r#"strings > ["b", "c"]"#));
        assert!(eval(r#"strings < ["b", "c", "d", "e"]"#));
        assert!(!eval(r#"strings > ["b", "c", "d"]"#));
        // Numeric element comparison, not textual.
        let mut d = Document::new("x");
        d.insert("dims", Value::from(vec![9_i64]));
        assert!(matches(&parse("dims < [10]").unwrap(), &d));
    }

    #[test]
    fn connectives() {
        assert!(eval(r#"format == "DICOM" AND BandWidth == 50000"#));
        assert!(eval(r#"format == "NIFTI" OR BandWidth == 50000"#));
        assert!(!eval(r#"NOT format == "DICOM""#));
    }
}
