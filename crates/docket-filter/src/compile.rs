//! Lowering of filter ASTs to SQL `WHERE` fragments.
//!
//! The lowering is total only over a subset of the language. [`lower`]
//! returns `None` when any node is outside that subset (list ordering,
//! element membership in list columns, list containment); the caller then
//! falls back to scanning and evaluating with [`crate::eval::matches`].
//! Every comparison is wrapped in `COALESCE(.., 0)` so SQL's three-valued
//! logic collapses to the language's null-is-false rule, keeping the two
//! evaluation paths in agreement.

use std::collections::HashMap;

use docket_core::{Document, SemanticType, StoredValue, Value, encode};

use crate::ast::{CmpOp, Expr};
use crate::eval;

/// A fully lowered filter: a `WHERE` fragment plus its bound parameters,
/// numbered `?1..?N` in order.
#[derive(Debug)]
pub struct SqlFilter {
    pub where_clause: String,
    pub params: Vec<StoredValue>,
}

/// Quotes an identifier for SQL (column names may contain spaces or quotes).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Attempts to lower a filter expression to SQL against the given schema.
///
/// Returns `None` when the expression is not fully expressible in SQL.
pub fn lower(expr: &Expr, schema: &HashMap<String, SemanticType>) -> Option<SqlFilter> {
    let mut lowerer = Lowerer {
        schema,
        params: Vec::new(),
    };
    let where_clause = lowerer.expr(expr)?;
    Some(SqlFilter {
        where_clause,
        params: lowerer.params,
    })
}

struct Lowerer<'a> {
    schema: &'a HashMap<String, SemanticType>,
    params: Vec<StoredValue>,
}

impl Lowerer<'_> {
    /// Binds a parameter and returns its 1-based index.
    fn push(&mut self, param: StoredValue) -> usize {
        self.params.push(param);
        self.params.len()
    }

    fn expr(&mut self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::And(a, b) => {
                let (a, b) = (self.expr(a)?, self.expr(b)?);
                Some(format!("({a} AND {b})"))
            }
            Expr::Or(a, b) => {
                let (a, b) = (self.expr(a)?, self.expr(b)?);
                Some(format!("({a} OR {b})"))
            }
            Expr::Not(inner) => {
                let inner = self.expr(inner)?;
                Some(format!("(NOT {inner})"))
            }
            Expr::Cmp { op, left, right } => self.cmp(*op, left, right),
            Expr::Literal(Value::Boolean(true)) => Some("1".to_owned()),
            Expr::Literal(_) | Expr::List(_) => Some("0".to_owned()),
            Expr::Column(name) => match self.schema.get(name) {
                // A bare column is truthy only for boolean true.
                Some(SemanticType::Boolean) => {
                    Some(format!("COALESCE({} <> 0, 0)", quote_ident(name)))
                }
                _ => Some("0".to_owned()),
            },
        }
    }

    fn cmp(&mut self, op: CmpOp, left: &Expr, right: &Expr) -> Option<String> {
        if left.is_const() && right.is_const() {
            return Some(self.fold_const(op, left, right));
        }
        match (left, right) {
            (Expr::Column(name), rhs) => self.column_cmp(op, name, rhs),
            (lhs, Expr::Column(name)) if matches!(
                op,
                CmpOp::Eq | CmpOp::Ne | CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge
            ) =>
            {
                self.column_cmp(op.flipped(), name, lhs)
            }
            _ => None,
        }
    }

    /// Evaluates a comparison with no column references to a constant.
    fn fold_const(&self, op: CmpOp, left: &Expr, right: &Expr) -> String {
        let expr = Expr::cmp(op, left.clone(), right.clone());
        if eval::matches(&expr, &Document::new("")) {
            "1".to_owned()
        } else {
            "0".to_owned()
        }
    }

    /// Lowers `column <op> rhs`.
    fn column_cmp(&mut self, op: CmpOp, name: &str, rhs: &Expr) -> Option<String> {
        let Some(&ty) = self.schema.get(name) else {
            // Unknown columns never match.
            return Some("0".to_owned());
        };
        let col = quote_ident(name);

        match op {
            CmpOp::Eq | CmpOp::Ne | CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
                if ty.is_list() {
                    // Only whole-list equality pushes down; ordering needs
                    // element-wise comparison.
                    if !matches!(op, CmpOp::Eq | CmpOp::Ne) {
                        return None;
                    }
                    return match const_list_value(rhs, ty) {
                        Some(value) => {
                            let n = self.push(encode(&value));
                            let sql_op = op.sql()?;
                            Some(format!("COALESCE({col} {sql_op} ?{n}, 0)"))
                        }
                        // A constant of the wrong shape never matches; a
                        // non-constant needs in-memory evaluation.
                        None if rhs.is_const() => Some("0".to_owned()),
                        None => None,
                    };
                }
                match rhs {
                    Expr::Literal(lit) => match scalar_param(lit, ty) {
                        Some(param) => {
                            let n = self.push(param);
                            let sql_op = op.sql()?;
                            Some(format!("COALESCE({col} {sql_op} ?{n}, 0)"))
                        }
                        // Null literal or disagreeing type: never matches.
                        None => Some("0".to_owned()),
                    },
                    Expr::Column(other) => self.column_column(op, name, other),
                    _ => None,
                }
            }
            CmpOp::Contains => match (ty, rhs) {
                (SemanticType::String, Expr::Literal(Value::String(needle))) => {
                    let n = self.push(StoredValue::Text(needle.clone()));
                    // instr is case-sensitive, unlike LIKE.
                    Some(format!("COALESCE(instr({col}, ?{n}) > 0, 0)"))
                }
                _ if ty.is_list() => None,
                (_, rhs) if rhs.is_const() => Some("0".to_owned()),
                _ => None,
            },
            CmpOp::In => {
                if ty.is_list() {
                    return None;
                }
                let Expr::List(items) = rhs else {
                    return None;
                };
                let mut placeholders = Vec::new();
                for item in items {
                    let Expr::Literal(lit) = item else {
                        return None;
                    };
                    // Elements of a disagreeing type (and nulls) can never
                    // match; they simply drop out of the IN set.
                    if let Some(param) = scalar_param(lit, ty) {
                        let n = self.push(param);
                        placeholders.push(format!("?{n}"));
                    }
                }
                if placeholders.is_empty() {
                    return Some("0".to_owned());
                }
                Some(format!("COALESCE({col} IN ({}), 0)", placeholders.join(", ")))
            }
        }
    }

    /// Lowers `column <op> column`.
    fn column_column(&mut self, op: CmpOp, left: &str, right: &str) -> Option<String> {
        let Some(&lt) = self.schema.get(left) else {
            return Some("0".to_owned());
        };
        let Some(&rt) = self.schema.get(right) else {
            return Some("0".to_owned());
        };
        if lt.is_list() || rt.is_list() {
            // Same-type list equality would push down, but mixed numeric
            // lists would not; keep all list column pairs in memory.
            return None;
        }
        if !types_comparable(lt, rt) {
            return Some("0".to_owned());
        }
        let sql_op = op.sql()?;
        Some(format!(
            "COALESCE({} {sql_op} {}, 0)",
            quote_ident(left),
            quote_ident(right)
        ))
    }
}

/// Whether a scalar literal can be compared against a column of type `ty`,
/// and if so, its bound-parameter encoding.
fn scalar_param(lit: &Value, ty: SemanticType) -> Option<StoredValue> {
    if !types_comparable(literal_type(lit)?, ty) {
        return None;
    }
    Some(encode(lit))
}

fn literal_type(lit: &Value) -> Option<SemanticType> {
    match lit {
        Value::Boolean(_) => Some(SemanticType::Boolean),
        Value::Integer(_) => Some(SemanticType::Integer),
        Value::Float(_) => Some(SemanticType::Float),
        Value::String(_) => Some(SemanticType::String),
        Value::Date(_) => Some(SemanticType::Date),
        Value::Time(_) => Some(SemanticType::Time),
        Value::DateTime(_) => Some(SemanticType::DateTime),
        _ => None,
    }
}

fn types_comparable(a: SemanticType, b: SemanticType) -> bool {
    let numeric =
        |t| matches!(t, SemanticType::Integer | SemanticType::Float);
    a == b || (numeric(a) && numeric(b))
}

/// Materializes a constant expression as a typed list value for `ty`.
fn const_list_value(expr: &Expr, ty: SemanticType) -> Option<Value> {
    match expr {
        Expr::Literal(value) => docket_core::coerce(value.clone(), ty).ok().filter(|v| !v.is_null()),
        Expr::List(items) => {
            let scalars: Vec<&Value> = items
                .iter()
                .map(|item| match item {
                    Expr::Literal(v) => Some(v),
                    _ => None,
                })
                .collect::<Option<_>>()?;
            build_list(&scalars, ty)
        }
        _ => None,
    }
}

fn build_list(items: &[&Value], ty: SemanticType) -> Option<Value> {
    match ty {
        SemanticType::ListBoolean => items
            .iter()
            .map(|v| match v {
                Value::Boolean(b) => Some(*b),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListBoolean),
        SemanticType::ListInteger => items
            .iter()
            .map(|v| match v {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListInteger),
        SemanticType::ListFloat => items
            .iter()
            .map(|v| match v {
                Value::Float(f) => Some(*f),
                Value::Integer(i) => Some(*i as f64),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListFloat),
        SemanticType::ListString => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListString),
        SemanticType::ListDate => items
            .iter()
            .map(|v| match v {
                Value::Date(d) => Some(*d),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListDate),
        SemanticType::ListTime => items
            .iter()
            .map(|v| match v {
                Value::Time(t) => Some(*t),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListTime),
        SemanticType::ListDateTime => items
            .iter()
            .map(|v| match v {
                Value::DateTime(dt) => Some(*dt),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::ListDateTime),
        _ => None,
    }
}
