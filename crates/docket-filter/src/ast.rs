//! Filter expression AST.

use docket_core::Value;

/// Comparison operators of the filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Contains,
}

impl CmpOp {
    /// The operator obtained by swapping the two operands.
    ///
    /// Only defined for the ordering and equality operators; `IN` and
    /// `CONTAINS` are direction-sensitive and returned unchanged.
    pub fn flipped(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            other => other,
        }
    }

    /// The SQL spelling of the operator, where one exists.
    pub(crate) fn sql(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Ne => Some("<>"),
            Self::Lt => Some("<"),
            Self::Le => Some("<="),
            Self::Gt => Some(">"),
            Self::Ge => Some(">="),
            Self::In | Self::Contains => None,
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal scalar (or an already-typed list value, as produced by the
    /// legacy-search desugarings).
    Literal(Value),
    /// Reference to a column by name. Unknown names are not an error; the
    /// comparisons they appear in simply never match.
    Column(String),
    /// A bracketed list of operands. Elements may be of mixed types.
    List(Vec<Expr>),
    Cmp {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Returns `true` when the expression contains no column reference, i.e.
    /// it evaluates to the same result for every document.
    pub fn is_const(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Column(_) => false,
            Self::List(items) => items.iter().all(Self::is_const),
            Self::Cmp { left, right, .. } => left.is_const() && right.is_const(),
            Self::Not(inner) => inner.is_const(),
            Self::And(a, b) | Self::Or(a, b) => a.is_const() && b.is_const(),
        }
    }

    pub fn cmp(op: CmpOp, left: Expr, right: Expr) -> Self {
        Self::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Expr) -> Self {
        Self::Not(Box::new(inner))
    }
}
