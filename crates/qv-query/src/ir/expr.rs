//! Expression tree for the query IR

use serde::{Deserialize, Serialize};

/// Positional handle of a relation instance within a query.
///
/// Index 0 is always the root (`FROM`) source; joins are numbered from 1 in
/// declaration order and keep their number for the lifetime of the query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct BindingIndex(pub usize);

impl BindingIndex {
    /// The root binding
    pub const ROOT: BindingIndex = BindingIndex(0);

    /// Whether this is the root binding
    pub fn is_root(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn next(self) -> BindingIndex {
        BindingIndex(self.0 + 1)
    }
}

impl std::fmt::Display for BindingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "&{}", self.0)
    }
}

/// A literal value in the IR.
///
/// The engine never interprets literals; they are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    /// Null literal
    Null,
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// Positional query parameter (`$1`, `?`)
    Param(usize),
}

/// Operator of an [`Expr::Apply`] node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Equality (=)
    Eq,
    /// Inequality (<>)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Logical NOT
    Not,
    /// IS NULL
    IsNull,
    /// IN (list)
    In,
    /// LIKE
    Like,
    /// Addition (+)
    Plus,
    /// Subtraction (-)
    Minus,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
    /// Named function or aggregate call (`count`, `coalesce`, ...)
    Call(String),
}

impl Op {
    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Op::Eq | Op::NotEq | Op::Lt | Op::LtEq | Op::Gt | Op::GtEq
        )
    }

    /// Check if this is a logical connective
    pub fn is_logical(&self) -> bool {
        matches!(self, Op::And | Op::Or | Op::Not)
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Eq => write!(f, "=="),
            Op::NotEq => write!(f, "!="),
            Op::Lt => write!(f, "<"),
            Op::LtEq => write!(f, "<="),
            Op::Gt => write!(f, ">"),
            Op::GtEq => write!(f, ">="),
            Op::And => write!(f, "and"),
            Op::Or => write!(f, "or"),
            Op::Not => write!(f, "not"),
            Op::IsNull => write!(f, "is_nil"),
            Op::In => write!(f, "in"),
            Op::Like => write!(f, "like"),
            Op::Plus => write!(f, "+"),
            Op::Minus => write!(f, "-"),
            Op::Multiply => write!(f, "*"),
            Op::Divide => write!(f, "/"),
            Op::Call(name) => write!(f, "{name}"),
        }
    }
}

/// Expression tree shared by every clause and every join condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a binding, optionally to one of its fields.
    ///
    /// `field: None` selects the whole row (`select: p`).
    Reference {
        /// Referenced binding
        binding: BindingIndex,
        /// Field name, if any
        field: Option<String>,
    },

    /// Literal value
    Literal(LiteralValue),

    /// Inner expression wrapped with a type tag (`type(^id, :integer)`)
    Tagged {
        /// Wrapped expression
        expr: Box<Expr>,
        /// Type tag
        tag: String,
    },

    /// Operator application
    Apply {
        /// Operator
        op: Op,
        /// Operands, in order
        args: Vec<Expr>,
    },

    /// Ordered list of expressions (multi-term order/group/distinct lists)
    Seq(Vec<Expr>),

    /// Node the host builder could not classify.
    ///
    /// Carried through untouched; analyses treat it as referencing nothing
    /// and report it.
    Unsupported {
        /// Description of what the node was
        description: String,
    },
}

impl Expr {
    /// Reference to `field` of `binding`
    pub fn field(binding: BindingIndex, field: impl Into<String>) -> Self {
        Expr::Reference {
            binding,
            field: Some(field.into()),
        }
    }

    /// Reference to the whole row of `binding`
    pub fn binding(binding: BindingIndex) -> Self {
        Expr::Reference {
            binding,
            field: None,
        }
    }

    /// Literal expression
    pub fn lit(value: LiteralValue) -> Self {
        Expr::Literal(value)
    }

    /// Operator application
    pub fn apply(op: Op, args: Vec<Expr>) -> Self {
        Expr::Apply { op, args }
    }

    /// `left == right`
    pub fn equals(left: Expr, right: Expr) -> Self {
        Expr::apply(Op::Eq, vec![left, right])
    }

    /// `left and right`
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::apply(Op::And, vec![left, right])
    }

    /// Wrap `self` with a type tag
    pub fn tagged(self, tag: impl Into<String>) -> Self {
        Expr::Tagged {
            expr: Box::new(self),
            tag: tag.into(),
        }
    }

    /// Constant `true`, used as the condition of cross joins
    pub fn always() -> Self {
        Expr::Literal(LiteralValue::Boolean(true))
    }
}
