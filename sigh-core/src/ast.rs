//! Surface syntax tree produced by the parser.

use std::fmt;

use crate::span::Span;

/// A whole source file: one or more statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExprKind {
    /// A named type: `Int`, `String`, a struct name, ...
    Simple(String),
    /// `T[]`
    Array(Box<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Var(VarDecl),
    /// `var name: Base[2][3]`
    SizedArray(SizedArrayDecl),
    Fun(FunDecl),
    Struct(StructDecl),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub initializer: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedArrayDecl {
    pub name: Ident,
    /// Element type, without the sized dimensions.
    pub element: TypeExpr,
    /// Outermost dimension first.
    pub dimensions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    /// `None` means `Void`.
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub body_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FunDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Reference(String),
    /// `$Name`
    Constructor(Ident),
    Array(Vec<Expr>),
    Paren(Box<Expr>),
    Field {
        stem: Box<Expr>,
        name: Ident,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Remainder,
    DotProduct,
    Add,
    Subtract,
    Equality,
    NotEquals,
    Greater,
    Lower,
    GreaterEqual,
    LowerEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::DotProduct => "@",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Equality => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::Lower => "<",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LowerEqual => "<=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Verb used in diagnostics ("trying to add Int with Bool").
    pub fn verb(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Remainder => "take the remainder of",
            BinaryOp::DotProduct => "take the dot product of",
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Equality | BinaryOp::NotEquals => "compare",
            BinaryOp::Greater
            | BinaryOp::Lower
            | BinaryOp::GreaterEqual
            | BinaryOp::LowerEqual => "order",
            BinaryOp::And | BinaryOp::Or => "combine",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Remainder
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Greater | BinaryOp::Lower | BinaryOp::GreaterEqual | BinaryOp::LowerEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equality | BinaryOp::NotEquals)
    }

    pub fn is_logic(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Method a struct must define to support this operator.
    pub fn overload_method(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("plus"),
            BinaryOp::Subtract => Some("minus"),
            BinaryOp::Multiply => Some("mul"),
            BinaryOp::Divide => Some("div"),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Simple(name) => f.write_str(name),
            TypeExprKind::Array(component) => write!(f, "{component}[]"),
        }
    }
}

/// Compact, fully parenthesized rendering used by `--dump-ast` and tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Int(value) => write!(f, "{value}"),
            ExprKind::Float(value) => write!(f, "{value:?}"),
            ExprKind::Str(value) => write!(f, "{value:?}"),
            ExprKind::Reference(name) => f.write_str(name),
            ExprKind::Constructor(name) => write!(f, "${}", name.name),
            ExprKind::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            ExprKind::Paren(inner) => write!(f, "({inner})"),
            ExprKind::Field { stem, name } => write!(f, "{stem}.{}", name.name),
            ExprKind::Index { array, index } => write!(f, "{array}[{index}]"),
            ExprKind::Call { callee, args } => {
                write!(f, "{callee}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            ExprKind::Unary { op: UnaryOp::Not, operand } => write!(f, "!{operand}"),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ExprKind::Assign { target, value } => write!(f, "({target} = {value})"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Expr {
    /// Whether this expression may stand alone as a statement.
    pub fn is_statement_expression(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. } | ExprKind::Assign { .. })
    }
}
