//! High-level intermediate representation (HIR).
//!
//! HIR is the typed, resolved form produced by `typecheck` and consumed by
//! the interpreter. Every expression carries its `Type` and `Span`, and
//! every name has been resolved to where its value lives at runtime.
//!
//! Runtime environments mirror static scopes one to one (root, block,
//! function parameters, struct receiver), so a name is addressed by the
//! number of scopes to climb (`hops`) and a slot within that scope.

use std::rc::Rc;

use crate::ast::BinaryOp;
use crate::span::Span;
use crate::types::{StructId, Type};

/// Index of a function (or method) in `HirProgram::functions`.
pub type FunId = usize;

#[derive(Debug, Clone)]
pub struct HirProgram {
    pub body: HirBlock,
    pub functions: Vec<Rc<HirFunction>>,
    pub structs: Vec<Rc<HirStruct>>,
}

/// A sequence of statements with its own environment.
#[derive(Debug, Clone, PartialEq)]
pub struct HirBlock {
    pub statements: Vec<HirStmt>,
    /// Number of variable slots the block's environment needs.
    pub slots: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirParam {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirFunction {
    pub id: FunId,
    pub name: String,
    pub params: Vec<HirParam>,
    pub ret: Type,
    pub body: HirBlock,
    /// Set for methods: the struct whose receiver the body may use.
    pub owner: Option<StructId>,
    pub span: Span,
}

impl HirFunction {
    pub fn ty(&self) -> Type {
        Type::fun(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirField {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirStruct {
    pub id: StructId,
    pub name: String,
    pub fields: Vec<HirField>,
    /// Method name and function id, in declaration order.
    pub methods: Vec<(String, FunId)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirStmt {
    pub kind: HirStmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HirStmtKind {
    Block(HirBlock),
    /// `var` declaration: stores the initializer in a slot of the current
    /// environment.
    Declare { slot: usize, value: HirExpr },
    /// `var a: T[n][m]`: allocates nested arrays of default values.
    SizedArray {
        slot: usize,
        element: Type,
        dimensions: Vec<usize>,
    },
    If {
        condition: HirExpr,
        then_branch: Box<HirStmt>,
        else_branch: Option<Box<HirStmt>>,
    },
    While {
        condition: HirExpr,
        body: Box<HirStmt>,
    },
    Return(Option<HirExpr>),
    Expr(HirExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirExpr {
    pub kind: HirExprKind,
    pub ty: Type,
    pub span: Span,
}

/// Properties available on every array value.
/// Operand shapes accepted by `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotShape {
    /// `T[] @ T[]`: a scalar.
    Vectors,
    /// `T[] @ T[][]` where the right operand is a single column: a scalar.
    VectorByColumn,
    /// `T[][] @ T[][]`: a matrix.
    Matrices,
}

impl DotShape {
    /// Shape for operands of the given array depths.
    pub fn from_depths(left: usize, right: usize) -> Option<DotShape> {
        match (left, right) {
            (1, 1) => Some(DotShape::Vectors),
            (1, 2) => Some(DotShape::VectorByColumn),
            (2, 2) => Some(DotShape::Matrices),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayProperty {
    Length,
    Count,
    Sum,
    Avg,
    NDim,
}

impl ArrayProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "length" => Some(ArrayProperty::Length),
            "count" => Some(ArrayProperty::Count),
            "sum" => Some(ArrayProperty::Sum),
            "avg" => Some(ArrayProperty::Avg),
            "nDim" => Some(ArrayProperty::NDim),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HirExprKind {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bool(bool),
    Null,

    /// Variable or parameter.
    Local { hops: usize, slot: usize },
    /// Bare field name inside a method body.
    ReceiverField { hops: usize, field: usize },
    /// Bare method name inside a method body.
    ReceiverMethod { hops: usize, method: FunId },
    /// Function declared `hops` scopes up; evaluates to a closure.
    Function { hops: usize, id: FunId },
    /// `$S`, with `S` declared `hops` scopes up.
    Constructor { hops: usize, id: StructId },
    /// A type used as a value.
    TypeValue(Type),
    Print,

    Array(Vec<HirExpr>),
    Field { stem: Box<HirExpr>, field: usize },
    /// `stem.m` where `m` is a method: evaluates to a bound method.
    Method { stem: Box<HirExpr>, method: FunId },
    ArrayProperty {
        stem: Box<HirExpr>,
        property: ArrayProperty,
    },
    Index {
        array: Box<HirExpr>,
        index: Box<HirExpr>,
    },
    Call {
        callee: Box<HirExpr>,
        args: Vec<HirExpr>,
    },
    Not(Box<HirExpr>),

    /// Scalar arithmetic, comparison or equality.
    Binary {
        op: BinaryOp,
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    /// Short-circuiting `&&` / `||`.
    Logic {
        op: BinaryOp,
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    /// `+` with a string operand.
    Concat {
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    /// `+ - * /` applied to each pair of elements of two arrays.
    ElementWise {
        op: BinaryOp,
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    /// `+ - * /` on two arrays of structs: `method` is called on each pair
    /// of elements.
    ElementWiseMethod {
        method: FunId,
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    /// `@` on vectors or matrices.
    DotProduct {
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },

    Assign {
        target: Box<HirPlace>,
        value: Box<HirExpr>,
    },
    IntToFloat(Box<HirExpr>),
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum HirPlace {
    Local { hops: usize, slot: usize },
    ReceiverField { hops: usize, field: usize },
    Field { stem: HirExpr, field: usize },
    Index { array: HirExpr, index: HirExpr },
}

impl HirExpr {
    pub fn new(kind: HirExprKind, ty: Type, span: Span) -> Self {
        HirExpr { kind, ty, span }
    }

    /// Wrap `self` in an `Int -> Float` conversion when `expected` calls for it.
    pub fn coerce_to(self, expected: &Type) -> HirExpr {
        if self.ty == Type::Int && *expected == Type::Float {
            let span = self.span;
            HirExpr::new(HirExprKind::IntToFloat(Box::new(self)), Type::Float, span)
        } else {
            self
        }
    }
}
