//! Names predefined in the root scope.
//!
//! The type checker consults this table only after every user scope has
//! failed to resolve a name, so user declarations may shadow builtins.

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// A builtin type name used as a value or in annotations.
    Type(BuiltinType),
    True,
    False,
    Null,
    /// `print(String): String`, writes its argument and a newline.
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    Bool,
    Int,
    Float,
    String,
    Void,
    Type,
}

impl BuiltinType {
    pub fn to_type(self) -> Type {
        match self {
            BuiltinType::Bool => Type::Bool,
            BuiltinType::Int => Type::Int,
            BuiltinType::Float => Type::Float,
            BuiltinType::String => Type::String,
            BuiltinType::Void => Type::Void,
            BuiltinType::Type => Type::Type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    pub name: &'static str,
    pub kind: BuiltinKind,
}

impl BuiltinDescriptor {
    /// Type of the builtin when referenced as an expression.
    pub fn value_type(&self) -> Type {
        match self.kind {
            BuiltinKind::Type(_) => Type::Type,
            BuiltinKind::True | BuiltinKind::False => Type::Bool,
            BuiltinKind::Null => Type::Null,
            BuiltinKind::Print => Type::fun(vec![Type::String], Type::String),
        }
    }
}

pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        name: "Bool",
        kind: BuiltinKind::Type(BuiltinType::Bool),
    },
    BuiltinDescriptor {
        name: "Int",
        kind: BuiltinKind::Type(BuiltinType::Int),
    },
    BuiltinDescriptor {
        name: "Float",
        kind: BuiltinKind::Type(BuiltinType::Float),
    },
    BuiltinDescriptor {
        name: "String",
        kind: BuiltinKind::Type(BuiltinType::String),
    },
    BuiltinDescriptor {
        name: "Void",
        kind: BuiltinKind::Type(BuiltinType::Void),
    },
    BuiltinDescriptor {
        name: "Type",
        kind: BuiltinKind::Type(BuiltinType::Type),
    },
    BuiltinDescriptor {
        name: "true",
        kind: BuiltinKind::True,
    },
    BuiltinDescriptor {
        name: "false",
        kind: BuiltinKind::False,
    },
    BuiltinDescriptor {
        name: "null",
        kind: BuiltinKind::Null,
    },
    BuiltinDescriptor {
        name: "print",
        kind: BuiltinKind::Print,
    },
];

/// Look up a builtin by its source-level name.
///
/// The search is linear over `BUILTINS` because the table is small.
pub fn find_builtin(name: &str) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.iter().find(|b| b.name == name)
}
