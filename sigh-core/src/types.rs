//! Static types of Sigh expressions.
//!
//! Struct types are nominal: two struct types are equal only when they come
//! from the same declaration, which is tracked by `StructId`.

use std::fmt;

/// Index of a struct declaration in `HirProgram::structs`.
pub type StructId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    /// Type of `null` and of the elements of `[]`.
    Null,
    /// Type of an expression that names a type.
    Type,
    Array(Box<Type>),
    Struct { id: StructId, name: String },
    Fun { params: Vec<Type>, ret: Box<Type> },
}

impl Type {
    pub fn array(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    pub fn fun(params: Vec<Type>, ret: Type) -> Type {
        Type::Fun {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool)
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive() && !self.is_void()
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Component type of an array, `None` for anything else.
    pub fn component(&self) -> Option<&Type> {
        match self {
            Type::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Number of nested array levels: `Int` is 0, `Int[][]` is 2.
    pub fn depth(&self) -> usize {
        match self {
            Type::Array(component) => 1 + component.depth(),
            _ => 0,
        }
    }

    /// Innermost non-array type.
    pub fn leaf(&self) -> &Type {
        match self {
            Type::Array(component) => component.leaf(),
            other => other,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("Int"),
            Type::Float => f.write_str("Float"),
            Type::Bool => f.write_str("Bool"),
            Type::String => f.write_str("String"),
            Type::Void => f.write_str("Void"),
            Type::Null => f.write_str("Null"),
            Type::Type => f.write_str("Type"),
            Type::Array(component) => write!(f, "{component}[]"),
            Type::Struct { name, .. } => f.write_str(name),
            Type::Fun { params, ret } => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

/// Whether a value of type `from` may be stored where `to` is expected.
///
/// `Int` widens to `Float` only at the top level: array components must
/// match exactly (or be `Null`), since arrays are shared by reference.
pub fn assignable(from: &Type, to: &Type) -> bool {
    if from.is_void() || to.is_void() {
        return false;
    }
    match (from, to) {
        (Type::Int, Type::Float) => true,
        (Type::Null, to) => to.is_reference(),
        (Type::Array(a), Type::Array(b)) => component_assignable(a, b),
        (from, to) => from == to,
    }
}

fn component_assignable(from: &Type, to: &Type) -> bool {
    match (from, to) {
        (Type::Null, _) => true,
        (Type::Array(a), Type::Array(b)) => component_assignable(a, b),
        (from, to) => from == to,
    }
}

/// Whether `==` and `!=` may be applied to operands of these types.
pub fn comparable(a: &Type, b: &Type) -> bool {
    if a.is_void() || b.is_void() {
        return false;
    }
    a == b || (a.is_numeric() && b.is_numeric()) || (a.is_reference() && b.is_reference())
}

/// The type both `a` and `b` are assignable to, if one of them is.
pub fn common_supertype(a: &Type, b: &Type) -> Option<Type> {
    if a.is_void() || b.is_void() {
        return None;
    }
    if assignable(a, b) {
        Some(b.clone())
    } else if assignable(b, a) {
        Some(a.clone())
    } else {
        None
    }
}

/// Result type of `+ - * / %` on two scalar numbers.
pub fn numeric_result(a: &Type, b: &Type) -> Option<Type> {
    match (a, b) {
        (Type::Int, Type::Int) => Some(Type::Int),
        (Type::Int | Type::Float, Type::Int | Type::Float) => Some(Type::Float),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Type {
        Type::Struct {
            id: 0,
            name: "Point".into(),
        }
    }

    #[test]
    fn int_widens_to_float_only_at_top_level() {
        assert!(assignable(&Type::Int, &Type::Float));
        assert!(!assignable(&Type::Float, &Type::Int));
        assert!(!assignable(
            &Type::array(Type::Int),
            &Type::array(Type::Float)
        ));
    }

    #[test]
    fn null_is_assignable_to_references() {
        assert!(assignable(&Type::Null, &Type::String));
        assert!(assignable(&Type::Null, &point()));
        assert!(assignable(&Type::Null, &Type::array(Type::Int)));
        assert!(!assignable(&Type::Null, &Type::Int));
        assert!(assignable(&Type::array(Type::Null), &Type::array(Type::Int)));
        assert!(assignable(
            &Type::array(Type::array(Type::Null)),
            &Type::array(Type::array(Type::String))
        ));
    }

    #[test]
    fn void_is_never_assignable() {
        assert!(!assignable(&Type::Void, &Type::Void));
        assert!(!assignable(&Type::Int, &Type::Void));
    }

    #[test]
    fn struct_types_are_nominal() {
        let other = Type::Struct {
            id: 1,
            name: "Point".into(),
        };
        assert!(!assignable(&point(), &other));
        assert!(assignable(&point(), &point()));
    }

    #[test]
    fn comparable_types() {
        assert!(comparable(&Type::Int, &Type::Float));
        assert!(comparable(&Type::String, &Type::Null));
        assert!(comparable(&Type::Bool, &Type::Bool));
        assert!(!comparable(&Type::Bool, &Type::Int));
        assert!(!comparable(&Type::Void, &Type::Void));
    }

    #[test]
    fn common_supertype_prefers_the_wider_type() {
        assert_eq!(common_supertype(&Type::Int, &Type::Float), Some(Type::Float));
        assert_eq!(common_supertype(&Type::Null, &Type::String), Some(Type::String));
        assert_eq!(common_supertype(&Type::Int, &Type::String), None);
    }

    #[test]
    fn displays_types() {
        assert_eq!(Type::array(Type::array(Type::Int)).to_string(), "Int[][]");
        assert_eq!(
            Type::fun(vec![Type::Int, Type::String], Type::Void).to_string(),
            "(Int, String) -> Void"
        );
        assert_eq!(point().to_string(), "Point");
    }
}
