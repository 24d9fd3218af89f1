//! Runtime values of the interpreter.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Env;
use crate::hir::{HirFunction, HirStruct};
use crate::types::Type;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Struct(Rc<StructInstance>),
    Function(Rc<Closure>),
    Method(Rc<BoundMethod>),
    Print,
    Constructor(Rc<Constructor>),
    Type(Type),
}

/// A function together with the environment it was declared in.
pub struct Closure {
    pub function: Rc<HirFunction>,
    pub env: Env,
}

/// `$S`: builds instances of `decl` whose methods close over `env`.
pub struct Constructor {
    pub decl: Rc<HirStruct>,
    pub env: Env,
}

pub struct StructInstance {
    pub decl: Rc<HirStruct>,
    /// Environment the struct was declared in.
    pub env: Env,
    pub fields: RefCell<Vec<Value>>,
}

/// A method with its receiver, e.g. the value of `p.move`.
pub struct BoundMethod {
    pub receiver: Rc<StructInstance>,
    pub function: Rc<HirFunction>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({})", self.function.name)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({})", self.decl.name)
    }
}

impl fmt::Debug for StructInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructInstance({})", self.decl.name)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundMethod({}.{})", self.receiver.decl.name, self.function.name)
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn string(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    /// Short runtime type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::Str(_) => "String",
            Value::Null => "Null",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Function(_) | Value::Method(_) | Value::Print | Value::Constructor(_) => {
                "function"
            }
            Value::Type(_) => "Type",
        }
    }
}

/// Numbers by value, strings by content, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) | (Value::Print, Value::Print) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => {
                Rc::ptr_eq(&a.function, &b.function) && Rc::ptr_eq(&a.env, &b.env)
            }
            (Value::Method(a), Value::Method(b)) => {
                Rc::ptr_eq(&a.receiver, &b.receiver) && Rc::ptr_eq(&a.function, &b.function)
            }
            (Value::Constructor(a), Value::Constructor(b)) => {
                Rc::ptr_eq(&a.decl, &b.decl) && Rc::ptr_eq(&a.env, &b.env)
            }
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => f.write_str(&format_float(*value)),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Str(value) => f.write_str(value),
            Value::Null => f.write_str("null"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Struct(instance) => {
                write!(f, "{}{{", instance.decl.name)?;
                for (i, (field, value)) in instance
                    .decl
                    .fields
                    .iter()
                    .zip(instance.fields.borrow().iter())
                    .enumerate()
                {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={value}", field.name)?;
                }
                f.write_str("}")
            }
            Value::Function(closure) => f.write_str(&closure.function.name),
            Value::Method(method) => f.write_str(&method.function.name),
            Value::Print => f.write_str("print"),
            Value::Constructor(constructor) => write!(f, "${}", constructor.decl.name),
            Value::Type(ty) => write!(f, "{ty}"),
        }
    }
}

/// Floats always show a decimal part: `2.0`, `0.25`, and `1.0E20` or
/// `1.5E-5` outside `[1e-3, 1e7)`.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // `{:?}` stays positional in this range and keeps a trailing `.0`.
        return format!("{value:?}");
    }
    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}
