//! Operators on runtime values: scalar arithmetic and comparison, plus the
//! array operations (element-wise arithmetic, dot products, aggregates).

use crate::ast::BinaryOp;
use crate::error::RuntimeError;
use crate::hir::{ArrayProperty, DotShape};
use crate::types::Type;
use crate::value::Value;

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperands(format!(
        "{} {} {}",
        left.type_name(),
        op.symbol(),
        right.type_name()
    ))
}

fn null_or(value: &Value, context: &'static str, other: RuntimeError) -> RuntimeError {
    if matches!(value, Value::Null) {
        RuntimeError::NullPointer(context)
    } else {
        other
    }
}

/// `+ - * / %` on two numbers. Integers wrap; mixed operands become floats.
///
/// With `strict_float_division`, dividing a float by zero is an error
/// instead of producing an infinity.
pub fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    strict_float_division: bool,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Add => Ok(Value::Int(a.wrapping_add(b))),
                BinaryOp::Subtract => Ok(Value::Int(a.wrapping_sub(b))),
                BinaryOp::Multiply => Ok(Value::Int(a.wrapping_mul(b))),
                BinaryOp::Divide if b == 0 => Err(RuntimeError::DivisionByZero),
                BinaryOp::Divide => Ok(Value::Int(a.wrapping_div(b))),
                BinaryOp::Remainder if b == 0 => Err(RuntimeError::DivisionByZero),
                BinaryOp::Remainder => Ok(Value::Int(a.wrapping_rem(b))),
                _ => Err(unsupported(op, left, right)),
            }
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (as_float(left), as_float(right));
            match op {
                BinaryOp::Add => Ok(Value::Float(a + b)),
                BinaryOp::Subtract => Ok(Value::Float(a - b)),
                BinaryOp::Multiply => Ok(Value::Float(a * b)),
                BinaryOp::Divide if strict_float_division && b == 0.0 => {
                    Err(RuntimeError::DivisionByZero)
                }
                BinaryOp::Divide => Ok(Value::Float(a / b)),
                BinaryOp::Remainder => Ok(Value::Float(a % b)),
                _ => Err(unsupported(op, left, right)),
            }
        }
        (Value::Str(_), _) | (_, Value::Str(_)) if op == BinaryOp::Add => {
            Ok(Value::string(&format!("{left}{right}")))
        }
        _ => Err(null_or(
            left,
            "arithmetic on null",
            null_or(right, "arithmetic on null", unsupported(op, left, right)),
        )),
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

/// `< <= > >=` on two numbers.
pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            as_float(left).partial_cmp(&as_float(right))
        }
        _ => {
            return Err(null_or(
                left,
                "comparing null",
                null_or(right, "comparing null", unsupported(op, left, right)),
            ));
        }
    };
    // NaN compares false with everything.
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        BinaryOp::Lower => ordering.is_lt(),
        BinaryOp::LowerEqual => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEqual => ordering.is_ge(),
        _ => return Err(unsupported(op, left, right)),
    })
}

// ----------------------------------------------------------------------
// Arrays
// ----------------------------------------------------------------------

fn items(value: &Value, context: &'static str) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.borrow().clone()),
        Value::Null => Err(RuntimeError::NullPointer(context)),
        other => Err(RuntimeError::UnsupportedOperands(format!(
            "expected an array, found {}",
            other.type_name()
        ))),
    }
}

/// Apply `op` to each pair of elements, recursing through nested arrays.
/// Both operands must have the same length at every level.
pub fn element_wise(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Array(_), Value::Array(_)) => {
            let left = items(left, "element-wise operation on null")?;
            let right = items(right, "element-wise operation on null")?;
            if left.len() != right.len() {
                return Err(RuntimeError::ShapeMismatch(format!(
                    "element-wise {} on arrays of length {} and {}",
                    op.symbol(),
                    left.len(),
                    right.len()
                )));
            }
            let result = left
                .iter()
                .zip(&right)
                .map(|(a, b)| element_wise(op, a, b))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::array(result))
        }
        (Value::Null, _) | (_, Value::Null) => {
            Err(RuntimeError::NullPointer("element-wise operation on null"))
        }
        (Value::Array(_), _) | (_, Value::Array(_)) => Err(RuntimeError::ShapeMismatch(
            "element-wise operation on arrays of different depths".to_string(),
        )),
        _ => arithmetic(op, left, right, true),
    }
}

fn zero(float: bool) -> Value {
    if float { Value::Float(0.0) } else { Value::Int(0) }
}

fn multiply_add(acc: Value, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    let product = arithmetic(BinaryOp::Multiply, a, b, false)?;
    arithmetic(BinaryOp::Add, &acc, &product, false)
}

fn as_float_value(value: Value, float: bool) -> Value {
    match value {
        Value::Int(i) if float => Value::Float(i as f64),
        other => other,
    }
}

/// `@`: the scalar product of two vectors, or the product of two matrices.
///
/// `float` says whether the result's elements are floats, so that empty
/// products still get the right zero.
pub fn dot_product(
    left: &Value,
    right: &Value,
    shape: DotShape,
    float: bool,
) -> Result<Value, RuntimeError> {
    match shape {
        DotShape::Vectors => {
            let left = items(left, "dot product of a null vector")?;
            let right = items(right, "dot product of a null vector")?;
            if left.len() != right.len() {
                return Err(RuntimeError::ShapeMismatch(format!(
                    "dot product of vectors of length {} and {}",
                    left.len(),
                    right.len()
                )));
            }
            let mut acc = zero(float);
            for (a, b) in left.iter().zip(&right) {
                acc = multiply_add(acc, a, b)?;
            }
            return Ok(as_float_value(acc, float));
        }
        DotShape::VectorByColumn => {
            let left = items(left, "dot product of a null vector")?;
            let right = rows(right)?;
            let width = right.first().map_or(1, Vec::len);
            if left.len() != right.len() || width != 1 {
                return Err(RuntimeError::ShapeMismatch(format!(
                    "dot product of a vector of length {} and a {}x{} matrix",
                    left.len(),
                    right.len(),
                    width
                )));
            }
            let mut acc = zero(float);
            for (a, row) in left.iter().zip(&right) {
                acc = multiply_add(acc, a, &row[0])?;
            }
            return Ok(as_float_value(acc, float));
        }
        DotShape::Matrices => {}
    }

    let left = rows(left)?;
    let right = rows(right)?;
    let inner = left.first().map_or(0, Vec::len);
    if inner != right.len() {
        return Err(RuntimeError::ShapeMismatch(format!(
            "matrix product of {}x{} and {}x{} matrices",
            left.len(),
            inner,
            right.len(),
            right.first().map_or(0, Vec::len)
        )));
    }
    let columns = right.first().map_or(0, Vec::len);

    let mut result = Vec::with_capacity(left.len());
    for row in &left {
        let mut out = Vec::with_capacity(columns);
        for column in 0..columns {
            let mut acc = zero(float);
            for (k, a) in row.iter().enumerate() {
                acc = multiply_add(acc, a, &right[k][column])?;
            }
            out.push(as_float_value(acc, float));
        }
        result.push(Value::array(out));
    }
    Ok(Value::array(result))
}

/// Rows of a rectangular matrix.
fn rows(matrix: &Value) -> Result<Vec<Vec<Value>>, RuntimeError> {
    let rows = items(matrix, "matrix product of a null matrix")?
        .iter()
        .map(|row| items(row, "matrix product with a null row"))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(first) = rows.first()
        && rows.iter().any(|row| row.len() != first.len())
    {
        return Err(RuntimeError::ShapeMismatch(
            "matrix rows have different lengths".to_string(),
        ));
    }
    Ok(rows)
}

/// Evaluate `array.property`. `ty` is the static type of the array.
pub fn property(array: &Value, property: ArrayProperty, ty: &Type) -> Result<Value, RuntimeError> {
    let items = items(array, "accessing a property of a null array")?;
    let float = *ty.leaf() == Type::Float;
    match property {
        ArrayProperty::Length => Ok(Value::Int(items.len() as i64)),
        ArrayProperty::Count => Ok(Value::Int(count(&items, ty.depth())? as i64)),
        ArrayProperty::NDim => Ok(Value::Int(dimensions(&items) as i64)),
        ArrayProperty::Sum => sum(&items, float),
        ArrayProperty::Avg => {
            let total = sum(&items, float)?;
            let count = count(&items, ty.depth())? as i64;
            if count == 0 {
                return Ok(zero(float));
            }
            arithmetic(BinaryOp::Divide, &total, &Value::Int(count), false)
        }
    }
}

/// Number of leaves, through any nesting. `depth` is the array depth of
/// `items`; a null where a row is expected is an error.
fn count(items: &[Value], depth: usize) -> Result<usize, RuntimeError> {
    let mut total = 0;
    for item in items {
        total += match item {
            Value::Array(inner) => count(&inner.borrow(), depth.saturating_sub(1))?,
            Value::Null if depth > 1 => {
                return Err(RuntimeError::NullPointer("counting the leaves of a null row"));
            }
            _ => 1,
        };
    }
    Ok(total)
}

fn dimensions(items: &[Value]) -> usize {
    match items.first() {
        Some(Value::Array(inner)) => 1 + dimensions(&inner.borrow()),
        _ => 1,
    }
}

fn sum(items: &[Value], float: bool) -> Result<Value, RuntimeError> {
    let mut acc = zero(float);
    for item in items {
        let value = match item {
            Value::Array(inner) => sum(&inner.borrow(), float)?,
            Value::Null => return Err(RuntimeError::NullPointer("summing a null element")),
            other => other.clone(),
        };
        acc = arithmetic(BinaryOp::Add, &acc, &value, false)?;
    }
    Ok(acc)
}

/// Nested arrays of `dimensions`, filled with the default for `element`.
pub fn allocate(element: &Type, dimensions: &[usize]) -> Value {
    match dimensions {
        [] => default_value(element),
        [length, rest @ ..] => {
            Value::array((0..*length).map(|_| allocate(element, rest)).collect())
        }
    }
}

pub fn default_value(ty: &Type) -> Value {
    match ty {
        Type::Int => Value::Int(0),
        Type::Float => Value::Float(0.0),
        Type::Bool => Value::Bool(false),
        _ => Value::Null,
    }
}
