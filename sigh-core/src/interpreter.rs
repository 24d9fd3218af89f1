//! Tree-walking interpreter over HIR.
//!
//! The interpreter trusts the type checker: a runtime type mismatch can only
//! come from reading a variable before its declaration ran (it then holds
//! `null`), and is reported as a runtime error rather than a panic.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::ast::BinaryOp;
use crate::environment::{Env, Environment};
use crate::error::{CoreError, RuntimeError};
use crate::hir::{
    DotShape, HirBlock, HirExpr, HirExprKind, HirFunction, HirPlace, HirProgram, HirStmt,
    HirStmtKind,
};
use crate::ops;
use crate::span::Span;
use crate::types::Type;
use crate::value::{BoundMethod, Closure, Constructor, StructInstance, Value};

type Exec<T> = Result<T, CoreError>;

/// How control leaves a statement.
enum Flow {
    Normal,
    Return(Option<Value>),
}

fn fail(error: RuntimeError, span: Span) -> CoreError {
    CoreError::Runtime { error, span }
}

trait AtSpan<T> {
    fn at(self, span: Span) -> Exec<T>;
}

impl<T> AtSpan<T> for Result<T, RuntimeError> {
    fn at(self, span: Span) -> Exec<T> {
        self.map_err(|error| fail(error, span))
    }
}

/// Run a checked program, writing `print` output to `out`.
///
/// Returns the value of a top-level `return`, if one was executed.
pub fn execute(program: &HirProgram, out: &mut dyn Write) -> Exec<Option<Value>> {
    log::debug!(
        "executing {} top-level statement(s)",
        program.body.statements.len()
    );
    let mut interpreter = Interpreter { program, out };
    let root = Environment::root(program.body.slots);
    match interpreter.exec_statements(&program.body.statements, &root)? {
        Flow::Return(value) => Ok(value),
        Flow::Normal => Ok(None),
    }
}

struct Interpreter<'p, 'o> {
    program: &'p HirProgram,
    out: &'o mut dyn Write,
}

impl Interpreter<'_, '_> {
    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn exec_statements(&mut self, stmts: &[HirStmt], env: &Env) -> Exec<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec(stmt, env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, block: &HirBlock, env: &Env) -> Exec<Flow> {
        let env = Environment::child(env, block.slots);
        self.exec_statements(&block.statements, &env)
    }

    fn exec(&mut self, stmt: &HirStmt, env: &Env) -> Exec<Flow> {
        match &stmt.kind {
            HirStmtKind::Block(block) => self.exec_block(block, env),
            HirStmtKind::Declare { slot, value } => {
                let value = self.eval(value, env)?;
                env.set(*slot, value).at(stmt.span)?;
                Ok(Flow::Normal)
            }
            HirStmtKind::SizedArray {
                slot,
                element,
                dimensions,
            } => {
                env.set(*slot, ops::allocate(element, dimensions))
                    .at(stmt.span)?;
                Ok(Flow::Normal)
            }
            HirStmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_bool(condition, env)? {
                    self.exec(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            HirStmtKind::While { condition, body } => {
                while self.eval_bool(condition, env)? {
                    if let Flow::Return(value) = self.exec(body, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            HirStmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => Some(self.eval(expr, env)?),
                    None => None,
                };
                Ok(Flow::Return(value))
            }
            HirStmtKind::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval_bool(&mut self, expr: &HirExpr, env: &Env) -> Exec<bool> {
        match self.eval(expr, env)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Err(fail(RuntimeError::NullPointer("null used as a condition"), expr.span)),
            other => Err(fail(
                RuntimeError::UnsupportedOperands(format!(
                    "expected a Bool, found {}",
                    other.type_name()
                )),
                expr.span,
            )),
        }
    }

    fn eval_index(&mut self, expr: &HirExpr, env: &Env) -> Exec<i64> {
        match self.eval(expr, env)? {
            Value::Int(i) => Ok(i),
            Value::Null => Err(fail(RuntimeError::NullPointer("null used as an index"), expr.span)),
            other => Err(fail(
                RuntimeError::UnsupportedOperands(format!(
                    "expected an Int index, found {}",
                    other.type_name()
                )),
                expr.span,
            )),
        }
    }

    fn eval_struct(&mut self, expr: &HirExpr, env: &Env) -> Exec<Rc<StructInstance>> {
        match self.eval(expr, env)? {
            Value::Struct(instance) => Ok(instance),
            Value::Null => Err(fail(
                RuntimeError::NullPointer("accessing a field or method of null"),
                expr.span,
            )),
            other => Err(fail(
                RuntimeError::UnsupportedOperands(format!(
                    "expected a struct, found {}",
                    other.type_name()
                )),
                expr.span,
            )),
        }
    }

    fn function(&self, id: usize, span: Span) -> Exec<Rc<HirFunction>> {
        self.program
            .functions
            .get(id)
            .cloned()
            .ok_or_else(|| fail(RuntimeError::Internal("unknown function"), span))
    }

    fn eval(&mut self, expr: &HirExpr, env: &Env) -> Exec<Value> {
        let span = expr.span;
        match &expr.kind {
            HirExprKind::Int(value) => Ok(Value::Int(*value)),
            HirExprKind::Float(value) => Ok(Value::Float(*value)),
            HirExprKind::Str(value) => Ok(Value::Str(Rc::clone(value))),
            HirExprKind::Bool(value) => Ok(Value::Bool(*value)),
            HirExprKind::Null => Ok(Value::Null),
            HirExprKind::Local { hops, slot } => env.ancestor(*hops).and_then(|e| e.get(*slot)).at(span),
            HirExprKind::ReceiverField { hops, field } => {
                let receiver = env.ancestor(*hops).and_then(|e| e.receiver_instance()).at(span)?;
                let fields = receiver.fields.borrow();
                fields
                    .get(*field)
                    .cloned()
                    .ok_or_else(|| fail(RuntimeError::Internal("unknown field"), span))
            }
            HirExprKind::ReceiverMethod { hops, method } => {
                let receiver = env.ancestor(*hops).and_then(|e| e.receiver_instance()).at(span)?;
                Ok(Value::Method(Rc::new(BoundMethod {
                    receiver,
                    function: self.function(*method, span)?,
                })))
            }
            HirExprKind::Function { hops, id } => Ok(Value::Function(Rc::new(Closure {
                function: self.function(*id, span)?,
                env: env.ancestor(*hops).at(span)?,
            }))),
            HirExprKind::Constructor { hops, id } => {
                let decl = self
                    .program
                    .structs
                    .get(*id)
                    .cloned()
                    .ok_or_else(|| fail(RuntimeError::Internal("unknown struct"), span))?;
                Ok(Value::Constructor(Rc::new(Constructor {
                    decl,
                    env: env.ancestor(*hops).at(span)?,
                })))
            }
            HirExprKind::TypeValue(ty) => Ok(Value::Type(ty.clone())),
            HirExprKind::Print => Ok(Value::Print),
            HirExprKind::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<Exec<Vec<_>>>()?;
                Ok(Value::array(items))
            }
            HirExprKind::Field { stem, field } => {
                let instance = self.eval_struct(stem, env)?;
                let fields = instance.fields.borrow();
                fields
                    .get(*field)
                    .cloned()
                    .ok_or_else(|| fail(RuntimeError::Internal("unknown field"), span))
            }
            HirExprKind::Method { stem, method } => {
                let receiver = self.eval_struct(stem, env)?;
                Ok(Value::Method(Rc::new(BoundMethod {
                    receiver,
                    function: self.function(*method, span)?,
                })))
            }
            HirExprKind::ArrayProperty { stem, property } => {
                let array = self.eval(stem, env)?;
                ops::property(&array, *property, &stem.ty).at(span)
            }
            HirExprKind::Index { array, index } => {
                let array_value = self.eval(array, env)?;
                let index = self.eval_index(index, env)?;
                let Value::Array(items) = array_value else {
                    return Err(fail(RuntimeError::NullPointer("indexing a null array"), span));
                };
                let items = items.borrow();
                checked_index(index, items.len())
                    .map(|i| items[i].clone())
                    .at(span)
            }
            HirExprKind::Call { callee, args } => {
                let callee = self.eval(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, env))
                    .collect::<Exec<Vec<_>>>()?;
                self.call(callee, args, span)
            }
            HirExprKind::Not(operand) => Ok(Value::Bool(!self.eval_bool(operand, env)?)),
            HirExprKind::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary(*op, &left, &right).at(span)
            }
            HirExprKind::Logic { op, left, right } => {
                let left = self.eval_bool(left, env)?;
                let value = match op {
                    BinaryOp::And => left && self.eval_bool(right, env)?,
                    _ => left || self.eval_bool(right, env)?,
                };
                Ok(Value::Bool(value))
            }
            HirExprKind::Concat { left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                Ok(Value::string(&format!("{left}{right}")))
            }
            HirExprKind::ElementWise { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                ops::element_wise(*op, &left, &right).at(span)
            }
            HirExprKind::ElementWiseMethod {
                method,
                left,
                right,
            } => {
                let function = self.function(*method, span)?;
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                self.element_wise_method(&function, left, right, span)
            }
            HirExprKind::DotProduct { left, right } => {
                let shape = DotShape::from_depths(left.ty.depth(), right.ty.depth())
                    .ok_or_else(|| fail(RuntimeError::Internal("unchecked dot product shape"), span))?;
                let float = *expr.ty.leaf() == Type::Float;
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                ops::dot_product(&left, &right, shape, float).at(span)
            }
            HirExprKind::Assign { target, value } => self.assign(target, value, env, span),
            HirExprKind::IntToFloat(inner) => match self.eval(inner, env)? {
                Value::Int(i) => Ok(Value::Float(i as f64)),
                other => Ok(other),
            },
        }
    }

    fn assign(&mut self, target: &HirPlace, value: &HirExpr, env: &Env, span: Span) -> Exec<Value> {
        match target {
            HirPlace::Local { hops, slot } => {
                let value = self.eval(value, env)?;
                env.ancestor(*hops)
                    .and_then(|e| e.set(*slot, value.clone()))
                    .at(span)?;
                Ok(value)
            }
            HirPlace::ReceiverField { hops, field } => {
                let receiver = env.ancestor(*hops).and_then(|e| e.receiver_instance()).at(span)?;
                let value = self.eval(value, env)?;
                store_field(&receiver, *field, value.clone()).at(span)?;
                Ok(value)
            }
            HirPlace::Field { stem, field } => {
                let instance = self.eval_struct(stem, env)?;
                let value = self.eval(value, env)?;
                store_field(&instance, *field, value.clone()).at(span)?;
                Ok(value)
            }
            HirPlace::Index { array, index } => {
                let array_value = self.eval(array, env)?;
                let index = self.eval_index(index, env)?;
                let value = self.eval(value, env)?;
                let Value::Array(items) = array_value else {
                    return Err(fail(
                        RuntimeError::NullPointer("indexing a null array"),
                        array.span,
                    ));
                };
                let mut items = items.borrow_mut();
                let i = checked_index(index, items.len()).at(span)?;
                items[i] = value.clone();
                Ok(value)
            }
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn call(&mut self, callee: Value, args: Vec<Value>, span: Span) -> Exec<Value> {
        match callee {
            Value::Function(closure) => self.invoke(&closure.function, &closure.env, args),
            Value::Method(method) => {
                let frame = Environment::receiver(&method.receiver.env, Rc::clone(&method.receiver));
                self.invoke(&method.function, &frame, args)
            }
            Value::Constructor(constructor) => Ok(Value::Struct(Rc::new(StructInstance {
                decl: Rc::clone(&constructor.decl),
                env: Rc::clone(&constructor.env),
                fields: RefCell::new(args),
            }))),
            Value::Print => {
                let text = args.into_iter().next().unwrap_or(Value::Null);
                writeln!(self.out, "{text}")
                    .map_err(|e| fail(RuntimeError::Output(e.to_string()), span))?;
                Ok(text)
            }
            Value::Null => Err(fail(RuntimeError::NullPointer("calling a null function"), span)),
            other => Err(fail(
                RuntimeError::UnsupportedOperands(format!(
                    "cannot call a value of type {}",
                    other.type_name()
                )),
                span,
            )),
        }
    }

    /// Apply a struct's operator method to each pair of elements.
    fn element_wise_method(
        &mut self,
        function: &Rc<HirFunction>,
        left: Value,
        right: Value,
        span: Span,
    ) -> Exec<Value> {
        match (left, right) {
            (Value::Array(left), Value::Array(right)) => {
                let left = left.borrow().clone();
                let right = right.borrow().clone();
                if left.len() != right.len() {
                    return Err(fail(
                        RuntimeError::ShapeMismatch(format!(
                            "element-wise {} on arrays of length {} and {}",
                            function.name,
                            left.len(),
                            right.len()
                        )),
                        span,
                    ));
                }
                let items = left
                    .into_iter()
                    .zip(right)
                    .map(|(a, b)| self.element_wise_method(function, a, b, span))
                    .collect::<Exec<Vec<_>>>()?;
                Ok(Value::array(items))
            }
            (Value::Struct(receiver), argument) => {
                let argument = match (argument, function.params.first().map(|p| &p.ty)) {
                    (Value::Int(i), Some(Type::Float)) => Value::Float(i as f64),
                    (argument, _) => argument,
                };
                let method = Value::Method(Rc::new(BoundMethod {
                    receiver,
                    function: Rc::clone(function),
                }));
                self.call(method, vec![argument], span)
            }
            (Value::Null, _) | (_, Value::Null) => Err(fail(
                RuntimeError::NullPointer("element-wise operation on null"),
                span,
            )),
            _ => Err(fail(
                RuntimeError::ShapeMismatch(
                    "element-wise operation on arrays of different depths".to_string(),
                ),
                span,
            )),
        }
    }

    /// Call `function` with a parameter frame whose parent is `parent`.
    /// Void functions evaluate to `null`.
    fn invoke(&mut self, function: &HirFunction, parent: &Env, args: Vec<Value>) -> Exec<Value> {
        log::trace!("calling {}", function.name);
        let params = Environment::with_values(parent, args);
        match self.exec_block(&function.body, &params)? {
            Flow::Return(Some(value)) => Ok(value),
            Flow::Return(None) | Flow::Normal => Ok(Value::Null),
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if op.is_arithmetic() {
        ops::arithmetic(op, left, right, false)
    } else if op.is_comparison() {
        ops::compare(op, left, right).map(Value::Bool)
    } else if op == BinaryOp::Equality {
        Ok(Value::Bool(left == right))
    } else if op == BinaryOp::NotEquals {
        Ok(Value::Bool(left != right))
    } else {
        Err(RuntimeError::UnsupportedOperands(format!(
            "{} {} {}",
            left.type_name(),
            op.symbol(),
            right.type_name()
        )))
    }
}

fn checked_index(index: i64, length: usize) -> Result<usize, RuntimeError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < length)
        .ok_or(RuntimeError::IndexOutOfBounds { index, length })
}

fn store_field(instance: &StructInstance, field: usize, value: Value) -> Result<(), RuntimeError> {
    let mut fields = instance.fields.borrow_mut();
    let slot = fields
        .get_mut(field)
        .ok_or(RuntimeError::Internal("unknown field"))?;
    *slot = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::typecheck::typecheck_program;

    fn run(source: &str) -> (Exec<Option<Value>>, String) {
        let ast = parse(source).expect("parse");
        let checked = typecheck_program(&ast);
        let program = checked
            .program
            .unwrap_or_else(|| panic!("type errors: {:?}", checked.diagnostics));
        let mut out = Vec::new();
        let result = execute(&program, &mut out);
        (result, String::from_utf8(out).expect("utf-8 output"))
    }

    fn result(source: &str) -> String {
        match run(source).0 {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => "<none>".to_string(),
            Err(err) => panic!("runtime error: {err}"),
        }
    }

    fn runtime_error(source: &str) -> RuntimeError {
        match run(source).0 {
            Err(CoreError::Runtime { error, .. }) => error,
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }

    #[test]
    fn evaluates_arithmetic() {
        assert_eq!(result("return 1 + 2 * 3"), "7");
        assert_eq!(result("return 2 * (4-1) * 4.0 / 6 % (2+1)"), "1.0");
        assert_eq!(result("return 7 / 2"), "3");
        assert_eq!(result("return 1 + 2.5"), "3.5");
        assert_eq!(result("return \"a\" + 1 + 2.0"), "a12.0");
    }

    #[test]
    fn integer_division_by_zero_is_an_error() {
        assert_eq!(runtime_error("return 1 / 0"), RuntimeError::DivisionByZero);
        assert_eq!(runtime_error("return 1 % 0"), RuntimeError::DivisionByZero);
    }

    #[test]
    fn logic_short_circuits() {
        let (value, out) = run(
            "fun loud(): Bool { print(\"called\"); return true } \
             return false && loud() || true || loud()",
        );
        assert_eq!(value.expect("run").map(|v| v.to_string()), Some("true".to_string()));
        assert_eq!(out, "");
    }

    #[test]
    fn print_writes_lines_and_returns_its_argument() {
        let (value, out) = run("var s: String = print(\"hi\"); print(s + \"!\"); return s");
        assert_eq!(out, "hi\nhi!\n");
        assert_eq!(value.expect("run").map(|v| v.to_string()), Some("hi".to_string()));
    }

    #[test]
    fn programs_without_return_yield_nothing() {
        assert_eq!(result("var x: Int = 1"), "<none>");
        assert_eq!(result("return"), "<none>");
    }

    #[test]
    fn blocks_shadow_and_restore() {
        assert_eq!(
            result("var x: Int = 1; { var x: Int = 2; x = 3 } return x"),
            "1"
        );
        assert_eq!(result("var x: Int = 1; { x = 3 } return x"), "3");
    }

    #[test]
    fn while_loops_and_conditionals() {
        assert_eq!(
            result("var i: Int = 0; var s: Int = 0; while i < 5 { i = i + 1; s = s + i } return s"),
            "15"
        );
        assert_eq!(result("if 1 < 2 return \"yes\" else return \"no\""), "yes");
        assert_eq!(result("if 1 > 2 return \"yes\" return \"after\""), "after");
    }

    #[test]
    fn recursion_and_hoisting() {
        assert_eq!(
            result("return fact(10); fun fact(n: Int): Int { if n <= 1 return 1 return n * fact(n - 1) }"),
            "3628800"
        );
    }

    #[test]
    fn closures_capture_their_environment() {
        assert_eq!(
            result(
                "fun counter(): Int { \
                   var n: Int = 0 \
                   fun bump(): Int { n = n + 1; return n } \
                   bump(); bump() \
                   return bump() } \
                 return counter()"
            ),
            "3"
        );
    }

    #[test]
    fn functions_are_values() {
        assert_eq!(result("fun f(): Int { return 1 } return f == f"), "true");
        assert_eq!(result("fun f(): Int { return 1 } return f"), "f");
        assert_eq!(result("return print"), "print");
    }

    #[test]
    fn arrays_index_and_mutate() {
        assert_eq!(result("var xs: Int[] = [1, 2, 3]; xs[1] = 5; return xs"), "[1, 5, 3]");
        assert_eq!(
            result("var xs: Int[] = [1]; var ys: Int[] = xs; ys[0] = 9; return xs[0]"),
            "9"
        );
        assert_eq!(
            runtime_error("var xs: Int[] = [1]; return xs[1]"),
            RuntimeError::IndexOutOfBounds {
                index: 1,
                length: 1
            }
        );
        assert_eq!(
            runtime_error("var xs: Int[] = [1]; return xs[-1]"),
            RuntimeError::IndexOutOfBounds {
                index: -1,
                length: 1
            }
        );
        assert!(matches!(
            runtime_error("var xs: Int[] = null; return xs[0]"),
            RuntimeError::NullPointer(_)
        ));
    }

    #[test]
    fn sized_arrays_start_with_defaults() {
        assert_eq!(result("var m: Int[2][2]; m[1][0] = 3; return m"), "[[0, 0], [3, 0]]");
        assert_eq!(result("var b: Bool[1]; return b"), "[false]");
        assert_eq!(result("var s: String[2]; return s"), "[null, null]");
    }

    #[test]
    fn array_operations() {
        assert_eq!(result("return [1, 2] + [3, 4]"), "[4, 6]");
        assert_eq!(result("return [[1, 2]] * [[3, 4]]"), "[[3, 8]]");
        assert_eq!(result("return [1.0, 2.0] / [2, 4]"), "[0.5, 0.5]");
        assert_eq!(result("return [1, 2, 3] @ [4, 5, 6]"), "32");
        assert_eq!(result("return [[1, 2], [3, 4]] @ [[5, 6], [7, 8]]"), "[[19, 22], [43, 50]]");
        assert!(matches!(
            runtime_error("return [1, 2] + [1]"),
            RuntimeError::ShapeMismatch(_)
        ));
        assert_eq!(
            runtime_error("return [1.0] / [0.0]"),
            RuntimeError::DivisionByZero
        );
    }

    #[test]
    fn array_aggregates() {
        let source = "var m: Int[][] = [[1, 2, 3], [4]]; ";
        assert_eq!(result(&format!("{source} return m.length")), "2");
        assert_eq!(result(&format!("{source} return m.count")), "4");
        assert_eq!(result(&format!("{source} return m.sum")), "10");
        assert_eq!(result(&format!("{source} return m.avg")), "2");
        assert_eq!(result(&format!("{source} return m.nDim")), "2");
        assert_eq!(result("var xs: Float[] = [1.0, 2.0]; return xs.avg"), "1.5");
        assert_eq!(result("var xs: Int[] = []; return xs.avg"), "0");
    }

    #[test]
    fn structs_methods_and_overloads() {
        let source = "struct P { var x: Int; var y: Int \
                        fun norm1(): Int { return x + y } \
                        fun shift(d: Int) { x = x + d; y = y + d } \
                        fun plus(o: P): P { return $P(x + o.x, y + o.y) } } ";
        assert_eq!(result(&format!("{source} return $P(1, 2)")), "P{x=1, y=2}");
        assert_eq!(
            result(&format!("{source} var p: P = $P(1, 2); p.shift(3); return p.norm1()")),
            "9"
        );
        assert_eq!(
            result(&format!("{source} var p: P = $P(1, 2) + $P(10, 20); return p")),
            "P{x=11, y=22}"
        );
        assert_eq!(
            result(&format!("{source} var p: P = $P(1, 2); p.y = 5; return p.y")),
            "5"
        );
        assert_eq!(result(&format!("{source} return $P")), "$P");
        assert!(matches!(
            runtime_error(&format!("{source} var p: P = null; return p.x")),
            RuntimeError::NullPointer(_)
        ));
    }

    #[test]
    fn bound_methods_keep_their_receiver() {
        let source = "struct C { var n: Int; fun get(): Int { return n } } \
                      var c: C = $C(4); c.n = 5; return (c.get)()";
        assert_eq!(result(source), "5");
    }

    #[test]
    fn equality_semantics() {
        assert_eq!(result("return 1 == 1.0"), "true");
        assert_eq!(result("return \"ab\" == \"a\" + \"b\""), "true");
        assert_eq!(result("return [1] == [1]"), "false");
        assert_eq!(result("var a: Int[] = [1]; return a == a"), "true");
        assert_eq!(result("return null == null"), "true");
        assert_eq!(result("return null != \"x\""), "true");
    }

    #[test]
    fn float_variables_store_floats() {
        assert_eq!(result("var f: Float = 1; return f"), "1.0");
        assert_eq!(result("var f: Float = 1.5; f = 2; return f"), "2.0");
        assert_eq!(result("fun h(x: Float): Float { return x } return h(3)"), "3.0");
    }

    #[test]
    fn integers_wrap() {
        assert_eq!(result("return 9223372036854775807 + 1"), "-9223372036854775808");
    }
}
