use sigh_core::{CoreError, RuntimeError, run};

/// Run `src`, returning the printed output and the rendered return value.
fn run_program(src: &str) -> Result<(String, Option<String>), CoreError> {
    let mut out = Vec::new();
    let value = run(src, &mut out)?;
    let out = String::from_utf8(out).expect("program output is utf-8");
    Ok((out, value.map(|v| v.to_string())))
}

fn returns(src: &str) -> String {
    match run_program(src) {
        Ok((_, Some(value))) => value,
        Ok((_, None)) => panic!("program returned nothing: {src}"),
        Err(err) => panic!("program failed: {err}: {src}"),
    }
}

fn prints(src: &str) -> String {
    match run_program(src) {
        Ok((out, _)) => out,
        Err(err) => panic!("program failed: {err}: {src}"),
    }
}

fn expr(src: &str) -> String {
    returns(&format!("return {src}"))
}

fn runtime_error(src: &str) -> RuntimeError {
    match run_program(src) {
        Err(CoreError::Runtime { error, .. }) => error,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn literals_and_unary() {
    assert_eq!(expr("42"), "42");
    assert_eq!(expr("42.0"), "42.0");
    assert_eq!(expr("\"hello\""), "hello");
    assert_eq!(expr("(42)"), "42");
    assert_eq!(expr("[1, 2, 3]"), "[1, 2, 3]");
    assert_eq!(expr("null"), "null");
    assert_eq!(expr("!!true"), "true");
    assert_eq!(expr("\"tab\\tquote\\\"\""), "tab\tquote\"");
}

#[test]
fn numeric_binary_operators() {
    assert_eq!(expr("2 / 3"), "0");
    assert_eq!(expr("3 % 2"), "1");
    assert_eq!(expr("3.0 / 2.0"), "1.5");
    assert_eq!(expr("2 % 3.0"), "2.0");
    assert_eq!(expr("3.0 % 2"), "1.0");
    assert_eq!(expr("2 - 1.0"), "1.0");
    assert_eq!(expr("-3 + 1"), "-2");
    assert_eq!(expr("2 * (4-1) * 4.0 / 6 % (2+1)"), "1.0");
}

#[test]
fn string_concatenation_and_equality() {
    assert_eq!(expr("1 + \"a\""), "1a");
    assert_eq!(expr("\"a\" + true"), "atrue");
    assert_eq!(expr("\"hi\" != \"hi2\""), "true");
    assert_eq!(expr("1 != 1.0"), "false");
    assert_eq!(expr("[1] != [1]"), "true");
    assert_eq!(
        returns("var str: String = null; return print(str + 1)"),
        "null1"
    );
}

#[test]
fn logic_does_not_evaluate_needlessly() {
    assert_eq!(prints("var b: Bool = true || print(\"x\") == \"y\""), "");
    assert_eq!(prints("var b: Bool = false && print(\"x\") == \"y\""), "");
}

#[test]
fn root_and_blocks() {
    assert_eq!(run_program("return").expect("run").1, None);
    assert_eq!(returns("return 1; return 2"), "1");
    assert_eq!(prints("print(\"a\"); print(\"b\")"), "a\nb\n");
    assert_eq!(prints("{ print(\"a\"); print(\"b\") }"), "a\nb\n");
    assert_eq!(
        prints(
            "var x: Int = 1; \
             { print(\"\" + x); var x: Int = 2; print(\"\" + x) } \
             print(\"\" + x)"
        ),
        "1\n2\n1\n"
    );
}

#[test]
fn variables() {
    assert_eq!(returns("var x: Int = 0; return x = 3"), "3");
    assert_eq!(returns("var x: String = \"0\"; return x = \"S\""), "S");
    assert_eq!(returns("var x: Float = 1; x = 2; return x"), "2.0");
}

#[test]
fn calls_and_structs() {
    assert_eq!(
        returns("fun add (a: Int, b: Int): Int { return a + b } return add(4, 7)"),
        "11"
    );
    assert_eq!(
        returns("struct Point { var x: Int; var y: Int } return $Point(1, 2)"),
        "Point{x=1, y=2}"
    );
    assert_eq!(
        returns("struct P { var x: Int; var y: Int } return $P(1, 2).y"),
        "2"
    );
    assert_eq!(
        returns("struct P { var x: Int; var y: Int } var p: P = $P(1, 2); p.y = 42; return p.y"),
        "42"
    );
}

#[test]
fn null_accesses_fail_at_runtime() {
    for src in [
        "var array: Int[] = null; return array[0]",
        "var array: Int[] = null; return array.length",
        "var x: Int[] = null; x[0] = 3",
        "struct P { var x: Int; var y: Int } var p: P = null; return p.y",
        "struct P { var x: Int; var y: Int } var p: P = null; p.y = 42",
    ] {
        assert!(
            matches!(runtime_error(src), RuntimeError::NullPointer(_)),
            "expected a null pointer error for {src}"
        );
    }
    assert_eq!(
        runtime_error("var x: Int[] = []; x[0] = 3; return x[0]"),
        RuntimeError::IndexOutOfBounds {
            index: 0,
            length: 0
        }
    );
}

#[test]
fn empty_array_aggregates() {
    assert_eq!(expr("[].length"), "0");
    assert_eq!(expr("[].avg"), "0");
    assert_eq!(expr("[].count"), "0");
    assert_eq!(expr("[].sum"), "0");
    assert_eq!(expr("[].nDim"), "1");
}

#[test]
fn array_access_and_aggregates() {
    assert_eq!(expr("[1.0][0]"), "1.0");
    assert_eq!(expr("[4, 2].avg"), "3");
    assert_eq!(expr("[1, 3, 4, 2].count"), "4");
    assert_eq!(expr("[[4, 2],[1,3]].sum"), "10");
    assert_eq!(expr("[[4, 2],[3]].count"), "3");
    assert_eq!(expr("[[[4, 2],[1,3]],[[1,1],[2,2]]].nDim"), "3");
    assert_eq!(expr("[[[4, 2],[1,3]],[[1,1],[2,2]]].avg"), "2");
    assert_eq!(expr("[[[4, 2],[1,3]],[[1,1]]].count"), "6");
    assert_eq!(expr("[[[1], [2], [3]], [[4], [5], [6]]][1][2][0]"), "6");
}

#[test]
fn element_wise_arithmetic() {
    assert_eq!(expr("([4, 2]+[1, 1])[1]"), "3");
    assert_eq!(expr("([4, 2]*[2, 3])[0]"), "8");
    assert_eq!(expr("([3, 2]/[2, 1])[0]"), "1");
    assert_eq!(expr("([3.0, 2.0]/[2.0, 1.0])[0]"), "1.5");
    assert_eq!(expr("[\"a\", \"b\"] + [\"c\", \"d\"]"), "[ac, bd]");
}

#[test]
fn sized_array_declarations() {
    assert_eq!(returns("var x: Int[2]; return x[0]"), "0");
    assert_eq!(returns("var x: String[2][2]; return x[0][1]"), "null");
    assert_eq!(
        returns("var x: Int[1][2][3]; x[0][0][0]=3; return x[0][0][0]"),
        "3"
    );
    let cube = "var x: Int[2][2][2]; var y: Int[2][2][2];\
                x[0][0][0]=1;x[1][0][0]=2;x[0][0][1]=3;x[1][0][1]=4;\
                x[0][1][0]=5;x[1][1][0]=6;x[0][1][1]=7;x[1][1][1]=8;\
                y[0][0][0]=1;y[1][0][0]=3;y[0][0][1]=5;y[1][0][1]=7;\
                y[0][1][0]=9;y[1][1][0]=11;y[0][1][1]=13;y[1][1][1]=15;";
    assert_eq!(returns(&format!("{cube} var z: Int[][][] = x*y; return z[0][1][1]")), "91");
    assert_eq!(returns(&format!("{cube} var z: Int[][][] = x-y; return z[0][1][1]")), "-6");
    assert_eq!(returns(&format!("{cube} var z: Int[][][] = y/x; return z[0][1][1]")), "1");
    assert_eq!(
        returns("var x: Int[2]; x[0]=2;x[1]=4; return x.avg"),
        "3"
    );
}

#[test]
fn element_wise_division_by_zero_fails() {
    let ints = "var x: Int[2]; var y: Int[2]; x[0]=1;x[1]=1; y[0]=4;y[1]=0; var z: Int[] = x/y";
    assert_eq!(runtime_error(ints), RuntimeError::DivisionByZero);
    let floats = "var x: Float[2]; var y: Float[2]; x[0]=1.5; y[0]=4.0; var z: Float[] = x/y";
    assert_eq!(runtime_error(floats), RuntimeError::DivisionByZero);
}

#[test]
fn mixing_int_and_float_arrays_needs_a_float_target() {
    let src = "var x: Int[2]; var y: Float[2]; var z: Int[] = x + y";
    assert!(matches!(run_program(src), Err(CoreError::SemanticErrors(_))));
    let src = "var x: Int[2]; var y: Float[2]; y[1] = 0.5; var z: Float[] = x + y; return z";
    assert_eq!(returns(src), "[0.0, 0.5]");
}

#[test]
fn dot_products() {
    assert_eq!(expr("[1, 2, 3] @ [4, 5, 6]"), "32");
    assert_eq!(expr("[1.5, 2] @ [2, 2]"), "7.0");
    assert_eq!(expr("[[1, 2, 3]] @ [[1], [2], [3]]"), "[[14]]");
    assert!(matches!(
        runtime_error("return [1, 2] @ [1]"),
        RuntimeError::ShapeMismatch(_)
    ));
}

#[test]
fn dot_product_of_a_vector_and_a_column() {
    assert_eq!(expr("[1, 2] @ [[1], [2]]"), "5");
    assert_eq!(expr("[1.5, 2.0] @ [[2], [1]]"), "5.0");
    assert!(matches!(
        runtime_error("return [1, 2] @ [[1, 1], [2, 2]]"),
        RuntimeError::ShapeMismatch(_)
    ));
    assert!(matches!(
        runtime_error("return [1, 2, 3] @ [[1], [2]]"),
        RuntimeError::ShapeMismatch(_)
    ));
}

#[test]
fn element_wise_operators_on_struct_arrays_call_methods() {
    let point = "struct V { var x: Int \
                   fun plus(o: V): V { return $V(x + o.x) } \
                   fun mul(k: Float): Float { return x * k } } ";
    assert_eq!(
        returns(&format!("{point} var a: V[] = [$V(1)] + [$V(2)]; return a[0].x")),
        "3"
    );
    assert_eq!(
        returns(&format!(
            "{point} var a: V[] = [$V(1), $V(5)] + [$V(2), $V(3)]; return a[0].x + a[1].x * 10"
        )),
        "83"
    );
    assert_eq!(
        returns(&format!("{point} return [[$V(1)], [$V(2)]] * [[2], [3]]")),
        "[[2.0], [6.0]]"
    );
    assert!(matches!(
        runtime_error(&format!("{point} return [$V(1)] + [$V(1), $V(2)]")),
        RuntimeError::ShapeMismatch(_)
    ));
    assert!(matches!(
        run_program(&format!("{point} return [$V(1)] - [$V(2)]")),
        Err(CoreError::SemanticErrors(_))
    ));
}

#[test]
fn floats_print_with_a_decimal_part() {
    assert_eq!(expr("100000000000000000000.0"), "1.0E20");
    assert_eq!(expr("0.00001"), "1.0E-5");
    assert_eq!(expr("\"\" + 1.0 / 0.0"), "Infinity");
    assert_eq!(expr("1234.5"), "1234.5");
}

#[test]
fn oversized_array_declarations_are_rejected() {
    assert!(matches!(
        run_program("var x: Int[100000000000]"),
        Err(CoreError::ParseError(_))
    ));
}

#[test]
fn aggregates_reject_null_rows() {
    for property in ["count", "sum", "avg"] {
        assert!(
            matches!(
                runtime_error(&format!("return [[1], null].{property}")),
                RuntimeError::NullPointer(_)
            ),
            "{property} should fail on a null row"
        );
    }
    assert_eq!(expr("[[1], null].length"), "2");
}

#[test]
fn if_and_while() {
    assert_eq!(returns("if (true) return 1 else return 2"), "1");
    assert_eq!(
        returns("if (false) return 1 else if (true) return 2 else return 3"),
        "2"
    );
    assert_eq!(
        prints("var i: Int = 0; while (i < 3) { print(\"\" + i); i = i + 1 }"),
        "0\n1\n2\n"
    );
}

#[test]
fn empty_arrays_fit_any_array_type() {
    assert!(run_program("var array: Int[] = []").is_ok());
    assert!(run_program("var array: String[] = []").is_ok());
    assert!(run_program("fun use_array (array: Int[]) {} ; use_array([])").is_ok());
}

#[test]
fn types_as_values() {
    assert_eq!(returns("struct S{} ; return \"\" + S"), "S");
    assert_eq!(returns("struct S{} ; var type: Type = S ; return \"\" + type"), "S");
    assert_eq!(expr("Int"), "Int");
}

#[test]
fn unconditional_return() {
    assert_eq!(
        returns("fun f(): Int { if (true) return 1 else return 2 } ; return f()"),
        "1"
    );
}

#[test]
fn methods_operate_on_their_receiver() {
    let src = "struct Counter { var n: Int \
                 fun inc() { n = n + 1 } \
                 fun get(): Int { return n } } \
               var c: Counter = $Counter(0); c.inc(); c.inc(); return c.get()";
    assert_eq!(returns(src), "2");
}

#[test]
fn overloaded_operators_dispatch_to_methods() {
    let src = "struct V { var x: Float; var y: Float \
                 fun plus(o: V): V { return $V(x + o.x, y + o.y) } \
                 fun mul(k: Float): V { return $V(x * k, y * k) } } \
               return ($V(1, 2) + $V(3, 4)) * 2";
    assert_eq!(returns(src), "V{x=8.0, y=12.0}");
}

#[test]
fn structs_declared_in_functions_close_over_locals() {
    let src = "fun make(base: Int): Int { \
                 struct Acc { var total: Int \
                   fun add(k: Int): Int { total = total + k + base; return total } } \
                 var a: Acc = $Acc(0) \
                 a.add(1) \
                 return a.add(1) } \
               return make(10)";
    assert_eq!(returns(src), "22");
}
