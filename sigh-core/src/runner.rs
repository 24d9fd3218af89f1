//! Pipeline entry points: source text in, checked program or result out.

use std::io::Write;

use crate::ast::Program;
use crate::error::CoreError;
use crate::hir::HirProgram;
use crate::interpreter;
use crate::parser::parse;
use crate::typecheck::typecheck_program;
use crate::value::Value;

/// Lex and parse `source`.
pub fn parse_program(source: &str) -> Result<Program, CoreError> {
    parse(source)
}

/// Parse and type-check `source`.
pub fn check(source: &str) -> Result<HirProgram, CoreError> {
    let ast = parse(source)?;
    let result = typecheck_program(&ast);
    match result.program {
        Some(program) => Ok(program),
        None => Err(CoreError::SemanticErrors(result.diagnostics)),
    }
}

/// Check and run `source`, writing its output to `out`.
///
/// Yields the value of a top-level `return`, if any.
pub fn run(source: &str, out: &mut dyn Write) -> Result<Option<Value>, CoreError> {
    let program = check(source)?;
    interpreter::execute(&program, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[test]
    fn runs_programs_and_captures_output() {
        let mut out = Vec::new();
        let value = run("print(\"hello\"); return 40 + 2", &mut out).expect("run");
        assert_eq!(value.map(|v| v.to_string()), Some("42".to_string()));
        assert_eq!(String::from_utf8(out).expect("utf-8"), "hello\n");
    }

    #[test]
    fn reports_each_stage() {
        let mut out = Vec::new();
        assert!(matches!(run("return \"open", &mut out), Err(CoreError::LexErrors(_))));
        assert!(matches!(run("return (1", &mut out), Err(CoreError::ParseError(_))));
        assert!(matches!(
            run("return x", &mut out),
            Err(CoreError::SemanticErrors(_))
        ));
        assert!(matches!(
            run("return 1 / 0", &mut out),
            Err(CoreError::Runtime {
                error: RuntimeError::DivisionByZero,
                ..
            })
        ));
    }

    #[test]
    fn semantic_errors_are_all_collected() {
        let Err(CoreError::SemanticErrors(diags)) = check("var a: Int = x; var b: Int = y") else {
            panic!("expected semantic errors");
        };
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.code == Some("E0200")));
    }

    #[test]
    fn parses_without_checking() {
        let program = parse_program("return undefined_name").expect("parse");
        assert_eq!(program.statements.len(), 1);
    }
}
