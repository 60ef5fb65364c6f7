use pretty_assertions::assert_eq;

use flint::core::{Diagnostics, FlintError, Interpreter, Parser, Scanner};

/// Drives one source text through the full pipeline the way the shell does:
/// scan, parse, and interpret only if no compile-time diagnostic was
/// collected.
fn run(source: &str) -> (String, Vec<String>, Option<FlintError>) {
    let mut diagnostics = Diagnostics::new();
    let tokens = Scanner::new(source.to_owned()).scan_tokens(&mut diagnostics);
    let statements = Parser::new(tokens).parse_stmts(&mut diagnostics);

    let mut output = Vec::new();
    let runtime_error = if diagnostics.had_error() {
        None
    } else {
        let mut interpreter = Interpreter::with_output(&mut output);
        interpreter.interpret(statements).err()
    };

    let reports = diagnostics.reports().map(ToString::to_string).collect();
    (String::from_utf8(output).unwrap(), reports, runtime_error)
}

#[test]
fn an_inner_declaration_shadows_and_the_outer_binding_survives() {
    let (output, reports, error) = run("var x = 1; { var x = 2; print x; } print x;");

    assert!(reports.is_empty());
    assert_eq!(None, error);
    assert_eq!("2\n1\n", output);
}

#[test]
fn grouping_and_precedence_evaluate_together() {
    let (output, reports, error) = run("print (1 + 2) * 3 > (4 - 5) / 6;");

    assert!(reports.is_empty());
    assert_eq!(None, error);
    assert_eq!("true\n", output);
}

#[test]
fn assigning_to_an_undeclared_name_is_a_runtime_diagnostic() {
    let (output, reports, error) = run("x = 5;");

    assert!(reports.is_empty());
    assert_eq!("", output);

    let error = error.expect("assignment to an undeclared name must fail");
    assert_eq!("Undefined variable 'x'.", error.to_string());
    assert_eq!(1, error.line());
}

#[test]
fn mixed_operand_addition_is_an_error_not_a_printed_null() {
    let (output, reports, error) = run("print 1 + \"x\";");

    assert!(reports.is_empty());
    assert_eq!("", output);

    let error = error.expect("number + string must fail");
    assert_eq!("Unsupported binary operands.", error.to_string());
}

#[test]
fn two_malformed_statements_report_twice_and_nothing_executes() {
    let (output, reports, error) = run("1 +; print \"ok\"; 2 *;");

    // Both broken statements get their own report in a single pass, and the
    // well-formed statement between them must not run.
    assert_eq!(
        vec![
            "[line: 1]: Error at ';': Expect expression.".to_owned(),
            "[line: 1]: Error at ';': Expect expression.".to_owned(),
        ],
        reports
    );
    assert_eq!("", output);
    assert_eq!(None, error);
}

#[test]
fn a_chained_comparison_is_a_syntax_error_after_one_application() {
    let (output, reports, error) = run("print 1 < 2 < 3;");

    // `1 < 2` parses; the second `<` is never consumed by the comparison
    // level, so the statement fails at the missing semicolon.
    assert_eq!(
        vec!["[line: 1]: Error at '<': Expect ';' after a statement.".to_owned()],
        reports
    );
    assert_eq!("", output);
    assert_eq!(None, error);
}

#[test]
fn comments_are_ignored_by_execution() {
    let (output, reports, error) =
        run("// set things up\nvar a = 1;\nvar b = 2;\nprint a + b; // sum\n");

    assert!(reports.is_empty());
    assert_eq!(None, error);
    assert_eq!("3\n", output);
}

#[test]
fn a_scan_diagnostic_suppresses_execution() {
    let (output, reports, error) = run("print \"ok\"; @");

    assert_eq!(
        vec!["[line: 1]: Error: Unexpected character.".to_owned()],
        reports
    );
    assert_eq!("", output);
    assert_eq!(None, error);
}

#[test]
fn runtime_errors_carry_the_offending_line() {
    let (output, reports, error) = run("var a = 1;\nprint a + true;");

    assert!(reports.is_empty());
    assert_eq!("", output);

    let error = error.expect("number + bool must fail");
    assert_eq!("Unsupported binary operands.", error.to_string());
    assert_eq!(2, error.line());
}

#[test]
fn interpreter_state_persists_across_runs_like_a_repl() {
    let mut output = Vec::new();
    {
        let mut interpreter = Interpreter::with_output(&mut output);

        for line in &["var a = 1;", "a = a + 1;", "print a;"] {
            let mut diagnostics = Diagnostics::new();
            let tokens = Scanner::new((*line).to_owned()).scan_tokens(&mut diagnostics);
            let statements = Parser::new(tokens).parse_stmts(&mut diagnostics);
            assert!(!diagnostics.had_error());
            assert_eq!(Ok(()), interpreter.interpret(statements));
        }
    }

    assert_eq!("2\n", String::from_utf8(output).unwrap());
}

#[test]
fn assignment_in_a_block_updates_the_enclosing_binding() {
    let (output, reports, error) = run("var x = 1; { x = 2; print x; } print x;");

    assert!(reports.is_empty());
    assert_eq!(None, error);
    assert_eq!("2\n2\n", output);
}

#[test]
fn string_ordering_is_lexicographic() {
    let (output, reports, error) = run("print \"apple\" < \"banana\";");

    assert!(reports.is_empty());
    assert_eq!(None, error);
    assert_eq!("true\n", output);
}
