use std::env;
use std::error;
use std::fs;
use std::io::{self, stdin, BufRead, Write};
use std::process;
use std::result;

use program::perror;

use flint::core::{Diagnostics, Interpreter, Parser, Scanner};

type Error = Box<dyn error::Error>;
type Result<T> = result::Result<T, Error>;

// sysexits-style: compile-time and runtime diagnostics exit differently so
// callers can tell them apart.
const EXIT_COMPILE_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;

enum Outcome {
    Success,
    CompileError,
    RuntimeError,
}

/// One run of the pipeline over one chunk of source text.
///
/// Scanning and parsing share a diagnostics sink; any report suppresses
/// interpretation (the parsed statements are best-effort for reporting
/// only). A runtime error ends the run with line attribution.
fn run(source: String, interpreter: &mut Interpreter) -> Outcome {
    let scanner = Scanner::new(source);
    let mut diagnostics = Diagnostics::new();
    let tokens = scanner.scan_tokens(&mut diagnostics);

    let parser = Parser::new(tokens);
    let statements = parser.parse_stmts(&mut diagnostics);

    if diagnostics.had_error() {
        for report in diagnostics.reports() {
            println!("{}", report);
        }

        return Outcome::CompileError;
    }

    if let Err(e) = interpreter.interpret(statements) {
        println!("{}\n[line {}]", e, e.line());
        return Outcome::RuntimeError;
    }

    Outcome::Success
}

fn run_prompt() -> Result<()> {
    let stdin = stdin();
    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut buf = String::with_capacity(1024);
        if stdin.lock().read_line(&mut buf)? == 0 {
            break;
        }
        if buf.trim().is_empty() {
            break;
        }

        // A fresh Diagnostics per line: one broken line never poisons the
        // next, while interpreter state carries across the session.
        run(buf, &mut interpreter);
    }

    println!("Exiting...");
    Ok(())
}

fn run_file(f: Option<&String>) -> Result<()> {
    let path = f.ok_or("no script path given")?;
    let source = fs::read_to_string(path)?;
    let mut interpreter = Interpreter::new();

    match run(source, &mut interpreter) {
        Outcome::CompileError => process::exit(EXIT_COMPILE_ERROR),
        Outcome::RuntimeError => process::exit(EXIT_RUNTIME_ERROR),
        Outcome::Success => Ok(()),
    }
}

fn fail_if_err(r: Result<()>) {
    if let Err(e) = r {
        perror(e)
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => fail_if_err(run_prompt()),
        2 => fail_if_err(run_file(args.get(1))),
        _ => perror("usage: flint [script]".to_owned()),
    }
}
