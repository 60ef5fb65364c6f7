use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::debug;

use super::{Environment, Expr, FlintError, Result, Stmt, TokenType, Value};

/// Tree-walking evaluator.
///
/// An `Interpreter` owns the root scope for its whole lifetime, so
/// successive `interpret` calls (a REPL session) accumulate state. It also
/// owns the sink `print` writes to: stdout in the shell, a byte buffer in
/// tests.
pub struct Interpreter<W = io::Stdout> {
    environment: Rc<RefCell<Environment>>,
    output: W,
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Interpreter::with_output(io::stdout())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Interpreter {
            environment: Rc::new(RefCell::new(Environment::new())),
            output,
        }
    }

    /// Executes `statements` in order against the interpreter's scope chain.
    ///
    /// # Errors
    /// The first runtime error halts execution of the remaining statements
    /// and becomes the call's result; earlier statements' side effects
    /// stand.
    pub fn interpret(&mut self, statements: Vec<Stmt>) -> Result<()> {
        debug!("interpreting {} statements", statements.len());

        for statement in statements {
            self.execute(&statement)?;
        }

        Ok(())
    }

    fn execute(&mut self, statement: &Stmt) -> Result<()> {
        match statement {
            Stmt::Block(statements) => self.execute_block(statements)?,
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value).expect("output sink write failed");
            }
            Stmt::Variable(name, initializer) => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };

                self.environment
                    .borrow_mut()
                    .define(name.token_type.to_string(), value);
            }
        }

        Ok(())
    }

    /// Runs a block's statements against one fresh child scope, restoring
    /// the previous scope on every exit path before any failure propagates.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<()> {
        let previous = Rc::clone(&self.environment);
        self.environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &previous,
        ))));

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary(operator, right) => {
                let right = self.evaluate(right)?;

                let value = match operator.token_type {
                    TokenType::Minus => -&right,
                    TokenType::Bang => !&right,
                    _ => None,
                };

                value.ok_or_else(|| FlintError::UnsupportedUnary(operator.clone()))
            }
            Expr::Binary(left, operator, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                let value = match operator.token_type {
                    TokenType::Minus => &left - &right,
                    TokenType::Plus => &left + &right,
                    TokenType::Star => &left * &right,
                    TokenType::Slash => &left / &right,
                    TokenType::Greater => left.greater(&right),
                    TokenType::GreaterEqual => left.greater_equal(&right),
                    TokenType::Less => left.less(&right),
                    TokenType::LessEqual => left.less_equal(&right),
                    TokenType::EqualEqual => Some(Value::Bool(left == right)),
                    TokenType::BangEqual => Some(Value::Bool(left != right)),
                    _ => None,
                };

                value.ok_or_else(|| FlintError::UnsupportedBinary(operator.clone()))
            }
            Expr::Variable(name) => self.environment.borrow().get(name),
            Expr::Assign(name, value) => {
                let value = self.evaluate(value)?;
                self.environment.borrow_mut().assign(name, value)
            }
        }
    }
}
