use std::ops;
use std::result;

use thiserror::Error;

mod display;
mod environment;
mod interpreter;
mod parser;
mod scanner;

pub type Environment = environment::Environment;
pub type Parser = parser::Parser;
pub type Result<T> = result::Result<T, FlintError>;
pub type Scanner = scanner::Scanner;

pub use interpreter::Interpreter;

/// Every way a flint program can fail after scanning.
///
/// Parse failures (`UnexpectedToken`, `ExpectedExpression`,
/// `InvalidAssignment`) never escape `Parser::parse_stmts`; they are reported
/// into a [`Diagnostics`] sink and the parser resynchronizes. The runtime
/// variants unwind out of `Interpreter::interpret` and end the run.
///
/// Each variant carries the token it tripped on so the shell can attribute a
/// line number without the error growing richer structure than line +
/// message.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FlintError {
    /// The grammar required a specific token and found something else. The
    /// message is the "Expect ..." phrase for the production that failed.
    #[error("{message}")]
    UnexpectedToken { token: Token, message: &'static str },
    /// The expression grammar bottomed out on a token that cannot start a
    /// primary.
    #[error("Expect expression.")]
    ExpectedExpression(Token),
    /// The left side of an `=` did not resolve to a variable reference.
    /// Carries the `=` token.
    #[error("Invalid assignment target.")]
    InvalidAssignment(Token),
    /// A name lookup or assignment walked the whole scope chain and found no
    /// binding.
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(Token),
    /// A unary operator was applied to an operand type it is not defined
    /// for. Carries the operator token.
    #[error("Unsupported unary operands.")]
    UnsupportedUnary(Token),
    /// A binary operator was applied to an operand pairing it is not defined
    /// for. Carries the operator token.
    #[error("Unsupported binary operands.")]
    UnsupportedBinary(Token),
}

impl FlintError {
    /// The token this error is attributed to.
    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::UnexpectedToken { token, .. }
            | Self::ExpectedExpression(token)
            | Self::InvalidAssignment(token)
            | Self::UndefinedVariable(token)
            | Self::UnsupportedUnary(token)
            | Self::UnsupportedBinary(token) => token,
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.token().line
    }
}

/// A single compile-time report: a 1-based source line, a location phrase
/// (empty for scan errors, ` at 'lexeme'` or ` at end` for parse errors),
/// and a message.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    line: usize,
    location: String,
    message: String,
}

/// Collector for one run's scan and parse reports.
///
/// Both stages keep going after a failure, so one run accumulates every
/// compile-time problem it can find. Interpretation must be skipped whenever
/// `had_error` is set. A fresh collector per run means independent runs (a
/// REPL line, a test) can never leak state into each other.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scanner report at `line`.
    pub fn error(&mut self, line: usize, message: &str) {
        self.reports.push(Diagnostic {
            line,
            location: String::new(),
            message: message.to_owned(),
        });
    }

    /// Records a parse failure, deriving the location phrase from the token
    /// the parser stopped on.
    pub fn parse_error(&mut self, error: &FlintError) {
        let token = error.token();
        let location = if let TokenType::Eof = token.token_type {
            " at end".to_owned()
        } else {
            format!(" at '{}'", token.token_type)
        };

        self.reports.push(Diagnostic {
            line: token.line,
            location,
            message: error.to_string(),
        });
    }

    #[must_use]
    pub fn had_error(&self) -> bool {
        !self.reports.is_empty()
    }

    pub fn reports(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter()
    }
}

/// The kind of a scanned token, with literal payloads embedded.
///
/// The scanner recognizes the full keyword set even though the grammar only
/// reaches `var` and `print`; the rest (`class`, `if`, `while`, ...) are
/// reserved words the parser uses as resynchronization boundaries.
///
/// Kind matching in the parser goes through `mem::discriminant`, so two
/// literal-carrying tokens of the same kind match regardless of payload;
/// payloads are read back out only when building a literal or variable node.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Comment,
    Identifier(String),
    Number(f64),
    String(String),

    // Keywords
    And,
    Class,
    Else,
    False,
    Fn,
    For,
    If,
    Null,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Eof,
}

impl TokenType {
    /// Classifies a scanned word against the keyword set; anything that is
    /// not an exact keyword match is an identifier carrying its name.
    #[must_use]
    pub fn identifier_from_str(word: &str) -> TokenType {
        match word {
            "and" => TokenType::And,
            "class" => TokenType::Class,
            "else" => TokenType::Else,
            "false" => TokenType::False,
            "fn" => TokenType::Fn,
            "for" => TokenType::For,
            "if" => TokenType::If,
            "null" => TokenType::Null,
            "or" => TokenType::Or,
            "print" => TokenType::Print,
            "return" => TokenType::Return,
            "super" => TokenType::Super,
            "this" => TokenType::This,
            "true" => TokenType::True,
            "var" => TokenType::Var,
            "while" => TokenType::While,
            _ => TokenType::Identifier(word.to_owned()),
        }
    }
}

/// One lexical unit: a kind (with any literal payload) and the 1-based line
/// it ended on. The textual form of a token is recovered from its kind, so
/// there is no separate lexeme field to keep in sync.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    token_type: TokenType,
    line: usize,
}

impl Token {
    #[must_use]
    pub fn new(token_type: TokenType, line: usize) -> Self {
        Token { token_type, line }
    }
}

/// A flint runtime value.
///
/// flint is dynamically typed over a fixed domain: strings, IEEE doubles,
/// booleans, and `null`. The derived `PartialEq` is the language's equality:
/// same-variant comparison by underlying value, `null == null`, and every
/// cross-variant pairing false.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// Operator support lives on `Value` and is partial: each operator is
/// defined for the operand pairings below and yields `None` — the "no
/// result" marker — for everything else. The interpreter is responsible for
/// turning `None` into a runtime error; it must never leak into a program as
/// a value.
impl Value {
    /// `<` is defined for two numbers and two strings (lexicographic).
    #[must_use]
    pub fn less(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Bool(l < r)),
            (Value::String(l), Value::String(r)) => Some(Value::Bool(l < r)),
            _ => None,
        }
    }

    #[must_use]
    pub fn less_equal(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Bool(l <= r)),
            (Value::String(l), Value::String(r)) => Some(Value::Bool(l <= r)),
            _ => None,
        }
    }

    #[must_use]
    pub fn greater(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Bool(l > r)),
            (Value::String(l), Value::String(r)) => Some(Value::Bool(l > r)),
            _ => None,
        }
    }

    #[must_use]
    pub fn greater_equal(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Bool(l >= r)),
            (Value::String(l), Value::String(r)) => Some(Value::Bool(l >= r)),
            _ => None,
        }
    }
}

impl ops::Add for &Value {
    type Output = Option<Value>;

    /// `+` adds two numbers or concatenates two strings.
    fn add(self, other: Self) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => {
                let mut buffer = String::with_capacity(l.len() + r.len());
                buffer.push_str(l);
                buffer.push_str(r);
                Some(Value::String(buffer))
            }
            _ => None,
        }
    }
}

impl ops::Sub for &Value {
    type Output = Option<Value>;

    fn sub(self, other: Self) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Number(l - r)),
            _ => None,
        }
    }
}

impl ops::Mul for &Value {
    type Output = Option<Value>;

    fn mul(self, other: Self) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Number(l * r)),
            _ => None,
        }
    }
}

impl ops::Div for &Value {
    type Output = Option<Value>;

    fn div(self, other: Self) -> Option<Value> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => Some(Value::Number(l / r)),
            _ => None,
        }
    }
}

impl ops::Neg for &Value {
    type Output = Option<Value>;

    /// Numeric negation; defined for numbers only.
    fn neg(self) -> Option<Value> {
        match self {
            Value::Number(n) => Some(Value::Number(-n)),
            _ => None,
        }
    }
}

impl ops::Not for &Value {
    type Output = Option<Value>;

    /// Logical not; defined for booleans only.
    fn not(self) -> Option<Value> {
        match self {
            Value::Bool(b) => Some(Value::Bool(!b)),
            _ => None,
        }
    }
}

/// An expression node. Built bottom-up by the parser, owned top-down, never
/// mutated afterwards.
///
/// Operations over the tree are exhaustive `match`es with no wildcard arm:
/// adding a variant is a compile-time break for every operation, which is
/// the property the classic visitor pattern exists to provide.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Assign(Token, Box<Expr>),
    Binary(Box<Expr>, Token, Box<Expr>),
    Grouping(Box<Expr>),
    Literal(Value),
    Unary(Token, Box<Expr>),
    Variable(Token),
}

/// A statement node. Same ownership and exhaustiveness discipline as
/// [`Expr`].
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Expression(Expr),
    Print(Expr),
    Variable(Token, Option<Expr>),
}
