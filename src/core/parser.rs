use std::cell::Cell;
use std::mem::discriminant;

use log::debug;

use super::{Diagnostics, Expr, FlintError, Result, Stmt, Token, TokenType, Value};

/// Parses a series of Tokens into an abstract syntax tree.
///
/// ## Statement grammar
/// ```notrust
/// program     → declaration* EOF ;
/// declaration → "var" IDENTIFIER ( "=" expression )? ";"
///             | statement ;
/// statement   → "print" expression ";"
///             | "{" declaration* "}"
///             | expression ";" ;
/// ```
/// A `comment` token at declaration level is filtered out, not an error.
///
/// ## Expression grammar
/// ```notrust
/// expression  → assignment ;
/// assignment  → equality ( "=" assignment )? ;
/// equality    → comparison ( ( "!=" | "==" ) comparison )? ;
/// comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )? ;
/// term        → factor ( ( "-" | "+" ) factor )? ;
/// factor      → unary ( ( "/" | "*" ) unary )? ;
/// unary       → ( "!" | "-" ) unary
///             | primary ;
/// primary     → "true" | "false" | "null"
///             | NUMBER | STRING | IDENTIFIER | "(" expression ")" ;
/// ```
///
/// Note the `?` (not `*`) at the four binary levels: each binds exactly one
/// trailing operator application before handing control back up, so
/// `1 < 2 < 3` parses `(1 < 2)` and leaves `< 3` unconsumed. That is the
/// accepted language, pinned by tests; a conventional left-associative loop
/// would accept strictly more programs.
pub struct Parser {
    tokens: Vec<Token>,
    /// cursor is an implementation detail end users shouldn't worry about.
    /// Use interior mutability here to avoid forcing the user to hold a
    /// mutable Parser.
    cursor: Cell<usize>,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            cursor: Cell::new(0),
        }
    }

    /// Parses the full token stream into a statement list.
    ///
    /// Never raises past this boundary: each malformed statement is reported
    /// into `diagnostics`, dropped, and parsing resumes at the next
    /// statement boundary, so one pass surfaces every syntax problem it can
    /// find. A non-empty `diagnostics` means the returned statements are a
    /// best-effort list for reporting only and must not be executed.
    pub fn parse_stmts(&self, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(statement) = self.declaration(diagnostics) {
                statements.push(statement);
            }
        }

        debug!("parsed {} statements", statements.len());
        statements
    }

    /// The per-statement recovery boundary, at the top level and inside
    /// blocks alike: a failure here is reported, the stream resynchronized,
    /// and the broken statement omitted.
    fn declaration(&self, diagnostics: &mut Diagnostics) -> Option<Stmt> {
        if self.match_token(&TokenType::Comment) {
            return None;
        }

        let result = if self.match_token(&TokenType::Var) {
            self.var_declaration()
        } else {
            self.statement(diagnostics)
        };

        match result {
            Ok(statement) => Some(statement),
            Err(e) => {
                diagnostics.parse_error(&e);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&self) -> Result<Stmt> {
        let name = self.consume(&TokenType::Identifier(String::new()), "Expect variable name")?;

        let initializer = if self.match_token(&TokenType::Equal) {
            Some(*self.expression()?)
        } else {
            None
        };

        self.consume(&TokenType::Semicolon, "Expect ';' after a statement.")?;
        Ok(Stmt::Variable(name, initializer))
    }

    fn statement(&self, diagnostics: &mut Diagnostics) -> Result<Stmt> {
        if self.match_token(&TokenType::Print) {
            self.print_statement()
        } else if self.match_token(&TokenType::LeftBrace) {
            Ok(Stmt::Block(self.block(diagnostics)?))
        } else {
            self.expression_statement()
        }
    }

    fn block(&self, diagnostics: &mut Diagnostics) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration(diagnostics) {
                statements.push(statement);
            }
        }

        self.consume(&TokenType::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn print_statement(&self) -> Result<Stmt> {
        let value = self.expression()?;
        self.consume(&TokenType::Semicolon, "Expect ';' after a statement.")?;
        Ok(Stmt::Print(*value))
    }

    fn expression_statement(&self) -> Result<Stmt> {
        let value = self.expression()?;
        self.consume(&TokenType::Semicolon, "Expect ';' after a statement.")?;
        Ok(Stmt::Expression(*value))
    }

    /// Advances to the next statement boundary after a parse failure: one
    /// token unconditionally, then until the previous token was a `;` or
    /// the next token starts a new statement. Bounds the cascade to roughly
    /// one report per broken statement.
    fn synchronize(&self) {
        self.advance();

        while !self.is_at_end() {
            if let TokenType::Semicolon = self.previous().token_type {
                return;
            }

            if let Some(token) = self.peek() {
                match token.token_type {
                    TokenType::Class
                    | TokenType::Fn
                    | TokenType::Var
                    | TokenType::For
                    | TokenType::If
                    | TokenType::While
                    | TokenType::Print
                    | TokenType::Return => return,
                    _ => {}
                }
            }

            self.advance();
        }
    }

    /// Parses a single expression from the stream.
    pub fn parse(&self) -> Result<Box<Expr>> {
        self.expression()
    }

    fn expression(&self) -> Result<Box<Expr>> {
        self.assignment()
    }

    fn assignment(&self) -> Result<Box<Expr>> {
        let expr = self.equality()?;

        if self.match_token(&TokenType::Equal) {
            let equal = self.previous();
            let value = self.assignment()?;

            return match *expr {
                Expr::Variable(name) => Ok(Box::new(Expr::Assign(name, value))),
                _ => Err(FlintError::InvalidAssignment(equal)),
            };
        }

        Ok(expr)
    }

    fn equality(&self) -> Result<Box<Expr>> {
        let mut expr = self.comparison()?;

        // Each binary level binds a single trailing application; see the
        // grammar note on the type.
        if self.match_tokens(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator = self.previous();
            let right = self.comparison()?;

            expr = Box::new(Expr::Binary(expr, operator, right));
        }

        Ok(expr)
    }

    fn comparison(&self) -> Result<Box<Expr>> {
        let mut expr = self.term()?;

        if self.match_tokens(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator = self.previous();
            let right = self.term()?;

            expr = Box::new(Expr::Binary(expr, operator, right));
        }

        Ok(expr)
    }

    fn term(&self) -> Result<Box<Expr>> {
        let mut expr = self.factor()?;

        if self.match_tokens(&[TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous();
            let right = self.factor()?;

            expr = Box::new(Expr::Binary(expr, operator, right));
        }

        Ok(expr)
    }

    fn factor(&self) -> Result<Box<Expr>> {
        let mut expr = self.unary()?;

        if self.match_tokens(&[TokenType::Slash, TokenType::Star]) {
            let operator = self.previous();
            let right = self.unary()?;

            expr = Box::new(Expr::Binary(expr, operator, right));
        }

        Ok(expr)
    }

    fn unary(&self) -> Result<Box<Expr>> {
        if self.match_tokens(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;

            return Ok(Box::new(Expr::Unary(operator, right)));
        }

        self.primary()
    }

    fn primary(&self) -> Result<Box<Expr>> {
        if self.match_token(&TokenType::True) {
            return Ok(Box::new(Expr::Literal(Value::Bool(true))));
        }
        if self.match_token(&TokenType::False) {
            return Ok(Box::new(Expr::Literal(Value::Bool(false))));
        }
        if self.match_token(&TokenType::Null) {
            return Ok(Box::new(Expr::Literal(Value::Null)));
        }

        // Literal kinds are matched with payload-blind sentinels; the real
        // payload is read back out of the consumed token.
        if self.match_tokens(&[TokenType::Number(0.0), TokenType::String(String::new())]) {
            let previous = self.previous();
            let value = match previous.token_type {
                TokenType::Number(n) => Value::Number(n),
                TokenType::String(s) => Value::String(s),
                _ => unreachable!(),
            };

            return Ok(Box::new(Expr::Literal(value)));
        }

        if self.match_token(&TokenType::Identifier(String::new())) {
            return Ok(Box::new(Expr::Variable(self.previous())));
        }

        if self.match_token(&TokenType::LeftParen) {
            let expr = self.expression()?;
            self.consume(
                &TokenType::RightParen,
                "Expect a ')' token after expression.",
            )?;
            return Ok(Box::new(Expr::Grouping(expr)));
        }

        Err(FlintError::ExpectedExpression(self.next_token()))
    }

    fn consume(&self, expected: &TokenType, message: &'static str) -> Result<Token> {
        if self.check(expected) {
            // We just validated the next token. It must exist.
            return Ok(self.advance());
        }

        Err(FlintError::UnexpectedToken {
            token: self.next_token(),
            message,
        })
    }

    fn match_token(&self, token_type: &TokenType) -> bool {
        if !self.check(token_type) {
            return false;
        }

        self.advance();
        true
    }

    fn match_tokens(&self, token_types: &[TokenType]) -> bool {
        token_types.iter().any(|t| self.match_token(t))
    }

    /// Kind-only comparison: two literal-carrying tokens of the same kind
    /// check equal regardless of payload.
    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().map_or(false, |t| {
            discriminant(&t.token_type) == discriminant(token_type)
        })
    }

    fn is_at_end(&self) -> bool {
        self.peek().map_or(true, |t| t.token_type == TokenType::Eof)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor.get())
    }

    /// The token the cursor rests on. The scanner terminates every stream
    /// with `Eof` and the cursor clamps there, so the index is always valid.
    fn next_token(&self) -> Token {
        self.tokens[self.cursor.get()].clone()
    }

    fn previous(&self) -> Token {
        assert!(self.cursor.get() > 0);
        self.tokens[self.cursor.get() - 1].clone()
    }

    fn advance(&self) -> Token {
        if !self.is_at_end() {
            let old = self.cursor.get();
            self.cursor.replace(old + 1);
        }

        self.previous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Scanner;

    fn parser_for(source: &str) -> Parser {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source.to_owned()).scan_tokens(&mut diagnostics);
        assert!(!diagnostics.had_error());
        Parser::new(tokens)
    }

    fn number(n: f64) -> Expr {
        Expr::Literal(Value::Number(n))
    }

    #[test]
    fn it_can_advance_over_token_iterator() {
        let parser = parser_for("var breakfast;");

        assert_eq!(Token::new(TokenType::Var, 1), parser.advance());
        assert_eq!(
            Token::new(TokenType::Identifier(String::from("breakfast")), 1),
            parser.advance()
        );
        assert_eq!(Token::new(TokenType::Semicolon, 1), parser.advance());

        // the cursor clamps at the trailing Eof
        assert_eq!(Token::new(TokenType::Semicolon, 1), parser.advance());
    }

    #[test]
    fn token_kind_matching_ignores_literal_payloads() {
        let parser = parser_for("breakfast");

        assert!(parser.check(&TokenType::Identifier(String::from("lunch"))));
        assert!(parser.check(&TokenType::Identifier(String::new())));
        assert!(!parser.check(&TokenType::Number(0.0)));

        let parser = parser_for("42");
        assert!(parser.check(&TokenType::Number(7.0)));
    }

    #[test]
    fn it_can_parse_a_float() {
        let parser = parser_for("1");
        assert_eq!(number(1.0), *parser.parse().unwrap());
    }

    #[test]
    fn it_can_parse_a_bool() {
        let parser = parser_for("true");
        assert_eq!(Expr::Literal(Value::Bool(true)), *parser.parse().unwrap());
    }

    #[test]
    fn it_can_parse_null() {
        let parser = parser_for("null");
        assert_eq!(Expr::Literal(Value::Null), *parser.parse().unwrap());
    }

    #[test]
    fn it_can_parse_a_unary_expression() {
        let parser = parser_for("-1");
        assert_eq!(
            Expr::Unary(Token::new(TokenType::Minus, 1), Box::new(number(1.0))),
            *parser.parse().unwrap()
        );
    }

    #[test]
    fn it_can_parse_a_binary_expression() {
        let parser = parser_for("1 + 2");
        assert_eq!(
            Expr::Binary(
                Box::new(number(1.0)),
                Token::new(TokenType::Plus, 1),
                Box::new(number(2.0))
            ),
            *parser.parse().unwrap()
        );
    }

    #[test]
    fn it_can_parse_a_grouping_expression() {
        let parser = parser_for("(1)");
        assert_eq!(
            Expr::Grouping(Box::new(number(1.0))),
            *parser.parse().unwrap()
        );
    }

    #[test]
    fn it_can_parse_a_compound_expression() {
        let parser = parser_for("(1 + 2) * 3");

        let add_expr = Expr::Grouping(Box::new(Expr::Binary(
            Box::new(number(1.0)),
            Token::new(TokenType::Plus, 1),
            Box::new(number(2.0)),
        )));

        let expected = Expr::Binary(
            Box::new(add_expr),
            Token::new(TokenType::Star, 1),
            Box::new(number(3.0)),
        );

        assert_eq!(expected, *parser.parse().unwrap());
    }

    #[test]
    fn comparison_binds_a_single_application() {
        let parser = parser_for("1 < 2 < 3");

        // `(1 < 2)` parses; the second `<` is left dangling in the stream.
        assert_eq!(
            Expr::Binary(
                Box::new(number(1.0)),
                Token::new(TokenType::Less, 1),
                Box::new(number(2.0))
            ),
            *parser.parse().unwrap()
        );
        assert!(parser.match_token(&TokenType::Less));
    }

    #[test]
    fn term_binds_a_single_application() {
        let parser = parser_for("1 + 2 + 3");

        assert_eq!(
            Expr::Binary(
                Box::new(number(1.0)),
                Token::new(TokenType::Plus, 1),
                Box::new(number(2.0))
            ),
            *parser.parse().unwrap()
        );
        assert!(parser.match_token(&TokenType::Plus));
    }

    #[test]
    fn a_dangling_comparison_fails_the_statement() {
        let parser = parser_for("print 1 < 2 < 3;");
        let mut diagnostics = Diagnostics::new();

        let statements = parser.parse_stmts(&mut diagnostics);
        assert!(statements.is_empty());

        let rendered: Vec<String> = diagnostics.reports().map(ToString::to_string).collect();
        assert_eq!(
            vec!["[line: 1]: Error at '<': Expect ';' after a statement.".to_owned()],
            rendered
        );
    }

    #[test]
    fn it_detects_unclosed_parenthesis() {
        let parser = parser_for("(1");
        assert_eq!(
            Err(FlintError::UnexpectedToken {
                token: Token::new(TokenType::Eof, 1),
                message: "Expect a ')' token after expression.",
            }),
            parser.parse()
        );
    }

    #[test]
    fn it_can_parse_an_assignment_expression() {
        let parser = parser_for("a = 2");
        assert_eq!(
            Expr::Assign(
                Token::new(TokenType::Identifier(String::from("a")), 1),
                Box::new(number(2.0))
            ),
            *parser.parse().unwrap()
        );
    }

    #[test]
    fn assignment_requires_a_variable_target() {
        let parser = parser_for("1 = 2");
        assert_eq!(
            Err(FlintError::InvalidAssignment(Token::new(
                TokenType::Equal,
                1
            ))),
            parser.parse()
        );
    }

    #[test]
    fn it_can_parse_a_var_declaration() {
        let parser = parser_for("var a = true;");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            vec![Stmt::Variable(
                Token::new(TokenType::Identifier(String::from("a")), 1),
                Some(Expr::Literal(Value::Bool(true)))
            )],
            parser.parse_stmts(&mut diagnostics)
        );
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn a_var_declaration_may_omit_its_initializer() {
        let parser = parser_for("var a;");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            vec![Stmt::Variable(
                Token::new(TokenType::Identifier(String::from("a")), 1),
                None
            )],
            parser.parse_stmts(&mut diagnostics)
        );
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn it_can_parse_a_block() {
        let parser = parser_for("{ print \"hello\"; }");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            vec![Stmt::Block(vec![Stmt::Print(Expr::Literal(Value::String(
                String::from("hello")
            )))])],
            parser.parse_stmts(&mut diagnostics)
        );
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn it_can_parse_a_nested_block() {
        let parser = parser_for("{ { print \"hello\"; } }");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            vec![Stmt::Block(vec![Stmt::Block(vec![Stmt::Print(
                Expr::Literal(Value::String(String::from("hello")))
            )])])],
            parser.parse_stmts(&mut diagnostics)
        );
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn comments_are_filtered_at_declaration_level() {
        let parser = parser_for("// opening remark\nprint 1;\n{ // inner remark\n}");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            vec![Stmt::Print(number(1.0)), Stmt::Block(Vec::new())],
            parser.parse_stmts(&mut diagnostics)
        );
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn it_recovers_at_statement_boundaries() {
        let parser = parser_for("var = 1; print 2;");
        let mut diagnostics = Diagnostics::new();

        // The broken declaration is dropped; the statement after the ';' is
        // still parsed.
        assert_eq!(
            vec![Stmt::Print(number(2.0))],
            parser.parse_stmts(&mut diagnostics)
        );

        let rendered: Vec<String> = diagnostics.reports().map(ToString::to_string).collect();
        assert_eq!(
            vec!["[line: 1]: Error at '=': Expect variable name".to_owned()],
            rendered
        );
    }

    #[test]
    fn two_malformed_statements_yield_two_reports() {
        let parser = parser_for("1 +; 2 *;");
        let mut diagnostics = Diagnostics::new();

        assert!(parser.parse_stmts(&mut diagnostics).is_empty());

        let rendered: Vec<String> = diagnostics.reports().map(ToString::to_string).collect();
        assert_eq!(
            vec![
                "[line: 1]: Error at ';': Expect expression.".to_owned(),
                "[line: 1]: Error at ';': Expect expression.".to_owned(),
            ],
            rendered
        );
    }

    #[test]
    fn a_failure_inside_a_block_does_not_abort_the_block() {
        let parser = parser_for("{ 1 +; print 2; }");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            vec![Stmt::Block(vec![Stmt::Print(number(2.0))])],
            parser.parse_stmts(&mut diagnostics)
        );
        assert!(diagnostics.had_error());
    }

    #[test]
    fn a_missing_semicolon_at_end_reports_at_end() {
        let parser = parser_for("print 1");
        let mut diagnostics = Diagnostics::new();

        assert!(parser.parse_stmts(&mut diagnostics).is_empty());

        let rendered: Vec<String> = diagnostics.reports().map(ToString::to_string).collect();
        assert_eq!(
            vec!["[line: 1]: Error at end: Expect ';' after a statement.".to_owned()],
            rendered
        );
    }
}
