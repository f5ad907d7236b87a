use crate::ast::{BinaryOp, Expr, LogicalOp, PostfixOp, Program, Stmt, UnaryOp, VarDecl};
use crate::error::{BisayaError, Span};
use crate::lexer::{Token, TokenType};
use crate::value::{DeclaredType, Value};
use tracing::debug;

pub const MISSING_START: &str = "Expected SUGOD at the start of the program";
pub const MISSING_END: &str = "Expected KATAPUSAN at the end of the program";

type ParseResult<T> = Result<T, BisayaError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<BisayaError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses a whole program. Returns every statement that parsed cleanly
    /// together with all diagnostics collected along the way.
    pub fn parse(&mut self) -> (Program, Vec<BisayaError>) {
        if !self.match_types(&[TokenType::Start]) {
            let span = self.error_span();
            let line = self.peek().line;
            self.errors.push(BisayaError::parse_error_with_help(
                span,
                line,
                MISSING_START.to_string(),
                "Every program is enclosed in SUGOD ... KATAPUSAN.".to_string(),
            ));
        }

        let mut statements = Vec::new();

        while !self.check(&TokenType::End) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        if self.match_types(&[TokenType::End]) {
            if !self.is_at_end() {
                let token = self.peek().clone();
                self.errors.push(BisayaError::parse_error(
                    token.span,
                    token.line,
                    format!("Unexpected '{}' after KATAPUSAN", token.lexeme),
                ));
            }
        } else {
            let span = self.error_span();
            let line = self.peek().line;
            self.errors.push(BisayaError::parse_error_with_help(
                span,
                line,
                MISSING_END.to_string(),
                "Every program is enclosed in SUGOD ... KATAPUSAN.".to_string(),
            ));
        }

        debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );

        (Program { statements }, std::mem::take(&mut self.errors))
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_types(&[TokenType::Declare]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let start_span = self.previous().span.start;
        let declared_type = self.declared_type()?;

        let first = self.declarator(declared_type)?;
        let mut rest = Vec::new();
        while self.match_types(&[TokenType::Comma]) {
            rest.push(self.declarator(declared_type)?);
        }

        if rest.is_empty() {
            return Ok(Stmt::Var(first));
        }

        rest.insert(0, first);
        Ok(Stmt::MultiVar {
            declarations: rest,
            span: Span::new(start_span, self.previous().span.end),
        })
    }

    fn declared_type(&mut self) -> ParseResult<DeclaredType> {
        let declared_type = match self.peek().token_type {
            TokenType::IntType => DeclaredType::Integer,
            TokenType::FloatType => DeclaredType::Float,
            TokenType::CharType => DeclaredType::Char,
            TokenType::BoolType => DeclaredType::Bool,
            TokenType::TextType => DeclaredType::Text,
            _ => {
                let token = self.peek();
                return Err(BisayaError::parse_error_with_help(
                    self.error_span(),
                    token.line,
                    format!("Expected a type after MUGNA, found '{}'", token.lexeme),
                    "Declarations name their type first: MUGNA NUMERO x = 5. Types are NUMERO, TIPIK, LETRA, TINUOD and PULONG.".to_string(),
                ));
            }
        };
        self.advance();
        Ok(declared_type)
    }

    fn declarator(&mut self, declared_type: DeclaredType) -> ParseResult<VarDecl> {
        let name_token = self
            .consume_with_help(
                TokenType::Identifier,
                "Expected variable name",
                "Each declared name must be an identifier: MUGNA NUMERO x, y = 2".to_string(),
            )?
            .clone();

        let initializer = if self.match_types(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(VarDecl {
            name: name_token.lexeme,
            declared_type,
            initializer,
            span: Span::new(name_token.span.start, self.previous().span.end),
            line: name_token.line,
        })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_types(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_types(&[TokenType::Input]) {
            self.input_statement()
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_types(&[TokenType::Block]) {
            let start_span = self.previous().span.start;
            self.consume(TokenType::LeftBrace, "Expected '{' after PUNDOK")?;
            self.block_statement(start_span)
        } else if self.match_types(&[TokenType::LeftBrace]) {
            let start_span = self.previous().span.start;
            self.block_statement(start_span)
        } else {
            self.expression_statement()
        }
    }

    fn block_statement(&mut self, start_span: usize) -> ParseResult<Stmt> {
        let statements = self.block()?;
        Ok(Stmt::Block {
            statements,
            span: Span::new(start_span, self.previous().span.end),
        })
    }

    /// Parses declarations up to and including the closing '}'.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace)
            && !self.check(&TokenType::End)
            && !self.is_at_end()
        {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok(statements)
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        self.match_types(&[TokenType::Colon]);

        let expr = self.expression()?;
        let end_span = expr.span().end;

        Ok(Stmt::Print {
            expr,
            span: Span::new(keyword.span.start, end_span),
            line: keyword.line,
        })
    }

    fn input_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        self.match_types(&[TokenType::Colon]);

        let mut targets = Vec::new();
        loop {
            let name = self.consume_with_help(
                TokenType::Identifier,
                "Expected variable name after DAWAT",
                "DAWAT reads into declared variables: DAWAT: x, y".to_string(),
            )?;
            targets.push(name.lexeme.clone());

            if !self.match_types(&[TokenType::Comma]) {
                break;
            }
        }

        Ok(Stmt::Input {
            targets,
            span: Span::new(keyword.span.start, self.previous().span.end),
            line: keyword.line,
        })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let start_span = self.previous().span.start;

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after KUNG",
            "Conditions are written in parentheses: KUNG (x > 0) PUNDOK { ... }".to_string(),
        )?;
        let condition = self.expression()?;
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after KUNG condition",
            "Conditions are written in parentheses: KUNG (x > 0) PUNDOK { ... }".to_string(),
        )?;

        let then_branch = Box::new(self.branch_block()?);

        let else_branch = if self.match_types(&[TokenType::ElseIf]) {
            Some(Box::new(self.if_statement()?))
        } else if self.match_types(&[TokenType::Else]) {
            Some(Box::new(self.branch_block()?))
        } else {
            None
        };

        let end_span = match else_branch {
            Some(ref else_stmt) => else_stmt.span().end,
            None => then_branch.span().end,
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start_span, end_span),
        })
    }

    /// Every branch of a KUNG must be introduced by PUNDOK.
    fn branch_block(&mut self) -> ParseResult<Stmt> {
        let start_span = self
            .consume_with_help(
                TokenType::Block,
                "Expected PUNDOK before the branch body",
                "Each branch is written as PUNDOK { ... }".to_string(),
            )?
            .span
            .start;
        self.consume_with_help(
            TokenType::LeftBrace,
            "Expected '{' after PUNDOK",
            "Each branch is written as PUNDOK { ... }".to_string(),
        )?;
        self.block_statement(start_span)
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let start_span = self.previous().span.start;

        self.consume(TokenType::LeftParen, "Expected '(' after SAMTANG")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after SAMTANG condition")?;

        let body = Box::new(self.statement()?);
        let end_span = body.span().end;

        Ok(Stmt::While {
            condition,
            body,
            span: Span::new(start_span, end_span),
        })
    }

    /// `ALANG SA (init, cond, step) body` becomes
    /// `{ init; SAMTANG (cond) { body; step } }`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let start_span = self.previous().span.start;

        self.consume(TokenType::LeftParen, "Expected '(' after ALANG SA")?;

        let initializer = if self.check(&TokenType::Comma) {
            None
        } else if self.match_types(&[TokenType::Declare]) {
            let declared_type = self.declared_type()?;
            Some(Stmt::Var(self.declarator(declared_type)?))
        } else {
            Some(self.expression_statement()?)
        };
        self.consume(TokenType::Comma, "Expected ',' after loop initializer")?;

        let condition = if !self.check(&TokenType::Comma) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::Comma, "Expected ',' after loop condition")?;

        let increment = if !self.check(&TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RightParen, "Expected ')' after ALANG SA clauses")?;

        let body = self.statement()?;
        let span = Span::new(start_span, body.span().end);

        let mut loop_body = vec![body];
        if let Some(increment) = increment {
            let increment_span = increment.span().clone();
            loop_body.push(Stmt::Expression {
                expr: increment,
                span: increment_span,
            });
        }

        let condition = condition.unwrap_or_else(|| Expr::Literal {
            value: Value::Bool(true),
            span: span.clone(),
        });

        let mut statements = Vec::new();
        if let Some(initializer) = initializer {
            statements.push(initializer);
        }
        statements.push(Stmt::While {
            condition,
            body: Box::new(Stmt::Block {
                statements: loop_body,
                span: span.clone(),
            }),
            span: span.clone(),
        });

        Ok(Stmt::Block { statements, span })
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let start_span = self.peek().span.start;
        let expr = self.expression()?;
        let end_span = self.previous().span.end;

        Ok(Stmt::Expression {
            expr,
            span: Span::new(start_span, end_span),
        })
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.concatenation()?;

        if self.match_types(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable { name, span, line } = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    span: Span::new(span.start, self.previous().span.end),
                    line,
                });
            }

            return Err(BisayaError::parse_error_with_help(
                equals.span,
                equals.line,
                "Invalid assignment target".to_string(),
                "Only variables can be assigned to. Example: x = 10".to_string(),
            ));
        }

        Ok(expr)
    }

    fn concatenation(&mut self) -> ParseResult<Expr> {
        let mut expr = self.or()?;

        while self.match_types(&[TokenType::Ampersand]) {
            let operator_token = self.previous().clone();
            let right = self.operand(&operator_token, Self::or)?;
            expr = Self::binary(expr, BinaryOp::Concat, right, &operator_token);
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.match_types(&[TokenType::Or]) {
            let operator_token = self.previous().clone();
            let start = expr.span().start;
            let right = self.operand(&operator_token, Self::and)?;
            let end = right.span().end;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_types(&[TokenType::And]) {
            let operator_token = self.previous().clone();
            let start = expr.span().start;
            let right = self.operand(&operator_token, Self::equality)?;
            let end = right.span().end;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
                span: Span::new(start, end),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.match_types(&[TokenType::NotEqual, TokenType::EqualEqual]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::NotEqual => BinaryOp::NotEqual,
                _ => BinaryOp::Equal,
            };
            let right = self.operand(&operator_token, Self::comparison)?;
            expr = Self::binary(expr, operator, right, &operator_token);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.match_types(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Greater => BinaryOp::Greater,
                TokenType::GreaterEqual => BinaryOp::GreaterEqual,
                TokenType::Less => BinaryOp::Less,
                _ => BinaryOp::LessEqual,
            };
            let right = self.operand(&operator_token, Self::term)?;
            expr = Self::binary(expr, operator, right, &operator_token);
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while self.match_types(&[TokenType::Minus, TokenType::Plus, TokenType::Percent]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Minus => BinaryOp::Subtract,
                TokenType::Plus => BinaryOp::Add,
                _ => BinaryOp::Modulo,
            };
            let right = self.operand(&operator_token, Self::factor)?;
            expr = Self::binary(expr, operator, right, &operator_token);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Slash, TokenType::Star]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Slash => BinaryOp::Divide,
                _ => BinaryOp::Multiply,
            };
            let right = self.operand(&operator_token, Self::unary)?;
            expr = Self::binary(expr, operator, right, &operator_token);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_types(&[TokenType::Not, TokenType::Minus]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::Not => UnaryOp::Not,
                _ => UnaryOp::Negate,
            };

            let right = self.operand(&operator_token, Self::unary)?;
            let end = right.span().end;

            return Ok(Expr::Unary {
                operator,
                operand: Box::new(right),
                span: Span::new(operator_token.span.start, end),
                line: operator_token.line,
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let expr = self.primary()?;

        if self.match_types(&[TokenType::PlusPlus, TokenType::MinusMinus]) {
            let operator_token = self.previous().clone();
            let operator = match operator_token.token_type {
                TokenType::PlusPlus => PostfixOp::Increment,
                _ => PostfixOp::Decrement,
            };
            let start = expr.span().start;

            return Ok(Expr::Postfix {
                operator,
                target: Box::new(expr),
                span: Span::new(start, operator_token.span.end),
                line: operator_token.line,
            });
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::True
            | TokenType::False
            | TokenType::Integer
            | TokenType::Double
            | TokenType::String
            | TokenType::Char => {
                self.advance();
                let value = token.literal.ok_or_else(|| {
                    BisayaError::parse_error(
                        token.span.clone(),
                        token.line,
                        format!("Malformed literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Literal {
                    value,
                    span: token.span,
                })
            }
            TokenType::Dollar => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::String("\n".to_string()),
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                self.advance();
                Ok(Expr::Variable {
                    name: token.lexeme,
                    span: token.span,
                    line: token.line,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let start_span = token.span;

                if self.check(&TokenType::RightParen) {
                    return Err(BisayaError::parse_error_with_help(
                        Span::new(start_span.start, self.peek().span.end),
                        token.line,
                        "Empty parentheses are not allowed".to_string(),
                        "Parentheses must contain an expression. Example: (x + 1)".to_string(),
                    ));
                }

                let expr = self.expression()?;
                let end_token = self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'."
                        .to_string(),
                )?;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span: Span::new(start_span.start, end_token.span.end),
                })
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => {
                        "Found ')' without matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::RightBrace => {
                        "Found '}' without matching '{'. Check for unbalanced braces."
                    }
                    TokenType::End => "The program ended while an expression was expected.",
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a literal value, variable, or parenthesized expression here.",
                };

                let message = if token.token_type == TokenType::Eof {
                    "Unexpected end of input".to_string()
                } else {
                    format!("Expected expression, found '{}'", token.lexeme)
                };

                Err(BisayaError::parse_error_with_help(
                    self.error_span(),
                    token.line,
                    message,
                    help_msg.to_string(),
                ))
            }
        }
    }

    /// Parses the right-hand operand of `operator`. When nothing at all
    /// could be parsed the error names the operator instead.
    fn operand(
        &mut self,
        operator: &Token,
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let checkpoint = self.current;
        next(self).map_err(|error| {
            if self.current == checkpoint {
                BisayaError::parse_error_with_help(
                    error.span,
                    operator.line,
                    format!("Expected expression after '{}'", operator.lexeme),
                    "Operators require expressions on both sides.".to_string(),
                )
            } else {
                error
            }
        })
    }

    fn binary(left: Expr, operator: BinaryOp, right: Expr, operator_token: &Token) -> Expr {
        let start = left.span().start;
        let end = right.span().end;
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span: Span::new(start, end),
            line: operator_token.line,
        }
    }

    /// Discards tokens until a likely statement boundary: a new line or a
    /// statement keyword.
    fn synchronize(&mut self) {
        if self.at_statement_keyword() || self.check(&TokenType::End) {
            return;
        }
        self.advance();

        while !self.is_at_end() {
            if self.previous().line != self.peek().line {
                return;
            }

            if self.at_statement_keyword()
                || self.check(&TokenType::Start)
                || self.check(&TokenType::End)
            {
                return;
            }

            self.advance();
        }
    }

    fn at_statement_keyword(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Declare
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Input
                | TokenType::Block
        )
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Span for an error at the current token. At end of input this points
    /// just past the last real token.
    fn error_span(&self) -> Span {
        if self.is_at_end() && self.current > 0 {
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            self.peek().span.clone()
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> ParseResult<&Token> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(BisayaError::parse_error(
                self.error_span(),
                self.peek().line,
                message.to_string(),
            ))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> ParseResult<&Token> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(BisayaError::parse_error_with_help(
                self.error_span(),
                self.peek().line,
                message.to_string(),
                help,
            ))
        }
    }
}
