use crate::ast::{BinaryOp, Expr, LogicalOp, PostfixOp, Program, Stmt, UnaryOp, VarDecl};
use crate::environment::{EnvError, Environment, FrameId};
use crate::error::{BisayaError, Span};
use crate::value::Value;
use std::cmp::Ordering;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// Tree-walking evaluator. Reads `DAWAT` lines from `input` and writes
/// `IPAKITA` output to `output`.
pub struct Evaluator<R, W> {
    environment: Environment,
    frame: FrameId,
    input: R,
    output: W,
}

/// Two numeric operands after promotion: both integers, or both floating.
enum NumericPair {
    Ints(i64, i64),
    Doubles(f64, f64),
}

impl<R: BufRead, W: Write> Evaluator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        let environment = Environment::new();
        let frame = environment.root();
        Self {
            environment,
            frame,
            input,
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs the statements in order. The first runtime error stops the run.
    pub fn interpret(&mut self, program: &Program) -> Result<(), BisayaError> {
        debug!(statements = program.statements.len(), "interpreting program");

        for statement in &program.statements {
            if let Err(error) = self.execute_statement(statement) {
                debug!(line = error.line, message = %error.message, "runtime error aborted the program");
                return Err(error);
            }
        }

        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), BisayaError> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(())
            }
            Stmt::Print { expr, span, line } => {
                let value = self.evaluate_expression(expr)?;
                write!(self.output, "{}", value)
                    .and_then(|_| self.output.flush())
                    .map_err(|error| {
                        BisayaError::runtime_error(
                            span.clone(),
                            *line,
                            format!("Failed to write output: {}", error),
                        )
                    })
            }
            Stmt::Var(decl) => self.declare(decl),
            Stmt::MultiVar { declarations, .. } => {
                for decl in declarations {
                    self.declare(decl)?;
                }
                Ok(())
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition_value = self.evaluate_expression(condition)?;
                if condition_value.is_truthy() {
                    self.execute_statement(then_branch)?;
                } else if let Some(else_stmt) = else_branch {
                    self.execute_statement(else_stmt)?;
                }
                Ok(())
            }
            Stmt::While { condition, body, .. } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(body)?;
                }
                Ok(())
            }
            Stmt::Input {
                targets,
                span,
                line,
            } => self.read_input(targets, span, *line),
        }
    }

    fn declare(&mut self, decl: &VarDecl) -> Result<(), BisayaError> {
        let value = match decl.initializer {
            Some(ref initializer) => self.evaluate_expression(initializer)?,
            None => decl.declared_type.zero_value(),
        };

        trace!(name = %decl.name, declared_type = %decl.declared_type, "defining variable");
        self.environment
            .define(self.frame, &decl.name, decl.declared_type, value)
            .map_err(|error| env_error(error, &decl.span, decl.line))
    }

    /// Runs `statements` in a fresh child frame. The enclosing frame is
    /// restored whether or not the block completes.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), BisayaError> {
        let previous = self.frame;
        self.frame = self.environment.push_frame(previous);
        trace!(depth = self.environment.depth(), "entered block");

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute_statement(statement));

        self.environment.pop_frame();
        self.frame = previous;
        trace!(depth = self.environment.depth(), "left block");

        result
    }

    fn read_input(&mut self, targets: &[String], span: &Span, line: usize) -> Result<(), BisayaError> {
        let mut text = String::new();
        self.input.read_line(&mut text).map_err(|error| {
            BisayaError::runtime_error(span.clone(), line, format!("Failed to read input: {}", error))
        })?;
        let text = text.trim_end_matches(&['\n', '\r'][..]);

        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != targets.len() {
            return Err(BisayaError::runtime_error_with_help(
                span.clone(),
                line,
                format!(
                    "DAWAT expected {}, got {} values",
                    targets.len(),
                    fields.len()
                ),
                "Enter one comma-separated value per variable.".to_string(),
            ));
        }

        for (name, raw) in targets.iter().zip(fields) {
            let declared_type = self
                .environment
                .get_type(self.frame, name)
                .map_err(|error| env_error(error, span, line))?;

            let value = declared_type.parse_field(raw).ok_or_else(|| {
                BisayaError::runtime_error(
                    span.clone(),
                    line,
                    format!("Cannot read '{}' as {} for '{}'", raw, declared_type, name),
                )
            })?;

            self.environment
                .assign(self.frame, name, value)
                .map_err(|error| env_error(error, span, line))?;
        }

        Ok(())
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, BisayaError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, span, line } => self
                .environment
                .get(self.frame, name)
                .map_err(|error| env_error(error, span, *line)),
            Expr::Assign {
                name,
                value,
                span,
                line,
            } => {
                let val = self.evaluate_expression(value)?;
                self.environment
                    .assign(self.frame, name, val)
                    .map_err(|error| env_error(error, span, *line))
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
                line,
            } => {
                let left_val = self.evaluate_expression(left)?;
                let right_val = self.evaluate_expression(right)?;
                evaluate_binary_op(*operator, left_val, right_val, span, *line)
            }
            Expr::Unary {
                operator,
                operand,
                span,
                line,
            } => {
                let operand_val = self.evaluate_expression(operand)?;
                evaluate_unary_op(*operator, operand_val, span, *line)
            }
            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left_val = self.evaluate_expression(left)?;

                match operator {
                    LogicalOp::Or => {
                        if left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate_expression(right)
                        }
                    }
                    LogicalOp::And => {
                        if !left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate_expression(right)
                        }
                    }
                }
            }
            Expr::Grouping { expr, .. } => self.evaluate_expression(expr),
            Expr::Postfix {
                operator,
                target,
                span,
                line,
            } => self.evaluate_postfix(*operator, target, span, *line),
        }
    }

    /// `x++` / `x--`: yields the value read before the update.
    fn evaluate_postfix(
        &mut self,
        operator: PostfixOp,
        target: &Expr,
        span: &Span,
        line: usize,
    ) -> Result<Value, BisayaError> {
        let name = match target {
            Expr::Variable { name, .. } => name,
            _ => {
                return Err(BisayaError::runtime_error_with_help(
                    span.clone(),
                    line,
                    format!("Operand of '{}' must be a variable", operator.symbol()),
                    "Only variables can be incremented or decremented. Example: x++".to_string(),
                ))
            }
        };

        let current = self
            .environment
            .get(self.frame, name)
            .map_err(|error| env_error(error, span, line))?;

        let step = match operator {
            PostfixOp::Increment => 1,
            PostfixOp::Decrement => -1,
        };

        let updated = match current {
            Value::Int(n) => n
                .checked_add(step)
                .map(Value::Int)
                .ok_or_else(|| overflow(span, line))?,
            Value::Double(n) => Value::Double(n + step as f64),
            ref other => {
                return Err(BisayaError::runtime_error(
                    span.clone(),
                    line,
                    format!(
                        "Operand of '{}' must be a numeric variable, '{}' holds {}",
                        operator.symbol(),
                        name,
                        other.type_name()
                    ),
                ))
            }
        };

        self.environment
            .assign(self.frame, name, updated)
            .map_err(|error| env_error(error, span, line))?;

        Ok(current)
    }
}

fn env_error(error: EnvError, span: &Span, line: usize) -> BisayaError {
    match error {
        EnvError::Undefined(_) => BisayaError::runtime_error_with_help(
            span.clone(),
            line,
            error.to_string(),
            "Declare variables with MUGNA before using them.".to_string(),
        ),
        EnvError::AlreadyDeclared(_) => BisayaError::runtime_error_with_help(
            span.clone(),
            line,
            error.to_string(),
            "Assign to the existing variable, or declare the new one inside a PUNDOK block.".to_string(),
        ),
        EnvError::TypeMismatch { .. } => {
            BisayaError::runtime_error(span.clone(), line, error.to_string())
        }
    }
}

fn overflow(span: &Span, line: usize) -> BisayaError {
    BisayaError::runtime_error(span.clone(), line, "Integer overflow".to_string())
}

fn numeric_pair(left: &Value, right: &Value) -> Option<NumericPair> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(NumericPair::Ints(*l, *r)),
        (Value::Double(l), Value::Double(r)) => Some(NumericPair::Doubles(*l, *r)),
        (Value::Int(l), Value::Double(r)) => Some(NumericPair::Doubles(*l as f64, *r)),
        (Value::Double(l), Value::Int(r)) => Some(NumericPair::Doubles(*l, *r as f64)),
        _ => None,
    }
}

fn arithmetic(
    pair: NumericPair,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
    span: &Span,
    line: usize,
) -> Result<Value, BisayaError> {
    match pair {
        NumericPair::Ints(l, r) => int_op(l, r)
            .map(Value::Int)
            .ok_or_else(|| overflow(span, line)),
        NumericPair::Doubles(l, r) => Ok(Value::Double(float_op(l, r))),
    }
}

fn is_zero_divisor(pair: &NumericPair) -> bool {
    match pair {
        NumericPair::Ints(_, r) => *r == 0,
        NumericPair::Doubles(_, r) => *r == 0.0,
    }
}

fn compare(pair: NumericPair) -> Option<Ordering> {
    match pair {
        NumericPair::Ints(l, r) => Some(l.cmp(&r)),
        NumericPair::Doubles(l, r) => l.partial_cmp(&r),
    }
}

fn evaluate_binary_op(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
    line: usize,
) -> Result<Value, BisayaError> {
    match operator {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        BinaryOp::Concat => return Ok(Value::String(format!("{}{}", left, right))),
        _ => {}
    }

    let pair = match numeric_pair(&left, &right) {
        Some(pair) => pair,
        None => return non_numeric_operands(operator, left, right, span, line),
    };

    match operator {
        BinaryOp::Add => arithmetic(pair, i64::checked_add, |l, r| l + r, span, line),
        BinaryOp::Subtract => arithmetic(pair, i64::checked_sub, |l, r| l - r, span, line),
        BinaryOp::Multiply => arithmetic(pair, i64::checked_mul, |l, r| l * r, span, line),
        BinaryOp::Divide | BinaryOp::Modulo => {
            if is_zero_divisor(&pair) {
                return Err(BisayaError::runtime_error_with_help(
                    span.clone(),
                    line,
                    "Division by zero".to_string(),
                    format!(
                        "The right-hand side of '{}' must not be zero.",
                        operator.symbol()
                    ),
                ));
            }
            if operator == BinaryOp::Divide {
                arithmetic(pair, i64::checked_div, |l, r| l / r, span, line)
            } else {
                arithmetic(pair, i64::checked_rem, |l, r| l % r, span, line)
            }
        }
        BinaryOp::Greater => Ok(Value::Bool(compare(pair) == Some(Ordering::Greater))),
        BinaryOp::GreaterEqual => Ok(Value::Bool(matches!(
            compare(pair),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::Less => Ok(Value::Bool(compare(pair) == Some(Ordering::Less))),
        BinaryOp::LessEqual => Ok(Value::Bool(matches!(
            compare(pair),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::Concat => {
            unreachable!("handled before numeric promotion")
        }
    }
}

/// `+` also joins text, stringifying a numeric partner. Everything else
/// needs numbers on both sides.
fn non_numeric_operands(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
    line: usize,
) -> Result<Value, BisayaError> {
    if operator == BinaryOp::Add {
        match (&left, &right) {
            (Value::String(l), Value::String(r)) => return Ok(Value::String(format!("{}{}", l, r))),
            (Value::String(_), r) if r.is_numeric() => {
                return Ok(Value::String(format!("{}{}", left, right)))
            }
            (l, Value::String(_)) if l.is_numeric() => {
                return Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => {
                return Err(BisayaError::runtime_error_with_help(
                    span.clone(),
                    line,
                    format!(
                        "Cannot add {} and {}",
                        left.type_name(),
                        right.type_name()
                    ),
                    "'+' works on two numbers or on text. Use '&' to join any values.".to_string(),
                ))
            }
        }
    }

    Err(BisayaError::runtime_error(
        span.clone(),
        line,
        format!(
            "Operands of '{}' must be numbers, got {} and {}",
            operator.symbol(),
            left.type_name(),
            right.type_name()
        ),
    ))
}

fn evaluate_unary_op(
    operator: UnaryOp,
    operand: Value,
    span: &Span,
    line: usize,
) -> Result<Value, BisayaError> {
    match operator {
        UnaryOp::Negate => match operand {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| overflow(span, line)),
            Value::Double(n) => Ok(Value::Double(-n)),
            _ => Err(BisayaError::runtime_error(
                span.clone(),
                line,
                format!("Cannot negate {}", operand.type_name()),
            )),
        },
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
    }
}
