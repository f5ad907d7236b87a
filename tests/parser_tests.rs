// Parser robustness tests
//
// Table-driven suites of small programs that must either parse cleanly or
// fail with a specific diagnostic, plus checks on recovery and desugaring.

use bisaya::ast::{Expr, Program, Stmt};
use bisaya::error::BisayaError;
use bisaya::lexer::Lexer;
use bisaya::parser::{Parser, MISSING_END, MISSING_START};

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ok   {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  FAIL {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  CRASH {}: {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => match &test.expected_error_contains {
                Some(expected) if !error.message.contains(expected) => TestResult::Fail(format!(
                    "Error message '{}' doesn't contain expected text '{}'",
                    error.message, expected
                )),
                _ => TestResult::Pass,
            },
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

/// Scan and parse, returning the first diagnostic if there was any
fn parse_input(input: &str) -> Result<Program, BisayaError> {
    let (tokens, lex_errors) = Lexer::new(input.to_string()).scan_tokens();
    if let Some(error) = lex_errors.into_iter().next() {
        return Err(error);
    }

    let (program, errors) = Parser::new(tokens).parse();
    match errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(program),
    }
}

fn wrap(body: &str) -> String {
    format!("SUGOD\n{}\nKATAPUSAN", body)
}

/// Test case builder for convenience
impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }

    /// Same as `should_succeed`, with the body wrapped in SUGOD/KATAPUSAN.
    pub fn body_should_succeed(name: &str, body: &str) -> Self {
        Self::should_succeed(name, &wrap(body))
    }

    pub fn body_should_fail_with_message(name: &str, body: &str, expected_msg: &str) -> Self {
        Self::should_fail_with_message(name, &wrap(body), expected_msg)
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_program_structure_tests() -> TestSuite {
    let mut suite = TestSuite::new("Program Structure");

    suite.add_test(TestCase::should_succeed("empty_program", "SUGOD\nKATAPUSAN"));
    suite.add_test(TestCase::should_succeed(
        "comments_around_program",
        "-- header\nSUGOD\n-- nothing here\nKATAPUSAN\n",
    ));
    suite.add_test(TestCase::should_fail_with_message("empty_input", "", MISSING_START));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_start",
        "MUGNA NUMERO x\nKATAPUSAN",
        MISSING_START,
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_end",
        "SUGOD\nMUGNA NUMERO x = 5",
        MISSING_END,
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "tokens_after_end",
        "SUGOD\nKATAPUSAN\nIPAKITA: 1",
        "after KATAPUSAN",
    ));

    suite
}

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    // === PARENTHESES TESTS ===
    suite.add_test(TestCase::body_should_fail_with_message(
        "unmatched_opening_paren",
        "IPAKITA: (1 + 2",
        "Expected ')' after expression",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "unmatched_opening_paren_nested",
        "IPAKITA: ((1 + 2)",
        "Expected ')' after expression",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "unmatched_closing_paren",
        "IPAKITA: 1 + 2)",
        "Expected expression, found ')'",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "empty_parentheses",
        "IPAKITA: ()",
        "Empty parentheses are not allowed",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "empty_parentheses_in_expression",
        "IPAKITA: 1 + ()",
        "Empty parentheses are not allowed",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "missing_right_operand",
        "IPAKITA: 1 +",
        "Expected expression after '+'",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "missing_concat_operand",
        "IPAKITA: x &",
        "Expected expression after '&'",
    ));

    // === BRACE TESTS ===
    suite.add_test(TestCase::body_should_fail_with_message(
        "unmatched_opening_brace",
        "PUNDOK {\nMUGNA NUMERO x = 1",
        "Expected '}' after block",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "unmatched_closing_brace",
        "x = 1 }",
        "Expected expression, found '}'",
    ));

    // Very deeply nested expressions
    let deep_parens = format!("IPAKITA: {}1{}", "(".repeat(100), ")".repeat(100));
    suite.add_test(TestCase::body_should_succeed("deeply_nested_parens", &deep_parens));

    suite
}

fn create_declaration_tests() -> TestSuite {
    let mut suite = TestSuite::new("Declaration Tests");

    suite.add_test(TestCase::body_should_succeed("single_declaration", "MUGNA NUMERO x = 5"));
    suite.add_test(TestCase::body_should_succeed(
        "multi_declaration",
        "MUGNA NUMERO a, b = 2, c",
    ));
    suite.add_test(TestCase::body_should_succeed(
        "every_type",
        "MUGNA TIPIK f = 1.5\nMUGNA LETRA c = 'a'\nMUGNA TINUOD t = \"OO\"\nMUGNA PULONG s = \"hi\"",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "declaration_missing_type",
        "MUGNA x = 5",
        "Expected a type after MUGNA",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "declaration_missing_name",
        "MUGNA NUMERO = 5",
        "Expected variable name",
    ));

    suite
}

fn create_assignment_tests() -> TestSuite {
    let mut suite = TestSuite::new("Assignment Tests");

    suite.add_test(TestCase::body_should_succeed("simple_assignment", "x = 1"));
    suite.add_test(TestCase::body_should_succeed("chained_assignment", "x = y = 4"));
    suite.add_test(TestCase::body_should_fail("missing_value", "x ="));
    suite.add_test(TestCase::body_should_fail_with_message(
        "invalid_target",
        "1 = x",
        "Invalid assignment target",
    ));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    suite.add_test(TestCase::body_should_succeed(
        "valid_if",
        "KUNG (x > 0) PUNDOK {\nIPAKITA: x\n}",
    ));
    suite.add_test(TestCase::body_should_succeed(
        "if_else_chain",
        "KUNG (x > 0) PUNDOK {\nIPAKITA: 1\n} KUNG WALA (x < 0) PUNDOK {\nIPAKITA: 2\n} KUNG DILI PUNDOK {\nIPAKITA: 3\n}",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "if_missing_pundok",
        "KUNG (x > 0) {\nIPAKITA: x\n}",
        "Expected PUNDOK",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "else_missing_pundok",
        "KUNG (x > 0) PUNDOK {\n}\nKUNG DILI {\n}",
        "Expected PUNDOK",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "if_missing_condition",
        "KUNG PUNDOK {\n}",
        "Expected '(' after KUNG",
    ));

    suite.add_test(TestCase::body_should_succeed(
        "valid_while",
        "SAMTANG (x > 0) PUNDOK {\nx = x - 1\n}",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "while_missing_paren",
        "SAMTANG x > 0 PUNDOK {\n}",
        "Expected '(' after SAMTANG",
    ));

    suite.add_test(TestCase::body_should_succeed(
        "valid_for",
        "ALANG SA (MUGNA NUMERO i = 0, i < 3, i++) PUNDOK {\nIPAKITA: i\n}",
    ));
    suite.add_test(TestCase::body_should_succeed(
        "for_empty_clauses",
        "ALANG SA (,,) PUNDOK {\n}",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "for_missing_comma",
        "ALANG SA (i = 0 i < 3, i++) PUNDOK {\n}",
        "Expected ',' after loop initializer",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    suite.add_test(TestCase::body_should_succeed("integer_literal", "IPAKITA: 42"));
    suite.add_test(TestCase::body_should_succeed("double_literal", "IPAKITA: 3.14"));
    suite.add_test(TestCase::body_should_succeed("string_literal", "IPAKITA: \"hello\""));
    suite.add_test(TestCase::body_should_succeed("char_literal", "IPAKITA: 'a'"));
    suite.add_test(TestCase::body_should_succeed("boolean_true", "IPAKITA: \"OO\""));
    suite.add_test(TestCase::body_should_succeed("boolean_false", "IPAKITA: \"DILI\""));
    suite.add_test(TestCase::body_should_succeed("unquoted_booleans", "MUGNA TINUOD t = OO O DILI"));
    suite.add_test(TestCase::body_should_succeed("escape_and_newline", "IPAKITA: [#] & $"));

    suite.add_test(TestCase::body_should_fail_with_message(
        "trailing_dot",
        "IPAKITA: 42.",
        "Unexpected character: '.'",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "unterminated_string",
        "IPAKITA: \"hello",
        "Unterminated string",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "unterminated_char",
        "IPAKITA: 'a",
        "Unterminated character literal",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "multi_char_literal",
        "IPAKITA: 'ab'",
        "exactly one character",
    ));
    suite.add_test(TestCase::body_should_fail_with_message(
        "unexpected_character",
        "IPAKITA: 1 @ 2",
        "Unexpected character: '@'",
    ));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    suite.add_test(TestCase::body_should_succeed("comparison_equal", "IPAKITA: 1 == 2"));
    suite.add_test(TestCase::body_should_succeed("comparison_not_equal", "IPAKITA: 1 <> 2"));
    suite.add_test(TestCase::body_should_succeed("modulo", "IPAKITA: 7 % 2"));
    suite.add_test(TestCase::body_should_succeed(
        "logic_and_concat",
        "IPAKITA: x > 1 UG y < 2 O BALI z & \"!\"",
    ));
    suite.add_test(TestCase::body_should_succeed("postfix_increment", "x++"));
    suite.add_test(TestCase::body_should_succeed("postfix_decrement", "x--"));
    // Rejected at runtime, not by the parser
    suite.add_test(TestCase::body_should_succeed("postfix_on_literal", "IPAKITA: 1++"));
    suite.add_test(TestCase::body_should_fail("missing_left_operand", "IPAKITA: * 1"));

    suite
}

fn create_input_tests() -> TestSuite {
    let mut suite = TestSuite::new("Input Tests");

    suite.add_test(TestCase::body_should_succeed("input_with_colon", "DAWAT: x, y"));
    suite.add_test(TestCase::body_should_succeed("input_without_colon", "DAWAT x"));
    suite.add_test(TestCase::body_should_fail_with_message(
        "input_missing_name",
        "DAWAT: 5",
        "Expected variable name after DAWAT",
    ));

    suite
}

impl TestCase {
    pub fn body_should_fail(name: &str, body: &str) -> Self {
        Self::should_fail(name, &wrap(body))
    }
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_program_structure_tests(),
        create_malformed_expressions_tests(),
        create_declaration_tests(),
        create_assignment_tests(),
        create_control_flow_tests(),
        create_literal_tests(),
        create_operator_tests(),
        create_input_tests(),
    ];

    let mut failures = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failures.push(results.suite_name.clone());
        }
    }

    assert!(failures.is_empty(), "failing suites: {:?}", failures);
}

// ============================================================================
// Recovery and desugaring
// ============================================================================

fn parse_all(source: &str) -> (Program, Vec<BisayaError>) {
    let (tokens, lex_errors) = Lexer::new(source.to_string()).scan_tokens();
    assert!(lex_errors.is_empty(), "unexpected lexical errors: {:?}", lex_errors);
    Parser::new(tokens).parse()
}

#[test]
fn collects_diagnostics_from_several_statements() {
    let (_, errors) = parse_all("SUGOD\nMUGNA x\nIPAKITA: (1\nKATAPUSAN");

    assert_eq!(errors.len(), 2, "{:?}", errors);
    assert!(errors[0].message.contains("Expected a type after MUGNA"));
    assert_eq!(errors[0].line, 2);
    assert!(errors[1].message.contains("Expected ')'"));
    assert_eq!(errors[1].line, 4);
}

#[test]
fn recovers_and_keeps_later_statements() {
    let (program, errors) = parse_all("SUGOD\nx = )\nMUGNA NUMERO y = 2\nKATAPUSAN");

    assert_eq!(errors.len(), 1);
    assert_eq!(program.statements.len(), 1);
    assert!(matches!(program.statements[0], Stmt::Var(ref decl) if decl.name == "y"));
}

#[test]
fn missing_end_keeps_parsed_statements() {
    let (program, errors) = parse_all("SUGOD\nMUGNA NUMERO x = 1\nIPAKITA: x");

    assert_eq!(program.statements.len(), 2);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, MISSING_END);
}

#[test]
fn missing_end_is_reported_even_without_start() {
    let (_, errors) = parse_all("IPAKITA: 1");

    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&MISSING_START));
    assert!(messages.contains(&MISSING_END));
}

#[test]
fn multi_declaration_shares_type() {
    let (program, errors) = parse_all("SUGOD\nMUGNA TIPIK a, b = 2.5\nKATAPUSAN");

    assert!(errors.is_empty());
    match &program.statements[0] {
        Stmt::MultiVar { declarations, .. } => {
            assert_eq!(declarations.len(), 2);
            assert_eq!(declarations[0].name, "a");
            assert!(declarations[0].initializer.is_none());
            assert_eq!(declarations[1].name, "b");
            assert_eq!(declarations[0].declared_type, declarations[1].declared_type);
        }
        other => panic!("expected MultiVar, got {:?}", other),
    }
}

#[test]
fn for_loop_desugars_to_block_and_while() {
    let (program, errors) = parse_all(
        "SUGOD\nALANG SA (MUGNA NUMERO i = 0, i < 3, i++) PUNDOK {\nIPAKITA: i\n}\nKATAPUSAN",
    );

    assert!(errors.is_empty());
    let Stmt::Block { statements, .. } = &program.statements[0] else {
        panic!("expected outer block, got {:?}", program.statements[0]);
    };
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0], Stmt::Var(_)));

    let Stmt::While { body, .. } = &statements[1] else {
        panic!("expected while, got {:?}", statements[1]);
    };
    let Stmt::Block { statements: loop_body, .. } = body.as_ref() else {
        panic!("expected loop body block, got {:?}", body);
    };
    assert_eq!(loop_body.len(), 2);
    assert!(matches!(loop_body[0], Stmt::Block { .. }));
    assert!(matches!(
        loop_body[1],
        Stmt::Expression { expr: Expr::Postfix { .. }, .. }
    ));
}

#[test]
fn else_if_nests_in_else_branch() {
    let (program, errors) = parse_all(
        "SUGOD\nKUNG (a) PUNDOK {\n} KUNG WALA (b) PUNDOK {\n} KUNG DILI PUNDOK {\n}\nKATAPUSAN",
    );

    assert!(errors.is_empty());
    let Stmt::If { else_branch, .. } = &program.statements[0] else {
        panic!("expected if");
    };
    let nested = else_branch.as_deref().expect("else-if branch");
    let Stmt::If { else_branch, .. } = nested else {
        panic!("expected nested if, got {:?}", nested);
    };
    assert!(matches!(else_branch.as_deref(), Some(Stmt::Block { .. })));
}

#[test]
fn concatenation_binds_looser_than_logic() {
    let (program, errors) = parse_all("SUGOD\nIPAKITA: a O b & c\nKATAPUSAN");

    assert!(errors.is_empty());
    let Stmt::Print { expr, .. } = &program.statements[0] else {
        panic!("expected print");
    };
    match expr {
        Expr::Binary { left, .. } => assert!(matches!(left.as_ref(), Expr::Logical { .. })),
        other => panic!("expected concatenation at the top, got {:?}", other),
    }
}
