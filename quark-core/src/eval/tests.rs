use super::prelude::*;
use crate::{
    ast::prelude::*,
    environment::prelude::{Environment, Value, ValueType, FALSE, TRUE},
    scanner::prelude::{Token, TokenKind}
};

fn id(name: &str) -> Expression {
    Expression::Atom(AtomExpression::new(name, TokenKind::Id))
}

fn int(value: &str) -> Expression {
    Expression::Atom(AtomExpression::new(value, TokenKind::Integer))
}

fn op(kind: TokenKind, lexeme: &str) -> Token {
    Token::new(kind, lexeme, (0, 0))
}

fn binary(lhs: Expression, kind: TokenKind, lexeme: &str, rhs: Expression) -> Expression {
    Expression::Binary(BinaryExpression::new(lhs, op(kind, lexeme), rhs))
}

fn assign(name: &str, value: Expression) -> AssignmentStatement {
    AssignmentStatement::new(
        IdList::new(vec![name.into()]),
        ExpressionList::new(vec![value]),
    )
}

fn run(expression: &Expression, env: &mut Environment) -> Result<ExecutionResult, EvalError> {
    let mut ctx = EvalContext::new();
    expression.execute(env, &mut ctx)
}

#[test]
fn test_assignment_then_resolution() {
    let mut env = Environment::new();
    let mut ctx = EvalContext::new();

    let result = assign("x", int("1")).execute(&mut env, &mut ctx).unwrap();
    assert_eq!(result, ExecutionResult::NoValue);

    let result = run(&id("x"), &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 1 }));
}

#[test]
fn test_literal_atom_evaluation_is_idempotent() {
    let mut env = Environment::new();
    let atom = int("42");

    let first = run(&atom, &mut env).unwrap();
    let second = run(&atom, &mut env).unwrap();

    assert_eq!(first, ExecutionResult::Literal(Value::Integer { value: 42 }));
    assert_eq!(first, second);
}

#[test]
fn test_literal_atoms_construct_their_values() {
    let mut env = Environment::new();

    let cases = vec![
        (AtomExpression::new("2.5", TokenKind::Real), Value::Real { value: 2.5 }),
        (AtomExpression::new("3im", TokenKind::Complex), Value::Complex { re: 0.0, im: 3.0 }),
        (AtomExpression::new("\"hi\"", TokenKind::String), Value::String { value: "hi".into() }),
        (AtomExpression::new("true", TokenKind::Boolean), TRUE),
        (AtomExpression::new("false", TokenKind::Boolean), FALSE),
    ];

    for (atom, expected) in cases {
        let result = run(&Expression::Atom(atom), &mut env).unwrap();
        assert_eq!(result, ExecutionResult::Literal(expected));
    }
}

#[test]
fn test_binary_is_stuck_until_operands_are_bound() {
    let mut env = Environment::new();
    let expression = binary(id("x"), TokenKind::Plus, "+", int("1"));

    let result = run(&expression, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Stuck(expression.clone()));

    env.bind("x".into(), int("1"));

    let result = run(&expression, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 2 }));
}

#[test]
fn test_unbound_identifier_is_stuck_not_an_error() {
    let mut env = Environment::new();

    let result = run(&id("missing"), &mut env).unwrap();
    assert_eq!(
        result,
        ExecutionResult::Stuck(Expression::Atom(AtomExpression::new("missing", TokenKind::Id)))
    );
}

#[test]
fn test_unbound_alias_chain_reports_the_final_name() {
    let mut env = Environment::new();
    env.bind("x".into(), id("y"));

    let result = run(&id("x"), &mut env).unwrap();
    assert_eq!(
        result,
        ExecutionResult::Stuck(Expression::Atom(AtomExpression::new("y", TokenKind::Id)))
    );
}

#[test]
fn test_alias_chain_resolves_through_names() {
    let mut env = Environment::new();
    env.bind("y".into(), int("1"));
    env.bind("x".into(), id("y"));

    let result = run(&id("x"), &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 1 }));
}

#[test]
fn test_cyclic_alias_chain_is_detected() {
    let mut env = Environment::new();
    env.bind("x".into(), id("y"));
    env.bind("y".into(), id("x"));

    let err = run(&id("x"), &mut env).expect_err("cyclic aliases cannot resolve");
    assert!(matches!(err, EvalError::CyclicBinding { .. }));
}

#[test]
fn test_self_reference_rebinding() {
    let mut env = Environment::new();
    let mut ctx = EvalContext::new();

    env.bind("x".into(), int("1"));

    let increment = binary(id("x"), TokenKind::Plus, "+", int("1"));
    assign("x", increment.clone()).execute(&mut env, &mut ctx).unwrap();

    // The previous value is threaded through a wrapped application
    let expected = Expression::Application(ApplicationExpression::new(
        Expression::Lambda(LambdaExpression::new("x", increment)),
        int("1"),
    ));
    assert_eq!(env.get("x"), Some(&expected));

    let result = run(&id("x"), &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 2 }));
}

#[test]
fn test_rebinding_without_self_reference_stores_directly() {
    let mut env = Environment::new();
    let mut ctx = EvalContext::new();

    assign("x", int("1")).execute(&mut env, &mut ctx).unwrap();
    assign("x", int("2")).execute(&mut env, &mut ctx).unwrap();

    assert_eq!(env.get("x"), Some(&int("2")));
}

#[test]
fn test_curried_application() {
    let mut env = Environment::new();

    // ((\ x. \ y. x + y)(1))(2)
    let add = Expression::Lambda(LambdaExpression::new(
        "x",
        Expression::Lambda(LambdaExpression::new(
            "y",
            binary(id("x"), TokenKind::Plus, "+", id("y")),
        )),
    ));
    let application = Expression::Application(ApplicationExpression::new(
        Expression::Application(ApplicationExpression::new(add, int("1"))),
        int("2"),
    ));

    let result = run(&application, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 3 }));

    // The caller's environment never sees the lambda's bindings
    assert!(env.is_empty());
}

#[test]
fn test_partial_application_is_stuck() {
    let mut env = Environment::new();

    let add = Expression::Lambda(LambdaExpression::new(
        "x",
        Expression::Lambda(LambdaExpression::new(
            "y",
            binary(id("x"), TokenKind::Plus, "+", id("y")),
        )),
    ));
    let application = Expression::Application(ApplicationExpression::new(add, int("1")));

    let result = run(&application, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Stuck(application.clone()));
}

#[test]
fn test_application_of_a_literal_returns_the_literal() {
    let mut env = Environment::new();

    let application = Expression::Application(ApplicationExpression::new(int("1"), int("2")));

    let result = run(&application, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 1 }));
}

#[test]
fn test_lambda_without_pending_arguments_runs_its_body() {
    let mut env = Environment::new();

    let lambda = Expression::Lambda(LambdaExpression::new("x", int("1")));

    let result = run(&lambda, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 1 }));
}

#[test]
fn test_let_scopes_its_bindings() {
    let mut env = Environment::new();

    // let x = 5 in x + 1
    let let_expr = Expression::Let(LetExpression::new(
        IdList::new(vec!["x".into()]),
        ExpressionList::new(vec![int("5")]),
        Some(binary(id("x"), TokenKind::Plus, "+", int("1"))),
    ));

    let result = run(&let_expr, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Literal(Value::Integer { value: 6 }));

    // The binding stayed inside the let's own scope
    assert!(!env.contains("x"));
}

#[test]
fn test_let_with_unresolved_body_is_stuck_as_a_whole() {
    let mut env = Environment::new();

    // let x = y in x + 1, with y unbound
    let let_expr = Expression::Let(LetExpression::new(
        IdList::new(vec!["x".into()]),
        ExpressionList::new(vec![id("y")]),
        Some(binary(id("x"), TokenKind::Plus, "+", int("1"))),
    ));

    let result = run(&let_expr, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Stuck(let_expr.clone()));
}

#[test]
fn test_let_without_body_produces_no_value() {
    let mut env = Environment::new();

    let let_expr = Expression::Let(LetExpression::new(
        IdList::new(vec!["x".into()]),
        ExpressionList::new(vec![int("1")]),
        None,
    ));

    let result = run(&let_expr, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::NoValue);
}

#[test]
fn test_conditional_branches() {
    let mut env = Environment::new();

    let true_atom = Expression::Atom(AtomExpression::new("true", TokenKind::Boolean));
    let conditional = Expression::Conditional(ConditionalExpression::new(
        true_atom,
        int("1"),
        Some(int("2")),
    ));
    assert_eq!(
        run(&conditional, &mut env).unwrap(),
        ExecutionResult::Literal(Value::Integer { value: 1 })
    );

    // Any literal other than boolean true selects the alternative
    let conditional = Expression::Conditional(ConditionalExpression::new(
        int("0"),
        int("1"),
        Some(int("2")),
    ));
    assert_eq!(
        run(&conditional, &mut env).unwrap(),
        ExecutionResult::Literal(Value::Integer { value: 2 })
    );
}

#[test]
fn test_conditional_missing_alternative_fails() {
    let mut env = Environment::new();

    let false_atom = Expression::Atom(AtomExpression::new("false", TokenKind::Boolean));
    let conditional = Expression::Conditional(ConditionalExpression::new(
        false_atom,
        int("1"),
        None,
    ));

    let err = run(&conditional, &mut env).expect_err("false without alternative");
    assert_eq!(err, EvalError::MissingAlternative);
}

#[test]
fn test_conditional_with_unresolved_condition_is_stuck() {
    let mut env = Environment::new();

    let conditional = Expression::Conditional(ConditionalExpression::new(
        id("c"),
        int("1"),
        Some(int("2")),
    ));

    let result = run(&conditional, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Stuck(conditional.clone()));
}

#[test]
fn test_logical_operators_coerce_to_boolean() {
    let mut env = Environment::new();

    let and = binary(int("1"), TokenKind::And, "and", int("0"));
    assert_eq!(run(&and, &mut env).unwrap(), ExecutionResult::Literal(FALSE));

    let or = binary(int("1"), TokenKind::Or, "or", int("0"));
    assert_eq!(run(&or, &mut env).unwrap(), ExecutionResult::Literal(TRUE));

    let xor = binary(int("1"), TokenKind::Xor, "xor", int("1"));
    assert_eq!(run(&xor, &mut env).unwrap(), ExecutionResult::Literal(FALSE));
}

#[test]
fn test_unary_operators() {
    let mut env = Environment::new();

    let negation = Expression::Unary(UnaryExpression::new(op(TokenKind::Minus, "-"), int("3")));
    assert_eq!(
        run(&negation, &mut env).unwrap(),
        ExecutionResult::Literal(Value::Integer { value: -3 })
    );

    let true_atom = Expression::Atom(AtomExpression::new("true", TokenKind::Boolean));
    let not = Expression::Unary(UnaryExpression::new(op(TokenKind::Not, "not"), true_atom));
    assert_eq!(run(&not, &mut env).unwrap(), ExecutionResult::Literal(FALSE));
}

#[test]
fn test_unary_is_stuck_when_open() {
    let mut env = Environment::new();

    let negation = Expression::Unary(UnaryExpression::new(op(TokenKind::Minus, "-"), id("x")));

    let result = run(&negation, &mut env).unwrap();
    assert_eq!(result, ExecutionResult::Stuck(negation.clone()));
}

#[test]
fn test_statement_list_threads_the_environment() {
    let mut env = Environment::new();
    let program = StatementList::new(vec![
        Statement::Assignment(assign("x", int("1"))),
        Statement::Expression(binary(id("x"), TokenKind::Plus, "+", int("1"))),
    ]);

    let results = eval(&program, &mut env).unwrap();

    assert_eq!(results, vec![
        ExecutionResult::NoValue,
        ExecutionResult::Literal(Value::Integer { value: 2 }),
    ]);
}

#[test]
fn test_unsupported_operations() {
    let mut env = Environment::new();
    let mut ctx = EvalContext::new();

    let import = Statement::Import(ImportStatement::new(
        IdList::new(vec!["core".into()]),
        None,
    ));
    assert!(matches!(
        import.execute(&mut env, &mut ctx),
        Err(EvalError::UnsupportedOperation { .. })
    ));

    let list = Expression::List(ListExpression::new(vec![int("1")]));
    assert!(matches!(
        run(&list, &mut env),
        Err(EvalError::UnsupportedOperation { .. })
    ));

    let expressions = Expression::ExpressionList(ExpressionList::new(vec![int("1")]));
    assert!(matches!(
        run(&expressions, &mut env),
        Err(EvalError::UnsupportedOperation { .. })
    ));

    let fresh = Expression::FreshName(FRESH_NAMES.fresh());
    assert!(matches!(
        run(&fresh, &mut env),
        Err(EvalError::UnsupportedOperation { .. })
    ));

    let floor_modulo = binary(int("4"), TokenKind::SlashPercent, "/%", int("2"));
    assert!(matches!(
        run(&floor_modulo, &mut env),
        Err(EvalError::UnsupportedOperation { .. })
    ));
}

#[test]
fn test_recursion_depth_is_limited() {
    let mut env = Environment::new();

    let mut expression = int("1");
    for _ in 0..10 {
        expression = Expression::Unary(UnaryExpression::new(op(TokenKind::Minus, "-"), expression));
    }

    let mut ctx = EvalContext::with_max_depth(5);
    let err = expression.execute(&mut env, &mut ctx).expect_err("depth limit");
    assert_eq!(err, EvalError::RecursionLimitReached { limit: 5 });
}

#[test]
fn test_numeric_promotion() {
    let two = Value::Integer { value: 2 };
    let half = Value::Real { value: 0.5 };
    let imaginary = Value::Complex { re: 0.0, im: 2.0 };

    assert_eq!(two.add(&half).unwrap(), Value::Real { value: 2.5 });
    assert_eq!(two.add(&imaginary).unwrap(), Value::Complex { re: 2.0, im: 2.0 });
    assert_eq!(two.mul(&imaginary).unwrap(), Value::Complex { re: 0.0, im: 4.0 });
    assert_eq!(two.equals(&Value::Real { value: 2.0 }).unwrap(), TRUE);
}

#[test]
fn test_integer_division_semantics() {
    let seven = Value::Integer { value: 7 };
    let minus_seven = Value::Integer { value: -7 };
    let two = Value::Integer { value: 2 };
    let zero = Value::Integer { value: 0 };

    assert_eq!(seven.div(&two).unwrap(), Value::Real { value: 3.5 });
    assert_eq!(minus_seven.floor_div(&two).unwrap(), Value::Integer { value: -4 });
    assert_eq!(minus_seven.rem(&two).unwrap(), Value::Integer { value: 1 });
    assert_eq!(two.pow(&Value::Integer { value: 10 }).unwrap(), Value::Integer { value: 1024 });

    assert_eq!(seven.div(&zero), Err(EvalError::DivisionByZero));
    assert_eq!(seven.floor_div(&zero), Err(EvalError::DivisionByZero));
    assert_eq!(seven.rem(&zero), Err(EvalError::DivisionByZero));
}

#[test]
fn test_complex_values_have_no_ordering() {
    let imaginary = Value::Complex { re: 0.0, im: 1.0 };
    let one = Value::Integer { value: 1 };

    assert_eq!(
        imaginary.less_than(&one),
        Err(EvalError::InvalidOperands {
            operation: "<",
            left: ValueType::Complex,
            right: ValueType::Integer,
        })
    );
}

#[test]
fn test_list_operators() {
    let list = Value::List {
        items: vec![Value::Integer { value: 1 }, Value::Integer { value: 2 }],
    };
    let empty = Value::List { items: vec![] };

    assert_eq!(list.head().unwrap(), Value::Integer { value: 1 });
    assert_eq!(list.tail().unwrap(), Value::List { items: vec![Value::Integer { value: 2 }] });
    assert_eq!(list.is_nil().unwrap(), FALSE);
    assert_eq!(empty.is_nil().unwrap(), TRUE);

    assert_eq!(empty.head(), Err(EvalError::EmptyList { operation: "head" }));
    assert_eq!(empty.tail(), Err(EvalError::EmptyList { operation: "tail" }));
}

#[test]
fn test_string_values() {
    assert_eq!(Value::string("\"hi\""), Value::String { value: "hi".into() });

    let left = Value::String { value: "ab".into() };
    let right = Value::String { value: "cd".into() };

    assert_eq!(left.add(&right).unwrap(), Value::String { value: "abcd".into() });
    assert_eq!(left.less_than(&right).unwrap(), TRUE);
    assert!(!Value::String { value: "".into() }.coerce_boolean());
}
