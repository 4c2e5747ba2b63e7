pub mod error;

#[cfg(test)]
mod tests;

use log::trace;

use crate::{
    ast::prelude::{
        AssignmentStatement, AtomExpression, ApplicationExpression, BinaryExpression,
        ConditionalExpression, Expression, LambdaExpression, LetExpression, Scoped, Statement,
        StatementList, UnaryExpression
    },
    environment::prelude::{Environment, Value, TRUE},
    scanner::prelude::{Token, TokenKind}
};

use self::error::EvalError;

pub mod prelude {
    pub use super::error::*;
    pub use super::{
        eval, CallStack, EvalContext, Evaluate, ExecutionResult, DEFAULT_MAX_DEPTH
    };
}

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Weak-head-style outcome of one reduction step.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Fully reduced to a runtime value.
    Literal(Value),
    /// The statement executed and produced nothing.
    NoValue,
    /// Not reducible against the current environment. Carries the node
    /// the caller may re-drive once more bindings become available.
    Stuck(Expression),
}

/// Pending arguments of curried applications, consumed last-pushed-first
/// by the innermost lambdas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallStack {
    pending: Vec<Expression>,
}

impl CallStack {
    pub fn new() -> Self {
        Self { pending: vec![] }
    }

    pub fn push(&mut self, argument: Expression) {
        self.pending.push(argument);
    }

    pub fn pop(&mut self) -> Option<Expression> {
        self.pending.pop()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Per-call-tree evaluation state: the pending-argument stack and the
/// recursion depth limit. Depth is an explicit resource limit so deep
/// identifier chains fail with an error instead of exhausting the host
/// stack.
#[derive(Debug)]
pub struct EvalContext {
    pub callstack: CallStack,
    depth: usize,
    max_depth: usize,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            callstack: CallStack::new(),
            depth: 0,
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        if self.depth >= self.max_depth {
            return Err(EvalError::RecursionLimitReached { limit: self.max_depth });
        }
        self.depth += 1;

        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Evaluate {
    /// Reduces the node one step against `env`. Mutations are confined
    /// to the environment the node received; scoped constructs clone
    /// before binding.
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError>;
}

/// Evaluates a whole program against `env`, one result per statement.
pub fn eval(
    program: &StatementList,
    env: &mut Environment
) -> Result<Vec<ExecutionResult>, EvalError> {
    let mut ctx = EvalContext::new();

    program.execute(env, &mut ctx)
}

impl StatementList {
    /// Sequential execution; later statements see the bindings earlier
    /// assignments made.
    pub fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<Vec<ExecutionResult>, EvalError> {
        self.statements.iter()
            .map(|statement| statement.execute(env, ctx))
            .collect()
    }
}

impl Evaluate for Statement {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        match self {
            Self::Import(_) => Err(EvalError::UnsupportedOperation {
                operation: "executing an import statement"
            }),
            Self::Export(_) => Err(EvalError::UnsupportedOperation {
                operation: "executing an export statement"
            }),
            Self::Assignment(assignment) => assignment.execute(env, ctx),
            Self::Expression(expression) => expression.execute(env, ctx),
        }
    }
}

impl Evaluate for Expression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        ctx.enter()?;
        trace!("reducing {}", self.node_name());

        let result = match self {
            Self::Let(node) => node.execute(env, ctx),
            Self::Lambda(node) => node.execute(env, ctx),
            Self::Conditional(node) => node.execute(env, ctx),
            Self::Application(node) => node.execute(env, ctx),
            Self::Binary(node) => node.execute(env, ctx),
            Self::Unary(node) => node.execute(env, ctx),
            Self::Atom(node) => node.execute(env, ctx),
            Self::List(_) => Err(EvalError::UnsupportedOperation {
                operation: "evaluating a list expression"
            }),
            Self::ExpressionList(_) => Err(EvalError::UnsupportedOperation {
                operation: "evaluating an expression list"
            }),
            Self::FreshName(_) => Err(EvalError::UnsupportedOperation {
                operation: "evaluating a fresh name"
            }),
        };

        ctx.leave();
        result
    }
}

/// Runs a sub-evaluation with an empty pending-argument stack, e.g. a
/// conditional's condition or a binary operand, restoring the caller's
/// stack afterwards.
fn execute_detached(
    expression: &Expression,
    env: &mut Environment,
    ctx: &mut EvalContext,
) -> Result<ExecutionResult, EvalError> {
    let saved = std::mem::take(&mut ctx.callstack);
    let result = expression.execute(env, ctx);
    ctx.callstack = saved;

    result
}

impl Evaluate for AssignmentStatement {
    fn execute(
        &self,
        env: &mut Environment,
        _ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        let pairs = self.identifiers.identifiers.iter()
            .zip(&self.expr_values.expressions);

        for (name, expression) in pairs {
            env.bind(name.clone(), expression.clone());
        }

        Ok(ExecutionResult::NoValue)
    }
}

impl Evaluate for LetExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        let mut scope = env.clone();

        let pairs = self.binding_identifiers.identifiers.iter()
            .zip(&self.initialiser_expressions.expressions);

        for (name, expression) in pairs {
            scope.bind(name.clone(), expression.clone());
        }

        let Some(body) = &self.body_expression else {
            return Ok(ExecutionResult::NoValue);
        };

        match body.execute(&mut scope, ctx)? {
            result @ ExecutionResult::Literal(_) => Ok(result),
            // The let's meaning depends on its own bindings staying
            // attached, so the whole node is reported stuck
            _ => Ok(ExecutionResult::Stuck(Expression::Let(self.clone()))),
        }
    }
}

impl Evaluate for LambdaExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        if let Some(argument) = ctx.callstack.pop() {
            env.bind(self.binding_identifier.clone(), argument);
        }

        self.body_expression.execute(env, ctx)
    }
}

impl Evaluate for ConditionalExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        match execute_detached(&self.condition, env, ctx)? {
            ExecutionResult::Literal(value) => {
                if value == TRUE {
                    execute_detached(&self.consequent, env, ctx)
                } else {
                    match &self.alternative {
                        Some(alternative) => execute_detached(alternative, env, ctx),
                        None => Err(EvalError::MissingAlternative),
                    }
                }
            },
            _ => Ok(ExecutionResult::Stuck(Expression::Conditional(self.clone()))),
        }
    }
}

impl Evaluate for ApplicationExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        let mut scope = env.clone();

        // A stack created for this application dies with it; a stack
        // inherited from an enclosing application is shared.
        let owns_stack = ctx.callstack.is_empty();
        ctx.callstack.push((*self.argument).clone());

        let result = self.function.execute(&mut scope, ctx)?;

        if owns_stack {
            ctx.callstack.clear();
        }

        match result {
            ExecutionResult::Stuck(_) => {
                Ok(ExecutionResult::Stuck(Expression::Application(self.clone())))
            },
            reduced => Ok(reduced),
        }
    }
}

impl Evaluate for BinaryExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        let closed = self.free_variables().iter().all(|name| env.contains(name));
        if !closed {
            return Ok(ExecutionResult::Stuck(Expression::Binary(self.clone())));
        }

        let left = execute_detached(&self.lhs_expr, env, ctx)?;
        let right = execute_detached(&self.rhs_expr, env, ctx)?;

        match (left, right) {
            (ExecutionResult::Literal(left), ExecutionResult::Literal(right)) => {
                apply_binary_operator(&self.operand, &left, &right)
                    .map(ExecutionResult::Literal)
            },
            _ => Ok(ExecutionResult::Stuck(Expression::Binary(self.clone()))),
        }
    }
}

impl Evaluate for UnaryExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        let closed = self.free_variables().iter().all(|name| env.contains(name));
        if !closed {
            return Ok(ExecutionResult::Stuck(Expression::Unary(self.clone())));
        }

        match execute_detached(&self.expr, env, ctx)? {
            ExecutionResult::Literal(operand) => {
                apply_unary_operator(&self.operand, &operand)
                    .map(ExecutionResult::Literal)
            },
            _ => Ok(ExecutionResult::Stuck(Expression::Unary(self.clone()))),
        }
    }
}

impl Evaluate for AtomExpression {
    fn execute(
        &self,
        env: &mut Environment,
        ctx: &mut EvalContext
    ) -> Result<ExecutionResult, EvalError> {
        match self.kind {
            TokenKind::Integer => Value::integer(&self.raw).map(ExecutionResult::Literal),
            TokenKind::Real => Value::real(&self.raw).map(ExecutionResult::Literal),
            TokenKind::Complex => Value::complex(&self.raw).map(ExecutionResult::Literal),
            TokenKind::String => Ok(ExecutionResult::Literal(Value::string(&self.raw))),
            TokenKind::Boolean => {
                Ok(ExecutionResult::Literal(Value::boolean(u8::from(self.raw == "true"))))
            },
            _ => {
                // An identifier resolves by re-evaluating whatever
                // expression was stored for it. Name-to-name indirections
                // are followed iteratively first.
                let mut name = self.raw.clone();
                let mut hops = 0usize;

                loop {
                    let Some(bound) = env.get(&name) else {
                        let atom = if name == self.raw {
                            self.clone()
                        } else {
                            AtomExpression::new(name, TokenKind::Id)
                        };
                        return Ok(ExecutionResult::Stuck(Expression::Atom(atom)));
                    };

                    match bound {
                        Expression::Atom(atom) if atom.kind == TokenKind::Id => {
                            hops += 1;
                            if hops > env.len() {
                                return Err(EvalError::CyclicBinding { name });
                            }
                            name = atom.raw.clone();
                        },
                        expression => {
                            let expression = expression.clone();
                            return expression.execute(env, ctx);
                        }
                    }
                }
            }
        }
    }
}

fn apply_binary_operator(
    operand: &Token,
    left: &Value,
    right: &Value
) -> Result<Value, EvalError> {
    match operand.kind {
        TokenKind::Plus => left.add(right),
        TokenKind::Minus => left.sub(right),
        TokenKind::Star => left.mul(right),
        TokenKind::Slash => left.div(right),
        TokenKind::DoubleSlash => left.floor_div(right),
        TokenKind::DoubleStar => left.pow(right),
        TokenKind::Percent => left.rem(right),
        TokenKind::SlashPercent => Err(EvalError::UnsupportedOperation {
            operation: "the `/%` operator"
        }),
        TokenKind::Greater => left.greater_than(right),
        TokenKind::Less => left.less_than(right),
        TokenKind::GreaterEqual => left.greater_equal(right),
        TokenKind::LessEqual => left.less_equal(right),
        TokenKind::DoubleEqual => left.equals(right),
        TokenKind::ExclamationEqual => left.not_equals(right),
        // Logical operators coerce both sides to booleans first
        TokenKind::And => {
            Ok(Value::Boolean { value: left.coerce_boolean() && right.coerce_boolean() })
        },
        TokenKind::Or => {
            Ok(Value::Boolean { value: left.coerce_boolean() || right.coerce_boolean() })
        },
        TokenKind::Xor => {
            Ok(Value::Boolean { value: left.coerce_boolean() != right.coerce_boolean() })
        },
        _ => Err(EvalError::UnknownOperator { lexeme: operand.lexeme.clone() }),
    }
}

fn apply_unary_operator(operand: &Token, value: &Value) -> Result<Value, EvalError> {
    match operand.kind {
        TokenKind::Minus => value.negate(),
        TokenKind::Not => Ok(value.logical_not()),
        TokenKind::Head => value.head(),
        TokenKind::Tail => value.tail(),
        TokenKind::Nil => value.is_nil(),
        _ => Err(EvalError::UnknownOperator { lexeme: operand.lexeme.clone() }),
    }
}
