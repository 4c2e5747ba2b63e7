use std::collections::HashSet;
use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::unsync::OnceCell;
use serde_json::{json, Value as JsonValue};

use crate::scanner::prelude::{Precedence, Token, TokenKind};

/// Structural serialization shared by every node variant.
pub trait AstNode {
    fn node_dict_repr(&self) -> JsonValue;

    fn node_json_repr(&self) -> String {
        self.node_dict_repr().to_string()
    }
}

/// The three scope queries every expression supports. All of them are
/// computed once per node and cached; nodes are immutable after
/// construction, so the sets never go stale.
pub trait Scoped {
    fn variables(&self) -> &HashSet<String>;
    fn free_variables(&self) -> &HashSet<String>;
    fn bound_variables(&self) -> &HashSet<String>;
}

#[derive(Debug, Clone, Default)]
pub(crate) struct VariableCache {
    all: OnceCell<HashSet<String>>,
    free: OnceCell<HashSet<String>>,
    bound: OnceCell<HashSet<String>>,
}

// Structural node equality must not depend on which scope queries have run.
impl PartialEq for VariableCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

fn token_dict_repr(token: &Token) -> JsonValue {
    json!({
        "kind": format!("{:?}", token.kind),
        "lexeme": token.lexeme,
        "position": [token.position.0, token.position.1]
    })
}

fn union_of<'a, I>(nodes: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a HashSet<String>>,
{
    let mut set = HashSet::new();
    for vars in nodes {
        set.extend(vars.iter().cloned());
    }
    set
}

// statement -> <import> | <export> | <assignment> | <expression>
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(ImportStatement),
    Export(ExportStatement),
    Assignment(AssignmentStatement),
    Expression(Expression),
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import(import) => write!(f, "{import}"),
            Self::Export(export) => write!(f, "{export}"),
            Self::Assignment(assignment) => write!(f, "{assignment}"),
            Self::Expression(expression) => write!(f, "{expression}"),
        }
    }
}

impl AstNode for Statement {
    fn node_dict_repr(&self) -> JsonValue {
        match self {
            Self::Import(import) => import.node_dict_repr(),
            Self::Export(export) => export.node_dict_repr(),
            Self::Assignment(assignment) => assignment.node_dict_repr(),
            Self::Expression(expression) => expression.node_dict_repr(),
        }
    }
}

// statement_list -> <statement> { <statement> }
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementList {
    pub statements: Vec<Statement>,
}

impl StatementList {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }
}

impl Display for StatementList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let statements = self.statements.iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<String>>();

        write!(f, "{}", statements.join("\n"))
    }
}

impl AstNode for StatementList {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "StatementList",
            "statements": self.statements.iter()
                .map(|statement| statement.node_dict_repr())
                .collect::<Vec<JsonValue>>()
        })
    }
}

// import -> import <id_list> [as <id_list>]
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStatement {
    pub package_names: IdList,
    pub alias_names: Option<IdList>,
}

impl ImportStatement {
    pub fn new(package_names: IdList, alias_names: Option<IdList>) -> Self {
        Self { package_names, alias_names }
    }
}

impl Display for ImportStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "import {}", self.package_names)?;
        if let Some(aliases) = &self.alias_names {
            write!(f, " as {aliases}")?;
        }
        Ok(())
    }
}

impl AstNode for ImportStatement {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "ImportStatement",
            "package_names": self.package_names.node_dict_repr(),
            "alias_names": self.alias_names.as_ref().map(|aliases| aliases.node_dict_repr())
        })
    }
}

// export -> export <id_list> [as <id_list>]
#[derive(Debug, Clone, PartialEq)]
pub struct ExportStatement {
    pub package_names: IdList,
    pub alias_names: Option<IdList>,
}

impl ExportStatement {
    pub fn new(package_names: IdList, alias_names: Option<IdList>) -> Self {
        Self { package_names, alias_names }
    }
}

impl Display for ExportStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "export {}", self.package_names)?;
        if let Some(aliases) = &self.alias_names {
            write!(f, " as {aliases}")?;
        }
        Ok(())
    }
}

impl AstNode for ExportStatement {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "ExportStatement",
            "package_names": self.package_names.node_dict_repr(),
            "alias_names": self.alias_names.as_ref().map(|aliases| aliases.node_dict_repr())
        })
    }
}

// assignment -> <id_list> = <expression_list>
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStatement {
    pub identifiers: IdList,
    pub expr_values: ExpressionList,
}

impl AssignmentStatement {
    pub fn new(identifiers: IdList, expr_values: ExpressionList) -> Self {
        debug_assert_eq!(identifiers.identifiers.len(), expr_values.expressions.len());
        Self { identifiers, expr_values }
    }
}

impl Display for AssignmentStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.identifiers, self.expr_values)
    }
}

impl AstNode for AssignmentStatement {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "AssignmentStatement",
            "names": self.identifiers.node_dict_repr(),
            "values": self.expr_values.node_dict_repr()
        })
    }
}

// expression -> <let> | <lambda> | <conditional> | <application>
//             | <binary> | <unary> | <list> | <atom>
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Let(LetExpression),
    Lambda(LambdaExpression),
    Conditional(ConditionalExpression),
    Application(ApplicationExpression),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    List(ListExpression),
    Atom(AtomExpression),
    ExpressionList(ExpressionList),
    FreshName(FreshName),
}

impl Expression {
    pub fn node_name(&self) -> &'static str {
        match self {
            Self::Let(_) => "LetExpression",
            Self::Lambda(_) => "LambdaExpression",
            Self::Conditional(_) => "ConditionalExpression",
            Self::Application(_) => "ApplicationExpression",
            Self::Binary(_) => "BinaryExpression",
            Self::Unary(_) => "UnaryExpression",
            Self::List(_) => "ListExpression",
            Self::Atom(_) => "AtomExpression",
            Self::ExpressionList(_) => "ExpressionList",
            Self::FreshName(_) => "FreshName",
        }
    }
}

impl Scoped for Expression {
    fn variables(&self) -> &HashSet<String> {
        match self {
            Self::Let(node) => node.variables(),
            Self::Lambda(node) => node.variables(),
            Self::Conditional(node) => node.variables(),
            Self::Application(node) => node.variables(),
            Self::Binary(node) => node.variables(),
            Self::Unary(node) => node.variables(),
            Self::List(node) => node.variables(),
            Self::Atom(node) => node.variables(),
            Self::ExpressionList(node) => node.variables(),
            Self::FreshName(node) => node.variables(),
        }
    }

    fn free_variables(&self) -> &HashSet<String> {
        match self {
            Self::Let(node) => node.free_variables(),
            Self::Lambda(node) => node.free_variables(),
            Self::Conditional(node) => node.free_variables(),
            Self::Application(node) => node.free_variables(),
            Self::Binary(node) => node.free_variables(),
            Self::Unary(node) => node.free_variables(),
            Self::List(node) => node.free_variables(),
            Self::Atom(node) => node.free_variables(),
            Self::ExpressionList(node) => node.free_variables(),
            Self::FreshName(node) => node.free_variables(),
        }
    }

    fn bound_variables(&self) -> &HashSet<String> {
        match self {
            Self::Let(node) => node.bound_variables(),
            Self::Lambda(node) => node.bound_variables(),
            Self::Conditional(node) => node.bound_variables(),
            Self::Application(node) => node.bound_variables(),
            Self::Binary(node) => node.bound_variables(),
            Self::Unary(node) => node.bound_variables(),
            Self::List(node) => node.bound_variables(),
            Self::Atom(node) => node.bound_variables(),
            Self::ExpressionList(node) => node.bound_variables(),
            Self::FreshName(node) => node.bound_variables(),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Let(node) => write!(f, "{node}"),
            Self::Lambda(node) => write!(f, "{node}"),
            Self::Conditional(node) => write!(f, "{node}"),
            Self::Application(node) => write!(f, "{node}"),
            Self::Binary(node) => write!(f, "{node}"),
            Self::Unary(node) => write!(f, "{node}"),
            Self::List(node) => write!(f, "{node}"),
            Self::Atom(node) => write!(f, "{node}"),
            Self::ExpressionList(node) => write!(f, "{node}"),
            Self::FreshName(node) => write!(f, "{node}"),
        }
    }
}

impl AstNode for Expression {
    fn node_dict_repr(&self) -> JsonValue {
        match self {
            Self::Let(node) => node.node_dict_repr(),
            Self::Lambda(node) => node.node_dict_repr(),
            Self::Conditional(node) => node.node_dict_repr(),
            Self::Application(node) => node.node_dict_repr(),
            Self::Binary(node) => node.node_dict_repr(),
            Self::Unary(node) => node.node_dict_repr(),
            Self::List(node) => node.node_dict_repr(),
            Self::Atom(node) => node.node_dict_repr(),
            Self::ExpressionList(node) => node.node_dict_repr(),
            Self::FreshName(node) => node.node_dict_repr(),
        }
    }
}

// let -> let <id_list> = <expression_list> [in <expression>]
//
// The body is absent only when the node stands in a top-level
// assignment position.
#[derive(Debug, Clone, PartialEq)]
pub struct LetExpression {
    pub binding_identifiers: IdList,
    pub initialiser_expressions: ExpressionList,
    pub body_expression: Option<Box<Expression>>,
    cache: VariableCache,
}

impl LetExpression {
    pub fn new(
        binding_identifiers: IdList,
        initialiser_expressions: ExpressionList,
        body_expression: Option<Expression>,
    ) -> Self {
        debug_assert_eq!(
            binding_identifiers.identifiers.len(),
            initialiser_expressions.expressions.len()
        );
        Self {
            binding_identifiers,
            initialiser_expressions,
            body_expression: body_expression.map(Box::new),
            cache: VariableCache::default(),
        }
    }

    fn binding_set(&self) -> HashSet<String> {
        self.binding_identifiers.identifiers.iter().cloned().collect()
    }
}

impl Scoped for LetExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| {
            let mut vars = self.initialiser_expressions.variables().clone();
            if let Some(body) = &self.body_expression {
                vars.extend(body.variables().iter().cloned());
            }
            vars
        })
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| {
            let mut free = HashSet::new();
            if let Some(body) = &self.body_expression {
                let bindings = self.binding_set();
                free.extend(
                    body.free_variables()
                        .iter()
                        .filter(|name| !bindings.contains(*name))
                        .cloned()
                );
            }
            free.extend(self.initialiser_expressions.free_variables().iter().cloned());
            free
        })
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| {
            let mut bound = self.initialiser_expressions.bound_variables().clone();
            if let Some(body) = &self.body_expression {
                bound.extend(body.bound_variables().iter().cloned());
                let bindings = self.binding_set();
                bound.extend(
                    body.variables()
                        .iter()
                        .filter(|name| bindings.contains(*name))
                        .cloned()
                );
            }
            bound
        })
    }
}

impl Display for LetExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "let {} = {}", self.binding_identifiers, self.initialiser_expressions)?;
        if let Some(body) = &self.body_expression {
            write!(f, " in {body}")?;
        }
        Ok(())
    }
}

impl AstNode for LetExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "LetExpression",
            "binding_variables": self.binding_identifiers.node_dict_repr(),
            "initialiser_expressions": self.initialiser_expressions.node_dict_repr(),
            "body_expression": self.body_expression.as_ref().map(|body| body.node_dict_repr())
        })
    }
}

// lambda -> \ <id>. <expression>
//
// Multi-argument functions are curried through nesting.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpression {
    pub binding_identifier: String,
    pub body_expression: Box<Expression>,
    cache: VariableCache,
}

impl LambdaExpression {
    pub fn new(binding_identifier: impl Into<String>, body_expression: Expression) -> Self {
        Self {
            binding_identifier: binding_identifier.into(),
            body_expression: Box::new(body_expression),
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for LambdaExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| self.body_expression.variables().clone())
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| {
            let mut free = self.body_expression.free_variables().clone();
            free.remove(&self.binding_identifier);
            free
        })
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| {
            let mut bound = self.body_expression.bound_variables().clone();
            if self.body_expression.variables().contains(&self.binding_identifier) {
                bound.insert(self.binding_identifier.clone());
            }
            bound
        })
    }
}

impl Display for LambdaExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\\ {}. {}", self.binding_identifier, self.body_expression)
    }
}

impl AstNode for LambdaExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "LambdaExpression",
            "bound_variable": self.binding_identifier,
            "body_expression": self.body_expression.node_dict_repr()
        })
    }
}

// conditional -> if <expression> then <expression> [else <expression>]
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub condition: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternative: Option<Box<Expression>>,
    cache: VariableCache,
}

impl ConditionalExpression {
    pub fn new(
        condition: Expression,
        consequent: Expression,
        alternative: Option<Expression>,
    ) -> Self {
        Self {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternative: alternative.map(Box::new),
            cache: VariableCache::default(),
        }
    }

    fn branches(&self) -> impl Iterator<Item = &Expression> {
        std::iter::once(self.condition.as_ref())
            .chain(std::iter::once(self.consequent.as_ref()))
            .chain(self.alternative.as_deref())
    }
}

impl Scoped for ConditionalExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| union_of(self.branches().map(Scoped::variables)))
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| union_of(self.branches().map(Scoped::free_variables)))
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| union_of(self.branches().map(Scoped::bound_variables)))
    }
}

impl Display for ConditionalExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "if {} then {}", self.condition, self.consequent)?;
        if let Some(alternative) = &self.alternative {
            write!(f, " else {alternative}")?;
        }
        Ok(())
    }
}

impl AstNode for ConditionalExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "ConditionalExpression",
            "condition": self.condition.node_dict_repr(),
            "consequent": self.consequent.node_dict_repr(),
            "alternative": self.alternative.as_ref().map(|alternative| alternative.node_dict_repr())
        })
    }
}

// application -> (<expression>)(<expression>)
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationExpression {
    pub function: Box<Expression>,
    pub argument: Box<Expression>,
    cache: VariableCache,
}

impl ApplicationExpression {
    pub fn new(function: Expression, argument: Expression) -> Self {
        Self {
            function: Box::new(function),
            argument: Box::new(argument),
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for ApplicationExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| {
            union_of([self.function.variables(), self.argument.variables()])
        })
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| {
            union_of([self.function.free_variables(), self.argument.free_variables()])
        })
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| {
            union_of([self.function.bound_variables(), self.argument.bound_variables()])
        })
    }
}

impl Display for ApplicationExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})({})", self.function, self.argument)
    }
}

impl AstNode for ApplicationExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "ApplicationExpression",
            "function": self.function.node_dict_repr(),
            "argument": self.argument.node_dict_repr()
        })
    }
}

fn must_be_parenthesised(parent: &Token, child: &Expression) -> bool {
    let child_operand = match child {
        Expression::Binary(binary) => &binary.operand,
        Expression::Unary(unary) => &unary.operand,
        _ => return false,
    };

    Precedence::from(&parent.kind) > Precedence::from(&child_operand.kind)
}

// binary -> <expression> <operator> <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub lhs_expr: Box<Expression>,
    pub operand: Token,
    pub rhs_expr: Box<Expression>,
    cache: VariableCache,
}

impl BinaryExpression {
    pub fn new(lhs_expr: Expression, operand: Token, rhs_expr: Expression) -> Self {
        Self {
            lhs_expr: Box::new(lhs_expr),
            operand,
            rhs_expr: Box::new(rhs_expr),
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for BinaryExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| {
            union_of([self.lhs_expr.variables(), self.rhs_expr.variables()])
        })
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| {
            union_of([self.lhs_expr.free_variables(), self.rhs_expr.free_variables()])
        })
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| {
            union_of([self.lhs_expr.bound_variables(), self.rhs_expr.bound_variables()])
        })
    }
}

impl Display for BinaryExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let left = if must_be_parenthesised(&self.operand, &self.lhs_expr) {
            format!("({})", self.lhs_expr)
        } else {
            self.lhs_expr.to_string()
        };
        let right = if must_be_parenthesised(&self.operand, &self.rhs_expr) {
            format!("({})", self.rhs_expr)
        } else {
            self.rhs_expr.to_string()
        };

        write!(f, "{} {} {}", left, self.operand.lexeme, right)
    }
}

impl AstNode for BinaryExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "BinaryExpression",
            "lhs_expr": self.lhs_expr.node_dict_repr(),
            "operand": token_dict_repr(&self.operand),
            "rhs_expr": self.rhs_expr.node_dict_repr()
        })
    }
}

// unary -> <operator> <expression>
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operand: Token,
    pub expr: Box<Expression>,
    cache: VariableCache,
}

impl UnaryExpression {
    pub fn new(operand: Token, expr: Expression) -> Self {
        Self {
            operand,
            expr: Box::new(expr),
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for UnaryExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| self.expr.variables().clone())
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| self.expr.free_variables().clone())
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| self.expr.bound_variables().clone())
    }
}

impl Display for UnaryExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operand_repr = if must_be_parenthesised(&self.operand, &self.expr) {
            format!("({})", self.expr)
        } else {
            self.expr.to_string()
        };

        write!(f, "{} {}", self.operand.lexeme, operand_repr)
    }
}

impl AstNode for UnaryExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "UnaryExpression",
            "operand": token_dict_repr(&self.operand),
            "expr": self.expr.node_dict_repr()
        })
    }
}

// list -> [ <expression> {, <expression> } ]
#[derive(Debug, Clone, PartialEq)]
pub struct ListExpression {
    pub items: Vec<Expression>,
    cache: VariableCache,
}

impl ListExpression {
    pub fn new(items: Vec<Expression>) -> Self {
        Self {
            items,
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for ListExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| union_of(self.items.iter().map(Scoped::variables)))
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| union_of(self.items.iter().map(Scoped::free_variables)))
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| union_of(self.items.iter().map(Scoped::bound_variables)))
    }
}

impl Display for ListExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = self.items.iter()
            .map(|item| item.to_string())
            .collect::<Vec<String>>();

        write!(f, "[{}]", items.join(", "))
    }
}

impl AstNode for ListExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "ListExpression",
            "exprs": self.items.iter()
                .map(|item| item.node_dict_repr())
                .collect::<Vec<JsonValue>>()
        })
    }
}

// atom -> <literal> | <id>
#[derive(Debug, Clone, PartialEq)]
pub struct AtomExpression {
    pub raw: String,
    pub kind: TokenKind,
    cache: VariableCache,
}

impl AtomExpression {
    pub fn new(raw: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for AtomExpression {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| self.free_variables().clone())
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| {
            if self.kind == TokenKind::Id {
                HashSet::from([self.raw.clone()])
            } else {
                HashSet::new()
            }
        })
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(HashSet::new)
    }
}

impl Display for AtomExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl AstNode for AtomExpression {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "AtomExpression",
            "type": format!("{:?}", self.kind),
            "raw": self.raw
        })
    }
}

// expression_list -> <expression> {, <expression> }
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
    cache: VariableCache,
}

impl ExpressionList {
    pub fn new(expressions: Vec<Expression>) -> Self {
        Self {
            expressions,
            cache: VariableCache::default(),
        }
    }
}

impl Scoped for ExpressionList {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| union_of(self.expressions.iter().map(Scoped::variables)))
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| {
            union_of(self.expressions.iter().map(Scoped::free_variables))
        })
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(|| {
            union_of(self.expressions.iter().map(Scoped::bound_variables))
        })
    }
}

impl Display for ExpressionList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let expressions = self.expressions.iter()
            .map(|expression| expression.to_string())
            .collect::<Vec<String>>();

        write!(f, "{}", expressions.join(", "))
    }
}

impl AstNode for ExpressionList {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "ExpressionList",
            "expressions": self.expressions.iter()
                .map(|expression| expression.node_dict_repr())
                .collect::<Vec<JsonValue>>()
        })
    }
}

// id_list -> <id> {, <id> }
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList {
    pub identifiers: Vec<String>,
}

impl IdList {
    pub fn new(identifiers: Vec<String>) -> Self {
        Self { identifiers }
    }
}

impl Display for IdList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifiers.join(", "))
    }
}

impl AstNode for IdList {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "IdList",
            "identifiers": self.identifiers
        })
    }
}

/// A synthetic identifier for hygienic renaming. Only the scope queries
/// are meaningful; evaluation is unsupported.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshName {
    pub id: String,
    cache: VariableCache,
}

impl Scoped for FreshName {
    fn variables(&self) -> &HashSet<String> {
        self.cache.all.get_or_init(|| self.free_variables().clone())
    }

    fn free_variables(&self) -> &HashSet<String> {
        self.cache.free.get_or_init(|| HashSet::from([self.id.clone()]))
    }

    fn bound_variables(&self) -> &HashSet<String> {
        self.cache.bound.get_or_init(HashSet::new)
    }
}

impl Display for FreshName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl AstNode for FreshName {
    fn node_dict_repr(&self) -> JsonValue {
        json!({
            "ast_node_name": "FreshName",
            "expr_token": self.id
        })
    }
}

/// Source of globally-unique synthetic identifiers. The counter is owned
/// by the generator value; `FRESH_NAMES` is the process-wide instance for
/// callers without an arena of their own.
#[derive(Debug, Default)]
pub struct FreshNameGenerator {
    next_id: AtomicUsize,
}

impl FreshNameGenerator {
    pub const fn new() -> Self {
        Self { next_id: AtomicUsize::new(0) }
    }

    pub fn fresh(&self) -> FreshName {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        FreshName {
            id: id.to_string(),
            cache: VariableCache::default(),
        }
    }

    /// Restarts the counter, e.g. at the start of an independent
    /// compilation unit.
    pub fn reset(&self) {
        self.next_id.store(0, Ordering::Relaxed);
    }
}

pub static FRESH_NAMES: FreshNameGenerator = FreshNameGenerator::new();
