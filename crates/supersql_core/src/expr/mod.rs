//! Expression evaluation against working rows.
pub mod aggregate;
pub mod datetime;
pub mod scalar;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use supersql_error::{Result, SuperSqlError};
use supersql_parser::ast::{
    AggregateArg, AggregateFunction, BinaryOperator, Expr, IsTarget, Literal, ObjectReference,
    SelectItem, SelectNode, UnaryOperator,
};
use tracing::trace;

use crate::engine::select::execute_subquery;
use crate::registry::EngineRegistry;
use crate::resolver::ColumnResolver;
use crate::row::{RowContext, Table};
use crate::value::Value;

/// SELECT list aliases and the expressions they stand for.
#[derive(Debug, Default, Clone)]
pub struct ColumnAliases {
    aliases: HashMap<String, Expr>,
}

impl ColumnAliases {
    pub fn from_projection(items: &[SelectItem]) -> Self {
        let aliases = items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Expr {
                    expr,
                    alias: Some(alias),
                    ..
                } => Some((alias.value.clone(), expr.clone())),
                _ => None,
            })
            .collect();
        ColumnAliases { aliases }
    }

    pub fn get(&self, alias: &str) -> Option<&Expr> {
        self.aliases.get(alias)
    }

    /// Check if the alias names something other than a plain column.
    pub fn is_computed(&self, alias: &str) -> bool {
        self.aliases
            .get(alias)
            .is_some_and(|expr| !matches!(expr, Expr::Column(_)))
    }
}

/// Results of uncorrelated subqueries, keyed by the address of the subquery
/// node so each one runs at most once per statement.
#[derive(Debug, Default)]
pub struct SubqueryCache {
    results: RefCell<HashMap<usize, Rc<Table>>>,
}

impl SubqueryCache {
    fn get_or_run(
        &self,
        node: &SelectNode,
        run: impl FnOnce() -> Result<Table>,
    ) -> Result<Rc<Table>> {
        let key = node as *const SelectNode as usize;
        if let Some(rows) = self.results.borrow().get(&key) {
            return Ok(rows.clone());
        }

        let rows = Rc::new(run()?);
        self.results.borrow_mut().insert(key, rows.clone());
        Ok(rows)
    }
}

/// Evaluates expressions for one pipeline stage of a statement.
pub struct ExpressionEvaluator<'a> {
    registry: &'a EngineRegistry,
    resolver: &'a ColumnResolver,
    aliases: &'a ColumnAliases,
    subqueries: &'a SubqueryCache,
    /// Aliases currently being expanded. Stops an alias from resolving to
    /// itself.
    expanding: RefCell<Vec<String>>,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(
        registry: &'a EngineRegistry,
        resolver: &'a ColumnResolver,
        aliases: &'a ColumnAliases,
        subqueries: &'a SubqueryCache,
    ) -> Self {
        ExpressionEvaluator {
            registry,
            resolver,
            aliases,
            subqueries,
            expanding: RefCell::new(Vec::new()),
        }
    }

    /// Evaluate a predicate, keeping the row only if the result is truthy.
    pub fn matches(&self, expr: &Expr, ctx: RowContext<'_>) -> Result<bool> {
        Ok(self.evaluate(expr, ctx)?.is_truthy())
    }

    /// Evaluate a projection item. The item's own alias is not expanded while
    /// evaluating it, so `a + 1 AS a` reads the underlying column `a`.
    pub fn evaluate_projection(
        &self,
        alias: Option<&str>,
        expr: &Expr,
        ctx: RowContext<'_>,
    ) -> Result<Value> {
        match alias {
            Some(alias) => self.with_expanding(alias, || self.evaluate(expr, ctx)),
            None => self.evaluate(expr, ctx),
        }
    }

    pub fn evaluate(&self, expr: &Expr, ctx: RowContext<'_>) -> Result<Value> {
        match expr {
            Expr::Column(reference) => self.column(reference, ctx),
            Expr::Literal(literal) => literal_value(literal),
            Expr::Nested(expr) => self.evaluate(expr, ctx),
            Expr::UnaryExpr { op, expr } => {
                let value = self.evaluate(expr, ctx)?;
                Ok(match op {
                    UnaryOperator::Plus => Value::Number(value.to_number()),
                    UnaryOperator::Minus => Value::Number(-value.to_number()),
                    UnaryOperator::Not => Value::Boolean(!value.is_truthy()),
                })
            }
            Expr::BinaryExpr { left, op, right } => self.binary(left, *op, right, ctx),
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let value = self.evaluate(expr, ctx)?;
                let low = self.evaluate(low, ctx)?;
                let high = self.evaluate(high, ctx)?;
                let inside = value.loose_cmp(&low) != Ordering::Less
                    && value.loose_cmp(&high) != Ordering::Greater;
                Ok(Value::Boolean(inside != *negated))
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let value = self.evaluate(expr, ctx)?;
                let mut found = false;
                for item in list {
                    if value.loose_eq(&self.evaluate(item, ctx)?) {
                        found = true;
                        break;
                    }
                }
                Ok(Value::Boolean(found != *negated))
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let value = self.evaluate(expr, ctx)?;
                let rows = self.subquery(subquery)?;
                let found = rows
                    .iter()
                    .filter_map(|row| row.values().next())
                    .any(|first| value.loose_eq(first));
                Ok(Value::Boolean(found != *negated))
            }
            Expr::Is {
                expr,
                target,
                negated,
            } => {
                let value = self.evaluate(expr, ctx)?;
                let target = match target {
                    IsTarget::Null => Value::Null,
                    IsTarget::True => Value::Boolean(true),
                    IsTarget::False => Value::Boolean(false),
                };
                Ok(Value::Boolean(value.loose_eq(&target) != *negated))
            }
            Expr::Function { name, args } => {
                let function = scalar::lookup(&name.value)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, ctx))
                    .collect::<Result<Vec<_>>>()?;
                function.invoke(&args)
            }
            Expr::Aggregate { func, arg } => self.aggregate(*func, arg, ctx),
            Expr::Subquery(subquery) => {
                let rows = self.subquery(subquery)?;
                Ok(rows
                    .first()
                    .and_then(|row| row.values().next())
                    .cloned()
                    .unwrap_or_default())
            }
        }
    }

    fn binary(
        &self,
        left: &Expr,
        op: BinaryOperator,
        right: &Expr,
        ctx: RowContext<'_>,
    ) -> Result<Value> {
        // Logical operators short circuit.
        match op {
            BinaryOperator::And => {
                let result =
                    self.evaluate(left, ctx)?.is_truthy() && self.evaluate(right, ctx)?.is_truthy();
                return Ok(Value::Boolean(result));
            }
            BinaryOperator::Or => {
                let result =
                    self.evaluate(left, ctx)?.is_truthy() || self.evaluate(right, ctx)?.is_truthy();
                return Ok(Value::Boolean(result));
            }
            _ => (),
        }

        let left = self.evaluate(left, ctx)?;
        let right = self.evaluate(right, ctx)?;

        let ordering = || left.loose_cmp(&right);
        let value = match op {
            BinaryOperator::Eq => Value::Boolean(ordering() == Ordering::Equal),
            BinaryOperator::NotEq => Value::Boolean(ordering() != Ordering::Equal),
            BinaryOperator::Lt => Value::Boolean(ordering() == Ordering::Less),
            BinaryOperator::LtEq => Value::Boolean(ordering() != Ordering::Greater),
            BinaryOperator::Gt => Value::Boolean(ordering() == Ordering::Greater),
            BinaryOperator::GtEq => Value::Boolean(ordering() != Ordering::Less),
            BinaryOperator::Plus => Value::Number(left.to_number() + right.to_number()),
            BinaryOperator::Minus => Value::Number(left.to_number() - right.to_number()),
            BinaryOperator::Multiply => Value::Number(left.to_number() * right.to_number()),
            BinaryOperator::Divide => {
                let divisor = right.to_number();
                if divisor == 0.0 {
                    Value::Number(0.0)
                } else {
                    Value::Number(left.to_number() / divisor)
                }
            }
            BinaryOperator::Modulo => {
                let divisor = right.to_number() as i64;
                if divisor == 0 {
                    Value::Number(0.0)
                } else {
                    Value::Number((left.to_number() as i64).wrapping_rem(divisor) as f64)
                }
            }
            BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
        };

        Ok(value)
    }

    fn aggregate(
        &self,
        func: AggregateFunction,
        arg: &AggregateArg,
        ctx: RowContext<'_>,
    ) -> Result<Value> {
        if matches!(arg, AggregateArg::Wildcard) && func != AggregateFunction::Count {
            return Err(SuperSqlError::unsupported(format!(
                "{}(*)",
                func.name().to_uppercase()
            )));
        }

        // A row holding the argument column itself was already aggregated.
        if let AggregateArg::Expr(expr) = arg {
            if let Some(value) = self.held_column(expr, ctx) {
                return Ok(match func {
                    AggregateFunction::Count => Value::from(1),
                    _ => value.clone(),
                });
            }
        }

        let children = match ctx.children {
            Some(children) => children,
            None => {
                return match (func, arg) {
                    (AggregateFunction::Count, _) => Ok(Value::from(1)),
                    (_, AggregateArg::Expr(expr)) => self.evaluate(expr, ctx),
                    (_, AggregateArg::Wildcard) => Ok(Value::Null),
                };
            }
        };

        let values = match arg {
            AggregateArg::Wildcard => vec![Value::Null; children.len()],
            AggregateArg::Expr(expr) => children
                .iter()
                .map(|child| self.evaluate(expr, RowContext::leaf(child)))
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(aggregate::fold(func, values))
    }

    /// Value of a plain column argument stored on the context row itself,
    /// ignoring group members.
    fn held_column<'r>(&self, expr: &Expr, ctx: RowContext<'r>) -> Option<&'r Value> {
        let Expr::Column(reference) = expr else {
            return None;
        };
        let name = reference.to_string();
        self.resolver
            .qualify(&name)
            .ok()
            .and_then(|qualified| ctx.columns.get(&qualified))
            .or_else(|| ctx.columns.get(&name))
    }

    fn column(&self, reference: &ObjectReference, ctx: RowContext<'_>) -> Result<Value> {
        let name = reference.to_string();
        let single = reference.0.len() == 1;

        if single && self.aliases.is_computed(&name) && !self.is_expanding(&name) {
            if let Some(expr) = self.aliases.get(&name) {
                return self.with_expanding(&name, || self.evaluate(expr, ctx));
            }
        }

        match self.resolver.qualify(&name) {
            Ok(qualified) => ctx
                .get(&qualified)
                .or_else(|| ctx.get(&name))
                .cloned()
                .ok_or(SuperSqlError::UnknownColumn(name)),
            Err(SuperSqlError::UnknownColumn(_)) if single => {
                if let Some(value) = ctx.get(&name) {
                    return Ok(value.clone());
                }
                match self.aliases.get(&name) {
                    Some(_) if self.is_expanding(&name) => Err(SuperSqlError::UnknownAlias(name)),
                    Some(expr) => self.with_expanding(&name, || self.evaluate(expr, ctx)),
                    None => Err(SuperSqlError::UnknownColumn(name)),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn is_expanding(&self, alias: &str) -> bool {
        self.expanding.borrow().iter().any(|a| a == alias)
    }

    fn with_expanding<T>(&self, alias: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        trace!(%alias, "expanding alias");
        self.expanding.borrow_mut().push(alias.to_string());
        let result = f();
        self.expanding.borrow_mut().pop();
        result
    }

    fn subquery(&self, node: &SelectNode) -> Result<Rc<Table>> {
        self.subqueries
            .get_or_run(node, || execute_subquery(self.registry, node))
    }
}

fn literal_value(literal: &Literal) -> Result<Value> {
    Ok(match literal {
        Literal::Number(n) => Value::Number(
            n.parse::<f64>()
                .map_err(|_| SuperSqlError::unsupported(format!("number literal '{n}'")))?,
        ),
        Literal::SingleQuotedString(s) => Value::String(s.clone()),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Null => Value::Null,
    })
}
