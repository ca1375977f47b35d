//! Budgeted expression evaluation.

use super::functions;
use super::parser::{CompareOp, Expr};
use super::{TemplateContext, Value};
use crate::error::TemplateError;
use std::time::{Duration, Instant};

/// Step and wall-clock allowance for evaluating one field.
#[derive(Debug, Clone)]
pub struct Budget {
    steps_left: u32,
    deadline: Instant,
}

impl Budget {
    /// Creates a budget that starts counting now.
    #[must_use]
    pub fn new(steps: u32, time: Duration) -> Self {
        Self {
            steps_left: steps,
            deadline: Instant::now() + time,
        }
    }

    fn tick(&mut self) -> Result<(), TemplateError> {
        if self.steps_left == 0 || Instant::now() >= self.deadline {
            return Err(TemplateError::BudgetExceeded);
        }
        self.steps_left -= 1;
        Ok(())
    }
}

/// Evaluates a parsed expression, charging one step per node.
///
/// # Errors
///
/// Propagates function errors and returns
/// [`TemplateError::BudgetExceeded`] once the budget runs out.
pub fn evaluate(
    expr: &Expr,
    ctx: &TemplateContext<'_>,
    budget: &mut Budget,
) -> Result<Value, TemplateError> {
    budget.tick()?;
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx, budget))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(ctx, name, &args)
        }
        Expr::Concat(lhs, rhs) => {
            let lhs = evaluate(lhs, ctx, budget)?;
            let rhs = evaluate(rhs, ctx, budget)?;
            Ok(Value::Str(format!("{lhs}{rhs}")))
        }
        Expr::Compare(op, lhs, rhs) => {
            let equal = evaluate(lhs, ctx, budget)? == evaluate(rhs, ctx, budget)?;
            Ok(Value::Bool(match op {
                CompareOp::Eq => equal,
                CompareOp::NotEq => !equal,
            }))
        }
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, ctx, budget)?.is_truthy())),
        // `and`/`or` short-circuit and yield an operand, as Jinja does
        Expr::And(lhs, rhs) => {
            let lhs = evaluate(lhs, ctx, budget)?;
            if lhs.is_truthy() {
                evaluate(rhs, ctx, budget)
            } else {
                Ok(lhs)
            }
        }
        Expr::Or(lhs, rhs) => {
            let lhs = evaluate(lhs, ctx, budget)?;
            if lhs.is_truthy() {
                Ok(lhs)
            } else {
                evaluate(rhs, ctx, budget)
            }
        }
        Expr::Conditional {
            then,
            cond,
            otherwise,
        } => {
            if evaluate(cond, ctx, budget)?.is_truthy() {
                evaluate(then, ctx, budget)
            } else {
                evaluate(otherwise, ctx, budget)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntitySnapshot, EntityState};
    use crate::template::parser::parse;

    fn eval(source: &str) -> Result<Value, TemplateError> {
        let snapshot = EntitySnapshot::from_states([EntityState::new("light.x", "on")]);
        let ctx = TemplateContext::new(&snapshot, Some("light.x"));
        let mut budget = Budget::new(100, Duration::from_secs(1));
        evaluate(&parse(source)?, &ctx, &mut budget)
    }

    #[test]
    fn test_conditional_and_logic() {
        assert_eq!(
            eval("'lit' if is_state('light.x', 'on') else 'dark'").unwrap(),
            Value::Str("lit".into())
        );
        assert_eq!(eval("not self_is_state('off')").unwrap(), Value::Bool(true));
        assert_eq!(eval("'' or 'fallback'").unwrap(), Value::Str("fallback".into()));
        assert_eq!(eval("none and states('nope')").unwrap(), Value::None);
    }

    #[test]
    fn test_concat_renders_values() {
        assert_eq!(
            eval("self_states() ~ ' ' ~ 3 ~ ' ' ~ true").unwrap(),
            Value::Str("on 3 True".into())
        );
    }

    #[test]
    fn test_step_budget() {
        let snapshot = EntitySnapshot::new();
        let ctx = TemplateContext::new(&snapshot, None);
        let expr = parse("'a' ~ 'b' ~ 'c' ~ 'd'").unwrap();
        let mut budget = Budget::new(3, Duration::from_secs(1));
        assert_eq!(
            evaluate(&expr, &ctx, &mut budget),
            Err(TemplateError::BudgetExceeded)
        );
    }

    #[test]
    fn test_deadline_budget() {
        let snapshot = EntitySnapshot::new();
        let ctx = TemplateContext::new(&snapshot, None);
        let mut budget = Budget::new(100, Duration::ZERO);
        assert_eq!(
            evaluate(&Expr::Literal(Value::None), &ctx, &mut budget),
            Err(TemplateError::BudgetExceeded)
        );
    }
}
