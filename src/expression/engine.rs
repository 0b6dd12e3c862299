// ABOUTME: Expression evaluator used for `when` guards and value substitution
// ABOUTME: Defines the Evaluator trait and its minijinja-backed default implementation

use minijinja::{Environment, UndefinedBehavior};
use serde_json::{Map, Value as JsonValue};

use super::error::{ExpressionError, Result};
use super::functions;

/// Variables visible to an expression
pub type Vars = Map<String, JsonValue>;

/// Evaluates expressions against a set of variables.
///
/// The engine treats the expression grammar as opaque: flows only ever call
/// `validate` for guards, and tasks call `evaluate` for computed values.
pub trait Evaluator: Send + Sync {
    /// Evaluate an expression or template to a value
    fn evaluate(&self, expression: &str, vars: &Vars) -> Result<JsonValue>;

    /// Evaluate an expression as a predicate
    fn validate(&self, expression: &str, vars: &Vars) -> Result<bool>;
}

#[derive(Debug, Clone, Copy)]
pub struct ExpressionEngine {
    undefined: UndefinedBehavior,
}

impl ExpressionEngine {
    /// Create a new expression engine; undefined variables evaluate as falsy
    pub fn new() -> Self {
        Self {
            undefined: UndefinedBehavior::Lenient,
        }
    }

    /// Treat any reference to an undefined variable as an error
    pub fn with_strict_undefined(mut self) -> Self {
        self.undefined = UndefinedBehavior::Strict;
        self
    }

    /// Environments borrow their sources, so one is built per evaluation
    fn environment<'source>(&self) -> Environment<'source> {
        let mut env = Environment::new();
        env.set_undefined_behavior(self.undefined);
        functions::register_functions(&mut env);
        env
    }

    /// Check if a string contains template expressions
    pub fn has_templates(&self, text: &str) -> bool {
        text.contains("{{") && text.contains("}}")
    }

    /// Render a template string, substituting every `{{ }}` expression
    pub fn render(&self, template: &str, vars: &Vars) -> Result<String> {
        self.environment()
            .render_str(template, vars)
            .map_err(|e| ExpressionError::from_render(template, e))
    }

    /// Validate expression syntax without evaluating it
    pub fn check_syntax(&self, expression: &str) -> Result<()> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        if let Some(inner) = single_expression(trimmed) {
            return self.compile_check(inner);
        }
        if self.has_templates(trimmed) {
            return self
                .environment()
                .template_from_str(expression)
                .map(|_| ())
                .map_err(|e| ExpressionError::from_render(expression, e));
        }
        self.compile_check(trimmed)
    }

    fn compile_check(&self, expression: &str) -> Result<()> {
        self.environment()
            .compile_expression(expression)
            .map(|_| ())
            .map_err(|e| ExpressionError::from_eval(expression, e))
    }

    fn eval_expression(&self, expression: &str, vars: &Vars) -> Result<minijinja::Value> {
        let env = self.environment();
        let compiled = env
            .compile_expression(expression)
            .map_err(|e| ExpressionError::from_eval(expression, e))?;

        compiled
            .eval(vars)
            .map_err(|e| ExpressionError::from_eval(expression, e))
    }
}

impl Evaluator for ExpressionEngine {
    fn evaluate(&self, expression: &str, vars: &Vars) -> Result<JsonValue> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Ok(JsonValue::String(expression.to_string()));
        }

        if let Some(inner) = single_expression(trimmed) {
            let value = self.eval_expression(inner, vars)?;
            return Ok(serde_json::to_value(&value)?);
        }

        // Text mixed with expressions renders to a string
        if self.has_templates(trimmed) {
            return self.render(expression, vars).map(JsonValue::String);
        }

        let value = self.eval_expression(trimmed, vars)?;
        Ok(serde_json::to_value(&value)?)
    }

    fn validate(&self, expression: &str, vars: &Vars) -> Result<bool> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        if let Some(inner) = single_expression(trimmed) {
            return Ok(self.eval_expression(inner, vars)?.is_true());
        }

        if self.has_templates(trimmed) {
            let rendered = self.render(expression, vars)?;
            return Ok(matches!(rendered.trim(), "true" | "True"));
        }

        Ok(self.eval_expression(trimmed, vars)?.is_true())
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the inner expression when `text` is exactly one `{{ ... }}` block
fn single_expression(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}
