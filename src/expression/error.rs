// ABOUTME: Error types for expression evaluation
// ABOUTME: Separates syntax errors from failures raised while evaluating or rendering

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpressionError {
    #[error("Expression syntax error in '{expression}': {message}")]
    SyntaxError { expression: String, message: String },

    #[error("Expression evaluation failed for '{expression}': {message}")]
    EvaluationError { expression: String, message: String },

    #[error("Template render error in '{template}': {message}")]
    RenderError { template: String, message: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ExpressionError {
    pub(crate) fn from_eval(expression: &str, err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::SyntaxError => ExpressionError::SyntaxError {
                expression: expression.to_string(),
                message: err.to_string(),
            },
            _ => ExpressionError::EvaluationError {
                expression: expression.to_string(),
                message: err.to_string(),
            },
        }
    }

    pub(crate) fn from_render(template: &str, err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::SyntaxError => ExpressionError::SyntaxError {
                expression: template.to_string(),
                message: err.to_string(),
            },
            _ => ExpressionError::RenderError {
                template: template.to_string(),
                message: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpressionError>;
