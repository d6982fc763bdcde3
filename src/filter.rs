//! Turns the text typed at the filter prompt into a derived view.
//!
//! Resolution order:
//! 1. empty text leaves the source untouched,
//! 2. text naming a column (surrounding whitespace ignored) shows that column,
//! 3. otherwise the configured [`ExpressionEvaluator`] compiles the text with
//!    every column bound by name and the table bound as `df`; boolean
//!    results select rows, any other expression over the columns becomes a
//!    one-column view,
//! 4. any failure, or a result that reads no column (a bare literal) or only
//!    renames one, falls back to a case-sensitive substring search over
//!    every column's displayed text.
//!
//! Nothing here surfaces an error to the caller.

use indexmap::IndexMap;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::EvaluatorKind;
use crate::query;
use crate::source::DataSource;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("not a view of the table: {0}")]
    NotAView(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Name the whole table goes by inside expressions.
pub const TABLE_BINDING: &str = "df";

/// Names visible to an expression: each column bound to its value, plus the
/// table itself under [`TABLE_BINDING`].
pub struct Scope {
    pub columns: IndexMap<String, Expr>,
    pub table: &'static str,
}

impl Scope {
    pub fn new(source: &DataSource) -> Self {
        let columns = source
            .columns()
            .into_iter()
            .map(|name| {
                let expr = col(name.as_str());
                (name, expr)
            })
            .collect();
        Self {
            columns,
            table: TABLE_BINDING,
        }
    }

    /// Every column the expression reads must be bound in this scope.
    fn check_bound(&self, expr: &Expr) -> Result<(), FilterError> {
        for name in expr.clone().meta().root_names() {
            if !self.columns.contains_key(name.as_str()) {
                return Err(FilterError::UnknownIdentifier(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Compiles filter text into a polars expression.
pub trait ExpressionEvaluator {
    fn name(&self) -> &'static str;
    fn evaluate(&self, text: &str, scope: &Scope) -> Result<Expr, FilterError>;
}

/// Restricted grammar: comparisons, arithmetic, boolean logic, aggregates.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafeEvaluator;

impl ExpressionEvaluator for SafeEvaluator {
    fn name(&self) -> &'static str {
        "safe"
    }

    fn evaluate(&self, text: &str, scope: &Scope) -> Result<Expr, FilterError> {
        let expr = query::parse_filter(text, &scope.columns, scope.table)?;
        scope.check_bound(&expr)?;
        Ok(expr)
    }
}

/// SQL expression syntax, e.g. `Age > 30 AND City LIKE 'O%'`.
#[cfg(feature = "sql")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlEvaluator;

#[cfg(feature = "sql")]
impl ExpressionEvaluator for SqlEvaluator {
    fn name(&self) -> &'static str {
        "sql"
    }

    /// The table is reachable through `COUNT(*)`; a bare `df` is an unknown
    /// column.
    fn evaluate(&self, text: &str, scope: &Scope) -> Result<Expr, FilterError> {
        let expr = polars_sql::sql_expr(text)?;
        scope.check_bound(&expr)?;
        Ok(expr)
    }
}

/// Build the evaluator for `kind`. Without the `sql` feature the safe
/// evaluator stands in.
pub fn evaluator_for(kind: EvaluatorKind) -> Box<dyn ExpressionEvaluator> {
    match kind {
        #[cfg(feature = "sql")]
        EvaluatorKind::Sql => Box::new(SqlEvaluator),
        #[cfg(not(feature = "sql"))]
        EvaluatorKind::Sql => {
            warn!("built without SQL support, using the safe evaluator");
            Box::new(SafeEvaluator)
        }
        EvaluatorKind::Safe => Box::new(SafeEvaluator),
    }
}

/// How a filter was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Unfiltered,
    Column,
    Expression,
    Substring,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Unfiltered => "none",
            Strategy::Column => "column",
            Strategy::Expression => "expression",
            Strategy::Substring => "substring",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compiled {
    pub source: DataSource,
    pub strategy: Strategy,
}

pub struct FilterCompiler {
    evaluator: Box<dyn ExpressionEvaluator>,
}

impl std::fmt::Debug for FilterCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCompiler")
            .field("evaluator", &self.evaluator.name())
            .finish()
    }
}

impl FilterCompiler {
    pub fn new(evaluator: Box<dyn ExpressionEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn evaluator_name(&self) -> &'static str {
        self.evaluator.name()
    }

    pub fn compile(&self, text: Option<&str>, source: &DataSource) -> Compiled {
        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => {
                return Compiled {
                    source: source.clone(),
                    strategy: Strategy::Unfiltered,
                }
            }
        };

        let trimmed = text.trim();
        if let Some(column) = source.column(trimmed) {
            if let Ok(view) = source.select_expr(column) {
                debug!(column = trimmed, "filter selects a column");
                return Compiled {
                    source: view,
                    strategy: Strategy::Column,
                };
            }
        }

        match self.evaluate(text, source) {
            Ok(view) => {
                debug!(evaluator = self.evaluator.name(), "filter compiled as expression");
                Compiled {
                    source: view,
                    strategy: Strategy::Expression,
                }
            }
            Err(e) => {
                debug!(error = %e, "filter falls back to substring search");
                substring_search(text, source)
            }
        }
    }

    fn evaluate(&self, text: &str, source: &DataSource) -> Result<DataSource, FilterError> {
        let scope = Scope::new(source);
        let expr = self.evaluator.evaluate(text, &scope)?;
        if matches!(expr, Expr::Alias(..)) {
            return Err(FilterError::NotAView(format!("renames a column: {}", text)));
        }
        if expr.clone().meta().root_names().is_empty() {
            return Err(FilterError::NotAView(format!("reads no column: {}", text)));
        }
        let view = match source.output_dtype(expr.clone())? {
            DataType::Boolean => source.select_rows(expr)?,
            _ => source.select_expr(expr)?,
        };
        Ok(view)
    }
}

/// Keep rows where any searchable column's text contains `text`. Cells are
/// matched in the form the table shows them, so nulls read as `null`.
/// Nested and binary columns have no string cast and are not searched.
pub fn substring_search(text: &str, source: &DataSource) -> Compiled {
    let predicate = source
        .dtypes()
        .into_iter()
        .filter(|(_, dtype)| !dtype.is_nested() && *dtype != DataType::Binary)
        .map(|(name, _)| {
            col(name.as_str())
                .cast(DataType::String)
                .fill_null(lit(DataSource::stringify(&AnyValue::Null)))
                .str()
                .contains_literal(lit(text))
        })
        .reduce(|acc, expr| acc.or(expr))
        .unwrap_or_else(|| lit(false));

    let view = match source.select_rows(predicate) {
        Ok(view) => view,
        Err(e) => {
            warn!(error = %e, "substring search failed, showing no rows");
            source
                .select_rows(lit(false))
                .unwrap_or_else(|_| source.clone())
        }
    };
    Compiled {
        source: view,
        strategy: Strategy::Substring,
    }
}
