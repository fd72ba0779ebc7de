use std::{fmt, str::FromStr};

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    blueprint::{CategoryBlueprint, FilterKind},
    expr::{self, Expr},
};
use crate::domain::{Record, FIELD_NAMES};

/// Ordering operator shared by `Comparison` filters and custom expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::Ge,
        CompareOp::Le,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn apply<T: PartialOrd + ?Sized>(&self, lhs: &T, rhs: &T) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompareOp::ALL
            .into_iter()
            .find(|op| op.symbol() == s.trim())
            .ok_or_else(|| format!("unknown comparison operator `{s}`"))
    }
}

/// Record test attached to a category node.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Fallback for filters that failed to compile.
    Never,
    Regex { regex: Regex, field: String },
    Comparison { op: CompareOp, operand: Decimal },
    MovementTarget(Regex),
    Expr(Expr),
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Never => false,
            Predicate::Regex { regex, field } => {
                regex.is_match(record.field(field).unwrap_or_default())
            }
            Predicate::Comparison { op, operand } => op.apply(&record.amount(), operand),
            Predicate::MovementTarget(regex) => {
                let row = record.row();
                regex.is_match(&row.label_in) || regex.is_match(&row.label_out)
            }
            Predicate::Expr(expr) => expr.eval(record),
        }
    }

    /// Compiles the filter of `blueprint`; the error describes why it cannot be used.
    pub fn compile(blueprint: &CategoryBlueprint) -> Result<Self, String> {
        let config = &blueprint.config;
        match blueprint.filter {
            FilterKind::Regex => {
                let (pattern, field) = match config.as_array().map(Vec::as_slice) {
                    Some([Value::String(pattern), Value::String(field)]) => (pattern, field),
                    _ => return Err(format!("expected [pattern, column], got {config}")),
                };
                if !FIELD_NAMES.contains(&field.as_str()) && field != "pending" {
                    return Err(format!("unknown column `{field}`"));
                }
                Ok(Predicate::Regex {
                    regex: build_regex(pattern)?,
                    field: field.clone(),
                })
            }
            FilterKind::Comparison => {
                let (op, operand) = match config.as_array().map(Vec::as_slice) {
                    Some([Value::String(op), operand]) => (op, operand),
                    _ => return Err(format!("expected [operator, number], got {config}")),
                };
                Ok(Predicate::Comparison {
                    op: op.parse()?,
                    operand: json_decimal(operand)?,
                })
            }
            FilterKind::MovementTarget => match config {
                Value::String(pattern) => Ok(Predicate::MovementTarget(build_regex(pattern)?)),
                _ => Err(format!("expected a pattern string, got {config}")),
            },
            FilterKind::Custom => match config {
                Value::String(source) => expr::compile(source)
                    .map(Predicate::Expr)
                    .map_err(|err| format!("invalid custom predicate `{source}`: {err}")),
                _ => Err(format!("expected an expression string, got {config}")),
            },
        }
    }
}

fn build_regex(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|err| format!("invalid regex `{pattern}`: {err}"))
}

fn json_decimal(value: &Value) -> Result<Decimal, String> {
    let parsed = match value {
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => Some(Decimal::from(int)),
            (None, Some(float)) => Decimal::try_from(float).ok(),
            _ => None,
        },
        Value::String(text) => crate::domain::parse_amount(text).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("expected a number, got {value}"))
}
