//! Calculated columns.
//!
//! A formula such as `[Cost] * [Quantity] + 5` is evaluated in two steps:
//! every `[Column]` token is replaced by the record's numeric value for that
//! column, then the resulting text must consist of numbers, `+ - * / ( )`
//! and whitespace only, and is parsed with a small arithmetic grammar:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := ('+' | '-')* atom
//! atom    := number | '(' sum ')'
//! ```
//!
//! Nothing in a formula is ever executed; anything outside the grammar
//! makes the calculated value null.

use std::sync::LazyLock;

use chumsky::prelude::*;
use regex::Regex;

use super::error::{FormulaError, FormulaResult};
use crate::model::value::format_number;
use crate::model::{Attributes, Value};

/// `[ColumnName]` references.
static COLUMN_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());

/// Characters a substituted expression may contain.
static ARITHMETIC_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\s+\-*/()]+$").unwrap());

/// Column names referenced by `formula`, in order of appearance.
pub fn referenced_columns(formula: &str) -> Vec<String> {
    COLUMN_TOKEN
        .captures_iter(formula)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Replace each `[Column]` token with the column's numeric value.
///
/// Missing or non-numeric columns substitute as `0`; negative values are
/// parenthesised so they compose with binary operators.
pub fn substitute(formula: &str, attributes: &Attributes) -> String {
    COLUMN_TOKEN
        .replace_all(formula, |caps: &regex::Captures<'_>| {
            let n = attributes
                .get(caps[1].trim())
                .and_then(Value::parse_float)
                .filter(|n| n.is_finite())
                .unwrap_or(0.0);
            if n < 0.0 {
                format!("({})", format_number(n))
            } else {
                format_number(n)
            }
        })
        .into_owned()
}

/// Evaluate a fully substituted arithmetic expression.
pub fn evaluate(expression: &str) -> FormulaResult<f64> {
    if !ARITHMETIC_ONLY.is_match(expression) {
        return Err(FormulaError::DisallowedToken(expression.to_string()));
    }

    let value = arithmetic()
        .parse(expression)
        .into_result()
        .map_err(|errs| {
            FormulaError::Syntax(
                errs.first()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| expression.to_string()),
            )
        })?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

/// Substitute, evaluate and round to two decimals.
pub fn evaluate_formula(formula: &str, attributes: &Attributes) -> FormulaResult<f64> {
    let expression = substitute(formula, attributes);
    let value = round2(evaluate(&expression)?);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

/// Calculated value for one record: a number, or null when the formula is
/// invalid for this record.
pub fn calculate(formula: &str, attributes: &Attributes) -> Value {
    match evaluate_formula(formula, attributes) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Null,
    }
}

/// Round half up to two decimals.
fn round2(n: f64) -> f64 {
    (n * 100.0 + 0.5).floor() / 100.0
}

fn arithmetic<'src>() -> impl Parser<'src, &'src str, f64, extra::Err<Rich<'src, char>>> {
    recursive(|expr| {
        let number = text::digits(10)
            .then(just('.').then(text::digits(10)).or_not())
            .to_slice()
            .map(|s: &str| s.parse::<f64>().unwrap_or(f64::NAN))
            .padded();

        let atom = number
            .or(expr.delimited_by(just('(').padded(), just(')').padded()))
            .padded();

        let unary = one_of("+-")
            .padded()
            .repeated()
            .foldr(atom, |op: char, rhs: f64| if op == '-' { -rhs } else { rhs });

        let product = unary.clone().foldl(
            one_of("*/").padded().then(unary).repeated(),
            |lhs: f64, (op, rhs): (char, f64)| if op == '*' { lhs * rhs } else { lhs / rhs },
        );

        product.clone().foldl(
            one_of("+-").padded().then(product).repeated(),
            |lhs: f64, (op, rhs): (char, f64)| if op == '+' { lhs + rhs } else { lhs - rhs },
        )
    })
    .then_ignore(end())
}
