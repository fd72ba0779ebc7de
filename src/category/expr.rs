//! Sandboxed boolean expressions for `Custom` category filters.
//!
//! ```text
//! expr    := or
//! or      := and (("or" | "||") and)*
//! and     := unary (("and" | "&&") unary)*
//! unary   := ("not" | "!") unary | primary
//! primary := "(" expr ")" | "true" | "false" | FIELD OP LITERAL
//!          | FIELD "~" STRING | FIELD "contains" STRING
//! ```
//!
//! Expressions only read record fields; they are type-checked and compiled once.
//! Nesting of parentheses and `not` is capped at [`MAX_DEPTH`].

use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::predicate::CompareOp;
use crate::{
    domain::{parse_amount, Record},
    errors::ExprError,
};

/// Deepest nesting of parentheses and `not` a filter may use.
pub const MAX_DEPTH: usize = 64;

const TEXT_FIELDS: [&str; 6] = ["type", "account", "label_out", "label_in", "tbd", "note"];

/// Compiled expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Const(bool),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Amount { op: CompareOp, value: Decimal },
    Date { op: CompareOp, value: NaiveDate },
    Text { field: &'static str, op: CompareOp, value: String },
    Matches { field: &'static str, regex: Regex },
    Contains { field: &'static str, needle: String },
}

impl Expr {
    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Expr::Const(value) => *value,
            Expr::Not(inner) => !inner.eval(record),
            Expr::And(terms) => terms.iter().all(|term| term.eval(record)),
            Expr::Or(terms) => terms.iter().any(|term| term.eval(record)),
            Expr::Amount { op, value } => op.apply(&record.amount(), value),
            Expr::Date { op, value } => op.apply(&record.date(), value),
            Expr::Text { field, op, value } => {
                op.apply(&record.field(field).unwrap_or_default(), &value.as_str())
            }
            Expr::Matches { field, regex } => regex.is_match(record.field(field).unwrap_or_default()),
            Expr::Contains { field, needle } => record
                .field(field)
                .unwrap_or_default()
                .contains(needle.as_str()),
        }
    }
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        compile(source)
    }
}

/// Parses and type-checks `source`.
pub fn compile(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.or()?;
    match parser.bump() {
        None => Ok(expr),
        Some(token) => Err(ExprError::UnexpectedToken {
            found: token.to_string(),
            expected: "end of expression".into(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Number(String),
    Cmp(CompareOp),
    Tilde,
    And,
    Or,
    Bang,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(word) | Token::Number(word) => f.write_str(word),
            Token::Str(text) => write!(f, "\"{text}\""),
            Token::Cmp(op) => f.write_str(op.symbol()),
            Token::Tilde => f.write_str("~"),
            Token::And => f.write_str("&&"),
            Token::Or => f.write_str("||"),
            Token::Bang => f.write_str("!"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (offset, ch) = chars[i];
        let peek = chars.get(i + 1).map(|(_, c)| *c);
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '~' => {
                tokens.push(Token::Tilde);
                i += 1;
            }
            '&' if peek == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if peek == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '=' if peek == Some('=') => {
                tokens.push(Token::Cmp(CompareOp::Eq));
                i += 2;
            }
            '!' if peek == Some('=') => {
                tokens.push(Token::Cmp(CompareOp::Ne));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '<' | '>' => {
                let inclusive = peek == Some('=');
                let op = match (ch, inclusive) {
                    ('<', false) => CompareOp::Lt,
                    ('<', true) => CompareOp::Le,
                    ('>', false) => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                tokens.push(Token::Cmp(op));
                i += if inclusive { 2 } else { 1 };
            }
            '"' | '\'' => {
                let quote = ch;
                let mut text = String::new();
                let mut j = i + 1;
                let mut closed = false;
                while j < chars.len() {
                    let c = chars[j].1;
                    if c == '\\' && j + 1 < chars.len() {
                        text.push(chars[j + 1].1);
                        j += 2;
                        continue;
                    }
                    if c == quote {
                        closed = true;
                        break;
                    }
                    text.push(c);
                    j += 1;
                }
                if !closed {
                    return Err(ExprError::UnterminatedString(offset));
                }
                tokens.push(Token::Str(text));
                i = j + 1;
            }
            c if c.is_ascii_digit() || (c == '-' && peek.is_some_and(|p| p.is_ascii_digit())) => {
                let mut j = i + 1;
                while j < chars.len() && matches!(chars[j].1, '0'..='9' | '.' | ',') {
                    j += 1;
                }
                tokens.push(Token::Number(chars[i..j].iter().map(|(_, c)| c).collect()));
                i = j;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_alphanumeric() || chars[j].1 == '_') {
                    j += 1;
                }
                let word: String = chars[i..j].iter().map(|(_, c)| c).collect();
                tokens.push(match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Bang,
                    _ => Token::Word(word),
                });
                i = j;
            }
            other => return Err(ExprError::UnexpectedChar { ch: other, offset }),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect_next(&mut self, expected: &str) -> Result<Token, ExprError> {
        self.bump()
            .ok_or_else(|| ExprError::UnexpectedEnd(expected.to_string()))
    }

    /// Enters one nesting level, failing past [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    // chains stay flat so long `and`/`or` runs do not deepen the tree
    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut terms = vec![self.and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            terms.push(self.and()?);
        }
        Ok(flatten(terms, Expr::Or))
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut terms = vec![self.unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            terms.push(self.unary()?);
        }
        Ok(flatten(terms, Expr::And))
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Bang) {
            self.pos += 1;
            self.descend()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.expect_next("an expression")? {
            Token::LParen => {
                self.descend()?;
                let inner = self.or()?;
                self.depth -= 1;
                match self.expect_next("`)`")? {
                    Token::RParen => Ok(inner),
                    other => Err(unexpected(other, "`)`")),
                }
            }
            Token::Word(word) if word.eq_ignore_ascii_case("true") => Ok(Expr::Const(true)),
            Token::Word(word) if word.eq_ignore_ascii_case("false") => Ok(Expr::Const(false)),
            Token::Word(word) => self.condition(&word),
            other => Err(unexpected(other, "a field name")),
        }
    }

    fn condition(&mut self, field_name: &str) -> Result<Expr, ExprError> {
        let field = Field::resolve(field_name)?;
        match self.expect_next("an operator")? {
            Token::Cmp(op) => {
                let literal = match self.expect_next("a literal")? {
                    Token::Str(text) | Token::Number(text) => text,
                    other => return Err(unexpected(other, "a literal")),
                };
                field.compare(op, literal)
            }
            Token::Tilde => {
                let pattern = self.string_operand()?;
                let name = field.text_name("~")?;
                let regex = Regex::new(&pattern).map_err(|err| ExprError::InvalidRegex {
                    pattern,
                    reason: err.to_string(),
                })?;
                Ok(Expr::Matches { field: name, regex })
            }
            Token::Word(word) if word.eq_ignore_ascii_case("contains") => {
                let needle = self.string_operand()?;
                let name = field.text_name("contains")?;
                Ok(Expr::Contains { field: name, needle })
            }
            other => Err(unexpected(other, "an operator")),
        }
    }

    fn string_operand(&mut self) -> Result<String, ExprError> {
        match self.expect_next("a string")? {
            Token::Str(text) => Ok(text),
            other => Err(unexpected(other, "a string")),
        }
    }
}

fn flatten(mut terms: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        if let Some(single) = terms.pop() {
            return single;
        }
    }
    combine(terms)
}

fn unexpected(token: Token, expected: &str) -> ExprError {
    ExprError::UnexpectedToken {
        found: token.to_string(),
        expected: expected.to_string(),
    }
}

enum Field {
    Amount,
    Date,
    Text(&'static str),
}

impl Field {
    fn resolve(name: &str) -> Result<Self, ExprError> {
        match name {
            "amount" => Ok(Field::Amount),
            "date" => Ok(Field::Date),
            "pending" => Ok(Field::Text("tbd")),
            _ => TEXT_FIELDS
                .iter()
                .copied()
                .find(|candidate| *candidate == name)
                .map(Field::Text)
                .ok_or_else(|| ExprError::UnknownField(name.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::Date => "date",
            Field::Text(name) => *name,
        }
    }

    fn text_name(&self, op: &str) -> Result<&'static str, ExprError> {
        match self {
            Field::Text(name) => Ok(*name),
            other => Err(ExprError::UnsupportedOperator {
                field: other.name().to_string(),
                op: op.to_string(),
            }),
        }
    }

    fn compare(&self, op: CompareOp, literal: String) -> Result<Expr, ExprError> {
        let invalid = |literal: &str| ExprError::InvalidLiteral {
            field: self.name().to_string(),
            literal: literal.to_string(),
        };
        match self {
            Field::Amount => {
                let value = parse_amount(&literal).map_err(|_| invalid(&literal))?;
                Ok(Expr::Amount { op, value })
            }
            Field::Date => {
                let value = ["%d/%m/%Y", "%Y-%m-%d"]
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(literal.trim(), fmt).ok())
                    .ok_or_else(|| invalid(&literal))?;
                Ok(Expr::Date { op, value })
            }
            Field::Text(name) => Ok(Expr::Text {
                field: *name,
                op,
                value: literal,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatementRow;

    fn record(date: &str, amount: &str, label_out: &str) -> Record {
        Record::from_row(StatementRow::new(date, amount).with_labels(label_out, "")).unwrap()
    }

    #[test]
    fn amount_comparisons_are_numeric() {
        let expr = compile("amount < -20,5").expect("compile");
        assert!(expr.eval(&record("01/01/2024", "-30", "")));
        assert!(!expr.eval(&record("01/01/2024", "-20.5", "")));
    }

    #[test]
    fn boolean_combinators_respect_precedence() {
        let expr = compile("label_out ~ \"^CARD\" and not amount > 0 || note == 'x'").expect("compile");
        assert!(expr.eval(&record("01/01/2024", "-5", "CARD BAKERY")));
        assert!(!expr.eval(&record("01/01/2024", "5", "CARD BAKERY")));
        assert!(!expr.eval(&record("01/01/2024", "-5", "TRANSFER")));
    }

    #[test]
    fn dates_compare_chronologically() {
        let expr = compile("date >= '2024-02-01' && date <= \"29/02/2024\"").expect("compile");
        assert!(expr.eval(&record("15/02/2024", "1", "")));
        assert!(!expr.eval(&record("01/03/2024", "1", "")));
    }

    #[test]
    fn contains_and_constants() {
        assert!(compile("FALSE").map(|e| !e.eval(&record("01/01/2024", "1", ""))).unwrap());
        let expr = compile("(label_out contains 'RENT')").expect("compile");
        assert!(expr.eval(&record("01/01/2024", "-900", "MONTHLY RENT")));
    }

    #[test]
    fn type_errors_are_reported() {
        assert_eq!(
            compile("amount ~ 'x'").unwrap_err(),
            ExprError::UnsupportedOperator {
                field: "amount".into(),
                op: "~".into()
            }
        );
        assert!(matches!(
            compile("date > 'soon'"),
            Err(ExprError::InvalidLiteral { .. })
        ));
        assert_eq!(
            compile("payee == 'x'").unwrap_err(),
            ExprError::UnknownField("payee".into())
        );
    }

    #[test]
    fn nesting_is_capped() {
        let at_limit = format!("{}true{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(compile(&at_limit).is_ok());
        let too_deep = format!("{}true{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(compile(&too_deep).unwrap_err(), ExprError::TooDeep(MAX_DEPTH));
        let negations = format!("{}true", "not ".repeat(10_000));
        assert_eq!(compile(&negations).unwrap_err(), ExprError::TooDeep(MAX_DEPTH));
    }

    #[test]
    fn long_chains_stay_flat() {
        let source = vec!["amount < 0"; 20_000].join(" and ");
        let expr = compile(&source).expect("compile");
        assert!(matches!(&expr, Expr::And(terms) if terms.len() == 20_000));
        assert!(expr.eval(&record("01/01/2024", "-1", "")));
        assert!(!expr.eval(&record("01/01/2024", "1", "")));
    }

    #[test]
    fn malformed_source_is_rejected() {
        assert!(matches!(compile(""), Err(ExprError::UnexpectedEnd(_))));
        assert!(matches!(compile("(amount > 1"), Err(ExprError::UnexpectedEnd(_))));
        assert!(matches!(compile("note == 'open"), Err(ExprError::UnterminatedString(8))));
        assert!(matches!(compile("amount > 1 )"), Err(ExprError::UnexpectedToken { .. })));
        assert!(matches!(compile("__import__('os')"), Err(ExprError::UnknownField(_))));
        assert!(matches!(compile("amount $ 3"), Err(ExprError::UnexpectedChar { ch: '$', .. })));
    }
}
