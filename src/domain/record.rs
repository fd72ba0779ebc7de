//! Bank statement rows and the parsed records the engines operate on.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::RecordError;

/// Date layout used by bank statements.
pub const STATEMENT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Field names in statement column order.
pub const FIELD_NAMES: [&str; 8] = [
    "date", "amount", "type", "account", "label_out", "label_in", "tbd", "note",
];

/// One raw statement line, every column kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: String,
    pub label_out: String,
    pub label_in: String,
    #[serde(default)]
    pub tbd: String,
    #[serde(default)]
    pub note: String,
}

impl StatementRow {
    pub fn new(date: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            ..Self::default()
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_labels(mut self, label_out: impl Into<String>, label_in: impl Into<String>) -> Self {
        self.label_out = label_out.into();
        self.label_in = label_in.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Looks a column up by its statement field name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "date" => &self.date,
            "amount" => &self.amount,
            "type" => &self.kind,
            "account" => &self.account,
            "label_out" => &self.label_out,
            "label_in" => &self.label_in,
            "tbd" | "pending" => &self.tbd,
            "note" => &self.note,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// A statement row with its date and amount parsed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    row: StatementRow,
    date: NaiveDate,
    amount: Decimal,
}

impl Record {
    pub fn from_row(row: StatementRow) -> Result<Self, RecordError> {
        let date = parse_statement_date(&row.date)?;
        let amount = parse_amount(&row.amount)?;
        Ok(Self { row, date, amount })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn account(&self) -> &str {
        &self.row.account
    }

    pub fn row(&self) -> &StatementRow {
        &self.row
    }

    /// Raw string value of a named field, `None` for unknown names.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.row.field(name)
    }

    /// Ordinary spend or income: the account marker is empty. Any content, even
    /// whitespace, marks a balance snapshot.
    pub fn is_movement(&self) -> bool {
        self.row.account.is_empty()
    }

    /// Balance snapshot for the marked account.
    pub fn is_status(&self) -> bool {
        !self.is_movement()
    }

    /// True when `party` appears in either the outgoing or incoming label.
    pub fn involves(&self, party: &str) -> bool {
        self.row.label_in.contains(party) || self.row.label_out.contains(party)
    }
}

impl TryFrom<StatementRow> for Record {
    type Error = RecordError;

    fn try_from(row: StatementRow) -> Result<Self, Self::Error> {
        Record::from_row(row)
    }
}

pub fn parse_statement_date(raw: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(raw.trim(), STATEMENT_DATE_FORMAT)
        .map_err(|_| RecordError::InvalidDate(raw.to_string()))
}

/// Parses a statement amount, accepting `,` as decimal separator and ignoring spacing.
pub fn parse_amount(raw: &str) -> Result<Decimal, RecordError> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if normalized.is_empty() {
        return Err(RecordError::InvalidAmount(raw.to_string()));
    }
    Decimal::from_str(&normalized).map_err(|_| RecordError::InvalidAmount(raw.to_string()))
}

/// Sums the amounts of `records`.
pub fn total<'a>(records: impl IntoIterator<Item = &'a Record>) -> Decimal {
    records.into_iter().map(Record::amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn row(date: &str, amount: &str, account: &str) -> StatementRow {
        StatementRow::new(date, amount)
            .with_account(account)
            .with_labels("CARD SUPERMARKET", "")
    }

    #[test]
    fn comma_separator_is_normalized() {
        assert_eq!(parse_amount("100,00").unwrap(), dec("100.00"));
        assert_eq!(parse_amount("-40,5").unwrap(), dec("-40.5"));
        assert_eq!(parse_amount(" 1 234,56 ").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("12.75").unwrap(), dec("12.75"));
    }

    #[test]
    fn garbage_amount_is_rejected() {
        assert_eq!(
            parse_amount("abc"),
            Err(RecordError::InvalidAmount("abc".into()))
        );
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn record_parses_statement_date() {
        let record = Record::from_row(row("20/01/2024", "500,00", "X")).expect("record");
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
        assert!(record.is_status());
        assert!(Record::from_row(row("2024-01-20", "1", "")).is_err());
    }

    #[test]
    fn blank_but_present_marker_is_a_status() {
        let record = Record::from_row(row("01/01/2024", "100", " ")).unwrap();
        assert!(record.is_status());
        assert!(!record.is_movement());
    }

    #[test]
    fn fields_are_reachable_by_name() {
        let record = Record::from_row(row("01/01/2024", "1", "")).unwrap();
        assert_eq!(record.field("label_out"), Some("CARD SUPERMARKET"));
        assert_eq!(record.field("pending"), Some(""));
        assert_eq!(record.field("missing"), None);
        assert!(record.is_movement());
        assert!(record.involves("SUPERMARKET"));
    }
}
