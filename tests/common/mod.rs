#![allow(dead_code)]

use std::{fs, path::PathBuf};

use bankviz::domain::{Record, StatementRow};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn dec(raw: &str) -> Decimal {
    raw.parse().expect("valid decimal")
}

/// Builds a record the way the statement reader would.
pub fn record(date: &str, amount: &str, account: &str, label: &str) -> Record {
    Record::from_row(
        StatementRow::new(date, amount)
            .with_account(account)
            .with_labels(label, ""),
    )
    .expect("valid record")
}

/// A temporary workspace with helpers for writing statement files.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes `;`-separated statement lines to `name`.
    pub fn statement(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create statement dir");
        }
        let mut body = lines.join("\n");
        body.push('\n');
        fs::write(&path, body).expect("write statement");
        path
    }

    /// The January 2024 statement used across suites.
    pub fn january_statement(&self) -> PathBuf {
        self.statement(
            "statements/january.csv",
            &[
                "01/01/2024;100,00;VIR;;;EMPLOYER;;salary",
                "15/01/2024;-40,00;CB;;SUPERMARKET;;;",
                "20/01/2024;500,00;SOLDE;X;;;;",
            ],
        )
    }
}
