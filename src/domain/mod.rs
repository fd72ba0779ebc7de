pub mod record;

pub use record::{parse_amount, parse_statement_date, total, Record, StatementRow, FIELD_NAMES};
