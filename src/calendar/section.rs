use chrono::NaiveDate;
use tracing::debug;

use super::{
    granularity::Period,
    timespan::{aligned_span, Timespan},
};
use crate::{domain::Record, errors::CalendarError};

/// One period's span plus the records dated inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    pub timespan: Timespan,
    pub records: Vec<&'a Record>,
}

impl<'a> Section<'a> {
    pub fn empty(timespan: Timespan) -> Self {
        Self {
            timespan,
            records: Vec::new(),
        }
    }
}

/// Splits `range` into contiguous aligned spans of `period`.
///
/// The first span is the one aligned on `range.begin()`; spans are emitted until one
/// reaches the end of the span aligned on `range.end()`.
pub fn sectionize(range: Timespan, period: Period) -> Vec<Timespan> {
    let last_end = aligned_span(range.end(), period).end();
    let mut spans = Vec::new();
    let mut cursor = range.begin();
    loop {
        let span = aligned_span(cursor, period);
        spans.push(span);
        if span.end() >= last_end {
            break;
        }
        match span.successor() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    debug!(
        range = %range,
        period = %period.label(),
        sections = spans.len(),
        "sectionized range"
    );
    spans
}

/// Distributes `records` over `spans`, which must be sorted and contiguous.
///
/// A record outside every span is a contract violation and fails the whole call.
pub fn bucket<'a>(
    records: &'a [Record],
    spans: &[Timespan],
) -> Result<Vec<Section<'a>>, CalendarError> {
    let mut sections: Vec<Section<'a>> = spans.iter().copied().map(Section::empty).collect();
    for record in records {
        let index = locate(spans, record.date()).ok_or(CalendarError::Unbucketed(record.date()))?;
        sections[index].records.push(record);
    }
    Ok(sections)
}

/// Sections covering every record, padded to whole periods. Empty input yields no sections.
pub fn sectioned(records: &[Record], period: Period) -> Result<Vec<Section<'_>>, CalendarError> {
    let Some(range) = Timespan::covering(records.iter().map(Record::date)) else {
        return Ok(Vec::new());
    };
    let spans = sectionize(range, period);
    bucket(records, &spans)
}

fn locate(spans: &[Timespan], date: NaiveDate) -> Option<usize> {
    let index = spans.partition_point(|span| span.end() < date);
    spans
        .get(index)
        .filter(|span| span.contains(date))
        .map(|_| index)
}
