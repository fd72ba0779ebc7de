mod common;

use bankviz::{
    calendar::{aligned_span, bucket, sectioned, sectionize, Granularity, Period, Timespan},
    errors::CalendarError,
};
use common::{record, ymd};

#[test]
fn month_sections_cover_january_to_march() {
    let range = Timespan::new(ymd(2024, 1, 15), ymd(2024, 3, 10)).unwrap();
    let spans = sectionize(range, Period::months(1));
    let rendered: Vec<String> = spans.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "01/01/2024-31/01/2024",
            "01/02/2024-29/02/2024",
            "01/03/2024-31/03/2024",
        ]
    );
}

#[test]
fn non_leap_february_ends_on_the_28th() {
    let span = aligned_span(ymd(2023, 2, 14), Period::months(1));
    assert_eq!(span.end(), ymd(2023, 2, 28));
}

#[test]
fn multi_unit_spans_are_aligned() {
    assert_eq!(
        aligned_span(ymd(2024, 5, 20), Period::months(3)),
        Timespan::new(ymd(2024, 5, 1), ymd(2024, 7, 31)).unwrap()
    );
    assert_eq!(
        aligned_span(ymd(2024, 5, 20), Period::years(2)),
        Timespan::new(ymd(2024, 1, 1), ymd(2025, 12, 31)).unwrap()
    );
    assert_eq!(
        aligned_span(ymd(2024, 12, 30), Period::days(5)),
        Timespan::new(ymd(2024, 12, 30), ymd(2025, 1, 3)).unwrap()
    );
}

#[test]
fn spans_are_contiguous_for_every_granularity() {
    let range = Timespan::new(ymd(2022, 11, 3), ymd(2025, 2, 17)).unwrap();
    for granularity in Granularity::ALL {
        for count in 1..=4 {
            let spans = sectionize(range, Period::new(granularity, count));
            assert!(spans[0].contains(range.begin()));
            assert!(spans.last().unwrap().contains(range.end()));
            for pair in spans.windows(2) {
                assert_eq!(pair[0].successor(), Some(pair[1].begin()), "{granularity} x{count}");
            }
        }
    }
}

#[test]
fn every_record_lands_in_exactly_one_section() {
    let records = vec![
        record("03/01/2024", "1", "", ""),
        record("28/02/2024", "2", "", ""),
        record("29/02/2024", "3", "", ""),
        record("31/12/2024", "4", "", ""),
        record("01/01/2024", "5", "", ""),
    ];
    for granularity in Granularity::ALL {
        let sections = sectioned(&records, Period::new(granularity, 2)).unwrap();
        let placed: usize = sections.iter().map(|s| s.records.len()).sum();
        assert_eq!(placed, records.len());
        for section in &sections {
            assert!(section.records.iter().all(|r| section.timespan.contains(r.date())));
        }
    }
}

#[test]
fn zero_count_is_clamped() {
    assert_eq!(Period::new(Granularity::Day, 0).count(), 1);
}

#[test]
fn records_outside_sections_fail_loudly() {
    let records = vec![record("15/06/2024", "1", "", "")];
    let spans = vec![Timespan::new(ymd(2024, 1, 1), ymd(2024, 1, 31)).unwrap()];
    assert_eq!(
        bucket(&records, &spans).unwrap_err(),
        CalendarError::Unbucketed(ymd(2024, 6, 15))
    );
}

#[test]
fn inverted_spans_are_rejected() {
    assert!(matches!(
        Timespan::new(ymd(2024, 2, 1), ymd(2024, 1, 1)),
        Err(CalendarError::InvertedSpan { .. })
    ));
}
