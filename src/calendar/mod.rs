//! Calendar-aligned period arithmetic: aligning dates on day/month/year boundaries,
//! slicing ranges into contiguous sections and bucketing dated records into them.

pub mod granularity;
pub mod section;
pub mod timespan;

pub use granularity::{Granularity, Period};
pub use section::{bucket, sectioned, sectionize, Section};
pub use timespan::{aligned_span, Timespan, SPAN_DATE_FORMAT};
