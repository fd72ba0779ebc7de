//! Versioned JSON persistence: envelopes carrying a format id and version, a registry
//! of formats that decode them, and file slots that track unsaved changes.

pub mod format;
pub mod protocol;
pub mod slot;
pub mod version;

pub use format::{Format, FormatRegistry};
pub use protocol::{read_envelope, Envelope, EnvelopeInfo, Loaded};
pub use slot::FileSlot;
pub use version::Vid;
