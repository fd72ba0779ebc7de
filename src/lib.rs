#![doc(test(attr(deny(warnings))))]

//! Bankviz turns bank statement rows into per-period reports: calendar sectioning,
//! category tree categorisation and a versioned JSON persistence protocol for the
//! imports and category sets a session works with.

pub mod calendar;
pub mod category;
pub mod config;
pub mod domain;
pub mod errors;
pub mod import;
pub mod models;
pub mod report;
pub mod storage;
pub mod utils;

use std::sync::Once;

use import::ImportManifest;
use models::CategorySet;
use storage::FormatRegistry;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Bankviz tracing initialized.");
    });
}

/// Registry holding every format this crate reads and writes.
pub fn default_registry() -> FormatRegistry {
    FormatRegistry::new()
        .with(ImportManifest::format())
        .with(CategorySet::format())
}
