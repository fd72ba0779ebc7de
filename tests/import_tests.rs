mod common;

use std::fs;

use bankviz::{
    calendar::Period,
    category::{CategoryBlueprint, CompareOp},
    default_registry,
    errors::{ImportError, PersistenceError},
    import::{Import, IMPORT_FORMAT_ID},
    models::{Analysis, CategorySet},
};
use common::{dec, ymd, Workspace};
use serde_json::json;

#[test]
fn saved_import_stores_relative_sources_and_reopens() {
    let workspace = Workspace::new();
    let registry = default_registry();
    let statement = workspace.january_statement();
    let path = workspace.path("q1.json");

    let mut import = Import::new(&path);
    import.add_source(&statement);
    import.set_timespan(Some(ymd(2024, 1, 1)), Some(ymd(2024, 3, 31))).unwrap();
    import.save(&registry).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw,
        json!({
            "format": IMPORT_FORMAT_ID,
            "version": "0.1.0",
            "content": {"begin": "2024/01/01", "end": "2024/03/31", "files": ["statements/january.csv"]}
        })
    );

    let reopened = Import::open(&registry, &path).unwrap();
    assert_eq!(reopened.records().len(), 3);
    assert_eq!(reopened.revision(), 1);
    assert!(!reopened.is_dirty());
}

#[test]
fn window_filters_records_on_open() {
    let workspace = Workspace::new();
    workspace.january_statement();
    fs::write(
        workspace.path("q1.json"),
        json!({
            "format": "bankviz-import",
            "version": "0.1.0",
            "content": {"begin": "2024/01/10", "end": "2024/01/31", "files": ["statements/january.csv"]}
        })
        .to_string(),
    )
    .unwrap();
    let import = Import::open(&default_registry(), workspace.path("q1.json")).unwrap();
    let dates: Vec<_> = import.records().iter().map(|r| r.date()).collect();
    assert_eq!(dates, vec![ymd(2024, 1, 15), ymd(2024, 1, 20)]);
}

#[test]
fn category_file_is_not_an_import() {
    let workspace = Workspace::new();
    let registry = default_registry();
    let path = workspace.path("cats.json");
    let mut set = CategorySet::new(&path);
    set.add_blueprint(CategoryBlueprint::comparison("Out", CompareOp::Lt, 0.0));
    set.save(&registry).unwrap();

    let err = Import::open(&registry, &path).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Persistence(PersistenceError::ProtocolMismatch { .. })
    ));
}

#[test]
fn unreadable_statement_fails_open() {
    let workspace = Workspace::new();
    let statement = workspace.statement("bad.csv", &["not-a-date;1;;;;;;"]);
    let mut import = Import::new(workspace.path("bad.json"));
    import.add_source(&statement);
    assert!(matches!(import.reload(), Err(ImportError::Record { line: 1, .. })));
    assert!(import.records().is_empty());
    assert_eq!(import.revision(), 0);
}

#[test]
fn import_and_categories_feed_an_analysis() {
    let workspace = Workspace::new();
    let registry = default_registry();
    let mut import = Import::new(workspace.path("import.json"));
    import.add_source(&workspace.january_statement());
    import.select_dates_from_contents().unwrap();
    assert!(Analysis::can_analyse(&import));
    import.reload().unwrap();

    let mut categories = CategorySet::new(workspace.path("cats.json"));
    categories.add_blueprint(
        CategoryBlueprint::comparison("Spend", CompareOp::Lt, 0.0)
            .with_sub(vec![CategoryBlueprint::movement_target("Food", "SUPERMARKET")]),
    );
    categories.use_all().unwrap();
    categories.save(&registry).unwrap();

    let mut analysis = Analysis::new(Period::months(1));
    assert!(analysis.refresh(&import, &categories).unwrap());
    let report = &analysis.reports()[0];
    assert_eq!(report.movements, dec("60"));
    assert_eq!(report.categorization.get("Spend.Food"), Some(dec("-40")));
    assert_eq!(report.categorization.get("Spend.other"), Some(dec("0")));

    let out = workspace.path("export.csv");
    assert_eq!(analysis.export_csv(&out, b',').unwrap(), 1);
    let header = fs::read_to_string(&out).unwrap();
    assert!(header.starts_with("timespan,movements,status,Spend,Spend.Food,Spend.other\n"));
}

#[test]
fn inverted_window_fails_open() {
    let workspace = Workspace::new();
    fs::write(
        workspace.path("q1.json"),
        json!({
            "format": "bankviz-import",
            "version": "0.1.0",
            "content": {"begin": "2024/03/31", "end": "2024/01/01", "files": []}
        })
        .to_string(),
    )
    .unwrap();
    let err = Import::open(&default_registry(), workspace.path("q1.json")).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Persistence(PersistenceError::Parse { .. })
    ));
}

#[test]
fn inverted_window_is_refused_and_keeps_the_old_one() {
    let workspace = Workspace::new();
    let mut import = Import::new(workspace.path("q1.json"));
    import.set_timespan(Some(ymd(2024, 1, 1)), Some(ymd(2024, 1, 31))).unwrap();
    assert!(import.set_timespan(Some(ymd(2024, 3, 31)), Some(ymd(2024, 1, 1))).is_err());
    let span = import.timespan().unwrap().unwrap();
    assert_eq!((span.begin(), span.end()), (ymd(2024, 1, 1), ymd(2024, 1, 31)));
}
