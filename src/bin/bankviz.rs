use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};
use tracing::warn;

use bankviz::{
    calendar::{Granularity, Period},
    config::{ConfigManager, Settings},
    default_registry,
    errors::Result,
    import::Import,
    init,
    models::CategorySet,
    report::{build_reports, export_csv, Report},
    utils::{build_info, init_tracing_with},
};

#[derive(Parser)]
#[command(
    name = "bankviz",
    version,
    about = "Sectioned, categorised reports over bank statement exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build per-period reports for an import
    Report {
        /// Import envelope (bankviz-import)
        #[arg(long)]
        import: PathBuf,
        /// Category envelope (bankviz-category); every blueprint is used
        #[arg(long)]
        categories: Option<PathBuf>,
        /// day, month or year
        #[arg(long)]
        granularity: Option<Granularity>,
        /// Period multiplier, at least 1
        #[arg(long)]
        count: Option<u32>,
        /// Write the reports as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the format and version of an envelope
    Inspect {
        envelope: PathBuf,
    },
    /// Print build metadata
    Version,
}

fn main() {
    let settings = load_settings();
    init_tracing_with(settings.log_filter.as_deref());
    init();

    let cli = Cli::parse();
    if let Err(err) = run(cli, &settings) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn load_settings() -> Settings {
    let manager = ConfigManager::new();
    manager.load().unwrap_or_else(|err| {
        eprintln!("ignoring settings at {}: {err}", manager.path().display());
        Settings::default()
    })
}

fn run(cli: Cli, settings: &Settings) -> Result<()> {
    match cli.command {
        Command::Report {
            import,
            categories,
            granularity,
            count,
            output,
        } => {
            let period = Period::new(
                granularity.unwrap_or(settings.default_granularity),
                count.unwrap_or(settings.default_count),
            );
            report(settings, import, categories, period, output)
        }
        Command::Inspect { envelope } => inspect(envelope),
        Command::Version => {
            println!("{}", build_info::current());
            Ok(())
        }
    }
}

fn report(
    settings: &Settings,
    import: PathBuf,
    categories: Option<PathBuf>,
    period: Period,
    output: Option<PathBuf>,
) -> Result<()> {
    let registry = default_registry();
    let import = Import::open_with(&registry, import, settings.statement_delimiter_byte())?;
    if !import.is_valid() {
        warn!(import = %import.path().display(), "import has no timespan, using every record");
    }
    let mut set = CategorySet::default();
    if let Some(path) = categories {
        set = CategorySet::open(&registry, path)?;
        set.use_all()?;
    }

    let reports = build_reports(import.records(), set.tree(), period)?;
    print_summary(&reports, period);

    if let Some(path) = output {
        let rows = export_csv(&reports, &path, settings.export_delimiter_byte())?;
        println!("Exported {rows} report(s) to {}", path.display());
    }
    Ok(())
}

fn print_summary(reports: &[Report], period: Period) {
    println!("{} report(s), {}", reports.len(), period.label());
    let Some(first) = reports.first() else {
        return;
    };
    let columns = first.columns();
    println!("{}", columns.join(" | "));
    for report in reports {
        println!("{}", report.to_row(&columns).join(" | "));
    }
}

fn inspect(envelope: PathBuf) -> Result<()> {
    let registry = default_registry();
    let info = registry.inspect(&envelope)?;
    println!("format: {}", info.format);
    println!("stored version: {}", info.stored);
    match info.registered {
        Some(registered) => println!("registered version: {registered}"),
        None => println!("registered version: unknown format"),
    }
    println!("loadable: {}", if info.loadable() { "yes" } else { "no" });
    println!(
        "upgrade pending: {}",
        if info.upgrade_pending() { "yes" } else { "no" }
    );
    Ok(())
}
