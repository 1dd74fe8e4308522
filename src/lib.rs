//! ltv-engine: event ingestion and customer lifetime-value ranking.
//!
//! Typed business events (customers, orders, image uploads, site visits) are
//! validated, deduplicated and upserted into an in-memory [`RecordStore`].
//! The store then feeds a fixed lifetime-value formula that ranks customers by
//! revenue and visit cadence.
//!
//! # Architecture
//!
//! - [`core::event`]: wire decoding into a typed [`Event`] union
//! - [`core::store`]: four insertion-ordered tables keyed by entity key
//! - [`core::validate`]: the data-quality gate run before every mutation
//! - [`plugins::ingest`]: the [`Engine`] applying batches and reporting counts
//! - [`plugins::ltv`]: per-customer scoring and the top-N ranking
//! - [`core::journal`]: JSONL logs of batches and rejected events
//!
//! # Examples
//!
//! ```bash
//! # Ingest two batches and show the five most valuable customers
//! ltv report --events day1.json --events day2.json --top 5
//!
//! # Dump the record store after ingestion
//! ltv display --events day1.json
//!
//! # Interactive session
//! ltv shell
//! ```
//!
//! ```
//! use ltv_engine::plugins::{ingest::Engine, ltv};
//!
//! let mut engine = Engine::new();
//! let report = engine
//!     .ingest_json(r#"[
//!         {"type": "CUSTOMER", "verb": "NEW", "key": "c1",
//!          "event_time": "2021-01-01T09:00:00Z", "last_name": "Kim"},
//!         {"type": "SITE_VISIT", "key": "v1", "event_time": "2021-01-01T09:01:00Z",
//!          "customer_id": "c1", "tags": []},
//!         {"type": "ORDER", "verb": "NEW", "key": "o1", "event_time": "2021-01-01T09:05:00Z",
//!          "customer_id": "c1", "total_amount": "25.00 USD"}
//!     ]"#)
//!     .unwrap();
//! assert_eq!(report.new, 3);
//!
//! let top = ltv::top_customers_by_ltv(engine.store(), 1).unwrap();
//! assert_eq!(top[0].ltv, 13_000);
//! ```

pub mod core;
pub mod plugins;
pub mod session;

mod cli;
mod subsystems;

pub use crate::core::error::LtvError;
pub use crate::core::event::Event;
pub use crate::core::store::RecordStore;
pub use crate::plugins::ingest::Engine;

use crate::core::{config, error, time, tui};
use crate::plugins::ingest::IngestionReport;
use clap::Parser;
use cli::{Cli, Command, DisplayCli, ReportCli};
use session::Session;
use std::path::PathBuf;

fn check_format(format: &str) -> Result<(), error::LtvError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(error::LtvError::ValidationError(format!(
            "unknown format '{}' (expected 'text' or 'json')",
            other
        ))),
    }
}

fn ingest_all(
    session: &mut Session,
    files: &[PathBuf],
    echo: bool,
) -> Result<Vec<IngestionReport>, error::LtvError> {
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let report = session.ingest_file(file)?;
        if echo {
            tui::print_section(&format!("Batch {}", file.display()));
            println!("{}", tui::ingestion_summary(&report, &time::now_clock()));
        }
        reports.push(report);
    }
    Ok(reports)
}

fn run_report(session: &mut Session, args: ReportCli) -> Result<(), error::LtvError> {
    check_format(&args.format)?;
    let text = args.format == "text";
    let reports = ingest_all(session, &args.events, text)?;
    let top = args.top.unwrap_or(session.default_top());
    let records = session.top_customers(Some(top))?;

    if text {
        tui::print_section(&format!(
            "Displaying Top {} Customers based on LTV Value as of {}",
            top,
            time::now_clock()
        ));
        println!("{}", tui::ltv_table(&records));
        if records.is_empty() {
            println!(
                "{}",
                tui::render_box(
                    "NO RANKED CUSTOMERS",
                    "Customers need at least one order and one site visit",
                    tui::BoxStyle::Warning,
                )
            );
        }
    } else {
        let env = time::command_envelope(
            "report",
            "ok",
            serde_json::json!({
                "batches": reports,
                "store_size": session.engine().store().size(),
                "top": top,
                "customers": records,
            }),
        );
        println!("{}", serde_json::to_string_pretty(&env)?);
    }
    Ok(())
}

fn run_display(session: &mut Session, args: DisplayCli) -> Result<(), error::LtvError> {
    check_format(&args.format)?;
    let text = args.format == "text";
    let reports = ingest_all(session, &args.events, text)?;
    let store = session.engine().store();

    if text {
        println!();
        println!("{}", tui::store_tables(store));
    } else {
        let env = time::command_envelope(
            "display",
            "ok",
            serde_json::json!({
                "batches": reports,
                "store_size": store.size(),
                "customers": store.customers.iter().collect::<Vec<_>>(),
                "site_visits": store.site_visits.iter().collect::<Vec<_>>(),
                "images": store.images.iter().collect::<Vec<_>>(),
                "orders": store.orders.iter().collect::<Vec<_>>(),
            }),
        );
        println!("{}", serde_json::to_string_pretty(&env)?);
    }
    Ok(())
}

pub fn run() -> Result<(), error::LtvError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;
    let mut engine_config = config::load_config(cli.config.as_deref(), &current_dir)?;
    if cli.no_journal {
        engine_config.journal = false;
    }

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&subsystems::schema_document())?
            );
            Ok(())
        }
        Command::Report(args) => run_report(&mut Session::new(&engine_config), args),
        Command::Display(args) => run_display(&mut Session::new(&engine_config), args),
        Command::Shell => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            Session::new(&engine_config).run_shell(stdin.lock(), &mut stdout.lock())
        }
    }
}
