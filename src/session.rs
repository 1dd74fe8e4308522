//! A running session: one engine, its journal, and the interactive loop.

use crate::core::config::EngineConfig;
use crate::core::error::LtvError;
use crate::core::journal::Journal;
use crate::core::{time, tui};
use crate::plugins::ingest::{Engine, IngestionReport};
use crate::plugins::ltv::{self, CustomerLtv, LtvRecord, SkipReason};
use std::io::{BufRead, Write};
use std::path::Path;

const SHELL_HELP: &str = "Options: 1.ingest <file>  2.ltv [x]  3.display  size  4.exit";

pub struct Session {
    engine: Engine,
    journal: Option<Journal>,
    default_top: usize,
}

impl Session {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            engine: Engine::new(),
            journal: config.journal.then(|| Journal::new(&config.log_dir)),
            default_top: config.default_top,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn default_top(&self) -> usize {
        self.default_top
    }

    /// Ingest one batch file and journal the outcome. A journal write
    /// failure is reported on stderr and does not fail the batch.
    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestionReport, LtvError> {
        let report = self.engine.ingest_file(path)?;
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record_batch(&path.display().to_string(), &report) {
                eprintln!(
                    "Warning: could not journal batch {}: {}",
                    report.batch_id, e
                );
            }
        }
        Ok(report)
    }

    pub fn top_customers(&self, top: Option<usize>) -> Result<Vec<LtvRecord>, LtvError> {
        ltv::top_customers_by_ltv(self.engine.store(), top.unwrap_or(self.default_top))
    }

    /// Customers left out of the ranking, with the reason.
    pub fn unranked_customers(&self) -> Vec<(String, SkipReason)> {
        ltv::evaluate_customers(self.engine.store())
            .into_iter()
            .filter_map(|outcome| match outcome {
                CustomerLtv::Skipped {
                    customer_id,
                    reason,
                } => Some((customer_id, reason)),
                CustomerLtv::Scored(_) => None,
            })
            .collect()
    }

    /// Read commands from `input` until `exit` or end of input.
    /// Lines that are not valid UTF-8 are read lossily and fall through to
    /// the usual command matching.
    pub fn run_shell<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<(), LtvError> {
        writeln!(
            out,
            "{}",
            tui::render_box("LTV SHELL", "one in-memory store per session", tui::BoxStyle::Info)
        )?;
        writeln!(out, "{}", SHELL_HELP)?;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (command, rest) = match trimmed.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, rest.trim()),
                None => (trimmed, ""),
            };

            match command.to_ascii_lowercase().as_str() {
                "1" | "ingest" => {
                    if rest.is_empty() {
                        writeln!(out, "Usage: ingest <file>")?;
                        continue;
                    }
                    match self.ingest_file(Path::new(rest)) {
                        Ok(report) => {
                            writeln!(out, "{}", tui::ingestion_summary(&report, &time::now_clock()))?
                        }
                        Err(e) => writeln!(out, "Error: {}", e)?,
                    }
                }
                "2" | "ltv" => {
                    let top = if rest.is_empty() {
                        None
                    } else {
                        match rest.parse::<usize>() {
                            Ok(x) => Some(x),
                            Err(_) => {
                                writeln!(out, "Usage: ltv <number of customers>")?;
                                continue;
                            }
                        }
                    };
                    match self.top_customers(top) {
                        Ok(records) => {
                            writeln!(
                                out,
                                "Displaying Top {} Customers based on LTV Value as of {}",
                                top.unwrap_or(self.default_top),
                                time::now_clock()
                            )?;
                            writeln!(out, "{}", tui::ltv_table(&records))?;
                            for (customer_id, reason) in self.unranked_customers() {
                                writeln!(out, "Not ranked: {} ({})", customer_id, reason)?;
                            }
                        }
                        Err(e) => writeln!(out, "Error: {}", e)?,
                    }
                }
                "3" | "display" => writeln!(out, "{}", tui::store_tables(self.engine.store()))?,
                "size" => writeln!(
                    out,
                    "Current Data Store Size : {}",
                    self.engine.store().size()
                )?,
                "4" | "exit" | "quit" => {
                    writeln!(out, "Exiting......")?;
                    return Ok(());
                }
                _ => {
                    writeln!(out, "Please enter the correct option")?;
                    writeln!(out, "{}", SHELL_HELP)?;
                }
            }
        }
        Ok(())
    }
}
