//! Console rendering: banner boxes, bordered tables and the ingestion summary.
//!
//! Builders return `String`s so callers decide where the text goes; only
//! `print_section` writes to stdout.

use crate::core::store::RecordStore;
use crate::plugins::ingest::IngestionReport;
use crate::plugins::ltv::LtvRecord;
use std::env;

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 60;
const RULE: &str = "================================================";
const REJECTION_PREVIEW_ITEMS: usize = 5;
const REJECTION_PREVIEW_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxStyle {
    Info,
    Warning,
}

pub fn terminal_width() -> usize {
    env::var("TERM_WIDTH")
        .ok()
        .and_then(|w| w.parse().ok())
        .or_else(|| env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(80)
}

fn box_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

fn box_row(content: &str, width: usize) -> String {
    let padding = width.saturating_sub(2).saturating_sub(content.chars().count());
    let left = padding / 2;
    format!(
        "║{}{}{}║",
        " ".repeat(left),
        content,
        " ".repeat(padding - left)
    )
}

pub fn render_box(title: &str, subtitle: &str, style: BoxStyle) -> String {
    use colored::{Color, Colorize};

    let color = match style {
        BoxStyle::Info => Color::BrightCyan,
        BoxStyle::Warning => Color::BrightYellow,
    };
    let width = box_width();
    let rule = "═".repeat(width - 2);

    let mut lines = vec![
        format!("╔{}╗", rule).color(color).to_string(),
        box_row(title, width).color(color).bold().to_string(),
    ];
    if !subtitle.is_empty() {
        lines.push(box_row(subtitle, width).color(color).to_string());
    }
    lines.push(format!("╚{}╝", rule).color(color).to_string());
    lines.join("\n")
}

pub fn print_section(title: &str) {
    use colored::Colorize;
    println!();
    println!("{}", title.bold());
}

/// Collapse whitespace and bound `input` to `max_chars` characters.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let head: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", head)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Align {
    Left,
    Right,
}

pub struct Column<'a> {
    pub header: &'a str,
    pub align: Align,
}

impl<'a> Column<'a> {
    pub fn left(header: &'a str) -> Self {
        Self {
            header,
            align: Align::Left,
        }
    }

    pub fn right(header: &'a str) -> Self {
        Self {
            header,
            align: Align::Right,
        }
    }
}

/// Render a bordered table in the psql style:
///
/// ```text
/// +------+------+
/// | key  | name |
/// |------+------|
/// | c1   | Kim  |
/// +------+------+
/// ```
pub fn render_table(columns: &[Column<'_>], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.header.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border = |joint: char, edge: char| {
        let inner = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join(&joint.to_string());
        format!("{}{}{}", edge, inner, edge)
    };
    let line = |cells: Vec<String>| {
        let inner = cells
            .iter()
            .zip(columns.iter().zip(widths.iter()))
            .map(|(cell, (col, &w))| match col.align {
                Align::Left => format!(" {:<w$} ", cell, w = w),
                Align::Right => format!(" {:>w$} ", cell, w = w),
            })
            .collect::<Vec<_>>()
            .join("|");
        format!("|{}|", inner)
    };

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(border('+', '+'));
    out.push(line(columns.iter().map(|c| c.header.to_string()).collect()));
    out.push(border('+', '|'));
    for row in rows {
        let mut cells = row.clone();
        cells.resize(columns.len(), String::new());
        out.push(line(cells));
    }
    out.push(border('+', '+'));
    out.join("\n")
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// The block printed after every ingested batch.
pub fn ingestion_summary(report: &IngestionReport, completed_at: &str) -> String {
    let mut lines = vec![
        RULE.to_string(),
        format!("Current Data Store Size : {}", report.size_before),
        RULE.to_string(),
        format!("Number of Events Ingested           : {}", report.new),
        format!("Number of Events Updated            : {}", report.updated),
        format!("Number of Events Rejected due to DQ : {}", report.rejected),
        format!("Number of Duplicate Events          : {}", report.duplicate),
        RULE.to_string(),
        format!("Updated Data Store Size : {}", report.size_after),
        format!("Ingestion Completed at : {}", completed_at),
        RULE.to_string(),
    ];

    if !report.rejections.is_empty() {
        lines.push("Rejected events:".to_string());
        for rejection in report.rejections.iter().take(REJECTION_PREVIEW_ITEMS) {
            lines.push(format!(
                "  - {}: {}",
                rejection.reason,
                compact_line(&rejection.event.to_string(), REJECTION_PREVIEW_CHARS)
            ));
        }
        if report.rejections.len() > REJECTION_PREVIEW_ITEMS {
            lines.push(format!(
                "  (+{} more)",
                report.rejections.len() - REJECTION_PREVIEW_ITEMS
            ));
        }
    }
    lines.join("\n")
}

pub fn ltv_table(records: &[LtvRecord]) -> String {
    let columns = [
        Column::right("Rank"),
        Column::left("Customer ID"),
        Column::left("Customer Last Name"),
        Column::right("Total Revenue"),
        Column::right("Number of Visits"),
        Column::right("LTV value"),
    ];
    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.customer_id.clone(),
                opt(&r.last_name),
                format!("{:.2}", r.total_revenue),
                r.visits.to_string(),
                r.ltv.to_string(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// All four tables, each preceded by its title.
pub fn store_tables(store: &RecordStore) -> String {
    let customers = render_table(
        &[
            Column::left("key"),
            Column::left("event_time"),
            Column::left("last_name"),
            Column::left("adr_city"),
            Column::left("adr_state"),
        ],
        &store
            .customers
            .iter()
            .map(|c| {
                vec![
                    c.key.clone(),
                    c.event_time.to_string(),
                    opt(&c.last_name),
                    opt(&c.adr_city),
                    opt(&c.adr_state),
                ]
            })
            .collect::<Vec<_>>(),
    );
    let visits = render_table(
        &[
            Column::left("key"),
            Column::left("event_time"),
            Column::left("customer_id"),
        ],
        &store
            .site_visits
            .iter()
            .map(|v| vec![v.key.clone(), v.event_time.to_string(), v.customer_id.clone()])
            .collect::<Vec<_>>(),
    );
    let images = render_table(
        &[
            Column::left("key"),
            Column::left("event_time"),
            Column::left("customer_id"),
            Column::left("camera_make"),
            Column::left("camera_model"),
        ],
        &store
            .images
            .iter()
            .map(|i| {
                vec![
                    i.key.clone(),
                    i.event_time.to_string(),
                    i.customer_id.clone(),
                    opt(&i.camera_make),
                    opt(&i.camera_model),
                ]
            })
            .collect::<Vec<_>>(),
    );
    let orders = render_table(
        &[
            Column::left("key"),
            Column::left("event_time"),
            Column::left("customer_id"),
            Column::right("total_amount"),
        ],
        &store
            .orders
            .iter()
            .map(|o| {
                vec![
                    o.key.clone(),
                    o.event_time.to_string(),
                    o.customer_id.clone(),
                    format!("{:.2}", o.total_amount),
                ]
            })
            .collect::<Vec<_>>(),
    );

    [
        ("Customers Table", customers, store.customers.is_empty()),
        ("Site Visit Table", visits, store.site_visits.is_empty()),
        ("Images Table", images, store.images.is_empty()),
        ("Orders Table - total_amount in USD", orders, store.orders.is_empty()),
    ]
    .into_iter()
    .map(|(title, table, empty)| {
        if empty {
            format!("{}\n{}\n(no rows)", title, table)
        } else {
            format!("{}\n{}", title, table)
        }
    })
    .collect::<Vec<_>>()
    .join("\n\n")
}
