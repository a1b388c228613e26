// src/scrape/extract.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument, trace};

use crate::error::ExtractionError;

static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("cell selector"));
static HEAD_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead > tr").expect("thead selector"));
static BODY_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody > tr, tfoot > tr").expect("tbody selector"));

/// A page table as strings, header rows kept apart from data rows. Every row
/// has been colspan-expanded, so column `i` means the same thing in all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGrid {
    pub header_rows: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl RawGrid {
    /// The authoritative column labels: the last header row.
    pub fn labels(&self) -> &[String] {
        self.header_rows.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Find `table#{table_id}` in `page_body` and parse it into a `RawGrid`.
///
/// The live DOM is searched first, then the text of every comment node (the
/// site ships most secondary tables inside `<!-- -->` blocks). Only the first
/// match is used.
#[instrument(level = "debug", skip(page_body), fields(page_len = page_body.len()))]
pub fn extract(page_body: &str, table_id: &str) -> Result<RawGrid, ExtractionError> {
    let selector = Selector::parse(&format!("table[id=\"{}\"]", table_id)).map_err(|_| {
        ExtractionError::TableNotFound {
            table_id: table_id.to_string(),
        }
    })?;

    let document = Html::parse_document(page_body);
    if let Some(table) = document.select(&selector).next() {
        debug!("table found in live DOM");
        return parse_table(table, table_id);
    }

    for node in document.tree.root().descendants() {
        if let Node::Comment(comment) = node.value() {
            if !comment.contains(table_id) {
                continue;
            }
            let fragment = Html::parse_fragment(comment);
            if let Some(table) = fragment.select(&selector).next() {
                debug!("table found inside comment block");
                return parse_table(table, table_id);
            }
        }
    }

    Err(ExtractionError::TableNotFound {
        table_id: table_id.to_string(),
    })
}

fn parse_table(table: ElementRef<'_>, table_id: &str) -> Result<RawGrid, ExtractionError> {
    let mut header_rows: Vec<Vec<String>> = table.select(&HEAD_ROW).map(row_cells).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut body: Vec<ElementRef<'_>> = table.select(&BODY_ROW).collect();
    if header_rows.is_empty() {
        // no <thead>: the parser files bare rows under an implicit <tbody>,
        // so its leading all-<th> rows are the headers
        let split = body.iter().take_while(|r| is_header_row(r)).count();
        header_rows.extend(body.drain(..split).map(row_cells));
    }

    for row in body {
        if is_repeated_header(&row) {
            trace!("skipping repeated header row");
            continue;
        }
        let cells = row_cells(row);
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(cells);
    }

    if header_rows.is_empty() {
        return Err(ExtractionError::MissingHeader {
            table_id: table_id.to_string(),
        });
    }

    debug!(
        header_rows = header_rows.len(),
        rows = rows.len(),
        "parsed table"
    );
    Ok(RawGrid { header_rows, rows })
}

fn is_header_row(row: &ElementRef<'_>) -> bool {
    let mut cells = row.select(&CELL).peekable();
    cells.peek().is_some() && cells.all(|c| c.value().name() == "th")
}

fn is_repeated_header(row: &ElementRef<'_>) -> bool {
    row.value()
        .attr("class")
        .map(|c| c.split_whitespace().any(|k| k == "thead" || k == "over_header"))
        .unwrap_or(false)
}

/// Upper bound on `colspan`, as browsers apply it.
const MAX_COLSPAN: usize = 1000;

/// Text of every cell in a row, whitespace-collapsed, with `colspan` cells
/// repeated so positions line up across rows.
fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    let mut out = Vec::new();
    for cell in row.select(&CELL) {
        let text = cell.text().collect::<String>();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1)
            .min(MAX_COLSPAN);
        for _ in 0..span {
            out.push(text.clone());
        }
    }
    out
}
