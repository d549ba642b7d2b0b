use log::{debug, info, warn};
use serde_derive::Serialize;
use snafu::{ResultExt, Snafu};

use crate::getterer_client::{
    client::{FetchError, GettererUrls, StatusSource},
    models::{decode_printer_list, decode_status, DecodeError, PrinterRef, PrinterStatus},
};

use super::table::Table;

pub const HEADER: [&str; 5] = ["Printer", "Desc", "Status", "Other Status", "Error"];
pub const UNDECODABLE_STATUS: &str = "Could not decode status";

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub description: String,
    /// Body of `/status/{name}`, or a fetch sentinel.
    pub plain_status_text: String,
    pub state_text: String,
    pub error_text: String,
    /// Only present when the JSON status could be fetched and decoded.
    pub status: Option<PrinterStatus>,
}

impl ReportRow {
    /// The table cells. The plain status is the only free-form text and is
    /// kept on one line.
    fn cells(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.description.clone(),
            single_line(&self.plain_status_text),
            self.state_text.clone(),
            self.error_text.clone(),
        ]
    }
}

/// Polls the Getterer: one request for the printer list, then two per
/// printer, strictly in order. Only the printer list is allowed to fail the
/// whole report; everything per printer degrades into its cells.
pub fn build_report<S: StatusSource>(source: &S, urls: &GettererUrls) -> Result<Vec<ReportRow>, ReportError> {
    let list_url = urls.printers();
    let body = source.try_fetch(&list_url).context(FetchPrinterListSnafu { url: list_url.to_string() })?;
    let printers = decode_printer_list(&body).context(DecodePrinterListSnafu { url: list_url.to_string() })?;
    info!("Getterer reports {} printers", printers.len());

    Ok(printers.into_iter().map(|printer| build_row(source, urls, printer)).collect())
}

fn build_row<S: StatusSource>(source: &S, urls: &GettererUrls, printer: PrinterRef) -> ReportRow {
    let (status, state_text, error_text) = match source.try_fetch(&urls.status_json(&printer.name)) {
        Ok(body) => match decode_status(&body) {
            Ok(status) => {
                if let Ok(pretty) = serde_json::to_string_pretty(&status) {
                    debug!("Status of {}: {}", printer.name, pretty);
                }
                let state_text = status.state_text().to_string();
                let error_text = status.error_text().to_string();
                (Some(status), state_text, error_text)
            }
            Err(e) => {
                warn!("Printer {}: {}", printer.name, snafu::Report::from_error(e));
                (None, String::new(), UNDECODABLE_STATUS.to_string())
            }
        },
        Err(e) => {
            warn!("{}", e);
            (None, e.sentinel().to_string(), String::new())
        }
    };

    let plain_status_text = source.fetch(&urls.status_plain(&printer.name));

    ReportRow {
        name: printer.name,
        description: printer.description,
        plain_status_text,
        state_text,
        error_text,
        status,
    }
}

/// Drops trailing whitespace and turns every run of tabs and line breaks
/// into a single space. Everything else is kept as-is.
fn single_line(text: &str) -> String {
    let mut line = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.trim_end().chars() {
        if matches!(c, '\t' | '\n' | '\r') {
            if !in_break {
                line.push(' ');
                in_break = true;
            }
        } else {
            line.push(c);
            in_break = false;
        }
    }
    line
}

pub fn render_table(rows: &[ReportRow], padding: usize) -> Table {
    let mut table = Table::with_header(padding, HEADER);
    for row in rows {
        table.push_row(row.cells());
    }
    table
}

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Could not fetch printer list from {url}"))]
    FetchPrinterList { url: String, source: FetchError },

    #[snafu(display("Printer list from {url} is not valid"))]
    DecodePrinterList { url: String, source: DecodeError },
}
